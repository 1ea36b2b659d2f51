pub mod logging;
pub mod request_context;

pub use logging::init_tracing;
pub use request_context::{TracedClientExt, TracedRequest, REQUEST_ID_HEADER};
