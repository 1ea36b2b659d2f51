pub mod chat;
pub mod pager;
pub mod preview;
pub mod resource_registry;
pub mod uploads;

pub use chat::ChatSessionController;
pub use pager::{DocumentCollectionPager, PageCursor};
pub use preview::DocumentPreviewController;
pub use resource_registry::{ObjectUrlStore, ResourceHandle, ResourceHandleRegistry};
pub use uploads::{SubmittedUpload, UploadTaskTracker};
