use bytes::Bytes;
use rag_frontend::controllers::{ObjectUrlStore, ResourceHandleRegistry};
use rag_frontend::services::metrics::{init_metrics, OBJECT_URLS_LIVE};

fn live_gauge() -> i64 {
    OBJECT_URLS_LIVE.get().map(|gauge| gauge.get()).unwrap_or_default()
}

#[test]
fn test_live_object_url_gauge_counts_across_stores() {
    init_metrics().unwrap();
    let baseline = live_gauge();

    let mut first = ResourceHandleRegistry::new(ObjectUrlStore::new());
    let mut second = ResourceHandleRegistry::new(ObjectUrlStore::new());

    first.acquire(Bytes::from_static(b"one"), "application/pdf");
    second.acquire(Bytes::from_static(b"two"), "application/pdf");
    assert_eq!(live_gauge(), baseline + 2);

    first.acquire(Bytes::from_static(b"three"), "application/pdf");
    assert_eq!(live_gauge(), baseline + 2);

    first.release();
    assert_eq!(live_gauge(), baseline + 1);
    assert!(!first.release());
    assert_eq!(live_gauge(), baseline + 1);

    drop(second);
    assert_eq!(live_gauge(), baseline);
}
