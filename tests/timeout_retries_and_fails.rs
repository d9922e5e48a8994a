mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use nsquery::dns::enums::RecordType;
use nsquery::handler::{Handler, RecordSet};
use nsquery::{Context, ErrorKind, ResolverConfig};

struct RecordFailure(std::sync::Mutex<Option<ErrorKind>>);

impl Handler for RecordFailure {
    fn on_failure(&self, kind: ErrorKind) {
        *self.0.lock().unwrap() = Some(kind);
    }

    fn on_success(&self, _records: RecordSet<'_>) {
        panic!("expected a failure, not a successful response");
    }
}

#[tokio::test]
async fn unanswered_query_retries_then_reports_network_failure() {
    common::init_tracing();
    let (nameserver, received) = common::spawn_silent_udp_nameserver().await;

    let context = Context::new(ResolverConfig {
        expire: Duration::from_millis(900),
        interval: Duration::from_millis(300),
        ..Default::default()
    });
    context.add_nameserver(nameserver).await.unwrap();

    let handler = Arc::new(RecordFailure(std::sync::Mutex::new(None)));
    let started = tokio::time::Instant::now();
    context.query_str("slow.example", RecordType::A, handler.clone());

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let elapsed = started.elapsed();

    assert_eq!(*handler.0.lock().unwrap(), Some(ErrorKind::Network));
    assert!(
        elapsed >= Duration::from_millis(850),
        "failure should not fire before the expire window: {elapsed:?}"
    );
    assert!(
        received.load(Ordering::SeqCst) >= 2,
        "expected at least the initial send plus one retry, got {}",
        received.load(Ordering::SeqCst)
    );
}
