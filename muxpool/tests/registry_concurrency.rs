//! Cross-thread properties of the sink registry.
//!
//! These tests exercise the atomicity contract with real threads:
//! - racing first-time lookups for one key invoke the factory exactly once
//! - racing registrations of one callback subscribe it exactly once
//! - shutdown fan-out reaches every distinct callback exactly once

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use muxpool::{
    CallReply, Endpoint, HealthCallback, MethodCall, PoolName, ShutdownReason, ShutdownSignal,
    SinkRegistry, TransportSink,
};

struct StubSink {
    shutdown: ShutdownSignal,
}

impl StubSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            shutdown: CallReply::pending(),
        })
    }

    fn trigger_shutdown(&self) {
        self.shutdown.resolve(Ok(ShutdownReason::Closed));
    }
}

impl TransportSink for StubSink {
    fn send_call(&self, _call: MethodCall) -> CallReply<Vec<u8>> {
        CallReply::pending()
    }

    fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

fn endpoint() -> Endpoint {
    Endpoint::new("10.0.0.1", 9090)
}

fn pool() -> PoolName {
    PoolName::from("default")
}

#[test]
fn concurrent_first_lookups_invoke_factory_once() {
    init_tracing();
    const CALLERS: usize = 8;

    let registry = Arc::new(SinkRegistry::new());
    let factory_calls = Arc::new(AtomicU32::new(0));
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let factory_calls = Arc::clone(&factory_calls);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let health = HealthCallback::new(|_| {});
                barrier.wait();
                registry
                    .get_or_create_sink(
                        &endpoint(),
                        &pool(),
                        |_| {
                            factory_calls.fetch_add(1, Ordering::SeqCst);
                            Ok(StubSink::new() as Arc<dyn TransportSink>)
                        },
                        &health,
                    )
                    .expect("lookup")
            })
        })
        .collect();

    let sinks: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("caller thread"))
        .collect();

    assert_eq!(factory_calls.load(Ordering::SeqCst), 1);
    for sink in &sinks[1..] {
        assert!(Arc::ptr_eq(&sinks[0], sink));
    }
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.metrics().sinks_created, 1);
    assert_eq!(registry.metrics().cache_hits, CALLERS as u64 - 1);
}

#[test]
fn concurrent_lookups_for_distinct_keys_stay_isolated() {
    const CALLERS: usize = 4;

    let registry = Arc::new(SinkRegistry::new());
    let factory_calls = Arc::new(AtomicU32::new(0));
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let factory_calls = Arc::clone(&factory_calls);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let health = HealthCallback::new(|_| {});
                barrier.wait();
                registry
                    .get_or_create_sink(
                        &Endpoint::new("10.0.0.1", 9090 + i as u16),
                        &pool(),
                        |_| {
                            factory_calls.fetch_add(1, Ordering::SeqCst);
                            Ok(StubSink::new() as Arc<dyn TransportSink>)
                        },
                        &health,
                    )
                    .expect("lookup")
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("caller thread");
    }

    assert_eq!(factory_calls.load(Ordering::SeqCst), CALLERS as u32);
    assert_eq!(registry.len(), CALLERS);
}

#[test]
fn concurrent_registration_of_one_callback_subscribes_once() {
    const CALLERS: usize = 8;

    let registry = Arc::new(SinkRegistry::new());
    let sink = StubSink::new();
    let fired = Arc::new(AtomicU32::new(0));
    let fired_clone = Arc::clone(&fired);
    let health = HealthCallback::new(move |_| {
        fired_clone.fetch_add(1, Ordering::SeqCst);
    });
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let sink = Arc::clone(&sink);
            let health = health.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry
                    .get_or_create_sink(
                        &endpoint(),
                        &pool(),
                        move |_| Ok(sink as Arc<dyn TransportSink>),
                        &health,
                    )
                    .expect("lookup");
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("caller thread");
    }

    sink.trigger_shutdown();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(registry.metrics().callbacks_registered, 1);
}

#[test]
fn shutdown_fans_out_to_every_distinct_callback_once() {
    const CALLERS: usize = 8;

    let registry = Arc::new(SinkRegistry::new());
    let sink = StubSink::new();
    let fired = Arc::new(AtomicU32::new(0));
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let sink = Arc::clone(&sink);
            let fired = Arc::clone(&fired);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let health = HealthCallback::new(move |_| {
                    fired.fetch_add(1, Ordering::SeqCst);
                });
                barrier.wait();
                registry
                    .get_or_create_sink(
                        &endpoint(),
                        &pool(),
                        move |_| Ok(sink as Arc<dyn TransportSink>),
                        &health,
                    )
                    .expect("lookup");
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("caller thread");
    }

    sink.trigger_shutdown();
    assert_eq!(fired.load(Ordering::SeqCst), CALLERS as u32);

    // A second resolution attempt must not re-notify anyone.
    sink.shutdown.resolve(Ok(ShutdownReason::Closed));
    assert_eq!(fired.load(Ordering::SeqCst), CALLERS as u32);
}
