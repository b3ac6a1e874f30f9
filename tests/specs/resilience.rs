//! Failure isolation: one bad record or backend hiccup never takes out the
//! pass, the process, or unrelated instances.

use crate::prelude::*;
use dsm_core::{machine_key, Backend, FakeClock, Machine, MemoryBackend, Registry};
use dsm_engine::{Submitter, Worker, WorkerConfig};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn unregistered_type_survives_dispatch_and_resumes_after_registration() {
    let (backend, registry) = fixture();

    let id = submitter(&backend)
        .submit("INIT", b"keep".to_vec(), "later")
        .await
        .unwrap();
    let key = machine_key(&id);

    let w = worker(&backend, &registry);
    w.run_pass().await;

    // Neither deleted nor corrupted
    let machine = stored(&backend, &key).await.unwrap();
    assert_eq!(machine.state, "INIT");
    assert_eq!(machine.payload, b"keep".to_vec());

    // A later deploy registers the handler; the same record now processes
    registry.register("later", |machine: &mut Machine| {
        machine.state = "DONE".to_string();
        true
    });
    w.run_pass().await;
    assert!(stored(&backend, &key).await.is_none());
}

#[tokio::test]
async fn corrupt_record_does_not_block_healthy_instances() {
    let (backend, registry) = fixture();
    registry.register("demo", |machine: &mut Machine| {
        machine.state = "DONE".to_string();
        true
    });

    backend
        .put("machine-broken", b"\xff\xfe not json", Duration::from_secs(600))
        .await
        .unwrap();
    let id = submitter(&backend)
        .submit("INIT", Vec::new(), "demo")
        .await
        .unwrap();

    worker(&backend, &registry).run_pass().await;

    assert!(stored(&backend, &machine_key(&id)).await.is_none());
    // The corrupt record stays for operator inspection
    assert!(backend.get("machine-broken").await.unwrap().is_some());
}

#[tokio::test]
async fn scan_failure_only_costs_one_cycle() {
    let (backend, registry) = fixture();
    registry.register("demo", |machine: &mut Machine| {
        machine.state = "DONE".to_string();
        true
    });

    let id = submitter(&backend)
        .submit("INIT", Vec::new(), "demo")
        .await
        .unwrap();
    let key = machine_key(&id);

    let w = worker(&backend, &registry);
    backend.inject_scan_error();
    w.run_pass().await;
    assert!(stored(&backend, &key).await.is_some());

    w.run_pass().await;
    assert!(stored(&backend, &key).await.is_none());
}

#[tokio::test]
async fn abandoned_instance_lapses_with_its_lease() {
    let clock = FakeClock::new();
    let backend = Arc::new(MemoryBackend::with_clock(clock.clone()));
    let registry = Arc::new(Registry::new());

    let ttl = Duration::from_secs(600);
    let submitter = Submitter::new(
        Arc::clone(&backend),
        dsm_core::SequentialIdGen::new("spec"),
        ttl,
    );
    let id = submitter.submit("INIT", Vec::new(), "nobody").await.unwrap();
    let key = machine_key(&id);

    // No worker can process it (no handler, then no worker at all); the
    // lease is the liveness safeguard
    clock.advance(ttl + Duration::from_secs(1));
    assert!(backend.get(&key).await.unwrap().is_none());

    // A pass over the lapsed namespace is a no-op, not an error
    let worker: Worker<MemoryBackend<FakeClock>> = Worker::new(
        Arc::clone(&backend),
        registry,
        WorkerConfig::default().with_poll_interval(Duration::from_millis(5)),
    );
    worker.run_pass().await;
}

#[tokio::test]
async fn stale_lock_from_a_crashed_worker_is_reclaimed() {
    let clock = FakeClock::new();
    let backend = Arc::new(
        MemoryBackend::with_clock(clock.clone()).with_lock_hold(Duration::from_secs(10)),
    );
    let registry = Arc::new(Registry::new());
    registry.register("demo", |machine: &mut Machine| {
        machine.state = "DONE".to_string();
        true
    });

    let submitter = Submitter::new(
        Arc::clone(&backend),
        dsm_core::SequentialIdGen::new("spec"),
        Duration::from_secs(600),
    );
    let id = submitter.submit("INIT", Vec::new(), "demo").await.unwrap();
    let key = machine_key(&id);

    // A worker takes the lock and crashes without releasing it
    let _abandoned = backend.try_lock(&key).await.unwrap().unwrap();

    let worker: Worker<MemoryBackend<FakeClock>> = Worker::new(
        Arc::clone(&backend),
        registry,
        WorkerConfig::default().with_poll_interval(Duration::from_millis(5)),
    );

    // While the hold duration runs, dispatch skips the instance
    worker.run_pass().await;
    assert!(backend.get(&key).await.unwrap().is_some());

    // After the bound lapses, another worker reclaims and finishes the work
    clock.advance(Duration::from_secs(11));
    worker.run_pass().await;
    assert!(backend.get(&key).await.unwrap().is_none());
}
