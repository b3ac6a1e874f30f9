//! Submission → discovery → advancement → retirement.

use crate::prelude::*;
use dsm_core::{machine_key, Backend, Machine, MACHINE_PREFIX};

#[tokio::test]
async fn submitted_instance_is_discoverable_under_the_machine_namespace() {
    let (backend, _) = fixture();
    let id = submitter(&backend)
        .submit("INIT", b"payload".to_vec(), "demo")
        .await
        .unwrap();

    let records = backend.get_by_prefix(MACHINE_PREFIX).await.unwrap();
    assert_eq!(records.len(), 1);

    let machine = Machine::decode(&records[0]).unwrap();
    assert!(machine.key.starts_with(MACHINE_PREFIX));
    assert_eq!(machine.key, machine_key(&id));
    assert_eq!(machine.state, "INIT");
    assert_eq!(machine.payload, b"payload".to_vec());
    assert_eq!(machine.machine_type, "demo");
}

#[tokio::test]
async fn terminal_handler_retires_the_instance_in_one_pass() {
    let (backend, registry) = fixture();
    registry.register("demo", |machine: &mut Machine| {
        machine.state = "DONE".to_string();
        true
    });

    let id = submitter(&backend)
        .submit("INIT", Vec::new(), "demo")
        .await
        .unwrap();

    worker(&backend, &registry).run_pass().await;

    assert!(stored(&backend, &machine_key(&id)).await.is_none());
}

#[tokio::test]
async fn non_terminal_handler_advances_the_stored_state() {
    let (backend, registry) = fixture();
    registry.register("demo2", |machine: &mut Machine| {
        machine.state = "B".to_string();
        false
    });

    let id = submitter(&backend)
        .submit("A", Vec::new(), "demo2")
        .await
        .unwrap();

    worker(&backend, &registry).run_pass().await;

    let machine = stored(&backend, &machine_key(&id)).await.unwrap();
    assert_eq!(machine.state, "B");
}

#[tokio::test]
async fn instance_advances_across_successive_passes_until_terminal() {
    let (backend, registry) = fixture();
    // A three-step machine: INIT -> MID -> DONE
    registry.register("steps", |machine: &mut Machine| {
        match machine.state.as_str() {
            "INIT" => machine.state = "MID".to_string(),
            _ => machine.state = "DONE".to_string(),
        }
        machine.state == "DONE"
    });

    let id = submitter(&backend)
        .submit("INIT", Vec::new(), "steps")
        .await
        .unwrap();
    let key = machine_key(&id);
    let w = worker(&backend, &registry);

    w.run_pass().await;
    assert_eq!(stored(&backend, &key).await.unwrap().state, "MID");

    w.run_pass().await;
    assert!(stored(&backend, &key).await.is_none());
}
