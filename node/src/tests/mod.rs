use crate::{Node, NodeOptions};
use foxtail_point::{read_value, LockRequest};
use serde_json::json;
use std::time::Duration;

/// Options for tests that drive scanners and execution sets by hand: a
/// server tick so slow it never interferes with the assertions.
fn manual_options() -> NodeOptions {
    NodeOptions {
        tick_duration: Duration::from_secs(3600),
        ..NodeOptions::default()
    }
}

fn digital8_card(base_id: u32, initial_input: Option<u8>) -> serde_json::Value {
    let mut input = json!({
        "channel": 1,
        "id": base_id,
        "ioRegId": base_id + 1,
        "name": "din",
        "type": "a9f6c3d2-7e15-48b4-9c0a-d2b8e4f615c7"
    });
    if let Some(value) = initial_input {
        input["initial"] = json!({ "valid": true, "val": value, "id": base_id + 2 });
    }
    json!({
        "name": "mock card",
        "id": 0,
        "type": "59d33888-62c7-45b2-a4d4-9dbc55914ed3",
        "slot": 0,
        "points": { "inputs": [input] }
    })
}

fn node_descriptor(chain: serde_json::Value, card: serde_json::Value) -> String {
    json!({
        "node": {
            "name": "test node",
            "type": "1f0b6e2a-8c4d-4e7b-9a31-5d2c0f8e6b44",
            "chassis": [{
                "name": "chassis0",
                "id": 0,
                "fer": 1000,
                "scanners": [{
                    "name": "scanner0",
                    "id": 0,
                    "scanRateMultiplier": 1,
                    "cards": [card]
                }],
                "executionSets": [{
                    "name": "exe0",
                    "id": 0,
                    "exeRateMultiplier": 1,
                    "logicChains": [chain]
                }]
            }]
        }
    })
    .to_string()
}

fn and_chain(p1_initial: serde_json::Value, p2_initial: serde_json::Value) -> serde_json::Value {
    json!({
        "name": "and chain",
        "id": 0,
        "components": [{
            "name": "and",
            "type": "e62e395c-d27a-4821-bba9-aa1e6de42a05",
            "inputs": [
                { "type": "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0", "idRef": 10 },
                { "type": "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0", "idRef": 11 },
            ],
            "outputs": [
                { "type": "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0", "idRef": 12 },
            ]
        }],
        "connectionPts": [
            { "id": 12, "type": "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0", "name": "p3" }
        ],
        "autoPts": [
            {
                "id": 10, "type": "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0", "name": "p1",
                "initial": p1_initial
            },
            {
                "id": 11, "type": "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0", "name": "p2",
                "initial": p2_initial
            }
        ]
    })
}

#[test]
fn boolean_and_end_to_end() {
    let descriptor = node_descriptor(
        and_chain(
            json!({ "val": true, "id": 20 }),
            json!({ "val": true, "id": 21 }),
        ),
        digital8_card(100, None),
    );
    let node = Node::create_from_json(&descriptor, manual_options()).unwrap();
    assert!(node.start(0));

    let chassis = node.chassis(0).unwrap();
    chassis.execution_set(0).unwrap().execute(1_000).unwrap();

    let p3 = node.point_db().lookup_by_id(12).unwrap();
    assert_eq!(read_value::<bool>(p3.as_ref()).unwrap(), Some(true));
}

#[test]
fn invalid_input_propagates_to_the_output() {
    let descriptor = node_descriptor(
        and_chain(
            json!({ "val": true, "id": 20 }),
            json!({ "valid": false, "id": 21 }),
        ),
        digital8_card(100, None),
    );
    let node = Node::create_from_json(&descriptor, manual_options()).unwrap();
    assert!(node.start(0));

    let chassis = node.chassis(0).unwrap();
    chassis.execution_set(0).unwrap().execute(1_000).unwrap();

    let p3 = node.point_db().lookup_by_id(12).unwrap();
    assert!(p3.is_not_valid());
}

#[test]
fn scaler_end_to_end() {
    let chain = json!({
        "name": "scale chain",
        "id": 0,
        "components": [{
            "name": "scale",
            "type": "0eb51702-677f-4022-91ab-bc84efcc4ed1",
            "inputs": [
                {
                    "type": "708745fa-cef6-4364-abad-063a40f35cbc",
                    "idRef": 10, "m": 100.0, "b": -5.0
                },
            ],
            "outputs": [
                { "type": "708745fa-cef6-4364-abad-063a40f35cbc", "idRef": 11 },
            ]
        }],
        "connectionPts": [
            { "id": 11, "type": "708745fa-cef6-4364-abad-063a40f35cbc", "name": "p2" }
        ],
        "autoPts": [{
            "id": 10, "type": "708745fa-cef6-4364-abad-063a40f35cbc", "name": "p1",
            "initial": { "val": 2.0, "id": 20 }
        }]
    });
    let descriptor = node_descriptor(chain, digital8_card(100, None));
    let node = Node::create_from_json(&descriptor, manual_options()).unwrap();
    assert!(node.start(0));

    node.chassis(0)
        .unwrap()
        .execution_set(0)
        .unwrap()
        .execute(1_000)
        .unwrap();

    let p2 = node.point_db().lookup_by_id(11).unwrap();
    assert_eq!(read_value::<f32>(p2.as_ref()).unwrap(), Some(195.0));
}

#[test]
fn card_scan_publishes_initial_register_state() {
    let descriptor = node_descriptor(
        and_chain(
            json!({ "val": true, "id": 20 }),
            json!({ "val": true, "id": 21 }),
        ),
        digital8_card(100, Some(128)),
    );
    let node = Node::create_from_json(&descriptor, manual_options()).unwrap();
    assert!(node.start(0));

    let chassis = node.chassis(0).unwrap();
    assert!(chassis.scanner(0).unwrap().scan_inputs(1_000));

    let virtual_in = node.point_db().lookup_by_id(100).unwrap();
    assert_eq!(read_value::<u8>(virtual_in.as_ref()).unwrap(), Some(128));
}

#[test]
fn server_thread_runs_the_schedule() {
    let descriptor = node_descriptor(
        and_chain(
            json!({ "val": true, "id": 20 }),
            json!({ "val": true, "id": 21 }),
        ),
        digital8_card(100, Some(5)),
    );
    let node = Node::create_from_json(
        &descriptor,
        NodeOptions {
            tick_duration: Duration::from_millis(1),
            ..NodeOptions::default()
        },
    )
    .unwrap();
    assert!(node.start(0));

    // FER is 1 ms: a generous wait guarantees several full passes.
    std::thread::sleep(Duration::from_millis(250));

    let p3 = node.point_db().lookup_by_id(12).unwrap();
    assert_eq!(read_value::<bool>(p3.as_ref()).unwrap(), Some(true));
    let virtual_in = node.point_db().lookup_by_id(100).unwrap();
    assert_eq!(read_value::<u8>(virtual_in.as_ref()).unwrap(), Some(5));

    node.stop();
    assert!(!node.is_started());
}

#[test]
fn reset_hook_reasserts_designated_initial_state() {
    let descriptor = node_descriptor(
        and_chain(
            json!({ "val": true, "id": 20 }),
            json!({ "val": true, "id": 21 }),
        ),
        digital8_card(100, None),
    );
    let node = Node::create_from_json(&descriptor, manual_options()).unwrap();
    assert!(node.start(0));

    // Simulate a handover clobbering an auto point, then reset.
    let p1 = node.point_db().lookup_by_id(10).unwrap();
    p1.from_json(&json!({ "val": false }), LockRequest::NoRequest)
        .unwrap();
    node.reset(1_000);
    assert_eq!(read_value::<bool>(p1.as_ref()).unwrap(), Some(true));
    assert!(node.is_started());
}

#[test]
fn broken_descriptor_fails_the_build_with_a_rolled_up_error() {
    let mut chain = and_chain(
        json!({ "val": true, "id": 20 }),
        json!({ "val": true, "id": 21 }),
    );
    chain["components"][0]["type"] = json!("ffffffff-0000-0000-0000-000000000000");
    let descriptor = node_descriptor(chain, digital8_card(100, None));

    let err = Node::create_from_json(&descriptor, manual_options()).unwrap_err();
    assert_eq!(err.code_name(), "CHASSIS_CREATE_ERROR");
}

#[test]
fn unresolved_reference_fails_the_build() {
    let mut chain = and_chain(
        json!({ "val": true, "id": 20 }),
        json!({ "val": true, "id": 21 }),
    );
    chain["components"][0]["inputs"][0]["idRef"] = json!(999);
    let descriptor = node_descriptor(chain, digital8_card(100, None));

    let err = Node::create_from_json(&descriptor, manual_options()).unwrap_err();
    assert_eq!(err.code_name(), "CHASSIS_CREATE_ERROR");
}

#[test]
fn locked_point_survives_the_execution_cycle() {
    let descriptor = node_descriptor(
        and_chain(
            json!({ "val": true, "id": 20 }),
            json!({ "val": true, "id": 21 }),
        ),
        digital8_card(100, None),
    );
    let node = Node::create_from_json(&descriptor, manual_options()).unwrap();
    assert!(node.start(0));

    // An operator lock on the output vetoes component writes.
    let p3 = node.point_db().lookup_by_id(12).unwrap();
    p3.from_json(
        &json!({ "val": false, "locked": true }),
        LockRequest::NoRequest,
    )
    .unwrap();

    node.chassis(0)
        .unwrap()
        .execution_set(0)
        .unwrap()
        .execute(1_000)
        .unwrap();
    assert_eq!(read_value::<bool>(p3.as_ref()).unwrap(), Some(false));
    assert!(p3.is_locked());
}
