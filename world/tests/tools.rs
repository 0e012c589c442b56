mod support;

use droidworks_core::{EntityId, Location, ToolCall, ToolState};
use droidworks_world::{components::Chronometer, models, ComponentKind, ToolError};
use serde_json::json;
use support::add;

#[test]
fn astromech_offers_the_tools_of_its_defaults() {
    let mut world = support::world(16, 16);
    let r2 = add(
        &mut world,
        models::entity("R2Astromech", Location::new(5, 5)).expect("known model"),
    );

    let tools = world.available_tools(&r2).expect("registered");
    let names: Vec<&str> = tools.iter().map(|tool| tool.name).collect();
    assert_eq!(
        names,
        ["move_to_location", "move_to_entity", "recharge_self", "sleep"]
    );

    let schema = tools[0].to_openai_json();
    assert_eq!(schema["type"], "function");
    assert_eq!(schema["function"]["name"], "move_to_location");
    assert_eq!(schema["function"]["parameters"]["properties"]["x"]["type"], "integer");
    assert_eq!(schema["function"]["parameters"]["required"], json!(["x", "y"]));
}

#[test]
fn sleep_stays_pending_until_the_wake_tick() {
    let mut world = support::world(16, 16);
    let r2 = add(
        &mut world,
        models::entity("R2Astromech", Location::new(5, 5)).expect("known model"),
    );
    let chronometer = world
        .get_entity(&r2)
        .and_then(|entity| entity.chassis().get_component(ComponentKind::Chronometer))
        .map(|component| component.id().clone())
        .expect("default chronometer");

    let outcome = world
        .invoke_tool(&r2, &ToolCall::new("sleep", json!({ "ticks": 3 })))
        .expect("chronometer tool");
    assert_eq!(outcome.state, ToolState::Pending);
    assert_eq!(
        world
            .get_entity(&r2)
            .and_then(|entity| entity.chassis().get::<Chronometer>())
            .and_then(Chronometer::wake_at),
        Some(3)
    );

    world.tick();
    world.tick();
    assert_eq!(
        world.action_status(&r2, &chronometer).map(|outcome| outcome.state),
        Some(ToolState::Pending)
    );

    world.tick();
    let status = world.action_status(&r2, &chronometer).expect("action recorded");
    assert_eq!(status.state, ToolState::Success);
    assert_eq!(status.message, "Woke up from sleep at 3 ticks.");
}

#[test]
fn malformed_arguments_are_errors_not_outcomes() {
    let mut world = support::world(16, 16);
    let r2 = add(
        &mut world,
        models::entity("R2Astromech", Location::new(5, 5)).expect("known model"),
    );

    let negative = world.invoke_tool(&r2, &ToolCall::new("sleep", json!({ "ticks": -2 })));
    assert!(matches!(
        negative,
        Err(ToolError::InvalidArgument { name: "ticks", .. })
    ));
    let missing = world.invoke_tool(&r2, &ToolCall::new("move_to_location", json!({ "x": 3 })));
    assert!(matches!(
        missing,
        Err(ToolError::InvalidArgument { name: "y", .. })
    ));
}

#[test]
fn unknown_entities_and_tools_are_reported() {
    let mut world = support::world(16, 16);
    let ghost = EntityId::new("Ghost_1");
    assert_eq!(
        world.invoke_tool(&ghost, &ToolCall::new("sleep", json!({ "ticks": 1 }))),
        Err(ToolError::UnknownEntity(ghost.clone()))
    );
    assert!(matches!(
        world.available_tools(&ghost),
        Err(ToolError::UnknownEntity(_))
    ));

    let crate_id = add(
        &mut world,
        models::entity("StorageContainer", Location::new(5, 5)).expect("known model"),
    );
    assert_eq!(
        world.invoke_tool(&crate_id, &ToolCall::new("sleep", json!({ "ticks": 1 }))),
        Err(ToolError::UnknownTool("sleep".into()))
    );
}
