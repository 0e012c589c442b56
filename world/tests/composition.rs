mod support;

use droidworks_core::{EntityId, Location, ToolCall, ToolState};
use droidworks_world::{
    components::{Gripper, Storage},
    models, query, Component, ComponentKind, Entity, SlotError, World,
};
use serde_json::json;
use support::add;

fn gripper_rig(world: &mut World, x: i32, y: i32) -> EntityId {
    let mut r2 = models::entity("R2Astromech", Location::new(x, y)).expect("known model");
    let chassis = r2.chassis_mut();
    chassis
        .install_component("manipulator_1", models::component("Gripper").expect("known model"))
        .expect("any slot");
    chassis
        .install_component(
            "manipulator_2",
            models::component("SmallStorage").expect("known model"),
        )
        .expect("any slot");
    add(world, r2)
}

fn call(world: &mut World, id: &EntityId, tool: &str, arguments: serde_json::Value) -> ToolState {
    world
        .invoke_tool(id, &ToolCall::new(tool, arguments))
        .expect("gripper tool")
        .state
}

#[test]
fn lookups_by_kind_slot_and_id_return_the_same_component() {
    let mut r2 = models::entity("R2Astromech", Location::new(3, 3)).expect("known model");
    let cable = models::component("TowCable").expect("known model");
    let cable_id = cable.id().clone();
    r2.chassis_mut()
        .install_component("manipulator_1", cable)
        .expect("any slot");

    let chassis = r2.chassis();
    let by_kind = chassis.get_component(ComponentKind::TowCable).expect("by kind");
    let by_slot = chassis.get_component("manipulator_1").expect("by slot");
    let by_id = chassis.get_component(&cable_id).expect("by id");
    let by_name = chassis.get_component("TowCable").expect("by type name");
    assert!(std::ptr::eq(by_kind, by_slot));
    assert!(std::ptr::eq(by_slot, by_id));
    assert!(std::ptr::eq(by_id, by_name));
    assert_eq!(by_id.chassis(), Some(r2.id()));
}

#[test]
fn gripper_counts_as_storage_in_lookups() {
    let mut world = support::world(16, 16);
    let r2 = gripper_rig(&mut world, 5, 5);
    let chassis = world.get_entity(&r2).expect("registered").chassis();
    let first_storage = chassis
        .get_component(ComponentKind::Storage)
        .expect("lineage lookup");
    assert_eq!(first_storage.kind(), ComponentKind::Gripper);
    assert_eq!(chassis.get::<Storage>().map(Storage::capacity), Some(1));
}

#[test]
fn rejected_installs_hand_the_component_back() {
    let mut r2 = models::entity("R2Astromech", Location::new(3, 3)).expect("known model");
    let chassis = r2.chassis_mut();

    let tank = models::component("WaterTank").expect("known model");
    let tank_id = tank.id().clone();
    let failure = chassis
        .install_component("motivator", tank)
        .expect_err("motivator slot refuses a tank");
    assert!(matches!(
        failure.reason,
        SlotError::IncompatibleType {
            expected: ComponentKind::Motivator,
            found: ComponentKind::WaterTank,
            ..
        }
    ));
    assert_eq!(failure.component.id(), &tank_id);

    let failure = chassis
        .install_component("power_pack", *failure.component)
        .expect_err("tank is not a power pack");
    let failure = chassis
        .install_component("manipulator_9", *failure.component)
        .expect_err("undeclared slot");
    assert_eq!(failure.reason, SlotError::UnknownSlot("manipulator_9".into()));

    let spare = models::component("Motivator").expect("known model");
    let failure = chassis
        .install_component("motivator", spare)
        .expect_err("slot already holds the default");
    assert!(matches!(failure.reason, SlotError::SlotOccupied { .. }));

    assert_eq!(
        chassis.uninstall_component("processor").map(|_| ()),
        Err(SlotError::EmptySlot("processor".into()))
    );
    assert_eq!(
        chassis.add_slot("processor", ComponentKind::Any),
        Err(SlotError::DuplicateSlot("processor".into()))
    );
}

#[test]
fn uninstall_clears_the_back_reference() {
    let mut r2 = models::entity("R2Astromech", Location::new(3, 3)).expect("known model");
    let motivator = r2
        .chassis_mut()
        .uninstall_component("motivator")
        .expect("default motivator");
    assert_eq!(motivator.chassis(), None);
    assert!(r2.chassis().get_component("motivator").is_none());
    assert!(r2
        .chassis()
        .slots()
        .iter()
        .any(|slot| slot.id() == "motivator" && slot.is_vacant()));
}

#[test]
fn gripper_moves_a_condenser_through_storage_and_back() {
    let mut world = support::world(16, 16);
    let r2 = gripper_rig(&mut world, 5, 5);
    let vaporator = add(
        &mut world,
        models::entity("GX1Vaporator", Location::new(6, 5)).expect("known model"),
    );

    let pulled = call(
        &mut world,
        &r2,
        "pull_component",
        json!({ "target_component": "CondenserUnit", "target_entity": "GX1Vaporator" }),
    );
    assert_eq!(pulled, ToolState::Success);
    let vaporator_chassis = world.get_entity(&vaporator).expect("registered").chassis();
    assert!(vaporator_chassis.get_component("condenser").is_none());
    let gripper = world
        .get_entity(&r2)
        .and_then(|entity| entity.chassis().get::<Gripper>())
        .expect("installed");
    let held = gripper.held().expect("condenser in hand");
    assert_eq!(held.model(), "CondenserUnit");
    assert_eq!(held.chassis(), None);

    assert_eq!(call(&mut world, &r2, "store_component", json!({})), ToolState::Success);
    let chassis = world.get_entity(&r2).expect("registered").chassis();
    let storage = chassis
        .get_component("manipulator_2")
        .and_then(Component::get::<Storage>)
        .expect("small storage");
    assert_eq!(storage.inventory().len(), 1);
    assert!(chassis.get::<Gripper>().and_then(Gripper::held).is_none());

    assert_eq!(
        call(
            &mut world,
            &r2,
            "unstore_component",
            json!({ "target_component": "CondenserUnit" })
        ),
        ToolState::Success
    );
    assert_eq!(
        call(
            &mut world,
            &r2,
            "install_component",
            json!({ "target_entity": "GX1Vaporator" })
        ),
        ToolState::Success
    );

    let condenser = world
        .get_entity(&vaporator)
        .and_then(|entity| entity.chassis().get_component("condenser"))
        .expect("reinstalled");
    assert_eq!(condenser.chassis(), Some(&vaporator));
}

#[test]
fn gripper_refuses_distant_targets_and_double_pulls() {
    let mut world = support::world(16, 16);
    let r2 = gripper_rig(&mut world, 5, 5);
    let _ = add(
        &mut world,
        models::entity("GX1Vaporator", Location::new(9, 5)).expect("known model"),
    );
    let near = add(
        &mut world,
        models::entity("GX8Vaporator", Location::new(5, 6)).expect("known model"),
    );

    let far = json!({ "target_component": "WaterTank", "target_entity": "GX1Vaporator" });
    assert_eq!(call(&mut world, &r2, "pull_component", far), ToolState::Failure);

    let close = json!({ "target_component": "WaterTank", "target_entity": near.as_str() });
    assert_eq!(call(&mut world, &r2, "pull_component", close.clone()), ToolState::Success);
    assert_eq!(call(&mut world, &r2, "pull_component", close), ToolState::Failure);
}

#[test]
fn malformed_gripper_calls_are_errors() {
    let mut world = support::world(16, 16);
    let r2 = gripper_rig(&mut world, 5, 5);
    let missing = world.invoke_tool(&r2, &ToolCall::new("pull_component", json!({})));
    assert!(missing.is_err());
    let unknown = world.invoke_tool(&r2, &ToolCall::new("fly", json!({})));
    assert!(unknown.is_err());
}

#[test]
fn stored_components_are_listed_in_snapshots_and_never_tick() {
    let mut world = support::world(16, 16);
    let mut container =
        models::entity("StorageContainer", Location::new(4, 4)).expect("known model");
    let cell = models::component("SolarPanel").expect("known model");
    let stored = container
        .chassis_mut()
        .store_component(cell)
        .expect("room in the crate");
    let container = add(&mut world, container);

    for _ in 0..3 {
        world.tick();
    }

    let snapshot = query::snapshot_json(&world).expect("serializable");
    let slot = &snapshot["entities"][0]["chassis"]["slots"][0];
    assert_eq!(slot["component"]["id"], stored.as_str());
    assert_eq!(slot["component"]["state"]["inventory"][0]["model"], "SolarPanel");
    assert_eq!(slot["component"]["state"]["inventory"][0]["state"]["cooldown"], 0);
    assert_eq!(world.get_entity(&container).map(Entity::type_name), Some("StorageContainer"));
}
