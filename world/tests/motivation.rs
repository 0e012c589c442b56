mod support;

use droidworks_core::{
    BlockReason, ComponentId, EntityId, Location, MoveOutcome, ToolCall, ToolState,
};
use droidworks_world::{
    components::{Motivator, PowerPack, Stall},
    models, ComponentKind, Entity, TileId, Tilemap, World,
};
use serde_json::json;
use support::{add, last_entry, location};

fn astromech(world: &mut World, x: i32, y: i32) -> (EntityId, ComponentId) {
    let r2 = models::entity("R2Astromech", Location::new(x, y)).expect("known model");
    let motivator = r2
        .chassis()
        .get_component(ComponentKind::Motivator)
        .expect("default motivator")
        .id()
        .clone();
    (add(world, r2), motivator)
}

fn move_to(world: &mut World, id: &EntityId, x: i32, y: i32) -> ToolState {
    world
        .invoke_tool(id, &ToolCall::new("move_to_location", json!({ "x": x, "y": y })))
        .expect("motivator tool")
        .state
}

fn charge(world: &World, id: &EntityId) -> u32 {
    world
        .get_entity(id)
        .and_then(|entity| entity.chassis().get::<PowerPack>())
        .map(PowerPack::charge)
        .expect("power pack")
}

#[test]
fn intents_issued_during_a_tick_resolve_on_the_next() {
    let mut world = support::world(16, 16);
    let (r2, _) = astromech(&mut world, 5, 5);
    assert_eq!(move_to(&mut world, &r2, 8, 5), ToolState::Pending);

    world.tick();
    let entity = world.get_entity(&r2).expect("registered");
    assert_eq!(entity.location(), Location::new(5, 5));
    assert!(entity.chassis().pending_intent().is_some());
    assert!(world.journal().is_empty());

    world.tick();
    assert_eq!(location(&world, &r2), Location::new(6, 5));
    assert_eq!(last_entry(&world, &r2).tick, 2);
}

#[test]
fn motivator_walks_to_destination_spending_one_charge_per_step() {
    let mut world = support::world(16, 16);
    let (r2, motivator) = astromech(&mut world, 5, 5);
    let _ = move_to(&mut world, &r2, 8, 5);

    for _ in 0..6 {
        world.tick();
    }

    assert_eq!(location(&world, &r2), Location::new(8, 5));
    assert_eq!(charge(&world, &r2), 47);
    let status = world.action_status(&r2, &motivator).expect("action recorded");
    assert_eq!(status.state, ToolState::Success);
    assert_eq!(status.message, "Arrived at destination (8, 5).");
}

#[test]
fn cooldown_spaces_out_steps() {
    let mut world = support::world(16, 16);
    let (r2, _) = astromech(&mut world, 5, 5);
    let _ = move_to(&mut world, &r2, 10, 5);

    for _ in 0..2 {
        world.tick();
    }
    let stall = world
        .get_entity(&r2)
        .and_then(|entity| entity.chassis().get::<Motivator>())
        .and_then(Motivator::stall);
    assert_eq!(stall, Some(Stall::Cooldown));
    assert!(world
        .get_entity(&r2)
        .expect("registered")
        .chassis()
        .pending_intent()
        .is_none());
}

#[test]
fn empty_pack_stalls_without_moving() {
    let mut world = support::world(16, 16);
    let (r2, _) = astromech(&mut world, 5, 5);
    if let Some(pack) = world
        .get_entity_mut(&r2)
        .and_then(|entity| entity.chassis_mut().get_mut::<PowerPack>())
    {
        pack.set_charge(0);
    }
    let _ = move_to(&mut world, &r2, 8, 5);

    for _ in 0..4 {
        world.tick();
    }

    assert_eq!(location(&world, &r2), Location::new(5, 5));
    let motivator = world
        .get_entity(&r2)
        .and_then(|entity| entity.chassis().get::<Motivator>())
        .expect("installed");
    assert_eq!(motivator.stall(), Some(Stall::NoPower));
    assert!(world.journal().is_empty());
}

#[test]
fn blocked_step_costs_nothing_and_keeps_the_action_pending() {
    let mut world = support::world(16, 16);
    let (r2, motivator) = astromech(&mut world, 1, 5);
    let _ = move_to(&mut world, &r2, 0, 5);

    world.tick();
    world.tick();

    assert_eq!(
        last_entry(&world, &r2).outcome,
        MoveOutcome::Blocked(BlockReason::BlockedTile)
    );
    assert_eq!(location(&world, &r2), Location::new(1, 5));
    assert_eq!(charge(&world, &r2), 50);
    let component = world
        .get_entity(&r2)
        .and_then(|entity| entity.chassis().get_component(&motivator))
        .expect("installed");
    assert!(component
        .logs()
        .iter()
        .any(|record| record.message.starts_with("Move blocked: reason=blocked_tile")));
    assert_eq!(
        world.action_status(&r2, &motivator).map(|outcome| outcome.state),
        Some(ToolState::Pending)
    );
}

#[test]
fn leaving_the_map_abandons_the_destination() {
    let mut world = World::new();
    world.set_tilemap(Tilemap::new(16, 16, TileId::SAND));
    let (r2, motivator) = astromech(&mut world, 4, 5);
    assert_eq!(move_to(&mut world, &r2, 10, 5), ToolState::Pending);
    world.set_tilemap(Tilemap::new(5, 16, TileId::SAND));

    world.tick();
    world.tick();

    assert_eq!(
        last_entry(&world, &r2).outcome,
        MoveOutcome::Blocked(BlockReason::OutOfBounds)
    );
    let status = world.action_status(&r2, &motivator).expect("action recorded");
    assert_eq!(status.state, ToolState::Failure);
    assert_eq!(charge(&world, &r2), 50);
}

#[test]
fn destinations_beyond_the_map_are_refused() {
    let mut world = World::new();
    world.set_tilemap(Tilemap::new(16, 16, TileId::SAND));
    let (r2, motivator) = astromech(&mut world, 4, 4);

    for (x, y) in [(50_000_000, 4), (i32::MAX, 4), (-1, 4), (4, 16), (4, i32::MIN)] {
        assert_eq!(move_to(&mut world, &r2, x, y), ToolState::Failure);
    }
    let motor = world
        .get_entity(&r2)
        .and_then(|entity| entity.chassis().get::<Motivator>())
        .expect("motivator");
    assert_eq!(motor.destination(), None);
    assert_eq!(motor.path().count(), 0);

    world.tick();
    world.tick();
    assert_eq!(location(&world, &r2), Location::new(4, 4));
    let status = world.action_status(&r2, &motivator).expect("action recorded");
    assert_eq!(status.state, ToolState::Failure);
    assert!(status.message.contains("outside the map"));

    assert_eq!(move_to(&mut world, &r2, 4, -3), ToolState::Pending);
}

#[test]
fn failing_move_hook_is_logged_and_the_pass_carries_on() {
    let mut world = support::world(16, 16);
    let (r2, _) = astromech(&mut world, 5, 5);
    let (other, _) = astromech(&mut world, 5, 8);
    let _ = move_to(&mut world, &r2, 8, 5);
    let _ = move_to(&mut world, &other, 8, 8);

    world.tick();
    let _ = world
        .get_entity_mut(&r2)
        .expect("registered")
        .chassis_mut()
        .uninstall_component("power_pack")
        .expect("power pack installed");
    world.tick();

    assert_eq!(location(&world, &r2), Location::new(6, 5));
    assert_eq!(last_entry(&world, &r2).outcome, MoveOutcome::Applied);
    assert_eq!(last_entry(&world, &r2).tick, 2);
    let logs = world.get_entity(&r2).expect("registered").logs();
    assert!(logs.iter().any(|record| {
        record.message == "on_move_applied hook failed: missing capability: PowerPack"
    }));

    assert_eq!(location(&world, &other), Location::new(6, 8));
    assert_eq!(last_entry(&world, &other).outcome, MoveOutcome::Applied);
    assert_eq!(charge(&world, &other), 49);
    assert!(world
        .entities()
        .iter()
        .all(|entity| entity.chassis().pending_intent().is_none()));

    world.tick();
    assert_eq!(world.tick_count(), 3);
}

#[test]
fn move_to_entity_stops_alongside_the_target() {
    let mut world = support::world(16, 16);
    let (r2, motivator) = astromech(&mut world, 2, 5);
    let _ = add(
        &mut world,
        models::entity("StorageContainer", Location::new(6, 5)).expect("known model"),
    );

    let outcome = world
        .invoke_tool(
            &r2,
            &ToolCall::new("move_to_entity", json!({ "identifier": "StorageContainer" })),
        )
        .expect("motivator tool");
    assert_eq!(outcome.state, ToolState::Pending);

    for _ in 0..8 {
        world.tick();
    }

    assert_eq!(location(&world, &r2), Location::new(5, 5));
    assert_eq!(
        world.action_status(&r2, &motivator).map(|outcome| outcome.state),
        Some(ToolState::Success)
    );
}

#[test]
fn move_to_unknown_entity_fails_immediately() {
    let mut world = support::world(16, 16);
    let (r2, _) = astromech(&mut world, 2, 5);
    let outcome = world
        .invoke_tool(
            &r2,
            &ToolCall::new("move_to_entity", json!({ "identifier": "Landspeeder" })),
        )
        .expect("motivator tool");
    assert_eq!(outcome.state, ToolState::Failure);
}

#[test]
fn motivator_without_power_pack_reports_an_error() {
    let mut world = support::world(16, 16);
    let mut rig = Entity::new("Rig", Location::new(4, 4));
    let chassis = rig.chassis_mut();
    chassis
        .add_slot("motivator", ComponentKind::Motivator)
        .expect("fresh slot");
    chassis
        .install_component("motivator", models::component("Motivator").expect("known model"))
        .expect("compatible slot");
    let rig = add(&mut world, rig);
    let _ = move_to(&mut world, &rig, 8, 4);

    world.tick();

    let entity = world.get_entity(&rig).expect("registered");
    assert!(entity.chassis().pending_intent().is_none());
    assert!(entity
        .logs()
        .iter()
        .any(|record| record.message == "Cannot function without a power pack."));
}

#[test]
fn astar_motivator_routes_around_rocks() {
    let mut world = support::world(9, 9);
    for y in 1..7 {
        world
            .tilemap_mut()
            .set_tile(Location::new(4, y), TileId::ROCK)
            .expect("inside the map");
    }
    let mut rig = models::entity("R2Astromech", Location::new(2, 2)).expect("known model");
    let _ = rig
        .chassis_mut()
        .uninstall_component("motivator")
        .expect("default motivator");
    rig.chassis_mut()
        .install_component("motivator", models::component("AStarMotivator").expect("known model"))
        .expect("compatible slot");
    let rig = add(&mut world, rig);
    let _ = move_to(&mut world, &rig, 6, 2);

    for _ in 0..40 {
        world.tick();
    }

    assert_eq!(location(&world, &rig), Location::new(6, 2));
    assert!(world
        .journal()
        .iter()
        .all(|entry| entry.outcome == MoveOutcome::Applied));
}
