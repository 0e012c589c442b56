#![allow(dead_code)]

use droidworks_core::{EntityId, JournalEntry, Location, MapConfig, SimulationConfig};
use droidworks_world::{Entity, World};

/// World with a bordered map of the given size, materialized up front.
pub fn world(width: u32, height: u32) -> World {
    let config = SimulationConfig {
        map: MapConfig { width, height },
        ..SimulationConfig::default()
    };
    let mut world = World::with_config(config).expect("valid config");
    let _ = world.tilemap_mut();
    world
}

/// Slotless unit chassis with a fixed id and priority.
pub fn unit(id: &str, x: i32, y: i32, priority: i32) -> Entity {
    Entity::with_id(EntityId::new(id), "Probe", Location::new(x, y)).with_move_priority(priority)
}

pub fn add(world: &mut World, entity: Entity) -> EntityId {
    world.add_entity(entity).expect("unique id")
}

pub fn location(world: &World, id: &EntityId) -> Location {
    world.get_entity(id).expect("registered").location()
}

pub fn last_entry<'w>(world: &'w World, id: &EntityId) -> &'w JournalEntry {
    world
        .journal()
        .iter()
        .rev()
        .find(|entry| &entry.entity == id)
        .expect("journal entry for entity")
}

pub fn request(world: &mut World, id: &EntityId, dx: i32, dy: i32) {
    world
        .get_entity_mut(id)
        .expect("registered")
        .request_move(dx, dy)
        .expect("valid step without pending intent");
}
