#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the droidworks engine.
//!
//! The [`World`] owns every registered [`Entity`], the lazily materialized
//! [`Tilemap`] and the bounded [`MovementJournal`]. Each call to
//! [`World::tick`] runs the same pipeline: resolve the movement intents
//! issued during the previous tick, queue tow follow-ups, let every entity
//! act in registry order, then run the world-level tile mutators. Tools are
//! invoked between ticks through [`World::invoke_tool`].

mod behavior;
mod chassis;
mod component;
pub mod components;
mod context;
mod entity;
mod journal;
pub mod models;
mod tiles;

use std::fmt;

use droidworks_core::{
    set_print_threshold, ComponentId, ConfigError, EntityId, JournalEntry, MapConfig,
    MoveOutcome, SimulationConfig, ToolCall, ToolOutcome, ToolSpec,
};
use droidworks_system_movement::{self as movement, Body, MoveResolution, Mover};
use thiserror::Error;

pub use behavior::{Behavior, RandomWalker};
pub use chassis::{Chassis, InstallFailure, Slot, SlotError};
pub use component::{
    Capability, Component, ComponentKind, ComponentQuery, HookError, Module, ToolError,
};
pub use entity::Entity;
pub use journal::MovementJournal;
pub use tiles::{TileError, TileId, TileMutator, TileRegistry, TileType, Tilemap};

use context::{follow_up_intent, Context, FollowUp, Others};

/// Failure to change the entity registry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Another registered entity already uses this id.
    #[error("entity `{0}` is already registered")]
    DuplicateEntity(EntityId),
}

/// Authoritative simulation state.
pub struct World {
    config: SimulationConfig,
    entities: Vec<Entity>,
    tilemap: Option<Tilemap>,
    journal: MovementJournal,
    tick_count: u64,
    mutators: Vec<Box<dyn TileMutator>>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("entities", &self.entities.len())
            .field("tilemap", &self.tilemap.is_some())
            .field("journal", &self.journal.len())
            .field("tick_count", &self.tick_count)
            .field("mutators", &self.mutators.len())
            .finish()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(SimulationConfig::default())
    }

    /// Creates an empty world after validating `config`. Also applies the
    /// configured log echo threshold.
    pub fn with_config(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        set_print_threshold(config.log_print_level);
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: SimulationConfig) -> Self {
        Self {
            journal: MovementJournal::new(config.journal_capacity),
            config,
            entities: Vec::new(),
            tilemap: None,
            tick_count: 0,
            mutators: Vec::new(),
        }
    }

    /// Configuration the world was built with.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Number of completed ticks.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Audit trail of resolved intents.
    #[must_use]
    pub const fn journal(&self) -> &MovementJournal {
        &self.journal
    }

    /// Registers an entity. Ids must be unique within the registry.
    pub fn add_entity(&mut self, mut entity: Entity) -> Result<EntityId, RegistryError> {
        let id = entity.id().clone();
        if self.entities.iter().any(|known| known.id() == &id) {
            return Err(RegistryError::DuplicateEntity(id));
        }
        entity.info(format!("Entity {id} added to world."));
        tracing::debug!(entity = %id, location = %entity.location(), "entity registered");
        self.entities.push(entity);
        Ok(id)
    }

    /// Removes an entity; it receives no further ticks.
    pub fn remove_entity(&mut self, id: &EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|entity| entity.id() == id)?;
        Some(self.entities.remove(index))
    }

    /// Removes an entity by the string form of its id.
    pub fn remove_entity_by_id(&mut self, id: &str) -> Option<Entity> {
        let index = self
            .entities
            .iter()
            .position(|entity| entity.id().as_str() == id)?;
        Some(self.entities.remove(index))
    }

    /// Removes every entity.
    pub fn clear_entities(&mut self) {
        self.entities.clear();
    }

    /// Registered entities in registry order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Looks an entity up by id.
    #[must_use]
    pub fn get_entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    /// Mutable lookup by id.
    pub fn get_entity_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id() == id)
    }

    /// Entities whose id, type name or name equals `identifier`.
    #[must_use]
    pub fn get_entities(&self, identifier: &str) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|entity| entity.matches(identifier))
            .collect()
    }

    /// First registered entity of a type.
    #[must_use]
    pub fn first_of_type(&self, type_name: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|entity| entity.type_name() == type_name)
    }

    /// The map, if it has been materialized or set.
    #[must_use]
    pub const fn tilemap(&self) -> Option<&Tilemap> {
        self.tilemap.as_ref()
    }

    /// The map, materializing the configured default on first access.
    pub fn tilemap_mut(&mut self) -> &mut Tilemap {
        materialize(&mut self.tilemap, self.config.map)
    }

    /// Replaces the map.
    pub fn set_tilemap(&mut self, tilemap: Tilemap) {
        self.tilemap = Some(tilemap);
    }

    /// Registers a hook run once per tick after every entity has acted.
    pub fn add_tile_mutator(&mut self, mutator: Box<dyn TileMutator>) {
        self.mutators.push(mutator);
    }

    /// Tools an entity currently offers.
    pub fn available_tools(&mut self, id: &EntityId) -> Result<Vec<&'static ToolSpec>, ToolError> {
        self.get_entity_mut(id)
            .map(Entity::get_available_tools)
            .ok_or_else(|| ToolError::UnknownEntity(id.clone()))
    }

    /// Invokes a tool on an entity between ticks.
    ///
    /// Unknown entities, unknown tools and malformed arguments are errors.
    /// Domain failures come back as a failed [`ToolOutcome`].
    pub fn invoke_tool(&mut self, id: &EntityId, call: &ToolCall) -> Result<ToolOutcome, ToolError> {
        let unknown = || ToolError::UnknownEntity(id.clone());
        let index = self
            .entities
            .iter()
            .position(|entity| entity.id() == id)
            .ok_or_else(unknown)?;
        let tick = self.tick_count;
        let Self {
            config,
            entities,
            tilemap,
            ..
        } = self;
        let tilemap = materialize(tilemap, config.map);
        let mut followups = Vec::new();
        let outcome = with_context(entities, index, tick, tilemap, &mut followups, |entity, ctx| {
            entity.invoke_tool(call, ctx)
        })
        .ok_or_else(unknown)??;
        tracing::debug!(entity = %id, tool = %call.name, state = ?outcome.state, "tool invoked");
        Ok(outcome)
    }

    /// Latest outcome of a tool invoked on one of an entity's components.
    #[must_use]
    pub fn action_status(&self, entity: &EntityId, component: &ComponentId) -> Option<&ToolOutcome> {
        self.get_entity(entity)?
            .chassis()
            .get_component(component)?
            .action()
    }

    /// Advances the simulation by one tick.
    pub fn tick(&mut self) {
        let tick = self.tick_count + 1;
        let Self {
            config,
            entities,
            tilemap,
            journal,
            mutators,
            ..
        } = self;
        let tilemap = materialize(tilemap, config.map);
        let mut followups = Vec::new();

        resolve_movement(tick, entities, tilemap, journal, &mut followups);
        queue_follow_ups(entities, &mut followups);

        for index in 0..entities.len() {
            let _ = with_context(entities, index, tick, tilemap, &mut followups, |entity, ctx| {
                entity.tick(ctx);
            });
        }
        queue_follow_ups(entities, &mut followups);

        for mutator in mutators.iter_mut() {
            mutator.mutate(tilemap, tick);
        }
        self.tick_count = tick;
    }
}

fn materialize(tilemap: &mut Option<Tilemap>, map: MapConfig) -> &mut Tilemap {
    tilemap.get_or_insert_with(|| Tilemap::bordered(map.width, map.height))
}

/// Runs `f` on one entity with every other entity reachable through the
/// context.
fn with_context<R>(
    entities: &mut [Entity],
    index: usize,
    tick: u64,
    tilemap: &Tilemap,
    followups: &mut Vec<FollowUp>,
    f: impl FnOnce(&mut Entity, &mut Context<'_>) -> R,
) -> Option<R> {
    if index >= entities.len() {
        return None;
    }
    let (before, rest) = entities.split_at_mut(index);
    let (entity, after) = rest.split_first_mut()?;
    let mut ctx = Context::new(tick, tilemap, Others::new(before, after), followups);
    Some(f(entity, &mut ctx))
}

fn resolve_movement(
    tick: u64,
    entities: &mut [Entity],
    tilemap: &Tilemap,
    journal: &mut MovementJournal,
    followups: &mut Vec<FollowUp>,
) {
    let bodies: Vec<Body> = entities.iter().map(Entity::body).collect();
    let movers: Vec<Mover> = entities
        .iter()
        .filter_map(|entity| {
            let intent = entity.chassis().pending_intent()?.clone();
            Some(Mover {
                body: entity.body(),
                priority: entity.chassis().move_priority(),
                intent,
            })
        })
        .collect();
    if movers.is_empty() {
        return;
    }

    let resolutions = movement::resolve(movers, &bodies, tilemap);
    let index_of = |entities: &[Entity], id: &EntityId| {
        entities.iter().position(|entity| entity.id() == id)
    };

    let applied: Vec<(usize, &MoveResolution)> = resolutions
        .iter()
        .filter(|resolution| resolution.is_applied())
        .filter_map(|resolution| Some((index_of(entities, &resolution.id)?, resolution)))
        .collect();
    for &(index, resolution) in &applied {
        entities[index].set_location(resolution.to);
    }
    for &(index, resolution) in &applied {
        let _ = with_context(entities, index, tick, tilemap, followups, |entity, ctx| {
            entity.for_each_component(ctx, "on_move_applied", |component, host, ctx| {
                component.on_move_applied(host, resolution.from, &resolution.intent, ctx)
            });
        });
    }

    for resolution in &resolutions {
        let MoveOutcome::Blocked(reason) = resolution.outcome else {
            continue;
        };
        let Some(index) = index_of(entities, &resolution.id) else {
            continue;
        };
        let _ = with_context(entities, index, tick, tilemap, followups, |entity, ctx| {
            entity.for_each_component(ctx, "on_move_blocked", |component, _, _| {
                component.on_move_blocked(&resolution.intent, reason, resolution.blocker.as_ref())
            });
        });

        if resolution.intent.metadata_value("source") != Some("TowCable") {
            continue;
        }
        let leader = resolution.intent.metadata_value("leader");
        if let Some(leader) = entities
            .iter_mut()
            .find(|entity| Some(entity.id().as_str()) == leader)
        {
            let _ = leader
                .chassis_mut()
                .components_mut()
                .any(|component| component.drop_tow(&resolution.id, reason));
        }
    }

    let applied = applied.len();
    tracing::debug!(
        tick,
        applied,
        blocked = resolutions.len() - applied,
        "movement resolved"
    );
    for resolution in resolutions {
        if let Some(index) = index_of(entities, &resolution.id) {
            let _ = entities[index].chassis_mut().clear_intent();
        }
        journal.push(JournalEntry {
            tick,
            entity: resolution.id,
            from: resolution.from,
            to: resolution.to,
            outcome: resolution.outcome,
            blocker: resolution.blocker,
        });
    }
}

/// Turns tow follow-ups into intents on their followers.
fn queue_follow_ups(entities: &mut [Entity], followups: &mut Vec<FollowUp>) {
    for follow_up in followups.drain(..) {
        let Some(follower) = entities
            .iter_mut()
            .find(|entity| entity.id() == &follow_up.follower)
        else {
            tracing::debug!(follower = %follow_up.follower, "tow follow-up dropped: follower is gone");
            continue;
        };
        let Some(intent) = follow_up_intent(follower.location(), &follow_up) else {
            tracing::debug!(
                follower = %follow_up.follower,
                target = %follow_up.target,
                "tow follow-up dropped: vacated tile is not one step away"
            );
            continue;
        };
        if let Err(rejection) = follower.chassis_mut().request_intent(intent) {
            tracing::debug!(follower = %follow_up.follower, %rejection, "tow follow-up dropped");
        }
    }
}

/// Read-only queries and serializable snapshots of the world.
pub mod query {
    use std::collections::BTreeMap;

    use droidworks_core::{EntityId, Footprint, JournalEntry, Location, MovementIntent};
    use serde::Serialize;

    use super::{Chassis, Entity, TileId, TileRegistry, World};

    /// Captures the whole world for rendering or telemetry.
    #[must_use]
    pub fn snapshot(world: &World) -> WorldSnapshot<'_> {
        WorldSnapshot {
            tick: world.tick_count,
            entities: world.entities.iter().map(EntitySnapshot::of).collect(),
            tilemap: world.tilemap.as_ref().map(|tilemap| TilemapSnapshot {
                width: tilemap.width(),
                height: tilemap.height(),
                rows: tilemap
                    .rows()
                    .map(|row| row.iter().map(TileId::get).collect())
                    .collect(),
                tile_types: tilemap.registry(),
            }),
            journal: world.journal.iter().collect(),
        }
    }

    /// [`snapshot`] rendered as JSON.
    pub fn snapshot_json(world: &World) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(snapshot(world))
    }

    /// Every covered tile mapped to the entity covering it.
    #[must_use]
    pub fn occupancy(world: &World) -> BTreeMap<Location, EntityId> {
        world
            .entities
            .iter()
            .flat_map(|entity| {
                entity
                    .chassis()
                    .footprint()
                    .cells(entity.location())
                    .map(move |cell| (cell, entity.id().clone()))
            })
            .collect()
    }

    /// Entity whose footprint covers `location`.
    #[must_use]
    pub fn entity_at(world: &World, location: Location) -> Option<&Entity> {
        world.entities.iter().find(|entity| {
            entity
                .chassis()
                .footprint()
                .cells(entity.location())
                .any(|cell| cell == location)
        })
    }

    /// Serializable view of the world at the end of a tick.
    #[derive(Clone, Debug, Serialize)]
    pub struct WorldSnapshot<'a> {
        /// Completed ticks.
        pub tick: u64,
        /// Entities in registry order.
        pub entities: Vec<EntitySnapshot<'a>>,
        /// The map, once materialized.
        pub tilemap: Option<TilemapSnapshot<'a>>,
        /// Journal entries, oldest first.
        pub journal: Vec<&'a JournalEntry>,
    }

    /// Serializable view of one entity.
    #[derive(Clone, Debug, Serialize)]
    pub struct EntitySnapshot<'a> {
        /// Unique id.
        pub id: &'a EntityId,
        /// Type name.
        pub type_name: &'a str,
        /// Human-readable name.
        pub name: Option<&'a str>,
        /// Footprint anchor.
        pub location: Location,
        /// Covered tiles.
        pub footprint: Footprint,
        /// Intent waiting for the next pass.
        pub pending_intent: Option<&'a MovementIntent>,
        /// Slots, components and movement state.
        pub chassis: &'a Chassis,
    }

    impl<'a> EntitySnapshot<'a> {
        fn of(entity: &'a Entity) -> Self {
            Self {
                id: entity.id(),
                type_name: entity.type_name(),
                name: entity.name(),
                location: entity.location(),
                footprint: entity.chassis().footprint(),
                pending_intent: entity.chassis().pending_intent(),
                chassis: entity.chassis(),
            }
        }
    }

    /// Serializable view of the map.
    #[derive(Clone, Debug, Serialize)]
    pub struct TilemapSnapshot<'a> {
        /// Number of columns.
        pub width: u32,
        /// Number of rows.
        pub height: u32,
        /// Tile ids row by row.
        pub rows: Vec<Vec<u16>>,
        /// Definitions of the tile ids.
        pub tile_types: &'a TileRegistry,
    }
}
