#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the droidworks engine.
//!
//! This crate defines the value surface that connects the authoritative
//! world, the pure movement resolver, and adapters. Chassis propose
//! [`MovementIntent`] values, the resolver answers each one with a
//! [`MoveOutcome`], and the world records the results as [`JournalEntry`]
//! values. Nothing in here owns simulation state.

mod config;
mod identity;
mod tool;

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::{ConfigError, MapConfig, SimulationConfig, MAX_MAP_TILES};
pub use identity::{
    generate_id, print_threshold, set_print_threshold, Identity, LogLevel, LogRecord,
};
pub use tool::{ParamKind, ToolCall, ToolOutcome, ToolParam, ToolSpec, ToolState};

/// Unique identifier assigned to an entity registered in a world.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates the next identifier for the provided type name.
    #[must_use]
    pub fn generate(type_name: &str) -> Self {
        Self(generate_id(type_name))
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier assigned to a capability module.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates the next identifier for the provided model name.
    #[must_use]
    pub fn generate(model: &str) -> Self {
        Self(generate_id(model))
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ComponentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Integer grid location. Negative rows describe open space above the map.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Location {
    /// Column index.
    pub x: i32,
    /// Row index.
    pub y: i32,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the location shifted by the provided delta.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Manhattan distance between two locations.
    #[must_use]
    pub const fn distance_to(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Reports whether the other location is at most one orthogonal step away.
    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.distance_to(other) <= 1
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Rectangular tile footprint anchored at an entity's top-left location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    width: u32,
    height: u32,
}

impl Footprint {
    /// Footprint covering exactly one tile.
    pub const UNIT: Self = Self {
        width: 1,
        height: 1,
    };

    /// Creates a footprint; zero dimensions are clamped to one tile.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width: if width == 0 { 1 } else { width },
            height: if height == 0 { 1 } else { height },
        }
    }

    /// Number of columns covered.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows covered.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Enumerates every covered tile in row-major order.
    pub fn cells(self, anchor: Location) -> impl Iterator<Item = Location> {
        let width = i32::try_from(self.width).unwrap_or(i32::MAX);
        let height = i32::try_from(self.height).unwrap_or(i32::MAX);
        (0..height).flat_map(move |row| {
            (0..width).map(move |column| anchor.offset(column, row))
        })
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Kind tag attached to a movement intent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// Single-tile step.
    #[default]
    Step,
}

/// Structural rejection returned when an intent cannot be queued.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IntentRejection {
    /// Delta components must lie in `-1..=1` and must not both be zero.
    #[error("invalid movement delta ({dx}, {dy})")]
    InvalidDelta {
        /// Requested column delta.
        dx: i32,
        /// Requested row delta.
        dy: i32,
    },
    /// The chassis already holds an intent for the next resolution pass.
    #[error("a movement intent is already pending")]
    PendingIntentExists,
}

/// Single-step move proposal for the next resolution pass.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementIntent {
    dx: i32,
    dy: i32,
    kind: IntentKind,
    metadata: BTreeMap<String, String>,
}

impl MovementIntent {
    /// Creates a validated step intent.
    pub fn step(dx: i32, dy: i32) -> Result<Self, IntentRejection> {
        let intent = Self::unchecked(dx, dy);
        intent.validate()?;
        Ok(intent)
    }

    /// Creates a step intent without validating its shape.
    ///
    /// The resolver re-validates every intent and reports malformed ones as
    /// [`BlockReason::InvalidIntent`].
    #[must_use]
    pub fn unchecked(dx: i32, dy: i32) -> Self {
        Self {
            dx,
            dy,
            kind: IntentKind::Step,
            metadata: BTreeMap::new(),
        }
    }

    /// Attaches an opaque metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.metadata.insert(key.into(), value.into());
        self
    }

    /// Checks the delta range and rejects the zero step.
    pub fn validate(&self) -> Result<(), IntentRejection> {
        let in_range = (-1..=1).contains(&self.dx) && (-1..=1).contains(&self.dy);
        if !in_range || (self.dx == 0 && self.dy == 0) {
            return Err(IntentRejection::InvalidDelta {
                dx: self.dx,
                dy: self.dy,
            });
        }
        Ok(())
    }

    /// Column delta.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.dx
    }

    /// Row delta.
    #[must_use]
    pub const fn dy(&self) -> i32 {
        self.dy
    }

    /// Kind tag of the intent.
    #[must_use]
    pub const fn kind(&self) -> IntentKind {
        self.kind
    }

    /// Opaque metadata attached by the issuer.
    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Looks up a single metadata value.
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Reason a movement intent failed to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// The intent shape was malformed.
    InvalidIntent,
    /// A target cell lies outside the map.
    OutOfBounds,
    /// A target cell is impassable terrain.
    BlockedTile,
    /// A target cell is held by another chassis.
    Occupied,
}

impl BlockReason {
    /// Stable reason code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidIntent => "invalid_intent",
            Self::OutOfBounds => "out_of_bounds",
            Self::BlockedTile => "blocked_tile",
            Self::Occupied => "occupied",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of resolving a single movement intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum MoveOutcome {
    /// The chassis moved to the target location.
    Applied,
    /// The chassis stayed put.
    Blocked(BlockReason),
}

impl MoveOutcome {
    /// Outcome tag recorded in the journal.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Applied => "success",
            Self::Blocked(reason) => reason.code(),
        }
    }

    /// Reports whether the move was applied.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Audit record for one resolved intent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JournalEntry {
    /// World tick during which the intent was resolved.
    pub tick: u64,
    /// Chassis that issued the intent.
    pub entity: EntityId,
    /// Location before resolution.
    pub from: Location,
    /// Attempted target location.
    pub to: Location,
    /// How the intent resolved.
    pub outcome: MoveOutcome,
    /// Chassis that held the contested tile, if any.
    pub blocker: Option<EntityId>,
}

/// Read-only terrain query consumed by the movement resolver.
pub trait Terrain {
    /// Map width and height measured in tiles.
    fn dimensions(&self) -> (u32, u32);

    /// Reports whether the tile can be entered. Out-of-range tiles are not.
    fn is_passable(&self, location: Location) -> bool;
}
