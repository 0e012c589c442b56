//! Tile-type registry and the integer tile grid.

use std::{collections::BTreeMap, fmt};

use droidworks_core::{Location, Terrain};
use serde::Serialize;
use thiserror::Error;

/// Identifier of a registered tile type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TileId(u16);

impl TileId {
    /// Loose sand; the default interior.
    pub const SAND: Self = Self(0);
    /// Impassable rock; the default border.
    pub const ROCK: Self = Self(1);
    /// Landing pad placed at the centre of the default map.
    pub const PAD: Self = Self(2);

    /// Wraps a raw tile id.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Raw tile id.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Definition attached to a tile id.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileType {
    /// Registered id.
    pub id: TileId,
    /// Human-readable name.
    pub name: String,
    /// Whether chassis may enter the tile.
    pub passable: bool,
    /// Relative movement speed on the tile.
    pub move_speed: f32,
    /// Optional glyph used by text renderers.
    pub display_hint: Option<char>,
}

impl TileType {
    /// Creates a tile type with unit speed and no display hint.
    #[must_use]
    pub fn new(id: TileId, name: impl Into<String>, passable: bool) -> Self {
        Self {
            id,
            name: name.into(),
            passable,
            move_speed: 1.0,
            display_hint: None,
        }
    }

    /// Sets the movement-speed scalar.
    #[must_use]
    pub fn with_speed(mut self, move_speed: f32) -> Self {
        self.move_speed = move_speed;
        self
    }

    /// Sets the display glyph.
    #[must_use]
    pub fn with_hint(mut self, hint: char) -> Self {
        self.display_hint = Some(hint);
        self
    }
}

/// Errors raised by tile registration and grid edits.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TileError {
    /// The id is already registered with a different definition.
    #[error("tile type {id} is already registered as `{existing}`")]
    DuplicateId {
        /// Contested id.
        id: TileId,
        /// Name of the registered definition.
        existing: String,
    },
    /// The coordinate lies outside the grid.
    #[error("tile {location} lies outside the map")]
    OutOfRange {
        /// Offending coordinate.
        location: Location,
    },
    /// Grid rows must all share the first row's width.
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
}

/// Registry mapping tile ids to their definitions.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct TileRegistry {
    types: BTreeMap<TileId, TileType>,
}

impl TileRegistry {
    /// Registry holding sand, rock and pad.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut types = BTreeMap::new();
        for tile in [
            TileType::new(TileId::SAND, "sand", true).with_hint('.'),
            TileType::new(TileId::ROCK, "rock", false).with_hint('#'),
            TileType::new(TileId::PAD, "pad", true).with_hint('P'),
        ] {
            let _ = types.insert(tile.id, tile);
        }
        Self { types }
    }

    /// Registers a definition. Re-registering an identical definition is a no-op.
    pub fn register(&mut self, tile: TileType) -> Result<(), TileError> {
        match self.types.get(&tile.id) {
            Some(existing) if existing == &tile => Ok(()),
            Some(existing) => Err(TileError::DuplicateId {
                id: tile.id,
                existing: existing.name.clone(),
            }),
            None => {
                let _ = self.types.insert(tile.id, tile);
                Ok(())
            }
        }
    }

    /// Looks up a definition.
    #[must_use]
    pub fn get(&self, id: TileId) -> Option<&TileType> {
        self.types.get(&id)
    }

    /// Iterates definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &TileType> {
        self.types.values()
    }
}

/// Rectangular grid of tile ids plus the registry that gives them meaning.
#[derive(Clone, Debug)]
pub struct Tilemap {
    width: u32,
    height: u32,
    tiles: Vec<TileId>,
    registry: TileRegistry,
}

impl Tilemap {
    /// Width of the default map.
    pub const DEFAULT_WIDTH: u32 = 128;
    /// Height of the default map.
    pub const DEFAULT_HEIGHT: u32 = 128;

    /// Grid filled with a single tile id.
    #[must_use]
    pub fn new(width: u32, height: u32, fill: TileId) -> Self {
        let len = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            tiles: vec![fill; len],
            registry: TileRegistry::with_defaults(),
        }
    }

    /// Rock border, sand interior and a pad at the centre.
    #[must_use]
    pub fn bordered(width: u32, height: u32) -> Self {
        let mut map = Self::new(width, height, TileId::SAND);
        for y in 0..height {
            for x in 0..width {
                if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                    map.put(x, y, TileId::ROCK);
                }
            }
        }
        map.put(width / 2, height / 2, TileId::PAD);
        map
    }

    /// The 128x128 bordered map.
    #[must_use]
    pub fn from_default() -> Self {
        Self::bordered(Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT)
    }

    /// Builds a grid from explicit rows. Unregistered ids are kept and read as impassable.
    pub fn from_rows(rows: &[Vec<TileId>]) -> Result<Self, TileError> {
        let expected = rows.first().map_or(0, Vec::len);
        if let Some((row, found)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != expected)
        {
            return Err(TileError::RaggedRow {
                row,
                expected,
                found,
            });
        }

        Ok(Self {
            width: u32::try_from(expected).unwrap_or(0),
            height: u32::try_from(rows.len()).unwrap_or(0),
            tiles: rows.iter().flatten().copied().collect(),
            registry: TileRegistry::with_defaults(),
        })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile-type registry backing the grid.
    #[must_use]
    pub fn registry(&self) -> &TileRegistry {
        &self.registry
    }

    /// Registers an additional tile type.
    pub fn register_tile_type(&mut self, tile: TileType) -> Result<(), TileError> {
        self.registry.register(tile)
    }

    /// Tile id at a coordinate.
    #[must_use]
    pub fn tile_at(&self, location: Location) -> Option<TileId> {
        self.index(location).map(|index| self.tiles[index])
    }

    /// Tile definition at a coordinate.
    #[must_use]
    pub fn tile_type_at(&self, location: Location) -> Option<&TileType> {
        self.tile_at(location).and_then(|id| self.registry.get(id))
    }

    /// Replaces the tile at a coordinate.
    pub fn set_tile(&mut self, location: Location, id: TileId) -> Result<(), TileError> {
        let index = self
            .index(location)
            .ok_or(TileError::OutOfRange { location })?;
        self.tiles[index] = id;
        Ok(())
    }

    /// Movement-speed scalar of the tile, if it resolves.
    #[must_use]
    pub fn move_speed_scalar(&self, location: Location) -> Option<f32> {
        self.tile_type_at(location).map(|tile| tile.move_speed)
    }

    /// Iterates rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[TileId]> {
        let width = usize::try_from(self.width).unwrap_or(0).max(1);
        self.tiles.chunks(width)
    }

    fn put(&mut self, x: u32, y: u32, id: TileId) {
        let location = Location::new(
            i32::try_from(x).unwrap_or(i32::MAX),
            i32::try_from(y).unwrap_or(i32::MAX),
        );
        if let Some(index) = self.index(location) {
            self.tiles[index] = id;
        }
    }

    fn index(&self, location: Location) -> Option<usize> {
        let x = u32::try_from(location.x).ok()?;
        let y = u32::try_from(location.y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        usize::try_from(u64::from(y) * u64::from(self.width) + u64::from(x)).ok()
    }
}

impl Terrain for Tilemap {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_passable(&self, location: Location) -> bool {
        self.tile_type_at(location).is_some_and(|tile| tile.passable)
    }
}

/// World-level hook invoked once per tick after every entity has acted.
pub trait TileMutator {
    /// Applies map changes for the given tick.
    fn mutate(&mut self, tilemap: &mut Tilemap, tick: u64);
}

impl<F> TileMutator for F
where
    F: FnMut(&mut Tilemap, u64),
{
    fn mutate(&mut self, tilemap: &mut Tilemap, tick: u64) {
        self(tilemap, tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_has_rock_border_and_central_pad() {
        let map = Tilemap::from_default();
        assert_eq!(map.width(), 128);
        assert_eq!(map.tile_at(Location::new(0, 5)), Some(TileId::ROCK));
        assert_eq!(map.tile_at(Location::new(127, 127)), Some(TileId::ROCK));
        assert_eq!(map.tile_at(Location::new(5, 5)), Some(TileId::SAND));
        assert_eq!(map.tile_at(Location::new(64, 64)), Some(TileId::PAD));
        assert!(map.is_passable(Location::new(64, 64)));
        assert!(!map.is_passable(Location::new(5, 0)));
    }

    #[test]
    fn out_of_range_and_unknown_tiles_are_impassable() {
        let mut map = Tilemap::bordered(8, 8);
        assert!(!map.is_passable(Location::new(-1, 3)));
        assert!(!map.is_passable(Location::new(3, 8)));
        map.set_tile(Location::new(3, 3), TileId::new(99))
            .expect("in range");
        assert!(!map.is_passable(Location::new(3, 3)));
        assert_eq!(map.move_speed_scalar(Location::new(3, 3)), None);
    }

    #[test]
    fn identical_reregistration_is_idempotent() {
        let mut map = Tilemap::bordered(4, 4);
        let mud = TileType::new(TileId::new(7), "mud", true).with_speed(0.5);
        map.register_tile_type(mud.clone()).expect("first registration");
        map.register_tile_type(mud).expect("identical registration");

        let conflicting = TileType::new(TileId::new(7), "lava", false);
        assert_eq!(
            map.register_tile_type(conflicting),
            Err(TileError::DuplicateId {
                id: TileId::new(7),
                existing: String::from("mud"),
            })
        );
    }

    #[test]
    fn set_tile_rejects_coordinates_off_the_map() {
        let mut map = Tilemap::new(4, 4, TileId::SAND);
        assert_eq!(
            map.set_tile(Location::new(4, 0), TileId::ROCK),
            Err(TileError::OutOfRange {
                location: Location::new(4, 0)
            })
        );
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let rows = vec![vec![TileId::SAND; 3], vec![TileId::SAND; 2]];
        assert!(matches!(
            Tilemap::from_rows(&rows),
            Err(TileError::RaggedRow { row: 1, .. })
        ));

        let rows = vec![vec![TileId::SAND, TileId::ROCK]; 2];
        let map = Tilemap::from_rows(&rows).expect("rectangular rows");
        assert_eq!(map.dimensions(), (2, 2));
        assert!(!map.is_passable(Location::new(1, 1)));
    }

    #[test]
    fn closures_act_as_mutators() {
        let mut map = Tilemap::bordered(4, 4);
        let mut paver = |tilemap: &mut Tilemap, tick: u64| {
            if tick == 2 {
                let _ = tilemap.set_tile(Location::new(1, 1), TileId::PAD);
            }
        };
        paver.mutate(&mut map, 1);
        assert_eq!(map.tile_at(Location::new(1, 1)), Some(TileId::SAND));
        paver.mutate(&mut map, 2);
        assert_eq!(map.tile_at(Location::new(1, 1)), Some(TileId::PAD));
    }
}
