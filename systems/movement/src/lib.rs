#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic resolver that turns pending movement intents into outcomes.
//!
//! The resolver never touches world state. Callers describe every body on
//! the map, every body that wants to move, and the terrain; the resolver
//! answers with one [`MoveResolution`] per mover in processing order. Moves
//! are checked against a shadow reservation map seeded from every body's
//! current footprint and only ever added to during a pass, so a tile
//! vacated in this pass cannot be entered until the next one.

use std::collections::BTreeMap;

use droidworks_core::{
    BlockReason, EntityId, Footprint, Location, MoveOutcome, MovementIntent, Terrain,
};

/// Body occupying tiles on the map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Body {
    /// Identifier of the chassis.
    pub id: EntityId,
    /// Anchor of the footprint.
    pub location: Location,
    /// Tiles covered relative to the anchor.
    pub footprint: Footprint,
}

impl Body {
    /// Tiles currently covered by the body.
    pub fn cells(&self) -> impl Iterator<Item = Location> {
        self.footprint.cells(self.location)
    }
}

/// Body holding a pending intent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mover {
    /// Current placement of the chassis.
    pub body: Body,
    /// Resolution priority; lower values are processed first.
    pub priority: i32,
    /// Intent to resolve.
    pub intent: MovementIntent,
}

/// Result of resolving a single mover.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveResolution {
    /// Chassis that issued the intent.
    pub id: EntityId,
    /// Anchor before resolution.
    pub from: Location,
    /// Attempted anchor after resolution.
    pub to: Location,
    /// Whether the move applies.
    pub outcome: MoveOutcome,
    /// Chassis that held a contested tile.
    pub blocker: Option<EntityId>,
    /// Intent that was resolved.
    pub intent: MovementIntent,
}

impl MoveResolution {
    /// Reports whether the move applies.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.outcome.is_applied()
    }
}

/// Resolves every mover against the bodies on the map and the terrain.
///
/// `bodies` must describe every chassis on the map, including the movers.
/// Movers are processed in `(priority, id)` order and the returned
/// resolutions follow that order.
#[must_use]
pub fn resolve<T>(mut movers: Vec<Mover>, bodies: &[Body], terrain: &T) -> Vec<MoveResolution>
where
    T: Terrain + ?Sized,
{
    if movers.is_empty() {
        return Vec::new();
    }

    movers.sort_by(|left, right| {
        left.priority
            .cmp(&right.priority)
            .then_with(|| left.body.id.cmp(&right.body.id))
    });

    let mut shadow = occupancy(bodies);
    let mut resolutions = Vec::with_capacity(movers.len());

    for mover in movers {
        let Mover { body, intent, .. } = mover;
        let to = body.location.offset(intent.dx(), intent.dy());
        let (outcome, blocker) = match check(&body, &intent, &shadow, terrain) {
            Ok(()) => {
                for cell in body.footprint.cells(to) {
                    let _ = shadow.insert(cell, body.id.clone());
                }
                (MoveOutcome::Applied, None)
            }
            Err((reason, blocker)) => (MoveOutcome::Blocked(reason), blocker),
        };

        tracing::trace!(
            entity = %body.id,
            from = %body.location,
            to = %to,
            outcome = outcome.tag(),
            "resolved movement intent"
        );

        resolutions.push(MoveResolution {
            id: body.id,
            from: body.location,
            to,
            outcome,
            blocker,
            intent,
        });
    }

    resolutions
}

fn occupancy(bodies: &[Body]) -> BTreeMap<Location, EntityId> {
    let mut map = BTreeMap::new();
    for body in bodies {
        for cell in body.cells() {
            let _ = map.insert(cell, body.id.clone());
        }
    }
    map
}

fn check<T>(
    body: &Body,
    intent: &MovementIntent,
    shadow: &BTreeMap<Location, EntityId>,
    terrain: &T,
) -> Result<(), (BlockReason, Option<EntityId>)>
where
    T: Terrain + ?Sized,
{
    if intent.validate().is_err() {
        return Err((BlockReason::InvalidIntent, None));
    }

    let to = body.location.offset(intent.dx(), intent.dy());
    let targets: Vec<Location> = body.footprint.cells(to).collect();

    let (width, height) = terrain.dimensions();
    let in_bounds = |cell: &Location| {
        let x = i64::from(cell.x);
        let y = i64::from(cell.y);
        (0..i64::from(width)).contains(&x) && y < i64::from(height)
    };
    if !targets.iter().all(in_bounds) {
        return Err((BlockReason::OutOfBounds, None));
    }

    if targets
        .iter()
        .any(|cell| cell.y >= 0 && !terrain.is_passable(*cell))
    {
        return Err((BlockReason::BlockedTile, None));
    }

    for cell in &targets {
        if let Some(holder) = shadow.get(cell) {
            if holder != &body.id {
                return Err((BlockReason::Occupied, Some(holder.clone())));
            }
        }
    }

    Ok(())
}
