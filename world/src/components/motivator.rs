use std::{
    cmp::Reverse,
    collections::{BTreeMap, BinaryHeap, VecDeque},
};

use droidworks_core::{
    BlockReason, ComponentId, EntityId, Identity, Location, MovementIntent, ParamKind, Terrain,
    ToolOutcome, ToolParam, ToolSpec,
};
use serde::Serialize;

use super::PowerPack;
use crate::{
    component::{failure, HookError},
    context::Context,
    entity::Entity,
    tiles::Tilemap,
};

/// Metadata `source` stamped on every intent a motivator issues.
pub const SOURCE: &str = "Motivator";

pub(crate) const MOTIVATOR_TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "move_to_location",
        description: "Move to a specific location in the world.",
        params: &[
            ToolParam {
                name: "x",
                kind: ParamKind::Integer,
                description: "The x-coordinate of the destination.",
                required: true,
            },
            ToolParam {
                name: "y",
                kind: ParamKind::Integer,
                description: "The y-coordinate of the destination.",
                required: true,
            },
        ],
    },
    ToolSpec {
        name: "move_to_entity",
        description: "Move next to the nearest entity of a specific type or by its ID.",
        params: &[ToolParam {
            name: "identifier",
            kind: ParamKind::String,
            description: "The type of entity or its ID to move to.",
            required: true,
        }],
    },
];

/// Path planning strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Planner {
    /// Straight Manhattan walk, columns first.
    Greedy,
    /// Shortest four-way path over passable tiles.
    AStar,
}

/// Why the motivator did not issue an intent on its last tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "stall", content = "reason", rename_all = "snake_case")]
pub enum Stall {
    /// Waiting out the post-move cooldown.
    Cooldown,
    /// Power pack holds less than one step's cost.
    NoPower,
    /// The chassis already held an intent.
    IntentExists,
    /// The last issued step was blocked.
    Blocked(BlockReason),
}

/// Steers its chassis toward a destination one step at a time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Motivator {
    planner: Planner,
    destination: Option<Location>,
    arrival_radius: u32,
    path: VecDeque<Location>,
    cooldown: u32,
    cooldown_delay: u32,
    power_cost: u32,
    stall: Option<Stall>,
    abandoned: bool,
}

impl Motivator {
    /// Idle motivator using `planner`.
    #[must_use]
    pub const fn new(planner: Planner) -> Self {
        Self {
            planner,
            destination: None,
            arrival_radius: 0,
            path: VecDeque::new(),
            cooldown: 0,
            cooldown_delay: 1,
            power_cost: 1,
            stall: None,
            abandoned: false,
        }
    }

    /// Planning strategy.
    #[must_use]
    pub const fn planner(&self) -> Planner {
        self.planner
    }

    /// Current destination.
    #[must_use]
    pub const fn destination(&self) -> Option<Location> {
        self.destination
    }

    /// Remaining planned steps.
    pub fn path(&self) -> impl Iterator<Item = &Location> {
        self.path.iter()
    }

    /// Ticks left before the next step may be issued.
    #[must_use]
    pub const fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Charge spent per applied step.
    #[must_use]
    pub const fn power_cost(&self) -> u32 {
        self.power_cost
    }

    /// Reason the last tick issued nothing.
    #[must_use]
    pub const fn stall(&self) -> Option<Stall> {
        self.stall
    }

    pub(crate) fn move_to_location(
        &mut self,
        log: &mut Identity<ComponentId>,
        host: &Entity,
        ctx: &Context<'_>,
        destination: Location,
    ) -> ToolOutcome {
        if !within_reach(destination, ctx.tilemap()) {
            return failure(
                log,
                format!("Destination {destination} lies outside the map."),
            );
        }
        self.head_for(host.location(), destination, 0, ctx.tilemap());
        log.info(format!("Moving to {destination}."));
        ToolOutcome::pending(format!("Moving to {destination}."))
    }

    pub(crate) fn move_to_entity(
        &mut self,
        log: &mut Identity<ComponentId>,
        host: &Entity,
        ctx: &Context<'_>,
        identifier: &str,
    ) -> ToolOutcome {
        let Some(target) = ctx.others().nearest(host.location(), identifier) else {
            return failure(
                log,
                format!("No entities found with identifier `{identifier}`."),
            );
        };
        let destination = target.location();
        let target_id = target.id().clone();
        self.head_for(host.location(), destination, 1, ctx.tilemap());
        log.info(format!("Moving to {target_id} at {destination}."));
        ToolOutcome::pending(format!("Moving to {target_id} at {destination}."))
    }

    fn head_for(&mut self, here: Location, destination: Location, radius: u32, tilemap: &Tilemap) {
        self.destination = Some(destination);
        self.arrival_radius = radius;
        self.abandoned = false;
        self.stall = None;
        self.path = self.plan(here, destination, tilemap);
    }

    fn abandon(&mut self) {
        self.destination = None;
        self.path.clear();
        self.abandoned = true;
    }

    fn plan(&self, start: Location, end: Location, tilemap: &Tilemap) -> VecDeque<Location> {
        match self.planner {
            Planner::Greedy => greedy_path(start, end),
            Planner::AStar => {
                astar_path(start, end, tilemap).unwrap_or_else(|| greedy_path(start, end))
            }
        }
    }

    pub(crate) fn tick(
        &mut self,
        log: &mut Identity<ComponentId>,
        host: &mut Entity,
        ctx: &Context<'_>,
    ) {
        let Some(destination) = self.destination else {
            return;
        };
        let here = host.location();
        if here.distance_to(destination) <= self.arrival_radius {
            self.destination = None;
            self.path.clear();
            self.cooldown = 0;
            self.stall = None;
            return;
        }
        if self.cooldown > 0 {
            self.cooldown -= 1;
            self.stall = Some(Stall::Cooldown);
            return;
        }

        let Some(power) = host.chassis().get::<PowerPack>() else {
            log.error("Cannot function without a power pack.");
            return;
        };
        if power.charge() < self.power_cost {
            self.stall = Some(Stall::NoPower);
            log.warn("Insufficient power to issue movement intent.");
            return;
        }

        if self
            .path
            .front()
            .map_or(true, |next| here.distance_to(*next) != 1)
        {
            self.path = self.plan(here, destination, ctx.tilemap());
        }
        let Some(next) = self.path.front().copied() else {
            log.warn("No path available to destination.");
            self.abandon();
            return;
        };

        let remaining = self.path.len().to_string();
        let issued = MovementIntent::step(next.x - here.x, next.y - here.y).and_then(|intent| {
            host.chassis_mut().request_intent(
                intent
                    .with_metadata("source", SOURCE)
                    .with_metadata("remaining_path", remaining),
            )
        });
        self.stall = issued.err().map(|_| Stall::IntentExists);
    }

    pub(crate) fn on_move_applied(
        &mut self,
        host: &mut Entity,
        to: Location,
        intent: &MovementIntent,
    ) -> Result<(), HookError> {
        if intent.metadata_value("source") != Some(SOURCE) {
            return Ok(());
        }
        if self.path.front() == Some(&to) {
            let _ = self.path.pop_front();
        }
        self.cooldown = self.cooldown_delay;
        self.stall = None;
        let power = host
            .chassis_mut()
            .get_mut::<PowerPack>()
            .ok_or(HookError::MissingCapability {
                capability: "PowerPack",
            })?;
        let _ = power.drain(self.power_cost);
        Ok(())
    }

    pub(crate) fn on_move_blocked(
        &mut self,
        log: &mut Identity<ComponentId>,
        intent: &MovementIntent,
        reason: BlockReason,
        blocker: Option<&EntityId>,
    ) {
        if intent.metadata_value("source") != Some(SOURCE) {
            return;
        }
        self.stall = Some(Stall::Blocked(reason));
        log.info(format!(
            "Move blocked: reason={} intent=({},{}) blocker={}",
            reason.code(),
            intent.dx(),
            intent.dy(),
            blocker.map_or("none", EntityId::as_str)
        ));
        match reason {
            BlockReason::Occupied | BlockReason::BlockedTile => self.path.clear(),
            BlockReason::OutOfBounds | BlockReason::InvalidIntent => self.abandon(),
        }
    }

    pub(crate) fn poll(&self, host: &Entity) -> ToolOutcome {
        if self.abandoned {
            return ToolOutcome::failure("Movement abandoned before reaching the destination.");
        }
        match self.destination {
            None => ToolOutcome::success(format!("Arrived at destination {}.", host.location())),
            Some(destination) => ToolOutcome::pending(format!(
                "Moving to {destination}. {} steps planned.",
                self.path.len()
            )),
        }
    }
}

const fn toward(from: i32, to: i32) -> i32 {
    if to > from {
        1
    } else {
        -1
    }
}

/// Destinations on the map, or in the open strip above it no taller than the
/// map itself.
fn within_reach(destination: Location, tilemap: &Tilemap) -> bool {
    let width = i64::from(tilemap.width());
    let height = i64::from(tilemap.height());
    let (x, y) = (i64::from(destination.x), i64::from(destination.y));
    (0..width).contains(&x) && (-height..height).contains(&y)
}

/// Manhattan walk, columns first unless the destination lies above the map.
fn greedy_path(start: Location, end: Location) -> VecDeque<Location> {
    let vertical_first = end.y < 0;
    let mut path = VecDeque::new();
    let mut current = start;
    while current != end {
        current = if (vertical_first && current.y != end.y) || current.x == end.x {
            current.offset(0, toward(current.y, end.y))
        } else {
            current.offset(toward(current.x, end.x), 0)
        };
        path.push_back(current);
    }
    path
}

/// Shortest four-way path over passable tiles, or `None` when the goal is
/// unreachable on the map.
fn astar_path(start: Location, goal: Location, tilemap: &Tilemap) -> Option<VecDeque<Location>> {
    if start == goal || !tilemap.is_passable(goal) {
        return None;
    }
    let mut open = BinaryHeap::new();
    let mut best: BTreeMap<Location, u32> = BTreeMap::new();
    let mut came_from: BTreeMap<Location, Location> = BTreeMap::new();
    let _ = best.insert(start, 0);
    open.push(Reverse((start.distance_to(goal), start)));

    while let Some(Reverse((_, current))) = open.pop() {
        if current == goal {
            let mut path = VecDeque::new();
            let mut step = goal;
            while step != start {
                path.push_front(step);
                step = *came_from.get(&step)?;
            }
            return Some(path);
        }
        let cost = best.get(&current).copied().unwrap_or(u32::MAX);
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let next = current.offset(dx, dy);
            if !tilemap.is_passable(next) {
                continue;
            }
            let tentative = cost.saturating_add(1);
            if best.get(&next).map_or(true, |known| tentative < *known) {
                let _ = best.insert(next, tentative);
                let _ = came_from.insert(next, current);
                open.push(Reverse((tentative + next.distance_to(goal), next)));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::TileId;

    fn locations(path: &VecDeque<Location>) -> Vec<(i32, i32)> {
        path.iter().map(|l| (l.x, l.y)).collect()
    }

    #[test]
    fn greedy_walks_columns_then_rows() {
        let path = greedy_path(Location::new(1, 1), Location::new(3, 2));
        assert_eq!(locations(&path), [(2, 1), (3, 1), (3, 2)]);
    }

    #[test]
    fn greedy_climbs_first_when_leaving_through_the_top() {
        let path = greedy_path(Location::new(2, 1), Location::new(3, -1));
        assert_eq!(locations(&path), [(2, 0), (2, -1), (3, -1)]);
    }

    #[test]
    fn reach_covers_the_map_and_the_strip_above_it() {
        let map = Tilemap::bordered(8, 6);
        assert!(within_reach(Location::new(0, 0), &map));
        assert!(within_reach(Location::new(7, 5), &map));
        assert!(within_reach(Location::new(3, -6), &map));
        assert!(!within_reach(Location::new(-1, 2), &map));
        assert!(!within_reach(Location::new(8, 2), &map));
        assert!(!within_reach(Location::new(3, 6), &map));
        assert!(!within_reach(Location::new(3, -7), &map));
        assert!(!within_reach(Location::new(i32::MAX, 2), &map));
    }

    #[test]
    fn astar_routes_around_rock() {
        let mut map = Tilemap::bordered(7, 7);
        for y in 1..5 {
            map.set_tile(Location::new(3, y), TileId::ROCK)
                .expect("inside the map");
        }
        let path = astar_path(Location::new(1, 1), Location::new(5, 1), &map).expect("reachable");
        assert!(path.iter().all(|step| map.is_passable(*step)));
        assert_eq!(path.back(), Some(&Location::new(5, 1)));
        assert_eq!(path.len(), 12);
    }

    #[test]
    fn astar_gives_up_on_unreachable_goals() {
        let map = Tilemap::bordered(5, 5);
        assert!(astar_path(Location::new(1, 1), Location::new(0, 0), &map).is_none());
        assert!(astar_path(Location::new(1, 1), Location::new(2, -3), &map).is_none());
    }
}
