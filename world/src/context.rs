use droidworks_core::{EntityId, Location, MovementIntent};

use crate::{entity::Entity, tiles::Tilemap};

/// Movement a capability wants another chassis to make after the current
/// resolution pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FollowUp {
    pub(crate) follower: EntityId,
    pub(crate) leader: EntityId,
    pub(crate) target: Location,
}

/// Every registered entity except the one being updated.
#[derive(Debug)]
pub(crate) struct Others<'a> {
    before: &'a mut [Entity],
    after: &'a mut [Entity],
}

impl<'a> Others<'a> {
    pub(crate) fn new(before: &'a mut [Entity], after: &'a mut [Entity]) -> Self {
        Self { before, after }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.before.iter().chain(self.after.iter())
    }

    pub(crate) fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.iter().find(|entity| entity.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.before
            .iter_mut()
            .chain(self.after.iter_mut())
            .find(|entity| entity.id() == id)
    }

    /// Closest entity matching `identifier`; the first registered wins ties.
    pub(crate) fn nearest(&self, from: Location, identifier: &str) -> Option<&Entity> {
        self.iter()
            .filter(|entity| entity.matches(identifier))
            .min_by_key(|entity| from.distance_to(entity.location()))
    }
}

/// Which entity a tool targeted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Reach {
    Host,
    Other(EntityId),
}

/// Borrowed view of the world handed to an entity while it is updated.
#[derive(Debug)]
pub(crate) struct Context<'a> {
    tick: u64,
    tilemap: &'a Tilemap,
    others: Others<'a>,
    followups: &'a mut Vec<FollowUp>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        tick: u64,
        tilemap: &'a Tilemap,
        others: Others<'a>,
        followups: &'a mut Vec<FollowUp>,
    ) -> Self {
        Self {
            tick,
            tilemap,
            others,
            followups,
        }
    }

    pub(crate) const fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) const fn tilemap(&self) -> &'a Tilemap {
        self.tilemap
    }

    pub(crate) const fn others(&self) -> &Others<'a> {
        &self.others
    }

    pub(crate) fn others_mut(&mut self) -> &mut Others<'a> {
        &mut self.others
    }

    pub(crate) fn follow(&mut self, follow_up: FollowUp) {
        self.followups.push(follow_up);
    }

    /// Resolves `identifier` the way a tool does: the host itself when it
    /// matches, otherwise the nearest matching entity. Returns the distance.
    pub(crate) fn reach(&self, host: &Entity, identifier: &str) -> Option<(Reach, u32)> {
        if host.matches(identifier) {
            return Some((Reach::Host, 0));
        }
        let target = self.others.nearest(host.location(), identifier)?;
        Some((
            Reach::Other(target.id().clone()),
            host.location().distance_to(target.location()),
        ))
    }

    pub(crate) fn reach_mut<'h>(
        &'h mut self,
        host: &'h mut Entity,
        reach: &Reach,
    ) -> Option<&'h mut Entity> {
        match reach {
            Reach::Host => Some(host),
            Reach::Other(id) => self.others.get_mut(id),
        }
    }
}

/// Intent handed to a follower when its leader vacates a tile.
pub(crate) fn follow_up_intent(
    follower: Location,
    follow_up: &FollowUp,
) -> Option<MovementIntent> {
    let dx = follow_up.target.x - follower.x;
    let dy = follow_up.target.y - follower.y;
    MovementIntent::step(dx, dy).ok().map(|intent| {
        intent
            .with_metadata("source", "TowCable")
            .with_metadata("leader", follow_up.leader.as_str())
    })
}
