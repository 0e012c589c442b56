use droidworks_core::{ComponentId, EntityId, Identity, Location, ParamKind, ToolOutcome, ToolParam, ToolSpec};
use serde::Serialize;

use crate::{
    component::failure,
    context::{Context, FollowUp},
    entity::Entity,
};

/// Furthest Manhattan distance a follower may drift before the cable drops.
pub const CABLE_REACH: u32 = 2;

pub(crate) const TOW_CABLE_TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "attach_tow_cable",
        description: "Attach the tow cable to an adjacent entity. An attached entity follows along behind this one as it moves. Only one entity can be attached at a time.",
        params: &[ToolParam {
            name: "identifier",
            kind: ParamKind::String,
            description: "ID or type of the entity to tow. Must be adjacent.",
            required: true,
        }],
    },
    ToolSpec {
        name: "detach_tow_cable",
        description: "Detach the tow cable from the currently attached entity.",
        params: &[],
    },
];

/// Drags one follower chassis into the tiles its host vacates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TowCable {
    attached: Option<EntityId>,
}

impl TowCable {
    /// Cable with nothing attached.
    #[must_use]
    pub const fn new() -> Self {
        Self { attached: None }
    }

    /// Follower currently on the cable.
    #[must_use]
    pub fn attached(&self) -> Option<&EntityId> {
        self.attached.as_ref()
    }

    /// Drops the follower without logging.
    pub(crate) fn detach(&mut self) -> Option<EntityId> {
        self.attached.take()
    }

    pub(crate) fn attach(
        &mut self,
        log: &mut Identity<ComponentId>,
        host: &Entity,
        ctx: &mut Context<'_>,
        identifier: &str,
    ) -> ToolOutcome {
        if let Some(current) = &self.attached {
            return failure(
                log,
                format!("Attach failed. Already attached to `{current}`."),
            );
        }
        let Some(target) = ctx.others().nearest(host.location(), identifier) else {
            return failure(
                log,
                format!("Attach failed. No entity found with identifier `{identifier}`."),
            );
        };
        let distance = host.location().distance_to(target.location());
        if distance >= 2 {
            return failure(
                log,
                format!("Attach failed. `{identifier}` is {distance} units away. Must be adjacent."),
            );
        }

        let follower_id = target.id().clone();
        let priority = host.chassis().move_priority().saturating_add(1);
        if let Some(follower) = ctx.others_mut().get_mut(&follower_id) {
            follower.chassis_mut().set_move_priority(priority);
        }
        self.attached = Some(follower_id.clone());
        let message = format!("Attach succeeded. `{follower_id}` is now connected.");
        log.info(message.clone());
        ToolOutcome::success(message)
    }

    pub(crate) fn detach_tool(&mut self, log: &mut Identity<ComponentId>) -> ToolOutcome {
        match self.attached.take() {
            Some(id) => ToolOutcome::success(format!(
                "Detach succeeded. `{id}` is no longer connected."
            )),
            None => failure(log, "Detach failed. No entity is currently attached.".into()),
        }
    }

    pub(crate) fn tick(&mut self, log: &mut Identity<ComponentId>, host: &Entity, ctx: &Context<'_>) {
        let Some(id) = &self.attached else {
            return;
        };
        match ctx.others().get(id) {
            None => {
                log.warn(format!("Tow cable dropped. `{id}` no longer exists."));
                self.attached = None;
            }
            Some(follower) => {
                let distance = host.location().distance_to(follower.location());
                if distance > CABLE_REACH {
                    log.warn(format!(
                        "Tow cable dropped. `{id}` drifted {distance} units away."
                    ));
                    self.attached = None;
                }
            }
        }
    }

    pub(crate) fn on_move_applied(&self, host: &Entity, from: Location, ctx: &mut Context<'_>) {
        if let Some(follower) = &self.attached {
            ctx.follow(FollowUp {
                follower: follower.clone(),
                leader: host.id().clone(),
                target: from,
            });
        }
    }
}
