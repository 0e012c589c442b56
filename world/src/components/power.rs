use std::fmt;

use droidworks_core::{ComponentId, EntityId, Identity, ParamKind, ToolOutcome, ToolParam, ToolSpec};
use serde::Serialize;

use crate::{component::failure, context::Context, entity::Entity};

/// Rechargeable energy store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PowerPack {
    charge: u32,
    charge_max: u32,
}

impl PowerPack {
    /// Fully charged pack.
    #[must_use]
    pub const fn new(charge_max: u32) -> Self {
        Self {
            charge: charge_max,
            charge_max,
        }
    }

    /// Stored charge.
    #[must_use]
    pub const fn charge(&self) -> u32 {
        self.charge
    }

    /// Maximum charge.
    #[must_use]
    pub const fn charge_max(&self) -> u32 {
        self.charge_max
    }

    /// Charge still missing before the pack is full.
    #[must_use]
    pub const fn headroom(&self) -> u32 {
        self.charge_max.saturating_sub(self.charge)
    }

    /// Reports whether the pack is full.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.charge >= self.charge_max
    }

    /// Sets the charge, clamped to the maximum.
    pub fn set_charge(&mut self, charge: u32) {
        self.charge = charge.min(self.charge_max);
    }

    /// Removes up to `amount` and returns what was removed.
    pub fn drain(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.charge);
        self.charge -= taken;
        taken
    }

    /// Adds up to `amount` and returns what was accepted.
    pub fn fill(&mut self, amount: u32) -> u32 {
        let added = amount.min(self.headroom());
        self.charge += added;
        added
    }
}

/// Periodically tops up the power pack installed beside it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PowerGenerator {
    cooldown: u32,
    cooldown_delay: u32,
    recharge_amount: u32,
}

impl PowerGenerator {
    /// Generator adding `recharge_amount` every `cooldown_delay + 1` ticks.
    #[must_use]
    pub const fn new(cooldown_delay: u32, recharge_amount: u32) -> Self {
        Self {
            cooldown: 0,
            cooldown_delay,
            recharge_amount,
        }
    }

    /// Ticks left before the next recharge.
    #[must_use]
    pub const fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Ticks between recharges.
    #[must_use]
    pub const fn cooldown_delay(&self) -> u32 {
        self.cooldown_delay
    }

    /// Charge added per cycle.
    #[must_use]
    pub const fn recharge_amount(&self) -> u32 {
        self.recharge_amount
    }

    pub(crate) fn tick(&mut self, host: &mut Entity) {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return;
        }
        if let Some(pack) = host.chassis_mut().get_mut::<PowerPack>() {
            let _ = pack.fill(self.recharge_amount);
        }
        self.cooldown = self.cooldown_delay;
    }
}

/// Direction of a charge transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    /// Draw charge from the other entity into our own pack.
    Recharge,
    /// Push charge from our own pack into the other entity.
    Charge,
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Recharge => "Recharge",
            Self::Charge => "Charge",
        })
    }
}

/// Transfer in progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Transfer {
    /// Entity on the other end of the cable.
    pub target: EntityId,
    /// Direction of flow.
    pub mode: TransferMode,
}

const RECHARGE_SELF: ToolSpec = ToolSpec {
    name: "recharge_self",
    description: "Recharge our power pack from an adjacent entity.",
    params: &[ToolParam {
        name: "identifier",
        kind: ParamKind::String,
        description: "ID or type of the entity to recharge from. Must be adjacent.",
        required: true,
    }],
};

const CHARGE_OTHER: ToolSpec = ToolSpec {
    name: "charge_other",
    description: "Charge an adjacent entity from this unit's power pack.",
    params: &[ToolParam {
        name: "identifier",
        kind: ParamKind::String,
        description: "ID or type of the entity to charge. Must be adjacent.",
        required: true,
    }],
};

const STANDARD_TOOLS: &[ToolSpec] = &[RECHARGE_SELF];
const HEAVY_DUTY_TOOLS: &[ToolSpec] = &[RECHARGE_SELF, CHARGE_OTHER];

/// Moves charge between our power pack and an adjacent entity's.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PowerConverter {
    transfer_rate: u32,
    heavy_duty: bool,
    transfer: Option<Transfer>,
}

impl PowerConverter {
    /// Universal converter: recharges itself at two units per tick.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            transfer_rate: 2,
            heavy_duty: false,
            transfer: None,
        }
    }

    /// Heavy-duty converter: five units per tick and can charge others.
    #[must_use]
    pub const fn heavy_duty() -> Self {
        Self {
            transfer_rate: 5,
            heavy_duty: true,
            transfer: None,
        }
    }

    /// Charge moved per tick.
    #[must_use]
    pub const fn transfer_rate(&self) -> u32 {
        self.transfer_rate
    }

    /// Reports whether `charge_other` is available.
    #[must_use]
    pub const fn is_heavy_duty(&self) -> bool {
        self.heavy_duty
    }

    /// Transfer in progress, if any.
    #[must_use]
    pub fn transfer(&self) -> Option<&Transfer> {
        self.transfer.as_ref()
    }

    pub(crate) fn tools(&self) -> &'static [ToolSpec] {
        if self.heavy_duty {
            HEAVY_DUTY_TOOLS
        } else {
            STANDARD_TOOLS
        }
    }

    pub(crate) fn begin(
        &mut self,
        log: &mut Identity<ComponentId>,
        host: &Entity,
        ctx: &Context<'_>,
        identifier: &str,
        mode: TransferMode,
    ) -> ToolOutcome {
        let Some(target) = ctx.others().nearest(host.location(), identifier) else {
            return failure(
                log,
                format!("{mode} failed. No entity found with identifier `{identifier}`."),
            );
        };
        let distance = host.location().distance_to(target.location());
        if distance >= 2 {
            return failure(
                log,
                format!("{mode} failed. `{identifier}` is {distance} units away. Must be adjacent."),
            );
        }

        self.transfer = Some(Transfer {
            target: target.id().clone(),
            mode,
        });
        ToolOutcome::pending(format!("{mode} started with {}.", target.id()))
    }

    pub(crate) fn tick(
        &mut self,
        log: &mut Identity<ComponentId>,
        action: &mut Option<ToolOutcome>,
        host: &mut Entity,
        ctx: &mut Context<'_>,
    ) {
        let Some(transfer) = self.transfer.clone() else {
            return;
        };
        let outcome = self.step(log, &transfer, host, ctx);
        if !outcome.is_pending() {
            self.transfer = None;
        }
        *action = Some(outcome);
    }

    fn step(
        &self,
        log: &mut Identity<ComponentId>,
        transfer: &Transfer,
        host: &mut Entity,
        ctx: &mut Context<'_>,
    ) -> ToolOutcome {
        let mode = transfer.mode;
        let host_id = host.id().clone();
        let host_location = host.location();

        let Some(them) = ctx.others_mut().get_mut(&transfer.target) else {
            return failure(
                log,
                format!("{mode} failed. No entity found with ID `{}`.", transfer.target),
            );
        };
        let them_id = them.id().clone();
        let distance = host_location.distance_to(them.location());
        if distance >= 2 {
            return failure(
                log,
                format!(
                    "{mode} failed. No longer adjacent to {them_id}. {them_id} is {distance} units away."
                ),
            );
        }
        let Some(theirs) = them.chassis_mut().get_mut::<PowerPack>() else {
            return failure(
                log,
                format!("{mode} failed. {them_id} does not have a PowerPack."),
            );
        };
        let Some(ours) = host.chassis_mut().get_mut::<PowerPack>() else {
            return failure(
                log,
                format!("{mode} failed. We ({host_id}) do not have a PowerPack."),
            );
        };

        let (source, target, source_id, target_id) = match mode {
            TransferMode::Recharge => (theirs, ours, &them_id, &host_id),
            TransferMode::Charge => (ours, theirs, &host_id, &them_id),
        };

        let needed = target.headroom();
        if needed > 0 && source.charge() < self.transfer_rate {
            log.warn(format!(
                "{source_id} is low on power ({}/{}).",
                source.charge(),
                source.charge_max()
            ));
        }
        let amount = needed.min(source.charge()).min(self.transfer_rate);
        let _ = source.drain(amount);
        let _ = target.fill(amount);

        if target.is_full() {
            ToolOutcome::success(format!(
                "{mode} complete: {target_id} power at {}/{}",
                target.charge(),
                target.charge_max()
            ))
        } else {
            let message = format!(
                "{mode} in progress: Transferred {amount} units from {source_id}. {target_id} power at {}/{}",
                target.charge(),
                target.charge_max()
            );
            log.info(message.clone());
            ToolOutcome::pending(message)
        }
    }
}
