use droidworks_core::{ComponentId, Identity};
use serde::Serialize;

use super::PowerPack;
use crate::entity::Entity;

/// Bounded water reservoir.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WaterTank {
    fill: u32,
    capacity: u32,
}

impl WaterTank {
    /// Empty tank.
    #[must_use]
    pub const fn new(capacity: u32) -> Self {
        Self { fill: 0, capacity }
    }

    /// Stored water.
    #[must_use]
    pub const fn fill(&self) -> u32 {
        self.fill
    }

    /// Maximum water.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Reports whether the tank is full.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.fill >= self.capacity
    }

    /// Adds up to `amount` and returns what was accepted.
    pub fn add(&mut self, amount: u32) -> u32 {
        let added = amount.min(self.capacity.saturating_sub(self.fill));
        self.fill += added;
        added
    }

    /// Removes up to `amount` and returns what was removed.
    pub fn drain(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.fill);
        self.fill -= taken;
        taken
    }
}

/// Spends one unit of charge per tick to condense water into the tank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CondenserUnit {
    water_per_charge: u32,
}

impl CondenserUnit {
    /// Condenser yielding `water_per_charge` per unit of charge.
    #[must_use]
    pub const fn new(water_per_charge: u32) -> Self {
        Self { water_per_charge }
    }

    /// Water condensed per unit of charge.
    #[must_use]
    pub const fn water_per_charge(&self) -> u32 {
        self.water_per_charge
    }

    pub(crate) fn tick(&self, log: &mut Identity<ComponentId>, host: &mut Entity) {
        let chassis = host.chassis();
        let Some(tank) = chassis.get::<WaterTank>() else {
            log.error("No water tank found in the chassis. CondenserUnit cannot function without a water tank.");
            return;
        };
        let Some(power) = chassis.get::<PowerPack>() else {
            log.error("No power pack found in the chassis. CondenserUnit cannot function without a power pack.");
            return;
        };
        if tank.is_full() || power.charge() == 0 {
            return;
        }

        if let Some(power) = host.chassis_mut().get_mut::<PowerPack>() {
            let _ = power.drain(1);
        }
        if let Some(tank) = host.chassis_mut().get_mut::<WaterTank>() {
            let _ = tank.add(self.water_per_charge);
        }
    }
}
