//! Prebuilt component and entity models.

use droidworks_core::Location;
use thiserror::Error;

use crate::{
    behavior::{Behavior, RandomWalker},
    chassis::SlotError,
    component::{Component, ComponentKind, Module},
    components::{
        Chronometer, CondenserUnit, Gripper, Motivator, Planner, PowerConverter, PowerGenerator,
        PowerPack, Storage, TowCable, WaterTank,
    },
    entity::Entity,
};

/// Failure to build a prebuilt model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No model with this name exists.
    #[error("unknown model `{0}`")]
    UnknownModel(String),
    /// A slot declaration or default install was refused.
    #[error(transparent)]
    Slot(#[from] SlotError),
}

type Factory = fn() -> Module;

const COMPONENT_MODELS: &[(&str, &str, Factory)] = &[
    ("PowerPack", "Power Pack", || Module::PowerPack(PowerPack::new(100))),
    ("SmallPowerPack", "Small Power Pack", || {
        Module::PowerPack(PowerPack::new(50))
    }),
    ("LargePowerPack", "Large Power Pack", || {
        Module::PowerPack(PowerPack::new(200))
    }),
    ("Motivator", "Basic Motivator", || {
        Module::Motivator(Motivator::new(Planner::Greedy))
    }),
    ("AStarMotivator", "Advanced Motivator", || {
        Module::Motivator(Motivator::new(Planner::AStar))
    }),
    ("PowerGenerator", "Power Generator", || {
        Module::PowerGenerator(PowerGenerator::new(8, 1))
    }),
    ("SolarPanel", "Solar Panel", || {
        Module::PowerGenerator(PowerGenerator::new(10, 10))
    }),
    ("MicroFusionPowerCell", "Micro Fusion Power Cell", || {
        Module::PowerGenerator(PowerGenerator::new(2, 50))
    }),
    ("PowerConverter", "Universal Power Converter", || {
        Module::PowerConverter(PowerConverter::standard())
    }),
    ("HeavyDutyPowerConverter", "Heavy Duty Power Converter", || {
        Module::PowerConverter(PowerConverter::heavy_duty())
    }),
    ("WaterTank", "Water Tank", || Module::WaterTank(WaterTank::new(100))),
    ("SmallWaterTank", "Small Water Tank", || {
        Module::WaterTank(WaterTank::new(50))
    }),
    ("LargeWaterTank", "Large Water Tank", || {
        Module::WaterTank(WaterTank::new(200))
    }),
    ("CondenserUnit", "Condenser Unit", || {
        Module::CondenserUnit(CondenserUnit::new(1))
    }),
    ("AdvancedCondenserUnit", "Advanced Condenser Unit", || {
        Module::CondenserUnit(CondenserUnit::new(2))
    }),
    ("Storage", "Basic Storage", || Module::Storage(Storage::new(1))),
    ("SmallStorage", "Small Storage", || Module::Storage(Storage::new(2))),
    ("MediumStorage", "Medium Storage", || Module::Storage(Storage::new(5))),
    ("LargeStorage", "Large Storage", || Module::Storage(Storage::new(25))),
    ("Gripper", "Gripper", || Module::Gripper(Gripper::new())),
    ("TowCable", "Tow Cable", || Module::TowCable(TowCable::new())),
    ("Chronometer", "Chronometer", || Module::Chronometer(Chronometer::new())),
];

/// Names of every prebuilt component model.
pub fn component_models() -> impl Iterator<Item = &'static str> {
    COMPONENT_MODELS.iter().map(|(model, ..)| *model)
}

/// Builds a component from its model name.
pub fn component(model: &str) -> Result<Component, ModelError> {
    let (model, name, build) = COMPONENT_MODELS
        .iter()
        .find(|(candidate, ..)| *candidate == model)
        .ok_or_else(|| ModelError::UnknownModel(model.to_owned()))?;
    Ok(Component::new(*model, build()).named(*name))
}

struct SlotSpec {
    id: &'static str,
    accepts: ComponentKind,
    default: Option<&'static str>,
}

const fn slot(id: &'static str, accepts: ComponentKind, default: Option<&'static str>) -> SlotSpec {
    SlotSpec {
        id,
        accepts,
        default,
    }
}

struct EntityModel {
    name: &'static str,
    description: &'static str,
    slots: &'static [SlotSpec],
}

const ENTITY_MODELS: &[EntityModel] = &[
    EntityModel {
        name: "R2Astromech",
        description: "Utility droid with four manipulator mounts and a self-charging power adapter.",
        slots: &[
            slot("processor", ComponentKind::Any, None),
            slot("motivator", ComponentKind::Motivator, Some("Motivator")),
            slot("power_pack", ComponentKind::PowerPack, Some("SmallPowerPack")),
            slot("manipulator_1", ComponentKind::Any, None),
            slot("manipulator_2", ComponentKind::Any, None),
            slot("manipulator_3", ComponentKind::Any, None),
            slot("manipulator_4", ComponentKind::Any, None),
            slot("power_adapter", ComponentKind::PowerConverter, Some("PowerConverter")),
            slot("chronometer", ComponentKind::Chronometer, Some("Chronometer")),
        ],
    },
    EntityModel {
        name: "GonkDroid",
        description: "Power droid that carries a large battery and charges other equipment.",
        slots: &[
            slot("power_pack", ComponentKind::PowerPack, Some("PowerPack")),
            slot("motivator", ComponentKind::Motivator, Some("Motivator")),
            slot(
                "power_adapter",
                ComponentKind::PowerConverter,
                Some("HeavyDutyPowerConverter"),
            ),
            slot("misc", ComponentKind::Any, None),
        ],
    },
    EntityModel {
        name: "Vaporator",
        description: "Moisture vaporator frame with nothing installed.",
        slots: &[
            slot("power_pack", ComponentKind::PowerPack, None),
            slot("condenser", ComponentKind::CondenserUnit, None),
            slot("water_tank", ComponentKind::WaterTank, None),
        ],
    },
    EntityModel {
        name: "GX1Vaporator",
        description: "Entry-level vaporator with a small tank.",
        slots: &[
            slot("power_pack", ComponentKind::PowerPack, Some("SmallPowerPack")),
            slot("condenser", ComponentKind::CondenserUnit, Some("CondenserUnit")),
            slot("water_tank", ComponentKind::WaterTank, Some("SmallWaterTank")),
        ],
    },
    EntityModel {
        name: "GX8Vaporator",
        description: "Vaporator with a larger battery, tank and a more efficient condenser.",
        slots: &[
            slot("power_pack", ComponentKind::PowerPack, Some("PowerPack")),
            slot(
                "condenser",
                ComponentKind::CondenserUnit,
                Some("AdvancedCondenserUnit"),
            ),
            slot("water_tank", ComponentKind::WaterTank, Some("LargeWaterTank")),
        ],
    },
    EntityModel {
        name: "PowerStation",
        description: "Power station frame with empty pack and generator slots.",
        slots: &[
            slot("power_pack", ComponentKind::PowerPack, None),
            slot("power_generator", ComponentKind::PowerGenerator, None),
        ],
    },
    EntityModel {
        name: "MicroFusionPowerStation",
        description: "Power station driven by a micro fusion cell.",
        slots: &[
            slot("power_pack", ComponentKind::PowerPack, Some("LargePowerPack")),
            slot(
                "power_generator",
                ComponentKind::PowerGenerator,
                Some("MicroFusionPowerCell"),
            ),
        ],
    },
    EntityModel {
        name: "SolarPowerStation",
        description: "Solar generator with four vanes that can each hold a panel.",
        slots: &[
            slot("power_pack", ComponentKind::PowerPack, Some("LargePowerPack")),
            slot("solar_vane_1", ComponentKind::PowerGenerator, Some("SolarPanel")),
            slot("solar_vane_2", ComponentKind::PowerGenerator, Some("SolarPanel")),
            slot("solar_vane_3", ComponentKind::PowerGenerator, None),
            slot("solar_vane_4", ComponentKind::PowerGenerator, None),
        ],
    },
    EntityModel {
        name: "StorageContainer",
        description: "Crate holding up to twenty-five components.",
        slots: &[slot("storage", ComponentKind::Storage, Some("LargeStorage"))],
    },
];

/// Names of every prebuilt entity model.
pub fn entity_models() -> impl Iterator<Item = &'static str> {
    ENTITY_MODELS
        .iter()
        .map(|model| model.name)
        .chain(std::iter::once("RandomWalker"))
}

/// Builds an entity model at `location`, defaults installed.
pub fn entity(model: &str, location: Location) -> Result<Entity, ModelError> {
    if model == "RandomWalker" {
        return Ok(random_walker(location, 0));
    }
    let model = ENTITY_MODELS
        .iter()
        .find(|candidate| candidate.name == model)
        .ok_or_else(|| ModelError::UnknownModel(model.to_owned()))?;

    let mut entity = Entity::new(model.name, location).described(model.description);
    let chassis = entity.chassis_mut();
    for spec in model.slots {
        chassis.add_slot(spec.id, spec.accepts)?;
        if let Some(default) = spec.default {
            chassis
                .install_component(spec.id, component(default)?)
                .map_err(SlotError::from)?;
        }
    }
    Ok(entity)
}

/// Slotless wanderer driven by a seeded random walk.
#[must_use]
pub fn random_walker(location: Location, seed: u64) -> Entity {
    Entity::new("RandomWalker", location)
        .described("Wanders the map at random.")
        .with_behavior(Behavior::RandomWalk(RandomWalker::new(seed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_model_builds() {
        for model in component_models() {
            let built = component(model).expect("listed component model");
            assert_eq!(built.model(), model);
        }
        for model in entity_models() {
            let built = entity(model, Location::new(3, 3)).expect("listed entity model");
            assert_eq!(built.type_name(), model);
        }
    }

    #[test]
    fn astromech_ships_with_its_defaults() {
        let r2 = entity("R2Astromech", Location::new(4, 4)).expect("known model");
        let chassis = r2.chassis();
        assert_eq!(chassis.slots().len(), 9);
        assert_eq!(chassis.get::<PowerPack>().map(PowerPack::charge_max), Some(50));
        assert!(chassis.get_component("processor").is_none());
        assert!(chassis.get::<Chronometer>().is_some());
        let installed: Vec<&str> = chassis.components().map(Component::model).collect();
        assert_eq!(
            installed,
            ["Motivator", "SmallPowerPack", "PowerConverter", "Chronometer"]
        );
        for component in chassis.components() {
            assert_eq!(component.chassis(), Some(r2.id()));
        }
    }

    #[test]
    fn unknown_models_are_reported() {
        assert!(matches!(component("FluxCapacitor"), Err(ModelError::UnknownModel(_))));
        assert!(matches!(
            entity("Landspeeder", Location::new(1, 1)),
            Err(ModelError::UnknownModel(_))
        ));
    }
}
