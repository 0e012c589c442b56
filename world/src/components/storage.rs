use droidworks_core::{ComponentId, Identity, ParamKind, ToolOutcome, ToolParam, ToolSpec};
use serde::Serialize;

use crate::{
    component::{failure, Component},
    context::{Context, Reach},
    entity::Entity,
};

/// Bounded inventory of uninstalled components. Stored components never tick.
#[derive(Clone, Debug, Serialize)]
pub struct Storage {
    capacity: usize,
    inventory: Vec<Component>,
}

impl Storage {
    /// Empty storage holding at most `capacity` components.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inventory: Vec::new(),
        }
    }

    /// Maximum number of components.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free places left.
    #[must_use]
    pub fn available_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.inventory.len())
    }

    /// Reports whether no place is left.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.inventory.len() >= self.capacity
    }

    /// Stored components in insertion order.
    #[must_use]
    pub fn inventory(&self) -> &[Component] {
        &self.inventory
    }

    /// First stored component matching an id, model or type name.
    #[must_use]
    pub fn find(&self, identifier: &str) -> Option<&Component> {
        self.inventory
            .iter()
            .find(|component| component.matches(identifier))
    }

    /// Stores a component, handing it back when full.
    pub fn add(&mut self, component: Component) -> Result<(), Component> {
        if self.is_full() {
            return Err(component);
        }
        self.hold(component);
        Ok(())
    }

    /// Removes the first component matching an id, model or type name.
    pub fn remove(&mut self, identifier: &str) -> Option<Component> {
        let index = self
            .inventory
            .iter()
            .position(|component| component.matches(identifier))?;
        Some(self.inventory.remove(index))
    }

    fn hold(&mut self, mut component: Component) {
        component.set_chassis(None);
        self.inventory.push(component);
    }

    fn release(&mut self) -> Option<Component> {
        self.inventory.pop()
    }
}

const TARGET_ENTITY: ToolParam = ToolParam {
    name: "target_entity",
    kind: ParamKind::String,
    description: "Entity identifier (type name or ID).",
    required: true,
};

const TARGET_COMPONENT: ToolParam = ToolParam {
    name: "target_component",
    kind: ParamKind::String,
    description: "Component identifier (type name or ID).",
    required: true,
};

pub(crate) const GRIPPER_TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "pull_component",
        description: "Pull a component out of an adjacent entity's slots or storage and hold it.",
        params: &[TARGET_COMPONENT, TARGET_ENTITY],
    },
    ToolSpec {
        name: "install_component",
        description: "Install the held component into the first compatible empty slot of an adjacent entity.",
        params: &[TARGET_ENTITY],
    },
    ToolSpec {
        name: "store_component",
        description: "Store the held component in a storage with spare room. Defaults to our own entity.",
        params: &[ToolParam {
            name: "target_entity",
            kind: ParamKind::String,
            description: "Optional entity identifier (type name or ID).",
            required: false,
        }],
    },
    ToolSpec {
        name: "unstore_component",
        description: "Take a component out of one of our own storages and hold it.",
        params: &[TARGET_COMPONENT],
    },
];

/// Manipulator holding at most one component, moved between adjacent entities.
#[derive(Clone, Debug, Serialize)]
pub struct Gripper {
    storage: Storage,
}

impl Default for Gripper {
    fn default() -> Self {
        Self::new()
    }
}

impl Gripper {
    /// Empty gripper.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            storage: Storage::new(1),
        }
    }

    /// Component currently held.
    #[must_use]
    pub fn held(&self) -> Option<&Component> {
        self.storage.inventory.first()
    }

    /// The single-place storage backing the gripper.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub(crate) fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    pub(crate) fn pull_component(
        &mut self,
        log: &mut Identity<ComponentId>,
        host: &mut Entity,
        ctx: &mut Context<'_>,
        target_component: &str,
        target_entity: &str,
    ) -> ToolOutcome {
        if let Some(held) = self.held() {
            return failure(
                log,
                format!(
                    "Gripper already holding component {}. Cannot pull another component.",
                    held.id()
                ),
            );
        }
        let Some(entity) = reach_adjacent(log, host, ctx, target_entity) else {
            return last_failure(log);
        };
        let entity_id = entity.id().clone();
        let Some(component) = entity.chassis_mut().take_component(target_component) else {
            return failure(
                log,
                format!("Component '{target_component}' not found in entity '{entity_id}'."),
            );
        };

        let message = format!(
            "Successfully pulled component {} from entity {entity_id}.",
            component.id()
        );
        self.storage.hold(component);
        log.info(message.clone());
        ToolOutcome::success(message)
    }

    pub(crate) fn install_component(
        &mut self,
        log: &mut Identity<ComponentId>,
        host: &mut Entity,
        ctx: &mut Context<'_>,
        target_entity: &str,
    ) -> ToolOutcome {
        if self.held().is_none() {
            return failure(log, "Gripper is not holding any component to install.".into());
        }
        let Some(entity) = reach_adjacent(log, host, ctx, target_entity) else {
            return last_failure(log);
        };
        let entity_id = entity.id().clone();

        let Some(held) = self.held() else {
            return failure(log, "Gripper is not holding any component to install.".into());
        };
        let Some(slot) = entity
            .chassis()
            .compatible_empty_slot(held)
            .map(str::to_owned)
        else {
            return failure(
                log,
                format!(
                    "No compatible empty slot found for component {} in entity {entity_id}.",
                    held.model()
                ),
            );
        };

        let Some(component) = self.storage.release() else {
            return failure(log, "Gripper is not holding any component to install.".into());
        };
        let component_id = component.id().clone();
        match entity.chassis_mut().install_component(&slot, component) {
            Ok(()) => {
                let message = format!(
                    "Successfully installed component {component_id} into entity {entity_id}."
                );
                log.info(message.clone());
                ToolOutcome::success(message)
            }
            Err(rejected) => {
                let reason = rejected.reason.to_string();
                self.storage.hold(*rejected.component);
                failure(
                    log,
                    format!("Failed to install component {component_id}: {reason}."),
                )
            }
        }
    }

    pub(crate) fn store_component(
        &mut self,
        log: &mut Identity<ComponentId>,
        host: &mut Entity,
        ctx: &mut Context<'_>,
        target_entity: Option<&str>,
    ) -> ToolOutcome {
        if self.held().is_none() {
            return failure(log, "Gripper is not holding any component to store.".into());
        }
        let entity = match target_entity {
            None => host,
            Some(identifier) => match reach_adjacent(log, host, ctx, identifier) {
                Some(entity) => entity,
                None => return last_failure(log),
            },
        };
        let owner = if target_entity.is_some() {
            entity.id().to_string()
        } else {
            String::from("own entity")
        };

        let Some(component) = self.storage.release() else {
            return failure(log, "Gripper is not holding any component to store.".into());
        };
        let component_id = component.id().clone();
        match entity.chassis_mut().store_component(component) {
            Ok(storage_id) => {
                let message =
                    format!("Successfully stored component {component_id} in {storage_id}.");
                log.info(message.clone());
                ToolOutcome::success(message)
            }
            Err(component) => {
                self.storage.hold(component);
                failure(
                    log,
                    format!("No Storage component with available capacity found in {owner}."),
                )
            }
        }
    }

    pub(crate) fn unstore_component(
        &mut self,
        log: &mut Identity<ComponentId>,
        host: &mut Entity,
        target_component: &str,
    ) -> ToolOutcome {
        if let Some(held) = self.held() {
            return failure(
                log,
                format!(
                    "Gripper already holding component {}. Cannot retrieve another component.",
                    held.id()
                ),
            );
        }
        let Some((component, storage_id)) = host.chassis_mut().take_stored(target_component)
        else {
            return failure(
                log,
                format!(
                    "Component '{target_component}' not found in any Storage component of this entity."
                ),
            );
        };

        let message = format!(
            "Successfully retrieved component {} from storage {storage_id}.",
            component.id()
        );
        self.storage.hold(component);
        log.info(message.clone());
        ToolOutcome::success(message)
    }
}

/// Resolves the nearest matching entity and checks it is within one tile.
/// On failure the reason is the last message in `log`.
fn reach_adjacent<'h>(
    log: &mut Identity<ComponentId>,
    host: &'h mut Entity,
    ctx: &'h mut Context<'_>,
    identifier: &str,
) -> Option<&'h mut Entity> {
    let Some((reach, distance)) = ctx.reach(host, identifier) else {
        log.warn(format!("No entities found with identifier '{identifier}'."));
        return None;
    };
    if distance > 1 {
        let id = match &reach {
            Reach::Host => host.id().to_string(),
            Reach::Other(id) => id.to_string(),
        };
        log.warn(format!(
            "Entity {id} is not adjacent (distance: {distance}). Must be adjacent (distance ≤ 1)."
        ));
        return None;
    }
    ctx.reach_mut(host, &reach)
}

fn last_failure(log: &Identity<ComponentId>) -> ToolOutcome {
    ToolOutcome::failure(log.last_message().unwrap_or("Target entity is out of reach."))
}
