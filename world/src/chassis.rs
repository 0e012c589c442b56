use droidworks_core::{ComponentId, EntityId, Footprint, IntentRejection, MovementIntent, ToolSpec};
use serde::Serialize;
use thiserror::Error;

use crate::{
    component::{Capability, Component, ComponentKind, ComponentQuery},
    components::Storage,
};

/// Reason a slot operation was refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SlotError {
    /// The chassis declares no slot with this id.
    #[error("unknown slot `{0}`")]
    UnknownSlot(String),
    /// A slot with this id is already declared.
    #[error("slot `{0}` is already declared")]
    DuplicateSlot(String),
    /// The component kind does not descend from the accepted kind.
    #[error("slot `{slot}` accepts {expected}, got {found}")]
    IncompatibleType {
        /// Target slot.
        slot: String,
        /// Kind accepted by the slot.
        expected: ComponentKind,
        /// Kind of the offered component.
        found: ComponentKind,
    },
    /// The slot already holds a component.
    #[error("slot `{slot}` is occupied by {occupant}")]
    SlotOccupied {
        /// Target slot.
        slot: String,
        /// Current occupant.
        occupant: ComponentId,
    },
    /// The slot holds nothing.
    #[error("slot `{0}` is empty")]
    EmptySlot(String),
}

/// Failed install. The component is handed back untouched.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct InstallFailure {
    /// Why the install was refused.
    pub reason: SlotError,
    /// The rejected component.
    pub component: Box<Component>,
}

impl From<InstallFailure> for SlotError {
    fn from(failure: InstallFailure) -> Self {
        failure.reason
    }
}

/// Named, typed place for one component.
#[derive(Clone, Debug, Serialize)]
pub struct Slot {
    id: String,
    accepts: ComponentKind,
    component: Option<Component>,
    #[serde(skip)]
    checked_out: Option<ComponentId>,
}

impl Slot {
    /// Slot id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Kind accepted by the slot, subtypes included.
    #[must_use]
    pub const fn accepts(&self) -> ComponentKind {
        self.accepts
    }

    /// Installed component.
    #[must_use]
    pub const fn component(&self) -> Option<&Component> {
        self.component.as_ref()
    }

    /// Reports whether the slot can take a component right now.
    #[must_use]
    pub const fn is_vacant(&self) -> bool {
        self.component.is_none() && self.checked_out.is_none()
    }

    /// Reports whether the component's kind fits the slot.
    #[must_use]
    pub fn accepts_component(&self, component: &Component) -> bool {
        component.kind().is_a(self.accepts)
    }
}

/// Slot table, health, footprint and movement state of an entity.
#[derive(Clone, Debug, Serialize)]
pub struct Chassis {
    #[serde(skip)]
    owner: EntityId,
    slots: Vec<Slot>,
    health: u32,
    footprint: Footprint,
    move_priority: i32,
    pending_intent: Option<MovementIntent>,
}

impl Chassis {
    pub(crate) fn new(owner: EntityId) -> Self {
        Self {
            owner,
            slots: Vec::new(),
            health: 100,
            footprint: Footprint::UNIT,
            move_priority: 100,
            pending_intent: None,
        }
    }

    /// Declares an empty slot accepting `accepts` and its subtypes.
    pub fn add_slot(
        &mut self,
        id: impl Into<String>,
        accepts: ComponentKind,
    ) -> Result<(), SlotError> {
        let id = id.into();
        if self.slots.iter().any(|slot| slot.id == id) {
            return Err(SlotError::DuplicateSlot(id));
        }
        self.slots.push(Slot {
            id,
            accepts,
            component: None,
            checked_out: None,
        });
        Ok(())
    }

    /// Declared slots in declaration order.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Entity owning this chassis.
    #[must_use]
    pub const fn owner(&self) -> &EntityId {
        &self.owner
    }

    /// Health counter.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Overwrites the health counter.
    pub fn set_health(&mut self, health: u32) {
        self.health = health;
    }

    /// Tiles covered, anchored at the entity location.
    #[must_use]
    pub const fn footprint(&self) -> Footprint {
        self.footprint
    }

    /// Changes the covered tiles.
    pub fn set_footprint(&mut self, footprint: Footprint) {
        self.footprint = footprint;
    }

    /// Resolution priority; lower goes first.
    #[must_use]
    pub const fn move_priority(&self) -> i32 {
        self.move_priority
    }

    /// Changes the resolution priority.
    pub fn set_move_priority(&mut self, priority: i32) {
        self.move_priority = priority;
    }

    /// Installs `component` into `slot_id`.
    ///
    /// The slot must exist, accept the component's kind and be vacant.
    /// On failure the component comes back inside the error.
    pub fn install_component(
        &mut self,
        slot_id: &str,
        mut component: Component,
    ) -> Result<(), InstallFailure> {
        let reject = |reason, component| {
            Err(InstallFailure {
                reason,
                component: Box::new(component),
            })
        };
        let Some(slot) = self.slots.iter_mut().find(|slot| slot.id == slot_id) else {
            return reject(SlotError::UnknownSlot(slot_id.to_owned()), component);
        };
        if !slot.accepts_component(&component) {
            let reason = SlotError::IncompatibleType {
                slot: slot.id.clone(),
                expected: slot.accepts,
                found: component.kind(),
            };
            return reject(reason, component);
        }
        let occupant = slot
            .component
            .as_ref()
            .map(|occupant| occupant.id().clone())
            .or_else(|| slot.checked_out.clone());
        if let Some(occupant) = occupant {
            let reason = SlotError::SlotOccupied {
                slot: slot.id.clone(),
                occupant,
            };
            return reject(reason, component);
        }

        component.on_installed(&self.owner);
        slot.component = Some(component);
        Ok(())
    }

    /// Removes the component in `slot_id`, clearing its chassis reference.
    pub fn uninstall_component(&mut self, slot_id: &str) -> Result<Component, SlotError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.id == slot_id)
            .ok_or_else(|| SlotError::UnknownSlot(slot_id.to_owned()))?;
        let mut component = slot
            .component
            .take()
            .ok_or_else(|| SlotError::EmptySlot(slot_id.to_owned()))?;
        component.set_chassis(None);
        Ok(component)
    }

    fn position(&self, query: ComponentQuery<'_>) -> Option<usize> {
        let installed = |test: &dyn Fn(&Component) -> bool| {
            self.slots
                .iter()
                .position(|slot| slot.component.as_ref().is_some_and(test))
        };
        match query {
            ComponentQuery::Kind(kind) => installed(&|component| component.kind().is_a(kind)),
            ComponentQuery::Name(name) => self
                .slots
                .iter()
                .position(|slot| slot.id == name)
                .or_else(|| installed(&|component| component.id().as_str() == name))
                .or_else(|| installed(&|component| component.matches(name))),
        }
    }

    /// Looks a component up by kind, or by slot id, component id, model or
    /// lineage type name in that order. A matching slot id wins even when
    /// the slot is empty.
    pub fn get_component<'q>(&self, query: impl Into<ComponentQuery<'q>>) -> Option<&Component> {
        let index = self.position(query.into())?;
        self.slots[index].component.as_ref()
    }

    /// Mutable variant of [`Chassis::get_component`].
    pub fn get_component_mut<'q>(
        &mut self,
        query: impl Into<ComponentQuery<'q>>,
    ) -> Option<&mut Component> {
        let index = self.position(query.into())?;
        self.slots[index].component.as_mut()
    }

    /// Typed capability of the first component of kind `T`.
    #[must_use]
    pub fn get<T: Capability>(&self) -> Option<&T> {
        self.get_component(T::KIND).and_then(Component::get)
    }

    /// Mutable typed capability of the first component of kind `T`.
    pub fn get_mut<T: Capability>(&mut self) -> Option<&mut T> {
        self.get_component_mut(T::KIND).and_then(Component::get_mut)
    }

    /// Installed components in slot order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.slots.iter().filter_map(|slot| slot.component.as_ref())
    }

    pub(crate) fn components_mut(&mut self) -> impl Iterator<Item = &mut Component> {
        self.slots.iter_mut().filter_map(|slot| slot.component.as_mut())
    }

    /// Tools of every installed component in slot order, duplicates included.
    pub fn collect_tools(&self) -> impl Iterator<Item = (&Component, &'static ToolSpec)> {
        self.components()
            .flat_map(|component| component.tools().iter().map(move |tool| (component, tool)))
    }

    /// First installed component offering the named tool.
    #[must_use]
    pub fn tool_provider(&self, name: &str) -> Option<&ComponentId> {
        self.collect_tools()
            .find(|(_, tool)| tool.name == name)
            .map(|(component, _)| component.id())
    }

    /// Queues a validated step for the next resolution pass.
    pub fn request_move(&mut self, dx: i32, dy: i32) -> Result<(), IntentRejection> {
        self.request_intent(MovementIntent::step(dx, dy)?)
    }

    /// Queues a caller-built intent after validating its shape.
    pub fn request_intent(&mut self, intent: MovementIntent) -> Result<(), IntentRejection> {
        intent.validate()?;
        self.queue_intent(intent)
    }

    /// Queues an intent without shape validation. The resolver reports a
    /// malformed intent as `invalid_intent`.
    pub fn queue_intent(&mut self, intent: MovementIntent) -> Result<(), IntentRejection> {
        if self.pending_intent.is_some() {
            return Err(IntentRejection::PendingIntentExists);
        }
        self.pending_intent = Some(intent);
        Ok(())
    }

    /// Intent waiting for the next resolution pass.
    #[must_use]
    pub const fn pending_intent(&self) -> Option<&MovementIntent> {
        self.pending_intent.as_ref()
    }

    pub(crate) fn clear_intent(&mut self) -> Option<MovementIntent> {
        self.pending_intent.take()
    }

    fn storages_mut(&mut self) -> impl Iterator<Item = (ComponentId, &mut Storage)> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.component.as_mut())
            .filter(|component| component.kind() == ComponentKind::Storage)
            .filter_map(|component| {
                let id = component.id().clone();
                component.get_mut::<Storage>().map(|storage| (id, storage))
            })
    }

    /// Removes a matching component from the slots, or failing that from
    /// the inventory of a storage installed here.
    pub fn take_component(&mut self, identifier: &str) -> Option<Component> {
        if let Some(index) = self.position(ComponentQuery::Name(identifier)) {
            if let Some(mut component) = self.slots[index].component.take() {
                component.set_chassis(None);
                return Some(component);
            }
        }
        self.take_stored(identifier).map(|(component, _)| component)
    }

    /// Removes a matching component from the first storage holding one.
    /// Returns it along with the id of the storage it came from.
    pub fn take_stored(&mut self, identifier: &str) -> Option<(Component, ComponentId)> {
        self.storages_mut().find_map(|(storage_id, storage)| {
            storage
                .remove(identifier)
                .map(|component| (component, storage_id))
        })
    }

    /// Places a component in the first storage with spare room. Returns the
    /// storage id, or the component when every storage is full.
    pub fn store_component(&mut self, component: Component) -> Result<ComponentId, Component> {
        match self.storages_mut().find(|(_, storage)| !storage.is_full()) {
            Some((storage_id, storage)) => storage.add(component).map(|()| storage_id),
            None => Err(component),
        }
    }

    /// First vacant slot accepting the component's kind.
    #[must_use]
    pub fn compatible_empty_slot(&self, component: &Component) -> Option<&str> {
        self.slots
            .iter()
            .find(|slot| slot.is_vacant() && slot.accepts_component(component))
            .map(Slot::id)
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Takes the component out of a slot while it runs a hook. The slot
    /// stays reserved until [`Chassis::check_in`].
    pub(crate) fn check_out(&mut self, index: usize) -> Option<Component> {
        let slot = self.slots.get_mut(index)?;
        let component = slot.component.take()?;
        slot.checked_out = Some(component.id().clone());
        Some(component)
    }

    pub(crate) fn check_in(&mut self, index: usize, component: Component) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.checked_out = None;
            slot.component = Some(component);
        }
    }
}
