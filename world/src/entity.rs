use droidworks_core::{
    EntityId, Footprint, Identity, IntentRejection, Location, LogRecord, ToolCall, ToolOutcome,
    ToolSpec,
};
use droidworks_system_movement::Body;

use crate::{
    behavior::Behavior,
    chassis::Chassis,
    component::{Component, HookError, ToolError},
    context::Context,
};

/// Registered body on the map: identity, placement and chassis.
#[derive(Clone, Debug)]
pub struct Entity {
    identity: Identity<EntityId>,
    type_name: String,
    location: Location,
    name: Option<String>,
    description: Option<String>,
    chassis: Chassis,
    behavior: Option<Behavior>,
}

impl Entity {
    /// Creates an entity with an id generated from its type name.
    #[must_use]
    pub fn new(type_name: impl Into<String>, location: Location) -> Self {
        let type_name = type_name.into();
        let id = EntityId::generate(&type_name);
        Self::with_id(id, type_name, location)
    }

    /// Creates an entity with a caller-chosen id.
    #[must_use]
    pub fn with_id(id: EntityId, type_name: impl Into<String>, location: Location) -> Self {
        Self {
            chassis: Chassis::new(id.clone()),
            identity: Identity::new(id),
            type_name: type_name.into(),
            location,
            name: None,
            description: None,
            behavior: None,
        }
    }

    /// Sets the human-readable name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches an autonomous behaviour run after the components tick.
    #[must_use]
    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Sets the chassis footprint.
    #[must_use]
    pub fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.chassis.set_footprint(footprint);
        self
    }

    /// Sets the chassis movement priority.
    #[must_use]
    pub fn with_move_priority(mut self, priority: i32) -> Self {
        self.chassis.set_move_priority(priority);
        self
    }

    /// Unique id.
    #[must_use]
    pub fn id(&self) -> &EntityId {
        self.identity.id()
    }

    /// Type name used in lookups.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Anchor of the footprint.
    #[must_use]
    pub const fn location(&self) -> Location {
        self.location
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Slot table and movement state.
    #[must_use]
    pub const fn chassis(&self) -> &Chassis {
        &self.chassis
    }

    /// Mutable slot table and movement state.
    pub fn chassis_mut(&mut self) -> &mut Chassis {
        &mut self.chassis
    }

    /// Autonomous behaviour, if any.
    #[must_use]
    pub const fn behavior(&self) -> Option<&Behavior> {
        self.behavior.as_ref()
    }

    /// Reports whether `identifier` is the id, the type name or the name.
    #[must_use]
    pub fn matches(&self, identifier: &str) -> bool {
        self.id().as_str() == identifier
            || self.type_name == identifier
            || self.name.as_deref() == Some(identifier)
    }

    /// Queues a validated step on the chassis.
    pub fn request_move(&mut self, dx: i32, dy: i32) -> Result<(), IntentRejection> {
        self.chassis.request_move(dx, dy)
    }

    /// Appends an informational record.
    pub fn info(&mut self, message: impl Into<String>) {
        self.identity.info(message);
    }

    /// Appends a warning record.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.identity.warn(message);
    }

    /// Appends an error record.
    pub fn error(&mut self, message: impl Into<String>) {
        self.identity.error(message);
    }

    /// The entity's own history.
    #[must_use]
    pub fn history(&self) -> &[LogRecord] {
        self.identity.history()
    }

    /// Own history merged with every installed component's, oldest first.
    #[must_use]
    pub fn logs(&self) -> Vec<LogRecord> {
        let mut records: Vec<LogRecord> = self
            .identity
            .history()
            .iter()
            .chain(self.chassis.components().flat_map(Component::logs))
            .cloned()
            .collect();
        records.sort_by_key(|record| (record.timestamp, record.sequence));
        records
    }

    /// Union of every installed component's tools.
    ///
    /// When two components offer the same tool name the one in the earlier
    /// slot wins and the collision is logged.
    pub fn get_available_tools(&mut self) -> Vec<&'static ToolSpec> {
        let mut tools: Vec<&'static ToolSpec> = Vec::new();
        let mut collisions = Vec::new();
        for (component, tool) in self.chassis.collect_tools() {
            if tools.iter().any(|known| known.name == tool.name) {
                collisions.push(format!(
                    "Tool `{}` from {} is shadowed by an earlier component.",
                    tool.name,
                    component.id()
                ));
            } else {
                tools.push(tool);
            }
        }
        for collision in collisions {
            self.identity.warn(collision);
        }
        tools
    }

    pub(crate) fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    pub(crate) fn body(&self) -> Body {
        Body {
            id: self.id().clone(),
            location: self.location,
            footprint: self.chassis.footprint(),
        }
    }

    pub(crate) fn tick(&mut self, ctx: &mut Context<'_>) {
        self.for_each_component(ctx, "tick", |component, host, ctx| {
            component.tick(host, ctx);
            Ok(())
        });
        if let Some(mut behavior) = self.behavior.take() {
            behavior.tick(self, ctx);
            self.behavior = Some(behavior);
        }
    }

    /// Runs `hook` on every installed component in slot order. Each
    /// component is checked out of its slot for the call so it can borrow
    /// its host mutably. Hook errors are logged on the component.
    pub(crate) fn for_each_component<F>(&mut self, ctx: &mut Context<'_>, hook: &str, mut f: F)
    where
        F: FnMut(&mut Component, &mut Self, &mut Context<'_>) -> Result<(), HookError>,
    {
        for index in 0..self.chassis.slot_count() {
            let Some(mut component) = self.chassis.check_out(index) else {
                continue;
            };
            if let Err(error) = f(&mut component, self, ctx) {
                component.error(format!("{hook} hook failed: {error}"));
            }
            self.chassis.check_in(index, component);
        }
    }

    pub(crate) fn invoke_tool(
        &mut self,
        call: &ToolCall,
        ctx: &mut Context<'_>,
    ) -> Result<ToolOutcome, ToolError> {
        let index = self
            .chassis
            .slots()
            .iter()
            .position(|slot| {
                slot.component()
                    .is_some_and(|component| component.tools().iter().any(|tool| tool.name == call.name))
            })
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;
        let mut component = self
            .chassis
            .check_out(index)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;
        let outcome = component.invoke(call, self, ctx);
        self.chassis.check_in(index, component);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        component::{ComponentKind, Module},
        components::{Gripper, Storage},
    };

    #[test]
    fn entities_match_id_type_and_name() {
        let entity = Entity::with_id(EntityId::new("Probe_7"), "Probe", Location::new(1, 1))
            .named("Scout");
        assert!(entity.matches("Probe_7"));
        assert!(entity.matches("Probe"));
        assert!(entity.matches("Scout"));
        assert!(!entity.matches("Probe_8"));
    }

    #[test]
    fn shadowed_tools_are_logged_and_first_wins() {
        let mut entity = Entity::new("Rig", Location::new(2, 2));
        let chassis = entity.chassis_mut();
        chassis.add_slot("left", ComponentKind::Storage).expect("fresh slot");
        chassis.add_slot("right", ComponentKind::Any).expect("fresh slot");
        chassis
            .install_component("left", Component::new("Gripper", Module::Gripper(Gripper::new())))
            .expect("gripper fits a storage slot");
        chassis
            .install_component("right", Component::new("Gripper", Module::Gripper(Gripper::new())))
            .expect("any slot");

        let names: Vec<&str> = entity.get_available_tools().iter().map(|tool| tool.name).collect();
        assert_eq!(
            names,
            ["pull_component", "install_component", "store_component", "unstore_component"]
        );
        assert_eq!(entity.history().len(), 4);
    }

    #[test]
    fn merged_logs_include_component_history_in_order() {
        let mut entity = Entity::new("Rig", Location::new(2, 2));
        entity.info("powering up");
        entity
            .chassis_mut()
            .add_slot("cargo", ComponentKind::Storage)
            .expect("fresh slot");
        entity
            .chassis_mut()
            .install_component("cargo", Component::new("Storage", Module::Storage(Storage::new(2))))
            .expect("storage slot");
        entity.info("ready");

        let messages: Vec<String> = entity.logs().into_iter().map(|r| r.message).collect();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], "powering up");
        assert!(messages[1].contains("installed in chassis"));
        assert_eq!(messages[2], "ready");
    }
}
