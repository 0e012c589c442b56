use std::{fmt, iter};

use droidworks_core::{
    BlockReason, ComponentId, EntityId, Identity, IntentRejection, Location, LogRecord,
    MovementIntent, ToolCall, ToolOutcome, ToolSpec,
};
use serde::{ser::SerializeStruct, Serialize, Serializer};
use thiserror::Error;

use crate::{
    components::{
        Chronometer, CondenserUnit, Gripper, Motivator, PowerConverter, PowerGenerator,
        PowerPack, Storage, TowCable, TransferMode, WaterTank, CHRONOMETER_TOOLS, GRIPPER_TOOLS,
        MOTIVATOR_TOOLS, TOW_CABLE_TOOLS,
    },
    context::Context,
    entity::Entity,
};

/// Closed set of capability kinds a slot can accept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    /// Root of every lineage; a slot accepting it takes any component.
    Any,
    /// Energy store.
    PowerPack,
    /// Movement driver.
    Motivator,
    /// Periodic recharger.
    PowerGenerator,
    /// Charge transfer between entities.
    PowerConverter,
    /// Water store.
    WaterTank,
    /// Turns charge into water.
    CondenserUnit,
    /// Inventory of uninstalled components.
    Storage,
    /// Single-place manipulator; a kind of storage.
    Gripper,
    /// Towing link to another chassis.
    TowCable,
    /// Timekeeping.
    Chronometer,
}

impl ComponentKind {
    /// Type name used in lookups and slot declarations.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Any => "Component",
            Self::PowerPack => "PowerPack",
            Self::Motivator => "Motivator",
            Self::PowerGenerator => "PowerGenerator",
            Self::PowerConverter => "PowerConverter",
            Self::WaterTank => "WaterTank",
            Self::CondenserUnit => "CondenserUnit",
            Self::Storage => "Storage",
            Self::Gripper => "Gripper",
            Self::TowCable => "TowCable",
            Self::Chronometer => "Chronometer",
        }
    }

    /// Direct ancestor in the capability lineage.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Any => None,
            Self::Gripper => Some(Self::Storage),
            _ => Some(Self::Any),
        }
    }

    /// This kind followed by every ancestor up to [`ComponentKind::Any`].
    pub fn lineage(self) -> impl Iterator<Item = Self> {
        iter::successors(Some(self), |kind| kind.parent())
    }

    /// Reports whether this kind is `ancestor` or descends from it.
    #[must_use]
    pub fn is_a(self, ancestor: Self) -> bool {
        self.lineage().any(|kind| kind == ancestor)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ComponentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// State of an installed capability.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind")]
pub enum Module {
    /// See [`PowerPack`].
    PowerPack(PowerPack),
    /// See [`Motivator`].
    Motivator(Motivator),
    /// See [`PowerGenerator`].
    PowerGenerator(PowerGenerator),
    /// See [`PowerConverter`].
    PowerConverter(PowerConverter),
    /// See [`WaterTank`].
    WaterTank(WaterTank),
    /// See [`CondenserUnit`].
    CondenserUnit(CondenserUnit),
    /// See [`Storage`].
    Storage(Storage),
    /// See [`Gripper`].
    Gripper(Gripper),
    /// See [`TowCable`].
    TowCable(TowCable),
    /// See [`Chronometer`].
    Chronometer(Chronometer),
}

impl Module {
    /// Kind discriminant of the module.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::PowerPack(_) => ComponentKind::PowerPack,
            Self::Motivator(_) => ComponentKind::Motivator,
            Self::PowerGenerator(_) => ComponentKind::PowerGenerator,
            Self::PowerConverter(_) => ComponentKind::PowerConverter,
            Self::WaterTank(_) => ComponentKind::WaterTank,
            Self::CondenserUnit(_) => ComponentKind::CondenserUnit,
            Self::Storage(_) => ComponentKind::Storage,
            Self::Gripper(_) => ComponentKind::Gripper,
            Self::TowCable(_) => ComponentKind::TowCable,
            Self::Chronometer(_) => ComponentKind::Chronometer,
        }
    }

    /// Tools exposed by the module.
    #[must_use]
    pub fn tools(&self) -> &'static [ToolSpec] {
        match self {
            Self::Motivator(_) => MOTIVATOR_TOOLS,
            Self::PowerConverter(converter) => converter.tools(),
            Self::Gripper(_) => GRIPPER_TOOLS,
            Self::TowCable(_) => TOW_CABLE_TOOLS,
            Self::Chronometer(_) => CHRONOMETER_TOOLS,
            _ => &[],
        }
    }
}

/// Typed view into a [`Module`].
pub trait Capability: Sized {
    /// Kind used when looking the capability up on a chassis.
    const KIND: ComponentKind;

    /// Borrows the capability out of a module of a compatible kind.
    fn from_module(module: &Module) -> Option<&Self>;

    /// Mutably borrows the capability out of a module of a compatible kind.
    fn from_module_mut(module: &mut Module) -> Option<&mut Self>;
}

macro_rules! capability {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Capability for $ty {
                const KIND: ComponentKind = ComponentKind::$ty;

                fn from_module(module: &Module) -> Option<&Self> {
                    match module {
                        Module::$ty(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn from_module_mut(module: &mut Module) -> Option<&mut Self> {
                    match module {
                        Module::$ty(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

capability!(
    PowerPack,
    Motivator,
    PowerGenerator,
    PowerConverter,
    WaterTank,
    CondenserUnit,
    Gripper,
    TowCable,
    Chronometer,
);

impl Capability for Storage {
    const KIND: ComponentKind = ComponentKind::Storage;

    fn from_module(module: &Module) -> Option<&Self> {
        match module {
            Module::Storage(storage) => Some(storage),
            Module::Gripper(gripper) => Some(gripper.storage()),
            _ => None,
        }
    }

    fn from_module_mut(module: &mut Module) -> Option<&mut Self> {
        match module {
            Module::Storage(storage) => Some(storage),
            Module::Gripper(gripper) => Some(gripper.storage_mut()),
            _ => None,
        }
    }
}

/// How a component is looked up on a chassis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentQuery<'a> {
    /// First component whose kind is or descends from the given kind.
    Kind(ComponentKind),
    /// Slot id, component id, model name or lineage type name.
    Name(&'a str),
}

impl From<ComponentKind> for ComponentQuery<'_> {
    fn from(kind: ComponentKind) -> Self {
        Self::Kind(kind)
    }
}

impl<'a> From<&'a str> for ComponentQuery<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for ComponentQuery<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a ComponentId> for ComponentQuery<'a> {
    fn from(id: &'a ComponentId) -> Self {
        Self::Name(id.as_str())
    }
}

/// Error raised by a component lifecycle hook. Logged on the component.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HookError {
    /// A sibling capability the hook depends on is not installed.
    #[error("missing capability: {capability}")]
    MissingCapability {
        /// Kind name of the missing capability.
        capability: &'static str,
    },
    /// The hook tried to queue a malformed intent.
    #[error(transparent)]
    Intent(#[from] IntentRejection),
}

/// Error returned when a tool call cannot be dispatched.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ToolError {
    /// No entity with the id is registered.
    #[error("unknown entity `{0}`")]
    UnknownEntity(EntityId),
    /// No installed component exposes the tool.
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    /// An argument is missing or malformed.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Logs `message` as an error on the component and wraps it as a failure.
pub(crate) fn failure(log: &mut Identity<ComponentId>, message: String) -> ToolOutcome {
    log.error(message.clone());
    ToolOutcome::failure(message)
}

fn str_arg<'c>(call: &'c ToolCall, name: &'static str) -> Result<&'c str, ToolError> {
    call.str_arg(name).ok_or(ToolError::InvalidArgument {
        name,
        reason: "expected a string",
    })
}

fn int_arg(call: &ToolCall, name: &'static str) -> Result<i64, ToolError> {
    call.int_arg(name).ok_or(ToolError::InvalidArgument {
        name,
        reason: "expected an integer",
    })
}

fn coordinate(call: &ToolCall, name: &'static str) -> Result<i32, ToolError> {
    i32::try_from(int_arg(call, name)?).map_err(|_| ToolError::InvalidArgument {
        name,
        reason: "coordinate out of range",
    })
}

/// Installable capability: identity, descriptive fields, and module state.
#[derive(Clone, Debug)]
pub struct Component {
    identity: Identity<ComponentId>,
    model: &'static str,
    name: Option<String>,
    description: Option<String>,
    durability: u32,
    chassis: Option<EntityId>,
    action: Option<ToolOutcome>,
    module: Module,
}

impl Component {
    /// Creates a component with an id generated from its model name.
    #[must_use]
    pub fn new(model: &'static str, module: Module) -> Self {
        Self::with_id(ComponentId::generate(model), model, module)
    }

    /// Creates a component with a caller-chosen id.
    #[must_use]
    pub fn with_id(id: ComponentId, model: &'static str, module: Module) -> Self {
        Self {
            identity: Identity::new(id),
            model,
            name: None,
            description: None,
            durability: 100,
            chassis: None,
            action: None,
            module,
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

    /// Unique id.
    #[must_use]
    pub fn id(&self) -> &ComponentId {
        self.identity.id()
    }

    /// Model name.
    #[must_use]
    pub const fn model(&self) -> &'static str {
        self.model
    }

    /// Capability kind.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        self.module.kind()
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

    /// Wear counter.
    #[must_use]
    pub const fn durability(&self) -> u32 {
        self.durability
    }

    /// Chassis the component is installed in.
    #[must_use]
    pub const fn chassis(&self) -> Option<&EntityId> {
        self.chassis.as_ref()
    }

    /// Module state.
    #[must_use]
    pub const fn module(&self) -> &Module {
        &self.module
    }

    /// Typed capability view.
    #[must_use]
    pub fn get<T: Capability>(&self) -> Option<&T> {
        T::from_module(&self.module)
    }

    /// Mutable typed capability view.
    pub fn get_mut<T: Capability>(&mut self) -> Option<&mut T> {
        T::from_module_mut(&mut self.module)
    }

    /// Reports whether `name` is the id, the model, or a lineage type name.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.id().as_str() == name
            || self.model == name
            || self.kind().lineage().any(|kind| kind.name() == name)
    }

    /// Tools exposed by the component.
    #[must_use]
    pub fn tools(&self) -> &'static [ToolSpec] {
        self.module.tools()
    }

    /// Latest outcome of a tool invoked on the component.
    #[must_use]
    pub const fn action(&self) -> Option<&ToolOutcome> {
        self.action.as_ref()
    }

    /// Log history in write order.
    #[must_use]
    pub fn logs(&self) -> &[LogRecord] {
        self.identity.history()
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

    pub(crate) fn set_chassis(&mut self, chassis: Option<EntityId>) {
        self.chassis = chassis;
    }

    pub(crate) fn on_installed(&mut self, owner: &EntityId) {
        self.chassis = Some(owner.clone());
        self.identity.info(format!(
            "Component {} installed in chassis {owner}.",
            self.identity.id()
        ));
    }

    pub(crate) fn tick(&mut self, host: &mut Entity, ctx: &mut Context<'_>) {
        let log = &mut self.identity;
        match &mut self.module {
            Module::PowerGenerator(generator) => generator.tick(host),
            Module::PowerConverter(converter) => converter.tick(log, &mut self.action, host, ctx),
            Module::CondenserUnit(condenser) => condenser.tick(log, host),
            Module::Motivator(motivator) => motivator.tick(log, host, ctx),
            Module::TowCable(cable) => cable.tick(log, host, ctx),
            _ => {}
        }
        self.poll(host, ctx);
    }

    fn poll(&mut self, host: &Entity, ctx: &Context<'_>) {
        if !self.action.as_ref().is_some_and(ToolOutcome::is_pending) {
            return;
        }
        let outcome = match &mut self.module {
            Module::Motivator(motivator) => motivator.poll(host),
            Module::Chronometer(chronometer) => chronometer.poll(ctx.tick()),
            _ => return,
        };
        if !outcome.is_pending() {
            self.identity.info(outcome.message.clone());
        }
        self.action = Some(outcome);
    }

    pub(crate) fn on_move_applied(
        &mut self,
        host: &mut Entity,
        from: Location,
        intent: &MovementIntent,
        ctx: &mut Context<'_>,
    ) -> Result<(), HookError> {
        let to = host.location();
        match &mut self.module {
            Module::Motivator(motivator) => motivator.on_move_applied(host, to, intent),
            Module::TowCable(cable) => {
                cable.on_move_applied(host, from, ctx);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn on_move_blocked(
        &mut self,
        intent: &MovementIntent,
        reason: BlockReason,
        blocker: Option<&EntityId>,
    ) -> Result<(), HookError> {
        if let Module::Motivator(motivator) = &mut self.module {
            motivator.on_move_blocked(&mut self.identity, intent, reason, blocker);
        }
        Ok(())
    }

    /// Detaches the tow cable if it holds `follower`, logging why.
    pub(crate) fn drop_tow(&mut self, follower: &EntityId, reason: BlockReason) -> bool {
        let Module::TowCable(cable) = &mut self.module else {
            return false;
        };
        if cable.attached() != Some(follower) {
            return false;
        }
        let _ = cable.detach();
        self.identity.warn(format!(
            "Tow cable detached. `{follower}` could not follow ({}).",
            reason.code()
        ));
        true
    }

    pub(crate) fn invoke(
        &mut self,
        call: &ToolCall,
        host: &mut Entity,
        ctx: &mut Context<'_>,
    ) -> Result<ToolOutcome, ToolError> {
        let log = &mut self.identity;
        let outcome = match (&mut self.module, call.name.as_str()) {
            (Module::Motivator(motivator), "move_to_location") => {
                let destination = Location::new(coordinate(call, "x")?, coordinate(call, "y")?);
                motivator.move_to_location(log, host, ctx, destination)
            }
            (Module::Motivator(motivator), "move_to_entity") => {
                motivator.move_to_entity(log, host, ctx, str_arg(call, "identifier")?)
            }
            (Module::PowerConverter(converter), "recharge_self") => converter.begin(
                log,
                host,
                ctx,
                str_arg(call, "identifier")?,
                TransferMode::Recharge,
            ),
            (Module::PowerConverter(converter), "charge_other") if converter.is_heavy_duty() => {
                converter.begin(
                    log,
                    host,
                    ctx,
                    str_arg(call, "identifier")?,
                    TransferMode::Charge,
                )
            }
            (Module::Gripper(gripper), "pull_component") => gripper.pull_component(
                log,
                host,
                ctx,
                str_arg(call, "target_component")?,
                str_arg(call, "target_entity")?,
            ),
            (Module::Gripper(gripper), "install_component") => {
                gripper.install_component(log, host, ctx, str_arg(call, "target_entity")?)
            }
            (Module::Gripper(gripper), "store_component") => {
                gripper.store_component(log, host, ctx, call.str_arg("target_entity"))
            }
            (Module::Gripper(gripper), "unstore_component") => {
                gripper.unstore_component(log, host, str_arg(call, "target_component")?)
            }
            (Module::TowCable(cable), "attach_tow_cable") => {
                cable.attach(log, host, ctx, str_arg(call, "identifier")?)
            }
            (Module::TowCable(cable), "detach_tow_cable") => cable.detach_tool(log),
            (Module::Chronometer(chronometer), "sleep") => {
                chronometer.sleep(log, ctx.tick(), int_arg(call, "ticks")?)?
            }
            _ => return Err(ToolError::UnknownTool(call.name.clone())),
        };
        self.action = Some(outcome.clone());
        Ok(outcome)
    }
}

impl Serialize for Component {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Component", 9)?;
        state.serialize_field("id", self.id())?;
        state.serialize_field("model", self.model)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("durability", &self.durability)?;
        state.serialize_field("chassis", &self.chassis)?;
        state.serialize_field("action", &self.action)?;
        state.serialize_field("state", &self.module)?;
        state.end()
    }
}
