//! Capability modules that can be installed into a chassis.

mod chronometer;
mod motivator;
mod power;
mod storage;
mod tow_cable;
mod water;

pub use chronometer::Chronometer;
pub use motivator::{Motivator, Planner, Stall, SOURCE as MOTIVATOR_SOURCE};
pub use power::{PowerConverter, PowerGenerator, PowerPack, Transfer, TransferMode};
pub use storage::{Gripper, Storage};
pub use tow_cable::{TowCable, CABLE_REACH};
pub use water::{CondenserUnit, WaterTank};

pub(crate) use chronometer::CHRONOMETER_TOOLS;
pub(crate) use motivator::MOTIVATOR_TOOLS;
pub(crate) use storage::GRIPPER_TOOLS;
pub(crate) use tow_cable::TOW_CABLE_TOOLS;
