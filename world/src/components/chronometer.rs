use droidworks_core::{ComponentId, Identity, ParamKind, ToolOutcome, ToolParam, ToolSpec};
use serde::Serialize;

use crate::component::ToolError;

pub(crate) const CHRONOMETER_TOOLS: &[ToolSpec] = &[ToolSpec {
    name: "sleep",
    description: "Sleep for a specified number of ticks.",
    params: &[ToolParam {
        name: "ticks",
        kind: ParamKind::Integer,
        description: "The number of ticks to sleep.",
        required: true,
    }],
}];

/// Lets a droid wait for a number of ticks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Chronometer {
    wake_at: Option<u64>,
}

impl Chronometer {
    /// Idle chronometer.
    #[must_use]
    pub const fn new() -> Self {
        Self { wake_at: None }
    }

    /// Tick at which the current sleep ends.
    #[must_use]
    pub const fn wake_at(&self) -> Option<u64> {
        self.wake_at
    }

    pub(crate) fn sleep(
        &mut self,
        log: &mut Identity<ComponentId>,
        now: u64,
        ticks: i64,
    ) -> Result<ToolOutcome, ToolError> {
        let ticks = u64::try_from(ticks)
            .ok()
            .filter(|ticks| *ticks > 0)
            .ok_or(ToolError::InvalidArgument {
                name: "ticks",
                reason: "must be a positive integer",
            })?;
        let wake_at = now.saturating_add(ticks);
        log.info(format!("Sleeping for {ticks} ticks."));
        log.info(format!("Will wake up at tick {wake_at}."));
        self.wake_at = Some(wake_at);
        Ok(ToolOutcome::pending(format!("Sleeping until tick {wake_at}.")))
    }

    pub(crate) fn poll(&mut self, now: u64) -> ToolOutcome {
        match self.wake_at {
            Some(wake_at) if now < wake_at => {
                ToolOutcome::pending(format!("Sleeping until tick {wake_at}."))
            }
            Some(wake_at) => {
                self.wake_at = None;
                ToolOutcome::success(format!("Woke up from sleep at {wake_at} ticks."))
            }
            None => ToolOutcome::success("Not sleeping."),
        }
    }
}
