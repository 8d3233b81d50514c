//! Door state machine
//!
//! Maps debounced readings to a `DoorState` and emits a `Transition` whenever
//! the mapped state differs from the current one. The first reading after
//! startup only establishes the initial record, so a restart while the door is
//! already open does not look like an opening.

use crate::domain::types::{DoorState, Reading, SensorMode, StateRecord, Transition};
use crate::io::sensor::SensorError;
use chrono::{DateTime, Local};
use tracing::{info, warn};

pub struct DoorStateMachine {
    mode: SensorMode,
    record: Option<StateRecord>,
}

impl DoorStateMachine {
    pub fn new(mode: SensorMode) -> Self {
        Self { mode, record: None }
    }

    pub fn mode(&self) -> SensorMode {
        self.mode
    }

    /// Current record, `None` until the first reading arrives
    pub fn record(&self) -> Option<&StateRecord> {
        self.record.as_ref()
    }

    /// Map a reading to a door state for the configured mode
    pub fn map_reading(&self, reading: Reading) -> Result<DoorState, SensorError> {
        match (self.mode, reading) {
            (SensorMode::Single { open_level }, Reading::Single(level)) => {
                Ok(if level == open_level { DoorState::Open } else { DoorState::Closed })
            }
            (SensorMode::Dual, Reading::Dual { open, closed }) => Ok(match (open, closed) {
                (true, false) => DoorState::Open,
                (false, true) => DoorState::Closed,
                (false, false) => DoorState::PartiallyOpen,
                (true, true) => DoorState::Unknown,
            }),
            (mode, reading) => Err(SensorError::ShapeMismatch {
                mode: mode.as_str(),
                reading: reading.to_string(),
            }),
        }
    }

    /// Feed one reading taken at `now`
    pub fn advance(
        &mut self,
        reading: Reading,
        now: DateTime<Local>,
    ) -> Result<Option<Transition>, SensorError> {
        let state = self.map_reading(reading)?;

        let Some(record) = self.record.as_mut() else {
            info!(door = %state, reading = %reading, "door_initial_state");
            self.record = Some(StateRecord { current_state: state, state_entered_at: now });
            return Ok(None);
        };

        if record.current_state == state {
            return Ok(None);
        }

        let transition = Transition {
            from: record.current_state,
            to: state,
            at: now,
            from_entered_at: record.state_entered_at,
        };
        record.current_state = state;
        record.state_entered_at = now;

        if state == DoorState::Unknown {
            warn!(from = %transition.from, to = %state, reading = %reading, "door_transition");
        } else {
            info!(from = %transition.from, to = %state, reading = %reading, "door_transition");
        }

        Ok(Some(transition))
    }
}
