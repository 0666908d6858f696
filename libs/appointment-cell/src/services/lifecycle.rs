// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed by the state machine.
    /// Transitions out of a terminal state report AlreadyTerminal; anything
    /// else outside the table is invalid input.
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if current_status.is_terminal() {
            warn!("Transition attempted out of terminal status {}", current_status);
            return Err(AppointmentError::AlreadyTerminal(current_status));
        }

        if !self.valid_transitions(current_status).contains(&new_status) {
            return Err(AppointmentError::InvalidInput(format!(
                "Cannot transition an appointment from {} to {}",
                current_status, new_status
            )));
        }

        Ok(())
    }

    /// All valid next statuses for a given current status.
    pub fn valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Booked => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
