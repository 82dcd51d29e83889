use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Appointment state machine. `pending` may move to `completed` or `cancelled`;
/// both of those are terminal.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if current_status == new_status || self.get_valid_transitions(current_status).contains(&new_status) {
            return Ok(());
        }

        warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
        Err(AppointmentError::InvalidStatusTransition {
            from: current_status,
            to: new_status,
        })
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![AppointmentStatus::Completed, AppointmentStatus::Cancelled],
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => vec![],
        }
    }

    pub fn is_terminal(&self, status: AppointmentStatus) -> bool {
        self.get_valid_transitions(status).is_empty()
    }

    pub fn validate_reschedule(&self, current_status: AppointmentStatus) -> Result<(), AppointmentError> {
        if self.is_terminal(current_status) {
            warn!("Reschedule attempted on {} appointment", current_status);
            return Err(AppointmentError::TerminalReschedule(current_status));
        }
        Ok(())
    }

    /// Completion time after moving to `new_status`: stamped on entering `completed`,
    /// kept while staying there, cleared otherwise.
    pub fn completed_at_for(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
        existing: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match (current_status, new_status) {
            (AppointmentStatus::Completed, AppointmentStatus::Completed) => existing.or(Some(now)),
            (_, AppointmentStatus::Completed) => Some(now),
            _ => None,
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
