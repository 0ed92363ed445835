use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::contract::error::{PersonnelError, PersonnelResult};

/// Rejects a second submission of the same operation while the first is
/// still outstanding.
#[derive(Clone, Default)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<&'static str>>>,
}

impl InFlightGuard {
    pub fn try_acquire(&self, operation: &'static str) -> PersonnelResult<Submission> {
        if !self.active.lock().insert(operation) {
            return Err(PersonnelError::in_flight(operation));
        }
        Ok(Submission {
            active: self.active.clone(),
            operation,
        })
    }
}

/// Held for the duration of one submission; releases on drop.
pub struct Submission {
    active: Arc<Mutex<HashSet<&'static str>>>,
    operation: &'static str,
}

impl Drop for Submission {
    fn drop(&mut self) {
        self.active.lock().remove(self.operation);
    }
}
