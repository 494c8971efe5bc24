use crate::domain::models::Interval;
use crate::infrastructure::error::CoreError;
use std::collections::HashMap;
use std::sync::Mutex;

/// Manually pinned placements, keyed by task id. Written exactly when the
/// user drags or resizes a ghost placement; lives only in process memory for
/// the session and is never sent to the store. A pinned interval is applied
/// verbatim on every composition pass until the task is committed or
/// deleted -- no collision check happens on write.
#[derive(Debug, Default)]
pub struct OverrideStore {
    pinned: Mutex<HashMap<i64, Interval>>,
}

impl OverrideStore {
    pub fn set(&self, task_id: i64, interval: Interval) -> Result<(), CoreError> {
        if interval.end <= interval.start {
            return Err(CoreError::InvalidInput(
                "override end must be after override start".to_string(),
            ));
        }
        let mut pinned = self.lock()?;
        pinned.insert(task_id, interval);
        Ok(())
    }

    pub fn clear(&self, task_id: i64) -> Result<(), CoreError> {
        let mut pinned = self.lock()?;
        pinned.remove(&task_id);
        Ok(())
    }

    pub fn get(&self, task_id: i64) -> Result<Option<Interval>, CoreError> {
        let pinned = self.lock()?;
        Ok(pinned.get(&task_id).copied())
    }

    /// Copy of the full map, taken once per composition pass.
    pub fn snapshot(&self) -> Result<HashMap<i64, Interval>, CoreError> {
        let pinned = self.lock()?;
        Ok(pinned.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<i64, Interval>>, CoreError> {
        self.pinned
            .lock()
            .map_err(|error| CoreError::InvalidInput(format!("override store lock poisoned: {error}")))
    }
}
