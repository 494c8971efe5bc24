use crate::application::override_store::OverrideStore;
use crate::domain::models::{Event, Interval, Task};
use crate::infrastructure::error::CoreError;
use crate::infrastructure::store_client::{NewEvent, NewTask, ResourceStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Orchestrates the two transitions that cross the suggestion/durable
/// boundary: promoting a task's placement into a real event, and demoting a
/// real event back into a pending task.
///
/// Each transition is two sequential store calls, not a transaction. The
/// create goes first, so a failure before the delete never loses the work
/// item -- it leaves a duplicate instead, surfaced as
/// [`CoreError::PartialCommit`] for manual reconciliation.
pub struct CommitCoordinator<S>
where
    S: ResourceStore,
{
    store: Arc<S>,
    overrides: Arc<OverrideStore>,
}

impl<S> CommitCoordinator<S>
where
    S: ResourceStore,
{
    pub fn new(store: Arc<S>, overrides: Arc<OverrideStore>) -> Self {
        Self { store, overrides }
    }

    /// Creates a durable event from `task` at `slot`, then deletes the task
    /// and drops its override. The task keeps its title, description, and
    /// importance.
    pub async fn schedule(&self, task: &Task, slot: Interval) -> Result<Event, CoreError> {
        if slot.end <= slot.start {
            return Err(CoreError::InvalidInput(
                "slot end must be after slot start".to_string(),
            ));
        }

        let draft = NewEvent {
            title: task.title.clone(),
            description: task.description.clone(),
            importance: task.importance,
            start_at: slot.start,
            end_at: slot.end,
        };
        let event = self.store.create_event(&draft).await?;

        if let Err(cause) = self.store.delete_task(task.id).await {
            return Err(CoreError::PartialCommit {
                created: "event",
                created_id: event.id,
                orphaned: "task",
                orphaned_id: task.id,
                cause: cause.to_string(),
            });
        }
        self.overrides.clear(task.id)?;

        log::info!(
            "scheduled task {} as event {} ({} - {})",
            task.id,
            event.id,
            slot.start,
            slot.end
        );
        Ok(event)
    }

    /// Creates a pending task from `event` (duration rounded to whole
    /// minutes, at least one), then deletes the event.
    pub async fn unschedule(&self, event: &Event) -> Result<Task, CoreError> {
        let duration = duration_minutes(event.start_at, event.end_at);
        let draft = NewTask {
            title: event.title.clone(),
            description: event.description.clone(),
            importance: event.importance,
            duration,
        };
        let task = self.store.create_task(&draft).await?;

        if let Err(cause) = self.store.delete_event(event.id).await {
            return Err(CoreError::PartialCommit {
                created: "task",
                created_id: task.id,
                orphaned: "event",
                orphaned_id: event.id,
                cause: cause.to_string(),
            });
        }

        log::info!(
            "unscheduled event {} into task {} ({duration} min)",
            event.id,
            task.id
        );
        Ok(task)
    }
}

fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let milliseconds = (end - start).num_milliseconds();
    let minutes = ((milliseconds as f64) / 60_000.0).round() as i64;
    minutes.max(1) as u32
}
