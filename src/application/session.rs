use crate::application::commit::CommitCoordinator;
use crate::application::dashboard::{DashboardSummary, quick_pick, summarize};
use crate::application::override_store::OverrideStore;
use crate::application::view_composer::compose;
use crate::domain::models::{
    Event, Interval, PlannerPolicy, RenderItem, Subscription, Task,
};
use crate::infrastructure::error::CoreError;
use crate::infrastructure::store_client::{
    EventPatch, NewEvent, NewSubscription, NewTask, ResourceStore, SubscriptionPatch, TaskPatch,
};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

pub type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The latest fully-resolved fetch from the store. Composition only ever
/// reads a complete snapshot, never a half-finished one.
#[derive(Debug, Clone, Default)]
struct StoreSnapshot {
    events: Vec<Event>,
    tasks: Vec<Task>,
    subscriptions: Vec<Subscription>,
}

/// One user's dashboard session: the store client, the override store for
/// pinned ghost placements, the commit coordinator, and the latest snapshot.
///
/// All scheduling computation is synchronous over the snapshot; only the
/// store calls are async. Suggestions are re-derived on every
/// [`compose_view`](Self::compose_view) call -- nothing derived is kept
/// across passes, so a refresh after any mutation is always enough to get a
/// consistent view.
pub struct DashboardSession<S>
where
    S: ResourceStore,
{
    store: Arc<S>,
    overrides: Arc<OverrideStore>,
    commit: CommitCoordinator<S>,
    policy: PlannerPolicy,
    snapshot: Mutex<StoreSnapshot>,
    now_provider: NowProvider,
}

impl<S> DashboardSession<S>
where
    S: ResourceStore,
{
    pub fn new(store: Arc<S>, policy: PlannerPolicy) -> Self {
        let overrides = Arc::new(OverrideStore::default());
        Self {
            commit: CommitCoordinator::new(Arc::clone(&store), Arc::clone(&overrides)),
            store,
            overrides,
            policy,
            snapshot: Mutex::new(StoreSnapshot::default()),
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn policy(&self) -> &PlannerPolicy {
        &self.policy
    }

    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    /// Fetches all three collections concurrently and swaps in the joint
    /// result as the new snapshot.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let (events, tasks, subscriptions) = tokio::try_join!(
            self.store.list_events(),
            self.store.list_tasks(),
            self.store.list_subscriptions(),
        )?;

        log::debug!(
            "refreshed snapshot: {} events, {} tasks, {} subscriptions",
            events.len(),
            tasks.len(),
            subscriptions.len()
        );

        let mut snapshot = self.lock_snapshot()?;
        snapshot.events = events;
        snapshot.tasks = tasks;
        snapshot.subscriptions = subscriptions;
        Ok(())
    }

    /// Runs a composition pass over the current snapshot and overrides.
    pub fn compose_view(&self) -> Result<Vec<RenderItem>, CoreError> {
        let now = (self.now_provider)();
        let overrides = self.overrides.snapshot()?;
        let snapshot = self.lock_snapshot()?;
        Ok(compose(
            &snapshot.events,
            &snapshot.tasks,
            &overrides,
            now,
            &self.policy,
        ))
    }

    /// Pins a ghost placement after the user drags or resizes it. Only
    /// suggestions are pinned this way; moving a real event goes through
    /// [`move_event`](Self::move_event) and the store instead.
    pub fn pin_suggestion(&self, task_id: i64, interval: Interval) -> Result<(), CoreError> {
        {
            let snapshot = self.lock_snapshot()?;
            if !snapshot.tasks.iter().any(|task| task.id == task_id) {
                return Err(CoreError::NotFound {
                    resource: "task",
                    id: task_id,
                });
            }
        }
        self.overrides.set(task_id, interval)
    }

    pub fn unpin_suggestion(&self, task_id: i64) -> Result<(), CoreError> {
        self.overrides.clear(task_id)
    }

    /// Persists a calendar drag/resize of a real event. On failure the
    /// snapshot is left untouched so the caller can revert the visual move.
    pub async fn move_event(&self, event_id: i64, interval: Interval) -> Result<Event, CoreError> {
        if interval.end <= interval.start {
            return Err(CoreError::InvalidInput(
                "event end must be after event start".to_string(),
            ));
        }
        let updated = self
            .store
            .patch_event(event_id, &EventPatch::reschedule(interval.start, interval.end))
            .await?;

        let mut snapshot = self.lock_snapshot()?;
        if let Some(existing) = snapshot.events.iter_mut().find(|event| event.id == event_id) {
            *existing = updated.clone();
        }
        Ok(updated)
    }

    /// Promotes a task into a durable event at `slot`, then refreshes.
    pub async fn schedule_task(&self, task_id: i64, slot: Interval) -> Result<Event, CoreError> {
        let task = self.find_task(task_id)?;
        let event = self.commit.schedule(&task, slot).await?;
        self.refresh().await?;
        Ok(event)
    }

    /// Promotes a task at its currently displayed placement: the pinned
    /// override if one exists, otherwise whatever a composition pass would
    /// propose right now.
    pub async fn accept_suggestion(&self, task_id: i64) -> Result<Event, CoreError> {
        let task = self.find_task(task_id)?;
        let slot = match self.overrides.get(task_id)? {
            Some(interval) => interval,
            None => self
                .compose_view()?
                .into_iter()
                .find_map(|item| match item {
                    RenderItem::Suggestion(suggestion) if suggestion.task_id == task_id => {
                        Some(suggestion.interval())
                    }
                    _ => None,
                })
                .ok_or_else(|| {
                    CoreError::InvalidInput(format!(
                        "task {task_id} has no feasible placement to accept"
                    ))
                })?,
        };
        let event = self.commit.schedule(&task, slot).await?;
        self.refresh().await?;
        Ok(event)
    }

    /// Demotes a durable event back into a pending task, then refreshes.
    pub async fn unschedule_event(&self, event_id: i64) -> Result<Task, CoreError> {
        let event = self.find_event(event_id)?;
        let task = self.commit.unschedule(&event).await?;
        self.refresh().await?;
        Ok(task)
    }

    pub async fn create_event(&self, draft: &NewEvent) -> Result<Event, CoreError> {
        if draft.title.trim().is_empty() {
            return Err(CoreError::InvalidInput("event title must not be empty".to_string()));
        }
        if draft.end_at <= draft.start_at {
            return Err(CoreError::InvalidInput(
                "event end must be after event start".to_string(),
            ));
        }
        let created = self.store.create_event(draft).await?;
        self.lock_snapshot()?.events.push(created.clone());
        Ok(created)
    }

    pub async fn update_event(&self, event_id: i64, patch: &EventPatch) -> Result<Event, CoreError> {
        let updated = self.store.patch_event(event_id, patch).await?;
        let mut snapshot = self.lock_snapshot()?;
        if let Some(existing) = snapshot.events.iter_mut().find(|event| event.id == event_id) {
            *existing = updated.clone();
        }
        Ok(updated)
    }

    pub async fn delete_event(&self, event_id: i64) -> Result<(), CoreError> {
        self.store.delete_event(event_id).await?;
        self.lock_snapshot()?.events.retain(|event| event.id != event_id);
        Ok(())
    }

    pub async fn create_task(&self, draft: &NewTask) -> Result<Task, CoreError> {
        if draft.title.trim().is_empty() {
            return Err(CoreError::InvalidInput("task title must not be empty".to_string()));
        }
        if draft.duration == 0 {
            return Err(CoreError::InvalidInput(
                "task duration must be > 0 minutes".to_string(),
            ));
        }
        let created = self.store.create_task(draft).await?;
        self.lock_snapshot()?.tasks.push(created.clone());
        Ok(created)
    }

    /// Edits a task in place. Deliberately leaves any pinned override alone:
    /// changing a task's duration or importance does not unpin its manual
    /// placement.
    pub async fn update_task(&self, task_id: i64, patch: &TaskPatch) -> Result<Task, CoreError> {
        let updated = self.store.patch_task(task_id, patch).await?;
        let mut snapshot = self.lock_snapshot()?;
        if let Some(existing) = snapshot.tasks.iter_mut().find(|task| task.id == task_id) {
            *existing = updated.clone();
        }
        Ok(updated)
    }

    pub async fn delete_task(&self, task_id: i64) -> Result<(), CoreError> {
        self.store.delete_task(task_id).await?;
        self.overrides.clear(task_id)?;
        self.lock_snapshot()?.tasks.retain(|task| task.id != task_id);
        Ok(())
    }

    pub async fn create_subscription(
        &self,
        draft: &NewSubscription,
    ) -> Result<Subscription, CoreError> {
        if draft.name.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "subscription name must not be empty".to_string(),
            ));
        }
        let created = self.store.create_subscription(draft).await?;
        self.lock_snapshot()?.subscriptions.push(created.clone());
        Ok(created)
    }

    pub async fn update_subscription(
        &self,
        subscription_id: i64,
        patch: &SubscriptionPatch,
    ) -> Result<Subscription, CoreError> {
        let updated = self.store.patch_subscription(subscription_id, patch).await?;
        let mut snapshot = self.lock_snapshot()?;
        if let Some(existing) = snapshot
            .subscriptions
            .iter_mut()
            .find(|subscription| subscription.id == subscription_id)
        {
            *existing = updated.clone();
        }
        Ok(updated)
    }

    pub async fn delete_subscription(&self, subscription_id: i64) -> Result<(), CoreError> {
        self.store.delete_subscription(subscription_id).await?;
        self.lock_snapshot()?
            .subscriptions
            .retain(|subscription| subscription.id != subscription_id);
        Ok(())
    }

    pub fn dashboard_summary(&self) -> Result<DashboardSummary, CoreError> {
        let now = (self.now_provider)();
        let snapshot = self.lock_snapshot()?;
        Ok(summarize(
            &snapshot.events,
            &snapshot.tasks,
            &snapshot.subscriptions,
            now,
        ))
    }

    pub fn quick_pick(&self) -> Result<Option<Task>, CoreError> {
        let snapshot = self.lock_snapshot()?;
        Ok(quick_pick(&snapshot.tasks).cloned())
    }

    fn find_task(&self, task_id: i64) -> Result<Task, CoreError> {
        let snapshot = self.lock_snapshot()?;
        snapshot
            .tasks
            .iter()
            .find(|task| task.id == task_id)
            .cloned()
            .ok_or(CoreError::NotFound {
                resource: "task",
                id: task_id,
            })
    }

    fn find_event(&self, event_id: i64) -> Result<Event, CoreError> {
        let snapshot = self.lock_snapshot()?;
        snapshot
            .events
            .iter()
            .find(|event| event.id == event_id)
            .cloned()
            .ok_or(CoreError::NotFound {
                resource: "event",
                id: event_id,
            })
    }

    fn lock_snapshot(&self) -> Result<MutexGuard<'_, StoreSnapshot>, CoreError> {
        self.snapshot
            .lock()
            .map_err(|error| CoreError::InvalidInput(format!("snapshot lock poisoned: {error}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Suggestion;
    use crate::infrastructure::fake_store::FakeResourceStore;

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    // 2026-03-02 is a Monday.
    fn monday_morning() -> DateTime<Utc> {
        fixed_time("2026-03-02T08:00:00Z")
    }

    fn session(store: &Arc<FakeResourceStore>) -> DashboardSession<FakeResourceStore> {
        DashboardSession::new(Arc::clone(store), PlannerPolicy::default())
            .with_now_provider(Arc::new(monday_morning))
    }

    fn ghosts(items: &[RenderItem]) -> Vec<Suggestion> {
        items
            .iter()
            .filter_map(|item| match item {
                RenderItem::Suggestion(suggestion) => Some(suggestion.clone()),
                RenderItem::Event(_) => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn refresh_then_compose_renders_events_and_ghosts() {
        let store = Arc::new(FakeResourceStore::default());
        store.seed_event(
            "Standup",
            2,
            fixed_time("2026-03-02T09:00:00Z"),
            fixed_time("2026-03-02T09:30:00Z"),
        );
        store.seed_task("Write report", 3, 60);
        let session = session(&store);

        session.refresh().await.expect("refresh");
        let items = session.compose_view().expect("compose");

        assert_eq!(items.len(), 2);
        let ghosts = ghosts(&items);
        assert_eq!(ghosts.len(), 1);
        assert!(!ghosts[0].pinned);
    }

    #[tokio::test]
    async fn refresh_surfaces_store_failures() {
        let store = Arc::new(FakeResourceStore::default());
        store.fail_next_list("store offline");
        let session = session(&store);

        assert!(session.refresh().await.is_err());
    }

    #[tokio::test]
    async fn schedule_task_removes_the_ghost_and_the_task() {
        let store = Arc::new(FakeResourceStore::default());
        let task = store.seed_task("Write report", 3, 60);
        let session = session(&store);
        session.refresh().await.expect("refresh");

        let slot = Interval {
            start: fixed_time("2026-03-02T10:00:00Z"),
            end: fixed_time("2026-03-02T11:00:00Z"),
        };
        let event = session.schedule_task(task.id, slot).await.expect("schedule");

        assert_eq!(event.start_at, slot.start);
        let items = session.compose_view().expect("compose");
        assert!(ghosts(&items).is_empty(), "committed task leaves no ghost");
        assert!(
            items
                .iter()
                .any(|item| matches!(item, RenderItem::Event(found) if found.id == event.id)),
            "the new durable event is rendered"
        );
        assert!(store.tasks().is_empty());
    }

    #[tokio::test]
    async fn accept_suggestion_uses_the_computed_placement() {
        let store = Arc::new(FakeResourceStore::default());
        let task = store.seed_task("Write report", 2, 30);
        let session = session(&store);
        session.refresh().await.expect("refresh");

        let expected = ghosts(&session.compose_view().expect("compose"))[0].interval();
        let event = session.accept_suggestion(task.id).await.expect("accept");

        assert_eq!(event.start_at, expected.start);
        assert_eq!(event.end_at, expected.end);
    }

    #[tokio::test]
    async fn accept_suggestion_prefers_the_pinned_override() {
        let store = Arc::new(FakeResourceStore::default());
        let task = store.seed_task("Write report", 2, 30);
        let session = session(&store);
        session.refresh().await.expect("refresh");

        let pinned = Interval {
            start: fixed_time("2026-03-02T19:00:00Z"),
            end: fixed_time("2026-03-02T19:30:00Z"),
        };
        session.pin_suggestion(task.id, pinned).expect("pin");
        let event = session.accept_suggestion(task.id).await.expect("accept");

        assert_eq!(event.start_at, pinned.start);
        assert_eq!(event.end_at, pinned.end);
    }

    #[tokio::test]
    async fn unschedule_event_yields_the_inverse_task() {
        let store = Arc::new(FakeResourceStore::default());
        let event = store.seed_event(
            "Deep work",
            3,
            fixed_time("2026-03-02T09:00:00Z"),
            fixed_time("2026-03-02T10:30:00Z"),
        );
        let session = session(&store);
        session.refresh().await.expect("refresh");

        let task = session.unschedule_event(event.id).await.expect("unschedule");

        assert_eq!(task.duration, 90);
        assert!(store.events().is_empty());
        let items = session.compose_view().expect("compose");
        assert_eq!(ghosts(&items).len(), 1, "the demoted task gets a ghost");
    }

    #[tokio::test]
    async fn pinned_ghost_survives_event_churn_until_unpinned() {
        let store = Arc::new(FakeResourceStore::default());
        let task = store.seed_task("Write report", 2, 60);
        let session = session(&store);
        session.refresh().await.expect("refresh");

        let pinned = Interval {
            start: fixed_time("2026-03-02T15:00:00Z"),
            end: fixed_time("2026-03-02T16:00:00Z"),
        };
        session.pin_suggestion(task.id, pinned).expect("pin");

        store.seed_event(
            "Late addition",
            2,
            fixed_time("2026-03-02T15:00:00Z"),
            fixed_time("2026-03-02T16:00:00Z"),
        );
        session.refresh().await.expect("refresh");

        let items = session.compose_view().expect("compose");
        let pinned_ghosts = ghosts(&items);
        assert_eq!(pinned_ghosts[0].interval(), pinned);
        assert!(pinned_ghosts[0].pinned);

        session.unpin_suggestion(task.id).expect("unpin");
        let items = session.compose_view().expect("compose");
        let recomputed = ghosts(&items);
        assert_ne!(recomputed[0].interval(), pinned, "unpinned ghost is recomputed");
    }

    #[tokio::test]
    async fn pin_suggestion_requires_a_known_task() {
        let store = Arc::new(FakeResourceStore::default());
        let session = session(&store);
        session.refresh().await.expect("refresh");

        let result = session.pin_suggestion(
            404,
            Interval {
                start: fixed_time("2026-03-02T10:00:00Z"),
                end: fixed_time("2026-03-02T10:30:00Z"),
            },
        );
        assert!(matches!(
            result,
            Err(CoreError::NotFound { resource: "task", .. })
        ));
    }

    #[tokio::test]
    async fn move_event_failure_leaves_the_snapshot_unchanged() {
        let store = Arc::new(FakeResourceStore::default());
        let event = store.seed_event(
            "Standup",
            2,
            fixed_time("2026-03-02T09:00:00Z"),
            fixed_time("2026-03-02T09:30:00Z"),
        );
        let session = session(&store);
        session.refresh().await.expect("refresh");

        store.fail_next_patch_event("store offline");
        let result = session
            .move_event(
                event.id,
                Interval {
                    start: fixed_time("2026-03-02T11:00:00Z"),
                    end: fixed_time("2026-03-02T11:30:00Z"),
                },
            )
            .await;
        assert!(result.is_err());

        let items = session.compose_view().expect("compose");
        assert!(
            items.iter().any(|item| matches!(
                item,
                RenderItem::Event(found)
                    if found.id == event.id && found.start_at == event.start_at
            )),
            "the event keeps its old position after a failed move"
        );
    }

    #[tokio::test]
    async fn move_event_success_updates_the_snapshot() {
        let store = Arc::new(FakeResourceStore::default());
        let event = store.seed_event(
            "Standup",
            2,
            fixed_time("2026-03-02T09:00:00Z"),
            fixed_time("2026-03-02T09:30:00Z"),
        );
        let session = session(&store);
        session.refresh().await.expect("refresh");

        let moved = session
            .move_event(
                event.id,
                Interval {
                    start: fixed_time("2026-03-02T11:00:00Z"),
                    end: fixed_time("2026-03-02T11:30:00Z"),
                },
            )
            .await
            .expect("move event");

        assert_eq!(moved.start_at, fixed_time("2026-03-02T11:00:00Z"));
        let items = session.compose_view().expect("compose");
        assert!(items.iter().any(|item| matches!(
            item,
            RenderItem::Event(found) if found.start_at == moved.start_at
        )));
    }

    #[tokio::test]
    async fn delete_task_drops_its_override() {
        let store = Arc::new(FakeResourceStore::default());
        let task = store.seed_task("Write report", 2, 60);
        let session = session(&store);
        session.refresh().await.expect("refresh");

        session
            .pin_suggestion(
                task.id,
                Interval {
                    start: fixed_time("2026-03-02T15:00:00Z"),
                    end: fixed_time("2026-03-02T16:00:00Z"),
                },
            )
            .expect("pin");
        session.delete_task(task.id).await.expect("delete task");

        assert_eq!(session.overrides().get(task.id).expect("lookup"), None);
        assert!(store.tasks().is_empty());
    }

    #[tokio::test]
    async fn update_task_leaves_the_override_pinned() {
        let store = Arc::new(FakeResourceStore::default());
        let task = store.seed_task("Write report", 2, 60);
        let session = session(&store);
        session.refresh().await.expect("refresh");

        let pinned = Interval {
            start: fixed_time("2026-03-02T15:00:00Z"),
            end: fixed_time("2026-03-02T16:00:00Z"),
        };
        session.pin_suggestion(task.id, pinned).expect("pin");

        let patch = TaskPatch {
            duration: Some(15),
            importance: Some(1),
            ..TaskPatch::default()
        };
        session.update_task(task.id, &patch).await.expect("update");

        // The edit shrinks the task, but the manual placement stays as-is.
        assert_eq!(
            session.overrides().get(task.id).expect("lookup"),
            Some(pinned)
        );
    }

    #[tokio::test]
    async fn dashboard_summary_reads_the_snapshot() {
        let store = Arc::new(FakeResourceStore::default());
        store.seed_event(
            "Dinner",
            1,
            fixed_time("2026-03-02T18:00:00Z"),
            fixed_time("2026-03-02T19:00:00Z"),
        );
        store.seed_task("Write report", 3, 60);
        store.seed_subscription("Streaming", 15.0, crate::domain::models::BillingCycle::Monthly);
        let session = session(&store);
        session.refresh().await.expect("refresh");

        let summary = session.dashboard_summary().expect("summary");
        assert_eq!(summary.next_event.map(|event| event.title), Some("Dinner".to_string()));
        assert_eq!(summary.pending_tasks, 1);
        assert_eq!(summary.monthly_subscription_total, 15.0);

        let pick = session.quick_pick().expect("quick pick");
        assert_eq!(pick.map(|task| task.title), Some("Write report".to_string()));
    }

    #[tokio::test]
    async fn create_event_validates_before_calling_the_store() {
        let store = Arc::new(FakeResourceStore::default());
        let session = session(&store);

        let draft = NewEvent {
            title: "  ".to_string(),
            description: String::new(),
            importance: 2,
            start_at: fixed_time("2026-03-02T10:00:00Z"),
            end_at: fixed_time("2026-03-02T11:00:00Z"),
        };
        assert!(session.create_event(&draft).await.is_err());
        assert!(store.events().is_empty());
    }

    #[tokio::test]
    async fn subscription_crud_keeps_the_snapshot_current() {
        let store = Arc::new(FakeResourceStore::default());
        let session = session(&store);
        session.refresh().await.expect("refresh");

        let created = session
            .create_subscription(&NewSubscription {
                name: "Gym".to_string(),
                cost: 10.0,
                payment_date: chrono::NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date"),
                cycle: crate::domain::models::BillingCycle::Weekly,
            })
            .await
            .expect("create subscription");
        assert_eq!(
            session.dashboard_summary().expect("summary").monthly_subscription_total,
            40.0
        );

        session
            .update_subscription(
                created.id,
                &SubscriptionPatch {
                    cost: Some(5.0),
                    ..SubscriptionPatch::default()
                },
            )
            .await
            .expect("update subscription");
        assert_eq!(
            session.dashboard_summary().expect("summary").monthly_subscription_total,
            20.0
        );

        session
            .delete_subscription(created.id)
            .await
            .expect("delete subscription");
        assert_eq!(
            session.dashboard_summary().expect("summary").monthly_subscription_total,
            0.0
        );
    }
}
