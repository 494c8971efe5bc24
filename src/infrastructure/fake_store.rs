//! In-memory [`ResourceStore`] used by commit and session tests: seeded
//! state behind mutexes, store-assigned ids, and one-shot injectable
//! failures per operation.

use crate::domain::models::{BillingCycle, Event, Subscription, Task};
use crate::infrastructure::error::CoreError;
use crate::infrastructure::store_client::{
    EventPatch, NewEvent, NewSubscription, NewTask, ResourceStore, SubscriptionPatch, TaskPatch,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug, Default)]
pub struct FakeResourceStore {
    events: Mutex<Vec<Event>>,
    tasks: Mutex<Vec<Task>>,
    subscriptions: Mutex<Vec<Subscription>>,
    next_id: AtomicI64,
    fail_create_event: Mutex<Option<String>>,
    fail_patch_event: Mutex<Option<String>>,
    fail_delete_event: Mutex<Option<String>>,
    fail_delete_task: Mutex<Option<String>>,
    fail_list: Mutex<Option<String>>,
}

impl FakeResourceStore {
    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn seed_event(
        &self,
        title: &str,
        importance: u8,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Event {
        let event = Event {
            id: self.allocate_id(),
            title: title.to_string(),
            description: String::new(),
            importance,
            start_at,
            end_at,
        };
        self.events.lock().expect("events lock").push(event.clone());
        event
    }

    pub fn seed_task(&self, title: &str, importance: u8, duration: u32) -> Task {
        let task = Task {
            id: self.allocate_id(),
            title: title.to_string(),
            description: String::new(),
            importance,
            duration,
        };
        self.tasks.lock().expect("tasks lock").push(task.clone());
        task
    }

    pub fn seed_subscription(&self, name: &str, cost: f64, cycle: BillingCycle) -> Subscription {
        let subscription = Subscription {
            id: self.allocate_id(),
            name: name.to_string(),
            cost,
            payment_date: NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date"),
            cycle,
        };
        self.subscriptions
            .lock()
            .expect("subscriptions lock")
            .push(subscription.clone());
        subscription
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("events lock").clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.lock().expect("tasks lock").clone()
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions.lock().expect("subscriptions lock").clone()
    }

    pub fn fail_next_create_event(&self, message: &str) {
        *self.fail_create_event.lock().expect("failure lock") = Some(message.to_string());
    }

    pub fn fail_next_patch_event(&self, message: &str) {
        *self.fail_patch_event.lock().expect("failure lock") = Some(message.to_string());
    }

    pub fn fail_next_delete_event(&self, message: &str) {
        *self.fail_delete_event.lock().expect("failure lock") = Some(message.to_string());
    }

    pub fn fail_next_delete_task(&self, message: &str) {
        *self.fail_delete_task.lock().expect("failure lock") = Some(message.to_string());
    }

    pub fn fail_next_list(&self, message: &str) {
        *self.fail_list.lock().expect("failure lock") = Some(message.to_string());
    }

    fn take_failure(slot: &Mutex<Option<String>>) -> Result<(), CoreError> {
        if let Some(message) = slot.lock().expect("failure lock").take() {
            return Err(CoreError::Store(format!("injected failure: {message}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for FakeResourceStore {
    async fn list_events(&self) -> Result<Vec<Event>, CoreError> {
        Self::take_failure(&self.fail_list)?;
        Ok(self.events())
    }

    async fn create_event(&self, event: &NewEvent) -> Result<Event, CoreError> {
        Self::take_failure(&self.fail_create_event)?;
        let created = Event {
            id: self.allocate_id(),
            title: event.title.clone(),
            description: event.description.clone(),
            importance: event.importance,
            start_at: event.start_at,
            end_at: event.end_at,
        };
        self.events.lock().expect("events lock").push(created.clone());
        Ok(created)
    }

    async fn patch_event(&self, event_id: i64, patch: &EventPatch) -> Result<Event, CoreError> {
        Self::take_failure(&self.fail_patch_event)?;
        let mut events = self.events.lock().expect("events lock");
        let event = events
            .iter_mut()
            .find(|event| event.id == event_id)
            .ok_or(CoreError::NotFound {
                resource: "event",
                id: event_id,
            })?;
        if let Some(title) = &patch.title {
            event.title = title.clone();
        }
        if let Some(description) = &patch.description {
            event.description = description.clone();
        }
        if let Some(importance) = patch.importance {
            event.importance = importance;
        }
        if let Some(start_at) = patch.start_at {
            event.start_at = start_at;
        }
        if let Some(end_at) = patch.end_at {
            event.end_at = end_at;
        }
        Ok(event.clone())
    }

    async fn delete_event(&self, event_id: i64) -> Result<(), CoreError> {
        Self::take_failure(&self.fail_delete_event)?;
        let mut events = self.events.lock().expect("events lock");
        let before = events.len();
        events.retain(|event| event.id != event_id);
        if events.len() == before {
            return Err(CoreError::NotFound {
                resource: "event",
                id: event_id,
            });
        }
        Ok(())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, CoreError> {
        Self::take_failure(&self.fail_list)?;
        Ok(self.tasks())
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, CoreError> {
        let created = Task {
            id: self.allocate_id(),
            title: task.title.clone(),
            description: task.description.clone(),
            importance: task.importance,
            duration: task.duration,
        };
        self.tasks.lock().expect("tasks lock").push(created.clone());
        Ok(created)
    }

    async fn patch_task(&self, task_id: i64, patch: &TaskPatch) -> Result<Task, CoreError> {
        let mut tasks = self.tasks.lock().expect("tasks lock");
        let task = tasks
            .iter_mut()
            .find(|task| task.id == task_id)
            .ok_or(CoreError::NotFound {
                resource: "task",
                id: task_id,
            })?;
        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(description) = &patch.description {
            task.description = description.clone();
        }
        if let Some(importance) = patch.importance {
            task.importance = importance;
        }
        if let Some(duration) = patch.duration {
            task.duration = duration;
        }
        Ok(task.clone())
    }

    async fn delete_task(&self, task_id: i64) -> Result<(), CoreError> {
        Self::take_failure(&self.fail_delete_task)?;
        let mut tasks = self.tasks.lock().expect("tasks lock");
        let before = tasks.len();
        tasks.retain(|task| task.id != task_id);
        if tasks.len() == before {
            return Err(CoreError::NotFound {
                resource: "task",
                id: task_id,
            });
        }
        Ok(())
    }

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, CoreError> {
        Self::take_failure(&self.fail_list)?;
        Ok(self.subscriptions())
    }

    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> Result<Subscription, CoreError> {
        let created = Subscription {
            id: self.allocate_id(),
            name: subscription.name.clone(),
            cost: subscription.cost,
            payment_date: subscription.payment_date,
            cycle: subscription.cycle,
        };
        self.subscriptions
            .lock()
            .expect("subscriptions lock")
            .push(created.clone());
        Ok(created)
    }

    async fn patch_subscription(
        &self,
        subscription_id: i64,
        patch: &SubscriptionPatch,
    ) -> Result<Subscription, CoreError> {
        let mut subscriptions = self.subscriptions.lock().expect("subscriptions lock");
        let subscription = subscriptions
            .iter_mut()
            .find(|subscription| subscription.id == subscription_id)
            .ok_or(CoreError::NotFound {
                resource: "subscription",
                id: subscription_id,
            })?;
        if let Some(name) = &patch.name {
            subscription.name = name.clone();
        }
        if let Some(cost) = patch.cost {
            subscription.cost = cost;
        }
        if let Some(payment_date) = patch.payment_date {
            subscription.payment_date = payment_date;
        }
        if let Some(cycle) = patch.cycle {
            subscription.cycle = cycle;
        }
        Ok(subscription.clone())
    }

    async fn delete_subscription(&self, subscription_id: i64) -> Result<(), CoreError> {
        let mut subscriptions = self.subscriptions.lock().expect("subscriptions lock");
        let before = subscriptions.len();
        subscriptions.retain(|subscription| subscription.id != subscription_id);
        if subscriptions.len() == before {
            return Err(CoreError::NotFound {
                resource: "subscription",
                id: subscription_id,
            });
        }
        Ok(())
    }
}
