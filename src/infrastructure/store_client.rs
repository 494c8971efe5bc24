use crate::domain::models::{BillingCycle, Event, Subscription, Task};
use crate::infrastructure::error::CoreError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

const EVENTS_COLLECTION: &str = "events";
const TASKS_COLLECTION: &str = "tasks";
const SUBSCRIPTIONS_COLLECTION: &str = "subs";

/// Creation payload for an event; the store assigns the id.
#[derive(Debug, Clone, serde::Serialize, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub importance: u8,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// Partial update for an event; absent fields are left untouched by the store.
#[derive(Debug, Clone, Default, serde::Serialize, PartialEq)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
}

impl EventPatch {
    /// Patch that only moves an event in time (calendar drag/resize).
    pub fn reschedule(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Self {
        Self {
            start_at: Some(start_at),
            end_at: Some(end_at),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub importance: u8,
    pub duration: u32,
}

#[derive(Debug, Clone, Default, serde::Serialize, PartialEq, Eq)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, serde::Serialize, PartialEq)]
pub struct NewSubscription {
    pub name: String,
    pub cost: f64,
    pub payment_date: NaiveDate,
    pub cycle: BillingCycle,
}

#[derive(Debug, Clone, Default, serde::Serialize, PartialEq)]
pub struct SubscriptionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<BillingCycle>,
}

/// The generic resource collection the dashboard core talks to: three
/// collections (`/events/`, `/tasks/`, `/subs/`), each with list, create,
/// partial-update, and delete. The store is the single source of truth for
/// all three; nothing here is cached across calls.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn list_events(&self) -> Result<Vec<Event>, CoreError>;
    async fn create_event(&self, event: &NewEvent) -> Result<Event, CoreError>;
    async fn patch_event(&self, event_id: i64, patch: &EventPatch) -> Result<Event, CoreError>;
    async fn delete_event(&self, event_id: i64) -> Result<(), CoreError>;

    async fn list_tasks(&self) -> Result<Vec<Task>, CoreError>;
    async fn create_task(&self, task: &NewTask) -> Result<Task, CoreError>;
    async fn patch_task(&self, task_id: i64, patch: &TaskPatch) -> Result<Task, CoreError>;
    async fn delete_task(&self, task_id: i64) -> Result<(), CoreError>;

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, CoreError>;
    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> Result<Subscription, CoreError>;
    async fn patch_subscription(
        &self,
        subscription_id: i64,
        patch: &SubscriptionPatch,
    ) -> Result<Subscription, CoreError>;
    async fn delete_subscription(&self, subscription_id: i64) -> Result<(), CoreError>;
}

/// HTTP implementation of [`ResourceStore`]. Auth headers, retries, and
/// request cancellation are deliberately absent: authentication belongs to
/// the embedding app, and failed calls are surfaced once, not retried.
#[derive(Debug, Clone)]
pub struct ReqwestResourceStore {
    client: Client,
    base_url: Url,
}

impl ReqwestResourceStore {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    fn collection_endpoint(&self, collection: &str) -> Result<Url, CoreError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| CoreError::Store("store base URL cannot be a base".to_string()))?;
            segments.pop_if_empty();
            segments.push(collection);
            // Trailing slash: the store 301s bare collection paths otherwise.
            segments.push("");
        }
        Ok(url)
    }

    fn item_endpoint(&self, collection: &str, id: i64) -> Result<Url, CoreError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| CoreError::Store("store base URL cannot be a base".to_string()))?;
            segments.pop_if_empty();
            segments.push(collection);
            segments.push(&id.to_string());
            segments.push("");
        }
        Ok(url)
    }

    fn store_http_error(status: reqwest::StatusCode, body: &str, action: &str) -> CoreError {
        log::warn!("store returned http {} while {action}", status.as_u16());
        let message = if body.trim().is_empty() {
            format!("store error while {action}: http {}", status.as_u16())
        } else {
            format!(
                "store error while {action}: http {}; body={body}",
                status.as_u16()
            )
        };
        CoreError::Store(message)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<T, CoreError> {
        let response = request
            .send()
            .await
            .map_err(|error| CoreError::Store(format!("network error while {action}: {error}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            CoreError::Store(format!("failed reading response while {action}: {error}"))
        })?;

        if !status.is_success() {
            return Err(Self::store_http_error(status, &body, action));
        }

        serde_json::from_str(&body).map_err(|error| {
            CoreError::Store(format!("invalid payload while {action}: {error}; body={body}"))
        })
    }

    async fn execute_no_content(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<(), CoreError> {
        let response = request
            .send()
            .await
            .map_err(|error| CoreError::Store(format!("network error while {action}: {error}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            CoreError::Store(format!("failed reading response while {action}: {error}"))
        })?;

        if !status.is_success() {
            return Err(Self::store_http_error(status, &body, action));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for ReqwestResourceStore {
    async fn list_events(&self) -> Result<Vec<Event>, CoreError> {
        let endpoint = self.collection_endpoint(EVENTS_COLLECTION)?;
        self.execute_json(self.client.get(endpoint), "listing events")
            .await
    }

    async fn create_event(&self, event: &NewEvent) -> Result<Event, CoreError> {
        let endpoint = self.collection_endpoint(EVENTS_COLLECTION)?;
        self.execute_json(self.client.post(endpoint).json(event), "creating event")
            .await
    }

    async fn patch_event(&self, event_id: i64, patch: &EventPatch) -> Result<Event, CoreError> {
        let endpoint = self.item_endpoint(EVENTS_COLLECTION, event_id)?;
        self.execute_json(self.client.patch(endpoint).json(patch), "updating event")
            .await
    }

    async fn delete_event(&self, event_id: i64) -> Result<(), CoreError> {
        let endpoint = self.item_endpoint(EVENTS_COLLECTION, event_id)?;
        self.execute_no_content(self.client.delete(endpoint), "deleting event")
            .await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, CoreError> {
        let endpoint = self.collection_endpoint(TASKS_COLLECTION)?;
        self.execute_json(self.client.get(endpoint), "listing tasks")
            .await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, CoreError> {
        let endpoint = self.collection_endpoint(TASKS_COLLECTION)?;
        self.execute_json(self.client.post(endpoint).json(task), "creating task")
            .await
    }

    async fn patch_task(&self, task_id: i64, patch: &TaskPatch) -> Result<Task, CoreError> {
        let endpoint = self.item_endpoint(TASKS_COLLECTION, task_id)?;
        self.execute_json(self.client.patch(endpoint).json(patch), "updating task")
            .await
    }

    async fn delete_task(&self, task_id: i64) -> Result<(), CoreError> {
        let endpoint = self.item_endpoint(TASKS_COLLECTION, task_id)?;
        self.execute_no_content(self.client.delete(endpoint), "deleting task")
            .await
    }

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, CoreError> {
        let endpoint = self.collection_endpoint(SUBSCRIPTIONS_COLLECTION)?;
        self.execute_json(self.client.get(endpoint), "listing subscriptions")
            .await
    }

    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> Result<Subscription, CoreError> {
        let endpoint = self.collection_endpoint(SUBSCRIPTIONS_COLLECTION)?;
        self.execute_json(
            self.client.post(endpoint).json(subscription),
            "creating subscription",
        )
        .await
    }

    async fn patch_subscription(
        &self,
        subscription_id: i64,
        patch: &SubscriptionPatch,
    ) -> Result<Subscription, CoreError> {
        let endpoint = self.item_endpoint(SUBSCRIPTIONS_COLLECTION, subscription_id)?;
        self.execute_json(
            self.client.patch(endpoint).json(patch),
            "updating subscription",
        )
        .await
    }

    async fn delete_subscription(&self, subscription_id: i64) -> Result<(), CoreError> {
        let endpoint = self.item_endpoint(SUBSCRIPTIONS_COLLECTION, subscription_id)?;
        self.execute_no_content(self.client.delete(endpoint), "deleting subscription")
            .await
    }
}
