//! Core of a personal productivity dashboard: durable calendar events and
//! duration-only tasks live in an external HTTP/JSON store; this crate
//! derives a conflict-free ghost placement for every pending task, lets the
//! user pin a placement by hand, and moves work items across the
//! suggestion/durable boundary (schedule and unschedule).

mod application;
mod domain;
mod infrastructure;

pub use application::bootstrap::{BootstrapResult, bootstrap_workspace};
pub use application::commit::CommitCoordinator;
pub use application::dashboard::{
    DashboardSummary, monthly_breakdown, monthly_subscription_total, next_upcoming_event,
    quick_pick, summarize,
};
pub use application::override_store::OverrideStore;
pub use application::session::{DashboardSession, NowProvider};
pub use application::slot_finder::find_slot;
pub use application::view_composer::compose;
pub use domain::models::{
    BillingCycle, Event, IMPORTANCE_HIGH, IMPORTANCE_LOW, Interval, PlannerPolicy, RenderItem,
    Subscription, Suggestion, Task,
};
pub use infrastructure::config::{
    ensure_default_configs, load_planner_policy, read_store_base_url, read_timezone,
};
pub use infrastructure::error::CoreError;
pub use infrastructure::store_client::{
    EventPatch, NewEvent, NewSubscription, NewTask, ReqwestResourceStore, ResourceStore,
    SubscriptionPatch, TaskPatch,
};

/// Minimal health-check hook for embedding shells.
pub fn ping() -> &'static str {
    "pong"
}

#[cfg(test)]
mod tests {
    use super::ping;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }
}
