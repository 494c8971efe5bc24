use crate::domain::models::{Event, Subscription, Task};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;

/// The landing-screen numbers: what is next on the calendar, how much work
/// is pending, and what the tracked subscriptions cost per month.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardSummary {
    pub next_event: Option<Event>,
    pub pending_tasks: usize,
    pub monthly_subscription_total: f64,
}

pub fn summarize(
    events: &[Event],
    tasks: &[Task],
    subscriptions: &[Subscription],
    now: DateTime<Utc>,
) -> DashboardSummary {
    DashboardSummary {
        next_event: next_upcoming_event(events, now).cloned(),
        pending_tasks: tasks.len(),
        monthly_subscription_total: monthly_subscription_total(subscriptions),
    }
}

/// The earliest event that has not started yet. An event already in
/// progress does not count as "next".
pub fn next_upcoming_event(events: &[Event], now: DateTime<Utc>) -> Option<&Event> {
    events
        .iter()
        .filter(|event| event.start_at > now)
        .min_by_key(|event| event.start_at)
}

pub fn monthly_subscription_total(subscriptions: &[Subscription]) -> f64 {
    subscriptions
        .iter()
        .map(Subscription::monthly_cost)
        .sum()
}

/// Per-subscription monthly cost, rounded to cents -- the share breakdown
/// the dashboard visualizes.
pub fn monthly_breakdown(subscriptions: &[Subscription]) -> Vec<(String, f64)> {
    subscriptions
        .iter()
        .map(|subscription| {
            (
                subscription.name.clone(),
                round_to_cents(subscription.monthly_cost()),
            )
        })
        .collect()
}

/// The "free time? do this" pick: highest importance wins, shorter duration
/// breaks ties, earlier list position breaks the rest.
pub fn quick_pick(tasks: &[Task]) -> Option<&Task> {
    tasks
        .iter()
        .min_by_key(|task| (Reverse(task.importance), task.duration))
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
