use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const IMPORTANCE_LOW: u8 = 1;
pub const IMPORTANCE_HIGH: u8 = 3;

/// A stored, user-confirmed calendar item with a fixed start and end.
/// Owned by the external store; the wire field names are the store's.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub importance: u8,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl Event {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.title, "event.title")?;
        validate_importance(self.importance, "event.importance")?;
        if self.end_at <= self.start_at {
            return Err("event.end_at must be after event.start_at".to_string());
        }
        Ok(())
    }

    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start_at,
            end: self.end_at,
        }
    }
}

/// A stored, duration-only work item. Unscheduled by construction: it has a
/// length in minutes but no position in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub importance: u8,
    pub duration: u32,
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.title, "task.title")?;
        validate_importance(self.importance, "task.importance")?;
        if self.duration == 0 {
            return Err("task.duration must be > 0 minutes".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Daily,
    Weekly,
    Fortnight,
    Monthly,
}

impl BillingCycle {
    /// Billing periods per month, matching the dashboard's estimate:
    /// daily x30, weekly x4, fortnight x2.
    pub fn monthly_factor(self) -> f64 {
        match self {
            Self::Daily => 30.0,
            Self::Weekly => 4.0,
            Self::Fortnight => 2.0,
            Self::Monthly => 1.0,
        }
    }
}

/// A recurring cost tracked on the dashboard (streaming service, rent, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub id: i64,
    pub name: String,
    pub cost: f64,
    pub payment_date: NaiveDate,
    pub cycle: BillingCycle,
}

impl Subscription {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.name, "subscription.name")?;
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err("subscription.cost must be a non-negative number".to_string());
        }
        Ok(())
    }

    pub fn monthly_cost(&self) -> f64 {
        self.cost * self.cycle.monthly_factor()
    }
}

/// A half-open span of time, used as scheduler input. Never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// An ephemeral, derived placement for a task. Recomputed on every
/// composition pass and never written to the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Suggestion {
    pub id: String,
    pub task_id: i64,
    pub title: String,
    pub importance: u8,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    /// True when the placement came from a user-pinned override rather than
    /// the slot finder. Pinned placements may overlap stale data.
    pub pinned: bool,
}

impl Suggestion {
    pub fn ghost_id(task_id: i64) -> String {
        format!("ghost-{task_id}")
    }

    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start_at,
            end: self.end_at,
        }
    }
}

/// One entry of the combined calendar render list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderItem {
    Event(Event),
    Suggestion(Suggestion),
}

/// Placement rules for the slot finder. The defaults are the dashboard's
/// shipped behavior: 08:00-22:00 working hours, a five-day horizon, and a
/// 15-minute grid for proposed start times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerPolicy {
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub horizon_days: i64,
    pub grid_minutes: u32,
    pub timezone: Tz,
}

impl Default for PlannerPolicy {
    fn default() -> Self {
        Self {
            work_start: NaiveTime::from_hms_opt(8, 0, 0).expect("valid fixed time"),
            work_end: NaiveTime::from_hms_opt(22, 0, 0).expect("valid fixed time"),
            horizon_days: 5,
            grid_minutes: 15,
            timezone: chrono_tz::UTC,
        }
    }
}

impl PlannerPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.work_end <= self.work_start {
            return Err("planner.work_end must be after planner.work_start".to_string());
        }
        if self.horizon_days <= 0 {
            return Err("planner.horizon_days must be > 0".to_string());
        }
        if self.grid_minutes == 0 || self.grid_minutes > 60 {
            return Err("planner.grid_minutes must be within 1..=60".to_string());
        }
        Ok(())
    }
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

fn validate_importance(value: u8, field_name: &str) -> Result<(), String> {
    if !(IMPORTANCE_LOW..=IMPORTANCE_HIGH).contains(&value) {
        return Err(format!(
            "{field_name} must be within {IMPORTANCE_LOW}..={IMPORTANCE_HIGH}"
        ));
    }
    Ok(())
}
