use crate::application::slot_finder::find_slot;
use crate::domain::models::{Event, Interval, PlannerPolicy, RenderItem, Suggestion, Task};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Derives the combined render list: every durable event, followed by a
/// ghost placement per pending task in placement order.
///
/// Tasks are placed highest importance first (ties keep their input order),
/// so an important task blocks time before a less important one can claim
/// it. A pinned override is used verbatim with no collision re-check: the
/// user's placement is authoritative even when the underlying data has since
/// changed. Tasks with no feasible slot are silently omitted for this pass.
///
/// Pure: identical inputs (including `now`) yield identical outputs, and the
/// result is rebuilt from scratch on every call -- nothing here is cached.
pub fn compose(
    events: &[Event],
    tasks: &[Task],
    overrides: &HashMap<i64, Interval>,
    now: DateTime<Utc>,
    policy: &PlannerPolicy,
) -> Vec<RenderItem> {
    let mut busy: Vec<Interval> = events.iter().map(Event::interval).collect();

    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by(|left, right| right.importance.cmp(&left.importance));

    let mut items: Vec<RenderItem> = events.iter().cloned().map(RenderItem::Event).collect();

    for task in ordered {
        let (placement, pinned) = match overrides.get(&task.id) {
            Some(interval) => (Some(*interval), true),
            None => (find_slot(&busy, task.duration, now, policy), false),
        };
        let Some(interval) = placement else {
            continue;
        };

        // Claimed either way, so lower-priority tasks cannot take it too.
        busy.push(interval);
        items.push(RenderItem::Suggestion(Suggestion {
            id: Suggestion::ghost_id(task.id),
            task_id: task.id,
            title: task.title.clone(),
            importance: task.importance,
            start_at: interval.start,
            end_at: interval.end,
            pinned,
        }));
    }

    items
}
