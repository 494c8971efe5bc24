use crate::domain::models::{Interval, PlannerPolicy};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Finds the first free interval of `duration_minutes` within the policy's
/// working hours and search horizon, scanning forward from `now` on the
/// policy grid. Returns `None` when the horizon holds no feasible slot --
/// an expected outcome, not an error.
///
/// First-fit is deliberate: the intended semantics are "slot me in somewhere
/// free soon", not optimal packing. After a collision the cursor jumps to the
/// blocking interval's end and is not re-aligned to the grid, so only the
/// first proposal of a scan is guaranteed to start on a grid boundary.
pub fn find_slot(
    busy: &[Interval],
    duration_minutes: u32,
    now: DateTime<Utc>,
    policy: &PlannerPolicy,
) -> Option<Interval> {
    if duration_minutes == 0 {
        return None;
    }

    let tz = policy.timezone;
    let horizon_end = now + Duration::days(policy.horizon_days);
    let duration = Duration::minutes(i64::from(duration_minutes));

    let mut cursor = align_to_grid(now.with_timezone(&tz), policy.grid_minutes);

    while cursor.with_timezone(&Utc) < horizon_end {
        let date = cursor.date_naive();
        let window_start = resolve_local(&tz, date, policy.work_start);
        let window_end = resolve_local(&tz, date, policy.work_end);

        if cursor >= window_end {
            cursor = resolve_local(&tz, next_day(date), policy.work_start);
            continue;
        }
        if cursor < window_start {
            cursor = window_start;
        }

        let candidate_end = cursor + duration;
        if candidate_end > window_end {
            cursor = resolve_local(&tz, next_day(date), policy.work_start);
            continue;
        }

        let candidate = Interval {
            start: cursor.with_timezone(&Utc),
            end: candidate_end.with_timezone(&Utc),
        };
        match busy.iter().find(|interval| candidate.overlaps(interval)) {
            Some(blocking) => {
                cursor = blocking.end.with_timezone(&tz);
            }
            None => return Some(candidate),
        }
    }

    None
}

/// Rounds up to the next grid boundary with seconds zeroed; an instant
/// already on the boundary is left unchanged.
fn align_to_grid(at: DateTime<Tz>, grid_minutes: u32) -> DateTime<Tz> {
    let grid = i64::from(grid_minutes.max(1));
    let minute_of_day = i64::from(at.hour()) * 60 + i64::from(at.minute());
    let remainder = minute_of_day % grid;
    let has_subminute = at.second() != 0 || at.nanosecond() != 0;

    let mut aligned = if remainder == 0 && !has_subminute {
        minute_of_day
    } else {
        minute_of_day - remainder + grid
    };

    let mut date = at.date_naive();
    if aligned >= 24 * 60 {
        aligned -= 24 * 60;
        date = next_day(date);
    }
    let time = NaiveTime::from_hms_opt((aligned / 60) as u32, (aligned % 60) as u32, 0)
        .unwrap_or(NaiveTime::MIN);

    resolve_local(&at.timezone(), date, time)
}

/// Resolves a wall-clock time in the planner timezone. Ambiguous local times
/// (DST fall-back) take the earlier reading; nonexistent local times (DST
/// spring-forward gap) fall back to interpreting the wall clock as UTC.
fn resolve_local(tz: &Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(resolved) => resolved,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            log::warn!("local time {naive} does not exist in {tz}; using the UTC reading");
            Utc.from_utc_datetime(&naive).with_timezone(tz)
        }
    }
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}
