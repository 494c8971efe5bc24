use crate::domain::models::PlannerPolicy;
use crate::infrastructure::error::CoreError;
use chrono::NaiveTime;
use chrono_tz::Tz;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use url::Url;

const APP_JSON: &str = "app.json";
const PLANNER_JSON: &str = "planner.json";

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([
        (
            APP_JSON,
            serde_json::json!({
                "schema": 1,
                "appName": "Dayboard",
                "timezone": "UTC",
                "storeBaseUrl": "http://127.0.0.1:8000/"
            }),
        ),
        (
            PLANNER_JSON,
            serde_json::json!({
                "schema": 1,
                "workHours": {
                    "start": "08:00",
                    "end": "22:00"
                },
                "horizonDays": 5,
                "gridMinutes": 15
            }),
        ),
    ])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), CoreError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, CoreError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| CoreError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(CoreError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

/// Loads the placement rules, falling back to the shipped defaults for any
/// field that is missing or malformed.
pub fn load_planner_policy(config_dir: &Path) -> PlannerPolicy {
    let mut policy = PlannerPolicy::default();

    if let Ok(app) = read_config(&config_dir.join(APP_JSON)) {
        if let Some(timezone) = app.get("timezone").and_then(serde_json::Value::as_str) {
            match Tz::from_str(timezone.trim()) {
                Ok(parsed) => policy.timezone = parsed,
                Err(_) => log::warn!("unknown timezone '{timezone}' in {APP_JSON}; keeping UTC"),
            }
        }
    }

    let Ok(planner) = read_config(&config_dir.join(PLANNER_JSON)) else {
        return policy;
    };

    if let Some(work_hours) = planner.get("workHours") {
        if let Some(start) = work_hours.get("start").and_then(serde_json::Value::as_str) {
            if let Ok(parsed) = NaiveTime::parse_from_str(start.trim(), "%H:%M") {
                policy.work_start = parsed;
            }
        }
        if let Some(end) = work_hours.get("end").and_then(serde_json::Value::as_str) {
            if let Ok(parsed) = NaiveTime::parse_from_str(end.trim(), "%H:%M") {
                policy.work_end = parsed;
            }
        }
    }

    if let Some(value) = planner.get("horizonDays").and_then(serde_json::Value::as_i64) {
        if value > 0 {
            policy.horizon_days = value;
        }
    }
    if let Some(value) = planner.get("gridMinutes").and_then(serde_json::Value::as_u64) {
        if (1..=60).contains(&value) {
            policy.grid_minutes = value as u32;
        }
    }

    policy
}

pub fn read_store_base_url(config_dir: &Path) -> Result<Url, CoreError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    let raw = app
        .get("storeBaseUrl")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            CoreError::InvalidConfig(format!("missing storeBaseUrl in {APP_JSON}"))
        })?;
    Url::parse(raw)
        .map_err(|error| CoreError::InvalidConfig(format!("invalid storeBaseUrl '{raw}': {error}")))
}

pub fn read_timezone(config_dir: &Path) -> Result<Option<String>, CoreError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    Ok(app
        .get("timezone")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned))
}
