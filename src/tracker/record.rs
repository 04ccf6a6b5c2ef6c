//! Account record: the strictly typed form of the remote account document.
//!
//! ## Document shape
//!
//! ```text
//! users/{uid}
//! ├── schemaVersion      u32
//! ├── stats              { level, currentXP, xpToNextLevel, streakDays, cleanDays,
//! │                        isDamaged, habitName, userName, viceId, activeHabits,
//! │                        onboardingCompleted }
//! ├── historyLog         [{ date, type: success|relapse|habit_done, note }]  most recent first
//! ├── lastCheckIn        day string | null
//! ├── dailyHabitsDone    [habit id]
//! └── lastHabitReset     day string | null
//! ```
//!
//! Inbound snapshots go through [`AccountRecord::from_document`], which fills
//! defaults field by field instead of trusting the remote shape. Documents
//! written by the first client (no ritual fields, optional `userName`) load
//! unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::error::Result;
use crate::tracker::rules::{STARTING_THRESHOLD, Variant};
use crate::tracker::{catalog, engine};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub level: u32,
    #[serde(rename = "currentXP")]
    pub current_xp: u32,
    pub xp_to_next_level: u32,
    pub streak_days: u32,
    /// Lifetime successful check-ins; never reset.
    pub clean_days: u32,
    pub is_damaged: bool,
    pub habit_name: String,
    pub user_name: String,
    pub vice_id: Option<String>,
    pub active_habits: BTreeSet<String>,
    pub onboarding_completed: bool,
}

impl Stats {
    pub fn new(habit_name: &str) -> Self {
        Self {
            level: 1,
            current_xp: 0,
            xp_to_next_level: STARTING_THRESHOLD,
            streak_days: 0,
            clean_days: 0,
            is_damaged: false,
            habit_name: habit_name.to_string(),
            user_name: String::new(),
            vice_id: None,
            active_habits: BTreeSet::new(),
            onboarding_completed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Success,
    Relapse,
    HabitDone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub date: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LogEntry {
    pub fn new(date: &str, kind: LogKind, note: impl Into<String>) -> Self {
        Self {
            date: date.to_string(),
            kind,
            note: Some(note.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub stats: Stats,
    pub history_log: Vec<LogEntry>,
    pub last_check_in: Option<String>,
    pub daily_habits_done: BTreeSet<String>,
    pub last_habit_reset: Option<String>,
}

/// Wire form written to the store.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountDocument<'a> {
    schema_version: u32,
    #[serde(flatten)]
    record: &'a AccountRecord,
}

impl AccountRecord {
    /// Record created for a first sign-in.
    pub fn new(habit_name: &str) -> Self {
        Self {
            stats: Stats::new(habit_name),
            history_log: Vec::new(),
            last_check_in: None,
            daily_habits_done: BTreeSet::new(),
            last_habit_reset: None,
        }
    }

    /// Build a record from a loosely typed snapshot. Returns `None` when the
    /// snapshot is not an object, which callers treat as a new user.
    pub fn from_document(value: &Value, default_habit_name: &str) -> Option<Self> {
        let doc = value.as_object()?;
        let empty = Map::new();
        let raw = doc.get("stats").and_then(Value::as_object).unwrap_or(&empty);

        let mut stats = Stats::new(default_habit_name);
        if let Some(level) = u32_field(raw, "level") {
            stats.level = level.max(1);
        }
        if let Some(xp) = u32_field(raw, "currentXP") {
            stats.current_xp = xp;
        }
        if let Some(threshold) = u32_field(raw, "xpToNextLevel").filter(|t| *t >= 2) {
            stats.xp_to_next_level = threshold;
        }
        stats.streak_days = u32_field(raw, "streakDays").unwrap_or(0);
        stats.clean_days = u32_field(raw, "cleanDays").unwrap_or(0);
        stats.is_damaged = bool_field(raw, "isDamaged");
        if let Some(name) = string_field(raw, "habitName").filter(|s| !s.trim().is_empty()) {
            stats.habit_name = name;
        }
        stats.user_name = string_field(raw, "userName").unwrap_or_default();
        stats.vice_id = string_field(raw, "viceId").filter(|id| catalog::vice(id).is_some());
        stats.active_habits = habit_ids(raw, "activeHabits");
        stats.onboarding_completed = bool_field(raw, "onboardingCompleted");
        engine::normalize_xp(&mut stats);

        let history_log = doc
            .get("historyLog")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| serde_json::from_value::<LogEntry>(e.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            stats,
            history_log,
            last_check_in: string_field(doc, "lastCheckIn").filter(|s| !s.is_empty()),
            daily_habits_done: habit_ids(doc, "dailyHabitsDone"),
            last_habit_reset: string_field(doc, "lastHabitReset").filter(|s| !s.is_empty()),
        })
    }

    /// Serialize to the JSON document written with a merge-write.
    pub fn to_document(&self) -> Result<Value> {
        Ok(serde_json::to_value(AccountDocument {
            schema_version: SCHEMA_VERSION,
            record: self,
        })?)
    }

    pub fn checked_in_today(&self, today: &str) -> bool {
        self.last_check_in.as_deref() == Some(today)
    }

    /// Empty today's done-set when the stored reset day is not `today`.
    /// Returns true when a reset happened.
    pub fn roll_daily_habits(&mut self, today: &str) -> bool {
        if self.last_habit_reset.as_deref() == Some(today) {
            return false;
        }
        self.daily_habits_done.clear();
        self.last_habit_reset = Some(today.to_string());
        true
    }

    /// Whether the dashboard may be shown instead of onboarding.
    pub fn is_onboarded(&self, variant: Variant) -> bool {
        match variant {
            Variant::Classic => !self.stats.user_name.trim().is_empty(),
            Variant::Ritual => self.stats.onboarding_completed,
        }
    }
}

fn u32_field(obj: &Map<String, Value>, key: &str) -> Option<u32> {
    let v = obj.get(key)?;
    if let Some(n) = v.as_u64() {
        return Some(n.min(u32::MAX as u64) as u32);
    }
    // Negative numbers (and NaN) fall through to the default.
    v.as_f64()
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| f.floor().min(u32::MAX as f64) as u32)
}

fn bool_field(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn habit_ids(obj: &Map<String, Value>, key: &str) -> BTreeSet<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .filter(|id| catalog::habit(id).is_some())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
