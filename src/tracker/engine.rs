//! Progression engine: pure transitions over an [`AccountRecord`].
//!
//! Every function takes the current record by reference and returns the next
//! one; nothing here touches the session or the store. The engine is total:
//! the only precondition (at most one check-in per day) is enforced by the
//! caller through [`can_check_in`].

use crate::tracker::phases;
use crate::tracker::record::{AccountRecord, LogEntry, LogKind, Stats};
use crate::tracker::rules::{RewardRules, STARTING_THRESHOLD};
use crate::tracker::catalog;

pub const RELAPSE_NOTE: &str = "Ajuste de rota.";

/// `floor(threshold * 1.5)` in integer arithmetic.
pub fn next_threshold(threshold: u32) -> u32 {
    (threshold as u64 * 3 / 2).min(u32::MAX as u64) as u32
}

/// Roll over XP until `current_xp < xp_to_next_level`. Returns the number of
/// levels gained.
///
/// Thresholds below 2 never grow under `next_threshold`, so they are reset
/// to the starting threshold first.
pub fn normalize_xp(stats: &mut Stats) -> u32 {
    if stats.xp_to_next_level < 2 {
        stats.xp_to_next_level = STARTING_THRESHOLD;
    }
    let mut gained = 0;
    while stats.current_xp >= stats.xp_to_next_level {
        stats.current_xp -= stats.xp_to_next_level;
        stats.level = stats.level.saturating_add(1);
        stats.xp_to_next_level = next_threshold(stats.xp_to_next_level);
        gained += 1;
    }
    gained
}

/// Add XP and normalize. Returns the number of levels gained.
pub fn award_xp(stats: &mut Stats, amount: u32) -> u32 {
    stats.current_xp = stats.current_xp.saturating_add(amount);
    normalize_xp(stats)
}

/// Celebration the view plays after a check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Celebration {
    Ripple,
    Short,
    Long,
}

impl Celebration {
    pub fn duration_ms(self) -> u32 {
        match self {
            Celebration::Ripple => 1000,
            Celebration::Short => 3000,
            Celebration::Long => 8000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Celebration::Ripple => "ripple",
            Celebration::Short => "short",
            Celebration::Long => "long",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reward {
    pub xp: u32,
    /// The streak being fought is still in the war zone.
    pub war_zone: bool,
    /// The new streak lands on a milestone day.
    pub milestone: bool,
}

/// XP the next check-in would award. Also used for the button preview.
pub fn check_in_reward(stats: &Stats, rules: &RewardRules) -> Reward {
    let war_zone = phases::current_phase(stats.streak_days).is_war_zone();
    let milestone = rules.is_milestone(stats.streak_days.saturating_add(1));
    let mut xp = if war_zone { rules.war_zone_xp } else { rules.base_xp };
    if milestone {
        xp += rules.milestone_bonus;
    }
    if stats.is_damaged {
        xp /= 2;
    }
    Reward {
        xp,
        war_zone,
        milestone,
    }
}

pub fn can_check_in(last_check_in: Option<&str>, today: &str) -> bool {
    last_check_in != Some(today)
}

#[derive(Debug, Clone)]
pub struct CheckInOutcome {
    pub record: AccountRecord,
    pub reward: Reward,
    pub levels_gained: u32,
    pub celebration: Celebration,
    pub quote: &'static str,
}

/// Daily win. Callers must check [`can_check_in`] first.
pub fn apply_check_in(record: &AccountRecord, today: &str, rules: &RewardRules) -> CheckInOutcome {
    let before = &record.stats;
    let reward = check_in_reward(before, rules);
    let new_streak = before.streak_days.saturating_add(1);
    let quote = phases::daily_quote(
        new_streak,
        phases::rank_index(before.level),
        before.streak_days == 0,
    );

    let mut next = record.clone();
    next.stats.streak_days = new_streak;
    next.stats.clean_days = before.clean_days.saturating_add(1);
    if before.streak_days >= rules.recovery_threshold {
        next.stats.is_damaged = false;
    }
    let levels_gained = award_xp(&mut next.stats, reward.xp);
    next.history_log
        .insert(0, LogEntry::new(today, LogKind::Success, format!("Dia {new_streak}")));
    next.last_check_in = Some(today.to_string());

    let celebration = if levels_gained > 0 {
        Celebration::Long
    } else if reward.war_zone {
        Celebration::Short
    } else if reward.milestone {
        Celebration::Long
    } else {
        Celebration::Ripple
    };

    CheckInOutcome {
        record: next,
        reward,
        levels_gained,
        celebration,
        quote,
    }
}

/// Relapse zeroes the streak and marks the record damaged. Level, XP and
/// `clean_days` are kept; `last_check_in` is cleared so the day can be won again.
pub fn apply_relapse(record: &AccountRecord, today: &str) -> AccountRecord {
    let mut next = record.clone();
    next.stats.streak_days = 0;
    next.stats.is_damaged = true;
    next.last_check_in = None;
    next.history_log
        .insert(0, LogEntry::new(today, LogKind::Relapse, RELAPSE_NOTE));
    next
}

#[derive(Debug, Clone)]
pub struct HabitToggle {
    pub record: AccountRecord,
    /// State of the habit after the toggle.
    pub done: bool,
    pub xp_awarded: u32,
    pub levels_gained: u32,
}

/// Toggle a ritual habit for `today`. Toggling on awards `habit_xp`;
/// toggling off only removes it from the done-set and keeps the XP.
pub fn apply_habit_toggle(
    record: &AccountRecord,
    habit_id: &str,
    today: &str,
    rules: &RewardRules,
) -> HabitToggle {
    let mut next = record.clone();
    next.roll_daily_habits(today);

    if next.daily_habits_done.remove(habit_id) {
        return HabitToggle {
            record: next,
            done: false,
            xp_awarded: 0,
            levels_gained: 0,
        };
    }

    next.daily_habits_done.insert(habit_id.to_string());
    let levels_gained = award_xp(&mut next.stats, rules.habit_xp);
    let label = catalog::habit(habit_id).map(|h| h.label).unwrap_or(habit_id);
    next.history_log
        .insert(0, LogEntry::new(today, LogKind::HabitDone, label));

    HabitToggle {
        record: next,
        done: true,
        xp_awarded: rules.habit_xp,
        levels_gained,
    }
}
