//! Derived dashboard view model.
//!
//! Computed from the record on every render; nothing here is stored.

use crate::tracker::engine::{self, Reward};
use crate::tracker::phases::{self, Phase};
use crate::tracker::record::AccountRecord;
use crate::tracker::rules::Variant;

pub const DAMAGED_TITLE: &str = "RECUPERAÇÃO";
pub const DAMAGED_MSG: &str = "Cure a ferida.";

/// State of the primary action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInButton {
    /// Already won today.
    Done,
    /// Available, restarting after a relapse.
    Restart(Reward),
    Available(Reward),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub phase: &'static Phase,
    pub title: &'static str,
    pub message: &'static str,
    pub rank: &'static str,
    pub level: u32,
    /// `min(streak, max_days) / max_days`, in `0.0..=1.0`.
    pub phase_progress: f64,
    /// Day being fought: counts today once it has not been won yet.
    pub day_counter: u32,
    pub xp_progress: f64,
    pub next_milestone: Option<u32>,
    pub button: CheckInButton,
}

impl DashboardView {
    pub fn new(record: &AccountRecord, today: &str, variant: Variant) -> Self {
        let stats = &record.stats;
        let phase = phases::current_phase(stats.streak_days);
        let rules = variant.rules();
        let checked_in = record.checked_in_today(today);

        let button = if checked_in {
            CheckInButton::Done
        } else if stats.is_damaged {
            CheckInButton::Restart(engine::check_in_reward(stats, rules))
        } else {
            CheckInButton::Available(engine::check_in_reward(stats, rules))
        };

        let (title, message) = if stats.is_damaged {
            (DAMAGED_TITLE, DAMAGED_MSG)
        } else {
            (phase.title, phase.msg)
        };

        Self {
            phase,
            title,
            message,
            rank: phases::rank(stats.level),
            level: stats.level,
            phase_progress: phase_progress(stats.streak_days, phase),
            day_counter: stats.streak_days.saturating_add(u32::from(!checked_in)),
            xp_progress: fraction(stats.current_xp, stats.xp_to_next_level),
            next_milestone: rules.next_milestone(stats.streak_days),
            button,
        }
    }

    pub fn can_check_in(&self) -> bool {
        !matches!(self.button, CheckInButton::Done)
    }
}

pub fn phase_progress(streak_days: u32, phase: &Phase) -> f64 {
    fraction(streak_days.min(phase.max_days), phase.max_days)
}

fn fraction(n: u32, d: u32) -> f64 {
    if d == 0 {
        return 0.0;
    }
    (n as f64 / d as f64).clamp(0.0, 1.0)
}

/// Percentage for a CSS `width`, rounded down.
pub fn percent(f: f64) -> u32 {
    (f * 100.0).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(streak: u32) -> AccountRecord {
        let mut r = AccountRecord::new("x");
        r.stats.streak_days = streak;
        r
    }

    #[test]
    fn progress_is_capped_per_phase() {
        let v = DashboardView::new(&record(3), "d", Variant::Classic);
        assert_eq!(v.phase.id, "war_zone");
        assert!((v.phase_progress - 3.0 / 7.0).abs() < 1e-9);

        let v = DashboardView::new(&record(8), "d", Variant::Classic);
        assert_eq!(v.phase.id, "mine_field");
        assert!((v.phase_progress - 8.0 / 14.0).abs() < 1e-9);

        let v = DashboardView::new(&record(20_000), "d", Variant::Classic);
        assert_eq!(v.phase.id, "new_normal");
        assert_eq!(v.phase_progress, 1.0);
    }

    #[test]
    fn day_counter_includes_today_until_won() {
        let mut r = record(4);
        assert_eq!(DashboardView::new(&r, "d", Variant::Classic).day_counter, 5);
        r.last_check_in = Some("d".into());
        let v = DashboardView::new(&r, "d", Variant::Classic);
        assert_eq!(v.day_counter, 4);
        assert!(!v.can_check_in());
        assert_eq!(v.button, CheckInButton::Done);
    }

    #[test]
    fn damaged_overrides_phase_texts() {
        let mut r = record(0);
        r.stats.is_damaged = true;
        let v = DashboardView::new(&r, "d", Variant::Classic);
        assert_eq!(v.title, DAMAGED_TITLE);
        assert_eq!(v.message, DAMAGED_MSG);
        match v.button {
            CheckInButton::Restart(reward) => assert_eq!(reward.xp, 37),
            other => panic!("expected restart, got {other:?}"),
        }
    }

    #[test]
    fn preview_matches_variant() {
        let v = DashboardView::new(&record(10), "d", Variant::Ritual);
        assert_eq!(v.button, CheckInButton::Available(Reward { xp: 100, war_zone: false, milestone: false }));
        assert_eq!(v.next_milestone, Some(14));
        assert_eq!(v.rank, "Iniciado");
    }

    #[test]
    fn percent_rounds_down() {
        assert_eq!(percent(3.0 / 7.0), 42);
        assert_eq!(percent(1.0), 100);
    }
}
