//! Per-variant reward rules.
//!
//! `Classic` is the single-habit app (name-only onboarding). `Ritual` adds a
//! vice selection, daily ritual habits and a multi-step onboarding wizard.

use serde::{Deserialize, Serialize};

/// XP needed to go from level 1 to level 2.
pub const STARTING_THRESHOLD: u32 = 150;

/// Streak days that earn a milestone bonus.
pub const MILESTONES: [u32; 7] = [3, 7, 14, 21, 30, 60, 90];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Classic,
    Ritual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardRules {
    /// Check-in reward outside the war zone.
    pub base_xp: u32,
    /// Check-in reward while the current phase is the war zone (replaces `base_xp`).
    pub war_zone_xp: u32,
    /// Added when the new streak lands on a milestone.
    pub milestone_bonus: u32,
    pub milestones: &'static [u32],
    /// `isDamaged` clears when the streak before the check-in is at least this.
    pub recovery_threshold: u32,
    /// Reward for completing one ritual habit.
    pub habit_xp: u32,
}

pub const CLASSIC_RULES: RewardRules = RewardRules {
    base_xp: 50,
    war_zone_xp: 75,
    milestone_bonus: 500,
    milestones: &MILESTONES,
    recovery_threshold: 2,
    habit_xp: 0,
};

pub const RITUAL_RULES: RewardRules = RewardRules {
    base_xp: 100,
    war_zone_xp: 125,
    milestone_bonus: 500,
    milestones: &MILESTONES,
    recovery_threshold: 3,
    habit_xp: 20,
};

impl Variant {
    pub fn rules(self) -> &'static RewardRules {
        match self {
            Variant::Classic => &CLASSIC_RULES,
            Variant::Ritual => &RITUAL_RULES,
        }
    }

    pub fn has_rituals(self) -> bool {
        matches!(self, Variant::Ritual)
    }
}

impl RewardRules {
    pub fn is_milestone(&self, streak: u32) -> bool {
        self.milestones.contains(&streak)
    }

    /// First milestone strictly after `streak`, if any remain.
    pub fn next_milestone(&self, streak: u32) -> Option<u32> {
        self.milestones.iter().copied().find(|&m| m > streak)
    }
}
