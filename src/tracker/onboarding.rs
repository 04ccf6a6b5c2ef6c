//! Onboarding wizard.
//!
//! Classic runs a single name step. Ritual runs
//! Welcome → Vice → Habits → Name. `advance` only moves forward when the
//! current step's selection is present; the last step yields the profile
//! that the session commits to the account record.

use std::collections::BTreeSet;

use crate::error::{AppError, Result};
use crate::tracker::catalog;
use crate::tracker::record::AccountRecord;
use crate::tracker::rules::Variant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Welcome,
    Vice,
    Habits,
    Name,
}

const CLASSIC_STEPS: [Step; 1] = [Step::Name];
const RITUAL_STEPS: [Step; 4] = [Step::Welcome, Step::Vice, Step::Habits, Step::Name];

pub fn steps(variant: Variant) -> &'static [Step] {
    match variant {
        Variant::Classic => &CLASSIC_STEPS,
        Variant::Ritual => &RITUAL_STEPS,
    }
}

/// Everything onboarding collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user_name: String,
    pub vice_id: Option<String>,
    pub active_habits: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved(Step),
    Completed(Profile),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wizard {
    variant: Variant,
    index: usize,
    pub vice_id: Option<String>,
    pub habits: BTreeSet<String>,
    pub name: String,
}

impl Wizard {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            index: 0,
            vice_id: None,
            habits: BTreeSet::new(),
            name: String::new(),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn step(&self) -> Step {
        steps(self.variant)[self.index]
    }

    /// 1-based position and total, for the step indicator.
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, steps(self.variant).len())
    }

    pub fn select_vice(&mut self, id: &str) -> Result<()> {
        if catalog::vice(id).is_none() {
            return Err(AppError::UnknownVice(id.to_string()));
        }
        self.vice_id = Some(id.to_string());
        Ok(())
    }

    /// Returns whether the habit is selected after the toggle.
    pub fn toggle_habit(&mut self, id: &str) -> Result<bool> {
        if catalog::habit(id).is_none() {
            return Err(AppError::UnknownHabit(id.to_string()));
        }
        if self.habits.remove(id) {
            Ok(false)
        } else {
            self.habits.insert(id.to_string());
            Ok(true)
        }
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Message describing what the current step still needs, if anything.
    pub fn missing_requirement(&self) -> Option<&'static str> {
        match self.step() {
            Step::Welcome => None,
            Step::Vice if self.vice_id.is_none() => Some("Choose what you are fighting"),
            Step::Habits if self.habits.is_empty() => Some("Pick at least one ritual"),
            Step::Name if self.name.trim().is_empty() => Some("Tell us what to call you"),
            _ => None,
        }
    }

    pub fn can_continue(&self) -> bool {
        self.missing_requirement().is_none()
    }

    pub fn advance(&mut self) -> Result<Advance> {
        if let Some(msg) = self.missing_requirement() {
            return Err(AppError::StepIncomplete(msg));
        }
        if self.index + 1 < steps(self.variant).len() {
            self.index += 1;
            return Ok(Advance::Moved(self.step()));
        }
        Ok(Advance::Completed(Profile {
            user_name: self.name.trim().to_string(),
            vice_id: self.vice_id.clone(),
            active_habits: self.habits.clone(),
        }))
    }

    pub fn back(&mut self) {
        self.index = self.index.saturating_sub(1);
    }
}

/// Write a completed profile into the record and open the dashboard gate.
pub fn apply_profile(record: &AccountRecord, profile: &Profile) -> AccountRecord {
    let mut next = record.clone();
    next.stats.user_name = profile.user_name.clone();
    if profile.vice_id.is_some() {
        next.stats.vice_id = profile.vice_id.clone();
    }
    if !profile.active_habits.is_empty() {
        next.stats.active_habits = profile.active_habits.clone();
    }
    next.stats.onboarding_completed = true;
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_is_a_single_name_step() {
        let mut w = Wizard::new(Variant::Classic);
        assert_eq!(w.step(), Step::Name);
        assert!(!w.can_continue());
        assert!(matches!(w.advance(), Err(AppError::StepIncomplete(_))));
        w.set_name("   ");
        assert!(!w.can_continue());
        w.set_name("  Ana ");
        match w.advance().unwrap() {
            Advance::Completed(p) => {
                assert_eq!(p.user_name, "Ana");
                assert!(p.vice_id.is_none());
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn ritual_walks_all_steps() {
        let mut w = Wizard::new(Variant::Ritual);
        assert_eq!(w.position(), (1, 4));
        assert_eq!(w.advance().unwrap(), Advance::Moved(Step::Vice));

        assert!(w.advance().is_err());
        w.select_vice("gaming").unwrap();
        assert_eq!(w.advance().unwrap(), Advance::Moved(Step::Habits));

        assert!(w.advance().is_err());
        assert!(w.toggle_habit("reading").unwrap());
        assert!(w.toggle_habit("exercise").unwrap());
        assert!(!w.toggle_habit("exercise").unwrap());
        assert_eq!(w.advance().unwrap(), Advance::Moved(Step::Name));

        w.set_name("Bia");
        let Advance::Completed(profile) = w.advance().unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(profile.vice_id.as_deref(), Some("gaming"));
        assert_eq!(profile.active_habits.len(), 1);
    }

    #[test]
    fn back_never_underflows() {
        let mut w = Wizard::new(Variant::Ritual);
        w.back();
        assert_eq!(w.step(), Step::Welcome);
        w.advance().unwrap();
        w.back();
        assert_eq!(w.step(), Step::Welcome);
    }

    #[test]
    fn unknown_selections_rejected() {
        let mut w = Wizard::new(Variant::Ritual);
        assert!(matches!(w.select_vice("x"), Err(AppError::UnknownVice(_))));
        assert!(matches!(w.toggle_habit("x"), Err(AppError::UnknownHabit(_))));
    }

    #[test]
    fn apply_profile_opens_gate() {
        let record = AccountRecord::new("Protocolo Reboot");
        let profile = Profile {
            user_name: "Caio".into(),
            vice_id: Some("smoking".into()),
            active_habits: BTreeSet::from(["sunlight".to_string()]),
        };
        let next = apply_profile(&record, &profile);
        assert!(next.is_onboarded(Variant::Classic));
        assert!(next.is_onboarded(Variant::Ritual));
        assert_eq!(next.stats.vice_id.as_deref(), Some("smoking"));
        assert_eq!(next.stats.level, record.stats.level);
    }
}
