//! Session state container.
//!
//! Uses `thread_local!` + `RefCell` like the rest of the worker: the Web Worker
//! keeps the WASM module alive, and every request runs to completion before
//! the next one starts.
//!
//! The account record is only ever replaced wholesale, either by an engine
//! output committed here or by an inbound store snapshot. Each commit updates
//! local state first and then queues a merge-write in the [`Outbox`].
//!
//! Snapshots are last-writer-wins. A snapshot that predates a write still in
//! the outbox replaces the optimistic state, and the next action is computed
//! from that older record. Two quick actions around a slow snapshot can
//! therefore drop one of them; this race is accepted and not guarded.

use serde_json::Value;
use std::cell::RefCell;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::tracker::engine::{self, Celebration, CheckInOutcome, HabitToggle};
use crate::tracker::onboarding::{self, Profile, Wizard};
use crate::tracker::catalog;
use crate::tracker::outbox::Outbox;
use crate::tracker::record::AccountRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub display_name: String,
    pub photo_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Home,
    Habit,
    Rituals,
}

impl Tab {
    pub fn parse(s: &str) -> Option<Tab> {
        match s {
            "home" => Some(Tab::Home),
            "habit" => Some(Tab::Habit),
            "rituals" => Some(Tab::Rituals),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Home => "home",
            Tab::Habit => "habit",
            Tab::Rituals => "rituals",
        }
    }
}

/// View-only state; never persisted.
#[derive(Debug, Default)]
pub struct UiState {
    pub tab: Tab,
    pub relapse_modal_open: bool,
    pub editing_habit_name: bool,
    pub daily_message: Option<&'static str>,
    /// Consumed by the next home render.
    pub celebration: Option<Celebration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Login,
    Onboarding,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Loaded,
    /// Missing or malformed document; a default record was created and queued.
    Created,
    /// Snapshot for an identity other than the signed-in one.
    Ignored,
}

#[derive(Debug, Default)]
pub struct Session {
    /// The identity provider has reported at least once.
    pub auth_resolved: bool,
    pub identity: Option<Identity>,
    pub account: Option<AccountRecord>,
    pub wizard: Option<Wizard>,
    pub ui: UiState,
    pub outbox: Outbox,
}

thread_local! {
    static SESSION: RefCell<Session> = RefCell::new(Session::default());
}

/// Execute a closure with read access to the session.
pub fn with_session<F, R>(f: F) -> R
where
    F: FnOnce(&Session) -> R,
{
    SESSION.with(|s| f(&s.borrow()))
}

/// Execute a closure with mutable access to the session.
pub fn with_session_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Session) -> R,
{
    SESSION.with(|s| f(&mut s.borrow_mut()))
}

pub fn reset_session() {
    SESSION.with(|s| *s.borrow_mut() = Session::default());
}

impl Session {
    /// Apply the identity provider's current signal. `None` means signed out.
    pub fn set_identity(&mut self, identity: Option<Identity>) {
        self.auth_resolved = true;
        match identity {
            None => {
                if self.identity.is_some() {
                    info!("signed out");
                }
                self.identity = None;
                self.account = None;
                self.wizard = None;
                self.ui = UiState::default();
            }
            Some(id) if self.identity.as_ref().is_some_and(|cur| cur.uid == id.uid) => {
                self.identity = Some(id);
            }
            Some(id) => {
                info!(uid = %id.uid, "signed in; waiting for account snapshot");
                self.identity = Some(id);
                self.account = None;
                self.wizard = None;
                self.ui = UiState::default();
            }
        }
    }

    pub fn uid(&self) -> Result<&str> {
        self.identity
            .as_ref()
            .map(|i| i.uid.as_str())
            .ok_or(AppError::NotSignedIn)
    }

    pub fn account(&self) -> Result<&AccountRecord> {
        self.uid()?;
        self.account.as_ref().ok_or(AppError::NotLoaded)
    }

    /// The account, once the dashboard is reachable.
    pub fn dashboard_account(&self, config: &AppConfig) -> Result<&AccountRecord> {
        let record = self.account()?;
        if !record.is_onboarded(config.variant) {
            return Err(AppError::OnboardingIncomplete);
        }
        Ok(record)
    }

    pub fn screen(&self, config: &AppConfig) -> Screen {
        if !self.auth_resolved {
            return Screen::Loading;
        }
        if self.identity.is_none() {
            return Screen::Login;
        }
        match &self.account {
            None => Screen::Loading,
            Some(record) if !record.is_onboarded(config.variant) => Screen::Onboarding,
            Some(_) => Screen::Dashboard,
        }
    }

    /// Inbound subscription delivery. `data` is `None` when the document
    /// does not exist.
    pub fn apply_snapshot(
        &mut self,
        uid: &str,
        data: Option<&Value>,
        config: &AppConfig,
    ) -> Result<SnapshotOutcome> {
        if self.uid()? != uid {
            warn!(snapshot_uid = uid, "ignoring snapshot for another identity");
            return Ok(SnapshotOutcome::Ignored);
        }
        match data.and_then(|v| AccountRecord::from_document(v, &config.default_habit_name)) {
            Some(record) => {
                debug!(
                    level = record.stats.level,
                    streak = record.stats.streak_days,
                    "account snapshot applied"
                );
                self.account = Some(record);
                Ok(SnapshotOutcome::Loaded)
            }
            None => {
                info!(uid, "no usable account document; creating default record");
                self.commit(AccountRecord::new(&config.default_habit_name), config)?;
                Ok(SnapshotOutcome::Created)
            }
        }
    }

    /// Replace the account and queue its merge-write.
    fn commit(&mut self, record: AccountRecord, config: &AppConfig) -> Result<u64> {
        let uid = self.uid()?.to_string();
        let document = record.to_document()?;
        self.account = Some(record);
        Ok(self.outbox.enqueue(&config.collection, &uid, document))
    }

    pub fn check_in(&mut self, today: &str, config: &AppConfig) -> Result<CheckInOutcome> {
        let record = self.dashboard_account(config)?;
        if !engine::can_check_in(record.last_check_in.as_deref(), today) {
            info!(today, "check-in rejected; already won today");
            return Err(AppError::AlreadyCheckedIn);
        }
        let outcome = engine::apply_check_in(record, today, config.variant.rules());
        info!(
            streak = outcome.record.stats.streak_days,
            xp = outcome.reward.xp,
            levels = outcome.levels_gained,
            "check-in"
        );
        self.commit(outcome.record.clone(), config)?;
        self.ui.daily_message = Some(outcome.quote);
        self.ui.celebration = Some(outcome.celebration);
        Ok(outcome)
    }

    pub fn open_relapse_modal(&mut self) -> Result<()> {
        self.account()?;
        self.ui.relapse_modal_open = true;
        Ok(())
    }

    pub fn cancel_relapse(&mut self) {
        self.ui.relapse_modal_open = false;
    }

    /// Second step of the relapse dialog. Requires the dialog to be open.
    pub fn confirm_relapse(&mut self, today: &str, config: &AppConfig) -> Result<()> {
        if !self.ui.relapse_modal_open {
            return Err(AppError::RelapseNotArmed);
        }
        let next = engine::apply_relapse(self.dashboard_account(config)?, today);
        info!(today, "relapse recorded");
        self.commit(next, config)?;
        self.ui.relapse_modal_open = false;
        self.ui.daily_message = None;
        self.ui.celebration = None;
        Ok(())
    }

    /// Reset today's ritual done-set if the stored reset day is stale,
    /// persisting the reset.
    pub fn roll_daily_habits(&mut self, today: &str, config: &AppConfig) -> Result<()> {
        let mut record = self.account()?.clone();
        if record.roll_daily_habits(today) {
            debug!(today, "daily rituals reset");
            self.commit(record, config)?;
        }
        Ok(())
    }

    pub fn toggle_habit(
        &mut self,
        habit_id: &str,
        today: &str,
        config: &AppConfig,
    ) -> Result<HabitToggle> {
        if catalog::habit(habit_id).is_none() {
            return Err(AppError::UnknownHabit(habit_id.to_string()));
        }
        let record = self.dashboard_account(config)?;
        if !record.stats.active_habits.contains(habit_id) {
            return Err(AppError::HabitNotActive(habit_id.to_string()));
        }
        let toggle = engine::apply_habit_toggle(record, habit_id, today, config.variant.rules());
        info!(habit = habit_id, done = toggle.done, xp = toggle.xp_awarded, "ritual toggled");
        self.commit(toggle.record.clone(), config)?;
        Ok(toggle)
    }

    pub fn start_habit_name_edit(&mut self) -> Result<()> {
        self.account()?;
        self.ui.editing_habit_name = true;
        Ok(())
    }

    pub fn cancel_habit_name_edit(&mut self) {
        self.ui.editing_habit_name = false;
    }

    /// Save the habit name. Blank names close the editor without a write.
    /// Returns whether anything was saved.
    pub fn save_habit_name(&mut self, name: &str, config: &AppConfig) -> Result<bool> {
        let mut record = self.account()?.clone();
        self.ui.editing_habit_name = false;
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        record.stats.habit_name = name.to_string();
        self.commit(record, config)?;
        Ok(true)
    }

    /// The onboarding wizard, created on first use.
    pub fn wizard_mut(&mut self, config: &AppConfig) -> &mut Wizard {
        if self.wizard.as_ref().is_some_and(|w| w.variant() != config.variant) {
            self.wizard = None;
        }
        self.wizard.get_or_insert_with(|| Wizard::new(config.variant))
    }

    pub fn complete_onboarding(&mut self, profile: &Profile, config: &AppConfig) -> Result<()> {
        let next = onboarding::apply_profile(self.account()?, profile);
        info!(user = %profile.user_name, "onboarding completed");
        self.commit(next, config)?;
        self.wizard = None;
        Ok(())
    }
}
