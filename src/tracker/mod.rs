//! Habit tracking core: the account record, the progression engine and the
//! session that commits its outputs.

pub mod catalog;
pub mod engine;
pub mod onboarding;
pub mod outbox;
pub mod phases;
pub mod record;
pub mod rules;
pub mod session;
pub mod view;
