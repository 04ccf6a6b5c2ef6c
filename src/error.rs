//! Error type shared by the session, store bridge and route handlers.
//!
//! The progression engine never fails; everything here comes from requests
//! that violate a guard (already checked in, incomplete onboarding step) or
//! from malformed input arriving over the bridge.

use crate::routes::util::escape_html;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing {0} parameter")]
    MissingParam(&'static str),

    #[error("Invalid {name} parameter: {value}")]
    InvalidParam { name: &'static str, value: String },

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Account is still loading")]
    NotLoaded,

    #[error("Onboarding is not complete")]
    OnboardingIncomplete,

    #[error("Already checked in today")]
    AlreadyCheckedIn,

    #[error("Relapse must be confirmed from the dialog")]
    RelapseNotArmed,

    #[error("Unknown habit: {0}")]
    UnknownHabit(String),

    #[error("Habit is not part of your ritual: {0}")]
    HabitNotActive(String),

    #[error("Rituals are not enabled")]
    RitualsDisabled,

    #[error("Unknown vice: {0}")]
    UnknownVice(String),

    #[error("{0}")]
    StepIncomplete(&'static str),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Unknown write id: {0}")]
    UnknownWrite(u64),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Render as an inline HTMX error fragment.
    pub fn to_html(&self) -> String {
        format!(
            r#"<span class="text-red-400 text-sm">{}</span>"#,
            escape_html(&self.to_string())
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_param_message() {
        let err = AppError::MissingParam("today");
        assert_eq!(err.to_string(), "Missing today parameter");
    }

    #[test]
    fn html_fragment_escapes_user_input() {
        let err = AppError::UnknownHabit("<script>".into());
        let html = err.to_html();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
