pub mod dashboard;
pub mod onboarding;
pub mod rituals;
pub mod session;
pub mod util;

use crate::error::Result;

/// Collapse a handler result into the fragment handed back to HTMX.
pub(crate) fn respond(result: Result<String>) -> String {
    result.unwrap_or_else(|e| {
        tracing::debug!(error = %e, "request rejected");
        e.to_html()
    })
}
