//! Reboot Hero in-browser WASM client.
//!
//! Exports `handle_request(method, path, query, body)` for the Web Worker
//! bridge to call, and `init(config_json)` to install configuration and
//! logging. Uses `matchit` for URL routing.
//!
//! All account state lives in the worker. The shell reports identity changes
//! and document snapshots through `/api/auth/*` and `/api/store/*`, and
//! collects queued merge-writes from `/api/store/pending`.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod tracker;

/// Install configuration and logging. Returns `"ok"` or `"error: ..."`.
#[wasm_bindgen]
pub fn init(config_json: &str) -> String {
    match config::AppConfig::parse(config_json) {
        Ok(config) => {
            logging::init(&config);
            tracing::info!(variant = ?config.variant, collection = %config.collection, "reboot hero ready");
            config::replace_config(config);
            "ok".to_string()
        }
        Err(e) => format!("error: {e}"),
    }
}

/// Process an HTTP-like request and return an HTML fragment.
///
/// Called from JavaScript (Web Worker) via wasm-bindgen.
///
/// # Arguments
/// * `method`: HTTP method (`GET` or `POST`)
/// * `path`:   URL path (e.g., "/api/dashboard")
/// * `query`:  Query string (e.g., "?today=Tue%20Oct%2014%202026")
/// * `body`:   URL-encoded form body, or JSON for `/api/store/snapshot`.
///   Empty string for GET requests.
///
/// # Returns
/// An HTML fragment for HTMX to swap into the DOM. The store bridge routes
/// return JSON or `ok`/`error: ...` instead.
#[wasm_bindgen]
pub fn handle_request(method: &str, path: &str, query: &str, body: &str) -> String {
    let mut router = matchit::Router::new();

    // App gate and identity
    router.insert("/api/app", "app").ok();
    router.insert("/api/auth/state", "auth_state").ok();
    router.insert("/api/auth/sign_in", "sign_in").ok();
    router.insert("/api/auth/sign_out", "sign_out").ok();
    router.insert("/api/auth/error", "auth_error").ok();

    // Store bridge
    router.insert("/api/store/snapshot", "store_snapshot").ok();
    router.insert("/api/store/pending", "store_pending").ok();
    router.insert("/api/store/ack", "store_ack").ok();
    router.insert("/api/store/status", "store_status").ok();

    // Dashboard
    router.insert("/api/dashboard", "dashboard").ok();
    router.insert("/api/checkin", "checkin").ok();
    router.insert("/api/habit", "habit").ok();
    router.insert("/api/relapse", "relapse").ok();
    router.insert("/api/nav", "nav").ok();
    router.insert("/api/history", "history").ok();
    router.insert("/api/rituals", "rituals").ok();

    router.insert("/api/onboarding", "onboarding").ok();

    match router.at(path) {
        Ok(matched) => match (*matched.value, method) {
            ("app", "GET") => routes::session::handle_app_get(query),
            ("auth_state", "POST") => routes::session::handle_auth_state_post(body),
            ("sign_in", "POST") => routes::session::handle_sign_in_post(body),
            ("sign_out", "POST") => routes::session::handle_sign_out_post(body),
            ("auth_error", "POST") => routes::session::handle_auth_error_post(body),

            ("store_snapshot", "POST") => routes::session::handle_snapshot_post(body),
            ("store_pending", "GET") => routes::session::handle_pending_get(query),
            ("store_ack", "POST") => routes::session::handle_ack_post(body),
            ("store_status", "GET") => routes::session::handle_status_get(query),

            ("dashboard", "GET") => routes::dashboard::handle_dashboard_get(query),
            ("checkin", "POST") => routes::dashboard::handle_checkin_post(body),
            ("habit", "GET") => routes::dashboard::handle_habit_get(query),
            ("habit", "POST") => routes::dashboard::handle_habit_post(body),
            ("relapse", "POST") => routes::dashboard::handle_relapse_post(body),
            ("nav", "POST") => routes::dashboard::handle_nav_post(body),
            ("history", "GET") => routes::dashboard::handle_history_get(query),
            ("rituals", "GET") => routes::rituals::handle_get(query),
            ("rituals", "POST") => routes::rituals::handle_post(body),

            ("onboarding", "GET") => routes::onboarding::handle_get(query),
            ("onboarding", "POST") => routes::onboarding::handle_post(body),

            _ => method_not_allowed(),
        },
        Err(_) => not_found(),
    }
}

fn not_found() -> String {
    r#"<span class="text-red-400">404: route not found</span>"#.to_string()
}

fn method_not_allowed() -> String {
    r#"<span class="text-red-400">405: method not allowed</span>"#.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::session::{reset_session, with_session};

    #[test]
    fn returns_404_for_unknown_route() {
        let html = handle_request("GET", "/api/nonexistent", "", "");
        assert!(html.contains("404"));
    }

    #[test]
    fn returns_405_for_wrong_method() {
        let html = handle_request("POST", "/api/app", "", "");
        assert!(html.contains("405"));
        let html = handle_request("GET", "/api/checkin", "", "");
        assert!(html.contains("405"));
    }

    #[test]
    fn init_accepts_and_rejects_config() {
        assert_eq!(init(""), "ok");
        assert_eq!(init(r#"{"variant":"ritual"}"#), "ok");
        assert_eq!(config::current().variant, tracker::rules::Variant::Ritual);
        assert!(init("{oops").starts_with("error: Invalid config"));
        // A rejected config leaves the previous one in place.
        assert_eq!(config::current().variant, tracker::rules::Variant::Ritual);
        init("");
    }

    #[test]
    fn full_classic_day_through_the_router() {
        reset_session();
        init("");

        let html = handle_request("POST", "/api/auth/state", "", "uid=u1&name=Ana");
        assert!(html.contains("Sincronizando..."));

        let html = handle_request("POST", "/api/store/snapshot", "", r#"{"uid":"u1","exists":false,"today":"d1"}"#);
        assert!(html.contains("Como devemos te chamar?"));
        assert!(html.contains(r#"<input type="hidden" name="today" value="d1">"#));

        let html = handle_request("POST", "/api/onboarding", "", "action=continue&value=Ana&today=d1");
        assert!(html.contains("Olá, Ana"));
        assert!(html.contains("Vencer o Dia"));

        let html = handle_request("POST", "/api/checkin", "", "today=d1");
        assert!(html.contains("Missão Cumprida"));

        let pending = handle_request("GET", "/api/store/pending", "", "");
        let writes: serde_json::Value = serde_json::from_str(&pending).unwrap();
        // Default record and onboarding collapsed into the check-in write.
        assert_eq!(writes.as_array().unwrap().len(), 1);
        assert_eq!(writes[0]["document"]["stats"]["streakDays"], 1);
        assert_eq!(writes[0]["document"]["stats"]["currentXP"], 75);
        let id = writes[0]["id"].to_string();
        assert_eq!(handle_request("POST", "/api/store/ack", "", &format!("id={id}&ok=true")), "ok");
        assert!(handle_request("GET", "/api/store/status", "", "").contains("Sincronizado"));

        // The store echoes the write back.
        let echo = serde_json::json!({"uid": "u1", "exists": true, "data": writes[0]["document"], "today": "d1"});
        let html = handle_request("POST", "/api/store/snapshot", "", &echo.to_string());
        assert!(html.contains("Missão Cumprida"));

        let html = handle_request("POST", "/api/relapse", "", "action=open&today=d1");
        assert!(html.contains("relapse-modal"));
        handle_request("POST", "/api/relapse", "", "action=confirm&today=d1");
        with_session(|s| {
            let stats = &s.account().unwrap().stats;
            assert_eq!(stats.streak_days, 0);
            assert_eq!(stats.clean_days, 1);
            assert!(stats.is_damaged);
        });

        let html = handle_request("GET", "/api/history", "", "");
        assert!(html.contains("Recaída"));
        assert!(html.contains("Dia 1"));

        let html = handle_request("POST", "/api/auth/sign_out", "", "");
        assert!(html.contains("rebootHero.signOut()"));
        assert!(handle_request("GET", "/api/app", "", "").contains("Entrar com Google"));
        reset_session();
    }
}
