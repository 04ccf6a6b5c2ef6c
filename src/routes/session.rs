//! App gate, identity and store bridge routes.
//!
//! The shell's JS bridge talks to the identity provider and the document
//! store; these routes are how it reports back and collects pending writes.

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{self, AppConfig};
use crate::error::{AppError, Result};
use crate::routes::util::{escape_html, get_flag, get_param, parse_form_body, parse_query, require_param};
use crate::routes::{dashboard, onboarding, respond};
use crate::tracker::outbox::{Outbox, SyncStatus};
use crate::tracker::session::{Identity, Screen, Session, with_session, with_session_mut};

// ── Rendering ──────────────────────────────────────────────────────

/// Whichever screen the session is on. `today` is required once the
/// dashboard is reachable; the wizard carries it forward when present.
pub fn render_app(s: &mut Session, config: &AppConfig, today: Option<&str>) -> Result<String> {
    match s.screen(config) {
        Screen::Loading => Ok(render_loading()),
        Screen::Login => Ok(render_login()),
        Screen::Onboarding => Ok(onboarding::render_wizard(
            s.wizard_mut(config),
            today.unwrap_or(""),
            None,
        )),
        Screen::Dashboard => {
            let today = today
                .filter(|t| !t.trim().is_empty())
                .ok_or(AppError::MissingParam("today"))?;
            dashboard::render_dashboard(s, config, today)
        }
    }
}

fn render_loading() -> String {
    r#"<div id="loading" class="min-h-screen flex flex-col items-center justify-center gap-4 text-slate-400">
  <i data-lucide="loader-2" class="w-8 h-8 animate-spin"></i>
  <p class="text-sm tracking-widest uppercase">Sincronizando...</p>
</div>"#
        .to_string()
}

fn render_login() -> String {
    r##"<div id="login" class="min-h-screen flex items-center justify-center p-6">
  <div class="bg-slate-900 rounded-2xl p-8 space-y-6 text-center max-w-sm">
    <i data-lucide="shield" class="mx-auto w-12 h-12 text-emerald-400"></i>
    <h1 class="text-2xl font-black tracking-widest">REBOOT HERO</h1>
    <p class="text-sm text-slate-400">Transforme cada dia limpo em experiência.</p>
    <button hx-post="/api/auth/sign_in" hx-target="#auth-script" class="w-full py-3 rounded-xl bg-emerald-600 font-bold">Entrar com Google</button>
    <div id="auth-script"></div>
  </div>
</div>"##
        .to_string()
}

pub fn render_sync_badge(outbox: &Outbox) -> String {
    match outbox.status() {
        SyncStatus::Synced => {
            r#"<span id="sync-badge" class="text-xs text-emerald-400">Sincronizado</span>"#.to_string()
        }
        SyncStatus::Pending(n) => format!(
            r#"<span id="sync-badge" class="text-xs text-amber-400">Salvando ({n})</span>"#
        ),
        SyncStatus::Failed(err) => format!(
            r#"<span id="sync-badge" class="text-xs text-red-400" title="{}">Erro ao salvar</span>"#,
            escape_html(&err)
        ),
    }
}

// ── GET /api/app ───────────────────────────────────────────────────

pub fn handle_app_get(query: &str) -> String {
    let params = parse_query(query);
    let config = config::current();
    with_session_mut(|s| respond(render_app(s, &config, get_param(&params, "today"))))
}

// ── POST /api/auth/* ───────────────────────────────────────────────

/// Body: `uid`, `name`, `photo`, optional `today`. An empty `uid` means the
/// provider reported no signed-in user.
pub fn handle_auth_state_post(body: &str) -> String {
    let params = parse_form_body(body);
    let config = config::current();
    let uid = get_param(&params, "uid").unwrap_or("").trim();
    let identity = (!uid.is_empty()).then(|| Identity {
        uid: uid.to_string(),
        display_name: get_param(&params, "name").unwrap_or("").to_string(),
        photo_url: get_param(&params, "photo").unwrap_or("").to_string(),
    });
    with_session_mut(|s| {
        s.set_identity(identity);
        respond(render_app(s, &config, get_param(&params, "today")))
    })
}

pub fn handle_sign_in_post(_body: &str) -> String {
    info!("sign-in requested");
    "<script>rebootHero.signIn()</script>".to_string()
}

pub fn handle_sign_out_post(_body: &str) -> String {
    with_session_mut(|s| s.set_identity(None));
    let mut html = render_login();
    html.push_str("<script>rebootHero.signOut()</script>");
    html
}

/// Body: `message`. Sign-in failures are only logged.
pub fn handle_auth_error_post(body: &str) -> String {
    let params = parse_form_body(body);
    let message = get_param(&params, "message").unwrap_or("unknown error");
    warn!(error = message, "sign-in failed");
    render_login()
}

// ── Store bridge ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SnapshotPayload {
    uid: String,
    #[serde(default)]
    exists: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    today: Option<String>,
}

/// Body: JSON `{"uid", "exists", "data", "today"}` from the document
/// subscription. Re-renders the app gate.
pub fn handle_snapshot_post(body: &str) -> String {
    let config = config::current();
    with_session_mut(|s| respond(apply_snapshot(s, &config, body)))
}

fn apply_snapshot(s: &mut Session, config: &AppConfig, body: &str) -> Result<String> {
    let payload: SnapshotPayload =
        serde_json::from_str(body).map_err(|e| AppError::InvalidSnapshot(e.to_string()))?;
    let data = payload.exists.then_some(&payload.data);
    s.apply_snapshot(&payload.uid, data, config)?;
    render_app(s, config, payload.today.as_deref())
}

/// Drain queued merge-writes as a JSON array.
pub fn handle_pending_get(_query: &str) -> String {
    let writes = with_session_mut(|s| s.outbox.drain());
    match serde_json::to_string(&writes) {
        Ok(json) => json,
        Err(e) => format!("error: {e}"),
    }
}

/// Body: `id`, `ok=true|false`, `error`. Returns `ok` or `error: ...`.
pub fn handle_ack_post(body: &str) -> String {
    let params = parse_form_body(body);
    let result = require_param(&params, "id").and_then(|raw| {
        let id = raw.parse::<u64>().map_err(|_| AppError::InvalidParam {
            name: "id",
            value: raw.to_string(),
        })?;
        let outcome = if get_flag(&params, "ok") {
            Ok(())
        } else {
            Err(get_param(&params, "error").unwrap_or("write failed").to_string())
        };
        with_session_mut(|s| s.outbox.acknowledge(id, outcome))
    });
    match result {
        Ok(()) => "ok".to_string(),
        Err(e) => format!("error: {e}"),
    }
}

pub fn handle_status_get(_query: &str) -> String {
    with_session(|s| render_sync_badge(&s.outbox))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::replace_config;
    use crate::tracker::session::reset_session;

    fn sign_in(uid: &str) -> String {
        handle_auth_state_post(&format!("uid={uid}&name=Ana&photo="))
    }

    #[test]
    fn gate_walks_loading_login_onboarding_dashboard() {
        reset_session();
        assert!(handle_app_get("").contains("Sincronizando..."));

        assert!(handle_auth_state_post("uid=").contains("Entrar com Google"));

        assert!(sign_in("u1").contains("Sincronizando..."));

        let html = handle_snapshot_post(r#"{"uid":"u1","exists":false}"#);
        assert!(html.contains("Como devemos te chamar?"));

        let html = handle_snapshot_post(
            r#"{"uid":"u1","exists":true,"data":{"stats":{"userName":"Ana"}},"today":"d1"}"#,
        );
        assert!(html.contains("Olá, Ana"));

        assert!(handle_app_get("").contains("Missing today parameter"));
        reset_session();
    }

    #[test]
    fn new_user_queues_default_document() {
        reset_session();
        sign_in("u1");
        handle_snapshot_post(r#"{"uid":"u1","exists":false}"#);
        let json = handle_pending_get("");
        let writes: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(writes.as_array().unwrap().len(), 1);
        assert_eq!(writes[0]["collection"], "users");
        assert_eq!(writes[0]["key"], "u1");
        assert_eq!(writes[0]["document"]["stats"]["xpToNextLevel"], 150);
        assert_eq!(handle_pending_get(""), "[]");
        reset_session();
    }

    #[test]
    fn ack_round_trip_updates_badge() {
        reset_session();
        sign_in("u1");
        handle_snapshot_post(r#"{"uid":"u1","exists":false}"#);
        assert!(handle_status_get("").contains("Salvando (1)"));
        let writes: Value = serde_json::from_str(&handle_pending_get("")).unwrap();
        let id = writes[0]["id"].as_u64().unwrap();

        let reply = handle_ack_post(&format!("id={id}&ok=false&error=permission-denied"));
        assert_eq!(reply, "ok");
        let badge = handle_status_get("");
        assert!(badge.contains("Erro ao salvar"));
        assert!(badge.contains(r#"title="permission-denied""#));

        assert!(handle_ack_post(&format!("id={id}&ok=true")).starts_with("error: Unknown write id"));
        assert!(handle_ack_post("id=abc&ok=true").starts_with("error: Invalid id"));
        assert!(handle_ack_post("ok=true").starts_with("error: Missing id"));
        reset_session();
    }

    #[test]
    fn malformed_snapshot_is_rejected() {
        reset_session();
        sign_in("u1");
        let html = handle_snapshot_post("{not json");
        assert!(html.contains("Invalid snapshot"));
        reset_session();
    }

    #[test]
    fn non_object_snapshot_is_treated_as_new_user() {
        reset_session();
        sign_in("u1");
        let html = handle_snapshot_post(r#"{"uid":"u1","exists":true,"data":[1,2,3]}"#);
        assert!(html.contains("Como devemos te chamar?"));
        assert_eq!(with_session(|s| s.outbox.pending()), 1);
        reset_session();
    }

    #[test]
    fn snapshot_before_sign_in_is_an_error() {
        reset_session();
        let html = handle_snapshot_post(r#"{"uid":"u1","exists":false}"#);
        assert!(html.contains("Not signed in"));
        reset_session();
    }

    #[test]
    fn sign_in_and_out_delegate_to_shell() {
        reset_session();
        assert_eq!(handle_sign_in_post(""), "<script>rebootHero.signIn()</script>");
        sign_in("u1");
        let html = handle_sign_out_post("");
        assert!(html.contains("rebootHero.signOut()"));
        assert!(with_session(|s| s.identity.is_none()));
        assert!(handle_auth_error_post("message=popup-closed").contains("Entrar com Google"));
        reset_session();
    }

    #[test]
    fn ritual_variant_starts_with_welcome() {
        reset_session();
        replace_config(AppConfig {
            variant: crate::tracker::rules::Variant::Ritual,
            ..AppConfig::default()
        });
        sign_in("u1");
        // A classic user with a name still has to finish the ritual wizard.
        let html = handle_snapshot_post(r#"{"uid":"u1","exists":true,"data":{"stats":{"userName":"Ana"}}}"#);
        assert!(html.contains("Passo 1 de 4"));
        replace_config(AppConfig::default());
        reset_session();
    }
}
