//! `/api/onboarding`: wizard rendering and step actions.

use crate::config::{self, AppConfig};
use crate::error::{AppError, Result};
use crate::routes::respond;
use crate::routes::session::render_app;
use crate::routes::util::{escape_html, get_param, hx_vals, parse_form_body, parse_query, require_param};
use crate::tracker::catalog::{HABITS, VICES};
use crate::tracker::onboarding::{Advance, Profile, Step, Wizard};
use crate::tracker::session::{Session, with_session_mut};

/// `today` rides along on every wizard request so the final step can render
/// the dashboard.
pub fn render_wizard(w: &Wizard, today: &str, error: Option<&AppError>) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str(r#"<div id="onboarding" class="min-h-screen flex flex-col justify-center p-6 space-y-6">"#);

    let (pos, total) = w.position();
    if total > 1 {
        html.push_str(&format!(
            r#"<p class="text-xs uppercase tracking-widest text-slate-500">Passo {pos} de {total}</p>"#
        ));
    }

    match w.step() {
        Step::Welcome => html.push_str(
            r#"<div class="space-y-3"><h1 class="text-3xl font-black">Bem-vindo, Herói</h1><p class="text-slate-400">Vamos montar seu protocolo de reinício: o que você combate, os rituais que vão te sustentar e como devemos te chamar.</p></div>"#,
        ),
        Step::Vice => {
            html.push_str(r#"<h1 class="text-2xl font-black">O que você está combatendo?</h1><div class="grid grid-cols-2 gap-3">"#);
            for vice in &VICES {
                let selected = w.vice_id.as_deref() == Some(vice.id);
                html.push_str(&option_button(("vice", vice.id), today, vice.label, vice.icon, None, selected));
            }
            html.push_str("</div>");
        }
        Step::Habits => {
            html.push_str(r#"<h1 class="text-2xl font-black">Escolha seus rituais diários</h1><div class="grid grid-cols-2 gap-3">"#);
            for habit in &HABITS {
                let selected = w.habits.contains(habit.id);
                html.push_str(&option_button(
                    ("habit", habit.id),
                    today,
                    habit.label,
                    habit.icon,
                    Some(habit.hint),
                    selected,
                ));
            }
            html.push_str("</div>");
        }
        Step::Name => {
            html.push_str(&format!(
                r##"<form hx-post="/api/onboarding" hx-target="#app" class="space-y-4">
  <h1 class="text-2xl font-black">Como devemos te chamar?</h1>
  <input type="hidden" name="action" value="continue">
  <input type="hidden" name="today" value="{}">
  <input name="value" value="{}" required maxlength="40" placeholder="Seu nome de herói" class="w-full bg-slate-800 rounded-xl px-4 py-3">
  <button type="submit" class="w-full py-3 rounded-xl bg-emerald-600 font-bold">Começar</button>
</form>"##,
                escape_html(today),
                escape_html(&w.name)
            ));
        }
    }

    if let Some(err) = error {
        html.push_str(&err.to_html());
    }

    if w.step() != Step::Name {
        let disabled = if w.can_continue() { "" } else { " disabled" };
        html.push_str(&format!(
            r##"<button hx-post="/api/onboarding" hx-vals="{}" hx-target="#app" class="w-full py-3 rounded-xl bg-emerald-600 font-bold disabled:opacity-40"{}>Continuar</button>"##,
            hx_vals(&[("action", "continue"), ("today", today)]),
            disabled
        ));
    }
    if pos > 1 {
        html.push_str(&format!(
            r##"<button hx-post="/api/onboarding" hx-vals="{}" hx-target="#app" class="text-sm text-slate-400">Voltar</button>"##,
            hx_vals(&[("action", "back"), ("today", today)])
        ));
    }
    html.push_str("</div>");
    html
}

fn option_button(
    (action, id): (&str, &str),
    today: &str,
    label: &str,
    icon: &str,
    hint: Option<&str>,
    selected: bool,
) -> String {
    let border = if selected { "border-emerald-500 bg-emerald-900/30" } else { "border-slate-700" };
    let hint = hint
        .map(|h| format!(r#"<span class="block text-xs text-slate-400">{h}</span>"#))
        .unwrap_or_default();
    format!(
        r##"<button hx-post="/api/onboarding" hx-vals="{}" hx-target="#app" aria-pressed="{}" class="p-3 rounded-xl border text-left {}"><i data-lucide="{}"></i><span class="block font-bold">{}</span>{}</button>"##,
        hx_vals(&[("action", action), ("value", id), ("today", today)]),
        selected,
        border,
        icon,
        label,
        hint
    )
}

// ── GET /api/onboarding ────────────────────────────────────────────

pub fn handle_get(query: &str) -> String {
    let params = parse_query(query);
    let config = config::current();
    let today = get_param(&params, "today").unwrap_or("");
    with_session_mut(|s| respond(wizard_view(s, &config, today)))
}

fn wizard_view(s: &mut Session, config: &AppConfig, today: &str) -> Result<String> {
    s.account()?;
    Ok(render_wizard(s.wizard_mut(config), today, None))
}

// ── POST /api/onboarding ───────────────────────────────────────────

/// Body: `action=continue|back|vice|habit|name`, `value`, `today`.
///
/// Selection mistakes re-render the wizard with the error inline. The final
/// `continue` commits the profile and renders the dashboard.
pub fn handle_post(body: &str) -> String {
    let params = parse_form_body(body);
    let config = config::current();
    with_session_mut(|s| respond(step(s, &config, &params)))
}

fn step(s: &mut Session, config: &AppConfig, params: &[(String, String)]) -> Result<String> {
    s.account()?;
    let action = require_param(params, "action")?;
    let value = get_param(params, "value").unwrap_or("");
    let today = get_param(params, "today").unwrap_or("");

    let outcome: Result<Option<Profile>> = {
        let wizard = s.wizard_mut(config);
        match action {
            "vice" => wizard.select_vice(value).map(|()| None),
            "habit" => wizard.toggle_habit(value).map(|_| None),
            "name" => {
                wizard.set_name(value);
                Ok(None)
            }
            "back" => {
                wizard.back();
                Ok(None)
            }
            "continue" => {
                if wizard.step() == Step::Name && get_param(params, "value").is_some() {
                    wizard.set_name(value);
                }
                wizard.advance().map(|a| match a {
                    Advance::Completed(profile) => Some(profile),
                    Advance::Moved(_) => None,
                })
            }
            other => Err(AppError::InvalidParam {
                name: "action",
                value: other.to_string(),
            }),
        }
    };

    match outcome {
        Ok(Some(profile)) => {
            s.complete_onboarding(&profile, config)?;
            render_app(s, config, Some(today))
        }
        Ok(None) => Ok(render_wizard(s.wizard_mut(config), today, None)),
        Err(e @ (AppError::StepIncomplete(_) | AppError::UnknownVice(_) | AppError::UnknownHabit(_))) => {
            Ok(render_wizard(s.wizard_mut(config), today, Some(&e)))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::replace_config;
    use crate::tracker::rules::Variant;
    use crate::tracker::session::{Identity, reset_session, with_session};

    fn setup(variant: Variant) {
        reset_session();
        replace_config(AppConfig {
            variant,
            ..AppConfig::default()
        });
        let config = config::current();
        with_session_mut(|s| {
            s.set_identity(Some(Identity {
                uid: "u1".into(),
                display_name: String::new(),
                photo_url: String::new(),
            }));
            s.apply_snapshot("u1", None, &config).unwrap();
        });
    }

    fn teardown() {
        reset_session();
        replace_config(AppConfig::default());
    }

    #[test]
    fn classic_name_step_completes_to_dashboard() {
        setup(Variant::Classic);
        let html = handle_get("");
        assert!(html.contains("Como devemos te chamar?"));
        assert!(!html.contains("Passo"));

        let html = handle_post("action=continue&value=+++&today=d1");
        assert!(html.contains("Tell us what to call you"));

        let html = handle_post("action=continue&value=+Ana+&today=d1");
        assert!(html.contains("Olá, Ana"));
        assert!(with_session(|s| s.account().unwrap().stats.user_name == "Ana"));
        teardown();
    }

    #[test]
    fn ritual_wizard_full_walk() {
        setup(Variant::Ritual);
        let html = handle_get("");
        assert!(html.contains("Bem-vindo, Herói"));
        assert!(!html.contains("Voltar"));

        let html = handle_post("action=continue");
        assert!(html.contains("Passo 2 de 4"));
        assert!(html.contains(" disabled>Continuar"));

        let html = handle_post("action=continue");
        assert!(html.contains("Choose what you are fighting"));

        let html = handle_post("action=vice&value=gaming");
        assert!(html.contains(r#"aria-pressed="true""#));
        assert!(!html.contains(" disabled>Continuar"));
        handle_post("action=continue");

        let html = handle_post("action=habit&value=teleport");
        assert!(html.contains("Unknown habit: teleport"));
        handle_post("action=habit&value=reading");
        handle_post("action=habit&value=exercise");
        let html = handle_post("action=continue");
        assert!(html.contains("Passo 4 de 4"));

        let html = handle_post("action=back");
        assert!(html.contains("Passo 3 de 4"));
        handle_post("action=continue");

        let html = handle_post("action=continue&value=Bia&today=d1");
        assert!(html.contains("Olá, Bia"));
        with_session(|s| {
            let stats = &s.account().unwrap().stats;
            assert!(stats.onboarding_completed);
            assert_eq!(stats.vice_id.as_deref(), Some("gaming"));
            assert_eq!(stats.active_habits.len(), 2);
            assert!(s.wizard.is_none());
        });
        teardown();
    }

    /// Body the browser submits for the rendered `<form>`, with `typed` in
    /// the text field.
    fn submitted_form(html: &str, typed: &str) -> String {
        let start = html.find("<form").unwrap();
        let end = html.find("</form>").unwrap();
        html[start..end]
            .split("<input")
            .skip(1)
            .filter_map(|tag| {
                let tag = &tag[..tag.find('>').unwrap()];
                let name = attr(tag, "name")?;
                let value = if name == "value" {
                    typed.to_string()
                } else {
                    attr(tag, "value").unwrap_or_default()
                };
                Some(format!("{name}={value}"))
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    fn attr(tag: &str, key: &str) -> Option<String> {
        let pat = format!(r#" {key}=""#);
        let start = tag.find(&pat)? + pat.len();
        let len = tag[start..].find('"')?;
        Some(tag[start..start + len].to_string())
    }

    #[test]
    fn name_form_as_rendered_reaches_dashboard() {
        reset_session();
        replace_config(AppConfig::default());
        crate::routes::session::handle_auth_state_post("uid=u1&name=Ana");
        let html = crate::routes::session::handle_snapshot_post(
            r#"{"uid":"u1","exists":false,"today":"d1"}"#,
        );
        let body = submitted_form(&html, "Ana");
        assert_eq!(body, "action=continue&today=d1&value=Ana");

        let html = handle_post(&body);
        assert!(html.contains("Olá, Ana"), "{html}");
        assert!(html.contains("Vencer o Dia"));
        teardown();
    }

    #[test]
    fn wizard_buttons_carry_today() {
        setup(Variant::Ritual);
        let html = handle_get("?today=d1");
        assert!(html.contains(&hx_vals(&[("action", "continue"), ("today", "d1")])));

        let html = handle_post("action=continue&today=d1");
        assert!(html.contains(&hx_vals(&[("action", "back"), ("today", "d1")])));
        assert!(html.contains(&hx_vals(&[
            ("action", "vice"),
            ("value", "gaming"),
            ("today", "d1"),
        ])));
        teardown();
    }

    #[test]
    fn requires_loaded_account() {
        reset_session();
        assert!(handle_get("").contains("Not signed in"));
        assert!(handle_post("action=continue").contains("Not signed in"));
        teardown();
    }

    #[test]
    fn unknown_action_rejected() {
        setup(Variant::Classic);
        assert!(handle_post("action=skip").contains("Invalid action parameter"));
        teardown();
    }
}
