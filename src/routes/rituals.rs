//! `/api/rituals`: today's ritual checklist (ritual variant only).

use crate::config::{self, AppConfig};
use crate::error::{AppError, Result};
use crate::routes::respond;
use crate::routes::util::{hx_vals, parse_form_body, parse_query, require_param};
use crate::tracker::catalog;
use crate::tracker::engine::HabitToggle;
use crate::tracker::session::{Session, Tab, with_session_mut};

/// Roll the done-set over to `today` and render the checklist.
pub fn render_list(s: &mut Session, config: &AppConfig, today: &str) -> Result<String> {
    if !config.variant.has_rituals() {
        return Err(AppError::RitualsDisabled);
    }
    s.dashboard_account(config)?;
    s.roll_daily_habits(today, config)?;
    render(s, config, today, None)
}

fn render(s: &Session, config: &AppConfig, today: &str, last: Option<&HabitToggle>) -> Result<String> {
    let record = s.account()?;
    let active: Vec<_> = record
        .stats
        .active_habits
        .iter()
        .filter_map(|id| catalog::habit(id))
        .collect();
    let done = active
        .iter()
        .filter(|h| record.daily_habits_done.contains(h.id))
        .count();
    let xp = config.variant.rules().habit_xp;

    let mut html = String::with_capacity(2048);
    html.push_str(r#"<section id="rituals" class="space-y-4">"#);
    html.push_str(&format!(
        r#"<div class="flex justify-between items-baseline"><h2 class="text-xs uppercase tracking-widest text-slate-400">Rituais de Hoje</h2><span class="text-sm">{done}/{} concluídos</span></div>"#,
        active.len()
    ));

    if let Some(t) = last.filter(|t| t.done) {
        let level_up = if t.levels_gained > 0 { " Nível acima!" } else { "" };
        html.push_str(&format!(
            r#"<p class="text-xs text-amber-300" data-celebration="ripple" data-duration="1000">+{} XP{}</p>"#,
            t.xp_awarded, level_up
        ));
    }

    if active.is_empty() {
        html.push_str(r#"<p class="text-sm text-slate-500">Nenhum ritual escolhido.</p>"#);
    } else {
        html.push_str(r#"<ul class="space-y-2">"#);
        for habit in active {
            let is_done = record.daily_habits_done.contains(habit.id);
            let style = if is_done {
                "border-emerald-500 bg-emerald-900/30 line-through"
            } else {
                "border-slate-700"
            };
            html.push_str(&format!(
                r##"<li><button hx-post="/api/rituals" hx-vals="{}" hx-target="#tab-panel" aria-pressed="{}" class="w-full flex items-center gap-3 p-3 rounded-xl border {}"><i data-lucide="{}"></i><span class="flex-1 text-left"><span class="block font-bold">{}</span><span class="block text-xs text-slate-400">{}</span></span><span class="text-xs text-amber-300">+{} XP</span></button></li>"##,
                hx_vals(&[("habit", habit.id), ("today", today)]),
                is_done,
                style,
                habit.icon,
                habit.label,
                habit.hint,
                xp
            ));
        }
        html.push_str("</ul>");
    }
    html.push_str("</section>");
    Ok(html)
}

// ── GET /api/rituals ───────────────────────────────────────────────

pub fn handle_get(query: &str) -> String {
    let params = parse_query(query);
    let config = config::current();
    with_session_mut(|s| {
        respond(require_param(&params, "today").and_then(|today| {
            let html = render_list(s, &config, today)?;
            s.ui.tab = Tab::Rituals;
            Ok(html)
        }))
    })
}

// ── POST /api/rituals ──────────────────────────────────────────────

/// Body: `habit`, `today`. Toggling on awards XP; toggling off keeps it.
pub fn handle_post(body: &str) -> String {
    let params = parse_form_body(body);
    let config = config::current();
    with_session_mut(|s| respond(toggle(s, &config, &params)))
}

fn toggle(s: &mut Session, config: &AppConfig, params: &[(String, String)]) -> Result<String> {
    if !config.variant.has_rituals() {
        return Err(AppError::RitualsDisabled);
    }
    let habit = require_param(params, "habit")?;
    let today = require_param(params, "today")?;
    let result = s.toggle_habit(habit, today, config)?;
    s.ui.tab = Tab::Rituals;
    render(s, config, today, Some(&result))
}
