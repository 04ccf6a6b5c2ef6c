//! Dashboard routes: home, check-in, habit tab, relapse dialog, tabs and
//! history.

use tracing::info;

use crate::config::{self, AppConfig};
use crate::error::{AppError, Result};
use crate::routes::respond;
use crate::routes::rituals;
use crate::routes::session::render_sync_badge;
use crate::routes::util::{escape_html, get_param, hx_vals, parse_form_body, parse_query, require_param};
use crate::tracker::catalog;
use crate::tracker::engine::Celebration;
use crate::tracker::phases;
use crate::tracker::record::{AccountRecord, LogKind};
use crate::tracker::session::{Session, Tab, with_session, with_session_mut};
use crate::tracker::view::{self, CheckInButton, DashboardView};

// ── Rendering ──────────────────────────────────────────────────────

/// Full dashboard: header, active tab, tab bar and the modal slot.
pub fn render_dashboard(s: &mut Session, config: &AppConfig, today: &str) -> Result<String> {
    let panel = render_tab(s, config, today)?;
    let record = s.account()?;
    let phase = phases::current_phase(record.stats.streak_days);
    let avatar = s
        .identity
        .as_ref()
        .filter(|i| !i.photo_url.is_empty())
        .map(|i| {
            format!(
                r#"<img src="{}" alt="{}" referrerpolicy="no-referrer" class="w-8 h-8 rounded-full border border-slate-700">"#,
                escape_html(&i.photo_url),
                escape_html(&i.display_name)
            )
        })
        .unwrap_or_default();

    let mut html = String::with_capacity(4096);
    html.push_str(&format!(
        r#"<div id="dashboard" class="min-h-screen bg-gradient-to-b {} text-slate-100 pb-24">"#,
        phase.bg
    ));
    html.push_str(&format!(
        r##"<header class="flex items-center justify-between p-4">
  <div class="flex items-center gap-2">{}<span class="font-bold">Olá, {}</span></div>
  <div class="flex items-center gap-3">
    <span hx-get="/api/store/status" hx-trigger="every 5s" hx-swap="innerHTML">{}</span>
    <button hx-post="/api/auth/sign_out" hx-target="#app" class="text-xs text-slate-400">Sair</button>
  </div>
</header>"##,
        avatar,
        escape_html(&record.stats.user_name),
        render_sync_badge(&s.outbox)
    ));
    html.push_str(r#"<main id="tab-panel" class="px-4">"#);
    html.push_str(&panel);
    html.push_str("</main>");
    html.push_str(&render_tab_bar(s.ui.tab, config, today));
    html.push_str(r#"<div id="modal">"#);
    if s.ui.relapse_modal_open {
        html.push_str(&render_relapse_modal(today));
    }
    html.push_str("</div></div>");
    Ok(html)
}

/// Content of the active tab.
pub fn render_tab(s: &mut Session, config: &AppConfig, today: &str) -> Result<String> {
    match s.ui.tab {
        Tab::Home => {
            let celebration = s.ui.celebration.take();
            render_home(s, config, today, celebration)
        }
        Tab::Habit => render_habit(s, config, today),
        Tab::Rituals => rituals::render_list(s, config, today),
    }
}

fn render_tab_bar(active: Tab, config: &AppConfig, today: &str) -> String {
    let mut tabs = vec![(Tab::Home, "Início", "swords"), (Tab::Habit, "Protocolo", "shield")];
    if config.variant.has_rituals() {
        tabs.push((Tab::Rituals, "Rituais", "list-checks"));
    }
    let mut html = String::from(
        r#"<nav class="fixed bottom-0 inset-x-0 flex justify-around bg-slate-900/90 border-t border-slate-800 py-2">"#,
    );
    for (tab, label, icon) in tabs {
        let color = if tab == active { "text-emerald-400" } else { "text-slate-500" };
        html.push_str(&format!(
            r##"<button hx-post="/api/nav" hx-vals="{}" hx-target="#tab-panel" class="flex flex-col items-center text-xs {}"><i data-lucide="{}"></i>{}</button>"##,
            hx_vals(&[("tab", tab.as_str()), ("today", today)]),
            color,
            icon,
            label
        ));
    }
    html.push_str("</nav>");
    html
}

pub fn render_home(
    s: &Session,
    config: &AppConfig,
    today: &str,
    celebration: Option<Celebration>,
) -> Result<String> {
    let record = s.account()?;
    let v = DashboardView::new(record, today, config.variant);

    let celebration_attrs = celebration
        .map(|c| {
            format!(
                r#" data-celebration="{}" data-duration="{}""#,
                c.as_str(),
                c.duration_ms()
            )
        })
        .unwrap_or_default();

    let title_color = if record.stats.is_damaged { "text-red-500" } else { v.phase.color };

    let mut html = String::with_capacity(2048);
    html.push_str(&format!(
        r#"<section id="home" class="space-y-6" data-phase="{}"{}>"#,
        v.phase.id, celebration_attrs
    ));
    html.push_str(&format!(
        r#"<div class="text-center space-y-2">
  <i data-lucide="{icon}" class="mx-auto w-10 h-10 {color}"></i>
  <h2 class="text-xl font-black tracking-widest uppercase {color}">{title}</h2>
  <p class="text-6xl font-black">{day}</p>
  <p class="text-xs uppercase text-slate-400">Dia</p>
  <p class="text-sm">{msg}</p>
  <p class="text-xs text-slate-400">{neuro}</p>
</div>"#,
        icon = v.phase.icon,
        color = title_color,
        title = v.title,
        day = v.day_counter,
        msg = v.message,
        neuro = v.phase.neuro_change,
    ));
    html.push_str(&format!(
        r#"<div class="w-full h-2 bg-slate-800 rounded-full"><div class="h-2 rounded-full bg-emerald-500" style="width: {}%"></div></div>"#,
        view::percent(v.phase_progress)
    ));
    html.push_str(&format!(
        r#"<div class="flex justify-between text-sm"><span class="font-bold">{}</span><span>Nível {}</span></div>
<div class="w-full h-1 bg-slate-800 rounded-full"><div class="h-1 rounded-full bg-amber-400" style="width: {}%"></div></div>
<p class="text-xs text-slate-400 text-right">{} / {} XP</p>"#,
        v.rank,
        v.level,
        view::percent(v.xp_progress),
        record.stats.current_xp,
        record.stats.xp_to_next_level
    ));
    if let Some(m) = v.next_milestone {
        html.push_str(&format!(
            r#"<p class="text-xs text-amber-300">Próximo marco: dia {m} (+{} XP)</p>"#,
            config.variant.rules().milestone_bonus
        ));
    }
    html.push_str(&render_check_in_button(v.button, today));
    if let Some(quote) = s.ui.daily_message {
        html.push_str(&format!(
            r#"<blockquote class="text-center italic text-slate-300">"{}"</blockquote>"#,
            quote
        ));
    }
    html.push_str("</section>");
    Ok(html)
}

fn render_check_in_button(button: CheckInButton, today: &str) -> String {
    let (label, reward) = match button {
        CheckInButton::Done => {
            return r#"<button disabled class="w-full py-4 rounded-xl bg-slate-800 text-slate-500 cursor-not-allowed"><span class="block font-bold">Missão Cumprida</span><span class="block text-xs">Volte amanhã</span></button>"#.to_string();
        }
        CheckInButton::Restart(r) => ("Reiniciar", r),
        CheckInButton::Available(r) => ("Vencer o Dia", r),
    };
    format!(
        r##"<button hx-post="/api/checkin" hx-vals="{}" hx-target="#tab-panel" class="w-full py-4 rounded-xl bg-emerald-600 hover:bg-emerald-500 font-bold"><span class="block">{}</span><span class="block text-xs">+{} XP</span></button>"##,
        hx_vals(&[("today", today)]),
        label,
        reward.xp
    )
}

pub fn render_habit(s: &Session, config: &AppConfig, today: &str) -> Result<String> {
    let record = s.account()?;
    let stats = &record.stats;
    let mut html = String::with_capacity(2048);
    html.push_str(r#"<section id="habit" class="space-y-6">"#);
    html.push_str(r#"<h2 class="text-xs uppercase tracking-widest text-slate-400">Meu Protocolo</h2>"#);

    if s.ui.editing_habit_name {
        html.push_str(&format!(
            r##"<form hx-post="/api/habit" hx-target="#tab-panel" class="flex gap-2">
  <input type="hidden" name="action" value="save">
  <input type="hidden" name="today" value="{today}">
  <input name="name" value="{name}" maxlength="60" class="flex-1 bg-slate-800 rounded px-2">
  <button type="submit" class="text-emerald-400">Salvar</button>
  <button type="button" hx-post="/api/habit" hx-vals="{cancel}" hx-target="#tab-panel" class="text-slate-400">Cancelar</button>
</form>"##,
            today = escape_html(today),
            name = escape_html(&stats.habit_name),
            cancel = hx_vals(&[("action", "cancel"), ("today", today)]),
        ));
    } else {
        html.push_str(&format!(
            r##"<div class="flex items-center justify-between"><p class="text-2xl font-bold">{}</p><button hx-post="/api/habit" hx-vals="{}" hx-target="#tab-panel" class="text-xs text-slate-400">Editar</button></div>"##,
            escape_html(&stats.habit_name),
            hx_vals(&[("action", "edit"), ("today", today)])
        ));
    }

    if let Some(vice) = stats.vice_id.as_deref().and_then(catalog::vice) {
        html.push_str(&format!(
            r#"<p class="text-sm text-slate-400"><i data-lucide="{}"></i> Combatendo: {}</p>"#,
            vice.icon, vice.label
        ));
    }

    html.push_str(&format!(
        r#"<dl class="grid grid-cols-3 gap-2 text-center">
  <div><dt class="text-xs text-slate-400">Sequência atual</dt><dd class="text-xl font-bold">{}</dd></div>
  <div><dt class="text-xs text-slate-400">Dias limpos</dt><dd class="text-xl font-bold">{}</dd></div>
  <div><dt class="text-xs text-slate-400">Nível</dt><dd class="text-xl font-bold">{}</dd></div>
</dl>"#,
        stats.streak_days, stats.clean_days, stats.level
    ));
    html.push_str(&format!(
        r#"<div hx-get="/api/history" hx-vals="{}" hx-trigger="load"></div>"#,
        hx_vals(&[("limit", &config.history_limit.to_string())])
    ));
    html.push_str(&format!(
        r##"<button hx-post="/api/relapse" hx-vals="{}" hx-target="#modal" class="w-full py-3 rounded-xl border border-red-800 text-red-400">Tive uma recaída</button>"##,
        hx_vals(&[("action", "open"), ("today", today)])
    ));
    html.push_str("</section>");
    Ok(html)
}

pub fn render_relapse_modal(today: &str) -> String {
    format!(
        r##"<div id="relapse-modal" class="fixed inset-0 bg-black/70 flex items-center justify-center p-6">
  <div class="bg-slate-900 rounded-2xl p-6 space-y-4 max-w-sm">
    <h3 class="text-lg font-bold text-red-400">Registrar recaída?</h3>
    <p class="text-sm text-slate-300">Sua sequência volta a zero. Seu nível e o total de dias limpos são mantidos.</p>
    <div class="flex gap-3">
      <button hx-post="/api/relapse" hx-vals="{}" hx-target="#modal" class="flex-1 py-2 rounded bg-slate-700">Cancelar</button>
      <button hx-post="/api/relapse" hx-vals="{}" hx-target="#modal" class="flex-1 py-2 rounded bg-red-700">Confirmar</button>
    </div>
  </div>
</div>"##,
        hx_vals(&[("action", "cancel")]),
        hx_vals(&[("action", "confirm"), ("today", today)])
    )
}

pub fn render_history(record: &AccountRecord, limit: usize) -> String {
    if record.history_log.is_empty() {
        return r#"<p id="history" class="text-sm text-slate-500">Nenhum registro ainda.</p>"#.to_string();
    }
    let mut html = String::from(r#"<ul id="history" class="space-y-2">"#);
    for entry in record.history_log.iter().take(limit) {
        let (label, color) = match entry.kind {
            LogKind::Success => ("Vitória", "text-emerald-400"),
            LogKind::Relapse => ("Recaída", "text-red-400"),
            LogKind::HabitDone => ("Ritual", "text-blue-400"),
        };
        html.push_str(&format!(
            r#"<li class="flex justify-between text-sm"><span class="{}">{}</span><span>{}</span><span class="text-xs text-slate-500">{}</span></li>"#,
            color,
            label,
            escape_html(entry.note.as_deref().unwrap_or("")),
            escape_html(&entry.date)
        ));
    }
    html.push_str("</ul>");
    html
}

// ── GET /api/dashboard ─────────────────────────────────────────────

pub fn handle_dashboard_get(query: &str) -> String {
    let params = parse_query(query);
    let config = config::current();
    with_session_mut(|s| {
        respond(require_param(&params, "today").and_then(|today| {
            s.dashboard_account(&config)?;
            s.ui.tab = Tab::Home;
            let celebration = s.ui.celebration.take();
            render_home(s, &config, today, celebration)
        }))
    })
}

// ── POST /api/checkin ──────────────────────────────────────────────

/// Body: `today`. Re-renders home carrying the celebration hook.
pub fn handle_checkin_post(body: &str) -> String {
    let params = parse_form_body(body);
    let config = config::current();
    with_session_mut(|s| {
        respond(require_param(&params, "today").and_then(|today| {
            s.check_in(today, &config)?;
            s.ui.tab = Tab::Home;
            let celebration = s.ui.celebration.take();
            render_home(s, &config, today, celebration)
        }))
    })
}

// ── GET|POST /api/habit ────────────────────────────────────────────

pub fn handle_habit_get(query: &str) -> String {
    let params = parse_query(query);
    let config = config::current();
    with_session(|s| {
        respond(require_param(&params, "today").and_then(|today| render_habit(s, &config, today)))
    })
}

/// Body: `action=edit|cancel|save`, `name`, `today`.
pub fn handle_habit_post(body: &str) -> String {
    let params = parse_form_body(body);
    let config = config::current();
    with_session_mut(|s| respond(habit_action(s, &config, &params)))
}

fn habit_action(s: &mut Session, config: &AppConfig, params: &[(String, String)]) -> Result<String> {
    let today = require_param(params, "today")?;
    s.dashboard_account(config)?;
    match require_param(params, "action")? {
        "edit" => s.start_habit_name_edit()?,
        "cancel" => s.cancel_habit_name_edit(),
        "save" => {
            let name = get_param(params, "name").unwrap_or("");
            if s.save_habit_name(name, config)? {
                info!("habit name updated");
            }
        }
        other => {
            return Err(AppError::InvalidParam {
                name: "action",
                value: other.to_string(),
            });
        }
    }
    s.ui.tab = Tab::Habit;
    render_habit(s, config, today)
}

// ── POST /api/relapse ──────────────────────────────────────────────

/// Body: `action=open|cancel|confirm`, `today`.
///
/// Responses target `#modal`. `confirm` empties it and swaps the home tab
/// into `#tab-panel` out of band.
pub fn handle_relapse_post(body: &str) -> String {
    let params = parse_form_body(body);
    let config = config::current();
    with_session_mut(|s| respond(relapse_action(s, &config, &params)))
}

fn relapse_action(s: &mut Session, config: &AppConfig, params: &[(String, String)]) -> Result<String> {
    match require_param(params, "action")? {
        "open" => {
            s.open_relapse_modal()?;
            Ok(render_relapse_modal(get_param(params, "today").unwrap_or("")))
        }
        "cancel" => {
            s.cancel_relapse();
            Ok(String::new())
        }
        "confirm" => {
            let today = require_param(params, "today")?;
            s.confirm_relapse(today, config)?;
            s.ui.tab = Tab::Home;
            let home = render_home(s, config, today, None)?;
            Ok(format!(r#"<main id="tab-panel" class="px-4" hx-swap-oob="true">{home}</main>"#))
        }
        other => Err(AppError::InvalidParam {
            name: "action",
            value: other.to_string(),
        }),
    }
}

// ── POST /api/nav ──────────────────────────────────────────────────

/// Body: `tab=home|habit|rituals`, `today`.
pub fn handle_nav_post(body: &str) -> String {
    let params = parse_form_body(body);
    let config = config::current();
    with_session_mut(|s| respond(nav(s, &config, &params)))
}

fn nav(s: &mut Session, config: &AppConfig, params: &[(String, String)]) -> Result<String> {
    let raw = require_param(params, "tab")?;
    let today = require_param(params, "today")?;
    let tab = Tab::parse(raw).ok_or_else(|| AppError::InvalidParam {
        name: "tab",
        value: raw.to_string(),
    })?;
    if tab == Tab::Rituals && !config.variant.has_rituals() {
        return Err(AppError::RitualsDisabled);
    }
    s.dashboard_account(config)?;
    s.ui.tab = tab;
    render_tab(s, config, today)
}

// ── GET /api/history ───────────────────────────────────────────────

/// Query: optional `limit`, defaults to the configured history limit.
pub fn handle_history_get(query: &str) -> String {
    let params = parse_query(query);
    let config = config::current();
    with_session(|s| respond(history(s, &config, &params)))
}

fn history(s: &Session, config: &AppConfig, params: &[(String, String)]) -> Result<String> {
    let limit = match get_param(params, "limit").filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| AppError::InvalidParam {
                name: "limit",
                value: raw.to_string(),
            })?,
        None => config.history_limit,
    };
    Ok(render_history(s.account()?, limit))
}
