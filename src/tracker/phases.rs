//! Phase/rank classification and the daily quote.
//!
//! Phases and ranks are derived from `streakDays` and `level` on every read;
//! they are never stored in the account document.

/// A narrative bucket of the streak. `max_days` is an inclusive ceiling.
#[derive(Debug, PartialEq, Eq)]
pub struct Phase {
    pub id: &'static str,
    pub max_days: u32,
    pub title: &'static str,
    /// Tailwind text color class.
    pub color: &'static str,
    /// Tailwind gradient stops for the page background.
    pub bg: &'static str,
    pub msg: &'static str,
    pub neuro_change: &'static str,
    /// Lucide icon name, rendered by the shell.
    pub icon: &'static str,
}

pub const WAR_ZONE: &str = "war_zone";

pub const PHASES: [Phase; 4] = [
    Phase {
        id: WAR_ZONE,
        max_days: 7,
        title: "Zona de Guerra",
        color: "text-red-400",
        bg: "from-red-900/50 to-slate-900",
        msg: "Seu cérebro está aprendendo a resistir.",
        neuro_change: "A dopamina caiu drasticamente. A irritação é normal, é o cérebro pedindo a droga. Respire.",
        icon: "shield-alert",
    },
    Phase {
        id: "mine_field",
        max_days: 14,
        title: "Campo Minado",
        color: "text-orange-400",
        bg: "from-orange-900/50 to-slate-900",
        msg: "A confiança voltou, mas o perigo não sumiu.",
        neuro_change: "Os receptores começam a 'desgrudar'. Você sente clareza, mas gatilhos antigos ainda são fortes.",
        icon: "crosshair",
    },
    Phase {
        id: "fortress",
        max_days: 30,
        title: "Fortaleza",
        color: "text-blue-400",
        bg: "from-blue-900/50 to-slate-900",
        msg: "Você está no comando do próprio tédio.",
        neuro_change: "Novas sinapses estão se formando. O hábito antigo está fisicamente perdendo conexão.",
        icon: "anchor",
    },
    Phase {
        id: "new_normal",
        max_days: 9999,
        title: "Novo Normal",
        color: "text-emerald-400",
        bg: "from-emerald-900/50 to-slate-900",
        msg: "Sua identidade é mais forte que o impulso.",
        neuro_change: "Homeostase atingida. A disciplina deixou de ser esforço e virou natural.",
        icon: "crown",
    },
];

pub const RANKS: [&str; 8] = [
    "Iniciado",
    "Sobrevivente",
    "Guerreiro",
    "Estrategista",
    "Sentinela",
    "Arquiteto",
    "Mestre",
    "Lenda",
];

/// Indexed like `RANKS`.
pub const RANK_QUOTES: [[&str; 3]; 8] = [
    ["Você está no comando.", "A inércia foi quebrada.", "Biologia não é destino."],
    ["Suportar é vencer.", "A dor é passageira.", "Mantenha a guarda alta."],
    ["Corte o mal pela raiz.", "Disciplina é liberdade.", "Não negocie com o vício."],
    ["Antecipe o inimigo.", "Ocupe sua mente.", "Domine o ambiente."],
    ["Vigilância eterna.", "O silêncio é seu amigo.", "Proteja seu progresso."],
    ["Construindo o novo eu.", "Cada não é um tijolo.", "Arquitetura mental."],
    ["Você escolhe, não reage.", "Voo de cruzeiro.", "Inspire pelo exemplo."],
    ["Imparável.", "Legado vivo.", "Mestria total."],
];

pub const RECOVERY_QUOTE: &str = "Sistemas reiniciados. Levante-se.";

/// First phase whose ceiling is at or above `streak_days`; the last phase
/// catches everything beyond the table.
pub fn current_phase(streak_days: u32) -> &'static Phase {
    PHASES
        .iter()
        .find(|p| streak_days <= p.max_days)
        .unwrap_or(&PHASES[PHASES.len() - 1])
}

impl Phase {
    pub fn is_war_zone(&self) -> bool {
        self.id == WAR_ZONE
    }
}

/// `min(level - 1, last)`; level 0 is treated as level 1.
pub fn rank_index(level: u32) -> usize {
    (level.saturating_sub(1) as usize).min(RANKS.len() - 1)
}

pub fn rank(level: u32) -> &'static str {
    RANKS[rank_index(level)]
}

/// Deterministic quote for a streak day. Unknown rank indices fall back to
/// the first rank's quotes.
pub fn daily_quote(streak: u32, rank_index: usize, is_recovery_action: bool) -> &'static str {
    if is_recovery_action {
        return RECOVERY_QUOTE;
    }
    let quotes = RANK_QUOTES.get(rank_index).unwrap_or(&RANK_QUOTES[0]);
    quotes[streak as usize % quotes.len()]
}
