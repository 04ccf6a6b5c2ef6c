//! Static catalogs for the ritual variant: vice categories and daily habits.
//! Account documents store only the ids.

#[derive(Debug, PartialEq, Eq)]
pub struct Vice {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Habit {
    pub id: &'static str,
    pub label: &'static str,
    pub hint: &'static str,
    pub icon: &'static str,
}

pub const VICES: [Vice; 6] = [
    Vice { id: "social_media", label: "Redes Sociais", icon: "smartphone" },
    Vice { id: "pornography", label: "Pornografia", icon: "eye-off" },
    Vice { id: "gaming", label: "Jogos", icon: "gamepad-2" },
    Vice { id: "junk_food", label: "Comida Ultraprocessada", icon: "pizza" },
    Vice { id: "smoking", label: "Cigarro", icon: "cigarette" },
    Vice { id: "alcohol", label: "Álcool", icon: "wine" },
];

pub const HABITS: [Habit; 6] = [
    Habit { id: "meditation", label: "Meditação", hint: "10 minutos de silêncio", icon: "brain" },
    Habit { id: "cold_shower", label: "Banho Gelado", hint: "Choque de dopamina limpa", icon: "snowflake" },
    Habit { id: "exercise", label: "Exercício", hint: "Mova o corpo por 30 minutos", icon: "dumbbell" },
    Habit { id: "reading", label: "Leitura", hint: "10 páginas por dia", icon: "book-open" },
    Habit { id: "sunlight", label: "Luz Solar", hint: "Sol nos olhos pela manhã", icon: "sun" },
    Habit { id: "journaling", label: "Diário", hint: "Escreva o que sentiu hoje", icon: "notebook-pen" },
];

pub fn vice(id: &str) -> Option<&'static Vice> {
    VICES.iter().find(|v| v.id == id)
}

pub fn habit(id: &str) -> Option<&'static Habit> {
    HABITS.iter().find(|h| h.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn lookup_by_id() {
        assert_eq!(vice("gaming").map(|v| v.label), Some("Jogos"));
        assert_eq!(habit("reading").map(|h| h.label), Some("Leitura"));
        assert!(vice("nope").is_none());
        assert!(habit("").is_none());
    }

    #[test]
    fn ids_are_unique() {
        let vices: HashSet<_> = VICES.iter().map(|v| v.id).collect();
        let habits: HashSet<_> = HABITS.iter().map(|h| h.id).collect();
        assert_eq!(vices.len(), VICES.len());
        assert_eq!(habits.len(), HABITS.len());
    }
}
