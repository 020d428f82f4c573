//! Player feedback: hit effects, commentary and end-screen copy
//!
//! Nothing here affects scoring. Effects and comments are expiring queue
//! entries driven by the session clock.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Visual/audio feedback for a resolved object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitKind {
    Perfect,
    Good,
    Miss,
    Malus,
}

/// Sound cue for a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Catch,
    Perfect,
    Malus,
    Miss,
}

/// A short-lived lane flash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitEffect {
    pub id: u32,
    pub lane: u8,
    pub kind: HitKind,
    pub multiplier: u32,
    pub created_ms: u64,
}

impl HitEffect {
    pub fn cue(&self) -> Cue {
        match self.kind {
            HitKind::Malus => Cue::Malus,
            _ if self.multiplier >= 2 => Cue::Perfect,
            HitKind::Good | HitKind::Perfect => Cue::Catch,
            HitKind::Miss => Cue::Miss,
        }
    }
}

/// Expiring queue of hit effects
#[derive(Debug, Clone, Default)]
pub struct HitEffects {
    effects: Vec<HitEffect>,
    next_id: u32,
}

impl HitEffects {
    pub fn push(&mut self, lane: u8, kind: HitKind, multiplier: u32, now_ms: u64) -> HitEffect {
        let effect = HitEffect {
            id: self.next_id,
            lane,
            kind,
            multiplier,
            created_ms: now_ms,
        };
        self.next_id += 1;
        self.effects.push(effect);
        effect
    }

    /// Drop effects older than their lifetime
    pub fn expire(&mut self, now_ms: u64) {
        self.effects
            .retain(|e| now_ms.saturating_sub(e.created_ms) < HIT_EFFECT_LIFETIME_MS);
    }

    pub fn active(&self) -> &[HitEffect] {
        &self.effects
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

/// What the mascot is reacting to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Start,
    Streak,
    Drop,
    Essential,
    Malus,
    Dodge,
    Bonus2x,
    Bonus3x,
}

impl Topic {
    pub fn lines(&self) -> &'static [&'static str] {
        match self {
            Topic::Start => &["C'est parti !", "Let's go !", "Focus !", "Allez le poulpe !"],
            Topic::Streak => &["Combo !", "On fire !", "Inarrêtable !", "Tentaculaire !"],
            Topic::Drop => &["Oups.", "F", "Ça arrive.", "Glissé !"],
            Topic::Essential => &["Café = Vie", "Boost !", "Énergie !"],
            Topic::Malus => &["Aïe !", "Évite ça !", "Touché !", "Pas ça !"],
            Topic::Dodge => &["Esquivé !", "Bien joué !", "Ouf !", "Nice dodge !"],
            Topic::Bonus2x => &["x2 !", "Double !", "Précis !"],
            Topic::Bonus3x => &["x3 !", "TRIPLE !", "ÉNORME !"],
        }
    }
}

/// A comment on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comment {
    pub topic: Topic,
    pub text: &'static str,
    pub shown_ms: u64,
}

/// Mascot commentary with a global cooldown
#[derive(Debug, Clone, Default)]
pub struct Commentary {
    current: Option<Comment>,
    last_said_ms: Option<u64>,
}

impl Commentary {
    /// Say something about `topic` unless still cooling down; returns true if shown
    pub fn say<R: Rng + ?Sized>(&mut self, topic: Topic, now_ms: u64, rng: &mut R) -> bool {
        if let Some(last) = self.last_said_ms {
            if now_ms.saturating_sub(last) < COMMENT_COOLDOWN_MS {
                return false;
            }
        }
        let lines = topic.lines();
        let text = lines[rng.random_range(0..lines.len())];
        self.current = Some(Comment {
            topic,
            text,
            shown_ms: now_ms,
        });
        self.last_said_ms = Some(now_ms);
        true
    }

    /// Comment still on screen at `now_ms`
    pub fn current(&self, now_ms: u64) -> Option<&Comment> {
        self.current
            .as_ref()
            .filter(|c| now_ms.saturating_sub(c.shown_ms) < COMMENT_DISPLAY_MS)
    }
}

/// Focus gauge label and HUD color
pub fn focus_level(focus: f32) -> (&'static str, &'static str) {
    if focus > 66.0 {
        ("OK", "#8DC63F")
    } else if focus > 33.0 {
        ("Moyen", "#F7941D")
    } else {
        ("DANGER", "#D91A5B")
    }
}

pub const END_BADGES: [&str; 7] = [
    "Poulpe Débutant",
    "Tentacules du Chaos",
    "Multi-tâches Pro",
    "Survivant HE2B",
    "Poulpe Héro",
    "Légende Tentaculaire",
    "Diplômé avec Mention",
];

/// One badge per 200 points, capped at the last one
pub fn end_badge(score: u64) -> &'static str {
    let index = ((score / 200) as usize).min(END_BADGES.len() - 1);
    END_BADGES[index]
}

pub const END_MESSAGES: [&str; 10] = [
    "Bravo ! Tu as tenu jusqu'au bout !",
    // Copy says 90s while a full run lasts GAME_DURATION_MS (100s); pending product decision
    "90 secondes de focus tentaculaire !",
    "Champion ! Tu gères le multi-tâches !",
    "Félicitations ! Tu es prêt pour la HE2B !",
    "Incroyable ! Le Poulpe est fier de toi !",
    "Tu déchires ! Continue comme ça !",
    "Mission accomplie ! Tu es un vrai pro !",
    "Waouw ! Quelle performance !",
    "GG ! Tu as tout donné !",
    "Superbe ! Les tentacules applaudissent !",
];

pub fn end_message<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    END_MESSAGES[rng.random_range(0..END_MESSAGES.len())]
}

/// Level banner: (name, subtitle)
pub fn level_name(level: u32) -> Option<(&'static str, &'static str)> {
    const NAMES: [(&str, &str); 5] = [
        ("Semaine 1", "La rentrée"),
        ("Semaine 2", "Les premiers cours"),
        ("Semaine 3", "Les projets arrivent"),
        ("Semaine 4", "Le rush final"),
        ("Semaine 5", "Les examens !"),
    ];
    NAMES.get((level as usize).checked_sub(1)?).copied()
}

/// Tip shown on the transition screen after `level`: (title, text, tip)
pub fn level_anecdote(level: u32) -> Option<(&'static str, &'static str, &'static str)> {
    const ANECDOTES: [(&str, &str, &str); 4] = [
        (
            "📌 Le sais-tu ?",
            "Inscription ? Écris au département, pas \"à l'école\". Ça répond plus vite !",
            "Rue Royale, Louis Schmidt, Anderlecht. La HE2B, c'est apprendre à naviguer Bruxelles !",
        ),
        (
            "💡 Conseil de Poulpy",
            "Le groupe WhatsApp : 90% memes, mais sans lui tu rates une deadline !",
            "L'aide à la réussite : pas pour \"les autres\", pour optimiser ta survie !",
        ),
        (
            "📚 Astuce HE2B",
            "La bibli : tu viens imprimer, tu restes 2h sauver ton travail.",
            "Espaces d'étude : chez toi = tentations, sur campus = focus.",
        ),
        (
            "🏁 Dernière ligne droite !",
            "Motivation constante ? Mythe. On bosse vraiment la semaine où il faut.",
            "\"J'ai le temps\" et tu finis ton travail à 3h du mat.",
        ),
    ];
    ANECDOTES.get((level as usize).checked_sub(1)?).copied()
}
