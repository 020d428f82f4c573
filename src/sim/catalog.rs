//! Falling object catalog
//!
//! Every object kind with its category and fixed point value.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Object categories, driving focus and scoring rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Study,
    Distraction,
    /// Restores extra focus when caught, costs extra when missed
    Essential,
    Social,
    Random,
    /// Must be avoided: costs score and focus when caught
    Malus,
}

/// Every kind of object that can fall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Cours,
    Projet,
    Exam,
    Deadline,
    Memoire,
    Stage,
    Sms,
    Notif,
    Insta,
    Cafe,
    Motivation,
    Sommeil,
    Soiree,
    Pizza,
    Bus,
    Bug,
    Virus,
    Spam,
    Procrastination,
    Retard,
}

impl ObjectKind {
    /// All kinds, in spawn-table order
    pub const ALL: [ObjectKind; 20] = [
        ObjectKind::Cours,
        ObjectKind::Projet,
        ObjectKind::Exam,
        ObjectKind::Deadline,
        ObjectKind::Memoire,
        ObjectKind::Stage,
        ObjectKind::Sms,
        ObjectKind::Notif,
        ObjectKind::Insta,
        ObjectKind::Cafe,
        ObjectKind::Motivation,
        ObjectKind::Sommeil,
        ObjectKind::Soiree,
        ObjectKind::Pizza,
        ObjectKind::Bus,
        ObjectKind::Bug,
        ObjectKind::Virus,
        ObjectKind::Spam,
        ObjectKind::Procrastination,
        ObjectKind::Retard,
    ];

    pub fn category(&self) -> Category {
        use ObjectKind::*;
        match self {
            Cours | Projet | Exam | Deadline | Memoire | Stage => Category::Study,
            Sms | Notif | Insta => Category::Distraction,
            Cafe | Motivation | Sommeil => Category::Essential,
            Soiree => Category::Social,
            Pizza | Bus => Category::Random,
            Bug | Virus | Spam | Procrastination | Retard => Category::Malus,
        }
    }

    /// Base points (negative for malus)
    pub fn points(&self) -> i32 {
        use ObjectKind::*;
        match self {
            Cours | Projet => 10,
            Exam | Deadline | Stage => 15,
            Memoire => 20,
            Sms | Notif | Insta => 5,
            Cafe | Motivation | Sommeil => 20,
            Soiree => 8,
            Pizza => 10,
            Bus => 8,
            Bug | Procrastination => -15,
            Virus | Retard => -20,
            Spam => -10,
        }
    }

    pub fn label(&self) -> &'static str {
        use ObjectKind::*;
        match self {
            Cours => "Cours",
            Projet => "Projet",
            Exam => "Exam",
            Deadline => "Deadline",
            Memoire => "TFE",
            Stage => "Stage",
            Sms => "SMS",
            Notif => "Notif",
            Insta => "Insta",
            Cafe => "Café",
            Motivation => "Motivation",
            Sommeil => "Sommeil",
            Soiree => "Soirée",
            Pizza => "Pizza",
            Bus => "STIB",
            Bug => "Bug",
            Virus => "Virus",
            Spam => "Spam",
            Procrastination => "Procrastination",
            Retard => "Retard",
        }
    }

    pub fn emoji(&self) -> &'static str {
        use ObjectKind::*;
        match self {
            Cours => "📚",
            Projet => "📁",
            Exam => "📝",
            Deadline => "⏰",
            Memoire => "🎓",
            Stage => "💼",
            Sms => "📱",
            Notif => "🔔",
            Insta => "📸",
            Cafe => "☕",
            Motivation => "💪",
            Sommeil => "😴",
            Soiree => "🎉",
            Pizza => "🍕",
            Bus => "🚌",
            Bug => "🐛",
            Virus => "🦠",
            Spam => "📧",
            Procrastination => "🛋️",
            Retard => "⌛",
        }
    }

    pub fn is_malus(&self) -> bool {
        self.category() == Category::Malus
    }

    /// Pick a kind uniformly from the table
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(category: Category) -> usize {
        ObjectKind::ALL
            .iter()
            .filter(|k| k.category() == category)
            .count()
    }

    #[test]
    fn test_table_composition() {
        assert_eq!(count(Category::Study), 6);
        assert_eq!(count(Category::Distraction), 3);
        assert_eq!(count(Category::Essential), 3);
        assert_eq!(count(Category::Social), 1);
        assert_eq!(count(Category::Random), 2);
        assert_eq!(count(Category::Malus), 5);
    }

    #[test]
    fn test_point_signs_follow_category() {
        for kind in ObjectKind::ALL {
            if kind.is_malus() {
                assert!((-20..=-10).contains(&kind.points()), "{kind:?}");
            } else {
                assert!(kind.points() > 0, "{kind:?}");
            }
        }
        assert_eq!(ObjectKind::Cours.points(), 10);
        assert_eq!(ObjectKind::Memoire.label(), "TFE");
    }
}
