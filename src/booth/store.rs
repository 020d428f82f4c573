//! In-memory registrations and scoreboard
//!
//! Plays the persistence collaborator: registration desk, score sink,
//! leaderboard query and submission limiter in one store.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::limiter::LimitStatus;
use super::{BoothError, LeaderboardQuery, ScoreSink, SubmissionLimiter};
use crate::consts::SUBMISSION_CAP;
use crate::leaderboard::{LeaderboardEntry, rank_unique};
use crate::skins::PlayerIdentity;

/// Registration form payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pseudo: String,
}

impl Registration {
    pub fn from_json(body: &str) -> Result<Self, BoothError> {
        serde_json::from_str(body).map_err(|_| BoothError::InvalidJson)
    }

    /// Trimmed copy; every field required and the email well-formed
    pub fn validated(&self) -> Result<Self, BoothError> {
        let reg = Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            pseudo: self.pseudo.trim().to_string(),
        };
        if reg.first_name.is_empty()
            || reg.last_name.is_empty()
            || reg.email.is_empty()
            || reg.pseudo.is_empty()
        {
            return Err(BoothError::MissingFields);
        }
        if !is_valid_email(&reg.email) {
            return Err(BoothError::InvalidEmail);
        }
        Ok(reg)
    }
}

/// A stored registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub id: u32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pseudo: String,
    pub created_at: DateTime<Utc>,
}

/// What a registration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Created,
    /// Known email, new pseudo
    PseudoUpdated,
    /// Known email, nothing changed
    Unchanged,
}

/// End-of-session score sent by the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pseudo: Option<String>,
    pub score: u64,
    pub max_combo: u32,
    pub level: u32,
    /// Filled in server-side from proxy headers
    #[serde(skip)]
    pub ip: Option<String>,
}

/// Loosely typed body, validated into a `ScoreSubmission`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ScorePayload {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    pseudo: Option<String>,
    score: Option<serde_json::Value>,
    max_combo: Option<serde_json::Value>,
    level: Option<serde_json::Value>,
}

impl ScoreSubmission {
    /// Payload for a finished run
    pub fn for_player(identity: &PlayerIdentity, score: u64, max_combo: u32, level: u32) -> Self {
        Self {
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            email: identity.email.clone(),
            pseudo: Some(identity.pseudo.clone()).filter(|p| !p.is_empty()),
            score,
            max_combo,
            level,
            ip: None,
        }
    }

    /// Parse and validate a JSON body
    pub fn from_json(body: &str, ip: Option<String>) -> Result<Self, BoothError> {
        let payload: ScorePayload = serde_json::from_str(body).map_err(|_| BoothError::InvalidJson)?;

        let text = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();
        let first_name = text(payload.first_name);
        let last_name = text(payload.last_name);
        let email = text(payload.email);
        let pseudo = text(payload.pseudo);

        let (Some(score), Some(max_combo), Some(level)) = (payload.score, payload.max_combo, payload.level)
        else {
            return Err(BoothError::MissingFields);
        };
        if first_name.is_empty() || last_name.is_empty() || email.is_empty() {
            return Err(BoothError::MissingFields);
        }

        Ok(Self {
            first_name,
            last_name,
            email,
            pseudo: Some(pseudo).filter(|p| !p.is_empty()),
            score: whole_number(&score)?,
            max_combo: u32::try_from(whole_number(&max_combo)?).map_err(|_| BoothError::InvalidScore)?,
            level: u32::try_from(whole_number(&level)?).map_err(|_| BoothError::InvalidScore)?,
            ip,
        })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Normalized copy; rejects missing identity fields
    fn validated(mut self) -> Result<Self, BoothError> {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.pseudo = self.pseudo.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        self.ip = self.ip.map(|ip| ip.trim().to_string()).filter(|ip| !ip.is_empty());
        if self.first_name.is_empty() || self.last_name.is_empty() || self.email.is_empty() {
            return Err(BoothError::MissingFields);
        }
        Ok(self)
    }
}

fn whole_number(value: &serde_json::Value) -> Result<u64, BoothError> {
    value.as_u64().ok_or(BoothError::InvalidScore)
}

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// `something@domain.tld`, no whitespace
pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

const PSEUDO_ADJECTIVES: [&str; 39] = [
    "Tentaculaire", "Studieux", "Focus", "Brave", "Curieux", "Vif", "Zen", "Agile", "Malin",
    "He2b", "Campus", "Royal", "Bruxellois", "Academique", "Diplome", "Motivant", "Tenace",
    "Endurant", "Energique", "Concentre", "Creatif", "Astucieux", "Lumineux", "Optimiste",
    "Solide", "Rapide", "Fute", "Calme", "Curieusement", "Audacieux", "Studieuse", "Methodique",
    "Ponctuel", "Bienveillant", "Solaire", "Epique", "Nomade", "Octo", "Poulpy",
];

const PSEUDO_NOUNS: [&str; 9] = [
    "Poulpy", "Poulpe", "Poulpyx", "Poulpito", "Poulpissime", "Poulpex", "PoulpyOne", "Poulpiz",
    "Poulpo",
];

/// Suggested pseudo for the registration form, e.g. "Zen Poulpito 42"
pub fn generate_pseudo<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = PSEUDO_ADJECTIVES[rng.random_range(0..PSEUDO_ADJECTIVES.len())];
    let noun = PSEUDO_NOUNS[rng.random_range(0..PSEUDO_NOUNS.len())];
    let number = rng.random_range(10..=99);
    format!("{adjective} {noun} {number}")
}

/// Registrations and scores, kept in memory
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    registrations: Vec<RegistrationRecord>,
    scores: Vec<LeaderboardEntry>,
    next_registration_id: u32,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrations(&self) -> &[RegistrationRecord] {
        &self.registrations
    }

    pub fn scores(&self) -> &[LeaderboardEntry] {
        &self.scores
    }

    /// Register a player, or refresh the pseudo of a known email
    pub fn register_at(
        &mut self,
        registration: &Registration,
        now: DateTime<Utc>,
    ) -> Result<RegistrationOutcome, BoothError> {
        let reg = registration.validated()?;

        if let Some(existing) = self.registrations.iter_mut().find(|r| r.email == reg.email) {
            if existing.pseudo == reg.pseudo {
                return Ok(RegistrationOutcome::Unchanged);
            }
            log::debug!("Pseudo updated for registration {}", existing.id);
            existing.pseudo = reg.pseudo;
            return Ok(RegistrationOutcome::PseudoUpdated);
        }

        let id = self.next_registration_id;
        self.next_registration_id += 1;
        self.registrations.push(RegistrationRecord {
            id,
            first_name: reg.first_name,
            last_name: reg.last_name,
            email: reg.email,
            pseudo: reg.pseudo,
            created_at: now,
        });
        log::info!("New registration #{id}");
        Ok(RegistrationOutcome::Created)
    }

    pub fn register(&mut self, registration: &Registration) -> Result<RegistrationOutcome, BoothError> {
        self.register_at(registration, Utc::now())
    }

    pub fn count_by_email(&self, email: &str) -> u32 {
        self.scores.iter().filter(|s| s.email == email).count() as u32
    }

    pub fn count_by_ip(&self, ip: &str) -> u32 {
        self.scores
            .iter()
            .filter(|s| s.ip.as_deref() == Some(ip))
            .count() as u32
    }

    /// Store a score unless the player or their IP already used the cap
    pub fn submit_at(&mut self, submission: ScoreSubmission, now: DateTime<Utc>) -> Result<(), BoothError> {
        let submission = submission.validated()?;

        if let Some(ip) = submission.ip.as_deref() {
            if self.count_by_ip(ip) >= SUBMISSION_CAP {
                return Err(BoothError::TooManyFromIp);
            }
        }
        if self.count_by_email(&submission.email) >= SUBMISSION_CAP {
            return Err(BoothError::TooManyForPlayer);
        }

        log::info!(
            "Score {} stored (combo {}, level {})",
            submission.score,
            submission.max_combo,
            submission.level
        );
        self.scores.push(LeaderboardEntry {
            first_name: submission.first_name,
            last_name: submission.last_name,
            pseudo: submission.pseudo,
            score: submission.score,
            max_combo: submission.max_combo,
            level: submission.level,
            email: submission.email,
            ip: submission.ip,
            created_at: now,
        });
        Ok(())
    }
}

impl ScoreSink for ScoreBoard {
    fn submit(&mut self, submission: ScoreSubmission) -> Result<(), BoothError> {
        self.submit_at(submission, Utc::now())
    }
}

impl LeaderboardQuery for ScoreBoard {
    fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, BoothError> {
        Ok(rank_unique(&self.scores, limit))
    }
}

impl SubmissionLimiter for ScoreBoard {
    fn check(&self, email: &str, ip: Option<&str>) -> Result<LimitStatus, BoothError> {
        let email = email.trim();
        if email.is_empty() {
            return Ok(LimitStatus::open());
        }
        let ip_count = ip
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(|ip| self.count_by_ip(ip));
        Ok(LimitStatus::from_counts(self.count_by_email(email), ip_count))
    }
}
