//! Request gate: opening hours, daily access token, submission cap redirect
//!
//! Decides, for each incoming request, whether it passes, is redirected to
//! the closed/scoreboard pages, or is rejected.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::{Europe::Brussels, Tz};
use sha2::{Digest, Sha256};

use super::config::BoothConfig;
use super::error::BoothError;
use super::limiter::client_ip;
use super::SubmissionLimiter;
use crate::skins::{COOKIE_EMAIL, cookie_value};

/// Booth time zone
pub const BOOTH_TZ: Tz = Brussels;

/// Supported locale path segments
pub const LOCALES: [&str; 3] = ["fr", "nl", "en"];
pub const DEFAULT_LOCALE: &str = "fr";

/// Length of the daily access token
pub const TOKEN_LENGTH: usize = 8;

/// Paths never gated (static assets and crawler files)
const BYPASS_PREFIXES: [&str; 2] = ["/_next", "/assets"];
const BYPASS_EXACT: [&str; 3] = ["/favicon.ico", "/robots.txt", "/sitemap.xml"];

/// Daily open window in booth local time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningHours {
    pub open_hour: u32,
    pub close_hour: u32,
    pub bypass: bool,
}

impl OpeningHours {
    pub fn from_config(config: &BoothConfig) -> Self {
        Self {
            open_hour: config.open_hour,
            close_hour: config.close_hour,
            bypass: config.bypass_hours,
        }
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        if self.bypass {
            return true;
        }
        let hour = now.with_timezone(&BOOTH_TZ).hour();
        hour >= self.open_hour && hour < self.close_hour
    }

    pub fn closed_error(&self) -> BoothError {
        BoothError::Closed {
            open: self.open_hour,
            close: self.close_hour,
        }
    }
}

/// The parts of an HTTP request the gate looks at
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub method: String,
    pub path: String,
    pub cookie: Option<String>,
    pub forwarded_for: Option<String>,
    pub real_ip: Option<String>,
}

impl PageRequest {
    pub fn get(path: &str) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }

    pub fn with_cookie(mut self, cookie: &str) -> Self {
        self.cookie = Some(cookie.to_string());
        self
    }

    pub fn client_ip(&self) -> Option<String> {
        client_ip(self.forwarded_for.as_deref(), self.real_ip.as_deref())
    }
}

/// Gate decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Pass,
    Redirect(String),
    Reject(BoothError),
}

/// Request middleware for the booth site
#[derive(Debug, Clone)]
pub struct AccessGate {
    pub hours: OpeningHours,
    token_secret: String,
    require_token: bool,
}

impl AccessGate {
    pub fn new(config: &BoothConfig) -> Self {
        Self {
            hours: OpeningHours::from_config(config),
            token_secret: config.daily_token_secret.clone(),
            require_token: config.require_daily_token,
        }
    }

    /// Today's access token
    pub fn token_for(&self, now: DateTime<Utc>) -> String {
        daily_token(now, &self.token_secret)
    }

    pub fn route<L: SubmissionLimiter + ?Sized>(&self, request: &PageRequest, now: DateTime<Utc>, limiter: &L) -> Route {
        let path = request.path.as_str();

        if is_bypass_path(path) {
            return Route::Pass;
        }

        let closed_path = format!("/{}/closed", locale_of(path));

        if path.starts_with("/api") {
            return if self.hours.is_open(now) {
                Route::Pass
            } else {
                Route::Reject(self.hours.closed_error())
            };
        }

        if !self.hours.is_open(now) {
            return self.redirect_unless_on(path, &closed_path);
        }

        if self.require_token && token_from_path(path) != Some(self.token_for(now).as_str()) {
            log::debug!("Missing or stale access token on {path}");
            return self.redirect_unless_on(path, &closed_path);
        }

        if request.method.eq_ignore_ascii_case("GET") && path.contains("/game") {
            let email = request
                .cookie
                .as_deref()
                .map(|c| cookie_value(c, COOKIE_EMAIL))
                .unwrap_or_default();
            if !email.is_empty() {
                match limiter.check(&email, request.client_ip().as_deref()) {
                    Ok(status) if status.blocked => {
                        return Route::Redirect(format!("/{}/scoreboard?limit=1", locale_of(path)));
                    }
                    Ok(_) => {}
                    // Limiter trouble never blocks play
                    Err(e) => log::warn!("Submission limit check failed: {e}"),
                }
            }
        }

        Route::Pass
    }

    fn redirect_unless_on(&self, path: &str, target: &str) -> Route {
        if path == target {
            Route::Pass
        } else {
            Route::Redirect(target.to_string())
        }
    }
}

pub fn is_bypass_path(path: &str) -> bool {
    BYPASS_PREFIXES.iter().any(|p| path.starts_with(p)) || BYPASS_EXACT.contains(&path)
}

/// Locale from the first path segment (after an optional token), or the default
pub fn locale_of(path: &str) -> &'static str {
    let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
    if segments.peek().is_some_and(|s| is_token(s)) {
        segments.next();
    }
    segments
        .next()
        .and_then(|first| LOCALES.iter().find(|l| **l == first).copied())
        .unwrap_or(DEFAULT_LOCALE)
}

fn is_token(segment: &str) -> bool {
    segment.len() == TOKEN_LENGTH && segment.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

/// Access token carried as the first path segment, if any
pub fn token_from_path(path: &str) -> Option<&str> {
    path.split('/').find(|s| !s.is_empty()).filter(|s| is_token(s))
}

/// Token of the booth-local day: base36 of the first 8 digest bytes, 8 chars
pub fn daily_token(now: DateTime<Utc>, secret: &str) -> String {
    let date = now.with_timezone(&BOOTH_TZ).format("%Y-%m-%d");
    let digest = Sha256::digest(format!("{date}|{secret}").as_bytes());

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let mut token = to_base36(u64::from_be_bytes(head));
    while token.len() < TOKEN_LENGTH {
        token.insert(0, '0');
    }
    token.truncate(TOKEN_LENGTH);
    token
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Admin check on the `x-admin-password` header
pub fn authorize(config: &BoothConfig, header: Option<&str>) -> Result<(), BoothError> {
    let Some(expected) = config.admin_password.as_deref() else {
        return Err(BoothError::NotConfigured("ADMIN_PASSWORD"));
    };
    match header {
        Some(given) if !given.is_empty() && given == expected => Ok(()),
        _ => Err(BoothError::Unauthorized),
    }
}

/// Today's token for an authorized admin
pub fn issue_daily_token(
    config: &BoothConfig,
    header: Option<&str>,
    now: DateTime<Utc>,
) -> Result<String, BoothError> {
    authorize(config, header)?;
    Ok(daily_token(now, &config.daily_token_secret))
}
