//! Cosmetic skins and session start parameters
//!
//! Parameters arrive through the game URL query (`skin`, `difficulty`) and
//! the identity cookies written by the registration form. Bad values fall
//! back to defaults silently.

use serde::{Deserialize, Serialize};

/// Playable skins, each with its own pace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Skin {
    #[default]
    Diplome,
    Travail,
    Bibliothecaire,
    Ecole,
    Surf,
}

impl Skin {
    pub const ALL: [Skin; 5] = [
        Skin::Diplome,
        Skin::Travail,
        Skin::Bibliothecaire,
        Skin::Ecole,
        Skin::Surf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Skin::Diplome => "diplome",
            Skin::Travail => "travail",
            Skin::Bibliothecaire => "bibliothecaire",
            Skin::Ecole => "ecole",
            Skin::Surf => "surf",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|skin| skin.as_str() == s)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Skin::Diplome => "Diplômé",
            Skin::Travail => "Studieux",
            Skin::Bibliothecaire => "Biblio",
            Skin::Ecole => "Étudiant",
            Skin::Surf => "Surfeur",
        }
    }

    /// Fall duration multiplier
    pub fn speed_mod(&self) -> f32 {
        match self {
            Skin::Diplome | Skin::Bibliothecaire => 1.0,
            Skin::Travail => 0.9,
            Skin::Ecole => 1.1,
            Skin::Surf => 1.15,
        }
    }

    /// Spawn interval multiplier
    pub fn spawn_mod(&self) -> f32 {
        match self {
            Skin::Diplome | Skin::Bibliothecaire => 1.0,
            Skin::Travail => 1.1,
            Skin::Ecole => 0.9,
            Skin::Surf => 0.85,
        }
    }
}

/// Start-screen difficulty bounds
pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 3;

/// Parameters a session starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionParams {
    pub skin: Skin,
    /// 1 (facile) to 3 (difficile)
    pub difficulty: u8,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            skin: Skin::Diplome,
            difficulty: MIN_DIFFICULTY,
        }
    }
}

impl SessionParams {
    /// Read `skin` and `difficulty` from a URL query string (with or without `?`)
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in query_pairs(query) {
            match key.as_str() {
                "skin" => match Skin::parse(&value) {
                    Some(skin) => params.skin = skin,
                    None => log::debug!("Unknown skin {value:?}, keeping {}", params.skin.as_str()),
                },
                "difficulty" => match value.trim().parse::<i64>() {
                    Ok(d) => {
                        params.difficulty = d.clamp(MIN_DIFFICULTY as i64, MAX_DIFFICULTY as i64) as u8
                    }
                    Err(_) => log::debug!("Ignoring difficulty {value:?}"),
                },
                _ => {}
            }
        }
        params
    }

    /// Query string for the game page
    pub fn to_query(&self) -> String {
        format!("skin={}&difficulty={}", self.skin.as_str(), self.difficulty)
    }
}

/// Cookie names written by the registration form
pub const COOKIE_FIRST_NAME: &str = "he2b_firstName";
pub const COOKIE_LAST_NAME: &str = "he2b_lastName";
pub const COOKIE_EMAIL: &str = "he2b_email";
pub const COOKIE_PSEUDO: &str = "he2b_pseudo";

/// Who is playing, as remembered by the browser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerIdentity {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pseudo: String,
}

impl PlayerIdentity {
    /// Parse a `Cookie` header / `document.cookie` string
    pub fn from_cookies(header: &str) -> Self {
        Self {
            first_name: cookie_value(header, COOKIE_FIRST_NAME),
            last_name: cookie_value(header, COOKIE_LAST_NAME),
            email: cookie_value(header, COOKIE_EMAIL),
            pseudo: cookie_value(header, COOKIE_PSEUDO),
        }
    }

    /// First name, last name and email present
    pub fn is_registered(&self) -> bool {
        !self.first_name.is_empty() && !self.last_name.is_empty() && !self.email.is_empty()
    }

    /// `Cookie` header the registration form leaves behind
    pub fn to_cookie_header(&self) -> String {
        [
            (COOKIE_FIRST_NAME, &self.first_name),
            (COOKIE_LAST_NAME, &self.last_name),
            (COOKIE_EMAIL, &self.email),
            (COOKIE_PSEUDO, &self.pseudo),
        ]
        .iter()
        .map(|(name, value)| format!("{name}={}", percent_encode(value)))
        .collect::<Vec<_>>()
        .join("; ")
    }
}

/// Value of a cookie, percent-decoded (raw value kept if decoding fails)
pub fn cookie_value(header: &str, name: &str) -> String {
    header
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .filter(|(key, _)| *key == name)
        .last()
        .map(|(_, raw)| percent_decode(raw).unwrap_or_else(|| raw.to_string()))
        .unwrap_or_default()
}

/// Split a query string into decoded key/value pairs
pub fn query_pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let decode = |s: &str| percent_decode(&s.replace('+', " ")).unwrap_or_else(|| s.to_string());
            (decode(key), decode(value))
        })
}

/// Decode `%XX` escapes; None on malformed escapes or invalid UTF-8
pub fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Percent-encode a cookie or query value
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
