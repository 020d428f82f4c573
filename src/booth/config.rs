use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};

/// Booth-side configuration, read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoothConfig {
    /// Shared admin password (`x-admin-password`); admin routes refuse to work without it
    pub admin_password: Option<String>,
    pub daily_token_secret: String,
    /// Ignore opening hours (setup and demos)
    pub bypass_hours: bool,
    pub open_hour: u32,
    pub close_hour: u32,
    /// Page requests must carry today's token as their first path segment
    pub require_daily_token: bool,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            admin_password: None,
            daily_token_secret: "dev-secret".to_string(),
            bypass_hours: false,
            open_hour: 10,
            close_hour: 18,
            require_daily_token: false,
        }
    }
}

impl BoothConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (environment, test map)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            admin_password: lookup("ADMIN_PASSWORD").filter(|p| !p.is_empty()),
            daily_token_secret: lookup("DAILY_TOKEN_SECRET").unwrap_or_else(|| {
                warn!("DAILY_TOKEN_SECRET not set, using development secret");
                defaults.daily_token_secret
            }),
            bypass_hours: lookup("BYPASS_HOURS_LIMIT").as_deref() == Some("true"),
            open_hour: try_load(&lookup, "BOOTH_OPEN_HOUR", defaults.open_hour),
            close_hour: try_load(&lookup, "BOOTH_CLOSE_HOUR", defaults.close_hour),
            require_daily_token: lookup("REQUIRE_DAILY_TOKEN").as_deref() == Some("true"),
        }
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> BoothConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BoothConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]), BoothConfig::default());
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("ADMIN_PASSWORD", "poulpe"),
            ("DAILY_TOKEN_SECRET", "s3cret"),
            ("BYPASS_HOURS_LIMIT", "true"),
            ("BOOTH_OPEN_HOUR", "9"),
            ("BOOTH_CLOSE_HOUR", "oops"),
        ]);
        assert_eq!(cfg.admin_password.as_deref(), Some("poulpe"));
        assert_eq!(cfg.daily_token_secret, "s3cret");
        assert!(cfg.bypass_hours);
        assert_eq!(cfg.open_hour, 9);
        assert_eq!(cfg.close_hour, 18);
    }

    #[test]
    fn test_empty_password_is_unset() {
        assert!(config(&[("ADMIN_PASSWORD", "")]).admin_password.is_none());
        assert!(!config(&[("BYPASS_HOURS_LIMIT", "yes")]).bypass_hours);
    }
}
