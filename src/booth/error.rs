use thiserror::Error;

/// Errors surfaced by the booth's request handlers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoothError {
    #[error("Invalid JSON body.")]
    InvalidJson,

    #[error("Missing required fields.")]
    MissingFields,

    #[error("Invalid email.")]
    InvalidEmail,

    #[error("Invalid score data.")]
    InvalidScore,

    #[error("Too many submissions from this IP.")]
    TooManyFromIp,

    #[error("Too many submissions for this player.")]
    TooManyForPlayer,

    #[error("Unauthorized.")]
    Unauthorized,

    #[error("{0} is not configured.")]
    NotConfigured(&'static str),

    #[error("Site closed ({open}h-{close}h).")]
    Closed { open: u32, close: u32 },

    #[error("Failed to store score.")]
    Storage,
}

impl BoothError {
    /// HTTP status for the error response
    pub fn status(&self) -> u16 {
        match self {
            BoothError::InvalidJson
            | BoothError::MissingFields
            | BoothError::InvalidEmail
            | BoothError::InvalidScore => 400,
            BoothError::Unauthorized => 401,
            BoothError::Closed { .. } => 403,
            BoothError::TooManyFromIp | BoothError::TooManyForPlayer => 429,
            BoothError::NotConfigured(_) | BoothError::Storage => 500,
        }
    }

    /// `{"error": "..."}` body
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}
