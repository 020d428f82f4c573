//! Submission cap per player and per IP

use serde::{Deserialize, Serialize};

use crate::consts::SUBMISSION_CAP;

/// Remaining submissions for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitStatus {
    pub blocked: bool,
    pub remaining_by_email: u32,
    /// None when the client IP is unknown
    pub remaining_by_ip: Option<u32>,
}

impl LimitStatus {
    /// Nothing to count against (no email given)
    pub fn open() -> Self {
        Self {
            blocked: false,
            remaining_by_email: SUBMISSION_CAP,
            remaining_by_ip: None,
        }
    }

    /// Status from stored counts
    pub fn from_counts(email_count: u32, ip_count: Option<u32>) -> Self {
        let blocked = email_count >= SUBMISSION_CAP || ip_count.is_some_and(|c| c >= SUBMISSION_CAP);
        Self {
            blocked,
            remaining_by_email: SUBMISSION_CAP.saturating_sub(email_count),
            remaining_by_ip: ip_count.map(|c| SUBMISSION_CAP.saturating_sub(c)),
        }
    }
}

/// Client IP from proxy headers: first `x-forwarded-for` hop, else `x-real-ip`
pub fn client_ip(forwarded_for: Option<&str>, real_ip: Option<&str>) -> Option<String> {
    let ip = match forwarded_for.filter(|v| !v.trim().is_empty()) {
        Some(forwarded) => forwarded.split(',').next().unwrap_or_default().trim(),
        None => real_ip.unwrap_or_default().trim(),
    };
    (!ip.is_empty()).then(|| ip.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let status = LimitStatus::from_counts(1, Some(2));
        assert!(!status.blocked);
        assert_eq!(status.remaining_by_email, 2);
        assert_eq!(status.remaining_by_ip, Some(1));

        assert!(LimitStatus::from_counts(3, None).blocked);
        assert!(LimitStatus::from_counts(0, Some(3)).blocked);
        assert_eq!(LimitStatus::from_counts(5, Some(4)).remaining_by_ip, Some(0));
    }

    #[test]
    fn test_client_ip() {
        assert_eq!(
            client_ip(Some("203.0.113.7, 10.0.0.1"), Some("10.0.0.2")).as_deref(),
            Some("203.0.113.7")
        );
        assert_eq!(client_ip(Some(""), Some(" 10.0.0.2 ")).as_deref(), Some("10.0.0.2"));
        assert_eq!(client_ip(None, None), None);
    }
}
