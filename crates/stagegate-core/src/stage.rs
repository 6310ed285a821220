use crate::session::SessionContext;
use serde::{Deserialize, Serialize};

/// Reserved content path used when a stage has no entry of its own.
pub const EMPTY_PATH: &str = "/empty";

/// Root stage for visitors without an identity.
pub const ROOT_PATH: &str = "/";

/// The fixed linear stage sequence and the form endpoints that drive it.
///
/// Paths are deliberately opaque so stages cannot be guessed from one another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePlan {
    /// Stage reached after registering a name.
    pub registered: String,
    /// Stage reached after accepting the challenge.
    pub accepted: String,
    /// POST target for the registration form.
    pub register_endpoint: String,
    /// POST target for the challenge form.
    pub challenge_endpoint: String,
    /// External URL visitors are sent to after declining.
    pub exit_url: String,
}

impl Default for StagePlan {
    fn default() -> Self {
        Self {
            registered: "/c4e1b8f07a".to_string(),
            accepted: "/9d27a35e6f".to_string(),
            register_endpoint: "/f3a9e02d51".to_string(),
            challenge_endpoint: "/5b70c6d9e8".to_string(),
            exit_url: "https://www.example.com/".to_string(),
        }
    }
}

impl StagePlan {
    /// Every stage a visitor can be sent to, in progression order.
    pub fn stages(&self) -> [&str; 3] {
        [ROOT_PATH, &self.registered, &self.accepted]
    }

    pub fn validate(&self) -> Result<(), String> {
        let internal = [
            ("registered", &self.registered),
            ("accepted", &self.accepted),
            ("register_endpoint", &self.register_endpoint),
            ("challenge_endpoint", &self.challenge_endpoint),
        ];
        for (field, path) in internal {
            if !path.starts_with('/') || path.len() < 2 {
                return Err(format!(
                    "stage path '{field}' must start with '/' and not be the root, got '{path}'"
                ));
            }
            if path == EMPTY_PATH {
                return Err(format!("stage path '{field}' uses the reserved '{EMPTY_PATH}'"));
            }
        }
        for (i, (lhs_field, lhs)) in internal.iter().enumerate() {
            for (rhs_field, rhs) in internal.iter().skip(i + 1) {
                if lhs == rhs {
                    return Err(format!(
                        "stage paths '{lhs_field}' and '{rhs_field}' must differ, both are '{lhs}'"
                    ));
                }
            }
        }
        if self.exit_url.trim().is_empty() {
            return Err("exit_url must not be empty".to_string());
        }
        Ok(())
    }

    pub fn phase_of(&self, session: &SessionContext) -> Phase {
        if session.noaccept {
            return Phase::OptedOut;
        }
        match session.stage.as_deref() {
            _ if session.id.is_none() => Phase::Anonymous,
            Some(stage) if stage == self.accepted => Phase::Accepted,
            Some(stage) if stage == self.registered => Phase::Registered,
            _ => Phase::Unknown,
        }
    }
}

/// Ensures a leading "/". No other rewriting is applied.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Coarse progression phase, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Anonymous,
    Registered,
    Accepted,
    OptedOut,
    Unknown,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Registered => "registered",
            Self::Accepted => "accepted",
            Self::OptedOut => "opted_out",
            Self::Unknown => "unknown",
        }
    }
}
