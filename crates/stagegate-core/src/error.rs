use crate::types::ContentKind;
use thiserror::Error;

/// Coarse error taxonomy used for status mapping and log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// User-correctable input problem.
    Input,
    /// Passphrase generation failed; the session was reset.
    Generation,
    /// Persistence I/O failure.
    Store,
    /// Claimed progression does not match persisted progression.
    Tampering,
    /// Stage content is not configured.
    Content,
}

impl ErrorClass {
    pub fn name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Generation => "generation",
            Self::Store => "store",
            Self::Tampering => "tampering",
            Self::Content => "content",
        }
    }
}

/// Stage gate failures. Every variant is terminal for the request.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("a name is required")]
    MissingName,

    #[error("an answer is required")]
    MissingAnswer,

    #[error("passphrase generation failed: {0}")]
    PassphraseGenerationFailed(#[from] PassphraseError),

    #[error("visitor record could not be created: {0}")]
    UserCreationFailed(#[source] StoreError),

    #[error("stage update failed: {0}")]
    StageUpdateFailed(#[source] StoreError),

    #[error("stage lookup failed: {0}")]
    StageLookupFailed(String),

    #[error("session stage '{session}' does not match recorded stage '{recorded}'")]
    StateTampering { session: String, recorded: String },

    #[error("invalid challenge answer '{0}'")]
    InvalidAnswer(String),

    #[error("no {0} content for the current stage")]
    ContentMissing(ContentKind),

    #[error("no {kind} content for '{path}' and no fallback entry")]
    ContentUnavailable { kind: ContentKind, path: String },
}

impl GateError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingName | Self::MissingAnswer => ErrorClass::Input,
            Self::PassphraseGenerationFailed(_) => ErrorClass::Generation,
            Self::UserCreationFailed(_)
            | Self::StageUpdateFailed(_)
            | Self::StageLookupFailed(_) => ErrorClass::Store,
            Self::StateTampering { .. } | Self::InvalidAnswer(_) => ErrorClass::Tampering,
            Self::ContentMissing(_) | Self::ContentUnavailable { .. } => ErrorClass::Content,
        }
    }

    /// Stable label shown on the error view.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingName => "missing_name",
            Self::MissingAnswer => "missing_answer",
            Self::PassphraseGenerationFailed(_) => "passphrase_generation_failed",
            Self::UserCreationFailed(_) => "user_creation_failed",
            Self::StageUpdateFailed(_) => "stage_update_failed",
            Self::StageLookupFailed(_) => "stage_lookup_failed",
            Self::StateTampering { .. } => "state_tampering",
            Self::InvalidAnswer(_) => "invalid_answer",
            Self::ContentMissing(ContentKind::Title) => "title_missing",
            Self::ContentMissing(ContentKind::Content) => "content_missing",
            Self::ContentUnavailable { .. } => "content_unavailable",
        }
    }

    pub fn tampering(session: &str, recorded: &str) -> Self {
        Self::StateTampering {
            session: session.to_string(),
            recorded: recorded.to_string(),
        }
    }
}

/// User record and content store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record '{0}' already exists")]
    Duplicate(String),

    #[error("record '{0}' not found")]
    NotFound(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Passphrase collaborator failures.
#[derive(Debug, Error)]
pub enum PassphraseError {
    #[error("word source exhausted: {0}")]
    Exhausted(String),

    #[error("generation timed out after {0} ms")]
    Timeout(u64),

    #[error("generated passphrase is malformed: {0}")]
    Malformed(String),

    #[error("generator failed: {0}")]
    Backend(String),
}
