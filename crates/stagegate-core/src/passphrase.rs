use crate::error::PassphraseError;
use crate::types::Passphrase;
use async_trait::async_trait;

/// Pluggable passphrase source.
///
/// Implementations may block on an external word source; callers bound each
/// call with a timeout.
#[async_trait]
pub trait PassphraseGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self) -> Result<Passphrase, PassphraseError>;
}
