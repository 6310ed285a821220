//! Stagegate core: visitor stage progression against a persistent record store.
//!
//! Every page view passes through [`StageGate::resolve_request`], which only
//! ever serves the visitor's current stage. Progress is made through two form
//! operations, and any disagreement between the session and the persisted
//! record is rejected as tampering.

#![deny(unsafe_code)]

pub mod content;
pub mod error;
pub mod flow;
pub mod passphrase;
pub mod postgres;
pub mod session;
pub mod stage;
pub mod storage;
pub mod store;
pub mod types;

pub use content::{ContentResolver, ContentSource, MemoryContentSource};
pub use error::{ErrorClass, GateError, PassphraseError, StoreError};
pub use flow::{Redirect, Resolution, StageGate, StagePage};
pub use passphrase::PassphraseGenerator;
pub use postgres::PostgresStore;
pub use session::SessionContext;
pub use stage::{normalize_path, Phase, StagePlan, EMPTY_PATH, ROOT_PATH};
pub use storage::{Storage, StorageConfig};
pub use store::{MemoryUserStore, UserStore};
pub use types::{
    ChallengeAnswer, ContentEntry, ContentKind, Passphrase, UserRecord, VisitorId,
    MAX_WORD_LEN, MIN_WORD_LEN, PASSPHRASE_WORDS,
};
