use crate::content::{render_fragment, ContentResolver};
use crate::error::{GateError, PassphraseError};
use crate::passphrase::PassphraseGenerator;
use crate::session::SessionContext;
use crate::stage::{normalize_path, StagePlan, ROOT_PATH};
use crate::store::UserStore;
use crate::types::{ChallengeAnswer, ContentKind, UserRecord, VisitorId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Instruction to send the client elsewhere with a GET (302 semantics).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

/// Content resolved for the visitor's current stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePage {
    pub stage: String,
    pub title: String,
    pub body: String,
    pub name: Option<String>,
    pub passphrase: Option<String>,
}

/// Outcome of the read-only gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Redirect(Redirect),
    Page(StagePage),
}

pub const DEFAULT_PASSPHRASE_TIMEOUT: Duration = Duration::from_secs(2);

/// Stage progression state machine.
///
/// Two operations mutate progression (`register_visitor`,
/// `advance_on_challenge`) and one read-only gate (`resolve_request`) runs on
/// every page view. The session is always passed in explicitly; the persisted
/// record is authoritative and a session that disagrees with it is rejected.
#[derive(Clone)]
pub struct StageGate {
    users: Arc<dyn UserStore>,
    content: ContentResolver,
    passphrases: Arc<dyn PassphraseGenerator>,
    plan: StagePlan,
    passphrase_timeout: Duration,
}

impl StageGate {
    pub fn new(
        users: Arc<dyn UserStore>,
        content: ContentResolver,
        passphrases: Arc<dyn PassphraseGenerator>,
        plan: StagePlan,
    ) -> Self {
        Self {
            users,
            content,
            passphrases,
            plan,
            passphrase_timeout: DEFAULT_PASSPHRASE_TIMEOUT,
        }
    }

    pub fn with_passphrase_timeout(mut self, timeout: Duration) -> Self {
        self.passphrase_timeout = timeout;
        self
    }

    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }

    /// Creates a visitor record and moves the session to the registered stage.
    ///
    /// The session is only written once the record is persisted. A passphrase
    /// failure resets the session to empty.
    pub async fn register_visitor(
        &self,
        session: &mut SessionContext,
        name: Option<&str>,
    ) -> Result<Redirect, GateError> {
        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(GateError::MissingName)?;

        let passphrase = match tokio::time::timeout(
            self.passphrase_timeout,
            self.passphrases.generate(),
        )
        .await
        {
            Ok(Ok(passphrase)) => passphrase,
            Ok(Err(err)) => {
                warn!(generator = self.passphrases.name(), error = %err, "passphrase generation failed");
                session.reset();
                return Err(err.into());
            }
            Err(_) => {
                let millis = self.passphrase_timeout.as_millis() as u64;
                warn!(generator = self.passphrases.name(), millis, "passphrase generation timed out");
                session.reset();
                return Err(PassphraseError::Timeout(millis).into());
            }
        };

        let record = UserRecord::new(
            VisitorId::generate(),
            name,
            passphrase.to_string(),
            self.plan.registered.as_str(),
        );
        if let Err(err) = self.users.create(record.clone()).await {
            error!(visitor = %record.id, error = %err, "visitor record creation failed");
            return Err(GateError::UserCreationFailed(err));
        }

        session.bind(&record);
        info!(visitor = %record.id, stage = %record.stage, "visitor registered");
        Ok(Redirect::to(record.stage))
    }

    /// Applies the challenge answer: "yes" advances, "no" opts out.
    ///
    /// The session stage is committed only after the store accepted the
    /// update. Concurrent submissions are last-write-wins.
    pub async fn advance_on_challenge(
        &self,
        session: &mut SessionContext,
        answer: Option<&str>,
    ) -> Result<Redirect, GateError> {
        let answer = answer
            .map(str::trim)
            .filter(|answer| !answer.is_empty())
            .ok_or(GateError::MissingAnswer)?;

        match ChallengeAnswer::parse(answer) {
            ChallengeAnswer::Decline => {
                session.noaccept = true;
                info!(visitor = ?session.id, "visitor declined the challenge");
                Ok(Redirect::to(self.plan.exit_url.as_str()))
            }
            ChallengeAnswer::Accept => {
                let Some(id) = session.id else {
                    warn!(security = true, "challenge accepted without a visitor identity");
                    return Err(GateError::tampering(
                        session.stage.as_deref().unwrap_or("(anonymous)"),
                        "(no record)",
                    ));
                };

                let next = self.plan.accepted.as_str();
                if let Err(err) = self.users.update_stage(&id, next).await {
                    error!(visitor = %id, error = %err, "stage update failed");
                    return Err(GateError::StageUpdateFailed(err));
                }

                session.stage = Some(next.to_string());
                info!(visitor = %id, stage = next, "visitor advanced");
                Ok(Redirect::to(next))
            }
            ChallengeAnswer::Other(value) => {
                warn!(security = true, visitor = ?session.id, answer = %value, "invalid challenge answer");
                Err(GateError::InvalidAnswer(value))
            }
        }
    }

    /// Decides what a GET for `path` yields for this session.
    ///
    /// Any path other than the visitor's current stage redirects there.
    pub async fn resolve_request(
        &self,
        session: &SessionContext,
        path: &str,
    ) -> Result<Resolution, GateError> {
        let path = normalize_path(path);

        if session.noaccept {
            return Ok(Resolution::Redirect(Redirect::to(
                self.plan.exit_url.as_str(),
            )));
        }

        let target = match session.id {
            None => ROOT_PATH.to_string(),
            Some(id) => self.verified_stage(&id, session).await?,
        };

        if path != target {
            debug!(
                phase = self.plan.phase_of(session).name(),
                requested = %path,
                target = %target,
                "redirecting to current stage"
            );
            return Ok(Resolution::Redirect(Redirect::to(target)));
        }

        let title = self.stage_content(ContentKind::Title, &target, session).await?;
        let body = self.stage_content(ContentKind::Content, &target, session).await?;

        Ok(Resolution::Page(StagePage {
            stage: target,
            title,
            body,
            name: session.name.clone(),
            passphrase: session.passphrase.clone(),
        }))
    }

    async fn verified_stage(
        &self,
        id: &VisitorId,
        session: &SessionContext,
    ) -> Result<String, GateError> {
        let record = self
            .users
            .find_by_id(id)
            .await
            .map_err(|err| {
                error!(visitor = %id, error = %err, "stage lookup failed");
                GateError::StageLookupFailed(err.to_string())
            })?
            .ok_or_else(|| {
                warn!(visitor = %id, "no record for session visitor");
                GateError::StageLookupFailed(format!("no record for visitor '{id}'"))
            })?;

        if session.stage.as_deref() != Some(record.stage.as_str()) {
            let claimed = session.stage.as_deref().unwrap_or("(none)");
            warn!(
                security = true,
                visitor = %id,
                session_stage = claimed,
                recorded_stage = %record.stage,
                "session stage diverges from recorded stage"
            );
            return Err(GateError::tampering(claimed, &record.stage));
        }

        Ok(record.stage)
    }

    async fn stage_content(
        &self,
        kind: ContentKind,
        stage: &str,
        session: &SessionContext,
    ) -> Result<String, GateError> {
        match self.content.resolve(kind, stage).await {
            Ok(body) => Ok(render_fragment(&body, session.name.as_deref())),
            Err(GateError::ContentUnavailable { kind, path }) => {
                error!(kind = %kind, stage = %path, "stage content missing");
                Err(GateError::ContentMissing(kind))
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryContentSource;
    use crate::error::{ErrorClass, StoreError};
    use crate::stage::EMPTY_PATH;
    use crate::store::{MemoryUserStore, StoreResult};
    use crate::types::{ContentEntry, Passphrase};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FixedPassphrase;

    #[async_trait]
    impl PassphraseGenerator for FixedPassphrase {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn generate(&self) -> Result<Passphrase, PassphraseError> {
            Passphrase::from_words(vec![
                "amber".to_string(),
                "falcon".to_string(),
                "river".to_string(),
            ])
        }
    }

    struct ExhaustedPassphrase;

    #[async_trait]
    impl PassphraseGenerator for ExhaustedPassphrase {
        fn name(&self) -> &'static str {
            "exhausted"
        }

        async fn generate(&self) -> Result<Passphrase, PassphraseError> {
            Err(PassphraseError::Exhausted("no words left".to_string()))
        }
    }

    struct SlowPassphrase;

    #[async_trait]
    impl PassphraseGenerator for SlowPassphrase {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn generate(&self) -> Result<Passphrase, PassphraseError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            FixedPassphrase.generate().await
        }
    }

    /// Memory store whose writes and reads can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryUserStore,
        fail_create: AtomicBool,
        fail_update: AtomicBool,
        fail_find: AtomicBool,
    }

    #[async_trait]
    impl UserStore for FlakyStore {
        async fn create(&self, record: UserRecord) -> StoreResult<()> {
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(StoreError::Connection("create refused".to_string()));
            }
            self.inner.create(record).await
        }

        async fn find_by_id(&self, id: &VisitorId) -> StoreResult<Option<UserRecord>> {
            if self.fail_find.load(Ordering::SeqCst) {
                return Err(StoreError::Connection("find refused".to_string()));
            }
            self.inner.find_by_id(id).await
        }

        async fn update_stage(&self, id: &VisitorId, stage: &str) -> StoreResult<()> {
            if self.fail_update.load(Ordering::SeqCst) {
                return Err(StoreError::Connection("update refused".to_string()));
            }
            self.inner.update_stage(id, stage).await
        }
    }

    fn plan() -> StagePlan {
        StagePlan {
            registered: "/s1".to_string(),
            accepted: "/s2".to_string(),
            register_endpoint: "/register".to_string(),
            challenge_endpoint: "/challenge".to_string(),
            exit_url: "https://exit.example/".to_string(),
        }
    }

    fn catalog() -> MemoryContentSource {
        MemoryContentSource::from_entries([
            ContentEntry::new("/", ContentKind::Title, "Welcome"),
            ContentEntry::new("/", ContentKind::Content, "<form>name</form>"),
            ContentEntry::new("/s1", ContentKind::Title, "Hello {{name}}"),
            ContentEntry::new("/s1", ContentKind::Content, "<p>Ready, {{processedName}}?</p>"),
            ContentEntry::new("/s2", ContentKind::Title, "Welcome in"),
            ContentEntry::new(EMPTY_PATH, ContentKind::Content, "<p>nothing yet</p>"),
        ])
    }

    fn gate_with(store: Arc<dyn UserStore>, generator: Arc<dyn PassphraseGenerator>) -> StageGate {
        StageGate::new(
            store,
            ContentResolver::new(Arc::new(catalog())),
            generator,
            plan(),
        )
    }

    fn gate(store: Arc<dyn UserStore>) -> StageGate {
        gate_with(store, Arc::new(FixedPassphrase))
    }

    #[tokio::test]
    async fn register_persists_and_binds_session() {
        let store = Arc::new(MemoryUserStore::new());
        let gate = gate(store.clone());
        let mut session = SessionContext::new();

        let redirect = gate
            .register_visitor(&mut session, Some("  Ada  "))
            .await
            .unwrap();
        assert_eq!(redirect, Redirect::to("/s1"));

        let id = session.id.unwrap();
        let record = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(record.name, "Ada");
        assert_eq!(record.stage, "/s1");
        assert_eq!(session.stage.as_deref(), Some("/s1"));
        assert_eq!(session.passphrase.as_deref(), Some("amber falcon river"));
    }

    #[tokio::test]
    async fn register_requires_name() {
        let store = Arc::new(MemoryUserStore::new());
        let gate = gate(store.clone());
        let mut session = SessionContext::new();

        for name in [None, Some(""), Some("   ")] {
            let err = gate.register_visitor(&mut session, name).await.unwrap_err();
            assert!(matches!(err, GateError::MissingName));
        }
        assert!(store.is_empty().await);
        assert_eq!(session, SessionContext::default());
    }

    #[tokio::test]
    async fn passphrase_failure_resets_session() {
        let store = Arc::new(MemoryUserStore::new());
        let gate = gate_with(store.clone(), Arc::new(ExhaustedPassphrase));
        let mut session = SessionContext {
            name: Some("stale".to_string()),
            noaccept: true,
            ..SessionContext::default()
        };

        let err = gate
            .register_visitor(&mut session, Some("Ada"))
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Generation);
        assert_eq!(session, SessionContext::default());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn passphrase_timeout_is_a_generation_failure() {
        let store = Arc::new(MemoryUserStore::new());
        let gate = gate_with(store.clone(), Arc::new(SlowPassphrase))
            .with_passphrase_timeout(Duration::from_millis(20));
        let mut session = SessionContext::new();

        let err = gate
            .register_visitor(&mut session, Some("Ada"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GateError::PassphraseGenerationFailed(PassphraseError::Timeout(20))
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn creation_failure_leaves_session_untouched() {
        let store = Arc::new(FlakyStore::default());
        store.fail_create.store(true, Ordering::SeqCst);
        let gate = gate(store);
        let mut session = SessionContext::new();

        let err = gate
            .register_visitor(&mut session, Some("Ada"))
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::UserCreationFailed(_)));
        assert!(session.is_anonymous());
    }

    #[tokio::test]
    async fn accept_advances_record_and_session() {
        let store = Arc::new(MemoryUserStore::new());
        let gate = gate(store.clone());
        let mut session = SessionContext::new();
        gate.register_visitor(&mut session, Some("Ada")).await.unwrap();

        let redirect = gate
            .advance_on_challenge(&mut session, Some("yes"))
            .await
            .unwrap();
        assert_eq!(redirect, Redirect::to("/s2"));
        assert_eq!(session.stage.as_deref(), Some("/s2"));

        let record = store.find_by_id(&session.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(record.stage, "/s2");
    }

    #[tokio::test]
    async fn failed_update_keeps_previous_session_stage() {
        let store = Arc::new(FlakyStore::default());
        let gate = gate(store.clone());
        let mut session = SessionContext::new();
        gate.register_visitor(&mut session, Some("Ada")).await.unwrap();

        store.fail_update.store(true, Ordering::SeqCst);
        let err = gate
            .advance_on_challenge(&mut session, Some("yes"))
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::StageUpdateFailed(_)));
        assert_eq!(session.stage.as_deref(), Some("/s1"));

        // Session and record still agree, so the visitor keeps seeing stage one.
        store.fail_update.store(false, Ordering::SeqCst);
        let resolution = gate.resolve_request(&session, "/s1").await.unwrap();
        assert!(matches!(resolution, Resolution::Page(page) if page.stage == "/s1"));
    }

    #[tokio::test]
    async fn decline_opts_out_for_every_path() {
        let store = Arc::new(MemoryUserStore::new());
        let gate = gate(store.clone());
        let mut session = SessionContext::new();
        gate.register_visitor(&mut session, Some("Ada")).await.unwrap();

        let redirect = gate
            .advance_on_challenge(&mut session, Some("no"))
            .await
            .unwrap();
        assert_eq!(redirect, Redirect::to("https://exit.example/"));
        assert!(session.noaccept);

        let record = store.find_by_id(&session.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(record.stage, "/s1");

        for path in ["/", "/s1", "/s2", "elsewhere"] {
            assert_eq!(
                gate.resolve_request(&session, path).await.unwrap(),
                Resolution::Redirect(Redirect::to("https://exit.example/"))
            );
        }
    }

    #[tokio::test]
    async fn challenge_rejects_missing_and_unknown_answers() {
        let store = Arc::new(MemoryUserStore::new());
        let gate = gate(store);
        let mut session = SessionContext::new();
        gate.register_visitor(&mut session, Some("Ada")).await.unwrap();

        let err = gate.advance_on_challenge(&mut session, None).await.unwrap_err();
        assert!(matches!(err, GateError::MissingAnswer));

        let err = gate
            .advance_on_challenge(&mut session, Some("maybe"))
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::InvalidAnswer(ref v) if v == "maybe"));
        assert_eq!(err.class(), ErrorClass::Tampering);
        assert_eq!(session.stage.as_deref(), Some("/s1"));
        assert!(!session.noaccept);
    }

    #[tokio::test]
    async fn anonymous_accept_is_tampering() {
        let gate = gate(Arc::new(MemoryUserStore::new()));
        let mut session = SessionContext::new();

        let err = gate
            .advance_on_challenge(&mut session, Some("yes"))
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::StateTampering { .. }));
        assert!(session.stage.is_none());
    }

    #[tokio::test]
    async fn anonymous_visitors_are_held_at_root() {
        let gate = gate(Arc::new(MemoryUserStore::new()));
        let session = SessionContext::new();

        assert_eq!(
            gate.resolve_request(&session, "/s2").await.unwrap(),
            Resolution::Redirect(Redirect::to("/"))
        );

        match gate.resolve_request(&session, "").await.unwrap() {
            Resolution::Page(page) => {
                assert_eq!(page.stage, "/");
                assert_eq!(page.title, "Welcome");
                assert!(page.passphrase.is_none());
            }
            other => panic!("expected page, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stage_page_fills_name_placeholders_and_falls_back() {
        let gate = gate(Arc::new(MemoryUserStore::new()));
        let mut session = SessionContext::new();
        gate.register_visitor(&mut session, Some("Ada Lovelace"))
            .await
            .unwrap();

        match gate.resolve_request(&session, "s1").await.unwrap() {
            Resolution::Page(page) => {
                assert_eq!(page.title, "Hello Ada Lovelace");
                assert_eq!(page.body, "<p>Ready, ada?</p>");
                assert_eq!(page.name.as_deref(), Some("Ada Lovelace"));
                assert_eq!(page.passphrase.as_deref(), Some("amber falcon river"));
            }
            other => panic!("expected page, got {other:?}"),
        }

        gate.advance_on_challenge(&mut session, Some("yes"))
            .await
            .unwrap();
        match gate.resolve_request(&session, "/s2").await.unwrap() {
            Resolution::Page(page) => assert_eq!(page.body, "<p>nothing yet</p>"),
            other => panic!("expected page, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_title_names_the_kind() {
        let source = MemoryContentSource::from_entries([ContentEntry::new(
            "/",
            ContentKind::Content,
            "<p>root</p>",
        )]);
        let gate = StageGate::new(
            Arc::new(MemoryUserStore::new()),
            ContentResolver::new(Arc::new(source)),
            Arc::new(FixedPassphrase),
            plan(),
        );

        let err = gate
            .resolve_request(&SessionContext::new(), "/")
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::ContentMissing(ContentKind::Title)));
    }

    #[tokio::test]
    async fn unknown_visitor_is_a_lookup_failure() {
        let gate = gate(Arc::new(MemoryUserStore::new()));
        let session = SessionContext {
            id: Some(VisitorId::generate()),
            stage: Some("/s1".to_string()),
            ..SessionContext::default()
        };

        let err = gate.resolve_request(&session, "/s1").await.unwrap_err();
        assert!(matches!(err, GateError::StageLookupFailed(_)));
    }

    #[tokio::test]
    async fn store_error_on_lookup_is_a_lookup_failure() {
        let store = Arc::new(FlakyStore::default());
        let gate = gate(store.clone());
        let mut session = SessionContext::new();
        gate.register_visitor(&mut session, Some("Ada")).await.unwrap();

        store.fail_find.store(true, Ordering::SeqCst);
        let err = gate.resolve_request(&session, "/s1").await.unwrap_err();
        assert!(matches!(err, GateError::StageLookupFailed(_)));
        assert_eq!(err.class(), ErrorClass::Store);
    }

    #[tokio::test]
    async fn concurrent_accepts_are_last_write_wins() {
        let store = Arc::new(MemoryUserStore::new());
        let gate = gate(store.clone());
        let mut session = SessionContext::new();
        gate.register_visitor(&mut session, Some("Ada")).await.unwrap();

        // Each request works on its own copy of the session, as two requests
        // carrying the same cookie would.
        let mut first = session.clone();
        let mut second = session.clone();
        let (a, b) = tokio::join!(
            gate.advance_on_challenge(&mut first, Some("yes")),
            gate.advance_on_challenge(&mut second, Some("yes")),
        );
        assert!(a.is_ok() && b.is_ok());

        let record = store.find_by_id(&session.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(record.stage, "/s2");
        assert_eq!(first.stage, second.stage);
        assert!(matches!(
            gate.resolve_request(&first, "/s2").await.unwrap(),
            Resolution::Page(_)
        ));
        // The copy that never saw the advance is now stale.
        assert!(matches!(
            gate.resolve_request(&session, "/s1").await.unwrap_err(),
            GateError::StateTampering { .. }
        ));
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime")
    }

    proptest! {
        #[test]
        fn property_registration_agrees_with_record(name in "[A-Za-z][A-Za-z ]{0,30}") {
            runtime().block_on(async move {
                let store = Arc::new(MemoryUserStore::new());
                let gate = gate(store.clone());
                let mut session = SessionContext::new();

                gate.register_visitor(&mut session, Some(&name)).await.unwrap();
                let record = store.find_by_id(&session.id.unwrap()).await.unwrap().unwrap();
                assert_eq!(record.stage, "/s1");
                assert_eq!(session.stage.as_deref(), Some(record.stage.as_str()));
                assert_eq!(record.name, name.trim());
            });
        }

        #[test]
        fn property_divergent_session_is_tampering(
            claimed in "/[a-z0-9]{1,12}",
            path in "/[a-z0-9]{0,12}",
        ) {
            prop_assume!(claimed != "/s1");
            runtime().block_on(async move {
                let gate = gate(Arc::new(MemoryUserStore::new()));
                let mut session = SessionContext::new();
                gate.register_visitor(&mut session, Some("Ada")).await.unwrap();
                session.stage = Some(claimed);

                let err = gate.resolve_request(&session, &path).await.unwrap_err();
                assert!(matches!(err, GateError::StateTampering { .. }));
            });
        }

        #[test]
        fn property_foreign_paths_redirect_to_current_stage(
            path in "/?[A-Za-z0-9/_-]{0,24}",
            accepted in any::<bool>(),
        ) {
            runtime().block_on(async move {
                let gate = gate(Arc::new(MemoryUserStore::new()));
                let mut session = SessionContext::new();
                gate.register_visitor(&mut session, Some("Ada")).await.unwrap();
                if accepted {
                    gate.advance_on_challenge(&mut session, Some("yes")).await.unwrap();
                }
                let current = session.stage.clone().unwrap();
                if normalize_path(&path) == current {
                    return;
                }

                let resolution = gate.resolve_request(&session, &path).await.unwrap();
                assert_eq!(resolution, Resolution::Redirect(Redirect::to(current)));
            });
        }
    }
}
