#![deny(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod session;
pub mod views;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use catalog::{builtin_catalog, load_catalog};
use config::{ServerConfig, ServiceConfig};
use error::{GateFailure, ServiceError, ServiceResult};
use serde::Deserialize;
use session::{attach_cookie, SessionHandle, SessionStore};
use stagegate_adapters::WordListGenerator;
use stagegate_core::{
    ContentResolver, GateError, PassphraseError, PassphraseGenerator, Redirect, Resolution,
    StageGate, Storage, PASSPHRASE_WORDS,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

#[derive(Clone)]
pub struct ServiceState {
    pub gate: StageGate,
    pub sessions: Arc<SessionStore>,
    pub backend: &'static str,
    static_dir: PathBuf,
    static_prefix: String,
}

impl ServiceState {
    /// Builds the gate from configuration. Storage connection failures are
    /// returned to the caller and end startup.
    pub async fn bootstrap(config: &ServiceConfig) -> ServiceResult<Self> {
        config.validate().map_err(ServiceError::Config)?;

        let catalog = match &config.content.catalog {
            Some(path) => load_catalog(path)?,
            None => builtin_catalog(&config.stages),
        };
        let storage = Storage::bootstrap(&config.storage, catalog).await?;

        let generator = match &config.passphrase.word_list {
            Some(path) => WordListGenerator::from_file(path)?,
            None => WordListGenerator::bundled(),
        };
        if generator.len() < PASSPHRASE_WORDS {
            return Err(PassphraseError::Exhausted(format!(
                "word list has {} usable words, need at least {PASSPHRASE_WORDS}",
                generator.len()
            ))
            .into());
        }
        let passphrases: Arc<dyn PassphraseGenerator> = Arc::new(generator);

        let content = if config.content.cache {
            ContentResolver::cached(storage.content.clone())
        } else {
            ContentResolver::new(storage.content.clone())
        };

        let gate = StageGate::new(
            storage.users.clone(),
            content,
            passphrases,
            config.stages.clone(),
        )
        .with_passphrase_timeout(config.passphrase.timeout());

        let sessions = SessionStore::new(
            config.session.secret.as_deref(),
            config.session.cookie_name.clone(),
            config.session.idle_timeout(),
            config.server.production,
        )?;

        info!(
            backend = storage.backend,
            production = config.server.production,
            "stage gate ready"
        );

        Ok(Self::from_parts(gate, sessions, storage.backend, &config.server))
    }

    pub fn from_parts(
        gate: StageGate,
        sessions: SessionStore,
        backend: &'static str,
        server: &ServerConfig,
    ) -> Self {
        Self {
            gate,
            sessions: Arc::new(sessions),
            backend,
            static_dir: server.static_dir.clone(),
            static_prefix: server.static_prefix.clone(),
        }
    }

    /// Hands the session back to the store and turns the outcome into a
    /// response.
    fn finish(&self, handle: SessionHandle, outcome: Result<Response, GateError>) -> Response {
        let cookie = self.sessions.commit(handle);
        let mut response = match outcome {
            Ok(response) => response,
            Err(err) => GateFailure::new(err, self.static_prefix.as_str()).into_response(),
        };
        attach_cookie(response.headers_mut(), cookie);
        response
    }
}

pub fn build_router(state: ServiceState) -> Router {
    let plan = state.gate.plan().clone();
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/healthz", get(health))
        .route(&plan.register_endpoint, post(register).get(resolve))
        .route(&plan.challenge_endpoint, post(challenge).get(resolve))
        .route("/", get(resolve))
        .nest_service(&state.static_prefix, assets)
        .fallback(resolve)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RegisterForm {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChallengeForm {
    answer: Option<String>,
}

async fn health(State(state): State<ServiceState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "backend": state.backend,
        "sessions": state.sessions.len(),
    }))
}

/// Unreadable form bodies count as a missing field so they reach the error
/// view like any other input failure.
fn form_field<T>(
    form: Result<Form<T>, FormRejection>,
    field: fn(T) -> Option<String>,
) -> Option<String> {
    match form {
        Ok(Form(form)) => field(form),
        Err(rejection) => {
            debug!(error = %rejection, "unreadable form body");
            None
        }
    }
}

async fn register(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    form: Result<Form<RegisterForm>, FormRejection>,
) -> Response {
    let name = form_field(form, |form| form.name);
    let mut handle = state.sessions.open(&headers);
    let outcome = state
        .gate
        .register_visitor(&mut handle.context, name.as_deref())
        .await
        .map(found);
    state.finish(handle, outcome)
}

async fn challenge(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    form: Result<Form<ChallengeForm>, FormRejection>,
) -> Response {
    let answer = form_field(form, |form| form.answer);
    let mut handle = state.sessions.open(&headers);
    let outcome = state
        .gate
        .advance_on_challenge(&mut handle.context, answer.as_deref())
        .await
        .map(found);
    state.finish(handle, outcome)
}

async fn resolve(State(state): State<ServiceState>, headers: HeaderMap, uri: Uri) -> Response {
    let handle = state.sessions.open(&headers);
    let outcome = state
        .gate
        .resolve_request(&handle.context, uri.path())
        .await
        .map(|resolution| match resolution {
            Resolution::Redirect(redirect) => found(redirect),
            Resolution::Page(page) => Html(views::stage_page(
                &page,
                state.gate.plan(),
                &state.static_prefix,
            ))
            .into_response(),
        });
    state.finish(handle, outcome)
}

fn found(redirect: Redirect) -> Response {
    (StatusCode::FOUND, [(LOCATION, redirect.location)]).into_response()
}
