//! Server-side session table addressed by an HMAC-signed cookie.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use stagegate_core::SessionContext;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Clone)]
struct SessionEntry {
    context: SessionContext,
    touched_at: Instant,
}

/// A session checked out for the duration of one request.
#[derive(Debug)]
pub struct SessionHandle {
    token: String,
    issued: bool,
    opened: SessionContext,
    pub context: SessionContext,
}

/// Browser-session store.
///
/// The cookie carries only `token.signature`; the context lives here. Each
/// request works on its own copy. Only a copy that differs from what was
/// opened is written back, so read-only requests never overwrite a
/// concurrent transition. Two concurrent transitions are last-write-wins.
pub struct SessionStore {
    entries: DashMap<String, SessionEntry>,
    mac: HmacSha256,
    cookie_name: String,
    idle_timeout: Duration,
    secure: bool,
}

impl SessionStore {
    pub fn new(
        secret: Option<&str>,
        cookie_name: impl Into<String>,
        idle_timeout: Duration,
        secure: bool,
    ) -> Result<Self, SessionError> {
        let key = match secret {
            Some(secret) if !secret.is_empty() => secret.as_bytes().to_vec(),
            _ => {
                debug!("no session secret configured, generating an ephemeral key");
                let mut key = vec![0u8; 32];
                rand::thread_rng().fill_bytes(&mut key);
                key
            }
        };
        let mac = <HmacSha256 as Mac>::new_from_slice(&key)
            .map_err(|e| SessionError::InvalidKey(e.to_string()))?;
        Ok(Self {
            entries: DashMap::new(),
            mac,
            cookie_name: cookie_name.into(),
            idle_timeout,
            secure,
        })
    }

    /// Checks out the session named by the request cookie, or starts a new
    /// empty one when the cookie is absent, forged or expired.
    pub fn open(&self, headers: &HeaderMap) -> SessionHandle {
        if let Some(token) = self.cookie_token(headers) {
            let existing = self
                .entries
                .get(&token)
                .map(|entry| (entry.context.clone(), entry.touched_at));
            match existing {
                Some((context, touched_at)) if touched_at.elapsed() < self.idle_timeout => {
                    return SessionHandle {
                        token,
                        issued: false,
                        opened: context.clone(),
                        context,
                    };
                }
                Some(_) => {
                    debug!("session expired");
                    self.entries.remove(&token);
                }
                None => {}
            }
        }

        SessionHandle {
            token: Uuid::new_v4().simple().to_string(),
            issued: true,
            opened: SessionContext::default(),
            context: SessionContext::default(),
        }
    }

    /// Ends the request's use of the session. Returns a `Set-Cookie` value
    /// when a new session was stored.
    ///
    /// An unchanged context only refreshes the idle timer. A new session that
    /// is still empty is dropped and gets no cookie.
    pub fn commit(&self, handle: SessionHandle) -> Option<HeaderValue> {
        if handle.context == handle.opened {
            if !handle.issued {
                if let Some(mut entry) = self.entries.get_mut(&handle.token) {
                    entry.touched_at = Instant::now();
                }
            }
            return None;
        }

        let cookie = handle.issued.then(|| self.cookie_header(&handle.token)).flatten();
        self.entries.insert(
            handle.token,
            SessionEntry {
                context: handle.context,
                touched_at: Instant::now(),
            },
        );
        cookie
    }

    /// Drops idle sessions. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.touched_at.elapsed() < self.idle_timeout);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sign(&self, token: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn verify(&self, value: &str) -> Option<String> {
        let (token, signature) = value.split_once('.')?;
        let signature = hex::decode(signature).ok()?;
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(token.to_string())
    }

    fn cookie_token(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| *name == self.cookie_name)
            .find_map(|(_, value)| {
                let token = self.verify(value);
                if token.is_none() {
                    debug!("rejected session cookie with a bad signature");
                }
                token
            })
    }

    fn cookie_header(&self, token: &str) -> Option<HeaderValue> {
        let mut cookie = format!(
            "{}={}.{}; Path=/; HttpOnly; SameSite=Lax",
            self.cookie_name,
            token,
            self.sign(token)
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }
}

/// Appends the session cookie, if any, to a response header map.
pub fn attach_cookie(headers: &mut HeaderMap, cookie: Option<HeaderValue>) {
    if let Some(cookie) = cookie {
        headers.append(SET_COOKIE, cookie);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagegate_core::VisitorId;

    fn store() -> SessionStore {
        SessionStore::new(Some("test-secret"), "gate", Duration::from_secs(60), false).unwrap()
    }

    fn cookie_request(cookie: &HeaderValue) -> HeaderMap {
        let pair = cookie.to_str().unwrap().split(';').next().unwrap().to_string();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&pair).unwrap());
        headers
    }

    /// Stores a registered-looking session and returns its cookie.
    fn registered(store: &SessionStore, stage: &str) -> HeaderValue {
        let mut handle = store.open(&HeaderMap::new());
        handle.context.id = Some(VisitorId::generate());
        handle.context.name = Some("Ada".to_string());
        handle.context.stage = Some(stage.to_string());
        store.commit(handle).unwrap()
    }

    #[test]
    fn new_session_round_trips_through_cookie() {
        let store = store();
        let cookie = registered(&store, "/s1");
        let text = cookie.to_str().unwrap();
        assert!(text.starts_with("gate="));
        assert!(text.contains("HttpOnly"));
        assert!(!text.contains("Secure"));
        assert!(!text.contains("Max-Age"));

        let reopened = store.open(&cookie_request(&cookie));
        assert!(!reopened.issued);
        assert_eq!(reopened.context.name.as_deref(), Some("Ada"));

        // Existing sessions do not re-issue the cookie.
        assert!(store.commit(reopened).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn empty_new_sessions_are_not_stored() {
        let store = store();
        for _ in 0..10 {
            assert!(store.commit(store.open(&HeaderMap::new())).is_none());
        }
        assert!(store.is_empty());
    }

    #[test]
    fn unchanged_copy_does_not_overwrite_transition() {
        let store = store();
        let cookie = registered(&store, "/s1");
        let headers = cookie_request(&cookie);

        let mut advancing = store.open(&headers);
        let reading = store.open(&headers);

        advancing.context.stage = Some("/s2".to_string());
        assert!(store.commit(advancing).is_none());
        assert!(store.commit(reading).is_none());

        let reopened = store.open(&headers);
        assert_eq!(reopened.context.stage.as_deref(), Some("/s2"));
    }

    #[test]
    fn concurrent_transitions_are_last_write_wins() {
        let store = store();
        let cookie = registered(&store, "/s1");
        let headers = cookie_request(&cookie);

        let mut first = store.open(&headers);
        let mut second = store.open(&headers);
        first.context.stage = Some("/s2".to_string());
        second.context.noaccept = true;
        store.commit(first);
        store.commit(second);

        let reopened = store.open(&headers);
        assert!(reopened.context.noaccept);
        assert_eq!(reopened.context.stage.as_deref(), Some("/s1"));
    }

    #[test]
    fn forged_signature_starts_fresh_session() {
        let store = store();
        let cookie = registered(&store, "/s1");
        let text = cookie.to_str().unwrap();
        let token = text
            .trim_start_matches("gate=")
            .split('.')
            .next()
            .unwrap()
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("gate={token}.{}", "00".repeat(32))).unwrap(),
        );
        let handle = store.open(&headers);
        assert!(handle.issued);
        assert_ne!(handle.token, token);
        assert!(handle.context.id.is_none());
    }

    #[test]
    fn cookie_from_other_key_is_rejected() {
        let issuer = SessionStore::new(Some("one"), "gate", Duration::from_secs(60), false).unwrap();
        let verifier =
            SessionStore::new(Some("two"), "gate", Duration::from_secs(60), false).unwrap();
        let cookie = registered(&issuer, "/s1");
        assert!(verifier.open(&cookie_request(&cookie)).issued);
    }

    #[test]
    fn expired_sessions_are_dropped() {
        let store = SessionStore::new(Some("k"), "gate", Duration::ZERO, true).unwrap();
        let cookie = registered(&store, "/s1");
        assert!(cookie.to_str().unwrap().ends_with("; Secure"));

        assert!(store.open(&cookie_request(&cookie)).issued);
        assert!(store.is_empty());

        registered(&store, "/s1");
        assert_eq!(store.prune(), 1);
    }

    #[test]
    fn other_cookies_are_ignored() {
        let store = store();
        let cookie = registered(&store, "/s1");
        let pair = cookie.to_str().unwrap().split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {pair}; lang=en")).unwrap(),
        );
        assert!(!store.open(&headers).issued);
    }
}
