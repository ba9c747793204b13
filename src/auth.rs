//! Admin Auth Gate: credential check and session registry.
//!
//! Sessions are opaque random tokens held in an in-process TTL registry. The
//! HTTP boundary turns the `admin_token` cookie into an [`AdminIdentity`] and
//! passes it explicitly into every admin-gated service call; core logic never
//! reads ambient request state.

use crate::error::{require, ApiError, ApiResult};
use crate::model::{Admin, AdminId, AdminView, LoginRequest};
use crate::store::Store;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, info};

pub const SESSION_COOKIE: &str = "admin_token";

const TOKEN_ALPHABET: &[u8] = b"23456789abcdefghijkmnpqrstuvwxyz";
const TOKEN_LEN: usize = 32;

/// Authenticated admin identity, produced by the boundary and passed into
/// admin-gated operations.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub admin_id: AdminId,
    pub username: String,
}

#[derive(Debug, Clone)]
struct Session {
    admin_id: AdminId,
    username: String,
    expires_at: DateTime<Utc>,
}

pub struct SessionRegistry {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs as i64),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a fresh session token for an authenticated admin.
    pub fn issue(&self, admin: &Admin) -> String {
        let token = make_session_token();
        let session = Session {
            admin_id: admin.id.clone(),
            username: admin.username.clone(),
            expires_at: Utc::now() + self.ttl,
        };
        let mut sessions = self.sessions.write();
        prune_expired(&mut sessions);
        sessions.insert(token.clone(), session);
        debug!(username = %admin.username, "admin session issued");
        token
    }

    /// Resolve a token to an identity; expired tokens are dropped on sight.
    pub fn verify(&self, token: &str) -> Option<AdminIdentity> {
        let mut sessions = self.sessions.write();
        match sessions.get(token) {
            Some(session) if session.expires_at > Utc::now() => Some(AdminIdentity {
                admin_id: session.admin_id.clone(),
                username: session.username.clone(),
            }),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    pub fn revoke(&self, token: &str) {
        self.sessions.write().remove(token);
    }

    pub fn active_count(&self) -> usize {
        let now = Utc::now();
        self.sessions
            .read()
            .values()
            .filter(|s| s.expires_at > now)
            .count()
    }
}

fn prune_expired(sessions: &mut HashMap<String, Session>) {
    let now = Utc::now();
    sessions.retain(|_, s| s.expires_at > now);
}

fn make_session_token() -> String {
    let mut rng = rand::thread_rng();
    let mut out = String::with_capacity(TOKEN_LEN);
    for _ in 0..TOKEN_LEN {
        let idx = rng.gen_range(0..TOKEN_ALPHABET.len());
        out.push(TOKEN_ALPHABET[idx] as char);
    }
    out
}

/// Hex-encoded SHA-256 digest of a password.
pub fn password_digest(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    let mut out = String::with_capacity(64);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

pub fn verify_password(password: &str, digest: &str) -> bool {
    password_digest(password) == digest
}

/// Authenticate and open a session. Invalid username and invalid password are
/// indistinguishable to the caller.
pub fn login(
    store: &Store,
    sessions: &SessionRegistry,
    request: &LoginRequest,
) -> ApiResult<(String, AdminView)> {
    require("username", &request.username)?;
    require("password", &request.password)?;

    let admin = store.read(|s| s.admin_by_username(&request.username).cloned());
    let admin = match admin {
        Some(admin) if verify_password(&request.password, &admin.password_digest) => admin,
        _ => return Err(ApiError::Unauthorized),
    };

    let token = sessions.issue(&admin);
    info!(username = %admin.username, "admin logged in");
    Ok((
        token,
        AdminView {
            id: admin.id,
            username: admin.username,
        },
    ))
}

/// Look up the full admin record behind a verified identity.
pub fn check(store: &Store, identity: &AdminIdentity) -> ApiResult<AdminView> {
    store
        .read(|s| s.admin_by_id(&identity.admin_id).cloned())
        .map(|admin| AdminView {
            id: admin.id,
            username: admin.username,
        })
        .ok_or(ApiError::Unauthorized)
}

/// Ensure the configured bootstrap admin exists; rotates the stored digest if
/// the configured password changed.
pub fn ensure_admin(store: &Store, username: &str, password: &str) -> anyhow::Result<()> {
    let digest = password_digest(password);
    store
        .mutate(|s| {
            if let Some(existing) = s.admins.values_mut().find(|a| a.username == username) {
                if existing.password_digest != digest {
                    existing.password_digest = digest;
                }
                return Ok(());
            }
            s.insert_admin(Admin {
                id: AdminId::generate(),
                username: username.to_string(),
                password_digest: digest,
                created_at: Utc::now(),
            })
        })
        .map_err(anyhow::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn seeded_store() -> Store {
        let store = Store::in_memory();
        ensure_admin(&store, "admin", "admin123").unwrap();
        store
    }

    #[test]
    fn login_succeeds_with_correct_credentials() {
        let store = seeded_store();
        let sessions = SessionRegistry::new(3600);
        let (token, admin) = login(
            &store,
            &sessions,
            &LoginRequest {
                username: "admin".into(),
                password: "admin123".into(),
            },
        )
        .unwrap();
        assert_eq!(admin.username, "admin");
        let identity = sessions.verify(&token).unwrap();
        assert_eq!(identity.username, "admin");
    }

    #[test]
    fn login_rejects_bad_password_and_unknown_user() {
        let store = seeded_store();
        let sessions = SessionRegistry::new(3600);
        let bad_password = login(
            &store,
            &sessions,
            &LoginRequest {
                username: "admin".into(),
                password: "wrong".into(),
            },
        );
        assert_matches!(bad_password, Err(ApiError::Unauthorized));

        let unknown = login(
            &store,
            &sessions,
            &LoginRequest {
                username: "ghost".into(),
                password: "admin123".into(),
            },
        );
        assert_matches!(unknown, Err(ApiError::Unauthorized));
    }

    #[test]
    fn login_requires_fields() {
        let store = seeded_store();
        let sessions = SessionRegistry::new(3600);
        let result = login(&store, &sessions, &LoginRequest::default());
        assert_matches!(result, Err(ApiError::Validation(_)));
    }

    #[test]
    fn revoked_token_stops_verifying() {
        let store = seeded_store();
        let sessions = SessionRegistry::new(3600);
        let (token, _) = login(
            &store,
            &sessions,
            &LoginRequest {
                username: "admin".into(),
                password: "admin123".into(),
            },
        )
        .unwrap();
        assert!(sessions.verify(&token).is_some());
        sessions.revoke(&token);
        assert!(sessions.verify(&token).is_none());
        assert_eq!(sessions.active_count(), 0);
    }

    #[test]
    fn ensure_admin_is_idempotent_and_rotates_password() {
        let store = seeded_store();
        ensure_admin(&store, "admin", "admin123").unwrap();
        assert_eq!(store.read(|s| s.admins.len()), 1);

        ensure_admin(&store, "admin", "newpass").unwrap();
        let digest = store.read(|s| s.admin_by_username("admin").unwrap().password_digest.clone());
        assert!(verify_password("newpass", &digest));
        assert!(!verify_password("admin123", &digest));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(make_session_token(), make_session_token());
    }
}
