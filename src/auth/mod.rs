//! Optional username/password gate in front of the queue API.
//!
//! Passwords are stored as bcrypt hashes in the config file. A successful
//! login mints a random session token kept in memory and sent back as a cookie;
//! sessions die with the process.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "jukebox_session";
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// bcrypt work factor for newly generated hashes.
pub const HASH_COST: u32 = 10;

/// bcrypt hash of `password`, the format expected in `password_hash`.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash_password_with_cost(password, HASH_COST)
}

pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password_hash: String,
}

impl Credentials {
    /// The password is checked even when the username is wrong, so both
    /// failures take the same time.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let password_ok = match bcrypt::verify(password, &self.password_hash) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!("Configured password_hash is not a valid bcrypt hash: {}", e);
                false
            }
        };
        username == self.username && password_ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Login is not enabled")]
    Disabled,
    #[error("Username and password required")]
    MissingFields,
    #[error("Invalid credentials")]
    InvalidCredentials,
}

#[derive(Debug)]
struct Session {
    username: String,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct Auth {
    credentials: Option<Credentials>,
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
    secure_cookie: bool,
}

impl Auth {
    /// Everyone is let in.
    pub fn open() -> Self {
        Self::build(None, false)
    }

    /// Queue API requires a session obtained from [`login`](Self::login).
    pub fn required(credentials: Credentials, secure_cookie: bool) -> Self {
        Self::build(Some(credentials), secure_cookie)
    }

    fn build(credentials: Option<Credentials>, secure_cookie: bool) -> Self {
        Self {
            credentials,
            sessions: RwLock::new(HashMap::new()),
            ttl: SESSION_TTL,
            secure_cookie,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn login_required(&self) -> bool {
        self.credentials.is_some()
    }

    /// Check credentials and open a session. Returns the session token.
    ///
    /// bcrypt verification is CPU-bound; async callers run this off the runtime.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let credentials = self.credentials.as_ref().ok_or(AuthError::Disabled)?;
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        if !credentials.matches(username, password) {
            tracing::warn!("Failed login attempt for user \"{}\"", username);
            return Err(AuthError::InvalidCredentials);
        }

        let token = Uuid::new_v4().simple().to_string();
        let now = Instant::now();
        let mut sessions = self.sessions.write().unwrap_or_else(|p| p.into_inner());
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(
            token.clone(),
            Session {
                username: username.to_string(),
                expires_at: now + self.ttl,
            },
        );
        tracing::info!("User logged in: {}", username);
        Ok(token)
    }

    /// Drop the session behind `token`. Returns the user it belonged to, if any.
    pub fn logout(&self, token: &str) -> Option<String> {
        let mut sessions = self.sessions.write().unwrap_or_else(|p| p.into_inner());
        let session = sessions.remove(token)?;
        tracing::info!("User logged out: {}", session.username);
        Some(session.username)
    }

    pub fn session_user(&self, token: &str) -> Option<String> {
        let sessions = self.sessions.read().unwrap_or_else(|p| p.into_inner());
        sessions
            .get(token)
            .filter(|s| s.expires_at > Instant::now())
            .map(|s| s.username.clone())
    }

    /// Whether a request carrying `headers` may use the queue API.
    pub fn allows(&self, headers: &HeaderMap) -> bool {
        !self.login_required() || self.is_authenticated(headers)
    }

    pub fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        session_token(headers).is_some_and(|token| self.session_user(&token).is_some())
    }

    /// `Set-Cookie` value carrying `token`.
    pub fn session_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            token,
            self.ttl.as_secs()
        );
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that clears the session cookie.
    pub fn expired_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
    }
}

/// Session token from the request's `Cookie` header(s).
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
