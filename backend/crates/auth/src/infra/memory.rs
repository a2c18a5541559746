//! In-Memory Implementations
//!
//! Process-local test doubles for Redis, Postgres and the mailer. Expiry is
//! measured on `tokio::time::Instant`, so paused-clock tests can advance past
//! a TTL. Expired keys are dropped on read and swept on every write.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use platform::rate_limit::{RateLimitConfig, RateLimitResult, RateLimitStore};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::entity::{session::Session, user::User};
use crate::domain::mailer::CodeMailer;
use crate::domain::repository::{SessionStore, UserRepository, otp_key, session_key};
use crate::domain::value_object::{
    email::Email, otp_code::OtpCode, user_id::UserId, user_name::UserName,
};
use crate::error::{AuthError, AuthResult};

// ============================================================================
// Session Store
// ============================================================================

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn remaining(&self, now: Instant) -> Option<Duration> {
        (self.expires_at > now).then(|| self.expires_at - now)
    }
}

/// Key-value store with per-key TTL, same key scheme as Redis
#[derive(Default)]
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<String, Entry>>,
    operations: AtomicUsize,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store calls made so far
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Live (unexpired) keys
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        entries.values().filter(|e| e.remaining(now).is_some()).count()
    }

    /// Keys held in the map, expired or not
    pub async fn stored_keys(&self) -> usize {
        self.entries.lock().await.len()
    }

    async fn set(&self, key: String, value: String, ttl: Duration) {
        self.operations.fetch_add(1, Ordering::SeqCst);
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        sweep(&mut entries, now);
        entries.insert(
            key,
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.remaining(now).is_some() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn ttl(&self, key: &str) -> Option<Duration> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        let now = Instant::now();
        let entries = self.entries.lock().await;
        entries.get(key).and_then(|e| e.remaining(now))
    }

    async fn del(&self, key: &str) {
        self.operations.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().await.remove(key);
    }
}

fn sweep(entries: &mut HashMap<String, Entry>, now: Instant) {
    entries.retain(|_, entry| entry.remaining(now).is_some());
}

impl SessionStore for InMemorySessionStore {
    async fn put_session(&self, session: &Session, ttl: Duration) -> AuthResult<()> {
        let value = serde_json::to_string(session)?;
        self.set(session_key(&session.user_id), value, ttl).await;
        Ok(())
    }

    async fn get_session(&self, user_id: &UserId) -> AuthResult<Session> {
        let value = self
            .get(&session_key(user_id))
            .await
            .ok_or(AuthError::SessionNotFound)?;
        Ok(serde_json::from_str(&value)?)
    }

    async fn renew_session(&self, session: &Session) -> AuthResult<()> {
        let key = session_key(&session.user_id);
        let remaining = self.ttl(&key).await.ok_or(AuthError::SessionNotFound)?;
        let value = serde_json::to_string(session)?;

        self.operations.fetch_add(1, Ordering::SeqCst);
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        // SET ... XX: only overwrite a live key
        match entries.get_mut(&key) {
            Some(entry) if entry.remaining(now).is_some() => {
                entry.value = value;
                entry.expires_at = now + remaining;
                Ok(())
            }
            _ => Err(AuthError::SessionNotFound),
        }
    }

    async fn session_ttl(&self, user_id: &UserId) -> AuthResult<Option<Duration>> {
        Ok(self.ttl(&session_key(user_id)).await)
    }

    async fn delete_session(&self, user_id: &UserId) -> AuthResult<()> {
        self.del(&session_key(user_id)).await;
        Ok(())
    }

    async fn put_otp(&self, email: &Email, code: &OtpCode, ttl: Duration) -> AuthResult<()> {
        self.set(otp_key(email), code.as_str().to_string(), ttl).await;
        Ok(())
    }

    async fn get_otp(&self, email: &Email) -> AuthResult<OtpCode> {
        let value = self
            .get(&otp_key(email))
            .await
            .ok_or(AuthError::OtpNotFound)?;
        OtpCode::parse(value)
    }

    async fn delete_otp(&self, email: &Email) -> AuthResult<()> {
        self.del(&otp_key(email)).await;
        Ok(())
    }
}

impl RateLimitStore for InMemorySessionStore {
    type Error = AuthError;

    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> AuthResult<RateLimitResult> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        sweep(&mut entries, now);

        // INCR, with PEXPIRE on the first hit of a window
        let (count, expires_at) = match entries.get(key) {
            Some(entry) => (entry.value.parse::<u64>().unwrap_or(0) + 1, entry.expires_at),
            None => (1, now + config.window),
        };
        entries.insert(
            key.to_string(),
            Entry {
                value: count.to_string(),
                expires_at,
            },
        );

        Ok(config.evaluate(count, expires_at - now))
    }
}

// ============================================================================
// User Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.lock().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::UserAlreadyExists);
        }
        users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.users.lock().await.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| &u.email == email).cloned())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.lock().await;
        match users.get_mut(&user.user_id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AuthError::UserNotFound),
        }
    }
}

// ============================================================================
// Mailer
// ============================================================================

/// Records every code it is asked to send
#[derive(Default)]
pub struct InMemoryMailer {
    sent: Mutex<Vec<(Email, OtpCode)>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent code sent to `email`
    pub async fn last_code_for(&self, email: &Email) -> Option<OtpCode> {
        let sent = self.sent.lock().await;
        sent.iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl CodeMailer for InMemoryMailer {
    async fn send_confirmation_code(
        &self,
        email: &Email,
        _name: &UserName,
        code: &OtpCode,
    ) -> AuthResult<()> {
        self.sent.lock().await.push((email.clone(), code.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures;

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let store = InMemorySessionStore::new();
        let email = Email::new("alice@example.com").unwrap();
        let code = OtpCode::parse("123456").unwrap();

        store
            .put_otp(&email, &code, Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get_otp(&email).await.unwrap(), code);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(matches!(
            store.get_otp(&email).await,
            Err(AuthError::OtpNotFound)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_renew_keeps_ttl_and_never_resurrects() {
        let store = InMemorySessionStore::new();
        let user = fixtures::user("alice@example.com", "correct-password");
        let session = Session::for_user(&user, "t1".to_string());

        store
            .put_session(&session, Duration::from_secs(100))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(40)).await;

        store.renew_session(&session).await.unwrap();
        assert_eq!(
            store.session_ttl(&user.user_id).await.unwrap(),
            Some(Duration::from_secs(60))
        );

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(matches!(
            store.renew_session(&session).await,
            Err(AuthError::SessionNotFound)
        ));
        assert_eq!(store.session_ttl(&user.user_id).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_sweep_expired_keys() {
        let store = InMemorySessionStore::new();
        let alice = Email::new("alice@example.com").unwrap();
        let bob = Email::new("bob@example.com").unwrap();
        let code = OtpCode::parse("123456").unwrap();

        store
            .put_otp(&alice, &code, Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.stored_keys().await, 1);

        // never read again, still gone after the next write
        store
            .put_otp(&bob, &code, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.stored_keys().await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_counts_within_window() {
        let store = InMemorySessionStore::new();
        let config = RateLimitConfig::new(2, 60);

        let first = store.check_and_increment("k", &config).await.unwrap();
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);

        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(store.check_and_increment("k", &config).await.unwrap().allowed);

        let third = store.check_and_increment("k", &config).await.unwrap();
        assert!(!third.allowed);
        assert_eq!(third.reset_after, Duration::from_secs(40));

        tokio::time::advance(Duration::from_secs(40)).await;
        let reopened = store.check_and_increment("k", &config).await.unwrap();
        assert!(reopened.allowed);
        assert_eq!(reopened.remaining, 1);
    }

    #[tokio::test]
    async fn test_operation_counter() {
        let store = InMemorySessionStore::new();
        assert_eq!(store.operations(), 0);
        let _ = store.get_session(&UserId::new()).await;
        assert_eq!(store.operations(), 1);
    }

    #[tokio::test]
    async fn test_user_repository_unique_email() {
        let repo = InMemoryUserRepository::new();
        let user = fixtures::user("alice@example.com", "correct-password");
        repo.create(&user).await.unwrap();

        let duplicate = fixtures::user("alice@example.com", "other-password");
        assert!(matches!(
            repo.create(&duplicate).await,
            Err(AuthError::UserAlreadyExists)
        ));
        assert!(repo.find_by_email(&user.email).await.unwrap().is_some());
    }
}
