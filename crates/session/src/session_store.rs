//! SessionStore - The live session and its four mutation entry points
//!
//! The state is a `watch` channel holding one immutable snapshot; every
//! mutation replaces it whole, so readers never observe a half-written
//! session. Mutations (bootstrap, sign-in, sign-out, refresh) are serialized
//! by an async mutex held for the duration of the remote call.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use shared::{
    Capability, CapabilitySet, Credentials, Identity, Logger, NetworkError, Result, SessionConfig,
};
use tokio::sync::{watch, Mutex};

use crate::service::IdentityService;

/// A consistent view of the session at one instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    identity: Option<Arc<Identity>>,
    is_bootstrapping: bool,
}

impl SessionSnapshot {
    /// No identity, not bootstrapping
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolution in flight; `cached` is whatever identity was held before
    pub fn bootstrapping(cached: Option<Identity>) -> Self {
        Self {
            identity: cached.map(Arc::new),
            is_bootstrapping: true,
        }
    }

    pub fn resolved(identity: Option<Identity>) -> Self {
        Self {
            identity: identity.map(Arc::new),
            is_bootstrapping: false,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_deref()
    }

    pub fn is_bootstrapping(&self) -> bool {
        self.is_bootstrapping
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Derived from the identity's role; empty without an identity
    pub fn granted_capabilities(&self) -> CapabilitySet {
        self.identity()
            .map(|i| i.capabilities().clone())
            .unwrap_or_default()
    }

    /// False whenever no identity is present, bootstrapping or not
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.identity()
            .map(|i| i.has_capability(capability))
            .unwrap_or(false)
    }
}

/// Owned session state, shared by reference with the guard and the menu
pub struct SessionStore {
    service: Arc<dyn IdentityService>,
    state: watch::Sender<SessionSnapshot>,
    /// Serializes the four mutating operations
    ops: Mutex<()>,
    request_timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl SessionStore {
    /// Create an empty session
    pub fn new(
        service: Arc<dyn IdentityService>,
        config: &SessionConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::empty());
        Self {
            service,
            state,
            ops: Mutex::new(()),
            request_timeout: config.request_timeout(),
            logger,
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every session change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.state.borrow().has_capability(capability)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    fn replace(&self, snapshot: SessionSnapshot) {
        self.state.send_replace(snapshot);
    }

    async fn call<T, F>(&self, operation: &str, limit: Duration, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(NetworkError::timed_out(operation, limit).into()),
        }
    }

    fn identity_meta(identity: &Identity) -> HashMap<String, String> {
        let mut meta = HashMap::new();
        meta.insert("identity".to_string(), identity.id.to_string());
        meta.insert("role".to_string(), identity.role.id.clone());
        meta
    }

    /// Resolve a previously established identity.
    ///
    /// Any failure degrades to "no identity"; it never leaves the session
    /// bootstrapping.
    pub async fn bootstrap(&self) -> SessionSnapshot {
        let _serial = self.ops.lock().await;

        let cached = self.state.borrow().identity().cloned();
        self.replace(SessionSnapshot::bootstrapping(cached));

        let resolved = match self
            .call(
                "current_identity",
                self.request_timeout,
                self.service.current_identity(),
            )
            .await
        {
            Ok(identity) => identity,
            Err(e) => {
                self.logger
                    .warn(&format!("Bootstrap failed, continuing signed out: {}", e), None);
                None
            }
        };

        match &resolved {
            Some(identity) => self.logger.info(
                &format!("Session restored for '{}'", identity.display_name),
                Some(&Self::identity_meta(identity)),
            ),
            None => self.logger.debug("No session to restore", None),
        }

        let snapshot = SessionSnapshot::resolved(resolved);
        self.replace(snapshot.clone());
        snapshot
    }

    /// Sign in with the configured request timeout
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Identity> {
        self.sign_in_within(credentials, self.request_timeout).await
    }

    /// Sign in, failing with `NetworkError` if the service does not answer within `limit`.
    /// A failed attempt leaves the session untouched.
    pub async fn sign_in_within(&self, credentials: &Credentials, limit: Duration) -> Result<Identity> {
        let _serial = self.ops.lock().await;

        match self
            .call("sign_in", limit, self.service.sign_in(credentials))
            .await
        {
            Ok(identity) => {
                self.logger.info(
                    &format!("Signed in as '{}'", identity.display_name),
                    Some(&Self::identity_meta(&identity)),
                );
                self.replace(SessionSnapshot::resolved(Some(identity.clone())));
                Ok(identity)
            }
            Err(e) => {
                self.logger
                    .warn(&format!("Sign-in failed for '{}': {}", credentials.username, e), None);
                Err(e)
            }
        }
    }

    /// Clear the session. Idempotent; a failing remote sign-out is only logged.
    pub async fn sign_out(&self) {
        let _serial = self.ops.lock().await;

        let current = self.state.borrow().identity().cloned();
        if let Some(identity) = current {
            if let Err(e) = self
                .call("sign_out", self.request_timeout, self.service.sign_out())
                .await
            {
                self.logger
                    .warn(&format!("Remote sign-out failed, clearing locally: {}", e), None);
            }
            self.logger.info(
                &format!("Signed out '{}'", identity.display_name),
                Some(&Self::identity_meta(&identity)),
            );
        }

        self.replace(SessionSnapshot::empty());
    }

    /// Refresh with the configured request timeout
    pub async fn refresh_identity(&self) -> Result<Option<Identity>> {
        self.refresh_identity_within(self.request_timeout).await
    }

    /// Re-fetch the signed-in identity's role and capabilities.
    ///
    /// Returns `Ok(None)` when nobody is signed in. On failure the previous
    /// capability set is kept and the error returned for a retry.
    pub async fn refresh_identity_within(&self, limit: Duration) -> Result<Option<Identity>> {
        let _serial = self.ops.lock().await;

        let current = match self.state.borrow().identity().cloned() {
            Some(identity) => identity,
            None => return Ok(None),
        };

        match self
            .call("refresh_identity", limit, self.service.identity(&current.id))
            .await
        {
            Ok(fresh) => {
                if fresh.capabilities() != current.capabilities() {
                    self.logger.info(
                        &format!(
                            "Capabilities changed for '{}': {} -> {}",
                            fresh.display_name,
                            current.capabilities(),
                            fresh.capabilities()
                        ),
                        Some(&Self::identity_meta(&fresh)),
                    );
                }
                self.replace(SessionSnapshot::resolved(Some(fresh.clone())));
                Ok(Some(fresh))
            }
            Err(e) => {
                self.logger.warn(
                    &format!("Refresh failed, keeping current capabilities: {}", e),
                    Some(&Self::identity_meta(&current)),
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryIdentityService;
    use shared::{NullLogger, Role};

    fn create_service() -> Arc<InMemoryIdentityService> {
        let service = InMemoryIdentityService::new();
        service
            .register_role(
                Role::new("reception", "Reception")
                    .with_capabilities([Capability::OwnersRead, Capability::AnimalsRead]),
            )
            .unwrap();
        service
            .add_account("ana", "secret", "Ana Torres", "reception")
            .unwrap();
        Arc::new(service)
    }

    fn create_store(service: Arc<InMemoryIdentityService>) -> Arc<SessionStore> {
        Arc::new(SessionStore::new(
            service,
            &SessionConfig::default(),
            Arc::new(NullLogger),
        ))
    }

    fn ana() -> Credentials {
        Credentials::new("ana", "secret")
    }

    // ============== Snapshot Tests ==============

    #[test]
    fn test_snapshot_without_identity_grants_nothing() {
        let snapshot = SessionSnapshot::bootstrapping(None);
        assert!(snapshot.is_bootstrapping());
        assert!(!snapshot.is_authenticated());
        assert!(!snapshot.has_capability(Capability::OwnersRead));
        assert!(snapshot.granted_capabilities().is_empty());
    }

    #[tokio::test]
    async fn test_new_store_is_empty() {
        let store = create_store(create_service());
        let snapshot = store.snapshot();

        assert!(!snapshot.is_authenticated());
        assert!(!snapshot.is_bootstrapping());
    }

    // ============== Bootstrap Tests ==============

    #[tokio::test]
    async fn test_bootstrap_without_token_resolves_signed_out() {
        let store = create_store(create_service());

        let snapshot = store.bootstrap().await;
        assert!(!snapshot.is_bootstrapping());
        assert!(!snapshot.is_authenticated());
    }

    #[tokio::test]
    async fn test_bootstrap_restores_established_session() {
        let service = create_service();
        service.sign_in(&ana()).await.unwrap();

        let store = create_store(service);
        let snapshot = store.bootstrap().await;

        assert_eq!(snapshot.identity().unwrap().display_name, "Ana Torres");
        assert!(store.has_capability(Capability::OwnersRead));
    }

    #[tokio::test]
    async fn test_bootstrap_failure_degrades_to_no_identity() {
        let service = create_service();
        service.sign_in(&ana()).await.unwrap();
        service.set_offline(true);

        let store = create_store(service);
        let snapshot = store.bootstrap().await;

        assert!(!snapshot.is_bootstrapping());
        assert!(!snapshot.is_authenticated());
    }

    #[tokio::test]
    async fn test_bootstrapping_flag_visible_while_in_flight() {
        let service = create_service();
        service.set_latency(Duration::from_millis(100));
        let store = create_store(service);
        let mut rx = store.subscribe();

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.bootstrap().await })
        };

        rx.wait_for(|s| s.is_bootstrapping()).await.unwrap();
        assert!(store.snapshot().is_bootstrapping());

        let resolved = task.await.unwrap();
        assert!(!resolved.is_bootstrapping());
        assert!(!store.snapshot().is_bootstrapping());
    }

    // ============== Sign-in Tests ==============

    #[tokio::test]
    async fn test_sign_in_updates_session_immediately() {
        let store = create_store(create_service());
        let identity = store.sign_in(&ana()).await.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.identity(), Some(&identity));
        assert!(snapshot.has_capability(Capability::AnimalsRead));
        assert!(!snapshot.has_capability(Capability::UsersManage));
    }

    #[tokio::test]
    async fn test_sign_in_bad_credentials() {
        let store = create_store(create_service());
        let err = store
            .sign_in(&Credentials::new("ana", "nope"))
            .await
            .unwrap_err();

        assert!(err.is_authentication());
        assert!(!store.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_in_network_failure_is_retryable() {
        let service = create_service();
        service.set_offline(true);
        let store = create_store(service.clone());

        let err = store.sign_in(&ana()).await.unwrap_err();
        assert!(err.is_retryable());

        service.set_offline(false);
        assert!(store.sign_in(&ana()).await.is_ok());
    }

    #[tokio::test]
    async fn test_sign_in_times_out() {
        let service = create_service();
        service.set_latency(Duration::from_millis(200));
        let store = create_store(service);

        let err = store
            .sign_in_within(&ana(), Duration::from_millis(10))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert!(err.to_string().contains("timed out"));
        assert!(!store.snapshot().is_authenticated());
    }

    // ============== Sign-out Tests ==============

    #[tokio::test]
    async fn test_sign_out_clears_capabilities() {
        let store = create_store(create_service());
        store.sign_in(&ana()).await.unwrap();

        let granted: Vec<Capability> = Capability::ALL
            .into_iter()
            .filter(|c| store.has_capability(*c))
            .collect();
        assert!(!granted.is_empty());

        store.sign_out().await;

        for capability in granted {
            assert!(!store.has_capability(capability));
        }
        assert!(!store.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_out_is_idempotent() {
        let store = create_store(create_service());
        store.sign_out().await;
        store.sign_out().await;
        assert_eq!(store.snapshot(), SessionSnapshot::empty());
    }

    #[tokio::test]
    async fn test_sign_out_clears_even_when_offline() {
        let service = create_service();
        let store = create_store(service.clone());
        store.sign_in(&ana()).await.unwrap();

        service.set_offline(true);
        store.sign_out().await;

        assert!(!store.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_out_racing_sign_in_ends_consistent() {
        let service = create_service();
        service.set_latency(Duration::from_millis(30));
        let store = create_store(service);

        let sign_in = {
            let store = store.clone();
            tokio::spawn(async move { store.sign_in(&ana()).await })
        };
        tokio::task::yield_now().await;
        store.sign_out().await;
        let _ = sign_in.await.unwrap();

        // Whichever ran last, identity and capabilities agree
        let snapshot = store.snapshot();
        assert_eq!(
            snapshot.is_authenticated(),
            !snapshot.granted_capabilities().is_empty()
        );
        assert!(!snapshot.is_bootstrapping());
    }

    // ============== Refresh Tests ==============

    #[tokio::test]
    async fn test_refresh_picks_up_role_change() {
        let service = create_service();
        let store = create_store(service.clone());
        store.sign_in(&ana()).await.unwrap();

        service
            .set_role_capabilities("reception", CapabilitySet::from([Capability::CashierRead]))
            .unwrap();
        assert!(store.has_capability(Capability::OwnersRead));

        let fresh = store.refresh_identity().await.unwrap().unwrap();
        assert!(fresh.has_capability(Capability::CashierRead));
        assert!(store.has_capability(Capability::CashierRead));
        assert!(!store.has_capability(Capability::OwnersRead));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_capabilities() {
        let service = create_service();
        let store = create_store(service.clone());
        store.sign_in(&ana()).await.unwrap();
        let before = store.snapshot();

        service
            .set_role_capabilities("reception", CapabilitySet::new())
            .unwrap();
        service.set_offline(true);

        let err = store.refresh_identity().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.snapshot(), before);
        assert!(store.has_capability(Capability::OwnersRead));
    }

    #[tokio::test]
    async fn test_refresh_timeout_keeps_capabilities() {
        let service = create_service();
        let store = create_store(service.clone());
        store.sign_in(&ana()).await.unwrap();
        let before = store.snapshot();

        service.set_latency(Duration::from_millis(200));
        let err = store
            .refresh_identity_within(Duration::from_millis(10))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_reads_during_refresh_see_previous_snapshot() {
        let service = create_service();
        let store = create_store(service.clone());
        store.sign_in(&ana()).await.unwrap();

        service
            .set_role_capabilities("reception", CapabilitySet::from([Capability::CashierRead]))
            .unwrap();
        service.set_latency(Duration::from_millis(100));

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh_identity().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mid = store.snapshot();
        assert!(!task.is_finished());
        assert!(!mid.is_bootstrapping());
        assert!(mid.has_capability(Capability::OwnersRead));
        assert!(!mid.has_capability(Capability::CashierRead));

        let fresh = task.await.unwrap().unwrap().unwrap();
        assert!(fresh.has_capability(Capability::CashierRead));
        assert!(store.has_capability(Capability::CashierRead));
        assert!(!store.has_capability(Capability::OwnersRead));
    }

    #[tokio::test]
    async fn test_refresh_without_identity_is_noop() {
        let store = create_store(create_service());
        assert!(store.refresh_identity().await.unwrap().is_none());
        assert!(!store.snapshot().is_authenticated());
    }

    // ============== Observation Tests ==============

    #[tokio::test]
    async fn test_subscribers_see_whole_state_changes() {
        let store = create_store(create_service());
        let mut rx = store.subscribe();

        store.sign_in(&ana()).await.unwrap();
        rx.changed().await.unwrap();
        let seen = rx.borrow_and_update().clone();

        assert!(seen.is_authenticated());
        assert!(seen.has_capability(Capability::OwnersRead));
    }
}
