// ABOUTME: The auth state machine composing session store, tenant resolver, and selection cache
// ABOUTME: Sole writer of AuthState; serializes resolution passes with a monotonic pass counter
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 ClinicFlow

//! # Auth Orchestrator
//!
//! Composes the session store, tenant resolver, and selection cache into one
//! observable [`AuthState`]. Every session-change event (and the initial
//! boot) runs a resolution pass:
//!
//! 1. mark the state loading,
//! 2. with no session: clear everything and finalize,
//! 3. with a session: resolve the clinic set, reconcile the persisted
//!    selection against it, and commit the whole pass atomically.
//!
//! Passes are serialized at the commit point. Each pass captures a monotonic
//! pass id when it starts; a pass that finds a newer id at commit time is
//! stale and discards its result, including any cache side effects. Observers
//! therefore never see fields from two different passes stitched together,
//! and a sign-out always wins over an in-flight resolution it superseded.
//!
//! The orchestrator never calls a router. Positive navigation (after an
//! explicit clinic selection) is emitted as a [`NavigationIntent`] on a side
//! channel; everything else is passive state consumed by the route guard.

use crate::cache::{SelectionStorage, TenantSelectionCache};
use crate::config::OrchestratorConfig;
use crate::constants::limits;
use crate::errors::{AuthError, AuthResult, ErrorCode};
use crate::guard::RouteGuard;
use crate::models::{AuthState, Session, Tenant, TenantSet};
use crate::session::{SessionEvent, SessionStore};
use crate::tenant::{TenantDirectory, TenantResolver};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Request to navigate the client to a path.
///
/// The core does not own the router; a thin adapter drains these intents and
/// performs the actual navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    /// Target path
    pub path: String,
}

/// User-visible, non-fatal auth notice (transport failure, sign-out warning)
#[derive(Debug, Clone)]
pub struct AuthNotice {
    /// Stable condition code
    pub code: ErrorCode,
    /// Human-readable description
    pub message: String,
}

/// What to do with the persisted selection once a pass commits
enum CacheAction {
    Keep,
    Save(Tenant),
    Clear,
}

struct Inner {
    sessions: Arc<dyn SessionStore>,
    resolver: TenantResolver,
    cache: TenantSelectionCache,
    config: OrchestratorConfig,
    state_tx: watch::Sender<AuthState>,
    pass_counter: AtomicU64,
    commit_lock: Mutex<()>,
    nav_tx: mpsc::UnboundedSender<NavigationIntent>,
    nav_rx: Mutex<Option<mpsc::UnboundedReceiver<NavigationIntent>>>,
    notice_tx: broadcast::Sender<AuthNotice>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

/// The auth core state machine.
///
/// Construct one instance per process, inject the external collaborators,
/// call [`start`](Self::start) once the runtime is up, and observe state via
/// [`subscribe`](Self::subscribe). `start`/`stop` are idempotent.
pub struct AuthOrchestrator {
    inner: Arc<Inner>,
}

impl AuthOrchestrator {
    /// Build an orchestrator over the injected collaborators.
    ///
    /// The initial observable state is bootstrapping (loading, no session)
    /// until the first pass settles in [`start`](Self::start).
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        directory: Arc<dyn TenantDirectory>,
        storage: Arc<dyn SelectionStorage>,
        config: OrchestratorConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(AuthState::bootstrapping());
        let (nav_tx, nav_rx) = mpsc::unbounded_channel();
        let (notice_tx, _) = broadcast::channel(limits::NOTICE_BUFFER);
        let cache = TenantSelectionCache::new(storage, config.storage_key.clone());
        Self {
            inner: Arc::new(Inner {
                sessions,
                resolver: TenantResolver::new(directory),
                cache,
                config,
                state_tx,
                pass_counter: AtomicU64::new(0),
                commit_lock: Mutex::new(()),
                nav_tx,
                nav_rx: Mutex::new(Some(nav_rx)),
                notice_tx,
                listener: Mutex::new(None),
            }),
        }
    }

    /// Observe the auth state. Receivers always see the latest committed
    /// pass; intermediate stale passes are never visible.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state_tx.subscribe()
    }

    /// Snapshot of the current auth state
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner.state_tx.borrow().clone()
    }

    /// Take the navigation intent channel. Yields `Some` exactly once; the
    /// router adapter owns the receiver from then on.
    #[must_use]
    pub fn take_navigation_intents(&self) -> Option<mpsc::UnboundedReceiver<NavigationIntent>> {
        lock_ignore_poison(&self.inner.nav_rx).take()
    }

    /// Subscribe to user-visible auth notices
    #[must_use]
    pub fn subscribe_notices(&self) -> broadcast::Receiver<AuthNotice> {
        self.inner.notice_tx.subscribe()
    }

    /// A route guard bound to this orchestrator's route policy
    #[must_use]
    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(self.inner.config.routes.clone())
    }

    /// Start the machine: subscribe to session events, then run the boot
    /// pass from the provider's current session snapshot.
    ///
    /// Idempotent; a second call while running is a no-op. The subscription
    /// is registered before the snapshot is fetched so no event can fall
    /// between the two.
    pub async fn start(&self) {
        {
            let mut listener = lock_ignore_poison(&self.inner.listener);
            if listener.is_some() {
                tracing::debug!("auth orchestrator already started");
                return;
            }
            let events = self.inner.sessions.subscribe();
            let inner = Arc::clone(&self.inner);
            *listener = Some(tokio::spawn(Inner::listen(inner, events)));
        }

        let pass_id = self.inner.begin_pass();
        match self.inner.sessions.current_session().await {
            Ok(Some(session)) => {
                if self.inner.mark_loading(pass_id, session.clone()) {
                    Inner::resolve_and_commit(Arc::clone(&self.inner), pass_id, session).await;
                }
            }
            Ok(None) => {
                self.inner
                    .commit_if_current(pass_id, AuthState::signed_out(None));
            }
            Err(err) => {
                // A failed snapshot must surface a loading-complete state
                // rather than hang the boot.
                tracing::warn!(error = %err, "could not read session snapshot at boot");
                self.inner.notify(&err);
                self.inner.commit_if_current(
                    pass_id,
                    AuthState::signed_out(Some(ErrorCode::TransportError)),
                );
            }
        }
    }

    /// Stop listening for session events. Idempotent; safe to call on an
    /// orchestrator that was never started.
    pub fn stop(&self) {
        if let Some(handle) = lock_ignore_poison(&self.inner.listener).take() {
            handle.abort();
            tracing::debug!("session event listener stopped");
        }
    }

    /// Explicitly select a clinic from the available set.
    ///
    /// On success the selection is persisted, the state updated, and a
    /// navigation intent to the dashboard emitted: the one positive
    /// navigation side effect the orchestrator owns. Selecting an id outside
    /// the current set fails with [`AuthError::TenantNotAvailable`] and
    /// changes nothing. Re-selecting the current clinic is idempotent.
    pub fn select_tenant(&self, tenant_id: Uuid) -> AuthResult<Tenant> {
        let inner = &self.inner;
        let _guard = lock_ignore_poison(&inner.commit_lock);

        let tenant = inner
            .state_tx
            .borrow()
            .available_tenants
            .get(tenant_id)
            .cloned();
        let Some(tenant) = tenant else {
            tracing::warn!(%tenant_id, "clinic selection rejected: not in available set");
            return Err(AuthError::TenantNotAvailable { tenant_id });
        };

        inner.cache.save(&tenant);
        let adopted = tenant.clone();
        inner.state_tx.send_modify(move |state| {
            state.selected_tenant = Some(adopted);
            state.last_error = None;
        });
        tracing::info!(%tenant_id, clinic = %tenant.display_name, "clinic selected");
        inner.navigate(inner.config.routes.dashboard_path.clone());
        Ok(tenant)
    }

    /// Sign out at the identity provider.
    ///
    /// The state clearing itself is driven by the `SignedOut` event on the
    /// subscription channel; this method only brackets the call with the
    /// loading flag. The flag is always cleared on the way out, so a failed
    /// sign-out never leaves the UI stuck loading, and the failure is
    /// surfaced as a warning notice rather than an error.
    pub async fn logout(&self) {
        self.inner.set_loading(true);
        let result = self.inner.sessions.sign_out().await;
        if let Err(err) = result {
            tracing::warn!(error = %err, "sign-out failed at the identity provider");
            self.inner.notify(&AuthError::LogoutFailure {
                message: err.to_string(),
            });
        }
        self.inner.set_loading(false);
    }
}

impl Drop for AuthOrchestrator {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for AuthOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthOrchestrator")
            .field("state", &*self.inner.state_tx.borrow())
            .finish_non_exhaustive()
    }
}

impl Inner {
    /// Event loop: one pass per session event, in arrival order
    async fn listen(inner: Arc<Self>, mut events: broadcast::Receiver<SessionEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => Self::handle_event(&inner, event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "session events lagged; resyncing from snapshot");
                    Self::resync(&inner).await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("session event channel closed");
                    break;
                }
            }
        }
    }

    /// Start a pass for one event. Never awaits before the pass id is
    /// claimed, so later events always supersede earlier ones.
    fn handle_event(inner: &Arc<Self>, event: SessionEvent) {
        tracing::debug!(kind = ?event.kind, "session event received");
        let pass_id = inner.begin_pass();
        match event.session {
            // Sign-out finalizes synchronously; an in-flight resolution for a
            // previous sign-in becomes stale here and will not commit.
            None => {
                inner.commit_if_current(pass_id, AuthState::signed_out(None));
            }
            Some(session) => {
                if inner.mark_loading(pass_id, session.clone()) {
                    let inner = Arc::clone(inner);
                    tokio::spawn(async move {
                        Self::resolve_and_commit(inner, pass_id, session).await;
                    });
                }
            }
        }
    }

    /// Recover after a lagged subscription by re-reading the snapshot
    async fn resync(inner: &Arc<Self>) {
        let pass_id = inner.begin_pass();
        match inner.sessions.current_session().await {
            Ok(Some(session)) => {
                if inner.mark_loading(pass_id, session.clone()) {
                    Self::resolve_and_commit(Arc::clone(inner), pass_id, session).await;
                }
            }
            Ok(None) => {
                inner.commit_if_current(pass_id, AuthState::signed_out(None));
            }
            Err(err) => {
                tracing::warn!(error = %err, "resync snapshot failed");
                inner.notify(&err);
                inner.commit_if_current(
                    pass_id,
                    AuthState::signed_out(Some(ErrorCode::TransportError)),
                );
            }
        }
    }

    /// Resolve the clinic set for `session` and commit the pass if it is
    /// still current. Cache side effects apply only on commit, so a
    /// superseded pass leaves no trace.
    async fn resolve_and_commit(inner: Arc<Self>, pass_id: u64, session: Session) {
        match inner.resolver.resolve(session.user_id).await {
            Err(err) => {
                tracing::warn!(error = %err, user_id = %session.user_id, "clinic resolution failed");
                inner.notify(&err);
                // Stale clinic data cannot be assumed valid after a fetch
                // failure; resolve to logged-out with the error surfaced.
                inner.commit_if_current(
                    pass_id,
                    AuthState::signed_out(Some(ErrorCode::TransportError)),
                );
            }
            Ok(tenants) if tenants.is_empty() => {
                inner.commit_if_current(
                    pass_id,
                    AuthState {
                        session: Some(session),
                        available_tenants: TenantSet::Empty,
                        selected_tenant: None,
                        is_loading: false,
                        last_error: None,
                    },
                );
            }
            Ok(tenants) => {
                inner.commit_resolved(pass_id, session, tenants);
            }
        }
    }

    /// Commit a non-empty resolved set, reconciling the persisted selection
    /// under the commit lock. Holding the lock across the cache read, the
    /// publish, and the cache write means an explicit selection landing while
    /// this pass was resolving is seen by the reconciliation instead of being
    /// overwritten by it.
    fn commit_resolved(&self, pass_id: u64, session: Session, tenants: Vec<Tenant>) {
        let _guard = lock_ignore_poison(&self.commit_lock);
        if self.pass_counter.load(Ordering::SeqCst) != pass_id {
            tracing::debug!(pass_id, "resolution pass superseded; discarding result");
            return;
        }
        let (selected, cache_action) = self.reconcile_selection(&tenants);
        self.state_tx.send_replace(AuthState {
            session: Some(session),
            available_tenants: TenantSet::Populated(tenants),
            selected_tenant: selected,
            is_loading: false,
            last_error: None,
        });
        match cache_action {
            CacheAction::Keep => {}
            CacheAction::Save(tenant) => self.cache.save(&tenant),
            CacheAction::Clear => self.cache.clear(),
        }
    }

    /// Selection reconciliation against a non-empty resolved set. Runs under
    /// the commit lock.
    ///
    /// Membership is what the cache proves; the adopted record always comes
    /// from the fresh set, so a permission change takes effect this pass
    /// instead of surviving until the next full reload. An orphaned cached
    /// selection is cleared from the cache itself, and the single-clinic rule
    /// is the only auto-select.
    fn reconcile_selection(&self, tenants: &[Tenant]) -> (Option<Tenant>, CacheAction) {
        if let Some(cached) = self.cache.load() {
            if let Some(fresh) = tenants.iter().find(|t| t.id == cached.id) {
                let action = if *fresh == cached {
                    CacheAction::Keep
                } else {
                    CacheAction::Save(fresh.clone())
                };
                return (Some(fresh.clone()), action);
            }
            tracing::debug!(
                cached_id = %cached.id,
                "persisted clinic no longer available; clearing selection"
            );
            if let [sole] = tenants {
                return (Some(sole.clone()), CacheAction::Save(sole.clone()));
            }
            return (None, CacheAction::Clear);
        }

        if let [sole] = tenants {
            return (Some(sole.clone()), CacheAction::Save(sole.clone()));
        }
        (None, CacheAction::Keep)
    }

    /// Claim the next pass id
    fn begin_pass(&self) -> u64 {
        self.pass_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Commit `state` unless a newer pass has started. Returns whether the
    /// commit happened. The lock makes the counter check and the publish
    /// atomic with respect to other committers.
    fn commit_if_current(&self, pass_id: u64, state: AuthState) -> bool {
        let _guard = lock_ignore_poison(&self.commit_lock);
        if self.pass_counter.load(Ordering::SeqCst) != pass_id {
            tracing::debug!(pass_id, "resolution pass superseded; discarding result");
            return false;
        }
        self.state_tx.send_replace(state);
        true
    }

    /// Publish the loading snapshot for a pass that is about to resolve.
    /// Returns `false` without publishing when the pass is already stale, so
    /// a superseded pass never re-raises the loading flag it cannot clear.
    fn mark_loading(&self, pass_id: u64, session: Session) -> bool {
        let _guard = lock_ignore_poison(&self.commit_lock);
        if self.pass_counter.load(Ordering::SeqCst) != pass_id {
            tracing::debug!(pass_id, "pass superseded before resolution started");
            return false;
        }
        self.state_tx.send_modify(move |state| {
            state.session = Some(session);
            state.is_loading = true;
            state.last_error = None;
        });
        true
    }

    /// Toggle only the loading flag (logout bracketing)
    fn set_loading(&self, is_loading: bool) {
        let _guard = lock_ignore_poison(&self.commit_lock);
        self.state_tx.send_modify(|state| state.is_loading = is_loading);
    }

    /// Emit a user-visible notice, if the condition warrants one
    fn notify(&self, err: &AuthError) {
        let code = err.code();
        if !code.is_user_visible() {
            return;
        }
        let notice = AuthNotice {
            code,
            message: err.to_string(),
        };
        // No subscribers is fine; notices are advisory.
        let _ = self.notice_tx.send(notice);
    }

    /// Emit a navigation intent on the side channel
    fn navigate(&self, path: String) {
        tracing::debug!(%path, "navigation intent");
        let _ = self.nav_tx.send(NavigationIntent { path });
    }
}

/// Lock a mutex, recovering the guard if a panicking holder poisoned it
fn lock_ignore_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
