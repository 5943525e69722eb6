//! Access gate
//!
//! Decides whether an identity may open a requested feature and, when it may
//! not, where to send it instead. [`GateSession`] wraps the gate for callers
//! whose identity or requested feature changes while a resolution is still
//! running: only the latest evaluation is ever published.

use crate::access_control::matcher;
use crate::access_control::resolver::{PermissionResolver, Resolution};
use crate::access_control::types::{Action, AdminIdentity, AllowedFeatureSet};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Gate state for one (identity, feature) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    /// Resolution in progress; render nothing
    Loading,
    Allowed,
    Denied { redirect: String },
}

impl GateState {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateState::Allowed)
    }
}

/// Route guard over a shared resolver
pub struct AccessGate {
    resolver: Arc<PermissionResolver>,
}

impl AccessGate {
    pub fn new(resolver: Arc<PermissionResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// Where to send an identity holding `allowed`.
    ///
    /// First priority entry the set allows, else the set's first key, else
    /// the default landing. Also used as the post-login redirect.
    pub fn landing(&self, allowed: &AllowedFeatureSet) -> String {
        let policy = self.resolver.policy();
        matcher::first_allowed_feature(
            allowed,
            policy.fallback_priority(),
            policy.default_landing(),
        )
    }

    /// Gate decision for an already resolved identity
    pub fn decide(&self, resolution: &Resolution, path: &str) -> GateState {
        if resolution.is_allowed(path) {
            trace!(path, "Gate open");
            GateState::Allowed
        } else {
            let redirect = self.landing(&resolution.features);
            debug!(path, redirect = %redirect, "Gate closed");
            GateState::Denied { redirect }
        }
    }

    /// Resolve `identity` and decide on `path`
    pub async fn check(&self, identity: &AdminIdentity, path: &str) -> GateState {
        let resolution = self.resolver.resolve(identity).await;
        self.decide(&resolution, path)
    }

    /// Check that `path` is visible and `action` is granted on it
    pub async fn check_action(&self, identity: &AdminIdentity, path: &str, action: Action) -> bool {
        let resolution = self.resolver.resolve(identity).await;
        resolution.is_allowed(path) && resolution.can(path, action)
    }
}

/// One caller's gate, tracking the latest evaluation.
///
/// Starting an evaluation cancels the one in flight. A result computed for
/// a superseded evaluation is dropped, never published.
pub struct GateSession {
    gate: Arc<AccessGate>,
    generation: AtomicU64,
    current: Mutex<CancellationToken>,
    state: watch::Sender<GateState>,
}

impl GateSession {
    pub fn new(gate: Arc<AccessGate>) -> Self {
        let (state, _) = watch::channel(GateState::Loading);
        Self {
            gate,
            generation: AtomicU64::new(0),
            current: Mutex::new(CancellationToken::new()),
            state,
        }
    }

    /// Observe published states
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.subscribe()
    }

    /// Last published state
    pub fn state(&self) -> GateState {
        self.state.borrow().clone()
    }

    /// Evaluate a new (identity, path) pair.
    ///
    /// Returns the published state, or `None` when a later evaluation
    /// superseded this one.
    pub async fn evaluate(&self, identity: &AdminIdentity, path: &str) -> Option<GateState> {
        let (generation, token) = self.begin();

        let state = tokio::select! {
            _ = token.cancelled() => {
                debug!(generation, "Gate evaluation superseded");
                return None;
            }
            state = self.gate.check(identity, path) => state,
        };

        // Checked under the channel lock so a newer Loading is never overwritten
        let published = self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *current = state.clone();
            true
        });

        if published {
            Some(state)
        } else {
            debug!(generation, "Dropping stale gate result");
            None
        }
    }

    /// Cancel the evaluation in flight, if any
    pub fn cancel(&self) {
        self.lock_current().cancel();
    }

    /// Start a new generation, cancelling the previous one.
    ///
    /// Generation, token and the `Loading` publish change together under the
    /// token lock, so the newest generation always owns the live token.
    fn begin(&self) -> (u64, CancellationToken) {
        let mut current = self.lock_current();
        current.cancel();
        *current = CancellationToken::new();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(GateState::Loading);
        (generation, current.clone())
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        // The token is replaced whole, so a poisoned guard is still consistent
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
