//! Shared bearer-token management.
//!
//! The token is a single-writer, multi-reader cell: batch loops read the
//! latest value immediately before each lookup call, so a refresh performed
//! by the background timer is picked up on the very next record without
//! restarting any batch. Refresh failure keeps the stale token in place and
//! never halts processing.

use crate::clients::auth::{AuthClient, Credentials};
use crate::error::Result;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Owns the current bearer token for the lookup service.
pub struct TokenManager {
    cell: ArcSwapOption<String>,
    auth: AuthClient,
}

impl TokenManager {
    pub fn new(auth: AuthClient) -> Self {
        Self {
            cell: ArcSwapOption::const_empty(),
            auth,
        }
    }

    /// Latest token, if any sign-in has succeeded yet. Lock-free.
    pub fn current(&self) -> Option<Arc<String>> {
        self.cell.load_full()
    }

    pub fn has_token(&self) -> bool {
        self.cell.load().is_some()
    }

    /// Install a token obtained out of band (e.g. an initial sign-in done by
    /// the caller before starting a batch).
    pub fn install(&self, token: String) {
        self.cell.store(Some(Arc::new(token)));
    }

    /// Sign in and swap the shared cell on success.
    ///
    /// On failure the previous token stays in place: lookups keep using it
    /// and any resulting failures degrade into per-record `LookupFailed`
    /// counts rather than halting batches.
    pub async fn refresh(&self, credentials: &Credentials) -> Result<Arc<String>> {
        match self.auth.sign_in(credentials).await {
            Ok(token) => {
                let token = Arc::new(token);
                self.cell.store(Some(token.clone()));
                info!("🔑 Token refreshed");
                Ok(token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed; keeping previous token");
                Err(e)
            }
        }
    }

    /// Spawn the independent refresh timer. The first refresh happens one
    /// full interval after the call; abort the returned handle to stop it.
    pub fn spawn_refresh_task(
        self: &Arc<Self>,
        credentials: Credentials,
        interval: Duration,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // interval fires immediately on the first tick; skip it so the
            // initial sign-in stays under the caller's control.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = manager.refresh(&credentials).await {
                    error!(error = %e, "Scheduled token refresh failed");
                }
            }
        })
    }
}
