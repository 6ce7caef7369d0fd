//! Single-flight credential refresh around outbound API calls.
//!
//! The first call to hit a 401 becomes the leader and performs the one
//! refresh for that expiry episode. Calls that hit a 401 while it runs park in
//! a FIFO queue and are released in arrival order: waiter `n + 1` is only
//! handed its credential once waiter `n` has dispatched its replay. Every call
//! is replayed at most once.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::Poll;
use std::time::{Duration, Instant};

use http::StatusCode;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::{ApiError, IdentityError};
use crate::identity::{IdentityProvider, RefreshResponse};
use crate::metrics::{Metrics, MetricsRecorder};
use crate::redirect::{Redirect, RedirectSignal};
use crate::store::CredentialStore;

/// What a parked caller receives when the refresh settles.
struct Release {
    outcome: Result<String, String>,
    /// Dropped or fired once the waiter has dispatched its replay.
    started: oneshot::Sender<()>,
}

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    queue: VecDeque<oneshot::Sender<Release>>,
}

/// How a call that got a 401 proceeds.
enum Recovery {
    /// A refresh already landed after this call was sent; replay with the current credential.
    Replay(String),
    Wait(oneshot::Receiver<Release>),
    Lead { generation: u64 },
}

/// Held by the leader while its refresh runs. If the leader is dropped
/// before the episode is settled, the episode ends here: the flag drops and
/// every parked caller fails instead of waiting for a refresh that will never
/// report back.
struct Episode<'a> {
    coordinator: &'a RefreshCoordinator,
    armed: bool,
}

impl Episode<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for Episode<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("Refresh leader went away mid-refresh; failing queued requests");
        self.coordinator.metrics.record_refresh("cancelled");
        let waiters = {
            let mut state = self.coordinator.lock();
            state.refreshing = false;
            std::mem::take(&mut state.queue)
        };
        for waiter in waiters {
            // Nobody replays on failure, so the acknowledgement is not awaited.
            let (started, _) = oneshot::channel();
            let _ = waiter.send(Release {
                outcome: Err("refresh was cancelled".to_string()),
                started,
            });
        }
    }
}

pub struct RefreshCoordinator {
    store: Arc<CredentialStore>,
    identity: Arc<dyn IdentityProvider>,
    transport: Arc<dyn Transport>,
    redirects: RedirectSignal,
    metrics: Metrics,
    refresh_timeout: Duration,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<CredentialStore>,
        identity: Arc<dyn IdentityProvider>,
        transport: Arc<dyn Transport>,
        redirects: RedirectSignal,
        metrics: Metrics,
        refresh_timeout: Duration,
    ) -> Self {
        RefreshCoordinator {
            store,
            identity,
            transport,
            redirects,
            metrics,
            refresh_timeout,
            state: Mutex::new(RefreshState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// True while a refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Number of calls currently parked behind the in-flight refresh.
    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    /// Sends `request` with the current access credential attached, recovering
    /// from an expired credential with at most one refresh and one replay.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let sent_with = self.store.access_credential();
        let response = self.dispatch(&request, sent_with.as_deref()).await?;

        match response.status {
            StatusCode::UNAUTHORIZED => {
                debug!("[{}] {} {} -> 401", request.id, request.method, request.path);
                self.recover(request, sent_with).await
            }
            _ => self.settle(&request, response),
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        self.transport.send(request.with_bearer(token)).await
    }

    /// Maps a final response (first attempt without 401, or any replay) to a result.
    fn settle(&self, request: &ApiRequest, response: ApiResponse) -> Result<ApiResponse, ApiError> {
        match response.status {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => {
                warn!(
                    "[{}] {} {} still unauthorized after replay",
                    request.id, request.method, request.path
                );
                Err(ApiError::Unauthorized)
            }
            StatusCode::FORBIDDEN => {
                // Scope failure, not expiry: refresh state stays as it is.
                info!("[{}] {} {} forbidden", request.id, request.method, request.path);
                self.redirects.emit(Redirect::Unauthorized);
                Err(ApiError::Forbidden)
            }
            status => Err(ApiError::Status {
                status,
                body: response.body,
            }),
        }
    }

    async fn recover(
        &self,
        request: ApiRequest,
        sent_with: Option<String>,
    ) -> Result<ApiResponse, ApiError> {
        let recovery = {
            let mut state = self.lock();
            match self.store.access_credential() {
                Some(current) if Some(&current) != sent_with.as_ref() => Recovery::Replay(current),
                _ if state.refreshing => {
                    let (tx, rx) = oneshot::channel();
                    state.queue.push_back(tx);
                    self.metrics.record_refresh_waiter();
                    debug!(
                        "[{}] queued behind in-flight refresh (position {})",
                        request.id,
                        state.queue.len()
                    );
                    Recovery::Wait(rx)
                }
                _ => {
                    state.refreshing = true;
                    Recovery::Lead {
                        generation: self.store.generation(),
                    }
                }
            }
        };

        match recovery {
            Recovery::Replay(token) => {
                debug!("[{}] credential already rotated, replaying", request.id);
                let response = self.dispatch(&request, Some(&token)).await?;
                self.settle(&request, response)
            }
            Recovery::Wait(rx) => self.wait(request, rx).await,
            Recovery::Lead { generation } => self.lead(request, generation).await,
        }
    }

    async fn wait(
        &self,
        request: ApiRequest,
        rx: oneshot::Receiver<Release>,
    ) -> Result<ApiResponse, ApiError> {
        let Release { outcome, started } = rx
            .await
            .map_err(|_| ApiError::RefreshFailed("refresh was abandoned".to_string()))?;

        let token = match outcome {
            Ok(token) => token,
            Err(reason) => return Err(ApiError::RefreshFailed(reason)),
        };

        // Hand the request to the transport before letting the next waiter go.
        let mut replay = Box::pin(self.dispatch(&request, Some(&token)));
        let first = futures::poll!(replay.as_mut());
        let _ = started.send(());
        let response = match first {
            Poll::Ready(result) => result?,
            Poll::Pending => replay.await?,
        };
        self.settle(&request, response)
    }

    async fn lead(&self, request: ApiRequest, generation: u64) -> Result<ApiResponse, ApiError> {
        info!("[{}] access credential rejected, refreshing", request.id);
        let mut episode = Episode {
            coordinator: self,
            armed: true,
        };
        let started_at = Instant::now();
        let result = self.refresh().await;
        let elapsed = started_at.elapsed().as_secs_f64();
        // From here on `finish` settles the episode.
        episode.disarm();

        match result {
            Ok(refreshed) => {
                let applied = self.store.set_access_credential_if_current(
                    generation,
                    refreshed.access_token.clone(),
                    refreshed.refresh_token.as_deref(),
                );
                if !applied {
                    // Signed out (or signed in again) while the refresh ran.
                    info!("Session changed during refresh; discarding refreshed credential");
                    self.metrics.record_refresh("discarded");
                    self.metrics.record_refresh_duration(elapsed, "discarded");
                    let reason = "session was cleared during refresh".to_string();
                    self.finish(Err(reason.clone())).await;
                    return Err(ApiError::RefreshFailed(reason));
                }

                info!("Access credential refreshed");
                self.metrics.record_refresh("success");
                self.metrics.record_refresh_duration(elapsed, "success");
                let token = refreshed.access_token;
                self.finish(Ok(token.clone())).await;

                let response = self.dispatch(&request, Some(&token)).await?;
                self.settle(&request, response)
            }
            Err(e) => {
                warn!("Credential refresh failed: {}", e);
                self.metrics.record_refresh("failure");
                self.metrics.record_refresh_duration(elapsed, "failure");
                // Clear before the flag drops, so no new leader can pick up the
                // rotation credential of the failed episode.
                self.store.clear_auth();
                let reason = e.to_string();
                self.finish(Err(reason.clone())).await;
                self.redirects.emit(Redirect::Login { callback: None });
                Err(ApiError::RefreshFailed(reason))
            }
        }
    }

    async fn refresh(&self) -> Result<RefreshResponse, IdentityError> {
        let rotation = self
            .store
            .rotation_credential()
            .ok_or(IdentityError::MissingRotationCredential)?;
        match timeout(self.refresh_timeout, self.identity.refresh(&rotation)).await {
            Ok(result) => result,
            Err(_) => Err(IdentityError::Timeout),
        }
    }

    /// Ends the episode: drops the flag, drains the queue in one step and
    /// releases every waiter in arrival order.
    async fn finish(&self, outcome: Result<String, String>) {
        let waiters = {
            let mut state = self.lock();
            state.refreshing = false;
            std::mem::take(&mut state.queue)
        };
        if !waiters.is_empty() {
            debug!("Releasing {} queued request(s)", waiters.len());
        }

        for waiter in waiters {
            let (started_tx, started_rx) = oneshot::channel();
            let release = Release {
                outcome: outcome.clone(),
                started: started_tx,
            };
            if waiter.send(release).is_err() {
                debug!("Queued request went away before release");
                continue;
            }
            // Errors here only mean the waiter finished without replaying.
            let _ = started_rx.await;
        }
    }
}
