// Periodic background refresh of a shared dashboard

use crate::client::ProxyApi;
use crate::view::Dashboard;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs the fetch cycle immediately and then on a fixed interval.
///
/// Dropping the handle cancels the loop.
pub struct AutoRefresh {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl AutoRefresh {
    pub fn spawn(view: Arc<Mutex<Dashboard>>, api: Arc<dyn ProxyApi>, every: Duration) -> Self {
        Self::spawn_with(view, api, every, |_| {})
    }

    /// Like [`AutoRefresh::spawn`], calling `on_cycle` after each cycle with
    /// the view still locked
    pub fn spawn_with<F>(view: Arc<Mutex<Dashboard>>, api: Arc<dyn ProxyApi>, every: Duration, on_cycle: F) -> Self
    where
        F: Fn(&Dashboard) + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                view.lock().await.begin_refresh();
                // The view stays unlocked while the request is in flight.
                let outcome = tokio::select! {
                    _ = cancelled.cancelled() => {
                        view.lock().await.abort_refresh();
                        break;
                    }
                    outcome = api.list() => outcome,
                };

                let mut state = view.lock().await;
                let _ = state.finish_refresh(outcome);
                on_cycle(&state);
            }
            debug!("Auto-refresh stopped");
        });

        Self { token, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the loop and wait for it to exit
    pub async fn shutdown(mut self) {
        self.token.cancel();
        let _ = (&mut self.handle).await;
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
