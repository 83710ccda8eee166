use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::aggregate::{run_cycle, CycleError};
use crate::core::models::permission::{AuthorizationState, DenialReason, PermissionRequirement};
use crate::core::models::snapshot::NutritionSnapshot;
use crate::core::notify::{Notifier, SettingsLink};
use crate::core::permission::{check_authorization, denial_notice};
use crate::core::providers::HealthProvider;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Checking,
    Granted,
    Denied,
    Polling,
    Stopped,
}

/// What the consumer sees. Replaced as a whole on every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollerState {
    pub phase: Phase,
    pub authorization: AuthorizationState,
    pub snapshot: NutritionSnapshot,
    pub is_loading: bool,
}

#[derive(Debug, Clone)]
pub struct PollerOptions {
    pub interval: Duration,
    pub settings_link: String,
    pub fallback_link: Option<String>,
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            settings_link: "package:com.google.android.apps.healthdata".to_string(),
            fallback_link: Some(
                "market://details?id=com.google.android.apps.healthdata".to_string(),
            ),
        }
    }
}

/// Keeps today's nutrition snapshot fresh while its owner is alive.
///
/// Lifecycle: `start` checks authorization, runs one cycle and arms a
/// repeating timer; `stop` (or drop) cancels it. Cycles never overlap: a
/// cycle requested while another is in flight is skipped, not queued.
pub struct PermissionedPoller {
    shared: Arc<Shared>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    provider: Arc<dyn HealthProvider>,
    requirement: PermissionRequirement,
    notifier: Arc<dyn Notifier>,
    link: Arc<dyn SettingsLink>,
    options: PollerOptions,
    state: watch::Sender<PollerState>,
    in_flight: AtomicBool,
    cancel: CancellationToken,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PermissionedPoller {
    pub fn new(
        provider: Arc<dyn HealthProvider>,
        requirement: PermissionRequirement,
        notifier: Arc<dyn Notifier>,
        link: Arc<dyn SettingsLink>,
        options: PollerOptions,
    ) -> Self {
        let (state, _) = watch::channel(PollerState::default());
        Self {
            shared: Arc::new(Shared {
                provider,
                requirement,
                notifier,
                link,
                options,
                state,
                in_flight: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
            timer: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PollerState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.shared.state.subscribe()
    }

    /// Mount: check authorization and, when granted, start polling.
    /// Only acts on a fresh instance.
    pub async fn start(&self) {
        if !self.enter_checking(Phase::Idle) {
            debug!("start ignored; poller already started");
            return;
        }
        self.authorize_and_poll().await;
    }

    /// Re-run the authorization check after a denial.
    pub async fn retry_authorization(&self) {
        if !self.enter_checking(Phase::Denied) {
            debug!("retry ignored; authorization is not denied");
            return;
        }
        self.authorize_and_poll().await;
    }

    /// Run one extra cycle without touching the timer phase.
    /// Returns whether a new snapshot was published.
    pub async fn refresh_now(&self) -> bool {
        let phase = self.shared.state.borrow().phase;
        if !matches!(phase, Phase::Granted | Phase::Polling) {
            debug!(?phase, "refresh ignored; not polling");
            return false;
        }
        self.shared.run_guarded_cycle().await
    }

    /// Send the user to the provider's settings. Fire-and-forget.
    pub fn open_settings(&self) {
        let options = &self.shared.options;
        self.shared
            .link
            .open(&options.settings_link, options.fallback_link.as_deref());
    }

    /// Unmount: cancel the timer. A cycle already in flight may finish but
    /// its result is dropped.
    pub fn stop(&self) {
        self.shared.cancel.cancel();
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
        }
        self.shared.state.send_modify(|s| s.phase = Phase::Stopped);
        info!("nutrition polling stopped");
    }

    fn enter_checking(&self, from: Phase) -> bool {
        if self.shared.cancel.is_cancelled() {
            return false;
        }
        self.shared.state.send_if_modified(|s| {
            if s.phase == from {
                s.phase = Phase::Checking;
                true
            } else {
                false
            }
        })
    }

    async fn authorize_and_poll(&self) {
        let shared = &self.shared;
        let provider = Arc::clone(&shared.provider);
        let requirement = shared.requirement.clone();
        let authorization = tokio::spawn(async move {
            check_authorization(provider.as_ref(), &requirement).await
        })
        .await
        .unwrap_or_else(|e| AuthorizationState::Denied(DenialReason::Error(join_error_message(e))));
        if shared.cancel.is_cancelled() {
            return;
        }

        match authorization {
            AuthorizationState::Granted => {
                shared.publish(|s| {
                    s.phase = Phase::Granted;
                    s.authorization = AuthorizationState::Granted;
                });
                shared.run_guarded_cycle().await;
                self.arm_timer();
            }
            AuthorizationState::Denied(reason) => {
                warn!(%reason, "nutrition access denied");
                let (title, message) = denial_notice(&reason);
                shared.publish(|s| {
                    s.phase = Phase::Denied;
                    s.authorization = AuthorizationState::Denied(reason);
                });
                shared.notifier.alert(title, &message);
            }
            AuthorizationState::Unchecked => {
                shared.publish(|s| s.phase = Phase::Idle);
            }
        }
    }

    fn arm_timer(&self) {
        let mut timer = self.lock_timer();
        if self.shared.cancel.is_cancelled() {
            return;
        }
        if timer.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("poll timer already armed");
        } else {
            let shared = Arc::clone(&self.shared);
            *timer = Some(tokio::spawn(poll_loop(shared)));
            info!(interval_secs = self.shared.options.interval.as_secs(), "nutrition polling started");
        }
        self.shared.publish(|s| s.phase = Phase::Polling);
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for PermissionedPoller {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
        }
    }
}

async fn poll_loop(shared: Arc<Shared>) {
    let period = shared.options.interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shared.cancel.cancelled() => break,
            _ = ticker.tick() => {
                shared.run_guarded_cycle().await;
            }
        }
    }
}

impl Shared {
    fn publish(&self, modify: impl FnOnce(&mut PollerState)) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.state.send_modify(modify);
    }

    /// One cycle behind the in-flight guard. The cycle runs on its own task so
    /// a panic inside it is reported like any other failure.
    async fn run_guarded_cycle(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("cycle already in flight; skipping");
            return false;
        }
        let _guard = InFlight(&self.in_flight);

        self.publish(|s| s.is_loading = true);
        let provider = Arc::clone(&self.provider);
        let result = tokio::spawn(async move { run_cycle(provider.as_ref(), Local::now()).await })
            .await
            .unwrap_or_else(|e| Err(CycleError::Aborted(join_error_message(e))));

        if self.cancel.is_cancelled() {
            debug!("discarding cycle result; poller stopped");
            return false;
        }

        match result {
            Ok(snapshot) => {
                self.publish(|s| {
                    s.snapshot = snapshot;
                    s.is_loading = false;
                });
                true
            }
            Err(e) => {
                warn!(error = %e, "nutrition cycle failed");
                self.publish(|s| s.is_loading = false);
                self.notifier
                    .alert("Error", &format!("Failed to fetch nutrition data: {}", e));
                false
            }
        }
    }
}

fn join_error_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "task cancelled".to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}
