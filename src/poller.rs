use crate::api::RefreshStatusSource;
use crate::app::AppEvent;
use crate::model::{RefreshStatus, STATUS_COMPLETED, STATUS_FAILED, STATUS_NOT_STARTED};
use crate::notify::Notifier;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RefreshOutcome {
    Completed,
    Failed,
    NotStarted,
    /// Terminal status the backend reported that we have no message for.
    Unrecognized(String),
    StatusCheckFailed(String),
}

impl RefreshOutcome {
    /// `None` while the backend job is still running.
    pub fn from_status(status: &RefreshStatus) -> Option<Self> {
        if status.in_progress {
            return None;
        }
        Some(match status.status.as_str() {
            STATUS_COMPLETED => Self::Completed,
            STATUS_FAILED => Self::Failed,
            STATUS_NOT_STARTED => Self::NotStarted,
            other => Self::Unrecognized(other.to_string()),
        })
    }

    fn announce(&self, notifier: &Notifier) {
        match self {
            Self::Completed => notifier.success("Refresh completed successfully!"),
            Self::Failed => notifier.error("Refresh failed", Some("Please try again".to_string())),
            Self::NotStarted => notifier.info("Refresh not started", None),
            Self::Unrecognized(_) => {}
            Self::StatusCheckFailed(reason) => {
                notifier.error("Error checking refresh status", Some(reason.clone()))
            }
        }
    }
}

/// Owner of the single refresh poll task.
///
/// Starting a new poll aborts whichever one is still pending, so two aliases
/// can never be polled at once.
#[derive(Debug)]
pub struct RefreshPoller {
    period: Duration,
    handle: Option<JoinHandle<()>>,
    alias: Option<String>,
}

impl RefreshPoller {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            handle: None,
            alias: None,
        }
    }

    pub fn start<S: RefreshStatusSource>(
        &mut self,
        source: Arc<S>,
        alias: String,
        events: UnboundedSender<AppEvent>,
    ) {
        self.cancel();
        info!("polling refresh status for {alias} every {:?}", self.period);
        self.alias = Some(alias.clone());
        self.handle = Some(tokio::spawn(poll_refresh_status(
            source,
            alias,
            self.period,
            events,
        )));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                debug!(
                    "cancelling refresh poll for {}",
                    self.alias.as_deref().unwrap_or("-")
                );
            }
            handle.abort();
        }
        self.alias = None;
    }

    pub fn active(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn polling_alias(&self) -> Option<&str> {
        self.alias.as_deref().filter(|_| self.active())
    }
}

impl Drop for RefreshPoller {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Poll until the backend reports a terminal state or the status request
/// itself fails. The first check happens one period after the start.
pub async fn poll_refresh_status<S: RefreshStatusSource>(
    source: Arc<S>,
    alias: String,
    period: Duration,
    events: UnboundedSender<AppEvent>,
) {
    let notifier = Notifier::new(events.clone());
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let outcome = loop {
        ticker.tick().await;
        match source.refresh_status(&alias).await {
            Ok(status) => match RefreshOutcome::from_status(&status) {
                None => {
                    debug!("refresh for {alias} still running: {}", status.status);
                    notifier.info("Refresh in progress...", Some(status.status));
                }
                Some(outcome) => break outcome,
            },
            Err(error) => {
                warn!("refresh status check for {alias} failed: {error}");
                break RefreshOutcome::StatusCheckFailed(error.to_string());
            }
        }
    };

    info!("refresh for {alias} finished: {outcome:?}");
    outcome.announce(&notifier);
    if events
        .send(AppEvent::RefreshFinished { alias, outcome })
        .is_err()
    {
        debug!("refresh result dropped, event bus closed");
    }
}
