//! Market state watcher: poll the feed and classify the delta.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::market::{classify, Signal};
use crate::domain::state::{EventKind, OrchestratorEvent, StatePatch};
use crate::port::feed::MarketFeed;
use crate::port::store::StateStore;

/// Polls the external market-status feed and classifies transitions against
/// the persisted last-known state.
pub struct MarketWatcher {
    feed: Arc<dyn MarketFeed>,
    store: Arc<dyn StateStore>,
}

impl MarketWatcher {
    pub fn new(feed: Arc<dyn MarketFeed>, store: Arc<dyn StateStore>) -> Self {
        Self { feed, store }
    }

    /// One poll. Never fails: feed and store problems are counted, logged and
    /// retried on the next tick, leaving the phase untouched.
    pub async fn poll(&self) -> Signal {
        let snapshot = match self.feed.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Market feed unavailable");
                self.record_poll_error(&e.to_string()).await;
                return Signal::Idle;
            }
        };

        let state = match self.store.load().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Could not load orchestrator state");
                self.record_poll_error(&e.to_string()).await;
                return Signal::Idle;
            }
        };

        let signal = classify(state.status, state.round_number, &snapshot);

        let mut patch = StatePatch {
            status: Some(snapshot.status),
            round_number: Some(snapshot.round_number),
            season: Some(snapshot.season),
            last_poll_at: Some(Utc::now()),
            ..StatePatch::default()
        };
        if let Some(previous) = state.status {
            patch.previous_status = Some(previous);
        }

        if let Signal::Transition(ev) = &signal {
            info!(
                from = ?ev.from.map(|s| s.label()),
                to = ev.to.label(),
                kind = ?ev.kind,
                round = ev.round_number,
                "Market transition detected"
            );
            patch.increment_transitions = true;

            let event = OrchestratorEvent::new(EventKind::MarketTransition)
                .statuses(ev.from, ev.to)
                .round(ev.round_number)
                .details(format!("{:?}", ev.kind));
            if let Err(e) = self.store.append_event(event).await {
                warn!(error = %e, "Failed to record transition event");
            }
        } else {
            debug!(status = snapshot.status.label(), round = snapshot.round_number, "No transition");
        }

        if let Err(e) = self.store.save(patch).await {
            warn!(error = %e, "Failed to persist poll result");
            self.record_poll_error(&e.to_string()).await;
            return Signal::Idle;
        }

        signal
    }

    async fn record_poll_error(&self, message: &str) {
        // Persistence failures here are themselves non-fatal.
        if let Err(e) = self.store.save(StatePatch::error_counted()).await {
            warn!(error = %e, "Failed to count poll error");
        }
        let event = OrchestratorEvent::new(EventKind::PollError).details(message);
        if let Err(e) = self.store.append_event(event).await {
            warn!(error = %e, "Failed to record poll error event");
        }
    }
}
