//! Market status codes, snapshots and transition classification.

use serde::{Deserialize, Serialize};

/// Discrete market states reported by the external feed.
///
/// The feed speaks numeric codes (1/2/4/6). Codes 3 and 5 exist upstream but
/// never reach the state machine; the feed adapter rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    /// Market open for lineups, no round in progress.
    Open,
    /// Market closed, round in progress.
    Closed,
    /// Round finished, market not yet reopened.
    Finalized,
    /// Season over, no further rounds.
    SeasonEnded,
}

impl MarketStatus {
    /// Decode a feed wire code.
    #[must_use]
    pub fn from_wire(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Open),
            2 => Some(Self::Closed),
            4 => Some(Self::Finalized),
            6 => Some(Self::SeasonEnded),
            _ => None,
        }
    }

    /// Encode as the feed wire code.
    #[must_use]
    pub fn to_wire(self) -> i32 {
        match self {
            Self::Open => 1,
            Self::Closed => 2,
            Self::Finalized => 4,
            Self::SeasonEnded => 6,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Finalized => "FINALIZED",
            Self::SeasonEnded => "SEASON_ENDED",
        }
    }
}

/// One observation of the market feed. Ephemeral; only its fields are
/// persisted, never the snapshot itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub status: MarketStatus,
    pub round_number: u32,
    pub season: u16,
}

/// Kinds of market-state transition the watcher recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Open -> Closed: a new round began.
    RoundStarted,
    /// Closed -> Open | Finalized: the running round ended.
    RoundFinalized,
    /// Finalized -> Open: market reopened after a finalized round.
    MarketReopened,
    /// Any -> SeasonEnded.
    SeasonEnded,
    /// SeasonEnded -> Open at round 1.
    SeasonReset,
}

/// A classified transition with the context the dispatcher needs.
///
/// `round_number` is the round the transition is *about*: for
/// [`Transition::RoundFinalized`] that is the round that was in progress, not
/// the new one the feed may already report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEvent {
    pub kind: Transition,
    pub from: Option<MarketStatus>,
    pub to: MarketStatus,
    pub round_number: u32,
    pub season: u16,
}

/// Outcome of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The market moved to a different status.
    Transition(TransitionEvent),
    /// Still closed, round in progress: drives live updates.
    StillInRound { round_number: u32, season: u16 },
    /// Nothing to do this tick.
    Idle,
}

/// Classify the delta between the last known status and a fresh snapshot.
///
/// `previous_round` is the last persisted round number, used to attribute
/// [`Transition::RoundFinalized`] to the round that actually ran and to tell
/// a season reset from an ordinary reopen.
#[must_use]
pub fn classify(
    previous: Option<MarketStatus>,
    previous_round: u32,
    snapshot: &MarketSnapshot,
) -> Signal {
    use MarketStatus::{Closed, Finalized, Open, SeasonEnded};

    let Some(prev) = previous else {
        // First observation ever: nothing to compare against.
        return if snapshot.status == Closed {
            Signal::StillInRound {
                round_number: snapshot.round_number,
                season: snapshot.season,
            }
        } else {
            Signal::Idle
        };
    };

    if prev == snapshot.status {
        return if snapshot.status == Closed {
            Signal::StillInRound {
                round_number: snapshot.round_number,
                season: snapshot.season,
            }
        } else {
            Signal::Idle
        };
    }

    let kind = match (prev, snapshot.status) {
        (_, SeasonEnded) => Transition::SeasonEnded,
        (Open, Closed) => Transition::RoundStarted,
        (Closed, Open) | (Closed, Finalized) => Transition::RoundFinalized,
        (Finalized, Open) => Transition::MarketReopened,
        (SeasonEnded, Open) if snapshot.round_number == 1 => Transition::SeasonReset,
        (SeasonEnded, Open) => Transition::MarketReopened,
        // Open -> Finalized, Finalized -> Closed and similar skips are left
        // to the next poll rather than guessed at.
        _ => return Signal::Idle,
    };

    let round_number = match kind {
        Transition::RoundFinalized => previous_round,
        _ => snapshot.round_number,
    };

    Signal::Transition(TransitionEvent {
        kind,
        from: Some(prev),
        to: snapshot.status,
        round_number,
        season: snapshot.season,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(status: MarketStatus, round: u32) -> MarketSnapshot {
        MarketSnapshot {
            status,
            round_number: round,
            season: 2025,
        }
    }

    #[test]
    fn wire_codes_round_trip() {
        for code in [1, 2, 4, 6] {
            let status = MarketStatus::from_wire(code).unwrap();
            assert_eq!(status.to_wire(), code);
        }
        assert_eq!(MarketStatus::from_wire(3), None);
        assert_eq!(MarketStatus::from_wire(5), None);
    }

    #[test]
    fn first_observation_is_idle_unless_closed() {
        assert_eq!(
            classify(None, 0, &snap(MarketStatus::Open, 10)),
            Signal::Idle
        );
        assert!(matches!(
            classify(None, 0, &snap(MarketStatus::Closed, 10)),
            Signal::StillInRound { round_number: 10, .. }
        ));
    }

    #[test]
    fn open_to_closed_starts_round() {
        let signal = classify(Some(MarketStatus::Open), 10, &snap(MarketStatus::Closed, 11));
        let Signal::Transition(ev) = signal else {
            panic!("expected transition, got {signal:?}");
        };
        assert_eq!(ev.kind, Transition::RoundStarted);
        assert_eq!(ev.round_number, 11);
    }

    #[test]
    fn closed_to_open_finalizes_previous_round() {
        let signal = classify(Some(MarketStatus::Closed), 11, &snap(MarketStatus::Open, 12));
        let Signal::Transition(ev) = signal else {
            panic!("expected transition, got {signal:?}");
        };
        assert_eq!(ev.kind, Transition::RoundFinalized);
        // The finished round, not the new one the feed reports.
        assert_eq!(ev.round_number, 11);
    }

    #[test]
    fn closed_to_finalized_also_finalizes() {
        let signal = classify(
            Some(MarketStatus::Closed),
            11,
            &snap(MarketStatus::Finalized, 11),
        );
        assert!(matches!(
            signal,
            Signal::Transition(TransitionEvent {
                kind: Transition::RoundFinalized,
                round_number: 11,
                ..
            })
        ));
    }

    #[test]
    fn season_end_wins_over_other_deltas() {
        let signal = classify(
            Some(MarketStatus::Closed),
            38,
            &snap(MarketStatus::SeasonEnded, 38),
        );
        assert!(matches!(
            signal,
            Signal::Transition(TransitionEvent {
                kind: Transition::SeasonEnded,
                ..
            })
        ));
    }

    #[test]
    fn season_reset_requires_round_one() {
        let reset = classify(
            Some(MarketStatus::SeasonEnded),
            38,
            &snap(MarketStatus::Open, 1),
        );
        assert!(matches!(
            reset,
            Signal::Transition(TransitionEvent {
                kind: Transition::SeasonReset,
                ..
            })
        ));

        let reopen = classify(
            Some(MarketStatus::SeasonEnded),
            38,
            &snap(MarketStatus::Open, 38),
        );
        assert!(matches!(
            reopen,
            Signal::Transition(TransitionEvent {
                kind: Transition::MarketReopened,
                ..
            })
        ));
    }

    #[test]
    fn steady_closed_signals_still_in_round() {
        let signal = classify(Some(MarketStatus::Closed), 11, &snap(MarketStatus::Closed, 11));
        assert!(matches!(signal, Signal::StillInRound { round_number: 11, .. }));
    }

    #[test]
    fn unmapped_delta_is_idle() {
        let signal = classify(Some(MarketStatus::Open), 10, &snap(MarketStatus::Finalized, 10));
        assert_eq!(signal, Signal::Idle);
    }
}
