//! The orchestrator's own position within a round's lifecycle.

use serde::{Deserialize, Serialize};

/// Round life-cycle phase, distinct from the market's raw status code.
///
/// Normal loop:
/// `Awaiting -> Collecting -> LiveUpdating -> Finalizing -> Consolidating ->
/// Completed -> Awaiting` (or straight back to `Collecting` when the next
/// round starts immediately). `Failed` is reachable from any phase on an
/// unrecoverable error and recovers back to `Awaiting`. A season boundary
/// resets any phase to `Awaiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Awaiting,
    Collecting,
    LiveUpdating,
    Finalizing,
    Consolidating,
    Completed,
    Failed,
}

impl RoundPhase {
    /// Whether moving from `self` to `next` follows a defined edge.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        use RoundPhase::{
            Awaiting, Collecting, Completed, Consolidating, Failed, Finalizing, LiveUpdating,
        };

        if self == next {
            return true;
        }
        match (self, next) {
            (_, Failed) => true,
            // Recovery and season-boundary reset.
            (_, Awaiting) => true,
            (Awaiting, Collecting) => true,
            // Finalizing directly from Collecting covers rounds that end
            // before a single live tick fired.
            (Collecting, LiveUpdating | Finalizing) => true,
            (LiveUpdating, Finalizing) => true,
            (Finalizing, Consolidating) => true,
            (Consolidating, Completed) => true,
            (Completed, Collecting) => true,
            _ => false,
        }
    }

    /// True while a round cycle is underway and the persisted value cannot be
    /// trusted blindly after a restart.
    #[must_use]
    pub fn is_mid_cycle(self) -> bool {
        matches!(
            self,
            Self::Collecting | Self::LiveUpdating | Self::Finalizing | Self::Consolidating
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Awaiting => "awaiting",
            Self::Collecting => "collecting",
            Self::LiveUpdating => "live_updating",
            Self::Finalizing => "finalizing",
            Self::Consolidating => "consolidating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "awaiting" => Some(Self::Awaiting),
            "collecting" => Some(Self::Collecting),
            "live_updating" => Some(Self::LiveUpdating),
            "finalizing" => Some(Self::Finalizing),
            "consolidating" => Some(Self::Consolidating),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RoundPhase::{
        Awaiting, Collecting, Completed, Consolidating, Failed, Finalizing, LiveUpdating,
    };
    use super::*;

    const ALL: [RoundPhase; 7] = [
        Awaiting,
        Collecting,
        LiveUpdating,
        Finalizing,
        Consolidating,
        Completed,
        Failed,
    ];

    #[test]
    fn normal_loop_edges_are_allowed() {
        assert!(Awaiting.can_advance_to(Collecting));
        assert!(Collecting.can_advance_to(LiveUpdating));
        assert!(LiveUpdating.can_advance_to(Finalizing));
        assert!(Finalizing.can_advance_to(Consolidating));
        assert!(Consolidating.can_advance_to(Completed));
        assert!(Completed.can_advance_to(Awaiting));
        assert!(Completed.can_advance_to(Collecting));
        assert!(Collecting.can_advance_to(Finalizing));
    }

    #[test]
    fn failed_is_reachable_from_anywhere_and_recovers() {
        for phase in ALL {
            assert!(phase.can_advance_to(Failed), "{phase:?} -> Failed");
        }
        assert!(Failed.can_advance_to(Awaiting));
        assert!(!Failed.can_advance_to(Collecting));
    }

    #[test]
    fn skipping_forward_is_rejected() {
        assert!(!Awaiting.can_advance_to(LiveUpdating));
        assert!(!Awaiting.can_advance_to(Finalizing));
        assert!(!Collecting.can_advance_to(Consolidating));
        assert!(!LiveUpdating.can_advance_to(Completed));
        assert!(!Finalizing.can_advance_to(Completed));
        assert!(!Consolidating.can_advance_to(Collecting));
    }

    #[test]
    fn going_backwards_is_rejected_except_reset() {
        assert!(!LiveUpdating.can_advance_to(Collecting));
        assert!(!Consolidating.can_advance_to(Finalizing));
        // Season boundary / recovery reset is the one sanctioned way back.
        assert!(LiveUpdating.can_advance_to(Awaiting));
    }

    #[test]
    fn as_str_round_trips() {
        for phase in ALL {
            assert_eq!(RoundPhase::parse(phase.as_str()), Some(phase));
        }
        assert_eq!(RoundPhase::parse("bogus"), None);
    }
}
