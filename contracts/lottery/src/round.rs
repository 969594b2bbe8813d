//! Round lifecycle as a pure transition function.
//!
//! ```text
//!   OPEN ──Filled──▶ AWAITING_RANDOMNESS ──Fulfilled──▶ WINNERS_SELECTED
//!    ▲                                                        │
//!    └──────────────────────Distributed (next round)──────────┘
//! ```
//!
//! Requesting randomness does not change the phase; the pending request is
//! tracked on the round itself.

use crate::LotteryError;

pub(crate) type Phase = u32;

pub const PHASE_OPEN: Phase = 1;
pub const PHASE_AWAITING_RANDOMNESS: Phase = 2;
pub const PHASE_WINNERS_SELECTED: Phase = 3;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum RoundEvent {
    /// The roster reached capacity.
    Filled,
    /// The pending request was fulfilled and winners were stored.
    Fulfilled,
    /// Prizes were credited; the next round starts open.
    Distributed,
}

pub(crate) fn next_phase(phase: Phase, event: RoundEvent) -> Result<Phase, LotteryError> {
    match (phase, event) {
        (PHASE_OPEN, RoundEvent::Filled) => Ok(PHASE_AWAITING_RANDOMNESS),
        (PHASE_AWAITING_RANDOMNESS, RoundEvent::Fulfilled) => Ok(PHASE_WINNERS_SELECTED),
        (PHASE_WINNERS_SELECTED, RoundEvent::Distributed) => Ok(PHASE_OPEN),
        _ => Err(LotteryError::WrongPhase),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_returns_to_open() {
        let mut phase = PHASE_OPEN;
        for event in [RoundEvent::Filled, RoundEvent::Fulfilled, RoundEvent::Distributed] {
            phase = next_phase(phase, event).unwrap();
        }
        assert_eq!(phase, PHASE_OPEN);
    }

    #[test]
    fn out_of_order_events_rejected() {
        assert_eq!(
            next_phase(PHASE_OPEN, RoundEvent::Fulfilled),
            Err(LotteryError::WrongPhase)
        );
        assert_eq!(
            next_phase(PHASE_AWAITING_RANDOMNESS, RoundEvent::Distributed),
            Err(LotteryError::WrongPhase)
        );
        assert_eq!(
            next_phase(PHASE_WINNERS_SELECTED, RoundEvent::Filled),
            Err(LotteryError::WrongPhase)
        );
    }
}
