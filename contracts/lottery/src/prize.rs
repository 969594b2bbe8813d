//! Prize computation: an equal split of the configured prize pool.

use crate::LotteryError;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PrizeSplit {
    /// Amount credited to each winner.
    pub share: i128,
    /// `share * winner_count`; what leaves the fund pool.
    pub total: i128,
}

/// Split `prize_pool` evenly across `winner_count` winners.
///
/// The integer-division remainder is not paid out and stays in the fund
/// pool. Fails with `InsufficientFunds` when the pool cannot cover the total.
pub fn split_prize_pool(
    prize_pool: i128,
    winner_count: u32,
    fund_pool: i128,
) -> Result<PrizeSplit, LotteryError> {
    if prize_pool < 0 {
        return Err(LotteryError::InvalidAmount);
    }
    let count = winner_count as i128;
    let share = prize_pool
        .checked_div(count)
        .ok_or(LotteryError::InvalidRoundParams)?;
    let total = share
        .checked_mul(count)
        .ok_or(LotteryError::ArithmeticOverflow)?;
    if total > fund_pool {
        return Err(LotteryError::InsufficientFunds);
    }
    Ok(PrizeSplit { share, total })
}
