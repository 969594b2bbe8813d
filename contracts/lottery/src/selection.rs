//! Winner selection.
//!
//! For `i in 0..winner_count` the candidate index is
//! `random_words[i] % roster.len()`. An index that was already taken is
//! advanced linearly (wrapping) to the next free one, so the result always
//! holds `winner_count` distinct roster entries. Winners are returned in the
//! order they were resolved, not roster order.

use soroban_sdk::{Address, Env, Vec};

use crate::LotteryError;

pub fn select_winners(
    env: &Env,
    roster: &Vec<Address>,
    random_words: &Vec<u64>,
    winner_count: u32,
) -> Result<Vec<Address>, LotteryError> {
    let size = roster.len();
    if winner_count == 0 || size < winner_count {
        return Err(LotteryError::NotEnoughPlayers);
    }
    if random_words.len() < winner_count {
        return Err(LotteryError::InsufficientRandomness);
    }

    let mut taken: Vec<u32> = Vec::new(env);
    let mut winners: Vec<Address> = Vec::new(env);

    for i in 0..winner_count {
        let word = random_words
            .get(i)
            .ok_or(LotteryError::InsufficientRandomness)?;
        let mut index = (word % size as u64) as u32;
        // Terminates: fewer than `size` indices are taken at this point.
        while taken.contains(&index) {
            index = (index + 1) % size;
        }
        taken.push_back(index);
        winners.push_back(roster.get(index).ok_or(LotteryError::NotEnoughPlayers)?);
    }

    Ok(winners)
}
