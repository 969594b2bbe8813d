#![no_std]

//! # Lottery
//!
//! Round-based lottery with oracle randomness and pull-payment prizes.
//!
//! ## Round flow
//! 1. Participants `enter` by paying exactly the round's entry fee. Each
//!    address may enter a round once.
//! 2. When the roster reaches `max_players` the round stops admitting
//!    entries and waits for randomness.
//! 3. The operator calls `request_random_words`. The roster is snapshotted
//!    together with the oracle's request id; only one request may be
//!    outstanding.
//! 4. The oracle calls back `fulfill_random_words(request_id, words)`. The
//!    first `winner_count` words pick distinct winners from the snapshot.
//! 5. The operator calls `distribute_prizes`: each winner is credited an
//!    equal share of the prize pool and a fresh round opens.
//! 6. Winners `withdraw` their credited balance whenever they like.
//!
//! ## Funds
//! Entry fees and `fund` top-ups form one fund pool. Prizes move from the
//! fund pool into per-participant balances; nothing leaves the contract
//! except through `withdraw`.

use soroban_sdk::{
    contract, contractclient, contracterror, contractevent, contractimpl, contracttype, log,
    panic_with_error, token::TokenClient, Address, BytesN, Env, Vec,
};

mod prize;
mod round;
mod selection;

pub use prize::{split_prize_pool, PrizeSplit};
pub use round::{PHASE_AWAITING_RANDOMNESS, PHASE_OPEN, PHASE_WINNERS_SELECTED};
pub use selection::select_winners;

use round::{next_phase, RoundEvent};

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvLotteryEnter {
    pub round_id: u32,
    pub participant: Address,
}

#[contractevent]
pub struct EvRandomnessRequested {
    pub round_id: u32,
    pub request_id: u64,
}

#[contractevent]
pub struct EvRequestFulfilled {
    pub request_id: u64,
    pub random_words: Vec<u64>,
}

#[contractevent]
pub struct EvPrizesDistributed {
    pub round_id: u32,
    pub winners: Vec<Address>,
    pub amounts: Vec<i128>,
}

#[contractevent]
pub struct EvWithdrawalMade {
    pub participant: Address,
    pub amount: i128,
}

#[contractevent]
pub struct EvPoolFunded {
    pub from: Address,
    pub amount: i128,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  External trait interfaces
// ═══════════════════════════════════════════════════════════════════════════════

/// Randomness oracle. Returns an opaque request id; the words arrive later
/// through `fulfill_random_words`.
#[contractclient(name = "VrfOracleClient")]
pub trait VrfOracle {
    fn request_random_words(
        env: Env,
        consumer: Address,
        subscription_id: u64,
        num_words: u32,
    ) -> u64;
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum LotteryError {
    InsufficientFee = 1,
    MaxPlayersReached = 2,
    RequestAlreadyPending = 3,
    UnknownRequest = 4,
    InsufficientRandomness = 5,
    NoWinnersSelected = 6,
    InsufficientFunds = 7,
    NoWithdrawalAvailable = 8,
    Unauthorized = 9,
    AlreadyEntered = 10,
    WrongPhase = 11,
    RoundNotFull = 12,
    NotEnoughPlayers = 13,
    InvalidAmount = 14,
    InvalidRoundParams = 15,
    ArithmeticOverflow = 16,
    TransferFailed = 17,
    OperatorNotSet = 18,
    ConfigNotSet = 19,
    RoundNotFound = 20,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  State & storage keys
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-round parameters. A round keeps the values in force when it opened.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundParams {
    pub entry_fee: i128,
    pub max_players: u32,
    pub winner_count: u32,
    pub prize_pool: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LotteryConfig {
    pub token: Address,
    pub oracle: Address,
    pub subscription_id: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RandomnessRequest {
    pub request_id: u64,
    /// Roster at request time; winners are drawn from this, not the live roster.
    pub roster: Vec<Address>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Round {
    pub round_id: u32,
    pub phase: u32,
    pub params: RoundParams,
    pub players: Vec<Address>,
    /// Outstanding oracle request, if any.
    pub pending_request_id: Option<u64>,
    /// Roster at request time; winners are drawn from this, not `players`.
    pub snapshot: Vec<Address>,
    /// Request whose words selected `winners`.
    pub winners_request_id: Option<u64>,
    pub winners: Vec<Address>,
}

/// Outcome of a completed round, kept in persistent storage.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundSummary {
    pub round_id: u32,
    pub request_id: u64,
    pub winners: Vec<Address>,
    pub amounts: Vec<i128>,
    pub ledger: u32,
}

#[contracttype]
#[derive(Clone)]
enum DataKey {
    Operator,
    Config,
    /// Params for rounds opened from now on.
    NextParams,
    Round,
    FundPool,
    RecentWinners,
    Balance(Address),
    Summary(u32),
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════════════

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// Instance storage (config, active round): 30 days
const INSTANCE_TTL_SECONDS: u32 = 30 * 24 * 60 * 60;
const INSTANCE_TTL_LEDGERS: u32 = INSTANCE_TTL_SECONDS / LEDGER_RATE_SECS;

// Credited balances and round summaries: 120 days
const BALANCE_TTL_SECONDS: u32 = 120 * 24 * 60 * 60;
const BALANCE_TTL_LEDGERS: u32 = BALANCE_TTL_SECONDS / LEDGER_RATE_SECS;

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct Lottery;

#[contractimpl]
impl Lottery {
    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Constructor
    // ───────────────────────────────────────────────────────────────────────────

    pub fn __constructor(
        env: Env,
        operator: Address,
        token: Address,
        oracle: Address,
        subscription_id: u64,
        params: RoundParams,
    ) {
        if !Self::params_valid(&params) {
            panic_with_error!(&env, LotteryError::InvalidRoundParams);
        }

        env.storage().instance().set(&DataKey::Operator, &operator);
        env.storage().instance().set(
            &DataKey::Config,
            &LotteryConfig {
                token,
                oracle,
                subscription_id,
            },
        );
        env.storage().instance().set(&DataKey::NextParams, &params);
        env.storage().instance().set(&DataKey::FundPool, &0i128);
        env.storage()
            .instance()
            .set(&DataKey::RecentWinners, &Vec::<Address>::new(&env));

        let round = Self::open_round(&env, 1, params);
        Self::write_round(&env, &round);
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Entry
    // ───────────────────────────────────────────────────────────────────────────

    /// Join the current round by paying exactly the entry fee.
    ///
    /// A full roster rejects every further entry with `MaxPlayersReached`,
    /// whatever the payment.
    pub fn enter(env: Env, participant: Address, amount: i128) -> Result<(), LotteryError> {
        participant.require_auth();

        let mut round = Self::load_round(&env)?;
        if round.players.len() >= round.params.max_players {
            return Err(LotteryError::MaxPlayersReached);
        }
        if amount != round.params.entry_fee {
            return Err(LotteryError::InsufficientFee);
        }
        if round.phase != PHASE_OPEN {
            return Err(LotteryError::WrongPhase);
        }
        if round.players.contains(&participant) {
            return Err(LotteryError::AlreadyEntered);
        }

        let fund_pool = Self::load_fund_pool(&env)
            .checked_add(amount)
            .ok_or(LotteryError::ArithmeticOverflow)?;

        let config = Self::load_config(&env)?;
        TokenClient::new(&env, &config.token).transfer(
            &participant,
            &env.current_contract_address(),
            &amount,
        );

        round.players.push_back(participant.clone());

        EvLotteryEnter {
            round_id: round.round_id,
            participant,
        }.publish(&env);

        if round.players.len() == round.params.max_players {
            round.phase = next_phase(round.phase, RoundEvent::Filled)?;
            log!(&env, "round full, awaiting randomness", round.round_id);
        }

        env.storage().instance().set(&DataKey::FundPool, &fund_pool);
        Self::write_round(&env, &round);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Randomness request / fulfillment
    // ───────────────────────────────────────────────────────────────────────────

    /// Ask the oracle for `winner_count` random words (operator only).
    /// Returns the oracle's request id.
    pub fn request_random_words(env: Env, caller: Address) -> Result<u64, LotteryError> {
        caller.require_auth();
        Self::require_operator(&env, &caller)?;

        let mut round = Self::load_round(&env)?;
        if round.pending_request_id.is_some() {
            return Err(LotteryError::RequestAlreadyPending);
        }
        match round.phase {
            PHASE_AWAITING_RANDOMNESS => {}
            PHASE_OPEN => return Err(LotteryError::RoundNotFull),
            _ => return Err(LotteryError::WrongPhase),
        }
        if round.players.len() < round.params.winner_count {
            return Err(LotteryError::NotEnoughPlayers);
        }

        let config = Self::load_config(&env)?;
        let request_id = VrfOracleClient::new(&env, &config.oracle).request_random_words(
            &env.current_contract_address(),
            &config.subscription_id,
            &round.params.winner_count,
        );

        round.pending_request_id = Some(request_id);
        round.snapshot = round.players.clone();

        EvRandomnessRequested {
            round_id: round.round_id,
            request_id,
        }.publish(&env);
        log!(&env, "randomness requested", round.round_id, request_id);

        Self::write_round(&env, &round);
        Ok(request_id)
    }

    /// Oracle callback. Accepted once, for the pending request only.
    pub fn fulfill_random_words(
        env: Env,
        request_id: u64,
        random_words: Vec<u64>,
    ) -> Result<(), LotteryError> {
        let config = Self::load_config(&env)?;
        config.oracle.require_auth();

        let mut round = Self::load_round(&env)?;
        if round.pending_request_id != Some(request_id) {
            return Err(LotteryError::UnknownRequest);
        }
        if random_words.len() < round.params.winner_count {
            return Err(LotteryError::InsufficientRandomness);
        }

        let winners = select_winners(
            &env,
            &round.snapshot,
            &random_words,
            round.params.winner_count,
        )?;

        round.phase = next_phase(round.phase, RoundEvent::Fulfilled)?;
        round.pending_request_id = None;
        round.winners_request_id = Some(request_id);
        round.winners = winners.clone();

        env.storage().instance().set(&DataKey::RecentWinners, &winners);

        EvRequestFulfilled {
            request_id,
            random_words,
        }.publish(&env);
        log!(&env, "winners selected", round.round_id, request_id);

        Self::write_round(&env, &round);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Prize distribution & funding
    // ───────────────────────────────────────────────────────────────────────────

    /// Credit each selected winner an equal share of the prize pool and open
    /// the next round (operator only). No tokens move here; winners pull
    /// their credit with `withdraw`.
    pub fn distribute_prizes(env: Env, caller: Address) -> Result<(), LotteryError> {
        caller.require_auth();
        Self::require_operator(&env, &caller)?;

        let round = Self::load_round(&env)?;
        let request_id = round
            .winners_request_id
            .ok_or(LotteryError::NoWinnersSelected)?;

        let fund_pool = Self::load_fund_pool(&env);
        let split = split_prize_pool(
            round.params.prize_pool,
            round.winners.len(),
            fund_pool,
        )?;

        let mut amounts: Vec<i128> = Vec::new(&env);
        for winner in round.winners.iter() {
            Self::credit(&env, &winner, split.share)?;
            amounts.push_back(split.share);
        }

        let remaining = fund_pool
            .checked_sub(split.total)
            .ok_or(LotteryError::ArithmeticOverflow)?;
        env.storage().instance().set(&DataKey::FundPool, &remaining);

        Self::save_summary(
            &env,
            &RoundSummary {
                round_id: round.round_id,
                request_id,
                winners: round.winners.clone(),
                amounts: amounts.clone(),
                ledger: env.ledger().sequence(),
            },
        );

        EvPrizesDistributed {
            round_id: round.round_id,
            winners: round.winners.clone(),
            amounts,
        }.publish(&env);

        let phase = next_phase(round.phase, RoundEvent::Distributed)?;
        let params = Self::load_params(&env)?;
        let mut next = Self::open_round(&env, round.round_id.saturating_add(1), params);
        next.phase = phase;
        log!(&env, "prizes distributed, next round open", next.round_id);

        Self::write_round(&env, &next);
        Ok(())
    }

    /// Top up the fund pool. Anyone may fund.
    pub fn fund(env: Env, from: Address, amount: i128) -> Result<(), LotteryError> {
        from.require_auth();
        if amount <= 0 {
            return Err(LotteryError::InvalidAmount);
        }

        let fund_pool = Self::load_fund_pool(&env)
            .checked_add(amount)
            .ok_or(LotteryError::ArithmeticOverflow)?;

        let config = Self::load_config(&env)?;
        TokenClient::new(&env, &config.token).transfer(
            &from,
            &env.current_contract_address(),
            &amount,
        );

        env.storage().instance().set(&DataKey::FundPool, &fund_pool);
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_TTL_LEDGERS, INSTANCE_TTL_LEDGERS);

        EvPoolFunded { from, amount }.publish(&env);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Withdrawal
    // ───────────────────────────────────────────────────────────────────────────

    /// Pay out the caller's whole credited balance. Returns the amount sent.
    ///
    /// The ledger entry is zeroed before the transfer; if the transfer fails
    /// the entry is restored and `TransferFailed` is returned.
    pub fn withdraw(env: Env, participant: Address) -> Result<i128, LotteryError> {
        participant.require_auth();

        let amount = Self::balance_of(&env, &participant);
        if amount <= 0 {
            return Err(LotteryError::NoWithdrawalAvailable);
        }
        let config = Self::load_config(&env)?;

        Self::write_balance(&env, &participant, 0);

        let token = TokenClient::new(&env, &config.token);
        let sent = token.try_transfer(&env.current_contract_address(), &participant, &amount);
        if !matches!(sent, Ok(Ok(_))) {
            Self::write_balance(&env, &participant, amount);
            return Err(LotteryError::TransferFailed);
        }

        EvWithdrawalMade {
            participant,
            amount,
        }.publish(&env);
        Ok(amount)
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Read
    // ───────────────────────────────────────────────────────────────────────────

    pub fn get_players(env: Env) -> Result<Vec<Address>, LotteryError> {
        Ok(Self::load_round(&env)?.players)
    }

    /// Winners of the most recent fulfilled request. Survives distribution
    /// until the next fulfillment replaces it.
    pub fn get_recent_winners(env: Env) -> Vec<Address> {
        env.storage()
            .instance()
            .get(&DataKey::RecentWinners)
            .unwrap_or_else(|| Vec::new(&env))
    }

    pub fn get_round(env: Env) -> Result<Round, LotteryError> {
        Self::load_round(&env)
    }

    pub fn get_round_id(env: Env) -> Result<u32, LotteryError> {
        Ok(Self::load_round(&env)?.round_id)
    }

    pub fn get_pending_request(env: Env) -> Option<RandomnessRequest> {
        let round = Self::load_round(&env).ok()?;
        round.pending_request_id.map(|request_id| RandomnessRequest {
            request_id,
            roster: round.snapshot,
        })
    }

    pub fn get_fund_pool(env: Env) -> i128 {
        Self::load_fund_pool(&env)
    }

    pub fn pending_withdrawal(env: Env, participant: Address) -> i128 {
        Self::balance_of(&env, &participant)
    }

    pub fn get_round_summary(env: Env, round_id: u32) -> Option<RoundSummary> {
        env.storage().persistent().get(&DataKey::Summary(round_id))
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Admin
    // ───────────────────────────────────────────────────────────────────────────

    pub fn get_operator(env: Env) -> Result<Address, LotteryError> {
        Self::load_operator(&env)
    }

    pub fn set_operator(env: Env, new_operator: Address) -> Result<(), LotteryError> {
        let operator = Self::load_operator(&env)?;
        operator.require_auth();
        env.storage()
            .instance()
            .set(&DataKey::Operator, &new_operator);
        Ok(())
    }

    pub fn get_config(env: Env) -> Result<LotteryConfig, LotteryError> {
        Self::load_config(&env)
    }

    /// Point the lottery at a different oracle. Refused while a request is
    /// outstanding, since its callback would come from the old oracle.
    pub fn set_oracle(env: Env, new_oracle: Address) -> Result<(), LotteryError> {
        let operator = Self::load_operator(&env)?;
        operator.require_auth();

        if Self::load_round(&env)?.pending_request_id.is_some() {
            return Err(LotteryError::RequestAlreadyPending);
        }

        let mut config = Self::load_config(&env)?;
        config.oracle = new_oracle;
        env.storage().instance().set(&DataKey::Config, &config);
        Ok(())
    }

    /// Params used by rounds opened after this call.
    pub fn get_params(env: Env) -> Result<RoundParams, LotteryError> {
        Self::load_params(&env)
    }

    pub fn set_round_params(env: Env, params: RoundParams) -> Result<(), LotteryError> {
        let operator = Self::load_operator(&env)?;
        operator.require_auth();
        if !Self::params_valid(&params) {
            return Err(LotteryError::InvalidRoundParams);
        }
        env.storage().instance().set(&DataKey::NextParams, &params);
        Ok(())
    }

    pub fn upgrade(env: Env, new_wasm_hash: BytesN<32>) -> Result<(), LotteryError> {
        let operator = Self::load_operator(&env)?;
        operator.require_auth();
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Guards & round construction
    // ═══════════════════════════════════════════════════════════════════════════

    fn require_operator(env: &Env, caller: &Address) -> Result<(), LotteryError> {
        if *caller != Self::load_operator(env)? {
            return Err(LotteryError::Unauthorized);
        }
        Ok(())
    }

    fn params_valid(params: &RoundParams) -> bool {
        params.entry_fee > 0
            && params.winner_count >= 1
            && params.max_players >= params.winner_count
            && params.prize_pool >= 0
    }

    fn open_round(env: &Env, round_id: u32, params: RoundParams) -> Round {
        Round {
            round_id,
            phase: PHASE_OPEN,
            params,
            players: Vec::new(env),
            pending_request_id: None,
            snapshot: Vec::new(env),
            winners_request_id: None,
            winners: Vec::new(env),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Balance ledger
    // ═══════════════════════════════════════════════════════════════════════════

    fn balance_of(env: &Env, participant: &Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(participant.clone()))
            .unwrap_or(0)
    }

    fn write_balance(env: &Env, participant: &Address, amount: i128) {
        let key = DataKey::Balance(participant.clone());
        if amount == 0 {
            env.storage().persistent().remove(&key);
            return;
        }
        env.storage().persistent().set(&key, &amount);
        env.storage()
            .persistent()
            .extend_ttl(&key, BALANCE_TTL_LEDGERS, BALANCE_TTL_LEDGERS);
    }

    fn credit(env: &Env, participant: &Address, amount: i128) -> Result<(), LotteryError> {
        let balance = Self::balance_of(env, participant)
            .checked_add(amount)
            .ok_or(LotteryError::ArithmeticOverflow)?;
        Self::write_balance(env, participant, balance);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Storage
    // ═══════════════════════════════════════════════════════════════════════════

    fn save_summary(env: &Env, summary: &RoundSummary) {
        let key = DataKey::Summary(summary.round_id);
        env.storage().persistent().set(&key, summary);
        env.storage()
            .persistent()
            .extend_ttl(&key, BALANCE_TTL_LEDGERS, BALANCE_TTL_LEDGERS);
    }

    fn load_round(env: &Env) -> Result<Round, LotteryError> {
        env.storage()
            .instance()
            .get(&DataKey::Round)
            .ok_or(LotteryError::RoundNotFound)
    }

    fn write_round(env: &Env, round: &Round) {
        env.storage().instance().set(&DataKey::Round, round);
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_TTL_LEDGERS, INSTANCE_TTL_LEDGERS);
    }

    fn load_fund_pool(env: &Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::FundPool)
            .unwrap_or(0)
    }

    fn load_operator(env: &Env) -> Result<Address, LotteryError> {
        env.storage()
            .instance()
            .get(&DataKey::Operator)
            .ok_or(LotteryError::OperatorNotSet)
    }

    fn load_config(env: &Env) -> Result<LotteryConfig, LotteryError> {
        env.storage()
            .instance()
            .get(&DataKey::Config)
            .ok_or(LotteryError::ConfigNotSet)
    }

    fn load_params(env: &Env) -> Result<RoundParams, LotteryError> {
        env.storage()
            .instance()
            .get(&DataKey::NextParams)
            .ok_or(LotteryError::ConfigNotSet)
    }
}
