#![no_std]

//! # Mock VRF Oracle
//!
//! Development stand-in for an external randomness oracle. Consumers ask for
//! random words and receive an opaque request id; the oracle admin later
//! fulfills the request, which calls back the consumer's
//! `fulfill_random_words(request_id, random_words)`.
//!
//! The words are whatever the admin supplies (or the host PRNG produces).
//! Nothing here is verifiable randomness; it exists so the request/callback
//! correlation can be exercised end to end.

use soroban_sdk::{
    contract, contractclient, contracterror, contractevent, contractimpl, contracttype, Address,
    Env, Vec,
};

// ═══════════════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════════════

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OracleRequest {
    pub consumer: Address,
    pub subscription_id: u64,
    pub num_words: u32,
}

#[contracttype]
#[derive(Clone)]
enum DataKey {
    Admin,
    RequestCount,
    Request(u64),
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum OracleError {
    AdminNotSet = 1,
    UnknownRequest = 2,
    ZeroWords = 3,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvRandomWordsRequested {
    pub request_id: u64,
    pub consumer: Address,
    pub num_words: u32,
}

#[contractevent]
pub struct EvRandomWordsFulfilled {
    pub request_id: u64,
    pub consumer: Address,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Consumer callback interface
// ═══════════════════════════════════════════════════════════════════════════════

#[contractclient(name = "RandomnessConsumerClient")]
pub trait RandomnessConsumer {
    fn fulfill_random_words(env: Env, request_id: u64, random_words: Vec<u64>);
}

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// Pending requests live for 7 days
const REQUEST_TTL_SECONDS: u32 = 7 * 24 * 60 * 60;
const REQUEST_TTL_LEDGERS: u32 = REQUEST_TTL_SECONDS / LEDGER_RATE_SECS;

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct MockVrfOracle;

#[contractimpl]
impl MockVrfOracle {
    pub fn __constructor(env: Env, admin: Address) {
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::RequestCount, &0u64);
    }

    /// Register a request for `num_words` random words on behalf of `consumer`.
    /// Returns the request id the consumer must correlate the callback with.
    pub fn request_random_words(
        env: Env,
        consumer: Address,
        subscription_id: u64,
        num_words: u32,
    ) -> Result<u64, OracleError> {
        consumer.require_auth();
        if num_words == 0 {
            return Err(OracleError::ZeroWords);
        }

        let request_id: u64 = env
            .storage()
            .instance()
            .get::<DataKey, u64>(&DataKey::RequestCount)
            .unwrap_or(0)
            .saturating_add(1);
        env.storage().instance().set(&DataKey::RequestCount, &request_id);

        let key = DataKey::Request(request_id);
        env.storage().persistent().set(
            &key,
            &OracleRequest {
                consumer: consumer.clone(),
                subscription_id,
                num_words,
            },
        );
        env.storage()
            .persistent()
            .extend_ttl(&key, REQUEST_TTL_LEDGERS, REQUEST_TTL_LEDGERS);
        env.storage()
            .instance()
            .extend_ttl(REQUEST_TTL_LEDGERS, REQUEST_TTL_LEDGERS);

        EvRandomWordsRequested {
            request_id,
            consumer,
            num_words,
        }.publish(&env);

        Ok(request_id)
    }

    /// Deliver `random_words` for a pending request (admin only).
    /// The request is consumed before the consumer is called back.
    pub fn fulfill(env: Env, request_id: u64, random_words: Vec<u64>) -> Result<(), OracleError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();

        let request = Self::take_request(&env, request_id)?;
        Self::deliver(&env, request_id, &request.consumer, &random_words);
        Ok(())
    }

    /// Fulfill a pending request with words drawn from the host PRNG.
    pub fn fulfill_from_prng(env: Env, request_id: u64) -> Result<Vec<u64>, OracleError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();

        let request = Self::take_request(&env, request_id)?;
        let mut words = Vec::new(&env);
        for _ in 0..request.num_words {
            words.push_back(env.prng().gen_range::<u64>(0..=u64::MAX));
        }
        Self::deliver(&env, request_id, &request.consumer, &words);
        Ok(words)
    }

    pub fn get_request(env: Env, request_id: u64) -> Option<OracleRequest> {
        env.storage().persistent().get(&DataKey::Request(request_id))
    }

    pub fn request_count(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::RequestCount)
            .unwrap_or(0)
    }

    // ─── Internal helpers ──────────────────────────────────────────────────

    fn take_request(env: &Env, request_id: u64) -> Result<OracleRequest, OracleError> {
        let key = DataKey::Request(request_id);
        let request: OracleRequest = env
            .storage()
            .persistent()
            .get(&key)
            .ok_or(OracleError::UnknownRequest)?;
        env.storage().persistent().remove(&key);
        Ok(request)
    }

    fn deliver(env: &Env, request_id: u64, consumer: &Address, random_words: &Vec<u64>) {
        RandomnessConsumerClient::new(env, consumer)
            .fulfill_random_words(&request_id, random_words);

        EvRandomWordsFulfilled {
            request_id,
            consumer: consumer.clone(),
        }.publish(env);
    }

    fn load_admin(env: &Env) -> Result<Address, OracleError> {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(OracleError::AdminNotSet)
    }
}

#[cfg(test)]
mod test;
