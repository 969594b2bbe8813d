#![cfg(test)]

use crate::{MockVrfOracle, MockVrfOracleClient, OracleError};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{contract, contractimpl, contracttype, vec, Address, Env, Vec};

// ════════════════════════════════════════════════════════════════════════════
//  Mock consumer (records the last callback)
// ════════════════════════════════════════════════════════════════════════════

#[contracttype]
#[derive(Clone)]
enum ConsumerKey {
    LastRequest,
    LastWords,
}

#[contract]
pub struct MockConsumer;

#[contractimpl]
impl MockConsumer {
    pub fn fulfill_random_words(env: Env, request_id: u64, random_words: Vec<u64>) {
        env.storage().instance().set(&ConsumerKey::LastRequest, &request_id);
        env.storage().instance().set(&ConsumerKey::LastWords, &random_words);
    }

    pub fn last_request(env: Env) -> Option<u64> {
        env.storage().instance().get(&ConsumerKey::LastRequest)
    }

    pub fn last_words(env: Env) -> Vec<u64> {
        env.storage()
            .instance()
            .get(&ConsumerKey::LastWords)
            .unwrap_or_else(|| Vec::new(&env))
    }
}

fn setup() -> (Env, MockVrfOracleClient<'static>, MockConsumerClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let oracle_id = env.register(MockVrfOracle, (&admin,));
    let oracle = MockVrfOracleClient::new(&env, &oracle_id);

    let consumer_id = env.register(MockConsumer, ());
    let consumer = MockConsumerClient::new(&env, &consumer_id);

    (env, oracle, consumer, consumer_id)
}

fn assert_oracle_error<T, E>(
    result: &Result<Result<T, E>, Result<OracleError, soroban_sdk::InvokeError>>,
    expected: OracleError,
) {
    match result {
        Err(Ok(actual)) => assert_eq!(*actual, expected),
        Err(Err(invoke_err)) => panic!("expected {:?}, got invoke error {:?}", expected, invoke_err),
        Ok(_) => panic!("expected {:?}, call succeeded", expected),
    }
}

#[test]
fn request_ids_increase() {
    let (_env, oracle, _consumer, consumer_id) = setup();
    assert_eq!(oracle.request_count(), 0);

    let first = oracle.request_random_words(&consumer_id, &7, &3);
    let second = oracle.request_random_words(&consumer_id, &7, &3);
    assert_eq!(first, 1);
    assert_eq!(second, 2);
    assert_eq!(oracle.request_count(), 2);

    let pending = oracle.get_request(&first).unwrap();
    assert_eq!(pending.consumer, consumer_id);
    assert_eq!(pending.subscription_id, 7);
    assert_eq!(pending.num_words, 3);
}

#[test]
fn zero_words_rejected() {
    let (_env, oracle, _consumer, consumer_id) = setup();
    let result = oracle.try_request_random_words(&consumer_id, &1, &0);
    assert_oracle_error(&result, OracleError::ZeroWords);
}

#[test]
fn fulfill_calls_back_consumer() {
    let (env, oracle, consumer, consumer_id) = setup();
    let id = oracle.request_random_words(&consumer_id, &1, &3);

    let words = vec![&env, 100u64, 200, 300];
    oracle.fulfill(&id, &words);

    assert_eq!(consumer.last_request(), Some(id));
    assert_eq!(consumer.last_words(), words);
    assert!(oracle.get_request(&id).is_none());
}

#[test]
fn fulfill_is_single_use() {
    let (env, oracle, _consumer, consumer_id) = setup();
    let id = oracle.request_random_words(&consumer_id, &1, &1);
    oracle.fulfill(&id, &vec![&env, 1u64]);

    let result = oracle.try_fulfill(&id, &vec![&env, 2u64]);
    assert_oracle_error(&result, OracleError::UnknownRequest);
}

#[test]
fn fulfill_unknown_request_rejected() {
    let (env, oracle, _consumer, _consumer_id) = setup();
    let result = oracle.try_fulfill(&42, &vec![&env, 1u64]);
    assert_oracle_error(&result, OracleError::UnknownRequest);
}

#[test]
fn prng_fulfillment_delivers_requested_word_count() {
    let (_env, oracle, consumer, consumer_id) = setup();
    let id = oracle.request_random_words(&consumer_id, &1, &4);

    let words = oracle.fulfill_from_prng(&id);
    assert_eq!(words.len(), 4);
    assert_eq!(consumer.last_words(), words);
}
