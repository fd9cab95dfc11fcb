use std::collections::HashSet;
use std::sync::Once;

use strait_parse::json::JsonOptions;

use strait_constraint::{ConstraintFactory, TokenFilter, TokenId};

static INIT: Once = Once::new();

pub fn setup() {
	INIT.call_once(|| {
		tracing_subscriber::fmt::init();
	});
}

//                                      0     1    2    3    4    5      6    7    8    9    10       11   12   13
const TEST_VOCAB: [&str; 14] = ["{\"", "{", "}", "[", "]", "key", "1", "2", "3", "\"", "value", ":", ",", " "];

const TEST_SCHEMA: &str = "[]{
    key2: string,
    key3?: number
}";

fn test_vocab() -> Vec<String> {
	TEST_VOCAB.iter().map(|t| t.to_string()).collect()
}

fn invalid_set(filter: &mut TokenFilter) -> HashSet<TokenId> {
	filter.invalid_next_tokens().map(|(_, token_id)| token_id).collect()
}

#[test]
pub fn test_schema_filter_walk() {
	setup();
	let factory = ConstraintFactory::from_schema_source(TEST_SCHEMA).unwrap();
	let mut filter = TokenFilter::new(test_vocab(), factory, 4, true);

	// '[{"' 'key' '2' '"' ':' '"' 'value' '"' '}' ']'  =>  [{"key2":"value"}]
	let tokenized: [TokenId; 11] = [3, 0, 5, 7, 9, 11, 9, 10, 9, 2, 4];

	for token_id in tokenized {
		let invalid = invalid_set(&mut filter);
		assert!(!invalid.contains(&token_id), "sampled token {:?} flagged invalid", TEST_VOCAB[token_id]);
		filter.update(&[token_id]).unwrap();
	}

	assert_eq!(filter.constraint().parsed_text(), r#"[{"key2":"value"}]"#);
	assert!(filter.constraint().would_accept_eos());
}

#[test]
pub fn test_only_open_bracket_valid_at_start() {
	setup();
	let factory = ConstraintFactory::from_schema_source(TEST_SCHEMA).unwrap();
	let mut filter = TokenFilter::new(test_vocab(), factory, 2, true);

	let invalid = invalid_set(&mut filter);
	let valid: Vec<&str> = (0..TEST_VOCAB.len()).filter(|id| !invalid.contains(id)).map(|id| TEST_VOCAB[id]).collect();
	assert_eq!(valid, vec!["["]);
}

#[test]
pub fn test_key_tokens_after_object_open() {
	setup();
	let factory = ConstraintFactory::from_schema_source(TEST_SCHEMA).unwrap();
	let mut filter = TokenFilter::new(test_vocab(), factory, 2, false);

	filter.update(&[3]).unwrap(); // '['
	filter.update(&[0]).unwrap(); // '{"'

	let invalid = invalid_set(&mut filter);
	let valid: Vec<&str> = (0..TEST_VOCAB.len()).filter(|id| !invalid.contains(id)).map(|id| TEST_VOCAB[id]).collect();
	// only the key prefix can continue here
	assert_eq!(valid, vec!["key"]);
}

#[test]
pub fn test_unschematized_filter() {
	setup();
	let factory = ConstraintFactory::Json(JsonOptions::default());
	let mut filter = TokenFilter::new(test_vocab(), factory, 4, true);

	let invalid = invalid_set(&mut filter);
	let valid: HashSet<&str> = (0..TEST_VOCAB.len()).filter(|id| !invalid.contains(id)).map(|id| TEST_VOCAB[id]).collect();
	assert_eq!(valid, HashSet::from(["{\"", "{", "["]));
}

#[test]
pub fn test_check_idx_advances_per_update() {
	setup();
	let factory = ConstraintFactory::Json(JsonOptions::default());
	let mut filter = TokenFilter::new(test_vocab(), factory, 2, true);

	let first: Vec<usize> = filter.invalid_next_tokens().map(|(check_idx, _)| check_idx).collect();
	assert!(first.iter().all(|&idx| idx == 0));

	filter.update(&[1]).unwrap(); // '{'
	let second: Vec<usize> = filter.invalid_next_tokens().map(|(check_idx, _)| check_idx).collect();
	assert!(second.iter().all(|&idx| idx == 1));
}

#[test]
pub fn test_update_with_invalid_token_poisons() {
	setup();
	let factory = ConstraintFactory::from_schema_source(TEST_SCHEMA).unwrap();
	let mut filter = TokenFilter::new(test_vocab(), factory, 2, false);

	assert!(filter.update(&[2]).is_err()); // '}' cannot start
	filter.reset();
	filter.update(&[3]).unwrap(); // fresh constraint accepts '[' again
}

#[test]
pub fn test_cancel_and_recheck() {
	setup();
	let factory = ConstraintFactory::Json(JsonOptions::default());
	let mut filter = TokenFilter::new(test_vocab(), factory, 2, true);

	filter.cancel_current_check();
	// a new check is armed on demand and yields complete results
	let invalid = invalid_set(&mut filter);
	assert!(invalid.contains(&13)); // ' '
	assert!(!invalid.contains(&1)); // '{'
}

#[test]
pub fn test_update_empty_token_ids_is_noop() {
	setup();
	let factory = ConstraintFactory::Json(JsonOptions::default());
	let mut filter = TokenFilter::new(test_vocab(), factory, 2, false);
	filter.update(&[]).unwrap();
	assert_eq!(filter.constraint().parsed_text(), "");
}

#[test]
pub fn test_update_out_of_range_token() {
	setup();
	let factory = ConstraintFactory::Json(JsonOptions::default());
	let mut filter = TokenFilter::new(test_vocab(), factory, 2, false);
	assert!(filter.update(&[TEST_VOCAB.len()]).is_err());
}

#[test]
pub fn test_unconstrained_filter_suppresses_nothing() {
	setup();
	let mut filter = TokenFilter::new(test_vocab(), ConstraintFactory::Unconstrained, 2, true);
	// the passthrough's valid group covers the whole vocabulary, so the
	// check resolves without any speculative feeding
	assert_eq!(invalid_set(&mut filter), HashSet::new());
}

#[test]
pub fn test_one_of_filter() {
	setup();
	let vocab: Vec<String> = ["yes", "no", "maybe", "y", "n", " "].iter().map(|t| t.to_string()).collect();
	let factory = ConstraintFactory::OneOf(vec!["yes".to_string(), "no".to_string()]);
	let mut filter = TokenFilter::new(vocab.clone(), factory, 2, true);

	let invalid: HashSet<TokenId> = invalid_set(&mut filter);
	let valid: HashSet<&str> = (0..vocab.len()).filter(|id| !invalid.contains(id)).map(|id| vocab[id].as_str()).collect();
	assert_eq!(valid, HashSet::from(["yes", "no", "y", "n"]));
}
