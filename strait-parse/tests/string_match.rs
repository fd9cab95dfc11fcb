use std::sync::Once;

use strait_parse::string_match::{MultiStringMatchParser, StringMatchParser};
use strait_parse::{IncrementalParser, Symbol, TokenGroup};

static INIT: Once = Once::new();

pub fn setup() {
	INIT.call_once(|| {
		tracing_subscriber::fmt::init();
	});
}

#[test]
pub fn test_match_success() {
	setup();
	let mut parser = StringMatchParser::new("hello", false);
	assert!(!parser.feed(Symbol::Char('h')).unwrap());
	assert!(!parser.feed(Symbol::Char('e')).unwrap());
	assert!(!parser.feed(Symbol::Char('l')).unwrap());
	assert!(!parser.feed(Symbol::Char('l')).unwrap());
	assert!(parser.feed(Symbol::Char('o')).unwrap());
	assert!(parser.feed(Symbol::Eos).unwrap());
	assert_eq!(parser.parsed_text(), "hello");
}

#[test]
pub fn test_match_failure() {
	setup();
	let mut parser = StringMatchParser::new("hello", false);
	parser.feed_str("hell").unwrap();
	assert!(parser.feed(Symbol::Char('x')).is_err());
}

#[test]
pub fn test_match_eos_before_completion() {
	setup();
	let mut parser = StringMatchParser::new("hello", false);
	parser.feed_str("hel").unwrap();
	assert!(parser.feed(Symbol::Eos).is_err());
}

#[test]
pub fn test_match_nocase() {
	setup();
	let mut parser = StringMatchParser::new("hello", true);
	assert!(!parser.feed(Symbol::Char('H')).unwrap());
	parser.feed_str("ELLO").unwrap();
	assert!(parser.is_done());
}

#[test]
pub fn test_match_get_next() {
	setup();
	let mut parser = StringMatchParser::new("hello", false);
	parser.feed_str("he").unwrap();
	assert_eq!(parser.get_next(), vec!["llo".to_string()]);
}

#[test]
pub fn test_match_after_completion_fails() {
	setup();
	let mut parser = StringMatchParser::new("hi", false);
	assert!(parser.feed_str("hi").unwrap());
	assert!(parser.feed(Symbol::Char('!')).is_err());
}

#[test]
pub fn test_multi_match_success() {
	setup();
	let mut parser = MultiStringMatchParser::new(["hello", "hello world"]);
	assert!(!parser.feed(Symbol::Char('h')).unwrap());
	assert!(!parser.feed(Symbol::Char('e')).unwrap());
	assert!(!parser.feed(Symbol::Char('l')).unwrap());
	assert!(!parser.feed(Symbol::Char('l')).unwrap());
	// first candidate completed, second keeps running
	assert!(parser.feed(Symbol::Char('o')).unwrap());
	assert!(!parser.feed(Symbol::Char(' ')).unwrap());
	assert!(!parser.feed(Symbol::Char('w')).unwrap());
	assert!(parser.feed(Symbol::Char('x')).is_err());
}

#[test]
pub fn test_multi_match_failure() {
	setup();
	let mut parser = MultiStringMatchParser::new(["hello", "world"]);
	parser.feed_str("hell").unwrap();
	assert!(parser.feed(Symbol::Char('x')).is_err());
}

#[test]
pub fn test_multi_match_invalid_mixed_string() {
	setup();
	let mut parser = MultiStringMatchParser::new(["George", "Isaac"]);
	assert!(parser.feed_str("IGsaeoac").is_err());
}

#[test]
pub fn test_multi_match_get_next() {
	setup();
	let mut parser = MultiStringMatchParser::new(["name", "nation", "age"]);
	parser.feed_str("na").unwrap();
	assert_eq!(parser.get_next(), vec!["me".to_string(), "tion".to_string()]);
}

#[test]
pub fn test_multi_match_parsed_text_tracks_running() {
	setup();
	let mut parser = MultiStringMatchParser::new(["first_name", "last_name"]);
	parser.feed_str("first").unwrap();
	assert_eq!(parser.parsed_text(), "first");
}

#[test]
pub fn test_multi_match_eos() {
	setup();
	let mut parser = MultiStringMatchParser::new(["hello", "hello world"]);
	parser.feed_str("hello").unwrap();
	// EOS is acceptable because one candidate is fully matched
	assert!(parser.feed(Symbol::Eos).unwrap());
}

#[test]
pub fn test_multi_match_invalid_group() {
	setup();
	let parser = MultiStringMatchParser::new(["hello"]);
	let group = parser.invalid_token_group();
	assert_eq!(group, TokenGroup::NonAlnum);
	assert!(group.contains("{\""));
	assert!(!group.contains("hel"));
	assert!(!group.contains("_x"));
}

#[test]
pub fn test_copy_is_independent() {
	setup();
	let mut parser = MultiStringMatchParser::new(["alpha", "beta"]);
	parser.feed_str("al").unwrap();

	let mut copy = parser.boxed_clone();
	copy.feed_str("pha").unwrap();

	assert_eq!(parser.parsed_text(), "al");
	assert_eq!(parser.get_next(), vec!["pha".to_string()]);
}
