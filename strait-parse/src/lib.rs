use std::fmt::Debug;

use thiserror::Error;

pub mod group;
pub mod json;
pub mod schema;
pub mod string_match;
pub mod typed;

pub use group::TokenGroup;

/// Error raised when a parser receives input that no completion of its
/// grammar can contain. Parsers are one-shot: after a failure the parser
/// state is unspecified and the parser must be discarded and rebuilt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("parse failure: {reason}")]
pub struct ParseFailure {
	reason: String,
}

impl ParseFailure {
	pub fn new(reason: impl Into<String>) -> ParseFailure {
		ParseFailure { reason: reason.into() }
	}

	pub fn reason(&self) -> &str {
		&self.reason
	}
}

/// One unit of parser input: a character of generated text, or the
/// end-of-stream sentinel. Only an outermost parser holding a complete
/// value accepts `Eos`; every inner parser rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
	Char(char),
	Eos,
}

impl From<char> for Symbol {
	fn from(c: char) -> Symbol {
		Symbol::Char(c)
	}
}

/// A parser that consumes generated text one character at a time and can
/// tell, after every character, whether the accumulated text is still the
/// prefix of something its grammar accepts.
///
/// Cloning through [`IncrementalParser::boxed_clone`] yields a deep,
/// independent snapshot; speculative lookahead feeds the snapshot and
/// discards it, leaving the live parser untouched. This is the hot path of
/// vocabulary filtering, so parser state should stay small.
pub trait IncrementalParser: Send + Debug {
	/// Feed one symbol. Returns whether parsing of this value concluded.
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure>;

	/// The text consumed and validated so far, including the accumulation of
	/// any in-progress subparser.
	fn parsed_text(&self) -> String;

	/// A deep, independent snapshot of the current parser state.
	fn boxed_clone(&self) -> Box<dyn IncrementalParser>;

	/// Feed a sequence of symbols, stopping at the first failure.
	fn feed_all(&mut self, symbols: &[Symbol]) -> Result<bool, ParseFailure> {
		let mut done = false;
		for symbol in symbols {
			done = self.feed(*symbol)?;
		}
		Ok(done)
	}

	/// Feed every character of `text`.
	fn feed_str(&mut self, text: &str) -> Result<bool, ParseFailure> {
		let mut done = false;
		for c in text.chars() {
			done = self.feed(Symbol::Char(c))?;
		}
		Ok(done)
	}

	/// Candidate continuations of the current state, for literal-matching
	/// parsers. Empty for parsers without a finite continuation set.
	fn get_next(&self) -> Vec<String> {
		Vec::new()
	}

	/// A vocabulary subset known to be invalid as a next step. A hint only;
	/// callers still verify unlisted tokens by speculative feeding.
	fn invalid_token_group(&self) -> TokenGroup {
		TokenGroup::Empty
	}

	/// A vocabulary subset known to be acceptable as a next step.
	fn valid_token_group(&self) -> TokenGroup {
		TokenGroup::Empty
	}
}

impl Clone for Box<dyn IncrementalParser> {
	fn clone(&self) -> Box<dyn IncrementalParser> {
		self.boxed_clone()
	}
}

/// A parser that accepts any text and concludes on end-of-stream. The
/// unconstrained counterpart to the grammar parsers, useful when a caller
/// wants the filtering machinery without an actual grammar.
#[derive(Debug, Clone, Default)]
pub struct PassthroughParser {
	parsed: String,
	complete: bool,
}

impl PassthroughParser {
	pub fn new() -> PassthroughParser {
		PassthroughParser::default()
	}
}

impl IncrementalParser for PassthroughParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		if self.complete {
			return Err(ParseFailure::new("got input after end of stream"));
		}
		match symbol {
			Symbol::Char(c) => {
				self.parsed.push(c);
				Ok(false)
			}
			Symbol::Eos => {
				self.complete = true;
				Ok(true)
			}
		}
	}

	fn parsed_text(&self) -> String {
		self.parsed.clone()
	}

	fn boxed_clone(&self) -> Box<dyn IncrementalParser> {
		Box::new(self.clone())
	}

	fn valid_token_group(&self) -> TokenGroup {
		TokenGroup::All
	}
}
