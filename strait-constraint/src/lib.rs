use tracing::debug;

use strait_parse::{IncrementalParser, ParseFailure, Symbol, TokenGroup};

pub mod config;
pub mod factory;
pub mod filter;

pub use config::{ConstraintConfig, ConstraintError};
pub use factory::{force_json_schema, one_of, unconstrained, valid_json, ConstraintFactory};
pub use filter::{InvalidTokens, TokenFilter, TokenId};

/// A prefix-validity constraint over one outermost incremental parser.
///
/// `advance` commits sampled text to the live parser; `would_accept`
/// speculates on a snapshot and leaves the live state untouched. Once an
/// `advance` fails the constraint is poisoned and must be rebuilt from its
/// factory.
#[derive(Debug, Clone)]
pub struct SyntaxConstraint {
	parser: Box<dyn IncrementalParser>,
}

impl SyntaxConstraint {
	pub fn new(parser: Box<dyn IncrementalParser>) -> SyntaxConstraint {
		SyntaxConstraint { parser }
	}

	/// Feed sampled text into the live parser.
	pub fn advance(&mut self, text: &str) -> Result<(), ParseFailure> {
		debug!("advance: {text:?}");
		self.parser.feed_str(text)?;
		Ok(())
	}

	/// Feed a symbol sequence into the live parser.
	pub fn advance_symbols(&mut self, symbols: &[Symbol]) -> Result<(), ParseFailure> {
		self.parser.feed_all(symbols)?;
		Ok(())
	}

	/// Feed the end-of-stream sentinel into the live parser.
	pub fn advance_eos(&mut self) -> Result<(), ParseFailure> {
		self.parser.feed(Symbol::Eos)?;
		Ok(())
	}

	/// Whether the accumulated output would stay prefix-valid after `text`.
	/// The empty extension is never accepted.
	pub fn would_accept(&self, text: &str) -> bool {
		if text.is_empty() {
			return false;
		}
		let mut snapshot = self.parser.boxed_clone();
		snapshot.feed_str(text).is_ok()
	}

	/// Like [`SyntaxConstraint::would_accept`] for a symbol sequence.
	pub fn would_accept_symbols(&self, symbols: &[Symbol]) -> bool {
		if symbols.is_empty() {
			return false;
		}
		let mut snapshot = self.parser.boxed_clone();
		snapshot.feed_all(symbols).is_ok()
	}

	/// Whether the stream may end here.
	pub fn would_accept_eos(&self) -> bool {
		let mut snapshot = self.parser.boxed_clone();
		snapshot.feed(Symbol::Eos).is_ok()
	}

	/// Candidate continuations, for literal-matching parsers.
	pub fn get_next(&self) -> Vec<String> {
		self.parser.get_next()
	}

	pub fn invalid_token_group(&self) -> TokenGroup {
		self.parser.invalid_token_group()
	}

	pub fn valid_token_group(&self) -> TokenGroup {
		self.parser.valid_token_group()
	}

	/// The text accepted so far.
	pub fn parsed_text(&self) -> String {
		self.parser.parsed_text()
	}
}
