use tracing::trace;

use crate::{IncrementalParser, ParseFailure, Symbol, TokenGroup};

/// Matches input against a single literal target, character by character.
/// With `nocase`, both the target and fed characters are case-folded.
///
/// End-of-stream is accepted once the full target has been matched.
#[derive(Debug, Clone)]
pub struct StringMatchParser {
	target: Vec<char>,
	nocase: bool,
	parse_idx: usize,
	done: bool,
	parsed: String,
}

impl StringMatchParser {
	pub fn new(target: &str, nocase: bool) -> StringMatchParser {
		let target = if nocase {
			target.chars().map(|c| c.to_ascii_lowercase()).collect()
		} else {
			target.chars().collect()
		};
		StringMatchParser {
			target,
			nocase,
			parse_idx: 0,
			done: false,
			parsed: String::new(),
		}
	}

	pub fn is_done(&self) -> bool {
		self.done
	}

	/// The unmatched remainder of the target.
	fn residual(&self) -> String {
		self.target[self.parse_idx..].iter().collect()
	}
}

impl IncrementalParser for StringMatchParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		let c = match symbol {
			Symbol::Eos => {
				if self.done {
					return Ok(true);
				}
				return Err(ParseFailure::new("end of stream before literal match completed"));
			}
			Symbol::Char(c) => {
				if self.nocase {
					c.to_ascii_lowercase()
				} else {
					c
				}
			}
		};
		let Some(&expected) = self.target.get(self.parse_idx) else {
			return Err(ParseFailure::new(format!("character {c:?} after literal was fully matched")));
		};
		if expected != c {
			return Err(ParseFailure::new(format!("expected {expected:?} in literal, got {c:?}")));
		}
		self.parsed.push(c);
		self.parse_idx += 1;
		self.done = self.parse_idx == self.target.len();
		Ok(self.done)
	}

	fn parsed_text(&self) -> String {
		self.parsed.clone()
	}

	fn boxed_clone(&self) -> Box<dyn IncrementalParser> {
		Box::new(self.clone())
	}

	fn get_next(&self) -> Vec<String> {
		vec![self.residual()]
	}

	fn invalid_token_group(&self) -> TokenGroup {
		TokenGroup::NonAlnum
	}
}

/// Matches input against several literal targets in parallel, dropping
/// candidates as they fail. Reports done on any feed that fully matches
/// some target; longer candidates sharing that prefix keep running, so a
/// later feed may report done again.
#[derive(Debug, Clone)]
pub struct MultiStringMatchParser {
	matchers: Vec<StringMatchParser>,
	running: Vec<usize>,
	parsed: String,
}

impl MultiStringMatchParser {
	pub fn new<I, S>(targets: I) -> MultiStringMatchParser
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let matchers: Vec<StringMatchParser> = targets.into_iter().map(|t| StringMatchParser::new(t.as_ref(), false)).collect();
		let running = (0..matchers.len()).collect();
		MultiStringMatchParser {
			matchers,
			running,
			parsed: String::new(),
		}
	}
}

impl IncrementalParser for MultiStringMatchParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		if self.running.is_empty() {
			return Err(ParseFailure::new("no literal candidates left to match"));
		}
		let mut kept = Vec::with_capacity(self.running.len());
		let mut failures = Vec::new();
		let mut done = false;
		for &i in &self.running {
			match self.matchers[i].feed(symbol) {
				Ok(d) => {
					done = done || d;
					kept.push(i);
				}
				Err(e) => failures.push(e.reason().to_string()),
			}
		}
		if kept.is_empty() {
			return Err(ParseFailure::new(format!("all literal candidates failed: {}", failures.join(", "))));
		}
		trace!("literal candidates narrowed to {}", kept.len());
		self.running = kept;
		self.parsed = self.matchers[self.running[0]].parsed_text();
		Ok(done)
	}

	fn parsed_text(&self) -> String {
		self.parsed.clone()
	}

	fn boxed_clone(&self) -> Box<dyn IncrementalParser> {
		Box::new(self.clone())
	}

	fn get_next(&self) -> Vec<String> {
		self.running.iter().map(|&i| self.matchers[i].residual()).collect()
	}

	fn invalid_token_group(&self) -> TokenGroup {
		TokenGroup::NonAlnum
	}
}
