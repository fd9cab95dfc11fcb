use serde::{Deserialize, Serialize};

use crate::{IncrementalParser, ParseFailure, Symbol};

/// Dialect switches for unschematized JSON parsing.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct JsonOptions {
	/// Permit a top-level array in addition to a top-level object.
	pub allow_outer_list: bool,

	/// Permit the outer container to be empty.
	pub allow_empty: bool,

	/// Permit nested containers to be empty.
	pub allow_empty_children: bool,

	/// Permit whitespace between syntactic elements. Never permitted inside
	/// strings or numbers.
	pub allow_whitespace_formatting: bool,
}

impl Default for JsonOptions {
	fn default() -> JsonOptions {
		JsonOptions {
			allow_outer_list: true,
			allow_empty: true,
			allow_empty_children: true,
			allow_whitespace_formatting: false,
		}
	}
}

/// Accepts an unsigned numeric literal: digits with at most one interior
/// period, and a leading zero only when a period follows it directly.
///
/// The literal has no closing delimiter of its own; it ends at the first
/// `,`, `]`, `}` or whitespace character, which is recorded in
/// `closing_char` and left for the parent container to interpret. The
/// closing character is not part of `parsed_text`.
#[derive(Debug, Clone)]
pub struct NumberParser {
	parsed: String,
	has_period: bool,
	leading_zero: bool,
	is_valid: bool,
	closing_char: Option<char>,
}

impl NumberParser {
	pub fn new() -> NumberParser {
		NumberParser {
			parsed: String::new(),
			has_period: false,
			leading_zero: false,
			is_valid: true,
			closing_char: None,
		}
	}

	/// The delimiter that terminated the literal, once done.
	pub fn closing_char(&self) -> Option<char> {
		self.closing_char
	}

	fn is_end_char(c: char) -> bool {
		matches!(c, ',' | ']' | '}') || c.is_whitespace()
	}
}

impl Default for NumberParser {
	fn default() -> NumberParser {
		NumberParser::new()
	}
}

impl IncrementalParser for NumberParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		let Symbol::Char(c) = symbol else {
			return Err(ParseFailure::new("end of stream inside a number"));
		};
		if self.leading_zero {
			if c != '.' {
				return Err(ParseFailure::new("leading zero in integer value"));
			}
			self.leading_zero = false;
		}
		if c.is_ascii_digit() {
			if self.parsed.is_empty() && c == '0' {
				self.leading_zero = true;
			}
			self.parsed.push(c);
			self.is_valid = true;
		} else if c == '.' {
			if self.has_period || self.parsed.is_empty() {
				return Err(ParseFailure::new("invalid position for '.' in number"));
			}
			self.parsed.push(c);
			self.has_period = true;
			// cannot end on a trailing period
			self.is_valid = false;
		} else if NumberParser::is_end_char(c) {
			if !self.is_valid {
				return Err(ParseFailure::new(format!("end character {c:?} after incomplete number {}", self.parsed)));
			}
			self.closing_char = Some(c);
			return Ok(true);
		} else {
			return Err(ParseFailure::new(format!("invalid character for number: {c:?}")));
		}
		Ok(false)
	}

	fn parsed_text(&self) -> String {
		self.parsed.clone()
	}

	fn boxed_clone(&self) -> Box<dyn IncrementalParser> {
		Box::new(self.clone())
	}
}

/// Accepts a double-quoted string. A backslash flags the next character to
/// be copied through verbatim; the backslash itself is not retained, so the
/// accumulated text holds the unwrapped form of every escape.
#[derive(Debug, Clone)]
pub struct StringParser {
	parsed: String,
	escape_next: bool,
}

impl StringParser {
	pub fn new() -> StringParser {
		StringParser {
			parsed: String::from('"'),
			escape_next: false,
		}
	}
}

impl Default for StringParser {
	fn default() -> StringParser {
		StringParser::new()
	}
}

impl IncrementalParser for StringParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		let Symbol::Char(c) = symbol else {
			return Err(ParseFailure::new("end of stream inside a string"));
		};
		if self.escape_next {
			self.parsed.push(c);
			self.escape_next = false;
		} else if c == '"' {
			self.parsed.push(c);
			return Ok(true);
		} else if c == '\\' {
			self.escape_next = true;
		} else {
			self.parsed.push(c);
		}
		Ok(false)
	}

	fn parsed_text(&self) -> String {
		self.parsed.clone()
	}

	fn boxed_clone(&self) -> Box<dyn IncrementalParser> {
		Box::new(self.clone())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerStatus {
	Opened,
	AwaitingKey,
	AwaitingValue,
	InKeySubparser,
	InValueSubparser,
	FinishedKey,
	FinishedValue,
	ParseComplete,
}

#[derive(Debug, Clone)]
enum JsonValueParser {
	Object(Box<ObjectParser>),
	Array(Box<ArrayParser>),
	String(StringParser),
	Number(NumberParser),
}

impl JsonValueParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		match self {
			JsonValueParser::Object(p) => p.feed(symbol),
			JsonValueParser::Array(p) => p.feed(symbol),
			JsonValueParser::String(p) => p.feed(symbol),
			JsonValueParser::Number(p) => p.feed(symbol),
		}
	}

	fn parsed_text(&self) -> String {
		match self {
			JsonValueParser::Object(p) => p.parsed_text(),
			JsonValueParser::Array(p) => p.parsed_text(),
			JsonValueParser::String(p) => p.parsed_text(),
			JsonValueParser::Number(p) => p.parsed_text(),
		}
	}
}

/// Open a value subparser from its first character: `{`, `[`, `"` or a
/// digit. The digit is pre-fed into the number parser.
fn open_value_subparser(c: char, options: JsonOptions) -> Result<JsonValueParser, ParseFailure> {
	match c {
		'{' => Ok(JsonValueParser::Object(Box::new(ObjectParser::child(options)))),
		'[' => Ok(JsonValueParser::Array(Box::new(ArrayParser::child(options)))),
		'"' => Ok(JsonValueParser::String(StringParser::new())),
		c if c.is_ascii_digit() => {
			let mut number = NumberParser::new();
			number.feed(Symbol::Char(c))?;
			Ok(JsonValueParser::Number(number))
		}
		_ => Err(ParseFailure::new(format!("expected start of value, got {c:?}"))),
	}
}

/// State machine for one object level of the unschematized dialect.
/// Assumes the opening brace was already consumed by whoever created it.
#[derive(Debug, Clone)]
pub struct ObjectParser {
	options: JsonOptions,
	allow_empty: bool,
	parsed: String,
	status: ContainerStatus,
	active: Option<JsonValueParser>,
}

impl ObjectParser {
	/// Parser for a top-level object.
	pub fn new(options: JsonOptions) -> ObjectParser {
		ObjectParser::with_allow_empty(options, options.allow_empty)
	}

	/// Parser for a nested object, whose emptiness is governed by
	/// `allow_empty_children`.
	fn child(options: JsonOptions) -> ObjectParser {
		ObjectParser::with_allow_empty(options, options.allow_empty_children)
	}

	fn with_allow_empty(options: JsonOptions, allow_empty: bool) -> ObjectParser {
		ObjectParser {
			options,
			allow_empty,
			parsed: String::from('{'),
			status: ContainerStatus::Opened,
			active: None,
		}
	}

	/// Fold a finished subparser into this object. A number subparser also
	/// consumed this object's delimiter, so the next state derives from its
	/// closing character rather than from fresh input.
	fn close_subparser(&mut self) -> Result<(), ParseFailure> {
		let Some(sub) = self.active.take() else {
			return Err(ParseFailure::new("no subparser to close"));
		};
		self.parsed.push_str(&sub.parsed_text());
		if let JsonValueParser::Number(number) = &sub {
			if let Some(closing) = number.closing_char() {
				if !closing.is_whitespace() {
					self.parsed.push(closing);
					return match closing {
						',' => {
							self.status = ContainerStatus::AwaitingKey;
							Ok(())
						}
						'}' => {
							self.status = ContainerStatus::ParseComplete;
							Ok(())
						}
						_ => Err(ParseFailure::new(format!("expected ',' or '}}', got {closing:?} after number"))),
					};
				}
			}
		}
		if self.status == ContainerStatus::InValueSubparser {
			self.status = ContainerStatus::FinishedValue;
		} else {
			self.status = ContainerStatus::FinishedKey;
		}
		Ok(())
	}
}

impl IncrementalParser for ObjectParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		if let Some(active) = self.active.as_mut() {
			let done = active.feed(symbol)?;
			if done {
				self.close_subparser()?;
				return Ok(self.status == ContainerStatus::ParseComplete);
			}
			return Ok(false);
		}
		let Symbol::Char(c) = symbol else {
			return Err(ParseFailure::new("end of stream inside an object"));
		};
		if c.is_whitespace() {
			if !self.options.allow_whitespace_formatting {
				return Err(ParseFailure::new("whitespace in JSON body"));
			}
			self.parsed.push(c);
			return Ok(false);
		}
		match self.status {
			ContainerStatus::Opened => match c {
				'}' => {
					if !self.allow_empty {
						return Err(ParseFailure::new("empty object not permitted"));
					}
					self.parsed.push(c);
					self.status = ContainerStatus::ParseComplete;
					Ok(true)
				}
				'"' => {
					self.active = Some(JsonValueParser::String(StringParser::new()));
					self.status = ContainerStatus::InKeySubparser;
					Ok(false)
				}
				_ => Err(ParseFailure::new(format!("expected '}}' or '\"', got {c:?}"))),
			},
			ContainerStatus::AwaitingKey => match c {
				'"' => {
					self.active = Some(JsonValueParser::String(StringParser::new()));
					self.status = ContainerStatus::InKeySubparser;
					Ok(false)
				}
				_ => Err(ParseFailure::new(format!("expected '\"', got {c:?}"))),
			},
			ContainerStatus::FinishedKey => match c {
				':' => {
					self.parsed.push(c);
					self.status = ContainerStatus::AwaitingValue;
					Ok(false)
				}
				_ => Err(ParseFailure::new(format!("expected ':', got {c:?}"))),
			},
			ContainerStatus::AwaitingValue => {
				self.active = Some(open_value_subparser(c, self.options)?);
				self.status = ContainerStatus::InValueSubparser;
				Ok(false)
			}
			ContainerStatus::FinishedValue => match c {
				',' => {
					self.parsed.push(c);
					self.status = ContainerStatus::AwaitingKey;
					Ok(false)
				}
				'}' => {
					self.parsed.push(c);
					self.status = ContainerStatus::ParseComplete;
					Ok(true)
				}
				_ => Err(ParseFailure::new(format!("expected ',' or '}}', got {c:?}"))),
			},
			ContainerStatus::ParseComplete => Err(ParseFailure::new(format!("input after object closed: {c:?}"))),
			ContainerStatus::InKeySubparser | ContainerStatus::InValueSubparser => Err(ParseFailure::new("object parser in inconsistent state")),
		}
	}

	fn parsed_text(&self) -> String {
		let mut parsed = self.parsed.clone();
		if let Some(active) = &self.active {
			parsed.push_str(&active.parsed_text());
		}
		parsed
	}

	fn boxed_clone(&self) -> Box<dyn IncrementalParser> {
		Box::new(self.clone())
	}
}

/// State machine for one array level of the unschematized dialect. The
/// same shape as [ObjectParser], minus the key states.
#[derive(Debug, Clone)]
pub struct ArrayParser {
	options: JsonOptions,
	allow_empty: bool,
	parsed: String,
	status: ContainerStatus,
	active: Option<JsonValueParser>,
}

impl ArrayParser {
	/// Parser for a top-level array.
	pub fn new(options: JsonOptions) -> ArrayParser {
		ArrayParser::with_allow_empty(options, options.allow_empty)
	}

	fn child(options: JsonOptions) -> ArrayParser {
		ArrayParser::with_allow_empty(options, options.allow_empty_children)
	}

	fn with_allow_empty(options: JsonOptions, allow_empty: bool) -> ArrayParser {
		ArrayParser {
			options,
			allow_empty,
			parsed: String::from('['),
			status: ContainerStatus::Opened,
			active: None,
		}
	}

	fn close_subparser(&mut self) -> Result<(), ParseFailure> {
		let Some(sub) = self.active.take() else {
			return Err(ParseFailure::new("no subparser to close"));
		};
		self.parsed.push_str(&sub.parsed_text());
		if let JsonValueParser::Number(number) = &sub {
			if let Some(closing) = number.closing_char() {
				if !closing.is_whitespace() {
					self.parsed.push(closing);
					return match closing {
						',' => {
							self.status = ContainerStatus::AwaitingValue;
							Ok(())
						}
						']' => {
							self.status = ContainerStatus::ParseComplete;
							Ok(())
						}
						_ => Err(ParseFailure::new(format!("expected ',' or ']', got {closing:?} after number"))),
					};
				}
			}
		}
		self.status = ContainerStatus::FinishedValue;
		Ok(())
	}
}

impl IncrementalParser for ArrayParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		if let Some(active) = self.active.as_mut() {
			let done = active.feed(symbol)?;
			if done {
				self.close_subparser()?;
				return Ok(self.status == ContainerStatus::ParseComplete);
			}
			return Ok(false);
		}
		let Symbol::Char(c) = symbol else {
			return Err(ParseFailure::new("end of stream inside an array"));
		};
		if c.is_whitespace() {
			if !self.options.allow_whitespace_formatting {
				return Err(ParseFailure::new("whitespace in JSON body"));
			}
			self.parsed.push(c);
			return Ok(false);
		}
		match self.status {
			ContainerStatus::Opened => {
				if c == ']' {
					if !self.allow_empty {
						return Err(ParseFailure::new("empty array not permitted"));
					}
					self.parsed.push(c);
					self.status = ContainerStatus::ParseComplete;
					return Ok(true);
				}
				self.active = Some(open_value_subparser(c, self.options)?);
				self.status = ContainerStatus::InValueSubparser;
				Ok(false)
			}
			ContainerStatus::AwaitingValue => {
				self.active = Some(open_value_subparser(c, self.options)?);
				self.status = ContainerStatus::InValueSubparser;
				Ok(false)
			}
			ContainerStatus::FinishedValue => match c {
				',' => {
					self.parsed.push(c);
					self.status = ContainerStatus::AwaitingValue;
					Ok(false)
				}
				']' => {
					self.parsed.push(c);
					self.status = ContainerStatus::ParseComplete;
					Ok(true)
				}
				_ => Err(ParseFailure::new(format!("expected ',' or ']', got {c:?}"))),
			},
			ContainerStatus::ParseComplete => Err(ParseFailure::new(format!("input after array closed: {c:?}"))),
			_ => Err(ParseFailure::new("array parser in inconsistent state")),
		}
	}

	fn parsed_text(&self) -> String {
		let mut parsed = self.parsed.clone();
		if let Some(active) = &self.active {
			parsed.push_str(&active.parsed_text());
		}
		parsed
	}

	fn boxed_clone(&self) -> Box<dyn IncrementalParser> {
		Box::new(self.clone())
	}
}

/// Outer parser for the unschematized dialect: expects `{` (or `[` when
/// the dialect allows a top-level array), hands everything to the container
/// parser, then gates end-of-stream.
#[derive(Debug, Clone)]
pub struct JsonParser {
	options: JsonOptions,
	subparser: Option<JsonValueParser>,
	complete: bool,
}

impl JsonParser {
	pub fn new(options: JsonOptions) -> JsonParser {
		JsonParser {
			options,
			subparser: None,
			complete: false,
		}
	}
}

impl Default for JsonParser {
	fn default() -> JsonParser {
		JsonParser::new(JsonOptions::default())
	}
}

impl IncrementalParser for JsonParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		if self.subparser.is_none() {
			let Symbol::Char(c) = symbol else {
				return Err(ParseFailure::new("end of stream before any value"));
			};
			let opened = match c {
				'{' => JsonValueParser::Object(Box::new(ObjectParser::new(self.options))),
				'[' if self.options.allow_outer_list => JsonValueParser::Array(Box::new(ArrayParser::new(self.options))),
				_ => {
					let expected = if self.options.allow_outer_list { "'{' or '['" } else { "'{'" };
					return Err(ParseFailure::new(format!("expected {expected}, got {c:?}")));
				}
			};
			self.subparser = Some(opened);
			return Ok(false);
		}
		if self.complete {
			return match symbol {
				Symbol::Eos => Ok(true),
				Symbol::Char(c) => Err(ParseFailure::new(format!("expected end of stream after close, got {c:?}"))),
			};
		}
		if symbol == Symbol::Eos {
			return Err(ParseFailure::new("end of stream before value closed"));
		}
		let done = match self.subparser.as_mut() {
			Some(sub) => sub.feed(symbol)?,
			None => return Err(ParseFailure::new("json parser in inconsistent state")),
		};
		if done {
			self.complete = true;
			return Ok(true);
		}
		Ok(false)
	}

	fn parsed_text(&self) -> String {
		self.subparser.as_ref().map(|s| s.parsed_text()).unwrap_or_default()
	}

	fn boxed_clone(&self) -> Box<dyn IncrementalParser> {
		Box::new(self.clone())
	}
}
