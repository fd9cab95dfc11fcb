use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::json::{NumberParser, StringParser};
use crate::schema::{BaseType, JsonSchema, ObjectSchema};
use crate::string_match::MultiStringMatchParser;
use crate::{IncrementalParser, ParseFailure, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypedStatus {
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
enum TypedValueParser {
	Object(Box<TypedObjectParser>),
	Array(Box<TypedArrayParser>),
	String(StringParser),
	Number(NumberParser),
	Keys(MultiStringMatchParser),
}

impl TypedValueParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		match self {
			TypedValueParser::Object(p) => p.feed(symbol),
			TypedValueParser::Array(p) => p.feed(symbol),
			TypedValueParser::String(p) => p.feed(symbol),
			TypedValueParser::Number(p) => p.feed(symbol),
			TypedValueParser::Keys(p) => p.feed(symbol),
		}
	}

	fn parsed_text(&self) -> String {
		match self {
			TypedValueParser::Object(p) => p.parsed_text(),
			TypedValueParser::Array(p) => p.parsed_text(),
			TypedValueParser::String(p) => p.parsed_text(),
			TypedValueParser::Number(p) => p.parsed_text(),
			TypedValueParser::Keys(p) => p.parsed_text(),
		}
	}
}

/// Parses one JSON object level against an object schema: every key must
/// name a not-yet-used schema property, values must match their declared
/// shape, and the object can only close once no required key is
/// outstanding. Key text is matched through a [MultiStringMatchParser]
/// seeded with the remaining property names.
///
/// Cloning copies the remaining-key bookkeeping and any active subparser;
/// the schema tree itself is shared.
#[derive(Debug, Clone)]
pub struct TypedObjectParser {
	schema: Arc<JsonSchema>,
	parsed: String,
	status: TypedStatus,
	active: Option<TypedValueParser>,
	current_key: Option<String>,
	remaining_required: BTreeSet<String>,
	remaining_optional: BTreeSet<String>,
}

impl TypedObjectParser {
	/// Assumes the opening brace was already consumed. `schema` must be an
	/// object schema.
	pub fn new(schema: Arc<JsonSchema>) -> Result<TypedObjectParser, ParseFailure> {
		let JsonSchema::Object(object) = schema.as_ref() else {
			return Err(ParseFailure::new("object encountered where the schema expects a base type"));
		};
		let remaining_required = object.keys(false).map(|k| k.name.clone()).collect();
		let remaining_optional = object.keys(true).map(|k| k.name.clone()).collect();
		Ok(TypedObjectParser {
			schema: schema.clone(),
			parsed: String::from('{'),
			status: TypedStatus::Opened,
			active: None,
			current_key: None,
			remaining_required,
			remaining_optional,
		})
	}

	fn object_schema(&self) -> &ObjectSchema {
		match self.schema.as_ref() {
			JsonSchema::Object(o) => o,
			JsonSchema::Base(_) => unreachable!("typed object parser constructed without an object schema"),
		}
	}

	/// Remaining property names, required first, each group ordered.
	fn remaining_keys(&self) -> Vec<String> {
		self.remaining_required.iter().chain(self.remaining_optional.iter()).cloned().collect()
	}

	fn is_complete(&self) -> bool {
		self.remaining_required.is_empty()
	}

	fn update_remaining(&mut self, key: &str) {
		if !self.remaining_required.remove(key) {
			self.remaining_optional.remove(key);
		}
	}

	fn value_schema(&self, key: &str) -> Result<Arc<JsonSchema>, ParseFailure> {
		self.object_schema()
			.get(key)
			.cloned()
			.ok_or_else(|| ParseFailure::new(format!("no schema for key {key:?}")))
	}

	fn open_key_subparser(&mut self) -> Result<(), ParseFailure> {
		let remaining = self.remaining_keys();
		if remaining.is_empty() {
			return Err(ParseFailure::new("no keys remaining to parse"));
		}
		self.active = Some(TypedValueParser::Keys(MultiStringMatchParser::new(remaining)));
		self.status = TypedStatus::InKeySubparser;
		Ok(())
	}

	fn open_value_subparser(&mut self, c: char) -> Result<(), ParseFailure> {
		let Some(key) = self.current_key.clone() else {
			return Err(ParseFailure::new("value with no current key"));
		};
		let schema = self.value_schema(&key)?;
		let parser = if schema.is_list() {
			if c != '[' {
				return Err(ParseFailure::new(format!("expected '[' for list value of key {key:?}, got {c:?}")));
			}
			TypedValueParser::Array(Box::new(TypedArrayParser::new(schema)))
		} else {
			match (schema.as_ref(), c) {
				(JsonSchema::Object(_), '{') => TypedValueParser::Object(Box::new(TypedObjectParser::new(schema.clone())?)),
				(JsonSchema::Base(b), '"') if b.base_type == BaseType::String => TypedValueParser::String(StringParser::new()),
				(JsonSchema::Base(b), _) if b.base_type == BaseType::Number && c.is_ascii_digit() => {
					let mut number = NumberParser::new();
					number.feed(Symbol::Char(c))?;
					TypedValueParser::Number(number)
				}
				_ => return Err(ParseFailure::new(format!("expected start of value for key {key:?}, got {c:?}"))),
			}
		};
		self.active = Some(parser);
		self.status = TypedStatus::InValueSubparser;
		Ok(())
	}

	/// Fold a finished subparser into this object. A key match leaves the
	/// status untouched until the closing quote arrives; a number also
	/// consumed this object's delimiter and the next state derives from its
	/// closing character.
	fn close_subparser(&mut self) -> Result<(), ParseFailure> {
		let Some(sub) = self.active.take() else {
			return Err(ParseFailure::new("no subparser to close"));
		};
		let sub_parsed = sub.parsed_text();
		self.parsed.push_str(&sub_parsed);
		if let TypedValueParser::Number(number) = &sub {
			if let Some(closing) = number.closing_char() {
				if !closing.is_whitespace() {
					self.parsed.push(closing);
					let key = self.current_key.clone().ok_or_else(|| ParseFailure::new("value closed with no current key"))?;
					self.update_remaining(&key);
					return match closing {
						',' => {
							self.status = TypedStatus::AwaitingKey;
							Ok(())
						}
						'}' => {
							if !self.is_complete() {
								return Err(ParseFailure::new(format!(
									"object closed with required keys missing: {:?}",
									self.remaining_required
								)));
							}
							self.status = TypedStatus::ParseComplete;
							Ok(())
						}
						_ => Err(ParseFailure::new(format!("expected ',' or '}}', got {closing:?} after number"))),
					};
				}
			}
		}
		if self.status == TypedStatus::InValueSubparser {
			let key = self.current_key.clone().ok_or_else(|| ParseFailure::new("value closed with no current key"))?;
			self.update_remaining(&key);
			debug!("schema key {key:?} satisfied");
			self.status = TypedStatus::FinishedValue;
		} else {
			// key matched; await the closing quote before moving on
			self.current_key = Some(sub_parsed);
		}
		Ok(())
	}
}

impl IncrementalParser for TypedObjectParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		if let Some(active) = self.active.as_mut() {
			let done = active.feed(symbol)?;
			if done {
				self.close_subparser()?;
				return Ok(self.status == TypedStatus::ParseComplete);
			}
			return Ok(false);
		}
		let Symbol::Char(c) = symbol else {
			return Err(ParseFailure::new("end of stream inside an object"));
		};
		if c.is_whitespace() {
			return Err(ParseFailure::new("whitespace in JSON body"));
		}
		match self.status {
			TypedStatus::Opened => match c {
				'}' => {
					if !self.is_complete() {
						return Err(ParseFailure::new(format!(
							"object closed with required keys missing: {:?}",
							self.remaining_required
						)));
					}
					self.parsed.push(c);
					self.status = TypedStatus::ParseComplete;
					Ok(true)
				}
				'"' => {
					self.open_key_subparser()?;
					Ok(false)
				}
				_ => Err(ParseFailure::new(format!("expected '}}' or '\"', got {c:?}"))),
			},
			TypedStatus::AwaitingKey => match c {
				'"' => {
					self.open_key_subparser()?;
					Ok(false)
				}
				_ => Err(ParseFailure::new(format!("expected '\"', got {c:?}"))),
			},
			TypedStatus::InKeySubparser => match c {
				// the key matcher already concluded; only its closing quote is left
				'"' => {
					self.parsed.push(c);
					self.status = TypedStatus::FinishedKey;
					Ok(false)
				}
				_ => Err(ParseFailure::new(format!("expected '\"' after key, got {c:?}"))),
			},
			TypedStatus::FinishedKey => match c {
				':' => {
					self.parsed.push(c);
					self.status = TypedStatus::AwaitingValue;
					Ok(false)
				}
				_ => Err(ParseFailure::new(format!("expected ':', got {c:?}"))),
			},
			TypedStatus::AwaitingValue => {
				self.open_value_subparser(c)?;
				Ok(false)
			}
			TypedStatus::FinishedValue => {
				if c == ',' && !self.remaining_keys().is_empty() {
					self.parsed.push(c);
					self.status = TypedStatus::AwaitingKey;
					return Ok(false);
				}
				if c == '}' && self.is_complete() {
					self.parsed.push(c);
					self.status = TypedStatus::ParseComplete;
					return Ok(true);
				}
				Err(ParseFailure::new(format!("expected ',' or '}}', got {c:?}")))
			}
			TypedStatus::ParseComplete => Err(ParseFailure::new(format!("input after object closed: {c:?}"))),
			TypedStatus::InValueSubparser => Err(ParseFailure::new("object parser in inconsistent state")),
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

/// Parses a homogeneous JSON array whose element shape is dictated by a
/// list-typed schema: objects open with `{`, string elements with `"`,
/// number elements with a digit.
#[derive(Debug, Clone)]
pub struct TypedArrayParser {
	schema: Arc<JsonSchema>,
	parsed: String,
	status: TypedStatus,
	active: Option<TypedValueParser>,
}

impl TypedArrayParser {
	/// Assumes the opening bracket was already consumed. `schema` is the
	/// list-typed schema this array realizes.
	pub fn new(schema: Arc<JsonSchema>) -> TypedArrayParser {
		TypedArrayParser {
			schema,
			parsed: String::from('['),
			status: TypedStatus::Opened,
			active: None,
		}
	}

	fn open_element_subparser(&mut self, c: char) -> Result<(), ParseFailure> {
		let parser = match (self.schema.as_ref(), c) {
			(JsonSchema::Object(_), '{') => TypedValueParser::Object(Box::new(TypedObjectParser::new(self.schema.clone())?)),
			(JsonSchema::Base(b), '"') if b.base_type == BaseType::String => TypedValueParser::String(StringParser::new()),
			(JsonSchema::Base(b), _) if b.base_type == BaseType::Number && c.is_ascii_digit() => {
				let mut number = NumberParser::new();
				number.feed(Symbol::Char(c))?;
				TypedValueParser::Number(number)
			}
			_ => return Err(ParseFailure::new(format!("expected start of list element, got {c:?}"))),
		};
		self.active = Some(parser);
		self.status = TypedStatus::InValueSubparser;
		Ok(())
	}

	fn close_subparser(&mut self) -> Result<(), ParseFailure> {
		let Some(sub) = self.active.take() else {
			return Err(ParseFailure::new("no subparser to close"));
		};
		self.parsed.push_str(&sub.parsed_text());
		if let TypedValueParser::Number(number) = &sub {
			if let Some(closing) = number.closing_char() {
				if !closing.is_whitespace() {
					self.parsed.push(closing);
					return match closing {
						',' => {
							self.status = TypedStatus::AwaitingValue;
							Ok(())
						}
						']' => {
							self.status = TypedStatus::ParseComplete;
							Ok(())
						}
						_ => Err(ParseFailure::new(format!("expected ',' or ']', got {closing:?} after number"))),
					};
				}
			}
		}
		self.status = TypedStatus::FinishedValue;
		Ok(())
	}
}

impl IncrementalParser for TypedArrayParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		if let Some(active) = self.active.as_mut() {
			let done = active.feed(symbol)?;
			if done {
				self.close_subparser()?;
				return Ok(self.status == TypedStatus::ParseComplete);
			}
			return Ok(false);
		}
		let Symbol::Char(c) = symbol else {
			return Err(ParseFailure::new("end of stream inside an array"));
		};
		if c.is_whitespace() {
			return Err(ParseFailure::new("whitespace in JSON body"));
		}
		match self.status {
			TypedStatus::Opened => {
				if c == ']' {
					self.parsed.push(c);
					self.status = TypedStatus::ParseComplete;
					return Ok(true);
				}
				self.open_element_subparser(c)?;
				Ok(false)
			}
			TypedStatus::AwaitingValue => {
				self.open_element_subparser(c)?;
				Ok(false)
			}
			TypedStatus::FinishedValue => match c {
				',' => {
					self.parsed.push(c);
					self.status = TypedStatus::AwaitingValue;
					Ok(false)
				}
				']' => {
					self.parsed.push(c);
					self.status = TypedStatus::ParseComplete;
					Ok(true)
				}
				_ => Err(ParseFailure::new(format!("expected ',' or ']', got {c:?}"))),
			},
			TypedStatus::ParseComplete => Err(ParseFailure::new(format!("input after array closed: {c:?}"))),
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

/// Outer schema-constrained parser: opens the container the schema root
/// dictates (`[` for list schemas, `{` for object schemas), forwards
/// everything to it, then gates end-of-stream.
#[derive(Debug, Clone)]
pub struct TypedJsonParser {
	schema: Arc<JsonSchema>,
	subparser: Option<TypedValueParser>,
	complete: bool,
}

impl TypedJsonParser {
	pub fn new(schema: Arc<JsonSchema>) -> TypedJsonParser {
		TypedJsonParser {
			schema,
			subparser: None,
			complete: false,
		}
	}
}

impl IncrementalParser for TypedJsonParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		if self.subparser.is_none() {
			let Symbol::Char(c) = symbol else {
				return Err(ParseFailure::new("end of stream before any value"));
			};
			let opened = if self.schema.is_list() {
				if c != '[' {
					return Err(ParseFailure::new(format!("expected '[', got {c:?}")));
				}
				TypedValueParser::Array(Box::new(TypedArrayParser::new(self.schema.clone())))
			} else {
				if matches!(self.schema.as_ref(), JsonSchema::Base(_)) {
					return Err(ParseFailure::new("bare base-type schema has no JSON container form"));
				}
				if c != '{' {
					return Err(ParseFailure::new(format!("expected '{{', got {c:?}")));
				}
				TypedValueParser::Object(Box::new(TypedObjectParser::new(self.schema.clone())?))
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
