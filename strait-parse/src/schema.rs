use std::sync::Arc;

use crate::string_match::StringMatchParser;
use crate::{IncrementalParser, ParseFailure, Symbol};

/// A JSON shape permitted by the schema language. Trees are immutable once
/// the schema parser finishes; constrained parsers share subtrees by
/// reference and clone only their own state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonSchema {
	Base(BaseTypeSchema),
	Object(ObjectSchema),
}

impl JsonSchema {
	pub fn is_list(&self) -> bool {
		match self {
			JsonSchema::Base(b) => b.is_list,
			JsonSchema::Object(o) => o.is_list,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
	String,
	Number,
}

impl BaseType {
	pub fn schema(self, is_list: bool) -> BaseTypeSchema {
		BaseTypeSchema { base_type: self, is_list }
	}

	fn keyword(self) -> &'static str {
		match self {
			BaseType::String => "string",
			BaseType::Number => "number",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseTypeSchema {
	pub base_type: BaseType,
	pub is_list: bool,
}

/// A property name together with its optionality marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaKey {
	pub name: String,
	pub optional: bool,
}

impl SchemaKey {
	pub fn required(name: impl Into<String>) -> SchemaKey {
		SchemaKey {
			name: name.into(),
			optional: false,
		}
	}

	pub fn optional(name: impl Into<String>) -> SchemaKey {
		SchemaKey {
			name: name.into(),
			optional: true,
		}
	}
}

/// An object shape: an ordered property list. Equality is structural and
/// order-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectSchema {
	pub is_list: bool,
	children: Vec<(SchemaKey, Arc<JsonSchema>)>,
}

impl ObjectSchema {
	pub fn new(is_list: bool) -> ObjectSchema {
		ObjectSchema {
			is_list,
			children: Vec::new(),
		}
	}

	pub fn add_prop(&mut self, key: SchemaKey, value: Arc<JsonSchema>) {
		self.children.push((key, value));
	}

	pub fn keys(&self, optional: bool) -> impl Iterator<Item = &SchemaKey> {
		self.children.iter().map(|(k, _)| k).filter(move |k| k.optional == optional)
	}

	pub fn items(&self) -> impl Iterator<Item = (&SchemaKey, &Arc<JsonSchema>)> {
		self.children.iter().map(|(k, v)| (k, v))
	}

	pub fn get(&self, name: &str) -> Option<&Arc<JsonSchema>> {
		self.children.iter().find(|(k, _)| k.name == name).map(|(_, v)| v)
	}
}

/// Greedily consumes a property name (`[A-Za-z_][A-Za-z0-9_]*`). The first
/// character outside the name class concludes the parse; that character is
/// not consumed and the parent decides what it means.
#[derive(Debug, Clone, Default)]
pub struct PropNameParser {
	parsed: String,
}

impl PropNameParser {
	pub fn new() -> PropNameParser {
		PropNameParser::default()
	}

	fn valid_char(&self, c: char) -> bool {
		if self.parsed.is_empty() {
			c.is_alphabetic() || c == '_'
		} else {
			c.is_alphanumeric() || c == '_'
		}
	}
}

impl IncrementalParser for PropNameParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		let Symbol::Char(c) = symbol else {
			return Err(ParseFailure::new("end of stream inside a property name"));
		};
		if !self.valid_char(c) {
			return Ok(true);
		}
		self.parsed.push(c);
		Ok(false)
	}

	fn parsed_text(&self) -> String {
		self.parsed.clone()
	}

	fn boxed_clone(&self) -> Box<dyn IncrementalParser> {
		Box::new(self.clone())
	}
}

const ARRAY_MARKER: &str = "[]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaParseStatus {
	Opened,
	AwaitingKey,
	AwaitingValue,
	AwaitingObject,
	InKeySubparser,
	InArrayMarkerSubparser,
	InValueSubparser,
	FinishedKey,
	FinishedValue,
	ParseComplete,
}

#[derive(Debug, Clone)]
enum SchemaSubparser {
	Name(PropNameParser),
	Literal(StringMatchParser),
	Object(Box<ObjectSchemaParser>),
}

impl SchemaSubparser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		match self {
			SchemaSubparser::Name(p) => p.feed(symbol),
			SchemaSubparser::Literal(p) => p.feed(symbol),
			SchemaSubparser::Object(p) => p.feed(symbol),
		}
	}

	fn parsed_text(&self) -> String {
		match self {
			SchemaSubparser::Name(p) => p.parsed_text(),
			SchemaSubparser::Literal(p) => p.parsed_text(),
			SchemaSubparser::Object(p) => p.parsed_text(),
		}
	}
}

/// Parses the object form of the schema language into an [ObjectSchema]:
/// `{ name ('?')? ':' value (',' ...)* }` where a value is `[]`-prefixed
/// object or base-type keyword. Whitespace between tokens is skipped.
/// Assumes the opening brace was already consumed.
#[derive(Debug, Clone)]
pub struct ObjectSchemaParser {
	value: ObjectSchema,
	parsed: String,
	status: SchemaParseStatus,
	active: Option<SchemaSubparser>,
	curr_key: Option<SchemaKey>,
	curr_basetype: Option<BaseTypeSchema>,
	array_set: bool,
}

impl ObjectSchemaParser {
	pub fn new() -> ObjectSchemaParser {
		ObjectSchemaParser {
			value: ObjectSchema::new(false),
			parsed: String::from('{'),
			status: SchemaParseStatus::Opened,
			active: None,
			curr_key: None,
			curr_basetype: None,
			array_set: false,
		}
	}

	/// Variant used for a whole schema document: primed to parse one value
	/// under an anonymous key instead of an open object body.
	fn new_outer() -> ObjectSchemaParser {
		ObjectSchemaParser {
			parsed: String::new(),
			status: SchemaParseStatus::AwaitingValue,
			curr_key: Some(SchemaKey::required("")),
			..ObjectSchemaParser::new()
		}
	}

	/// The schema built so far. Complete once the parser reported done.
	pub fn schema(&self) -> &ObjectSchema {
		&self.value
	}

	fn open_value_subparser(&mut self, c: char, array_set: bool) -> Result<(), ParseFailure> {
		if c == '{' {
			self.active = Some(SchemaSubparser::Object(Box::new(ObjectSchemaParser::new())));
			self.status = SchemaParseStatus::InValueSubparser;
			return Ok(());
		}
		if !array_set && c == '[' {
			let mut marker = StringMatchParser::new(ARRAY_MARKER, true);
			marker.feed(Symbol::Char(c))?;
			self.active = Some(SchemaSubparser::Literal(marker));
			self.status = SchemaParseStatus::InArrayMarkerSubparser;
			return Ok(());
		}
		let base_type = match c.to_ascii_lowercase() {
			's' => BaseType::String,
			'n' => BaseType::Number,
			_ => return Err(ParseFailure::new(format!("expected start of schema value, got {c:?}"))),
		};
		let mut keyword = StringMatchParser::new(base_type.keyword(), true);
		keyword.feed(Symbol::Char(c))?;
		self.curr_basetype = Some(base_type.schema(false));
		self.active = Some(SchemaSubparser::Literal(keyword));
		self.status = SchemaParseStatus::InValueSubparser;
		Ok(())
	}

	/// Fold a finished subparser into the schema. `c` is the character the
	/// subparser concluded on; for a property name it was not consumed and
	/// decides optionality here.
	fn close_subparser(&mut self, c: char) -> Result<(), ParseFailure> {
		let Some(sub) = self.active.take() else {
			return Err(ParseFailure::new("no schema subparser to close"));
		};
		let sub_parsed = sub.parsed_text();
		self.parsed.push_str(&sub_parsed);
		match self.status {
			SchemaParseStatus::InArrayMarkerSubparser => {
				self.array_set = true;
				self.status = SchemaParseStatus::AwaitingObject;
			}
			SchemaParseStatus::InValueSubparser => {
				let Some(key) = self.curr_key.take() else {
					return Err(ParseFailure::new("schema value closed without a property name"));
				};
				let schema = match (self.curr_basetype.take(), sub) {
					(Some(mut base), _) => {
						base.is_list = self.array_set;
						JsonSchema::Base(base)
					}
					(None, SchemaSubparser::Object(parser)) => {
						let mut object = parser.value;
						object.is_list = self.array_set;
						JsonSchema::Object(object)
					}
					(None, _) => return Err(ParseFailure::new("schema value subparser produced no value")),
				};
				self.array_set = false;
				self.value.add_prop(key, Arc::new(schema));
				self.status = SchemaParseStatus::FinishedValue;
			}
			_ => match c {
				'?' => {
					self.curr_key = Some(SchemaKey::optional(sub_parsed));
					self.status = SchemaParseStatus::FinishedKey;
				}
				':' => {
					self.curr_key = Some(SchemaKey::required(sub_parsed));
					self.status = SchemaParseStatus::AwaitingValue;
				}
				_ => return Err(ParseFailure::new(format!("expected '?' or ':' after property name, got {c:?}"))),
			},
		}
		Ok(())
	}
}

impl Default for ObjectSchemaParser {
	fn default() -> ObjectSchemaParser {
		ObjectSchemaParser::new()
	}
}

impl IncrementalParser for ObjectSchemaParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		if let Some(active) = self.active.as_mut() {
			let done = active.feed(symbol)?;
			if done {
				let Symbol::Char(c) = symbol else {
					return Err(ParseFailure::new("end of stream at schema value close"));
				};
				self.close_subparser(c)?;
				return Ok(self.status == SchemaParseStatus::ParseComplete);
			}
			return Ok(false);
		}
		let Symbol::Char(c) = symbol else {
			return Err(ParseFailure::new("end of stream before schema object closed"));
		};
		if c.is_whitespace() {
			return Ok(false);
		}
		match self.status {
			SchemaParseStatus::Opened | SchemaParseStatus::AwaitingKey => {
				if c == '}' {
					self.parsed.push(c);
					self.status = SchemaParseStatus::ParseComplete;
					return Ok(true);
				}
				if c.is_alphabetic() || c == '_' {
					let mut name = PropNameParser::new();
					name.feed(Symbol::Char(c))?;
					self.active = Some(SchemaSubparser::Name(name));
					self.status = SchemaParseStatus::InKeySubparser;
					return Ok(false);
				}
				Err(ParseFailure::new(format!("expected '}}' or a property name, got {c:?}")))
			}
			SchemaParseStatus::AwaitingValue => {
				self.open_value_subparser(c, false)?;
				Ok(false)
			}
			SchemaParseStatus::AwaitingObject => {
				self.open_value_subparser(c, true)?;
				Ok(false)
			}
			SchemaParseStatus::FinishedValue => match c {
				',' => {
					self.parsed.push(c);
					self.status = SchemaParseStatus::AwaitingKey;
					Ok(false)
				}
				'}' => {
					self.parsed.push(c);
					self.status = SchemaParseStatus::ParseComplete;
					Ok(true)
				}
				_ => Err(ParseFailure::new(format!("expected ',' or '}}', got {c:?}"))),
			},
			SchemaParseStatus::FinishedKey => match c {
				':' => {
					self.parsed.push(c);
					self.status = SchemaParseStatus::AwaitingValue;
					Ok(false)
				}
				_ => Err(ParseFailure::new(format!("expected ':', got {c:?}"))),
			},
			SchemaParseStatus::ParseComplete => Err(ParseFailure::new(format!("input after schema object closed: {c:?}"))),
			_ => Err(ParseFailure::new("schema parser in inconsistent state")),
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

/// Parser for a complete schema document: one top-level value — an object,
/// a `[]`-prefixed object, or a (possibly `[]`-prefixed) base type — then
/// end-of-stream.
#[derive(Debug, Clone)]
pub struct SchemaDslParser {
	inner: ObjectSchemaParser,
	done: bool,
}

impl SchemaDslParser {
	pub fn new() -> SchemaDslParser {
		SchemaDslParser {
			inner: ObjectSchemaParser::new_outer(),
			done: false,
		}
	}

	/// The parsed top-level schema. Only available once parsing concluded.
	pub fn schema(&self) -> Result<Arc<JsonSchema>, ParseFailure> {
		if !self.done {
			return Err(ParseFailure::new("schema document not complete"));
		}
		self.inner
			.value
			.items()
			.next()
			.map(|(_, v)| v.clone())
			.ok_or_else(|| ParseFailure::new("schema document produced no value"))
	}
}

impl Default for SchemaDslParser {
	fn default() -> SchemaDslParser {
		SchemaDslParser::new()
	}
}

impl IncrementalParser for SchemaDslParser {
	fn feed(&mut self, symbol: Symbol) -> Result<bool, ParseFailure> {
		if self.done {
			return match symbol {
				Symbol::Eos => Ok(true),
				Symbol::Char(c) => Err(ParseFailure::new(format!("input after schema document complete: {c:?}"))),
			};
		}
		self.inner.feed(symbol)?;
		if self.inner.status == SchemaParseStatus::FinishedValue {
			self.done = true;
			return Ok(true);
		}
		Ok(false)
	}

	fn parsed_text(&self) -> String {
		self.inner.parsed_text()
	}

	fn boxed_clone(&self) -> Box<dyn IncrementalParser> {
		Box::new(self.clone())
	}
}

/// Parse a schema document in one call, consuming it through end-of-stream.
pub fn parse_schema(source: &str) -> Result<Arc<JsonSchema>, ParseFailure> {
	let mut parser = SchemaDslParser::new();
	parser.feed_str(source)?;
	parser.feed(Symbol::Eos)?;
	parser.schema()
}
