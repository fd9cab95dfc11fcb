use std::sync::Arc;

use strait_parse::json::{JsonOptions, JsonParser};
use strait_parse::schema::{parse_schema, JsonSchema};
use strait_parse::string_match::MultiStringMatchParser;
use strait_parse::typed::TypedJsonParser;
use strait_parse::{ParseFailure, PassthroughParser};

use crate::SyntaxConstraint;

/// Constraint accepting any output of the unschematized JSON dialect.
pub fn valid_json(options: JsonOptions) -> SyntaxConstraint {
	SyntaxConstraint::new(Box::new(JsonParser::new(options)))
}

/// Constraint accepting only JSON conforming to a schema document.
pub fn force_json_schema(source: &str) -> Result<SyntaxConstraint, ParseFailure> {
	let schema = parse_schema(source)?;
	Ok(SyntaxConstraint::new(Box::new(TypedJsonParser::new(schema))))
}

/// Constraint accepting exactly one of the given literals (or a longer one
/// sharing a matched literal as prefix).
pub fn one_of<I, S>(options: I) -> SyntaxConstraint
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	SyntaxConstraint::new(Box::new(MultiStringMatchParser::new(options)))
}

/// Constraint accepting any text, terminated by end-of-stream.
pub fn unconstrained() -> SyntaxConstraint {
	SyntaxConstraint::new(Box::new(PassthroughParser::new()))
}

/// A rebuildable recipe for constraints. A failed constraint is poisoned,
/// so anything that owns one long-term keeps the recipe around to mint a
/// fresh one. Schema documents are parsed once; every constraint built from
/// the recipe shares the same tree.
#[derive(Debug, Clone)]
pub enum ConstraintFactory {
	Json(JsonOptions),
	Schema(Arc<JsonSchema>),
	OneOf(Vec<String>),
	Unconstrained,
}

impl ConstraintFactory {
	pub fn from_schema_source(source: &str) -> Result<ConstraintFactory, ParseFailure> {
		Ok(ConstraintFactory::Schema(parse_schema(source)?))
	}

	pub fn build(&self) -> SyntaxConstraint {
		match self {
			ConstraintFactory::Json(options) => valid_json(*options),
			ConstraintFactory::Schema(schema) => SyntaxConstraint::new(Box::new(TypedJsonParser::new(schema.clone()))),
			ConstraintFactory::OneOf(options) => one_of(options),
			ConstraintFactory::Unconstrained => unconstrained(),
		}
	}
}
