use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use strait_parse::json::JsonOptions;
use strait_parse::ParseFailure;

use crate::factory::ConstraintFactory;

#[derive(Error, Debug)]
pub enum ConstraintError {
	#[error("schema error: {0}")]
	Parse(#[from] ParseFailure),

	#[error("could not read schema file: {0}")]
	SchemaFile(#[from] std::io::Error),
}

/// Declarative constraint selection, typically embedded in application
/// configuration.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintConfig {
	/// Unschematized JSON with dialect flags.
	Json(JsonOptions),

	/// Schema document included directly in the configuration.
	Schema(String),

	/// External file containing a schema document.
	SchemaFile(PathBuf),

	/// One of a fixed set of literals.
	OneOf(Vec<String>),

	/// No constraint.
	Unconstrained,
}

impl ConstraintConfig {
	pub fn factory(&self) -> Result<ConstraintFactory, ConstraintError> {
		Ok(match self {
			ConstraintConfig::Json(options) => ConstraintFactory::Json(*options),
			ConstraintConfig::Schema(source) => ConstraintFactory::from_schema_source(source)?,
			ConstraintConfig::SchemaFile(path) => {
				let source = std::fs::read_to_string(path)?;
				ConstraintFactory::from_schema_source(source.trim_end())?
			}
			ConstraintConfig::OneOf(options) => ConstraintFactory::OneOf(options.clone()),
			ConstraintConfig::Unconstrained => ConstraintFactory::Unconstrained,
		})
	}
}
