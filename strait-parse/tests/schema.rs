use std::sync::{Arc, Once};

use strait_parse::schema::{parse_schema, BaseType, JsonSchema, ObjectSchema, ObjectSchemaParser, SchemaDslParser, SchemaKey};
use strait_parse::{IncrementalParser, Symbol};

static INIT: Once = Once::new();

pub fn setup() {
	INIT.call_once(|| {
		tracing_subscriber::fmt::init();
	});
}

fn base(base_type: BaseType) -> Arc<JsonSchema> {
	Arc::new(JsonSchema::Base(base_type.schema(false)))
}

fn base_list(base_type: BaseType) -> Arc<JsonSchema> {
	Arc::new(JsonSchema::Base(base_type.schema(true)))
}

#[test]
pub fn test_parse_object_schema() {
	setup();
	let mut parser = ObjectSchemaParser::new();
	let test_data = "{
            name: string,
            age: number,
            city?: string
        }";
	// the object schema parser begins past the opening brace
	let done = parser.feed_str(&test_data[1..]).unwrap();
	assert!(done);

	let mut expected = ObjectSchema::new(false);
	expected.add_prop(SchemaKey::required("name"), base(BaseType::String));
	expected.add_prop(SchemaKey::required("age"), base(BaseType::Number));
	expected.add_prop(SchemaKey::optional("city"), base(BaseType::String));

	assert_eq!(parser.schema(), &expected);
}

#[test]
pub fn test_parse_json_schema() {
	setup();
	let test_data = "{
            name: string,
            age: number,
            city?: string
        }";
	let schema = parse_schema(test_data).unwrap();

	let mut expected = ObjectSchema::new(false);
	expected.add_prop(SchemaKey::required("name"), base(BaseType::String));
	expected.add_prop(SchemaKey::required("age"), base(BaseType::Number));
	expected.add_prop(SchemaKey::optional("city"), base(BaseType::String));

	assert_eq!(schema.as_ref(), &JsonSchema::Object(expected));
}

#[test]
pub fn test_parse_object_schema_with_optional_properties() {
	setup();
	let test_data = "{
            name: string,
            age: number,
            city: string,
            country?: string
        }";
	let schema = parse_schema(test_data).unwrap();

	let mut expected = ObjectSchema::new(false);
	expected.add_prop(SchemaKey::required("name"), base(BaseType::String));
	expected.add_prop(SchemaKey::required("age"), base(BaseType::Number));
	expected.add_prop(SchemaKey::required("city"), base(BaseType::String));
	expected.add_prop(SchemaKey::optional("country"), base(BaseType::String));

	assert_eq!(schema.as_ref(), &JsonSchema::Object(expected));
}

#[test]
pub fn test_parse_object_schema_with_nested_objects() {
	setup();
	let mut parser = ObjectSchemaParser::new();
	let test_data = "{
            name: string,
            age: number,
            address: {
                street: string,
                city: string,
                country?: string
            }
        }";
	let done = parser.feed_str(&test_data[1..]).unwrap();
	assert!(done);

	let mut address = ObjectSchema::new(false);
	address.add_prop(SchemaKey::required("street"), base(BaseType::String));
	address.add_prop(SchemaKey::required("city"), base(BaseType::String));
	address.add_prop(SchemaKey::optional("country"), base(BaseType::String));

	let mut expected = ObjectSchema::new(false);
	expected.add_prop(SchemaKey::required("name"), base(BaseType::String));
	expected.add_prop(SchemaKey::required("age"), base(BaseType::Number));
	expected.add_prop(SchemaKey::required("address"), Arc::new(JsonSchema::Object(address)));

	assert_eq!(parser.schema(), &expected);
}

#[test]
pub fn test_parse_json_basetype_list() {
	setup();
	let test_data = "{
            name: []string,
            age: []number,
            city?: string
        }";
	let schema = parse_schema(test_data).unwrap();

	let mut expected = ObjectSchema::new(false);
	expected.add_prop(SchemaKey::required("name"), base_list(BaseType::String));
	expected.add_prop(SchemaKey::required("age"), base_list(BaseType::Number));
	expected.add_prop(SchemaKey::optional("city"), base(BaseType::String));

	assert_eq!(schema.as_ref(), &JsonSchema::Object(expected));
}

#[test]
pub fn test_parse_json_outer_list() {
	setup();
	let test_data = "[]{
            name: string,
            age: number,
            city?: string
        }";
	let schema = parse_schema(test_data).unwrap();

	let mut expected = ObjectSchema::new(true);
	expected.add_prop(SchemaKey::required("name"), base(BaseType::String));
	expected.add_prop(SchemaKey::required("age"), base(BaseType::Number));
	expected.add_prop(SchemaKey::optional("city"), base(BaseType::String));

	assert_eq!(schema.as_ref(), &JsonSchema::Object(expected));
}

#[test]
pub fn test_parse_json_with_underscore() {
	setup();
	let test_data = "[]{
            my_name: string,
            age: number,
            city?: string
        }";
	let schema = parse_schema(test_data).unwrap();

	let mut expected = ObjectSchema::new(true);
	expected.add_prop(SchemaKey::required("my_name"), base(BaseType::String));
	expected.add_prop(SchemaKey::required("age"), base(BaseType::Number));
	expected.add_prop(SchemaKey::optional("city"), base(BaseType::String));

	assert_eq!(schema.as_ref(), &JsonSchema::Object(expected));
}

#[test]
pub fn test_parse_outer_list_of_basetypes() {
	setup();
	let schema = parse_schema("[]number").unwrap();
	assert_eq!(schema.as_ref(), &JsonSchema::Base(BaseType::Number.schema(true)));
	assert!(schema.is_list());
}

#[test]
pub fn test_parse_bare_basetype() {
	setup();
	let schema = parse_schema("string").unwrap();
	assert_eq!(schema.as_ref(), &JsonSchema::Base(BaseType::String.schema(false)));
}

#[test]
pub fn test_keywords_are_case_insensitive() {
	setup();
	let schema = parse_schema("{a:STRING,b:Number}").unwrap();

	let mut expected = ObjectSchema::new(false);
	expected.add_prop(SchemaKey::required("a"), base(BaseType::String));
	expected.add_prop(SchemaKey::required("b"), base(BaseType::Number));

	assert_eq!(schema.as_ref(), &JsonSchema::Object(expected));
}

#[test]
pub fn test_parse_empty_object_schema() {
	setup();
	let schema = parse_schema("{}").unwrap();
	assert_eq!(schema.as_ref(), &JsonSchema::Object(ObjectSchema::new(false)));
}

#[test]
pub fn test_invalid_property_name() {
	setup();
	assert!(parse_schema("{1name:string}").is_err());
}

#[test]
pub fn test_invalid_keyword() {
	setup();
	assert!(parse_schema("{a:strong}").is_err());
}

#[test]
pub fn test_missing_colon() {
	setup();
	assert!(parse_schema("{a string}").is_err());
}

#[test]
pub fn test_double_array_marker() {
	setup();
	assert!(parse_schema("[][]number").is_err());
}

#[test]
pub fn test_trailing_input_fails() {
	setup();
	let mut parser = SchemaDslParser::new();
	parser.feed_str("{a:string}").unwrap();
	assert!(parser.feed(Symbol::Char('x')).is_err());
}

#[test]
pub fn test_eos_before_completion_fails() {
	setup();
	let mut parser = SchemaDslParser::new();
	parser.feed_str("{a:string").unwrap();
	assert!(parser.feed(Symbol::Eos).is_err());
}

#[test]
pub fn test_schema_equality_is_order_sensitive() {
	setup();
	let a = parse_schema("{a:string,b:number}").unwrap();
	let b = parse_schema("{b:number,a:string}").unwrap();
	assert_ne!(a.as_ref(), b.as_ref());
}
