use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::fs;

/// Load a schema from tests/schemas
pub fn load_test_schema(schema_name: &str) -> JSONSchema {
    let schema_path = format!("tests/schemas/{}.json", schema_name);
    let schema_content = fs::read_to_string(&schema_path)
        .unwrap_or_else(|_| panic!("Failed to read schema file: {}", schema_path));

    let schema_json: Value = serde_json::from_str(&schema_content)
        .unwrap_or_else(|_| panic!("Failed to parse schema JSON: {}", schema_path));

    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema_json)
        .expect("Failed to compile schema")
}

/// Validate a JSON value against a schema
pub fn validate_against_schema(data: &Value, schema: &JSONSchema) -> Result<(), Vec<String>> {
    match schema.validate(data) {
        Ok(_) => Ok(()),
        Err(errors) => Err(errors
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect()),
    }
}

/// Panic with every violation and the offending body if `data` does not match
pub fn assert_matches_schema(data: &Value, schema_name: &str) {
    let schema = load_test_schema(schema_name);
    if let Err(errors) = validate_against_schema(data, &schema) {
        for error in &errors {
            eprintln!("  - {}", error);
        }
        eprintln!(
            "\nActual response:\n{}",
            serde_json::to_string_pretty(data).unwrap()
        );
        panic!(
            "{} schema validation failed with {} errors",
            schema_name,
            errors.len()
        );
    }
}
