//! Tests for the record transformer

use super::*;
use crate::schema::parse_schema;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn object(value: Value) -> JsonObject {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn product_schema() -> Schema {
    parse_schema(
        "products",
        &json!({
            "type": "object",
            "required": ["id", "updated_at"],
            "additionalProperties": false,
            "properties": {
                "id": {"type": "integer"},
                "name": {"type": ["null", "string"]},
                "price": {"type": ["null", "number"]},
                "active": {"type": ["null", "boolean"]},
                "updated_at": {"type": "string", "format": "date-time"},
                "tags": {"type": ["null", "array"], "items": {"type": "string"}},
                "variants": {
                    "type": ["null", "array"],
                    "items": {
                        "type": "object",
                        "required": ["sku"],
                        "properties": {
                            "sku": {"type": "string"},
                            "quantity": {"type": ["null", "integer"]}
                        }
                    }
                },
                "metadata": {"type": ["null", "object"]}
            }
        })
        .to_string(),
    )
    .unwrap()
}

fn valid_product() -> Value {
    json!({"id": 1, "updated_at": "2020-08-01T10:00:00Z"})
}

fn run(record: Value) -> Result<JsonObject> {
    transform(object(record), &product_schema(), "products")
}

fn field(value: Value, name: &str) -> Value {
    let mut record = object(valid_product());
    record.insert(name.to_string(), value);
    run(Value::Object(record)).unwrap()[name].clone()
}

fn field_error(value: Value, name: &str) -> Error {
    let mut record = object(valid_product());
    record.insert(name.to_string(), value);
    run(Value::Object(record)).unwrap_err()
}

// ============================================================================
// Coercion Tests
// ============================================================================

#[test_case(json!(5), json!(5) ; "integer stays")]
#[test_case(json!("42"), json!(42) ; "numeric string")]
#[test_case(json!(" 7 "), json!(7) ; "padded string")]
#[test_case(json!(3.0), json!(3) ; "integral float")]
fn test_integer_coercion(input: Value, expected: Value) {
    assert_eq!(field(input, "id"), expected);
}

#[test_case(json!(9.5), json!(9.5) ; "float stays")]
#[test_case(json!(10), json!(10) ; "integer stays")]
#[test_case(json!("19.90"), json!(19.9) ; "numeric string")]
fn test_number_coercion(input: Value, expected: Value) {
    assert_eq!(field(input, "price"), expected);
}

#[test_case(json!(true), json!(true) ; "bool stays")]
#[test_case(json!("false"), json!(false) ; "string false")]
#[test_case(json!("true"), json!(true) ; "string true")]
#[test_case(json!(0), json!(false) ; "zero")]
#[test_case(json!(1), json!(true) ; "one")]
fn test_boolean_coercion(input: Value, expected: Value) {
    assert_eq!(field(input, "active"), expected);
}

#[test_case(json!("Mug"), json!("Mug") ; "string stays")]
#[test_case(json!(12), json!("12") ; "integer")]
#[test_case(json!(1.5), json!("1.5") ; "float")]
#[test_case(json!(false), json!("false") ; "bool")]
fn test_string_coercion(input: Value, expected: Value) {
    assert_eq!(field(input, "name"), expected);
}

#[test_case("2020-08-01T10:00:00Z", "2020-08-01T10:00:00.000000Z" ; "second precision")]
#[test_case("2020-08-01T10:00:00.5Z", "2020-08-01T10:00:00.500000Z" ; "fractional")]
#[test_case("2020-08-01T07:00:00-03:00", "2020-08-01T10:00:00.000000Z" ; "offset")]
#[test_case("2020-08-01 10:00:00", "2020-08-01T10:00:00.000000Z" ; "space separated without zone")]
#[test_case("2020-08-01T10:00:00", "2020-08-01T10:00:00.000000Z" ; "without zone")]
#[test_case("2020-08-01 10:00:00.25", "2020-08-01T10:00:00.250000Z" ; "space separated fractional")]
#[test_case("2020-08-01 07:00:00-03:00", "2020-08-01T10:00:00.000000Z" ; "space separated offset")]
#[test_case("2020-08-01", "2020-08-01T00:00:00.000000Z" ; "date only")]
fn test_date_time_normalized(input: &str, expected: &str) {
    assert_eq!(field(json!(input), "updated_at"), json!(expected));
}

#[test]
fn test_invalid_date_time() {
    let err = field_error(json!("yesterday"), "updated_at");
    assert!(
        matches!(err, Error::SchemaValidation { ref field, .. } if field == "updated_at"),
        "{err}"
    );
}

#[test_case(json!("abc"), "id" ; "integer from text")]
#[test_case(json!(1.5), "id" ; "integer from fraction")]
#[test_case(json!("yes"), "active" ; "boolean from text")]
#[test_case(json!(2), "active" ; "boolean from two")]
#[test_case(json!({"a": 1}), "name" ; "string from object")]
#[test_case(json!("x"), "tags" ; "array from string")]
fn test_type_mismatch(input: Value, name: &str) {
    let err = field_error(input, name);
    match err {
        Error::SchemaValidation { stream, field, .. } => {
            assert_eq!(stream, "products");
            assert_eq!(field, name);
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// Null and Required Tests
// ============================================================================

#[test]
fn test_nullable_field_accepts_null() {
    assert_eq!(field(Value::Null, "name"), Value::Null);
}

#[test]
fn test_required_field_missing() {
    let err = run(json!({"id": 1})).unwrap_err();
    assert!(err.to_string().contains("'updated_at'"));
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_required_field_null() {
    let err = run(json!({"id": null, "updated_at": "2020-08-01T10:00:00Z"})).unwrap_err();
    assert!(matches!(err, Error::SchemaValidation { ref field, .. } if field == "id"));
}

#[test]
fn test_null_only_when_declared() {
    let schema = Schema::object([("code".to_string(), Schema::new(JsonType::String))].into());
    let err = transform(object(json!({"code": null})), &schema, "clients").unwrap_err();
    assert!(err.to_string().contains("null is not allowed"));
}

#[test]
fn test_optional_field_may_be_absent() {
    let out = run(valid_product()).unwrap();
    assert_eq!(out.len(), 2);
    assert!(!out.contains_key("name"));
}

// ============================================================================
// Structure Tests
// ============================================================================

#[test]
fn test_undeclared_fields_dropped() {
    let out = run(json!({
        "id": 1,
        "updated_at": "2020-08-01T10:00:00Z",
        "internal_flag": true
    }))
    .unwrap();
    assert!(!out.contains_key("internal_flag"));
}

#[test]
fn test_undeclared_fields_kept_with_additional_properties() {
    let mut schema = product_schema();
    schema.additional_properties = Some(true);

    let record = object(json!({
        "id": 1,
        "updated_at": "2020-08-01T10:00:00Z",
        "internal_flag": true
    }));
    let out = transform(record, &schema, "products").unwrap();
    assert_eq!(out["internal_flag"], json!(true));
}

#[test]
fn test_nested_objects_and_arrays() {
    let out = run(json!({
        "id": "1",
        "updated_at": "2020-08-01T10:00:00Z",
        "tags": ["a", 2],
        "variants": [
            {"sku": "A-1", "quantity": "3", "color": "red"},
            {"sku": 99, "quantity": null}
        ]
    }))
    .unwrap();

    assert_eq!(out["tags"], json!(["a", "2"]));
    assert_eq!(
        out["variants"],
        json!([
            {"sku": "A-1", "quantity": 3},
            {"sku": "99", "quantity": null}
        ])
    );
}

#[test]
fn test_nested_error_path() {
    let err = run(json!({
        "id": 1,
        "updated_at": "2020-08-01T10:00:00Z",
        "variants": [{"sku": "A-1"}, {"quantity": 1}]
    }))
    .unwrap_err();

    assert!(
        matches!(err, Error::SchemaValidation { ref field, .. } if field == "variants[1].sku"),
        "{err}"
    );
}

#[test]
fn test_free_form_object_kept() {
    let out = run(json!({
        "id": 1,
        "updated_at": "2020-08-01T10:00:00Z",
        "metadata": {"anything": [1, 2], "goes": null}
    }))
    .unwrap();
    assert_eq!(out["metadata"], json!({"anything": [1, 2], "goes": null}));
}

#[test]
fn test_untyped_property_passes_through() {
    let schema = Schema::object([("raw".to_string(), Schema::default())].into());
    let out = transform(object(json!({"raw": [1, "two"]})), &schema, "orders").unwrap();
    assert_eq!(out["raw"], json!([1, "two"]));
}

#[test]
fn test_transformer_reusable() {
    let schema = product_schema();
    let transformer = Transformer::new("products", &schema);

    for id in 1..=3 {
        let out = transformer
            .transform(object(json!({"id": id, "updated_at": "2020-08-01T10:00:00Z"})))
            .unwrap();
        assert_eq!(out["id"], json!(id));
    }
}
