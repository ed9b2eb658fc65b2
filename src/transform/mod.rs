//! Record transformer
//!
//! Validates a raw API record against its stream schema and coerces values
//! to the declared types before the record is emitted.
//!
//! # Rules
//!
//! - Required fields must be present and non-null.
//! - `integer`/`number` accept numeric strings, `boolean` accepts
//!   `"true"`/`"false"` and `0`/`1`, `string` accepts numbers and booleans.
//! - `date-time` strings are normalized to `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
//! - `null` is accepted only when the declared type includes `"null"`.
//! - Undeclared fields are dropped unless `additionalProperties` is `true`.

use crate::bookmark::{format_record_timestamp, parse_record_timestamp};
use crate::error::{Error, Result};
use crate::schema::{JsonType, Schema};
use crate::types::JsonObject;
use serde_json::{Number, Value};
use tracing::trace;

/// Transforms records of one stream
#[derive(Debug, Clone, Copy)]
pub struct Transformer<'a> {
    stream: &'a str,
    schema: &'a Schema,
}

impl<'a> Transformer<'a> {
    /// Create a transformer for a stream schema
    pub fn new(stream: &'a str, schema: &'a Schema) -> Self {
        Self { stream, schema }
    }

    /// Transform one raw record
    pub fn transform(&self, raw: JsonObject) -> Result<JsonObject> {
        self.object(raw, self.schema, "")
    }

    fn object(&self, raw: JsonObject, schema: &Schema, path: &str) -> Result<JsonObject> {
        for name in &schema.required {
            match raw.get(name) {
                None => return Err(self.error(&join(path, name), "required field is missing")),
                Some(Value::Null) => {
                    return Err(self.error(&join(path, name), "required field is null"))
                }
                Some(_) => {}
            }
        }

        // Free-form object
        if schema.properties.is_none() {
            return Ok(raw);
        }

        let keep_undeclared = schema.additional_properties == Some(true);
        let mut out = JsonObject::new();

        for (key, value) in raw {
            let field = join(path, &key);
            match schema.get_property(&key) {
                Some(property) => {
                    let value = self.value(value, property, &field)?;
                    out.insert(key, value);
                }
                None if keep_undeclared => {
                    out.insert(key, value);
                }
                None => trace!("Dropping undeclared field '{field}' in stream '{}'", self.stream),
            }
        }

        Ok(out)
    }

    fn value(&self, value: Value, schema: &Schema, path: &str) -> Result<Value> {
        if value.is_null() {
            return if schema.is_nullable() {
                Ok(Value::Null)
            } else {
                Err(self.error(path, "null is not allowed"))
            };
        }

        let Some(declared) = &schema.json_type else {
            return Ok(value);
        };

        let types = declared.non_null_types();
        for json_type in &types {
            if let Some(coerced) = self.coerce(&value, *json_type, schema, path)? {
                return Ok(coerced);
            }
        }

        let expected = if types.is_empty() {
            "null".to_string()
        } else {
            types
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" or ")
        };
        Err(self.error(path, format!("expected {expected}, got {}", describe(&value))))
    }

    /// `Ok(None)` means the value does not fit the type
    fn coerce(
        &self,
        value: &Value,
        json_type: JsonType,
        schema: &Schema,
        path: &str,
    ) -> Result<Option<Value>> {
        let coerced = match (json_type, value) {
            (JsonType::Integer, Value::Number(n)) => to_integer(n),
            (JsonType::Integer, Value::String(s)) => {
                s.trim().parse::<i64>().ok().map(Value::from)
            }

            (JsonType::Number, Value::Number(_)) => Some(value.clone()),
            (JsonType::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),

            (JsonType::Boolean, Value::Bool(_)) => Some(value.clone()),
            (JsonType::Boolean, Value::String(s)) => match s.as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            (JsonType::Boolean, Value::Number(n)) => match n.as_u64() {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => None,
            },

            (JsonType::String, Value::String(s)) if schema.is_date_time() => {
                let Some(instant) = parse_record_timestamp(s) else {
                    return Err(self.error(path, format!("'{s}' is not a valid date-time")));
                };
                Some(Value::String(format_record_timestamp(instant)))
            }
            (JsonType::String, Value::String(_)) => Some(value.clone()),
            (JsonType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (JsonType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

            (JsonType::Object, Value::Object(map)) => {
                Some(Value::Object(self.object(map.clone(), schema, path)?))
            }

            (JsonType::Array, Value::Array(items)) => {
                let Some(item_schema) = schema.items.as_deref() else {
                    return Ok(Some(value.clone()));
                };
                let items = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.value(item.clone(), item_schema, &format!("{path}[{i}]")))
                    .collect::<Result<Vec<_>>>()?;
                Some(Value::Array(items))
            }

            _ => None,
        };

        Ok(coerced)
    }

    fn error(&self, field: &str, message: impl Into<String>) -> Error {
        Error::validation(self.stream, field, message)
    }
}

/// Transform one raw record of `stream` against its schema
pub fn transform(raw: JsonObject, schema: &Schema, stream: &str) -> Result<JsonObject> {
    Transformer::new(stream, schema).transform(raw)
}

fn to_integer(n: &Number) -> Option<Value> {
    if n.is_i64() || n.is_u64() {
        return Some(Value::Number(n.clone()));
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
        .map(|f| Value::from(f as i64))
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string '{s}'"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

#[cfg(test)]
mod tests;
