//! Compiled JSON Schema for method parameters.

use super::error::DispatchError;
use jsonschema::Validator;
use serde_json::{json, Value};

pub struct ParamSchema {
    raw: Value,
    /// `None` only checks that params are an object.
    validator: Option<Validator>,
}

impl std::fmt::Debug for ParamSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamSchema").field("raw", &self.raw).finish()
    }
}

impl ParamSchema {
    pub fn compile(raw: Value) -> Result<Self, String> {
        let validator = Validator::new(&raw).map_err(|e| e.to_string())?;
        Ok(Self {
            raw,
            validator: Some(validator),
        })
    }

    /// Schema accepting any object; used by methods without parameters.
    pub fn any_object() -> Self {
        Self {
            raw: json!({ "type": "object" }),
            validator: None,
        }
    }

    pub fn as_json(&self) -> &Value {
        &self.raw
    }

    /// Reports the first failing field as `InvalidParams`.
    pub fn validate(&self, params: &Value) -> Result<(), DispatchError> {
        let Some(validator) = &self.validator else {
            return match params {
                Value::Object(_) => Ok(()),
                _ => Err(DispatchError::invalid_params(
                    "params",
                    "params must be an object",
                )),
            };
        };
        match validator.iter_errors(params).next() {
            None => Ok(()),
            Some(error) => {
                let message = error.to_string();
                let field = field_name(&error.instance_path.to_string(), &message);
                Err(DispatchError::InvalidParams { field, message })
            }
        }
    }
}

/// Turns a JSON pointer such as `/filters/collection` into `filters.collection`.
/// Errors on the root object (a missing required property) name the property
/// quoted at the start of the message instead.
fn field_name(pointer: &str, message: &str) -> String {
    let dotted = pointer
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".");
    if !dotted.is_empty() {
        return dotted;
    }
    if !message.contains("is a required property") {
        return "params".to_string();
    }
    message
        .strip_prefix('"')
        .and_then(|rest| rest.split_once('"'))
        .map(|(name, _)| name.to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "params".to_string())
}
