//! Parameter schemas and validated parameter maps.
//!
//! Each registered `(kind, method)` pair carries a [`ParamSchema`]. The
//! schema turns the loose fields of a request object into [`Parameters`],
//! a map of typed values that handlers read without re-validating.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::errors::{ActionError, ValidationError};
use super::router::Method;

/// Accepted shape of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShape {
    /// A non-blank JSON string.
    Text,
    /// A non-blank relative or absolute path the filesystem can accept.
    Path,
    /// A JSON string (taken as UTF-8) or an array of integers in `0..=255`.
    Bytes,
    /// A JSON boolean.
    Bool,
    /// A JSON string equal (ignoring ASCII case) to one of the choices.
    Choice(&'static [&'static str]),
}

impl ParamShape {
    fn describe(self) -> String {
        match self {
            Self::Text => String::from("expected a non-empty string"),
            Self::Path => String::from("expected a non-empty path string"),
            Self::Bytes => String::from("expected a string or an array of bytes"),
            Self::Bool => String::from("expected a boolean"),
            Self::Choice(choices) => format!("expected one of: {}", choices.join(", ")),
        }
    }
}

/// A single named parameter in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    name: &'static str,
    shape: ParamShape,
    required: bool,
}

impl ParamSpec {
    /// Declares a required parameter.
    pub const fn required(name: &'static str, shape: ParamShape) -> Self {
        Self {
            name,
            shape,
            required: true,
        }
    }

    /// Declares an optional parameter.
    pub const fn optional(name: &'static str, shape: ParamShape) -> Self {
        Self {
            name,
            shape,
            required: false,
        }
    }
}

/// Parameter schema for one `(kind, method)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSchema {
    params: &'static [ParamSpec],
}

impl ParamSchema {
    /// Creates a schema from a static parameter table.
    pub const fn new(params: &'static [ParamSpec]) -> Self {
        Self { params }
    }

    /// Validates request fields for `method`.
    ///
    /// Fields not named by the schema are ignored. A `null` value counts as
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns `MissingParameter` for an absent required field and
    /// `InvalidParameter` for a field of the wrong shape. Declared parameters
    /// are checked in declaration order, so the first offending one wins.
    pub fn validate(
        &self,
        method: Method,
        fields: &Map<String, Value>,
    ) -> Result<Parameters, ValidationError> {
        let kind = method.kind().as_str();
        let method = method.as_str();
        let mut values = BTreeMap::new();

        for spec in self.params {
            match fields.get(spec.name).filter(|value| !value.is_null()) {
                Some(value) => {
                    let parsed = convert(spec.shape, value).map_err(|reason| {
                        ValidationError::invalid_parameter(kind, method, spec.name, reason)
                    })?;
                    values.insert(spec.name, parsed);
                }
                None if spec.required => {
                    return Err(ValidationError::missing_parameter(kind, method, spec.name));
                }
                None => {}
            }
        }

        Ok(Parameters { values })
    }
}

/// Longest path, in bytes, accepted for a `Path` parameter.
const MAX_PATH_BYTES: usize = 4096;

/// Longest single path component, in bytes.
const MAX_COMPONENT_BYTES: usize = 255;

fn convert(shape: ParamShape, value: &Value) -> Result<ParamValue, String> {
    let parsed = match (shape, value) {
        (ParamShape::Text, Value::String(text)) if !text.trim().is_empty() => {
            Some(ParamValue::Text(text.clone()))
        }
        (ParamShape::Path, Value::String(text)) if !text.trim().is_empty() => {
            check_path(text)?;
            Some(ParamValue::Text(text.clone()))
        }
        (ParamShape::Bytes, Value::String(text)) => {
            Some(ParamValue::Bytes(text.as_bytes().to_vec()))
        }
        (ParamShape::Bytes, Value::Array(items)) => items
            .iter()
            .map(|item| item.as_u64().and_then(|byte| u8::try_from(byte).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(ParamValue::Bytes),
        (ParamShape::Bool, Value::Bool(flag)) => Some(ParamValue::Bool(*flag)),
        (ParamShape::Choice(choices), Value::String(text)) => choices
            .iter()
            .copied()
            .find(|choice| choice.eq_ignore_ascii_case(text.trim()))
            .map(ParamValue::Choice),
        _ => None,
    };
    parsed.ok_or_else(|| shape.describe())
}

/// Rejects paths no filesystem call could accept.
fn check_path(path: &str) -> Result<(), String> {
    if path.contains('\0') {
        return Err(String::from("path contains a NUL byte"));
    }
    if path.len() > MAX_PATH_BYTES {
        return Err(format!("path is longer than {MAX_PATH_BYTES} bytes"));
    }
    match path
        .split('/')
        .find(|component| component.len() > MAX_COMPONENT_BYTES)
    {
        Some(component) => Err(format!(
            "path component of {} bytes exceeds {MAX_COMPONENT_BYTES}",
            component.len()
        )),
        None => Ok(()),
    }
}

/// A validated parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Non-blank text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Boolean flag.
    Bool(bool),
    /// One of the schema's choices, in its canonical spelling.
    Choice(&'static str),
}

/// Parameters that passed schema validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    values: BTreeMap<&'static str, ParamValue>,
}

impl Parameters {
    /// Returns the value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub(crate) fn text(&self, name: &'static str) -> Result<&str, ActionError> {
        match self.values.get(name) {
            Some(ParamValue::Text(text)) => Ok(text.as_str()),
            other => Err(shape_mismatch(name, "text", other)),
        }
    }

    pub(crate) fn bytes(&self, name: &'static str) -> Result<&[u8], ActionError> {
        match self.values.get(name) {
            Some(ParamValue::Bytes(bytes)) => Ok(bytes.as_slice()),
            other => Err(shape_mismatch(name, "bytes", other)),
        }
    }

    pub(crate) fn take_bytes(&mut self, name: &'static str) -> Result<Vec<u8>, ActionError> {
        match self.values.remove(name) {
            Some(ParamValue::Bytes(bytes)) => Ok(bytes),
            other => Err(shape_mismatch(name, "bytes", other.as_ref())),
        }
    }

    pub(crate) fn choice(&self, name: &'static str) -> Result<&'static str, ActionError> {
        match self.values.get(name) {
            Some(ParamValue::Choice(choice)) => Ok(*choice),
            other => Err(shape_mismatch(name, "choice", other)),
        }
    }

    /// Reads an optional flag, defaulting to `false` when absent.
    pub(crate) fn flag(&self, name: &'static str) -> bool {
        matches!(self.values.get(name), Some(ParamValue::Bool(true)))
    }
}

// Schema validation guarantees the shape, so reaching this means a handler
// and its schema disagree.
fn shape_mismatch(name: &str, expected: &str, found: Option<&ParamValue>) -> ActionError {
    let found = match found {
        None => "nothing",
        Some(ParamValue::Text(_)) => "text",
        Some(ParamValue::Bytes(_)) => "bytes",
        Some(ParamValue::Bool(_)) => "bool",
        Some(ParamValue::Choice(_)) => "choice",
    };
    ActionError::internal(format!(
        "parameter '{name}' expected {expected} but schema produced {found}"
    ))
}
