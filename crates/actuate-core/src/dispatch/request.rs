//! Request parsing into validated action descriptors.
//!
//! A request is a JSON object carrying `kind` and `method` tags alongside
//! kind-specific parameter fields:
//!
//! ```json
//! {"kind":"file","method":"READ","path":"notes.txt"}
//! ```
//!
//! Parsing checks the kind, then the method, then the parameters, and stops
//! at the first failure. An [`ActionDescriptor`] only exists once all three
//! checks have passed.

use serde_json::Value;

use super::errors::ValidationError;
use super::registry::KindRegistry;
use super::router::{Kind, Method};
use super::schema::Parameters;

/// Field naming the action kind.
pub const KIND_FIELD: &str = "kind";
/// Field naming the method within the kind.
pub const METHOD_FIELD: &str = "method";

/// A validated action request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
    kind: Kind,
    method: Method,
    parameters: Parameters,
}

impl ActionDescriptor {
    /// Parses and validates a raw request against `registry`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownKind` when the input is not an object or its kind is
    /// missing, not a string, or unregistered; `UnknownMethod` for the same
    /// conditions on the method; and the schema's `MissingParameter` or
    /// `InvalidParameter` errors for the remaining fields.
    pub fn parse(raw: &Value, registry: &KindRegistry) -> Result<Self, ValidationError> {
        let Some(fields) = raw.as_object() else {
            return Err(ValidationError::unknown_kind(describe_tag(None)));
        };

        let kind = match fields.get(KIND_FIELD) {
            Some(Value::String(tag)) => Kind::parse(tag)?,
            other => return Err(ValidationError::unknown_kind(describe_tag(other))),
        };
        if !registry.has_kind(kind) {
            return Err(ValidationError::unknown_kind(kind.as_str()));
        }

        let method = match fields.get(METHOD_FIELD) {
            Some(Value::String(tag)) => Method::parse(kind, tag)?,
            other => {
                return Err(ValidationError::unknown_method(
                    kind.as_str(),
                    describe_tag(other),
                ));
            }
        };
        let entry = registry
            .lookup(kind, method)
            .ok_or_else(|| ValidationError::unknown_method(kind.as_str(), method.as_str()))?;

        let parameters = entry.schema().validate(method, fields)?;
        Ok(Self {
            kind,
            method,
            parameters,
        })
    }

    /// Parses a single request line of JSON text.
    ///
    /// Trailing whitespace, including the line delimiter, is ignored. Text
    /// that is not valid JSON cannot name a kind, so it fails with
    /// `UnknownKind`.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`ActionDescriptor::parse`].
    pub fn parse_line(line: &[u8], registry: &KindRegistry) -> Result<Self, ValidationError> {
        let value = parse_json_line(line)?;
        Self::parse(&value, registry)
    }

    /// Action kind.
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// Method within the kind.
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Validated parameters.
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Splits the descriptor into its parts.
    pub fn into_parts(self) -> (Kind, Method, Parameters) {
        (self.kind, self.method, self.parameters)
    }
}

/// Decodes one request line into a JSON value.
///
/// # Errors
///
/// Returns `UnknownKind` for empty or malformed input.
pub fn parse_json_line(line: &[u8]) -> Result<Value, ValidationError> {
    let trimmed = trim_trailing_whitespace(line);
    if trimmed.is_empty() {
        return Err(ValidationError::unknown_kind("<empty request>"));
    }
    serde_json::from_slice(trimmed)
        .map_err(|error| ValidationError::unknown_kind(format!("<malformed request: {error}>")))
}

fn describe_tag(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::from("<missing>"),
        Some(other) => other.to_string(),
    }
}

fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    &bytes[..end]
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::dispatch::router::FileMethod;

    fn registry() -> KindRegistry {
        KindRegistry::builtin()
    }

    #[test]
    fn parses_minimal_read() {
        let descriptor = ActionDescriptor::parse(
            &json!({"kind": "file", "method": "READ", "path": "notes.txt"}),
            &registry(),
        )
        .expect("parse read");
        assert_eq!(descriptor.kind(), Kind::File);
        assert_eq!(descriptor.method(), Method::File(FileMethod::Read));
        assert_eq!(
            descriptor.parameters().get("path"),
            Some(&crate::ParamValue::Text(String::from("notes.txt")))
        );
    }

    #[rstest]
    #[case::missing(json!({"method": "READ", "path": "a"}), "<missing>")]
    #[case::null(json!({"kind": null, "method": "READ"}), "<missing>")]
    #[case::number(json!({"kind": 7, "method": "READ"}), "7")]
    #[case::unknown(json!({"kind": "http", "method": "GET"}), "http")]
    #[case::not_object(json!(["file", "READ"]), "<missing>")]
    fn rejects_bad_kinds(#[case] raw: Value, #[case] shown: &str) {
        let error = ActionDescriptor::parse(&raw, &registry()).expect_err("bad kind");
        assert_eq!(error, ValidationError::unknown_kind(shown));
    }

    #[rstest]
    #[case::missing(json!({"kind": "file", "path": "a"}))]
    #[case::number(json!({"kind": "file", "method": 1}))]
    #[case::wrong_kind(json!({"kind": "file", "method": "HASH"}))]
    fn rejects_bad_methods(#[case] raw: Value) {
        let error = ActionDescriptor::parse(&raw, &registry()).expect_err("bad method");
        assert!(matches!(error, ValidationError::UnknownMethod { .. }));
    }

    #[test]
    fn kind_is_checked_before_method() {
        let error = ActionDescriptor::parse(&json!({"kind": "nope"}), &registry())
            .expect_err("both bad");
        assert!(matches!(error, ValidationError::UnknownKind { .. }));
    }

    #[test]
    fn method_is_checked_before_parameters() {
        let error = ActionDescriptor::parse(&json!({"kind": "file", "method": "MOVE"}), &registry())
            .expect_err("bad method, missing path");
        assert!(matches!(error, ValidationError::UnknownMethod { .. }));
    }

    #[test]
    fn reports_missing_path() {
        let error = ActionDescriptor::parse(&json!({"kind": "file", "method": "read"}), &registry())
            .expect_err("missing path");
        assert_eq!(
            error,
            ValidationError::missing_parameter("file", "READ", "path")
        );
    }

    #[test]
    fn parse_line_trims_delimiter() {
        let line = b"{\"kind\":\"enc\",\"method\":\"HASH\",\"data\":\"x\",\"algorithm\":\"sha256\"}\r\n";
        let descriptor = ActionDescriptor::parse_line(line, &registry()).expect("parse line");
        assert_eq!(descriptor.kind(), Kind::Enc);
    }

    #[rstest]
    #[case::empty(b"".as_slice())]
    #[case::blank(b"  \n".as_slice())]
    #[case::garbage(b"not json".as_slice())]
    fn malformed_lines_are_unknown_kind(#[case] line: &[u8]) {
        let error = ActionDescriptor::parse_line(line, &registry()).expect_err("malformed");
        assert!(matches!(error, ValidationError::UnknownKind { .. }));
    }
}
