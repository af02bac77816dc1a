//! Handler for the `enc` kind: text encodings and digests of request data.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD, STANDARD, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use sha2::{Digest, Sha256, Sha512};

use crate::dispatch::{
    ActionError, EncMethod, Method, ParamSchema, ParamShape, ParamSpec, Parameters, Payload,
    ValidationError,
};

pub(crate) const DATA: &str = "data";
pub(crate) const CODEC: &str = "codec";
pub(crate) const ALGORITHM: &str = "algorithm";

static CODECS: [&str; 3] = ["base64", "base64url", "hex"];
static ALGORITHMS: [&str; 2] = ["sha256", "sha512"];

static ENCODE_PARAMS: [ParamSpec; 2] = [
    ParamSpec::required(DATA, ParamShape::Bytes),
    ParamSpec::required(CODEC, ParamShape::Choice(&CODECS)),
];
/// URL-safe decoder accepting input with or without padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

static HASH_PARAMS: [ParamSpec; 2] = [
    ParamSpec::required(DATA, ParamShape::Bytes),
    ParamSpec::required(ALGORITHM, ParamShape::Choice(&ALGORITHMS)),
];

/// Parameters of `enc ENCODE`.
pub(crate) static ENCODE_SCHEMA: ParamSchema = ParamSchema::new(&ENCODE_PARAMS);
/// Parameters of `enc DECODE`.
pub(crate) static DECODE_SCHEMA: ParamSchema = ParamSchema::new(&ENCODE_PARAMS);
/// Parameters of `enc HASH`.
pub(crate) static HASH_SCHEMA: ParamSchema = ParamSchema::new(&HASH_PARAMS);

/// Stateless encoder, decoder and hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncHandler;

impl EncHandler {
    /// Runs `method` with validated `params`.
    ///
    /// # Errors
    ///
    /// `DECODE` reports `InvalidParameter` when `data` is not valid for the
    /// codec. Otherwise this only fails with `InternalError` when the
    /// parameters do not match the method's schema.
    pub fn execute(self, method: EncMethod, params: &Parameters) -> Result<Payload, ActionError> {
        let data = params.bytes(DATA)?;
        match method {
            EncMethod::Encode => encode(params.choice(CODEC)?, data).map(Payload::Text),
            EncMethod::Decode => decode(params.choice(CODEC)?, data).map(Payload::Bytes),
            EncMethod::Hash => digest(params.choice(ALGORITHM)?, data).map(Payload::Text),
        }
    }
}

fn encode(codec: &str, data: &[u8]) -> Result<String, ActionError> {
    match codec {
        "base64" => Ok(STANDARD.encode(data)),
        "base64url" => Ok(URL_SAFE_NO_PAD.encode(data)),
        "hex" => Ok(hex::encode(data)),
        other => Err(ActionError::internal(format!("unsupported codec '{other}'"))),
    }
}

fn decode(codec: &str, data: &[u8]) -> Result<Vec<u8>, ActionError> {
    let encoded = data.trim_ascii();
    let decoded = match codec {
        "base64" => STANDARD.decode(encoded).map_err(|error| error.to_string()),
        "base64url" => URL_SAFE_LENIENT
            .decode(encoded)
            .map_err(|error| error.to_string()),
        "hex" => hex::decode(encoded).map_err(|error| error.to_string()),
        other => return Err(ActionError::internal(format!("unsupported codec '{other}'"))),
    };
    decoded.map_err(|reason| {
        let method = Method::Enc(EncMethod::Decode);
        ValidationError::invalid_parameter(
            method.kind().as_str(),
            method.as_str(),
            DATA,
            format!("not valid {codec}: {reason}"),
        )
        .into()
    })
}

fn digest(algorithm: &str, data: &[u8]) -> Result<String, ActionError> {
    match algorithm {
        "sha256" => Ok(hex::encode(Sha256::digest(data))),
        "sha512" => Ok(hex::encode(Sha512::digest(data))),
        other => Err(ActionError::internal(format!(
            "unsupported algorithm '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::ErrorKind;

    fn run(method: EncMethod, fields: Value) -> Result<Payload, ActionError> {
        let schema = match method {
            EncMethod::Encode => &ENCODE_SCHEMA,
            EncMethod::Decode => &DECODE_SCHEMA,
            EncMethod::Hash => &HASH_SCHEMA,
        };
        let params = schema
            .validate(Method::Enc(method), fields.as_object().expect("object"))
            .expect("valid parameters");
        EncHandler.execute(method, &params)
    }

    #[rstest]
    #[case::base64("base64", "aGk/Pw==")]
    #[case::base64url("base64url", "aGk_Pw")]
    #[case::hex("HEX", "68693f3f")]
    fn encodes_text_data(#[case] codec: &str, #[case] expected: &str) {
        let payload = run(EncMethod::Encode, json!({"data": "hi??", "codec": codec}))
            .expect("encode");
        assert_eq!(payload, Payload::Text(expected.to_owned()));
    }

    #[test]
    fn encodes_byte_arrays() {
        let payload = run(EncMethod::Encode, json!({"data": [0, 255], "codec": "hex"}))
            .expect("encode");
        assert_eq!(payload, Payload::Text(String::from("00ff")));
    }

    #[rstest]
    #[case::base64("base64", "aGk/Pw==")]
    #[case::base64url_unpadded("base64url", "aGk_Pw")]
    #[case::base64url_padded("base64url", "aGk_Pw==")]
    #[case::hex("hex", "68693F3F")]
    #[case::trailing_newline("hex", "68693f3f\n")]
    fn decodes_to_bytes(#[case] codec: &str, #[case] data: &str) {
        let payload = run(EncMethod::Decode, json!({"data": data, "codec": codec}))
            .expect("decode");
        assert_eq!(payload, Payload::Bytes(b"hi??".to_vec()));
    }

    #[rstest]
    #[case::base64("base64", "not base64!")]
    #[case::hex_odd("hex", "abc")]
    #[case::hex_digit("hex", "zz")]
    fn malformed_input_is_an_invalid_parameter(#[case] codec: &str, #[case] data: &str) {
        let error = run(EncMethod::Decode, json!({"data": data, "codec": codec}))
            .expect_err("malformed input");
        assert_eq!(error.kind(), ErrorKind::InvalidParameter);
        assert!(error.to_string().contains("'data'"), "{error}");
    }

    #[test]
    fn sha256_of_empty_input() {
        let payload = run(EncMethod::Hash, json!({"data": "", "algorithm": "sha256"}))
            .expect("hash");
        assert_eq!(
            payload,
            Payload::Text(String::from(
                "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
            ))
        );
    }

    #[test]
    fn sha512_digest_is_128_hex_chars() {
        let payload = run(EncMethod::Hash, json!({"data": "abc", "algorithm": "sha512"}))
            .expect("hash");
        let Payload::Text(digest) = payload else {
            panic!("expected text payload");
        };
        assert_eq!(digest.len(), 128);
        assert!(digest.starts_with("ddaf35a193617aba"));
    }
}
