//! Request input decoding and validation.

use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use zap_core::{Failure, ValidationIssues};

/// Decode `value` into `T` and run its validation rules.
///
/// Both shape mismatches and rule violations come back as
/// [`Failure::Validation`], so API routes answer them with 400 and RPC
/// procedures with `BAD_REQUEST`.
pub fn parse_input<T>(value: Value) -> Result<T, Failure>
where
    T: DeserializeOwned + Validate,
{
    validated(serde_json::from_value(value))
}

/// Same as [`parse_input`] for a raw request body. Malformed JSON is an
/// `invalid_type` issue, not a transport rejection.
pub fn parse_json_body<T>(body: &[u8]) -> Result<T, Failure>
where
    T: DeserializeOwned + Validate,
{
    validated(serde_json::from_slice(body))
}

fn validated<T: Validate>(decoded: serde_json::Result<T>) -> Result<T, Failure> {
    let input = decoded.map_err(|e| Failure::Validation(ValidationIssues::from(&e)))?;
    input.validate()?;
    Ok(input)
}
