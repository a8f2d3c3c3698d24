//! The `{ error, message, body }` wrapper returned by every ajax endpoint.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::ApiError;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    body: serde_json::Value,
}

/// Decodes an ajax response, turning `error: true` into `ApiError::Api`.
///
/// The body is decoded only after the error flag is checked: failed calls
/// return `body: []` or `{}` regardless of the endpoint's success shape.
pub(crate) fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;
    if envelope.error {
        return Err(ApiError::Api(
            envelope
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "unknown error".to_string()),
        ));
    }
    if envelope.body.is_null() {
        return Err(ApiError::MissingBody);
    }
    Ok(serde_json::from_value(envelope.body)?)
}
