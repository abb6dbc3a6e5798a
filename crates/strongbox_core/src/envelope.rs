//! Result envelopes.
//!
//! Every operation answers with exactly one JSON object of one of two shapes:
//!
//! ```json
//! {"success": true, ...payload fields}
//! {"success": false, "error": "message"}
//! ```
//!
//! The payload is a struct whose fields are flattened next to `success`.

use crate::category::CategoryIndex;
use crate::entry::Entry;
use crate::error::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Payload of operations that report nothing beyond success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {}

/// Payload of `list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryList {
    /// Every entry in the store, in no particular order.
    pub entries: Vec<Entry>,
}

/// Payload of `list_categories`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    /// Entry count per category.
    pub categories: CategoryIndex,
}

/// The outcome of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope<T> {
    /// The operation succeeded with this payload.
    Success(T),
    /// The operation failed with this message.
    Failure(String),
}

#[derive(Serialize)]
struct SuccessRepr<'a, T> {
    success: bool,
    #[serde(flatten)]
    payload: &'a T,
}

#[derive(Serialize)]
struct FailureRepr<'a> {
    success: bool,
    error: &'a str,
}

impl<T> Envelope<T> {
    /// Wraps a successful payload.
    pub fn success(payload: T) -> Self {
        Self::Success(payload)
    }

    /// Wraps a failure message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    /// Returns true for the success shape.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Converts back into a `Result`, with the failure message as the error.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::Failure(message) => Err(message),
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success(payload) => SuccessRepr {
                success: true,
                payload,
            }
            .serialize(serializer),
            Self::Failure(error) => FailureRepr {
                success: false,
                error,
            }
            .serialize(serializer),
        }
    }
}

impl<T: Serialize> Envelope<T> {
    /// Encodes the envelope as compact JSON.
    ///
    /// A payload that cannot be serialized turns into a failure envelope, so
    /// this always yields one of the two shapes.
    #[must_use]
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            let failure: Envelope<Ack> = Envelope::failure(format!("failed to encode result: {e}"));
            serde_json::to_string(&failure)
                .unwrap_or_else(|_| r#"{"success":false,"error":"failed to encode result"}"#.into())
        })
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Parses an envelope produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` if `success` is missing or not a boolean, a
    /// failure carries anything but a string `error`, or a success payload
    /// does not match `T`.
    pub fn decode(json: &str) -> CoreResult<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| CoreError::malformed_input(format!("envelope is not valid JSON: {e}")))?;
        let Value::Object(mut fields) = value else {
            return Err(CoreError::malformed_input("envelope must be a JSON object"));
        };

        match fields.remove("success") {
            Some(Value::Bool(true)) => serde_json::from_value(Value::Object(fields))
                .map(Self::Success)
                .map_err(|e| CoreError::malformed_input(format!("unexpected payload: {e}"))),
            Some(Value::Bool(false)) => {
                let error = match fields.remove("error") {
                    Some(Value::String(error)) => error,
                    _ => {
                        return Err(CoreError::malformed_input(
                            "failure envelope needs a string 'error' field",
                        ))
                    }
                };
                if let Some(extra) = fields.keys().next() {
                    return Err(CoreError::malformed_input(format!(
                        "failure envelope has unexpected field '{extra}'"
                    )));
                }
                Ok(Self::Failure(error))
            }
            Some(_) => Err(CoreError::malformed_input("'success' must be a boolean")),
            None => Err(CoreError::malformed_input("envelope has no 'success' field")),
        }
    }
}

impl<T> From<CoreResult<T>> for Envelope<T> {
    fn from(result: CoreResult<T>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(err) => Self::Failure(err.to_string()),
        }
    }
}
