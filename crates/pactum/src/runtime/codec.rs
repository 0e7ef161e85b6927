use crate::runtime::HandlerError;
use serde::{Serialize, de::DeserializeOwned};

/// Decode a JSON request body. A missing body is an error.
pub fn decode<T: DeserializeOwned>(payload: Option<&[u8]>) -> Result<T, HandlerError> {
    let bytes = payload.ok_or_else(|| HandlerError::Decode("missing payload".to_string()))?;

    serde_json::from_slice(bytes).map_err(|e| HandlerError::Decode(e.to_string()))
}

/// Encode a response as JSON.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HandlerError> {
    serde_json::to_vec(value).map_err(|e| HandlerError::Encode(e.to_string()))
}
