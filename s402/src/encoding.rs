//! Base64 transport encoding for payment headers.
//!
//! Payment authorizations travel as base64-encoded JSON (typically inside an
//! `X-PAYMENT` HTTP header). [`Base64Bytes`] wraps the encoded form and
//! offers decoding into raw bytes or straight into a deserializable type.

use std::fmt::Display;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use serde::de::DeserializeOwned;

/// A base64-encoded byte string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes(pub Vec<u8>);

impl Base64Bytes {
    /// Encodes raw binary data into base64 string bytes.
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Self {
        Self(b64.encode(input.as_ref()).into_bytes())
    }

    /// Decodes the base64 string bytes into raw binary data.
    ///
    /// # Errors
    ///
    /// Returns an error if the contents are not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64.decode(&self.0)
    }

    /// Decodes the base64 contents and parses them as JSON.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the contents are not valid
    /// base64 or the decoded bytes are not valid JSON for `T`.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, String> {
        let raw = self.decode().map_err(|e| format!("invalid base64: {e}"))?;
        serde_json::from_slice(&raw).map_err(|e| format!("invalid JSON: {e}"))
    }
}

impl AsRef<[u8]> for Base64Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Base64Bytes {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl Display for Base64Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let encoded = Base64Bytes::encode(b"hello");
        assert_eq!(encoded.to_string(), "aGVsbG8=");
        assert_eq!(encoded.decode().unwrap(), b"hello");
    }

    #[test]
    fn test_decode_json() {
        let encoded = Base64Bytes::encode(br#"{"a":1}"#);
        let value: serde_json::Value = encoded.decode_json().unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        let bogus = Base64Bytes::from("not base64 !!!");
        assert!(bogus.decode().is_err());
    }
}
