use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CoreError;

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Uniform JSON envelope returned by every endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub info: Option<Value>,
    pub status: u16,
    pub message: String,
}

impl ApiResponse {
    pub const OK: &'static str = "OK";
    pub const CREATED: &'static str = "Created";

    pub fn new(info: Option<Value>, status: u16, message: impl Into<String>) -> Result<Self, CoreError> {
        if !(100..=599).contains(&status) {
            return Err(CoreError::InvalidStatus(status));
        }
        Ok(Self { info, status, message: message.into() })
    }

    /// Error envelope; `info` stays empty.
    pub fn error(message: impl Into<String>, status: u16) -> Self {
        Self { info: None, status, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_out_of_range_status() {
        assert!(ApiResponse::new(None, 99, "x").is_err());
        assert!(ApiResponse::new(None, 600, "x").is_err());
        assert!(ApiResponse::new(None, 418, "teapot").is_ok());
    }

    #[test]
    fn created_envelope_shape() {
        let r = ApiResponse::new(Some(json!({"email": "a@b.com"})), 201, ApiResponse::CREATED).unwrap();
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["status"], 201);
        assert_eq!(v["message"], "Created");
        assert_eq!(v["info"]["email"], "a@b.com");
    }

    #[test]
    fn error_envelope_has_null_info() {
        let v = serde_json::to_value(ApiResponse::error("nope", 401)).unwrap();
        assert!(v["info"].is_null());
        assert_eq!(v["status"], 401);
    }
}
