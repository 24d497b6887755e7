//! The uniform response wrapper used by every election endpoint.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::ApiError;

/// `{success, data?, error?, message?}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Best available explanation of a failed call.
    pub fn failure_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "request failed".to_string())
    }
}

impl ApiEnvelope<serde_json::Value> {
    /// Unwrap the payload of a successful envelope as `T`.
    ///
    /// A `success: false` envelope becomes whatever `on_failure` builds from
    /// the service message, so each endpoint can classify its own failures.
    /// A missing `data` decodes as JSON `null`, which suits unit payloads.
    pub fn into_result<T>(self, on_failure: fn(String) -> ApiError) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        if !self.success {
            return Err(on_failure(self.failure_message()));
        }
        let data = self.data.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(data).map_err(|e| ApiError::Protocol(format!("unexpected payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(raw: serde_json::Value) -> ApiEnvelope<serde_json::Value> {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn success_unwraps_data() {
        let env = parse(json!({"success": true, "data": [1, 2, 3]}));
        let data: Vec<u32> = env.into_result(ApiError::Rejected).unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[test]
    fn failure_uses_endpoint_classification() {
        let env = parse(json!({"success": false, "error": "ya votaste"}));
        let err = env.into_result::<()>(ApiError::Conflict).unwrap_err();
        assert_eq!(err, ApiError::Conflict("ya votaste".into()));
    }

    #[test]
    fn failure_falls_back_to_message_field() {
        let env = parse(json!({"success": false, "message": "votación cerrada"}));
        assert_eq!(env.failure_message(), "votación cerrada");
    }

    #[test]
    fn missing_data_is_fine_for_unit_payloads() {
        let env = parse(json!({"success": true}));
        assert!(env.into_result::<()>(ApiError::Rejected).is_ok());
    }

    #[test]
    fn missing_data_is_a_protocol_error_otherwise() {
        let env = parse(json!({"success": true}));
        let err = env.into_result::<Vec<u32>>(ApiError::Rejected).unwrap_err();
        assert!(matches!(err, ApiError::Protocol(_)));
    }
}
