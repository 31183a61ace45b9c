//! Generic response envelope for every `/api` and `/auth` payload

use serde::{Deserialize, Serialize};

/// `{ success, data?, error?, message? }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_omits_error_fields() {
        let json = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": [1, 2]}));
    }

    #[test]
    fn test_err_omits_data() {
        let json = serde_json::to_value(ApiResponse::<()>::err("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "boom"}));
    }

    #[test]
    fn test_ok_with_message_deserializes() {
        let resp = ApiResponse::ok_with_message("wf-1".to_string(), "Workflow created");
        let text = serde_json::to_string(&resp).unwrap();
        let back: ApiResponse<String> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, resp);
        assert_eq!(back.message.as_deref(), Some("Workflow created"));
    }
}
