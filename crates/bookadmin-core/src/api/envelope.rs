use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::ApiError;

/// The `{ success, message, data }` wrapper every endpoint responds with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Validate a raw response body against the envelope shape.
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        serde_json::from_value(value).map_err(|e| ApiError::ContractViolation(e.to_string()))
    }
}

impl<T> Envelope<T> {
    /// Unwrap `data`, failing loudly when the server omitted it.
    pub fn into_data(self) -> Result<T, ApiError> {
        self.data.ok_or_else(|| {
            ApiError::ContractViolation(match self.message {
                Some(message) => format!("response has no data ({})", message),
                None => "response has no data".to_string(),
            })
        })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            success: self.success,
            message: self.message,
            data: self.data.map(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Stats {
        total_users: u64,
    }

    #[test]
    fn test_typed_data() {
        let env: Envelope<Stats> =
            Envelope::from_value(json!({ "success": true, "data": { "total_users": 12 } }))
                .expect("valid envelope");
        assert!(env.success);
        assert_eq!(env.message, None);
        assert_eq!(env.into_data().expect("has data"), Stats { total_users: 12 });
    }

    #[test]
    fn test_shape_drift_is_a_contract_violation() {
        let err = Envelope::<Stats>::from_value(json!({ "success": true, "data": { "users": 12 } }))
            .unwrap_err();
        assert!(matches!(err, ApiError::ContractViolation(_)));

        let err = Envelope::<Stats>::from_value(json!({ "data": {} })).unwrap_err();
        assert!(matches!(err, ApiError::ContractViolation(_)));
    }

    #[test]
    fn test_missing_data() {
        let env: Envelope<Stats> =
            Envelope::from_value(json!({ "success": true, "message": "ok" })).expect("valid");
        let err = env.into_data().unwrap_err();
        assert_eq!(err.to_string(), "Unexpected response shape: response has no data (ok)");
    }
}
