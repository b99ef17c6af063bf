//! Function result payloads and the assembler's discrepancy report.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The six named discrepancy lists produced by the assembler and embedded
/// in the operator summary mail. Key spelling is part of the wire contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancies {
    /// Suppliers with order files but no schedule entry
    #[serde(rename = "not-in-cad")]
    pub not_in_cad: Vec<String>,

    /// Scheduled suppliers with no order files
    #[serde(rename = "not-in-wms")]
    pub not_in_wms: Vec<String>,

    /// Suppliers with at least one store below the minimum order quantity
    #[serde(rename = "not-in-mov")]
    pub not_in_mov: Vec<String>,

    /// Suppliers with both compliant and non-compliant stores
    #[serde(rename = "both-mov")]
    pub both_mov: Vec<String>,

    /// Dispatch-eligible suppliers with no MOV information at all
    #[serde(rename = "no-mov")]
    pub no_mov: Vec<String>,

    /// Scheduled suppliers missing from the name dictionary
    #[serde(rename = "not-in-dict")]
    pub not_in_dict: Vec<String>,
}

/// Every stage's JSON result: `error_message` is null on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionReply {
    pub function_name: String,
    pub error_message: Option<String>,
    pub error_details: Option<Value>,
}

impl FunctionReply {
    pub fn success(function_name: &str) -> Self {
        Self {
            function_name: function_name.to_string(),
            error_message: None,
            error_details: None,
        }
    }

    pub fn success_with_details(function_name: &str, details: Value) -> Self {
        Self {
            function_name: function_name.to_string(),
            error_message: None,
            error_details: Some(details),
        }
    }

    pub fn failure(function_name: &str, message: impl ToString) -> Self {
        Self {
            function_name: function_name.to_string(),
            error_message: Some(message.to_string()),
            error_details: None,
        }
    }

    pub fn failure_with_details(
        function_name: &str,
        message: impl ToString,
        details: Value,
    ) -> Self {
        Self {
            function_name: function_name.to_string(),
            error_message: Some(message.to_string()),
            error_details: Some(details),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_message.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrepancy_keys_use_kebab_case() {
        let report = Discrepancies {
            not_in_cad: vec!["ACME".to_string()],
            ..Discrepancies::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["not-in-cad"][0], "ACME");
        assert!(json.get("not-in-wms").is_some());
        assert!(json.get("not_in_cad").is_none());
    }

    #[test]
    fn success_reply_has_null_error() {
        let reply = FunctionReply::success("MailBagger");
        assert!(reply.is_success());
        let json = serde_json::to_value(&reply).unwrap();
        assert!(json["error_message"].is_null());
    }
}
