//! A Long-Running Operation record and its lifecycle state machine.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LroType {
    #[serde(rename = "CREATE_SUBSCRIPTION")]
    CreateSubscription,
    #[serde(rename = "UPDATE_SUBSCRIPTION")]
    UpdateSubscription,
}

/// `FAILURE` is a transient, retryable state; `REJECTED` is terminal (as is
/// `APPROVED`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LroStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "REJECTED")]
    Rejected,
    #[serde(rename = "FAILURE")]
    Failure,
}

impl LroStatus {
    /// APPROVED and REJECTED are terminal: any further admin action on the
    /// LRO must fail with `LRO_ALREADY_PROCESSED`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LroStatus::Approved | LroStatus::Rejected)
    }
}

/// A persisted Long-Running Operation, keyed by the client-supplied
/// `message_id` (the `operation_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lro {
    pub operation_id: String,
    #[serde(rename = "type")]
    pub lro_type: LroType,
    pub status: LroStatus,
    /// Opaque bytes: the original subscription request as submitted.
    pub request_json: Vec<u8>,
    /// Opaque bytes, populated on success.
    #[serde(default)]
    pub result_json: Option<Vec<u8>>,
    /// Opaque bytes, populated on failure with `{"error": "..."}` or
    /// `{"reason": "..."}`.
    #[serde(default)]
    pub error_data_json: Option<Vec<u8>>,
    pub retry_count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Lro {
    /// New LROs always start `PENDING` with `retry_count = 0`.
    pub fn new(
        operation_id: impl Into<String>,
        lro_type: LroType,
        request_json: Vec<u8>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            lro_type,
            status: LroStatus::Pending,
            request_json,
            result_json: None,
            error_data_json: None,
            retry_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lro_starts_pending_with_no_retries() {
        let now = OffsetDateTime::now_utc();
        let lro = Lro::new("op1", LroType::CreateSubscription, b"{}".to_vec(), now);
        assert_eq!(lro.status, LroStatus::Pending);
        assert_eq!(lro.retry_count, 0);
        assert!(lro.result_json.is_none());
    }

    #[test]
    fn only_approved_and_rejected_are_terminal() {
        assert!(LroStatus::Approved.is_terminal());
        assert!(LroStatus::Rejected.is_terminal());
        assert!(!LroStatus::Pending.is_terminal());
        assert!(!LroStatus::Failure.is_terminal());
    }

    #[test]
    fn lro_type_wire_values_match_the_documented_vocabulary() {
        assert_eq!(serde_json::to_string(&LroType::CreateSubscription).unwrap(), "\"CREATE_SUBSCRIPTION\"");
        assert_eq!(serde_json::to_string(&LroType::UpdateSubscription).unwrap(), "\"UPDATE_SUBSCRIPTION\"");
    }
}
