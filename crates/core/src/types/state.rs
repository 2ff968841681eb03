//! State enums for orders and shipments.
//!
//! These mirror the workflow states of the local system of record. The engine
//! never drives the workflows itself; it only reads these states to decide
//! what is eligible for export.

use serde::{Deserialize, Serialize};

/// Error returned when parsing a state from its wire form fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} state: {value}")]
pub struct StateParseError {
    /// Which state enum rejected the value.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Order workflow state in the local system of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderWorkflowState {
    #[default]
    Draft,
    Quotation,
    Confirmed,
    Processing,
    Done,
    Cancelled,
}

impl std::fmt::Display for OrderWorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Quotation => "quotation",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderWorkflowState {
    type Err = StateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "quotation" => Ok(Self::Quotation),
            "confirmed" => Ok(Self::Confirmed),
            "processing" => Ok(Self::Processing),
            "done" => Ok(Self::Done),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(StateParseError {
                kind: "order workflow",
                value: s.to_owned(),
            }),
        }
    }
}

/// Aggregate fulfillment state of an order.
///
/// Shipment-status export only considers orders whose fulfillment state is
/// [`FulfillmentState::Sent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentState {
    #[default]
    None,
    Waiting,
    PartiallySent,
    Sent,
    Exception,
}

/// State of a single outgoing shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentState {
    #[default]
    Draft,
    Waiting,
    Assigned,
    Packed,
    Done,
    Cancelled,
}

impl ShipmentState {
    /// Whether the shipment has physically left and may be announced to the
    /// remote platform.
    #[must_use]
    pub const fn is_dispatched(self) -> bool {
        matches!(self, Self::Packed | Self::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_order_workflow_state_round_trip() {
        for state in [
            OrderWorkflowState::Draft,
            OrderWorkflowState::Quotation,
            OrderWorkflowState::Confirmed,
            OrderWorkflowState::Processing,
            OrderWorkflowState::Done,
            OrderWorkflowState::Cancelled,
        ] {
            let parsed = OrderWorkflowState::from_str(&state.to_string()).expect("parse");
            assert_eq!(parsed, state);
        }
    }

    #[test]
    fn test_order_workflow_state_rejects_unknown() {
        let err = OrderWorkflowState::from_str("shipped").expect_err("must reject");
        assert_eq!(err.value, "shipped");
    }

    #[test]
    fn test_shipment_dispatch_gate() {
        assert!(ShipmentState::Packed.is_dispatched());
        assert!(ShipmentState::Done.is_dispatched());
        assert!(!ShipmentState::Draft.is_dispatched());
        assert!(!ShipmentState::Waiting.is_dispatched());
        assert!(!ShipmentState::Assigned.is_dispatched());
        assert!(!ShipmentState::Cancelled.is_dispatched());
    }
}
