//! Terminal outcomes of an admission attempt.
//!
//! Lock denial, sold-out and duplicate participation are **expected**
//! results of a correctly working sale, not errors. Modeling them as enum
//! variants forces the service layer to handle each one; only genuine store
//! failures travel the error channel.

use serde::{Deserialize, Serialize};

/// Result of one `participate` attempt. Every variant is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ParticipationOutcome {
    /// The user won a unit. `remaining` is the stock left after this
    /// admission (the decrement result).
    Admitted { remaining: i64 },

    /// The user is already in the participant set; nothing was mutated.
    AlreadyParticipated,

    /// Another attempt holds the per-product lock. The caller should try
    /// again shortly; the core never retries on its own.
    LockDenied,

    /// Stock was depleted; the speculative decrement was compensated.
    SoldOut,
}

impl ParticipationOutcome {
    /// Whether the attempt ended in admission.
    pub fn admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }

    /// Stock remaining after an admission; `None` for every other outcome.
    pub fn remaining_stock(&self) -> Option<i64> {
        match self {
            Self::Admitted { remaining } => Some(*remaining),
            _ => None,
        }
    }

    /// User-facing message for the service layer.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Admitted { .. } => "Congratulations! Your registration is complete.",
            Self::AlreadyParticipated => "You have already participated in this sale.",
            Self::LockDenied => {
                "Another request is being processed. Please try again shortly."
            }
            Self::SoldOut => "This sale has ended. Better luck next time!",
        }
    }
}

/// Wire-shaped response for the service layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_stock: Option<i64>,
}

impl From<&ParticipationOutcome> for ParticipationResponse {
    fn from(outcome: &ParticipationOutcome) -> Self {
        Self {
            success: outcome.admitted(),
            message: outcome.message().to_string(),
            remaining_stock: outcome.remaining_stock(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admission_counts_as_success() {
        assert!(ParticipationOutcome::Admitted { remaining: 0 }.admitted());
        assert!(!ParticipationOutcome::AlreadyParticipated.admitted());
        assert!(!ParticipationOutcome::LockDenied.admitted());
        assert!(!ParticipationOutcome::SoldOut.admitted());
    }

    #[test]
    fn remaining_stock_is_present_only_on_admission() {
        assert_eq!(
            ParticipationOutcome::Admitted { remaining: 3 }.remaining_stock(),
            Some(3)
        );
        assert_eq!(ParticipationOutcome::SoldOut.remaining_stock(), None);
    }

    #[test]
    fn response_omits_remaining_stock_when_absent() {
        let response = ParticipationResponse::from(&ParticipationOutcome::SoldOut);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("remaining_stock").is_none());
    }

    #[test]
    fn response_carries_remaining_stock_on_admission() {
        let response =
            ParticipationResponse::from(&ParticipationOutcome::Admitted { remaining: 7 });
        assert!(response.success);
        assert_eq!(response.remaining_stock, Some(7));
    }
}
