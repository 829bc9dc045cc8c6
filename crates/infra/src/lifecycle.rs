//! Registration lifecycle: `draft -> submitted -> {approved, rejected}`,
//! with a payment sub-state `pending -> submitted -> {verified, rejected}`
//! that is only tracked when the owning form config requires payment.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Draft => "draft",
            RegistrationStatus::Submitted => "submitted",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(RegistrationStatus::Draft),
            "submitted" => Some(RegistrationStatus::Submitted),
            "approved" => Some(RegistrationStatus::Approved),
            "rejected" => Some(RegistrationStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RegistrationStatus::Approved | RegistrationStatus::Rejected
        )
    }

    /// Checks the transition table; terminal states admit nothing, and the
    /// status only ever moves forward.
    pub fn advance(self, to: RegistrationStatus) -> Result<RegistrationStatus, DomainError> {
        let allowed = matches!(
            (self, to),
            (RegistrationStatus::Draft, RegistrationStatus::Submitted)
                | (RegistrationStatus::Submitted, RegistrationStatus::Approved)
                | (RegistrationStatus::Submitted, RegistrationStatus::Rejected)
        );

        if allowed {
            Ok(to)
        } else {
            Err(DomainError::InvalidTransition {
                from: self.as_str(),
                to: to.as_str(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Submitted,
    Verified,
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Submitted => "submitted",
            PaymentStatus::Verified => "verified",
            PaymentStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "submitted" => Some(PaymentStatus::Submitted),
            "verified" => Some(PaymentStatus::Verified),
            "rejected" => Some(PaymentStatus::Rejected),
            _ => None,
        }
    }

    /// Payment transitions are independent of the parent registration
    /// status: a registration can be submitted while payment is pending,
    /// and approving it does not require payment to be verified first.
    pub fn advance(self, to: PaymentStatus) -> Result<PaymentStatus, DomainError> {
        let allowed = matches!(
            (self, to),
            (PaymentStatus::Pending, PaymentStatus::Submitted)
                | (PaymentStatus::Submitted, PaymentStatus::Verified)
                | (PaymentStatus::Submitted, PaymentStatus::Rejected)
        );

        if allowed {
            Ok(to)
        } else {
            Err(DomainError::InvalidTransition {
                from: self.as_str(),
                to: to.as_str(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_moves_forward_only() {
        assert_eq!(
            RegistrationStatus::Draft
                .advance(RegistrationStatus::Submitted)
                .unwrap(),
            RegistrationStatus::Submitted
        );
        assert_eq!(
            RegistrationStatus::Submitted
                .advance(RegistrationStatus::Approved)
                .unwrap(),
            RegistrationStatus::Approved
        );
        assert_eq!(
            RegistrationStatus::Submitted
                .advance(RegistrationStatus::Rejected)
                .unwrap(),
            RegistrationStatus::Rejected
        );
    }

    #[test]
    fn no_backward_transition_from_terminal_states() {
        let err = RegistrationStatus::Approved
            .advance(RegistrationStatus::Submitted)
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition {
                from: "approved",
                to: "submitted"
            }
        ));

        assert!(RegistrationStatus::Rejected
            .advance(RegistrationStatus::Draft)
            .is_err());
        assert!(RegistrationStatus::Approved
            .advance(RegistrationStatus::Approved)
            .is_err());
    }

    #[test]
    fn draft_cannot_skip_to_terminal() {
        assert!(RegistrationStatus::Draft
            .advance(RegistrationStatus::Approved)
            .is_err());
        assert!(RegistrationStatus::Draft
            .advance(RegistrationStatus::Rejected)
            .is_err());
    }

    #[test]
    fn payment_transition_table() {
        assert!(PaymentStatus::Pending.advance(PaymentStatus::Submitted).is_ok());
        assert!(PaymentStatus::Submitted.advance(PaymentStatus::Verified).is_ok());
        assert!(PaymentStatus::Submitted.advance(PaymentStatus::Rejected).is_ok());

        assert!(PaymentStatus::Pending.advance(PaymentStatus::Verified).is_err());
        assert!(PaymentStatus::Verified.advance(PaymentStatus::Submitted).is_err());
        assert!(PaymentStatus::Rejected.advance(PaymentStatus::Pending).is_err());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            RegistrationStatus::Draft,
            RegistrationStatus::Submitted,
            RegistrationStatus::Approved,
            RegistrationStatus::Rejected,
        ] {
            assert_eq!(RegistrationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RegistrationStatus::parse("cancelled"), None);
        assert_eq!(PaymentStatus::parse("verified"), Some(PaymentStatus::Verified));
    }
}
