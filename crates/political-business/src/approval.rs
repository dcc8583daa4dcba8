//! E-voting approval gate.

use serde::{Deserialize, Serialize};

use votebasis_core::{DomainError, DomainResult};

/// Tri-state e-voting approval of a political business.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EVotingApproval {
    /// The business does not take part in e-voting.
    #[default]
    Unsupported,
    Pending,
    Approved,
}

/// Result of an idempotent approval attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    Changed,
    Unchanged,
}

impl EVotingApproval {
    /// Initial approval for a business whose contest does (not) use e-voting.
    pub fn for_contest(e_voting: bool) -> Self {
        if e_voting {
            EVotingApproval::Pending
        } else {
            EVotingApproval::Unsupported
        }
    }

    pub fn is_approved(self) -> bool {
        matches!(self, EVotingApproval::Approved)
    }

    /// Structural mutations of `what` are refused once approved.
    pub fn ensure_not_approved(self, what: &str) -> DomainResult<()> {
        if self.is_approved() {
            return Err(DomainError::e_voting_approved(what));
        }
        Ok(())
    }

    fn ensure_supported(self, what: &str) -> DomainResult<()> {
        if self == EVotingApproval::Unsupported {
            return Err(DomainError::EVotingNotSupported(what.to_string()));
        }
        Ok(())
    }

    /// Validate granting approval.
    pub fn check_approve(self, what: &str) -> DomainResult<()> {
        self.ensure_supported(what)?;
        if self.is_approved() {
            return Err(DomainError::conflict(format!(
                "e-voting of {what} is already approved"
            )));
        }
        Ok(())
    }

    /// Validate reverting an approval.
    pub fn check_revert(self, what: &str) -> DomainResult<()> {
        self.ensure_supported(what)?;
        if !self.is_approved() {
            return Err(DomainError::invalid_state(format!(
                "e-voting of {what} is not approved"
            )));
        }
        Ok(())
    }

    /// Like [`check_approve`](Self::check_approve), but approving twice is not an error.
    pub fn check_try_approve(self, what: &str) -> DomainResult<ApprovalOutcome> {
        self.ensure_supported(what)?;
        if self.is_approved() {
            return Ok(ApprovalOutcome::Unchanged);
        }
        Ok(ApprovalOutcome::Changed)
    }

    pub fn with_approved(self, approved: bool) -> Self {
        if approved {
            EVotingApproval::Approved
        } else {
            EVotingApproval::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_business_rejects_approval_endpoints() {
        let approval = EVotingApproval::for_contest(false);
        assert!(matches!(
            approval.check_approve("vote"),
            Err(DomainError::EVotingNotSupported(_))
        ));
        assert!(matches!(
            approval.check_revert("vote"),
            Err(DomainError::EVotingNotSupported(_))
        ));
        assert!(matches!(
            approval.check_try_approve("vote"),
            Err(DomainError::EVotingNotSupported(_))
        ));
        assert!(approval.ensure_not_approved("vote").is_ok());
    }

    #[test]
    fn approve_revert_cycle() {
        let pending = EVotingApproval::for_contest(true);
        pending.check_approve("election").unwrap();
        let approved = pending.with_approved(true);

        assert_eq!(
            approved.ensure_not_approved("list"),
            Err(DomainError::e_voting_approved("list"))
        );
        assert!(matches!(
            approved.check_approve("election"),
            Err(DomainError::Conflict(_))
        ));
        assert_eq!(
            approved.check_try_approve("election"),
            Ok(ApprovalOutcome::Unchanged)
        );

        approved.check_revert("election").unwrap();
        let reverted = approved.with_approved(false);
        assert!(reverted.ensure_not_approved("list").is_ok());
        assert!(matches!(
            reverted.check_revert("election"),
            Err(DomainError::InvalidState(_))
        ));
    }
}
