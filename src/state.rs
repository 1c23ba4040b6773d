//! Pure state-transition logic for the two-tier approval chain

use crate::error::ApprovalError;

/// Where a request sits in its approval lifecycle. `Approved` and `Rejected`
/// are terminal; nothing transitions out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum ApprovalState {
    #[n(0)]
    Pending,
    #[n(1)]
    ConfirmedLevel1,
    #[n(2)]
    ConfirmedLevel2,
    #[n(3)]
    Approved,
    #[n(4)]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalAction {
    ConfirmLevel1,
    ConfirmLevel2,
    Approve,
    Reject,
}

impl ApprovalState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApprovalState::Approved | ApprovalState::Rejected)
    }

    /// Validate and apply one action. Confirmation levels must be passed in
    /// order before `Approve`; `Reject` is allowed from any non-terminal
    /// state. Anything else is an `InvalidTransition`.
    pub fn apply(self, action: ApprovalAction) -> Result<ApprovalState, ApprovalError> {
        use ApprovalAction::*;
        use ApprovalState::*;

        match (self, action) {
            (Pending, ConfirmLevel1) => Ok(ConfirmedLevel1),
            (ConfirmedLevel1, ConfirmLevel2) => Ok(ConfirmedLevel2),
            (ConfirmedLevel2, Approve) => Ok(Approved),
            (Pending | ConfirmedLevel1 | ConfirmedLevel2, Reject) => Ok(Rejected),
            (from, action) => Err(ApprovalError::InvalidTransition { from, action }),
        }
    }
}
