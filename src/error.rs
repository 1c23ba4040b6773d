use crate::calendar::Day;
use crate::state::{ApprovalAction, ApprovalState};

#[derive(thiserror::Error, Debug)]
pub enum ApprovalError {
    #[error("no request found for id {0}")]
    NotFound(String),
    #[error("{action:?} is not allowed from state {from:?}")]
    InvalidTransition {
        from: ApprovalState,
        action: ApprovalAction,
    },
    #[error("end date {end} precedes start date {start}")]
    InvalidRange { start: Day, end: Day },
    #[error("edit request is missing the prior day or range it supersedes")]
    MissingPrior,
    #[error("request {0} was modified by a concurrent action")]
    ConcurrentUpdate(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger rejected the entry: {0}")]
    Rejected(String),
    #[error("no matching entry in the ledger")]
    NotFound,
    #[error("transient ledger failure: {0}")]
    Transient(String),
}
