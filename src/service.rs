//! Service layer API for the approval workflow and ledger synchronization

use std::sync::Arc;

use log::{info, warn};

use crate::ledger::{self, LedgerClient};
use crate::planner::{self, LedgerOp};
use crate::request::{Request, RequestDraft, TimeStamp};
use crate::state::ApprovalAction;
use crate::store::RequestStore;

/// Per-operation outcome of executing an approved request's ledger plan.
/// Failures carry the exact operation so an operator can reconcile by hand.
#[derive(Debug)]
pub struct SyncReport {
    pub succeeded: Vec<LedgerOp>,
    pub failed: Vec<FailedOp>,
}

#[derive(Debug)]
pub struct FailedOp {
    pub op: LedgerOp,
    pub reason: String,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ApprovalService<L> {
    store: RequestStore,
    ledger: L,
}

impl<L: LedgerClient> ApprovalService<L> {
    pub fn new(db: Arc<sled::Db>, ledger: L) -> Self {
        Self {
            store: RequestStore::new(db),
            ledger,
        }
    }

    /// Validate a draft and persist it in `Pending`. The submission surface
    /// has already validated; this re-checks so a malformed draft can never
    /// reach the store.
    pub fn submit_request(&self, draft: RequestDraft, created_by: &str) -> anyhow::Result<Request> {
        let request = draft.validate_and_finalise(created_by)?;
        self.store.insert_new(&request)?;
        info!(
            "request {} submitted by {} for employee {}",
            request.request_id, created_by, request.employee_ref
        );
        Ok(request)
    }

    pub fn get_request(&self, request_id: &str) -> anyhow::Result<Request> {
        self.store.load(request_id)
    }

    /// First-tier confirmation, typically the line supervisor.
    pub fn confirm_level1(&self, request_id: &str, actor_id: &str) -> anyhow::Result<Request> {
        self.transition(request_id, ApprovalAction::ConfirmLevel1, actor_id, None)
    }

    /// Second-tier confirmation by a distinct authority.
    pub fn confirm_level2(&self, request_id: &str, actor_id: &str) -> anyhow::Result<Request> {
        self.transition(request_id, ApprovalAction::ConfirmLevel2, actor_id, None)
    }

    /// Reject a request from any non-terminal state.
    pub fn reject(
        &self,
        request_id: &str,
        actor_id: &str,
        notes: Option<&str>,
    ) -> anyhow::Result<Request> {
        self.transition(request_id, ApprovalAction::Reject, actor_id, notes)
    }

    /// Final approval. The `Approved` state is durable before any ledger call
    /// is made: approval is authoritative for the requester, and ledger
    /// execution is best-effort reconciliation, not a precondition. Every
    /// operation in the plan runs regardless of earlier failures; the report
    /// attributes each outcome to its operation.
    pub fn approve(
        &self,
        request_id: &str,
        actor_id: &str,
        notes: Option<&str>,
    ) -> anyhow::Result<(Request, SyncReport)> {
        let request = self.transition(request_id, ApprovalAction::Approve, actor_id, notes)?;

        let plan = planner::plan(&request);
        info!(
            "request {}: executing {} ledger operations",
            request.request_id,
            plan.len()
        );
        let report = self.execute_plan(plan);
        if !report.is_complete() {
            warn!(
                "request {}: {} of {} ledger operations failed, manual reconciliation needed",
                request.request_id,
                report.failed.len(),
                report.failed.len() + report.succeeded.len()
            );
        }

        Ok((request, report))
    }

    fn transition(
        &self,
        request_id: &str,
        action: ApprovalAction,
        actor_id: &str,
        notes: Option<&str>,
    ) -> anyhow::Result<Request> {
        let (mut request, prev) = self.store.load_raw(request_id)?;

        request.state = request.state.apply(action)?;
        match action {
            ApprovalAction::ConfirmLevel1 => {
                request.confirmed_by_level1 = Some(actor_id.to_string());
            }
            ApprovalAction::ConfirmLevel2 => {
                request.confirmed_by_level2 = Some(actor_id.to_string());
            }
            ApprovalAction::Approve => {
                request.approved_by = Some(actor_id.to_string());
                request.response_notes = notes.map(str::to_string);
                request.resolved_at = Some(TimeStamp::new());
            }
            ApprovalAction::Reject => {
                request.response_notes = notes.map(str::to_string);
                request.resolved_at = Some(TimeStamp::new());
            }
        }

        self.store.replace(&prev, &request)?;
        info!(
            "request {}: {:?} by {} -> {:?}",
            request.request_id, action, actor_id, request.state
        );
        Ok(request)
    }

    fn execute_plan(&self, plan: Vec<LedgerOp>) -> SyncReport {
        let mut report = SyncReport {
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        for op in plan {
            match ledger::apply(&self.ledger, &op) {
                Ok(()) => report.succeeded.push(op),
                Err(err) => {
                    warn!("ledger operation failed on {}: {err}", op.day());
                    report.failed.push(FailedOp {
                        op,
                        reason: err.to_string(),
                    });
                }
            }
        }
        report
    }
}
