//! End-to-end walkthrough: submit a vacation request, confirm it twice,
//! approve it, and print the ledger synchronization report.

use std::sync::Arc;

use leave_approval::calendar::Day;
use leave_approval::ledger::InMemoryLedger;
use leave_approval::request::{Operation, RequestDraft};
use leave_approval::service::ApprovalService;
use leave_approval::utils;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let temp_dir = tempfile::tempdir()?;
    let db = Arc::new(sled::open(temp_dir.path().join("demo.db"))?);
    let service = ApprovalService::new(db, InMemoryLedger::new());

    let employee = utils::actor_id()?;
    let supervisor = utils::actor_id()?;
    let manager = utils::actor_id()?;
    let hr = utils::actor_id()?;

    let draft = RequestDraft::new()
        .employee_ref("EMP-0042")
        .operation(Operation::Create)
        .vacation(Day::new_with(2024, 6, 1), Day::new_with(2024, 6, 5))
        .full_day(5.0)
        .justification("summer leave");

    let request = service.submit_request(draft, &employee)?;
    println!("submitted {} ({:?})", request.request_id, request.state);

    let request = service.confirm_level1(&request.request_id, &supervisor)?;
    println!("after level 1: {:?}", request.state);

    let request = service.confirm_level2(&request.request_id, &manager)?;
    println!("after level 2: {:?}", request.state);

    let (request, report) = service.approve(&request.request_id, &hr, Some("enjoy"))?;
    println!(
        "after approval: {:?}, {} ledger writes succeeded, {} failed",
        request.state,
        report.succeeded.len(),
        report.failed.len()
    );

    Ok(())
}
