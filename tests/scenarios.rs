use std::sync::Arc;

use anyhow::Context;
use sled::open;
use tempfile::tempdir; // Use for test db cleanup.

use leave_approval::calendar::Day;
use leave_approval::error::ApprovalError;
use leave_approval::ledger::{InMemoryLedger, LedgerClient};
use leave_approval::planner::{MEAL_SUBSIDY_CODE, VACATION_CONSUMPTION_CODE};
use leave_approval::request::{Operation, RequestDraft};
use leave_approval::service::ApprovalService;
use leave_approval::state::ApprovalState;
use leave_approval::utils;

// Sled uses file-based locking to prevent concurrent access, so each test
// gets its own database on temp for simplified cleanup.
fn new_service(name: &str) -> anyhow::Result<(ApprovalService<InMemoryLedger>, tempfile::TempDir)>
{
    let temp_dir = tempdir()?;
    let db = open(temp_dir.path().join(name))?;
    let service = ApprovalService::new(Arc::new(db), InMemoryLedger::new());
    Ok((service, temp_dir))
}

#[test]
fn hourly_absence_full_approval_chain() -> anyhow::Result<()> {
    let (service, _guard) = new_service("test_hourly_absence.db")?;

    let supervisor = utils::actor_id()?;
    let manager = utils::actor_id()?;
    let hr = utils::actor_id()?;

    let day = Day::new_with(2024, 3, 5);
    let draft = RequestDraft::new()
        .employee_ref("EMP-7")
        .operation(Operation::Create)
        .absence(day, "F10")
        .hourly(4.0)
        .justification("medical appointment");

    let request = service
        .submit_request(draft, "EMP-7")
        .context("Request failed on submit: ")?;
    assert_eq!(request.state, ApprovalState::Pending);

    let request = service
        .confirm_level1(&request.request_id, &supervisor)
        .context("Request failed on level-1 confirmation: ")?;
    assert_eq!(request.state, ApprovalState::ConfirmedLevel1);
    assert_eq!(request.confirmed_by_level1.as_deref(), Some(supervisor.as_str()));

    let request = service
        .confirm_level2(&request.request_id, &manager)
        .context("Request failed on level-2 confirmation: ")?;
    assert_eq!(request.state, ApprovalState::ConfirmedLevel2);

    let (request, report) = service
        .approve(&request.request_id, &hr, Some("ok"))
        .context("Request failed on approval: ")?;
    assert_eq!(request.state, ApprovalState::Approved);
    assert_eq!(request.approved_by.as_deref(), Some(hr.as_str()));
    assert!(request.resolved_at.is_some());

    // hourly absence: exactly one insert, no meal-subsidy companion
    assert!(report.is_complete());
    assert_eq!(report.succeeded.len(), 1);

    Ok(())
}

#[test]
fn vacation_create_populates_ledger_with_companions() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let db = open(temp_dir.path().join("test_vacation_create.db"))?;
    let ledger = Arc::new(InMemoryLedger::new());
    let service = ApprovalService::new(Arc::new(db), Arc::clone(&ledger));

    let draft = RequestDraft::new()
        .employee_ref("EMP-7")
        .operation(Operation::Create)
        .vacation(Day::new_with(2024, 6, 1), Day::new_with(2024, 6, 5))
        .full_day(5.0);

    let request = service.submit_request(draft, "EMP-7")?;
    service.confirm_level1(&request.request_id, "sup")?;
    service.confirm_level2(&request.request_id, "mgr")?;
    let (_, report) = service.approve(&request.request_id, "hr", None)?;

    assert!(report.is_complete());
    assert_eq!(report.succeeded.len(), 15);
    assert_eq!(ledger.entry_count(), 15); // 5 vacation days + 10 companions

    Ok(())
}

#[test]
fn vacation_cancel_with_partial_ledger_failure() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let db = open(temp_dir.path().join("test_vacation_cancel.db"))?;
    let ledger = Arc::new(InMemoryLedger::new());
    let employee = "EMP-7";
    let start = Day::new_with(2024, 6, 1);
    let middle = Day::new_with(2024, 6, 2);
    let end = Day::new_with(2024, 6, 3);

    // seed the ledger with the entries an earlier approval would have written
    for day in [start, middle, end] {
        ledger.insert_vacation(employee, day, None).unwrap();
        ledger
            .insert_absence(employee, day, VACATION_CONSUMPTION_CODE, None)
            .unwrap();
        ledger
            .insert_absence(employee, day, MEAL_SUBSIDY_CODE, None)
            .unwrap();
    }
    ledger.fail_day(middle);

    let service = ApprovalService::new(Arc::new(db), Arc::clone(&ledger));

    let draft = RequestDraft::new()
        .employee_ref(employee)
        .operation(Operation::Cancel)
        .vacation(start, end)
        .full_day(3.0);

    let request = service.submit_request(draft, employee)?;
    service.confirm_level1(&request.request_id, "sup")?;
    service.confirm_level2(&request.request_id, "mgr")?;

    let (request, report) = service.approve(&request.request_id, "hr", None)?;

    // approval sticks even though the middle day's deletes failed
    assert_eq!(request.state, ApprovalState::Approved);
    assert_eq!(report.succeeded.len(), 6);
    assert_eq!(report.failed.len(), 3);
    assert!(report.failed.iter().all(|f| f.op.day() == middle));
    assert!(report.failed.iter().all(|f| f.reason.contains("transient")));

    // days 1 and 3 are fully cleared, day 2 still holds its entries
    assert!(!ledger.has_vacation(employee, start));
    assert!(!ledger.has_vacation(employee, end));
    assert!(ledger.has_vacation(employee, middle));
    assert!(ledger.has_absence(employee, middle, VACATION_CONSUMPTION_CODE));

    Ok(())
}

#[test]
fn reject_at_level_two_is_terminal() -> anyhow::Result<()> {
    let (service, _guard) = new_service("test_reject.db")?;

    let draft = RequestDraft::new()
        .employee_ref("EMP-7")
        .operation(Operation::Create)
        .vacation(Day::new_with(2024, 8, 1), Day::new_with(2024, 8, 10))
        .full_day(10.0);

    let request = service.submit_request(draft, "EMP-7")?;
    service.confirm_level1(&request.request_id, "sup")?;

    let request = service.reject(&request.request_id, "mgr", Some("coverage gap"))?;
    assert_eq!(request.state, ApprovalState::Rejected);
    assert_eq!(request.response_notes.as_deref(), Some("coverage gap"));

    // nothing moves a rejected request
    let err = service
        .confirm_level2(&request.request_id, "mgr")
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApprovalError>(),
        Some(ApprovalError::InvalidTransition { .. })
    ));

    Ok(())
}

#[test]
fn approve_straight_from_pending_fails() -> anyhow::Result<()> {
    let (service, _guard) = new_service("test_premature_approve.db")?;

    let draft = RequestDraft::new()
        .employee_ref("EMP-7")
        .operation(Operation::Create)
        .absence(Day::new_with(2024, 3, 5), "F03")
        .full_day(1.0);

    let request = service.submit_request(draft, "EMP-7")?;
    let err = service.approve(&request.request_id, "hr", None).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ApprovalError>(),
        Some(ApprovalError::InvalidTransition { .. })
    ));
    // still pending, nothing was written
    let request = service.get_request(&request.request_id)?;
    assert_eq!(request.state, ApprovalState::Pending);

    Ok(())
}

#[test]
fn unknown_request_id_is_not_found() -> anyhow::Result<()> {
    let (service, _guard) = new_service("test_not_found.db")?;

    let err = service.confirm_level1("req1doesnotexist", "sup").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApprovalError>(),
        Some(ApprovalError::NotFound(_))
    ));

    Ok(())
}

#[test]
fn vacation_edit_moves_the_booked_range() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let db = open(temp_dir.path().join("test_vacation_edit.db"))?;
    let ledger = Arc::new(InMemoryLedger::new());
    let employee = "EMP-7";

    // prior approved range: June 1-3
    for day in [
        Day::new_with(2024, 6, 1),
        Day::new_with(2024, 6, 2),
        Day::new_with(2024, 6, 3),
    ] {
        ledger.insert_vacation(employee, day, None).unwrap();
        ledger
            .insert_absence(employee, day, VACATION_CONSUMPTION_CODE, None)
            .unwrap();
        ledger
            .insert_absence(employee, day, MEAL_SUBSIDY_CODE, None)
            .unwrap();
    }

    let service = ApprovalService::new(Arc::new(db), Arc::clone(&ledger));

    // shift to June 2-4: overlapping ranges get delete-then-insert, not a diff
    let draft = RequestDraft::new()
        .employee_ref(employee)
        .operation(Operation::Edit)
        .vacation(Day::new_with(2024, 6, 2), Day::new_with(2024, 6, 4))
        .prior_vacation(Day::new_with(2024, 6, 1), Day::new_with(2024, 6, 3))
        .full_day(3.0);

    let request = service.submit_request(draft, employee)?;
    service.confirm_level1(&request.request_id, "sup")?;
    service.confirm_level2(&request.request_id, "mgr")?;
    let (_, report) = service.approve(&request.request_id, "hr", None)?;

    assert!(report.is_complete());
    assert!(!ledger.has_vacation(employee, Day::new_with(2024, 6, 1)));
    for day in [
        Day::new_with(2024, 6, 2),
        Day::new_with(2024, 6, 3),
        Day::new_with(2024, 6, 4),
    ] {
        assert!(ledger.has_vacation(employee, day));
        assert!(ledger.has_absence(employee, day, VACATION_CONSUMPTION_CODE));
        assert!(ledger.has_absence(employee, day, MEAL_SUBSIDY_CODE));
    }

    Ok(())
}
