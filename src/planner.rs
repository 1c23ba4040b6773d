//! Translates a request into the ordered day-level ledger operations that
//! realize its intent

use crate::calendar::{Day, expand_range};
use crate::request::{Operation, Request, RequestDetail};

/// Absence code recording vacation consumption alongside each vacation day,
/// so payroll totals reconcile.
pub const VACATION_CONSUMPTION_CODE: &str = "F40";
/// Absence code withholding the meal subsidy. Inserted as a companion to any
/// full-day absence and to every vacation day.
pub const MEAL_SUBSIDY_CODE: &str = "F60";

/// One instruction against the ledger. Ephemeral: plans are computed from the
/// request at approval time and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerOp {
    InsertAbsence {
        employee: String,
        day: Day,
        code: String,
        hours: Option<f64>,
    },
    DeleteAbsence {
        employee: String,
        day: Day,
        code: String,
    },
    InsertVacation {
        employee: String,
        day: Day,
        hours: Option<f64>,
    },
    DeleteVacation {
        employee: String,
        day: Day,
    },
}

impl LedgerOp {
    pub fn day(&self) -> Day {
        match self {
            LedgerOp::InsertAbsence { day, .. }
            | LedgerOp::DeleteAbsence { day, .. }
            | LedgerOp::InsertVacation { day, .. }
            | LedgerOp::DeleteVacation { day, .. } => *day,
        }
    }
    pub fn is_delete(&self) -> bool {
        matches!(
            self,
            LedgerOp::DeleteAbsence { .. } | LedgerOp::DeleteVacation { .. }
        )
    }
}

/// Compute the ordered operation list for a request. Pure; all I/O is the
/// orchestrator's job, so plans are checkable without any network in sight.
///
/// Edit plans put the full cancellation of the prior day/range before any
/// insert for the new one. The two may overlap and the ledger's behavior on
/// duplicate inserts is undefined; delete-then-insert sidesteps that.
/// Overlapping days are not diffed away: a cancel-then-recreate of the same
/// day is redundant but correct under arbitrary range shifts.
pub fn plan(request: &Request) -> Vec<LedgerOp> {
    match &request.detail {
        RequestDetail::Absence {
            day,
            absence_code,
            prior,
        } => match request.operation {
            Operation::Create => absence_create(request, *day, absence_code),
            Operation::Cancel => absence_cancel(&request.employee_ref, *day, absence_code),
            Operation::Edit => {
                // prior is guaranteed by submission validation; without one
                // the edit degrades to a plain create
                let mut ops = match prior {
                    Some(p) => absence_cancel(&request.employee_ref, p.day, &p.absence_code),
                    None => Vec::new(),
                };
                ops.extend(absence_create(request, *day, absence_code));
                ops
            }
        },
        RequestDetail::Vacation { start, end, prior } => match request.operation {
            Operation::Create => vacation_create(request, *start, *end),
            Operation::Cancel => vacation_cancel(&request.employee_ref, *start, *end),
            Operation::Edit => {
                let mut ops = match prior {
                    Some(p) => vacation_cancel(&request.employee_ref, p.start, p.end),
                    None => Vec::new(),
                };
                ops.extend(vacation_create(request, *start, *end));
                ops
            }
        },
    }
}

fn absence_create(request: &Request, day: Day, code: &str) -> Vec<LedgerOp> {
    let employee = request.employee_ref.clone();
    let hours = request.is_hourly.then_some(request.duration);

    let mut ops = vec![LedgerOp::InsertAbsence {
        employee: employee.clone(),
        day,
        code: code.to_string(),
        hours,
    }];
    // a full-day absence also withholds the meal subsidy
    if !request.is_hourly {
        ops.push(LedgerOp::InsertAbsence {
            employee,
            day,
            code: MEAL_SUBSIDY_CODE.to_string(),
            hours: None,
        });
    }
    ops
}

// The ledger does not expose which codes are present for a day, so deletion
// is attempted for every code this system could have written there. A
// missing entry deletes as a success (see `ledger::apply`).
fn absence_cancel(employee: &str, day: Day, code: &str) -> Vec<LedgerOp> {
    let mut ops = vec![LedgerOp::DeleteAbsence {
        employee: employee.to_string(),
        day,
        code: code.to_string(),
    }];
    if code != MEAL_SUBSIDY_CODE {
        ops.push(LedgerOp::DeleteAbsence {
            employee: employee.to_string(),
            day,
            code: MEAL_SUBSIDY_CODE.to_string(),
        });
    }
    ops
}

fn vacation_create(request: &Request, start: Day, end: Day) -> Vec<LedgerOp> {
    let employee = &request.employee_ref;
    let hours = request.is_hourly.then_some(request.duration);

    let mut ops = Vec::new();
    for day in expand_range(start, end) {
        ops.push(LedgerOp::InsertVacation {
            employee: employee.clone(),
            day,
            hours,
        });
        // vacation consumption is recorded in the absence ledger too; hourly
        // vacations skip the consumption code and only withhold the subsidy
        if !request.is_hourly {
            ops.push(LedgerOp::InsertAbsence {
                employee: employee.clone(),
                day,
                code: VACATION_CONSUMPTION_CODE.to_string(),
                hours: None,
            });
        }
        ops.push(LedgerOp::InsertAbsence {
            employee: employee.clone(),
            day,
            code: MEAL_SUBSIDY_CODE.to_string(),
            hours: None,
        });
    }
    ops
}

fn vacation_cancel(employee: &str, start: Day, end: Day) -> Vec<LedgerOp> {
    let mut ops = Vec::new();
    for day in expand_range(start, end) {
        ops.push(LedgerOp::DeleteVacation {
            employee: employee.to_string(),
            day,
        });
        for code in [VACATION_CONSUMPTION_CODE, MEAL_SUBSIDY_CODE] {
            ops.push(LedgerOp::DeleteAbsence {
                employee: employee.to_string(),
                day,
                code: code.to_string(),
            });
        }
    }
    ops
}
