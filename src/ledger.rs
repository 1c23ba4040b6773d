//! Adapter over the external payroll ledger's day-level primitives

use std::collections::HashSet;
use std::sync::Mutex;

use crate::calendar::Day;
use crate::error::LedgerError;
use crate::planner::LedgerOp;

/// The four primitives the payroll ledger exposes. Each is one best-effort
/// network call with no batch or transaction semantics; retry policy, if any,
/// belongs to the caller.
pub trait LedgerClient {
    fn insert_absence(
        &self,
        employee: &str,
        day: Day,
        code: &str,
        hours: Option<f64>,
    ) -> Result<(), LedgerError>;
    fn delete_absence(&self, employee: &str, day: Day, code: &str) -> Result<(), LedgerError>;
    fn insert_vacation(&self, employee: &str, day: Day, hours: Option<f64>)
    -> Result<(), LedgerError>;
    fn delete_vacation(&self, employee: &str, day: Day) -> Result<(), LedgerError>;
}

// lets callers hold a handle to a shared client while the service owns one
impl<L: LedgerClient + ?Sized> LedgerClient for std::sync::Arc<L> {
    fn insert_absence(
        &self,
        employee: &str,
        day: Day,
        code: &str,
        hours: Option<f64>,
    ) -> Result<(), LedgerError> {
        (**self).insert_absence(employee, day, code, hours)
    }
    fn delete_absence(&self, employee: &str, day: Day, code: &str) -> Result<(), LedgerError> {
        (**self).delete_absence(employee, day, code)
    }
    fn insert_vacation(
        &self,
        employee: &str,
        day: Day,
        hours: Option<f64>,
    ) -> Result<(), LedgerError> {
        (**self).insert_vacation(employee, day, hours)
    }
    fn delete_vacation(&self, employee: &str, day: Day) -> Result<(), LedgerError> {
        (**self).delete_vacation(employee, day)
    }
}

/// Route one planned operation to the matching primitive. Deleting an entry
/// the ledger does not hold counts as success; cancellation plans probe every
/// candidate code and must stay idempotent.
pub fn apply<L: LedgerClient>(client: &L, op: &LedgerOp) -> Result<(), LedgerError> {
    let outcome = match op {
        LedgerOp::InsertAbsence {
            employee,
            day,
            code,
            hours,
        } => client.insert_absence(employee, *day, code, *hours),
        LedgerOp::DeleteAbsence {
            employee,
            day,
            code,
        } => client.delete_absence(employee, *day, code),
        LedgerOp::InsertVacation {
            employee,
            day,
            hours,
        } => client.insert_vacation(employee, *day, *hours),
        LedgerOp::DeleteVacation { employee, day } => client.delete_vacation(employee, *day),
    };

    match outcome {
        Err(LedgerError::NotFound) if op.is_delete() => Ok(()),
        other => other,
    }
}

/// Reference ledger keeping entries in process memory. Stands in for the
/// remote system in tests and demos; transient outages can be injected per
/// day to exercise partial-failure reporting.
#[derive(Default)]
pub struct InMemoryLedger {
    inner: Mutex<Entries>,
}

#[derive(Default)]
struct Entries {
    absences: HashSet<(String, Day, String)>,
    vacations: HashSet<(String, Day)>,
    failing_days: HashSet<Day>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call touching `day` fails with a transient error until
    /// `restore_day` is called.
    pub fn fail_day(&self, day: Day) {
        self.lock().failing_days.insert(day);
    }
    pub fn restore_day(&self, day: Day) {
        self.lock().failing_days.remove(&day);
    }

    pub fn has_absence(&self, employee: &str, day: Day, code: &str) -> bool {
        self.lock()
            .absences
            .contains(&(employee.to_string(), day, code.to_string()))
    }
    pub fn has_vacation(&self, employee: &str, day: Day) -> bool {
        self.lock().vacations.contains(&(employee.to_string(), day))
    }
    pub fn entry_count(&self) -> usize {
        let entries = self.lock();
        entries.absences.len() + entries.vacations.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.inner.lock().expect("ledger mutex poisoned")
    }

    fn check_outage(entries: &Entries, day: Day) -> Result<(), LedgerError> {
        if entries.failing_days.contains(&day) {
            return Err(LedgerError::Transient("injected outage".into()));
        }
        Ok(())
    }
}

impl LedgerClient for InMemoryLedger {
    fn insert_absence(
        &self,
        employee: &str,
        day: Day,
        code: &str,
        _hours: Option<f64>,
    ) -> Result<(), LedgerError> {
        let mut entries = self.lock();
        Self::check_outage(&entries, day)?;
        // the real ledger's behavior on duplicate inserts is undefined; the
        // reference implementation rejects them outright
        if !entries
            .absences
            .insert((employee.to_string(), day, code.to_string()))
        {
            return Err(LedgerError::Rejected(format!(
                "absence {code} already present on {day}"
            )));
        }
        Ok(())
    }

    fn delete_absence(&self, employee: &str, day: Day, code: &str) -> Result<(), LedgerError> {
        let mut entries = self.lock();
        Self::check_outage(&entries, day)?;
        if !entries
            .absences
            .remove(&(employee.to_string(), day, code.to_string()))
        {
            return Err(LedgerError::NotFound);
        }
        Ok(())
    }

    fn insert_vacation(
        &self,
        employee: &str,
        day: Day,
        _hours: Option<f64>,
    ) -> Result<(), LedgerError> {
        let mut entries = self.lock();
        Self::check_outage(&entries, day)?;
        if !entries.vacations.insert((employee.to_string(), day)) {
            return Err(LedgerError::Rejected(format!(
                "vacation already present on {day}"
            )));
        }
        Ok(())
    }

    fn delete_vacation(&self, employee: &str, day: Day) -> Result<(), LedgerError> {
        let mut entries = self.lock();
        Self::check_outage(&entries, day)?;
        if !entries.vacations.remove(&(employee.to_string(), day)) {
            return Err(LedgerError::NotFound);
        }
        Ok(())
    }
}
