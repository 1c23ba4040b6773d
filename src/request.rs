//! The request entity, its payload shapes, and the draft builder

use chrono::{DateTime, TimeZone, Utc};

use crate::calendar::Day;
use crate::error::ApprovalError;
use crate::state::ApprovalState;
use crate::utils;

/// The mutation intent against the ledger, independent of approval state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum Operation {
    #[n(0)]
    Create,
    #[n(1)]
    Cancel,
    #[n(2)]
    Edit,
}

/// The absence entry an edit supersedes.
#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub struct PriorAbsence {
    #[n(0)]
    pub day: Day,
    #[n(1)]
    pub absence_code: String,
}

/// The vacation range an edit supersedes.
#[derive(Debug, Clone, Copy, PartialEq, minicbor::Encode, minicbor::Decode)]
pub struct PriorRange {
    #[n(0)]
    pub start: Day,
    #[n(1)]
    pub end: Day,
}

/// Payload shape discriminated by request kind, so downstream planning can
/// pattern-match exhaustively instead of probing optional fields.
#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub enum RequestDetail {
    #[n(0)]
    Absence {
        #[n(0)]
        day: Day,
        #[n(1)]
        absence_code: String,
        #[n(2)]
        prior: Option<PriorAbsence>,
    },
    #[n(1)]
    Vacation {
        #[n(0)]
        start: Day,
        #[n(1)]
        end: Day,
        #[n(2)]
        prior: Option<PriorRange>,
    },
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// A persisted absence or vacation request. Only the orchestrator mutates
/// one, and never after it reaches a terminal state; the record is the audit
/// trail of who authorized what.
#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub struct Request {
    #[n(0)]
    pub request_id: String,
    /// External payroll code identifying the employee. The payroll system is
    /// the source of truth for identity, so this is a string, not a local key.
    #[n(1)]
    pub employee_ref: String,
    #[n(2)]
    pub operation: Operation,
    #[n(3)]
    pub detail: RequestDetail,
    #[n(4)]
    pub is_hourly: bool,
    /// Hours when `is_hourly`, whole days otherwise.
    #[n(5)]
    pub duration: f64,
    #[n(6)]
    pub justification: Option<String>,
    #[n(7)]
    pub state: ApprovalState,
    #[n(8)]
    pub confirmed_by_level1: Option<String>,
    #[n(9)]
    pub confirmed_by_level2: Option<String>,
    #[n(10)]
    pub approved_by: Option<String>,
    #[n(11)]
    pub response_notes: Option<String>,
    #[n(12)]
    pub resolved_at: Option<TimeStamp<Utc>>,
    #[n(13)]
    pub created_by: String,
    #[n(14)]
    pub created_at: TimeStamp<Utc>,
}

/// Used for constructing drafts. `validate_and_finalise` is the single gate
/// between loosely assembled input and a well-formed `Pending` request.
#[derive(Debug, Default)]
pub struct RequestDraft {
    employee_ref: Option<String>,
    operation: Option<Operation>,
    absence: Option<(Day, String)>,
    vacation: Option<(Day, Day)>,
    prior_absence: Option<PriorAbsence>,
    prior_vacation: Option<PriorRange>,
    is_hourly: bool,
    duration: f64,
    justification: Option<String>,
}

impl RequestDraft {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn employee_ref(mut self, code: &str) -> Self {
        self.employee_ref = Some(code.to_string());
        self
    }
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }
    pub fn absence(mut self, day: Day, absence_code: &str) -> Self {
        self.absence = Some((day, absence_code.to_string()));
        self
    }
    pub fn vacation(mut self, start: Day, end: Day) -> Self {
        self.vacation = Some((start, end));
        self
    }
    pub fn prior_absence(mut self, day: Day, absence_code: &str) -> Self {
        self.prior_absence = Some(PriorAbsence {
            day,
            absence_code: absence_code.to_string(),
        });
        self
    }
    pub fn prior_vacation(mut self, start: Day, end: Day) -> Self {
        self.prior_vacation = Some(PriorRange { start, end });
        self
    }
    /// Duration measured in hours; the ledger entry carries the hour count.
    pub fn hourly(mut self, hours: f64) -> Self {
        self.is_hourly = true;
        self.duration = hours;
        self
    }
    /// Duration measured in whole days.
    pub fn full_day(mut self, days: f64) -> Self {
        self.is_hourly = false;
        self.duration = days;
        self
    }
    pub fn justification(mut self, text: &str) -> Self {
        self.justification = Some(text.to_string());
        self
    }

    /// Checks fields, performs range validation, and mints the request id.
    /// The submission surface validates too; this re-validates so nothing
    /// malformed can reach the store regardless of the caller.
    pub fn validate_and_finalise(self, created_by: &str) -> anyhow::Result<Request> {
        let Some(employee_ref) = self.employee_ref else {
            return Err(anyhow::Error::msg("Employee reference is not set"));
        };
        let Some(operation) = self.operation else {
            return Err(anyhow::Error::msg("Operation is not set"));
        };
        if self.duration <= 0.0 {
            return Err(anyhow::Error::msg("Duration is not set"));
        }

        let detail = match (self.absence, self.vacation) {
            (Some((day, absence_code)), None) => {
                if operation == Operation::Edit && self.prior_absence.is_none() {
                    return Err(ApprovalError::MissingPrior.into());
                }
                RequestDetail::Absence {
                    day,
                    absence_code,
                    prior: self.prior_absence,
                }
            }
            (None, Some((start, end))) => {
                if end < start {
                    return Err(ApprovalError::InvalidRange { start, end }.into());
                }
                if operation == Operation::Edit {
                    match self.prior_vacation {
                        Some(prior) if prior.end < prior.start => {
                            return Err(ApprovalError::InvalidRange {
                                start: prior.start,
                                end: prior.end,
                            }
                            .into());
                        }
                        Some(_) => {}
                        None => return Err(ApprovalError::MissingPrior.into()),
                    }
                }
                RequestDetail::Vacation {
                    start,
                    end,
                    prior: self.prior_vacation,
                }
            }
            (None, None) => {
                return Err(anyhow::Error::msg("Neither absence nor vacation detail is set"));
            }
            (Some(_), Some(_)) => {
                return Err(anyhow::Error::msg(
                    "Both absence and vacation detail are set",
                ));
            }
        };

        Ok(Request {
            request_id: utils::request_id()?,
            employee_ref,
            operation,
            detail,
            is_hourly: self.is_hourly,
            duration: self.duration,
            justification: self.justification,
            state: ApprovalState::Pending,
            confirmed_by_level1: None,
            confirmed_by_level2: None,
            approved_by: None,
            response_notes: None,
            resolved_at: None,
            created_by: created_by.to_string(),
            created_at: TimeStamp::new(),
        })
    }
}
