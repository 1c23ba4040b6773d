//! Calendar days and inclusive date-range expansion

use chrono::{Datelike, NaiveDate};

/// A calendar date with no time component. The ledger operates at day
/// granularity, so every operation in this crate is keyed by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(NaiveDate);

impl Day {
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Day)
    }
    pub fn new_with(year: i32, month: u32, day: u32) -> Self {
        Day(NaiveDate::from_ymd_opt(year, month, day).expect("invalid calendar date"))
    }
    pub fn to_naive_date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for Day {
    fn from(value: NaiveDate) -> Self {
        Day(value)
    }
}

impl std::fmt::Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Every day from `start` to `end` inclusive, ascending. An inverted range
/// yields nothing; callers reject those before a request is ever stored.
pub fn expand_range(start: Day, end: Day) -> Vec<Day> {
    if end.0 < start.0 {
        return Vec::new();
    }
    start.0.iter_days().take_while(|d| *d <= end.0).map(Day).collect()
}

// Encoded as the signed day count from the common era, same width everywhere.
impl<C> minicbor::Encode<C> for Day {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.i32(self.0.num_days_from_ce())?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Day {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let days = d.i32()?;

        NaiveDate::from_num_days_from_ce_opt(days)
            .map(Day)
            .ok_or(minicbor::decode::Error::message(
                "day count does not map to a calendar date",
            ))
    }
}
