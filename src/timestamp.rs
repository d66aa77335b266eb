//! UTC timestamps for records in the database.
//!
//! [Timestamp] is stored as a fixed width UTC string so that string order
//! matches chronological order. The ledger relies on this to order and filter
//! transactions by date in SQL.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::{
    Date, OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

/// Storage format, e.g. "2025-01-31T23:59:59.000001Z".
const STORAGE_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
);

/// Date format used in query strings and date bounds, e.g. "2025-01-31".
pub const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// A point in time in UTC with microsecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    /// The current time, truncated to microseconds.
    pub fn now() -> Self {
        Self::from(OffsetDateTime::now_utc())
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(value: OffsetDateTime) -> Self {
        let value = value.to_offset(UtcOffset::UTC);
        let truncated = value
            .replace_nanosecond(value.nanosecond() / 1_000 * 1_000)
            .unwrap_or(value);

        Self(truncated)
    }
}

/// Format `date` the same way timestamps begin in the database.
///
/// Every stored timestamp on `date` compares greater than or equal to the
/// returned string and less than the string for the following day.
pub fn format_date_bound(date: Date) -> String {
    // The date format contains only numeric components, so formatting cannot fail.
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let text = self
            .0
            .format(STORAGE_FORMAT)
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))?;

        Ok(ToSqlOutput::from(text))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        time::PrimitiveDateTime::parse(text, STORAGE_FORMAT)
            .map(|date_time| Self(date_time.assume_utc()))
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}
