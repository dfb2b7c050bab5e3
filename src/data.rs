use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::errors::*;

/// Earliest publication year accepted for a new entry.
pub const MIN_YEAR: i32 = 1800;

/// One book in the catalog, exactly as it is stored on disk.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    pub author: String,
    pub year: i32,
    pub genre: String,
    pub read: bool,
    /// `YYYY-MM-DD`, empty for records written without one.
    #[serde(default)]
    pub added_date: String,
}

/// The fields a user supplies when adding a book.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Draft {
    pub title: String,
    pub author: String,
    pub year: i32,
    pub genre: String,
    pub read: bool,
}

impl Entry {
    /// Validate `draft` and stamp it with `today`.
    pub fn from_draft(draft: Draft, today: Date) -> Result<Entry> {
        let title = required("title", draft.title)?;
        let author = required("author", draft.author)?;
        let genre = required("genre", draft.genre)?;

        let max = today.year();
        if draft.year < MIN_YEAR || draft.year > max {
            return Err(ErrorKind::YearOutOfRange(draft.year, max).into());
        }

        Ok(Entry {
            title,
            author,
            year: draft.year,
            genre,
            read: draft.read,
            added_date: format_date(today)?,
        })
    }

    pub fn added_display(&self) -> &str {
        if self.added_date.is_empty() {
            "N/A"
        } else {
            &self.added_date
        }
    }
}

/// Blank text is rejected; anything else is kept exactly as typed.
fn required(field: &'static str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(ErrorKind::MissingField(field).into());
    }

    Ok(value)
}

/// Parse a year typed by the user.
pub fn parse_year(term: &str) -> Result<i32> {
    term.trim()
        .parse()
        .map_err(|_| ErrorKind::BadYear(term.to_string()).into())
}

pub fn format_date(date: Date) -> Result<String> {
    Ok(date.format(format_description!("[year]-[month]-[day]"))?)
}

/// The local calendar date, or UTC when the local offset is unknown.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}
