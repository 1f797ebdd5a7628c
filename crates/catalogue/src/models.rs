use crate::error::{Error, ErrorKind};
use derive_more::Display;
use exn::ResultExt;
use folio_epub::models::{BookMetadata, split_genres};
use std::path::PathBuf;
use std::str::FromStr;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, UtcDateTime};

/// Storage format of [`Book::reading_date`].
pub(crate) const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Where the reader is with a book.
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq)]
pub enum ReadingStatus {
    #[default]
    Unread,
    Reading,
    /// Finished; setting this stamps the reading date.
    Read,
}
impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "Unread",
            Self::Reading => "Reading",
            Self::Read => "Read",
        }
    }
}
impl FromStr for ReadingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unread" | "" => Ok(Self::Unread),
            "reading" => Ok(Self::Reading),
            "read" => Ok(Self::Read),
            _ => exn::bail!(ErrorKind::InvalidData("status")),
        }
    }
}

/// A catalogued book.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    /// Archive file name; the catalogue key.
    pub file_name: String,
    pub metadata: BookMetadata,
    /// Local cover image, when one had been resolved at import time (or since).
    pub cover_path: Option<PathBuf>,
    pub rating: Option<f64>,
    pub status: ReadingStatus,
    pub reading_date: Option<Date>,
    pub imported_at: UtcDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) file_name: String,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) description: String,
    pub(crate) genres: String,
    pub(crate) language: String,
    pub(crate) cover_path: String,
    pub(crate) rating: Option<f64>,
    pub(crate) status: String,
    pub(crate) reading_date: String,
    pub(crate) imported_at: i64,
}
impl TryFrom<BookRow> for Book {
    type Error = Error;
    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(Self {
            file_name: row.file_name,
            metadata: BookMetadata {
                title: row.title,
                author: row.author,
                description: row.description,
                genres: split_genres(&row.genres),
                language: row.language,
            },
            cover_path: (!row.cover_path.is_empty()).then(|| PathBuf::from(row.cover_path)),
            rating: row.rating,
            status: row.status.parse()?,
            reading_date: parse_date(&row.reading_date)?,
            imported_at: UtcDateTime::from_unix_timestamp(row.imported_at)
                .or_raise(|| ErrorKind::InvalidData("import date"))?,
        })
    }
}

pub(crate) fn parse_date(value: &str) -> Result<Option<Date>, Error> {
    if value.is_empty() {
        return Ok(None);
    }
    Ok(Some(Date::parse(value, DATE_FORMAT).or_raise(|| ErrorKind::InvalidData("reading date"))?))
}

pub(crate) fn format_date(date: Option<Date>) -> Result<String, Error> {
    match date {
        Some(date) => date.format(DATE_FORMAT).or_raise(|| ErrorKind::InvalidData("reading date")),
        None => Ok(String::new()),
    }
}
