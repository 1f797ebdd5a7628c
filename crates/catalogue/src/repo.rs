//! Book repository.
//!
//! Every operation is keyed by the archive's file name, which is unique
//! across the whole library.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{Book, BookRow, ReadingStatus, format_date};
use exn::{OptionExt, ResultExt};
use folio_epub::models::{Package, join_genres};
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteQueryResult;
use std::path::{Path, PathBuf};
use time::{Date, UtcDateTime};
use tracing::instrument;

const MAX_RATING: f64 = 5.0;

/// Repository for the `books` table.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn sqlx_hates_paths(path: impl AsRef<Path>) -> Result<String> {
        Ok(path.as_ref().to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))?.to_string())
    }

    fn expect_one(result: SqliteQueryResult, file_name: &str) -> Result<()> {
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound(file_name.to_string()));
        }
        Ok(())
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Catalogue an extracted package, keyed by its `book_file`.
    ///
    /// Returns [`ErrorKind::AlreadyExists`] if a book with the same file name
    /// is already catalogued; the existing row is left untouched.
    #[instrument(skip_all, fields(book = %package.book_file))]
    pub async fn insert(&self, package: &Package, cover_path: Option<&Path>) -> Result<Book> {
        let cover_path = cover_path.map(Self::sqlx_hates_paths).transpose()?.unwrap_or_default();
        let metadata = &package.metadata;
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/insert_book.sql"))
            .bind(&package.book_file)
            .bind(&metadata.title)
            .bind(&metadata.author)
            .bind(&metadata.description)
            .bind(join_genres(&metadata.genres))
            .bind(&metadata.language)
            .bind(cover_path)
            .bind(UtcDateTime::now().unix_timestamp())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let row = row.ok_or_raise(|| ErrorKind::AlreadyExists(package.book_file.clone()))?;
        Book::try_from(row)
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    pub async fn get(&self, file_name: &str) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/get_book.sql"))
            .bind(file_name)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Book::try_from).transpose()
    }

    /// Whether a book with this file name is catalogued.
    pub async fn exists(&self, file_name: &str) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar(include_str!("../queries/book_exists.sql"))
            .bind(file_name)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(exists != 0)
    }

    /// The stored cover path of a book; `None` if it has none (yet).
    ///
    /// Returns [`ErrorKind::NotFound`] for a file name that isn't catalogued.
    pub async fn cover_path(&self, file_name: &str) -> Result<Option<PathBuf>> {
        let path: Option<String> = sqlx::query_scalar(include_str!("../queries/get_cover_path.sql"))
            .bind(file_name)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let path = path.ok_or_raise(|| ErrorKind::NotFound(file_name.to_string()))?;
        Ok((!path.is_empty()).then(|| PathBuf::from(path)))
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// File names of every catalogued book, used to skip known archives on import.
    pub async fn file_names(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(include_str!("../queries/list_file_names.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Every catalogued book, ordered by title.
    pub async fn list(&self) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../queries/list_books.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Book::try_from).collect()
    }

    // =========================================================================
    // Update
    // =========================================================================

    pub async fn set_cover_path(&self, file_name: &str, path: impl AsRef<Path>) -> Result<()> {
        let result = sqlx::query(include_str!("../queries/update_cover_path.sql"))
            .bind(Self::sqlx_hates_paths(path)?)
            .bind(file_name)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::expect_one(result, file_name)
    }

    /// Sets the reading status and returns the reading date that was stored
    /// with it: today (UTC) for [`ReadingStatus::Read`], nothing otherwise.
    #[instrument(skip(self))]
    pub async fn update_status(&self, file_name: &str, status: ReadingStatus) -> Result<Option<Date>> {
        let reading_date = (status == ReadingStatus::Read).then(|| UtcDateTime::now().date());
        let result = sqlx::query(include_str!("../queries/update_status.sql"))
            .bind(status.as_str())
            .bind(format_date(reading_date)?)
            .bind(file_name)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::expect_one(result, file_name)?;
        Ok(reading_date)
    }

    /// Sets a rating between 0 and 5 (inclusive, fractions allowed).
    #[instrument(skip(self))]
    pub async fn update_rating(&self, file_name: &str, rating: f64) -> Result<()> {
        if !(0.0..=MAX_RATING).contains(&rating) {
            exn::bail!(ErrorKind::InvalidData("rating"));
        }
        let result = sqlx::query(include_str!("../queries/update_rating.sql"))
            .bind(rating)
            .bind(file_name)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::expect_one(result, file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_epub::models::BookMetadata;
    use rstest::rstest;

    async fn repo() -> Repository {
        let db = Database::connect_in_memory().await.unwrap();
        Repository::from(&db)
    }

    fn package(file: &str, title: &str) -> Package {
        Package {
            metadata: BookMetadata {
                title: title.to_string(),
                author: "Nicholas Eames".to_string(),
                language: "en".to_string(),
                ..Default::default()
            }
            .with_genres(["Fantasy", " Fantasy,", "Adventure"]),
            ..Package::empty(format!("books/{file}"))
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = repo().await;
        let cover = Path::new("./cache/covers/Kings_of_the_Wyld.jpg");
        let book = repo.insert(&package("kings.epub", "Kings of the Wyld"), Some(cover)).await.unwrap();
        assert_eq!(book.file_name, "kings.epub");
        assert_eq!(book.metadata.genres, vec!["Fantasy", "Adventure"]);
        assert_eq!(book.cover_path.as_deref(), Some(cover));
        assert_eq!(book.status, ReadingStatus::Unread);
        assert_eq!(book.rating, None);
        assert_eq!(repo.get("kings.epub").await.unwrap(), Some(book));
        assert_eq!(repo.get("missing.epub").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_duplicate_file_name() {
        let repo = repo().await;
        repo.insert(&package("kings.epub", "Kings of the Wyld"), None).await.unwrap();
        let err = repo.insert(&package("kings.epub", "Something Else"), None).await.unwrap_err();
        assert_eq!(*err, ErrorKind::AlreadyExists("kings.epub".to_string()));
        assert_eq!(repo.get("kings.epub").await.unwrap().unwrap().metadata.title, "Kings of the Wyld");
    }

    #[tokio::test]
    async fn test_listing() {
        let repo = repo().await;
        repo.insert(&package("b.epub", "Bloody Rose"), None).await.unwrap();
        repo.insert(&package("a.epub", "kings of the Wyld"), None).await.unwrap();
        repo.insert(&package("c.epub", "Anathem"), None).await.unwrap();
        assert_eq!(repo.file_names().await.unwrap(), vec!["a.epub", "b.epub", "c.epub"]);
        let titles: Vec<_> = repo.list().await.unwrap().into_iter().map(|b| b.metadata.title).collect();
        assert_eq!(titles, vec!["Anathem", "Bloody Rose", "kings of the Wyld"]);
    }

    #[tokio::test]
    async fn test_exists() {
        let repo = repo().await;
        assert!(!repo.exists("kings.epub").await.unwrap());
        repo.insert(&package("kings.epub", "Kings of the Wyld"), None).await.unwrap();
        assert!(repo.exists("kings.epub").await.unwrap());
    }

    #[tokio::test]
    async fn test_cover_path() {
        let repo = repo().await;
        repo.insert(&package("kings.epub", "Kings of the Wyld"), None).await.unwrap();
        assert_eq!(repo.cover_path("kings.epub").await.unwrap(), None);
        repo.set_cover_path("kings.epub", "./cache/covers/Kings_of_the_Wyld.jpg").await.unwrap();
        assert_eq!(
            repo.cover_path("kings.epub").await.unwrap(),
            Some(PathBuf::from("./cache/covers/Kings_of_the_Wyld.jpg"))
        );
        let err = repo.cover_path("missing.epub").await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound("missing.epub".to_string()));
        let err = repo.set_cover_path("missing.epub", "x.jpg").await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound("missing.epub".to_string()));
    }

    #[tokio::test]
    async fn test_update_status() {
        let repo = repo().await;
        repo.insert(&package("kings.epub", "Kings of the Wyld"), None).await.unwrap();
        let date = repo.update_status("kings.epub", ReadingStatus::Read).await.unwrap();
        assert_eq!(date, Some(UtcDateTime::now().date()));
        let book = repo.get("kings.epub").await.unwrap().unwrap();
        assert_eq!((book.status, book.reading_date), (ReadingStatus::Read, date));

        assert_eq!(repo.update_status("kings.epub", ReadingStatus::Reading).await.unwrap(), None);
        let book = repo.get("kings.epub").await.unwrap().unwrap();
        assert_eq!((book.status, book.reading_date), (ReadingStatus::Reading, None));

        let err = repo.update_status("missing.epub", ReadingStatus::Read).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound("missing.epub".to_string()));
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(3.5, true)]
    #[case(5.0, true)]
    #[case(-1.0, false)]
    #[case(5.5, false)]
    #[case(f64::NAN, false)]
    #[tokio::test]
    async fn test_update_rating(#[case] rating: f64, #[case] valid: bool) {
        let repo = repo().await;
        repo.insert(&package("kings.epub", "Kings of the Wyld"), None).await.unwrap();
        let result = repo.update_rating("kings.epub", rating).await;
        assert_eq!(result.is_ok(), valid);
        let stored = repo.get("kings.epub").await.unwrap().unwrap().rating;
        assert_eq!(stored, valid.then_some(rating));
    }
}
