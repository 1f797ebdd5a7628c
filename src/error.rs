//! CLI Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("cannot open catalogue at {}", _0.display())]
    Catalogue(#[error(not(source))] PathBuf),
    #[display("catalogue operation failed")]
    CatalogueQuery,
    #[display("book is not catalogued: {_0}")]
    UnknownBook(#[error(not(source))] String),
    #[display("cannot create HTTP client")]
    Client,
    #[display("cover resolution failed")]
    Cover,
    #[display("enrichment worker crashed")]
    Worker,
}
