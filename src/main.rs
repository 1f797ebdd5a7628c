//! `folio`: import a folder of e-books and give every one of them a cover.

mod app;
mod commands;
mod error;

use crate::app::App;
use crate::error::Result;
use clap::{Parser, Subcommand, ValueEnum};
use folio_catalogue::ReadingStatus;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "folio", version, about)]
struct Args {
    /// Configuration file (defaults to ./folio.toml when present)
    #[arg(short, long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import every new archive in the books directory, then fetch missing
    /// covers until the queue is empty (Ctrl-C stops early)
    Import,
    /// Print the catalogue
    List,
    /// Resolve the cover of one catalogued book
    Cover {
        /// Archive file name, as catalogued
        file: String,
    },
    /// Set the reading status of a book
    Status {
        file: String,
        #[arg(value_enum)]
        status: Status,
    },
    /// Rate a book from 0 to 5
    Rate { file: String, rating: f64 },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Status {
    Unread,
    Reading,
    Read,
}
impl From<Status> for ReadingStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Unread => Self::Unread,
            Status::Reading => Self::Reading,
            Status::Read => Self::Read,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "Command failed");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<()> {
    let app = App::open(args.config.as_deref()).await?;
    let result = match args.command {
        Command::Import => commands::import(&app).await,
        Command::List => commands::list(&app).await,
        Command::Cover { file } => commands::cover(&app, &file).await,
        Command::Status { file, status } => commands::status(&app, &file, status.into()).await,
        Command::Rate { file, rating } => commands::rate(&app, &file, rating).await,
    };
    app.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
        let config = Args::command().get_arguments().find(|arg| arg.get_id() == "config").cloned().unwrap();
        assert_eq!(config.get_env(), Some(std::ffi::OsStr::new("FOLIO_CONFIG")));
    }

    #[test]
    fn test_parse_commands() {
        let args = Args::try_parse_from(["folio", "cover", "kings.epub", "--config", "folio.yaml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("folio.yaml")));
        assert!(matches!(args.command, Command::Cover { file } if file == "kings.epub"));
        let args = Args::try_parse_from(["folio", "status", "kings.epub", "read"]).unwrap();
        assert!(matches!(args.command, Command::Status { status: Status::Read, .. }));
        assert!(Args::try_parse_from(["folio", "status", "kings.epub", "finished"]).is_err());
    }
}
