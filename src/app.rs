use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use folio_catalogue::{Database, Repository};
use folio_config::Config;
use folio_library::{CoverCache, CoverResolver, EnrichmentWorker, WorkerReport, channel};
use folio_lookup::OpenLibrary;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Long-lived handles shared by every command.
pub struct App {
    pub config: Config,
    pub catalogue: Repository,
    db: Database,
}
impl App {
    pub async fn open(config: Option<&Path>) -> Result<Self> {
        let config = Config::load(config).or_raise(|| ErrorKind::Config)?;
        let path = &config.library.database;
        let failed = || ErrorKind::Catalogue(path.clone());
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.or_raise(failed)?;
        }
        let db = Database::connect(path).await.or_raise(failed)?;
        tracing::debug!(database = %path.display(), "Catalogue opened");
        Ok(Self { catalogue: Repository::from(&db), db, config })
    }

    /// Spawns the enrichment worker and returns the resolver feeding it.
    ///
    /// The worker stops once the returned resolver (and every clone of it)
    /// is dropped and the backlog is drained, or when `token` is cancelled.
    pub fn start_enrichment(&self, token: CancellationToken) -> Result<(CoverResolver, JoinHandle<WorkerReport>)> {
        let enrichment = &self.config.enrichment;
        if enrichment.contact.is_empty() {
            tracing::warn!("No enrichment contact configured; set FOLIO_ENRICHMENT__CONTACT or OLContact");
        }
        let source = OpenLibrary::new(&enrichment.contact, enrichment.timeout()).or_raise(|| ErrorKind::Client)?;
        let cache = CoverCache::new(&self.config.library.cache_dir);
        let (queue, inbox) = channel(enrichment.queue_capacity, enrichment.enqueue_timeout());
        let worker = EnrichmentWorker::new(inbox, Arc::new(source), cache.clone(), enrichment.pace())
            .with_catalogue(self.catalogue.clone());
        let handle = tokio::spawn(worker.run(token));
        Ok((CoverResolver::new(cache, queue), handle))
    }

    pub async fn close(self) {
        self.db.close().await;
    }
}

/// Cancels `token` on Ctrl-C.
pub fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            () = token.cancelled() => {},
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    tracing::warn!("Interrupted; stopping");
                    token.cancel();
                },
                Err(err) => tracing::error!(error = %err, "Cannot listen for Ctrl-C"),
            },
        }
    });
}
