use crate::app::{App, cancel_on_interrupt};
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use folio_catalogue::{Book, ReadingStatus};
use folio_library::{CoverResolver, ImportEvent, Resolution, WorkerReport, extract_archive, import as import_books};
use futures::StreamExt;
use std::pin::pin;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub async fn import(app: &App) -> Result<()> {
    let token = CancellationToken::new();
    cancel_on_interrupt(token.clone());
    let (resolver, worker) = app.start_enrichment(token.clone())?;
    import_all(app, &resolver, &token).await;
    // Dropping the last queue handle lets the worker drain and return.
    drop(resolver);
    if !token.is_cancelled() {
        println!("Fetching missing covers (Ctrl-C to stop)");
    }
    report(finish(worker).await?);
    Ok(())
}

async fn import_all(app: &App, resolver: &CoverResolver, token: &CancellationToken) {
    let books_dir = &app.config.library.books_dir;
    let mut events = pin!(import_books(books_dir, &app.catalogue, resolver));
    let (mut imported, mut failed) = (0_u64, 0_u64);
    loop {
        let event = tokio::select! {
            biased;
            () = token.cancelled() => return,
            event = events.next() => event,
        };
        match event {
            Some(Ok(ImportEvent::Started)) => println!("Importing from {}", books_dir.display()),
            Some(Ok(ImportEvent::DiscoveryComplete(total))) => println!("{total} new archive(s)"),
            Some(Ok(ImportEvent::Imported(book))) => {
                imported += 1;
                let cover = match &book.resolution {
                    Some(Resolution::Pending) => "queued for lookup".to_string(),
                    Some(Resolution::QueueFull) => "no cover, lookup queue full".to_string(),
                    Some(resolution) => resolution.path().map(|path| path.display().to_string()).unwrap_or_default(),
                    None => "no cover".to_string(),
                };
                println!("  {} [{}]", describe(&book.book), cover);
            },
            Some(Ok(ImportEvent::Complete)) => println!("Imported {imported} book(s), {failed} failed"),
            Some(Err(err)) => {
                failed += 1;
                eprintln!("  {}", *err);
                tracing::debug!(error = ?err, "Import item failed");
            },
            None => return,
        }
    }
}

pub async fn list(app: &App) -> Result<()> {
    let books = app.catalogue.list().await.or_raise(|| ErrorKind::CatalogueQuery)?;
    for book in &books {
        let rating = book.rating.map(|rating| format!("{rating:.1}")).unwrap_or_else(|| "-".to_string());
        let date = book.reading_date.map(|date| format!(" ({date})")).unwrap_or_default();
        println!("{}\t{}{}\t{}\t{}", describe(book), book.status, date, rating, book.file_name);
    }
    println!("{} book(s)", books.len());
    Ok(())
}

pub async fn cover(app: &App, file: &str) -> Result<()> {
    app.catalogue
        .get(file)
        .await
        .or_raise(|| ErrorKind::CatalogueQuery)?
        .ok_or_raise(|| ErrorKind::UnknownBook(file.to_string()))?;
    let token = CancellationToken::new();
    cancel_on_interrupt(token.clone());
    let (resolver, worker) = app.start_enrichment(token)?;

    let extraction = extract_archive(app.config.library.books_dir.join(file)).await.or_raise(|| ErrorKind::Cover)?;
    let resolution = resolver.resolve(Arc::new(extraction.package)).await.or_raise(|| ErrorKind::Cover)?;
    drop(resolver);
    if let Some(path) = resolution.path() {
        app.catalogue.set_cover_path(file, path).await.or_raise(|| ErrorKind::CatalogueQuery)?;
    } else if resolution == Resolution::Pending {
        println!("Nothing usable in the archive; looking it up");
    }
    finish(worker).await?;

    match app.catalogue.cover_path(file).await.or_raise(|| ErrorKind::CatalogueQuery)? {
        Some(path) => println!("{}", path.display()),
        None => println!("No cover found for {file}"),
    }
    Ok(())
}

pub async fn status(app: &App, file: &str, status: ReadingStatus) -> Result<()> {
    let date = app.catalogue.update_status(file, status).await.or_raise(|| ErrorKind::CatalogueQuery)?;
    match date {
        Some(date) => println!("{file}: {status} on {date}"),
        None => println!("{file}: {status}"),
    }
    Ok(())
}

pub async fn rate(app: &App, file: &str, rating: f64) -> Result<()> {
    app.catalogue.update_rating(file, rating).await.or_raise(|| ErrorKind::CatalogueQuery)?;
    println!("{file}: {rating:.1}");
    Ok(())
}

async fn finish(worker: JoinHandle<WorkerReport>) -> Result<WorkerReport> {
    worker.await.or_raise(|| ErrorKind::Worker)
}

fn report(report: WorkerReport) {
    println!(
        "Covers fetched: {}, unavailable: {}, failed: {}, discarded: {}",
        report.fetched, report.unavailable, report.failed, report.discarded
    );
}

fn describe(book: &Book) -> String {
    let title = if book.metadata.title.is_empty() { &book.file_name } else { &book.metadata.title };
    if book.metadata.author.is_empty() {
        title.to_string()
    } else {
        format!("{title} by {}", book.metadata.author)
    }
}
