//! Download pipeline: stream each ticket's artifact to disk and record
//! it in the catalog.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::market::client::MarketClient;
use crate::market::session::RequestError;
use crate::store::db::{CatalogDb, DbError};
use crate::types::DownloadTicket;
use crate::ui;

/// Fixed read size for the streaming loop.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("download response did not declare a content-length")]
    MissingContentLength,

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Download pipeline options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Directory artifacts are written into.
    pub directory: PathBuf,
    /// Skip the network transfer but still record intent in the catalog.
    pub dry_run: bool,
    /// Upper bound on a single read; chunks written never exceed it.
    pub chunk_size: usize,
}

impl FetchOptions {
    pub fn new(directory: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
            dry_run: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Process every ticket in order (tickets arrive sorted by name).
///
/// A failed package is reported and skipped; the remaining tickets
/// still run, and its catalog record is left untouched so the next run
/// retries it. Store failures are fatal to the run. Returns the number
/// of failed packages.
pub fn fetch_all(
    client: &mut MarketClient,
    db: &mut CatalogDb,
    tickets: &[DownloadTicket],
    options: &FetchOptions,
) -> Result<usize, DbError> {
    let mut failures = 0;
    for ticket in tickets {
        ui::update_notice(ticket);
        if options.dry_run {
            db.upsert(ticket)?;
            continue;
        }
        ui::success(&format!(
            "Downloading apk {} with size {}...",
            ticket.name,
            ui::format_size(ticket.size)
        ));
        match fetch_one(client, ticket, options) {
            Ok(written) => {
                info!(name = %ticket.name, written, "download complete");
                db.upsert(ticket)?;
            }
            Err(err) => {
                warn!(name = %ticket.name, "download failed: {err}");
                ui::error(&format!("Failed to download {}: {err}", ticket.name));
                failures += 1;
            }
        }
    }
    Ok(failures)
}

/// Stream one artifact to `{directory}/{name}.{version}.apk`.
///
/// Reads the declared content-length up front (required to size the
/// progress display), then copies fixed-size chunks, flushing after
/// every write. Zero-length reads end the stream; nothing empty is
/// ever written.
fn fetch_one(
    client: &mut MarketClient,
    ticket: &DownloadTicket,
    options: &FetchOptions,
) -> Result<u64, FetchError> {
    let mut stream = client.download(ticket.name.as_str(), ticket.code, ticket.offer)?;
    let total = stream
        .content_length()
        .ok_or(FetchError::MissingContentLength)?;

    let path = options.directory.join(ticket.artifact_name());
    let mut file = File::create(&path)?;
    let mut buf = vec![0u8; options.chunk_size];
    let mut written: u64 = 0;
    let progress = ui::DownloadProgress::start(ticket.name.as_str(), total);

    loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        file.flush()?;
        written += n as u64;
        progress.update(written);
    }
    progress.finish();

    Ok(written)
}
