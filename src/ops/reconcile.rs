//! Catalog reconciliation: decide which configured packages need a
//! fresh download.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::market::client::MarketClient;
use crate::market::session::RequestError;
use crate::store::db::{CatalogDb, DbError};
use crate::types::{ApkRecord, DownloadTicket, PackageName};

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// The work a run has to do, plus what is already current.
#[derive(Debug, Default)]
pub struct UpdatePlan {
    /// Packages to download, sorted by name.
    pub tickets: Vec<DownloadTicket>,
    /// Configured packages whose local record is already current
    /// (reporting only).
    pub unchanged: Vec<ApkRecord>,
}

/// Local records no longer named in the configuration.
pub fn stale_names(
    local: &BTreeMap<PackageName, ApkRecord>,
    configured: &[PackageName],
) -> Vec<PackageName> {
    local
        .keys()
        .filter(|name| !configured.contains(name))
        .cloned()
        .collect()
}

/// Selection predicate: a package needs a fetch iff forced, locally
/// unknown, or strictly older locally than the remote code. An equal or
/// newer local code is never re-fetched.
pub fn select_updates(
    remote: &BTreeMap<PackageName, i32>,
    local: &BTreeMap<PackageName, ApkRecord>,
    force: bool,
) -> Vec<PackageName> {
    remote
        .iter()
        .filter(|(name, code)| {
            force || local.get(*name).is_none_or(|record| record.code < **code)
        })
        .map(|(name, _)| name.clone())
        .collect()
}

/// Compute the update plan for this run.
///
/// Prunes stale local records first (one transaction) and re-reads the
/// snapshot, so the diff and the unchanged report see the pruned state.
/// Then diffs remote version codes against the local catalog and
/// resolves full download metadata for every selected package.
pub fn plan(
    client: &mut MarketClient,
    db: &mut CatalogDb,
    configured: &[PackageName],
    force: bool,
) -> Result<UpdatePlan, ReconcileError> {
    let local = db.get_all()?;
    let stale = stale_names(&local, configured);
    if !stale.is_empty() {
        debug!(count = stale.len(), "pruning records for unconfigured packages");
        db.delete_many(&stale)?;
    }
    let local = db.get_all()?;

    let remote = client.bulk_version_codes(configured)?;
    let selected = select_updates(&remote, &local, force);

    let mut tickets = Vec::with_capacity(selected.len());
    for name in &selected {
        tickets.push(client.remote_apk(name)?.into());
    }

    let unchanged = local
        .into_values()
        .filter(|record| !selected.contains(&record.name))
        .collect();

    Ok(UpdatePlan { tickets, unchanged })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, code: i32) -> ApkRecord {
        ApkRecord {
            name: PackageName::new(name),
            code,
            version: format!("{code}.0"),
            offer: 1,
            size: 1024,
            updated: 0,
        }
    }

    fn local_of(records: &[(&str, i32)]) -> BTreeMap<PackageName, ApkRecord> {
        records
            .iter()
            .map(|(name, code)| (PackageName::new(name), record(name, *code)))
            .collect()
    }

    fn remote_of(codes: &[(&str, i32)]) -> BTreeMap<PackageName, i32> {
        codes
            .iter()
            .map(|(name, code)| (PackageName::new(name), *code))
            .collect()
    }

    #[test]
    fn selects_absent_and_strictly_older() {
        let remote = remote_of(&[("a", 5), ("b", 6), ("c", 1)]);
        let local = local_of(&[("a", 5), ("b", 5)]);

        let selected = select_updates(&remote, &local, false);
        assert_eq!(selected, vec![PackageName::new("b"), PackageName::new("c")]);
    }

    #[test]
    fn never_selects_equal_or_newer_without_force() {
        let remote = remote_of(&[("a", 5), ("b", 4)]);
        let local = local_of(&[("a", 5), ("b", 9)]);

        assert!(select_updates(&remote, &local, false).is_empty());
    }

    #[test]
    fn force_selects_everything_resolved() {
        let remote = remote_of(&[("a", 5), ("b", 4)]);
        let local = local_of(&[("a", 5), ("b", 9)]);

        let selected = select_updates(&remote, &local, true);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn selection_is_idempotent_for_identical_snapshots() {
        let remote = remote_of(&[("a", 5), ("b", 6)]);
        let local = local_of(&[("a", 5), ("b", 6)]);

        assert!(select_updates(&remote, &local, false).is_empty());
        assert!(select_updates(&remote, &local, false).is_empty());
    }

    #[test]
    fn stale_names_are_locals_minus_configured() {
        let local = local_of(&[("a", 1), ("gone", 2), ("b", 3)]);
        let configured = vec![PackageName::new("a"), PackageName::new("b")];

        assert_eq!(stale_names(&local, &configured), vec![PackageName::new("gone")]);
    }

    #[test]
    fn unconfigured_package_is_never_selected() {
        // A package pruned from the configuration does not come back via
        // the remote side: selection only iterates remote codes for the
        // configured set.
        let remote = remote_of(&[("a", 9)]);
        let local = local_of(&[("a", 9)]);

        assert!(select_updates(&remote, &local, false).is_empty());
    }
}
