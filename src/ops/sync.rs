//! The top-level run: reconcile the catalog and fetch what changed.

use anyhow::{Result, bail};
use tracing::debug;

use crate::config::Settings;
use crate::market::client::MarketClient;
use crate::market::session::{Credentials, DeviceProfile, Endpoints, Session};
use crate::ops::{fetch, reconcile};
use crate::store::db::CatalogDb;
use crate::types::PackageName;
use crate::ui;

/// Flow switches from the CLI that are not part of the configuration.
#[derive(Debug, Clone, Default)]
pub struct RunFlags {
    pub force: bool,
    pub recreate: bool,
    pub dry_run: bool,
    pub info_only: bool,
}

/// Run one full sync against the production endpoints.
pub fn run(settings: &Settings, flags: &RunFlags) -> Result<()> {
    run_with_endpoints(settings, flags, Endpoints::default())
}

/// Run one full sync; endpoints are injectable for tests.
pub fn run_with_endpoints(
    settings: &Settings,
    flags: &RunFlags,
    endpoints: Endpoints,
) -> Result<()> {
    if !settings.directory.is_dir() {
        bail!(
            "output directory does not exist: {}",
            settings.directory.display()
        );
    }

    let mut db = CatalogDb::open_at(&settings.store, flags.recreate)?;
    let token = db.get_token()?;

    let device = DeviceProfile::new(&settings.android_id);
    let credentials = match token {
        Some(token) => {
            debug!("using persisted auth token");
            Credentials::Token(token)
        }
        None => Credentials::Password {
            email: settings.email.clone(),
            password: settings.password.clone(),
        },
    };
    let session = Session::new(device, credentials, endpoints);
    let mut client = MarketClient::new(session);

    let configured: Vec<PackageName> =
        settings.apks.iter().map(|name| PackageName::new(name)).collect();
    let plan = reconcile::plan(&mut client, &mut db, &configured, flags.force)?;

    // Persist whatever token the session ended up with; a fresh login
    // may have replaced the stored one.
    if let Some(token) = client.token() {
        db.set_token(token)?;
    }

    if flags.info_only {
        ui::show_plan(&plan);
        return Ok(());
    }

    if plan.tickets.is_empty() {
        ui::warning("There are no new apk packages to update");
        return Ok(());
    }

    let mut options = fetch::FetchOptions::new(&settings.directory);
    options.dry_run = flags.dry_run;
    let failures = fetch::fetch_all(&mut client, &mut db, &plan.tickets, &options)?;
    if failures > 0 {
        bail!("{failures} package(s) failed to download");
    }
    Ok(())
}
