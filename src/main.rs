//! Opdsync - OPDS Catalog Synchronizer
//!
//! This is the main entry point for the opdsync daemon. It loads settings,
//! reconciles the catalog with a bulk sync, and then follows live
//! filesystem notifications for the process lifetime.

use std::fs::create_dir_all;

use {tracing::info, tracing_subscriber::EnvFilter};

use opdsync::{
    catalog::CatalogLayout,
    config::SettingsManager,
    error::ResultExt,
    metadata::ExtractorRegistry,
    sync::{CatalogSync, SyncConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let manager = SettingsManager::new().add_context("Failed to load settings")?;
    let settings = manager.get_settings().clone();
    settings.validate().add_context("Invalid settings")?;

    let layout = CatalogLayout::new(&settings.source_directory, &settings.catalog_directory);
    // Unrecoverable: without a catalog root there is nothing to synchronize.
    create_dir_all(layout.catalog_root()).add_contextf(format!(
        "Failed to create catalog root {:?}",
        layout.catalog_root()
    ))?;

    let sync = CatalogSync::new(
        layout,
        ExtractorRegistry::new(),
        Some(SyncConfig::from_settings(&settings)),
    )?;
    let queued = sync.bulk_sync()?;
    info!("Initial bulk sync queued {} events", queued);

    sync.run().await;
    Ok(())
}
