pub mod analytics;
pub mod cache;
pub mod commands;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod filters;
pub mod scope;
pub mod settings;
mod utils;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use cache::{CacheConfig, QueryCache};
use dashboard::{
    AddressBar, DashboardController, DashboardView, DisplayView, LocalSource, MemoryAddressBar,
};
use db::Database;
use error::AnalyticsError;
use serde::Serialize;
use settings::SettingsStore;

const USAGE: &str = "usage: teampulse <caller-user-id> [query-string]";

pub struct AppState {
    pub db: Database,
    pub settings: SettingsStore,
}

impl AppState {
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        let db = Database::new(data_dir.join("teampulse.sqlite3"))?;
        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        Ok(Self { db, settings })
    }
}

#[derive(Serialize)]
struct Report<'a> {
    display: DisplayView,
    view: &'a DashboardView,
}

fn debug_mode() -> bool {
    std::env::var("TEAMPULSE_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn data_dir() -> PathBuf {
    std::env::var_os("TEAMPULSE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".teampulse"))
}

/// Opens a dashboard for `caller_id` from a query string, loads every panel
/// once and prints the normalized query followed by the view and its
/// formatted values as JSON.
pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(if debug_mode() {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let mut args = std::env::args().skip(1);
    let caller_id = args.next().ok_or_else(|| anyhow!(USAGE))?;
    let query = args.next().unwrap_or_default();

    log::info!("teampulse starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    runtime.block_on(async move {
        let state = Arc::new(AppState::open(&data_dir())?);
        let caller = state
            .db
            .get_user(&caller_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| AnalyticsError::UnknownCaller(caller_id.clone()))?
            .caller();

        let cache = Arc::new(QueryCache::new(CacheConfig::from(&state.settings.analytics())));
        let address_bar = Arc::new(MemoryAddressBar::new(query));
        let source = Arc::new(LocalSource::new(Arc::clone(&state), caller_id));
        let controller = DashboardController::new(caller, source, cache, address_bar.clone());

        let view = controller.refresh().await;
        println!("{}", address_bar.query());
        let report = Report {
            display: DisplayView::from(&view),
            view: &view,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    })
}
