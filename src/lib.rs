//! Booker application library.
//!
//! Wires the users and authors modules around a shared [`AppContext`] and
//! exposes the bootstrap sequence used by both the server binary and the CLI:
//! open the database, register modules, apply migrations, then initialize.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use booker_db::Database;
use booker_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub mod context;
pub mod modules;
pub mod utils;

pub use context::AppContext;

/// Registered modules plus the state they share.
pub struct Application {
    pub registry: ModuleRegistry,
    pub context: AppContext,
}

impl Application {
    /// Register every module around `db`. Nothing is migrated or initialized.
    pub fn assemble(db: Arc<Database>, settings: &Settings) -> anyhow::Result<Self> {
        let context = AppContext::new(db, &settings.auth)?;
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &context);

        Ok(Self { registry, context })
    }

    /// Apply pending module migrations; returns how many ran.
    pub fn migrate(&self) -> anyhow::Result<usize> {
        let migrations = self.registry.collect_migrations();
        let applied = self
            .context
            .db
            .apply_migrations(&migrations)
            .context("failed to apply migrations")?;

        tracing::info!(applied, total = migrations.len(), "migrations complete");
        Ok(applied)
    }

    pub async fn init(&self, settings: &Settings) -> anyhow::Result<()> {
        self.registry.init_all(&InitCtx { settings }).await
    }

    /// The full HTTP application: module routes, docs, and middleware.
    pub fn router(&self, settings: &Settings) -> Router {
        booker_http::build_router(&self.registry, settings)
    }
}

/// Open the configured database, migrate it, and initialize every module.
pub async fn bootstrap(settings: &Settings) -> anyhow::Result<Application> {
    let db = open_database(settings)?;
    bootstrap_with(db, settings).await
}

/// [`bootstrap`] against an already opened database.
pub async fn bootstrap_with(db: Arc<Database>, settings: &Settings) -> anyhow::Result<Application> {
    let app = Application::assemble(db, settings)?;
    app.migrate()?;
    app.init(settings).await?;
    Ok(app)
}

pub fn open_database(settings: &Settings) -> anyhow::Result<Arc<Database>> {
    let path = &settings.database.path;
    let db = Database::open(path)
        .with_context(|| format!("failed to open database at '{path}'"))?;
    Ok(Arc::new(db))
}
