//! Shelf application library: the users, books and reviews modules and the
//! consistency coordinator that ties reviews to book counters.

pub mod consistency;
pub mod context;
pub mod modules;
pub mod utils;

use axum::Router;
use serde::Serialize;
use shelf_db::RecordId;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub use context::AppState;

/// Registry holding every Shelf module, sharing `state`.
pub fn build_registry(state: &AppState) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, state)?;
    Ok(registry)
}

/// Fully layered router over `state`.
pub fn router(state: &AppState) -> anyhow::Result<Router> {
    let registry = build_registry(state)?;
    Ok(shelf_http::build_router(&registry, &state.settings))
}

/// Router over the database named in `settings`.
pub async fn build_app(settings: Settings) -> anyhow::Result<Router> {
    let state = AppState::connect(settings).await?;
    router(&state)
}

/// Initialize and start every module, serve until shutdown, then stop them.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let state = AppState::connect(settings).await?;
    let registry = build_registry(&state)?;
    let ctx = InitCtx {
        settings: &state.settings,
    };

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;
    tracing::info!(modules = registry.len(), "shelf started");

    let served = shelf_http::start_server(&registry, &state.settings).await;
    let stopped = registry.stop_all().await;
    state.store.close().await;

    served?;
    stopped
}

/// Recompute one book's review counter from its live reviews.
pub async fn reconcile(settings: Settings, raw_book_id: &str) -> anyhow::Result<Reconciled> {
    let book_id = utils::parse_id(raw_book_id, "bookId")?;
    let state = AppState::connect(settings).await?;
    let result = state.coordinator.reconcile(&state.store, book_id).await;
    state.store.close().await;

    let (before, after) = result?;
    Ok(Reconciled {
        book_id,
        before,
        after,
    })
}

/// Outcome of [`reconcile`].
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciled {
    pub book_id: RecordId,
    pub before: u32,
    pub after: u32,
}
