use std::sync::Arc;

use axum::extract::FromRef;
use shelf_authz::SessionAuthenticator;
use shelf_db::Store;
use shelf_kernel::settings::Settings;

use crate::consistency::ConsistencyCoordinator;
use crate::modules::books::service::CatalogStore;
use crate::modules::reviews::service::ReviewLedger;
use crate::modules::users::service::IdentityStore;

/// Shared state handed to every module router.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Store,
    pub sessions: Arc<SessionAuthenticator>,
    pub coordinator: ConsistencyCoordinator,
    pub identity: IdentityStore,
    pub catalog: CatalogStore,
    pub reviews: ReviewLedger,
}

impl AppState {
    /// Open the configured database and wire the stores over it.
    pub async fn connect(settings: Settings) -> anyhow::Result<Self> {
        let store = Store::connect(&settings.database).await?;
        Ok(Self::with_store(settings, store))
    }

    pub fn with_store(settings: Settings, store: Store) -> Self {
        let settings = Arc::new(settings);
        let sessions = Arc::new(SessionAuthenticator::from_settings(&settings.auth));
        let coordinator = ConsistencyCoordinator::new();

        Self {
            identity: IdentityStore::new(store.clone(), sessions.clone()),
            catalog: CatalogStore::new(store.clone(), settings.catalog.empty_list),
            reviews: ReviewLedger::new(
                store.clone(),
                coordinator.clone(),
                settings.catalog.empty_list,
            ),
            settings,
            store,
            sessions,
            coordinator,
        }
    }
}

impl FromRef<AppState> for Arc<SessionAuthenticator> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
