//! Construction of the full service graph for one process run.

use std::path::Path;
use std::sync::Arc;

use quiz_core::model::Catalog;
use quiz_core::time::Clock;
use storage::content;
use storage::repository::Storage;

use crate::dashboard::DashboardService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::sessions::SessionLoopService;

/// The wired-up application: one catalog, one storage backend, and the
/// services over them. Cheap to clone.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<Catalog>,
    pub progress: ProgressService,
    pub sessions: SessionLoopService,
    pub dashboard: DashboardService,
}

impl AppServices {
    /// Open storage, load and validate the content bundle, and build the
    /// services. Catalog failure is fatal here; a quiz app without
    /// questions has nothing to do.
    ///
    /// # Errors
    ///
    /// `AppServicesError::Content` when the bundle cannot be read, parsed
    /// or validated, `AppServicesError::Sqlite` when the database cannot be
    /// opened or migrated.
    pub async fn init(
        database_url: &str,
        content_path: &Path,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let catalog = Arc::new(content::load_from_path(content_path)?);
        let storage = Storage::sqlite(database_url).await?;
        Ok(Self::from_parts(catalog, storage, clock))
    }

    /// Build services over already-constructed parts.
    #[must_use]
    pub fn from_parts(catalog: Arc<Catalog>, storage: Storage, clock: Clock) -> Self {
        let progress = ProgressService::new(storage.progress.clone(), storage.daily.clone())
            .with_clock(clock);
        let sessions =
            SessionLoopService::new(catalog.clone(), progress.clone()).with_clock(clock);
        let dashboard =
            DashboardService::new(catalog.clone(), storage.progress, storage.daily)
                .with_clock(clock);
        Self {
            catalog,
            progress,
            sessions,
            dashboard,
        }
    }

    /// Fully in-memory services, for tests and throwaway runs.
    #[must_use]
    pub fn in_memory(catalog: Arc<Catalog>, clock: Clock) -> Self {
        Self::from_parts(catalog, Storage::in_memory(), clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::CatalogDocument;
    use quiz_core::time::fixed_clock;

    #[tokio::test]
    async fn in_memory_services_share_one_store() {
        let json = r#"{
            "questions": [
                {"id": "q1", "source": "Anatomi/Hjartat", "question": "Q?",
                 "options": [{"text": "a", "correct": true}, {"text": "b", "correct": false}]}
            ]
        }"#;
        let catalog = Arc::new(
            Catalog::from_document(serde_json::from_str::<CatalogDocument>(json).unwrap())
                .unwrap(),
        );
        let app = AppServices::in_memory(catalog, fixed_clock());

        app.progress
            .record_answer(&quiz_core::model::QuestionId::new("q1"), true)
            .await
            .unwrap();

        let stats = app.dashboard.stats().await.unwrap();
        assert_eq!(stats.answered, 1);
        assert_eq!(stats.today_seen, 1);
    }
}
