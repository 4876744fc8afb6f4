// Application state
// Holds configuration and the collaborators every handler needs

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::dashscope::{
    CompletionInvoker, DashScopeCompletionClient, DashScopeRecognitionClient,
    RecognitionTaskClient,
};
use crate::orchestrator::{PlanGenerationPipeline, PollingOrchestrator, UploadRecognizeCleanupSaga};
use crate::services::{PlanRepository, SupabasePlanRepository, SupabaseUserDirectory, UserDirectory};
use crate::storage::{OssObjectStore, RemoteObjectStore, StorageError};

/// Application state, shared as `Arc<AppState>`
///
/// Never mutated after startup; per-request flows are assembled from the
/// shared collaborators on demand.
pub struct AppState {
    /// Loaded configuration
    pub config: Config,
    completion: Arc<dyn CompletionInvoker>,
    recognizer: Arc<dyn RecognitionTaskClient>,
    store: Option<Arc<dyn RemoteObjectStore>>,
    users: Arc<dyn UserDirectory>,
    plans: Arc<dyn PlanRepository>,
}

impl AppState {
    /// Assemble state from explicit collaborators
    ///
    /// `store` is `None` when object storage is not configured; the upload
    /// endpoints then fail with `StorageError::NotConfigured`.
    pub fn new(
        config: Config,
        completion: Arc<dyn CompletionInvoker>,
        recognizer: Arc<dyn RecognitionTaskClient>,
        store: Option<Arc<dyn RemoteObjectStore>>,
        users: Arc<dyn UserDirectory>,
        plans: Arc<dyn PlanRepository>,
    ) -> Self {
        Self {
            config,
            completion,
            recognizer,
            store,
            users,
            plans,
        }
    }

    /// Wire the production clients from `config`
    ///
    /// All HTTP clients share one `reqwest::Client` connection pool.
    pub fn from_config(config: Config) -> Self {
        let http = reqwest::Client::new();

        let store: Option<Arc<dyn RemoteObjectStore>> = match OssObjectStore::from_config(&config.oss)
        {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                tracing::warn!(error = %e, "Object storage disabled");
                None
            }
        };

        Self {
            completion: Arc::new(DashScopeCompletionClient::from_config(
                http.clone(),
                &config.dashscope,
            )),
            recognizer: Arc::new(DashScopeRecognitionClient::from_config(
                http.clone(),
                &config.dashscope,
                &config.recognition,
            )),
            store,
            users: Arc::new(SupabaseUserDirectory::from_config(
                http.clone(),
                &config.supabase,
            )),
            plans: Arc::new(SupabasePlanRepository::from_config(http, &config.supabase)),
            config,
        }
    }

    /// Completion client
    pub fn completion(&self) -> Arc<dyn CompletionInvoker> {
        Arc::clone(&self.completion)
    }

    /// Object store, if configured
    pub fn store(&self) -> Result<Arc<dyn RemoteObjectStore>, StorageError> {
        self.store.clone().ok_or_else(|| {
            StorageError::NotConfigured("OSS_BUCKET and OSS_REGION must be set".to_string())
        })
    }

    /// User directory
    pub fn users(&self) -> &dyn UserDirectory {
        self.users.as_ref()
    }

    /// Plan repository
    pub fn plans(&self) -> &dyn PlanRepository {
        self.plans.as_ref()
    }

    /// Polling orchestrator using the configured policy
    pub fn polling_orchestrator(&self) -> PollingOrchestrator {
        PollingOrchestrator::new(Arc::clone(&self.recognizer), self.config.polling_policy())
    }

    /// Upload/recognize/cleanup saga over the configured store
    pub fn upload_recognize_saga(&self) -> Result<UploadRecognizeCleanupSaga, StorageError> {
        Ok(UploadRecognizeCleanupSaga::new(
            self.store()?,
            self.polling_orchestrator(),
        ))
    }

    /// Plan generation pipeline over the completion client
    pub fn plan_pipeline(&self) -> PlanGenerationPipeline {
        PlanGenerationPipeline::new(self.completion())
    }

    /// Overall deadline for one recognition request
    pub fn recognition_ceiling(&self) -> Duration {
        Duration::from_secs(self.config.recognition.request_ceiling_secs)
    }
}
