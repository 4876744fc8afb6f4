//! Orchestrator module
//!
//! Composes the remote clients into the multi-step flows the API exposes:
//! recognition polling, the upload/recognize/cleanup saga and plan
//! generation. The building blocks are small and take their collaborators
//! as trait objects so each flow can be tested against in-memory fakes.

pub mod compensation;
pub mod plan_pipeline;
pub mod polling;
pub mod saga;

pub use compensation::{with_compensation, Compensation};
pub use plan_pipeline::{parse_plan_draft, GeneratedPlanDraft, PlanError, PlanGenerationPipeline};
pub use polling::{PollingOrchestrator, PollingPolicy};
pub use saga::{ObjectHandle, UploadRecognizeCleanupSaga, UploadRecognizeError};
