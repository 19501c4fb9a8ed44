// Job lifecycle
//
// - Job: the status state machine and the per-job record
// - Registry: the shared in-memory job table
// - Orchestrator: the background pipeline that drives each job

pub mod job;
pub mod orchestrator;
pub mod registry;

pub use job::{DubbedVersion, Job, JobRequest, JobStatus};
pub use orchestrator::{DubOutcome, JobOrchestrator, PipelineServices};
pub use registry::JobRegistry;
