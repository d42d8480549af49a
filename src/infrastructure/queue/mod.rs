mod dispatch;
mod jobs;

pub use dispatch::{execute, Job};
pub use jobs::{
    keys, queues, CoverLetterJob, IndexDocumentJob, JobResult, PlanJob, QueueJobStatus,
    ResearchJob,
};
