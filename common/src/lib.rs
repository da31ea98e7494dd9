pub mod app;
pub mod engine;
pub mod files;
pub mod indexer;
pub mod job;
pub mod partition;
pub mod task;
pub mod wordcount;
pub mod worker;

pub use app::{app_by_name, KeyValue, MapReduceApp};
pub use job::{JobInfo, JobPhase, TaskProgress};
pub use partition::{bucket, ihash};
pub use task::{
    TaskAssignmentRequest, TaskAssignmentResponse, TaskCompleteRequest, TaskCompleteResponse,
    TaskIndex, TaskInfo, TaskKind, TaskState,
};
pub use worker::{WorkerId, WorkerInfo, WorkerRegisterRequest, WorkerRegisterResponse};
