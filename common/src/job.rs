use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fase global del job. Sólo avanza: MAPPING -> REDUCING -> DONE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPhase {
    Mapping,
    Reducing,
    Done,
}

/// Conteo de tareas de una fase por estado.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub idle: u32,
    pub in_progress: u32,
    pub completed: u32,
}

impl TaskProgress {
    pub fn total(&self) -> u32 {
        self.idle + self.in_progress + self.completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub phase: JobPhase,
    pub map_task_count: u32,
    pub reduce_bucket_count: u32,
    pub task_timeout_secs: u64,

    pub map: TaskProgress,
    pub reduce: TaskProgress,

    /// -------- Métricas del job --------
    pub submitted_at: DateTime<Utc>,
    pub reducing_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Tareas devueltas a IDLE por timeout
    pub reassignments: u64,
    /// Reportes de finalización rechazados
    pub rejected_reports: u64,
}
