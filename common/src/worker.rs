use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identidad opaca de un worker (la asigna el master al registrarse).
pub type WorkerId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRegisterRequest {
    pub hostname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRegisterResponse {
    pub worker_id: WorkerId,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WorkerInfo {
    pub worker_id: WorkerId,
    pub hostname: String,
    pub registered_at: DateTime<Utc>,
    pub last_seen_secs_ago: u64,
    pub tasks_assigned: u64,
    pub tasks_completed: u64,
    pub reports_rejected: u64,
}
