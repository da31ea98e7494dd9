// master/src/state.rs

use chrono::{DateTime, Utc};
use common::WorkerId;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::SystemTime,
};

use crate::coordinator::Coordinator;

#[derive(Clone)]
pub struct AppState {
    // única sección crítica del scheduler: ledger + fase
    pub coordinator: Arc<Mutex<Coordinator>>,
    // sólo métricas; nunca decide nada de scheduling
    pub workers: Arc<Mutex<HashMap<WorkerId, WorkerMeta>>>,
}

impl AppState {
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator: Arc::new(Mutex::new(coordinator)),
            workers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Actualiza las métricas del worker (lo crea si nunca se registró).
    pub fn touch_worker<F>(&self, worker_id: &str, update: F)
    where
        F: FnOnce(&mut WorkerMeta),
    {
        let mut workers = self.workers.lock().unwrap();
        let meta = workers
            .entry(worker_id.to_string())
            .or_insert_with(|| WorkerMeta::new("desconocido".to_string()));
        meta.last_seen = SystemTime::now();
        update(meta);
    }
}

#[derive(Debug, Clone)]
pub struct WorkerMeta {
    pub hostname: String,
    pub registered_at: DateTime<Utc>,
    pub last_seen: SystemTime,

    // Métricas
    pub tasks_assigned: u64,
    pub tasks_completed: u64,
    pub reports_rejected: u64,
}

impl WorkerMeta {
    pub fn new(hostname: String) -> Self {
        Self {
            hostname,
            registered_at: Utc::now(),
            last_seen: SystemTime::now(),
            tasks_assigned: 0,
            tasks_completed: 0,
            reports_rejected: 0,
        }
    }
}
