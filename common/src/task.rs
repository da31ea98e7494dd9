use serde::{Deserialize, Serialize};

use crate::worker::WorkerId;

/// Índice de una tarea dentro de su fase (0..M para map, 0..R para reduce).
pub type TaskIndex = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Map,
    Reduce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Idle,
    InProgress,
    Completed,
}

/// Vista de una tarea para el endpoint de estado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    pub kind: TaskKind,
    pub index: TaskIndex,
    pub state: TaskState,
    /// Dueño actual (sólo mientras está IN_PROGRESS)
    pub owner: Option<WorkerId>,
    /// Worker cuyo reporte quedó registrado
    pub completed_by: Option<WorkerId>,
    /// Cuántas veces se asignó
    pub attempts: u32,
    pub input_path: Option<String>,
    pub artifacts: Vec<String>,
}

/* --------- RPC: pedir tarea --------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignmentRequest {
    pub worker_id: WorkerId,
}

/// Respuesta a "¿hay trabajo?".
///
/// En JSON va etiquetada por `task_type`, p.ej.
/// `{"task_type":"Map","task_index":0,"input_path":"a.txt","reduce_bucket_count":2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task_type")]
pub enum TaskAssignmentResponse {
    Map {
        task_index: TaskIndex,
        input_path: String,
        reduce_bucket_count: u32,
    },
    Reduce {
        task_index: TaskIndex,
        map_task_count: u32,
    },
    /// Hay tareas en curso; volver a preguntar en un rato.
    Wait,
    /// El job terminó; el worker puede salir.
    Exit,
}

/* --------- RPC: reportar tarea --------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompleteRequest {
    pub worker_id: WorkerId,
    pub task_type: TaskKind,
    pub task_index: TaskIndex,
    #[serde(default)]
    pub artifacts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompleteResponse {
    pub ok: bool,
}
