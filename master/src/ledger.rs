// master/src/ledger.rs

use common::{TaskIndex, TaskInfo, TaskKind, TaskProgress, TaskState, WorkerId};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Registro de una tarea map o reduce.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub kind: TaskKind,
    pub index: TaskIndex,
    /// Split de entrada (sólo map)
    pub input_path: Option<String>,
    pub state: TaskState,
    /// Dueño actual, sólo mientras está InProgress
    pub owner: Option<WorkerId>,
    pub assigned_at: Option<Instant>,
    /// Todos los workers a los que se les asignó alguna vez, en orden
    pub assigned_to: Vec<WorkerId>,
    pub completed_by: Option<WorkerId>,
    pub artifacts: Vec<String>,
}

impl TaskRecord {
    fn new(kind: TaskKind, index: TaskIndex, input_path: Option<String>) -> Self {
        Self {
            kind,
            index,
            input_path,
            state: TaskState::Idle,
            owner: None,
            assigned_at: None,
            assigned_to: Vec::new(),
            completed_by: None,
            artifacts: Vec::new(),
        }
    }

    fn info(&self) -> TaskInfo {
        TaskInfo {
            kind: self.kind,
            index: self.index,
            state: self.state,
            owner: self.owner.clone(),
            completed_by: self.completed_by.clone(),
            attempts: self.assigned_to.len() as u32,
            input_path: self.input_path.clone(),
            artifacts: self.artifacts.clone(),
        }
    }
}

/// Resultado de un reporte de finalización.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// La tarea pasó a Completed con este reporte.
    Accepted,
    /// Ya estaba Completed por el mismo worker; se ignora.
    Duplicate,
    /// Reporte de un worker desplazado (o que nunca la tuvo); se ignora.
    Rejected,
    UnknownTask,
}

impl CompletionOutcome {
    pub fn is_ok(self) -> bool {
        matches!(self, CompletionOutcome::Accepted | CompletionOutcome::Duplicate)
    }
}

/// Una tarea asignada en `assigned_at` vence cuando pasó más de `timeout`.
pub fn is_expired(now: Instant, assigned_at: Instant, timeout: Duration) -> bool {
    now.saturating_duration_since(assigned_at) > timeout
}

/// Estado de todas las tareas del job. Sólo lo toca el coordinator.
#[derive(Debug)]
pub struct TaskLedger {
    map_tasks: Vec<TaskRecord>,
    reduce_tasks: Vec<TaskRecord>,
}

impl TaskLedger {
    /// Una tarea map por split y `n_reduce` tareas reduce, todas Idle.
    pub fn new(inputs: Vec<String>, n_reduce: u32) -> Self {
        let map_tasks = inputs
            .into_iter()
            .enumerate()
            .map(|(i, path)| TaskRecord::new(TaskKind::Map, i as TaskIndex, Some(path)))
            .collect();
        let reduce_tasks = (0..n_reduce)
            .map(|r| TaskRecord::new(TaskKind::Reduce, r, None))
            .collect();

        Self {
            map_tasks,
            reduce_tasks,
        }
    }

    fn tasks(&self, kind: TaskKind) -> &[TaskRecord] {
        match kind {
            TaskKind::Map => &self.map_tasks,
            TaskKind::Reduce => &self.reduce_tasks,
        }
    }

    fn tasks_mut(&mut self, kind: TaskKind) -> &mut [TaskRecord] {
        match kind {
            TaskKind::Map => &mut self.map_tasks,
            TaskKind::Reduce => &mut self.reduce_tasks,
        }
    }

    pub fn count(&self, kind: TaskKind) -> u32 {
        self.tasks(kind).len() as u32
    }

    pub fn get(&self, kind: TaskKind, index: TaskIndex) -> Option<&TaskRecord> {
        self.tasks(kind).get(index as usize)
    }

    /// Primera tarea Idle (menor índice) de ese tipo.
    pub fn next_idle(&self, kind: TaskKind) -> Option<TaskIndex> {
        self.tasks(kind)
            .iter()
            .find(|t| t.state == TaskState::Idle)
            .map(|t| t.index)
    }

    /// Idle -> InProgress. Si la tarea no está Idle no hace nada y devuelve false.
    pub fn mark_in_progress(
        &mut self,
        kind: TaskKind,
        index: TaskIndex,
        worker_id: &str,
        now: Instant,
    ) -> bool {
        let Some(task) = self.tasks_mut(kind).get_mut(index as usize) else {
            warn!("mark_in_progress sobre tarea inexistente {:?} {}", kind, index);
            return false;
        };

        if task.state != TaskState::Idle {
            warn!(
                "tarea {:?} {} no está IDLE ({:?}), no se asigna a {}",
                kind, index, task.state, worker_id
            );
            return false;
        }

        task.state = TaskState::InProgress;
        task.owner = Some(worker_id.to_string());
        task.assigned_at = Some(now);
        task.assigned_to.push(worker_id.to_string());
        true
    }

    /// Registra el reporte de `worker_id`.
    ///
    /// Se acepta si el worker es el dueño actual, o si la tuvo antes y todavía
    /// nadie la completó (reporte tardío tras un timeout). Una vez Completed,
    /// sólo el mismo worker puede repetir el reporte.
    pub fn mark_completed(
        &mut self,
        kind: TaskKind,
        index: TaskIndex,
        worker_id: &str,
        artifacts: Vec<String>,
    ) -> CompletionOutcome {
        let Some(task) = self.tasks_mut(kind).get_mut(index as usize) else {
            warn!("reporte de {} para tarea inexistente {:?} {}", worker_id, kind, index);
            return CompletionOutcome::UnknownTask;
        };

        if task.state == TaskState::Completed {
            return if task.completed_by.as_deref() == Some(worker_id) {
                CompletionOutcome::Duplicate
            } else {
                warn!(
                    "rechazando reporte de {} para {:?} {}: ya la completó {:?}",
                    worker_id, kind, index, task.completed_by
                );
                CompletionOutcome::Rejected
            };
        }

        if !task.assigned_to.iter().any(|w| w == worker_id) {
            warn!(
                "rechazando reporte de {} para {:?} {}: nunca le fue asignada",
                worker_id, kind, index
            );
            return CompletionOutcome::Rejected;
        }

        if task.owner.as_deref() != Some(worker_id) {
            info!(
                "reporte tardío de {} para {:?} {} aceptado (dueño actual: {:?})",
                worker_id, kind, index, task.owner
            );
        }

        task.state = TaskState::Completed;
        task.owner = None;
        task.assigned_at = None;
        task.completed_by = Some(worker_id.to_string());
        task.artifacts = artifacts;
        CompletionOutcome::Accepted
    }

    /// Devuelve a Idle toda tarea InProgress de ese tipo asignada hace más de `timeout`.
    /// Retorna los índices reasignables.
    pub fn sweep_timeouts(
        &mut self,
        kind: TaskKind,
        now: Instant,
        timeout: Duration,
    ) -> Vec<TaskIndex> {
        let mut expired = Vec::new();

        for task in self.tasks_mut(kind).iter_mut() {
            if task.state != TaskState::InProgress {
                continue;
            }
            let Some(assigned_at) = task.assigned_at else {
                continue;
            };
            if is_expired(now, assigned_at, timeout) {
                info!(
                    "tarea {:?} {} venció (dueño {:?}), vuelve a IDLE",
                    kind, task.index, task.owner
                );
                task.state = TaskState::Idle;
                task.owner = None;
                task.assigned_at = None;
                expired.push(task.index);
            }
        }

        expired
    }

    /// true si todas las tareas de ese tipo están Completed (también con 0 tareas).
    pub fn is_phase_done(&self, kind: TaskKind) -> bool {
        self.tasks(kind)
            .iter()
            .all(|t| t.state == TaskState::Completed)
    }

    pub fn progress(&self, kind: TaskKind) -> TaskProgress {
        let mut p = TaskProgress::default();
        for t in self.tasks(kind) {
            match t.state {
                TaskState::Idle => p.idle += 1,
                TaskState::InProgress => p.in_progress += 1,
                TaskState::Completed => p.completed += 1,
            }
        }
        p
    }

    pub fn task_infos(&self) -> Vec<TaskInfo> {
        self.map_tasks
            .iter()
            .chain(self.reduce_tasks.iter())
            .map(TaskRecord::info)
            .collect()
    }
}
