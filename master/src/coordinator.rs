// master/src/coordinator.rs

use chrono::{DateTime, Utc};
use common::{JobInfo, JobPhase, TaskAssignmentResponse, TaskIndex, TaskInfo, TaskKind};
use std::time::{Duration, Instant};
use tracing::info;

use crate::ledger::{CompletionOutcome, TaskLedger};

/// Máquina de estados del job: MAPPING -> REDUCING -> DONE.
///
/// Todo acceso pasa por los dos handlers RPC con el lock tomado, así que cada
/// llamada ve y deja el ledger en un estado consistente.
#[derive(Debug)]
pub struct Coordinator {
    ledger: TaskLedger,
    phase: JobPhase,
    n_map: u32,
    n_reduce: u32,
    task_timeout: Duration,

    submitted_at: DateTime<Utc>,
    reducing_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    reassignments: u64,
    rejected_reports: u64,
}

impl Coordinator {
    pub fn new(inputs: Vec<String>, n_reduce: u32, task_timeout: Duration) -> Self {
        let ledger = TaskLedger::new(inputs, n_reduce);
        let n_map = ledger.count(TaskKind::Map);
        let mut coordinator = Self {
            ledger,
            phase: JobPhase::Mapping,
            n_map,
            n_reduce,
            task_timeout,
            submitted_at: Utc::now(),
            reducing_at: None,
            finished_at: None,
            reassignments: 0,
            rejected_reports: 0,
        };
        // sin splits se pasa directo a REDUCING
        coordinator.advance_phase();
        coordinator
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == JobPhase::Done
    }

    /// Atiende "dame trabajo". Nunca bloquea: si no hay nada libre responde Wait.
    pub fn get_task(&mut self, worker_id: &str, now: Instant) -> TaskAssignmentResponse {
        self.advance_phase();

        let kind = match self.phase {
            JobPhase::Done => return TaskAssignmentResponse::Exit,
            JobPhase::Mapping => TaskKind::Map,
            JobPhase::Reducing => TaskKind::Reduce,
        };

        let expired = self.ledger.sweep_timeouts(kind, now, self.task_timeout);
        self.reassignments += expired.len() as u64;

        let Some(index) = self.ledger.next_idle(kind) else {
            return TaskAssignmentResponse::Wait;
        };

        if !self.ledger.mark_in_progress(kind, index, worker_id, now) {
            return TaskAssignmentResponse::Wait;
        }

        info!("asignando {:?} {} al worker {}", kind, index, worker_id);
        self.assignment(kind, index)
    }

    fn assignment(&self, kind: TaskKind, index: TaskIndex) -> TaskAssignmentResponse {
        match kind {
            TaskKind::Map => TaskAssignmentResponse::Map {
                task_index: index,
                input_path: self
                    .ledger
                    .get(kind, index)
                    .and_then(|t| t.input_path.clone())
                    .unwrap_or_default(),
                reduce_bucket_count: self.n_reduce,
            },
            TaskKind::Reduce => TaskAssignmentResponse::Reduce {
                task_index: index,
                map_task_count: self.n_map,
            },
        }
    }

    /// Atiende "terminé". Si con esto se completa la fase, avanza en la misma llamada.
    pub fn complete_task(
        &mut self,
        worker_id: &str,
        kind: TaskKind,
        index: TaskIndex,
        artifacts: Vec<String>,
    ) -> CompletionOutcome {
        let outcome = self.ledger.mark_completed(kind, index, worker_id, artifacts);

        match outcome {
            CompletionOutcome::Accepted => {
                info!("worker {} completó {:?} {}", worker_id, kind, index);
                self.advance_phase();
            }
            CompletionOutcome::Rejected => self.rejected_reports += 1,
            CompletionOutcome::Duplicate | CompletionOutcome::UnknownTask => {}
        }

        outcome
    }

    fn advance_phase(&mut self) {
        loop {
            let next = match self.phase {
                JobPhase::Mapping if self.ledger.is_phase_done(TaskKind::Map) => {
                    self.reducing_at = Some(Utc::now());
                    JobPhase::Reducing
                }
                JobPhase::Reducing if self.ledger.is_phase_done(TaskKind::Reduce) => {
                    self.finished_at = Some(Utc::now());
                    JobPhase::Done
                }
                _ => return,
            };
            info!("job pasa de {:?} a {:?}", self.phase, next);
            self.phase = next;
        }
    }

    pub fn job_info(&self) -> JobInfo {
        JobInfo {
            phase: self.phase,
            map_task_count: self.n_map,
            reduce_bucket_count: self.n_reduce,
            task_timeout_secs: self.task_timeout.as_secs(),
            map: self.ledger.progress(TaskKind::Map),
            reduce: self.ledger.progress(TaskKind::Reduce),
            submitted_at: self.submitted_at,
            reducing_at: self.reducing_at,
            finished_at: self.finished_at,
            reassignments: self.reassignments,
            rejected_reports: self.rejected_reports,
        }
    }

    pub fn task_infos(&self) -> Vec<TaskInfo> {
        self.ledger.task_infos()
    }
}
