use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use common::{
    JobInfo, TaskAssignmentRequest, TaskAssignmentResponse, TaskCompleteRequest,
    TaskCompleteResponse, TaskInfo, WorkerInfo, WorkerRegisterRequest, WorkerRegisterResponse,
};
use std::time::{Instant, SystemTime};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::ledger::CompletionOutcome;
use crate::state::{AppState, WorkerMeta};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/job", get(get_job))
        .route("/api/v1/tasks", get(list_tasks))
        .route("/api/v1/workers", get(list_workers))
        .route("/api/v1/workers/register", post(register_worker))
        .route("/api/v1/tasks/next", post(assign_task))
        .route("/api/v1/tasks/complete", post(complete_task))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// Estado global del job
async fn get_job(State(state): State<AppState>) -> Json<JobInfo> {
    let coordinator = state.coordinator.lock().unwrap();
    Json(coordinator.job_info())
}

// Estado de cada tarea (map primero, después reduce)
async fn list_tasks(State(state): State<AppState>) -> Json<Vec<TaskInfo>> {
    let coordinator = state.coordinator.lock().unwrap();
    Json(coordinator.task_infos())
}

// Registra un worker nuevo y le da una identidad opaca
async fn register_worker(
    State(state): State<AppState>,
    Json(req): Json<WorkerRegisterRequest>,
) -> Json<WorkerRegisterResponse> {
    let worker_id = uuid::Uuid::new_v4().to_string();

    {
        let mut workers = state.workers.lock().unwrap();
        workers.insert(worker_id.clone(), WorkerMeta::new(req.hostname.clone()));
    }

    info!("worker registrado: {} (host={})", worker_id, req.hostname);
    Json(WorkerRegisterResponse { worker_id })
}

// Asigna la siguiente tarea, o Wait / Exit
async fn assign_task(
    State(state): State<AppState>,
    Json(req): Json<TaskAssignmentRequest>,
) -> Json<TaskAssignmentResponse> {
    let assignment = {
        let mut coordinator = state.coordinator.lock().unwrap();
        coordinator.get_task(&req.worker_id, Instant::now())
    };

    match &assignment {
        TaskAssignmentResponse::Map { .. } | TaskAssignmentResponse::Reduce { .. } => {
            state.touch_worker(&req.worker_id, |meta| meta.tasks_assigned += 1);
        }
        TaskAssignmentResponse::Wait => {
            debug!("worker {} pidió tarea pero no hay libres", req.worker_id);
            state.touch_worker(&req.worker_id, |_| {});
        }
        TaskAssignmentResponse::Exit => {
            state.touch_worker(&req.worker_id, |_| {});
        }
    }

    Json(assignment)
}

// Worker reporta que terminó una tarea
async fn complete_task(
    State(state): State<AppState>,
    Json(req): Json<TaskCompleteRequest>,
) -> Result<Json<TaskCompleteResponse>, StatusCode> {
    let outcome = {
        let mut coordinator = state.coordinator.lock().unwrap();
        coordinator.complete_task(&req.worker_id, req.task_type, req.task_index, req.artifacts)
    };

    match outcome {
        CompletionOutcome::UnknownTask => return Err(StatusCode::NOT_FOUND),
        CompletionOutcome::Accepted => {
            state.touch_worker(&req.worker_id, |meta| meta.tasks_completed += 1);
        }
        CompletionOutcome::Duplicate => state.touch_worker(&req.worker_id, |_| {}),
        CompletionOutcome::Rejected => {
            warn!(
                "reporte de {} para {:?} {} rechazado",
                req.worker_id, req.task_type, req.task_index
            );
            state.touch_worker(&req.worker_id, |meta| meta.reports_rejected += 1);
        }
    }

    Ok(Json(TaskCompleteResponse {
        ok: outcome.is_ok(),
    }))
}

async fn list_workers(State(state): State<AppState>) -> Json<Vec<WorkerInfo>> {
    let now = SystemTime::now();
    let workers = state.workers.lock().unwrap();

    let mut out: Vec<WorkerInfo> = workers
        .iter()
        .map(|(wid, meta)| WorkerInfo {
            worker_id: wid.clone(),
            hostname: meta.hostname.clone(),
            registered_at: meta.registered_at,
            last_seen_secs_ago: now
                .duration_since(meta.last_seen)
                .unwrap_or_default()
                .as_secs(),
            tasks_assigned: meta.tasks_assigned,
            tasks_completed: meta.tasks_completed,
            reports_rejected: meta.reports_rejected,
        })
        .collect();
    out.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));

    Json(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Coordinator;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use common::JobPhase;
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state(n_map: usize, n_reduce: u32) -> AppState {
        let inputs = (0..n_map).map(|i| format!("pg-{}.txt", i)).collect();
        AppState::new(Coordinator::new(inputs, n_reduce, Duration::from_secs(10)))
    }

    async fn call<T: DeserializeOwned>(
        state: &AppState,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Option<T>) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = build_router(state.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let parsed = serde_json::from_slice(&bytes).ok();
        (status, parsed)
    }

    #[tokio::test]
    async fn health_responde_ok() {
        let state = test_state(1, 1);
        let resp = build_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_devuelve_ids_distintos() {
        let state = test_state(1, 1);
        let body = json!({"hostname": "nodo-1"});

        let (s1, r1) =
            call::<WorkerRegisterResponse>(&state, "POST", "/api/v1/workers/register", Some(body.clone())).await;
        let (_, r2) =
            call::<WorkerRegisterResponse>(&state, "POST", "/api/v1/workers/register", Some(body)).await;

        assert_eq!(s1, StatusCode::OK);
        assert_ne!(r1.unwrap().worker_id, r2.unwrap().worker_id);

        let (_, workers) = call::<Vec<WorkerInfo>>(&state, "GET", "/api/v1/workers", None).await;
        let workers = workers.unwrap();
        assert_eq!(workers.len(), 2);
        assert!(workers.iter().all(|w| w.hostname == "nodo-1"));
    }

    #[tokio::test]
    async fn protocolo_completo_por_http() {
        let state = test_state(1, 1);

        let (_, a) = call::<Value>(&state, "POST", "/api/v1/tasks/next", Some(json!({"worker_id": "w1"}))).await;
        assert_eq!(
            a.unwrap(),
            json!({"task_type": "Map", "task_index": 0, "input_path": "pg-0.txt", "reduce_bucket_count": 1})
        );

        let (_, wait) = call::<Value>(&state, "POST", "/api/v1/tasks/next", Some(json!({"worker_id": "w2"}))).await;
        assert_eq!(wait.unwrap(), json!({"task_type": "Wait"}));

        let (status, done) = call::<TaskCompleteResponse>(
            &state,
            "POST",
            "/api/v1/tasks/complete",
            Some(json!({"worker_id": "w1", "task_type": "Map", "task_index": 0, "artifacts": ["temp-mr-0-0"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(done.unwrap().ok);

        let (_, job) = call::<JobInfo>(&state, "GET", "/api/v1/job", None).await;
        assert_eq!(job.unwrap().phase, JobPhase::Reducing);

        let (_, r) = call::<Value>(&state, "POST", "/api/v1/tasks/next", Some(json!({"worker_id": "w2"}))).await;
        assert_eq!(
            r.unwrap(),
            json!({"task_type": "Reduce", "task_index": 0, "map_task_count": 1})
        );

        call::<TaskCompleteResponse>(
            &state,
            "POST",
            "/api/v1/tasks/complete",
            Some(json!({"worker_id": "w2", "task_type": "Reduce", "task_index": 0, "artifacts": ["mr-out-0"]})),
        )
        .await;

        let (_, exit) = call::<Value>(&state, "POST", "/api/v1/tasks/next", Some(json!({"worker_id": "w1"}))).await;
        assert_eq!(exit.unwrap(), json!({"task_type": "Exit"}));

        let (_, tasks) = call::<Vec<TaskInfo>>(&state, "GET", "/api/v1/tasks", None).await;
        let tasks = tasks.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].artifacts, vec!["mr-out-0".to_string()]);
    }

    #[tokio::test]
    async fn reporte_de_intruso_devuelve_ok_false() {
        let state = test_state(1, 1);
        call::<Value>(&state, "POST", "/api/v1/tasks/next", Some(json!({"worker_id": "w1"}))).await;

        let (status, resp) = call::<TaskCompleteResponse>(
            &state,
            "POST",
            "/api/v1/tasks/complete",
            Some(json!({"worker_id": "otro", "task_type": "Map", "task_index": 0})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(!resp.unwrap().ok);
        let (_, job) = call::<JobInfo>(&state, "GET", "/api/v1/job", None).await;
        let job = job.unwrap();
        assert_eq!(job.rejected_reports, 1);
        assert_eq!(job.map.in_progress, 1);
    }

    #[tokio::test]
    async fn reporte_de_tarea_inexistente_es_404() {
        let state = test_state(1, 1);
        let (status, _) = call::<Value>(
            &state,
            "POST",
            "/api/v1/tasks/complete",
            Some(json!({"worker_id": "w1", "task_type": "Reduce", "task_index": 42})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
