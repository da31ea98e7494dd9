use anyhow::{anyhow, Context, Result};
use common::engine;
use common::{
    app_by_name, MapReduceApp, TaskAssignmentRequest, TaskAssignmentResponse,
    TaskCompleteRequest, TaskCompleteResponse, TaskKind, WorkerId,
    WorkerRegisterRequest, WorkerRegisterResponse,
};
use reqwest::Client;
use std::{env, path::PathBuf, sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{info, warn};

const DEFAULT_WAIT_MS: u64 = 500;
const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuración del worker, leída de variables de entorno:
/// - `MASTER_URL` (default http://localhost:8080)
/// - `MR_WORK_DIR` directorio compartido de intermedios y salidas (default ".")
/// - `MR_APP` aplicación a ejecutar: "wc" o "indexer" (default "wc")
/// - `MR_WAIT_MS` pausa tras un Wait (default 500)
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub master_url: String,
    pub work_dir: PathBuf,
    pub app_name: String,
    pub wait: Duration,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let wait_ms = match lookup("MR_WAIT_MS") {
            Some(s) => s
                .parse::<u64>()
                .with_context(|| format!("MR_WAIT_MS inválido: {}", s))?,
            None => DEFAULT_WAIT_MS,
        };

        Ok(Self {
            master_url: lookup("MASTER_URL")
                .unwrap_or_else(|| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            work_dir: PathBuf::from(lookup("MR_WORK_DIR").unwrap_or_else(|| ".".to_string())),
            app_name: lookup("MR_APP").unwrap_or_else(|| "wc".to_string()),
            wait: Duration::from_millis(wait_ms),
        })
    }
}

/// Cliente HTTP del protocolo con el master.
#[derive(Clone)]
pub struct MasterClient {
    client: Client,
    base_url: String,
}

impl MasterClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .context("no se pudo crear el cliente HTTP")?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub async fn register(&self, hostname: String) -> Result<WorkerId> {
        let url = format!("{}/api/v1/workers/register", self.base_url);
        let resp: WorkerRegisterResponse = self
            .client
            .post(&url)
            .json(&WorkerRegisterRequest { hostname })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.worker_id)
    }

    pub async fn next_task(&self, worker_id: &str) -> Result<TaskAssignmentResponse> {
        let url = format!("{}/api/v1/tasks/next", self.base_url);
        let assignment = self
            .client
            .post(&url)
            .json(&TaskAssignmentRequest {
                worker_id: worker_id.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(assignment)
    }

    /// Devuelve `ok` del master: false si el reporte fue rechazado.
    pub async fn complete_task(&self, req: &TaskCompleteRequest) -> Result<bool> {
        let url = format!("{}/api/v1/tasks/complete", self.base_url);
        let resp: TaskCompleteResponse = self
            .client
            .post(&url)
            .json(req)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.ok)
    }
}

/// Qué hizo el worker antes de salir.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkerSummary {
    pub maps: u32,
    pub reduces: u32,
    pub rejected: u32,
}

/// Loop principal del worker (configuración desde el entorno).
pub async fn run() -> Result<()> {
    let config = WorkerConfig::from_env()?;
    let summary = run_with(config).await?;
    info!(
        "worker terminado: {} maps, {} reduces, {} reportes rechazados",
        summary.maps, summary.reduces, summary.rejected
    );
    Ok(())
}

/// - Se registra en el master.
/// - Pide tareas hasta recibir Exit; con Wait duerme y vuelve a preguntar.
/// - Ejecuta cada tarea y la reporta.
///
/// Un error de E/S al ejecutar una tarea es fatal (el master la reasigna por timeout).
/// Si el master deja de responder, el worker sale.
pub async fn run_with(config: WorkerConfig) -> Result<WorkerSummary> {
    let app = app_by_name(&config.app_name)
        .ok_or_else(|| anyhow!("aplicación desconocida: {}", config.app_name))?;

    let master = MasterClient::new(&config.master_url)?;

    let hostname = hostname::get()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let worker_id = master
        .register(hostname)
        .await
        .with_context(|| format!("no se pudo registrar en {}", config.master_url))?;
    info!(
        "worker {} registrado contra {} (app={}, work_dir={})",
        worker_id,
        config.master_url,
        config.app_name,
        config.work_dir.display()
    );

    let mut summary = WorkerSummary::default();

    loop {
        let assignment = match master.next_task(&worker_id).await {
            Ok(a) => a,
            Err(e) => {
                warn!("no se pudo pedir tarea al master ({:#}); saliendo", e);
                return Ok(summary);
            }
        };

        let (kind, index) = match &assignment {
            TaskAssignmentResponse::Exit => {
                info!("el master indica que el job terminó");
                return Ok(summary);
            }
            TaskAssignmentResponse::Wait => {
                sleep(config.wait).await;
                continue;
            }
            TaskAssignmentResponse::Map { task_index, input_path, .. } => {
                info!("tengo map {} ({})", task_index, input_path);
                (TaskKind::Map, *task_index)
            }
            TaskAssignmentResponse::Reduce { task_index, map_task_count } => {
                info!("tengo reduce {} ({} intermedios)", task_index, map_task_count);
                (TaskKind::Reduce, *task_index)
            }
        };

        let artifacts = execute(app.clone(), assignment, config.work_dir.clone())
            .await
            .with_context(|| format!("falló la tarea {:?} {}", kind, index))?;

        let req = TaskCompleteRequest {
            worker_id: worker_id.clone(),
            task_type: kind,
            task_index: index,
            artifacts,
        };

        match master.complete_task(&req).await {
            Ok(true) => match kind {
                TaskKind::Map => summary.maps += 1,
                TaskKind::Reduce => summary.reduces += 1,
            },
            Ok(false) => {
                warn!("el master rechazó el reporte de {:?} {}", kind, index);
                summary.rejected += 1;
            }
            Err(e) => {
                warn!("no se pudo reportar {:?} {} ({:#}); saliendo", kind, index, e);
                return Ok(summary);
            }
        }
    }
}

/// Ejecuta la tarea en un hilo de bloqueo y devuelve los artifacts producidos.
async fn execute(
    app: Arc<dyn MapReduceApp>,
    assignment: TaskAssignmentResponse,
    work_dir: PathBuf,
) -> Result<Vec<String>> {
    let handle = tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
        match assignment {
            TaskAssignmentResponse::Map {
                task_index,
                input_path,
                reduce_bucket_count,
            } => Ok(engine::execute_map(
                app.as_ref(),
                &input_path,
                task_index,
                reduce_bucket_count,
                &work_dir,
            )?),
            TaskAssignmentResponse::Reduce {
                task_index,
                map_task_count,
            } => {
                let out =
                    engine::execute_reduce(app.as_ref(), task_index, map_task_count, &work_dir)?;
                Ok(vec![out])
            }
            other => Err(anyhow!("asignación sin tarea: {:?}", other)),
        }
    });

    handle.await.context("la tarea entró en pánico")?
}
