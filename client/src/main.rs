use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use common::engine::read_output;
use common::{JobInfo, JobPhase, TaskInfo, TaskProgress, WorkerInfo};
use reqwest::Client;
use std::{
    collections::BTreeMap,
    env, fs,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

/// - Local: default http://localhost:8080
/// - En Docker: MASTER_URL=http://master:8080
fn master_base_url() -> String {
    env::var("MASTER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI simple para consultar al master y juntar resultados")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estado global del job
    Status,
    /// Estado de cada tarea
    Tasks,
    /// Workers registrados y sus métricas
    Workers,
    /// Consulta el estado cada N segundos hasta que el job termine
    Watch {
        #[arg(long, default_value_t = 2)]
        interval_secs: u64,
    },
    /// Junta los mr-out-* de un directorio en un solo archivo ordenado por clave
    Merge {
        #[arg(value_name = "WORK_DIR")]
        work_dir: PathBuf,

        #[arg(long, default_value = "mr-out-merged")]
        output: PathBuf,
    },
}

fn progress_line(label: &str, p: &TaskProgress) -> String {
    format!(
        "  {:<7}: total={}, idle={}, en curso={}, completadas={}",
        label,
        p.total(),
        p.idle,
        p.in_progress,
        p.completed
    )
}

fn print_job(job: &JobInfo) {
    println!("Job:");
    println!("  fase: {:?}", job.phase);
    println!(
        "  maps={} reduces={} timeout={}s",
        job.map_task_count, job.reduce_bucket_count, job.task_timeout_secs
    );
    println!("{}", progress_line("map", &job.map));
    println!("{}", progress_line("reduce", &job.reduce));
    println!(
        "  reasignaciones={}, reportes rechazados={}",
        job.reassignments, job.rejected_reports
    );
    println!("  iniciado: {}", job.submitted_at);
    if let Some(ref t) = job.reducing_at {
        println!("  reduce desde: {}", t);
    }
    if let Some(ref t) = job.finished_at {
        println!("  finalizado: {}", t);
    }
}

async fn fetch_job(client: &Client, base_url: &str) -> Result<JobInfo> {
    let url = format!("{}/api/v1/job", base_url);
    let job = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("no se pudo contactar al master en {}", base_url))?
        .error_for_status()?
        .json()
        .await?;
    Ok(job)
}

/// Junta todas las salidas `mr-out-<n>` de `work_dir` en `output`, ordenadas por clave.
/// Cada clave aparece en un solo bucket; si aparece en dos es un error.
fn merge_outputs(work_dir: &Path, output: &Path) -> Result<usize> {
    let mut merged: BTreeMap<String, String> = BTreeMap::new();

    let mut paths: Vec<PathBuf> = fs::read_dir(work_dir)
        .with_context(|| format!("no se pudo leer {}", work_dir.display()))?
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix("mr-out-"))
                .map(|suffix| suffix.parse::<u32>().is_ok())
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    for path in &paths {
        for (key, value) in read_output(path)? {
            if merged.insert(key.clone(), value).is_some() {
                bail!("la clave {} aparece en más de un bucket ({})", key, path.display());
            }
        }
    }

    let mut out = fs::File::create(output)
        .with_context(|| format!("no se pudo crear {}", output.display()))?;
    for (key, value) in &merged {
        writeln!(out, "{} {}", key, value)?;
    }

    Ok(merged.len())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = master_base_url();

    match cli.command {
        Commands::Status => {
            let job = fetch_job(&client, &base_url).await?;
            print_job(&job);
        }

        Commands::Tasks => {
            let url = format!("{}/api/v1/tasks", base_url);
            let tasks: Vec<TaskInfo> = client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            for t in tasks {
                println!(
                    "{:?} {:>4}  {:<11?}  intentos={}  dueño={}  completada_por={}",
                    t.kind,
                    t.index,
                    t.state,
                    t.attempts,
                    t.owner.as_deref().unwrap_or("-"),
                    t.completed_by.as_deref().unwrap_or("-"),
                );
                if let Some(ref input) = t.input_path {
                    println!("           input: {}", input);
                }
            }
        }

        Commands::Workers => {
            let url = format!("{}/api/v1/workers", base_url);
            let resp = client.get(&url).send().await?;
            if resp.status().is_success() {
                let workers: Vec<WorkerInfo> = resp.json().await?;
                if workers.is_empty() {
                    println!("No hay workers registrados.");
                } else {
                    for w in workers {
                        println!("Worker {}", w.worker_id);
                        println!("  host           : {}", w.hostname);
                        println!("  registrado     : {}", w.registered_at);
                        println!("  last_seen      : {} s ago", w.last_seen_secs_ago);
                        println!(
                            "  tareas         : asignadas={}, ok={}, rechazadas={}",
                            w.tasks_assigned, w.tasks_completed, w.reports_rejected
                        );
                        println!();
                    }
                }
            } else {
                println!(
                    "Error consultando /api/v1/workers (status {})",
                    resp.status()
                );
            }
        }

        Commands::Watch { interval_secs } => loop {
            let job = fetch_job(&client, &base_url).await?;
            println!(
                "{:?}: map {}/{} reduce {}/{}",
                job.phase,
                job.map.completed,
                job.map.total(),
                job.reduce.completed,
                job.reduce.total()
            );
            if job.phase == JobPhase::Done {
                break;
            }
            tokio::time::sleep(Duration::from_secs(interval_secs)).await;
        },

        Commands::Merge { work_dir, output } => {
            let n = merge_outputs(&work_dir, &output)?;
            println!("{} claves escritas en {}", n, output.display());
        }
    }

    Ok(())
}
