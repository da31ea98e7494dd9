use anyhow::{Context, Result};
use clap::Parser;
use glob::glob;
use std::time::Duration;
use tracing::warn;

/// Configuración del master. Cada flag se puede dar también por variable de entorno.
#[derive(Parser, Debug, Clone)]
#[command(name = "master")]
#[command(about = "Coordinator de un job MapReduce: reparte tareas y detecta workers caídos")]
pub struct MasterConfig {
    /// Archivos o patrones glob de entrada; cada archivo es un split (una tarea map)
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Cantidad de tareas reduce (buckets)
    #[arg(long, env = "MR_N_REDUCE", default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub n_reduce: u32,

    /// Segundos que puede tardar una tarea antes de reasignarla
    #[arg(long, env = "MR_TASK_TIMEOUT_SECS", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub task_timeout_secs: u64,

    /// Segundos que el master sigue vivo después de DONE
    #[arg(long, env = "MR_LINGER_SECS", default_value_t = 3)]
    pub linger_secs: u64,

    /// Dirección donde escucha el server HTTP
    #[arg(long, env = "MR_BIND", default_value = "0.0.0.0:8080")]
    pub bind: String,
}

impl MasterConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    pub fn linger(&self) -> Duration {
        Duration::from_secs(self.linger_secs)
    }
}

/// Expande los patrones de entrada a una lista de archivos (orden de los patrones,
/// y dentro de cada patrón orden alfabético). El índice de cada archivo es su tarea map.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let mut matched: Vec<String> = glob(pattern)
            .with_context(|| format!("patrón de entrada inválido: {}", pattern))?
            .flatten()
            .filter(|p| p.is_file())
            .map(|p| p.to_string_lossy().to_string())
            .collect();

        if matched.is_empty() {
            warn!("el patrón {} no coincide con ningún archivo", pattern);
        }

        matched.sort();
        for f in matched {
            if !files.contains(&f) {
                files.push(f);
            }
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs, path::PathBuf};

    fn temp_dir(sub: &str) -> PathBuf {
        let base = env::temp_dir().join("mr_config_tests").join(sub);
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).unwrap();
        base
    }

    #[test]
    fn expand_inputs_ordena_y_deduplica() {
        let tmp = temp_dir("expand");
        for name in ["pg-b.txt", "pg-a.txt", "otro.md"] {
            fs::write(tmp.join(name), "x").unwrap();
        }
        fs::create_dir_all(tmp.join("pg-dir.txt")).unwrap();

        let pattern = tmp.join("pg-*.txt").to_string_lossy().to_string();
        let explicit = tmp.join("pg-a.txt").to_string_lossy().to_string();

        let files = expand_inputs(&[pattern, explicit]).unwrap();

        let names: Vec<String> = files
            .iter()
            .map(|f| PathBuf::from(f).file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["pg-a.txt", "pg-b.txt"]);
    }

    #[test]
    fn expand_inputs_patron_invalido_es_error() {
        assert!(expand_inputs(&["[".to_string()]).is_err());
    }

    #[test]
    fn expand_inputs_sin_coincidencias_devuelve_vacio() {
        let tmp = temp_dir("empty");
        let pattern = tmp.join("*.txt").to_string_lossy().to_string();
        assert!(expand_inputs(&[pattern]).unwrap().is_empty());
    }

    #[test]
    fn config_valida_n_reduce() {
        let cfg = MasterConfig::try_parse_from(["master", "--n-reduce", "2", "a.txt", "b.txt"]).unwrap();
        assert_eq!(cfg.n_reduce, 2);
        assert_eq!(cfg.inputs, vec!["a.txt", "b.txt"]);
        assert_eq!(cfg.task_timeout(), Duration::from_secs(10));

        assert!(MasterConfig::try_parse_from(["master", "--n-reduce", "0"]).is_err());
    }

    #[test]
    fn config_rechaza_timeout_cero() {
        assert!(MasterConfig::try_parse_from(["master", "--task-timeout-secs", "0", "a.txt"]).is_err());

        let cfg = MasterConfig::try_parse_from(["master", "--task-timeout-secs", "1", "a.txt"]).unwrap();
        assert_eq!(cfg.task_timeout(), Duration::from_secs(1));
    }
}
