use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::indexer::Indexer;
use crate::wordcount::WordCount;

/// Par clave/valor que emite una función map.
///
/// Los nombres de campo en JSON ("Key", "Value") son los del formato de
/// archivos intermedios que comparten todos los workers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Funciones de usuario de un job MapReduce.
///
/// `reduce` no puede asumir ningún orden en `values`.
pub trait MapReduceApp: Send + Sync {
    fn map(&self, input_name: &str, contents: &str) -> Vec<KeyValue>;
    fn reduce(&self, key: &str, values: &[String]) -> String;
}

/// Busca una aplicación por nombre ("wc", "indexer").
pub fn app_by_name(name: &str) -> Option<Arc<dyn MapReduceApp>> {
    match name {
        "wc" | "wordcount" => Some(Arc::new(WordCount)),
        "indexer" => Some(Arc::new(Indexer)),
        _ => None,
    }
}
