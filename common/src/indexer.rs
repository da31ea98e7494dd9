use std::collections::BTreeSet;

use crate::app::{KeyValue, MapReduceApp};
use crate::wordcount::tokenize;

/// Índice invertido: para cada palabra, en qué documentos aparece.
///
/// La salida de reduce es `"<n> doc1,doc2,..."` con los documentos ordenados.
pub struct Indexer;

impl MapReduceApp for Indexer {
    fn map(&self, input_name: &str, contents: &str) -> Vec<KeyValue> {
        let words: BTreeSet<&str> = tokenize(contents).collect();
        words
            .into_iter()
            .map(|w| KeyValue::new(w, input_name))
            .collect()
    }

    fn reduce(&self, _key: &str, values: &[String]) -> String {
        let docs: BTreeSet<&str> = values.iter().map(String::as_str).collect();
        let list: Vec<&str> = docs.into_iter().collect();
        format!("{} {}", list.len(), list.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_emite_cada_palabra_una_sola_vez_por_documento() {
        let kvs = Indexer.map("doc1", "x y x");
        assert_eq!(
            kvs,
            vec![KeyValue::new("x", "doc1"), KeyValue::new("y", "doc1")]
        );
    }

    #[test]
    fn reduce_ordena_y_deduplica_documentos() {
        let values = vec!["b.txt".to_string(), "a.txt".to_string(), "b.txt".to_string()];
        assert_eq!(Indexer.reduce("x", &values), "2 a.txt,b.txt");
    }
}
