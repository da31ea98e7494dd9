use crate::app::{KeyValue, MapReduceApp};
use tracing::warn;

/// WordCount clásico: map emite (palabra, "1"), reduce suma los valores.
pub struct WordCount;

/// Separa en palabras: cualquier carácter que no sea alfanumérico o '_' corta.
pub fn tokenize(contents: &str) -> impl Iterator<Item = &str> {
    contents
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}

impl MapReduceApp for WordCount {
    fn map(&self, _input_name: &str, contents: &str) -> Vec<KeyValue> {
        tokenize(contents).map(|w| KeyValue::new(w, "1")).collect()
    }

    // Un valor que no es un conteo se descarta con warn, no se suma
    fn reduce(&self, key: &str, values: &[String]) -> String {
        let mut total: u64 = 0;
        let mut skipped = 0usize;
        for v in values {
            match v.parse::<u64>() {
                Ok(n) => total += n,
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("wordcount: {} valores inválidos descartados para la clave {:?}", skipped, key);
        }
        total.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_emite_un_par_por_token() {
        let kvs = WordCount.map("in.txt", "a b a");
        assert_eq!(
            kvs,
            vec![
                KeyValue::new("a", "1"),
                KeyValue::new("b", "1"),
                KeyValue::new("a", "1"),
            ]
        );
    }

    #[test]
    fn map_ignora_signos_de_puntuacion() {
        let words: Vec<&str> = tokenize("Hola, mundo!!  mundo_prueba\n").collect();
        assert_eq!(words, vec!["Hola", "mundo", "mundo_prueba"]);
    }

    #[test]
    fn map_sobre_entrada_vacia_no_emite_nada() {
        assert!(WordCount.map("vacio.txt", "").is_empty());
        assert!(WordCount.map("vacio.txt", "  ,.; \n").is_empty());
    }

    #[test]
    fn reduce_suma_los_valores() {
        let values = vec!["1".to_string(), "1".to_string(), "3".to_string()];
        assert_eq!(WordCount.reduce("a", &values), "5");
    }

    #[test]
    fn reduce_descarta_valores_que_no_son_conteos() {
        let values = vec!["2".to_string(), "basura".to_string(), "-1".to_string(), "1".to_string()];
        assert_eq!(WordCount.reduce("a", &values), "3");
    }
}
