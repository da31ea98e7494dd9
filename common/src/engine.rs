use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, BufRead, BufReader, Write},
    path::Path,
};

use tracing::debug;

use crate::app::{KeyValue, MapReduceApp};
use crate::files::{intermediate_name, output_name, write_atomically};
use crate::partition::bucket;

/* =========================
   Shuffle a buckets
   ========================= */

/// Reparte los pares en `n_reduce` buckets según `bucket(key)`.
/// Siempre devuelve exactamente `n_reduce` vectores (algunos pueden estar vacíos).
pub fn partition_records(records: Vec<KeyValue>, n_reduce: u32) -> Vec<Vec<KeyValue>> {
    let mut buckets: Vec<Vec<KeyValue>> = (0..n_reduce).map(|_| Vec::new()).collect();
    for kv in records {
        let r = bucket(&kv.key, n_reduce) as usize;
        buckets[r].push(kv);
    }
    buckets
}

/// Escribe un archivo intermedio: un objeto JSON por línea.
pub fn write_intermediate(path: &Path, records: &[KeyValue]) -> io::Result<()> {
    write_atomically(path, |writer| {
        for kv in records {
            serde_json::to_writer(&mut *writer, kv)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    })
}

/// Lee un archivo intermedio. Si no existe es un error (NotFound) que nombra el archivo.
pub fn read_intermediate(path: &Path) -> io::Result<Vec<KeyValue>> {
    let file = File::open(path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("no se pudo abrir intermedio {}: {e}", path.display()),
        )
    })?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let kv: KeyValue = serde_json::from_str(&line).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("intermedio corrupto {}: {e}", path.display()),
            )
        })?;
        out.push(kv);
    }

    Ok(out)
}

/// Agrupa valores por clave. Las claves quedan ordenadas; el orden de los valores no importa.
pub fn group_by_key(records: Vec<KeyValue>) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for kv in records {
        grouped.entry(kv.key).or_default().push(kv.value);
    }
    grouped
}

/* =========================
   Ejecución de tareas
   ========================= */

/// Ejecuta una tarea map completa:
///
/// 1. Lee el split entero en memoria.
/// 2. Llama a `map` de la app.
/// 3. Reparte en `n_reduce` buckets.
/// 4. Escribe los `n_reduce` intermedios en `work_dir` (también los vacíos,
///    así el reduce siempre encuentra `n_map` archivos).
///
/// Devuelve los nombres de los intermedios escritos, en orden de bucket.
pub fn execute_map(
    app: &dyn MapReduceApp,
    input_path: &str,
    map_index: u32,
    n_reduce: u32,
    work_dir: &Path,
) -> io::Result<Vec<String>> {
    let contents = fs::read_to_string(input_path).map_err(|e| {
        io::Error::new(e.kind(), format!("no se pudo leer {}: {e}", input_path))
    })?;

    let kvs = app.map(input_path, &contents);
    debug!(
        "map {}: {} pares emitidos desde {}",
        map_index,
        kvs.len(),
        input_path
    );

    let buckets = partition_records(kvs, n_reduce);

    let mut artifacts = Vec::with_capacity(buckets.len());
    for (r, records) in buckets.iter().enumerate() {
        let name = intermediate_name(map_index, r as u32);
        write_intermediate(&work_dir.join(&name), records)?;
        artifacts.push(name);
    }

    Ok(artifacts)
}

/// Ejecuta una tarea reduce: junta el bucket `reduce_index` de los `n_map` mappers,
/// agrupa por clave, llama a `reduce` una vez por clave y escribe `mr-out-<r>`.
///
/// Devuelve el nombre del archivo de salida.
pub fn execute_reduce(
    app: &dyn MapReduceApp,
    reduce_index: u32,
    n_map: u32,
    work_dir: &Path,
) -> io::Result<String> {
    let mut records = Vec::new();
    for m in 0..n_map {
        let path = work_dir.join(intermediate_name(m, reduce_index));
        records.extend(read_intermediate(&path)?);
    }

    debug!(
        "reduce {}: {} pares leídos de {} intermedios",
        reduce_index,
        records.len(),
        n_map
    );

    let grouped = group_by_key(records);

    let name = output_name(reduce_index);
    write_atomically(&work_dir.join(&name), |writer| {
        for (key, values) in &grouped {
            let out = app.reduce(key, values);
            writeln!(writer, "{} {}", key, out)?;
        }
        Ok(())
    })?;

    Ok(name)
}

/// Lee un archivo de salida `"clave valor"` por línea.
pub fn read_output(path: &Path) -> io::Result<Vec<(String, String)>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .filter_map(|line| line.split_once(' '))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect())
}
