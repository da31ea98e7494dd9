use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use uuid::Uuid;

/// Nombre del archivo intermedio que produce el map `map_index` para el bucket `reduce_index`.
///
/// Es el contrato entre tareas: mappers y reducers lo calculan por separado.
pub fn intermediate_name(map_index: u32, reduce_index: u32) -> String {
    format!("temp-mr-{}-{}", map_index, reduce_index)
}

/// Nombre del archivo de salida del reduce `reduce_index`.
pub fn output_name(reduce_index: u32) -> String {
    format!("mr-out-{}", reduce_index)
}

/// Escribe `path` de forma atómica: primero a un temporal único en el mismo
/// directorio y después `rename` sobre el nombre final.
///
/// Una re-ejecución reemplaza el archivo entero; un lector nunca ve un archivo a medias.
pub fn write_atomically<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("ruta sin nombre de archivo: {}", path.display()),
            )
        })?;
    let tmp_path = dir.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    let result = (|| -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        fill(&mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path)
}
