use crate::data::{Error, TargetTable, BOM};
use std::{fs, path::Path};
use tempfile::NamedTempFile;

/// Basic CSV exporter for a `TargetTable`: BOM if the source had one, header,
/// then rows, quoting only where needed and ending lines with CRLF.
pub(crate) fn write_target<W: std::io::Write>(
    mut writer: W,
    table: &TargetTable,
    delimiter: u8,
) -> Result<(), Error> {
    if table.bom {
        writer.write_all(BOM).map_err(Error::WriteFailure)?;
    }
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);
    wtr.write_record(&table.headers)
        .map_err(|e| Error::WriteFailure(e.into()))?;
    for row in &table.rows {
        wtr.write_record(&row.fields)
            .map_err(|e| Error::WriteFailure(e.into()))?;
    }
    wtr.flush().map_err(Error::WriteFailure)?;
    Ok(())
}

/// Replaces the file at `path` with `table`. The data goes to a temporary file
/// in the same directory which is then renamed over `path`, so `path` holds
/// either the old or the new content. The temporary file is removed on error.
pub(crate) fn replace_target(path: &Path, table: &TargetTable, delimiter: u8) -> Result<(), Error> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(Error::WriteFailure)?;
    write_target(tmp.as_file_mut(), table, delimiter)?;
    if let Ok(metadata) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(Error::WriteFailure)?;
    }
    tmp.as_file().sync_all().map_err(Error::WriteFailure)?;
    tmp.persist(path).map_err(|e| Error::WriteFailure(e.error))?;
    Ok(())
}
