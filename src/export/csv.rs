use crate::error::ExportError;
use crate::export::ModelSummary;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes one row per (model, type) pair.
pub fn write_types_csv<W: Write>(summaries: &[ModelSummary], out: W) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);

    writer.write_record(["Model", "Category", "Type", "Count"])?;

    for summary in summaries {
        for row in &summary.types {
            writer.write_record([
                summary.model.as_str(),
                row.category,
                row.type_tag.as_str(),
                row.count.to_string().as_str(),
            ])?;
        }
    }

    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })?;

    Ok(())
}

pub fn export_types_csv<P: AsRef<Path>>(
    summaries: &[ModelSummary],
    path: P,
) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;
    write_types_csv(summaries, file)
}
