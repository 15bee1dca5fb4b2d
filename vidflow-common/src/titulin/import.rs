//! Training-example CSV import and export

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};

use crate::models::TrainingExample;
use crate::{Error, Result};

const TITLE_HEADERS: [&str; 3] = ["título", "titulo", "title"];
const EVERGREEN_HEADERS: [&str; 3] = ["evergreen", "es_evergreen", "is_evergreen"];
const TRUTHY: [&str; 6] = ["true", "sí", "si", "yes", "1", "verdadero"];

/// A row accepted from an imported file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedExample {
    pub title: String,
    pub is_evergreen: bool,
}

/// Serialize training examples as `ID,Título,Evergreen,Fecha de Creación`
pub fn export_training_examples(examples: &[TrainingExample]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(["ID", "Título", "Evergreen", "Fecha de Creación"])?;
    for example in examples {
        writer.write_record([
            example.id.to_string(),
            example.title.clone(),
            if example.is_evergreen { "Sí" } else { "No" }.to_string(),
            example.created_at.to_rfc3339(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("Failed to flush CSV: {}", e)))
}

fn find_column(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.contains(&h.trim_start_matches('\u{feff}').to_lowercase().as_str()))
}

fn is_truthy(value: &str) -> bool {
    TRUTHY.contains(&value.trim().to_lowercase().as_str())
}

/// Parse an uploaded CSV of training examples
///
/// The header row must name a title column and an evergreen column (any
/// of the accepted aliases, case-insensitive). Rows with a blank title are
/// skipped. Fails when no usable row remains.
pub fn parse_training_examples(content: &[u8]) -> Result<Vec<ImportedExample>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content);

    let headers = reader.headers()?.clone();
    let (title_col, evergreen_col) = match (
        find_column(&headers, &TITLE_HEADERS),
        find_column(&headers, &EVERGREEN_HEADERS),
    ) {
        (Some(t), Some(e)) => (t, e),
        _ => {
            return Err(Error::InvalidInput(
                "El archivo debe tener columnas de título y evergreen".to_string(),
            ))
        }
    };

    let mut imported = Vec::new();
    for record in reader.records() {
        let record = record?;
        let title = record.get(title_col).unwrap_or("").trim();
        if title.is_empty() {
            continue;
        }
        imported.push(ImportedExample {
            title: title.to_string(),
            is_evergreen: record.get(evergreen_col).is_some_and(is_truthy),
        });
    }

    if imported.is_empty() {
        return Err(Error::InvalidInput(
            "No se encontraron registros válidos para importar".to_string(),
        ));
    }
    Ok(imported)
}
