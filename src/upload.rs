//! Carga em lote de clientes a partir de um arquivo JSON ou CSV.
//!
//! Cada registro lido é enviado à API com `PUT /cliente/:id_cliente`.
//! Falhas de leitura interrompem a carga; falhas de envio são contadas e
//! a carga segue com o próximo registro.

use std::collections::HashMap;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Serialize;

use crate::api::ClientGateway;
use crate::error::RecuperaError;
use crate::lead::ClientRecord;

/// Formatos aceitos na carga em lote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Json,
    Csv,
}

impl UploadFormat {
    pub fn from_path(path: &Path) -> Result<Self, RecuperaError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            _ => Err(RecuperaError::Parse(format!(
                "unsupported upload file {} (expected .json or .csv)",
                path.display()
            ))),
        }
    }
}

pub fn parse_json(content: &str) -> Result<Vec<ClientRecord>, RecuperaError> {
    let mut records: Vec<ClientRecord> =
        serde_json::from_str(content).map_err(|e| RecuperaError::Parse(e.to_string()))?;
    for record in &mut records {
        record.normalize();
    }
    Ok(records)
}

pub fn parse_csv(content: &[u8]) -> Result<Vec<ClientRecord>, RecuperaError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let headers = reader
        .headers()
        .map_err(|e| RecuperaError::Parse(e.to_string()))?
        .clone();

    let mut records = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let row = result.map_err(|e| RecuperaError::Parse(format!("row {}: {e}", line + 1)))?;
        let map: HashMap<String, String> = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        records.push(ClientRecord::from_row(&map));
    }
    Ok(records)
}

/// Lê o arquivo de carga e descarta registros sem `id_cliente`.
pub async fn read_upload_file(path: &Path) -> Result<Vec<ClientRecord>, RecuperaError> {
    let format = UploadFormat::from_path(path)?;
    let content = tokio::fs::read(path).await?;
    let records = match format {
        UploadFormat::Json => parse_json(&String::from_utf8_lossy(&content))?,
        UploadFormat::Csv => parse_csv(&content)?,
    };

    let total = records.len();
    let records: Vec<ClientRecord> = records
        .into_iter()
        .filter(|r| !r.id_cliente.trim().is_empty())
        .collect();
    if records.len() < total {
        tracing::warn!(
            dropped = total - records.len(),
            "records without id_cliente were ignored"
        );
    }
    Ok(records)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadSummary {
    pub sent: usize,
    /// `(id_cliente, erro)` de cada registro recusado pela API.
    pub failed: Vec<(String, String)>,
}

pub async fn upload<G: ClientGateway>(
    gateway: &G,
    records: &[ClientRecord],
    mut on_progress: impl FnMut(usize, &ClientRecord),
) -> UploadSummary {
    let mut summary = UploadSummary::default();
    for (i, record) in records.iter().enumerate() {
        on_progress(i, record);
        match gateway.update_client(record).await {
            Ok(()) => summary.sent += 1,
            Err(e) => {
                tracing::warn!(id = %record.id_cliente, "upload failed: {e}");
                summary.failed.push((record.id_cliente.clone(), e.to_string()));
            }
        }
    }
    tracing::info!(sent = summary.sent, failed = summary.failed.len(), "upload finished");
    summary
}
