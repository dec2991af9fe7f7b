//! Importação da planilha de clientes cancelados.
//!
//! A fonte pode ser uma URL (baixada com `reqwest`) ou um caminho local.
//! Só entram na fila as linhas com `motivo_cancelamento` preenchido.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use super::table::SheetTable;
use crate::error::RecuperaError;
use crate::lead::ClientRecord;

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Bytes do `.xlsx` lidos de uma URL ou de um arquivo local.
pub async fn fetch_workbook(source: &str) -> Result<Vec<u8>, RecuperaError> {
    if is_remote(source) {
        tracing::debug!(source, "downloading workbook");
        let response = reqwest::get(source).await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    } else {
        tracing::debug!(source, "reading workbook");
        Ok(tokio::fs::read(source).await?)
    }
}

/// Converte as linhas de dados e descarta as que não têm motivo de
/// cancelamento.
pub fn parse_clients(table: &SheetTable) -> Vec<ClientRecord> {
    let total = table.rows.len();
    let clients: Vec<ClientRecord> = table
        .row_maps()
        .iter()
        .map(ClientRecord::from_row)
        .filter(ClientRecord::has_cancellation_reason)
        .collect();
    tracing::info!(
        sheet = %table.name,
        rows = total,
        kept = clients.len(),
        "spreadsheet parsed"
    );
    clients
}

/// Cache das planilhas lidas durante uma execução.
///
/// Guarda os bytes de cada fonte e os clientes de cada aba já convertida.
/// Várias abas da mesma fonte, ou a importação seguida da regravação do
/// `assignedTo`, fazem um único download.
#[derive(Clone)]
pub struct SheetCache {
    /// Bytes do `.xlsx` por fonte (URL ou caminho).
    workbooks: Cache<String, Arc<Vec<u8>>>,
    /// Clientes já filtrados por `(fonte, aba)`.
    sheets: Cache<(String, String), Arc<Vec<ClientRecord>>>,
}

impl Default for SheetCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetCache {
    pub fn new() -> Self {
        Self {
            workbooks: Cache::builder()
                .max_capacity(8)
                .time_to_live(Duration::from_secs(300))
                .build(),
            sheets: Cache::builder()
                .max_capacity(32)
                .time_to_live(Duration::from_secs(300))
                .build(),
        }
    }

    pub async fn workbook(&self, source: &str) -> Result<Arc<Vec<u8>>, RecuperaError> {
        if let Some(hit) = self.workbooks.get(source).await {
            tracing::debug!(source, "workbook cache hit");
            return Ok(hit);
        }
        let bytes = Arc::new(fetch_workbook(source).await?);
        self.workbooks
            .insert(source.to_string(), Arc::clone(&bytes))
            .await;
        Ok(bytes)
    }

    pub async fn get(
        &self,
        source: &str,
        sheet: &str,
    ) -> Result<Arc<Vec<ClientRecord>>, RecuperaError> {
        let key = (source.to_string(), sheet.to_string());
        if let Some(hit) = self.sheets.get(&key).await {
            tracing::debug!(source, sheet, "sheet cache hit");
            return Ok(hit);
        }
        let bytes = self.workbook(source).await?;
        let table = SheetTable::read(&bytes, sheet)?;
        let clients = Arc::new(parse_clients(&table));
        self.sheets.insert(key, Arc::clone(&clients)).await;
        Ok(clients)
    }
}
