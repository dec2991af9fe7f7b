//! Regrava o `assignedTo` de um cliente numa cópia da planilha de origem.
//!
//! Melhor esforço: sem merge, sem lock, sem nova tentativa. Quem chama só
//! registra o erro.

use std::path::{Path, PathBuf};

use calamine::Data;

use super::loader::SheetCache;
use super::table::SheetTable;
use crate::error::RecuperaError;

pub const ASSIGNED_TO_COLUMN: &str = "assignedTo";
pub const ID_COLUMN: &str = "id_cliente";
pub const DOWNLOAD_FILE_NAME: &str = "planilha_atualizada.xlsx";

/// Grava `assignedTo` na linha com `id_cliente == id`.
pub fn patch_table(table: &mut SheetTable, id: &str, agent: &str) -> Result<(), RecuperaError> {
    let row = table
        .find_row(ID_COLUMN, id)
        .ok_or_else(|| RecuperaError::ClientNotFound(id.to_string()))?;
    table.set_cell(row, ASSIGNED_TO_COLUMN, Data::String(agent.to_string()));
    Ok(())
}

/// Relê a aba `sheet` de `workbook` e devolve um novo `.xlsx` com a linha
/// alterada. As demais células saem com o tipo original.
pub fn patch_assigned_to(
    workbook: &[u8],
    sheet: &str,
    id: &str,
    agent: &str,
) -> Result<Vec<u8>, RecuperaError> {
    let mut table = SheetTable::read(workbook, sheet)?;
    patch_table(&mut table, id, agent)?;
    table.to_xlsx()
}

pub async fn write_download(
    bytes: &[u8],
    dir: &Path,
    file_name: &str,
) -> Result<PathBuf, RecuperaError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Regrava a planilha e salva a cópia em `download_dir`. Erros só vão
/// para o log.
pub async fn persist_assignment(
    cache: &SheetCache,
    source: &str,
    sheet: &str,
    id: &str,
    agent: &str,
    download_dir: &Path,
) -> Option<PathBuf> {
    let patched = match cache.workbook(source).await {
        Ok(bytes) => patch_assigned_to(&bytes, sheet, id, agent),
        Err(e) => Err(e),
    };
    let result = match patched {
        Ok(bytes) => write_download(&bytes, download_dir, DOWNLOAD_FILE_NAME).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(path) => {
            tracing::info!(id, agent, path = %path.display(), "spreadsheet updated");
            Some(path)
        }
        Err(e) => {
            tracing::error!(id, agent, "could not update spreadsheet: {e}");
            None
        }
    }
}
