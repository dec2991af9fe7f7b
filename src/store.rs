//! Armazenamento de registros de clientes indexado por `id_cliente`.
//!
//! A planilha é apenas um formato de importação; o estado de trabalho vive
//! em um [`ClientStore`], que preserva a ordem de inserção e substitui
//! registros sempre pela chave, nunca pela posição.

use std::collections::HashMap;

use crate::error::RecuperaError;
use crate::lead::ClientRecord;

/// Interface mínima de repositório de clientes.
pub trait ClientRepository {
    /// Todos os registros, na ordem de inserção.
    fn all(&self) -> &[ClientRecord];

    fn get(&self, id_cliente: &str) -> Option<&ClientRecord>;

    /// Substitui no lugar o registro com o mesmo `id_cliente`.
    fn update(&mut self, record: ClientRecord) -> Result<(), RecuperaError>;

    /// Troca todos os registros por `records`. Ids repetidos ficam com a
    /// primeira ocorrência.
    fn replace_all(&mut self, records: Vec<ClientRecord>);
}

#[derive(Debug, Clone, Default)]
pub struct ClientStore {
    records: Vec<ClientRecord>,
    index: HashMap<String, usize>,
}

impl ClientStore {
    pub fn new(records: Vec<ClientRecord>) -> Self {
        let mut store = Self::default();
        store.replace_all(records);
        store
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn into_records(self) -> Vec<ClientRecord> {
        self.records
    }
}

impl ClientRepository for ClientStore {
    fn all(&self) -> &[ClientRecord] {
        &self.records
    }

    fn get(&self, id_cliente: &str) -> Option<&ClientRecord> {
        self.index.get(id_cliente).map(|&i| &self.records[i])
    }

    fn update(&mut self, record: ClientRecord) -> Result<(), RecuperaError> {
        let &i = self
            .index
            .get(&record.id_cliente)
            .ok_or_else(|| RecuperaError::ClientNotFound(record.id_cliente.clone()))?;
        self.records[i] = record;
        Ok(())
    }

    fn replace_all(&mut self, records: Vec<ClientRecord>) {
        self.records.clear();
        self.index.clear();
        for record in records {
            if self.index.contains_key(&record.id_cliente) {
                tracing::warn!(id = %record.id_cliente, "duplicate client id ignored");
                continue;
            }
            self.index.insert(record.id_cliente.clone(), self.records.len());
            self.records.push(record);
        }
    }
}
