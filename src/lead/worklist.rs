use std::fmt;

use serde::Serialize;

use super::client::{ClientRecord, ContactStatus};

/// Selo exibido ao lado de cada lead aceito.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusBadge {
    Recuperado,
    EmContato,
    NaoAtendeu,
    ContatoEncerrado,
    Pendente,
}

impl StatusBadge {
    pub fn for_client(client: &ClientRecord) -> Self {
        if client.recovered {
            return StatusBadge::Recuperado;
        }
        match client.contact_status {
            ContactStatus::EmContato => StatusBadge::EmContato,
            ContactStatus::NaoAtendeu => StatusBadge::NaoAtendeu,
            ContactStatus::ContatoEncerrado => StatusBadge::ContatoEncerrado,
            // normalize() já marca recovered, mas o status basta
            ContactStatus::Recuperado => StatusBadge::Recuperado,
            ContactStatus::NotStarted => StatusBadge::Pendente,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusBadge::Recuperado => "Recuperado",
            StatusBadge::EmContato => "Em Contato",
            StatusBadge::NaoAtendeu => "Não Atendeu",
            StatusBadge::ContatoEncerrado => "Contato Encerrado",
            StatusBadge::Pendente => "Pendente",
        }
    }
}

impl fmt::Display for StatusBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Linha da tabela de leads aceitos.
#[derive(Debug, Clone, Serialize)]
pub struct WorklistRow<'a> {
    pub client: &'a ClientRecord,
    pub badge: StatusBadge,
    /// Falso para leads recuperados ou encerrados.
    pub editable: bool,
}

/// Leads aceitos pelo atendente, na ordem da lista.
pub fn worklist<'a, I>(clients: I, agent: &str) -> Vec<WorklistRow<'a>>
where
    I: IntoIterator<Item = &'a ClientRecord>,
{
    clients
        .into_iter()
        .filter(|c| c.is_assigned_to(agent))
        .map(|client| WorklistRow {
            client,
            badge: StatusBadge::for_client(client),
            editable: !client.is_locked(),
        })
        .collect()
}
