use chrono::NaiveDate;

use super::client::{AssignmentStatus, ClientRecord, ContactStatus, format_date};

/// Regra da fila que escolheu o lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueRule {
    /// Lead livre, sem atendente.
    Available,
    /// Lead do próprio atendente ainda sem tentativa, ou que não atendeu
    /// na última ligação.
    Retry,
}

/// Lead oferecido ao atendente, junto com a regra que o escolheu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offer<'a> {
    pub client: &'a ClientRecord,
    pub rule: QueueRule,
}

/// Escolhe o próximo lead do atendente.
///
/// Leads livres vêm sempre antes das novas tentativas. Dentro de cada
/// regra a ordem é `score` decrescente; empates mantêm a ordem da lista.
/// Leads travados (recuperados ou encerrados) nunca são oferecidos.
pub struct LeadQueue;

impl LeadQueue {
    /// Próximo lead do atendente, ou `None` com a fila vazia.
    pub fn next<'a, I>(clients: I, agent: &str) -> Option<Offer<'a>>
    where
        I: IntoIterator<Item = &'a ClientRecord>,
    {
        Self::pending(clients, agent).into_iter().next()
    }

    /// Todos os leads que o atendente pode receber, na ordem da fila.
    pub fn pending<'a, I>(clients: I, agent: &str) -> Vec<Offer<'a>>
    where
        I: IntoIterator<Item = &'a ClientRecord>,
    {
        let clients: Vec<&ClientRecord> = clients.into_iter().collect();

        let available = Self::ranked(clients.iter().copied().filter(|c| Self::is_available(c)));
        if !available.is_empty() {
            return available
                .into_iter()
                .map(|client| Offer { client, rule: QueueRule::Available })
                .collect();
        }

        Self::ranked(clients.into_iter().filter(|c| Self::is_retry(c, agent)))
            .into_iter()
            .map(|client| Offer { client, rule: QueueRule::Retry })
            .collect()
    }

    /// Atribui `record` a `agent` e grava a data de aceite. Idempotente.
    pub fn accept(record: &mut ClientRecord, agent: &str, today: NaiveDate) {
        record.status = AssignmentStatus::Assigned;
        record.assigned_to = Some(agent.to_string());
        record.contact_status = ContactStatus::EmContato;
        record.data_contato_aceitacao = format_date(today);
    }

    fn is_available(client: &ClientRecord) -> bool {
        client.status == AssignmentStatus::Available && !client.is_locked()
    }

    fn is_retry(client: &ClientRecord, agent: &str) -> bool {
        if !client.is_assigned_to(agent) {
            return false;
        }
        match client.contact_status {
            ContactStatus::NotStarted => !client.contact_made,
            ContactStatus::NaoAtendeu => true,
            _ => false,
        }
    }

    fn ranked<'a>(candidates: impl Iterator<Item = &'a ClientRecord>) -> Vec<&'a ClientRecord> {
        let mut ranked: Vec<&ClientRecord> = candidates.collect();
        // sort_by é estável: empates ficam na posição da lista.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}
