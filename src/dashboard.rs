//! Indicadores de recuperação para os gestores e o relatório de
//! atendimentos encerrados.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::lead::{AssignmentStatus, ClientRecord, ContactStatus, describe};

const NO_AGENT: &str = "(sem atendente)";
const NO_REASON: &str = "(não informado)";

/// Contagens de um atendente.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentKpis {
    pub assigned: usize,
    pub contacted: usize,
    pub in_contact: usize,
    pub no_answer: usize,
    pub closed: usize,
    pub recovered: usize,
    pub recovery_rate: f64,
}

/// Visão agregada de toda a base de clientes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecoveryKpis {
    pub total: usize,
    pub available: usize,
    pub assigned: usize,
    pub contacted: usize,
    pub in_contact: usize,
    pub no_answer: usize,
    pub closed: usize,
    pub recovered: usize,
    /// Recuperados sobre contatados; `0.0` sem nenhum contato.
    pub recovery_rate: f64,
    pub by_agent: BTreeMap<String, AgentKpis>,
    pub by_cancel_reason: BTreeMap<String, usize>,
    pub by_diagnostic: BTreeMap<String, usize>,
}

fn rate(recovered: usize, contacted: usize) -> f64 {
    if contacted == 0 {
        0.0
    } else {
        recovered as f64 / contacted as f64
    }
}

impl RecoveryKpis {
    pub fn compute<'a, I>(clients: I) -> Self
    where
        I: IntoIterator<Item = &'a ClientRecord>,
    {
        let mut kpis = Self::default();

        for client in clients {
            kpis.total += 1;

            let reason = client.motivo_cancelamento.trim();
            let reason = if reason.is_empty() { NO_REASON } else { reason };
            *kpis.by_cancel_reason.entry(reason.to_string()).or_default() += 1;

            if client.status == AssignmentStatus::Available {
                kpis.available += 1;
                continue;
            }
            kpis.assigned += 1;

            let agent = client.assigned_to.as_deref().unwrap_or(NO_AGENT);
            let per_agent = kpis.by_agent.entry(agent.to_string()).or_default();
            per_agent.assigned += 1;

            if client.contact_made || client.recovered {
                kpis.contacted += 1;
                per_agent.contacted += 1;
            }

            match (client.recovered, client.contact_status) {
                (true, _) | (_, ContactStatus::Recuperado) => {
                    kpis.recovered += 1;
                    per_agent.recovered += 1;
                }
                (_, ContactStatus::ContatoEncerrado) => {
                    kpis.closed += 1;
                    per_agent.closed += 1;
                }
                (_, ContactStatus::NaoAtendeu) => {
                    kpis.no_answer += 1;
                    per_agent.no_answer += 1;
                }
                (_, ContactStatus::EmContato) => {
                    kpis.in_contact += 1;
                    per_agent.in_contact += 1;
                }
                (_, ContactStatus::NotStarted) => {}
            }

            if let Some(id) = client.id_diagnostico {
                let label = describe(id)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("#{id}"));
                *kpis.by_diagnostic.entry(label).or_default() += 1;
            }
        }

        kpis.recovery_rate = rate(kpis.recovered, kpis.contacted);
        for agent in kpis.by_agent.values_mut() {
            agent.recovery_rate = rate(agent.recovered, agent.contacted);
        }
        kpis
    }
}

/// Atendimento encerrado no relatório.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    pub id_cliente: String,
    pub nome: String,
    pub atendente: String,
    pub status: ContactStatus,
    pub diagnostico: String,
    pub descricao_atendente: String,
    pub data_contato_aceitacao: String,
    pub data_contato_final: String,
}

/// Contatos recuperados ou encerrados, opcionalmente de um só atendente.
pub fn report<'a, I>(clients: I, agent: Option<&str>) -> Vec<ReportLine>
where
    I: IntoIterator<Item = &'a ClientRecord>,
{
    clients
        .into_iter()
        .filter(|c| c.is_locked())
        .filter(|c| agent.is_none() || c.assigned_to.as_deref() == agent)
        .map(|c| ReportLine {
            id_cliente: c.id_cliente.clone(),
            nome: c.nome.clone(),
            atendente: c.assigned_to.clone().unwrap_or_default(),
            status: c.contact_status,
            diagnostico: c.descricao_diagnostico.clone(),
            descricao_atendente: c.descricao_atendente.clone(),
            data_contato_aceitacao: c.data_contato_aceitacao.clone(),
            data_contato_final: c.data_contato_final.clone(),
        })
        .collect()
}
