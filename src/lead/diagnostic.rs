//! Catálogos de diagnóstico usados ao encerrar um atendimento.
//!
//! Cada desfecho final exige um motivo de um catálogo específico:
//! leads recuperados usam [`RECOVERED_REASONS`], leads encerrados sem
//! recuperação usam [`NOT_RECOVERED_REASONS`].

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonSet {
    Recovered,
    NotRecovered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiagnosticReason {
    pub id: u32,
    pub description: &'static str,
}

pub const RECOVERED_REASONS: &[DiagnosticReason] = &[
    DiagnosticReason { id: 1, description: "Desconto na mensalidade" },
    DiagnosticReason { id: 2, description: "Upgrade de velocidade" },
    DiagnosticReason { id: 3, description: "Problema técnico resolvido" },
    DiagnosticReason { id: 4, description: "Migração de plano" },
    DiagnosticReason { id: 5, description: "Isenção de taxa de reativação" },
];

pub const NOT_RECOVERED_REASONS: &[DiagnosticReason] = &[
    DiagnosticReason { id: 101, description: "Mudança de endereço sem cobertura" },
    DiagnosticReason { id: 102, description: "Contratou concorrente" },
    DiagnosticReason { id: 103, description: "Preço acima do orçamento" },
    DiagnosticReason { id: 104, description: "Insatisfação com o atendimento" },
    DiagnosticReason { id: 105, description: "Número inválido ou inexistente" },
    DiagnosticReason { id: 106, description: "Cliente não deseja contato" },
];

impl ReasonSet {
    pub fn reasons(&self) -> &'static [DiagnosticReason] {
        match self {
            ReasonSet::Recovered => RECOVERED_REASONS,
            ReasonSet::NotRecovered => NOT_RECOVERED_REASONS,
        }
    }

    pub fn find(&self, id: u32) -> Option<&'static DiagnosticReason> {
        self.reasons().iter().find(|r| r.id == id)
    }
}

/// Procura o motivo nos dois catálogos.
pub fn describe(id: u32) -> Option<&'static str> {
    ReasonSet::Recovered
        .find(id)
        .or_else(|| ReasonSet::NotRecovered.find(id))
        .map(|r| r.description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogues_do_not_overlap() {
        for reason in RECOVERED_REASONS {
            assert!(ReasonSet::NotRecovered.find(reason.id).is_none());
        }
    }

    #[test]
    fn find_respects_set() {
        assert_eq!(
            ReasonSet::Recovered.find(2).map(|r| r.description),
            Some("Upgrade de velocidade")
        );
        assert!(ReasonSet::Recovered.find(102).is_none());
        assert_eq!(describe(102), Some("Contratou concorrente"));
        assert_eq!(describe(999), None);
    }
}
