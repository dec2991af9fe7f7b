use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::client::{ClientRecord, ContactChannel, ContactStatus, format_date};
use super::diagnostic::ReasonSet;
use crate::error::ContactError;

/// Fases de um lead aceito enquanto o atendente trabalha nele.
///
/// UNCONTACTED → CONTACT_ATTEMPTED → {RESPONDED, UNRESPONSIVE}
/// → CHANNEL_SELECTED → {RECOVERED, NOT_RECOVERED}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactPhase {
    Uncontacted,
    ContactAttempted,
    Responded,
    Unresponsive,
    ChannelSelected,
    Recovered,
    NotRecovered,
}

impl fmt::Display for ContactPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactPhase::Uncontacted => write!(f, "UNCONTACTED"),
            ContactPhase::ContactAttempted => write!(f, "CONTACT_ATTEMPTED"),
            ContactPhase::Responded => write!(f, "RESPONDED"),
            ContactPhase::Unresponsive => write!(f, "UNRESPONSIVE"),
            ContactPhase::ChannelSelected => write!(f, "CHANNEL_SELECTED"),
            ContactPhase::Recovered => write!(f, "RECOVERED"),
            ContactPhase::NotRecovered => write!(f, "NOT_RECOVERED"),
        }
    }
}

/// O que o atendente preencheu para o lead selecionado.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    /// Houve tentativa de contato.
    pub contact_made: bool,
    /// `None` enquanto o atendente não disse se o cliente atendeu.
    pub answered: Option<bool>,
    /// Obrigatório quando o cliente atendeu.
    pub contact_channel: Option<ContactChannel>,
    pub recovered: bool,
    /// Só vale no caminho sem resposta.
    pub should_close_contact: bool,
    /// Id no catálogo de [`ReasonSet`] do desfecho.
    pub diagnostic_id: Option<u32>,
    /// Observações livres do atendente.
    pub notes: String,
}

impl ContactForm {
    fn answered(&self) -> bool {
        self.answered == Some(true)
    }

    fn unanswered(&self) -> bool {
        self.contact_made && self.answered == Some(false)
    }
}

/// Converte um [`ContactForm`] em status e o aplica ao registro.
pub struct ContactStateMachine;

impl ContactStateMachine {
    /// Fase do fluxo de contato em que o formulário está.
    pub fn phase(form: &ContactForm) -> ContactPhase {
        if form.recovered {
            return ContactPhase::Recovered;
        }
        if !form.contact_made {
            return ContactPhase::Uncontacted;
        }
        match form.answered {
            None => ContactPhase::ContactAttempted,
            Some(false) if form.should_close_contact => ContactPhase::NotRecovered,
            Some(false) => ContactPhase::Unresponsive,
            Some(true) if form.contact_channel.is_some() => ContactPhase::ChannelSelected,
            Some(true) => ContactPhase::Responded,
        }
    }

    /// Status gravado ao salvar. Precedência: recuperado, encerrado sem
    /// resposta, não atendeu; caso contrário, em contato.
    pub fn resolve(form: &ContactForm) -> ContactStatus {
        if form.recovered {
            ContactStatus::Recuperado
        } else if form.unanswered() && form.should_close_contact {
            ContactStatus::ContatoEncerrado
        } else if form.unanswered() {
            ContactStatus::NaoAtendeu
        } else {
            ContactStatus::EmContato
        }
    }

    /// Confere os campos obrigatórios do desfecho.
    pub fn validate(form: &ContactForm) -> Result<ContactStatus, ContactError> {
        if form.answered() && form.contact_channel.is_none() {
            return Err(ContactError::MissingChannel);
        }

        let status = Self::resolve(form);
        let reasons = match status {
            ContactStatus::Recuperado => ReasonSet::Recovered,
            ContactStatus::ContatoEncerrado => ReasonSet::NotRecovered,
            _ => return Ok(status),
        };

        let id = form.diagnostic_id.ok_or(ContactError::MissingDiagnostic)?;
        if reasons.find(id).is_none() {
            return Err(ContactError::InvalidDiagnostic(id));
        }
        if form.notes.trim().is_empty() {
            return Err(ContactError::MissingNotes);
        }
        Ok(status)
    }

    /// Valida `form` e grava o desfecho em `record`.
    ///
    /// Com erro de validação ou lead travado o registro fica intacto.
    pub fn apply(
        record: &mut ClientRecord,
        form: &ContactForm,
        today: NaiveDate,
    ) -> Result<ContactStatus, ContactError> {
        if record.is_locked() {
            return Err(ContactError::LeadLocked(record.id_cliente.clone()));
        }
        let status = Self::validate(form)?;

        record.contact_made = form.contact_made;
        record.answered = form.answered();
        record.contact_channel = if form.answered() {
            form.contact_channel
        } else {
            None
        };
        record.recovered = status == ContactStatus::Recuperado;
        record.contact_status = status;

        if !form.notes.trim().is_empty() {
            record.descricao_atendente = form.notes.trim().to_string();
        }

        if status.is_terminal() {
            let reasons = if record.recovered {
                ReasonSet::Recovered
            } else {
                ReasonSet::NotRecovered
            };
            record.id_diagnostico = form.diagnostic_id;
            record.descricao_diagnostico = form
                .diagnostic_id
                .and_then(|id| reasons.find(id))
                .map(|r| r.description.to_string())
                .unwrap_or_default();
            record.data_contato_final = format_date(today);
        } else {
            record.id_diagnostico = None;
            record.descricao_diagnostico.clear();
            record.data_contato_final.clear();
        }

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::client::AssignmentStatus;

    fn claimed() -> ClientRecord {
        let mut c = ClientRecord::new("A");
        c.status = AssignmentStatus::Assigned;
        c.assigned_to = Some("X".into());
        c.contact_status = ContactStatus::EmContato;
        c
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn recovered_form() -> ContactForm {
        ContactForm {
            contact_made: true,
            answered: Some(true),
            contact_channel: Some(ContactChannel::Whatsapp),
            recovered: true,
            diagnostic_id: Some(1),
            notes: "Aceitou desconto de 20%".into(),
            ..Default::default()
        }
    }

    #[test]
    fn recovered_path() {
        let mut record = claimed();
        let status = ContactStateMachine::apply(&mut record, &recovered_form(), today()).unwrap();

        assert_eq!(status, ContactStatus::Recuperado);
        assert!(record.recovered);
        assert_eq!(record.contact_status, ContactStatus::Recuperado);
        assert_eq!(record.contact_channel, Some(ContactChannel::Whatsapp));
        assert_eq!(record.descricao_diagnostico, "Desconto na mensalidade");
        assert_eq!(record.data_contato_final, "01/06/2024");
    }

    #[test]
    fn closed_without_answer() {
        let form = ContactForm {
            contact_made: true,
            answered: Some(false),
            should_close_contact: true,
            diagnostic_id: Some(105),
            notes: "Número não existe".into(),
            ..Default::default()
        };
        let mut record = claimed();
        let status = ContactStateMachine::apply(&mut record, &form, today()).unwrap();

        assert_eq!(status, ContactStatus::ContatoEncerrado);
        assert!(!record.recovered);
        assert!(record.contact_channel.is_none());
        assert_eq!(record.id_diagnostico, Some(105));
        assert_eq!(record.data_contato_final, "01/06/2024");
    }

    #[test]
    fn no_answer_needs_no_reason() {
        let form = ContactForm {
            contact_made: true,
            answered: Some(false),
            ..Default::default()
        };
        let mut record = claimed();
        let status = ContactStateMachine::apply(&mut record, &form, today()).unwrap();

        assert_eq!(status, ContactStatus::NaoAtendeu);
        assert!(record.data_contato_final.is_empty());
        assert!(record.id_diagnostico.is_none());
    }

    #[test]
    fn undetermined_stays_in_contact() {
        assert_eq!(
            ContactStateMachine::resolve(&ContactForm::default()),
            ContactStatus::EmContato
        );
        let answered = ContactForm {
            contact_made: true,
            answered: Some(true),
            contact_channel: Some(ContactChannel::Telefone),
            ..Default::default()
        };
        assert_eq!(ContactStateMachine::resolve(&answered), ContactStatus::EmContato);
    }

    #[test]
    fn recovered_takes_precedence_over_close() {
        let form = ContactForm {
            should_close_contact: true,
            answered: Some(false),
            ..recovered_form()
        };
        assert_eq!(ContactStateMachine::resolve(&form), ContactStatus::Recuperado);
    }

    #[test]
    fn answered_requires_channel() {
        let form = ContactForm {
            contact_channel: None,
            ..recovered_form()
        };
        assert_eq!(
            ContactStateMachine::validate(&form),
            Err(ContactError::MissingChannel)
        );
    }

    #[test]
    fn channel_recorded_only_when_answered() {
        let form = ContactForm {
            contact_made: true,
            answered: Some(false),
            contact_channel: Some(ContactChannel::Telefone),
            ..Default::default()
        };
        let mut record = claimed();
        ContactStateMachine::apply(&mut record, &form, today()).unwrap();
        assert!(record.contact_channel.is_none());
    }

    #[test]
    fn closing_requires_reason_from_matching_set() {
        let mut form = ContactForm {
            contact_made: true,
            answered: Some(false),
            should_close_contact: true,
            notes: "Sem retorno".into(),
            ..Default::default()
        };
        assert_eq!(
            ContactStateMachine::validate(&form),
            Err(ContactError::MissingDiagnostic)
        );

        form.diagnostic_id = Some(1);
        assert_eq!(
            ContactStateMachine::validate(&form),
            Err(ContactError::InvalidDiagnostic(1))
        );

        form.diagnostic_id = Some(106);
        form.notes = "   ".into();
        assert_eq!(
            ContactStateMachine::validate(&form),
            Err(ContactError::MissingNotes)
        );
    }

    #[test]
    fn failed_validation_leaves_record_untouched() {
        let mut record = claimed();
        let before = record.clone();
        let form = ContactForm {
            diagnostic_id: None,
            ..recovered_form()
        };
        assert!(ContactStateMachine::apply(&mut record, &form, today()).is_err());
        assert_eq!(record, before);
    }

    #[test]
    fn recovered_lead_is_locked() {
        let mut record = claimed();
        ContactStateMachine::apply(&mut record, &recovered_form(), today()).unwrap();

        let err = ContactStateMachine::apply(&mut record, &ContactForm::default(), today()).unwrap_err();
        assert_eq!(err, ContactError::LeadLocked("A".into()));
    }

    #[test]
    fn phases_follow_the_inputs() {
        let mut form = ContactForm::default();
        assert_eq!(ContactStateMachine::phase(&form), ContactPhase::Uncontacted);

        form.contact_made = true;
        assert_eq!(ContactStateMachine::phase(&form), ContactPhase::ContactAttempted);

        form.answered = Some(false);
        assert_eq!(ContactStateMachine::phase(&form), ContactPhase::Unresponsive);
        form.should_close_contact = true;
        assert_eq!(ContactStateMachine::phase(&form), ContactPhase::NotRecovered);

        form.should_close_contact = false;
        form.answered = Some(true);
        assert_eq!(ContactStateMachine::phase(&form), ContactPhase::Responded);
        form.contact_channel = Some(ContactChannel::Telefone);
        assert_eq!(ContactStateMachine::phase(&form), ContactPhase::ChannelSelected);
        form.recovered = true;
        assert_eq!(ContactStateMachine::phase(&form), ContactPhase::Recovered);
    }

    #[test]
    fn phase_display() {
        assert_eq!(ContactPhase::ContactAttempted.to_string(), "CONTACT_ATTEMPTED");
        assert_eq!(ContactPhase::NotRecovered.to_string(), "NOT_RECOVERED");
    }
}
