//! Sessão do atendente: conjunto de trabalho, atendente atual e o único
//! lead selecionado.
//!
//! Toda operação de fila ou de contato usa o atendente da sessão, nunca um
//! estado global. Entre execuções da CLI a sessão vive num
//! [`SessionSnapshot`] em JSON.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ContactError, RecuperaError};
use crate::lead::{
    AssignmentStatus, ClientRecord, ContactForm, ContactStateMachine, LeadQueue, Offer,
    WorklistRow, worklist,
};
use crate::store::{ClientRepository, ClientStore};

pub struct AgentSession<R: ClientRepository = ClientStore> {
    agent: String,
    store: R,
    /// Leads pulados nesta sessão; somem da fila até o próximo `reload`.
    skipped: BTreeSet<String>,
    /// `id_cliente` do lead em edição.
    selected: Option<String>,
}

impl<R: ClientRepository> AgentSession<R> {
    pub fn new(agent: impl Into<String>, store: R) -> Self {
        Self {
            agent: agent.into(),
            store,
            skipped: BTreeSet::new(),
            selected: None,
        }
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    /// Registros visíveis ao atendente: o armazenamento menos os pulados.
    pub fn working_set(&self) -> impl Iterator<Item = &ClientRecord> {
        self.store
            .all()
            .iter()
            .filter(|c| !self.skipped.contains(&c.id_cliente))
    }

    pub fn next_lead(&self) -> Option<Offer<'_>> {
        LeadQueue::next(self.working_set(), &self.agent)
    }

    pub fn pending(&self) -> Vec<Offer<'_>> {
        LeadQueue::pending(self.working_set(), &self.agent)
    }

    pub fn selected(&self) -> Option<&ClientRecord> {
        self.selected.as_deref().and_then(|id| self.store.get(id))
    }

    pub fn worklist(&self) -> Vec<WorklistRow<'_>> {
        worklist(self.working_set(), &self.agent)
    }

    /// Aceita um lead e o deixa selecionado.
    ///
    /// Com `id == None` vem o próximo da fila; fila vazia devolve `Ok(None)`.
    pub fn accept(
        &mut self,
        id: Option<&str>,
        today: NaiveDate,
    ) -> Result<Option<ClientRecord>, RecuperaError> {
        if let Some(pending) = &self.selected {
            return Err(ContactError::SelectionPending(pending.clone()).into());
        }

        let mut record = match id {
            Some(id) => self.visible(id)?.clone(),
            None => match self.next_lead() {
                Some(offer) => offer.client.clone(),
                None => return Ok(None),
            },
        };
        self.check_claimable(&record)?;

        LeadQueue::accept(&mut record, &self.agent, today);
        self.store.update(record.clone())?;
        self.selected = Some(record.id_cliente.clone());
        tracing::info!(id = %record.id_cliente, agent = %self.agent, "lead accepted");
        Ok(Some(record))
    }

    /// Seleciona para edição um lead já aceito pelo atendente.
    pub fn select(&mut self, id: &str) -> Result<&ClientRecord, RecuperaError> {
        if let Some(pending) = self.selected.as_deref().filter(|p| *p != id) {
            return Err(ContactError::SelectionPending(pending.to_string()).into());
        }
        let record = self.visible(id)?;
        if !record.is_assigned_to(&self.agent) {
            return Err(ContactError::NotOwner {
                id: id.to_string(),
                owner: record.assigned_to.clone().unwrap_or_default(),
            }
            .into());
        }
        if record.is_locked() {
            return Err(ContactError::LeadLocked(id.to_string()).into());
        }
        self.selected = Some(id.to_string());
        self.selected().ok_or_else(|| RecuperaError::ClientNotFound(id.to_string()))
    }

    /// Tira o lead do conjunto de trabalho desta sessão. O registro, e o
    /// seu `status`, ficam como estão.
    pub fn skip(&mut self, id: &str) -> Result<(), RecuperaError> {
        self.visible(id)?;
        self.skipped.insert(id.to_string());
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        tracing::info!(id, agent = %self.agent, "lead skipped");
        Ok(())
    }

    /// Grava o resultado do contato no lead selecionado e devolve o
    /// atendente à fila.
    ///
    /// O lead precisa continuar atribuído ao atendente; se não estiver, a
    /// seleção é descartada e nada é gravado.
    pub fn save_contact(
        &mut self,
        form: &ContactForm,
        today: NaiveDate,
    ) -> Result<ClientRecord, RecuperaError> {
        let mut record = self
            .selected()
            .cloned()
            .ok_or(ContactError::NoLeadSelected)?;
        if !record.is_assigned_to(&self.agent) {
            self.selected = None;
            return Err(ContactError::NotOwner {
                id: record.id_cliente,
                owner: record.assigned_to.unwrap_or_default(),
            }
            .into());
        }

        let phase = ContactStateMachine::phase(form);
        let status = ContactStateMachine::apply(&mut record, form, today)?;
        self.store.update(record.clone())?;
        self.selected = None;
        tracing::info!(
            id = %record.id_cliente,
            agent = %self.agent,
            %phase,
            status = %status,
            "contact saved"
        );
        Ok(record)
    }

    /// Carrega uma nova lista de clientes. Os pulados voltam à fila; a
    /// seleção só continua se o lead ainda for do atendente e editável.
    pub fn reload(&mut self, records: Vec<ClientRecord>) {
        self.store.replace_all(records);
        self.skipped.clear();
        self.drop_stale_selection();
    }

    fn drop_stale_selection(&mut self) {
        let keep = self
            .selected()
            .is_some_and(|c| c.is_assigned_to(&self.agent) && !c.is_locked());
        if !keep {
            self.selected = None;
        }
    }

    fn visible(&self, id: &str) -> Result<&ClientRecord, RecuperaError> {
        if self.skipped.contains(id) {
            return Err(RecuperaError::ClientNotFound(id.to_string()));
        }
        self.store
            .get(id)
            .ok_or_else(|| RecuperaError::ClientNotFound(id.to_string()))
    }

    fn check_claimable(&self, record: &ClientRecord) -> Result<(), RecuperaError> {
        if record.is_locked() {
            return Err(ContactError::LeadLocked(record.id_cliente.clone()).into());
        }
        match (&record.status, &record.assigned_to) {
            (AssignmentStatus::Available, _) => Ok(()),
            (_, Some(owner)) if owner == &self.agent => Ok(()),
            (_, owner) => Err(ContactError::NotOwner {
                id: record.id_cliente.clone(),
                owner: owner.clone().unwrap_or_default(),
            }
            .into()),
        }
    }
}

/// Armazenamento local e estado de sessão de cada atendente, gravado
/// entre execuções da CLI.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub clients: Vec<ClientRecord>,
    /// Leads pulados, por atendente.
    #[serde(default)]
    pub skipped: BTreeMap<String, BTreeSet<String>>,
    /// Lead selecionado, por atendente.
    #[serde(default)]
    pub selected: BTreeMap<String, String>,
}

impl SessionSnapshot {
    /// Lê o snapshot em `path`. Arquivo ausente é um snapshot vazio.
    pub fn load(path: &Path) -> Result<Self, RecuperaError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), RecuperaError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Abre a sessão de `agent` sobre os clientes do snapshot. A seleção
    /// gravada passa pelo mesmo filtro de [`AgentSession::reload`].
    pub fn into_session(mut self, agent: &str) -> (AgentSession, SessionShelf) {
        let skipped = self.skipped.remove(agent).unwrap_or_default();
        let selected = self.selected.remove(agent);
        let mut session = AgentSession::new(agent, ClientStore::new(self.clients));
        session.skipped = skipped;
        session.selected = selected;
        session.drop_stale_selection();
        (
            session,
            SessionShelf {
                skipped: self.skipped,
                selected: self.selected,
            },
        )
    }
}

/// Estado dos outros atendentes, guardado à parte enquanto uma sessão está
/// aberta e regravado sem alteração.
#[derive(Debug, Default)]
pub struct SessionShelf {
    skipped: BTreeMap<String, BTreeSet<String>>,
    selected: BTreeMap<String, String>,
}

impl AgentSession<ClientStore> {
    pub fn into_snapshot(self, shelf: SessionShelf) -> SessionSnapshot {
        let SessionShelf {
            mut skipped,
            mut selected,
        } = shelf;
        if !self.skipped.is_empty() {
            skipped.insert(self.agent.clone(), self.skipped);
        }
        if let Some(id) = self.selected {
            selected.insert(self.agent.clone(), id);
        }
        SessionSnapshot {
            clients: self.store.into_records(),
            skipped,
            selected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::{ContactChannel, ContactStatus};

    fn lead(id: &str, score: f64) -> ClientRecord {
        let mut c = ClientRecord::new(id);
        c.score = score;
        c.motivo_cancelamento = "Preço".into();
        c
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 10).unwrap()
    }

    fn session(clients: Vec<ClientRecord>) -> AgentSession {
        AgentSession::new("X", ClientStore::new(clients))
    }

    #[test]
    fn accept_next_then_queue_moves_on() {
        let mut s = session(vec![lead("A", 9.0), lead("B", 3.0)]);

        let accepted = s.accept(None, today()).unwrap().unwrap();
        assert_eq!(accepted.id_cliente, "A");
        assert_eq!(s.selected().unwrap().id_cliente, "A");
        assert_eq!(s.store().get("A").unwrap().assigned_to.as_deref(), Some("X"));

        assert_eq!(s.next_lead().unwrap().client.id_cliente, "B");
    }

    #[test]
    fn accept_on_empty_queue_is_none() {
        let mut s = session(vec![]);
        assert!(s.accept(None, today()).unwrap().is_none());
    }

    #[test]
    fn only_one_selection_at_a_time() {
        let mut s = session(vec![lead("A", 9.0), lead("B", 3.0)]);
        s.accept(None, today()).unwrap();
        let err = s.accept(None, today()).unwrap_err();
        assert!(matches!(
            err,
            RecuperaError::Contact(ContactError::SelectionPending(id)) if id == "A"
        ));
    }

    #[test]
    fn cannot_accept_another_agents_lead() {
        let mut theirs = lead("A", 1.0);
        theirs.status = AssignmentStatus::Assigned;
        theirs.assigned_to = Some("Y".into());
        let mut s = session(vec![theirs]);

        let err = s.accept(Some("A"), today()).unwrap_err();
        assert!(matches!(err, RecuperaError::Contact(ContactError::NotOwner { .. })));
    }

    #[test]
    fn skip_hides_without_changing_status() {
        let mut s = session(vec![lead("A", 9.0), lead("B", 3.0)]);
        s.skip("A").unwrap();

        assert_eq!(s.next_lead().unwrap().client.id_cliente, "B");
        assert_eq!(s.store().get("A").unwrap().status, AssignmentStatus::Available);
        assert!(s.working_set().all(|c| c.id_cliente != "A"));
    }

    #[test]
    fn reload_resurfaces_skipped() {
        let mut s = session(vec![lead("A", 9.0)]);
        s.skip("A").unwrap();
        assert!(s.next_lead().is_none());

        s.reload(vec![lead("A", 9.0)]);
        assert_eq!(s.next_lead().unwrap().client.id_cliente, "A");
    }

    #[test]
    fn save_contact_updates_record_and_clears_selection() {
        let mut s = session(vec![lead("A", 9.0), lead("B", 3.0)]);
        s.accept(None, today()).unwrap();

        let form = ContactForm {
            contact_made: true,
            answered: Some(true),
            contact_channel: Some(ContactChannel::Telefone),
            recovered: true,
            diagnostic_id: Some(2),
            notes: "Migrou para 500 mega".into(),
            ..Default::default()
        };
        let saved = s.save_contact(&form, today()).unwrap();

        assert_eq!(saved.contact_status, ContactStatus::Recuperado);
        assert!(s.selected().is_none());
        assert_eq!(s.store().all()[0].contact_status, ContactStatus::Recuperado);
        assert_eq!(s.store().all()[0].id_cliente, "A");
    }

    #[test]
    fn save_without_selection_fails() {
        let mut s = session(vec![lead("A", 9.0)]);
        let err = s.save_contact(&ContactForm::default(), today()).unwrap_err();
        assert!(matches!(err, RecuperaError::Contact(ContactError::NoLeadSelected)));
    }

    #[test]
    fn no_answer_is_offered_again() {
        let mut s = session(vec![lead("A", 9.0)]);
        s.accept(None, today()).unwrap();
        let form = ContactForm {
            contact_made: true,
            answered: Some(false),
            ..Default::default()
        };
        s.save_contact(&form, today()).unwrap();

        let offer = s.next_lead().unwrap();
        assert_eq!(offer.client.id_cliente, "A");
        assert_eq!(s.worklist()[0].badge.label(), "Não Atendeu");
    }

    #[test]
    fn select_rejects_locked_lead() {
        let mut won = lead("A", 1.0);
        won.status = AssignmentStatus::Assigned;
        won.assigned_to = Some("X".into());
        won.recovered = true;
        won.contact_status = ContactStatus::Recuperado;
        let mut s = session(vec![won]);

        let err = s.select("A").unwrap_err();
        assert!(matches!(err, RecuperaError::Contact(ContactError::LeadLocked(_))));
    }

    #[test]
    fn accept_skips_locked_lead_released_by_import() {
        let mut won = lead("L", 10.0);
        won.status = AssignmentStatus::Assigned;
        won.contact_status = ContactStatus::Recuperado;
        won.normalize();
        let mut s = session(vec![won, lead("F", 1.0)]);

        let accepted = s.accept(None, today()).unwrap().unwrap();
        assert_eq!(accepted.id_cliente, "F");
        assert_eq!(s.selected().unwrap().id_cliente, "F");
    }

    #[test]
    fn save_contact_rejects_lead_no_longer_owned() {
        let mut s = session(vec![lead("A", 9.0)]);
        s.selected = Some("A".into());

        let form = ContactForm {
            contact_made: true,
            answered: Some(false),
            ..Default::default()
        };
        let err = s.save_contact(&form, today()).unwrap_err();
        assert!(matches!(
            err,
            RecuperaError::Contact(ContactError::NotOwner { id, .. }) if id == "A"
        ));
        assert!(s.selected().is_none());
        let a = s.store().get("A").unwrap();
        assert_eq!(a.contact_status, ContactStatus::NotStarted);
        assert_eq!(a.status, AssignmentStatus::Available);
    }

    #[test]
    fn restored_selection_needs_an_open_lead_of_the_agent() {
        let mut released = lead("A", 9.0);
        released.status = AssignmentStatus::Available;
        let mut mine = lead("B", 3.0);
        mine.status = AssignmentStatus::Assigned;
        mine.assigned_to = Some("X".into());
        let mut snapshot = SessionSnapshot {
            clients: vec![released, mine],
            ..Default::default()
        };
        snapshot.selected.insert("X".into(), "A".into());
        snapshot.selected.insert("Y".into(), "B".into());

        let (s, shelf) = snapshot.into_session("X");
        assert!(s.selected().is_none());
        assert_eq!(shelf.selected.get("Y").map(String::as_str), Some("B"));

        let mut snapshot = s.into_snapshot(shelf);
        snapshot.selected.insert("X".into(), "B".into());
        let (s, _) = snapshot.into_session("X");
        assert_eq!(s.selected().unwrap().id_cliente, "B");
    }

    #[test]
    fn snapshot_roundtrip_keeps_other_agents_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("session.json");

        let mut snapshot = SessionSnapshot {
            clients: vec![lead("A", 9.0), lead("B", 3.0)],
            ..Default::default()
        };
        snapshot
            .skipped
            .insert("Y".into(), BTreeSet::from(["B".to_string()]));
        snapshot.save(&path).unwrap();

        let (mut s, shelf) = SessionSnapshot::load(&path).unwrap().into_session("X");
        s.accept(None, today()).unwrap();
        s.into_snapshot(shelf).save(&path).unwrap();

        let reloaded = SessionSnapshot::load(&path).unwrap();
        assert_eq!(reloaded.selected.get("X").map(String::as_str), Some("A"));
        assert!(reloaded.skipped["Y"].contains("B"));
        assert_eq!(reloaded.clients[0].assigned_to.as_deref(), Some("X"));
    }

    #[test]
    fn missing_snapshot_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SessionSnapshot::load(&dir.path().join("nope.json")).unwrap();
        assert!(snapshot.clients.is_empty());
    }
}
