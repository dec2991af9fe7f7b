use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Formato de data usado em todos os carimbos de contato (`dd/MM/yyyy`).
pub const DATE_FORMAT: &str = "%d/%m/%Y";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Situação do lead na fila de atribuição.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[default]
    Available,
    Assigned,
    Contacted,
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentStatus::Available => write!(f, "available"),
            AssignmentStatus::Assigned => write!(f, "assigned"),
            AssignmentStatus::Contacted => write!(f, "contacted"),
        }
    }
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "available" => Ok(AssignmentStatus::Available),
            "assigned" => Ok(AssignmentStatus::Assigned),
            "contacted" => Ok(AssignmentStatus::Contacted),
            other => Err(format!("unknown assignment status: {other}")),
        }
    }
}

/// Status gravado no registro quando o resultado do contato é salvo.
///
/// `NotStarted` é serializado como string vazia. A grafia antiga
/// `sem_resposta` é lida como [`ContactStatus::ContatoEncerrado`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    #[default]
    #[serde(rename = "")]
    NotStarted,
    EmContato,
    #[serde(alias = "sem_resposta")]
    ContatoEncerrado,
    NaoAtendeu,
    Recuperado,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::NotStarted => "",
            ContactStatus::EmContato => "em_contato",
            ContactStatus::ContatoEncerrado => "contato_encerrado",
            ContactStatus::NaoAtendeu => "nao_atendeu",
            ContactStatus::Recuperado => "recuperado",
        }
    }

    /// Status finais travam o registro para edição.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ContactStatus::Recuperado | ContactStatus::ContatoEncerrado
        )
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" => Ok(ContactStatus::NotStarted),
            "em_contato" => Ok(ContactStatus::EmContato),
            "contato_encerrado" | "sem_resposta" => Ok(ContactStatus::ContatoEncerrado),
            "nao_atendeu" => Ok(ContactStatus::NaoAtendeu),
            "recuperado" => Ok(ContactStatus::Recuperado),
            other => Err(format!("unknown contact status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactChannel {
    Whatsapp,
    Telefone,
}

impl fmt::Display for ContactChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactChannel::Whatsapp => write!(f, "whatsapp"),
            ContactChannel::Telefone => write!(f, "telefone"),
        }
    }
}

impl FromStr for ContactChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "whatsapp" => Ok(ContactChannel::Whatsapp),
            "telefone" => Ok(ContactChannel::Telefone),
            other => Err(format!("unknown contact channel: {other}")),
        }
    }
}

/// Contrato cancelado que pode ser recuperado.
///
/// Os nomes dos campos seguem a API do CRM (`id_cliente`, `assignedTo`,
/// `contactStatus`...). A mesma struct lê respostas da API, arquivos de
/// carga e o snapshot da sessão.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    #[serde(deserialize_with = "text")]
    pub id_cliente: String,
    #[serde(default, deserialize_with = "text")]
    pub id_contrato: String,
    #[serde(default, deserialize_with = "text")]
    pub nome: String,
    #[serde(default, deserialize_with = "text")]
    pub email: String,
    #[serde(default, deserialize_with = "text")]
    pub telefone: String,
    /// Meses como cliente antes do cancelamento.
    #[serde(default, deserialize_with = "lenient_u32")]
    pub meses_base: u32,
    /// Prioridade na fila: maior primeiro.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub score: f64,
    #[serde(default, deserialize_with = "text")]
    pub motivo_cancelamento: String,
    #[serde(default, deserialize_with = "text")]
    pub data_cancelamento: String,

    #[serde(default, deserialize_with = "lenient_or_default")]
    pub status: AssignmentStatus,
    /// Nome do atendente dono do lead.
    #[serde(
        rename = "assignedTo",
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_to: Option<String>,

    #[serde(rename = "contactMade", default, deserialize_with = "lenient_flag")]
    pub contact_made: bool,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub answered: bool,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub recovered: bool,
    #[serde(
        rename = "contactChannel",
        default,
        deserialize_with = "lenient_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_channel: Option<ContactChannel>,
    #[serde(rename = "contactStatus", default, deserialize_with = "lenient_or_default")]
    pub contact_status: ContactStatus,

    #[serde(
        rename = "idDiagnostico",
        default,
        deserialize_with = "lenient_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub id_diagnostico: Option<u32>,
    #[serde(default, deserialize_with = "text")]
    pub descricao_diagnostico: String,
    #[serde(default, deserialize_with = "text")]
    pub descricao_atendente: String,
    /// Data do aceite, `dd/MM/yyyy`.
    #[serde(default, deserialize_with = "text")]
    pub data_contato_aceitacao: String,
    /// Data do desfecho final, `dd/MM/yyyy`.
    #[serde(default, deserialize_with = "text")]
    pub data_contato_final: String,
}

impl ClientRecord {
    pub fn new(id_cliente: impl Into<String>) -> Self {
        Self {
            id_cliente: id_cliente.into(),
            id_contrato: String::new(),
            nome: String::new(),
            email: String::new(),
            telefone: String::new(),
            meses_base: 0,
            score: 0.0,
            motivo_cancelamento: String::new(),
            data_cancelamento: String::new(),
            status: AssignmentStatus::Available,
            assigned_to: None,
            contact_made: false,
            answered: false,
            recovered: false,
            contact_channel: None,
            contact_status: ContactStatus::NotStarted,
            id_diagnostico: None,
            descricao_diagnostico: String::new(),
            descricao_atendente: String::new(),
            data_contato_aceitacao: String::new(),
            data_contato_final: String::new(),
        }
    }

    /// Monta o registro a partir de uma linha indexada pelo cabeçalho
    /// (planilha ou CSV).
    ///
    /// Colunas ausentes ficam vazias e células ilegíveis voltam ao valor
    /// padrão. O resultado já sai normalizado.
    pub fn from_row(row: &HashMap<String, String>) -> Self {
        let cell = |key: &str| row.get(key).map(|v| v.trim().to_string()).unwrap_or_default();

        let mut record = Self::new(cell("id_cliente"));
        record.id_contrato = cell("id_contrato");
        record.nome = cell("nome");
        record.email = cell("email");
        record.telefone = cell("telefone");
        record.meses_base = parse_number(&cell("meses_base"))
            .map(|n| n.max(0.0) as u32)
            .unwrap_or(0);
        record.score = parse_number(&cell("score")).unwrap_or(0.0);
        record.motivo_cancelamento = cell("motivo_cancelamento");
        record.data_cancelamento = cell("data_cancelamento");
        record.status = cell("status").parse().unwrap_or_default();
        record.assigned_to = Some(cell("assignedTo")).filter(|s| !s.is_empty());
        record.contact_made = parse_flag(&cell("contactMade"));
        record.answered = parse_flag(&cell("answered"));
        record.recovered = parse_flag(&cell("recovered"));
        record.contact_channel = cell("contactChannel").parse().ok();
        record.contact_status = cell("contactStatus").parse().unwrap_or_default();
        record.id_diagnostico = parse_number(&cell("idDiagnostico")).map(|n| n as u32);
        record.descricao_diagnostico = cell("descricao_diagnostico");
        record.descricao_atendente = cell("descricao_atendente");
        record.data_contato_aceitacao = cell("data_contato_aceitacao");
        record.data_contato_final = cell("data_contato_final");
        record.normalize();
        record
    }

    pub fn has_cancellation_reason(&self) -> bool {
        !self.motivo_cancelamento.trim().is_empty()
    }

    pub fn is_assigned_to(&self, agent: &str) -> bool {
        self.status == AssignmentStatus::Assigned && self.assigned_to.as_deref() == Some(agent)
    }

    /// Leads recuperados ou encerrados não podem mais ser editados.
    pub fn is_locked(&self) -> bool {
        self.recovered || self.contact_status.is_terminal()
    }

    /// Restaura as invariantes do registro após a importação.
    ///
    /// `assignedTo` só existe fora de `available`; o canal só fica quando o
    /// cliente atendeu; `recovered` acompanha `contactStatus == recuperado`.
    pub fn normalize(&mut self) {
        if self
            .assigned_to
            .as_deref()
            .is_some_and(|agent| agent.trim().is_empty())
        {
            self.assigned_to = None;
        }
        if self.status == AssignmentStatus::Available {
            self.assigned_to = None;
        } else if self.assigned_to.is_none() {
            self.status = AssignmentStatus::Available;
        }

        if !self.answered {
            self.contact_channel = None;
        }

        if self.contact_status == ContactStatus::Recuperado {
            self.recovered = true;
        } else if self.recovered {
            self.contact_status = ContactStatus::Recuperado;
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "sim" | "s" | "yes" | "x"
    )
}

fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value
        .parse::<f64>()
        .or_else(|_| value.replace(',', ".").parse::<f64>())
        .ok()
        .filter(|n| n.is_finite())
}

// A API do CRM não respeita tipos: números chegam como texto, texto como
// número, e qualquer campo pode vir null.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Loose {
    fn into_text(self) -> String {
        match self {
            Loose::Bool(b) => b.to_string(),
            Loose::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", n as i64),
            Loose::Number(n) => n.to_string(),
            Loose::Text(s) => s,
        }
    }
}

fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<Loose>::deserialize(d)?
        .map(Loose::into_text)
        .unwrap_or_default())
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<Loose>::deserialize(d)?
        .and_then(|v| parse_number(&v.into_text()))
        .unwrap_or(0.0))
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    lenient_f64(d).map(|n| n.max(0.0) as u32)
}

fn lenient_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(Option::<Loose>::deserialize(d)?
        .map(|v| parse_flag(&v.into_text()))
        .unwrap_or(false))
}

fn lenient_or_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    lenient_option(d).map(Option::unwrap_or_default)
}

fn blank_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.filter(|s| !s.trim().is_empty()))
}

fn lenient_option<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    Ok(Option::<Loose>::deserialize(d)?.and_then(|v| v.into_text().parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn from_row_defaults_missing_columns() {
        let record = ClientRecord::from_row(&row(&[
            ("id_cliente", "C-1"),
            ("nome", " Maria Souza "),
            ("motivo_cancelamento", "Preço"),
        ]));
        assert_eq!(record.id_cliente, "C-1");
        assert_eq!(record.nome, "Maria Souza");
        assert_eq!(record.email, "");
        assert_eq!(record.score, 0.0);
        assert_eq!(record.status, AssignmentStatus::Available);
        assert_eq!(record.contact_status, ContactStatus::NotStarted);
        assert!(record.assigned_to.is_none());
    }

    #[test]
    fn from_row_parses_numbers_and_flags() {
        let record = ClientRecord::from_row(&row(&[
            ("id_cliente", "C-2"),
            ("score", "7,5"),
            ("meses_base", "24"),
            ("status", "assigned"),
            ("assignedTo", "Ana"),
            ("contactMade", "sim"),
            ("answered", "TRUE"),
            ("contactChannel", "WhatsApp"),
        ]));
        assert_eq!(record.score, 7.5);
        assert_eq!(record.meses_base, 24);
        assert_eq!(record.status, AssignmentStatus::Assigned);
        assert_eq!(record.assigned_to.as_deref(), Some("Ana"));
        assert!(record.contact_made);
        assert_eq!(record.contact_channel, Some(ContactChannel::Whatsapp));
    }

    #[test]
    fn normalize_drops_orphan_assignment() {
        let record = ClientRecord::from_row(&row(&[("id_cliente", "C-3"), ("status", "assigned")]));
        assert_eq!(record.status, AssignmentStatus::Available);

        let record = ClientRecord::from_row(&row(&[("id_cliente", "C-4"), ("assignedTo", "Ana")]));
        assert!(record.assigned_to.is_none());
    }

    #[test]
    fn normalize_drops_channel_without_answer() {
        let record = ClientRecord::from_row(&row(&[
            ("id_cliente", "C-5"),
            ("contactChannel", "telefone"),
        ]));
        assert!(record.contact_channel.is_none());
    }

    #[test]
    fn normalize_aligns_recovered_flag_and_status() {
        let record = ClientRecord::from_row(&row(&[
            ("id_cliente", "C-6"),
            ("contactStatus", "recuperado"),
        ]));
        assert!(record.recovered);

        let record = ClientRecord::from_row(&row(&[("id_cliente", "C-7"), ("recovered", "1")]));
        assert_eq!(record.contact_status, ContactStatus::Recuperado);
    }

    #[test]
    fn legacy_closed_status_is_canonicalized() {
        let status: ContactStatus = serde_json::from_str(r#""sem_resposta""#).unwrap();
        assert_eq!(status, ContactStatus::ContatoEncerrado);
        assert_eq!("sem_resposta".parse::<ContactStatus>(), Ok(ContactStatus::ContatoEncerrado));
        assert_eq!(
            serde_json::to_string(&ContactStatus::ContatoEncerrado).unwrap(),
            r#""contato_encerrado""#
        );
    }

    #[test]
    fn empty_contact_status_serializes_as_empty_string() {
        assert_eq!(serde_json::to_string(&ContactStatus::NotStarted).unwrap(), r#""""#);
        let status: ContactStatus = serde_json::from_str(r#""""#).unwrap();
        assert_eq!(status, ContactStatus::NotStarted);
    }

    #[test]
    fn deserialize_loose_api_payload() {
        let json = r#"{
            "id_cliente": 1042,
            "nome": "João Lima",
            "score": "8.2",
            "meses_base": 36,
            "motivo_cancelamento": "Mudança de endereço",
            "status": "assigned",
            "assignedTo": "Carla",
            "contactMade": null,
            "contactChannel": "",
            "contactStatus": "nao_atendeu",
            "idDiagnostico": "3"
        }"#;
        let record: ClientRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id_cliente, "1042");
        assert_eq!(record.score, 8.2);
        assert_eq!(record.meses_base, 36);
        assert!(!record.contact_made);
        assert!(record.contact_channel.is_none());
        assert_eq!(record.contact_status, ContactStatus::NaoAtendeu);
        assert_eq!(record.id_diagnostico, Some(3));
    }

    #[test]
    fn serialize_uses_api_field_names() {
        let mut record = ClientRecord::new("C-9");
        record.status = AssignmentStatus::Assigned;
        record.assigned_to = Some("Ana".into());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["assignedTo"], "Ana");
        assert_eq!(json["contactStatus"], "");
        assert_eq!(json["contactMade"], false);
        assert!(json.get("contactChannel").is_none());
    }

    #[test]
    fn date_format_is_day_month_year() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_date(date), "05/03/2024");
    }
}
