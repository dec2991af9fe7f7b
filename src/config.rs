//! Configuração do nrecupera carregada a partir de `nrecupera.toml`.
//!
//! A struct [`NRecuperaConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `NRECUPERA_API_URL` e `NRECUPERA_AGENT` têm
//! precedência sobre o arquivo.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::api::client::DEFAULT_API_URL;
use crate::error::RecuperaError;

pub const CONFIG_FILE: &str = "nrecupera.toml";
pub const SESSION_FILE: &str = "session.json";

/// Configuração de nível superior carregada de `nrecupera.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct NRecuperaConfig {
    /// URL base da API do CRM.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Planilha de origem: URL ou caminho local.
    #[serde(default = "default_spreadsheet_source")]
    pub spreadsheet_source: String,

    /// Aba lida quando nenhuma é informada na linha de comando.
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Diretório com o token de sessão e o snapshot local.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Onde a planilha regravada é salva.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Envia `PUT /cliente/:id` a cada aceite ou contato salvo.
    #[serde(default = "default_push_updates")]
    pub push_updates: bool,

    /// Regrava `assignedTo` na planilha a cada aceite.
    #[serde(default)]
    pub write_spreadsheet: bool,

    /// Atendente padrão quando não há `--agent` nem sessão.
    #[serde(default)]
    pub agent: Option<String>,
}

// Valor padrão para a API: servidor local na porta 3011.
fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_spreadsheet_source() -> String {
    "planilha.xlsx".to_string()
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".nrecupera")
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_push_updates() -> bool {
    true
}

impl Default for NRecuperaConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            spreadsheet_source: default_spreadsheet_source(),
            sheet_name: default_sheet_name(),
            state_dir: default_state_dir(),
            download_dir: default_download_dir(),
            push_updates: default_push_updates(),
            write_spreadsheet: false,
            agent: None,
        }
    }
}

impl NRecuperaConfig {
    /// Carrega a configuração de `path` (ou `nrecupera.toml` no diretório
    /// atual). Usa valores padrão se o arquivo não existir.
    pub fn load(path: Option<&Path>) -> Result<Self, RecuperaError> {
        let path = path.unwrap_or_else(|| Path::new(CONFIG_FILE));
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<NRecuperaConfig>(&contents)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    // Variáveis de ambiente têm precedência sobre o arquivo.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("NRECUPERA_API_URL").filter(|v| !v.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(agent) = var("NRECUPERA_AGENT").filter(|v| !v.trim().is_empty()) {
            self.agent = Some(agent);
        }
    }

    fn validate(&self) -> Result<(), RecuperaError> {
        if self.api_url.trim().is_empty() {
            return Err(RecuperaError::Config("api_url must not be empty".into()));
        }
        if self.sheet_name.trim().is_empty() {
            return Err(RecuperaError::Config("sheet_name must not be empty".into()));
        }
        Ok(())
    }

    pub fn session_path(&self) -> PathBuf {
        self.state_dir.join(SESSION_FILE)
    }
}
