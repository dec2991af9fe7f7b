//! Token de sessão do atendente.
//!
//! O token assinado devolvido por `POST /login` fica gravado em um arquivo
//! com nome fixo dentro do diretório de estado. Ele é decodificado
//! localmente (sem verificar a assinatura, que é responsabilidade da API)
//! para obter `{email, nome, tipo, exp}`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::error::RecuperaError;

/// Nome fixo do arquivo onde o token fica armazenado.
pub const TOKEN_KEY: &str = "token";

const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub nome: String,
    pub tipo: String,
    /// Expiração em segundos desde a época Unix.
    pub exp: i64,
}

impl Claims {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    pub fn is_admin(&self) -> bool {
        self.tipo.eq_ignore_ascii_case(ADMIN_ROLE)
    }

    /// Rejeita usuários que não são administradores.
    pub fn require_admin(&self) -> Result<(), RecuperaError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(RecuperaError::Forbidden(format!(
                "{} ({}) is not an administrator",
                self.nome, self.tipo
            )))
        }
    }
}

/// Decodifica as claims sem validar assinatura nem expiração.
pub fn decode_claims(token: &str) -> Result<Claims, RecuperaError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

/// Arquivo de token dentro do diretório de estado.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(TOKEN_KEY),
        }
    }

    pub fn save(&self, token: &str) -> Result<(), RecuperaError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, token.trim())?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<String>, RecuperaError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let token = std::fs::read_to_string(&self.path)?;
        let token = token.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    pub fn clear(&self) -> Result<(), RecuperaError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    /// Sessão atual: o token e suas claims.
    ///
    /// Um token ilegível ou expirado é apagado (logout) e vira
    /// [`RecuperaError::Session`]; sem token, [`RecuperaError::NotLoggedIn`].
    pub fn session(&self, now: DateTime<Utc>) -> Result<(String, Claims), RecuperaError> {
        let token = self.load()?.ok_or(RecuperaError::NotLoggedIn)?;
        match decode_claims(&token) {
            Ok(claims) if !claims.is_expired(now) => Ok((token, claims)),
            Ok(claims) => {
                self.logout_quietly();
                Err(RecuperaError::Session(format!(
                    "session of {} expired, log in again",
                    claims.email
                )))
            }
            Err(e) => {
                self.logout_quietly();
                Err(RecuperaError::Session(format!("invalid session token: {e}")))
            }
        }
    }

    /// Como [`TokenStore::session`], mas silencioso: qualquer falha é
    /// apenas registrada no log.
    pub fn current(&self, now: DateTime<Utc>) -> Option<(String, Claims)> {
        match self.session(now) {
            Ok(session) => Some(session),
            Err(RecuperaError::NotLoggedIn) => None,
            Err(e) => {
                tracing::debug!("logged out: {e}");
                None
            }
        }
    }

    fn logout_quietly(&self) {
        if let Err(e) = self.clear() {
            tracing::debug!("could not remove session token: {e}");
        }
    }
}
