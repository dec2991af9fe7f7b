//! Falhas ao falar com o backend do N-Recupera.
//!
//! O backend responde de três jeitos que interessam à CLI: recusa o login
//! (401 ou `success: false`), devolve um status de erro em qualquer rota
//! de clientes ou usuários, ou responde 2xx com um corpo que não serve.
//! Problemas de transporte chegam do `reqwest` sem tradução.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// E-mail ou senha recusados em `POST /login`.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Status 4xx/5xx; `message` é o corpo devolvido, como veio.
    #[error("API returned status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected API response: {0}")]
    UnexpectedResponse(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
