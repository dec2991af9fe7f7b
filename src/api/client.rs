use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};

use super::error::ApiError;
use super::types::{LoginRequest, LoginResponse, UserEntry};
use crate::lead::ClientRecord;

pub const DEFAULT_API_URL: &str = "http://localhost:3011";

/// Leitura e escrita dos clientes na API.
pub trait ClientGateway {
    async fn list_clients(&self) -> Result<Vec<ClientRecord>, ApiError>;

    async fn update_client(&self, record: &ClientRecord) -> Result<(), ApiError>;
}

pub struct RecuperaApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl RecuperaApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Envia o token da sessão como `Bearer` em toda requisição.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// `POST /login`; devolve o token assinado da sessão.
    pub async fn login(&self, email: &str, senha: &str) -> Result<String, ApiError> {
        let req = LoginRequest {
            email: email.to_string(),
            senha: senha.to_string(),
        };
        let response = self
            .client
            .post(self.url("/login"))
            .json(&req)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::InvalidCredentials);
        }
        let body = Self::check(response).await?.json::<LoginResponse>().await?;
        match (body.success, body.token) {
            (true, Some(token)) if !token.trim().is_empty() => Ok(token),
            (true, _) => Err(ApiError::UnexpectedResponse(
                "login succeeded without a token".into(),
            )),
            (false, _) => {
                tracing::debug!(email, message = ?body.message, "login rejected");
                Err(ApiError::InvalidCredentials)
            }
        }
    }

    /// `GET /usuarios`.
    pub async fn list_users(&self) -> Result<Vec<UserEntry>, ApiError> {
        let response = self.authorized(self.client.get(self.url("/usuarios"))).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

impl ClientGateway for RecuperaApi {
    /// `GET /clientes`.
    async fn list_clients(&self) -> Result<Vec<ClientRecord>, ApiError> {
        let response = self.authorized(self.client.get(self.url("/clientes"))).send().await?;
        let mut clients: Vec<ClientRecord> = Self::check(response).await?.json().await?;
        for client in &mut clients {
            client.normalize();
        }
        Ok(clients)
    }

    /// `PUT /cliente/:id_cliente`.
    async fn update_client(&self, record: &ClientRecord) -> Result<(), ApiError> {
        let url = self.url(&format!("/cliente/{}", record.id_cliente));
        let response = self.authorized(self.client.put(url)).json(record).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
