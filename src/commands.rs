//! Execução dos subcomandos da CLI.
//!
//! Cada comando abre a sessão do atendente a partir do snapshot local,
//! aplica a operação e grava o snapshot de volta. Envios à API e a
//! regravação da planilha são melhor esforço: falhas só vão para o log.

use anyhow::{Context as _, Result};
use chrono::{Local, NaiveDate, Utc};
use console::{Term, style};

use crate::api::{ClientGateway, RecuperaApi};
use crate::auth::{Claims, TokenStore, decode_claims};
use crate::cli::{Cli, Command, ContactArgs};
use crate::config::NRecuperaConfig;
use crate::dashboard::{RecoveryKpis, report};
use crate::error::RecuperaError;
use crate::lead::{ClientRecord, ContactStatus};
use crate::session::{AgentSession, SessionShelf, SessionSnapshot};
use crate::spreadsheet::{SheetCache, persist_assignment};
use crate::ui::{self, Spinner};
use crate::upload::{read_upload_file, upload};

pub async fn run(cli: Cli) -> Result<()> {
    let config = NRecuperaConfig::load(cli.config.as_deref())?;
    let app = App::new(config, cli.agent);

    match cli.command {
        Command::Login { email, senha } => app.login(&email, senha).await,
        Command::Logout => app.logout(),
        Command::Import { source, sheet } => app.import(source, sheet).await,
        Command::Sync => app.sync().await,
        Command::Next { all } => app.next(all),
        Command::Accept { id } => app.accept(id.as_deref()).await,
        Command::Skip { id } => app.skip(id.as_deref()),
        Command::Contact(args) => app.contact(&args).await,
        Command::Worklist { json } => app.worklist(json),
        Command::Dashboard { json } => app.dashboard(json).await,
        Command::Report { of, output } => app.report(of.as_deref(), output.as_deref()).await,
        Command::Upload { file } => app.upload(&file).await,
        Command::Users => app.users().await,
    }
}

pub struct App {
    config: NRecuperaConfig,
    tokens: TokenStore,
    agent_override: Option<String>,
    /// Planilhas já baixadas nesta execução; a regravação do `assignedTo`
    /// reaproveita os bytes lidos pela importação.
    sheets: SheetCache,
}

impl App {
    pub fn new(config: NRecuperaConfig, agent_override: Option<String>) -> Self {
        let tokens = TokenStore::new(&config.state_dir);
        Self {
            config,
            tokens,
            agent_override,
            sheets: SheetCache::new(),
        }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn current_session(&self) -> Option<(String, Claims)> {
        self.tokens.current(Utc::now())
    }

    /// Atendente da operação: `--agent`, depois a configuração, depois o
    /// usuário da sessão.
    fn agent(&self) -> Result<String, RecuperaError> {
        if let Some(agent) = self.agent_override.clone().or_else(|| self.config.agent.clone()) {
            return Ok(agent);
        }
        self.current_session()
            .map(|(_, claims)| claims.nome)
            .ok_or(RecuperaError::NotLoggedIn)
    }

    fn require_admin(&self) -> Result<Claims, RecuperaError> {
        let (_, claims) = self.tokens.session(Utc::now())?;
        claims.require_admin()?;
        Ok(claims)
    }

    fn api(&self) -> Result<RecuperaApi, RecuperaError> {
        let token = self.current_session().map(|(token, _)| token);
        Ok(RecuperaApi::new(&self.config.api_url)?.with_token(token))
    }

    fn open_session(&self) -> Result<(AgentSession, SessionShelf)> {
        let agent = self.agent()?;
        let path = self.config.session_path();
        let snapshot = SessionSnapshot::load(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(snapshot.into_session(&agent))
    }

    fn save_session(&self, session: AgentSession, shelf: SessionShelf) -> Result<()> {
        let path = self.config.session_path();
        session
            .into_snapshot(shelf)
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// Envia o registro à API; falhas só vão para o log.
    async fn push(&self, record: &ClientRecord) {
        if !self.config.push_updates {
            return;
        }
        let result = match self.api() {
            Ok(api) => api.update_client(record).await.map_err(RecuperaError::from),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => tracing::debug!(id = %record.id_cliente, "update sent to the API"),
            Err(e) => tracing::error!(id = %record.id_cliente, "could not send update to the API: {e}"),
        }
    }

    async fn login(&self, email: &str, senha: Option<String>) -> Result<()> {
        let senha = match senha {
            Some(senha) => senha,
            None => {
                let term = Term::stderr();
                term.write_str("Senha: ")?;
                term.read_secure_line()?
            }
        };

        let spinner = Spinner::start("Autenticando...");
        let token = match self.api()?.login(email, &senha).await {
            Ok(token) => token,
            Err(e) => {
                spinner.fail("Falha no login");
                return Err(RecuperaError::from(e).into());
            }
        };
        let claims = decode_claims(&token)?;
        self.tokens.save(&token)?;
        spinner.success(&format!("Bem-vindo(a), {} ({})", claims.nome, claims.tipo));
        tracing::info!(user = %claims.email, "logged in");
        Ok(())
    }

    fn logout(&self) -> Result<()> {
        self.tokens.clear()?;
        println!("  Sessão encerrada.");
        Ok(())
    }

    /// Importa uma ou mais abas da mesma fonte. A fonte é baixada uma vez;
    /// um id repetido entre abas fica com a primeira ocorrência.
    async fn import(&self, source: Option<String>, sheets: Vec<String>) -> Result<()> {
        let source = source.unwrap_or_else(|| self.config.spreadsheet_source.clone());
        let sheets = if sheets.is_empty() {
            vec![self.config.sheet_name.clone()]
        } else {
            sheets
        };
        let (mut session, shelf) = self.open_session()?;

        let spinner = Spinner::start(&format!("Lendo {source}..."));
        let mut clients = Vec::new();
        for sheet in &sheets {
            spinner.set_message(format!("Lendo {source} ({sheet})..."));
            match self.sheets.get(&source, sheet).await {
                Ok(rows) => clients.extend(rows.iter().cloned()),
                Err(e) => {
                    spinner.fail("Não foi possível ler a planilha");
                    return Err(e.into());
                }
            }
        }

        session.reload(clients);
        spinner.success(&format!("{} clientes importados", session.store().len()));
        self.save_session(session, shelf)
    }

    async fn sync(&self) -> Result<()> {
        let (mut session, shelf) = self.open_session()?;

        let spinner = Spinner::start("Buscando clientes na API...");
        let clients = match self.api()?.list_clients().await {
            Ok(clients) => clients,
            Err(e) => {
                spinner.fail("Não foi possível buscar os clientes");
                return Err(RecuperaError::from(e).into());
            }
        };

        session.reload(clients);
        spinner.success(&format!("{} clientes carregados", session.store().len()));
        self.save_session(session, shelf)
    }

    fn next(&self, all: bool) -> Result<()> {
        let (session, _) = self.open_session()?;
        if all {
            ui::print_queue(&session.pending());
            return Ok(());
        }
        if let Some(selected) = session.selected() {
            println!(
                "  {} cliente {} ainda está selecionado",
                style("!").yellow().bold(),
                selected.id_cliente
            );
        }
        match session.next_lead() {
            Some(offer) => ui::print_offer(&offer),
            None => println!("  Nenhum cliente disponível na fila."),
        }
        Ok(())
    }

    async fn accept(&self, id: Option<&str>) -> Result<()> {
        let (mut session, shelf) = self.open_session()?;
        let Some(record) = session.accept(id, Self::today())? else {
            println!("  Nenhum cliente disponível na fila.");
            return Ok(());
        };
        let agent = session.agent().to_string();
        self.save_session(session, shelf)?;

        ui::print_client(&record);
        self.push(&record).await;
        if self.config.write_spreadsheet {
            persist_assignment(
                &self.sheets,
                &self.config.spreadsheet_source,
                &self.config.sheet_name,
                &record.id_cliente,
                &agent,
                &self.config.download_dir,
            )
            .await;
        }
        Ok(())
    }

    fn skip(&self, id: Option<&str>) -> Result<()> {
        let (mut session, shelf) = self.open_session()?;
        let id = match id {
            Some(id) => id.to_string(),
            None => session
                .selected()
                .or_else(|| session.next_lead().map(|offer| offer.client))
                .map(|c| c.id_cliente.clone())
                .ok_or_else(|| anyhow::anyhow!("no lead to skip"))?,
        };
        session.skip(&id)?;
        println!("  Cliente {id} pulado nesta sessão.");
        self.save_session(session, shelf)
    }

    async fn contact(&self, args: &ContactArgs) -> Result<()> {
        if args.list_reasons {
            ui::print_reasons();
            return Ok(());
        }

        let (mut session, shelf) = self.open_session()?;
        if let Some(id) = &args.id {
            session.select(id)?;
        }
        let record = session.save_contact(&args.form(), Self::today())?;
        self.save_session(session, shelf)?;

        let label = match record.contact_status {
            ContactStatus::NotStarted => "sem status",
            status => status.as_str(),
        };
        println!(
            "  {} cliente {} salvo como {}",
            style("✓").green().bold(),
            record.id_cliente,
            style(label).bold()
        );
        self.push(&record).await;
        Ok(())
    }

    fn worklist(&self, json: bool) -> Result<()> {
        let (session, _) = self.open_session()?;
        let rows = session.worklist();
        if json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        } else {
            ui::print_worklist(&rows);
        }
        Ok(())
    }

    /// Clientes das telas de gestão: a API quando responde, senão o
    /// snapshot local.
    async fn all_clients(&self) -> Result<Vec<ClientRecord>> {
        match self.api()?.list_clients().await {
            Ok(clients) => Ok(clients),
            Err(e) => {
                tracing::warn!("API unavailable, using local snapshot: {e}");
                Ok(SessionSnapshot::load(&self.config.session_path())?.clients)
            }
        }
    }

    async fn dashboard(&self, json: bool) -> Result<()> {
        self.require_admin()?;
        let clients = self.all_clients().await?;
        let kpis = RecoveryKpis::compute(&clients);
        if json {
            println!("{}", serde_json::to_string_pretty(&kpis)?);
        } else {
            ui::print_dashboard(&kpis);
        }
        Ok(())
    }

    async fn report(&self, of: Option<&str>, output: Option<&std::path::Path>) -> Result<()> {
        let clients = self.all_clients().await?;
        let lines = report(&clients, of);
        let json = serde_json::to_string_pretty(&lines)?;
        match output {
            Some(path) => {
                tokio::fs::write(path, json).await?;
                println!("  {} linhas gravadas em {}", lines.len(), path.display());
            }
            None => println!("{json}"),
        }
        Ok(())
    }

    async fn upload(&self, file: &std::path::Path) -> Result<()> {
        self.require_admin()?;
        let records = read_upload_file(file).await?;
        let api = self.api()?;

        let spinner = Spinner::start("Enviando clientes...");
        let total = records.len();
        let summary = upload(&api, &records, |i, record| {
            spinner.set_message(format!("[{}/{total}] {}", i + 1, record.id_cliente));
        })
        .await;

        if summary.failed.is_empty() {
            spinner.success("Carga concluída");
        } else {
            spinner.fail("Carga concluída com falhas");
        }
        ui::print_upload(&summary);
        Ok(())
    }

    async fn users(&self) -> Result<()> {
        let users = self.api()?.list_users().await.map_err(RecuperaError::from)?;
        ui::print_users(&users);
        Ok(())
    }
}
