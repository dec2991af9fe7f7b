//! Interface de linha de comando do nrecupera baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] e flags globais
//! (--agent, --config, --verbose). Cada subcomando corresponde a uma tela
//! do CRM de recuperação.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::lead::{ContactChannel, ContactForm};

/// nrecupera: fila de recuperação de clientes cancelados.
#[derive(Debug, Parser)]
#[command(name = "nrecupera", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Atendente que executa a operação (padrão: usuário da sessão).
    #[arg(long, global = true)]
    pub agent: Option<String>,

    /// Arquivo de configuração (padrão: ./nrecupera.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Canal de contato aceito pela CLI, mapeado para [`ContactChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChannelArg {
    Whatsapp,
    Telefone,
}

impl From<ChannelArg> for ContactChannel {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Whatsapp => ContactChannel::Whatsapp,
            ChannelArg::Telefone => ContactChannel::Telefone,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Autentica na API e guarda o token de sessão.
    Login {
        #[arg(long)]
        email: String,

        /// Senha; lida da entrada padrão quando omitida.
        #[arg(long)]
        senha: Option<String>,
    },

    /// Remove o token de sessão.
    Logout,

    /// Importa os clientes da planilha para o armazenamento local.
    Import {
        /// URL ou caminho da planilha (padrão: configuração).
        #[arg(long)]
        source: Option<String>,

        /// Aba a ler; repita para importar várias (padrão: configuração).
        #[arg(long)]
        sheet: Vec<String>,
    },

    /// Carrega os clientes de `GET /clientes`.
    Sync,

    /// Mostra o próximo cliente da fila.
    Next {
        /// Lista toda a fila em vez de só o próximo.
        #[arg(long)]
        all: bool,
    },

    /// Aceita o próximo cliente da fila (ou o informado).
    Accept {
        /// `id_cliente` a aceitar.
        #[arg(long)]
        id: Option<String>,
    },

    /// Pula um cliente nesta sessão.
    Skip {
        /// `id_cliente` a pular (padrão: o selecionado ou o próximo da fila).
        #[arg(long)]
        id: Option<String>,
    },

    /// Registra o resultado do contato com o cliente selecionado.
    Contact(ContactArgs),

    /// Lista os clientes aceitos pelo atendente.
    Worklist {
        /// Saída em JSON.
        #[arg(long)]
        json: bool,
    },

    /// Indicadores de recuperação (somente administradores).
    Dashboard {
        /// Saída em JSON.
        #[arg(long)]
        json: bool,
    },

    /// Relatório de atendimentos encerrados, em JSON.
    Report {
        /// Restringe o relatório a um atendente.
        #[arg(long)]
        of: Option<String>,

        /// Grava o relatório no arquivo em vez de imprimir.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Envia clientes de um arquivo JSON ou CSV para a API.
    Upload {
        /// Arquivo `.json` ou `.csv`.
        file: PathBuf,
    },

    /// Lista os usuários cadastrados.
    Users,
}

#[derive(Debug, Clone, Args)]
pub struct ContactArgs {
    /// Edita um cliente já aceito em vez do selecionado.
    #[arg(long)]
    pub id: Option<String>,

    /// Houve tentativa de contato.
    #[arg(long)]
    pub contact_made: bool,

    /// O cliente atendeu.
    #[arg(long, conflicts_with = "no_answer")]
    pub answered: bool,

    /// O cliente não atendeu.
    #[arg(long)]
    pub no_answer: bool,

    /// Canal usado quando o cliente atendeu.
    #[arg(long, value_enum)]
    pub channel: Option<ChannelArg>,

    /// O cliente foi recuperado.
    #[arg(long)]
    pub recovered: bool,

    /// Encerra o contato sem recuperação.
    #[arg(long)]
    pub close: bool,

    /// Id do diagnóstico (veja `--list-reasons`).
    #[arg(long)]
    pub diagnostic: Option<u32>,

    /// Observações do atendente.
    #[arg(long, default_value = "")]
    pub notes: String,

    /// Lista os diagnósticos disponíveis e sai.
    #[arg(long)]
    pub list_reasons: bool,
}

impl ContactArgs {
    pub fn form(&self) -> ContactForm {
        let answered = if self.answered {
            Some(true)
        } else if self.no_answer {
            Some(false)
        } else {
            None
        };
        ContactForm {
            contact_made: self.contact_made || answered.is_some(),
            answered,
            contact_channel: self.channel.map(Into::into),
            recovered: self.recovered,
            should_close_contact: self.close,
            diagnostic_id: self.diagnostic,
            notes: self.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn contact(args: &[&str]) -> ContactArgs {
        let argv = ["nrecupera", "contact"].iter().chain(args.iter()).copied();
        match Cli::parse_from(argv).command {
            Command::Contact(args) => args,
            other => panic!("expected Contact command, got {other:?}"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from(["nrecupera", "--agent", "Ana", "--verbose", "next"]);
        assert!(cli.verbose);
        assert_eq!(cli.agent.as_deref(), Some("Ana"));
        assert!(matches!(cli.command, Command::Next { all: false }));
    }

    #[test]
    fn cli_parses_import_overrides() {
        let cli = Cli::parse_from(["nrecupera", "import", "--sheet", "Sul", "--sheet", "Norte"]);
        match cli.command {
            Command::Import { source, sheet } => {
                assert!(source.is_none());
                assert_eq!(sheet, vec!["Sul", "Norte"]);
            }
            _ => panic!("expected Import command"),
        }
    }

    #[test]
    fn contact_flags_build_the_form() {
        let args = contact(&[
            "--answered",
            "--channel",
            "whatsapp",
            "--recovered",
            "--diagnostic",
            "2",
            "--notes",
            "Upgrade para 500 mega",
        ]);
        let form = args.form();
        assert!(form.contact_made);
        assert_eq!(form.answered, Some(true));
        assert_eq!(form.contact_channel, Some(ContactChannel::Whatsapp));
        assert!(form.recovered);
        assert_eq!(form.diagnostic_id, Some(2));
    }

    #[test]
    fn no_answer_with_close() {
        let form = contact(&["--contact-made", "--no-answer", "--close"]).form();
        assert_eq!(form.answered, Some(false));
        assert!(form.should_close_contact);
        assert!(form.contact_channel.is_none());
    }

    #[test]
    fn answered_conflicts_with_no_answer() {
        let result = Cli::try_parse_from(["nrecupera", "contact", "--answered", "--no-answer"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
