//! Interface de terminal do nrecupera: spinners e saída colorida.
//!
//! Usa as crates `indicatif` para spinners de progresso e `console` para
//! estilização com cores. O [`Spinner`] acompanha chamadas de rede e
//! leitura de planilha; as funções `print_*` desenham as telas do CRM.

use std::time::Duration;

use console::{Style, style};
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::UserEntry;
use crate::dashboard::RecoveryKpis;
use crate::lead::{ClientRecord, Offer, QueueRule, ReasonSet, StatusBadge, WorklistRow};
use crate::upload::UploadSummary;

/// Spinner para operações de I/O demoradas.
///
/// Sucesso é mostrado em verde com checkmark; falha em vermelho com X.
pub struct Spinner {
    pb: ProgressBar,
    green: Style,
    red: Style,
}

impl Spinner {
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
        }
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.pb.set_message(message.into());
    }

    pub fn success(&self, message: &str) {
        self.pb.finish_and_clear();
        println!("  {} {message}", self.green.apply_to("✓"));
    }

    pub fn fail(&self, message: &str) {
        self.pb.finish_and_clear();
        println!("  {} {message}", self.red.apply_to("✗"));
    }
}

fn badge_style(badge: StatusBadge) -> Style {
    match badge {
        StatusBadge::Recuperado => Style::new().green().bold(),
        StatusBadge::EmContato => Style::new().cyan(),
        StatusBadge::NaoAtendeu => Style::new().yellow(),
        StatusBadge::ContatoEncerrado => Style::new().red(),
        StatusBadge::Pendente => Style::new().dim(),
    }
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

/// Cartão do cliente oferecido ao atendente.
pub fn print_offer(offer: &Offer<'_>) {
    let heading = match offer.rule {
        QueueRule::Available => "Próximo cliente",
        QueueRule::Retry => "Nova tentativa",
    };
    println!("{}", style(format!("─── {heading} ───")).bold());
    print_client(offer.client);
}

pub fn print_client(c: &ClientRecord) {
    println!("  {:<22} {}", style("Cliente").dim(), style(&c.nome).bold());
    println!("  {:<22} {}", style("id_cliente").dim(), c.id_cliente);
    println!("  {:<22} {}", style("Contrato").dim(), or_dash(&c.id_contrato));
    println!("  {:<22} {}", style("Telefone").dim(), or_dash(&c.telefone));
    println!("  {:<22} {}", style("E-mail").dim(), or_dash(&c.email));
    println!("  {:<22} {}", style("Meses de base").dim(), c.meses_base);
    println!("  {:<22} {}", style("Score").dim(), c.score);
    println!(
        "  {:<22} {}",
        style("Motivo cancelamento").dim(),
        or_dash(&c.motivo_cancelamento)
    );
    println!(
        "  {:<22} {}",
        style("Data cancelamento").dim(),
        or_dash(&c.data_cancelamento)
    );
    let badge = StatusBadge::for_client(c);
    println!(
        "  {:<22} {}",
        style("Status").dim(),
        badge_style(badge).apply_to(badge.label())
    );
}

pub fn print_queue(offers: &[Offer<'_>]) {
    if offers.is_empty() {
        println!("  Nenhum cliente disponível na fila.");
        return;
    }
    for offer in offers {
        let rule = match offer.rule {
            QueueRule::Available => style("novo").green(),
            QueueRule::Retry => style("retorno").yellow(),
        };
        println!(
            "  {:>8}  {:>6}  {:<8} {}",
            offer.client.id_cliente, offer.client.score, rule, offer.client.nome
        );
    }
}

/// Tabela de clientes aceitos.
pub fn print_worklist(rows: &[WorklistRow<'_>]) {
    if rows.is_empty() {
        println!("  Nenhum cliente aceito.");
        return;
    }
    println!(
        "  {}",
        style(format!(
            "{:>8}  {:<28} {:<14} {:<18} {}",
            "ID", "Nome", "Telefone", "Status", "Aceito em"
        ))
        .bold()
    );
    for row in rows {
        let c = row.client;
        let lock = if row.editable { " " } else { "🔒" };
        println!(
            "  {:>8}  {:<28} {:<14} {:<18} {} {}",
            c.id_cliente,
            c.nome,
            or_dash(&c.telefone),
            badge_style(row.badge).apply_to(row.badge.label()),
            or_dash(&c.data_contato_aceitacao),
            lock
        );
    }
}

pub fn print_reasons() {
    for (title, set) in [
        ("Recuperado", ReasonSet::Recovered),
        ("Não recuperado", ReasonSet::NotRecovered),
    ] {
        println!("{}", style(format!("─── {title} ───")).bold());
        for reason in set.reasons() {
            println!("  {:>4}  {}", reason.id, reason.description);
        }
    }
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

pub fn print_dashboard(kpis: &RecoveryKpis) {
    println!("{}", style("─── Indicadores de recuperação ───").bold());
    println!("  {:<24} {}", "Clientes na base", kpis.total);
    println!("  {:<24} {}", "Disponíveis", kpis.available);
    println!("  {:<24} {}", "Aceitos", kpis.assigned);
    println!("  {:<24} {}", "Contatados", kpis.contacted);
    println!("  {:<24} {}", "Em contato", kpis.in_contact);
    println!("  {:<24} {}", "Não atendeu", kpis.no_answer);
    println!("  {:<24} {}", "Contato encerrado", kpis.closed);
    println!(
        "  {:<24} {}",
        "Recuperados",
        style(kpis.recovered).green().bold()
    );
    println!(
        "  {:<24} {}",
        "Taxa de recuperação",
        style(percent(kpis.recovery_rate)).bold()
    );

    if !kpis.by_agent.is_empty() {
        println!();
        println!("{}", style("─── Por atendente ───").bold());
        for (agent, k) in &kpis.by_agent {
            println!(
                "  {:<20} aceitos {:>4}  recuperados {:>4}  taxa {:>6}",
                agent,
                k.assigned,
                k.recovered,
                percent(k.recovery_rate)
            );
        }
    }

    for (title, counts) in [
        ("Motivos de cancelamento", &kpis.by_cancel_reason),
        ("Diagnósticos", &kpis.by_diagnostic),
    ] {
        if counts.is_empty() {
            continue;
        }
        println!();
        println!("{}", style(format!("─── {title} ───")).bold());
        for (label, count) in counts {
            println!("  {count:>5}  {label}");
        }
    }
}

pub fn print_users(users: &[UserEntry]) {
    for user in users {
        match user {
            UserEntry::Record {
                email: Some(email), ..
            } => println!("  {}  {}", user.name(), style(email).dim()),
            _ => println!("  {}", user.name()),
        }
    }
}

pub fn print_upload(summary: &UploadSummary) {
    println!(
        "  {} {} registros enviados",
        style("✓").green().bold(),
        summary.sent
    );
    for (id, error) in &summary.failed {
        println!("  {} {id}: {error}", style("✗").red().bold());
    }
}
