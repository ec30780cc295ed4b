//! Domain and test-order command handlers

use crate::application::{DnsReport, Panel, TestOrder};

use super::app::{with_spinner, CliError};
use super::args::{DomainAction, TriggerArgs};
use super::config_cmd::report_save;
use super::presenter::Presenter;

/// Handle domain subcommand
pub async fn handle_domain_command(
    action: DomainAction,
    panel: &Panel,
    presenter: &mut Presenter,
) -> Result<(), CliError> {
    match action {
        DomainAction::Ip => {
            let ip = panel.domain().server_ip().await;
            if ip.is_empty() {
                return Err(CliError::NoServerAddress);
            }
            presenter.output(&ip);
            Ok(())
        }
        DomainAction::Check => {
            panel.load().await?;
            check_dns(panel, presenter).await?;
            Ok(())
        }
        DomainAction::Connect { whitelist } => {
            panel.load().await?;
            // Verification lives in memory, so every connect re-checks first.
            check_dns(panel, presenter).await?;

            let input = match whitelist {
                Some(input) => input,
                None => panel.whitelist_input().await.unwrap_or_default(),
            };

            let domain = panel.domain();
            let report = with_spinner(
                presenter,
                domain.connect_slot(),
                "Connecting domain...",
                domain.connect(&input),
            )
            .await?;

            report_save(&report.save, presenter);
            if report.proxy_created {
                presenter.info("Proxy config was missing; wrote a default one");
            }
            if report.origins_created {
                presenter.info("Dashboard origin config was missing; wrote a default one");
            }
            presenter.output(&format!("https://{}", report.domain));
            Ok(())
        }
    }
}

async fn check_dns(panel: &Panel, presenter: &mut Presenter) -> Result<DnsReport, CliError> {
    let domain = panel.domain();
    let report = with_spinner(
        presenter,
        domain.dns_slot(),
        "Checking DNS...",
        domain.check_dns(),
    )
    .await?;

    presenter.key_value("domain", &report.domain);
    presenter.key_value("server", &report.host_address);
    presenter.key_value(
        "records",
        &if report.records.is_empty() {
            "(none)".to_string()
        } else {
            report.records.join(", ")
        },
    );

    if !report.verdict.is_valid() {
        return Err(CliError::DnsInvalid(report.domain));
    }
    Ok(report)
}

/// Handle trigger subcommand
pub async fn handle_trigger(
    args: TriggerArgs,
    panel: &Panel,
    presenter: &mut Presenter,
) -> Result<(), CliError> {
    if !args.amount.is_finite() || args.amount <= 0.0 {
        return Err(CliError::Usage("Amount must be a positive number".to_string()));
    }
    panel.load().await?;

    let order = TestOrder {
        exchange: args.exchange.into(),
        symbol: args.symbol,
        signal: args.signal,
        amount: args.amount,
        extra: args.fields.into_iter().collect(),
    };

    presenter.start_spinner("Sending test order...");
    let response = panel.trigger().send(&order).await;
    presenter.stop_spinner();

    let response = response?;
    presenter.success("Order sent");
    if !response.trim().is_empty() {
        presenter.output(response.trim());
    }
    Ok(())
}
