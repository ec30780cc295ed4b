//! Test order use case: POST an order payload to the running bot

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::config::PASSWORD;
use crate::domain::error::ConfigNotLoaded;

use super::ports::{CommandError, CommandRunner};
use super::SharedStore;

/// Errors from the trigger use case
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error(transparent)]
    NotLoaded(#[from] ConfigNotLoaded),

    #[error("PASSWORD is not set")]
    MissingPassword,

    #[error("Unknown exchange: {0}")]
    UnknownExchange(String),

    #[error("Failed to encode order: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Order request failed: {0}")]
    Request(#[from] CommandError),
}

/// Exchanges the bot accepts test orders for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Binance,
    Bybit,
    Bitget,
    Okx,
}

impl Exchange {
    pub const ALL: [Exchange; 4] = [Self::Binance, Self::Bybit, Self::Bitget, Self::Okx];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::Bybit => "bybit",
            Self::Bitget => "bitget",
            Self::Okx => "okx",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TriggerError::UnknownExchange(s.to_string()))
    }
}

/// A test order as entered by the operator
#[derive(Debug, Clone, PartialEq)]
pub struct TestOrder {
    pub exchange: Exchange,
    pub symbol: String,
    pub signal: String,
    pub amount: f64,
    /// Exchange-specific optional fields, sent as-is
    pub extra: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct OrderPayload<'a> {
    password: &'a str,
    exchange: Exchange,
    symbol: &'a str,
    signal: &'a str,
    amount: f64,
    #[serde(flatten)]
    extra: &'a BTreeMap<String, String>,
}

/// Test order trigger
pub struct OrderTrigger {
    runner: Arc<dyn CommandRunner>,
    store: SharedStore,
    container_name: String,
    container_port: u16,
}

impl OrderTrigger {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        store: SharedStore,
        container_name: impl Into<String>,
        container_port: u16,
    ) -> Self {
        Self {
            runner,
            store,
            container_name: container_name.into(),
            container_port,
        }
    }

    /// Host port the bot's HTTP port is published on, the container port if unknown
    pub async fn discover_port(&self) -> u16 {
        let container_port = self.container_port.to_string();
        let published = self
            .runner
            .run(&["podman", "port", &self.container_name, &container_port])
            .await;

        match published {
            Ok(out) => parse_published_port(&out).unwrap_or(self.container_port),
            Err(e) => {
                debug!(error = %e, "Port lookup failed, using container port");
                self.container_port
            }
        }
    }

    /// Send `order` and return the bot's raw response text
    pub async fn send(&self, order: &TestOrder) -> Result<String, TriggerError> {
        let password = {
            let store = self.store.lock().await;
            store.config().ok_or(ConfigNotLoaded)?.text(PASSWORD).to_string()
        };
        if password.is_empty() {
            return Err(TriggerError::MissingPassword);
        }

        let body = serde_json::to_string(&OrderPayload {
            password: &password,
            exchange: order.exchange,
            symbol: &order.symbol,
            signal: &order.signal,
            amount: order.amount,
            extra: &order.extra,
        })?;

        let port = self.discover_port().await;
        let url = format!("http://127.0.0.1:{port}/order");
        info!(%url, exchange = %order.exchange, symbol = %order.symbol, "Sending test order");

        // The body carries the password, so it goes through stdin and stays out of argv.
        let response = self
            .runner
            .run_with_input(
                &[
                    "curl",
                    "-sS",
                    "-X",
                    "POST",
                    "-H",
                    "Content-Type: application/json",
                    "--data-binary",
                    "@-",
                    &url,
                ],
                &body,
            )
            .await?;
        Ok(response)
    }
}

/// Port from `podman port` output such as `0.0.0.0:8000`
fn parse_published_port(output: &str) -> Option<u16> {
    output
        .lines()
        .filter_map(|line| line.trim().rsplit_once(':'))
        .find_map(|(_, port)| port.parse().ok())
}
