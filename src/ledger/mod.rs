use crate::config::Config;
use serde::Deserialize;
use std::{collections::HashSet, fmt, io, io::Write, path::PathBuf, sync::Arc};
use tracing::{debug, info, warn};

mod client;
mod tx;

#[cfg(test)]
pub use client::fake::ScriptedClient;
pub use client::{Invocation, LedgerClient, ProcessClient};
use tx::parse_tx_output;

/// Native denomination of every amount the client reports.
pub const DENOM: &str = "upokt";
/// Smallest units per display unit.
pub const DENOMINATION_FACTOR: f64 = 1_000_000.0;

const NOT_FOUND_MARKERS: [&str; 2] = ["application not found", "key not found"];

pub fn to_display(raw: u64) -> f64 {
    raw as f64 / DENOMINATION_FACTOR
}

/// Stake to submit when topping up: the delta alone for accounts that do not exist yet.
pub fn next_stake(current: Option<u64>, amount: u64) -> u64 {
    match current {
        Some(current) => current.saturating_add(amount),
        None => amount,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub address: String,
    /// Raw stake in the smallest denomination.
    pub stake: u64,
    pub service_id: String,
    pub gateways: Vec<String>,
    /// Spendable balance in display units.
    pub balance: f64,
}

impl Account {
    pub fn display_stake(&self) -> f64 {
        to_display(self.stake)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDetails {
    pub details: String,
    pub balances: String,
}

/// Per-account outcome of a batch upstake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub address: String,
    pub result: Result<String, String>,
}

/// Everything a background operation needs to talk to one network, copied at dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTarget {
    pub network: String,
    pub endpoint: String,
    pub chain_id: String,
    pub home: PathBuf,
    pub keyring_backend: Option<String>,
    pub fees: String,
    pub funding_account: Option<String>,
    pub managed_accounts: Vec<String>,
}

impl LedgerTarget {
    pub fn from_config(config: &Config, name: &str) -> Option<Self> {
        let network = config.network(name)?;
        Some(Self {
            network: name.to_string(),
            endpoint: network.rpc_endpoint.clone(),
            chain_id: network.chain_id(name).to_string(),
            home: config.client_home(),
            keyring_backend: config.keyring_backend.clone(),
            fees: network.fees().to_string(),
            funding_account: network.funding_account().map(str::to_string),
            managed_accounts: network.applications.clone(),
        })
    }

    fn connection_flags(&self) -> Vec<String> {
        let mut flags = vec![
            format!("--node={}", self.endpoint),
            format!("--chain-id={}", self.chain_id),
            format!("--home={}", self.home.display()),
        ];
        if let Some(backend) = &self.keyring_backend {
            flags.push(format!("--keyring-backend={backend}"));
        }
        flags
    }

    fn query_flags(&self) -> Vec<String> {
        let mut flags = self.connection_flags();
        flags.push("--output=json".into());
        flags
    }

    fn broadcast_flags(&self) -> Vec<String> {
        let mut flags = self.connection_flags();
        flags.push(format!("--fees={}", self.fees));
        flags.push("--output=json".into());
        flags.push("--yes".into());
        flags
    }
}

#[derive(Debug)]
pub enum LedgerError {
    Spawn {
        program: String,
        source: io::Error,
    },
    CommandFailed {
        operation: &'static str,
        status: Option<i32>,
        output: String,
    },
    Parse {
        operation: &'static str,
        detail: String,
    },
    TransactionFailed {
        hash: String,
        log: String,
    },
    MissingFundingAccount(String),
    NoManagedAccounts(String),
    ParamFile(io::Error),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Spawn { program, source } => {
                write!(f, "failed to start {program}: {source}")
            }
            LedgerError::CommandFailed {
                operation,
                status,
                output,
            } => {
                let status = status.map_or_else(|| "signal".to_string(), |code| code.to_string());
                write!(f, "{operation} failed (exit {status}): {}", output.trim())
            }
            LedgerError::Parse { operation, detail } => {
                write!(f, "failed to parse {operation} output: {detail}")
            }
            LedgerError::TransactionFailed { hash, log } => {
                write!(f, "transaction failed with hash {hash}: {log}")
            }
            LedgerError::MissingFundingAccount(network) => {
                write!(f, "bank address not configured for network: {network}")
            }
            LedgerError::NoManagedAccounts(network) => {
                write!(f, "no applications configured for network: {network}")
            }
            LedgerError::ParamFile(err) => write!(f, "failed to write stake config file: {err}"),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Spawn { source, .. } => Some(source),
            LedgerError::ParamFile(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListApplicationsResponse {
    #[serde(default)]
    applications: Vec<RawApplication>,
}

#[derive(Debug, Deserialize)]
struct ShowApplicationResponse {
    application: RawApplication,
}

#[derive(Debug, Deserialize)]
struct RawApplication {
    address: String,
    #[serde(default)]
    stake: Option<RawCoin>,
    #[serde(default)]
    service_configs: Vec<RawServiceConfig>,
    #[serde(default)]
    delegatee_gateway_addresses: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawServiceConfig {
    service_id: String,
}

#[derive(Debug, Deserialize)]
struct RawCoin {
    #[serde(default)]
    amount: String,
    #[serde(default)]
    denom: String,
}

#[derive(Debug, Deserialize)]
struct BalancesResponse {
    #[serde(default)]
    balances: Vec<RawCoin>,
}

fn decode<'a, T: Deserialize<'a>>(operation: &'static str, raw: &'a str) -> Result<T, LedgerError> {
    serde_json::from_str(raw).map_err(|err| LedgerError::Parse {
        operation,
        detail: err.to_string(),
    })
}

/// Query and mutation operations, each a blocking call into the client.
#[derive(Clone)]
pub struct Ledger {
    client: Arc<dyn LedgerClient>,
}

impl Ledger {
    pub fn new(client: Arc<dyn LedgerClient>) -> Self {
        Self { client }
    }

    fn run(&self, operation: &'static str, args: Vec<String>) -> Result<Invocation, LedgerError> {
        let invocation = self.client.invoke(&args)?;
        if !invocation.success() {
            return Err(LedgerError::CommandFailed {
                operation,
                status: invocation.status,
                output: invocation.combined(),
            });
        }
        Ok(invocation)
    }

    fn broadcast(&self, operation: &'static str, args: Vec<String>) -> Result<String, LedgerError> {
        let invocation = self.run(operation, args)?;
        let outcome = parse_tx_output(&invocation.stdout, &invocation.stderr);
        if outcome.failed() {
            return Err(LedgerError::TransactionFailed {
                hash: outcome.hash,
                log: outcome.raw_log,
            });
        }
        if outcome.hash.is_empty() {
            return Err(LedgerError::Parse {
                operation,
                detail: format!("no transaction hash in output: {}", invocation.combined().trim()),
            });
        }
        info!(operation, hash = %outcome.hash, "transaction broadcast");
        Ok(outcome.hash)
    }

    /// Applications delegated to `gateway`, in the client's native order.
    pub fn list_accounts(
        &self,
        target: &LedgerTarget,
        gateway: &str,
        with_balances: bool,
    ) -> Result<Vec<Account>, LedgerError> {
        let mut args: Vec<String> = ["query", "application", "list-application"]
            .map(String::from)
            .to_vec();
        args.extend(target.query_flags());
        let invocation = self.run("list-application", args)?;
        let response: ListApplicationsResponse = decode("list-application", &invocation.stdout)?;

        let mut accounts = Vec::new();
        for app in response.applications {
            if !app.delegatee_gateway_addresses.iter().any(|gw| gw == gateway) {
                continue;
            }
            let stake = app
                .stake
                .as_ref()
                .map(|coin| {
                    coin.amount.parse::<u64>().unwrap_or_else(|_| {
                        warn!(address = %app.address, amount = %coin.amount, "unparseable stake");
                        0
                    })
                })
                .unwrap_or(0);
            let service_id = app
                .service_configs
                .first()
                .map(|config| config.service_id.clone())
                .unwrap_or_else(|| "-".to_string());
            let balance = if with_balances {
                self.query_balance(&app.address, target).unwrap_or_else(|err| {
                    warn!(address = %app.address, %err, "balance lookup failed, showing 0");
                    0.0
                })
            } else {
                0.0
            };
            accounts.push(Account {
                address: app.address,
                stake,
                service_id,
                gateways: app.delegatee_gateway_addresses,
                balance,
            });
        }
        debug!(count = accounts.len(), gateway, "applications loaded");
        Ok(accounts)
    }

    /// Native-denomination balance of `address` in display units, zero when absent.
    pub fn query_balance(&self, address: &str, target: &LedgerTarget) -> Result<f64, LedgerError> {
        let raw = self.raw_balances(address, target)?;
        let response: BalancesResponse = decode("bank balances", &raw)?;
        for coin in response.balances {
            if coin.denom == DENOM {
                let amount = coin.amount.parse::<u64>().map_err(|err| LedgerError::Parse {
                    operation: "bank balances",
                    detail: format!("invalid amount {:?}: {err}", coin.amount),
                })?;
                return Ok(to_display(amount));
            }
        }
        Ok(0.0)
    }

    fn raw_balances(&self, address: &str, target: &LedgerTarget) -> Result<String, LedgerError> {
        let mut args: Vec<String> = ["query", "bank", "balances", address]
            .map(String::from)
            .to_vec();
        args.extend(target.query_flags());
        Ok(self.run("bank balances", args)?.stdout)
    }

    fn show_application_args(address: &str, target: &LedgerTarget) -> Vec<String> {
        let mut args: Vec<String> = ["query", "application", "show-application", address]
            .map(String::from)
            .to_vec();
        args.extend(target.query_flags());
        args
    }

    /// Current raw stake, or `None` when the application does not exist on chain yet.
    pub fn current_stake(
        &self,
        address: &str,
        target: &LedgerTarget,
    ) -> Result<Option<u64>, LedgerError> {
        let invocation = self
            .client
            .invoke(&Self::show_application_args(address, target))?;
        if !invocation.success() {
            let output = invocation.combined();
            if NOT_FOUND_MARKERS.iter().any(|m| output.contains(m)) {
                debug!(address, "application not on chain yet");
                return Ok(None);
            }
            return Err(LedgerError::CommandFailed {
                operation: "show-application",
                status: invocation.status,
                output,
            });
        }
        let response: ShowApplicationResponse = decode("show-application", &invocation.stdout)?;
        let stake = response.application.stake.ok_or_else(|| LedgerError::Parse {
            operation: "show-application",
            detail: "stake field not found in application".into(),
        })?;
        let amount = stake.amount.parse::<u64>().map_err(|err| LedgerError::Parse {
            operation: "show-application",
            detail: format!("invalid stake amount {:?}: {err}", stake.amount),
        })?;
        Ok(Some(amount))
    }

    /// Raw application and balance documents for the detail view.
    pub fn show_account(
        &self,
        address: &str,
        target: &LedgerTarget,
    ) -> Result<AccountDetails, LedgerError> {
        let details = self
            .run("show-application", Self::show_application_args(address, target))?
            .stdout;
        let balances = self.raw_balances(address, target)?;
        Ok(AccountDetails { details, balances })
    }

    pub fn upstake(
        &self,
        address: &str,
        service_id: &str,
        amount: u64,
        target: &LedgerTarget,
    ) -> Result<String, LedgerError> {
        let current = self.current_stake(address, target)?;
        let new_stake = next_stake(current, amount);
        info!(address, ?current, new_stake, "upstaking application");

        let mut param_file = tempfile::Builder::new()
            .prefix("appstake_upstake_")
            .suffix(".yaml")
            .tempfile()
            .map_err(LedgerError::ParamFile)?;
        let contents = format!(
            "stake_amount: {new_stake}{DENOM}\nservice_ids:\n  - \"{service_id}\"\naddress: {address}\n"
        );
        if let Err(err) = param_file
            .write_all(contents.as_bytes())
            .and_then(|_| param_file.flush())
        {
            // Dropping the handle removes the partially written file.
            return Err(LedgerError::ParamFile(err));
        }

        let mut args: Vec<String> = ["tx", "application", "stake-application"]
            .map(String::from)
            .to_vec();
        args.push(format!("--config={}", param_file.path().display()));
        args.push(format!("--from={address}"));
        args.extend(target.broadcast_flags());

        let result = self.broadcast("stake-application", args);
        if let Err(err) = param_file.close() {
            warn!(%err, "failed to remove stake config file");
        }
        result
    }

    pub fn fund(&self, address: &str, amount: u64, target: &LedgerTarget) -> Result<String, LedgerError> {
        let bank = target
            .funding_account
            .clone()
            .ok_or_else(|| LedgerError::MissingFundingAccount(target.network.clone()))?;
        let mut args: Vec<String> = vec![
            "tx".into(),
            "bank".into(),
            "send".into(),
            bank,
            address.to_string(),
            format!("{amount}{DENOM}"),
        ];
        args.extend(target.broadcast_flags());
        self.broadcast("bank send", args)
    }

    /// One multi-send from the funding account splitting `amount` × N across all managed accounts.
    pub fn fund_all(&self, amount: u64, target: &LedgerTarget) -> Result<String, LedgerError> {
        let bank = target
            .funding_account
            .clone()
            .ok_or_else(|| LedgerError::MissingFundingAccount(target.network.clone()))?;
        if target.managed_accounts.is_empty() {
            return Err(LedgerError::NoManagedAccounts(target.network.clone()));
        }
        let total = amount.saturating_mul(target.managed_accounts.len() as u64);
        let mut args: Vec<String> = vec!["tx".into(), "bank".into(), "multi-send".into(), bank];
        args.extend(target.managed_accounts.iter().cloned());
        args.push(format!("{total}{DENOM}"));
        args.extend(target.connection_flags());
        args.extend(
            [
                "--split",
                "--yes",
                "--gas=auto",
                "--gas-prices=1upokt",
                "--gas-adjustment=2.5",
                "--output=json",
            ]
            .map(String::from),
        );
        self.broadcast("bank multi-send", args)
    }

    /// Upstake every live account that is also managed on this network.
    /// A failure on one account never stops the rest.
    pub fn upstake_all(&self, amount: u64, target: &LedgerTarget, accounts: &[Account]) -> Vec<Receipt> {
        let managed: HashSet<&str> = target.managed_accounts.iter().map(String::as_str).collect();
        accounts
            .iter()
            .filter(|account| managed.contains(account.address.as_str()))
            .map(|account| {
                let result = self
                    .upstake(&account.address, &account.service_id, amount, target)
                    .map_err(|err| err.to_string());
                Receipt {
                    address: account.address.clone(),
                    result,
                }
            })
            .collect()
    }
}
