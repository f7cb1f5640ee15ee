use super::{
    accounts::{AccountList, Health},
    command::{self, Command},
    notifications::{NotificationKind, NotificationTracker},
};
use crate::{
    config::{Config, Thresholds},
    ledger::{Account, AccountDetails, LedgerError, LedgerTarget, Receipt},
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const BOOT_DELAY: Duration = Duration::from_secs(2);
pub const RECEIPTS_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Loading,
    Table,
    Command,
    Search,
    NetworkSelect,
    GatewaySelect,
    Help,
    ApplicationDetails,
    UpstakeAllReceipts,
}

impl ViewMode {
    /// Every mode except the detail view keeps the command bar at the bottom.
    pub fn has_command_bar(self) -> bool {
        !matches!(self, ViewMode::ApplicationDetails)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks everything except quitting.
    Fatal,
    /// Dismissed by the next keystroke.
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSlot {
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailView {
    pub address: String,
    pub details: String,
    pub balances: String,
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountsSnapshot {
    pub accounts: Vec<Account>,
    pub funding_balance: f64,
}

/// Failure reported by a mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// Broadcast went through but the chain rejected it.
    Transaction { hash: String, log: String },
    Failed(String),
}

impl From<LedgerError> for OperationError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::TransactionFailed { hash, log } => OperationError::Transaction { hash, log },
            other => OperationError::Failed(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    BootElapsed,
    ShowReceipts,
    NotificationExpired { kind: NotificationKind, token: u64 },
}

/// Everything that can wake the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Key(KeyEvent),
    ConfigLoaded(Result<Config, String>),
    AccountsLoaded {
        network: String,
        gateway: String,
        result: Result<AccountsSnapshot, String>,
    },
    DetailsLoaded {
        address: String,
        result: Result<AccountDetails, String>,
    },
    UpstakeFinished(Result<String, OperationError>),
    FundFinished(Result<String, OperationError>),
    UpstakeAllFinished(Vec<Receipt>),
    Timer(Timer),
}

/// Work the state machine asks the runtime to perform. Each one reports back
/// with exactly one [`Message`].
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadConfig,
    FetchAccounts {
        target: LedgerTarget,
        gateway: String,
        with_balances: bool,
    },
    FetchDetails {
        target: LedgerTarget,
        address: String,
    },
    Upstake {
        target: LedgerTarget,
        address: String,
        service_id: String,
        amount: u64,
    },
    Fund {
        target: LedgerTarget,
        address: String,
        amount: u64,
    },
    FundAll {
        target: LedgerTarget,
        amount: u64,
    },
    UpstakeAll {
        target: LedgerTarget,
        amount: u64,
        accounts: Vec<Account>,
    },
    Schedule {
        after: Duration,
        timer: Timer,
    },
    Quit,
}

/// The whole view model. Only [`ViewState::update`] changes it.
#[derive(Debug, Default)]
pub struct ViewState {
    pub mode: ViewMode,
    pub config: Option<Config>,
    pub network: String,
    pub gateway: String,
    pub networks: Vec<String>,
    pub network_cursor: usize,
    pub gateways: Vec<String>,
    pub gateway_cursor: usize,
    pub accounts: AccountList,
    pub funding_balance: f64,
    pub cursor: usize,
    pub command_input: String,
    pub search_input: String,
    pub search_matches: Vec<usize>,
    pub detail: DetailView,
    pub receipts: Vec<Receipt>,
    pub upstake_all_pending: bool,
    pub notifications: NotificationTracker,
    pub loading: bool,
    pub error: Option<ErrorSlot>,
    boot_elapsed: bool,
}

impl ViewState {
    /// Initial state plus the config load and the splash timer.
    pub fn boot() -> (Self, Vec<Effect>) {
        let state = Self {
            loading: true,
            ..Self::default()
        };
        let effects = vec![
            Effect::LoadConfig,
            Effect::Schedule {
                after: BOOT_DELAY,
                timer: Timer::BootElapsed,
            },
        ];
        (state, effects)
    }

    pub fn update(mut self, message: Message) -> (Self, Vec<Effect>) {
        let effects = self.apply(message);
        (self, effects)
    }

    pub fn thresholds(&self) -> Thresholds {
        self.config
            .as_ref()
            .map(|config| config.thresholds)
            .unwrap_or_default()
    }

    pub fn health(&self, account: &Account) -> Health {
        Health::classify(account.stake, &self.thresholds())
    }

    pub fn selected_account(&self) -> Option<&Account> {
        self.accounts.get(self.cursor)
    }

    pub fn fatal_error(&self) -> Option<&str> {
        self.error
            .as_ref()
            .filter(|slot| slot.severity == Severity::Fatal)
            .map(|slot| slot.message.as_str())
    }

    pub fn local_error(&self) -> Option<&str> {
        self.error
            .as_ref()
            .filter(|slot| slot.severity == Severity::Local)
            .map(|slot| slot.message.as_str())
    }

    fn apply(&mut self, message: Message) -> Vec<Effect> {
        match message {
            Message::Key(key) => self.on_key(key),
            Message::ConfigLoaded(result) => self.on_config(result),
            Message::AccountsLoaded {
                network,
                gateway,
                result,
            } => self.on_accounts(network, gateway, result),
            Message::DetailsLoaded { address, result } => {
                self.on_details(address, result);
                Vec::new()
            }
            Message::UpstakeFinished(result) => self.on_upstake(result),
            Message::FundFinished(result) => self.on_fund(result),
            Message::UpstakeAllFinished(receipts) => {
                info!(count = receipts.len(), "upstake all finished");
                self.receipts = receipts;
                self.upstake_all_pending = false;
                self.loading = false;
                self.mode = ViewMode::UpstakeAllReceipts;
                Vec::new()
            }
            Message::Timer(timer) => self.on_timer(timer),
        }
    }

    fn fail(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Fatal => warn!(%message, "fatal error"),
            Severity::Local => debug!(%message, "local error"),
        }
        self.error = Some(ErrorSlot { severity, message });
    }

    fn target(&self) -> Option<LedgerTarget> {
        let config = self.config.as_ref()?;
        LedgerTarget::from_config(config, &self.network)
    }

    fn clamp_cursor(&mut self) {
        self.cursor = match self.accounts.len() {
            0 => 0,
            len => self.cursor.min(len - 1),
        };
    }

    fn refresh(&mut self) -> Vec<Effect> {
        let Some(target) = self.target() else {
            return Vec::new();
        };
        let with_balances = self
            .config
            .as_ref()
            .is_some_and(|config| config.fetch_balances);
        info!(network = %self.network, gateway = %self.gateway, "refreshing applications");
        self.loading = true;
        vec![Effect::FetchAccounts {
            target,
            gateway: self.gateway.clone(),
            with_balances,
        }]
    }

    fn on_config(&mut self, result: Result<Config, String>) -> Vec<Effect> {
        let config = match result {
            Ok(config) => config,
            Err(err) => {
                self.fail(Severity::Fatal, err);
                return Vec::new();
            }
        };
        self.networks = config.network_names();
        let Some(first) = self.networks.first().cloned() else {
            self.fail(Severity::Fatal, "no networks found in config");
            return Vec::new();
        };
        let gateway = config
            .network(&first)
            .and_then(|network| network.gateways.first().cloned());
        self.config = Some(config);
        let Some(gateway) = gateway else {
            self.fail(
                Severity::Fatal,
                format!("first network {first} has no gateways configured"),
            );
            return Vec::new();
        };
        self.network = first;
        self.gateway = gateway;
        if self.boot_elapsed && self.mode == ViewMode::Loading {
            self.mode = ViewMode::Table;
        }
        self.refresh()
    }

    fn on_accounts(
        &mut self,
        network: String,
        gateway: String,
        result: Result<AccountsSnapshot, String>,
    ) -> Vec<Effect> {
        if network != self.network || gateway != self.gateway {
            debug!(%network, %gateway, "discarding refresh for previous selection");
            return Vec::new();
        }
        self.loading = false;
        match result {
            Ok(snapshot) => {
                self.accounts.replace(snapshot.accounts);
                self.funding_balance = snapshot.funding_balance;
                self.clamp_cursor();
                self.search_matches = self.accounts.search(&self.search_input);
            }
            Err(err) => self.fail(Severity::Local, format!("failed to load applications: {err}")),
        }
        Vec::new()
    }

    fn on_details(&mut self, address: String, result: Result<AccountDetails, String>) {
        if self.mode != ViewMode::ApplicationDetails || self.detail.address != address {
            debug!(%address, "discarding details for a closed view");
            return;
        }
        self.detail.loading = false;
        match result {
            Ok(details) => {
                self.detail.details = details.details;
                self.detail.balances = details.balances;
            }
            Err(err) => {
                self.mode = ViewMode::Table;
                self.fail(Severity::Local, err);
            }
        }
    }

    fn notify(&mut self, kind: NotificationKind, hash: String, detail: String) -> Effect {
        let expiry = self.notifications.push(kind, hash, detail);
        Effect::Schedule {
            after: expiry.after,
            timer: Timer::NotificationExpired {
                kind: expiry.kind,
                token: expiry.token,
            },
        }
    }

    fn on_upstake(&mut self, result: Result<String, OperationError>) -> Vec<Effect> {
        match result {
            Ok(hash) => {
                let mut effects = vec![self.notify(NotificationKind::UpstakeHash, hash, String::new())];
                effects.extend(self.refresh());
                effects
            }
            Err(OperationError::Transaction { hash, log }) => {
                vec![self.notify(NotificationKind::TxError, hash, log)]
            }
            Err(OperationError::Failed(err)) => {
                self.fail(Severity::Local, format!("Upstake failed: {err}"));
                Vec::new()
            }
        }
    }

    fn on_fund(&mut self, result: Result<String, OperationError>) -> Vec<Effect> {
        match result {
            Ok(hash) => vec![self.notify(NotificationKind::FundHash, hash, String::new())],
            Err(OperationError::Transaction { hash, log }) => {
                vec![self.notify(NotificationKind::TxError, hash, log)]
            }
            Err(OperationError::Failed(err)) => {
                self.fail(Severity::Local, format!("Fund failed: {err}"));
                Vec::new()
            }
        }
    }

    fn on_timer(&mut self, timer: Timer) -> Vec<Effect> {
        match timer {
            Timer::BootElapsed => {
                self.boot_elapsed = true;
                if self.config.is_some() && self.mode == ViewMode::Loading {
                    self.mode = ViewMode::Table;
                }
            }
            Timer::ShowReceipts => self.mode = ViewMode::UpstakeAllReceipts,
            Timer::NotificationExpired { kind, token } => {
                if !self.notifications.expire(kind, token) {
                    debug!(kind = kind.tag(), "expiry for a replaced notification");
                }
            }
        }
        Vec::new()
    }

    fn on_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('C') => vec![Effect::Quit],
                _ => Vec::new(),
            };
        }
        if self.fatal_error().is_some() {
            return match key.code {
                KeyCode::Char('q') => vec![Effect::Quit],
                _ => Vec::new(),
            };
        }
        self.error = None;
        match self.mode {
            ViewMode::Loading => Vec::new(),
            ViewMode::Table => self.on_table_key(key),
            ViewMode::Command => self.on_command_key(key),
            ViewMode::Search => {
                self.on_search_key(key);
                Vec::new()
            }
            ViewMode::NetworkSelect => self.on_network_key(key),
            ViewMode::GatewaySelect => self.on_gateway_key(key),
            ViewMode::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                    self.mode = ViewMode::Table;
                }
                Vec::new()
            }
            ViewMode::ApplicationDetails | ViewMode::UpstakeAllReceipts => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                    self.mode = ViewMode::Table;
                }
                Vec::new()
            }
        }
    }

    fn enter_command(&mut self, prefill: String) {
        self.command_input = prefill;
        self.mode = ViewMode::Command;
    }

    fn on_table_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Char('q') => return vec![Effect::Quit],
            KeyCode::Char(':') => self.enter_command(String::new()),
            KeyCode::Char('/') => {
                self.search_input.clear();
                self.mode = ViewMode::Search;
            }
            KeyCode::Char('n') => self.open_network_select(),
            KeyCode::Char('h') => self.mode = ViewMode::Help,
            KeyCode::Char('r') => return self.refresh(),
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor += 1;
                self.clamp_cursor();
            }
            KeyCode::Home | KeyCode::Char('g') => self.cursor = 0,
            KeyCode::End | KeyCode::Char('G') => {
                self.cursor = self.accounts.len().saturating_sub(1);
            }
            KeyCode::Enter => {
                if let Some(address) = self.selected_account().map(|a| a.address.clone()) {
                    return self.open_details(address);
                }
            }
            KeyCode::Char('u') => {
                if let Some(address) = self.selected_account().map(|a| a.address.clone()) {
                    self.enter_command(format!("u {address} "));
                }
            }
            KeyCode::Char('f') => {
                if let Some(address) = self.selected_account().map(|a| a.address.clone()) {
                    self.enter_command(format!("f {address} "));
                }
            }
            KeyCode::Char('U') => self.enter_command("ua ".into()),
            KeyCode::Char('F') => self.enter_command("fa ".into()),
            _ => {}
        }
        Vec::new()
    }

    fn on_command_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Enter => return self.commit_command(),
            KeyCode::Esc => {
                self.command_input.clear();
                self.mode = ViewMode::Table;
            }
            KeyCode::Backspace => {
                self.command_input.pop();
            }
            KeyCode::Char(c) => self.command_input.push(c),
            _ => {}
        }
        Vec::new()
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.search_matches = self.accounts.search(&self.search_input);
                if let Some(first) = self.search_matches.first() {
                    self.cursor = *first;
                }
                self.mode = ViewMode::Table;
            }
            KeyCode::Esc => {
                self.search_input.clear();
                self.search_matches.clear();
                self.mode = ViewMode::Table;
            }
            KeyCode::Backspace => {
                self.search_input.pop();
            }
            KeyCode::Char(c) => self.search_input.push(c),
            _ => {}
        }
    }

    fn open_network_select(&mut self) {
        self.network_cursor = self
            .networks
            .iter()
            .position(|name| *name == self.network)
            .unwrap_or(0);
        self.mode = ViewMode::NetworkSelect;
    }

    fn open_gateway_select(&mut self) {
        self.gateways = self
            .config
            .as_ref()
            .and_then(|config| config.network(&self.network))
            .map(|network| network.gateways.clone())
            .unwrap_or_default();
        self.gateway_cursor = self
            .gateways
            .iter()
            .position(|gw| *gw == self.gateway)
            .unwrap_or(0);
        self.mode = ViewMode::GatewaySelect;
    }

    fn on_network_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.mode = ViewMode::Table,
            KeyCode::Up | KeyCode::Char('k') => {
                self.network_cursor = self.network_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.network_cursor + 1 < self.networks.len() {
                    self.network_cursor += 1;
                }
            }
            KeyCode::Enter => {
                self.mode = ViewMode::Table;
                let Some(name) = self.networks.get(self.network_cursor).cloned() else {
                    return Vec::new();
                };
                let gateway = self
                    .config
                    .as_ref()
                    .and_then(|config| config.network(&name))
                    .and_then(|network| network.gateways.first().cloned());
                match gateway {
                    Some(gateway) => {
                        info!(network = %name, %gateway, "switching network");
                        self.network = name;
                        self.gateway = gateway;
                        self.search_matches.clear();
                        return self.refresh();
                    }
                    None => self.fail(
                        Severity::Fatal,
                        format!("network {name} has no gateways configured"),
                    ),
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn on_gateway_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.mode = ViewMode::Table,
            KeyCode::Up | KeyCode::Char('k') => {
                self.gateway_cursor = self.gateway_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.gateway_cursor + 1 < self.gateways.len() {
                    self.gateway_cursor += 1;
                }
            }
            KeyCode::Enter => {
                self.mode = ViewMode::Table;
                if let Some(gateway) = self.gateways.get(self.gateway_cursor).cloned() {
                    info!(%gateway, "switching gateway");
                    self.gateway = gateway;
                    self.search_matches.clear();
                    return self.refresh();
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn open_details(&mut self, address: String) -> Vec<Effect> {
        self.mode = ViewMode::ApplicationDetails;
        self.detail = DetailView {
            address: address.clone(),
            loading: true,
            ..DetailView::default()
        };
        match self.target() {
            Some(target) => vec![Effect::FetchDetails { target, address }],
            None => Vec::new(),
        }
    }

    fn commit_command(&mut self) -> Vec<Effect> {
        let input = std::mem::take(&mut self.command_input);
        self.mode = ViewMode::Table;
        match command::parse(&input) {
            Ok(Some(command)) => self.execute(command),
            Ok(None) => {
                debug!(%input, "ignoring unrecognised command");
                Vec::new()
            }
            Err(err) => {
                self.fail(Severity::Local, err.to_string());
                Vec::new()
            }
        }
    }

    fn execute(&mut self, command: Command) -> Vec<Effect> {
        match command {
            Command::Quit => return vec![Effect::Quit],
            Command::Network => self.open_network_select(),
            Command::Gateway => self.open_gateway_select(),
            Command::Help => self.mode = ViewMode::Help,
            Command::Sort(field) => {
                self.accounts.set_sort_by(field);
                self.search_matches = self.accounts.search(&self.search_input);
            }
            Command::Direction { descending } => {
                self.accounts.set_direction(descending);
                self.search_matches = self.accounts.search(&self.search_input);
            }
            Command::Show { address } => return self.open_details(address),
            Command::Upstake { address, amount } => {
                let Some(service_id) = self.accounts.find(&address).map(|a| a.service_id.clone())
                else {
                    self.fail(Severity::Local, format!("application not found: {address}"));
                    return Vec::new();
                };
                let Some(target) = self.target() else {
                    return Vec::new();
                };
                info!(%address, amount, "dispatching upstake");
                return vec![Effect::Upstake {
                    target,
                    address,
                    service_id,
                    amount,
                }];
            }
            Command::Fund { address, amount } => {
                let Some(target) = self.funded_target() else {
                    return Vec::new();
                };
                info!(%address, amount, "dispatching fund");
                return vec![Effect::Fund {
                    target,
                    address,
                    amount,
                }];
            }
            Command::FundAll { amount } => {
                let Some(target) = self.funded_target() else {
                    return Vec::new();
                };
                if target.managed_accounts.is_empty() {
                    self.fail(
                        Severity::Local,
                        format!("no applications configured for network: {}", self.network),
                    );
                    return Vec::new();
                }
                info!(amount, recipients = target.managed_accounts.len(), "dispatching fund all");
                return vec![Effect::FundAll { target, amount }];
            }
            Command::UpstakeAll { amount } => {
                let Some(target) = self.target() else {
                    return Vec::new();
                };
                info!(amount, "dispatching upstake all");
                self.loading = true;
                self.upstake_all_pending = true;
                self.receipts.clear();
                return vec![
                    Effect::Schedule {
                        after: RECEIPTS_DELAY,
                        timer: Timer::ShowReceipts,
                    },
                    Effect::UpstakeAll {
                        target,
                        amount,
                        accounts: self.accounts.items().to_vec(),
                    },
                ];
            }
        }
        Vec::new()
    }

    fn funded_target(&mut self) -> Option<LedgerTarget> {
        let target = self.target()?;
        if target.funding_account.is_none() {
            self.fail(
                Severity::Local,
                format!("bank address not configured for network: {}", self.network),
            );
            return None;
        }
        Some(target)
    }
}
