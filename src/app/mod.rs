mod accounts;
mod command;
mod notifications;
mod state;

use crate::{
    components::Component,
    config::Config,
    ledger::{Ledger, LedgerTarget, ProcessClient},
    ui::{
        account_table::AccountTable,
        banners::Banners,
        bottom_bar::{COMMAND_BAR_HEIGHT, CommandBar},
        details::DetailsView,
        header::{HEADER_HEIGHT, Header},
        help::HelpView,
        receipts::ReceiptsView,
        select::SelectModal,
        splash::{FatalView, Splash},
    },
};
pub type AppResult<T> = color_eyre::Result<T>;
use color_eyre::eyre::WrapErr;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout},
};
use std::{path::PathBuf, sync::Arc, sync::mpsc};
use tokio::runtime::{Handle, Runtime};
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

pub use accounts::{Health, SortField, SortSpec};
pub use notifications::{Notification, NotificationKind};
pub use state::{AccountsSnapshot, Effect, Message, OperationError, ViewMode, ViewState};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Central application type: owns the view state, runs effects on the tokio
/// runtime and delegates drawing to the UI components.
pub struct App {
    running: bool,
    state: ViewState,
    config_path: PathBuf,
    ledger: Ledger,
    header: Header,
    banners: Banners,
    table: AccountTable,
    select: SelectModal,
    help: HelpView,
    details: DetailsView,
    receipts: ReceiptsView,
    splash: Splash,
    fatal: FatalView,
    command_bar: CommandBar,
    runtime: Runtime,
    message_rx: mpsc::Receiver<Message>,
    message_tx: mpsc::Sender<Message>,
}

impl App {
    pub fn new(config_path: PathBuf) -> AppResult<Self> {
        let ledger = Ledger::new(Arc::new(ProcessClient::default()));
        Self::with_ledger(config_path, ledger)
    }

    pub fn with_ledger(config_path: PathBuf, ledger: Ledger) -> AppResult<Self> {
        let runtime = Runtime::new().wrap_err("failed to start tokio runtime")?;
        let (message_tx, message_rx) = mpsc::channel();
        Ok(Self {
            running: false,
            state: ViewState::default(),
            config_path,
            ledger,
            header: Header,
            banners: Banners,
            table: AccountTable::default(),
            select: SelectModal::default(),
            help: HelpView,
            details: DetailsView,
            receipts: ReceiptsView,
            splash: Splash,
            fatal: FatalView,
            command_bar: CommandBar,
            runtime,
            message_rx,
            message_tx,
        })
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> AppResult<()> {
        self.start();
        while self.running {
            self.drain_messages();
            terminal
                .draw(|frame| self.render(frame))
                .wrap_err("failed to draw frame")?;
            self.handle_events()?;
        }
        // Outstanding client calls are abandoned rather than awaited.
        self.runtime.shutdown_background();
        Ok(())
    }

    fn start(&mut self) {
        info!(config = %self.config_path.display(), "starting");
        self.running = true;
        let (state, effects) = ViewState::boot();
        self.state = state;
        for effect in effects {
            self.execute(effect);
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let view = AppView { state: &self.state };
        let area = frame.area();

        if view.state.fatal_error().is_some() {
            self.fatal.render(frame, area, &view);
            return;
        }
        if !view.state.mode.has_command_bar() {
            self.details.render(frame, area, &view);
            return;
        }

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(COMMAND_BAR_HEIGHT)])
            .split(area);
        let main_area = layout[0];
        let bottom_area = layout[1];

        match view.state.mode {
            ViewMode::Loading => self.splash.render(frame, main_area, &view),
            ViewMode::Help => self.help.render(frame, main_area, &view),
            ViewMode::UpstakeAllReceipts => self.receipts.render(frame, main_area, &view),
            _ => {
                let panes = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(HEADER_HEIGHT),
                        Constraint::Length(Banners::height(&view)),
                        Constraint::Min(1),
                    ])
                    .split(main_area);
                self.header.render(frame, panes[0], &view);
                self.banners.render(frame, panes[1], &view);
                self.table.render(frame, panes[2], &view);
                if matches!(view.state.mode, ViewMode::NetworkSelect | ViewMode::GatewaySelect) {
                    self.select.render(frame, main_area, &view);
                }
            }
        }
        self.command_bar.render(frame, bottom_area, &view);
    }

    fn handle_events(&mut self) -> AppResult<()> {
        if !event::poll(POLL_INTERVAL).wrap_err("failed to poll terminal events")? {
            return Ok(());
        }
        match event::read().wrap_err("failed to read terminal event")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.dispatch(Message::Key(key)),
            // The next loop iteration redraws at the new size.
            Event::Resize(_, _) => {}
            _ => {}
        }
        Ok(())
    }

    fn dispatch(&mut self, message: Message) {
        let previous = self.state.mode;
        let (state, effects) = std::mem::take(&mut self.state).update(message);
        self.state = state;
        if self.state.mode != previous {
            info!(from = ?previous, to = ?self.state.mode, "view changed");
        }
        for effect in effects {
            self.execute(effect);
        }
    }

    fn drain_messages(&mut self) {
        while let Ok(message) = self.message_rx.try_recv() {
            self.dispatch(message);
        }
    }

    fn command_bus(&self) -> CommandBus {
        CommandBus::new(self.message_tx.clone(), self.runtime.handle().clone())
    }

    fn execute(&mut self, effect: Effect) {
        let bus = self.command_bus();
        let ledger = self.ledger.clone();
        match effect {
            Effect::Quit => self.running = false,
            Effect::LoadConfig => {
                let path = self.config_path.clone();
                bus.spawn(move || {
                    let result = Config::load(&path).map_err(|err| {
                        error!(%err, "configuration failed to load");
                        err.to_string()
                    });
                    Message::ConfigLoaded(result)
                });
            }
            Effect::FetchAccounts {
                target,
                gateway,
                with_balances,
            } => bus.spawn(move || {
                let result = fetch_snapshot(&ledger, &target, &gateway, with_balances);
                Message::AccountsLoaded {
                    network: target.network,
                    gateway,
                    result,
                }
            }),
            Effect::FetchDetails { target, address } => bus.spawn(move || {
                let result = ledger.show_account(&address, &target).map_err(|err| {
                    error!(%address, %err, "details failed to load");
                    err.to_string()
                });
                Message::DetailsLoaded { address, result }
            }),
            Effect::Upstake {
                target,
                address,
                service_id,
                amount,
            } => bus.spawn(move || {
                let result = ledger
                    .upstake(&address, &service_id, amount, &target)
                    .map_err(|err| {
                        error!(%address, %err, "upstake failed");
                        OperationError::from(err)
                    });
                Message::UpstakeFinished(result)
            }),
            Effect::Fund {
                target,
                address,
                amount,
            } => bus.spawn(move || {
                let result = ledger.fund(&address, amount, &target).map_err(|err| {
                    error!(%address, %err, "fund failed");
                    OperationError::from(err)
                });
                Message::FundFinished(result)
            }),
            Effect::FundAll { target, amount } => bus.spawn(move || {
                let result = ledger.fund_all(amount, &target).map_err(|err| {
                    error!(%err, "fund all failed");
                    OperationError::from(err)
                });
                Message::FundFinished(result)
            }),
            Effect::UpstakeAll {
                target,
                amount,
                accounts,
            } => bus.spawn(move || {
                let receipts = ledger.upstake_all(amount, &target, &accounts);
                Message::UpstakeAllFinished(receipts)
            }),
            Effect::Schedule { after, timer } => bus.spawn_async(move || async move {
                sleep(after).await;
                Message::Timer(timer)
            }),
        }
    }
}

/// Accounts for the selection plus the funding-account balance for the header.
fn fetch_snapshot(
    ledger: &Ledger,
    target: &LedgerTarget,
    gateway: &str,
    with_balances: bool,
) -> Result<AccountsSnapshot, String> {
    let accounts = ledger
        .list_accounts(target, gateway, with_balances)
        .map_err(|err| {
            error!(network = %target.network, gateway, %err, "refresh failed");
            err.to_string()
        })?;
    let funding_balance = match &target.funding_account {
        Some(bank) => ledger.query_balance(bank, target).unwrap_or_else(|err| {
            warn!(%bank, %err, "bank balance lookup failed, showing 0");
            0.0
        }),
        None => 0.0,
    };
    Ok(AccountsSnapshot {
        accounts,
        funding_balance,
    })
}

/// Read-only context used during rendering.
pub struct AppView<'a> {
    pub state: &'a ViewState,
}

/// Runs background work and posts its completion back to the event loop.
#[derive(Clone)]
pub struct CommandBus {
    sender: mpsc::Sender<Message>,
    handle: Handle,
}

impl CommandBus {
    pub fn new(sender: mpsc::Sender<Message>, handle: Handle) -> Self {
        Self { sender, handle }
    }

    /// Blocking work such as client invocations.
    pub fn spawn<F>(&self, task: F)
    where
        F: FnOnce() -> Message + Send + 'static,
    {
        let sender = self.sender.clone();
        self.handle.spawn_blocking(move || {
            let message = task();
            let _ = sender.send(message);
        });
    }

    pub fn spawn_async<F, Fut>(&self, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Message> + Send + 'static,
    {
        let sender = self.sender.clone();
        self.handle.spawn(async move {
            let message = task().await;
            let _ = sender.send(message);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ScriptedClient;
    use std::{io::Write, time::Instant};
    use tempfile::NamedTempFile;

    const CONFIG: &str = r#"
[networks.pocket]
rpc_endpoint = "https://rpc.example"
gateways = ["gw1"]
applications = ["a1"]
bank = "bank1"
"#;

    const LIST: &str = r#"{"applications":[
        {"address":"a1","stake":{"denom":"upokt","amount":"2500000000"},
         "service_configs":[{"service_id":"anvil"}],"delegatee_gateway_addresses":["gw1"]},
        {"address":"a2","stake":{"denom":"upokt","amount":"5"},
         "service_configs":[{"service_id":"base"}],"delegatee_gateway_addresses":["gw1"]}
    ]}"#;

    fn scripted() -> ScriptedClient {
        ScriptedClient::new()
            .on(&["list-application"], LIST, 0)
            .on(
                &["balances", "bank1"],
                r#"{"balances":[{"denom":"upokt","amount":"7000000"}]}"#,
                0,
            )
            .on(&["balances"], r#"{"balances":[]}"#, 0)
    }

    /// Feed completions into the reducer until `done` holds or the deadline passes.
    fn pump_until(app: &mut App, timeout: Duration, done: impl Fn(&ViewState) -> bool) {
        let deadline = Instant::now() + timeout;
        while !done(&app.state) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            assert!(!remaining.is_zero(), "timed out in {:?}", app.state.mode);
            if let Ok(message) = app.message_rx.recv_timeout(remaining) {
                app.dispatch(message);
            }
        }
    }

    #[test]
    fn boots_into_table_with_fetched_accounts() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        let ledger = Ledger::new(Arc::new(scripted()));
        let mut app = App::with_ledger(file.path().to_path_buf(), ledger).unwrap();

        app.start();
        pump_until(&mut app, Duration::from_secs(5), |state| {
            state.mode == ViewMode::Table && !state.loading
        });

        assert_eq!(app.state.network, "pocket");
        assert_eq!(app.state.accounts.len(), 2);
        assert!((app.state.funding_balance - 7.0).abs() < 1e-9);
    }

    #[test]
    fn missing_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(Arc::new(ScriptedClient::new()));
        let mut app = App::with_ledger(dir.path().join("absent.toml"), ledger).unwrap();

        app.start();
        pump_until(&mut app, Duration::from_secs(5), |state| state.fatal_error().is_some());
        assert!(app.state.fatal_error().unwrap().contains("absent.toml"));
    }

    #[test]
    fn snapshot_tolerates_bank_balance_failure() {
        let client = ScriptedClient::new()
            .on(&["list-application"], LIST, 0)
            .on_stderr(&["balances"], "rpc down", 1);
        let ledger = Ledger::new(Arc::new(client));
        let config = Config::parse(CONFIG).unwrap();
        let target = LedgerTarget::from_config(&config, "pocket").unwrap();

        let snapshot = fetch_snapshot(&ledger, &target, "gw1", false).unwrap();
        assert_eq!(snapshot.accounts.len(), 2);
        assert_eq!(snapshot.funding_balance, 0.0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn command_bus_delivers_both_kinds_of_work() {
        let (tx, rx) = mpsc::channel();
        let bus = CommandBus::new(tx, Handle::current());
        bus.spawn(|| Message::UpstakeAllFinished(Vec::new()));
        bus.spawn_async(|| async {
            sleep(Duration::from_millis(10)).await;
            Message::Timer(state::Timer::ShowReceipts)
        });

        let received = tokio::task::spawn_blocking(move || {
            (0..2)
                .map(|_| rx.recv_timeout(std::time::Duration::from_secs(2)).unwrap())
                .collect::<Vec<_>>()
        })
        .await
        .unwrap();
        assert!(received.contains(&Message::UpstakeAllFinished(Vec::new())));
        assert!(received.contains(&Message::Timer(state::Timer::ShowReceipts)));
    }
}
