mod api;
mod app;
mod cli;
mod config;
mod input;
mod mock;
mod model;
mod notify;
mod poller;
mod rotation;
mod ui;
mod view;

use anyhow::{Context, Result};
use api::ApiClient;
use app::{App, AppCommand, AppEvent};
use clap::Parser;
use cli::CliArgs;
use config::Settings;
use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use poller::RefreshPoller;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinSet;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval, interval_at, sleep_until};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;
const HOUSEKEEPING_PERIOD: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let settings = Settings::load(&args)?;
    match &settings.source {
        Some(source) => info!("loaded config from {source}"),
        None => debug!("no config file found, using defaults"),
    }

    let client = Arc::new(ApiClient::new(
        &settings.api_url,
        settings.request_timeout,
        settings.session_cookie.as_deref(),
        settings.fallback_aliases.clone(),
    )?);
    info!(
        "backend at {} (fallback aliases: {})",
        client.base_url(),
        client.fallback_aliases().join(", ")
    );
    let mut app = App::new(&settings);

    run(&mut app, client, &settings).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let writer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(io::sink),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .with_writer(writer)
        .try_init();

    Ok(())
}

async fn run(app: &mut App, client: Arc<ApiClient>, settings: &Settings) -> Result<()> {
    let mut terminal = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, client, settings).await;
    let restore_result = restore_terminal(&mut terminal);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<TuiTerminal> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut TuiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Owns everything the controller spawns so it can all be torn down on exit.
struct Workers {
    client: Arc<ApiClient>,
    events: UnboundedSender<AppEvent>,
    tasks: JoinSet<()>,
    poller: RefreshPoller,
}

impl Workers {
    fn execute(&mut self, command: AppCommand) {
        match command {
            AppCommand::None => {}
            AppCommand::FetchClusters { alias, token } => {
                debug!("fetching clusters for {alias} (token {token})");
                let client = self.client.clone();
                let events = self.events.clone();
                self.tasks.spawn(async move {
                    let fetched = client.fetch_clusters(&alias).await;
                    send_event(
                        &events,
                        AppEvent::ClustersLoaded {
                            token,
                            alias,
                            fetched,
                        },
                    );
                });
            }
            AppCommand::TriggerRefresh { alias } => {
                info!("triggering backend refresh for {alias}");
                let client = self.client.clone();
                let events = self.events.clone();
                self.tasks.spawn(async move {
                    let accepted = client.trigger_refresh(&alias).await;
                    send_event(&events, AppEvent::RefreshTriggered { alias, accepted });
                });
            }
            AppCommand::StartRefreshPoll { alias } => {
                if let Some(previous) = self.poller.polling_alias() {
                    info!("replacing refresh poll for {previous}");
                }
                self.poller
                    .start(self.client.clone(), alias, self.events.clone());
            }
            AppCommand::LoadServiceDetails {
                alias,
                cluster_name,
                service_name,
            } => {
                let client = self.client.clone();
                let events = self.events.clone();
                self.tasks.spawn(async move {
                    let fetched = client
                        .fetch_service_details(&service_name, &cluster_name, &alias)
                        .await;
                    send_event(
                        &events,
                        AppEvent::DetailsLoaded {
                            alias,
                            cluster_name,
                            service_name,
                            fetched,
                        },
                    );
                });
            }
        }
    }

    fn discover_aliases(&mut self) {
        let client = self.client.clone();
        let events = self.events.clone();
        self.tasks.spawn(async move {
            let fetched = client.fetch_aliases().await;
            send_event(&events, AppEvent::AliasesLoaded(fetched));
        });
    }

    async fn shutdown(mut self) {
        self.poller.cancel();
        self.tasks.shutdown().await;
    }
}

fn send_event(events: &UnboundedSender<AppEvent>, event: AppEvent) {
    if events.send(event).is_err() {
        debug!("event bus closed, dropping result");
    }
}

async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    client: Arc<ApiClient>,
    settings: &Settings,
) -> Result<()> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<AppEvent>();
    let mut workers = Workers {
        client,
        events: events_tx,
        tasks: JoinSet::new(),
        poller: RefreshPoller::new(settings.status_poll_period),
    };
    workers.discover_aliases();

    let mut reader = EventStream::new();
    let full_refresh_period = settings.full_refresh_interval;
    let mut full_refresh = interval_at(Instant::now() + full_refresh_period, full_refresh_period);
    full_refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut housekeeping = interval(HOUSEKEEPING_PERIOD);
    housekeeping.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut shown_alias = app.selected_alias().map(str::to_string);

    let result = loop {
        if let Err(error) = terminal
            .draw(|frame| ui::render(frame, app, Instant::now()))
            .context("failed to render terminal frame")
        {
            break Err(error);
        }

        if !app.running() {
            break Ok(());
        }

        let rotation_deadline = app.rotation_deadline();
        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action, Instant::now());
                            workers.execute(command);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        app.set_status(format!("terminal event error: {error}"));
                    }
                    None => {
                        app.set_status("terminal event stream closed");
                        break Ok(());
                    }
                }
            }
            _ = wait_for_deadline(rotation_deadline) => {
                let command = app.on_rotation_tick(Instant::now());
                workers.execute(command);
            }
            _ = full_refresh.tick() => {
                let command = app.on_periodic_refresh();
                workers.execute(command);
            }
            _ = housekeeping.tick() => {
                app.tick(Instant::now());
            }
            maybe_event = events_rx.recv() => {
                if let Some(event) = maybe_event {
                    let command = app.handle_event(event, Instant::now());
                    workers.execute(command);
                }
            }
            Some(joined) = workers.tasks.join_next(), if !workers.tasks.is_empty() => {
                if let Err(error) = joined
                    && error.is_panic()
                {
                    warn!("background request panicked: {error}");
                }
            }
        }

        let current_alias = app.selected_alias().map(str::to_string);
        if current_alias != shown_alias {
            full_refresh.reset();
            shown_alias = current_alias;
        }
    };

    workers.shutdown().await;
    result
}
