use crate::api::{Fetched, Origin};
use crate::config::Settings;
use crate::input::Action;
use crate::model::{ClusterService, DetailTab, ServiceDetails, Theme};
use crate::notify::{Notification, Severity, Toast, ToastQueue};
use crate::poller::RefreshOutcome;
use crate::rotation::{RotationGate, RotationScheduler, next_alias};
use crate::view::{FilterOptions, Summary, derive_view, page_slice, total_pages};
use chrono::{DateTime, Local};
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    FetchClusters {
        alias: String,
        token: u64,
    },
    TriggerRefresh {
        alias: String,
    },
    StartRefreshPoll {
        alias: String,
    },
    LoadServiceDetails {
        alias: String,
        cluster_name: String,
        service_name: String,
    },
}

/// Everything that reaches the controller loop from background tasks.
#[derive(Debug)]
pub enum AppEvent {
    AliasesLoaded(Fetched<Vec<String>>),
    ClustersLoaded {
        token: u64,
        alias: String,
        fetched: Fetched<Vec<ClusterService>>,
    },
    DetailsLoaded {
        alias: String,
        cluster_name: String,
        service_name: String,
        fetched: Fetched<ServiceDetails>,
    },
    RefreshTriggered {
        alias: String,
        accepted: bool,
    },
    RefreshFinished {
        alias: String,
        outcome: RefreshOutcome,
    },
    Notify(Notification),
}

#[derive(Debug, Clone)]
pub struct DetailView {
    pub service: ClusterService,
    pub tab: DetailTab,
    pub details: Option<ServiceDetails>,
    pub origin: Option<Origin>,
    pub scroll: u16,
}

pub struct App {
    running: bool,
    mode: InputMode,
    theme: Theme,
    show_help: bool,
    aliases: Vec<String>,
    selected_alias: Option<String>,
    preferred_alias: Option<String>,
    clusters: Vec<ClusterService>,
    visible: Vec<ClusterService>,
    search: String,
    filters: FilterOptions,
    items_per_page: usize,
    current_page: usize,
    selected: usize,
    loading: bool,
    last_updated: Option<DateTime<Local>>,
    data_origin: Option<Origin>,
    auth_required: bool,
    refreshing: bool,
    rotation: RotationScheduler,
    detail: Option<DetailView>,
    toasts: ToastQueue,
    fetch_token: u64,
    status: String,
}

impl App {
    pub fn new(settings: &Settings) -> Self {
        Self {
            running: true,
            mode: InputMode::Normal,
            theme: Theme::default(),
            show_help: false,
            aliases: Vec::new(),
            selected_alias: None,
            preferred_alias: settings.initial_alias.clone(),
            clusters: Vec::new(),
            visible: Vec::new(),
            search: String::new(),
            filters: FilterOptions::default(),
            items_per_page: settings.items_per_page.max(1),
            current_page: 1,
            selected: 0,
            loading: true,
            last_updated: None,
            data_origin: None,
            auth_required: false,
            refreshing: false,
            rotation: RotationScheduler::new(settings.rotation_interval, settings.rotation_enabled),
            detail: None,
            toasts: ToastQueue::new(settings.toast_lifetime),
            fetch_token: 0,
            status: "Discovering aliases…".to_string(),
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn selected_alias(&self) -> Option<&str> {
        self.selected_alias.as_deref()
    }

    pub fn clusters(&self) -> &[ClusterService] {
        &self.clusters
    }

    pub fn visible(&self) -> &[ClusterService] {
        &self.visible
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> FilterOptions {
        self.filters
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.visible.len(), self.items_per_page)
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn page_items(&self) -> &[ClusterService] {
        page_slice(&self.visible, self.current_page, self.items_per_page)
    }

    pub fn selected_index(&self) -> Option<usize> {
        if self.page_items().is_empty() {
            None
        } else {
            Some(self.selected)
        }
    }

    pub fn selected_service(&self) -> Option<&ClusterService> {
        self.page_items().get(self.selected)
    }

    pub fn summary(&self) -> Summary {
        Summary::from_services(&self.clusters, self.selected_alias().unwrap_or_default())
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn last_updated(&self) -> Option<String> {
        self.last_updated
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
    }

    pub fn data_origin(&self) -> Option<&Origin> {
        self.data_origin.as_ref()
    }

    pub fn auth_required(&self) -> bool {
        self.auth_required
    }

    pub fn refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn rotation_enabled(&self) -> bool {
        self.rotation.enabled()
    }

    pub fn rotation_deadline(&self) -> Option<Instant> {
        self.rotation.deadline()
    }

    pub fn rotation_remaining(&self, now: Instant) -> Option<Duration> {
        self.rotation.remaining(now)
    }

    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    pub fn toasts(&self) -> &[Toast] {
        self.toasts.toasts()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = normalize_status_text(status.into());
    }

    pub fn notify(&mut self, notification: Notification, now: Instant) {
        debug!(
            "toast {}: {}",
            notification.severity.label(),
            notification.title
        );
        self.toasts.push(notification, now);
    }

    /// Drop expired toasts. Returns true when something disappeared.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.toasts.prune(now)
    }

    pub fn on_rotation_tick(&mut self, now: Instant) -> AppCommand {
        if !self.rotation.due(now) {
            return AppCommand::None;
        }
        let Some(next) = next_alias(&self.aliases, self.selected_alias.as_deref()) else {
            return AppCommand::None;
        };
        let next = next.to_string();
        info!("auto-rotating to alias {next}");
        self.select_alias(next, false, now)
    }

    pub fn on_periodic_refresh(&mut self) -> AppCommand {
        let Some(alias) = self.selected_alias.clone() else {
            return AppCommand::None;
        };
        debug!("periodic refresh for {alias}");
        self.request_clusters(alias)
    }

    pub fn handle_event(&mut self, event: AppEvent, now: Instant) -> AppCommand {
        let command = match event {
            AppEvent::AliasesLoaded(fetched) => self.apply_aliases(fetched, now),
            AppEvent::ClustersLoaded {
                token,
                alias,
                fetched,
            } => {
                self.apply_clusters(token, &alias, fetched, now);
                AppCommand::None
            }
            AppEvent::DetailsLoaded {
                alias,
                cluster_name,
                service_name,
                fetched,
            } => {
                self.apply_details(&alias, &cluster_name, &service_name, fetched);
                AppCommand::None
            }
            AppEvent::RefreshTriggered { alias, accepted } => {
                self.apply_refresh_trigger(alias, accepted, now)
            }
            AppEvent::RefreshFinished { alias, outcome } => self.finish_refresh(alias, outcome),
            AppEvent::Notify(notification) => {
                self.notify(notification, now);
                AppCommand::None
            }
        };
        self.sync_rotation(now);
        command
    }

    pub fn apply_action(&mut self, action: Action, now: Instant) -> AppCommand {
        if self.show_help && !matches!(action, Action::ToggleHelp | Action::Quit) {
            self.show_help = false;
            if matches!(action, Action::Back) {
                return AppCommand::None;
            }
        }

        let command = match action {
            Action::Quit => {
                self.running = false;
                self.status = "Exit requested".to_string();
                AppCommand::None
            }
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                AppCommand::None
            }
            Action::StartSearch => {
                self.mode = InputMode::Search;
                self.status = "Search (Enter keep, Esc clear)".to_string();
                AppCommand::None
            }
            Action::ToggleTheme => {
                self.theme = self.theme.toggled();
                self.status = format!("Theme: {}", self.theme.label());
                AppCommand::None
            }
            Action::Refresh => self.request_refresh(),
            Action::Down => {
                self.move_down();
                AppCommand::None
            }
            Action::Up => {
                self.move_up();
                AppCommand::None
            }
            Action::NextPage => {
                self.change_page(1);
                AppCommand::None
            }
            Action::PrevPage => {
                self.change_page(-1);
                AppCommand::None
            }
            Action::NextTab => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.tab = detail.tab.offset(1);
                    detail.scroll = 0;
                } else {
                    self.change_page(1);
                }
                AppCommand::None
            }
            Action::PrevTab => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.tab = detail.tab.offset(-1);
                    detail.scroll = 0;
                } else {
                    self.change_page(-1);
                }
                AppCommand::None
            }
            Action::NextAlias => self.step_alias(1, now),
            Action::PrevAlias => self.step_alias(-1, now),
            Action::CycleStatusFilter => {
                self.filters.status = self.filters.status.next();
                self.status = format!("Status filter: {}", self.filters.status.label());
                self.recompute_view();
                AppCommand::None
            }
            Action::CycleSortKey => {
                self.filters.sort_by = self.filters.sort_by.next();
                self.status = format!("Sort by {}", self.filters.sort_by.label());
                self.recompute_view();
                AppCommand::None
            }
            Action::FlipSortOrder => {
                self.filters.sort_order = self.filters.sort_order.flipped();
                self.status = format!("Sort order {}", self.filters.sort_order.label());
                self.recompute_view();
                AppCommand::None
            }
            Action::ToggleRotation => {
                let enabled = !self.rotation.enabled();
                self.rotation.set_enabled(enabled);
                self.status = if enabled {
                    "Auto-rotate is on".to_string()
                } else {
                    "Auto-rotate is off".to_string()
                };
                AppCommand::None
            }
            Action::OpenDetail => self.open_detail(),
            Action::Back => {
                if self.detail.is_some() {
                    self.close_detail();
                } else if !self.search.is_empty() {
                    self.search.clear();
                    self.status = "Search cleared".to_string();
                    self.recompute_view();
                }
                AppCommand::None
            }
            Action::DismissToast => {
                self.toasts.dismiss_latest();
                AppCommand::None
            }
            Action::SubmitInput => {
                self.mode = InputMode::Normal;
                self.status = if self.search.is_empty() {
                    "Search cleared".to_string()
                } else {
                    format!("Search '{}' ({} results)", self.search, self.visible.len())
                };
                AppCommand::None
            }
            Action::CancelInput => {
                self.mode = InputMode::Normal;
                self.search.clear();
                self.status = "Search cleared".to_string();
                self.recompute_view();
                AppCommand::None
            }
            Action::Backspace => {
                if self.search.pop().is_some() {
                    self.recompute_view();
                }
                AppCommand::None
            }
            Action::InputChar(c) => {
                self.search.push(c);
                self.recompute_view();
                AppCommand::None
            }
        };
        self.sync_rotation(now);
        command
    }

    fn apply_aliases(&mut self, fetched: Fetched<Vec<String>>, now: Instant) -> AppCommand {
        let Fetched { data, origin } = fetched;
        if let Origin::Fallback(reason) = &origin {
            self.notify(
                Notification::new(
                    Severity::Warning,
                    "Backend unreachable",
                    Some("Showing the built-in alias list".to_string()),
                ),
                now,
            );
            self.set_status(format!("Using fallback aliases: {reason}"));
        }
        if origin == Origin::Unauthorized {
            self.mark_unauthorized(now);
        }
        self.aliases = data;

        let initial = self
            .preferred_alias
            .take()
            .filter(|preferred| self.aliases.contains(preferred))
            .or_else(|| self.aliases.first().cloned());
        match initial {
            Some(alias) => self.select_alias(alias, false, now),
            None => {
                self.loading = false;
                self.set_status("No aliases available");
                AppCommand::None
            }
        }
    }

    fn select_alias(&mut self, alias: String, user_initiated: bool, now: Instant) -> AppCommand {
        if user_initiated {
            self.rotation.set_enabled(false);
        }
        info!("selected alias {alias}");
        if self.selected_alias.as_deref() != Some(alias.as_str()) {
            // Rows are only valid under the alias they were fetched for.
            self.clusters.clear();
        }
        self.selected_alias = Some(alias.clone());
        self.recompute_view();
        self.sync_rotation(now);
        self.request_clusters(alias)
    }

    fn step_alias(&mut self, delta: isize, now: Instant) -> AppCommand {
        if self.aliases.is_empty() {
            return AppCommand::None;
        }
        let len = self.aliases.len() as isize;
        let current = self
            .selected_alias
            .as_ref()
            .and_then(|selected| self.aliases.iter().position(|alias| alias == selected))
            .unwrap_or(0) as isize;
        let next = self.aliases[(current + delta).rem_euclid(len) as usize].clone();
        if self.selected_alias.as_deref() == Some(next.as_str()) {
            return AppCommand::None;
        }
        self.set_status(format!("Alias {next} (auto-rotate off)"));
        self.select_alias(next, true, now)
    }

    fn request_clusters(&mut self, alias: String) -> AppCommand {
        self.fetch_token += 1;
        self.loading = true;
        AppCommand::FetchClusters {
            alias,
            token: self.fetch_token,
        }
    }

    /// Accepts a fetch result only if it answers the newest request for the
    /// alias that is still selected.
    fn apply_clusters(
        &mut self,
        token: u64,
        alias: &str,
        fetched: Fetched<Vec<ClusterService>>,
        now: Instant,
    ) -> bool {
        if token != self.fetch_token || self.selected_alias.as_deref() != Some(alias) {
            debug!(
                "discarding stale cluster list for {alias} (token {token}, latest {})",
                self.fetch_token
            );
            return false;
        }

        let Fetched { data, origin } = fetched;
        self.loading = false;
        self.last_updated = Some(Local::now());
        match &origin {
            Origin::Live => {
                self.auth_required = false;
                self.set_status(format!("{} services in {alias}", data.len()));
            }
            Origin::Fallback(_) => {
                self.set_status(format!("Backend unreachable, showing sample data for {alias}"));
            }
            Origin::Unauthorized => self.mark_unauthorized(now),
        }
        self.data_origin = Some(origin);
        self.clusters = data;
        self.recompute_view();
        true
    }

    fn apply_details(
        &mut self,
        alias: &str,
        cluster_name: &str,
        service_name: &str,
        fetched: Fetched<ServiceDetails>,
    ) {
        let Some(detail) = self.detail.as_mut() else {
            debug!("details for {cluster_name}/{service_name} arrived after close");
            return;
        };
        if detail.service.account_alias != alias
            || detail.service.cluster_name != cluster_name
            || detail.service.service_name != service_name
        {
            debug!("details for {cluster_name}/{service_name} no longer shown");
            return;
        }
        detail.details = Some(fetched.data);
        detail.origin = Some(fetched.origin);
    }

    fn request_refresh(&mut self) -> AppCommand {
        let Some(alias) = self.selected_alias.clone() else {
            return AppCommand::None;
        };
        if self.refreshing {
            self.set_status(format!("Refresh already running for {alias}"));
            return AppCommand::None;
        }
        self.refreshing = true;
        self.rotation.set_enabled(false);
        self.set_status(format!("Requesting refresh for {alias}"));
        AppCommand::TriggerRefresh { alias }
    }

    fn apply_refresh_trigger(&mut self, alias: String, accepted: bool, now: Instant) -> AppCommand {
        if accepted {
            self.notify(
                Notification::new(
                    Severity::Info,
                    "Refresh initiated",
                    Some("Checking status...".to_string()),
                ),
                now,
            );
            self.set_status(format!("Refreshing {alias}…"));
            AppCommand::StartRefreshPoll { alias }
        } else {
            self.refreshing = false;
            self.notify(
                Notification::new(
                    Severity::Error,
                    "Failed to trigger refresh",
                    Some("Please try again".to_string()),
                ),
                now,
            );
            self.set_status(format!("Refresh for {alias} was rejected"));
            AppCommand::None
        }
    }

    fn finish_refresh(&mut self, alias: String, outcome: RefreshOutcome) -> AppCommand {
        self.refreshing = false;
        match outcome {
            RefreshOutcome::Completed => {
                self.rotation.set_enabled(true);
                self.set_status(format!("Refresh completed for {alias}"));
                if self.selected_alias.as_deref() == Some(alias.as_str()) {
                    self.request_clusters(alias)
                } else {
                    debug!("refresh for {alias} completed after alias switch");
                    AppCommand::None
                }
            }
            RefreshOutcome::Failed => {
                self.set_status(format!("Refresh failed for {alias}"));
                AppCommand::None
            }
            RefreshOutcome::NotStarted => {
                self.set_status(format!("Refresh not started for {alias}"));
                AppCommand::None
            }
            RefreshOutcome::Unrecognized(status) => {
                self.set_status(format!("Refresh for {alias} ended: {status}"));
                AppCommand::None
            }
            RefreshOutcome::StatusCheckFailed(reason) => {
                self.set_status(format!("Refresh status unavailable: {}", summarize_error_line(&reason)));
                AppCommand::None
            }
        }
    }

    fn open_detail(&mut self) -> AppCommand {
        let Some(service) = self.selected_service().cloned() else {
            return AppCommand::None;
        };
        self.rotation.set_enabled(false);
        let alias = if service.account_alias.is_empty() {
            self.selected_alias.clone().unwrap_or_default()
        } else {
            service.account_alias.clone()
        };
        let command = AppCommand::LoadServiceDetails {
            alias: alias.clone(),
            cluster_name: service.cluster_name.clone(),
            service_name: service.service_name.clone(),
        };
        self.detail = Some(DetailView {
            service: ClusterService {
                account_alias: alias,
                ..service
            },
            tab: DetailTab::Overview,
            details: None,
            origin: None,
            scroll: 0,
        });
        command
    }

    fn close_detail(&mut self) {
        self.detail = None;
        self.rotation.set_enabled(true);
    }

    fn mark_unauthorized(&mut self, now: Instant) {
        if !self.auth_required {
            self.auth_required = true;
            self.notify(
                Notification::new(
                    Severity::Error,
                    "Session expired",
                    Some("Sign in again to see live data".to_string()),
                ),
                now,
            );
        }
        self.set_status("Not signed in, showing sample data");
    }

    fn recompute_view(&mut self) {
        let alias = self.selected_alias.as_deref().unwrap_or_default();
        self.visible = derive_view(&self.clusters, &self.search, &self.filters, alias);
        self.current_page = 1;
        self.selected = 0;
    }

    fn move_down(&mut self) {
        if let Some(detail) = self.detail.as_mut() {
            detail.scroll = detail.scroll.saturating_add(1);
            return;
        }
        let len = self.page_items().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    fn move_up(&mut self) {
        if let Some(detail) = self.detail.as_mut() {
            detail.scroll = detail.scroll.saturating_sub(1);
            return;
        }
        self.selected = self.selected.saturating_sub(1);
    }

    fn change_page(&mut self, delta: isize) {
        let total = self.total_pages();
        if total == 0 {
            return;
        }
        let target = (self.current_page as isize + delta).clamp(1, total as isize) as usize;
        if target != self.current_page {
            self.current_page = target;
            self.selected = 0;
        }
    }

    fn sync_rotation(&mut self, now: Instant) {
        let gate = RotationGate {
            alias_count: self.aliases.len(),
            detail_open: self.detail.is_some(),
            refreshing: self.refreshing,
            enabled: self.rotation.enabled(),
        };
        self.rotation.sync(gate, now);
    }
}

fn summarize_error_line(error: &str) -> String {
    error
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| "unknown error".to_string())
}

fn normalize_status_text(status: String) -> String {
    const MAX_STATUS_LEN: usize = 180;
    if status.chars().count() <= MAX_STATUS_LEN {
        return status;
    }

    let mut shortened = status
        .chars()
        .take(MAX_STATUS_LEN.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::{App, AppCommand, AppEvent, InputMode};
    use crate::api::{Fetched, Origin};
    use crate::config::Settings;
    use crate::input::Action;
    use crate::model::{ClusterService, DetailTab, ServiceDetails};
    use crate::notify::Severity;
    use crate::poller::RefreshOutcome;
    use tokio::time::{Duration, Instant};

    fn aliases(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn service(alias: &str, name: &str, running: u32) -> ClusterService {
        ClusterService {
            account_alias: alias.to_string(),
            cluster_name: format!("{alias}-main-cluster"),
            service_name: name.to_string(),
            running_tasks: running,
            ..ClusterService::default()
        }
    }

    fn live<T>(data: T) -> Fetched<T> {
        Fetched {
            data,
            origin: Origin::Live,
        }
    }

    /// App with aliases loaded and the first alias' clusters applied.
    fn booted(names: &[&str], now: Instant) -> App {
        let mut app = App::new(&Settings::default());
        let command = app.handle_event(AppEvent::AliasesLoaded(live(aliases(names))), now);
        let AppCommand::FetchClusters { alias, token } = command else {
            panic!("expected a cluster fetch, got {command:?}");
        };
        let rows = vec![service(&alias, "web", 1), service(&alias, "api", 3)];
        app.handle_event(
            AppEvent::ClustersLoaded {
                token,
                alias,
                fetched: live(rows),
            },
            now,
        );
        app
    }

    #[test]
    fn first_alias_is_selected_and_fetched() {
        let now = Instant::now();
        let mut app = App::new(&Settings::default());
        let command = app.handle_event(
            AppEvent::AliasesLoaded(live(aliases(&["dev", "prod"]))),
            now,
        );
        assert_eq!(
            command,
            AppCommand::FetchClusters {
                alias: "dev".to_string(),
                token: 1
            }
        );
        assert_eq!(app.selected_alias(), Some("dev"));
        assert!(app.loading());
    }

    #[test]
    fn fallback_aliases_select_first_and_warn_once() {
        let now = Instant::now();
        let mut app = App::new(&Settings::default());
        let command = app.handle_event(
            AppEvent::AliasesLoaded(Fetched {
                data: aliases(&["dev", "prod", "staging", "production1"]),
                origin: Origin::Fallback("connection refused".to_string()),
            }),
            now,
        );
        assert_eq!(
            command,
            AppCommand::FetchClusters {
                alias: "dev".to_string(),
                token: 1
            }
        );
        assert_eq!(app.selected_alias(), Some("dev"));
        assert_eq!(app.aliases().len(), 4);

        let warnings = app
            .toasts()
            .iter()
            .filter(|toast| toast.notification.severity == Severity::Warning)
            .collect::<Vec<_>>();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].notification.title, "Backend unreachable");
        assert!(!app.auth_required());
    }

    #[test]
    fn preferred_alias_wins_when_listed() {
        let now = Instant::now();
        let settings = Settings {
            initial_alias: Some("prod".to_string()),
            ..Settings::default()
        };
        let mut app = App::new(&settings);
        app.handle_event(
            AppEvent::AliasesLoaded(live(aliases(&["dev", "prod"]))),
            now,
        );
        assert_eq!(app.selected_alias(), Some("prod"));
    }

    #[test]
    fn stale_fetch_for_previous_alias_is_discarded() {
        let now = Instant::now();
        let mut app = booted(&["dev", "prod"], now);

        let AppCommand::FetchClusters { token: prod_token, .. } =
            app.apply_action(Action::NextAlias, now)
        else {
            panic!("expected fetch for prod");
        };
        assert_eq!(app.selected_alias(), Some("prod"));

        app.handle_event(
            AppEvent::ClustersLoaded {
                token: prod_token - 1,
                alias: "dev".to_string(),
                fetched: live(vec![service("dev", "late", 1)]),
            },
            now,
        );
        assert!(app.clusters().iter().all(|row| row.service_name != "late"));

        app.handle_event(
            AppEvent::ClustersLoaded {
                token: prod_token,
                alias: "prod".to_string(),
                fetched: live(vec![service("prod", "fresh", 1)]),
            },
            now,
        );
        assert_eq!(app.clusters().len(), 1);
        assert_eq!(app.clusters()[0].service_name, "fresh");
        assert!(!app.loading());
    }

    #[test]
    fn switching_alias_drops_rows_of_the_previous_alias() {
        let now = Instant::now();
        let mut app = App::new(&Settings::default());
        let AppCommand::FetchClusters { alias, token } = app.handle_event(
            AppEvent::AliasesLoaded(live(aliases(&["dev", "production1"]))),
            now,
        ) else {
            panic!("expected fetch for dev");
        };
        app.handle_event(
            AppEvent::ClustersLoaded {
                token,
                alias,
                fetched: live(vec![service("dev", "web", 2)]),
            },
            now,
        );
        assert_eq!(app.summary().critical, 1);

        let command = app.apply_action(Action::NextAlias, now);
        assert!(matches!(command, AppCommand::FetchClusters { ref alias, .. } if alias == "production1"));
        assert_eq!(app.selected_alias(), Some("production1"));
        assert!(app.loading());
        assert!(app.clusters().is_empty());
        assert!(app.page_items().is_empty());
        assert_eq!(app.summary().total, 0);
    }

    #[test]
    fn superseded_request_for_same_alias_is_discarded() {
        let now = Instant::now();
        let mut app = booted(&["dev"], now);
        let AppCommand::FetchClusters { token: older, .. } = app.on_periodic_refresh() else {
            panic!("expected periodic fetch");
        };
        let AppCommand::FetchClusters { token: newer, .. } = app.on_periodic_refresh() else {
            panic!("expected periodic fetch");
        };
        assert!(newer > older);

        app.handle_event(
            AppEvent::ClustersLoaded {
                token: older,
                alias: "dev".to_string(),
                fetched: live(Vec::new()),
            },
            now,
        );
        assert_eq!(app.clusters().len(), 2);
    }

    #[test]
    fn rotation_ticks_through_aliases_when_idle() {
        let start = Instant::now();
        let mut app = booted(&["a", "b", "c"], start);
        assert_eq!(app.selected_alias(), Some("a"));

        let deadline = app.rotation_deadline().expect("rotation armed");
        assert_eq!(app.on_rotation_tick(deadline - Duration::from_secs(1)), AppCommand::None);

        let command = app.on_rotation_tick(deadline);
        assert!(matches!(command, AppCommand::FetchClusters { ref alias, .. } if alias == "b"));
        assert_eq!(app.selected_alias(), Some("b"));
        assert!(app.rotation_enabled());
    }

    #[test]
    fn opening_details_pauses_rotation_until_closed() {
        let now = Instant::now();
        let mut app = booted(&["a", "b"], now);

        let command = app.apply_action(Action::OpenDetail, now);
        assert_eq!(
            command,
            AppCommand::LoadServiceDetails {
                alias: "a".to_string(),
                cluster_name: "a-main-cluster".to_string(),
                service_name: "api".to_string(),
            }
        );
        assert!(app.rotation_deadline().is_none());
        assert_eq!(app.on_rotation_tick(now + Duration::from_secs(60)), AppCommand::None);

        let later = now + Duration::from_secs(61);
        app.apply_action(Action::Back, later);
        assert!(app.detail().is_none());
        assert_eq!(
            app.rotation_deadline(),
            Some(later + Duration::from_secs(10))
        );
    }

    #[test]
    fn user_alias_change_disables_rotation() {
        let now = Instant::now();
        let mut app = booted(&["a", "b", "c"], now);
        app.apply_action(Action::PrevAlias, now);
        assert_eq!(app.selected_alias(), Some("c"));
        assert!(!app.rotation_enabled());
        assert!(app.rotation_deadline().is_none());

        app.apply_action(Action::ToggleRotation, now);
        assert!(app.rotation_enabled());
        assert!(app.rotation_deadline().is_some());
    }

    #[test]
    fn refresh_flow_blocks_rotation_and_refetches_on_completion() {
        let now = Instant::now();
        let mut app = booted(&["a", "b"], now);

        let command = app.apply_action(Action::Refresh, now);
        assert_eq!(
            command,
            AppCommand::TriggerRefresh {
                alias: "a".to_string()
            }
        );
        assert!(app.refreshing());
        assert!(app.rotation_deadline().is_none());
        assert_eq!(app.apply_action(Action::Refresh, now), AppCommand::None);

        let command = app.handle_event(
            AppEvent::RefreshTriggered {
                alias: "a".to_string(),
                accepted: true,
            },
            now,
        );
        assert_eq!(
            command,
            AppCommand::StartRefreshPoll {
                alias: "a".to_string()
            }
        );
        assert_eq!(app.toasts().last().map(|toast| toast.notification.title.as_str()), Some("Refresh initiated"));

        let command = app.handle_event(
            AppEvent::RefreshFinished {
                alias: "a".to_string(),
                outcome: RefreshOutcome::Completed,
            },
            now,
        );
        assert!(matches!(command, AppCommand::FetchClusters { ref alias, .. } if alias == "a"));
        assert!(!app.refreshing());
        assert!(app.rotation_enabled());
        assert!(app.rotation_deadline().is_some());
    }

    #[test]
    fn failed_refresh_clears_flag_but_keeps_rotation_off() {
        let now = Instant::now();
        let mut app = booted(&["a", "b"], now);
        app.apply_action(Action::Refresh, now);
        let command = app.handle_event(
            AppEvent::RefreshFinished {
                alias: "a".to_string(),
                outcome: RefreshOutcome::Failed,
            },
            now,
        );
        assert_eq!(command, AppCommand::None);
        assert!(!app.refreshing());
        assert!(!app.rotation_enabled());
    }

    #[test]
    fn rejected_trigger_reports_error_and_clears_refreshing() {
        let now = Instant::now();
        let mut app = booted(&["a"], now);
        app.apply_action(Action::Refresh, now);
        let command = app.handle_event(
            AppEvent::RefreshTriggered {
                alias: "a".to_string(),
                accepted: false,
            },
            now,
        );
        assert_eq!(command, AppCommand::None);
        assert!(!app.refreshing());
        let last = app.toasts().last().expect("error toast");
        assert_eq!(last.notification.severity, Severity::Error);
        assert_eq!(last.notification.title, "Failed to trigger refresh");
    }

    #[test]
    fn search_typing_filters_live_and_resets_page() {
        let now = Instant::now();
        let mut app = booted(&["dev"], now);
        app.apply_action(Action::StartSearch, now);
        assert_eq!(app.mode(), InputMode::Search);
        for c in "WE".chars() {
            app.apply_action(Action::InputChar(c), now);
        }
        assert_eq!(app.visible().len(), 1);
        assert_eq!(app.current_page(), 1);

        app.apply_action(Action::CancelInput, now);
        assert_eq!(app.mode(), InputMode::Normal);
        assert_eq!(app.visible().len(), 2);
    }

    #[test]
    fn pages_advance_and_reset_on_filter_change() {
        let now = Instant::now();
        let mut app = App::new(&Settings::default());
        let AppCommand::FetchClusters { alias, token } =
            app.handle_event(AppEvent::AliasesLoaded(live(aliases(&["dev"]))), now)
        else {
            panic!("expected fetch");
        };
        let rows = (0..45)
            .map(|index| service("dev", &format!("svc-{index}"), 1))
            .collect::<Vec<_>>();
        app.handle_event(
            AppEvent::ClustersLoaded {
                token,
                alias,
                fetched: live(rows),
            },
            now,
        );

        assert_eq!(app.total_pages(), 3);
        app.apply_action(Action::NextPage, now);
        app.apply_action(Action::NextPage, now);
        app.apply_action(Action::NextPage, now);
        assert_eq!(app.current_page(), 3);
        assert_eq!(app.page_items().len(), 5);

        app.apply_action(Action::CycleSortKey, now);
        assert_eq!(app.current_page(), 1);
    }

    #[test]
    fn empty_result_page_has_no_selection() {
        let now = Instant::now();
        let mut app = booted(&["dev"], now);
        for c in "nothing-matches".chars() {
            app.apply_action(Action::InputChar(c), now);
        }
        assert!(app.page_items().is_empty());
        assert_eq!(app.selected_index(), None);
        assert_eq!(app.total_pages(), 0);
        assert_eq!(app.apply_action(Action::OpenDetail, now), AppCommand::None);
    }

    #[test]
    fn details_for_other_service_are_ignored() {
        let now = Instant::now();
        let mut app = booted(&["dev"], now);
        app.apply_action(Action::OpenDetail, now);

        app.handle_event(
            AppEvent::DetailsLoaded {
                alias: "dev".to_string(),
                cluster_name: "dev-main-cluster".to_string(),
                service_name: "web".to_string(),
                fetched: live(ServiceDetails::default()),
            },
            now,
        );
        assert!(app.detail().and_then(|detail| detail.details.as_ref()).is_none());

        app.handle_event(
            AppEvent::DetailsLoaded {
                alias: "dev".to_string(),
                cluster_name: "dev-main-cluster".to_string(),
                service_name: "api".to_string(),
                fetched: live(ServiceDetails::default()),
            },
            now,
        );
        assert!(app.detail().and_then(|detail| detail.details.as_ref()).is_some());
    }

    #[test]
    fn detail_tabs_cycle_while_open() {
        let now = Instant::now();
        let mut app = booted(&["dev"], now);
        app.apply_action(Action::OpenDetail, now);
        app.apply_action(Action::NextTab, now);
        assert_eq!(app.detail().map(|detail| detail.tab), Some(DetailTab::Tasks));
        app.apply_action(Action::PrevTab, now);
        app.apply_action(Action::PrevTab, now);
        assert_eq!(
            app.detail().map(|detail| detail.tab),
            Some(DetailTab::Deployment)
        );
    }

    #[test]
    fn unauthorized_fetch_raises_one_session_toast() {
        let now = Instant::now();
        let mut app = App::new(&Settings::default());
        let AppCommand::FetchClusters { alias, token } =
            app.handle_event(AppEvent::AliasesLoaded(live(aliases(&["dev"]))), now)
        else {
            panic!("expected fetch");
        };
        app.handle_event(
            AppEvent::ClustersLoaded {
                token,
                alias,
                fetched: Fetched {
                    data: vec![service("dev", "mock", 1)],
                    origin: Origin::Unauthorized,
                },
            },
            now,
        );
        assert!(app.auth_required());
        assert_eq!(app.clusters().len(), 1);

        let AppCommand::FetchClusters { alias, token } = app.on_periodic_refresh() else {
            panic!("expected periodic fetch");
        };
        app.handle_event(
            AppEvent::ClustersLoaded {
                token,
                alias,
                fetched: Fetched {
                    data: Vec::new(),
                    origin: Origin::Unauthorized,
                },
            },
            now,
        );
        let session_toasts = app
            .toasts()
            .iter()
            .filter(|toast| toast.notification.title == "Session expired")
            .count();
        assert_eq!(session_toasts, 1);
    }

    #[test]
    fn theme_toggle_and_help_dismissal() {
        let now = Instant::now();
        let mut app = booted(&["dev"], now);
        let before = app.theme();
        app.apply_action(Action::ToggleTheme, now);
        assert_ne!(app.theme(), before);

        app.apply_action(Action::ToggleHelp, now);
        assert!(app.show_help());
        app.apply_action(Action::Back, now);
        assert!(!app.show_help());
    }
}
