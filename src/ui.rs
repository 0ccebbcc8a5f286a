use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap};
use serde_json::Value;
use tokio::time::Instant;

use crate::api::Origin;
use crate::app::{App, DetailView, InputMode};
use crate::model::{ClusterService, DetailTab, ServiceDetails, Theme};
use crate::notify::{Severity, Toast};
use crate::view::{HealthStatus, PageMarker, page_markers};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const TOAST_WIDTH: u16 = 46;

#[derive(Debug, Clone, Copy)]
struct Palette {
    bg: Color,
    panel: Color,
    text: Color,
    accent: Color,
    muted: Color,
    warn: Color,
    error: Color,
    info: Color,
    highlight: Color,
    pl_a: Color,
    pl_b: Color,
    pl_c: Color,
}

const DARK: Palette = Palette {
    bg: Color::Rgb(9, 15, 25),
    panel: Color::Rgb(16, 27, 44),
    text: Color::White,
    accent: Color::Rgb(52, 211, 153),
    muted: Color::Rgb(140, 156, 178),
    warn: Color::Rgb(251, 191, 36),
    error: Color::Rgb(248, 113, 113),
    info: Color::Rgb(125, 211, 252),
    highlight: Color::Rgb(24, 36, 58),
    pl_a: Color::Rgb(17, 94, 89),
    pl_b: Color::Rgb(30, 64, 175),
    pl_c: Color::Rgb(55, 48, 163),
};

const LIGHT: Palette = Palette {
    bg: Color::Rgb(241, 245, 249),
    panel: Color::Rgb(255, 255, 255),
    text: Color::Rgb(15, 23, 42),
    accent: Color::Rgb(5, 150, 105),
    muted: Color::Rgb(100, 116, 139),
    warn: Color::Rgb(180, 83, 9),
    error: Color::Rgb(220, 38, 38),
    info: Color::Rgb(2, 132, 199),
    highlight: Color::Rgb(226, 232, 240),
    pl_a: Color::Rgb(153, 246, 228),
    pl_b: Color::Rgb(191, 219, 254),
    pl_c: Color::Rgb(199, 210, 254),
};

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => DARK,
        Theme::Light => LIGHT,
    }
}

pub fn render(frame: &mut Frame, app: &App, now: Instant) {
    let colors = palette(app.theme());
    frame.render_widget(Block::default().style(Style::default().bg(colors.bg)), frame.area());

    let banner_height = if app.auth_required() { 1 } else { 0 };
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(banner_height),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app, now, colors);
    if app.auth_required() {
        render_auth_banner(frame, root[1], colors);
    }
    render_summary(frame, root[2], app, colors);
    render_search_bar(frame, root[3], app, colors);
    render_table(frame, root[4], app, colors);
    render_pagination(frame, root[5], app, colors);
    render_footer(frame, root[6], app, colors);

    if let Some(detail) = app.detail() {
        render_detail_modal(frame, detail, colors);
    }
    if app.show_help() {
        render_help_modal(frame, app, colors);
    }
    render_toasts(frame, app.toasts(), now, colors);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App, now: Instant, colors: Palette) {
    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " HEARTBEAT ", Color::Black, colors.accent, colors.pl_a);
    push_powerline_segment(
        &mut spans,
        format!(" 󰀄 {} ", compact_text(app.selected_alias().unwrap_or("-"), 18)),
        colors.text,
        colors.pl_a,
        colors.pl_b,
    );

    let rotation = if app.refreshing() {
        " 󰑓 refreshing ".to_string()
    } else {
        match app.rotation_remaining(now) {
            Some(left) => format!(" 󰑐 next in {}s ", left.as_secs()),
            None if app.rotation_enabled() => " 󰑐 paused ".to_string(),
            None => " 󰑐 off ".to_string(),
        }
    };
    push_powerline_segment(&mut spans, rotation, colors.text, colors.pl_b, colors.pl_c);

    let updated = match (app.loading(), app.last_updated()) {
        (true, _) => " 󰔟 loading… ".to_string(),
        (false, Some(at)) => format!(" 󰥔 {at} "),
        (false, None) => " 󰥔 never ".to_string(),
    };
    push_powerline_segment(&mut spans, updated, colors.text, colors.pl_c, colors.bg);

    let right = alias_strip(app, colors);
    let right_width = spans_width(&right) as u16;
    if right_width == 0 || right_width + spans_width(&spans) as u16 >= area.width {
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(colors.bg)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(colors.bg)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Line::from(right))
            .style(Style::default().bg(colors.bg))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn alias_strip(app: &App, colors: Palette) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for alias in app.aliases() {
        let selected = app.selected_alias() == Some(alias.as_str());
        let style = if selected {
            Style::default()
                .fg(Color::Black)
                .bg(colors.info)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.muted)
        };
        spans.push(Span::styled(format!(" {} ", compact_text(alias, 14)), style));
    }
    spans
}

fn render_auth_banner(frame: &mut Frame, area: Rect, colors: Palette) {
    let banner = Paragraph::new(" 󰌾 Not signed in: live data is unavailable, showing sample data. Sign in and press r.")
        .style(
            Style::default()
                .fg(Color::Black)
                .bg(colors.error)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(banner, area);
}

fn render_summary(frame: &mut Frame, area: Rect, app: &App, colors: Palette) {
    let summary = app.summary();
    let cards = [
        ("Total", summary.total, colors.info),
        ("Running", summary.running, colors.accent),
        ("Stopped", summary.stopped, colors.muted),
        ("Pending", summary.pending, colors.warn),
        ("Critical", summary.critical, colors.error),
    ];
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, cards.len() as u32); 5])
        .split(area);

    for ((label, value, color), chunk) in cards.into_iter().zip(chunks.iter()) {
        let card = Paragraph::new(Line::from(vec![
            Span::styled(format!("{label} "), Style::default().fg(colors.muted)),
            Span::styled(
                value.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .style(Style::default().bg(colors.panel)),
        );
        frame.render_widget(card, *chunk);
    }
}

fn render_search_bar(frame: &mut Frame, area: Rect, app: &App, colors: Palette) {
    let filters = app.filters();
    let searching = app.mode() == InputMode::Search;
    let query = if searching {
        format!("/{}▏", app.search())
    } else if app.search().is_empty() {
        "/ to search".to_string()
    } else {
        format!("/{}", app.search())
    };
    let query_style = if searching {
        Style::default().fg(Color::Black).bg(colors.warn)
    } else {
        Style::default().fg(colors.muted)
    };

    let line = Line::from(vec![
        Span::styled(format!(" {query} "), query_style),
        Span::raw("  "),
        Span::styled("filter ", Style::default().fg(colors.muted)),
        Span::styled(
            filters.status.label(),
            Style::default().fg(colors.text).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("sort ", Style::default().fg(colors.muted)),
        Span::styled(
            format!("{} {}", filters.sort_by.label(), filters.sort_order.label()),
            Style::default().fg(colors.text).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} of {} services", app.visible().len(), app.clusters().len()),
            Style::default().fg(colors.muted),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(colors.bg)),
        area,
    );
}

fn render_table(frame: &mut Frame, area: Rect, app: &App, colors: Palette) {
    let alias = app.selected_alias().unwrap_or_default();
    let title = match app.data_origin() {
        Some(Origin::Fallback(_)) => format!("Services · {alias} (sample data)"),
        Some(Origin::Unauthorized) => format!("Services · {alias} (signed out)"),
        _ => format!("Services · {alias}"),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.accent))
        .style(Style::default().bg(colors.panel));

    let items = app.page_items();
    if items.is_empty() {
        let message = if app.loading() {
            "Loading services…"
        } else if app.clusters().is_empty() {
            "No services reported for this alias"
        } else {
            "No services match the current search and filter"
        };
        frame.render_widget(
            Paragraph::new(message)
                .alignment(Alignment::Center)
                .style(Style::default().fg(colors.muted))
                .block(block),
            area,
        );
        return;
    }

    let headers = ["Cluster", "Service", "Tasks", "CPU", "Memory", "Health", "CPU trend"];
    let header_row = Row::new(headers.iter().map(|header| {
        Cell::from(*header).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .height(1)
    .style(Style::default().fg(colors.accent));

    let rows = items.iter().map(|service| {
        let health = HealthStatus::classify(service, alias);
        Row::new(vec![
            Cell::from(service.cluster_name.clone()),
            Cell::from(service.service_name.clone()),
            Cell::from(task_counts(service)),
            Cell::from(format!("{:.1}%", service.current_cpu))
                .style(Style::default().fg(usage_color(service.current_cpu, colors))),
            Cell::from(format!("{:.1}%", service.current_memory))
                .style(Style::default().fg(usage_color(service.current_memory, colors))),
            Cell::from(health.label()).style(
                Style::default()
                    .fg(health_color(health, colors))
                    .add_modifier(Modifier::BOLD),
            ),
            Cell::from(sparkline(&service.historical_cpu))
                .style(Style::default().fg(colors.info)),
        ])
        .style(Style::default().fg(colors.text))
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(20),
            Constraint::Percentage(24),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(11),
            Constraint::Min(12),
        ],
    )
    .header(header_row)
    .block(block)
    .column_spacing(1)
    .row_highlight_style(
        Style::default()
            .bg(colors.highlight)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("󰜴 ");

    let mut state = TableState::default();
    state.select(app.selected_index());
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_pagination(frame: &mut Frame, area: Rect, app: &App, colors: Palette) {
    let total = app.total_pages();
    if total == 0 {
        frame.render_widget(Paragraph::new("").style(Style::default().bg(colors.bg)), area);
        return;
    }
    let current = app.current_page();
    let edge = |enabled: bool| {
        if enabled {
            Style::default().fg(colors.text)
        } else {
            Style::default().fg(colors.muted)
        }
    };

    let mut spans = vec![Span::styled(" ‹ ", edge(current > 1))];
    for marker in page_markers(current, total) {
        match marker {
            PageMarker::Page(page) if page == current => spans.push(Span::styled(
                format!(" {page} "),
                Style::default()
                    .fg(Color::Black)
                    .bg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            PageMarker::Page(page) => {
                spans.push(Span::styled(format!(" {page} "), Style::default().fg(colors.text)))
            }
            PageMarker::Gap => spans.push(Span::styled(" … ", Style::default().fg(colors.muted))),
        }
    }
    spans.push(Span::styled(" › ", edge(current < total)));
    spans.push(Span::styled(
        format!("  page {current}/{total} · {} per page", app.items_per_page()),
        Style::default().fg(colors.muted),
    ));

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .style(Style::default().bg(colors.bg)),
        area,
    );
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App, colors: Palette) {
    let mut spans = Vec::new();
    let (mode_label, mode_bg) = match app.mode() {
        InputMode::Normal => (" 󰘳 nrm ", colors.pl_a),
        InputMode::Search => (" 󰈲 srch ", colors.warn),
    };
    push_powerline_segment(&mut spans, mode_label, colors.text, mode_bg, colors.pl_b);
    let status_width = area.width.saturating_sub(30).max(24) as usize;
    push_powerline_segment(
        &mut spans,
        format!(
            " {} {} ",
            footer_status_icon(app.status()),
            compact_text(app.status(), status_width)
        ),
        colors.text,
        colors.pl_b,
        colors.bg,
    );

    let right = vec![
        Span::styled(
            format!(" {} ", app.theme().label()),
            Style::default().fg(colors.muted),
        ),
        Span::styled(" ? help ", Style::default().fg(colors.muted)),
    ];
    let right_width = spans_width(&right) as u16;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(colors.bg)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Line::from(right))
            .style(Style::default().bg(colors.bg))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn footer_status_icon(status: &str) -> &'static str {
    let lower = status.to_ascii_lowercase();
    if lower.contains("fail") || lower.contains("error") || lower.contains("unavailable") {
        "󰅚"
    } else if lower.contains("sample") || lower.contains("fallback") || lower.contains("signed") {
        "󰀦"
    } else if lower.contains("refresh") {
        "󰑓"
    } else {
        "󰋼"
    }
}

fn render_detail_modal(frame: &mut Frame, detail: &DetailView, colors: Palette) {
    let area = centered_rect(86, 80, frame.area());
    frame.render_widget(Clear, area);

    let title = format!(
        " {} · {} ",
        detail.service.service_name, detail.service.cluster_name
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.accent))
        .style(Style::default().bg(colors.panel));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let selected = DetailTab::ALL
        .iter()
        .position(|tab| *tab == detail.tab)
        .unwrap_or(0);
    let tabs = Tabs::new(DetailTab::ALL.iter().map(|tab| tab.title()))
        .select(selected)
        .style(Style::default().fg(colors.muted))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(colors.accent)
                .add_modifier(Modifier::BOLD),
        )
        .divider("│");
    frame.render_widget(tabs, chunks[0]);

    let origin_note = match &detail.origin {
        None => Line::from(Span::styled("Loading details…", Style::default().fg(colors.muted))),
        Some(Origin::Live) => Line::from(""),
        Some(Origin::Fallback(reason)) => Line::from(Span::styled(
            format!("Sample data: {}", compact_text(reason, 80)),
            Style::default().fg(colors.warn),
        )),
        Some(Origin::Unauthorized) => Line::from(Span::styled(
            "Sample data: not signed in",
            Style::default().fg(colors.error),
        )),
    };
    frame.render_widget(Paragraph::new(origin_note), chunks[1]);

    let body = match &detail.details {
        Some(details) => detail_tab_text(detail.tab, &detail.service, details, colors),
        None => Text::from(""),
    };
    frame.render_widget(
        Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .scroll((detail.scroll, 0))
            .style(Style::default().fg(colors.text)),
        chunks[2],
    );
}

fn detail_tab_text(
    tab: DetailTab,
    service: &ClusterService,
    details: &ServiceDetails,
    colors: Palette,
) -> Text<'static> {
    match tab {
        DetailTab::Overview => overview_text(service, details, colors),
        DetailTab::Tasks => tasks_text(details, colors),
        DetailTab::Config => config_text(details, colors),
        DetailTab::Events => events_text(details, colors),
        DetailTab::Deployment => deployment_text(details, colors),
    }
}

fn field(label: &str, value: impl Into<String>, colors: Palette) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<18}"), Style::default().fg(colors.muted)),
        Span::styled(value.into(), Style::default().fg(colors.text)),
    ])
}

fn heading(label: &str, colors: Palette) -> Line<'static> {
    Line::from(Span::styled(
        label.to_string(),
        Style::default()
            .fg(colors.accent)
            .add_modifier(Modifier::BOLD),
    ))
}

fn overview_text(service: &ClusterService, details: &ServiceDetails, colors: Palette) -> Text<'static> {
    let overview = &details.service_overview;
    let health = HealthStatus::classify(service, &service.account_alias);
    Text::from(vec![
        field("Service ARN", overview.service_arn.clone(), colors),
        field("Created", overview.creation_date.clone(), colors),
        field("Task definition", overview.task_definition.clone(), colors),
        field("Desired count", overview.desired_count.to_string(), colors),
        field("Launch type", overview.launch_type.clone(), colors),
        Line::from(""),
        heading("Live metrics", colors),
        field("Tasks", task_counts(service), colors),
        field("CPU", format!("{:.1}%", service.current_cpu), colors),
        field("Memory", format!("{:.1}%", service.current_memory), colors),
        Line::from(vec![
            Span::styled(format!("{:<18}", "Health"), Style::default().fg(colors.muted)),
            Span::styled(
                health.label(),
                Style::default()
                    .fg(health_color(health, colors))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        field("CPU trend", sparkline(&service.historical_cpu), colors),
        field("Memory trend", sparkline(&service.historical_memory), colors),
        field("Last updated", service.last_updated.clone(), colors),
    ])
}

fn tasks_text(details: &ServiceDetails, colors: Palette) -> Text<'static> {
    let current = &details.current_tasks;
    let mut lines = vec![
        field(
            "Running / desired",
            format!("{} / {}", current.running_count, current.desired_count),
            colors,
        ),
        Line::from(""),
    ];
    if current.tasks.is_empty() {
        lines.push(Line::from(Span::styled(
            "No tasks reported",
            Style::default().fg(colors.muted),
        )));
    }
    for task in &current.tasks {
        let status_color = if task.healthy() { colors.accent } else { colors.error };
        lines.push(Line::from(vec![
            Span::styled(
                task.task_id.clone(),
                Style::default().fg(colors.text).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(task.health_status.clone(), Style::default().fg(status_color)),
        ]));
        lines.push(field("  started", task.started_at.clone(), colors));
        lines.push(field("  instance", task.container_instance.clone(), colors));
        lines.push(field("  zone", task.availability_zone.clone(), colors));
    }
    if let Some(task) = current.tasks.first()
        && !task.task_definition.is_null()
    {
        lines.push(Line::from(""));
        lines.push(heading("Task definition", colors));
        lines.extend(json_lines(&task.task_definition, colors));
    }
    Text::from(lines)
}

fn config_text(details: &ServiceDetails, colors: Palette) -> Text<'static> {
    let config = &details.configuration;
    let mut lines = vec![heading("Service definition", colors)];
    lines.extend(json_lines(&config.service_definition, colors));

    lines.push(Line::from(""));
    lines.push(heading("Load balancer", colors));
    match &config.load_balancer {
        Some(balancer) => {
            lines.push(field("Type", balancer.kind.clone(), colors));
            lines.push(field("Target group", balancer.target_group_arn.clone(), colors));
            lines.extend(json_lines(&balancer.config, colors));
        }
        None => lines.push(field("Type", "none", colors)),
    }

    lines.push(Line::from(""));
    lines.push(heading("Auto scaling", colors));
    match &config.auto_scaling {
        Some(scaling) => {
            lines.push(field(
                "Capacity",
                format!("{}..{}", scaling.min_capacity, scaling.max_capacity),
                colors,
            ));
            lines.push(field("Status", scaling.status.clone(), colors));
            for policy in &scaling.policies {
                lines.push(field(
                    &format!("  {}", policy.name),
                    format!("{} {} @ {:.0}", policy.kind, policy.metric, policy.target_value),
                    colors,
                ));
            }
        }
        None => lines.push(field("Status", "disabled", colors)),
    }

    let network = &config.network;
    lines.push(Line::from(""));
    lines.push(heading("Network", colors));
    lines.push(field("Mode", network.network_mode.clone(), colors));
    lines.push(field(
        "Public IP",
        if network.assign_public_ip { "assigned" } else { "none" },
        colors,
    ));
    lines.push(field("Subnets", network.subnets.join(", "), colors));
    lines.push(field("Security groups", network.security_groups.join(", "), colors));
    Text::from(lines)
}

fn events_text(details: &ServiceDetails, colors: Palette) -> Text<'static> {
    let events = &details.events;
    let mut lines = vec![heading("Service events", colors)];
    for event in &events.service_events {
        let color = match event.kind.to_ascii_uppercase().as_str() {
            "ERROR" => colors.error,
            "WARNING" | "WARN" => colors.warn,
            _ => colors.info,
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<22}", event.timestamp), Style::default().fg(colors.muted)),
            Span::styled(format!("{:<8}", event.kind), Style::default().fg(color)),
            Span::styled(event.message.clone(), Style::default().fg(colors.text)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(heading("Scaling events", colors));
    for event in &events.scaling_events {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<22}", event.timestamp), Style::default().fg(colors.muted)),
            Span::styled(
                format!("{:<10} {} → {}  ", event.event_type, event.from_count, event.to_count),
                Style::default().fg(colors.info),
            ),
            Span::styled(event.reason.clone(), Style::default().fg(colors.text)),
        ]));
    }
    Text::from(lines)
}

fn deployment_text(details: &ServiceDetails, colors: Palette) -> Text<'static> {
    let current = &details.deployment_info.current_deployment;
    let mut lines = vec![
        heading("Current deployment", colors),
        field("Id", current.id.clone(), colors),
        field("Status", current.status.clone(), colors),
        field("Task definition", current.task_definition.clone(), colors),
        field("Created", current.created_at.clone(), colors),
        field("Updated", current.updated_at.clone(), colors),
        field(
            "Tasks",
            format!("{} / {}", current.running_count, current.desired_count),
            colors,
        ),
        Line::from(vec![
            Span::styled(format!("{:<18}", "Rollout"), Style::default().fg(colors.muted)),
            Span::styled(
                progress_bar(current.rollout_progress, 24),
                Style::default().fg(colors.accent),
            ),
            Span::styled(
                format!(" {:.0}%", current.rollout_progress),
                Style::default().fg(colors.text),
            ),
        ]),
        Line::from(""),
        heading("History", colors),
    ];
    for record in &details.deployment_info.deployment_history {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", record.status), Style::default().fg(colors.info)),
            Span::styled(
                format!("{:<28}", record.task_definition),
                Style::default().fg(colors.text),
            ),
            Span::styled(
                format!(
                    "{} → {}",
                    record.created_at,
                    record.completed_at.as_deref().unwrap_or("in progress")
                ),
                Style::default().fg(colors.muted),
            ),
        ]));
    }
    Text::from(lines)
}

/// Pretty JSON with keys and scalar values colored apart.
fn json_lines(value: &Value, colors: Palette) -> Vec<Line<'static>> {
    if value.is_null() {
        return vec![Line::from(Span::styled("-", Style::default().fg(colors.muted)))];
    }
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    pretty
        .lines()
        .map(|line| {
            let indent_len = line.len() - line.trim_start().len();
            let (indent, content) = line.split_at(indent_len);
            let mut spans = vec![Span::raw(indent.to_string())];
            match content.split_once("\": ") {
                Some((key, rest)) if key.starts_with('"') => {
                    spans.push(Span::styled(
                        format!("{key}\": "),
                        Style::default().fg(colors.info),
                    ));
                    spans.push(json_scalar_span(rest, colors));
                }
                _ => spans.push(json_scalar_span(content, colors)),
            }
            Line::from(spans)
        })
        .collect()
}

fn json_scalar_span(token: &str, colors: Palette) -> Span<'static> {
    let bare = token.trim_end_matches(',');
    let color = if bare.starts_with('"') {
        colors.accent
    } else if matches!(bare, "true" | "false" | "null") {
        colors.warn
    } else if bare.parse::<f64>().is_ok() {
        Color::Rgb(251, 146, 60)
    } else {
        colors.muted
    };
    Span::styled(token.to_string(), Style::default().fg(color))
}

fn render_help_modal(frame: &mut Frame, app: &App, colors: Palette) {
    let area = centered_rect(70, 70, frame.area());
    frame.render_widget(Clear, area);

    let rotation = if app.rotation_enabled() { "on" } else { "off" };
    let mut lines = vec![
        Line::from(format!(
            "heartbeat help  alias:{}  theme:{}  auto-rotate:{}",
            app.selected_alias().unwrap_or("-"),
            app.theme().label(),
            rotation,
        )),
        Line::from(""),
    ];
    for (keys, text) in HELP_ROWS {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{keys:<22}"),
                Style::default().fg(colors.accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(text, Style::default().fg(colors.text)),
        ]));
    }

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.accent))
                .style(Style::default().bg(colors.panel)),
        )
        .style(Style::default().fg(colors.text));
    frame.render_widget(modal, area);
}

const HELP_ROWS: [(&str, &str); 15] = [
    ("j/k ↑/↓", "move selection (scroll in details)"),
    ("n/p PgDn/PgUp", "next / previous page"),
    ("←/→ Tab/Shift+Tab", "page, or detail tab when details are open"),
    ("[ / ]", "previous / next alias (stops auto-rotate)"),
    ("a", "toggle alias auto-rotate"),
    ("/", "search cluster or service (Enter keep, Esc clear)"),
    ("f", "cycle health filter"),
    ("s", "cycle sort column"),
    ("o", "flip sort order"),
    ("Enter", "open service details"),
    ("Esc", "close details, clear search"),
    ("r F5", "trigger a backend refresh"),
    ("d", "toggle dark / light theme"),
    ("x", "dismiss newest notification"),
    ("? q", "help, quit"),
];

fn render_toasts(frame: &mut Frame, toasts: &[Toast], now: Instant, colors: Palette) {
    let screen = frame.area();
    if toasts.is_empty() || screen.width < TOAST_WIDTH + 2 {
        return;
    }
    let width = TOAST_WIDTH;
    let x = screen.x + screen.width - width - 1;
    let mut y = screen.y + 1;

    for toast in toasts.iter().rev() {
        let height = if toast.notification.message.is_some() { 4 } else { 3 };
        if y + height > screen.y + screen.height {
            break;
        }
        let area = Rect::new(x, y, width, height);
        frame.render_widget(Clear, area);

        let color = severity_color(toast.notification.severity, colors);
        let inner_width = width.saturating_sub(2) as usize;
        let mut lines = vec![Line::from(Span::styled(
            compact_text(&toast.notification.title, inner_width),
            Style::default().fg(colors.text).add_modifier(Modifier::BOLD),
        ))];
        if let Some(message) = &toast.notification.message {
            lines.push(Line::from(Span::styled(
                compact_text(message, inner_width),
                Style::default().fg(colors.muted),
            )));
        }
        let remaining = (toast.remaining_ratio(now) * inner_width as f64).round() as usize;
        lines.push(Line::from(Span::styled(
            "▔".repeat(remaining),
            Style::default().fg(color),
        )));

        let block = Block::default()
            .title(format!(" {} ", toast.notification.severity.label()))
            .borders(Borders::LEFT | Borders::RIGHT | Borders::TOP)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(colors.panel));
        frame.render_widget(Paragraph::new(lines).block(block), area);
        y += height;
    }
}

fn severity_color(severity: Severity, colors: Palette) -> Color {
    match severity {
        Severity::Success => colors.accent,
        Severity::Error => colors.error,
        Severity::Info => colors.info,
        Severity::Warning => colors.warn,
    }
}

fn health_color(health: HealthStatus, colors: Palette) -> Color {
    match health {
        HealthStatus::Overloaded => colors.error,
        HealthStatus::Normal => colors.accent,
        HealthStatus::Warning => colors.warn,
    }
}

fn usage_color(percent: f64, colors: Palette) -> Color {
    if percent >= 80.0 {
        colors.error
    } else if percent >= 60.0 {
        colors.warn
    } else {
        colors.text
    }
}

fn task_counts(service: &ClusterService) -> String {
    if service.pending_tasks > 0 {
        format!("{} (+{})", service.running_tasks, service.pending_tasks)
    } else {
        service.running_tasks.to_string()
    }
}

fn sparkline(values: &[f64]) -> String {
    values
        .iter()
        .map(|value| {
            let level = (value.clamp(0.0, 100.0) / 100.0 * (SPARK_LEVELS.len() - 1) as f64)
                .round() as usize;
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled.min(width)))
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|span| span.content.chars().count()).sum()
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    if max_chars <= 1 {
        return "…".to_string();
    }
    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
