//! Dashboard: host identity, usage gauges and network totals

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::controller::Controller;
use crate::metrics::SystemSnapshot;
use crate::sources::HostSources;
use crate::tui::theme::Theme;
use crate::utils::{format_bytes, format_uptime};

pub fn render<S: HostSources>(f: &mut Frame, area: Rect, controller: &Controller<S>, theme: &Theme) {
    let Some(stamped) = controller.system() else {
        let waiting = Paragraph::new(Line::from(Span::styled(
            "Sampling host metrics…",
            theme.secondary(),
        )))
        .block(block("System", theme));
        f.render_widget(waiting, area);
        return;
    };
    let snapshot = stamped.value();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Identity
            Constraint::Length(3), // CPU
            Constraint::Length(3), // Memory
            Constraint::Length(3), // Swap
            Constraint::Length(3), // Disk
            Constraint::Min(3),    // Network
        ])
        .split(area);

    render_identity(f, chunks[0], snapshot, theme);

    let cpu = f64::from(snapshot.cpu_percent);
    render_gauge(f, chunks[1], "CPU", cpu, format!("{:.1}%", cpu), theme);

    let memory = snapshot.memory_percent();
    render_gauge(
        f,
        chunks[2],
        "Memory",
        memory,
        format!(
            "{} / {} ({:.1}%) · {} available",
            format_bytes(snapshot.memory_used),
            format_bytes(snapshot.memory_total),
            memory,
            format_bytes(snapshot.memory_available)
        ),
        theme,
    );

    let swap = snapshot.swap_percent();
    let swap_label = if snapshot.swap_total == 0 {
        "no swap".to_string()
    } else {
        format!(
            "{} / {} ({:.1}%)",
            format_bytes(snapshot.swap_used),
            format_bytes(snapshot.swap_total),
            swap
        )
    };
    render_gauge(f, chunks[3], "Swap", swap, swap_label, theme);

    let disk = snapshot.disk_percent();
    render_gauge(
        f,
        chunks[4],
        &format!("Disk {}", snapshot.mount_point.display()),
        disk,
        format!(
            "{} / {} ({:.1}%) · {} free",
            format_bytes(snapshot.disk_used),
            format_bytes(snapshot.disk_total),
            disk,
            format_bytes(snapshot.disk_free)
        ),
        theme,
    );

    render_network(f, chunks[5], snapshot, theme);
}

fn block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border())
        .title(Span::styled(title, theme.header()))
}

fn field<'a>(label: &'a str, value: String, theme: &Theme) -> Vec<Span<'a>> {
    vec![
        Span::styled(format!("{:<10}", label), theme.secondary()),
        Span::styled(value, theme.primary()),
    ]
}

fn render_identity(f: &mut Frame, area: Rect, snapshot: &SystemSnapshot, theme: &Theme) {
    let load = snapshot.load_average;
    let lines = vec![
        Line::from(field("Host", snapshot.hostname.clone(), theme)),
        Line::from(field(
            "Kernel",
            format!("{} ({})", snapshot.kernel_version, snapshot.architecture),
            theme,
        )),
        Line::from(field("Uptime", format_uptime(snapshot.uptime), theme)),
        Line::from({
            let mut spans = field(
                "CPUs",
                format!("{} @ {} MHz", snapshot.cpu_count, snapshot.cpu_frequency_mhz),
                theme,
            );
            spans.push(Span::styled("   Load ", theme.secondary()));
            spans.push(Span::raw(format!(
                "{:.2} {:.2} {:.2}",
                load.one, load.five, load.fifteen
            )));
            spans
        }),
    ];

    let title = format!("System · updated {}", snapshot.taken_at.format("%H:%M:%S"));
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border())
            .title(Span::styled(title, theme.header())),
    );
    f.render_widget(paragraph, area);
}

fn render_gauge(f: &mut Frame, area: Rect, title: &str, percent: f64, label: String, theme: &Theme) {
    let ratio = (percent / 100.0).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(block(title, theme))
        .gauge_style(theme.gauge(percent))
        .ratio(ratio)
        .label(Span::styled(label, theme.emphasis()));
    f.render_widget(gauge, area);
}

fn render_network(f: &mut Frame, area: Rect, snapshot: &SystemSnapshot, theme: &Theme) {
    let net = snapshot.network;
    let lines = vec![
        Line::from(field(
            "Received",
            format!(
                "{} ({} packets)",
                format_bytes(net.bytes_received),
                net.packets_received
            ),
            theme,
        )),
        Line::from(field(
            "Sent",
            format!("{} ({} packets)", format_bytes(net.bytes_sent), net.packets_sent),
            theme,
        )),
    ];
    f.render_widget(Paragraph::new(lines).block(block("Network", theme)), area);
}
