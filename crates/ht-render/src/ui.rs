use ht_core::config::RenderConfig;
use ht_core::traits::MediaKind;
use ht_engine::pipeline::{PassStats, PipelineState};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::preview::Preview;
use crate::raster::RasterSurface;
use crate::ticker::FpsCounter;

/// Largeur de la barre latérale, en colonnes.
const SIDEBAR_WIDTH: u16 = 26;

/// Tout ce que la barre latérale affiche en plus de la config.
pub struct StatusView<'a> {
    pub state: PipelineState,
    pub media: Option<MediaKind>,
    pub paused: bool,
    pub stats: Option<PassStats>,
    pub error: Option<&'a str>,
    pub preset: Option<&'a str>,
    pub fps: &'a FpsCounter,
    pub show_help: bool,
}

/// Dessine l'UI complète : aperçu + barre latérale (+ aide).
pub fn draw(
    frame: &mut Frame,
    preview: &mut Preview,
    raster: &RasterSurface,
    config: &RenderConfig,
    status: &StatusView<'_>,
) {
    let area = frame.area();
    let chunks =
        Layout::horizontal([Constraint::Min(20), Constraint::Length(SIDEBAR_WIDTH)]).split(area);

    let canvas = Block::default().borders(Borders::ALL).title(" halftone ");
    let inner = canvas.inner(chunks[0]);
    frame.render_widget(canvas, chunks[0]);
    preview.render(raster, frame.buffer_mut(), inner);

    draw_sidebar(frame, chunks[1], config, status);

    if status.show_help {
        draw_help_overlay(frame, area);
    }
}

fn draw_sidebar(frame: &mut Frame, area: Rect, config: &RenderConfig, status: &StatusView<'_>) {
    let header = Style::default().fg(Color::Yellow);
    let state_color = match status.state {
        PipelineState::Failed => Color::Red,
        PipelineState::Playing | PipelineState::Static => Color::Green,
        _ => Color::DarkGray,
    };
    let media = match status.media {
        Some(MediaKind::StaticImage) => "image",
        Some(MediaKind::LoopingVideo) if status.paused => "video (paused)",
        Some(MediaKind::LoopingVideo) => "video",
        None => "-",
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!("● {}", status.state.label()),
            Style::default().fg(state_color),
        )),
        Line::from(format!(" Media: {media}")),
        Line::from(""),
        Line::from(Span::styled("─ Halftone ──", header)),
        Line::from(format!(" Style: {}", config.mode.label())),
        Line::from(format!(" Size: {}px", config.output_size)),
        Line::from(format!(" Cell: {:.1}", config.cell_size)),
        Line::from(format!(" Max radius: {:.1}", config.max_dot_radius)),
        Line::from(format!(" Threshold: {:.2}", config.dither_threshold)),
        Line::from(format!(" Contrast: {:.1}", config.contrast)),
        Line::from(format!(" Brightness: {:+.2}", config.brightness)),
        Line::from(format!(" DPR: {:.1}", config.device_pixel_ratio)),
    ];

    if let Some(preset) = status.preset {
        lines.push(Line::from(format!(" Preset: {preset}")));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("─ Pass ──────", header)));
    if let Some(stats) = status.stats {
        lines.push(Line::from(format!(" Render: {0}x{0}", stats.render_size)));
        lines.push(Line::from(format!(
            " Source: {}x{}",
            stats.source_size.0, stats.source_size.1
        )));
        lines.push(Line::from(format!(" Cells: {}", stats.cells)));
        lines.push(Line::from(format!(" Marks: {}", stats.marks)));
    } else {
        lines.push(Line::from(" (no pass yet)"));
    }
    lines.push(Line::from(format!(" {:.0} FPS", status.fps.fps())));
    lines.push(Line::from(format!(" {:.1}ms", status.fps.frame_time_ms)));

    if let Some(error) = status.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {error}"),
            Style::default().fg(Color::Red),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" ? = help", Style::default().fg(Color::DarkGray))));

    let sidebar = Paragraph::new(lines)
        .wrap(ratatui::widgets::Wrap { trim: true })
        .block(Block::default().borders(Borders::LEFT).title(" Params "));
    frame.render_widget(sidebar, area);
}

fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(Span::styled(" halftone: controls ", Style::default().fg(Color::Yellow))),
        Line::from(""),
        Line::from(" q/Esc    Quit"),
        Line::from(" Tab      Dots / Dithered"),
        Line::from(" s/S      Output size ±"),
        Line::from(" [/]      Cell size ±"),
        Line::from(" -/=      Radius / threshold ±"),
        Line::from(" c/C      Contrast ±"),
        Line::from(" b/B      Brightness ±"),
        Line::from(" Space    Pause video"),
        Line::from(" p        Next preset"),
        Line::from(" r        Reset to defaults"),
        Line::from(" ?        Toggle help"),
        Line::from(""),
        Line::from(Span::styled(
            " Press ? or Esc to close ",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help_width = 36u16.min(area.width);
    let help_height = (help_text.len() as u16 + 2).min(area.height);
    let x = area.x + area.width.saturating_sub(help_width) / 2;
    let y = area.y + area.height.saturating_sub(help_height) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    let help = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .style(Style::default().bg(Color::Black).fg(Color::White)),
    );
    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(help, help_area);
}
