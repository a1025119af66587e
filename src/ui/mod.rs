use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::agent::{Speaker, Turn};
use crate::app::{App, PanelId};
use crate::panels::{ChatPanel, PanelStatus};

mod theme;
use theme::*;

pub const TITLE: &str = "🤖 Azure Multi-Agent Chat (API Key Based)";
pub const CAPTION: &str = "Runs using a simple Azure API Key — no login required.";

const MIN_WIDTH: u16 = 40;
const MIN_HEIGHT: u16 = 14;
const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const KEY_HINTS: &str = "Enter send · Tab switch · PgUp/PgDn scroll · Esc cancel · Ctrl+Q quit";

fn cell_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Draws the whole screen from `app`. Only scroll clamping writes back.
pub fn render(f: &mut Frame<'_>, app: &mut App) {
    let size = f.size();
    if size.width < MIN_WIDTH || size.height < MIN_HEIGHT {
        let block = Paragraph::new(format!(
            "Terminal too small, resize to at least {}x{}.",
            MIN_WIDTH, MIN_HEIGHT
        ))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .style(Style::default().fg(FG_PRIMARY).bg(BG_PRIMARY));
        f.render_widget(block, size);
        return;
    }

    let base = Block::default().style(Style::default().bg(BG_PRIMARY));
    f.render_widget(base, size);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(size);

    render_title(f, vertical[0], vertical[1]);
    render_tabs(f, app, vertical[2]);
    render_panel(f, app, vertical[3]);
    render_status_bar(f, app, vertical[4]);
}

fn render_title(f: &mut Frame<'_>, title_area: Rect, caption_area: Rect) {
    let title = Paragraph::new(Line::from(Span::styled(
        TITLE,
        Style::default()
            .fg(BAR_HIGHLIGHT_TEXT)
            .add_modifier(Modifier::BOLD),
    )));
    f.render_widget(title, title_area);
    let caption = Paragraph::new(Line::from(Span::styled(
        CAPTION,
        Style::default().fg(FG_DIM).add_modifier(Modifier::ITALIC),
    )));
    f.render_widget(caption, caption_area);
}

fn render_tabs(f: &mut Frame<'_>, app: &App, area: Rect) {
    let titles: Vec<Line> = PanelId::ALL
        .iter()
        .map(|id| {
            let panel = app.panel(*id);
            let marker = match panel.status() {
                PanelStatus::Pending => " …",
                PanelStatus::Unavailable(_) => " ✗",
                _ => "",
            };
            Line::from(format!(" {}{} ", panel.tab_label(), marker))
        })
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.active().index())
        .style(Style::default().fg(BAR_TEXT).bg(BAR_BG))
        .highlight_style(
            Style::default()
                .fg(BAR_HIGHLIGHT_TEXT)
                .bg(BAR_HIGHLIGHT_BG)
                .add_modifier(Modifier::BOLD),
        )
        .divider("|");
    f.render_widget(tabs, area);
}

fn render_panel(f: &mut Frame<'_>, app: &mut App, area: Rect) {
    let frame = app.spinner_frame();
    let panel = app.active_panel_mut();

    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_IDLE))
        .title(Span::styled(
            panel.header(),
            Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(BG_PANEL));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(2),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(inner);

    render_history(f, panel, sections[0]);
    render_notice(f, panel, frame, sections[1]);
    render_input(f, panel, sections[2]);
}

fn render_history(f: &mut Frame<'_>, panel: &mut ChatPanel, area: Rect) {
    let width = area.width.max(1) as usize;
    let mut lines: Vec<Line> = Vec::new();
    for (idx, turn) in panel.transcript().turns().iter().enumerate() {
        if idx > 0 {
            lines.push(Line::default());
        }
        lines.extend(turn_lines(turn, width));
    }

    if lines.is_empty() {
        let placeholder = Paragraph::new(Span::styled(
            "No messages yet.",
            Style::default().fg(FG_DIM),
        ))
        .style(Style::default().bg(BG_PANEL));
        f.render_widget(placeholder, area);
        return;
    }

    let total = lines.len();
    let visible = area.height as usize;
    let transcript = panel.transcript_mut();
    transcript.clamp_scroll(total, visible);
    let top = total.saturating_sub(visible + transcript.scroll_from_bottom());

    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(BG_PANEL))
        .scroll((top.min(u16::MAX as usize) as u16, 0));
    f.render_widget(paragraph, area);
}

/// Lines for one turn: the speaker label, then the text with a hanging indent.
fn turn_lines(turn: &Turn, width: usize) -> Vec<Line<'static>> {
    let label = turn.speaker.label();
    let label_style = Style::default()
        .fg(match turn.speaker {
            Speaker::User => USER_LABEL,
            Speaker::Agent => AGENT_LABEL,
        })
        .add_modifier(Modifier::BOLD);
    let text_style = Style::default().fg(FG_PRIMARY);

    let indent = cell_width(label) + 1;
    let available = width.saturating_sub(indent).max(1);
    let mut lines = Vec::new();
    for raw in turn.text.split('\n') {
        for segment in wrap_to_width(raw.trim_end_matches('\r'), available) {
            let lead = if lines.is_empty() {
                Span::styled(format!("{label} "), label_style)
            } else {
                Span::raw(" ".repeat(indent))
            };
            lines.push(Line::from(vec![lead, Span::styled(segment, text_style)]));
        }
    }
    lines
}

fn render_notice(f: &mut Frame<'_>, panel: &ChatPanel, frame: usize, area: Rect) {
    let line = match (panel.status(), panel.last_error()) {
        (PanelStatus::Pending, _) => Line::from(Span::styled(
            format!("{} Thinking...", SPINNER[frame % SPINNER.len()]),
            Style::default().fg(Color::Yellow),
        )),
        (PanelStatus::Connecting, _) => Line::from(Span::styled(
            "Connecting to agent...",
            Style::default().fg(FG_DIM),
        )),
        (PanelStatus::Unavailable(reason), _) => Line::from(Span::styled(
            format!("Agent unavailable: {}", reason),
            Style::default().fg(ERROR_FG).add_modifier(Modifier::BOLD),
        )),
        (PanelStatus::Ready, Some(error)) => Line::from(Span::styled(
            format!("⚠ {}", error),
            Style::default().fg(ERROR_FG),
        )),
        (PanelStatus::Ready, None) => Line::default(),
    };
    f.render_widget(Paragraph::new(line).style(Style::default().bg(BG_PANEL)), area);
}

fn render_input(f: &mut Frame<'_>, panel: &ChatPanel, area: Rect) {
    let accepts_input = !matches!(panel.status(), PanelStatus::Unavailable(_));
    let border = if accepts_input { BORDER_FOCUS } else { BORDER_IDLE };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled("Ask a question:", Style::default().fg(FG_PRIMARY)))
        .style(Style::default().bg(BG_PANEL));
    let inner = block.inner(area);
    let width = inner.width.max(1) as usize;

    let (visible, cursor_col) = panel.input().visible_window(width);
    let content = if panel.input().is_empty() {
        Line::from(Span::styled(
            "Type a message and press Enter…",
            Style::default().fg(FG_DIM),
        ))
    } else {
        Line::from(Span::styled(
            visible.to_string(),
            Style::default().fg(FG_PRIMARY),
        ))
    };

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(content)
            .block(block)
            .style(Style::default().bg(BG_PANEL)),
        area,
    );

    if accepts_input {
        let col = cursor_col.min(width.saturating_sub(1)) as u16;
        f.set_cursor(inner.x.saturating_add(col), inner.y);
    }
}

fn render_status_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    let left = format!(" {} ", app.status_message);
    let width = area.width as usize;
    let hints_width = cell_width(KEY_HINTS) + 1;
    let mut spans = vec![Span::styled(
        left.clone(),
        Style::default().fg(BAR_TEXT).bg(BAR_BG),
    )];
    let used = cell_width(&left);
    if used + hints_width <= width {
        spans.push(Span::styled(
            " ".repeat(width - used - hints_width),
            Style::default().bg(BAR_BG),
        ));
        spans.push(Span::styled(
            format!("{KEY_HINTS} "),
            Style::default().fg(FG_DIM).bg(BAR_BG),
        ));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BAR_BG)),
        area,
    );
}

fn wrap_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut result = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1).max(1);
        if current_width + ch_width > width && !current.is_empty() {
            result.push(current);
            current = String::new();
            current_width = 0;
        }
        current.push(ch);
        current_width += ch_width;
    }
    result.push(current);
    result
}
