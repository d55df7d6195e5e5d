use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use booking_core::format::{format_message, FormattedLine, Segment};
use booking_core::{Sender, UiState};
use crate::app::App;

fn segment_span(segment: &Segment) -> Span<'static> {
    let mut style = Style::default();
    if segment.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if segment.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    Span::styled(segment.text.clone(), style)
}

fn formatted_line(line: &FormattedLine) -> Line<'static> {
    if line.segments.is_empty() {
        Line::default()
    } else {
        Line::from(line.segments.iter().map(segment_span).collect::<Vec<_>>())
    }
}

fn sender_label(sender: Sender) -> Line<'static> {
    match sender {
        Sender::User => Line::from(Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Sender::Assistant => Line::from(Span::styled(
            "Assistant:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    }
}

/// Transcript body without its border; also used to measure wrapped height
pub fn transcript_paragraph(app: &App) -> Paragraph<'static> {
    let transcript = app.transcript();
    let chat_text = if transcript.is_empty() && !transcript.is_pending() {
        Text::from(Span::styled(
            "Ask to book, move, or check a meeting...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for message in transcript.messages() {
            lines.push(sender_label(message.sender));
            for line in format_message(message) {
                lines.push(formatted_line(&line));
            }
            lines.push(Line::default());
        }

        if app.state().panels().pending && transcript.is_pending() {
            lines.push(sender_label(Sender::Assistant));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    Paragraph::new(chat_text).wrap(Wrap { trim: false })
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let panels = app.state().panels();
    if panels.connect {
        app.chat_area = None;
        render_connect_panel(app, frame, body_area);
    } else {
        render_chat_panel(app, frame, body_area);
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (status, status_color) = match app.state() {
        UiState::Disconnected if app.controller.is_probing() => ("checking session", Color::Gray),
        UiState::Disconnected => ("not connected", Color::Red),
        UiState::Connected => ("connected", Color::Green),
        UiState::AwaitingReply => ("waiting for reply", Color::Yellow),
    };

    let title = Line::from(vec![
        Span::styled(" Booking Assistant ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("[{}]", status), Style::default().fg(status_color)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_connect_panel(app: &App, frame: &mut Frame, area: Rect) {
    // Centered box
    let popup_width = 56.min(area.width.saturating_sub(4));
    let popup_height = 9.min(area.height);
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Connect your calendar ");

    let key_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let lines = if app.controller.is_probing() {
        vec![
            Line::default(),
            Line::from(Span::styled(
                "Checking session...",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )),
        ]
    } else {
        vec![
            Line::from("Connect your calendar so the assistant"),
            Line::from("can find and book free slots for you."),
            Line::default(),
            Line::from(vec![
                Span::styled("c", key_style),
                Span::raw("  open the connect page in your browser"),
            ]),
            Line::from(vec![
                Span::styled("r", key_style),
                Span::raw("  reload once you have connected"),
            ]),
            Line::from(vec![Span::styled("q", key_style), Span::raw("  quit")]),
        ]
    };

    let body = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(body, popup_area);
}

fn render_chat_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store area for mouse hit-testing and inner size for scroll calculations
    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Conversation ");

    let chat = transcript_paragraph(app)
        .block(chat_block)
        .scroll((app.scroll, 0));

    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let enabled = app.state().panels().input_enabled;

    let (border_color, title) = if !enabled {
        (Color::DarkGray, " Waiting for reply... ")
    } else if app.can_send() {
        (Color::Yellow, " Message (Enter to send) ")
    } else {
        (Color::DarkGray, " Message ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor inside the box
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 || app.cursor < inner_width {
        0
    } else {
        app.cursor - inner_width + 1
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_style = if enabled {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let input = Paragraph::new(visible_text)
        .style(text_style)
        .block(input_block);

    frame.render_widget(input, area);

    if enabled {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = match app.state() {
        UiState::Disconnected => vec![
            Span::styled(" CONNECT ", Style::default().bg(Color::Blue).fg(Color::White)),
            Span::styled(" c ", key_style),
            Span::styled(" connect ", label_style),
            Span::styled(" r ", key_style),
            Span::styled(" reload ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        UiState::Connected | UiState::AwaitingReply => vec![
            Span::styled(" CHAT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    if let Some(notice) = &app.notice {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(notice.clone(), Style::default().fg(Color::Yellow)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
