use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::{App, Screen},
    config::MAX_ROUND_SECS,
    runtime::Ticker,
    session::EndReason,
    store::WordStore,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

pub fn draw<S: WordStore, T: Ticker>(app: &App<S, T>, f: &mut Frame) {
    f.render_widget(app, f.area());
}

impl<S: WordStore, T: Ticker> Widget for &App<S, T> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(1),    // screen body
                Constraint::Length(1), // status
                Constraint::Length(1), // legend
            ])
            .split(area);

        match self.screen {
            Screen::Home => render_home(self, chunks[0], buf),
            Screen::Words => render_words(self, chunks[0], buf),
            Screen::Play => render_play(self, chunks[0], buf),
        }

        if let Some(status) = &self.status {
            Paragraph::new(Span::styled(
                status.as_str(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
        }

        let legend = match self.screen {
            Screen::Home => "(enter) play / (↑↓) round length / (w)ords / (q)uit",
            Screen::Words if self.list.input.is_some() => "type a word / (enter) add / (esc) done",
            Screen::Words => {
                "(a)dd / (space) seen / (d)elete / (s)ort / (↑↓) select / (esc) back"
            }
            Screen::Play => "(→) got it / (↓) skip / (←) back / (esc) dismiss",
        };
        Paragraph::new(Span::styled(
            legend,
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }
}

fn render_home<S: WordStore, T: Ticker>(app: &App<S, T>, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let previous = match app.last_round() {
        Some(round) => {
            let how = match round.reason {
                EndReason::Timeout => "time's up",
                EndReason::Exhausted => "all words done",
                EndReason::Dismissed => "dismissed",
                EndReason::Empty => "nothing to play",
            };
            Line::from(vec![
                Span::raw("Previous round: "),
                Span::styled(
                    format!("{} correct", round.score),
                    bold.fg(Color::Green),
                ),
                Span::styled(format!("  ({how})"), dim),
            ])
        }
        None => Line::from(Span::styled("No rounds played yet", dim)),
    };

    let round_secs = app.config.round_secs;
    let lines = vec![
        Line::from(Span::styled("▶ Play", bold.fg(Color::Cyan))),
        Line::default(),
        previous,
        Line::default(),
        Line::from(vec![
            Span::raw("Round length: "),
            Span::styled(format!("{round_secs} sec"), bold.fg(Color::Yellow)),
            Span::styled(format!("  (0–{MAX_ROUND_SECS})"), dim),
        ]),
        Line::from(Span::styled(
            format!(
                "{} of {} words left to play",
                app.list.tally.left, app.list.tally.total
            ),
            dim,
        )),
    ];

    let top = area.height.saturating_sub(lines.len() as u16) / 2;
    let body = Rect {
        y: area.y + top,
        height: area.height - top,
        ..area
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(body, buf);
}

fn render_play<S: WordStore, T: Ticker>(app: &App<S, T>, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // score and timer
            Constraint::Min(1),    // word
        ])
        .split(area);

    let header = Line::from(vec![
        Span::styled(format!("✓ {}", app.quiz.score()), bold.fg(Color::Green)),
        Span::raw("    "),
        Span::styled(format!("⏳ {}", app.quiz.remaining()), bold.fg(Color::Yellow)),
    ]);
    Paragraph::new(header)
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let text = app.quiz.current_text();
    let word_height = if text.width() > chunks[1].width as usize {
        ((text.width() as f64 / chunks[1].width.max(1) as f64).ceil()) as u16
    } else {
        1
    };
    let top = chunks[1].height.saturating_sub(word_height) / 2;
    let word_area = Rect {
        y: chunks[1].y + top,
        height: chunks[1].height - top,
        ..chunks[1]
    };
    Paragraph::new(Span::styled(text, bold))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(word_area, buf);
}

fn render_words<S: WordStore, T: Ticker>(app: &App<S, T>, area: Rect, buf: &mut Buffer) {
    let list = &app.list;
    let dim = Style::default().add_modifier(Modifier::DIM);

    let input_height = if list.input.is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),            // tally
            Constraint::Length(1),            // sort
            Constraint::Length(input_height), // new word
            Constraint::Min(1),               // words
        ])
        .split(area);

    Paragraph::new(format!(
        "Total words: {}   Seen: {}   Left: {}",
        list.tally.total, list.tally.seen, list.tally.left
    ))
    .render(chunks[0], buf);

    Paragraph::new(Span::styled(format!("Sort: {}", app.config.sort), dim))
        .render(chunks[1], buf);

    if let Some(input) = &list.input {
        Paragraph::new(format!("{input}▏"))
            .block(Block::default().borders(Borders::ALL).title("New word"))
            .render(chunks[2], buf);
    }

    let rows = chunks[3].height as usize;
    let offset = if rows > 0 && list.selected >= rows {
        list.selected + 1 - rows
    } else {
        0
    };
    let name_width = list
        .words
        .iter()
        .map(|w| w.name.width())
        .max()
        .unwrap_or(0);

    let lines: Vec<Line> = list
        .words
        .iter()
        .enumerate()
        .skip(offset)
        .take(rows)
        .map(|(idx, word)| {
            let mut style = if word.was_seen {
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(Color::Cyan)
            };
            if idx == list.selected {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let pad = " ".repeat(name_width - word.name.width());
            let marker = if word.was_seen { "  seen" } else { "" };
            Line::from(vec![
                Span::styled(word.name.clone(), style),
                Span::styled(format!("{pad}{marker}"), dim),
            ])
        })
        .collect();

    if lines.is_empty() {
        Paragraph::new(Span::styled("No words yet. Press (a) to add one.", dim))
            .render(chunks[3], buf);
    } else {
        Paragraph::new(lines).render(chunks[3], buf);
    }
}
