use crate::catalog::{CatalogKind, DISPLAY_ORDER};
use crate::models::Step;
use crate::panel::DurationPanel;
use crate::storage::KeyValueStore;
use crate::utils::{format_span, format_step};
use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::Duration as StdDuration;
use tracing::debug;

/// Cursor position and refresh bookkeeping for the interactive panel.
pub struct PanelView {
    pub column: usize,
    pub cursor: [usize; 2],
    pub last_refresh: DateTime<Local>,
}

impl PanelView {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            column: 0,
            cursor: [0, 0],
            last_refresh: now,
        }
    }

    fn kind(&self) -> CatalogKind {
        DISPLAY_ORDER[self.column]
    }

    fn move_cursor(&mut self, down: bool) {
        let len = self.kind().entries().len();
        let pos = &mut self.cursor[self.column];
        *pos = if down {
            (*pos + 1) % len
        } else {
            (*pos + len - 1) % len
        };
    }

    fn switch_column(&mut self) {
        self.column = (self.column + 1) % DISPLAY_ORDER.len();
    }

    /// True when the step interval has elapsed since the last refresh.
    pub fn refresh_due<S: KeyValueStore>(
        &self,
        panel: &DurationPanel<S>,
        now: DateTime<Local>,
    ) -> bool {
        let Some(interval) = panel.current().step.and_then(|s| s.refresh_interval()) else {
            return false;
        };
        let elapsed = (now - self.last_refresh).to_std().unwrap_or_default();
        elapsed >= interval
    }
}

pub fn run_tui<S: KeyValueStore>(panel: &mut DurationPanel<S>) -> Result<()> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_loop(&mut terminal, panel);

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

fn run_loop<S: KeyValueStore>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    panel: &mut DurationPanel<S>,
) -> Result<()> {
    let mut view = PanelView::new(Local::now());

    loop {
        terminal.draw(|f| draw(f, panel, &view))?;

        if event::poll(StdDuration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Up | KeyCode::Char('k') => view.move_cursor(false),
                    KeyCode::Down | KeyCode::Char('j') => view.move_cursor(true),
                    KeyCode::Left | KeyCode::Right | KeyCode::Tab => view.switch_column(),
                    KeyCode::Enter => {
                        let entry = &view.kind().entries()[view.cursor[view.column]];
                        panel.click_shortcut(entry, true)?;
                        view.last_refresh = Local::now();
                    }
                    KeyCode::Char('s') => {
                        let next = panel.current().step.unwrap_or(Step::OFF).next_choice();
                        panel.set_step(next)?;
                    }
                    KeyCode::Char('r') => view.last_refresh = Local::now(),
                    _ => {}
                }
            }
        }

        let now = Local::now();
        if view.refresh_due(panel, now) {
            debug!("refresh interval elapsed");
            view.last_refresh = now;
        }
    }
}

pub fn draw<S: KeyValueStore>(frame: &mut Frame, panel: &DurationPanel<S>, view: &PanelView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(8), // Window
            Constraint::Min(0),    // Shortcuts
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    draw_header(frame, chunks[0], panel);
    draw_window(frame, chunks[1], panel, view);
    draw_shortcuts(frame, chunks[2], panel, view);
    draw_footer(frame, chunks[3]);
}

fn draw_header<S: KeyValueStore>(frame: &mut Frame, area: Rect, panel: &DurationPanel<S>) {
    let selection = match panel.current().label {
        Some(label) => Span::styled(
            label,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        None => Span::styled(
            "CUSTOM RANGE",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " spanpick ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        selection,
        Span::raw(" | "),
        Span::raw(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_window<S: KeyValueStore>(
    frame: &mut Frame,
    area: Rect,
    panel: &DurationPanel<S>,
    view: &PanelView,
) {
    let query = panel.query_duration(view.last_refresh);
    let (start, end) = (query.raw.start, query.raw.end);

    let lines = vec![
        Line::raw(format!("  From:   {}", start.format("%Y-%m-%d %H:%M"))),
        Line::raw(format!("  To:     {}", end.format("%Y-%m-%d %H:%M"))),
        Line::raw(format!("  Span:   {}", format_span(end - start))),
        Line::from(vec![
            Span::raw("  Reload: "),
            Span::styled(
                format_step(panel.current().step),
                Style::default().fg(Color::Magenta),
            ),
            Span::raw(format!(
                "  (last {})",
                view.last_refresh.format("%H:%M:%S")
            )),
        ]),
        Line::raw(format!(
            "  Query:  {} .. {} by {:?}",
            query.input.start, query.input.end, query.input.step
        )),
    ];

    let block = Block::default()
        .title(Span::styled(
            " WINDOW ",
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_shortcuts<S: KeyValueStore>(
    frame: &mut Frame,
    area: Rect,
    panel: &DurationPanel<S>,
    view: &PanelView,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    for (i, kind) in DISPLAY_ORDER.iter().enumerate() {
        let items: Vec<ListItem> = kind
            .entries()
            .iter()
            .map(|entry| {
                let style = if panel.current().label == Some(entry.label) {
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(format!("{:<10} {}", entry.label, entry.code)).style(style)
            })
            .collect();

        let border_style = if i == view.column {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!(" {} ", kind.title()))
                    .borders(Borders::ALL)
                    .border_style(border_style),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = ListState::default();
        if i == view.column {
            state.select(Some(view.cursor[i]));
        }
        frame.render_stateful_widget(list, columns[i], &mut state);
    }
}

fn draw_footer(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        "'q' quit | arrows move | Enter apply | 's' cycle reload | 'r' refresh",
    )
    .block(Block::default().borders(Borders::ALL))
    .alignment(ratatui::layout::Alignment::Center);
    frame.render_widget(help, area);
}
