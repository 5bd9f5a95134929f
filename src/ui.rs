use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use inventory_count::{difference, expected_quantity, ScanOutcome, Session};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Inventory,
    UnknownScans,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Inventory => Page::UnknownScans,
            Page::UnknownScans => Page::Inventory,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Inventory => "Inventory",
            Page::UnknownScans => "Unknown Scans",
        }
    }
}

/// Feedback line for the last scan
#[derive(Debug, Clone)]
pub enum Feedback {
    None,
    Outcome(ScanOutcome),
    Error(String),
}

pub struct App {
    pub session: Session,
    pub input: String,
    pub state: TableState,
    pub unknown_state: TableState,
    pub current_page: Page,
    pub feedback: Feedback,
}

impl App {
    pub fn new(session: Session) -> Self {
        let mut state = TableState::default();
        if !session.snapshot().items.is_empty() {
            state.select(Some(0));
        }

        Self {
            session,
            input: String::new(),
            state,
            unknown_state: TableState::default(),
            current_page: Page::Inventory,
            feedback: Feedback::None,
        }
    }

    pub fn submit(&mut self) {
        let raw = std::mem::take(&mut self.input);

        match self.session.scan(&raw) {
            Ok(Some(outcome)) => {
                if let ScanOutcome::Matched { equipment_id, .. } = &outcome {
                    let position = self
                        .session
                        .snapshot()
                        .items
                        .iter()
                        .position(|item| &item.equipment_id == equipment_id);
                    self.state.select(position);
                } else {
                    let last = self.session.snapshot().unknown_scans.len().checked_sub(1);
                    self.unknown_state.select(last);
                }
                self.feedback = Feedback::Outcome(outcome);
            }
            Ok(None) => {}
            Err(e) => self.feedback = Feedback::Error(e.to_string()),
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    fn current_len(&self) -> usize {
        match self.current_page {
            Page::Inventory => self.session.snapshot().items.len(),
            Page::UnknownScans => self.session.snapshot().unknown_scans.len(),
        }
    }

    fn current_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Inventory => &mut self.state,
            Page::UnknownScans => &mut self.unknown_state,
        }
    }

    /// Move the selection by `delta` rows, clamped to the table
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let current = state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        state.select(Some(next as usize));
    }

    pub fn select_first(&mut self) {
        if self.current_len() > 0 {
            self.current_state().select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        let len = self.current_len();
        if len > 0 {
            self.current_state().select(Some(len - 1));
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match key.code {
                KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Enter => app.submit(),
                KeyCode::Backspace => {
                    app.input.pop();
                }
                KeyCode::Tab => app.next_page(),
                KeyCode::Down => app.move_selection(1),
                KeyCode::Up => app.move_selection(-1),
                KeyCode::PageDown => app.move_selection(20),
                KeyCode::PageUp => app.move_selection(-20),
                KeyCode::Home => app.select_first(),
                KeyCode::End => app.select_last(),
                KeyCode::Char(c) => app.input.push(c),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with stats
            Constraint::Length(3), // Scan input
            Constraint::Length(3), // Last outcome
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_input(f, chunks[1], app);
    render_feedback(f, chunks[2], app);

    match app.current_page {
        Page::Inventory => render_inventory(f, chunks[3], app),
        Page::UnknownScans => render_unknown(f, chunks[3], app),
    }

    render_status_bar(f, chunks[4], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.session.stats();

    let mut spans = vec![];
    for (i, page) in [Page::Inventory, Page::UnknownScans].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title().to_string(), style));
    }

    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Items: {}", stats.total_items),
        Style::default().fg(Color::White),
    ));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("Scanned: {}", stats.total_scanned),
        Style::default().fg(Color::Green),
    ));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("Unique: {}", stats.unique_scanned),
        Style::default().fg(Color::Green),
    ));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("Unknown: {}", stats.unknown_count),
        if stats.unknown_count > 0 {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::DarkGray)
        },
    ));

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_input(f: &mut Frame, area: Rect, app: &App) {
    let input = Paragraph::new(format!("{}▏", app.input)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Scan "),
    );
    f.render_widget(input, area);
}

fn render_feedback(f: &mut Frame, area: Rect, app: &App) {
    let (text, color) = match &app.feedback {
        Feedback::None => ("Waiting for scan...".to_string(), Color::DarkGray),
        Feedback::Outcome(outcome @ ScanOutcome::Matched { .. }) => (outcome.message(), Color::Green),
        Feedback::Outcome(outcome) => (outcome.message(), Color::Red),
        Feedback::Error(e) => (format!("Error: {}", e), Color::Red),
    };

    let feedback = Paragraph::new(Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD)))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(feedback, area);
}

fn render_inventory(f: &mut Frame, area: Rect, app: &mut App) {
    let snapshot = app.session.snapshot();
    let quantity_column = snapshot.quantity_column_name.as_deref();

    let mut titles = vec!["Equipment", "Counted"];
    if quantity_column.is_some() {
        titles.extend(["Expected", "Difference"]);
    }

    let header_cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = snapshot.items.iter().map(|item| {
        let count_style = if item.count > 0 {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let mut cells = vec![
            Cell::from(truncate(&item.equipment_id, 30)),
            Cell::from(item.count.to_string()).style(count_style),
        ];

        if let (Some(column), Some(diff)) = (quantity_column, difference(item, quantity_column)) {
            let diff_color = match diff {
                0 => Color::Green,
                d if d > 0 => Color::Yellow,
                _ => Color::Red,
            };
            cells.push(Cell::from(expected_quantity(item, column).to_string()));
            cells.push(Cell::from(format!("{:+}", diff)).style(Style::default().fg(diff_color)));
        }

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Inventory "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_unknown(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Time", "Normalized", "Raw scan"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.session.snapshot().unknown_scans.iter().map(|scan| {
        Row::new(vec![
            Cell::from(scan.observed_at.format("%H:%M:%S").to_string()),
            Cell::from(truncate(&scan.normalized_token, 24)).style(Style::default().fg(Color::Red)),
            Cell::from(truncate(&scan.raw_input, 60)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [Constraint::Length(10), Constraint::Length(26), Constraint::Min(20)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Unknown Scans "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.unknown_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let position = match app.current_page {
        Page::Inventory => app.state.selected(),
        Page::UnknownScans => app.unknown_state.selected(),
    }
    .map(|i| format!("{}/{}", i + 1, app.current_len()))
    .unwrap_or_else(|| format!("-/{}", app.current_len()));

    let status = Paragraph::new(Line::from(vec![
        Span::styled(" Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" scan  "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" page  "),
        Span::styled("↑↓ PgUp PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" move  "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" quit  |  "),
        Span::raw(position),
    ]))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(status, area);
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
