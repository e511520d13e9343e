use std::{
    cmp,
    io::{self, Write},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use chrono::{Datelike, Days, Local, NaiveDate};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tally_core::{
    adjuster::{parse_entry, Adjuster, GestureEvent, Outcome, RangePolicy},
    calendar::{self, Bucket, GridGeometry, GRID_COLUMNS, MONTH_NAMES, WEEKDAY_LETTERS},
    config::AppConfig,
    ledger::{Coordinator, StoreEvent},
    modality::{InputMode, ModalityResolver},
    models::{date_key, Commit, CommitTarget},
    stats,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::{block_font, export};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_PROMPT_LEN: usize = 8;

#[derive(Debug, Clone)]
struct Theme {
    accent: Color,
    muted: Color,
    unrecorded: Color,
    zero: Color,
    low: Color,
    moderate: Color,
    high: Color,
    very_high: Color,
    clearing: Color,
    goal: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            muted: Color::DarkGray,
            unrecorded: Color::Rgb(60, 60, 60),
            zero: Color::Rgb(134, 239, 172),
            low: Color::Rgb(250, 204, 21),
            moderate: Color::Rgb(251, 146, 60),
            high: Color::Rgb(239, 68, 68),
            very_high: Color::Rgb(64, 64, 64),
            clearing: Color::Rgb(107, 114, 128),
            goal: Color::Rgb(34, 197, 94),
            danger: Color::LightRed,
        }
    }
}

impl Theme {
    fn bucket_color(&self, bucket: Bucket) -> Color {
        match bucket {
            Bucket::Unrecorded => self.unrecorded,
            Bucket::Zero => self.zero,
            Bucket::Low => self.low,
            Bucket::Moderate => self.moderate,
            Bucket::High => self.high,
            Bucket::VeryHigh => self.very_high,
        }
    }
}

fn contrast_color(color: &Color, fallback: Color) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let luminance = 0.299 * f64::from(*r) + 0.587 * f64::from(*g) + 0.114 * f64::from(*b);
            if luminance > 186.0 {
                Color::Black
            } else {
                Color::White
            }
        }
        _ => fallback,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Month,
    Year,
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatsTab {
    Weekly,
    Monthly,
}

struct AdjusterModal {
    target: CommitTarget,
    machine: Adjuster,
    surface: Rect,
    committed: bool,
}

impl AdjusterModal {
    fn new(target: CommitTarget, current: Option<u8>) -> Self {
        Self {
            target,
            machine: Adjuster::new(current),
            surface: Rect::default(),
            committed: false,
        }
    }
}

struct PromptModal {
    target: CommitTarget,
    input: String,
    cursor: usize,
}

impl PromptModal {
    fn new(target: CommitTarget, current: Option<u8>) -> Self {
        let input = current.map(|value| value.to_string()).unwrap_or_default();
        let cursor = input.len();
        Self {
            target,
            input,
            cursor,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.input.len() as isize;
        let mut next = self.cursor as isize + delta;
        if next < 0 {
            next = 0;
        } else if next > len {
            next = len;
        }
        self.cursor = next as usize;
    }

    fn insert(&mut self, ch: char) {
        if self.input.len() >= MAX_PROMPT_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            self.input.insert(self.cursor, ch);
            self.cursor += ch.len_utf8();
        }
    }

    fn backspace(&mut self) {
        if self.cursor > 0 && self.cursor <= self.input.len() {
            self.cursor -= 1;
            self.input.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

struct UiState {
    status: String,
    should_quit: bool,
    screen: Screen,
    stats_tab: StatsTab,
    selected: NaiveDate,
    month_grid: Option<(i32, u32, GridGeometry)>,
}

impl UiState {
    fn new(today: NaiveDate) -> Self {
        Self {
            status: "Ready".to_string(),
            should_quit: false,
            screen: Screen::Month,
            stats_tab: StatsTab::Weekly,
            selected: today,
            month_grid: None,
        }
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

/// High-level application state for the calendar TUI.
pub struct TallyApp {
    config: AppConfig,
    coordinator: Coordinator,
    state: UiState,
    resolver: ModalityResolver,
    adjuster: Option<AdjusterModal>,
    prompt: Option<PromptModal>,
    store_rx: Option<mpsc::Receiver<StoreEvent>>,
    theme: Theme,
    pointer: bool,
}

impl TallyApp {
    pub fn new(config: AppConfig, coordinator: Coordinator) -> Self {
        let breakpoint = config.gesture_breakpoint;
        Self {
            config,
            coordinator,
            state: UiState::new(Local::now().date_naive()),
            resolver: ModalityResolver::new(false, 0, breakpoint),
            adjuster: None,
            prompt: None,
            store_rx: None,
            theme: Theme::default(),
            pointer: false,
        }
    }

    pub fn attach_store_events(&mut self, receiver: mpsc::Receiver<StoreEvent>) {
        self.store_rx = Some(receiver);
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        // Pointer capability is whatever the terminal grants; a refusal
        // just means discrete mode everywhere.
        self.pointer = execute!(stdout, EnableMouseCapture).is_ok();
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let columns = terminal.size().map(|size| size.width).unwrap_or(0);
        self.resolver =
            ModalityResolver::new(self.pointer, columns, self.config.gesture_breakpoint);
        info!(
            pointer = self.pointer,
            columns,
            mode = ?self.resolver.mode(),
            "input modality resolved"
        );

        let recorded = self.coordinator.ledger().days().len();
        self.state.set_status(format!(
            "Loaded {recorded} recorded days for {}",
            self.config.profile
        ));

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let mut store_rx = self.store_rx.take();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            if store_rx.is_some() {
                let mut store_closed = false;
                let rx = store_rx.as_mut().unwrap();
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    maybe_store = rx.recv() => {
                        match maybe_store {
                            Some(event) => self.handle_store_event(event),
                            None => store_closed = true,
                        }
                    }
                }
                if store_closed {
                    store_rx = None;
                }
            } else {
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event) {
                    break;
                }
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal, self.pointer)?;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                self.handle_input(event);
                true
            }
            Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    fn handle_input(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(columns, _) => self.handle_resize(columns),
            Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
        }
    }

    fn handle_resize(&mut self, columns: u16) {
        if let Some(mode) = self.resolver.observe_resize(columns) {
            // An open session keeps the mode it opened with; only the next
            // activation sees the change.
            info!(columns, ?mode, "input modality changed");
            let label = match mode {
                InputMode::Continuous => "gesture",
                InputMode::Discrete => "prompt",
            };
            self.state
                .set_status(format!("Input switched to {label} mode"));
        }
    }

    fn handle_store_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::PersistFailed { target, error } => {
                error!(?target, %error, "persistence failed");
                self.state
                    .set_status(format!("Save failed: {error}. Refreshing from store…"));
            }
            StoreEvent::Resynced { days, goal } => {
                let total = days.len();
                self.coordinator.apply_resync(days, goal);
                debug!(total, "local state resynced");
                self.state
                    .set_status(format!("Refreshed {total} recorded days from store"));
            }
            StoreEvent::ResyncFailed(error) => {
                error!(%error, "resync failed");
                self.state
                    .set_status(format!("Refresh failed: {error}"));
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }
        if self.adjuster.is_some() {
            self.handle_adjuster_key(key);
            return;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.state.should_quit = true;
            }
            KeyCode::Tab => {
                self.state.screen = match self.state.screen {
                    Screen::Month => Screen::Year,
                    Screen::Year => Screen::Stats,
                    Screen::Stats => Screen::Month,
                };
            }
            KeyCode::Char('1') if self.state.screen == Screen::Stats => {
                self.state.stats_tab = StatsTab::Weekly;
            }
            KeyCode::Char('2') if self.state.screen == Screen::Stats => {
                self.state.stats_tab = StatsTab::Monthly;
            }
            KeyCode::Char('h') | KeyCode::Left => self.move_selection(-1),
            KeyCode::Char('l') | KeyCode::Right => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-7),
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(7),
            KeyCode::Char('[') => self.shift_period(-1),
            KeyCode::Char(']') => self.shift_period(1),
            KeyCode::Char('t') | KeyCode::Char('T') => {
                self.state.selected = Local::now().date_naive();
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.activate(CommitTarget::Day(self.state.selected));
            }
            KeyCode::Char('g') | KeyCode::Char('G') => {
                self.activate(CommitTarget::Goal);
            }
            KeyCode::Char('e') => self.export_month_view(),
            KeyCode::Char('E') => self.export_year_view(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.coordinator.begin_resync();
                self.state.set_status("Refreshing from store…");
            }
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: i64) {
        let next = if delta >= 0 {
            self.state.selected.checked_add_days(Days::new(delta as u64))
        } else {
            self.state
                .selected
                .checked_sub_days(Days::new(delta.unsigned_abs()))
        };
        if let Some(date) = next {
            self.state.selected = date;
        }
    }

    fn shift_period(&mut self, delta: i32) {
        self.state.selected = match self.state.screen {
            Screen::Month => shift_month(self.state.selected, delta),
            Screen::Year | Screen::Stats => shift_month(self.state.selected, delta * 12),
        };
    }

    fn activate(&mut self, target: CommitTarget) {
        let current = match target {
            CommitTarget::Day(date) => self.coordinator.ledger().count_on(date),
            CommitTarget::Goal => self.coordinator.ledger().goal(),
        };
        match self.resolver.mode() {
            InputMode::Continuous => {
                self.adjuster = Some(AdjusterModal::new(target, current));
            }
            InputMode::Discrete => {
                self.prompt = Some(PromptModal::new(target, current));
            }
        }
    }

    fn handle_adjuster_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => self.close_adjuster(),
            KeyCode::Char(' ') | KeyCode::Char('+') => {
                self.step_adjuster(GestureEvent::Tap);
            }
            _ => {}
        }
    }

    fn step_adjuster(&mut self, event: GestureEvent) {
        let Some(modal) = self.adjuster.as_mut() else {
            return;
        };
        let target = modal.target;
        let outcome = modal.machine.handle(event);
        if outcome.commit.is_some() {
            modal.committed = true;
        }
        let committed = modal.committed;
        self.apply_outcome(target, outcome);
        // The goal control dismisses once a committing gesture finishes;
        // day cells stay open for further taps.
        if matches!(target, CommitTarget::Goal)
            && committed
            && matches!(event, GestureEvent::Tap | GestureEvent::Up)
        {
            self.close_adjuster();
        }
    }

    fn close_adjuster(&mut self) {
        if let Some(mut modal) = self.adjuster.take() {
            modal.machine.handle(GestureEvent::Close);
            debug!(target = ?modal.target, "adjuster closed");
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                // Cancel: no change, no event.
                self.prompt = None;
            }
            KeyCode::Enter => {
                let target = prompt.target;
                let policy = match target {
                    CommitTarget::Day(_) => RangePolicy::Clamp,
                    CommitTarget::Goal => RangePolicy::Reject,
                };
                let entry = prompt.input.clone();
                self.prompt = None;
                match parse_entry(&entry, policy) {
                    Ok(commit) => self.apply_commit(target, commit),
                    Err(err) => {
                        // No mutation; the user re-invokes the prompt.
                        self.state.set_status(format!("Invalid entry: {err}"));
                    }
                }
            }
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Delete => prompt.delete(),
            KeyCode::Left => prompt.move_cursor(-1),
            KeyCode::Right => prompt.move_cursor(1),
            KeyCode::Home => prompt.cursor = 0,
            KeyCode::End => prompt.cursor = prompt.input.len(),
            KeyCode::Char(ch) => prompt.insert(ch),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.prompt.is_some() {
            return;
        }
        if self.adjuster.is_some() {
            self.handle_adjuster_mouse(mouse);
            return;
        }
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            if self.state.screen == Screen::Month {
                if let Some((year, month, geometry)) = self.state.month_grid {
                    if let Some(day) = geometry.day_at(year, month, mouse.column, mouse.row) {
                        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                            self.state.selected = date;
                            self.activate(CommitTarget::Day(date));
                        }
                    }
                }
            }
        }
    }

    fn handle_adjuster_mouse(&mut self, mouse: MouseEvent) {
        let Some(surface) = self.adjuster.as_ref().map(|modal| modal.surface) else {
            return;
        };
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if rect_contains(surface, mouse.column, mouse.row) {
                    self.step_adjuster(GestureEvent::Down(mouse.row));
                } else {
                    // Tapping outside the surface dismisses it.
                    self.close_adjuster();
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.step_adjuster(GestureEvent::Drag(mouse.row));
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.step_adjuster(GestureEvent::Up);
            }
            _ => {}
        }
    }

    fn apply_outcome(&mut self, target: CommitTarget, outcome: Outcome) {
        if let Some(commit) = outcome.commit {
            self.apply_commit(target, commit);
        }
        if outcome.feedback.is_some() {
            self.feedback_pulse();
        }
    }

    fn apply_commit(&mut self, target: CommitTarget, commit: Commit) {
        match target {
            CommitTarget::Day(date) => {
                self.coordinator.commit_day(date, commit);
                let key = date_key(date);
                match commit {
                    Commit::Set(count) => {
                        self.state.set_status(format!("{key} set to {count}"));
                    }
                    Commit::Clear => self.state.set_status(format!("{key} cleared")),
                }
            }
            CommitTarget::Goal => {
                self.coordinator.commit_goal(commit);
                match commit {
                    Commit::Set(count) => {
                        self.state.set_status(format!("Weekly goal set to {count}"));
                    }
                    Commit::Clear => self.state.set_status("Weekly goal cleared"),
                }
            }
        }
    }

    /// The terminal bell stands in for the vibration capability; hosts
    /// that ignore BEL simply feel nothing.
    fn feedback_pulse(&self) {
        if !self.config.bell_feedback {
            return;
        }
        let mut stdout = io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }

    fn export_month_view(&mut self) {
        let year = self.state.selected.year();
        let month = self.state.selected.month();
        let days = self.coordinator.ledger().days();
        match export::export_month(&self.config.export_dir, year, month, days) {
            Ok(path) => {
                info!(path = %path.display(), "month snapshot exported");
                self.state
                    .set_status(format!("Exported {}", path.display()));
            }
            Err(err) => {
                error!(?err, "month export failed");
                self.state.set_status(format!("Export failed: {err}"));
            }
        }
    }

    fn export_year_view(&mut self) {
        let year = self.state.selected.year();
        let days = self.coordinator.ledger().days();
        match export::export_year(&self.config.export_dir, year, days) {
            Ok(path) => {
                info!(path = %path.display(), "year snapshot exported");
                self.state
                    .set_status(format!("Exported {}", path.display()));
            }
            Err(err) => {
                error!(?err, "year export failed");
                self.state.set_status(format!("Export failed: {err}"));
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_header(frame, rows[0]);
        match self.state.screen {
            Screen::Month => self.render_month(frame, rows[1]),
            Screen::Year => self.render_year(frame, rows[1]),
            Screen::Stats => self.render_stats(frame, rows[1]),
        }
        self.render_status(frame, rows[2]);

        if let Some(prompt) = self.prompt.as_ref() {
            render_prompt(&self.theme, frame, prompt);
        }
        if self.adjuster.is_some() {
            self.render_adjuster(frame);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let ledger = self.coordinator.ledger();
        let selected = self.state.selected;
        let title = format!(
            "{} {}",
            MONTH_NAMES[selected.month0() as usize],
            selected.year()
        );

        let week_total = stats::week_total(ledger.days(), Local::now().date_naive());
        let goal_span = match ledger.goal() {
            Some(goal) => {
                let style = if week_total > u32::from(goal) {
                    Style::default().fg(self.theme.danger)
                } else {
                    Style::default().fg(self.theme.goal)
                };
                Span::styled(format!("goal {week_total}/{goal} this week"), style)
            }
            None => Span::styled(
                format!("no goal · {week_total} this week"),
                Style::default().fg(self.theme.muted),
            ),
        };
        let mode_label = match self.resolver.mode() {
            InputMode::Continuous => "gesture input",
            InputMode::Discrete => "prompt input",
        };

        let lines = vec![
            Line::from(vec![
                Span::styled(
                    title,
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  ·  "),
                goal_span,
                Span::raw("  ·  "),
                Span::styled(mode_label, Style::default().fg(self.theme.muted)),
            ]),
            Line::from(Span::styled(
                "tab views · enter/click adjust · g goal · e/E export · r refresh · q quit",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("tallytui · {}", self.config.profile)),
        );
        frame.render_widget(paragraph, area);
    }

    fn render_month(&mut self, frame: &mut Frame, area: Rect) {
        let year = self.state.selected.year();
        let month = self.state.selected.month();
        let block = Block::default().borders(Borders::ALL).title("Calendar");
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width < GRID_COLUMNS || inner.height < 2 {
            self.state.month_grid = None;
            return;
        }

        let rows = calendar::grid_rows(year, month).max(1);
        let cell_width = (inner.width / GRID_COLUMNS).clamp(4, 10);
        let cell_height = ((inner.height.saturating_sub(1)) / rows).clamp(1, 4);
        let grid_width = cell_width * GRID_COLUMNS;
        let origin_x = inner.x + (inner.width.saturating_sub(grid_width)) / 2;

        let header: Vec<Span> = WEEKDAY_LETTERS
            .iter()
            .map(|letter| {
                Span::styled(
                    format!("{letter:^width$}", width = cell_width as usize),
                    Style::default()
                        .fg(self.theme.muted)
                        .add_modifier(Modifier::BOLD),
                )
            })
            .collect();
        frame.render_widget(
            Paragraph::new(Line::from(header)),
            Rect::new(origin_x, inner.y, grid_width, 1),
        );

        let geometry = GridGeometry {
            x: origin_x,
            y: inner.y + 1,
            cell_width,
            cell_height,
        };
        self.state.month_grid = Some((year, month, geometry));

        let today = Local::now().date_naive();
        let blanks = calendar::leading_blanks(year, month);
        let ledger = self.coordinator.ledger();
        for day in 1..=calendar::days_in_month(year, month) {
            let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            let (x, y) = geometry.cell_origin(blanks + day - 1);
            if y + cell_height > inner.y + inner.height {
                continue;
            }
            let cell = Rect::new(x, y, cell_width, cell_height);
            let count = ledger.count_on(date);
            let background = self.theme.bucket_color(calendar::bucket(count));
            let foreground = contrast_color(&background, Color::White);

            let is_selected = date == self.state.selected;
            let mut day_style = Style::default().fg(foreground);
            if date == today {
                day_style = day_style.add_modifier(Modifier::UNDERLINED);
            }
            if is_selected {
                day_style = day_style.add_modifier(Modifier::BOLD);
            }
            let marker = if is_selected { "▶" } else { " " };
            let mut lines = vec![Line::from(vec![
                Span::styled(marker.to_string(), day_style),
                Span::styled(format!("{day:>2}"), day_style),
            ])];
            if cell_height >= 2 {
                let count_label = count
                    .map(|value| format!("{value:>2}"))
                    .unwrap_or_else(|| "  ".to_string());
                lines.push(Line::from(Span::styled(
                    format!(" {count_label}"),
                    Style::default().fg(foreground),
                )));
            }
            let paragraph =
                Paragraph::new(lines).style(Style::default().bg(background).fg(foreground));
            frame.render_widget(paragraph, cell);
        }
    }

    fn render_year(&mut self, frame: &mut Frame, area: Rect) {
        self.state.month_grid = None;
        let year = self.state.selected.year();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{year} Overview"));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
            ])
            .split(inner);
        for (row_index, row) in rows.iter().enumerate() {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Ratio(1, 3),
                    Constraint::Ratio(1, 3),
                    Constraint::Ratio(1, 3),
                ])
                .split(*row);
            for (col_index, column) in columns.iter().enumerate() {
                let month = (row_index * 3 + col_index + 1) as u32;
                self.render_mini_month(frame, *column, year, month);
            }
        }
    }

    fn render_mini_month(&self, frame: &mut Frame, area: Rect, year: i32, month: u32) {
        let ledger = self.coordinator.ledger();
        let mut lines = Vec::new();
        lines.push(Line::from(Span::styled(
            MONTH_NAMES[(month - 1) as usize],
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(
            WEEKDAY_LETTERS
                .iter()
                .map(|letter| {
                    Span::styled(format!("{letter} "), Style::default().fg(self.theme.muted))
                })
                .collect::<Vec<_>>(),
        ));

        let blanks = calendar::leading_blanks(year, month);
        let total = calendar::days_in_month(year, month);
        let mut cells: Vec<Span> = Vec::new();
        for index in 0..(blanks + total) {
            if index < blanks {
                cells.push(Span::raw("  "));
            } else {
                let day = index - blanks + 1;
                let count = NaiveDate::from_ymd_opt(year, month, day)
                    .and_then(|date| ledger.count_on(date));
                let color = self.theme.bucket_color(calendar::bucket(count));
                cells.push(Span::styled("█ ", Style::default().fg(color)));
            }
            if (index + 1) % u32::from(GRID_COLUMNS) == 0 {
                lines.push(Line::from(std::mem::take(&mut cells)));
            }
        }
        if !cells.is_empty() {
            lines.push(Line::from(cells));
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_stats(&mut self, frame: &mut Frame, area: Rect) {
        self.state.month_grid = None;
        match self.state.stats_tab {
            StatsTab::Weekly => self.render_weekly_stats(frame, area),
            StatsTab::Monthly => self.render_monthly_stats(frame, area),
        }
    }

    fn render_weekly_stats(&self, frame: &mut Frame, area: Rect) {
        let year = self.state.selected.year();
        let today = Local::now().date_naive();
        let ledger = self.coordinator.ledger();
        let distribution = stats::weekday_distribution(ledger.days(), year, today);

        let mut lines = vec![
            Line::from(Span::styled(
                format!("{year}: counts by day of week"),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for entry in &distribution {
            let summary = entry.summary;
            let mut spans = vec![Span::styled(
                format!("{:<4}", entry.label),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )];
            if summary.count == 0 {
                spans.push(Span::styled(
                    "no records",
                    Style::default().fg(self.theme.muted),
                ));
            } else {
                spans.push(Span::raw(format!(
                    "n={:<3} min {:>4.1}  q1 {:>4.1}  med {:>4.1}  q3 {:>4.1}  max {:>4.1}",
                    summary.count, summary.min, summary.q1, summary.median, summary.q3, summary.max
                )));
            }
            if let Some(current) = entry.current {
                spans.push(Span::styled(
                    format!("  ◆ this week: {current}"),
                    Style::default().fg(self.theme.danger),
                ));
            }
            lines.push(Line::from(spans));
        }

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Stats · [1] Weekly  [2] Monthly"),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_monthly_stats(&self, frame: &mut Frame, area: Rect) {
        let year = self.state.selected.year();
        let ledger = self.coordinator.ledger();
        let averages = stats::monthly_weekly_averages(ledger.days(), year);
        let scale = averages
            .iter()
            .flatten()
            .fold(1.0_f64, |max, &value| max.max(value));

        let mut lines = vec![
            Line::from(Span::styled(
                format!("{year}: average per week by month"),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        let bar_width = cmp::max(10, area.width.saturating_sub(24)) as f64;
        for (index, average) in averages.iter().enumerate() {
            let label = stats::MONTH_LABELS[index];
            match average {
                Some(value) => {
                    let bar_len = ((value / scale) * bar_width).round() as usize;
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("{label:<4}"),
                            Style::default()
                                .fg(self.theme.accent)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::raw(format!("{value:>5.1} ")),
                        Span::styled(
                            "█".repeat(bar_len.max(1)),
                            Style::default().fg(self.theme.goal),
                        ),
                    ]));
                }
                None => {
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("{label:<4}"),
                            Style::default()
                                .fg(self.theme.accent)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::styled("no records", Style::default().fg(self.theme.muted)),
                    ]));
                }
            }
        }

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Stats · [1] Weekly  [2] Monthly"),
        );
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            self.state.status.clone(),
            Style::default().fg(self.theme.muted),
        )));
        frame.render_widget(paragraph, area);
    }

    fn render_adjuster(&mut self, frame: &mut Frame) {
        let frame_area = frame.size();
        let width = cmp::min(34_u16, frame_area.width.saturating_sub(2)).max(24);
        let height = cmp::min(12_u16, frame_area.height.saturating_sub(2)).max(8);
        let x = frame_area.x + (frame_area.width.saturating_sub(width)) / 2;
        let y = frame_area.y + (frame_area.height.saturating_sub(height)) / 2;
        let area = Rect::new(x, y, width, height);

        let (target, clearing, value) = {
            let Some(modal) = self.adjuster.as_mut() else {
                return;
            };
            modal.surface = area;
            (
                modal.target,
                modal.machine.is_clearing(),
                modal.machine.value(),
            )
        };

        frame.render_widget(Clear, area);

        let background = if clearing {
            self.theme.clearing
        } else {
            match target {
                CommitTarget::Goal => self.theme.goal,
                CommitTarget::Day(_) => self.theme.bucket_color(calendar::bucket(value)),
            }
        };
        let foreground = contrast_color(&background, Color::White);

        let title = match target {
            CommitTarget::Day(date) => date_key(date),
            CommitTarget::Goal => "Weekly goal".to_string(),
        };
        let value_text = match value {
            Some(value) => value.to_string(),
            None => "-".to_string(),
        };

        let mut lines = vec![Line::from("")];
        for row in block_font::render(&value_text) {
            lines.push(Line::from(Span::styled(
                row,
                Style::default()
                    .fg(foreground)
                    .add_modifier(Modifier::BOLD),
            )));
        }
        lines.push(Line::from(""));
        let (hint_primary, hint_secondary) = if clearing {
            ("tap to set 0 · release to clear", "drag up to cancel")
        } else {
            ("tap to +1 · drag up/down to adjust", "drag below 0 to clear")
        };
        let hint_style = Style::default().fg(foreground);
        lines.push(Line::from(Span::styled(hint_primary, hint_style)));
        lines.push(Line::from(Span::styled(hint_secondary, hint_style)));
        lines.push(Line::from(Span::styled("click outside to close", hint_style)));

        let paragraph = Paragraph::new(lines)
            .style(Style::default().bg(background))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);
    }
}

fn render_prompt(theme: &Theme, frame: &mut Frame, prompt: &PromptModal) {
    let frame_area = frame.size();
    let mut width = cmp::min(52_u16, frame_area.width.saturating_sub(4));
    width = cmp::max(width, 28_u16);
    let height = 7_u16.min(frame_area.height.saturating_sub(2)).max(5_u16);
    let x = frame_area.x + (frame_area.width.saturating_sub(width)) / 2;
    let y = frame_area.y + (frame_area.height.saturating_sub(height)) / 2;
    let area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, area);

    let (title, instruction) = match prompt.target {
        CommitTarget::Day(date) => (
            format!("Count for {}", date_key(date)),
            "Enter a count, or leave blank to clear".to_string(),
        ),
        CommitTarget::Goal => (
            "Weekly goal".to_string(),
            "Enter a goal (0-99), or leave blank to clear".to_string(),
        ),
    };
    let input_line = Line::from(vec![
        Span::styled("> ", Style::default().fg(theme.accent)),
        Span::raw(prompt.input.clone()),
    ]);
    let helper = Line::from(vec![
        Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" save  "),
        Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" cancel"),
    ]);

    let paragraph = Paragraph::new(vec![
        Line::from(instruction),
        input_line,
        Line::from(""),
        helper,
    ])
    .block(Block::default().borders(Borders::ALL).title(title))
    .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);

    let cursor_x = (area.x + 3 + prompt.cursor as u16).min(area.x + area.width.saturating_sub(2));
    let cursor_y = area.y + 2;
    frame.set_cursor(cursor_x, cursor_y);
}

fn shift_month(date: NaiveDate, delta: i32) -> NaiveDate {
    let months = date.year() * 12 + date.month0() as i32 + delta;
    let year = months.div_euclid(12);
    let month = months.rem_euclid(12) as u32 + 1;
    let day = cmp::min(date.day(), calendar::days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

fn rect_contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    pointer: bool,
) -> Result<()> {
    if pointer {
        let _ = execute!(terminal.backend_mut(), DisableMouseCapture);
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}
