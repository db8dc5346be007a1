use anyhow::{ensure, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    fs::File,
    io::{stdout, Stdout},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{debug, info, Level};

use blockfall::config::{DEFAULT_COLS, DEFAULT_ROWS, INITIAL_GRAVITY_INTERVAL};
use blockfall::{Action, Cell, Game, GameConfig, Mode, RandomPieceProvider, Rgb};

// ============================================================================
// Visual Constants
// ============================================================================

const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";
const CELL_WIDTH: u16 = 2;

const CREDITS_TEXT: &str = "CREDITS TO TETRIS COMPANY @CATAI [C] 199X-20XX";

// ============================================================================
// Command Line
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "blockfall", about = "Falling-block puzzle for the terminal")]
struct Cli {
    #[arg(short = 'v', long, action = clap::ArgAction::Count, help = "Increase log verbosity (-v = DEBUG, -vv = TRACE)")]
    verbose: u8,

    #[arg(long, help = "Write logs to this file (nothing is logged otherwise)")]
    log_file: Option<PathBuf>,

    #[arg(long, help = "Seed for the piece generator")]
    seed: Option<u64>,

    #[arg(long, default_value_t = 60, help = "Frames per second")]
    fps: u32,

    #[arg(long, default_value_t = DEFAULT_ROWS, help = "Grid rows")]
    rows: usize,

    #[arg(long, default_value_t = DEFAULT_COLS, help = "Grid columns")]
    cols: usize,

    #[arg(long, default_value_t = INITIAL_GRAVITY_INTERVAL, help = "Seconds per row at level 1")]
    gravity: f64,
}

fn init_logging(cli: &Cli) -> Result<()> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(level)
        .init();
    info!(%level, "logging initialized");
    Ok(())
}

// ============================================================================
// Input
// ============================================================================

/// Keys map to actions regardless of mode; the engine drops the ones that
/// don't apply.
fn decode_key(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Action::Start),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::ShowCredits),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Action::BackToMenu),
        KeyCode::Left => Some(Action::Left),
        KeyCode::Right => Some(Action::Right),
        KeyCode::Down => Some(Action::SoftDown),
        KeyCode::Up => Some(Action::Rotate),
        _ => None,
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn cell_color(Rgb(r, g, b): Rgb) -> Color {
    Color::Rgb(r, g, b)
}

fn render(frame: &mut Frame, game: &Game) {
    let area = frame.size();

    match game.mode {
        Mode::Menu => render_menu(frame, game, area),
        Mode::Credits => render_credits(frame, area),
        Mode::Playing => render_game(frame, game, area),
    }
}

fn render_menu(frame: &mut Frame, game: &Game, area: Rect) {
    let snapshot = game.snapshot();
    let mut text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "TETRIS",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Press S to Start"),
        Line::from("Press C for Credits"),
    ];
    if snapshot.score > 0 || snapshot.lines > 0 {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            format!("Last score: {}", snapshot.score),
            Style::default().fg(Color::Yellow),
        )));
    }
    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "Q/ESC: Quit",
        Style::default().fg(Color::DarkGray),
    )));

    let height = text.len() as u16 + 2;
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, centered_rect(30, height, area));
}

fn render_credits(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(CREDITS_TEXT),
        Line::from(""),
        Line::from(Span::styled(
            "Press M to return to Menu",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Credits ")
            .title_alignment(Alignment::Center),
    );
    frame.render_widget(paragraph, centered_rect(CREDITS_TEXT.len() as u16 + 6, 6, area));
}

/// Bordered playfield size in terminal cells, saturating at `u16::MAX`.
fn board_size(rows: usize, cols: usize) -> (u16, u16) {
    let to_u16 = |n: usize| u16::try_from(n).unwrap_or(u16::MAX);
    let width = to_u16(cols).saturating_mul(CELL_WIDTH).saturating_add(2);
    let height = to_u16(rows).saturating_add(2);
    (width, height)
}

fn render_game(frame: &mut Frame, game: &Game, area: Rect) {
    let grid = game.snapshot().grid;
    let (grid_display_width, grid_display_height) = board_size(grid.rows(), grid.cols());
    let info_width = 14;
    let total_width = grid_display_width.saturating_add(info_width + 2);

    let main_area = centered_rect(total_width, grid_display_height.saturating_add(1), area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);

    // Layout: [Grid][Info]
    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(info_width),
    ])
    .split(vertical[0]);

    render_grid(frame, game, horizontal[0]);
    render_info(frame, game, horizontal[1]);

    let controls = Paragraph::new(Line::from("←→: Move | ↓: Down | ↑: Rotate | Q/ESC: Quit"))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(controls, vertical[1]);
}

fn render_grid(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Tetris ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = game
        .render_grid()
        .iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|cell| match cell {
                    Cell::Empty => Span::raw(EMPTY_CHAR),
                    Cell::Filled(kind) => {
                        Span::styled(BLOCK_CHAR, Style::default().fg(cell_color(kind.color())))
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, game: &Game, area: Rect) {
    let snapshot = game.snapshot();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", snapshot.score)),
        Line::from(""),
        Line::from(Span::styled("Lines", Style::default().fg(Color::Cyan))),
        Line::from(format!("{}", snapshot.lines)),
        Line::from(""),
        Line::from(Span::styled("Level", Style::default().fg(Color::Green))),
        Line::from(format!("{}", snapshot.level)),
    ];

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Main Loop
// ============================================================================

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, game: &mut Game, fps: u32) -> Result<()> {
    let frame_duration = Duration::from_secs_f64(1.0 / fps as f64);
    let mut last_frame = Instant::now();
    let mut actions: Vec<Action> = Vec::new();

    loop {
        terminal.draw(|frame| render(frame, game))?;

        // Gather input until the next frame is due
        let timeout = frame_duration.saturating_sub(last_frame.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match decode_key(key.code) {
                        Some(Action::Quit) => {
                            info!("quit requested");
                            return Ok(());
                        }
                        Some(action) => actions.push(action),
                        None => {}
                    }
                }
            }
        }

        if last_frame.elapsed() >= frame_duration {
            let delta = last_frame.elapsed().as_secs_f64();
            last_frame = Instant::now();

            game.tick(delta, &actions);
            actions.clear();

            for event in game.take_events() {
                debug!(?event, "game event");
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;
    ensure!(cli.fps > 0, "fps must be positive");

    let config = GameConfig {
        initial_gravity_interval: cli.gravity,
        ..GameConfig::with_size(cli.rows, cli.cols)
    };
    let provider = match cli.seed {
        Some(seed) => RandomPieceProvider::seeded(seed),
        None => RandomPieceProvider::new(),
    };
    let mut game = Game::with_config(config, Box::new(provider)).context("invalid game settings")?;

    with_restore(
        || {
            enable_raw_mode()?;
            stdout().execute(EnterAlternateScreen)?;
            let backend = CrosstermBackend::new(stdout());
            let mut terminal = Terminal::new(backend)?;
            run(&mut terminal, &mut game, cli.fps)
        },
        restore_terminal,
    )
}

/// Runs `session`, then `restore` no matter how the session ended. A session
/// error wins over a restore error.
fn with_restore<T>(
    session: impl FnOnce() -> Result<T>,
    restore: impl FnOnce() -> Result<()>,
) -> Result<T> {
    let result = session();
    let restored = restore();
    let value = result?;
    restored?;
    Ok(value)
}

fn restore_terminal() -> Result<()> {
    let raw = disable_raw_mode();
    let screen = stdout().execute(LeaveAlternateScreen).map(|_| ());
    raw?;
    screen?;
    Ok(())
}
