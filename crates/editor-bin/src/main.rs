//! Oxidized entrypoint: CLI bootstrap, logging, and the dispatcher select
//! loop (spec §5, §6).

use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Color;
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use core_events::{
    AsyncEventSource, Event, EventSourceRegistry, InputEvent, EVENT_CHANNEL_CAP,
};
use core_state::{dispatch, Action, EditorState, StatusStyle};
use core_syntax::Role;
use core_terminal::{CrosstermBackend, CrosstermScreen, Screen, Style, TerminalBackend};
use core_text::Buffer;

/// Poll cadence for noticing a file-watcher signal and folding it into the
/// dispatcher select loop as `Event::FileChanged` (spec §4.F, §5).
const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(name = "oxidized", version, about = "Oxidized editor")]
struct Args {
    /// Path to open at startup (spec §6: `program [--cpuprofile=PATH] PATH`).
    path: PathBuf,
    /// Write a CPU profile to PATH. Accepted per spec §6's CLI interface;
    /// this workspace carries no profiling crate in its dependency stack, so
    /// the flag is parsed and logged but produces no profile output.
    #[arg(long = "cpuprofile", value_name = "PATH")]
    cpuprofile: Option<PathBuf>,
    /// Path to a config file (default: `oxidized.toml` in the cwd). Not part
    /// of spec §6's documented CLI surface; kept as an additive workspace
    /// convenience matching the teacher's own `--config` flag.
    #[arg(long = "config")]
    config: Option<PathBuf>,
}

/// Parse CLI args, mapping a usage error to exit code 1 (spec §6) rather
/// than clap's default of 2. `--help`/`--version` keep exiting 0.
fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            match err.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    std::process::exit(0)
                }
                _ => std::process::exit(1),
            }
        }
    }
}

fn configure_logging() -> Result<Option<WorkerGuard>> {
    let log_path = Path::new("oxidized.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(log_path);
    }
    let file_appender = tracing_appender::rolling::never(".", "oxidized.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        Err(_) => Ok(None), // a subscriber is already installed (e.g. under test harnesses)
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_hook(info);
        }));
    });
}

/// Build the initial [`EditorState`], loading `args.path` through
/// [`Action::LoadDocument`] so the file watcher starts the same way a later
/// reload would (spec §4.H, §4.F, §6).
fn bootstrap_state(path: &Path, width: u16, height: u16) -> EditorState {
    let mut state = EditorState::new(Buffer::from_string("untitled", ""), width, height);
    dispatch(
        &Action::LoadDocument {
            path: path.to_path_buf(),
            show_status: true,
        },
        &mut state,
    );
    state
}

fn style_for_role(role: Role) -> Style {
    match role {
        Role::Keyword => Style::fg(Color::Magenta),
        Role::Number => Style::fg(Color::Cyan),
        Role::String => Style::fg(Color::Green),
        Role::Comment => Style::fg(Color::DarkGrey),
        Role::Operator | Role::Punctuation => Style::fg(Color::Yellow),
        Role::Custom1 | Role::Custom2 | Role::Custom3 | Role::Custom4 | Role::Custom5
        | Role::Custom6 | Role::Custom7 | Role::Custom8 => Style::fg(Color::Blue),
        Role::Identifier | Role::None => Style::default(),
    }
}

fn status_style(style: StatusStyle) -> Style {
    match style {
        StatusStyle::Info => Style::fg(Color::Cyan),
        StatusStyle::Success => Style::fg(Color::Green),
        StatusStyle::Error => Style::fg(Color::Red),
    }
}

fn invert(style: Style) -> Style {
    Style {
        fg: Some(Color::Black),
        bg: Some(style.fg.unwrap_or(Color::White)),
        bold: style.bold,
    }
}

/// Paint the document buffer, status line, and (when visible) the menu
/// overlay into `screen` (spec §6 "Screen sink").
fn render(state: &EditorState, screen: &mut dyn Screen) -> Result<()> {
    let (width, height) = screen.size();
    let text_height = height.saturating_sub(1);
    let buf = &state.document_buffer;
    let origin_line = buf.text.line_at(buf.view.origin_position);
    let cursor_line = buf.text.line_at(buf.cursor.position);
    let cursor_col_in_line =
        buf.cursor.position.rune_offset() - buf.text.line_start(cursor_line).rune_offset();

    for row in 0..text_height {
        let line_idx = origin_line + row as usize;
        let line = buf.text.line_str(line_idx).unwrap_or_default();
        let line_start = buf.text.line_start(line_idx).rune_offset();
        let is_cursor_row = line_idx == cursor_line;

        let mut rune_offset = line_start;
        let mut col: u16 = 0;
        for cluster in core_text::grapheme::iter(&line) {
            if col >= width {
                break;
            }
            let rune_len = cluster.chars().count().max(1);
            let cell_width = (core_text::grapheme::cluster_width(cluster) as u16).max(1);
            let role = buf
                .token_index
                .tokens_intersecting_range(rune_offset, rune_offset + 1)
                .next()
                .map(|t| t.role)
                .unwrap_or(Role::None);
            let is_cursor = is_cursor_row && rune_offset - line_start == cursor_col_in_line;
            let style = if is_cursor {
                invert(style_for_role(role))
            } else {
                style_for_role(role)
            };
            let ch = cluster.chars().next().unwrap_or(' ');
            screen.set_cell(col, row, ch, style);
            for pad in 1..cell_width {
                screen.set_cell(col + pad, row, ' ', style);
            }
            col += cell_width;
            rune_offset += rune_len;
        }
        // Cursor sitting one past the last grapheme on the line (insert mode
        // at end-of-line): paint a blank highlighted cell there.
        if is_cursor_row && cursor_col_in_line == rune_offset - line_start && col < width {
            screen.set_cell(col, row, ' ', invert(Style::default()));
            col += 1;
        }
        for pad_col in col..width {
            screen.set_cell(pad_col, row, ' ', Style::default());
        }
    }

    render_status_line(state, screen, height.saturating_sub(1), width);
    Ok(())
}

fn render_status_line(state: &EditorState, screen: &mut dyn Screen, row: u16, width: u16) {
    let text = if state.menu_state.visible {
        let results: Vec<&str> = state
            .menu_state
            .search
            .results
            .iter()
            .map(|&idx| state.menu_state.items[idx].name.as_str())
            .collect();
        format!(
            "{}: {} [{}]",
            state.menu_state.prompt,
            state.menu_state.search.query,
            results.join(" ")
        )
    } else if let Some(msg) = &state.status_msg {
        msg.text.clone()
    } else {
        format!("{:?}", state.input_mode)
    };
    let style = state
        .status_msg
        .as_ref()
        .filter(|_| !state.menu_state.visible)
        .map(|m| status_style(m.style))
        .unwrap_or_default();

    let mut col = 0u16;
    for ch in text.chars() {
        if col >= width {
            break;
        }
        screen.set_cell(col, row, ch, style);
        col += 1;
    }
    for pad_col in col..width {
        screen.set_cell(pad_col, row, ' ', Style::default());
    }
}

fn handle_event(
    event: Event,
    state: &mut EditorState,
    config: &core_config::Config,
    screen: &mut CrosstermScreen,
) -> bool {
    match event {
        Event::Input(InputEvent::Resize(w, h)) => {
            screen.resize(w, h);
            state.document_buffer.view.resize(w, h.saturating_sub(1));
            true
        }
        Event::Input(input) => {
            if let Some(action) = core_keymap::interpret(input, state.input_mode, config) {
                dispatch(&action, state);
            }
            !state.quit_flag
        }
        Event::FileChanged => {
            state.set_status(StatusStyle::Error, "file changed on disk");
            true
        }
        Event::Shutdown => false,
    }
}

async fn run_dispatcher(
    mut state: EditorState,
    config: core_config::Config,
    mut screen: CrosstermScreen,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let mut registry = EventSourceRegistry::new();
    registry.register(core_input::TerminalEventSource);
    let source_handles = registry.spawn_all(&tx);

    render(&state, &mut screen)?;
    screen.sync()?;
    screen.show()?;

    let mut watch_interval = tokio::time::interval(WATCH_POLL_INTERVAL);
    watch_interval.tick().await; // first tick is immediate

    loop {
        let keep_going = tokio::select! {
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event) => handle_event(event, &mut state, &config, &mut screen),
                    None => false,
                }
            }
            _ = watch_interval.tick() => {
                let changed = state.file_watcher.as_mut().is_some_and(|w| w.has_changed());
                if changed {
                    handle_event(Event::FileChanged, &mut state, &config, &mut screen)
                } else {
                    true
                }
            }
        };

        if !keep_going || state.quit_flag {
            break;
        }

        dispatch(&Action::ScrollToCursor, &mut state);
        render(&state, &mut screen)?;
        screen.sync()?;
        screen.show()?;
    }

    for handle in source_handles {
        handle.abort();
    }
    if let Some(mut watcher) = state.file_watcher.take() {
        watcher.stop();
    }
    info!(target: "runtime", "shutdown");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = configure_logging()?;
    install_panic_hook();
    info!(target: "runtime", "startup");

    let args = parse_args();
    if let Some(profile_path) = &args.cpuprofile {
        tracing::warn!(
            target: "runtime",
            path = %profile_path.display(),
            "--cpuprofile accepted but no profiling backend is wired up; no profile will be written"
        );
    }
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("oxidized.toml"));
    let config = core_config::Config::load(&config_path);

    let (width, height) = crossterm::terminal::size().context("failed to read terminal size")?;
    let state = bootstrap_state(&args.path, width, height);

    let mut backend = CrosstermBackend::new();
    backend.set_title("Oxidized")?;
    let guard = backend.enter_guard()?;
    let screen = CrosstermScreen::new(width, height);

    let result = run_dispatcher(state, config, screen).await;
    drop(guard);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_for_role_is_pure_and_total() {
        assert_eq!(style_for_role(Role::None), Style::default());
        assert_ne!(style_for_role(Role::Keyword), Style::default());
    }

    #[test]
    fn invert_swaps_foreground_into_background() {
        let style = Style::fg(Color::Green);
        let inverted = invert(style);
        assert_eq!(inverted.bg, Some(Color::Green));
        assert_eq!(inverted.fg, Some(Color::Black));
    }

    #[test]
    fn bootstrap_state_with_missing_path_reports_error_status() {
        let path = PathBuf::from("/nonexistent/oxidized-bootstrap-test.txt");
        let state = bootstrap_state(&path, 80, 24);
        assert!(state.loaded_path.is_none());
        assert_eq!(state.status_msg.as_ref().unwrap().style, StatusStyle::Error);
    }

    #[test]
    fn bootstrap_state_loads_existing_file_and_starts_watcher() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        std::fs::write(&path, "hello\n").unwrap();
        let state = bootstrap_state(&path, 80, 24);
        assert_eq!(state.loaded_path.as_deref(), Some(path.as_path()));
        assert!(state.file_watcher.is_some());
        assert_eq!(state.document_buffer.text.line_str(0).unwrap(), "hello");
    }

    #[test]
    fn parse_args_accepts_path_and_cpuprofile_flag() {
        let args = Args::try_parse_from(["oxidized", "--cpuprofile", "/tmp/out.prof", "file.txt"])
            .expect("path plus --cpuprofile should parse");
        assert_eq!(args.path, PathBuf::from("file.txt"));
        assert_eq!(args.cpuprofile, Some(PathBuf::from("/tmp/out.prof")));
    }

    #[test]
    fn parse_args_rejects_missing_path() {
        let err = Args::try_parse_from(["oxidized"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
