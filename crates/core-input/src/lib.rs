//! Terminal-event producer: wraps `crossterm::EventStream` as one
//! `AsyncEventSource` feeding the dispatcher's shared channel (spec §5, §6
//! "Input interpreter... given a terminal event").
//!
//! Key and resize events are normalized into `core_events::InputEvent`;
//! Ctrl-C is surfaced as its own variant so the dispatcher can quit
//! unconditionally without routing it through the keymap.

use core_events::{AsyncEventSource, Event, InputEvent, KeyCode, KeyEvent, KeyModifiers};
use crossterm::event::{
    Event as CEvent, EventStream, KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind,
    KeyModifiers as CMods,
};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, trace};

/// An `AsyncEventSource` backed by `crossterm::EventStream`.
#[derive(Default)]
pub struct TerminalEventSource;

impl AsyncEventSource for TerminalEventSource {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let span = tracing::debug_span!(target: "input", "terminal_event_task");
            let _enter = span.enter();
            let mut stream = EventStream::new();
            while let Some(result) = stream.next().await {
                let cevent = match result {
                    Ok(cevent) => cevent,
                    Err(err) => {
                        debug!(target: "input", %err, "event stream error");
                        continue;
                    }
                };
                let Some(event) = translate(cevent) else { continue };
                trace!(target: "input", ?event, "input event");
                if tx.send(event).await.is_err() {
                    break; // dispatcher shut down; nothing left to feed.
                }
            }
        })
    }
}

fn translate(cevent: CEvent) -> Option<Event> {
    match cevent {
        CEvent::Key(key) if key.kind == KeyEventKind::Press => translate_key(key),
        CEvent::Resize(w, h) => Some(Event::Input(InputEvent::Resize(w, h))),
        _ => None,
    }
}

fn translate_key(key: CKeyEvent) -> Option<Event> {
    if key.code == CKeyCode::Char('c') && key.modifiers.contains(CMods::CONTROL) {
        return Some(Event::Input(InputEvent::CtrlC));
    }
    let code = translate_keycode(key.code)?;
    let mods = translate_mods(key.modifiers);
    Some(Event::Input(InputEvent::Key(KeyEvent::new(code, mods))))
}

fn translate_keycode(code: CKeyCode) -> Option<KeyCode> {
    match code {
        CKeyCode::Char(c) => Some(KeyCode::Char(c)),
        CKeyCode::Enter => Some(KeyCode::Enter),
        CKeyCode::Esc => Some(KeyCode::Esc),
        CKeyCode::Backspace => Some(KeyCode::Backspace),
        CKeyCode::Tab => Some(KeyCode::Tab),
        CKeyCode::Up => Some(KeyCode::Up),
        CKeyCode::Down => Some(KeyCode::Down),
        CKeyCode::Left => Some(KeyCode::Left),
        CKeyCode::Right => Some(KeyCode::Right),
        _ => None,
    }
}

fn translate_mods(mods: CMods) -> KeyModifiers {
    let mut out = KeyModifiers::empty();
    if mods.contains(CMods::CONTROL) {
        out |= KeyModifiers::CTRL;
    }
    if mods.contains(CMods::ALT) {
        out |= KeyModifiers::ALT;
    }
    if mods.contains(CMods::SHIFT) {
        out |= KeyModifiers::SHIFT;
    }
    out
}
