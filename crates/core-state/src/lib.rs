//! Editor state: locators, undo log, menu, and the mutator set that changes
//! all of it (spec §4.D, §4.E, §4.G, §4.H, §4.I).
//!
//! [`EditorState`] is the single aggregate the dispatcher owns exclusively;
//! every change to it flows through [`action::dispatch`].

use std::path::PathBuf;

use core_text::Buffer;

pub mod action;
pub mod buffer;
pub mod cursor;
pub mod io_ops;
pub mod locator;
pub mod menu;
pub mod undo;
pub mod view;

pub use action::{dispatch, Action};
pub use buffer::DocumentBuffer;
pub use cursor::{Cursor, Selector, SelectorMode};
pub use locator::Locator;
pub use menu::{MenuItem, MenuState};
pub use undo::{Operation, UndoEntry, UndoLog};
pub use view::View;

/// Closed set of input modes (spec §3, §4.I).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Insert,
    Menu,
    Search,
    Visual,
    Task,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStyle {
    Info,
    Success,
    Error,
}

/// {style, text}; transient, cleared on most state transitions (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMsg {
    pub style: StatusStyle,
    pub text: String,
}

/// Non-goal per spec: the macro recorder itself isn't specified, only the
/// one bit replay needs — whether the undo log should skip its normal
/// checkpoint-on-return-to-normal behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacroState {
    pub is_replaying: bool,
}

/// The top-level aggregate (spec §3: Editor State).
pub struct EditorState {
    pub document_buffer: DocumentBuffer,
    pub input_mode: InputMode,
    pub prev_input_mode: InputMode,
    pub menu_state: MenuState,
    pub status_msg: Option<StatusMsg>,
    pub undo_log: UndoLog,
    pub has_unsaved_changes: bool,
    pub file_watcher: Option<core_events::FileWatcher>,
    pub quit_flag: bool,
    pub custom_menu_items: Vec<MenuItem>,
    pub macro_state: MacroState,
    pub loaded_path: Option<PathBuf>,
}

impl EditorState {
    /// Construct fresh state around an in-memory buffer with no associated
    /// file. Use [`Action::LoadDocument`] to associate one afterward.
    pub fn new(buffer: Buffer, width: u16, height: u16) -> Self {
        Self {
            document_buffer: DocumentBuffer::new(buffer, width, height),
            input_mode: InputMode::Normal,
            prev_input_mode: InputMode::Normal,
            menu_state: MenuState::default(),
            status_msg: None,
            undo_log: UndoLog::new(),
            has_unsaved_changes: false,
            file_watcher: None,
            quit_flag: false,
            custom_menu_items: Vec::new(),
            macro_state: MacroState::default(),
            loaded_path: None,
        }
    }
}
