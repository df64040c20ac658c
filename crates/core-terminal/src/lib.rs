//! Terminal backend abstraction, a crossterm-backed raw-mode guard, and the
//! `Screen` sink the core renders through (spec §6: "the core never calls
//! terminal-specific operations directly").

use std::io::{Write, stdout};

use anyhow::Result;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
    },
};

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
    fn set_title(&mut self, title: &str) -> Result<()>;
}

pub struct CrosstermBackend {
    entered: bool,
}

/// RAII guard ensuring terminal state restoration even if caller early-returns or panics.
pub struct TerminalGuard<'a> {
    backend: &'a mut CrosstermBackend,
    active: bool,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { entered: false }
    }

    /// Enter and return a guard that will leave on drop.
    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter()?;
        Ok(TerminalGuard { backend: self, active: true })
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide)?;
            self.entered = true;
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            execute!(stdout(), LeaveAlternateScreen, Show)?;
            disable_raw_mode()?;
            self.entered = false;
        }
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        execute!(stdout(), SetTitle(title))?;
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

impl<'a> Drop for TerminalGuard<'a> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.backend.leave();
        }
    }
}

/// A cell's visual style. Token roles are mapped to a `Style` by the caller
/// (core-state never deals in colors); `core-terminal` only knows how to
/// paint one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
}

impl Style {
    pub fn fg(color: Color) -> Self {
        Self { fg: Some(color), ..Default::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    rune: char,
    style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Self { rune: ' ', style: Style::default() }
    }
}

/// The collaborator the core renders through (spec §6 "Screen sink"):
/// `size`, `show`, `sync`, `set_cell`. `set_cell` writes into a back buffer;
/// `sync` diffs it against what's actually on screen and queues only the
/// changed cells; `show` flushes those queued writes to the terminal.
pub trait Screen {
    fn size(&self) -> (u16, u16);
    fn set_cell(&mut self, x: u16, y: u16, rune: char, style: Style);
    fn sync(&mut self) -> Result<()>;
    fn show(&mut self) -> Result<()>;
}

/// A `Screen` backed by a double cell-buffer and crossterm's queued writes.
pub struct CrosstermScreen {
    width: u16,
    height: u16,
    front: Vec<Cell>,
    back: Vec<Cell>,
}

impl CrosstermScreen {
    pub fn new(width: u16, height: u16) -> Self {
        let area = width as usize * height as usize;
        Self {
            width,
            height,
            front: vec![Cell::default(); area],
            back: vec![Cell::default(); area],
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        let area = width as usize * height as usize;
        self.width = width;
        self.height = height;
        self.front = vec![Cell::default(); area];
        self.back = vec![Cell::default(); area];
    }

    fn idx(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

impl Screen for CrosstermScreen {
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn set_cell(&mut self, x: u16, y: u16, rune: char, style: Style) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.idx(x, y);
        self.back[idx] = Cell { rune, style };
    }

    fn sync(&mut self) -> Result<()> {
        let mut out = stdout();
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.idx(x, y);
                if self.back[idx] == self.front[idx] {
                    continue;
                }
                let cell = self.back[idx];
                queue!(out, MoveTo(x, y))?;
                if let Some(fg) = cell.style.fg {
                    queue!(out, SetForegroundColor(fg))?;
                }
                if let Some(bg) = cell.style.bg {
                    queue!(out, SetBackgroundColor(bg))?;
                }
                queue!(out, Print(cell.rune), ResetColor)?;
                self.front[idx] = cell;
            }
        }
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        stdout().flush()?;
        Ok(())
    }
}
