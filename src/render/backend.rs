use std::io::{self, Write};

use unicode_width::UnicodeWidthChar;

use crate::cursor;
use crate::geometry::TerminalSize;

/// The three terminal side effects the renderer needs, plus a flush.
pub trait TerminalBackend {
    /// Move the cursor to a 0-based column and row.
    fn move_to(&mut self, column: u16, row: u16) -> io::Result<()>;
    /// Write text at the cursor, advancing it.
    fn write_str(&mut self, text: &str) -> io::Result<()>;
    /// Clear the whole screen.
    fn clear_all(&mut self) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
    /// Called when the terminal changes size, before the redraw.
    fn resize(&mut self, _size: TerminalSize) {}
}

/// Backend writing ANSI escape sequences to any [`Write`] handle.
pub struct AnsiBackend<W: Write> {
    writer: W,
}

impl<W: Write> AnsiBackend<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl AnsiBackend<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalBackend for AnsiBackend<W> {
    fn move_to(&mut self, column: u16, row: u16) -> io::Result<()> {
        self.writer.write_all(cursor::move_to(column, row).as_bytes())
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())
    }

    fn clear_all(&mut self) -> io::Result<()> {
        self.writer.write_all(cursor::clear_screen().as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Operation recorded by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOp {
    MoveTo { column: u16, row: u16 },
    Write(String),
    ClearAll,
    Flush,
}

const CONTINUATION: char = '\0';

/// In-memory screen for tests and headless hosts.
///
/// Text past the right edge or below the last row is dropped; nothing wraps.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    size: TerminalSize,
    cells: Vec<Vec<char>>,
    cursor: (u16, u16),
    ops: Vec<BackendOp>,
    clears: usize,
}

impl MemoryBackend {
    pub fn new(size: TerminalSize) -> Self {
        Self {
            size,
            cells: blank(size),
            cursor: (0, 0),
            ops: Vec::new(),
            clears: 0,
        }
    }

    pub fn size(&self) -> TerminalSize {
        self.size
    }

    /// Row contents with trailing blanks trimmed.
    pub fn row(&self, row: u16) -> String {
        self.cells
            .get(row as usize)
            .map(|cells| {
                let text: String = cells.iter().filter(|&&c| c != CONTINUATION).collect();
                text.trim_end().to_string()
            })
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        (0..self.size.height).map(|row| self.row(row)).collect()
    }

    pub fn ops(&self) -> &[BackendOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<BackendOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn clear_count(&self) -> usize {
        self.clears
    }

    /// Texts written since the log was last drained, in order.
    pub fn writes(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                BackendOp::Write(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn put(&mut self, ch: char) {
        let (column, row) = self.cursor;
        let width = ch.width().unwrap_or(0) as u16;
        if width == 0 {
            return;
        }
        if let Some(cells) = self.cells.get_mut(row as usize) {
            let start = column as usize;
            if start + width as usize <= cells.len() {
                cells[start] = ch;
                for offset in 1..width as usize {
                    cells[start + offset] = CONTINUATION;
                }
            }
        }
        self.cursor.0 = column.saturating_add(width);
    }
}

fn blank(size: TerminalSize) -> Vec<Vec<char>> {
    vec![vec![' '; size.width as usize]; size.height as usize]
}

impl TerminalBackend for MemoryBackend {
    // The grid follows the terminal and starts blank.
    fn resize(&mut self, size: TerminalSize) {
        self.size = size;
        self.cells = blank(size);
    }

    fn move_to(&mut self, column: u16, row: u16) -> io::Result<()> {
        self.cursor = (column, row);
        self.ops.push(BackendOp::MoveTo { column, row });
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        let clean = strip_ansi_escapes::strip(text);
        for ch in String::from_utf8_lossy(&clean).chars() {
            self.put(ch);
        }
        self.ops.push(BackendOp::Write(text.to_string()));
        Ok(())
    }

    fn clear_all(&mut self) -> io::Result<()> {
        self.cells = blank(self.size);
        self.cursor = (0, 0);
        self.clears += 1;
        self.ops.push(BackendOp::ClearAll);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ops.push(BackendOp::Flush);
        Ok(())
    }
}
