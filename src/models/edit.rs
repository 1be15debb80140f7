use serde::{Deserialize, Serialize};

/// A replacement of the range `(start_line, start_column)..(end_line, end_column)`
/// with `text`. Lines and columns are 1-indexed, columns count UTF-16 code units.
///
/// On the wire this is the 5-element array `[text, startLine, startCol, endLine, endCol]`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "EditTuple", into = "EditTuple")]
pub struct EditOperation {
    pub text: String,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

type EditTuple = (String, u32, u32, u32, u32);

impl From<EditTuple> for EditOperation {
    fn from((text, start_line, start_column, end_line, end_column): EditTuple) -> Self {
        Self {
            text,
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

impl From<EditOperation> for EditTuple {
    fn from(op: EditOperation) -> Self {
        (op.text, op.start_line, op.start_column, op.end_line, op.end_column)
    }
}

impl EditOperation {
    pub fn new(
        text: impl Into<String>,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        Self {
            text: text.into(),
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Removal of whole blank lines: no text, spans lines, both columns at 1.
    pub fn is_line_removal(&self) -> bool {
        self.text.is_empty()
            && self.start_line != self.end_line
            && self.start_column == 1
            && self.end_column == 1
    }
}

/// Caret position, optionally with a selection.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum CursorPosition {
    /// `[line, column]`
    Point(u32, u32),
    /// `[line, column, selStartLine, selStartColumn, selEndLine, selEndColumn]`
    Selection(u32, u32, u32, u32, u32, u32),
}

/// `[scrollLeft, scrollTop]` in editor pixels.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ScrollPosition(pub f64, pub f64);

/// `[xPercent, yPercent]` relative to the shared viewport.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition(pub f64, pub f64);
