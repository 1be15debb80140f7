use std::collections::HashMap;
use tracing::debug;

use crate::models::{EditOperation, RoomId};

/// Authoritative text and language of a single room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentState {
    pub text: String,
    pub language: String,
}

/// Holds the document of every live room.
///
/// A room without an entry reads as empty text in the default language.
#[derive(Debug)]
pub struct DocumentStore {
    docs: HashMap<RoomId, DocumentState>,
    default_language: String,
}

impl DocumentStore {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            docs: HashMap::new(),
            default_language: default_language.into(),
        }
    }

    /// Initialize the room's document if it has none yet.
    pub fn init(&mut self, room_id: &RoomId) {
        self.entry(room_id);
    }

    pub fn room_exists(&self, room_id: &RoomId) -> bool {
        self.docs.contains_key(room_id)
    }

    pub fn document(&self, room_id: &RoomId) -> &str {
        self.docs.get(room_id).map_or("", |doc| doc.text.as_str())
    }

    pub fn language(&self, room_id: &RoomId) -> &str {
        self.docs
            .get(room_id)
            .map_or(self.default_language.as_str(), |doc| doc.language.as_str())
    }

    pub fn set_language(&mut self, room_id: &RoomId, language: String) {
        self.entry(room_id).language = language;
    }

    pub fn set_document(&mut self, room_id: &RoomId, text: String) {
        self.entry(room_id).text = text;
    }

    /// Apply an edit to the room's buffer and return the new text.
    pub fn apply_edit(&mut self, room_id: &RoomId, op: &EditOperation) -> &str {
        let doc = self.entry(room_id);
        doc.text = apply_edit_to_text(&doc.text, op);
        &doc.text
    }

    /// Drop the room's document. Returns whether there was one.
    pub fn delete(&mut self, room_id: &RoomId) -> bool {
        self.docs.remove(room_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn entry(&mut self, room_id: &RoomId) -> &mut DocumentState {
        let default_language = &self.default_language;
        self.docs.entry(room_id.clone()).or_insert_with(|| DocumentState {
            text: String::new(),
            language: default_language.clone(),
        })
    }
}

/// How many lines an edit may add past the end of the buffer by addressing them.
pub const MAX_EDIT_GROWTH_LINES: usize = 1_000;

/// Byte offset of a 1-indexed UTF-16 column in `line`, clamped to `[0, line.len()]`.
///
/// A column that lands inside a surrogate pair snaps to the end of that character.
fn byte_offset(line: &str, column: u32) -> usize {
    let target = column.saturating_sub(1) as usize;
    let mut units = 0;
    for (idx, ch) in line.char_indices() {
        if units >= target {
            return idx;
        }
        units += ch.len_utf16();
    }
    line.len()
}

/// Replace the range described by `op` in `text`.
///
/// Out-of-range input never fails. Lines past the end of the buffer are padded
/// with empty lines, up to [`MAX_EDIT_GROWTH_LINES`] of them; line numbers
/// beyond that are pulled back to the last line allowed. Columns are clamped
/// into their line, and a range whose end precedes its start collapses to an
/// insertion at the start.
pub fn apply_edit_to_text(text: &str, op: &EditOperation) -> String {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();

    let last_allowed = lines.len() - 1 + MAX_EDIT_GROWTH_LINES;
    let mut start = op.start_line.max(1) as usize - 1;
    let mut end = (op.end_line.max(1) as usize - 1).max(start);
    if end > last_allowed {
        debug!(
            "Clamping edit at lines {}..{} to line {}",
            op.start_line, op.end_line, last_allowed + 1
        );
        start = start.min(last_allowed);
        end = last_allowed;
    }
    if end >= lines.len() {
        lines.resize(end + 1, String::new());
    }

    if op.is_line_removal() && end > start {
        lines.drain(start..end);
        return lines.join("\n");
    }

    let start_at = byte_offset(&lines[start], op.start_column);
    let mut end_at = byte_offset(&lines[end], op.end_column);
    if start == end {
        end_at = end_at.max(start_at);
    }

    let capacity = start_at + op.text.len() + lines[end].len() - end_at;
    let mut replacement = String::with_capacity(capacity);
    replacement.push_str(&lines[start][..start_at]);
    replacement.push_str(&op.text);
    replacement.push_str(&lines[end][end_at..]);

    lines.splice(start..=end, replacement.split('\n').map(str::to_string));
    lines.join("\n")
}
