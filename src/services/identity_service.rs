use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Render an index in the bijective base-26 sequence A, B, ..., Z, AA, AB, ...
pub fn identifier_for_index(index: u64) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Inverse of [`identifier_for_index`]. `None` for anything but uppercase ASCII letters.
pub fn index_for_identifier(identifier: &str) -> Option<u64> {
    if identifier.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for b in identifier.bytes() {
        if !b.is_ascii_uppercase() {
            return None;
        }
        n = n.checked_mul(26)?.checked_add((b - b'A') as u64 + 1)?;
    }
    Some(n - 1)
}

/// Hands out short spreadsheet-style identifiers to connections.
///
/// The lowest free identifier is always issued first, so a freed `A` comes back
/// before a fresh `C`. Lookups in both directions are hash map reads.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    by_conn: HashMap<Uuid, String>,
    by_identifier: HashMap<String, Uuid>,
    /// Released indices below `next_index`.
    free: BTreeSet<u64>,
    next_index: u64,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the smallest free identifier. A connection that already holds one keeps it.
    pub fn assign(&mut self, conn_id: Uuid) -> String {
        if let Some(existing) = self.by_conn.get(&conn_id) {
            return existing.clone();
        }

        let index = match self.free.pop_first() {
            Some(index) => index,
            None => {
                let index = self.next_index;
                self.next_index += 1;
                index
            }
        };

        let identifier = identifier_for_index(index);
        self.by_conn.insert(conn_id, identifier.clone());
        self.by_identifier.insert(identifier.clone(), conn_id);
        identifier
    }

    /// Forget the connection. Unknown connections are ignored.
    pub fn release(&mut self, conn_id: &Uuid) -> Option<String> {
        let identifier = self.by_conn.remove(conn_id)?;
        self.by_identifier.remove(&identifier);

        if let Some(index) = index_for_identifier(&identifier) {
            self.free.insert(index);
            // Shrink the high-water mark while the top of the range is free.
            while self.next_index > 0 && self.free.remove(&(self.next_index - 1)) {
                self.next_index -= 1;
            }
        }
        Some(identifier)
    }

    pub fn lookup(&self, conn_id: &Uuid) -> Option<&str> {
        self.by_conn.get(conn_id).map(String::as_str)
    }

    pub fn lookup_connection(&self, identifier: &str) -> Option<Uuid> {
        self.by_identifier.get(identifier).copied()
    }

    pub fn len(&self) -> usize {
        self.by_conn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_conn.is_empty()
    }
}
