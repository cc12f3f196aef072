// crates/lyt-core/src/strings.rs
use crate::{ArchiveError, Result};

/// Name offset meaning "no name" in pane and widget records.
pub const NO_NAME: u32 = u32::MAX;

/// Handle to a name stored in a [`StringTable`].
///
/// Only meaningful together with the table that produced it, i.e. the
/// owning layout's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NameRef {
    start: u32,
    len: u32,
}

impl NameRef {
    pub const EMPTY: NameRef = NameRef { start: 0, len: 0 };

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Owned string arena for every pane and widget name of one layout.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    text: String,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> NameRef {
        if name.is_empty() {
            return NameRef::EMPTY;
        }
        let start = self.text.len() as u32;
        self.text.push_str(name);
        NameRef {
            start,
            len: name.len() as u32,
        }
    }

    pub fn get(&self, name: NameRef) -> &str {
        let start = name.start as usize;
        self.text.get(start..start + name.len as usize).unwrap_or("")
    }

    pub fn byte_len(&self) -> usize {
        self.text.len()
    }
}

/// Read the NUL-terminated UTF-8 string at `offset` in a raw archive string table.
pub(crate) fn read_name(table: &[u8], offset: u32) -> Result<&str> {
    if offset == NO_NAME {
        return Ok("");
    }
    let tail = table
        .get(offset as usize..)
        .ok_or(ArchiveError::BadName { offset })?;
    let end = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or(ArchiveError::BadName { offset })?;
    std::str::from_utf8(&tail[..end]).map_err(|_| ArchiveError::BadName { offset })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_get() {
        let mut table = StringTable::new();
        let a = table.intern("N_Root");
        let b = table.intern("P_Icon");
        let empty = table.intern("");

        assert_eq!(table.get(a), "N_Root");
        assert_eq!(table.get(b), "P_Icon");
        assert!(empty.is_empty());
        assert_eq!(table.get(empty), "");
    }

    #[test]
    fn test_read_name() {
        let raw = b"root\0child\0";
        assert_eq!(read_name(raw, 0).unwrap(), "root");
        assert_eq!(read_name(raw, 5).unwrap(), "child");
        assert_eq!(read_name(raw, NO_NAME).unwrap(), "");
    }

    #[test]
    fn test_read_name_rejects_bad_offsets() {
        let raw = b"root\0open";
        assert!(matches!(read_name(raw, 40), Err(ArchiveError::BadName { offset: 40 })));
        // No terminator after "open".
        assert!(matches!(read_name(raw, 5), Err(ArchiveError::BadName { offset: 5 })));
        assert!(matches!(read_name(b"\xFF\0", 0), Err(ArchiveError::BadName { offset: 0 })));
    }
}
