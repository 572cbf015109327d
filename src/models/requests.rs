//! Request models
//!
//! Commands decoded from the memcache text protocol.

use bytes::Bytes;

/// A decoded client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `get <key>+`
    Get { keys: Vec<Bytes> },
    /// `gets <key>+`
    Gets { keys: Vec<Bytes> },
    /// `set <key> <flags> <exptime> <bytes> [noreply]`
    Set {
        key: Bytes,
        flags: u32,
        exptime: u64,
        value: Bytes,
        noreply: bool,
    },
    /// `cas <key> <flags> <exptime> <bytes> <cas unique> [noreply]`
    Cas {
        key: Bytes,
        flags: u32,
        exptime: u64,
        cas: u64,
        value: Bytes,
        noreply: bool,
    },
    /// `delete <key> [noreply]`
    Delete { key: Bytes, noreply: bool },
}

impl Command {
    /// Command name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Get { .. } => "get",
            Command::Gets { .. } => "gets",
            Command::Set { .. } => "set",
            Command::Cas { .. } => "cas",
            Command::Delete { .. } => "delete",
        }
    }

    /// True when the client asked for no response.
    pub fn is_noreply(&self) -> bool {
        match self {
            Command::Set { noreply, .. }
            | Command::Cas { noreply, .. }
            | Command::Delete { noreply, .. } => *noreply,
            Command::Get { .. } | Command::Gets { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noreply_only_for_mutations() {
        let set = Command::Set {
            key: Bytes::from("k"),
            flags: 0,
            exptime: 0,
            value: Bytes::from("v"),
            noreply: true,
        };
        let get = Command::Get {
            keys: vec![Bytes::from("k")],
        };

        assert!(set.is_noreply());
        assert!(!get.is_noreply());
        assert_eq!(set.name(), "set");
        assert_eq!(get.name(), "get");
    }

    #[test]
    fn test_delete_noreply() {
        let delete = Command::Delete {
            key: Bytes::from("k"),
            noreply: false,
        };
        assert!(!delete.is_noreply());
        assert_eq!(delete.name(), "delete");
    }
}
