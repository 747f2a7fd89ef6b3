//! Command tag reported by `CommandComplete`.
use bytes::BufMut;

use super::ProtocolError;

/// SQL command kind whose completion is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandType {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    Move,
    Fetch,
    Copy,
}

impl CommandType {
    /// Verb as it appears in the command tag.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Merge => "MERGE",
            Self::Move => "MOVE",
            Self::Fetch => "FETCH",
            Self::Copy => "COPY",
        }
    }

    /// Parse verb, case insensitive.
    pub fn parse(verb: &str) -> Option<CommandType> {
        const ALL: [CommandType; 8] = [
            CommandType::Select,
            CommandType::Insert,
            CommandType::Update,
            CommandType::Delete,
            CommandType::Merge,
            CommandType::Move,
            CommandType::Fetch,
            CommandType::Copy,
        ];
        ALL.into_iter().find(|ty| ty.as_str().eq_ignore_ascii_case(verb))
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Length of `<VERB> [0 ]<rows>` excluding nul.
///
/// `INSERT` carries an extra oid, which is always zero since postgres 12.
pub(crate) fn tag_len(command: CommandType, rows: u64) -> usize {
    let oid = if matches!(command, CommandType::Insert) { 2 } else { 0 };
    command.as_str().len() + 1 + oid + itoa::Buffer::new().format(rows).len()
}

/// Write `<VERB> [0 ]<rows>` excluding nul.
pub(crate) fn put_tag(mut buf: impl BufMut, command: CommandType, rows: u64) {
    buf.put_slice(command.as_str().as_bytes());
    buf.put_u8(b' ');
    if matches!(command, CommandType::Insert) {
        buf.put_slice(b"0 ");
    }
    buf.put_slice(itoa::Buffer::new().format(rows).as_bytes());
}

/// Parse `<VERB> [<oid> ]<rows>`.
///
/// The last token is the row count, the text is kept in the error for diagnostics.
pub fn parse_tag(tag: &str) -> Result<(CommandType, u64), ProtocolError> {
    let invalid = || ProtocolError::InvalidCommandTag(tag.to_owned());

    let mut tokens = tag.split(' ');
    let verb = tokens.next().ok_or_else(invalid)?;
    let rows = tokens.next_back().ok_or_else(invalid)?;

    let command = CommandType::parse(verb).ok_or_else(invalid)?;
    let rows = rows.parse().map_err(|_| invalid())?;
    Ok((command, rows))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn write_tag() {
        let mut buf = Vec::new();
        put_tag(&mut buf, CommandType::Insert, 1);
        assert_eq!(buf, b"INSERT 0 1");
        assert_eq!(tag_len(CommandType::Insert, 1), buf.len());

        let mut buf = Vec::new();
        put_tag(&mut buf, CommandType::Select, 120);
        assert_eq!(buf, b"SELECT 120");
        assert_eq!(tag_len(CommandType::Select, 120), buf.len());
    }

    #[test]
    fn read_tag() {
        assert_eq!(parse_tag("SELECT 3").unwrap(), (CommandType::Select, 3));
        assert_eq!(parse_tag("insert 0 5").unwrap(), (CommandType::Insert, 5));
        assert!(matches!(parse_tag("SELECT"), Err(ProtocolError::InvalidCommandTag(t)) if t == "SELECT"));
        assert!(matches!(parse_tag("CREATE TABLE"), Err(ProtocolError::InvalidCommandTag(_))));
        assert!(matches!(parse_tag("DELETE x"), Err(ProtocolError::InvalidCommandTag(_))));
    }
}
