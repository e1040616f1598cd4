//! Request line parsing and the static command table

use crate::protocol::{command, EOL};

/// A parsed request line. `name` is empty only for a blank line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

/// The line still carried a delimiter or a bare line feed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BadEol;

pub fn parse(line: &str) -> Result<Command, BadEol> {
    if line.contains(EOL) || line.contains('\n') {
        return Err(BadEol);
    }
    let mut tokens = line.split(is_separator).filter(|t| !t.is_empty());
    let name = tokens.next().unwrap_or_default().to_string();
    let args = tokens.map(str::to_string).collect();
    Ok(Command { name, args })
}

/// Argument separators: Unicode whitespace plus the ASCII information
/// separators 0x1C-0x1F.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

/// Parse a whole batch; the first malformed line rejects all of it.
pub fn parse_batch(lines: &[String]) -> Result<Vec<Command>, BadEol> {
    lines.iter().map(|l| parse(l)).collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    GetFileListing,
    GetMetadata,
    GetSlice,
    Quit,
}

// name -> kind; arity lives on the kind
const TABLE: [(&str, CommandKind); 4] = [
    (command::GET_FILE_LISTING, CommandKind::GetFileListing),
    (command::GET_METADATA, CommandKind::GetMetadata),
    (command::GET_SLICE, CommandKind::GetSlice),
    (command::QUIT, CommandKind::Quit),
];

impl CommandKind {
    pub fn lookup(name: &str) -> Option<CommandKind> {
        TABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, kind)| *kind)
    }

    pub fn arity(self) -> usize {
        match self {
            CommandKind::GetFileListing => 0,
            CommandKind::GetMetadata => 1,
            CommandKind::GetSlice => 3,
            CommandKind::Quit => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::GetFileListing => command::GET_FILE_LISTING,
            CommandKind::GetMetadata => command::GET_METADATA,
            CommandKind::GetSlice => command::GET_SLICE,
            CommandKind::Quit => command::QUIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_and_args() {
        let cmd = parse("get_slice  a.txt 6\t5").unwrap();
        assert_eq!(cmd.name, "get_slice");
        assert_eq!(cmd.args, vec!["a.txt", "6", "5"]);
    }

    #[test]
    fn test_parse_blank_line() {
        let cmd = parse("   ").unwrap();
        assert!(cmd.name.is_empty());
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn test_parse_splits_on_information_separators() {
        let cmd = parse("quit\x1f").unwrap();
        assert_eq!(cmd.name, "quit");
        assert!(cmd.args.is_empty());
        let cmd = parse("get_metadata\x1ca.txt").unwrap();
        assert_eq!(cmd.name, "get_metadata");
        assert_eq!(cmd.args, vec!["a.txt"]);
        let cmd = parse("get_slice\x1da.txt\x1e0\x0b5").unwrap();
        assert_eq!(cmd.args, vec!["a.txt", "0", "5"]);
    }

    #[test]
    fn test_parse_embedded_newline_is_bad_eol() {
        assert_eq!(parse("quit\nquit"), Err(BadEol));
        assert_eq!(parse("quit\r\n"), Err(BadEol));
        assert!(parse("quit\r").is_ok());
    }

    #[test]
    fn test_parse_batch_fails_on_any_line() {
        let lines = vec!["get_file_listing".to_string(), "a\nb".to_string()];
        assert_eq!(parse_batch(&lines), Err(BadEol));
    }

    #[test]
    fn test_table_lookup_and_arity() {
        assert_eq!(CommandKind::lookup("get_slice"), Some(CommandKind::GetSlice));
        assert_eq!(CommandKind::GetSlice.arity(), 3);
        assert_eq!(CommandKind::GetMetadata.arity(), 1);
        assert_eq!(CommandKind::lookup("GET_SLICE"), None);
        assert_eq!(CommandKind::lookup(""), None);
        for (name, kind) in TABLE {
            assert_eq!(kind.name(), name);
        }
    }
}
