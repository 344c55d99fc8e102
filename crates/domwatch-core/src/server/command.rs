//! Control-plane command grammar
//!
//! A command line is a sequence of whitespace-delimited tokens. The first
//! token is the case-insensitive command name and the rest are positional
//! parameters. Only the first parameter is ever used; extras are ignored.

/// A parsed control-plane command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `AUTH <token>`
    Auth(Option<String>),

    /// `ADD <domain>`
    Add(Option<String>),

    /// `REMOVE <domain>`
    Remove(Option<String>),

    /// `LIST`
    List,

    /// `EXIT`, `QUIT` or `CLOSE`
    Close,

    /// Anything else, kept for logging
    Unknown(String),
}

impl Command {
    /// Parse one line
    ///
    /// Returns `None` for a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next()?.to_ascii_uppercase();
        let param = tokens.next().map(str::to_string);

        let command = match name.as_str() {
            "AUTH" => Command::Auth(param),
            "ADD" => Command::Add(param),
            "REMOVE" => Command::Remove(param),
            "LIST" => Command::List,
            "EXIT" | "QUIT" | "CLOSE" => Command::Close,
            _ => Command::Unknown(name),
        };

        Some(command)
    }

    /// The command name as it appears on the wire
    pub fn name(&self) -> &str {
        match self {
            Command::Auth(_) => "AUTH",
            Command::Add(_) => "ADD",
            Command::Remove(_) => "REMOVE",
            Command::List => "LIST",
            Command::Close => "CLOSE",
            Command::Unknown(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_case_insensitive() {
        assert_eq!(
            Command::parse("add example.com"),
            Some(Command::Add(Some("example.com".to_string())))
        );
        assert_eq!(Command::parse("LiSt"), Some(Command::List));
        assert_eq!(Command::parse("quit"), Some(Command::Close));
    }

    #[test]
    fn test_parameters_keep_their_case() {
        assert_eq!(
            Command::parse("AUTH S3cret"),
            Some(Command::Auth(Some("S3cret".to_string())))
        );
    }

    #[test]
    fn test_blank_and_crlf_lines() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse(" \t\r"), None);
        assert_eq!(Command::parse("LIST\r"), Some(Command::List));
    }

    #[test]
    fn test_missing_and_extra_parameters() {
        assert_eq!(Command::parse("REMOVE"), Some(Command::Remove(None)));
        assert_eq!(
            Command::parse("ADD a.com b.com"),
            Some(Command::Add(Some("a.com".to_string())))
        );
    }

    #[test]
    fn test_unknown_command() {
        let command = Command::parse("frobnicate now").unwrap();
        assert_eq!(command, Command::Unknown("FROBNICATE".to_string()));
        assert_eq!(command.name(), "FROBNICATE");
    }
}
