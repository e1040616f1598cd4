//! Response status codes and the code-to-text catalog

use std::collections::BTreeMap;
use std::fmt;

use crate::protocol::EOL;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusCode {
    Ok,
    BadEol,
    BadRequest,
    InternalError,
    InvalidCommand,
    InvalidArguments,
    FileNotFound,
    BadOffset,
}

impl StatusCode {
    pub const ALL: [StatusCode; 8] = [
        StatusCode::Ok,
        StatusCode::BadEol,
        StatusCode::BadRequest,
        StatusCode::InternalError,
        StatusCode::InvalidCommand,
        StatusCode::InvalidArguments,
        StatusCode::FileNotFound,
        StatusCode::BadOffset,
    ];

    /// Numeric code sent on the wire
    pub fn code(self) -> u16 {
        match self {
            StatusCode::Ok => 0,
            StatusCode::BadEol => 100,
            StatusCode::BadRequest => 101,
            StatusCode::InternalError => 199,
            StatusCode::InvalidCommand => 200,
            StatusCode::InvalidArguments => 201,
            StatusCode::FileNotFound => 202,
            StatusCode::BadOffset => 203,
        }
    }

    pub fn default_text(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadEol => "BAD EOL",
            StatusCode::BadRequest => "BAD REQUEST",
            StatusCode::InternalError => "INTERNAL SERVER ERROR",
            StatusCode::InvalidCommand => "NO SUCH COMMAND",
            StatusCode::InvalidArguments => "INVALID ARGUMENTS FOR COMMAND",
            StatusCode::FileNotFound => "FILE NOT FOUND",
            StatusCode::BadOffset => "OFFSET EXCEEDS FILE SIZE",
        }
    }

    /// Symbolic name, as used for `[status]` keys in the config file
    pub fn symbol(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadEol => "BAD_EOL",
            StatusCode::BadRequest => "BAD_REQUEST",
            StatusCode::InternalError => "INTERNAL_ERROR",
            StatusCode::InvalidCommand => "INVALID_COMMAND",
            StatusCode::InvalidArguments => "INVALID_ARGUMENTS",
            StatusCode::FileNotFound => "FILE_NOT_FOUND",
            StatusCode::BadOffset => "BAD_OFFSET",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<StatusCode> {
        StatusCode::ALL.into_iter().find(|s| s.symbol() == symbol)
    }

    /// Codes in 100..200 terminate the connection after being sent
    pub fn is_fatal(self) -> bool {
        (100..200).contains(&self.code())
    }

    pub fn from_code(code: u16) -> Option<StatusCode> {
        StatusCode::ALL.into_iter().find(|s| s.code() == code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.default_text())
    }
}

/// Maps status codes to the human-readable text of the status line.
///
/// Numeric codes are fixed; only texts can be replaced (from the `[status]`
/// table of the config file).
#[derive(Clone, Debug, Default)]
pub struct StatusCatalog {
    overrides: BTreeMap<StatusCode, String>,
}

impl StatusCatalog {
    pub fn new(overrides: BTreeMap<StatusCode, String>) -> Self {
        Self { overrides }
    }

    pub fn text(&self, status: StatusCode) -> &str {
        self.overrides
            .get(&status)
            .map(String::as_str)
            .unwrap_or_else(|| status.default_text())
    }

    /// `<code> <text>\r\n`
    pub fn status_line(&self, status: StatusCode) -> String {
        format!("{} {}{}", status.code(), self.text(status), EOL)
    }
}
