//! Grammar of the line protocol.
//!
//! ```text
//! help | show | save | defaults
//! ping | ping in
//! autosave on|off
//! set offset|min|max <int>
//! crop l|r|t|b <int>
//! ```
//!
//! Keywords are case-insensitive and values are decimal integers. Range
//! checking is not done here: out-of-range values are clamped by the
//! settings setters.
use crate::settings::CropSide;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetKey {
    Offset,
    MinArea,
    MaxArea,
}

impl SetKey {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "offset" => Some(SetKey::Offset),
            "min" | "mina" => Some(SetKey::MinArea),
            "max" | "maxa" => Some(SetKey::MaxArea),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Show,
    Save,
    Defaults,
    Ping,
    PingInput,
    AutoSave(bool),
    Set(SetKey, i64),
    Crop(CropSide, i64),
}

pub const SET_USAGE: &str = "usage: set offset|min|max <value>";
pub const CROP_USAGE: &str = "usage: crop l|r|t|b <value>";
pub const AUTOSAVE_USAGE: &str = "usage: autosave on|off";
pub const PING_USAGE: &str = "usage: ping [in]";

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("{0}")]
    Usage(&'static str),
}

/// Parse one line. Surrounding whitespace and case are ignored.
pub fn parse_line(line: &str) -> Result<Command, ParseError> {
    let line = line.trim().to_ascii_lowercase();
    let mut tokens = line.split_whitespace();
    let verb = tokens.next().ok_or(ParseError::Empty)?;
    let args: Vec<&str> = tokens.collect();

    let cmd = match (verb, args.as_slice()) {
        ("help" | "?", []) => Command::Help,
        ("show", []) => Command::Show,
        ("save", []) => Command::Save,
        ("defaults", []) => Command::Defaults,
        ("ping", []) => Command::Ping,
        ("ping", ["in"]) => Command::PingInput,
        ("ping", _) => return Err(ParseError::Usage(PING_USAGE)),
        ("autosave", ["on"]) => Command::AutoSave(true),
        ("autosave", ["off"]) => Command::AutoSave(false),
        ("autosave", _) => return Err(ParseError::Usage(AUTOSAVE_USAGE)),
        ("set", [key, value]) => {
            let key = SetKey::parse(key).ok_or(ParseError::Usage(SET_USAGE))?;
            Command::Set(key, parse_value(value, SET_USAGE)?)
        }
        ("set", _) => return Err(ParseError::Usage(SET_USAGE)),
        ("crop", [side, value]) => {
            let side = CropSide::parse(side).ok_or(ParseError::Usage(CROP_USAGE))?;
            Command::Crop(side, parse_value(value, CROP_USAGE)?)
        }
        ("crop", _) => return Err(ParseError::Usage(CROP_USAGE)),
        (other, _) => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(cmd)
}

fn parse_value(token: &str, usage: &'static str) -> Result<i64, ParseError> {
    token.parse::<i64>().map_err(|_| ParseError::Usage(usage))
}
