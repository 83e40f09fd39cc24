//! Status page scraping.
//!
//! The strip's root page embeds its state in an inline script:
//!
//! ```text
//! var sockstates = [1,0,0,1];
//! ...
//! var mac= "AABBCCDDEEFF";
//! ```
//!
//! Both markers must be present for the page to be usable.

use labrack_domain::channel::ChannelState;
use labrack_domain::error::ParseError;

pub const SOCKET_COUNT: usize = 4;

const SOCKSTATES_MARKER: &str = "sockstates = [";
const MAC_MARKER: &str = "mac= \"";
const MAC_LEN: usize = 12;

/// Socket states and identity scraped from the status page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripStatus {
    /// Socket 1 first.
    pub sockets: [ChannelState; SOCKET_COUNT],
    /// Twelve upper- or lower-case hex digits, no separators.
    pub mac: String,
}

impl std::fmt::Display for StripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MAC: {}", self.mac)?;
        for (index, state) in self.sockets.iter().enumerate() {
            write!(f, "\n  socket {}: {state}", index + 1)?;
        }
        Ok(())
    }
}

/// Extract the socket states and MAC address from a status page body.
///
/// # Errors
///
/// Returns [`ParseError::MissingMarker`] when either marker is absent and
/// [`ParseError::UnexpectedToken`] when a marker is followed by something
/// that is not a four-flag list or a twelve-digit MAC.
pub fn parse_status(body: &str) -> Result<StripStatus, ParseError> {
    Ok(StripStatus {
        sockets: parse_sockets(body)?,
        mac: parse_mac(body)?,
    })
}

fn after<'a>(body: &'a str, marker: &'static str) -> Result<&'a str, ParseError> {
    body.find(marker)
        .map(|start| &body[start + marker.len()..])
        .ok_or(ParseError::MissingMarker { marker })
}

fn parse_sockets(body: &str) -> Result<[ChannelState; SOCKET_COUNT], ParseError> {
    let rest = after(body, SOCKSTATES_MARKER)?;
    let list = rest
        .split_once(']')
        .map(|(list, _)| list)
        .ok_or_else(|| unexpected(rest))?;

    let mut sockets = [ChannelState::Unknown; SOCKET_COUNT];
    let mut flags = list.split(',').map(str::trim);
    for slot in &mut sockets {
        *slot = match flags.next() {
            Some("1") => ChannelState::On,
            Some("0") => ChannelState::Off,
            _ => return Err(unexpected(list)),
        };
    }
    if flags.next().is_some() {
        return Err(unexpected(list));
    }
    Ok(sockets)
}

fn parse_mac(body: &str) -> Result<String, ParseError> {
    let rest = after(body, MAC_MARKER)?;
    let mac = rest.get(..MAC_LEN).ok_or_else(|| unexpected(rest))?;
    if !mac.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(unexpected(mac));
    }
    Ok(mac.to_string())
}

fn unexpected(token: &str) -> ParseError {
    ParseError::UnexpectedToken {
        token: token.chars().take(32).collect(),
    }
}
