//! In-memory channel adapter with injectable misbehaviour, shared by the
//! use-case tests.

use std::time::Duration;

use labrack_domain::channel::{ChannelRange, ChannelState, PowerState};
use labrack_domain::error::{LabRackError, ParseError};

use crate::ports::ChannelAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behaviour {
    /// Writes take effect immediately.
    Obedient,
    /// The first `n` writes are silently dropped.
    DropWrites(u32),
    /// Writes never take effect.
    IgnoreWrites,
    /// Every call fails with a connectivity error.
    Unreachable,
    /// Reads return a payload that cannot be parsed; writes work.
    Garbled,
    /// Reads never complete.
    Stalls,
}

pub(crate) struct FakeAdapter {
    name: String,
    range: ChannelRange,
    behaviour: Behaviour,
    pub states: Vec<ChannelState>,
    pub reads: u32,
    pub writes: Vec<(u8, PowerState)>,
}

impl FakeAdapter {
    pub(crate) fn new(name: &str, first: u8, last: u8, initial: ChannelState) -> Self {
        let range = ChannelRange::new(first, last).unwrap();
        Self {
            name: name.to_string(),
            range,
            behaviour: Behaviour::Obedient,
            states: vec![initial; range.len()],
            reads: 0,
            writes: Vec::new(),
        }
    }

    pub(crate) fn behaving(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub(crate) fn state(&self, channel: u8) -> ChannelState {
        self.states[self.range.offset(channel).unwrap()]
    }

    pub(crate) fn calls(&self) -> usize {
        self.reads as usize + self.writes.len()
    }
}

pub(crate) fn unreachable() -> LabRackError {
    LabRackError::Connectivity(Box::new(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    )))
}

impl ChannelAdapter for FakeAdapter {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn channels(&self) -> ChannelRange {
        self.range
    }

    async fn read_state(&mut self, channel: u8) -> Result<ChannelState, LabRackError> {
        self.reads += 1;
        match self.behaviour {
            Behaviour::Unreachable => Err(unreachable()),
            Behaviour::Garbled => Err(ParseError::MissingMarker {
                marker: "sockstates",
            }
            .into()),
            Behaviour::Stalls => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(ChannelState::Unknown)
            }
            _ => Ok(self.state(channel)),
        }
    }

    async fn write_state(&mut self, channel: u8, desired: PowerState) -> Result<(), LabRackError> {
        self.writes.push((channel, desired));
        let offset = self.range.offset(channel).unwrap();
        match self.behaviour {
            Behaviour::Unreachable => return Err(unreachable()),
            Behaviour::IgnoreWrites => {}
            Behaviour::DropWrites(n) if self.writes.len() <= n as usize => {}
            _ => self.states[offset] = desired.into(),
        }
        Ok(())
    }
}
