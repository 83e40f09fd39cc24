//! Confirmed switch: bounded retry-until-verified channel state transition.
//!
//! Each attempt reads the channel; if it already shows the desired state the
//! switch succeeds with the number of attempts used, otherwise one write is
//! issued and the next attempt starts. Devices reached over HTTP/TCP drop
//! commands now and then, so success is defined by *observing* the target
//! state, never by assuming it.
//!
//! Running out of attempts is not an error: it is reported as
//! [`SwitchOutcome::Unconfirmed`] and logged, and callers treat the whole
//! operation as best effort.

use std::time::Duration;

use labrack_domain::channel::{ChannelState, PowerState};
use labrack_domain::error::LabRackError;

use crate::ports::ChannelAdapter;

/// Bounds of one confirmed switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Read attempts before giving up (each but the last may be followed by a write).
    pub max_attempts: u32,
    /// Upper bound on any single adapter call.
    ///
    /// Adapters are expected to finish well within it: a call still running
    /// when it expires is cancelled and counts as a failed attempt. Cancelling
    /// must leave the adapter usable, and the daemon refuses a configuration
    /// whose bound does not exceed the bench supply's worst case
    /// (`3 * timeout_ms + settle_ms`).
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Build a policy; at least one attempt is always made.
    #[must_use]
    pub fn new(max_attempts: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            attempt_timeout,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            attempt_timeout: Duration::from_secs(15),
        }
    }
}

/// Result of a confirmed switch that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The channel was observed in the desired state.
    Confirmed { attempts: u32 },
    /// The desired state was never observed.
    Unconfirmed {
        attempts: u32,
        last_observed: ChannelState,
    },
}

impl SwitchOutcome {
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Confirmed { attempts } | Self::Unconfirmed { attempts, .. } => *attempts,
        }
    }

    /// Channel state as last seen during the switch.
    #[must_use]
    pub fn observed(&self, target: PowerState) -> ChannelState {
        match self {
            Self::Confirmed { .. } => target.into(),
            Self::Unconfirmed { last_observed, .. } => *last_observed,
        }
    }
}

/// Retry-until-verified state transition, reusable across every adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmedSwitch {
    policy: RetryPolicy,
}

impl ConfirmedSwitch {
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Drive `channel` of `adapter` to `target`.
    ///
    /// A read that times out or returns an unparseable payload counts as
    /// [`ChannelState::Unknown`] and the retry loop goes on.
    ///
    /// # Errors
    ///
    /// Returns [`LabRackError::Validation`] without touching the adapter when
    /// `channel` is outside the device's range, and
    /// [`LabRackError::Connectivity`] as soon as the device is unreachable.
    #[tracing::instrument(
        skip(self, adapter),
        fields(device = %adapter.device_name())
    )]
    pub async fn apply<A: ChannelAdapter>(
        &self,
        adapter: &mut A,
        channel: u8,
        target: PowerState,
    ) -> Result<SwitchOutcome, LabRackError> {
        if let Err(err) = adapter.channels().check(channel) {
            tracing::warn!(
                device = adapter.device_name(),
                channel,
                error = %err,
                "channel not supported"
            );
            return Err(err.into());
        }

        let mut last_observed = ChannelState::Unknown;
        for attempt in 1..=self.policy.max_attempts {
            last_observed = self.observe(adapter, channel).await?;
            if last_observed.matches(target) {
                tracing::info!(
                    device = adapter.device_name(),
                    channel,
                    attempts = attempt,
                    "channel turned {target}"
                );
                return Ok(SwitchOutcome::Confirmed { attempts: attempt });
            }

            tracing::debug!(
                channel,
                attempt,
                observed = %last_observed,
                "requesting {target}"
            );
            self.request(adapter, channel, target).await?;
        }

        tracing::error!(
            device = adapter.device_name(),
            channel,
            attempts = self.policy.max_attempts,
            observed = %last_observed,
            "could not turn channel {target}"
        );
        Ok(SwitchOutcome::Unconfirmed {
            attempts: self.policy.max_attempts,
            last_observed,
        })
    }

    async fn observe<A: ChannelAdapter>(
        &self,
        adapter: &mut A,
        channel: u8,
    ) -> Result<ChannelState, LabRackError> {
        match tokio::time::timeout(self.policy.attempt_timeout, adapter.read_state(channel)).await
        {
            Ok(Ok(state)) => Ok(state),
            Ok(Err(LabRackError::Parse(err))) => {
                tracing::warn!(channel, error = %err, "channel state unreadable");
                Ok(ChannelState::Unknown)
            }
            Ok(Err(err)) => Err(err),
            Err(_) => {
                tracing::warn!(
                    channel,
                    timeout = ?self.policy.attempt_timeout,
                    "channel state read timed out"
                );
                Ok(ChannelState::Unknown)
            }
        }
    }

    async fn request<A: ChannelAdapter>(
        &self,
        adapter: &mut A,
        channel: u8,
        target: PowerState,
    ) -> Result<(), LabRackError> {
        match tokio::time::timeout(
            self.policy.attempt_timeout,
            adapter.write_state(channel, target),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) if err.is_connectivity() => Err(err),
            Ok(Err(err)) => {
                tracing::warn!(channel, error = %err, "channel write rejected");
                Ok(())
            }
            Err(_) => {
                tracing::warn!(channel, "channel write timed out");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Behaviour, FakeAdapter};

    fn switch() -> ConfirmedSwitch {
        ConfirmedSwitch::new(RetryPolicy::default())
    }

    #[tokio::test]
    async fn should_not_write_when_first_read_matches() {
        let mut adapter = FakeAdapter::new("strip", 1, 4, ChannelState::On);

        let outcome = switch()
            .apply(&mut adapter, 2, PowerState::On)
            .await
            .unwrap();

        assert_eq!(outcome, SwitchOutcome::Confirmed { attempts: 1 });
        assert_eq!(adapter.reads, 1);
        assert!(adapter.writes.is_empty());
    }

    #[tokio::test]
    async fn should_confirm_on_second_attempt_with_fault_free_adapter() {
        let mut adapter = FakeAdapter::new("psu", 1, 3, ChannelState::Off);

        let outcome = switch()
            .apply(&mut adapter, 1, PowerState::On)
            .await
            .unwrap();

        assert_eq!(outcome, SwitchOutcome::Confirmed { attempts: 2 });
        assert_eq!(adapter.writes, vec![(1, PowerState::On)]);
        assert_eq!(adapter.state(1), ChannelState::On);
    }

    #[tokio::test]
    async fn should_absorb_dropped_writes_within_four_attempts() {
        let mut adapter =
            FakeAdapter::new("psu", 1, 3, ChannelState::On).behaving(Behaviour::DropWrites(2));

        let outcome = switch()
            .apply(&mut adapter, 3, PowerState::Off)
            .await
            .unwrap();

        assert_eq!(outcome, SwitchOutcome::Confirmed { attempts: 4 });
        assert_eq!(adapter.writes.len(), 3);
    }

    #[tokio::test]
    async fn should_report_unconfirmed_when_state_never_converges() {
        let mut adapter =
            FakeAdapter::new("strip", 1, 4, ChannelState::On).behaving(Behaviour::IgnoreWrites);

        let outcome = switch()
            .apply(&mut adapter, 1, PowerState::Off)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SwitchOutcome::Unconfirmed {
                attempts: 4,
                last_observed: ChannelState::On
            }
        );
        assert_eq!(adapter.reads, 4);
        assert_eq!(adapter.writes.len(), 4);
        assert!(!outcome.is_confirmed());
    }

    #[tokio::test]
    async fn should_reject_out_of_range_channel_without_calls() {
        let mut adapter = FakeAdapter::new("psu", 1, 3, ChannelState::Off);

        let result = switch().apply(&mut adapter, 4, PowerState::On).await;

        assert!(matches!(result, Err(LabRackError::Validation(_))));
        assert_eq!(adapter.calls(), 0);
    }

    #[tokio::test]
    async fn should_propagate_connectivity_error() {
        let mut adapter =
            FakeAdapter::new("psu", 1, 3, ChannelState::Off).behaving(Behaviour::Unreachable);

        let result = switch().apply(&mut adapter, 1, PowerState::On).await;

        assert!(matches!(result, Err(LabRackError::Connectivity(_))));
        assert_eq!(adapter.reads, 1);
    }

    #[tokio::test]
    async fn should_treat_unparseable_reads_as_unknown_and_keep_trying() {
        let mut adapter =
            FakeAdapter::new("strip", 1, 4, ChannelState::Off).behaving(Behaviour::Garbled);

        let outcome = switch()
            .apply(&mut adapter, 1, PowerState::On)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SwitchOutcome::Unconfirmed {
                attempts: 4,
                last_observed: ChannelState::Unknown
            }
        );
        assert_eq!(adapter.writes.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn should_bound_stalled_reads_with_attempt_timeout() {
        let mut adapter =
            FakeAdapter::new("psu", 1, 3, ChannelState::Off).behaving(Behaviour::Stalls);
        let switch = ConfirmedSwitch::new(RetryPolicy::new(2, Duration::from_secs(3)));

        let outcome = switch
            .apply(&mut adapter, 1, PowerState::On)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SwitchOutcome::Unconfirmed {
                attempts: 2,
                last_observed: ChannelState::Unknown
            }
        );
    }

    #[test]
    fn should_always_make_at_least_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn should_report_observed_state() {
        let confirmed = SwitchOutcome::Confirmed { attempts: 1 };
        assert_eq!(confirmed.observed(PowerState::Off), ChannelState::Off);

        let unconfirmed = SwitchOutcome::Unconfirmed {
            attempts: 4,
            last_observed: ChannelState::Unknown,
        };
        assert_eq!(unconfirmed.observed(PowerState::Off), ChannelState::Unknown);
        assert_eq!(unconfirmed.attempts(), 4);
    }
}
