//! Power scheduler: the rack state machine fed by clock ticks and overrides.
//!
//! The scheduler is the only writer of [`RackState`]. The flag guards every
//! transition: power-off only runs while powered, power-on only while
//! unpowered, so a trigger minute spanning many polling ticks fires once.
//!
//! On rest days the rack is powered off once per calendar date. The latch is
//! taken on the first tick of the date whatever the rack state, so an
//! operator who powers the rack on over the weekend keeps it on until the
//! evening trigger or the next date.

use chrono::{NaiveDate, NaiveDateTime};
use labrack_domain::rack::{PowerAction, RackState};
use labrack_domain::schedule::WeeklySchedule;

use crate::ports::RackPower;

pub struct PowerScheduler<R> {
    schedule: WeeklySchedule,
    rack: R,
    state: RackState,
    rest_day_seen: Option<NaiveDate>,
}

impl<R: RackPower> PowerScheduler<R> {
    /// New scheduler for `rack`, assumed [`RackState::Powered`] at startup.
    pub fn new(schedule: WeeklySchedule, rack: R) -> Self {
        Self::with_state(schedule, rack, RackState::default())
    }

    pub fn with_state(schedule: WeeklySchedule, rack: R, state: RackState) -> Self {
        Self {
            schedule,
            rack,
            state,
            rest_day_seen: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> RackState {
        self.state
    }

    #[must_use]
    pub fn schedule(&self) -> &WeeklySchedule {
        &self.schedule
    }

    #[must_use]
    pub fn rack(&self) -> &R {
        &self.rack
    }

    /// Evaluate the schedule at `now` and run the due action, if any.
    ///
    /// Returns the action that was executed.
    pub async fn tick(&mut self, now: NaiveDateTime) -> Option<PowerAction> {
        let action = self.due(now)?;
        tracing::info!(%now, "schedule triggered {action}");
        self.execute(action).await;
        Some(action)
    }

    /// Run an operator request immediately, whatever the time.
    ///
    /// Ignored when the rack is already in the requested state.
    pub async fn handle_override(&mut self, action: PowerAction) -> Option<PowerAction> {
        if !self.state.accepts(action) {
            tracing::info!(state = %self.state, "rack already {}, ignoring {action} override", self.state);
            return None;
        }
        tracing::warn!("override requested {action}");
        self.execute(action).await;
        Some(action)
    }

    fn due(&mut self, now: NaiveDateTime) -> Option<PowerAction> {
        let first_rest_day_tick = self.schedule.is_rest_day(now.date())
            && self.rest_day_seen.replace(now.date()) != Some(now.date());

        if self.state.accepts(PowerAction::PowerOff)
            && (self.schedule.power_off_due(now) || first_rest_day_tick)
        {
            return Some(PowerAction::PowerOff);
        }
        if self.state.accepts(PowerAction::PowerOn) && self.schedule.power_on_due(now) {
            return Some(PowerAction::PowerOn);
        }
        None
    }

    async fn execute(&mut self, action: PowerAction) {
        let report = match action {
            PowerAction::PowerOn => self.rack.power_on().await,
            PowerAction::PowerOff => self.rack.power_off().await,
        };
        self.state = action.resulting_state();
        tracing::info!(
            state = %self.state,
            complete = report.is_complete(),
            steps = report.steps.len(),
            "rack {action} finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use labrack_domain::schedule::DaySet;

    use super::*;
    use crate::orchestrator::PowerReport;

    #[derive(Default)]
    struct CountingRack {
        power_on: u32,
        power_off: u32,
    }

    impl RackPower for CountingRack {
        async fn power_on(&mut self) -> PowerReport {
            self.power_on += 1;
            PowerReport {
                action: PowerAction::PowerOn,
                steps: Vec::new(),
            }
        }

        async fn power_off(&mut self) -> PowerReport {
            self.power_off += 1;
            PowerReport {
                action: PowerAction::PowerOff,
                steps: Vec::new(),
            }
        }
    }

    fn schedule(on: (u32, u32), off: (u32, u32)) -> WeeklySchedule {
        WeeklySchedule::new(
            NaiveTime::from_hms_opt(on.0, on.1, 0).unwrap(),
            NaiveTime::from_hms_opt(off.0, off.1, 0).unwrap(),
            DaySet::WORKWEEK,
        )
        .unwrap()
    }

    /// 2024-06-03 is a Monday, 2024-06-08 a Saturday.
    fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn scheduler(state: RackState) -> PowerScheduler<CountingRack> {
        PowerScheduler::with_state(schedule((8, 30), (18, 0)), CountingRack::default(), state)
    }

    #[tokio::test]
    async fn should_start_powered() {
        let scheduler = PowerScheduler::new(schedule((8, 30), (18, 0)), CountingRack::default());
        assert_eq!(scheduler.state(), RackState::Powered);
    }

    #[tokio::test]
    async fn should_power_off_once_inside_evening_minute() {
        let mut scheduler = scheduler(RackState::Powered);

        let mut fired = Vec::new();
        for second in (0..60).step_by(5) {
            fired.push(scheduler.tick(at(3, 18, 0, second)).await);
        }

        assert_eq!(fired[0], Some(PowerAction::PowerOff));
        assert!(fired[1..].iter().all(Option::is_none));
        assert_eq!(scheduler.rack().power_off, 1);
        assert_eq!(scheduler.state(), RackState::Unpowered);
    }

    #[tokio::test]
    async fn should_do_nothing_outside_trigger_minutes_on_workdays() {
        let mut scheduler = scheduler(RackState::Powered);

        assert_eq!(scheduler.tick(at(3, 17, 59, 59)).await, None);
        assert_eq!(scheduler.tick(at(3, 12, 0, 0)).await, None);
        assert_eq!(scheduler.rack().power_off, 0);
    }

    #[tokio::test]
    async fn should_power_on_once_on_weekday_morning() {
        let mut scheduler = PowerScheduler::with_state(
            schedule((8, 0), (18, 0)),
            CountingRack::default(),
            RackState::Unpowered,
        );

        assert_eq!(
            scheduler.tick(at(3, 8, 0, 0)).await,
            Some(PowerAction::PowerOn)
        );
        assert_eq!(scheduler.tick(at(3, 8, 1, 0)).await, None);
        assert_eq!(scheduler.rack().power_on, 1);
        assert_eq!(scheduler.state(), RackState::Powered);
    }

    #[tokio::test]
    async fn should_not_power_on_during_weekend_morning() {
        let mut scheduler = scheduler(RackState::Unpowered);

        assert_eq!(scheduler.tick(at(8, 8, 30, 0)).await, None);
        assert_eq!(scheduler.rack().power_on, 0);
    }

    #[tokio::test]
    async fn should_power_off_on_first_rest_day_tick() {
        let mut scheduler = scheduler(RackState::Powered);

        assert_eq!(
            scheduler.tick(at(8, 10, 15, 0)).await,
            Some(PowerAction::PowerOff)
        );
        assert_eq!(scheduler.tick(at(8, 10, 15, 5)).await, None);
        assert_eq!(scheduler.rack().power_off, 1);
    }

    #[tokio::test]
    async fn should_power_off_on_override_regardless_of_time() {
        let mut scheduler = scheduler(RackState::Powered);

        let fired = scheduler.handle_override(PowerAction::PowerOff).await;

        assert_eq!(fired, Some(PowerAction::PowerOff));
        assert_eq!(scheduler.rack().power_off, 1);
        assert_eq!(scheduler.state(), RackState::Unpowered);
    }

    #[tokio::test]
    async fn should_ignore_override_matching_current_state() {
        let mut scheduler = scheduler(RackState::Unpowered);

        assert_eq!(scheduler.handle_override(PowerAction::PowerOff).await, None);
        assert_eq!(scheduler.rack().power_off, 0);
    }

    #[tokio::test]
    async fn should_keep_weekend_override_until_evening() {
        let mut scheduler = scheduler(RackState::Powered);
        scheduler.tick(at(8, 9, 0, 0)).await;

        scheduler.handle_override(PowerAction::PowerOn).await;
        assert_eq!(scheduler.tick(at(8, 9, 0, 5)).await, None);
        assert_eq!(scheduler.tick(at(8, 14, 0, 0)).await, None);
        assert_eq!(scheduler.state(), RackState::Powered);

        assert_eq!(
            scheduler.tick(at(8, 18, 0, 0)).await,
            Some(PowerAction::PowerOff)
        );
        assert_eq!(scheduler.rack().power_off, 2);
    }

    #[tokio::test]
    async fn should_not_undo_override_taken_while_unpowered_on_rest_day() {
        let mut scheduler = scheduler(RackState::Unpowered);
        assert_eq!(scheduler.tick(at(8, 9, 0, 0)).await, None);

        scheduler.handle_override(PowerAction::PowerOn).await;

        assert_eq!(scheduler.tick(at(8, 9, 0, 5)).await, None);
        assert_eq!(scheduler.state(), RackState::Powered);
    }

    #[tokio::test]
    async fn should_power_off_again_on_next_rest_day() {
        let mut scheduler = scheduler(RackState::Powered);
        scheduler.tick(at(8, 9, 0, 0)).await;
        scheduler.handle_override(PowerAction::PowerOn).await;

        assert_eq!(
            scheduler.tick(at(9, 0, 0, 0)).await,
            Some(PowerAction::PowerOff)
        );
    }
}
