use crate::model::EngineClock;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use std::cell::Cell;

/// Source of wall time. Swapped for [`ManualClock`] in tests.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: ChronoDuration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Timestamps of the last interaction, care session and conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionClock {
    record: EngineClock,
}

impl InteractionClock {
    pub fn new(record: EngineClock) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &EngineClock {
        &self.record
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.record.last_interaction_at = now;
    }

    pub fn cared(&mut self, now: DateTime<Utc>) {
        self.record.last_interaction_at = now;
        self.record.last_care_at = now;
    }

    pub fn talked(&mut self, now: DateTime<Utc>) {
        self.record.last_interaction_at = now;
        self.record.last_conversation_at = Some(now);
    }

    /// Zero if the clock went backwards.
    pub fn elapsed_since_last_care(&self, now: DateTime<Utc>) -> ChronoDuration {
        (now - self.record.last_care_at).max(ChronoDuration::zero())
    }

    pub fn elapsed_since_last_interaction(&self, now: DateTime<Utc>) -> ChronoDuration {
        (now - self.record.last_interaction_at).max(ChronoDuration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 20, 9, 0, 0).unwrap()
    }

    #[test]
    fn manual_clock_moves_on_demand() {
        let c = ManualClock::new(t0());
        c.advance(ChronoDuration::minutes(90));
        assert_eq!(c.now(), t0() + ChronoDuration::minutes(90));
        assert_eq!(c.today(), NaiveDate::from_ymd_opt(2025, 4, 20).unwrap());
    }

    #[test]
    fn care_updates_both_stamps() {
        let mut ic = InteractionClock::new(EngineClock::starting_at(t0()));
        let later = t0() + ChronoDuration::minutes(5);
        ic.touch(later);
        assert_eq!(ic.record().last_care_at, t0());
        ic.cared(later);
        assert_eq!(ic.record().last_care_at, later);
        assert_eq!(
            ic.elapsed_since_last_care(later + ChronoDuration::seconds(30)),
            ChronoDuration::seconds(30)
        );
    }

    #[test]
    fn elapsed_never_negative() {
        let ic = InteractionClock::new(EngineClock::starting_at(t0()));
        assert_eq!(
            ic.elapsed_since_last_care(t0() - ChronoDuration::hours(1)),
            ChronoDuration::zero()
        );
    }

    #[test]
    fn talking_records_conversation() {
        let mut ic = InteractionClock::new(EngineClock::starting_at(t0()));
        ic.talked(t0());
        assert_eq!(ic.record().last_conversation_at, Some(t0()));
    }

    #[test]
    fn interaction_elapsed_follows_touch() {
        let mut ic = InteractionClock::new(EngineClock::starting_at(t0()));
        let later = t0() + ChronoDuration::minutes(2);
        ic.touch(later);
        assert_eq!(
            ic.elapsed_since_last_interaction(later + ChronoDuration::seconds(45)),
            ChronoDuration::seconds(45)
        );
        assert_eq!(ic.elapsed_since_last_interaction(t0()), ChronoDuration::zero());
    }
}
