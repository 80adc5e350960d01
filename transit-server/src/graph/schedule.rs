//! Timetables attached to transport edges.

use bitcode::{Decode, Encode};

use crate::domain::ServiceTime;

use super::TripIndex;

/// One vehicle run over a transport edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct ScheduleEvent {
    pub departure: ServiceTime,
    pub arrival: ServiceTime,
    pub trip: TripIndex,
}

impl ScheduleEvent {
    /// Seconds spent in the vehicle.
    pub fn ride_secs(&self) -> u32 {
        self.arrival.secs_since(self.departure)
    }
}

/// Events on one transport edge, sorted ascending by departure time.
///
/// A schedule is never empty and every event has `arrival >= departure`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Schedule {
    events: Vec<ScheduleEvent>,
}

impl Schedule {
    /// Build a schedule from unsorted events.
    ///
    /// Events are sorted stably by departure, so events that depart together
    /// keep their input order. Events that arrive before they depart are
    /// discarded. Returns `None` if no events remain.
    pub fn from_events(mut events: Vec<ScheduleEvent>) -> Option<Self> {
        events.retain(|e| e.arrival >= e.departure);
        if events.is_empty() {
            return None;
        }
        events.sort_by_key(|e| e.departure);
        Some(Self { events })
    }

    /// Check the invariants [`Schedule::from_events`] establishes, for
    /// schedules decoded from outside.
    pub fn check(&self) -> Result<(), &'static str> {
        if self.events.is_empty() {
            return Err("empty schedule");
        }
        if self.events.iter().any(|e| e.arrival < e.departure) {
            return Err("schedule event arrives before it departs");
        }
        if !self.events.is_sorted_by_key(|e| e.departure) {
            return Err("schedule not sorted by departure");
        }
        Ok(())
    }

    /// Wrap events as-is, skipping validation.
    #[cfg(test)]
    pub(crate) fn from_events_unchecked(events: Vec<ScheduleEvent>) -> Self {
        Self { events }
    }

    /// All events, in departure order.
    pub fn events(&self) -> &[ScheduleEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if there are no events. Never the case for a built schedule.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The earliest event departing at or after `t`.
    pub fn earliest_from(&self, t: ServiceTime) -> Option<&ScheduleEvent> {
        let idx = self.events.partition_point(|e| e.departure < t);
        self.events.get(idx)
    }

    /// The earliest event of `trip` departing at or after `t`.
    pub fn earliest_on_trip(&self, trip: TripIndex, t: ServiceTime) -> Option<&ScheduleEvent> {
        let idx = self.events.partition_point(|e| e.departure < t);
        self.events[idx..].iter().find(|e| e.trip == trip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(dep: u32, arr: u32, trip: u32) -> ScheduleEvent {
        ScheduleEvent {
            departure: ServiceTime::from_secs(dep),
            arrival: ServiceTime::from_secs(arr),
            trip: TripIndex(trip),
        }
    }

    fn t(secs: u32) -> ServiceTime {
        ServiceTime::from_secs(secs)
    }

    #[test]
    fn check_reports_broken_invariants() {
        let built = Schedule::from_events(vec![ev(300, 400, 0), ev(100, 200, 1)]).unwrap();
        assert_eq!(built.check(), Ok(()));

        let unsorted = Schedule::from_events_unchecked(vec![ev(300, 400, 0), ev(100, 200, 1)]);
        assert_eq!(unsorted.check(), Err("schedule not sorted by departure"));

        let backwards = Schedule::from_events_unchecked(vec![ev(100, 50, 0)]);
        assert_eq!(backwards.check(), Err("schedule event arrives before it departs"));

        assert_eq!(Schedule::from_events_unchecked(vec![]).check(), Err("empty schedule"));
    }

    #[test]
    fn empty_is_none() {
        assert!(Schedule::from_events(vec![]).is_none());
        assert!(Schedule::from_events(vec![ev(100, 50, 0)]).is_none());
    }

    #[test]
    fn sorts_by_departure_stably() {
        let s = Schedule::from_events(vec![ev(300, 400, 0), ev(100, 200, 1), ev(100, 150, 2)])
            .unwrap();
        let trips: Vec<u32> = s.events().iter().map(|e| e.trip.0).collect();
        assert_eq!(trips, vec![1, 2, 0]);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn earliest_from_is_inclusive() {
        let s = Schedule::from_events(vec![ev(1000, 1100, 0), ev(1280, 1400, 1)]).unwrap();

        assert_eq!(s.earliest_from(t(900)).unwrap().trip, TripIndex(0));
        assert_eq!(s.earliest_from(t(1000)).unwrap().trip, TripIndex(0));
        assert_eq!(s.earliest_from(t(1001)).unwrap().trip, TripIndex(1));
        assert_eq!(s.earliest_from(t(1280)).unwrap().trip, TripIndex(1));
        assert!(s.earliest_from(t(1281)).is_none());
    }

    #[test]
    fn earliest_on_trip_skips_other_trips() {
        let s = Schedule::from_events(vec![ev(1100, 1150, 1), ev(1110, 1200, 0), ev(1500, 1600, 0)])
            .unwrap();

        assert_eq!(s.earliest_on_trip(TripIndex(0), t(1100)).unwrap().departure, t(1110));
        assert_eq!(s.earliest_on_trip(TripIndex(0), t(1111)).unwrap().departure, t(1500));
        assert!(s.earliest_on_trip(TripIndex(0), t(1501)).is_none());
        assert!(s.earliest_on_trip(TripIndex(7), t(0)).is_none());
    }

    #[test]
    fn ride_secs() {
        assert_eq!(ev(1000, 1100, 0).ride_secs(), 100);
    }
}
