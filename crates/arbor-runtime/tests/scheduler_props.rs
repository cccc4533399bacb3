//! Property tests for the scheduler's drain ordering.

use proptest::prelude::*;
use web_time::{Duration, Instant};

use arbor_runtime::Scheduler;

proptest! {
    #[test]
    fn timers_drain_in_due_then_registration_order(
        delays in prop::collection::vec(0u64..50, 0..12),
    ) {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        for (index, delay) in delays.iter().enumerate() {
            scheduler.schedule_timer(now, Duration::from_millis(*delay), index);
        }

        let fired = scheduler.tick(now + Duration::from_millis(50));

        let mut expected: Vec<usize> = (0..delays.len()).collect();
        expected.sort_by_key(|index| delays[*index]);
        prop_assert_eq!(fired, expected);
        prop_assert!(scheduler.is_idle());
    }

    #[test]
    fn cancellation_removes_exactly_the_cancelled_timers(
        delays in prop::collection::vec(0u64..50, 0..12),
        cancel_mask in prop::collection::vec(any::<bool>(), 12),
    ) {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        let handles: Vec<_> = delays
            .iter()
            .enumerate()
            .map(|(index, delay)| {
                scheduler.schedule_timer(now, Duration::from_millis(*delay), index)
            })
            .collect();
        for (index, handle) in handles.into_iter().enumerate() {
            if cancel_mask[index] {
                scheduler.cancel(handle);
            }
        }

        let fired = scheduler.tick(now + Duration::from_millis(50));

        let mut expected: Vec<usize> = (0..delays.len())
            .filter(|index| !cancel_mask[*index])
            .collect();
        expected.sort_by_key(|index| delays[*index]);
        prop_assert_eq!(fired, expected);
    }

    #[test]
    fn every_microtask_drains_ahead_of_every_due_timer(
        timers in 0usize..5,
        micro in 0usize..5,
    ) {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        for index in 0..timers {
            scheduler.schedule_timer(now, Duration::ZERO, index);
        }
        for index in 0..micro {
            scheduler.enqueue_microtask(timers + index);
        }

        let fired = scheduler.tick(now);

        let expected: Vec<usize> = (timers..timers + micro).chain(0..timers).collect();
        prop_assert_eq!(fired, expected);
    }
}
