// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Sources of the current time.
//!
//! Timestamps flow into log lines, database rows and JSON payloads, so every clock here yields
//! UTC values with at most microsecond precision.

use time::{Duration, OffsetDateTime};

/// Anything that can tell the current time.
pub trait Clock {
    /// Returns the current UTC time.
    fn now_utc(&self) -> OffsetDateTime;
}

/// Clock backed by the operating system.
#[derive(Clone, Default)]
pub struct SystemClock {}

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        now - Duration::nanoseconds(i64::from(now.nanosecond() % 1000))
    }
}

/// Test utilities.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use std::sync::{Mutex, PoisonError};

    /// Clock frozen at a fixed instant that tests move forward explicitly.
    #[derive(Debug)]
    pub struct SettableClock {
        /// Instant returned by `now_utc`.
        now: Mutex<OffsetDateTime>,
    }

    impl SettableClock {
        /// Creates a clock stopped at `now`.
        pub fn new(now: OffsetDateTime) -> Self {
            assert_eq!(0, now.nanosecond() % 1000, "Sub-microsecond instants are not supported");
            Self { now: Mutex::new(now) }
        }

        /// Moves the clock forward by `delta`.
        pub fn advance(&self, delta: std::time::Duration) {
            assert_eq!(0, delta.subsec_nanos() % 1000, "Sub-microsecond deltas are not supported");
            let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
            *now += delta;
        }
    }

    impl Clock for SettableClock {
        fn now_utc(&self) -> OffsetDateTime {
            *self.now.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::panic::catch_unwind;
        use time::macros::datetime;

        #[test]
        fn test_settableclock_stays_until_advanced() {
            let clock = SettableClock::new(datetime!(2023-10-17 08:15:00 UTC));
            assert_eq!(datetime!(2023-10-17 08:15:00 UTC), clock.now_utc());
            assert_eq!(datetime!(2023-10-17 08:15:00 UTC), clock.now_utc());

            clock.advance(std::time::Duration::from_secs(90));
            assert_eq!(datetime!(2023-10-17 08:16:30 UTC), clock.now_utc());

            clock.advance(std::time::Duration::from_micros(5));
            assert_eq!(datetime!(2023-10-17 08:16:30.000005 UTC), clock.now_utc());
        }

        #[test]
        fn test_settableclock_rejects_nanoseconds() {
            catch_unwind(|| SettableClock::new(datetime!(2023-10-17 08:15:00.000000001 UTC)))
                .unwrap_err();

            let clock = SettableClock::new(datetime!(2023-10-17 08:15:00 UTC));
            catch_unwind(|| clock.advance(std::time::Duration::from_nanos(1))).unwrap_err();
        }
    }
}
