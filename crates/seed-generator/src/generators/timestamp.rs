//! Timestamp value generators.
//!
//! Relative generators (`date.past`, `date.future`, ...) are anchored to the
//! synthesizer's `base_time` rather than the wall clock, so a seeded run
//! reproduces the same timestamps.

use super::{SynthContext, Synthesizer};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use seed_core::Value;

const DAY: i64 = 24 * 60 * 60;
const YEAR: i64 = 365 * DAY;

pub(super) fn register(synthesizer: &mut Synthesizer) {
    synthesizer.register("date.past", |rng, ctx| {
        generate_offset(rng, ctx, Duration::seconds(-YEAR), Duration::zero())
    });
    synthesizer.register("date.future", |rng, ctx| {
        generate_offset(rng, ctx, Duration::zero(), Duration::seconds(YEAR))
    });
    synthesizer.register("date.recent", |rng, ctx| {
        generate_offset(rng, ctx, Duration::seconds(-DAY), Duration::zero())
    });
    synthesizer.register("date.soon", |rng, ctx| {
        generate_offset(rng, ctx, Duration::zero(), Duration::seconds(DAY))
    });
    synthesizer.register("date.between", |rng, ctx| {
        generate_offset(rng, ctx, Duration::seconds(-5 * YEAR), Duration::seconds(5 * YEAR))
    });
}

/// Generate a random timestamp between `base_time + from` and
/// `base_time + to`.
fn generate_offset(rng: &mut StdRng, ctx: &SynthContext, from: Duration, to: Duration) -> Value {
    generate_timestamp_range(rng, ctx.base_time + from, ctx.base_time + to)
}

/// Generate a random timestamp in the given range, at second precision.
pub fn generate_timestamp_range(
    rng: &mut StdRng,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Value {
    let start_ts = start.timestamp();
    let end_ts = end.timestamp();

    if start_ts >= end_ts {
        return Value::Timestamp(start);
    }

    let random_ts = rng.gen_range(start_ts..=end_ts);
    let dt = DateTime::from_timestamp(random_ts, 0).unwrap_or(start);
    Value::Timestamp(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use rand::SeedableRng;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_generate_timestamp_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();

        match generate_timestamp_range(&mut rng, start, end) {
            Value::Timestamp(dt) => assert!(dt.year() >= 2020 && dt.year() <= 2024),
            other => panic!("Expected Timestamp value, got {other:?}"),
        }
    }

    #[test]
    fn test_reversed_range_yields_start() {
        let mut rng = StdRng::seed_from_u64(42);
        let start = base();

        let value = generate_timestamp_range(&mut rng, start, start - Duration::days(1));
        assert_eq!(value, Value::Timestamp(start));
    }

    #[test]
    fn test_past_and_future_relative_to_base() {
        let synthesizer = Synthesizer::new(base());
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let Some(Value::Timestamp(past)) = synthesizer.generate("date.past", &mut rng) else {
                panic!("Expected Timestamp value");
            };
            assert!(past <= base());
            assert!(past >= base() - Duration::days(365));

            let Some(Value::Timestamp(future)) = synthesizer.generate("date.future", &mut rng)
            else {
                panic!("Expected Timestamp value");
            };
            assert!(future >= base());
        }
    }

    #[test]
    fn test_deterministic_generation() {
        let synthesizer = Synthesizer::new(base());
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);

        assert_eq!(
            synthesizer.generate("date.recent", &mut rng1),
            synthesizer.generate("date.recent", &mut rng2)
        );
    }
}
