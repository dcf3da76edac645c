//! Numeric value generators.

use super::Synthesizer;
use rand::rngs::StdRng;
use rand::Rng;
use seed_core::Value;

/// Upper bound of `random.number`, matching faker's default.
pub const NUMBER_MAX: i64 = 99_999;

pub(super) fn register(synthesizer: &mut Synthesizer) {
    synthesizer.register("random.number", |rng, _| generate_int_range(rng, 0, NUMBER_MAX));
    synthesizer.register("datatype.number", |rng, _| generate_int_range(rng, 0, NUMBER_MAX));
    synthesizer.register("internet.port", |rng, _| generate_int_range(rng, 0, 65_535));
    synthesizer.register("random.float", |rng, _| generate_float_range(rng, 0.0, NUMBER_MAX as f64));
    synthesizer.register("datatype.float", |rng, _| generate_float_range(rng, 0.0, NUMBER_MAX as f64));
    synthesizer.register("random.boolean", |rng, _| Value::Bool(rng.gen_bool(0.5)));
    synthesizer.register("datatype.boolean", |rng, _| Value::Bool(rng.gen_bool(0.5)));
    synthesizer.register("commerce.price", |rng, _| generate_decimal_range(rng, 1.0, 1000.0));
    synthesizer.register("finance.amount", |rng, _| generate_decimal_range(rng, 0.0, 1000.0));
}

/// Generate a random integer in the given range (inclusive).
pub fn generate_int_range(rng: &mut StdRng, min: i64, max: i64) -> Value {
    Value::Int(rng.gen_range(min..=max))
}

/// Generate a random float in the given range, rounded to 2 decimal places.
pub fn generate_float_range(rng: &mut StdRng, min: f64, max: f64) -> Value {
    let value: f64 = rng.gen_range(min..=max);
    Value::Float((value * 100.0).round() / 100.0)
}

/// Generate a random decimal in the given range.
///
/// The decimal is stored as text with 2 decimal places so currency columns
/// receive an exact literal.
pub fn generate_decimal_range(rng: &mut StdRng, min: f64, max: f64) -> Value {
    let value: f64 = rng.gen_range(min..=max);
    Value::Text(format!("{value:.2}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_generate_int_range() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let value = generate_int_range(&mut rng, 10, 20);
            let v = value.as_i64().expect("Expected Int value");
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn test_generate_float_range() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            match generate_float_range(&mut rng, 0.0, 100.0) {
                Value::Float(v) => assert!((0.0..=100.0).contains(&v)),
                other => panic!("Expected Float value, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_generate_decimal_range() {
        let mut rng = StdRng::seed_from_u64(42);

        let value = generate_decimal_range(&mut rng, 1.0, 1000.0);
        let text = value.as_str().expect("Expected Text value");
        let (_, fraction) = text.split_once('.').unwrap();
        assert_eq!(fraction.len(), 2);

        let parsed: f64 = text.parse().unwrap();
        assert!((1.0..=1000.0).contains(&parsed));
    }
}
