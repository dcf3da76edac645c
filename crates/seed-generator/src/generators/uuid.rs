//! UUID value generator.

use super::Synthesizer;
use rand::rngs::StdRng;
use rand::Rng;
use seed_core::Value;
use uuid::Uuid;

pub(super) fn register(synthesizer: &mut Synthesizer) {
    synthesizer.register("random.uuid", |rng, _| generate_uuid_v4(rng));
    synthesizer.register("datatype.uuid", |rng, _| generate_uuid_v4(rng));
}

/// Generate a random UUID v4 from the provided RNG, in hyphenated text form.
pub fn generate_uuid_v4(rng: &mut StdRng) -> Value {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);

    bytes[6] = (bytes[6] & 0x0f) | 0x40; // Version 4
    bytes[8] = (bytes[8] & 0x3f) | 0x80; // Variant RFC 4122

    Value::Text(Uuid::from_bytes(bytes).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_generate_uuid_v4() {
        let mut rng = StdRng::seed_from_u64(42);
        let value = generate_uuid_v4(&mut rng);
        let value2 = generate_uuid_v4(&mut rng);
        assert_ne!(value, value2);

        let uuid = Uuid::parse_str(value.as_str().unwrap()).unwrap();
        assert_eq!(uuid.get_version_num(), 4);
    }

    #[test]
    fn test_uuid_deterministic() {
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);

        assert_eq!(generate_uuid_v4(&mut rng1), generate_uuid_v4(&mut rng2));
    }
}
