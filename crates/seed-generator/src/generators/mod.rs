//! Field value synthesizers.
//!
//! [`Synthesizer`] is a closed registry from faker-style type names
//! (`name.firstName`, `random.number`, `date.past`, ...) to generator
//! functions. It is populated once at startup; a name missing from the
//! registry is an error in the caller, never a silent empty value.

pub mod numeric;
pub mod text;
pub mod timestamp;
pub mod token;
pub mod uuid;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use seed_core::Value;
use std::collections::BTreeMap;

/// Pseudo-type emitting the next value of a per-entity counter.
pub const SEQUENCE: &str = "sequence";

/// Pseudo-type emitting a single space, used in composite types.
pub const SPACE: &str = "space";

/// Inputs shared by every generator function besides the RNG.
#[derive(Debug, Clone, Copy)]
pub struct SynthContext {
    /// Anchor for relative date generators
    pub base_time: DateTime<Utc>,
}

/// A registered generator function.
pub type SynthFn = fn(&mut StdRng, &SynthContext) -> Value;

/// Registry of value generators keyed by type name.
#[derive(Clone)]
pub struct Synthesizer {
    registry: BTreeMap<&'static str, SynthFn>,
    context: SynthContext,
}

impl Synthesizer {
    /// Create a synthesizer with every built-in generator registered,
    /// anchored at `base_time`.
    pub fn new(base_time: DateTime<Utc>) -> Self {
        let mut synthesizer = Self {
            registry: BTreeMap::new(),
            context: SynthContext { base_time },
        };
        text::register(&mut synthesizer);
        numeric::register(&mut synthesizer);
        timestamp::register(&mut synthesizer);
        uuid::register(&mut synthesizer);
        synthesizer
    }

    /// Register (or replace) a generator.
    pub fn register(&mut self, type_name: &'static str, generator: SynthFn) {
        self.registry.insert(type_name, generator);
    }

    /// Whether `type_name` resolves to a value, including the pseudo-types.
    pub fn supports(&self, type_name: &str) -> bool {
        type_name == SEQUENCE || type_name == SPACE || self.registry.contains_key(type_name)
    }

    /// Generate a value for a registered type name.
    ///
    /// Returns `None` for names the registry does not know. Pseudo-types are
    /// resolved by the record generator, not here.
    pub fn generate(&self, type_name: &str, rng: &mut StdRng) -> Option<Value> {
        self.registry
            .get(type_name)
            .map(|generator| generator(rng, &self.context))
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.registry.keys().copied()
    }

    pub fn base_time(&self) -> DateTime<Utc> {
        self.context.base_time
    }

    pub fn set_base_time(&mut self, base_time: DateTime<Utc>) {
        self.context.base_time = base_time;
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer")
            .field("types", &self.registry.len())
            .field("base_time", &self.context.base_time)
            .finish()
    }
}
