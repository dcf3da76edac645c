//! Per-entity record stores.
//!
//! A [`RecordStore`] holds the records generated for one entity during the
//! current iteration plus that entity's sequence counters. Records are
//! cleared between iterations; counters live for the whole run.

use indexmap::IndexMap;
use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use seed_core::{Record, RecordFilter};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    sequences: HashMap<String, i64>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records held for the current iteration, in generation order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Discard all held records. Sequence counters are kept.
    pub fn reset_records(&mut self) {
        self.records.clear();
    }

    /// Next value of the sequence counter for `field`, starting at 1.
    pub fn next_sequence(&mut self, field: &str) -> i64 {
        let counter = self.sequences.entry(field.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Draw one record uniformly among those matching `filter`.
    ///
    /// `None` means no record is available; callers treat that as an absent
    /// value, not an error.
    pub fn random_record<R: Rng + ?Sized>(
        &self,
        filter: Option<&RecordFilter>,
        rng: &mut R,
    ) -> Option<&Record> {
        match filter {
            None => self.records.choose(rng),
            Some(filter) => self
                .records
                .iter()
                .filter(|record| filter.matches(record))
                .choose(rng),
        }
    }

    /// Draw up to `amount` distinct records matching `filter`.
    pub fn sample_distinct<R: Rng + ?Sized>(
        &self,
        filter: Option<&RecordFilter>,
        amount: usize,
        rng: &mut R,
    ) -> Vec<&Record> {
        match filter {
            None => self.records.choose_multiple(rng, amount).collect(),
            Some(filter) => self
                .records
                .iter()
                .filter(|record| filter.matches(record))
                .choose_multiple(rng, amount),
        }
    }
}

/// Registry of every entity's store, keyed by entity name.
#[derive(Debug, Clone, Default)]
pub struct StoreRegistry {
    stores: IndexMap<String, RecordStore>,
}

impl StoreRegistry {
    /// Create an empty store for each name.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stores: names
                .into_iter()
                .map(|name| (name.into(), RecordStore::new()))
                .collect(),
        }
    }

    pub fn get(&self, entity: &str) -> Option<&RecordStore> {
        self.stores.get(entity)
    }

    pub fn get_mut(&mut self, entity: &str) -> Option<&mut RecordStore> {
        self.stores.get_mut(entity)
    }

    /// Clear the records of every store.
    pub fn reset_records(&mut self) {
        for store in self.stores.values_mut() {
            store.reset_records();
        }
    }

    /// Total records held across all stores.
    pub fn total_records(&self) -> usize {
        self.stores.values().map(RecordStore::len).sum()
    }
}
