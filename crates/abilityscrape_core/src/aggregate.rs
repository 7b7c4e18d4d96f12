use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::AbilityRecord;
use crate::report_url::PageType;

/// Keep the first record per ability id, preserving order.
///
/// Primary-pattern matches come first in matcher output, so they win over
/// fallback sightings of the same id.
pub fn dedupe_by_ability_id(records: Vec<AbilityRecord>) -> (Vec<AbilityRecord>, Vec<String>) {
    let mut output = Vec::with_capacity(records.len());
    let mut dropped = Vec::new();
    let mut seen = HashSet::new();
    for record in records {
        if seen.insert(record.ability_id.clone()) {
            output.push(record);
        } else {
            dropped.push(record.ability_id);
        }
    }
    (output, dropped)
}

/// Run-wide ability map keyed by ability id, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbilityAggregate {
    records: Vec<AbilityRecord>,
    positions: HashMap<String, usize>,
}

impl AbilityAggregate {
    /// Merge one page's records. Existing records only gain the page tag.
    pub fn merge(&mut self, page_type: PageType, records: &[AbilityRecord]) -> usize {
        let mut inserted = 0usize;
        for record in records {
            if !is_valid_ability_id(&record.ability_id) {
                continue;
            }
            match self.positions.get(&record.ability_id) {
                Some(&index) => {
                    let pages = &mut self.records[index].found_on_pages;
                    if !pages.contains(&page_type) {
                        pages.push(page_type);
                    }
                }
                None => {
                    let mut record = record.clone();
                    record.found_on_pages = vec![page_type];
                    self.push(record);
                    inserted += 1;
                }
            }
        }
        inserted
    }

    pub fn get(&self, ability_id: &str) -> Option<&AbilityRecord> {
        self.positions
            .get(ability_id)
            .map(|&index| &self.records[index])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbilityRecord> {
        self.records.iter()
    }

    fn push(&mut self, record: AbilityRecord) {
        self.positions
            .insert(record.ability_id.clone(), self.records.len());
        self.records.push(record);
    }
}

pub fn is_valid_ability_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

impl Serialize for AbilityAggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.ability_id, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AbilityAggregate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AggregateVisitor)
    }
}

struct AggregateVisitor;

impl<'de> Visitor<'de> for AggregateVisitor {
    type Value = AbilityAggregate;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of ability id to ability record")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
        let mut aggregate = AbilityAggregate::default();
        while let Some((key, mut record)) = access.next_entry::<String, AbilityRecord>()? {
            if aggregate.positions.contains_key(&key) {
                continue;
            }
            record.ability_id = key;
            aggregate.push(record);
        }
        Ok(aggregate)
    }
}
