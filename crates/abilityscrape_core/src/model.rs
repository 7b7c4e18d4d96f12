use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::AbilityAggregate;
use crate::report_url::{PageType, ReportTarget};

/// One ability sighting. Field names on the wire follow the legacy artifact layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityRecord {
    pub ability_id: String,
    pub ability_name: String,
    #[serde(rename = "span_id")]
    pub source_element_id: String,
    #[serde(rename = "span_class", default)]
    pub css_classes: Vec<String>,
    #[serde(rename = "html")]
    pub raw_markup: String,
    #[serde(rename = "pattern", default, skip_serializing_if = "Option::is_none")]
    pub matched_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub found_on_pages: Vec<PageType>,
}

impl AbilityRecord {
    pub fn is_primary(&self) -> bool {
        self.matched_pattern.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageScrapeResult {
    pub url: String,
    pub abilities: Vec<AbilityRecord>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageScrapeResult {
    pub fn from_abilities(url: &str, abilities: Vec<AbilityRecord>) -> Self {
        Self {
            url: url.to_string(),
            count: abilities.len(),
            abilities,
            error: None,
        }
    }

    pub fn failed(url: &str, error: impl ToString) -> Self {
        Self {
            url: url.to_string(),
            abilities: Vec::new(),
            count: 0,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightScrapeResult {
    pub report_code: String,
    pub fight_id: u32,
    pub source_id: Option<u32>,
    pub timestamp: String,
    pub pages: BTreeMap<PageType, PageScrapeResult>,
    pub all_abilities: AbilityAggregate,
    pub total_unique_abilities: usize,
}

impl FightScrapeResult {
    pub fn new(target: &ReportTarget, timestamp: String) -> Self {
        Self {
            report_code: target.report_code.clone(),
            fight_id: target.fight_id,
            source_id: target.source_id,
            timestamp,
            pages: BTreeMap::new(),
            all_abilities: AbilityAggregate::default(),
            total_unique_abilities: 0,
        }
    }

    pub fn target(&self) -> ReportTarget {
        ReportTarget {
            report_code: self.report_code.clone(),
            fight_id: self.fight_id,
            source_id: self.source_id,
        }
    }
}
