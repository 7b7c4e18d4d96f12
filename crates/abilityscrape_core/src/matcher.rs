use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::aggregate::dedupe_by_ability_id;
use crate::error::{Result, ScrapeError};
use crate::model::AbilityRecord;
use crate::observer::ScrapeObserver;

/// The only id shape known to carry real ability ids, e.g. `talent-ability-183006-0`.
pub const PRIMARY_PATTERN: &str = r"^talent-ability-([0-9]+)-[0-9]+$";

/// Unanchored fallbacks, scanned in this order after the primary pattern.
pub const FALLBACK_PATTERNS: [&str; 4] = [
    r"ability-([0-9]+)",
    r"talent-([0-9]+)",
    r"skill-([0-9]+)",
    r"spell-([0-9]+)",
];

static PRIMARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PRIMARY_PATTERN).expect("primary ability pattern compiles"));

static FALLBACKS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    FALLBACK_PATTERNS
        .iter()
        .map(|pattern| {
            (
                *pattern,
                Regex::new(pattern).expect("fallback ability pattern compiles"),
            )
        })
        .collect()
});

/// Decode a fetched body and extract its deduplicated ability records.
pub fn extract_abilities<O: ScrapeObserver + ?Sized>(
    url: &str,
    body: &[u8],
    observer: &mut O,
) -> Result<Vec<AbilityRecord>> {
    let html = std::str::from_utf8(body).map_err(|error| ScrapeError::Parse {
        url: url.to_string(),
        message: format!("response body is not UTF-8: {error}"),
    })?;
    Ok(extract_abilities_from_html(html, observer))
}

pub fn extract_abilities_from_html<O: ScrapeObserver + ?Sized>(
    html: &str,
    observer: &mut O,
) -> Vec<AbilityRecord> {
    let matches = match_ability_elements(html, observer);
    let (unique, dropped) = dedupe_by_ability_id(matches);
    for ability_id in &dropped {
        observer.duplicate_skipped(ability_id);
    }
    unique
}

/// Every candidate record in precedence order, duplicates included.
pub fn match_ability_elements<O: ScrapeObserver + ?Sized>(
    html: &str,
    observer: &mut O,
) -> Vec<AbilityRecord> {
    let document = Html::parse_document(html);
    let elements = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter_map(|element| element.value().id().map(|id| (id, element)))
        .collect::<Vec<_>>();

    let mut records = Vec::new();

    let mut hits = 0usize;
    for (id, element) in &elements {
        let Some(ability_id) = capture_id(&PRIMARY, id) else {
            continue;
        };
        hits += 1;
        let record = build_record(ability_id, id, element, None);
        observer.ability_found(&record);
        records.push(record);
    }
    observer.pattern_hits(PRIMARY_PATTERN, hits);

    for (pattern, regex) in FALLBACKS.iter() {
        let mut hits = 0usize;
        for (id, element) in &elements {
            let Some(ability_id) = capture_id(regex, id) else {
                continue;
            };
            hits += 1;
            let record = build_record(ability_id, id, element, Some(*pattern));
            if record.ability_name.is_empty() {
                continue;
            }
            observer.ability_found(&record);
            records.push(record);
        }
        observer.pattern_hits(pattern, hits);
    }

    records
}

/// Text of every descendant text node, each trimmed, empty ones dropped.
pub fn stripped_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect()
}

fn capture_id<'a>(regex: &Regex, id: &'a str) -> Option<&'a str> {
    regex
        .captures(id)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str())
        .filter(|value| !value.is_empty())
}

fn build_record(
    ability_id: &str,
    element_id: &str,
    element: &ElementRef<'_>,
    pattern: Option<&str>,
) -> AbilityRecord {
    AbilityRecord {
        ability_id: ability_id.to_string(),
        ability_name: stripped_text(element),
        source_element_id: element_id.to_string(),
        css_classes: element
            .value()
            .attr("class")
            .map(|value| value.split_whitespace().map(ToString::to_string).collect())
            .unwrap_or_default(),
        raw_markup: element.html(),
        matched_pattern: pattern.map(ToString::to_string),
        found_on_pages: Vec::new(),
    }
}
