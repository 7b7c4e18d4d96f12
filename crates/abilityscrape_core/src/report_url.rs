use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};

pub const DEFAULT_HOST: &str = "www.esologs.com";

/// Report page views that render ability markup. Ordering is the fight scrape order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageType {
    Casts,
    DamageDone,
    Healing,
    Summary,
}

impl PageType {
    pub const FIGHT_ORDER: [PageType; 4] = [
        PageType::Casts,
        PageType::DamageDone,
        PageType::Healing,
        PageType::Summary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Casts => "casts",
            Self::DamageDone => "damage-done",
            Self::Healing => "healing",
            Self::Summary => "summary",
        }
    }

    /// `selected` in fight order without repeats. An empty selection means every page type.
    pub fn canonical(selected: &[PageType]) -> Vec<PageType> {
        if selected.is_empty() {
            return Self::FIGHT_ORDER.to_vec();
        }
        Self::FIGHT_ORDER
            .into_iter()
            .filter(|page_type| selected.contains(page_type))
            .collect()
    }

    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        Self::FIGHT_ORDER
            .into_iter()
            .find(|page_type| page_type.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| {
                ScrapeError::InvalidTarget(format!(
                    "unsupported page type: {value} (expected casts|damage-done|healing|summary)"
                ))
            })
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTarget {
    pub report_code: String,
    pub fight_id: u32,
    pub source_id: Option<u32>,
}

impl ReportTarget {
    pub fn new(report_code: &str, fight_id: u32, source_id: Option<u32>) -> Result<Self> {
        let target = Self {
            report_code: report_code.trim().to_string(),
            fight_id,
            source_id,
        };
        target.validate()?;
        Ok(target)
    }

    pub fn validate(&self) -> Result<()> {
        if self.report_code.is_empty() {
            return Err(ScrapeError::InvalidTarget(
                "report code cannot be empty".to_string(),
            ));
        }
        if !self.report_code.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(ScrapeError::InvalidTarget(format!(
                "report code must be alphanumeric: {}",
                self.report_code
            )));
        }
        if self.fight_id == 0 {
            return Err(ScrapeError::InvalidTarget(
                "fight id must be positive".to_string(),
            ));
        }
        if self.source_id == Some(0) {
            return Err(ScrapeError::InvalidTarget(
                "source id must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// `https://<host>/reports/<code>?fight=<id>&type=<page>[&source=<id>]`
    pub fn page_url(&self, host: &str, page_type: PageType) -> Result<String> {
        self.validate()?;
        let host = validate_host(host)?;
        let mut url = Url::parse(&format!("https://{host}/reports/{}", self.report_code))
            .map_err(|error| ScrapeError::InvalidTarget(format!("{host}: {error}")))?;
        let expected_path = format!("/reports/{}", self.report_code);
        let (host_name, _) = split_port(host);
        if !url
            .host_str()
            .is_some_and(|parsed| parsed.eq_ignore_ascii_case(host_name))
            || !url.username().is_empty()
            || url.password().is_some()
            || url.path() != expected_path
            || url.query().is_some()
            || url.fragment().is_some()
        {
            return Err(ScrapeError::InvalidTarget(format!(
                "host does not form a report URL: {host:?}"
            )));
        }
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("fight", &self.fight_id.to_string());
            query.append_pair("type", page_type.as_str());
            if let Some(source_id) = self.source_id {
                query.append_pair("source", &source_id.to_string());
            }
        }
        Ok(url.to_string())
    }

    /// Stem shared by the output artifacts of this target.
    pub fn file_stem(&self) -> String {
        let source = self
            .source_id
            .map(|value| value.to_string())
            .unwrap_or_else(|| "none".to_string());
        format!("{}_{}_{}", self.report_code, self.fight_id, source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReportUrl {
    pub host: String,
    pub target: ReportTarget,
    pub page_type: Option<PageType>,
}

pub fn parse_report_url(url: &str) -> Result<ParsedReportUrl> {
    let parsed = Url::parse(url.trim())
        .map_err(|error| ScrapeError::InvalidTarget(format!("{url}: {error}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| ScrapeError::InvalidTarget(format!("missing host in {url}")))?
        .to_string();

    let segments = parsed
        .path_segments()
        .map(|segments| {
            segments
                .filter(|segment| !segment.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let report_code = match segments.as_slice() {
        ["reports", code] => (*code).to_string(),
        _ => {
            return Err(ScrapeError::InvalidTarget(format!(
                "not a report page URL: {url}"
            )));
        }
    };

    let mut fight_id = None::<u32>;
    let mut source_id = None::<u32>;
    let mut page_type = None::<PageType>;
    for (key, value) in parsed.query_pairs() {
        match &*key {
            "fight" => fight_id = Some(parse_positive(&value, "fight")?),
            "source" => source_id = Some(parse_positive(&value, "source")?),
            "type" => page_type = Some(PageType::parse(&value)?),
            _ => {}
        }
    }
    let fight_id = fight_id
        .ok_or_else(|| ScrapeError::InvalidTarget(format!("missing fight parameter in {url}")))?;

    Ok(ParsedReportUrl {
        host,
        target: ReportTarget::new(&report_code, fight_id, source_id)?,
        page_type,
    })
}

/// A host name of `[A-Za-z0-9.-]` labels with an optional numeric `:port`.
fn validate_host(host: &str) -> Result<&str> {
    let host = host.trim();
    let (name, port) = split_port(host);
    let name_ok = !name.is_empty()
        && !name.starts_with(['.', '-'])
        && !name.ends_with('-')
        && !name.contains("..")
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '.' || ch == '-');
    let port_ok = port.is_none_or(|port| port.parse::<u16>().is_ok_and(|port| port > 0));
    if !name_ok || !port_ok {
        return Err(ScrapeError::InvalidTarget(format!(
            "host must be a bare host name: {host:?}"
        )));
    }
    Ok(host)
}

fn split_port(host: &str) -> (&str, Option<&str>) {
    match host.rsplit_once(':') {
        Some((name, port)) => (name, Some(port)),
        None => (host, None),
    }
}

fn parse_positive(value: &str, name: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ScrapeError::InvalidTarget(format!(
            "{name} must be a positive integer: {value}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_HOST, PageType, ReportTarget, parse_report_url};

    #[test]
    fn page_url_matches_report_layout() {
        let target = ReportTarget::new("7KAWyZwPCkaHfc8j", 17, Some(1)).expect("target");
        assert_eq!(
            target
                .page_url(DEFAULT_HOST, PageType::Summary)
                .expect("url"),
            "https://www.esologs.com/reports/7KAWyZwPCkaHfc8j?fight=17&type=summary&source=1"
        );
        assert_eq!(
            target
                .page_url(DEFAULT_HOST, PageType::DamageDone)
                .expect("url"),
            "https://www.esologs.com/reports/7KAWyZwPCkaHfc8j?fight=17&type=damage-done&source=1"
        );
    }

    #[test]
    fn page_url_omits_missing_source() {
        let target = ReportTarget::new("abc123", 3, None).expect("target");
        assert_eq!(
            target.page_url(DEFAULT_HOST, PageType::Casts).expect("url"),
            "https://www.esologs.com/reports/abc123?fight=3&type=casts"
        );
    }

    #[test]
    fn target_round_trips_through_url() {
        let target = ReportTarget::new("Xy9QmK2", 42, Some(7)).expect("target");
        for page_type in PageType::FIGHT_ORDER {
            let url = target.page_url("logs.example.org", page_type).expect("url");
            let parsed = parse_report_url(&url).expect("parse");
            assert_eq!(parsed.host, "logs.example.org");
            assert_eq!(parsed.target, target);
            assert_eq!(parsed.page_type, Some(page_type));
        }
    }

    #[test]
    fn malformed_targets_are_rejected() {
        assert!(ReportTarget::new("", 1, None).is_err());
        assert!(ReportTarget::new("abc/../x", 1, None).is_err());
        assert!(ReportTarget::new("abc", 0, None).is_err());
        assert!(ReportTarget::new("abc", 1, Some(0)).is_err());

        let target = ReportTarget::new("abc", 1, None).expect("target");
        assert!(target.page_url("", PageType::Casts).is_err());
        assert!(
            target
                .page_url("https://www.esologs.com", PageType::Casts)
                .is_err()
        );
    }

    #[test]
    fn hosts_that_alter_the_url_shape_are_rejected() {
        let target = ReportTarget::new("abc", 1, Some(2)).expect("target");
        for host in [
            "example.com?x",
            "example.com#frag",
            "example.com\\evil",
            "user@example.com",
            "user:pass@example.com",
            "example.com:notaport",
            "example.com:0",
            "exa mple.com",
            ".example.com",
            "example..com",
            "example.com/path",
            "[::1]",
        ] {
            assert!(
                target.page_url(host, PageType::Casts).is_err(),
                "host {host:?} should be rejected"
            );
        }
    }

    #[test]
    fn host_with_port_round_trips() {
        let target = ReportTarget::new("abc", 1, Some(2)).expect("target");
        let url = target
            .page_url("localhost:8080", PageType::Healing)
            .expect("url");
        assert_eq!(
            url,
            "https://localhost:8080/reports/abc?fight=1&type=healing&source=2"
        );
        let parsed = parse_report_url(&url).expect("parse");
        assert_eq!(parsed.target, target);
        assert_eq!(parsed.page_type, Some(PageType::Healing));
    }

    #[test]
    fn parse_report_url_requires_report_path_and_fight() {
        assert!(parse_report_url("https://www.esologs.com/zone/rankings/1").is_err());
        assert!(parse_report_url("https://www.esologs.com/reports/abc?type=casts").is_err());
        let parsed =
            parse_report_url("https://www.esologs.com/reports/abc?fight=2").expect("parse");
        assert_eq!(parsed.page_type, None);
        assert_eq!(parsed.target.source_id, None);
    }

    #[test]
    fn page_type_parse_and_display_agree() {
        for page_type in PageType::FIGHT_ORDER {
            assert_eq!(
                PageType::parse(&page_type.to_string()).expect("parse"),
                page_type
            );
        }
        assert_eq!(
            PageType::parse("Damage-Done").expect("parse"),
            PageType::DamageDone
        );
        assert!(PageType::parse("deaths").is_err());
    }

    #[test]
    fn canonical_selection_is_ordered_and_unique() {
        assert_eq!(
            PageType::canonical(&[PageType::Summary, PageType::Casts, PageType::Summary]),
            vec![PageType::Casts, PageType::Summary]
        );
        assert_eq!(PageType::canonical(&[]), PageType::FIGHT_ORDER.to_vec());
    }

    #[test]
    fn file_stem_marks_missing_source() {
        let target = ReportTarget::new("abc", 5, None).expect("target");
        assert_eq!(target.file_stem(), "abc_5_none");
    }
}
