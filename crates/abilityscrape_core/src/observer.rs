//! Events emitted while scraping.
//!
//! The core never installs a global subscriber. Callers pass an observer;
//! the CLI uses [`TracingObserver`], tests record events directly.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::driver::DriverState;
use crate::error::ScrapeError;
use crate::model::AbilityRecord;
use crate::report_url::PageType;

pub trait ScrapeObserver {
    fn state_changed(&mut self, _state: DriverState) {}
    fn paused(&mut self, _delay: Duration) {}
    fn page_started(&mut self, _page_type: Option<PageType>, _url: &str) {}
    fn pattern_hits(&mut self, _pattern: &str, _hits: usize) {}
    fn ability_found(&mut self, _record: &AbilityRecord) {}
    fn duplicate_skipped(&mut self, _ability_id: &str) {}
    fn page_failed(&mut self, _page_type: Option<PageType>, _url: &str, _error: &ScrapeError) {}
    fn page_finished(&mut self, _page_type: Option<PageType>, _url: &str, _unique: usize) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ScrapeObserver for NoopObserver {}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ScrapeObserver for TracingObserver {
    fn state_changed(&mut self, state: DriverState) {
        debug!(state = %state, "driver state");
    }

    fn paused(&mut self, delay: Duration) {
        debug!(delay_ms = delay.as_millis() as u64, "waiting before next page");
    }

    fn page_started(&mut self, page_type: Option<PageType>, url: &str) {
        info!(page_type = display_page(page_type), url, "scraping page");
    }

    fn pattern_hits(&mut self, pattern: &str, hits: usize) {
        info!(pattern, hits, "pattern scan");
    }

    fn ability_found(&mut self, record: &AbilityRecord) {
        match &record.matched_pattern {
            Some(pattern) => info!(
                ability_id = %record.ability_id,
                name = %record.ability_name,
                pattern = %pattern,
                "found ability (fallback)"
            ),
            None => info!(
                ability_id = %record.ability_id,
                name = %record.ability_name,
                "found ability"
            ),
        }
    }

    fn duplicate_skipped(&mut self, ability_id: &str) {
        debug!(ability_id, "duplicate ability id");
    }

    fn page_failed(&mut self, page_type: Option<PageType>, url: &str, failure: &ScrapeError) {
        match failure {
            ScrapeError::Status { status, .. } if *status == 404 => {
                warn!(page_type = display_page(page_type), url, "page not found")
            }
            _ => error!(
                page_type = display_page(page_type),
                url,
                error = %failure,
                "failed to scrape ability ids"
            ),
        }
    }

    fn page_finished(&mut self, page_type: Option<PageType>, url: &str, unique: usize) {
        info!(
            page_type = display_page(page_type),
            url, unique, "total unique abilities found"
        );
    }
}

fn display_page(page_type: Option<PageType>) -> &'static str {
    page_type.map(PageType::as_str).unwrap_or("single")
}
