use std::fmt;
use std::thread::sleep;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};

use crate::config::{DEFAULT_DELAY_MS, ScrapeConfig};
use crate::error::Result;
use crate::fetch::{ReportPageApi, ReportWebClient, ReportWebClientConfig};
use crate::matcher::extract_abilities;
use crate::model::{FightScrapeResult, PageScrapeResult};
use crate::observer::ScrapeObserver;
use crate::report_url::{DEFAULT_HOST, PageType, ReportTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Init,
    Fetching(PageType),
    Aggregating,
    Done,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("init"),
            Self::Fetching(page_type) => write!(f, "fetching({page_type})"),
            Self::Aggregating => f.write_str("aggregating"),
            Self::Done => f.write_str("done"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub host: String,
    pub delay: Duration,
    pub page_types: Vec<PageType>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            page_types: PageType::FIGHT_ORDER.to_vec(),
        }
    }
}

impl DriverOptions {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            host: config.host(),
            delay: config.delay(),
            page_types: config.page_types(),
        }
    }
}

/// One fight scrape. Consumed by [`ReportDriver::run`]; states only move forward.
pub struct ReportDriver<'a, A: ReportPageApi + ?Sized, O: ScrapeObserver + ?Sized> {
    api: &'a mut A,
    observer: &'a mut O,
    options: DriverOptions,
    state: DriverState,
}

impl<'a, A: ReportPageApi + ?Sized, O: ScrapeObserver + ?Sized> ReportDriver<'a, A, O> {
    pub fn new(api: &'a mut A, observer: &'a mut O, options: DriverOptions) -> Self {
        Self {
            api,
            observer,
            options,
            state: DriverState::Init,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Scrape every configured page type for `target`.
    ///
    /// Fails only when a page URL cannot be built; page-level failures are
    /// recorded as empty pages and the run carries on.
    pub fn run(mut self, target: &ReportTarget) -> Result<FightScrapeResult> {
        let page_types = PageType::canonical(&self.options.page_types);
        let mut urls = Vec::with_capacity(page_types.len());
        for page_type in page_types {
            urls.push((page_type, target.page_url(&self.options.host, page_type)?));
        }

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut result = FightScrapeResult::new(target, timestamp);

        for (index, (page_type, url)) in urls.iter().enumerate() {
            if index > 0 {
                self.observer.paused(self.options.delay);
                pause(self.options.delay);
            }
            self.transition(DriverState::Fetching(*page_type));
            let page = scrape_page_with_api(
                &mut *self.api,
                &mut *self.observer,
                Some(*page_type),
                url,
            );
            result.pages.insert(*page_type, page);
        }

        self.transition(DriverState::Aggregating);
        for (page_type, page) in &result.pages {
            result.all_abilities.merge(*page_type, &page.abilities);
        }
        result.total_unique_abilities = result.all_abilities.len();

        self.transition(DriverState::Done);
        Ok(result)
    }

    fn transition(&mut self, next: DriverState) {
        self.state = next;
        self.observer.state_changed(next);
    }
}

/// Fetch and match one page, folding any failure into an empty result.
pub fn scrape_page_with_api<A, O>(
    api: &mut A,
    observer: &mut O,
    page_type: Option<PageType>,
    url: &str,
) -> PageScrapeResult
where
    A: ReportPageApi + ?Sized,
    O: ScrapeObserver + ?Sized,
{
    observer.page_started(page_type, url);
    let abilities = api
        .fetch_page(url)
        .and_then(|page| extract_abilities(url, &page.body, observer));
    match abilities {
        Ok(abilities) => {
            observer.page_finished(page_type, url, abilities.len());
            PageScrapeResult::from_abilities(url, abilities)
        }
        Err(error) => {
            observer.page_failed(page_type, url, &error);
            PageScrapeResult::failed(url, &error)
        }
    }
}

pub fn scrape_fight<O: ScrapeObserver + ?Sized>(
    config: &ScrapeConfig,
    target: &ReportTarget,
    observer: &mut O,
) -> Result<FightScrapeResult> {
    let mut client = ReportWebClient::new(ReportWebClientConfig::from_config(config))?;
    ReportDriver::new(&mut client, observer, DriverOptions::from_config(config)).run(target)
}

pub fn scrape_single_page<O: ScrapeObserver + ?Sized>(
    config: &ScrapeConfig,
    url: &str,
    observer: &mut O,
) -> Result<PageScrapeResult> {
    let mut client = ReportWebClient::new(ReportWebClientConfig::from_config(config))?;
    Ok(scrape_page_with_api(&mut client, observer, None, url))
}

/// Fixed courtesy pause between page requests.
pub fn pause(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay);
    }
}
