use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::models::Event;

const LISTING_URL: &str = "https://crossweb.pl/wydarzenia/";

/// Marker the listing serves instead of content when an anti-automation
/// challenge is active. There is no retry and no bypass; the run aborts.
const CHALLENGE_MARKER: &str = "Please complete the security check to access";

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.brow").expect("listing row selector"));
static DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".colDataDay").expect("listing date selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".title").expect("listing title selector"));
static CITY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".city").expect("listing city selector"));
static TOPIC_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".topic").expect("listing topic selector"));
static TYPE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".type").expect("listing type selector"));
static COST_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".cost").expect("listing cost selector"));

// The listing shows day and month only, e.g. "17.09".
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})\.(\d{1,2})").expect("listing date regex"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("the event listing is behind an anti-automation challenge")]
    Blocked,
    #[error("request for the event listing failed")]
    Http(#[from] reqwest::Error),
}

/// HTTP client for the listing page. Constructed once at startup and passed
/// down; transport timeouts live here, not in the sync logic.
pub fn listing_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .user_agent("trello-sync/0.1")
        .build()
}

/// Fetch the listing for a city (`ALL` or empty fetches every city) and
/// parse it into event records.
pub async fn fetch_events(client: &reqwest::Client, city: &str) -> Result<Vec<Event>, FetchError> {
    tracing::info!("Fetching events from Crossweb");

    let mut request = client.get(LISTING_URL);
    if !city.is_empty() && city != "ALL" {
        request = request.query(&[("miasto", city)]);
    }
    let html = request.send().await?.error_for_status()?.text().await?;

    parse_listing(&html, Local::now().date_naive())
}

/// Parse listing markup into events. Pure over the input so fixture HTML can
/// drive it in tests; `today` supplies the calendar year for the listing's
/// day/month dates.
pub fn parse_listing(html: &str, today: NaiveDate) -> Result<Vec<Event>, FetchError> {
    if html.contains(CHALLENGE_MARKER) {
        return Err(FetchError::Blocked);
    }

    let document = Html::parse_document(html);
    let mut events = Vec::new();

    for row in document.select(&ROW_SELECTOR) {
        let Some(link) = row.value().attr("href").and_then(absolute_link) else {
            tracing::warn!("Skipping listing row without an event link");
            continue;
        };

        let date_text = text_of(&row, &DATE_SELECTOR).unwrap_or_default();
        let Some(date) = parse_listing_date(&date_text, today.year()) else {
            tracing::warn!("Skipping {link}: unparseable listing date {date_text:?}");
            continue;
        };

        let cost = text_of(&row, &COST_SELECTOR).unwrap_or_default();
        let is_free = cost.to_lowercase().contains("bezp");

        events.push(Event {
            link,
            date,
            title: text_of(&row, &TITLE_SELECTOR).unwrap_or_default(),
            city: text_of(&row, &CITY_SELECTOR).unwrap_or_default(),
            topic: text_of(&row, &TOPIC_SELECTOR).unwrap_or_default(),
            kind: text_of(&row, &TYPE_SELECTOR).unwrap_or_default(),
            cost,
            is_free,
        });
    }

    Ok(events)
}

fn absolute_link(href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base = reqwest::Url::parse(LISTING_URL).ok()?;
    base.join(href).ok().map(|url| url.to_string())
}

fn text_of(row: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    let node = row.select(selector).next()?;
    let text = node.text().collect::<Vec<_>>().join(" ");
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!cleaned.is_empty()).then_some(cleaned)
}

/// The listing prints `DD.MM`; the year comes from the current calendar.
/// Events land at midnight local time, the same instant the due date gets.
fn parse_listing_date(text: &str, year: i32) -> Option<NaiveDateTime> {
    let caps = DATE_RE.captures(text)?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}
