//! Website analysis: platform, booking capability, contact channels and weakness heuristics.

use crate::domain::normalize_url;
use crate::fetch::{FetchedPage, HtmlFetcher};
use crate::models::{Platform, WebsiteSignals};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Instant;

/// Platform fingerprints checked in order; the first match wins.
const PLATFORM_FINGERPRINTS: &[(Platform, &[&str])] = &[
    (Platform::Wix, &["powered by wix", "wix.com"]),
    (Platform::WordPress, &["wordpress", "/wp-content/"]),
    (Platform::Shopify, &["shopify"]),
    (Platform::Squarespace, &["squarespace"]),
    (Platform::Weebly, &["weebly"]),
    (Platform::GoDaddy, &["godaddy"]),
    (Platform::Jimdo, &["jimdo"]),
    (Platform::Joomla, &["joomla"]),
    (Platform::Drupal, &["drupal"]),
];

const BOOKING_INDICATORS: &[&str] = &[
    "book now",
    "book appointment",
    "schedule appointment",
    "online booking",
    "reserve table",
    "booking widget",
    "appointment booking",
    "reservation system",
];

const FORM_INDICATORS: &[&str] = &[
    "<form",
    "contact-form",
    "wpcf7",
    "gravityforms",
    "ninja-forms",
];

const WHATSAPP_INDICATORS: &[&str] = &["wa.me", "whatsapp", "whats-app", "api.whatsapp.com"];

const WEAKNESS_INDICATORS: &[&str] = &[
    "under construction",
    "coming soon",
    "website by",
    "powered by",
    "template",
    "free website",
];

const MIN_WORD_COUNT: usize = 100;
const MIN_WEAKNESS_HITS: usize = 3;

const PLACEHOLDER_EMAIL_MARKERS: &[&str] = &["example.com", "test.com", "placeholder", "domain.com"];

static BOOKING_WIDGET_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(calendly|acuity|bookeo|reservio|timetap|setmore|simplybook)\.")
        .expect("booking widget pattern is valid")
});

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("email pattern is valid")
});

static EMAIL_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href^='mailto:']").expect("mailto selector is valid"));

/// Fetches a business website and derives quality signals from it.
#[derive(Clone)]
pub(crate) struct WebsiteAnalyzer {
    fetcher: Arc<dyn HtmlFetcher>,
}

impl WebsiteAnalyzer {
    pub(crate) fn new(fetcher: Arc<dyn HtmlFetcher>) -> Self {
        Self { fetcher }
    }

    /// Analyzes a website. Never fails: an unreachable site yields degraded
    /// signals (no https, unknown platform, weak) plus the error detail.
    pub(crate) async fn analyze(&self, website: &str) -> WebsiteSignals {
        if website.trim().is_empty() {
            return WebsiteSignals::no_website();
        }

        let url = match normalize_url(website) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(target: "analyze_task", "Unusable website '{}': {}", website, e);
                return WebsiteSignals::unreachable(e.to_string());
            }
        };

        let start_time = Instant::now();
        match self.fetcher.fetch(&url).await {
            Ok(page) => {
                let signals = derive_signals(&page);
                tracing::debug!(target: "analyze_task",
                    "Analyzed {} in {:.2?}: platform={}, https={}, booking={}, weak={}",
                    url, start_time.elapsed(), signals.platform, signals.has_https,
                    signals.has_online_booking, signals.is_weak_website
                );
                signals
            }
            Err(e) => {
                tracing::warn!(target: "analyze_task", "Could not analyze {}: {}", url, e);
                WebsiteSignals::unreachable(e.to_string())
            }
        }
    }
}

/// Derives signals from an already fetched page.
pub(crate) fn derive_signals(page: &FetchedPage) -> WebsiteSignals {
    let html_lower = page.body.to_lowercase();
    let word_count = page.body.split_whitespace().count();

    WebsiteSignals {
        has_https: page.final_url.scheme() == "https",
        status_code: Some(page.status),
        platform: detect_platform(&html_lower, page.final_url.as_str()),
        has_online_booking: detect_booking_system(&html_lower),
        is_weak_website: detect_weak_website(&html_lower, word_count),
        has_contact_form: contains_any(&html_lower, FORM_INDICATORS),
        has_whatsapp: contains_any(&html_lower, WHATSAPP_INDICATORS),
        word_count,
        contact_email: extract_email(&page.body),
        error: None,
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn detect_platform(html_lower: &str, final_url: &str) -> Platform {
    let url_lower = final_url.to_lowercase();
    for (platform, fingerprints) in PLATFORM_FINGERPRINTS {
        if contains_any(html_lower, fingerprints) {
            return *platform;
        }
        let url_hit = match platform {
            Platform::Shopify => url_lower.contains(".myshopify.com"),
            Platform::GoDaddy => url_lower.contains("godaddy.com"),
            _ => false,
        };
        if url_hit {
            return *platform;
        }
    }
    Platform::Custom
}

fn detect_booking_system(html_lower: &str) -> bool {
    contains_any(html_lower, BOOKING_INDICATORS) || BOOKING_WIDGET_REGEX.is_match(html_lower)
}

fn detect_weak_website(html_lower: &str, word_count: usize) -> bool {
    if word_count < MIN_WORD_COUNT {
        return true;
    }
    let hits = WEAKNESS_INDICATORS
        .iter()
        .filter(|indicator| html_lower.contains(*indicator))
        .count();
    hits >= MIN_WEAKNESS_HITS
}

/// Finds a contact e-mail on the page: `mailto:` links first, then free text.
pub(crate) fn extract_email(html: &str) -> Option<String> {
    let is_usable = |email: &str| {
        let lower = email.to_lowercase();
        EMAIL_REGEX.is_match(&lower)
            && !PLACEHOLDER_EMAIL_MARKERS
                .iter()
                .any(|marker| lower.contains(marker))
    };

    let document = Html::parse_document(html);
    for element in document.select(&EMAIL_LINK_SELECTOR) {
        if let Some(href) = element.value().attr("href") {
            if let Some(email_part) = href.strip_prefix("mailto:") {
                let email = email_part.split('?').next().unwrap_or("").trim();
                if !email.is_empty() && is_usable(email) {
                    return Some(email.to_lowercase());
                }
            }
        }
    }

    EMAIL_REGEX
        .find_iter(html)
        .map(|m| m.as_str())
        .find(|email| is_usable(email))
        .map(|email| email.to_lowercase())
}
