//! Candidate acquisition: a structured search API first, page scraping as fallback.

use crate::config::Config;
use crate::countries::get_country;
use crate::error::{AppError, Result};
use crate::fetch::HtmlFetcher;
use crate::models::{Candidate, Locality};
use crate::places::{PlacesClient, PlacesStatus};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A place businesses can be discovered from.
#[async_trait]
pub(crate) trait BusinessSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(
        &self,
        category: &str,
        locality: &Locality,
        max_results: usize,
    ) -> Result<Vec<Candidate>>;
}

/// Case-insensitive block-list over business names and websites.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExclusionFilter {
    terms: Vec<String>,
}

impl ExclusionFilter {
    pub(crate) fn new(terms: &[String]) -> Self {
        Self {
            terms: terms
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub(crate) fn excludes(&self, name: &str, website: Option<&str>) -> bool {
        let name = name.to_lowercase();
        let website = website.map(str::to_lowercase);
        self.terms.iter().any(|term| {
            name.contains(term) || website.as_deref().is_some_and(|w| w.contains(term))
        })
    }
}

const CLOSED_PERMANENTLY: &str = "CLOSED_PERMANENTLY";

/// Text search plus per-result details over the Places API.
pub(crate) struct PlacesSource {
    client: PlacesClient,
    exclusions: ExclusionFilter,
    detail_delay: Duration,
}

impl PlacesSource {
    pub(crate) fn new(client: PlacesClient, exclusions: ExclusionFilter, detail_delay: Duration) -> Self {
        Self {
            client,
            exclusions,
            detail_delay,
        }
    }
}

#[async_trait]
impl BusinessSource for PlacesSource {
    fn name(&self) -> &'static str {
        "places-api"
    }

    async fn search(
        &self,
        category: &str,
        locality: &Locality,
        max_results: usize,
    ) -> Result<Vec<Candidate>> {
        let query = format!("{} in {}", category, locality);
        let results = self.client.text_search(&query).await?;
        tracing::info!(target: "acquire_task", "Found {} results for '{}'", results.len(), query);

        let taken: Vec<_> = results.into_iter().take(max_results).collect();
        let total = taken.len();
        let mut candidates = Vec::new();

        for (idx, place) in taken.into_iter().enumerate() {
            let Some(place_id) = place.place_id.filter(|id| !id.trim().is_empty()) else {
                tracing::debug!(target: "acquire_task", "[{}] Skipping: no place id", idx + 1);
                continue;
            };
            let name = place.name.trim().to_string();
            if name.is_empty() {
                tracing::debug!(target: "acquire_task", "[{}] Skipping: no name", idx + 1);
                continue;
            }
            if self.exclusions.excludes(&name, None) {
                tracing::info!(target: "acquire_task", "[{}] Excluded: {}", idx + 1, name);
                continue;
            }
            if place.business_status.as_deref() == Some(CLOSED_PERMANENTLY) {
                tracing::info!(target: "acquire_task", "[{}] Skipping permanently closed: {}", idx + 1, name);
                continue;
            }

            let contact = match self.client.details(&place_id).await {
                Ok(contact) => contact.unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(target: "acquire_task", "Details lookup failed for {}: {}", name, e);
                    Default::default()
                }
            };

            candidates.push(Candidate {
                name,
                phone: contact.formatted_phone_number.unwrap_or_default(),
                email: String::new(),
                website: contact.website.unwrap_or_default(),
                address: place.formatted_address.unwrap_or_default().trim().to_string(),
                rating: place.rating,
                review_count: place.user_ratings_total,
                raw_category: place.types.into_iter().next(),
                source_id: Some(place_id),
            });

            if idx + 1 < total && !self.detail_delay.is_zero() {
                tokio::time::sleep(self.detail_delay).await;
            }
        }

        Ok(candidates)
    }
}

static ARTICLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[role="article"]"#).expect("article selector is valid"));
static HEADLINE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[class*="fontHeadlineSmall"]"#).expect("headline selector is valid")
});
static PHONE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[data-item-id*="phone"]"#).expect("phone selector is valid"));
static ADDRESS_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[data-item-id*="address"]"#).expect("address selector is valid")
});
static WEBSITE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[data-item-id*="authority"]"#).expect("website selector is valid")
});
static RATING_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[class*="fontDisplayLarge"]"#).expect("rating selector is valid")
});

/// Scrapes the public maps search page of the country's search domain.
///
/// Best-effort: the markup is not a stable interface and often yields nothing.
pub(crate) struct MapsScrapeSource {
    fetcher: Arc<dyn HtmlFetcher>,
    exclusions: ExclusionFilter,
}

impl MapsScrapeSource {
    pub(crate) fn new(fetcher: Arc<dyn HtmlFetcher>, exclusions: ExclusionFilter) -> Self {
        Self {
            fetcher,
            exclusions,
        }
    }

    pub(crate) fn search_url(category: &str, locality: &Locality) -> Result<Url> {
        let domain = get_country(&locality.country)
            .map(|c| c.search_domain)
            .unwrap_or("google.com");
        let mut url = Url::parse(&format!("https://www.{}/maps/search/", domain))?;
        url.path_segments_mut()
            .map_err(|_| AppError::InsufficientInput(format!("Cannot build search URL for {}", domain)))?
            .pop_if_empty()
            .push(&format!("{} in {}", category, locality.city));
        Ok(url)
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_listing(article: ElementRef<'_>) -> Option<Candidate> {
    let name = article
        .select(&HEADLINE_SELECTOR)
        .next()
        .map(element_text)
        .filter(|n| !n.is_empty())
        .or_else(|| article.value().attr("aria-label").map(|l| l.trim().to_string()))
        .filter(|n| !n.is_empty())?;

    let phone = article
        .select(&PHONE_SELECTOR)
        .next()
        .map(element_text)
        .unwrap_or_default();
    let address = article
        .select(&ADDRESS_SELECTOR)
        .next()
        .map(element_text)
        .unwrap_or_default();
    let website = article
        .select(&WEBSITE_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .unwrap_or_default()
        .to_string();
    let rating = article
        .select(&RATING_SELECTOR)
        .next()
        .and_then(|r| element_text(r).replace(',', ".").parse::<f64>().ok());

    Some(Candidate {
        name,
        phone,
        website,
        address,
        rating,
        ..Candidate::default()
    })
}

/// Extracts listings from a maps search page.
pub(crate) fn parse_listings(html: &str, max_results: usize) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    document
        .select(&ARTICLE_SELECTOR)
        .filter_map(parse_listing)
        .take(max_results)
        .collect()
}

#[async_trait]
impl BusinessSource for MapsScrapeSource {
    fn name(&self) -> &'static str {
        "maps-scrape"
    }

    async fn search(
        &self,
        category: &str,
        locality: &Locality,
        max_results: usize,
    ) -> Result<Vec<Candidate>> {
        let url = Self::search_url(category, locality)?;
        let page = self.fetcher.fetch(&url).await?;
        if !(200..300).contains(&page.status) {
            tracing::warn!(target: "acquire_task", "Maps search page returned {}", page.status);
            return Ok(Vec::new());
        }

        let listings = parse_listings(&page.body, max_results);
        if listings.is_empty() {
            tracing::info!(
                target: "acquire_task",
                "No listings parsed from {}; the page is likely rendered client-side",
                url
            );
        }
        Ok(listings
            .into_iter()
            .filter(|c| !self.exclusions.excludes(&c.name, Some(c.website.as_str())))
            .collect())
    }
}

/// Chooses between the primary source and the fallback. Never fails.
pub(crate) struct AcquisitionStrategy {
    primary: Option<Arc<dyn BusinessSource>>,
    fallback: Option<Arc<dyn BusinessSource>>,
    exclusions: ExclusionFilter,
}

impl AcquisitionStrategy {
    pub(crate) fn new(
        primary: Option<Arc<dyn BusinessSource>>,
        fallback: Option<Arc<dyn BusinessSource>>,
        exclusions: ExclusionFilter,
    ) -> Self {
        Self {
            primary,
            fallback,
            exclusions,
        }
    }

    /// Wires the Places source when an API key is configured and the scraper
    /// when the fallback is enabled.
    pub(crate) fn from_config(
        config: &Config,
        http_client: reqwest::Client,
        fetcher: Arc<dyn HtmlFetcher>,
    ) -> Self {
        let exclusions = ExclusionFilter::new(&config.excluded_terms);
        let primary = config.places_api_key.as_ref().map(|key| {
            let client = PlacesClient::new(http_client, key.clone(), config.places_base_url.clone());
            Arc::new(PlacesSource::new(
                client,
                exclusions.clone(),
                config.delay_between_requests,
            )) as Arc<dyn BusinessSource>
        });
        let fallback = config.scrape_fallback.then(|| {
            Arc::new(MapsScrapeSource::new(fetcher, exclusions.clone())) as Arc<dyn BusinessSource>
        });
        Self::new(primary, fallback, exclusions)
    }

    pub(crate) fn has_source(&self) -> bool {
        self.primary.is_some() || self.fallback.is_some()
    }

    pub(crate) async fn acquire(
        &self,
        category: &str,
        locality: &Locality,
        max_results: usize,
    ) -> Vec<Candidate> {
        let primary_result = match &self.primary {
            Some(primary) => self.run_primary(primary.as_ref(), category, locality, max_results).await,
            None => None,
        };

        let candidates = match primary_result {
            Some(candidates) => candidates,
            None => match &self.fallback {
                Some(fallback) => {
                    tracing::info!(target: "acquire_task", "Using {} for '{}'", fallback.name(), category);
                    fallback
                        .search(category, locality, max_results)
                        .await
                        .unwrap_or_else(|e| {
                            tracing::warn!(target: "acquire_task", "{} failed: {}", fallback.name(), e);
                            Vec::new()
                        })
                }
                None => Vec::new(),
            },
        };

        candidates
            .into_iter()
            .filter(|c| !self.exclusions.excludes(&c.name, Some(c.website.as_str())))
            .take(max_results)
            .collect()
    }

    /// `None` means the primary source is unavailable and the fallback should run.
    async fn run_primary(
        &self,
        primary: &dyn BusinessSource,
        category: &str,
        locality: &Locality,
        max_results: usize,
    ) -> Option<Vec<Candidate>> {
        match primary.search(category, locality, max_results).await {
            Ok(candidates) => Some(candidates),
            Err(AppError::Places { status, message }) => {
                let detail = message.unwrap_or_default();
                match &status {
                    PlacesStatus::ZeroResults => {
                        tracing::info!(target: "acquire_task", "No results for '{}' in {}", category, locality);
                    }
                    PlacesStatus::InvalidRequest => {
                        tracing::warn!(target: "acquire_task", "Invalid request for '{}': check query format {}", category, detail);
                    }
                    PlacesStatus::OverQueryLimit => {
                        tracing::warn!(target: "acquire_task", "Over query limit: check billing/quota {}", detail);
                    }
                    PlacesStatus::RequestDenied => {
                        tracing::warn!(target: "acquire_task", "Request denied: check API key and permissions {}", detail);
                    }
                    PlacesStatus::NotFound | PlacesStatus::Other(_) => {
                        tracing::warn!(target: "acquire_task", "Places API returned {} {}", status, detail);
                    }
                }
                if status.is_unavailable() && self.fallback.is_some() {
                    None
                } else {
                    Some(Vec::new())
                }
            }
            Err(e) => {
                tracing::warn!(target: "acquire_task", "{} failed for '{}': {}", primary.name(), category, e);
                Some(Vec::new())
            }
        }
    }
}
