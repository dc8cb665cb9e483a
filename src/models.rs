//! Defines the core data structures used in the lead-scout application.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A (country, city) pair scoping one discovery session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Locality {
    pub country: String,
    pub city: String,
}

impl Locality {
    pub(crate) fn new(country: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            city: city.into(),
        }
    }
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

/// A business returned by an acquisition source, before qualification.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub(crate) struct Candidate {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub address: String,
    /// Source rating on a 0-5 scale, if the source reports one.
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    /// First category/type tag the source attached to the business.
    pub raw_category: Option<String>,
    /// Source-provided identifier (e.g. a place id).
    pub source_id: Option<String>,
}

/// Website platform detected from page fingerprints.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) enum Platform {
    Wix,
    WordPress,
    Shopify,
    Squarespace,
    Weebly,
    #[serde(rename = "GoDaddy Website Builder")]
    GoDaddy,
    Jimdo,
    Joomla,
    Drupal,
    #[serde(rename = "Custom/Unknown")]
    Custom,
    /// No website to analyze.
    #[default]
    #[serde(rename = "none")]
    None,
}

impl Platform {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Platform::Wix => "Wix",
            Platform::WordPress => "WordPress",
            Platform::Shopify => "Shopify",
            Platform::Squarespace => "Squarespace",
            Platform::Weebly => "Weebly",
            Platform::GoDaddy => "GoDaddy Website Builder",
            Platform::Jimdo => "Jimdo",
            Platform::Joomla => "Joomla",
            Platform::Drupal => "Drupal",
            Platform::Custom => "Custom/Unknown",
            Platform::None => "none",
        }
    }

    /// Site builders that usually mean a basic, template-driven site.
    pub(crate) fn is_outdated(&self) -> bool {
        matches!(
            self,
            Platform::Wix | Platform::WordPress | Platform::GoDaddy | Platform::Weebly
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Quality signals derived from a business website.
///
/// The `Default` value is the "no website" signal set: every negative signal
/// fires (no https, no booking, weak site).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct WebsiteSignals {
    pub has_https: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub platform: Platform,
    pub has_online_booking: bool,
    pub is_weak_website: bool,
    pub has_contact_form: bool,
    pub has_whatsapp: bool,
    pub word_count: usize,
    /// First plausible contact e-mail seen on the page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for WebsiteSignals {
    fn default() -> Self {
        Self::no_website()
    }
}

impl WebsiteSignals {
    pub(crate) fn no_website() -> Self {
        Self {
            has_https: false,
            status_code: None,
            platform: Platform::None,
            has_online_booking: false,
            is_weak_website: true,
            has_contact_form: false,
            has_whatsapp: false,
            word_count: 0,
            contact_email: None,
            error: None,
        }
    }

    /// Signals for a site that could not be fetched. Inaccessible counts as weak.
    pub(crate) fn unreachable(error: impl Into<String>) -> Self {
        Self {
            platform: Platform::Custom,
            error: Some(error.into()),
            ..Self::no_website()
        }
    }
}

/// A scored, justified candidate ready to be appended to the store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct Lead {
    pub country: String,
    pub city: String,
    pub category: String,
    pub business_name: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub address: String,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub lead_score: u32,
    pub value_justification: String,
    pub run_id: String,
    /// RFC 3339 timestamp taken when the lead was built.
    pub timestamp: String,
    pub website_signals: WebsiteSignals,
}

impl Lead {
    /// Cells in store column order (see `router::LEAD_HEADERS`).
    pub(crate) fn to_row(&self) -> Vec<String> {
        vec![
            self.country.clone(),
            self.city.clone(),
            self.category.clone(),
            self.business_name.clone(),
            self.phone.clone(),
            self.email.clone(),
            self.website.clone(),
            self.address.clone(),
            self.rating.map(|r| format!("{:.1}", r)).unwrap_or_default(),
            self.review_count.map(|c| c.to_string()).unwrap_or_default(),
            self.lead_score.to_string(),
            self.value_justification.clone(),
            self.run_id.clone(),
            self.timestamp.clone(),
        ]
    }
}

/// Snapshot of the run controller, as reported to front ends.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub(crate) struct RunStatus {
    pub is_running: bool,
    pub run_id: String,
    pub current_country: Option<String>,
    pub current_city: Option<String>,
    pub current_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregates over the leads of the current run.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub(crate) struct LeadStats {
    pub total_leads: usize,
    pub avg_score: f64,
    pub by_category: BTreeMap<String, usize>,
    pub by_country: BTreeMap<String, usize>,
}

impl LeadStats {
    pub(crate) fn from_leads(leads: &[Lead]) -> Self {
        if leads.is_empty() {
            return Self::default();
        }

        let mut by_category = BTreeMap::new();
        let mut by_country = BTreeMap::new();
        let mut total_score = 0u64;
        for lead in leads {
            total_score += u64::from(lead.lead_score);
            *by_category.entry(lead.category.clone()).or_insert(0) += 1;
            *by_country.entry(lead.country.clone()).or_insert(0) += 1;
        }

        let avg = total_score as f64 / leads.len() as f64;
        Self {
            total_leads: leads.len(),
            avg_score: (avg * 100.0).round() / 100.0,
            by_category,
            by_country,
        }
    }
}
