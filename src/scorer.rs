//! Lead scoring and value justification.

use crate::models::{Candidate, WebsiteSignals};
use serde::{Deserialize, Serialize};

/// Scores are capped here for readability.
pub(crate) const MAX_SCORE: u32 = 150;

const LOW_RATING_BELOW: f64 = 3.5;
const MEDIUM_RATING_BELOW: f64 = 4.0;
const FEW_REVIEWS_BELOW: u32 = 50;

/// Point weights per signal. Keys missing from a configuration table count as 0.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct ScoreWeights {
    pub has_phone: u32,
    pub has_email: u32,
    pub has_address: u32,
    /// Rating below 3.5.
    pub low_rating: u32,
    /// Rating in [3.5, 4.0).
    pub medium_rating: u32,
    /// Fewer than 50 reviews.
    pub few_reviews: u32,
    pub outdated_platform: u32,
    pub no_online_booking: u32,
    pub no_https: u32,
    pub weak_website: u32,
}

/// Everything the scorer looks at for one candidate.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScoreInput<'a> {
    pub has_phone: bool,
    pub has_email: bool,
    pub has_address: bool,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub signals: &'a WebsiteSignals,
}

impl<'a> ScoreInput<'a> {
    pub(crate) fn for_candidate(candidate: &Candidate, signals: &'a WebsiteSignals) -> Self {
        Self {
            has_phone: !candidate.phone.trim().is_empty(),
            has_email: !candidate.email.trim().is_empty(),
            has_address: !candidate.address.trim().is_empty(),
            rating: candidate.rating,
            review_count: candidate.review_count,
            signals,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RatingBand {
    Low,
    Medium,
}

fn rating_band(rating: Option<f64>) -> Option<RatingBand> {
    match rating {
        Some(r) if r < LOW_RATING_BELOW => Some(RatingBand::Low),
        Some(r) if r < MEDIUM_RATING_BELOW => Some(RatingBand::Medium),
        _ => None,
    }
}

fn has_few_reviews(review_count: Option<u32>) -> bool {
    review_count.is_some_and(|count| count < FEW_REVIEWS_BELOW)
}

/// Sector groups used to pick the closing fragment of a justification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sector {
    Healthcare,
    Beauty,
    Fitness,
    Professional,
    Education,
    HomeServices,
    Automotive,
    Events,
    Retail,
    Creative,
    Hospitality,
    Other,
}

const SECTOR_TABLE: &[(Sector, &[&str])] = &[
    (
        Sector::Hospitality,
        &[
            "restaurant",
            "fine dining restaurant",
            "cafe",
            "coffee shop",
            "bakery",
            "pizzeria",
            "catering service",
            "food truck",
            "hotel",
            "boutique hotel",
            "guest house",
        ],
    ),
    (
        Sector::Healthcare,
        &[
            "dental clinic",
            "medical clinic",
            "doctor office",
            "veterinary clinic",
            "physiotherapy clinic",
            "chiropractic clinic",
            "massage therapy",
            "acupuncture clinic",
            "psychology clinic",
            "counseling center",
            "mental health clinic",
            "dermatology clinic",
            "skin clinic",
            "diagnostic center",
            "pet clinic",
            "animal hospital",
        ],
    ),
    (
        Sector::Beauty,
        &[
            "beauty salon",
            "hair salon",
            "barber shop",
            "nail salon",
            "spa",
            "massage spa",
            "esthetician",
            "makeup studio",
            "tattoo parlor",
            "piercing studio",
            "laser hair removal",
            "cosmetic clinic",
            "pet grooming",
            "dog grooming",
        ],
    ),
    (
        Sector::Fitness,
        &[
            "fitness center",
            "gym",
            "crossfit gym",
            "yoga studio",
            "pilates studio",
            "martial arts school",
            "dance studio",
            "personal trainer",
        ],
    ),
    (
        Sector::Professional,
        &[
            "law firm",
            "law office",
            "accounting firm",
            "chartered accountant",
            "consulting firm",
            "financial advisor",
            "insurance agency",
            "real estate agency",
            "real estate agent",
            "mortgage broker",
            "tax preparer",
            "tax consultant",
        ],
    ),
    (
        Sector::Education,
        &[
            "coaching institute",
            "tutoring center",
            "driving school",
            "music school",
            "language school",
            "art school",
            "training center",
            "bootcamp",
            "coding bootcamp",
            "dance academy",
        ],
    ),
    (
        Sector::HomeServices,
        &[
            "plumber",
            "electrician",
            "hvac contractor",
            "handyman",
            "carpenter",
            "roofer",
            "painter",
            "landscaping service",
            "lawn care service",
            "cleaning service",
            "house cleaning",
            "moving company",
            "locksmith",
            "appliance repair",
            "pest control service",
        ],
    ),
    (
        Sector::Automotive,
        &[
            "auto repair shop",
            "car mechanic",
            "auto body shop",
            "car wash",
            "tire shop",
            "auto detailing",
            "car detailing",
            "computer repair",
            "phone repair",
        ],
    ),
    (
        Sector::Events,
        &[
            "photography studio",
            "wedding photographer",
            "event planner",
            "wedding planner",
            "caterer",
            "florist",
            "dj service",
            "party rental",
            "party rental service",
        ],
    ),
    (
        Sector::Retail,
        &[
            "e-commerce store",
            "online store",
            "retail store",
            "boutique",
            "jewelry store",
            "furniture store",
            "pet store",
        ],
    ),
    (
        Sector::Creative,
        &[
            "digital marketing agency",
            "web design agency",
            "graphic design studio",
            "advertising agency",
            "video production",
            "printing service",
        ],
    ),
];

impl Sector {
    pub(crate) fn for_category(category: &str) -> Sector {
        let needle = category.trim().to_lowercase();
        SECTOR_TABLE
            .iter()
            .find(|(_, categories)| categories.contains(&needle.as_str()))
            .map(|(sector, _)| *sector)
            .unwrap_or(Sector::Other)
    }

    fn closing_fragment(&self) -> Option<&'static str> {
        match self {
            Sector::Hospitality => {
                Some("hospitality sector benefits from booking/reservation systems")
            }
            Sector::Healthcare => Some(
                "healthcare sector needs secure, compliant digital solutions and appointment systems",
            ),
            Sector::Beauty => {
                Some("appointment-based business that benefits from online booking and CRM")
            }
            Sector::Fitness => Some(
                "fitness business benefits from membership management and class scheduling",
            ),
            Sector::Professional => Some(
                "professional service that benefits from CRM, scheduling, and client management",
            ),
            Sector::Education => Some(
                "education business needs scheduling, student management, and payment systems",
            ),
            Sector::HomeServices => Some(
                "service business that benefits from scheduling, dispatch, and customer management",
            ),
            Sector::Automotive => Some(
                "service business benefits from appointment scheduling and customer tracking",
            ),
            Sector::Events => Some(
                "event-based business needs booking, calendar management, and client communication",
            ),
            Sector::Retail => {
                Some("retail business benefits from inventory management and online presence")
            }
            Sector::Creative => {
                Some("creative agency benefits from project management and client portals")
            }
            Sector::Other => None,
        }
    }
}

const GENERIC_REASON: &str = "local business with digital growth potential";

/// Converts signals into a bounded score and a short justification.
#[derive(Debug, Clone)]
pub(crate) struct LeadScorer {
    weights: ScoreWeights,
}

impl LeadScorer {
    pub(crate) fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Additive score, clamped to `MAX_SCORE`. Pure function of its input.
    pub(crate) fn score(&self, input: &ScoreInput<'_>) -> u32 {
        let w = &self.weights;
        let signals = input.signals;
        let mut score = 0u32;

        if input.has_phone {
            score = score.saturating_add(w.has_phone);
        }
        if input.has_email {
            score = score.saturating_add(w.has_email);
        }
        if input.has_address {
            score = score.saturating_add(w.has_address);
        }

        match rating_band(input.rating) {
            Some(RatingBand::Low) => score = score.saturating_add(w.low_rating),
            Some(RatingBand::Medium) => score = score.saturating_add(w.medium_rating),
            None => {}
        }

        if has_few_reviews(input.review_count) {
            score = score.saturating_add(w.few_reviews);
        }
        if signals.platform.is_outdated() {
            score = score.saturating_add(w.outdated_platform);
        }
        if !signals.has_online_booking {
            score = score.saturating_add(w.no_online_booking);
        }
        if !signals.has_https {
            score = score.saturating_add(w.no_https);
        }
        if signals.is_weak_website {
            score = score.saturating_add(w.weak_website);
        }

        score.min(MAX_SCORE)
    }

    /// Human-readable reasons, at most three of them, ending with a sector hint.
    pub(crate) fn justify(&self, input: &ScoreInput<'_>, category: &str) -> String {
        let signals = input.signals;
        let mut reasons: Vec<String> = Vec::new();

        if input.has_phone {
            reasons.push("direct phone contact available".to_string());
        }
        if input.has_email {
            reasons.push("email accessible".to_string());
        }

        if let Some(rating) = input.rating {
            match rating_band(Some(rating)) {
                Some(RatingBand::Low) => reasons.push(format!(
                    "low rating ({:.1}) suggests improvement needed",
                    rating
                )),
                Some(RatingBand::Medium) => reasons.push(format!(
                    "moderate rating ({:.1}) indicates potential for enhancement",
                    rating
                )),
                None => {}
            }
        }

        if has_few_reviews(input.review_count) {
            reasons.push("growing business with room for digital expansion".to_string());
        }
        if signals.platform.is_outdated() {
            reasons.push(format!(
                "uses basic platform ({}) - modernization opportunity",
                signals.platform
            ));
        }
        if !signals.has_online_booking {
            reasons.push("no online booking system - automation opportunity".to_string());
        }
        if !signals.has_https {
            reasons.push("lacks HTTPS - security/trust improvement needed".to_string());
        }
        if signals.is_weak_website {
            reasons.push("website needs modernization".to_string());
        }
        if signals.has_whatsapp {
            reasons.push("uses WhatsApp - ready for digital tools".to_string());
        }

        if let Some(fragment) = Sector::for_category(category).closing_fragment() {
            reasons.push(fragment.to_string());
        }
        if reasons.is_empty() {
            reasons.push(GENERIC_REASON.to_string());
        }

        join_reasons(&reasons)
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn join_reasons(reasons: &[String]) -> String {
    match reasons {
        [] => String::new(),
        [only] => format!("{}.", capitalize_first(only)),
        [first, second] => format!("{} and {}.", capitalize_first(first), second),
        [first, second, third, ..] => {
            format!("{}, {}, and {}.", capitalize_first(first), second, third)
        }
    }
}
