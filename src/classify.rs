//! Keyword-pattern announcement classifier.
//!
//! Maps raw title/summary/source text to one announcement category plus a
//! classifier-confidence score. The score is informational only: persistence
//! is gated by the per-channel source-trust confidence, never by this value.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementType {
    PartnershipAgreement,
    ProductAnnouncement,
    BusinessAnnouncement,
    PricingUpdate,
    LeadershipHiring,
    PressCoverage,
    GeneralUpdate,
}

impl AnnouncementType {
    pub const ALL: [AnnouncementType; 7] = [
        AnnouncementType::ProductAnnouncement,
        AnnouncementType::BusinessAnnouncement,
        AnnouncementType::PartnershipAgreement,
        AnnouncementType::PricingUpdate,
        AnnouncementType::LeadershipHiring,
        AnnouncementType::PressCoverage,
        AnnouncementType::GeneralUpdate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnnouncementType::PartnershipAgreement => "partnership_agreement",
            AnnouncementType::ProductAnnouncement => "product_announcement",
            AnnouncementType::BusinessAnnouncement => "business_announcement",
            AnnouncementType::PricingUpdate => "pricing_update",
            AnnouncementType::LeadershipHiring => "leadership_hiring",
            AnnouncementType::PressCoverage => "press_coverage",
            AnnouncementType::GeneralUpdate => "general_update",
        }
    }

    /// Categories the dashboard treats as strategically significant.
    pub fn is_strategic(self) -> bool {
        matches!(
            self,
            AnnouncementType::PartnershipAgreement
                | AnnouncementType::ProductAnnouncement
                | AnnouncementType::BusinessAnnouncement
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub announcement_type: AnnouncementType,
    pub confidence: f64,
}

static RE_PARTNERSHIP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"partnership|partnered|agreement|integrat|alliance|collaborat").unwrap()
});
static RE_PRODUCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"launch|released|introduc|new product|new feature|rollout|debut|unveil").unwrap()
});
static RE_BUSINESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"press release|announc|acquisition|merger|funding|investment|expan|strategic")
        .unwrap()
});
static RE_PRICING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"pricing|price|subscription|plan|fee|cost").unwrap());
static RE_LEADERSHIP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"hiring|hired|appoint|executive|ceo|cto|vp|head of|jobs|careers").unwrap()
});
static RE_PRESS_WIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"press|newswire|businesswire|globenewswire|einnews|yahoo finance").unwrap()
});

/// Classify a candidate update. Pattern groups are tested in fixed priority
/// order and the first match wins.
pub fn classify_announcement(
    title: &str,
    summary: &str,
    source_type: &str,
    url: &str,
) -> Classification {
    let blob = format!("{title} {summary} {source_type} {url}").to_lowercase();

    let (announcement_type, confidence) = if RE_PARTNERSHIP.is_match(&blob) {
        (AnnouncementType::PartnershipAgreement, 0.92)
    } else if RE_PRODUCT.is_match(&blob) {
        (AnnouncementType::ProductAnnouncement, 0.9)
    } else if RE_BUSINESS.is_match(&blob) {
        (AnnouncementType::BusinessAnnouncement, 0.88)
    } else if RE_PRICING.is_match(&blob) {
        (AnnouncementType::PricingUpdate, 0.86)
    } else if RE_LEADERSHIP.is_match(&blob) {
        (AnnouncementType::LeadershipHiring, 0.84)
    } else if RE_PRESS_WIRE.is_match(&blob) {
        (AnnouncementType::PressCoverage, 0.82)
    } else {
        (AnnouncementType::GeneralUpdate, 0.8)
    };

    Classification {
        announcement_type,
        confidence,
    }
}
