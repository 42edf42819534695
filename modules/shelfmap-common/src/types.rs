use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Resolution provenance ---

/// Which tier produced a resolution. Serialized snake_case so downstream
/// consumers and stored review queues see stable tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Cache,
    ExactMatch,
    CaseInsensitive,
    AliasMatch,
    ExistingMapping,
    FuzzyMatch,
    AutoCreated,
    NoMatch,
    InvalidInput,
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionSource::Cache => write!(f, "cache"),
            ResolutionSource::ExactMatch => write!(f, "exact_match"),
            ResolutionSource::CaseInsensitive => write!(f, "case_insensitive"),
            ResolutionSource::AliasMatch => write!(f, "alias_match"),
            ResolutionSource::ExistingMapping => write!(f, "existing_mapping"),
            ResolutionSource::FuzzyMatch => write!(f, "fuzzy_match"),
            ResolutionSource::AutoCreated => write!(f, "auto_created"),
            ResolutionSource::NoMatch => write!(f, "no_match"),
            ResolutionSource::InvalidInput => write!(f, "invalid_input"),
        }
    }
}

/// How a category mapping came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingType {
    Manual,
    Automatic,
    Fuzzy,
}

impl std::fmt::Display for MappingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingType::Manual => write!(f, "manual"),
            MappingType::Automatic => write!(f, "automatic"),
            MappingType::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

// --- Resolution results ---

/// Outcome of resolving a raw brand string to a canonical Brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandResolution {
    pub brand_id: Option<Uuid>,
    pub canonical_name: Option<String>,
    pub confidence: f64,
    pub source: ResolutionSource,
    pub needs_review: bool,
}

impl BrandResolution {
    /// Empty or whitespace-only input. Never touches the store.
    pub fn invalid_input() -> Self {
        Self {
            brand_id: None,
            canonical_name: None,
            confidence: 0.0,
            source: ResolutionSource::InvalidInput,
            needs_review: true,
        }
    }

    /// No tier matched and auto-creation is disabled. A valid negative
    /// outcome, not an error.
    pub fn no_match() -> Self {
        Self {
            brand_id: None,
            canonical_name: None,
            confidence: 0.0,
            source: ResolutionSource::NoMatch,
            needs_review: true,
        }
    }
}

/// Outcome of resolving a (platform, raw category string) pair to a
/// canonical (category, subcategory) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResolution {
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub subcategory_name: Option<String>,
    pub confidence: f64,
    pub source: ResolutionSource,
    pub needs_review: bool,
}

impl CategoryResolution {
    pub fn invalid_input() -> Self {
        Self {
            category_id: None,
            subcategory_id: None,
            category_name: None,
            subcategory_name: None,
            confidence: 0.0,
            source: ResolutionSource::InvalidInput,
            needs_review: true,
        }
    }

    pub fn no_match() -> Self {
        Self {
            category_id: None,
            subcategory_id: None,
            category_name: None,
            subcategory_name: None,
            confidence: 0.0,
            source: ResolutionSource::NoMatch,
            needs_review: true,
        }
    }
}
