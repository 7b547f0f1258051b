//! Length validation for localization attributes.
//!
//! App Store Connect rejects attributes above fixed character limits. The
//! checks run locally so that a locale with an oversized field is skipped
//! before any request is made.

use std::fmt;

use unicode_segmentation::UnicodeSegmentation;

use crate::attributes::AttributeSet;

/// A text attribute of an App Store version localization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Description,
    Keywords,
    PromotionalText,
    WhatsNew,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::Description,
        Attribute::Keywords,
        Attribute::PromotionalText,
        Attribute::WhatsNew,
    ];

    /// Name of the attribute as used by App Store Connect and local files
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Description => "description",
            Attribute::Keywords => "keywords",
            Attribute::PromotionalText => "promotionalText",
            Attribute::WhatsNew => "whatsNew",
        }
    }

    /// Maximum number of characters App Store Connect accepts
    pub fn max_len(&self) -> usize {
        match self {
            Attribute::Description => 4000,
            Attribute::Keywords => 100,
            Attribute::PromotionalText => 170,
            Attribute::WhatsNew => 4000,
        }
    }

    fn value<'a>(&self, attrs: &'a AttributeSet) -> Option<&'a str> {
        match self {
            Attribute::Description => attrs.description.as_deref(),
            Attribute::Keywords => attrs.keywords.as_deref(),
            Attribute::PromotionalText => attrs.promotional_text.as_deref(),
            Attribute::WhatsNew => attrs.whats_new.as_deref(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attributes of one `AttributeSet` that exceed their limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub failures: Vec<Attribute>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Check a single optional attribute value.
///
/// Absent values are valid. Length is counted in extended grapheme clusters
/// (user-perceived characters), which is how App Store Connect counts.
pub fn is_valid(text: Option<&str>, max_len: usize) -> bool {
    text.map_or(true, |t| t.graphemes(true).count() <= max_len)
}

/// Check every attribute, collecting all failures instead of stopping at the first.
pub fn validate_all(attrs: &AttributeSet) -> ValidationReport {
    let failures = Attribute::ALL
        .into_iter()
        .filter(|attr| !is_valid(attr.value(attrs), attr.max_len()))
        .collect();

    ValidationReport { failures }
}
