//! Column classification
//!
//! Maps a raw column/item label to a semantic [`Category`] and extracts the
//! module number from its leading dotted numeric token.

use crate::types::Category;

/// Ordered keyword rules evaluated in fixed priority order.
///
/// The order is a deliberate tie-break: a label containing both "Lab" and
/// "Assessment" substrings classifies as `Lab` because that keyword is tested
/// first. Changing this order changes classification for such labels.
const KEYWORD_RULES: [(&str, Category); 5] = [
    ("lab", Category::Lab),
    ("lesson", Category::Lesson),
    ("fact sheet", Category::FactSheet),
    ("video", Category::Video),
    ("assessment", Category::Assessment),
];

/// Stateless classifier over the fixed keyword rules.
///
/// Constructed once and injected into the normalizers; the rule table is
/// configuration, not mutable state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnClassifier;

impl ColumnClassifier {
    pub fn new() -> Self {
        ColumnClassifier
    }

    /// Classify a label: first case-insensitive substring match wins,
    /// no match yields `Other`.
    pub fn categorize(&self, label: &str) -> Category {
        let lower = label.to_lowercase();
        for (keyword, category) in KEYWORD_RULES {
            if lower.contains(keyword) {
                return category;
            }
        }
        Category::Other
    }

    /// Extract the module number: the first digit run immediately followed by
    /// a `.`, i.e. the `<module>` of a `"<module>.<unit>.<item>"` token.
    ///
    /// Lettered section prefixes skip past the letter, so "Lab - B.2.6"
    /// resolves to module 2. Labels with no dotted numeric token have none.
    pub fn module_number(&self, label: &str) -> Option<u32> {
        let bytes = label.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i].is_ascii_digit() {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i < bytes.len() && bytes[i] == b'.' {
                    return label[start..i].parse().ok();
                }
            } else {
                i += 1;
            }
        }
        None
    }

    /// Classify and extract in one step.
    pub fn classify(&self, label: &str) -> (Category, Option<u32>) {
        (self.categorize(label), self.module_number(label))
    }
}
