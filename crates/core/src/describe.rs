//! Splits a free-text product description into display buckets.
//!
//! Descriptions are plain prose typed into the database console. Sentences
//! that open with a known label ("Savybės:", "Naudojimas:" and so on) are
//! pulled into their own section on the detail and quick-view pages.
//! Everything else stays in the summary. The bucketing is cosmetic only.

use serde::Serialize;

/// A description split into sections. Each entry is one sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DescriptionSections {
    pub summary: Vec<String>,
    pub features: Vec<String>,
    pub usage: Vec<String>,
    pub warnings: Vec<String>,
    pub ingredients: Vec<String>,
}

impl DescriptionSections {
    /// Whether any sentence landed outside the summary.
    #[must_use]
    pub fn has_details(&self) -> bool {
        !(self.features.is_empty()
            && self.usage.is_empty()
            && self.warnings.is_empty()
            && self.ingredients.is_empty())
    }
}

#[derive(Clone, Copy)]
enum Bucket {
    Features,
    Usage,
    Warnings,
    Ingredients,
}

/// Label prefixes, matched against the lowercased sentence.
const LABELS: &[(&str, Bucket)] = &[
    ("savybės:", Bucket::Features),
    ("naudojimas:", Bucket::Usage),
    ("įspėjimai:", Bucket::Warnings),
    ("atsargiai", Bucket::Warnings),
    ("sudėtis:", Bucket::Ingredients),
    ("ingredientai:", Bucket::Ingredients),
];

/// Bucket each `.`-separated sentence of `description`.
///
/// Labels ending in `:` are stripped from the stored sentence; "atsargiai"
/// is a word of the sentence itself and is kept.
#[must_use]
pub fn categorize(description: &str) -> DescriptionSections {
    let mut sections = DescriptionSections::default();

    for sentence in description.split('.').map(str::trim).filter(|s| !s.is_empty()) {
        let lower = sentence.to_lowercase();
        let matched = LABELS
            .iter()
            .find(|(label, _)| lower.starts_with(label));

        let Some(&(label, bucket)) = matched else {
            sections.summary.push(sentence.to_owned());
            continue;
        };

        let text = if label.ends_with(':') {
            // Lowercasing can change byte lengths, so count chars instead.
            let skip = label.chars().count();
            sentence.chars().skip(skip).collect::<String>().trim().to_owned()
        } else {
            sentence.to_owned()
        };
        if text.is_empty() {
            continue;
        }

        let target = match bucket {
            Bucket::Features => &mut sections.features,
            Bucket::Usage => &mut sections.usage,
            Bucket::Warnings => &mut sections.warnings,
            Bucket::Ingredients => &mut sections.ingredients,
        };
        target.push(text);
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_prose_is_summary() {
        let sections = categorize("Greitas įdegis. Ilgalaikis efektas.");
        assert_eq!(sections.summary, ["Greitas įdegis", "Ilgalaikis efektas"]);
        assert!(!sections.has_details());
    }

    #[test]
    fn test_labels_are_bucketed() {
        let sections = categorize(
            "Purškiamas losjonas. Savybės: drėkina odą. NAUDOJIMAS: tepti ant švarios odos. \
             Sudėtis: aqua, DHA. Atsargiai naudoti ant veido.",
        );
        assert_eq!(sections.summary, ["Purškiamas losjonas"]);
        assert_eq!(sections.features, ["drėkina odą"]);
        assert_eq!(sections.usage, ["tepti ant švarios odos"]);
        assert_eq!(sections.ingredients, ["aqua, DHA"]);
        assert_eq!(sections.warnings, ["Atsargiai naudoti ant veido"]);
        assert!(sections.has_details());
    }

    #[test]
    fn test_empty_description() {
        assert_eq!(categorize(""), DescriptionSections::default());
        assert_eq!(categorize(" . . "), DescriptionSections::default());
    }
}
