//! Document building
//!
//! Turns watch records into indexable text. With augmentation enabled every
//! record is written out through several fixed templates that vary wording
//! and field order, so a query phrased either way finds the movie.

use crate::loader::WatchRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Metadata stored with every indexed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub year: Option<i32>,
    pub rating: Option<f32>,
    pub watched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub augmented: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<usize>,
}

/// A unit of indexed text
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// Builds documents from watch records
#[derive(Debug, Clone, Copy)]
pub struct DocumentBuilder {
    augment: bool,
}

impl DocumentBuilder {
    pub fn new(augment: bool) -> Self {
        Self { augment }
    }

    /// Build every document for one indexing pass
    ///
    /// Ids are unique within the returned list: a record repeating an earlier
    /// title and year gets a `#n` suffix on its ids.
    pub fn build(&self, records: &[WatchRecord]) -> Vec<Document> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut documents = Vec::new();

        for record in records {
            let title = record.title.trim();
            let review = record.review.trim();
            let base_id = format!("{}_{}", title, record.year.unwrap_or(-1));

            let base_id = match seen.get_mut(&base_id) {
                Some(count) => {
                    *count += 1;
                    format!("{}#{}", base_id, count)
                }
                None => {
                    seen.insert(base_id.clone(), 0);
                    base_id
                }
            };

            let metadata = DocumentMetadata {
                title: title.to_string(),
                year: record.year,
                rating: record.rating,
                watched: record.watched,
                augmented: None,
                variant: None,
            };

            if self.augment {
                let variants = augmented_texts(title, record.year, record.rating, review);
                for (idx, text) in variants.into_iter().enumerate() {
                    documents.push(Document {
                        id: format!("{}_aug{}", base_id, idx),
                        text,
                        metadata: DocumentMetadata {
                            augmented: Some(true),
                            variant: Some(idx),
                            ..metadata.clone()
                        },
                    });
                }
            } else {
                documents.push(Document {
                    id: base_id,
                    text: canonical_text(title, record.year, record.rating, review),
                    metadata,
                });
            }
        }

        debug!(
            "Built {} documents from {} records (augmentation: {})",
            documents.len(),
            records.len(),
            self.augment
        );
        documents
    }
}

/// Render a rating the way the templates expect (`4.0`, `4.5`)
pub fn format_rating(rating: f32) -> String {
    if rating.fract() == 0.0 {
        format!("{:.1}", rating)
    } else {
        format!("{}", rating)
    }
}

fn year_or(year: Option<i32>, unknown: &str) -> String {
    year.map(|y| y.to_string())
        .unwrap_or_else(|| unknown.to_string())
}

/// The single template used when augmentation is disabled
pub fn canonical_text(title: &str, year: Option<i32>, rating: Option<f32>, review: &str) -> String {
    let mut text = format!("Film: {} ({})", title, year_or(year, "Yıl yok"));
    if let Some(rating) = rating {
        text.push_str(&format!(" | Puan: {}/5", format_rating(rating)));
    }
    if !review.is_empty() {
        text.push_str(&format!(" | Yorum: {}", review));
    }
    text
}

/// Paraphrased variants of one record; the first is the canonical template
pub fn augmented_texts(
    title: &str,
    year: Option<i32>,
    rating: Option<f32>,
    review: &str,
) -> Vec<String> {
    let mut texts = vec![canonical_text(title, year, rating, review)];

    let mut alternate = format!("{} adlı {} yapımı film", title, year_or(year, "bilinmeyen yıl"));
    if let Some(rating) = rating {
        alternate.push_str(&format!(" | Kullanıcı puanı: {}/5", format_rating(rating)));
    }
    if !review.is_empty() {
        alternate.push_str(&format!(" | İnceleme: {}", review));
    }
    texts.push(alternate);

    let mut labelled = format!("Film adı: {}", title);
    if let Some(year) = year {
        labelled.push_str(&format!(" | Yapım yılı: {}", year));
    }
    if let Some(rating) = rating {
        labelled.push_str(&format!(" | Değerlendirme: {} yıldız", format_rating(rating)));
    }
    if !review.is_empty() {
        labelled.push_str(&format!(" | Kullanıcı yorumu: {}", review));
    }
    texts.push(labelled);

    if let (Some(rating), false) = (rating, review.is_empty()) {
        texts.push(format!(
            "{} ({}) - {}/5 puanlı bir film. İnceleme: {}",
            title,
            year_or(year, "Bilinmeyen yıl"),
            format_rating(rating),
            review
        ));
    }

    texts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn record(title: &str, year: Option<i32>, rating: Option<f32>, review: &str) -> WatchRecord {
        WatchRecord {
            title: title.to_string(),
            year,
            rating,
            review: review.to_string(),
            watched: true,
        }
    }

    #[test]
    fn test_arrival_without_review_yields_three_documents() {
        let docs = DocumentBuilder::new(true).build(&[record("Arrival", Some(2016), Some(4.5), "")]);

        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].id, "Arrival_2016_aug0");
        assert_eq!(docs[0].text, "Film: Arrival (2016) | Puan: 4.5/5");
        assert_eq!(docs[1].text, "Arrival adlı 2016 yapımı film | Kullanıcı puanı: 4.5/5");
        assert_eq!(
            docs[2].text,
            "Film adı: Arrival | Yapım yılı: 2016 | Değerlendirme: 4.5 yıldız"
        );
    }

    #[test]
    fn test_review_adds_fourth_variant_with_shared_metadata() {
        let docs = DocumentBuilder::new(true).build(&[record(
            " Heat ",
            Some(1995),
            Some(5.0),
            " Perfect. ",
        )]);

        assert_eq!(docs.len(), 4);
        assert_eq!(
            docs[3].text,
            "Heat (1995) - 5.0/5 puanlı bir film. İnceleme: Perfect."
        );
        for (idx, doc) in docs.iter().enumerate() {
            assert_eq!(doc.metadata.title, "Heat");
            assert_eq!(doc.metadata.year, Some(1995));
            assert_eq!(doc.metadata.rating, Some(5.0));
            assert_eq!(doc.metadata.variant, Some(idx));
            assert_eq!(doc.metadata.augmented, Some(true));
        }
    }

    #[test]
    fn test_unknown_fields_use_template_wording() {
        let docs = DocumentBuilder::new(true).build(&[record("Stalker", None, None, "Slow")]);

        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].id, "Stalker_-1_aug0");
        assert_eq!(docs[0].text, "Film: Stalker (Yıl yok) | Yorum: Slow");
        assert_eq!(docs[1].text, "Stalker adlı bilinmeyen yıl yapımı film | İnceleme: Slow");
        assert_eq!(docs[2].text, "Film adı: Stalker | Kullanıcı yorumu: Slow");
    }

    #[test]
    fn test_without_augmentation_one_canonical_document() {
        let docs = DocumentBuilder::new(false).build(&[
            record("Arrival", Some(2016), Some(4.0), ""),
            record("Heat", Some(1995), Some(5.0), "Great"),
        ]);

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "Arrival_2016");
        assert_eq!(docs[0].text, "Film: Arrival (2016) | Puan: 4.0/5");
        assert_eq!(docs[0].metadata.augmented, None);
        assert_eq!(docs[1].text, "Film: Heat (1995) | Puan: 5.0/5 | Yorum: Great");
    }

    #[test]
    fn test_ids_unique_within_pass() {
        let records = vec![
            record("Dune", Some(2021), Some(4.0), ""),
            record("Dune", Some(2021), Some(3.0), ""),
            record("Dune", Some(1984), Some(2.0), ""),
        ];

        for augment in [true, false] {
            let docs = DocumentBuilder::new(augment).build(&records);
            let ids: HashSet<_> = docs.iter().map(|d| d.id.as_str()).collect();
            assert_eq!(ids.len(), docs.len());
        }
    }

    #[test]
    fn test_format_rating() {
        assert_eq!(format_rating(4.0), "4.0");
        assert_eq!(format_rating(3.5), "3.5");
        assert_eq!(format_rating(0.0), "0.0");
    }
}
