//! Category tally of a creator's catalog.

use super::category::{categorize, find_training_data_files, Category};
use super::model::CatalogItem;
use std::collections::BTreeMap;

/// Names of a creator's items grouped by category.
///
/// Items are counted under their own category, and every file tagged as
/// training data is additionally counted under [`Category::TrainingData`]. The
/// same item can therefore appear in two buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSurvey {
    categorized: BTreeMap<Category, Vec<String>>,
    /// Name and declared type of every item that landed in `Other`.
    other_types: Vec<(String, Option<String>)>,
}

impl CatalogSurvey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one item.
    pub fn record(&mut self, item: &CatalogItem) {
        let category = categorize(item);
        self.categorized
            .entry(category)
            .or_default()
            .push(item.name.clone());

        let training = find_training_data_files(item);
        if !training.is_empty() {
            self.categorized
                .entry(Category::TrainingData)
                .or_default()
                .extend(training);
        }

        if category == Category::Other {
            self.other_types.push((item.name.clone(), item.kind.clone()));
        }
    }

    pub fn total(&self) -> usize {
        self.categorized.values().map(Vec::len).sum()
    }

    pub fn count(&self, category: Category) -> usize {
        self.names(category).len()
    }

    pub fn names(&self, category: Category) -> &[String] {
        self.categorized
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn other_types(&self) -> &[(String, Option<String>)] {
        &self.other_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_training_data_double_counts() {
        let mut survey = CatalogSurvey::new();
        let lora = CatalogItem::from_value(json!({
            "id": 1, "name": "Foxy", "type": "LORA",
            "modelVersions": [{"name": "v1", "files": [
                {"name": "foxy.safetensors", "downloadUrl": "u", "type": "Model"},
                {"name": "foxy_data.zip", "downloadUrl": "u", "type": "Training Data"}
            ]}]
        }))
        .unwrap();
        let vae = CatalogItem::from_value(json!({"id": 2, "name": "Clear VAE", "type": "VAE"})).unwrap();
        survey.record(&lora);
        survey.record(&vae);

        assert_eq!(survey.total(), 3);
        assert_eq!(survey.count(Category::Lora), 1);
        assert_eq!(survey.count(Category::TrainingData), 1);
        assert_eq!(survey.count(Category::Other), 1);
        assert_eq!(survey.count(Category::Checkpoints), 0);
        assert_eq!(
            survey.other_types(),
            &[("Clear VAE".to_string(), Some("VAE".to_string()))]
        );
    }
}
