//! Label extraction from file names
//!
//! A single positive pattern decides the label: 1 when the file name
//! contains it, 0 otherwise. The negative pattern is only consulted by the
//! indexer to decide which files belong to the dataset at all.

use std::borrow::Cow;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Label of the negative class (cat)
pub const NEGATIVE_LABEL: u8 = 0;
/// Label of the positive class (dog)
pub const POSITIVE_LABEL: u8 = 1;

/// The file-name patterns of the two classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRule {
    pub positive_pattern: String,
    pub negative_pattern: String,
}

impl Default for LabelRule {
    fn default() -> Self {
        Self {
            positive_pattern: "dog".to_string(),
            negative_pattern: "cat".to_string(),
        }
    }
}

impl LabelRule {
    pub fn new(positive_pattern: impl Into<String>, negative_pattern: impl Into<String>) -> Self {
        Self {
            positive_pattern: positive_pattern.into(),
            negative_pattern: negative_pattern.into(),
        }
    }

    /// Binary label of `path`
    pub fn label(&self, path: &Path) -> u8 {
        extract_label(path, &self.positive_pattern)
    }

    /// Class membership used for indexing; `None` when neither pattern matches
    pub fn classify(&self, path: &Path) -> Option<u8> {
        let name = file_name(path);
        if name.contains(self.positive_pattern.as_str()) {
            Some(POSITIVE_LABEL)
        } else if name.contains(self.negative_pattern.as_str()) {
            Some(NEGATIVE_LABEL)
        } else {
            None
        }
    }

    /// Human-readable class name for a label
    pub fn class_name(&self, label: u8) -> &str {
        if label == POSITIVE_LABEL {
            &self.positive_pattern
        } else {
            &self.negative_pattern
        }
    }

    pub fn labels<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<u8> {
        paths.iter().map(|p| self.label(p.as_ref())).collect()
    }
}

/// 1 if `positive_pattern` occurs in the file name of `path`, else 0
pub fn extract_label(path: &Path, positive_pattern: &str) -> u8 {
    if file_name(path).contains(positive_pattern) {
        POSITIVE_LABEL
    } else {
        NEGATIVE_LABEL
    }
}

fn file_name(path: &Path) -> Cow<'_, str> {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_else(|| path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_dog_is_positive() {
        assert_eq!(extract_label(Path::new("train/dog.12.jpg"), "dog"), 1);
        assert_eq!(extract_label(Path::new("train/cat.12.jpg"), "dog"), 0);
    }

    #[test]
    fn test_only_file_name_is_inspected() {
        // A directory called "dogs" must not turn every cat into a dog
        let path = Path::new("/data/dogs-vs-cats/train/cat.1.jpg");
        assert_eq!(LabelRule::default().label(path), 0);
    }

    #[test]
    fn test_classify_prefers_positive() {
        let rule = LabelRule::default();
        assert_eq!(rule.classify(Path::new("catdog.jpg")), Some(1));
        assert_eq!(rule.classify(Path::new("cat.5.jpg")), Some(0));
        assert_eq!(rule.classify(Path::new("bird.5.jpg")), None);
    }

    #[test]
    fn test_classify_agrees_with_label() {
        let rule = LabelRule::default();
        for name in ["cat.0.jpg", "dog.0.jpg", "hotdog_cat.png", "catalog.png"] {
            let path = PathBuf::from(name);
            if let Some(class) = rule.classify(&path) {
                assert_eq!(class, rule.label(&path), "{name}");
            }
        }
    }

    #[test]
    fn test_labels_are_binary_and_aligned() {
        let rule = LabelRule::default();
        let paths = vec!["cat.0.jpg", "dog.0.jpg", "dog.1.jpg"];
        let labels = rule.labels(&paths);
        assert_eq!(labels, vec![0, 1, 1]);
        assert!(labels.iter().all(|&l| l <= 1));
    }

    #[test]
    fn test_class_names() {
        let rule = LabelRule::default();
        assert_eq!(rule.class_name(0), "cat");
        assert_eq!(rule.class_name(1), "dog");
    }
}
