//! Dataset indexing
//!
//! Lists an input directory and produces the ordered list of files to load.
//! Training directories are partitioned into the two classes, each class
//! capped, then concatenated (negative first) and shuffled.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::dataset::label::{LabelRule, POSITIVE_LABEL};
use crate::utils::error::{CatDogError, Result};

/// RNG from an optional seed; entropy-seeded when `None`
pub fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Per-class counts of one indexing pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub files_listed: usize,
    pub negative_found: usize,
    pub positive_found: usize,
    pub negative_kept: usize,
    pub positive_kept: usize,
}

impl IndexStats {
    pub fn ignored(&self) -> usize {
        self.files_listed - self.negative_found - self.positive_found
    }

    pub fn total_kept(&self) -> usize {
        self.negative_kept + self.positive_kept
    }

    pub fn print(&self, rule: &LabelRule) {
        println!("  Files listed: {}", self.files_listed);
        println!(
            "  {:>8}: {} found, {} kept",
            rule.negative_pattern, self.negative_found, self.negative_kept
        );
        println!(
            "  {:>8}: {} found, {} kept",
            rule.positive_pattern, self.positive_found, self.positive_kept
        );
        if self.ignored() > 0 {
            println!("  Ignored (no class pattern): {}", self.ignored());
        }
    }
}

/// Ordered training paths with the statistics that produced them
#[derive(Debug, Clone)]
pub struct DatasetIndex {
    pub paths: Vec<PathBuf>,
    pub stats: IndexStats,
}

/// Regular files directly inside `dir`, sorted by file name
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(CatDogError::DirectoryNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(CatDogError::Dataset(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            CatDogError::Dataset(format!("Failed to list {}: {}", dir.display(), e))
        })?;
        if entry.path().is_file() {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(CatDogError::EmptyDirectory(dir.to_path_buf()));
    }

    debug!("Listed {} files in {:?}", files.len(), dir);
    Ok(files)
}

/// Index a labeled training directory
pub fn index_training_dir(
    dir: &Path,
    rule: &LabelRule,
    max_per_class: usize,
    rng: &mut ChaCha8Rng,
) -> Result<DatasetIndex> {
    let files = list_files(dir)?;

    let mut negatives = Vec::new();
    let mut positives = Vec::new();
    for path in &files {
        match rule.classify(path) {
            Some(POSITIVE_LABEL) => positives.push(path.clone()),
            Some(_) => negatives.push(path.clone()),
            None => {}
        }
    }

    if negatives.is_empty() && positives.is_empty() {
        return Err(CatDogError::Dataset(format!(
            "no file in {} matches '{}' or '{}'",
            dir.display(),
            rule.negative_pattern,
            rule.positive_pattern
        )));
    }

    let mut stats = IndexStats {
        files_listed: files.len(),
        negative_found: negatives.len(),
        positive_found: positives.len(),
        ..Default::default()
    };

    negatives.truncate(max_per_class);
    positives.truncate(max_per_class);
    stats.negative_kept = negatives.len();
    stats.positive_kept = positives.len();

    let mut paths = negatives;
    paths.extend(positives);
    paths.shuffle(rng);

    info!(
        "Indexed {:?}: {} {} + {} {}",
        dir, stats.negative_kept, rule.negative_pattern, stats.positive_kept, rule.positive_pattern
    );

    Ok(DatasetIndex { paths, stats })
}

/// Index an unlabeled test directory: every file, capped at `limit`, shuffled
pub fn index_test_dir(dir: &Path, limit: usize, rng: &mut ChaCha8Rng) -> Result<Vec<PathBuf>> {
    let mut paths = list_files(dir)?;
    paths.truncate(limit);
    paths.shuffle(rng);

    info!("Indexed {:?}: {} test images", dir, paths.len());
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
    }

    #[test]
    fn test_four_files_cap_two() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), &["cat.0.jpg", "cat.1.jpg", "dog.0.jpg", "dog.1.jpg"]);

        let rule = LabelRule::default();
        let index = index_training_dir(dir.path(), &rule, 2, &mut make_rng(None)).unwrap();

        assert_eq!(index.paths.len(), 4);
        let unique: HashSet<_> = index.paths.iter().collect();
        assert_eq!(unique.len(), 4);

        for path in &index.paths {
            let name = path.file_name().unwrap().to_string_lossy();
            let expected = if name.starts_with("dog") { 1 } else { 0 };
            assert_eq!(rule.label(path), expected);
        }
    }

    #[test]
    fn test_cap_is_enforced_per_class() {
        let dir = TempDir::new().unwrap();
        let names: Vec<String> = (0..5)
            .flat_map(|i| [format!("cat.{i}.jpg"), format!("dog.{i}.jpg")])
            .collect();
        touch(dir.path(), &names.iter().map(String::as_str).collect::<Vec<_>>());

        let rule = LabelRule::default();
        let index = index_training_dir(dir.path(), &rule, 3, &mut make_rng(Some(1))).unwrap();

        assert!(index.paths.len() <= 6);
        assert_eq!(index.stats.negative_kept, 3);
        assert_eq!(index.stats.positive_kept, 3);
        assert_eq!(index.stats.positive_found, 5);
        let dogs = index.paths.iter().filter(|p| rule.label(p) == 1).count();
        assert_eq!(dogs, 3);
    }

    #[test]
    fn test_seeded_order_is_reproducible() {
        let dir = TempDir::new().unwrap();
        let names: Vec<String> = (0..20).map(|i| format!("cat.{i}.jpg")).collect();
        touch(dir.path(), &names.iter().map(String::as_str).collect::<Vec<_>>());

        let rule = LabelRule::default();
        let a = index_training_dir(dir.path(), &rule, 20, &mut make_rng(Some(7))).unwrap();
        let b = index_training_dir(dir.path(), &rule, 20, &mut make_rng(Some(7))).unwrap();
        assert_eq!(a.paths, b.paths);
    }

    #[test]
    fn test_unmatched_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), &["cat.0.jpg", "notes.txt"]);
        std::fs::create_dir(dir.path().join("dog.subdir")).unwrap();

        let index =
            index_training_dir(dir.path(), &LabelRule::default(), 10, &mut make_rng(None)).unwrap();
        assert_eq!(index.paths.len(), 1);
        assert_eq!(index.stats.ignored(), 1);
    }

    #[test]
    fn test_missing_directory() {
        let err = list_files(Path::new("/nonexistent/train")).unwrap_err();
        assert!(matches!(err, CatDogError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let err = index_test_dir(dir.path(), 25, &mut make_rng(None)).unwrap_err();
        assert!(matches!(err, CatDogError::EmptyDirectory(_)));
    }

    #[test]
    fn test_no_class_matches() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), &["bird.0.jpg"]);
        let err = index_training_dir(dir.path(), &LabelRule::default(), 10, &mut make_rng(None))
            .unwrap_err();
        assert!(matches!(err, CatDogError::Dataset(_)));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), &["cat.0.jpg"]);
        let err = list_files(&dir.path().join("cat.0.jpg")).unwrap_err();
        assert!(matches!(err, CatDogError::Dataset(_)));
    }

    #[test]
    fn test_test_dir_limit() {
        let dir = TempDir::new().unwrap();
        let names: Vec<String> = (1..=30).map(|i| format!("{i}.jpg")).collect();
        touch(dir.path(), &names.iter().map(String::as_str).collect::<Vec<_>>());

        let paths = index_test_dir(dir.path(), 25, &mut make_rng(Some(3))).unwrap();
        assert_eq!(paths.len(), 25);
    }
}
