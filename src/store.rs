//! Translation Cluster Store
//!
//! Holds translation records grouped into named clusters and keeps the
//! backing JSON file in step with memory. Every mutation rewrites the whole
//! file; a mutation whose write fails is rolled back before the error is
//! returned, so memory and disk never diverge.

use crate::error::{TranslatorError, TranslatorResult};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default name of the backing file
pub const DEFAULT_STORE_FILE: &str = "translations.json";

/// One prompt and the translation the user gave for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    #[serde(rename = "English")]
    pub source_text: String,
    #[serde(rename = "Ibibio")]
    pub target_text: String,
}

impl TranslationRecord {
    pub fn new(source_text: impl Into<String>, target_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            target_text: target_text.into(),
        }
    }
}

/// Cluster name -> records, in insertion order.
///
/// Serializes as a JSON object whose key order follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clusters {
    entries: Vec<(String, Vec<TranslationRecord>)>,
}

impl Clusters {
    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key == name)
    }

    /// Records of a cluster, if it exists
    pub fn get(&self, name: &str) -> Option<&[TranslationRecord]> {
        self.position(name).map(|idx| self.entries[idx].1.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Iterate clusters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TranslationRecord])> {
        self.entries
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of clusters
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records across all clusters
    pub fn record_count(&self) -> usize {
        self.entries.iter().map(|(_, records)| records.len()).sum()
    }

    /// Append a record, creating the cluster if needed. Returns true if the
    /// cluster was created.
    fn push(&mut self, name: &str, record: TranslationRecord) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.entries[idx].1.push(record);
                false
            }
            None => {
                self.entries.push((name.to_string(), vec![record]));
                true
            }
        }
    }

    /// Duplicate keys keep the position of the first occurrence and the
    /// value of the last one.
    fn insert(&mut self, name: String, records: Vec<TranslationRecord>) {
        match self.position(&name) {
            Some(idx) => self.entries[idx].1 = records,
            None => self.entries.push((name, records)),
        }
    }
}

impl Serialize for Clusters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, records) in &self.entries {
            map.serialize_entry(name, records)?;
        }
        map.end()
    }
}

struct ClustersVisitor;

impl<'de> Visitor<'de> for ClustersVisitor {
    type Value = Clusters;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping cluster names to lists of translations")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Clusters, A::Error> {
        let mut clusters = Clusters::default();
        while let Some((name, records)) =
            access.next_entry::<String, Vec<TranslationRecord>>()?
        {
            if name.is_empty() {
                return Err(serde::de::Error::custom("empty cluster name"));
            }
            clusters.insert(name, records);
        }
        Ok(clusters)
    }
}

impl<'de> Deserialize<'de> for Clusters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ClustersVisitor)
    }
}

/// The translation store bound to its backing file
#[derive(Debug, Clone)]
pub struct ClusterStore {
    path: PathBuf,
    clusters: Clusters,
}

impl ClusterStore {
    /// Empty store bound to `path`. Nothing is read or written.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            clusters: Clusters::default(),
        }
    }

    /// Load the store from `path`. A missing file yields an empty store;
    /// bytes that are not valid JSON (including invalid UTF-8) are
    /// reported as `CorruptStore`.
    pub fn load(path: impl Into<PathBuf>) -> TranslatorResult<Self> {
        let path = path.into();
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No store at {}, starting empty", path.display());
                return Ok(Self::new(path));
            }
            Err(e) => return Err(e.into()),
        };

        let clusters: Clusters =
            serde_json::from_slice(&content).map_err(|source| TranslatorError::CorruptStore {
                path: path.clone(),
                source,
            })?;

        info!(
            "📂 Loaded {} translations in {} clusters from {}",
            clusters.record_count(),
            clusters.len(),
            path.display()
        );
        Ok(Self { path, clusters })
    }

    /// Like `load`, but a corrupt file is moved aside to `<name>.corrupt`
    /// and an empty store is returned.
    pub fn load_or_recover(path: impl Into<PathBuf>) -> TranslatorResult<Self> {
        let path = path.into();
        match Self::load(&path) {
            Err(TranslatorError::CorruptStore { source, .. }) => {
                let backup_path = sibling_path(&path, "corrupt");
                warn!(
                    "⚠️ Store {} is corrupt ({}), moving it to {}",
                    path.display(),
                    source,
                    backup_path.display()
                );
                fs::rename(&path, &backup_path)?;
                Ok(Self::new(path))
            }
            other => other,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn clusters(&self) -> &Clusters {
        &self.clusters
    }

    /// Records of one cluster
    pub fn list(&self, cluster_name: &str) -> TranslatorResult<&[TranslationRecord]> {
        self.clusters
            .get(cluster_name)
            .ok_or_else(|| TranslatorError::ClusterNotFound(cluster_name.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Append a translation to `cluster_name` and persist.
    pub fn add_translation(
        &mut self,
        source_text: &str,
        target_text: &str,
        cluster_name: &str,
    ) -> TranslatorResult<()> {
        if cluster_name.trim().is_empty() {
            return Err(TranslatorError::Validation(
                "Please provide a cluster name.".to_string(),
            ));
        }

        let created = self
            .clusters
            .push(cluster_name, TranslationRecord::new(source_text, target_text));

        if let Err(e) = self.save() {
            // Roll back so memory matches the file that is still on disk
            if created {
                self.clusters.entries.pop();
            } else if let Some(idx) = self.clusters.position(cluster_name) {
                self.clusters.entries[idx].1.pop();
            }
            return Err(e);
        }

        debug!("➕ Added '{}' to cluster '{}'", source_text, cluster_name);
        Ok(())
    }

    /// Remove the record at `index` in `cluster_name` and persist.
    pub fn delete_translation(
        &mut self,
        cluster_name: &str,
        index: usize,
    ) -> TranslatorResult<TranslationRecord> {
        let cluster_idx = self
            .clusters
            .position(cluster_name)
            .ok_or_else(|| TranslatorError::ClusterNotFound(cluster_name.to_string()))?;

        let len = self.clusters.entries[cluster_idx].1.len();
        if index >= len {
            return Err(TranslatorError::IndexOutOfRange {
                cluster: cluster_name.to_string(),
                index,
                len,
            });
        }

        let removed = self.clusters.entries[cluster_idx].1.remove(index);

        if let Err(e) = self.save() {
            self.clusters.entries[cluster_idx]
                .1
                .insert(index, removed);
            return Err(e);
        }

        debug!("🗑️ Deleted [{}] from cluster '{}'", index, cluster_name);
        Ok(removed)
    }

    /// Pretty JSON snapshot of the whole store (4-space indent)
    pub fn export_json(&self) -> TranslatorResult<String> {
        render(&self.clusters)
    }

    /// Rewrite the backing file from memory
    pub fn save(&self) -> TranslatorResult<()> {
        let content = render(&self.clusters)?;
        let persist_err = |source: io::Error| TranslatorError::Persistence {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(persist_err)?;
            }
        }

        let temp_file = sibling_path(&self.path, "tmp");
        fs::write(&temp_file, content).map_err(persist_err)?;
        if let Err(e) = fs::rename(&temp_file, &self.path) {
            let _ = fs::remove_file(&temp_file);
            return Err(persist_err(e));
        }
        Ok(())
    }
}

/// `path` with `.suffix` appended to the full file name
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn render(clusters: &Clusters) -> TranslatorResult<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    clusters.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| TranslatorError::Other(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ClusterStore {
        ClusterStore::load(dir.path().join(DEFAULT_STORE_FILE)).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_add_then_export_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store
            .add_translation("The quick brown fox...", "Ọkpọkpọ...", "animals")
            .unwrap();

        let json = store.export_json().unwrap();
        let expected = "{\n    \"animals\": [\n        {\n            \"English\": \"The quick brown fox...\",\n            \"Ibibio\": \"Ọkpọkpọ...\"\n        }\n    ]\n}";
        assert_eq!(json, expected);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), expected);
    }

    #[test]
    fn test_empty_store_exports_empty_object() {
        let store = ClusterStore::new("unused.json");
        assert_eq!(store.export_json().unwrap(), "{}");
    }

    #[test]
    fn test_add_preserves_call_order_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.add_translation("sun", "utin", "nature").unwrap();
        store.add_translation("house", "ufok", "home").unwrap();
        store.add_translation("apple", "apple", "nature").unwrap();
        store.add_translation("sun", "utin", "nature").unwrap();

        let reloaded = store_in(&dir);
        assert_eq!(reloaded.clusters(), store.clusters());
        let names: Vec<_> = reloaded.clusters().names().collect();
        assert_eq!(names, vec!["nature", "home"]);

        let nature: Vec<_> = reloaded
            .list("nature")
            .unwrap()
            .iter()
            .map(|r| r.source_text.as_str())
            .collect();
        assert_eq!(nature, vec!["sun", "apple", "sun"]);
        assert_eq!(reloaded.export_json().unwrap(), store.export_json().unwrap());
    }

    #[test]
    fn test_cluster_order_is_not_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.add_translation("sun", "utin", "zebra").unwrap();
        store.add_translation("apple", "apple", "alpha").unwrap();

        let json = store.export_json().unwrap();
        assert!(json.find("zebra").unwrap() < json.find("alpha").unwrap());
    }

    #[test]
    fn test_empty_cluster_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let err = store.add_translation("sun", "utin", "").unwrap_err();
        assert!(matches!(err, TranslatorError::Validation(_)));
        let err = store.add_translation("sun", "utin", "   ").unwrap_err();
        assert!(matches!(err, TranslatorError::Validation(_)));
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_delete_shifts_following_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.add_translation("hello", "mesiere", "greetings").unwrap();
        store.add_translation("good night", "esiere", "greetings").unwrap();

        let removed = store.delete_translation("greetings", 0).unwrap();
        assert_eq!(removed.source_text, "hello");

        let records = store.list("greetings").unwrap();
        assert_eq!(records, &[TranslationRecord::new("good night", "esiere")]);

        let reloaded = store_in(&dir);
        assert_eq!(reloaded.list("greetings").unwrap(), records);
    }

    #[test]
    fn test_repeated_delete_drains_cluster() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        for word in ["apple", "banana", "computer"] {
            store.add_translation(word, word, "fruit").unwrap();
        }
        for _ in 0..3 {
            store.delete_translation("fruit", 0).unwrap();
        }
        assert!(store.list("fruit").unwrap().is_empty());
        assert!(store.clusters().contains("fruit"));

        let err = store.delete_translation("fruit", 0).unwrap_err();
        assert!(matches!(err, TranslatorError::IndexOutOfRange { len: 0, .. }));
    }

    #[test]
    fn test_delete_out_of_range_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.add_translation("sun", "utin", "nature").unwrap();
        let before = store.export_json().unwrap();

        let err = store.delete_translation("nature", 1).unwrap_err();
        assert!(matches!(
            err,
            TranslatorError::IndexOutOfRange { index: 1, len: 1, .. }
        ));

        let err = store.delete_translation("missing", 0).unwrap_err();
        assert!(matches!(err, TranslatorError::ClusterNotFound(_)));

        assert_eq!(store.export_json().unwrap(), before);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_write_failure_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "x").unwrap();

        let mut store = ClusterStore::new(blocker.join(DEFAULT_STORE_FILE));
        let err = store.add_translation("sun", "utin", "nature").unwrap_err();
        assert!(matches!(err, TranslatorError::Persistence { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_write_failure_restores_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_STORE_FILE);
        let mut store = ClusterStore::load(&path).unwrap();
        store.add_translation("sun", "utin", "nature").unwrap();
        store.add_translation("house", "ufok", "nature").unwrap();

        // A directory in place of the file makes the rename fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let err = store.delete_translation("nature", 0).unwrap_err();
        assert!(matches!(err, TranslatorError::Persistence { .. }));
        let sources: Vec<_> = store
            .list("nature")
            .unwrap()
            .iter()
            .map(|r| r.source_text.as_str())
            .collect();
        assert_eq!(sources, vec!["sun", "house"]);
    }

    #[test]
    fn test_corrupt_file_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_STORE_FILE);

        for content in ["{ not valid json", "[1, 2, 3]", "{\"a\": [{\"English\": \"x\"}]}"] {
            std::fs::write(&path, content).unwrap();
            let err = ClusterStore::load(&path).unwrap_err();
            assert!(
                matches!(err, TranslatorError::CorruptStore { .. }),
                "expected corrupt store for {content}"
            );
        }
    }

    #[test]
    fn test_load_or_recover_moves_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_STORE_FILE);
        std::fs::write(&path, "{ not valid json").unwrap();

        let store = ClusterStore::load_or_recover(&path).unwrap();
        assert!(store.is_empty());
        assert!(!path.exists());
        assert!(dir.path().join("translations.json.corrupt").exists());
    }

    #[test]
    fn test_invalid_utf8_is_corrupt_and_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_STORE_FILE);
        std::fs::write(&path, [0xff, 0xfe, b'{', b'}']).unwrap();

        let err = ClusterStore::load(&path).unwrap_err();
        assert!(matches!(err, TranslatorError::CorruptStore { .. }));

        let store = ClusterStore::load_or_recover(&path).unwrap();
        assert!(store.is_empty());
        assert!(dir.path().join("translations.json.corrupt").exists());
    }

    #[test]
    fn test_backup_and_temp_names_keep_full_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        std::fs::write(&path, "{ not valid json").unwrap();

        let mut store = ClusterStore::load_or_recover(&path).unwrap();
        assert!(dir.path().join("store.db.corrupt").exists());

        store.add_translation("sun", "utin", "nature").unwrap();
        assert!(!dir.path().join("store.db.tmp").exists());
        assert!(!dir.path().join("store.tmp").exists());

        // A store whose own name ends in .tmp must not be its own temp file
        let tmp_named = dir.path().join("draft.tmp");
        let mut store = ClusterStore::new(&tmp_named);
        store.add_translation("sun", "utin", "nature").unwrap();
        store.add_translation("house", "ufok", "nature").unwrap();
        let reloaded = ClusterStore::load(&tmp_named).unwrap();
        assert_eq!(reloaded.list("nature").unwrap().len(), 2);
        assert!(!dir.path().join("draft.tmp.tmp").exists());
    }

    #[test]
    fn test_sibling_path_appends_suffix() {
        assert_eq!(
            sibling_path(Path::new("/data/translations.json"), "tmp"),
            PathBuf::from("/data/translations.json.tmp")
        );
        assert_eq!(
            sibling_path(Path::new("x.db"), "corrupt"),
            PathBuf::from("x.db.corrupt")
        );
    }

    #[test]
    fn test_loads_python_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_STORE_FILE);
        std::fs::write(
            &path,
            r#"{"greetings": [{"English": "hello", "Ibibio": "Ọkpọ"}], "fruit": []}"#,
        )
        .unwrap();

        let store = ClusterStore::load(&path).unwrap();
        assert_eq!(store.list("greetings").unwrap()[0].target_text, "Ọkpọ");
        assert!(store.list("fruit").unwrap().is_empty());
        let names: Vec<_> = store.clusters().names().collect();
        assert_eq!(names, vec!["greetings", "fruit"]);
    }
}
