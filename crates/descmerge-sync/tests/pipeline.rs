//! Pipeline integration tests.
//!
//! Drives full update passes against a temp working root with an in-memory
//! release feed, an artifact store that writes placeholder files, and a merge
//! tool that records what it produced.

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use descmerge_core::{
    CombinedYarn, DescmergeConfig, Document, IndexRoot, Layout, ReleaseEntry, SyncError,
    SyncResult,
};
use descmerge_fetch::{ArtifactStore, ReleaseFeed};
use descmerge_merge::{MergeRequest, MergeTool};
use descmerge_sync::{Pipeline, UpdateOptions};
use tempfile::TempDir;

struct FakeFeed {
    entries: RefCell<Vec<ReleaseEntry>>,
}

impl ReleaseFeed for FakeFeed {
    fn fetch(&self) -> SyncResult<Vec<ReleaseEntry>> {
        Ok(self.entries.borrow().clone())
    }
}

struct FileArtifacts {
    layout: Layout,
    fetched: RefCell<Vec<String>>,
}

impl ArtifactStore for FileArtifacts {
    fn ensure(&self, yarn: &CombinedYarn) -> SyncResult<()> {
        let path = self.layout.absolute(&self.layout.yarn_path(yarn));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("tiny {}\n", yarn.artifact_name)).unwrap();
        self.fetched.borrow_mut().push(yarn.artifact_name.clone());
        Ok(())
    }
}

struct FileMerger {
    root: std::path::PathBuf,
    produced: RefCell<Vec<String>>,
    fail: RefCell<bool>,
}

impl MergeTool for FileMerger {
    fn generate(&self, request: &MergeRequest) -> SyncResult<()> {
        if *self.fail.borrow() {
            return Err(SyncError::ExternalTool {
                tool: "java".to_string(),
                status: "exit code 1".to_string(),
                stderr: "boom".to_string(),
            });
        }
        let out = self.root.join(&request.output);
        fs::create_dir_all(out.parent().unwrap()).unwrap();
        fs::write(&out, "{}\n").unwrap();
        self.produced
            .borrow_mut()
            .push(request.output.to_string_lossy().replace('\\', "/"));
        Ok(())
    }
}

struct Harness {
    dir: TempDir,
    config: DescmergeConfig,
    layout: Layout,
    feed: FakeFeed,
    artifacts: FileArtifacts,
    merger: FileMerger,
}

fn release(id: &str, build: u32) -> ReleaseEntry {
    ReleaseEntry {
        version_file_id: id.to_string(),
        separator: "+build.".to_string(),
        build,
        artifact_name: format!("{id}+build.{build}"),
    }
}

fn write_dataset(root: &Path, timestamp: &str, client_hash: &str) {
    let dir = root.join("minecraft-jars-java-descriptions");
    fs::create_dir_all(&dir).unwrap();
    let body = format!(
        r#"{{
  "timestamp": "{timestamp}",
  "mappings": {{
    "1.20.1": {{
      "client": {{"version_id": "1.20.1", "version_file_id": "1.20.1",
                  "version_release_time": "2023-06-12T13:25:51+00:00",
                  "jar_key": "client", "jar_sha1_meta": "{client_hash}"}},
      "server": {{"version_id": "1.20.1", "version_file_id": "1.20.1",
                  "version_release_time": "2023-06-12T13:25:51+00:00",
                  "jar_key": "server", "jar_sha1_meta": "s1"}}
    }},
    "1.20": {{
      "client": {{"version_id": "1.20", "version_file_id": "1.20",
                  "version_release_time": "2023-06-02T08:36:17+00:00",
                  "jar_key": "client", "jar_sha1_meta": "c0"}}
    }}
  }}
}}"#
    );
    fs::write(dir.join("index.json"), body).unwrap();
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = DescmergeConfig::default();
        let layout = Layout::new(dir.path(), &config);
        write_dataset(dir.path(), "2024-01-01T00:00:00+00:00", "c1");

        Self {
            feed: FakeFeed {
                entries: RefCell::new(vec![release("1.20.1", 10), release("1.20", 1)]),
            },
            artifacts: FileArtifacts {
                layout: layout.clone(),
                fetched: RefCell::new(Vec::new()),
            },
            merger: FileMerger {
                root: dir.path().to_path_buf(),
                produced: RefCell::new(Vec::new()),
                fail: RefCell::new(false),
            },
            config,
            layout,
            dir,
        }
    }

    fn run(&self) -> SyncResult<descmerge_sync::UpdateReport> {
        Pipeline::new(
            &self.config,
            &self.layout,
            &self.feed,
            &self.artifacts,
            &self.merger,
        )
        .run(UpdateOptions::default())
    }

    fn documents(&self) -> Vec<Vec<u8>> {
        ["fabric.json", "combined.json", "index.json"]
            .iter()
            .map(|name| fs::read(self.dir.path().join(name)).unwrap())
            .collect()
    }

    fn produced(&self) -> Vec<String> {
        std::mem::take(&mut *self.merger.produced.borrow_mut())
    }
}

#[test]
fn first_run_builds_every_document_and_mapping() {
    let h = Harness::new();
    let report = h.run().unwrap();

    assert!(report.registry_dirty && report.combined_dirty && report.index_dirty);
    assert_eq!(
        h.produced(),
        vec![
            "mappings/1.20.1-client.json",
            "mappings/1.20.1-server.json",
            "mappings/1.20-client.json",
        ]
    );

    let index = IndexRoot::load(&h.layout.index_document()).unwrap();
    let keys: Vec<_> = index.versions.keys().cloned().collect();
    assert_eq!(keys, vec!["1.20.1", "1.20"]);
    assert_eq!(
        index.versions["1.20"].jars["client"].url,
        "https://jackassmc.github.io/fabric-yarn-merged-descs/mappings/1.20-client.json"
    );
    assert!(h.dir.path().join("mappings/1.20-yarn.tiny").is_file());
}

#[test]
fn second_run_is_a_byte_identical_no_op() {
    let h = Harness::new();
    h.run().unwrap();
    let before = h.documents();
    h.produced();

    let report = h.run().unwrap();

    assert!(!report.any_dirty());
    assert!(h.produced().is_empty());
    assert_eq!(h.documents(), before);
}

#[test]
fn description_change_regenerates_one_jar_and_reprojects() {
    let h = Harness::new();
    h.run().unwrap();
    h.produced();
    let index_before = IndexRoot::load(&h.layout.index_document()).unwrap();

    write_dataset(h.dir.path(), "2024-02-01T00:00:00+00:00", "c2");
    let report = h.run().unwrap();

    assert!(!report.registry_dirty);
    assert!(report.combined_dirty && report.index_dirty);
    assert_eq!(h.produced(), vec!["mappings/1.20.1-client.json"]);
    assert_eq!(h.artifacts.fetched.borrow().len(), 2);

    let index_after = IndexRoot::load(&h.layout.index_document()).unwrap();
    assert_ne!(index_after.timestamp, index_before.timestamp);
}

#[test]
fn failed_merge_persists_nothing() {
    let h = Harness::new();
    h.run().unwrap();
    let before = h.documents();

    h.feed.entries.borrow_mut()[0] = release("1.20.1", 11);
    *h.merger.fail.borrow_mut() = true;

    let err = h.run().unwrap_err();
    assert!(err.to_string().contains("merge failed for version 1.20.1"), "{err}");
    assert_eq!(h.documents(), before);

    // The retry redoes the comparison from scratch and succeeds.
    *h.merger.fail.borrow_mut() = false;
    h.produced();
    let report = h.run().unwrap();
    assert!(report.registry_dirty && report.combined_dirty);
    assert_eq!(
        h.produced(),
        vec!["mappings/1.20.1-client.json", "mappings/1.20.1-server.json"]
    );
}

#[test]
fn new_dataset_timestamp_without_changes_keeps_index_current() {
    let h = Harness::new();
    h.run().unwrap();
    let index_before = fs::read(h.layout.index_document()).unwrap();
    h.produced();

    write_dataset(h.dir.path(), "2024-03-01T00:00:00+00:00", "c1");
    let report = h.run().unwrap();

    assert!(!report.combined_dirty && !report.index_dirty);
    assert!(h.produced().is_empty());
    assert_eq!(fs::read(h.layout.index_document()).unwrap(), index_before);

    // The observed dataset timestamp was recorded, so the next run short-circuits.
    let combined = fs::read(h.layout.combined_document()).unwrap();
    h.run().unwrap();
    assert_eq!(fs::read(h.layout.combined_document()).unwrap(), combined);
}
