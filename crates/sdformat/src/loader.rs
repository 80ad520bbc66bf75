//! Model lookup and loading
//!
//! [`ModelDatabase`] owns the ordered list of search roots and the parsed
//! document cache. Loading a model walks the search roots for a directory
//! named after the model, reads its manifest, resolves the SDF version to
//! load, and parses the chosen file, caching the result per
//! (name, version constraint) request.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{CacheKey, DocumentCache};
use crate::element::{ElementRef, Model};
use crate::manifest::{ManifestError, ModelManifest, SdfVersion};
use crate::xml::{Document, XmlError};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot find model {name} in the current model path")]
    ModelNotFound { name: String },
    #[error("invalid manifest in {}: {source}", path.display())]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },
    #[error("model {model} declares no SDF version {}", format_constraint(.max_version))]
    UnavailableSdfVersion {
        model: String,
        max_version: Option<SdfVersion>,
    },
    #[error("no <model> element in SDF document for {0}")]
    MissingModelElement(String),
    #[error(transparent)]
    Xml(#[from] XmlError),
}

fn format_constraint(max_version: &Option<SdfVersion>) -> String {
    match max_version {
        Some(v) => format!("<= {v}"),
        None => "at all".to_string(),
    }
}

/// The model search path plus the document cache, as one explicit context
/// object. State is local to the instance; nothing is process-global.
#[derive(Debug, Default)]
pub struct ModelDatabase {
    model_path: Vec<PathBuf>,
    cache: DocumentCache,
}

impl ModelDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model_path(paths: Vec<PathBuf>) -> Self {
        Self {
            model_path: paths,
            cache: DocumentCache::new(),
        }
    }

    /// Replace the ordered list of directories searched for models.
    ///
    /// Paths are not checked for existence here; missing directories are
    /// skipped at lookup time. Changing the path list does NOT invalidate
    /// the cache: a model name already loaded keeps resolving to the cached
    /// document until [`clear_cache`](Self::clear_cache) is called. Callers
    /// that repoint the path at different content must clear explicitly.
    pub fn set_model_path(&mut self, paths: Vec<PathBuf>) {
        self.model_path = paths;
    }

    pub fn model_path(&self) -> &[PathBuf] {
        &self.model_path
    }

    /// Drop every cached document.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Load a model by name, optionally capping the SDF format version.
    ///
    /// Returns the `<model>` root of the resolved document. Repeated calls
    /// with the same name and constraint are served from the cache.
    pub fn load_from_model_name(
        &mut self,
        name: &str,
        max_version: Option<SdfVersion>,
    ) -> Result<Model, LoadError> {
        let key = CacheKey::new(name, max_version);
        let model_path = &self.model_path;
        let doc = self
            .cache
            .get_or_load(key, || resolve_and_parse(model_path, name, max_version))?;

        let root = ElementRef::root(doc);
        find_model_element(root)
            .map(Model::new)
            .ok_or_else(|| LoadError::MissingModelElement(name.to_string()))
    }
}

/// Load a single SDF file directly, bypassing the model path and cache.
pub fn load_sdf_file(path: &Path) -> Result<Model, LoadError> {
    let doc = Arc::new(Document::from_file(path)?);
    let root = ElementRef::root(doc);
    find_model_element(root)
        .map(Model::new)
        .ok_or_else(|| LoadError::MissingModelElement(path.display().to_string()))
}

/// The `<model>` element of a document: the root itself, or the first
/// `<model>` child of an `<sdf>` envelope.
fn find_model_element(root: ElementRef) -> Option<ElementRef> {
    if root.name() == "model" {
        Some(root)
    } else {
        root.first_child("model")
    }
}

fn resolve_and_parse(
    model_path: &[PathBuf],
    name: &str,
    max_version: Option<SdfVersion>,
) -> Result<Document, LoadError> {
    let dir = find_model_dir(model_path, name).ok_or_else(|| LoadError::ModelNotFound {
        name: name.to_string(),
    })?;

    let manifest = ModelManifest::from_dir(&dir).map_err(|source| LoadError::InvalidManifest {
        path: dir.join(crate::manifest::MANIFEST_FILE),
        source,
    })?;

    let (version, file) =
        manifest
            .latest(max_version)
            .ok_or_else(|| LoadError::UnavailableSdfVersion {
                model: name.to_string(),
                max_version,
            })?;
    debug!(model = name, %version, file = %file.display(), "resolved SDF file");

    Ok(Document::from_file(&dir.join(file))?)
}

fn find_model_dir(model_path: &[PathBuf], name: &str) -> Option<PathBuf> {
    for root in model_path {
        if !root.is_dir() {
            warn!(path = %root.display(), "model path entry does not exist, skipping");
            continue;
        }
        let candidate = root.join(name);
        if candidate.is_dir() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Posed;
    use std::fs;
    use tempfile::TempDir;

    fn write_model(root: &Path, dir_name: &str, versions: &[(&str, &str)]) {
        let dir = root.join(dir_name);
        fs::create_dir_all(&dir).unwrap();

        let mut config = String::from("<model>\n    <name>");
        config.push_str(dir_name);
        config.push_str("</name>\n");
        for (version, file) in versions {
            config.push_str(&format!("    <sdf version=\"{version}\">{file}</sdf>\n"));
            let sdf = format!(
                "<sdf version=\"{version}\"><model name=\"{dir_name} {version}\">\
                 <link name=\"base\"/></model></sdf>"
            );
            fs::write(dir.join(file), sdf).unwrap();
        }
        config.push_str("</model>\n");
        fs::write(dir.join("model.config"), config).unwrap();
    }

    fn fixture() -> (TempDir, ModelDatabase) {
        let tmp = TempDir::new().unwrap();
        write_model(tmp.path(), "simple_model", &[("1.5", "model.sdf")]);
        write_model(
            tmp.path(),
            "versioned_model",
            &[
                ("1.0", "model-1.0.sdf"),
                ("1.3", "model-1.3.sdf"),
                ("1.5", "model.sdf"),
            ],
        );
        let db = ModelDatabase::with_model_path(vec![tmp.path().to_path_buf()]);
        (tmp, db)
    }

    #[test]
    fn test_load_from_model_name() {
        let (_tmp, mut db) = fixture();
        let model = db.load_from_model_name("simple_model", None).unwrap();
        assert_eq!(model.name(), Some("simple_model 1.5"));
        assert_eq!(model.each_link().count(), 1);
    }

    #[test]
    fn test_latest_version_when_unconstrained() {
        let (_tmp, mut db) = fixture();
        let model = db.load_from_model_name("versioned_model", None).unwrap();
        assert_eq!(model.name(), Some("versioned_model 1.5"));
    }

    #[test]
    fn test_max_version_selects_older_file() {
        let (_tmp, mut db) = fixture();
        let model = db
            .load_from_model_name("versioned_model", Some(SdfVersion::new(130)))
            .unwrap();
        assert_eq!(model.name(), Some("versioned_model 1.3"));
    }

    #[test]
    fn test_unsatisfiable_version_constraint() {
        let (_tmp, mut db) = fixture();
        let err = db
            .load_from_model_name("versioned_model", Some(SdfVersion::new(0)))
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::UnavailableSdfVersion { ref model, .. } if model == "versioned_model"
        ));
    }

    #[test]
    fn test_model_not_found() {
        let (_tmp, mut db) = fixture();
        let err = db.load_from_model_name("does_not_exist", None).unwrap_err();
        assert!(matches!(err, LoadError::ModelNotFound { .. }));
    }

    #[test]
    fn test_invalid_manifest() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("broken_model");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("model.config"), "<model><name>broken").unwrap();

        let mut db = ModelDatabase::with_model_path(vec![tmp.path().to_path_buf()]);
        let err = db.load_from_model_name("broken_model", None).unwrap_err();
        assert!(matches!(err, LoadError::InvalidManifest { .. }));

        // Missing manifest file is also an invalid manifest, not not-found.
        let dir = tmp.path().join("configless_model");
        fs::create_dir_all(&dir).unwrap();
        let err = db.load_from_model_name("configless_model", None).unwrap_err();
        assert!(matches!(err, LoadError::InvalidManifest { .. }));
    }

    #[test]
    fn test_repeated_loads_share_the_cached_document() {
        let (_tmp, mut db) = fixture();
        let first = db.load_from_model_name("simple_model", None).unwrap();
        let second = db.load_from_model_name("simple_model", None).unwrap();
        assert!(Arc::ptr_eq(
            first.element().document(),
            second.element().document()
        ));

        db.clear_cache();
        let third = db.load_from_model_name("simple_model", None).unwrap();
        assert!(!Arc::ptr_eq(
            first.element().document(),
            third.element().document()
        ));
        assert_eq!(third.name(), first.name());
    }

    #[test]
    fn test_distinct_constraints_resolve_independently() {
        let (_tmp, mut db) = fixture();
        let latest = db.load_from_model_name("versioned_model", None).unwrap();
        let capped = db
            .load_from_model_name("versioned_model", Some(SdfVersion::new(130)))
            .unwrap();
        assert!(!Arc::ptr_eq(
            latest.element().document(),
            capped.element().document()
        ));
    }

    #[test]
    fn test_path_mutation_does_not_invalidate_the_cache() {
        let (_tmp, mut db) = fixture();
        db.load_from_model_name("simple_model", None).unwrap();

        // The documented sharp edge: the stale entry keeps serving after
        // the path list changes, until the caller clears explicitly.
        db.set_model_path(Vec::new());
        assert!(db.load_from_model_name("simple_model", None).is_ok());

        db.clear_cache();
        let err = db.load_from_model_name("simple_model", None).unwrap_err();
        assert!(matches!(err, LoadError::ModelNotFound { .. }));
    }

    #[test]
    fn test_search_order_is_insertion_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_model(first.path(), "shared_name", &[("1.5", "model.sdf")]);
        write_model(second.path(), "shared_name", &[("1.3", "model.sdf")]);

        let mut db = ModelDatabase::with_model_path(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        let model = db.load_from_model_name("shared_name", None).unwrap();
        assert_eq!(model.name(), Some("shared_name 1.5"));
    }

    #[test]
    fn test_missing_path_entries_are_skipped() {
        let tmp = TempDir::new().unwrap();
        write_model(tmp.path(), "simple_model", &[("1.5", "model.sdf")]);

        let mut db = ModelDatabase::with_model_path(vec![
            PathBuf::from("/nonexistent/model/root"),
            tmp.path().to_path_buf(),
        ]);
        assert!(db.load_from_model_name("simple_model", None).is_ok());
    }

    #[test]
    fn test_load_sdf_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("robot.sdf");
        fs::write(
            &path,
            "<sdf version=\"1.5\"><model name=\"robot\">\
             <pose>1 2 3 0 0 0</pose></model></sdf>",
        )
        .unwrap();

        let model = load_sdf_file(&path).unwrap();
        assert_eq!(model.name(), Some("robot"));
        assert!(model
            .pose()
            .unwrap()
            .translation
            .abs_diff_eq(glam::DVec3::new(1.0, 2.0, 3.0), 1e-12));
    }

    #[test]
    fn test_load_sdf_file_with_bare_model_root() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bare.sdf");
        fs::write(&path, "<model name=\"bare\"/>").unwrap();
        assert_eq!(load_sdf_file(&path).unwrap().name(), Some("bare"));
    }

    #[test]
    fn test_load_sdf_file_without_model_element() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.sdf");
        fs::write(&path, "<sdf version=\"1.5\"><world name=\"w\"/></sdf>").unwrap();
        assert!(matches!(
            load_sdf_file(&path),
            Err(LoadError::MissingModelElement(_))
        ));
    }
}
