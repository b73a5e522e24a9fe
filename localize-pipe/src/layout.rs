//! Discovery of `strings.xml` files in a project tree
//!
//! [`ResourceLayout`] is the seam between the scanner and the place files come
//! from. [`FilesystemLayout`] walks a directory with `walkdir`; a host with its
//! own file index can provide another implementation.

use crate::classify::classify;
use crate::model::{ClassifiedResourcePath, ResourceKind};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const STRINGS_FILE_NAME: &str = "strings.xml";

/// A classified resource file together with the module that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedStringsFile {
    pub path: String,
    pub resource_root_path: String,
    pub kind: ResourceKind,
    pub folder_name: String,
    pub qualifier_raw: String,
    pub normalized_locale_tag: Option<String>,
    pub module_name: Option<String>,
}

impl LocalizedStringsFile {
    pub fn from_classified(
        path: String,
        classified: ClassifiedResourcePath,
        module_name: Option<String>,
    ) -> Self {
        Self {
            path,
            resource_root_path: classified.resource_root_path,
            kind: classified.kind,
            folder_name: classified.folder_name,
            qualifier_raw: classified.qualifier_raw,
            normalized_locale_tag: classified.normalized_locale_tag,
            module_name,
        }
    }

    pub fn is_base(&self) -> bool {
        self.folder_name == "values"
    }
}

/// Source of localization files for the scanner
pub trait ResourceLayout: Send + Sync {
    /// Every classified `strings.xml` file visible to the layout
    fn strings_files(&self) -> Vec<LocalizedStringsFile>;

    /// Raw text of a file; unreadable files are treated as empty
    fn read_text(&self, path: &str) -> String {
        match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!("Treating unreadable resource file '{}' as empty: {}", path, e);
                String::new()
            }
        }
    }
}

/// Walks a project directory on disk
#[derive(Debug, Clone)]
pub struct FilesystemLayout {
    root: PathBuf,
}

impl FilesystemLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceLayout for FilesystemLayout {
    fn strings_files(&self) -> Vec<LocalizedStringsFile> {
        let root = normalize_path(&self.root);
        walk_strings_files(&self.root)
            .into_iter()
            .filter_map(|path| {
                let classified = classify(&path)?;
                let module_name = module_for_path(&root, &classified.resource_root_path);
                Some(LocalizedStringsFile::from_classified(
                    path,
                    classified,
                    module_name,
                ))
            })
            .collect()
    }
}

fn walk_strings_files(root: &Path) -> Vec<String> {
    if !root.exists() {
        return Vec::new();
    }

    let mut paths: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable directory entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == STRINGS_FILE_NAME)
        .map(|entry| normalize_path(entry.path()))
        .collect();
    paths.sort();
    paths
}

/// Recursively find and classify every `strings.xml` below `root`
///
/// Results are sorted by (kind, resource root, folder name). A missing root
/// yields an empty list.
pub fn scan_root(root: &Path) -> Vec<ClassifiedResourcePath> {
    let mut classified: Vec<ClassifiedResourcePath> = walk_strings_files(root)
        .iter()
        .filter_map(|path| classify(path))
        .collect();
    classified.sort_by(|a, b| {
        a.kind
            .name()
            .cmp(b.kind.name())
            .then_with(|| a.resource_root_path.cmp(&b.resource_root_path))
            .then_with(|| a.folder_name.cmp(&b.folder_name))
    });
    classified
}

/// Path as a `/`-separated string without a trailing separator
pub fn normalize_path(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    if text.len() > 1 {
        text.trim_end_matches('/').to_string()
    } else {
        text
    }
}

/// Gradle-style module name for a path inside `project_root`
///
/// The directories between the project root and the first `src` directory
/// form the module, joined with `:`. Files outside any module yield `None`.
///
/// ```ignore
/// assert_eq!(
///     module_for_path("/p", "/p/feature/settings/src/main/res").as_deref(),
///     Some("feature:settings")
/// );
/// ```
pub fn module_for_path(project_root: &str, path: &str) -> Option<String> {
    let path = path.replace('\\', "/");
    let relative = path
        .strip_prefix(project_root.trim_end_matches('/'))
        .unwrap_or(&path)
        .trim_start_matches('/');

    let segments: Vec<&str> = relative.split('/').collect();
    let src_index = segments.iter().position(|segment| *segment == "src")?;
    if src_index == 0 {
        return None;
    }
    Some(segments[..src_index].join(":"))
}
