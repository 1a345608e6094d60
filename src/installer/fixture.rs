//! Fixture discovery for feature installers.
//!
//! A feature may ship seed data in `<setup_data_dir>/<feature name>/`. The
//! first regular, non-hidden file of that directory (lexical order) is opened
//! and handed to the installer; anything else means "no fixture".

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use persona_common::{Error, Result};
use serde::de::DeserializeOwned;

/// An opened fixture file. Closed when dropped.
#[derive(Debug)]
pub struct Fixture {
    path: PathBuf,
    reader: BufReader<File>,
}

impl Fixture {
    /// Open the fixture at `path` for reading.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::open(&path)
            .map_err(|e| Error::fixture(&path, format!("failed to open: {e}")))?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the whole fixture as JSON.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        let Self { path, reader } = self;
        serde_json::from_reader(reader).map_err(|e| Error::fixture(path, e.to_string()))
    }
}

impl Read for Fixture {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Locate the fixture file for `feature_name` under `root`.
///
/// Returns `Ok(None)` when the directory is missing or holds no candidate
/// file. When several files are present the lexically first one wins and a
/// warning is logged.
pub fn find_fixture(root: &Path, feature_name: &str) -> Result<Option<PathBuf>> {
    if feature_name.is_empty()
        || feature_name == "."
        || feature_name == ".."
        || feature_name.contains(['/', '\\'])
    {
        return Err(Error::validation(format!(
            "feature name '{feature_name}' cannot be used as a fixture directory"
        )));
    }

    let dir = root.join(feature_name);
    if !dir.is_dir() {
        tracing::debug!("No fixture directory at {}", dir.display());
        return Ok(None);
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            !entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'))
        })
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    candidates.sort();

    if candidates.len() > 1 {
        tracing::warn!(
            "Fixture directory {} holds {} files; using {}",
            dir.display(),
            candidates.len(),
            candidates[0].display()
        );
    }

    Ok(candidates.into_iter().next())
}

/// Locate and open the fixture for `feature_name`, if there is one.
pub fn open_fixture(root: &Path, feature_name: &str) -> Result<Option<Fixture>> {
    match find_fixture(root, feature_name)? {
        Some(path) => {
            tracing::debug!("Using fixture {} for '{}'", path.display(), feature_name);
            Fixture::open(path).map(Some)
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_directory_is_no_fixture() {
        let root = tempfile::tempdir().unwrap();
        assert!(find_fixture(root.path(), "roles").unwrap().is_none());
        assert!(open_fixture(root.path(), "roles").unwrap().is_none());
    }

    #[test]
    fn test_empty_directory_is_no_fixture() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("roles")).unwrap();
        assert!(find_fixture(root.path(), "roles").unwrap().is_none());
    }

    #[test]
    fn test_single_file_is_found() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("2021-02-23 Roles");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("roles.json"), r#"["Admin","Member"]"#).unwrap();

        let fixture = open_fixture(root.path(), "2021-02-23 Roles")
            .unwrap()
            .unwrap();
        assert_eq!(fixture.path(), dir.join("roles.json"));
        let roles: Vec<String> = fixture.json().unwrap();
        assert_eq!(roles, ["Admin", "Member"]);
    }

    #[test]
    fn test_first_file_in_lexical_order() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("roles");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("b.json"), "[]").unwrap();
        fs::write(dir.join("a.json"), "[]").unwrap();

        let found = find_fixture(root.path(), "roles").unwrap().unwrap();
        assert_eq!(found, dir.join("a.json"));
    }

    #[test]
    fn test_hidden_files_and_subdirectories_skipped() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("roles");
        fs::create_dir_all(dir.join("0-nested")).unwrap();
        fs::write(dir.join(".DS_Store"), "junk").unwrap();
        assert!(find_fixture(root.path(), "roles").unwrap().is_none());

        fs::write(dir.join("roles.json"), "[]").unwrap();
        assert_eq!(
            find_fixture(root.path(), "roles").unwrap(),
            Some(dir.join("roles.json"))
        );
    }

    #[test]
    fn test_rejects_path_like_names() {
        let root = tempfile::tempdir().unwrap();
        assert!(find_fixture(root.path(), "../etc").is_err());
        assert!(find_fixture(root.path(), "..").is_err());
        assert!(find_fixture(root.path(), "").is_err());
    }

    #[test]
    fn test_malformed_json_reports_path() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("roles");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("roles.json"), "not json").unwrap();

        let fixture = open_fixture(root.path(), "roles").unwrap().unwrap();
        let err = fixture.json::<Vec<String>>().unwrap_err();
        assert!(matches!(err, Error::Fixture { ref path, .. } if path.ends_with("roles.json")));
    }

    #[test]
    fn test_fixture_is_readable() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("roles");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("roles.json"), "raw bytes").unwrap();

        let mut fixture = open_fixture(root.path(), "roles").unwrap().unwrap();
        let mut contents = String::new();
        fixture.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "raw bytes");
    }
}
