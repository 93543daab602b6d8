use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::fs;
use thiserror::Error;

/// Location of the library manifest relative to the user's home directory.
const DEFAULT_VDF_SUBPATH: &str = ".steam/root/steamapps/libraryfolders.vdf";

/// Errors from Steam library discovery
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Could not find Steam library vdf: '{0}'")]
    ConfigNotFound(Utf8PathBuf),

    #[error("Could not find Steam library directories in '{0}'")]
    NoLibrariesFound(Utf8PathBuf),
}

/// Discovers Steam library root directories.
///
/// Steam records its library folders in `libraryfolders.vdf`, a manifest of
/// quoted key/value lines. Only the `"path"` entries matter here; the rest
/// of the format is not parsed.
#[derive(Debug)]
pub struct LibraryLocator {
    vdf_path: Utf8PathBuf,

    /// Matches a quoted `"path" "<value>"` line
    path_pattern: Regex,
}

impl LibraryLocator {
    /// Create a locator reading the given vdf file.
    pub fn new<P: AsRef<Utf8Path>>(vdf_path: P) -> Self {
        Self {
            vdf_path: vdf_path.as_ref().to_path_buf(),
            path_pattern: Regex::new(r#""path"\s+"([^"]+)""#).expect("Invalid path regex"),
        }
    }

    /// Create a locator for the default per-user Steam root.
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().context("Could not determine the home directory")?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|p| anyhow::anyhow!("Home directory is not UTF-8: {}", p.display()))?;
        Ok(Self::new(home.join(DEFAULT_VDF_SUBPATH)))
    }

    /// Path of the vdf file this locator reads.
    pub fn vdf_path(&self) -> &Utf8Path {
        &self.vdf_path
    }

    /// Discover library roots: every `"path"` entry in the vdf whose target
    /// directory exists on disk, deduplicated in file order.
    ///
    /// # Errors
    /// [`LibraryError::ConfigNotFound`] if the vdf file is absent,
    /// [`LibraryError::NoLibrariesFound`] if no parsed entry exists on disk.
    pub fn discover(&self) -> Result<Vec<Utf8PathBuf>> {
        if !self.vdf_path.exists() {
            return Err(LibraryError::ConfigNotFound(self.vdf_path.clone()).into());
        }

        tracing::info!("Reading libraries from '{}'", self.vdf_path);
        let contents = fs::read_to_string(&self.vdf_path)
            .with_context(|| format!("Failed to read library vdf: {}", self.vdf_path))?;

        let mut dirs = Vec::new();
        for path in self.parse_paths(&contents) {
            if !path.exists() {
                tracing::debug!("Skipping missing library dir: '{}'", path);
                continue;
            }
            if !dirs.contains(&path) {
                dirs.push(path);
            }
        }

        if dirs.is_empty() {
            return Err(LibraryError::NoLibrariesFound(self.vdf_path.clone()).into());
        }

        tracing::info!("Found libraries: {:?}", dirs);
        Ok(dirs)
    }

    /// Extract every quoted `"path"` value from the manifest text, without
    /// checking existence.
    pub fn parse_paths(&self, contents: &str) -> Vec<Utf8PathBuf> {
        contents
            .lines()
            .filter_map(|line| self.path_pattern.captures(line))
            .map(|caps| Utf8PathBuf::from(&caps[1]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn write_vdf(dir: &TempDir, contents: &str) -> Utf8PathBuf {
        let vdf = dir.path().join("libraryfolders.vdf");
        fs::write(&vdf, contents).unwrap();
        Utf8PathBuf::try_from(vdf).unwrap()
    }

    #[test]
    fn test_missing_vdf_is_config_not_found() {
        let locator = LibraryLocator::new("/nonexistent/libraryfolders.vdf");
        let err = locator.discover().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LibraryError>(),
            Some(LibraryError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn test_discover_keeps_only_existing_dirs() {
        let temp = TempDir::new().unwrap();
        let lib_a = Utf8PathBuf::try_from(temp.path().join("lib_a")).unwrap();
        fs::create_dir(&lib_a).unwrap();

        let contents = format!(
            "\"libraryfolders\"\n{{\n\t\"0\"\n\t{{\n\t\t\"path\"\t\t\"{}\"\n\t}}\n\t\"1\"\n\t{{\n\t\t\"path\"\t\t\"{}/missing\"\n\t}}\n}}\n",
            lib_a,
            lib_a
        );
        let vdf = write_vdf(&temp, &contents);

        let dirs = LibraryLocator::new(&vdf).discover().unwrap();
        assert_eq!(dirs, vec![lib_a]);
    }

    #[test]
    fn test_discover_deduplicates() {
        let temp = TempDir::new().unwrap();
        let lib = Utf8PathBuf::try_from(temp.path().join("lib")).unwrap();
        fs::create_dir(&lib).unwrap();

        let contents = format!(
            "\t\"path\"\t\"{}\"\n\t\"path\"\t\"{}\"\n",
            lib, lib
        );
        let vdf = write_vdf(&temp, &contents);

        let dirs = LibraryLocator::new(&vdf).discover().unwrap();
        assert_eq!(dirs.len(), 1);
    }

    #[test]
    fn test_no_existing_dirs_is_no_libraries_found() {
        let temp = TempDir::new().unwrap();
        let vdf = write_vdf(&temp, "\t\"path\"\t\"/does/not/exist\"\n");

        let err = LibraryLocator::new(&vdf).discover().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LibraryError>(),
            Some(LibraryError::NoLibrariesFound(_))
        ));
    }

    #[test]
    fn test_parse_ignores_other_keys() {
        let locator = LibraryLocator::new("unused.vdf");
        let contents = "\t\"label\"\t\"not a path\"\n\t\"path\"\t\"/steam\"\n\t\"contentid\"\t\"123\"\n";
        assert_eq!(
            locator.parse_paths(contents),
            vec![Utf8PathBuf::from("/steam")]
        );
    }

    proptest! {
        /// Any quoted "path" value without embedded quotes round-trips
        /// through the line parser.
        #[test]
        fn prop_parse_extracts_quoted_paths(
            values in proptest::collection::vec("[a-zA-Z0-9_/. -]{1,40}", 0..8)
        ) {
            let locator = LibraryLocator::new("unused.vdf");
            let contents: String = values
                .iter()
                .map(|v| format!("\t\t\"path\"\t\t\"{}\"\n", v))
                .collect();

            let parsed = locator.parse_paths(&contents);
            prop_assert_eq!(parsed.len(), values.len());
            for (path, value) in parsed.iter().zip(values.iter()) {
                prop_assert_eq!(path.as_str(), value.as_str());
            }
        }
    }
}
