//! Image path enumeration
//!
//! Lists the direct children of the image directory whose file names end in
//! one of the accepted suffixes, sorted by file name. The suffix match is
//! case-sensitive: `.JPG` and `.jpg` are different suffixes.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::error::{ProfileError, Result};

/// Collect the image files of `dir` whose names end with one of `extensions`
///
/// The returned paths are sorted by file name. An empty result is not an
/// error here; preprocessing rejects an empty batch.
pub fn collect_image_paths<P: AsRef<Path>, S: AsRef<str>>(
    dir: P,
    extensions: &[S],
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    info!("Scanning image directory: {:?}", dir);

    if !dir.is_dir() {
        return Err(ProfileError::PathNotFound(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            ProfileError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            )
        })?;

        let path = entry.path();
        // Follow symlinks so a linked image still counts as a file
        if !path.is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            debug!("Skipping non UTF-8 file name: {:?}", entry.file_name());
            continue;
        };

        if extensions.iter().any(|ext| name.ends_with(ext.as_ref())) {
            paths.push(path.to_path_buf());
        } else {
            debug!("Skipping {}: extension not accepted", name);
        }
    }

    info!("Found {} image(s)", paths.len());
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const EXTENSIONS: [&str; 3] = [".png", ".JPG", ".jpeg"];

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["d.jpeg", "b.txt", "c.JPG", "a.png"] {
            fs::write(temp_dir.path().join(name), b"x").unwrap();
        }

        let paths = collect_image_paths(temp_dir.path(), &EXTENSIONS).unwrap();
        assert_eq!(names(&paths), vec!["a.png", "c.JPG", "d.jpeg"]);
        assert!(paths.iter().all(|p| p.starts_with(temp_dir.path())));
    }

    #[test]
    fn test_suffix_match_is_case_sensitive() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["upper.PNG", "lower.jpg", "mixed.Jpeg", "ok.png"] {
            fs::write(temp_dir.path().join(name), b"x").unwrap();
        }

        let paths = collect_image_paths(temp_dir.path(), &EXTENSIONS).unwrap();
        assert_eq!(names(&paths), vec!["ok.png"]);
    }

    #[test]
    fn test_sorted_by_name_not_creation_order() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["frame_10.png", "frame_02.png", "frame_01.png"] {
            fs::write(temp_dir.path().join(name), b"x").unwrap();
        }

        let paths = collect_image_paths(temp_dir.path(), &EXTENSIONS).unwrap();
        assert_eq!(
            names(&paths),
            vec!["frame_01.png", "frame_02.png", "frame_10.png"]
        );
    }

    #[test]
    fn test_ignores_directories_and_nested_files() {
        let temp_dir = TempDir::new().unwrap();
        let sub_dir = temp_dir.path().join("nested.png");
        fs::create_dir(&sub_dir).unwrap();
        fs::write(sub_dir.join("inner.png"), b"x").unwrap();
        fs::write(temp_dir.path().join("top.png"), b"x").unwrap();

        let paths = collect_image_paths(temp_dir.path(), &EXTENSIONS).unwrap();
        assert_eq!(names(&paths), vec!["top.png"]);
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let paths = collect_image_paths(temp_dir.path(), &EXTENSIONS).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let err = collect_image_paths("no/such/dir", &EXTENSIONS).unwrap_err();
        assert!(matches!(err, ProfileError::PathNotFound(_)));
    }
}
