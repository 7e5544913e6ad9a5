use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::GridError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub path: PathBuf,
    // text drawn on the cell / frame
    pub label: String,
    // numeric suffix of `<name>_<number>` filenames
    pub index: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub videos: Vec<VideoRef>,
    // shared `<name>` prefix, first one seen wins
    pub common_name: Option<String>,
}

const MATCH_OPTS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

// Split a stem like `experiment_12` into ("experiment", "12")
pub fn split_numbered_stem(stem: &str) -> Option<(&str, &str)> {
    let (name, num) = stem.rsplit_once('_')?;
    if name.is_empty() || num.is_empty() || !num.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((name, num))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// Sorted regular files in `dir` matching `pattern`
pub fn matching_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, GridError> {
    let escaped_dir = Pattern::escape(&dir.to_string_lossy());
    let full = if escaped_dir.is_empty() {
        pattern.to_string()
    } else {
        format!("{}/{}", escaped_dir.trim_end_matches('/'), pattern)
    };
    let mut files: Vec<PathBuf> = glob::glob_with(&full, MATCH_OPTS)?
        .filter_map(|entry| match entry {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

pub fn has_matching_videos(dir: &Path, pattern: &str) -> Result<bool, GridError> {
    Ok(!matching_files(dir, pattern)?.is_empty())
}

pub fn find_videos(dir: &Path, pattern: &str) -> Result<Discovery, GridError> {
    let files = matching_files(dir, pattern)?;
    if files.is_empty() {
        return Err(GridError::NoInputsFound {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }
    Ok(label_videos(files))
}

// Derive labels and the common name from a sorted file list
pub fn label_videos(files: Vec<PathBuf>) -> Discovery {
    let mut common_name: Option<String> = None;
    let videos = files
        .into_iter()
        .map(|path| {
            let stem = file_stem(&path);
            match split_numbered_stem(&stem) {
                Some((name, num)) => {
                    match common_name {
                        None => common_name = Some(name.to_string()),
                        Some(ref seen) if seen != name => {
                            tracing::warn!(
                                "Mixed video name patterns detected ('{seen}' vs '{name}')"
                            );
                        }
                        Some(_) => {}
                    }
                    VideoRef {
                        index: num.parse().ok(),
                        label: num.to_string(),
                        path,
                    }
                }
                None => VideoRef {
                    label: stem,
                    index: None,
                    path,
                },
            }
        })
        .collect();
    Discovery {
        videos,
        common_name,
    }
}

// Caller-supplied videos, in the given order
pub fn from_explicit(
    videos: &[PathBuf],
    captions: Option<&[String]>,
) -> Result<Vec<VideoRef>, GridError> {
    if videos.is_empty() {
        return Err(GridError::NoInputsFound {
            dir: PathBuf::from("."),
            pattern: String::from("--videos"),
        });
    }
    if let Some(captions) = captions {
        if captions.len() != videos.len() {
            return Err(GridError::CaptionCountMismatch {
                captions: captions.len(),
                videos: videos.len(),
            });
        }
    }
    if let Some(missing) = videos.iter().find(|v| !v.exists()) {
        return Err(GridError::VideoNotFound(missing.clone()));
    }
    let refs = videos
        .iter()
        .enumerate()
        .map(|(idx, path)| VideoRef {
            label: captions
                .map(|c| c[idx].clone())
                .unwrap_or_else(|| file_stem(path)),
            index: None,
            path: path.clone(),
        })
        .collect();
    Ok(refs)
}
