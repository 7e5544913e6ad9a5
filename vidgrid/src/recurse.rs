use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use walkdir::{DirEntry, WalkDir};

use crate::discover::has_matching_videos;
use crate::{GridError, DEFAULT_PATTERN};

pub const GRID_BINARY: &str = "make-video-grid";

// Runs the grid composer for one directory
pub trait GridLauncher {
    // true when the composer reported success
    fn launch(&self, dir: &Path, args: &[OsString]) -> Result<bool, GridError>;
}

// Spawns the composer executable with `dir` as its working directory
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    pub program: PathBuf,
}

impl ProcessLauncher {
    // The composer binary sitting next to the running executable, or whatever
    // `make-video-grid` resolves to on PATH
    pub fn sibling() -> Self {
        let name = format!("{GRID_BINARY}{}", std::env::consts::EXE_SUFFIX);
        let program = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.join(&name)))
            .filter(|p| p.is_file())
            .unwrap_or_else(|| PathBuf::from(name));
        Self { program }
    }
}

impl GridLauncher for ProcessLauncher {
    fn launch(&self, dir: &Path, args: &[OsString]) -> Result<bool, GridError> {
        let status = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .status()
            .map_err(|source| GridError::ToolLaunch {
                tool: self.program.display().to_string(),
                source,
            })?;
        Ok(status.success())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn exit_code(&self) -> i32 {
        if self.failed == 0 {
            0
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirOutcome {
    Processed,
    Failed,
    Skipped,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

// Every directory below `start` (not `start` itself), hidden trees excluded
pub fn find_subdirectories(start: &Path) -> Result<Vec<PathBuf>, GridError> {
    let mut dirs = Vec::new();
    let walker = WalkDir::new(start)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

pub fn process_directory<L: GridLauncher>(
    launcher: &L,
    dir: &Path,
    args: &[OsString],
) -> DirOutcome {
    match has_matching_videos(dir, DEFAULT_PATTERN) {
        Ok(false) => {
            tracing::info!("Skipping (no MP4 files found): {}", dir.display());
            return DirOutcome::Skipped;
        }
        Ok(true) => {}
        Err(e) => {
            tracing::error!("✗ Error processing directory {}: {e}", dir.display());
            return DirOutcome::Failed;
        }
    }

    tracing::info!("Processing directory: {}", dir.display());
    match launcher.launch(dir, args) {
        Ok(true) => {
            tracing::info!("✓ Successfully created grid in: {}", dir.display());
            DirOutcome::Processed
        }
        Ok(false) => {
            tracing::error!("✗ Failed to create grid in: {}", dir.display());
            DirOutcome::Failed
        }
        Err(e) => {
            tracing::error!("✗ Error processing directory {}: {e}", dir.display());
            DirOutcome::Failed
        }
    }
}

pub fn run_recursive<L: GridLauncher>(
    launcher: &L,
    start: &Path,
    args: &[OsString],
) -> Result<RunSummary, GridError> {
    if !start.is_dir() {
        return Err(GridError::DirectoryNotFound(start.to_path_buf()));
    }
    tracing::info!("Searching for subdirectories in: {}", start.display());
    let subdirs = find_subdirectories(start)?;
    let mut summary = RunSummary::default();
    if subdirs.is_empty() {
        tracing::info!("No subdirectories found.");
        return Ok(summary);
    }

    for dir in subdirs.iter() {
        match process_directory(launcher, dir, args) {
            DirOutcome::Processed => summary.processed += 1,
            DirOutcome::Failed => summary.failed += 1,
            DirOutcome::Skipped => summary.skipped += 1,
        }
    }
    Ok(summary)
}

// Pull the driver's own flags out of the command line; everything else goes
// to the composer untouched and in order
pub fn split_passthrough<I>(args: I) -> (Vec<OsString>, Vec<OsString>)
where
    I: IntoIterator<Item = OsString>,
{
    const OWN_FLAGS: [&str; 4] = ["-h", "--help", "-V", "--version"];
    let mut args = args.into_iter();
    let mut own: Vec<OsString> = args.next().into_iter().collect();
    let mut forwarded = Vec::new();
    while let Some(arg) = args.next() {
        let text = arg.to_str().unwrap_or("");
        if text == "--start-dir" {
            own.push(arg);
            if let Some(value) = args.next() {
                own.push(value);
            }
        } else if text.starts_with("--start-dir=") || OWN_FLAGS.contains(&text) {
            own.push(arg);
        } else {
            forwarded.push(arg);
        }
    }
    (own, forwarded)
}

// for readable assertions / logs
pub fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.as_os_str())
        .map(OsStr::to_string_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::fs;

    use super::*;

    // Records launches; fails directories whose name is listed
    struct FakeLauncher {
        fail_dirs: Vec<&'static str>,
        launched: RefCell<Vec<(PathBuf, Vec<OsString>)>>,
    }

    impl FakeLauncher {
        fn failing(fail_dirs: Vec<&'static str>) -> Self {
            Self {
                fail_dirs,
                launched: RefCell::new(vec![]),
            }
        }
    }

    impl GridLauncher for FakeLauncher {
        fn launch(&self, dir: &Path, args: &[OsString]) -> Result<bool, GridError> {
            self.launched
                .borrow_mut()
                .push((dir.to_path_buf(), args.to_vec()));
            let name = dir.file_name().unwrap().to_string_lossy().into_owned();
            Ok(!self.fail_dirs.contains(&name.as_str()))
        }
    }

    fn os(v: &[&str]) -> Vec<OsString> {
        v.iter().map(OsString::from).collect()
    }

    #[test]
    fn tallies_processed_failed_skipped() {
        let root = tempfile::tempdir().unwrap();
        for (dir, files) in [
            ("A", vec!["a_1.mp4", "a_2.mp4"]),
            ("B", vec!["readme.txt"]),
            ("C", vec!["c_1.mp4"]),
        ] {
            let d = root.path().join(dir);
            fs::create_dir(&d).unwrap();
            for f in files {
                fs::write(d.join(f), b"").unwrap();
            }
        }
        let cwd_before = std::env::current_dir().unwrap();
        let launcher = FakeLauncher::failing(vec!["C"]);
        let args = os(&["--no-title", "--width", "800"]);

        let summary = run_recursive(&launcher, root.path(), &args).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                processed: 1,
                failed: 1,
                skipped: 1
            }
        );
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(std::env::current_dir().unwrap(), cwd_before);

        let launched = launcher.launched.borrow();
        assert_eq!(launched.len(), 2);
        assert_eq!(launched[0].0, root.path().join("A"));
        assert_eq!(launched[0].1, args);
        assert_eq!(launched[1].0, root.path().join("C"));
    }

    #[test]
    fn nested_and_hidden_directories() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("outer").join("inner");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("x_1.mp4"), b"").unwrap();
        let hidden = root.path().join(".cache").join("deep");
        fs::create_dir_all(&hidden).unwrap();
        fs::write(hidden.join("x_1.mp4"), b"").unwrap();

        let dirs = find_subdirectories(root.path()).unwrap();
        assert_eq!(dirs, vec![root.path().join("outer"), nested.clone()]);

        let launcher = FakeLauncher::failing(vec![]);
        let summary = run_recursive(&launcher, root.path(), &[]).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                processed: 1,
                failed: 0,
                skipped: 1
            }
        );
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn start_directory_must_exist() {
        let root = tempfile::tempdir().unwrap();
        let launcher = FakeLauncher::failing(vec![]);
        assert!(matches!(
            run_recursive(&launcher, &root.path().join("missing"), &[]),
            Err(GridError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn no_subdirectories_is_success() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("top_1.mp4"), b"").unwrap();
        let launcher = FakeLauncher::failing(vec![]);
        let summary = run_recursive(&launcher, root.path(), &[]).unwrap();
        assert_eq!(summary, RunSummary::default());
        assert!(launcher.launched.borrow().is_empty());
    }

    #[test]
    fn splits_own_flags_from_forwarded() {
        let (own, fwd) = split_passthrough(os(&[
            "make-video-grid-recursive",
            "--no-title",
            "--start-dir",
            "./experiments",
            "--label-format",
            "Camera %s",
            "--width=800",
        ]));
        assert_eq!(
            own,
            os(&["make-video-grid-recursive", "--start-dir", "./experiments"])
        );
        assert_eq!(
            fwd,
            os(&["--no-title", "--label-format", "Camera %s", "--width=800"])
        );
        assert_eq!(display_args(&fwd), "--no-title --label-format Camera %s --width=800");

        let (own, fwd) = split_passthrough(os(&["prog", "--start-dir=x", "-h"]));
        assert_eq!(own, os(&["prog", "--start-dir=x", "-h"]));
        assert!(fwd.is_empty());
    }
}
