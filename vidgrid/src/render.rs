use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::opts::Verbosity;
use crate::GridError;

// An ffmpeg command line, minus the program name
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FfmpegArgs {
    args: Vec<OsString>,
    output: Option<PathBuf>,
}

impl FfmpegArgs {
    // `-loglevel <lvl> -y`, shared prologue of every invocation
    pub fn new(verbosity: Verbosity) -> Self {
        let mut me = Self::default();
        me.push("-loglevel").push(verbosity.loglevel()).push("-y");
        me
    }

    pub fn push(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn input(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.push("-i").push(path.as_ref())
    }

    // concat demuxer over a manifest file
    pub fn concat_input(&mut self, manifest: impl AsRef<Path>) -> &mut Self {
        self.push("-f")
            .push("concat")
            .push("-safe")
            .push("0")
            .input(manifest)
    }

    pub fn opt(&mut self, key: &str, value: impl Into<OsString>) -> &mut Self {
        self.push(key).push(value)
    }

    pub fn output(&mut self, path: impl AsRef<Path>) -> Self {
        let mut done = self.clone();
        done.args.push(path.as_ref().as_os_str().to_os_string());
        done.output = Some(path.as_ref().to_path_buf());
        done
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    // Lossy strings, handy for logs and assertions
    pub fn to_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RunStatus {
    // None when the tool was killed by a signal
    pub code: Option<i32>,
}

impl RunStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

// Anything that can execute an ffmpeg command line and report how it went
pub trait MediaRenderer {
    fn run(&self, cmd: &FfmpegArgs) -> Result<RunStatus, GridError>;
}

#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    pub binary: PathBuf,
    pub verbosity: Verbosity,
}

impl FfmpegRenderer {
    pub fn new(binary: impl Into<PathBuf>, verbosity: Verbosity) -> Self {
        Self {
            binary: binary.into(),
            verbosity,
        }
    }
}

impl MediaRenderer for FfmpegRenderer {
    fn run(&self, cmd: &FfmpegArgs) -> Result<RunStatus, GridError> {
        let tool = self.binary.display().to_string();
        let mut command = Command::new(&self.binary);
        command.args(cmd.args()).stdin(Stdio::null());
        tracing::debug!("Running {tool} with {} arguments", cmd.args().len());

        if self.verbosity.verbose {
            // the tool talks straight to our terminal
            let status = command
                .status()
                .map_err(|source| GridError::ToolLaunch { tool, source })?;
            return Ok(RunStatus {
                code: status.code(),
            });
        }

        let output = command
            .output()
            .map_err(|source| GridError::ToolLaunch { tool, source })?;
        let status = RunStatus {
            code: output.status.code(),
        };
        if !status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if !stderr.is_empty() {
                tracing::error!("{}: {stderr}", self.binary.display());
            }
        }
        Ok(status)
    }
}
