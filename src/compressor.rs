//! External minifier invocation.
//!
//! A [`Compressor`] only describes the command line; running it and checking the result is
//! shared by every kind of package.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::config::AssetKind;
use crate::error::{PackageError, PackageResult};

/// Default location of the YUI Compressor jar used for stylesheets.
pub const DEFAULT_YUI_JAR: &str = "vendor/yuicompressor-2.4.2.jar";
/// Default location of the Closure Compiler jar used for scripts.
pub const DEFAULT_CLOSURE_JAR: &str = "vendor/closure-compiler.jar";

/// Where a compressor leaves its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressorOutput {
  /// The compressed body is printed on stdout.
  Stdout,
  /// The compressor writes the body to this file itself.
  File(PathBuf),
}

/// A fully rendered compressor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressorCommand {
  /// Executable to spawn.
  pub program: OsString,
  /// Arguments in order.
  pub args: Vec<OsString>,
  /// Where the result ends up.
  pub output: CompressorOutput,
}

impl CompressorCommand {
  /// Command line as a single string, for logs and error reports.
  pub fn render(&self) -> String {
    std::iter::once(&self.program)
      .chain(&self.args)
      .map(|part| part.to_string_lossy())
      .collect::<Vec<_>>()
      .join(" ")
  }

  /// Spawn the command and wait for it.
  ///
  /// Returns the captured stdout for [`CompressorOutput::Stdout`] and `None` when the
  /// compressor wrote its own output file.
  ///
  /// An output file left by an earlier run is removed first, so a compressor that succeeds
  /// without writing is still reported.
  pub fn run(&self) -> PackageResult<Option<String>> {
    if let CompressorOutput::File(path) = &self.output {
      remove_stale_output(path)?;
    }
    debug!(command = %self.render(), "running compressor");
    let output = Command::new(&self.program)
      .args(&self.args)
      .output()
      .map_err(|err| self.failure(format!("failed to spawn: {err}")))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(self.failure(format!("exited with {}: {}", output.status, stderr.trim())));
    }

    match &self.output {
      CompressorOutput::Stdout => String::from_utf8(output.stdout)
        .map(Some)
        .map_err(|_| self.failure("output is not valid UTF-8".to_string())),
      CompressorOutput::File(path) if path.is_file() => Ok(None),
      CompressorOutput::File(path) => {
        Err(self.failure(format!("no output written to {}", path.display())))
      }
    }
  }

  fn failure(&self, detail: String) -> PackageError {
    PackageError::CompressorFailure {
      command: self.render(),
      detail,
    }
  }
}

fn remove_stale_output(path: &Path) -> PackageResult<()> {
  match fs::remove_file(path) {
    Ok(()) => {
      debug!(path = %path.display(), "removed previous compressor output");
      Ok(())
    }
    Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
    Err(err) => Err(PackageError::io(path, err)),
  }
}

/// Maps package inputs onto an external compressor command line.
pub trait Compressor {
  /// Command compressing `inputs` into `output`.
  fn command(&self, inputs: &[PathBuf], output: &Path) -> CompressorCommand;

  /// Whether the inputs are concatenated into one scratch file before compression.
  fn pre_concatenate(&self) -> bool;

  /// Text written after each file when pre-concatenating.
  fn separator(&self) -> &str {
    ""
  }
}

/// YUI Compressor in CSS mode; the result is read from stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetCompressor {
  /// Java launcher.
  pub java: PathBuf,
  /// YUI Compressor jar.
  pub jar: PathBuf,
}

impl Default for StylesheetCompressor {
  fn default() -> Self {
    Self {
      java: PathBuf::from("java"),
      jar: PathBuf::from(DEFAULT_YUI_JAR),
    }
  }
}

impl Compressor for StylesheetCompressor {
  fn command(&self, inputs: &[PathBuf], _output: &Path) -> CompressorCommand {
    let mut args = java_jar_args(&self.jar);
    args.extend(["--type", "css"].map(OsString::from));
    args.extend(inputs.iter().map(|path| path.as_os_str().to_owned()));

    CompressorCommand {
      program: self.java.as_os_str().to_owned(),
      args,
      output: CompressorOutput::Stdout,
    }
  }

  fn pre_concatenate(&self) -> bool {
    true
  }

  fn separator(&self) -> &str {
    "\n"
  }
}

/// Closure Compiler writing straight to the target file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCompressor {
  /// Java launcher.
  pub java: PathBuf,
  /// Closure Compiler jar.
  pub jar: PathBuf,
  /// Feed one scratch file instead of one `--js` flag per input.
  pub pre_concatenate: bool,
}

impl Default for ScriptCompressor {
  fn default() -> Self {
    Self {
      java: PathBuf::from("java"),
      jar: PathBuf::from(DEFAULT_CLOSURE_JAR),
      pre_concatenate: false,
    }
  }
}

impl Compressor for ScriptCompressor {
  fn command(&self, inputs: &[PathBuf], output: &Path) -> CompressorCommand {
    let mut args = java_jar_args(&self.jar);
    args.push("--js_output_file".into());
    args.push(output.as_os_str().to_owned());
    args.extend(["--warning_level", "QUIET"].map(OsString::from));
    for input in inputs {
      args.push("--js".into());
      args.push(input.as_os_str().to_owned());
    }

    CompressorCommand {
      program: self.java.as_os_str().to_owned(),
      args,
      output: CompressorOutput::File(output.to_path_buf()),
    }
  }

  fn pre_concatenate(&self) -> bool {
    self.pre_concatenate
  }

  fn separator(&self) -> &str {
    ";\n"
  }
}

/// Compressor used for `kind` when none is injected.
pub fn default_compressor(kind: AssetKind) -> Box<dyn Compressor> {
  match kind {
    AssetKind::Stylesheet => Box::new(StylesheetCompressor::default()),
    AssetKind::Script => Box::new(ScriptCompressor::default()),
  }
}

fn java_jar_args(jar: &Path) -> Vec<OsString> {
  vec![OsStr::new("-jar").to_owned(), jar.as_os_str().to_owned()]
}
