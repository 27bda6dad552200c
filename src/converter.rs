//! The external markup converter.
//!
//! A converter is an opaque batch transform: wiki markup in, document out.
//! The only failure signal the pipeline trusts is whether the output file
//! exists afterwards, so [`Converter::run`] errors are informational.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::debug;

/// Input dialect handed to the converter.
pub const SOURCE_DIALECT: &str = "mediawiki";

/// Target format of one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// The `.md` intermediate.
    Markdown,
    /// The full `.html` document that gets normalized.
    Html,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
        }
    }
}

/// One converter run: `{from, to, input, output}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterInvocation {
    pub from: &'static str,
    pub to: OutputFormat,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ConverterInvocation {
    pub fn new(to: OutputFormat, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            from: SOURCE_DIALECT,
            to,
            input: input.into(),
            output: output.into(),
        }
    }

    /// Command-line arguments in pandoc's order.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-f".to_string(),
            self.from.to_string(),
            "-t".to_string(),
            self.to.as_str().to_string(),
            "-o".to_string(),
            self.output.display().to_string(),
            self.input.display().to_string(),
        ]
    }
}

impl fmt::Display for ConverterInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args().join(" "))
    }
}

/// An external converter the pipeline can drive.
#[allow(async_fn_in_trait)]
pub trait Converter {
    /// Run one conversion. The output file's existence is checked by the
    /// caller whatever this returns.
    async fn run(&self, invocation: &ConverterInvocation) -> io::Result<()>;

    /// The exact invocation, as reported in a CONVERSION_FAILED error.
    fn command_line(&self, invocation: &ConverterInvocation) -> String {
        invocation.to_string()
    }
}

/// Runs the `pandoc` executable.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
}

impl PandocConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self::new("pandoc")
    }
}

impl Converter for PandocConverter {
    async fn run(&self, invocation: &ConverterInvocation) -> io::Result<()> {
        debug!("Running {}", self.command_line(invocation));
        let output = tokio::process::Command::new(&self.program)
            .args(invocation.args())
            .stdin(Stdio::null())
            .output()
            .await?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(io::Error::other(format!(
                "{} ({})",
                output.status,
                stderr.trim()
            )))
        }
    }

    fn command_line(&self, invocation: &ConverterInvocation) -> String {
        format!("{} {}", self.program.display(), invocation)
    }
}
