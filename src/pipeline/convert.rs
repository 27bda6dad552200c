//! Converter invocation with the output-exists postcondition.

use crate::converter::{Converter, ConverterInvocation, OutputFormat};
use crate::error::ArchiveError;
use crate::pipeline::job::ArchiveJob;
use std::io::ErrorKind;
use tracing::{debug, info, warn};

/// `.mwk → .md` for `job`.
pub fn markdown_invocation(job: &ArchiveJob) -> ConverterInvocation {
    ConverterInvocation::new(
        OutputFormat::Markdown,
        &job.raw_source_path,
        &job.intermediate_path,
    )
}

/// `.mwk → .html` for `job`.
pub fn document_invocation(job: &ArchiveJob) -> ConverterInvocation {
    ConverterInvocation::new(
        OutputFormat::Html,
        &job.raw_source_path,
        &job.final_document_path,
    )
}

/// Run `invocation` and require its output file to exist afterwards.
///
/// Any output left from an earlier run is removed first. A missing output
/// is `ConversionFailed` carrying the exact command line.
pub async fn invoke_converter<C: Converter>(
    converter: &C,
    invocation: &ConverterInvocation,
) -> Result<(), ArchiveError> {
    match tokio::fs::remove_file(&invocation.output).await {
        Ok(()) => debug!("Removed stale {}", invocation.output.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(ArchiveError::fs(&invocation.output, e)),
    }

    let command = converter.command_line(invocation);
    if let Err(e) = converter.run(invocation).await {
        warn!("{}: {}", command, e);
    }

    match tokio::fs::try_exists(&invocation.output).await {
        Ok(true) => {
            info!("Converted to {}", invocation.output.display());
            Ok(())
        }
        _ => Err(ArchiveError::ConversionFailed { command }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;

    struct Writes(&'static str);

    impl Converter for Writes {
        async fn run(&self, inv: &ConverterInvocation) -> io::Result<()> {
            tokio::fs::write(&inv.output, self.0).await
        }
    }

    struct Silent;

    impl Converter for Silent {
        async fn run(&self, _inv: &ConverterInvocation) -> io::Result<()> {
            Err(io::Error::other("exit status: 1"))
        }
    }

    fn job(root: &Path) -> ArchiveJob {
        let job = ArchiveJob::derive("Foo Bar", root);
        std::fs::create_dir_all(&job.directory).unwrap();
        job
    }

    #[tokio::test]
    async fn output_present_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        invoke_converter(&Writes("<p>x</p>"), &document_invocation(&job))
            .await
            .unwrap();
        assert!(job.final_document_path.exists());
    }

    #[tokio::test]
    async fn missing_output_reports_command() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        let err = invoke_converter(&Silent, &document_invocation(&job))
            .await
            .unwrap_err();
        match err {
            ArchiveError::ConversionFailed { command } => {
                assert!(command.starts_with("-f mediawiki -t html -o "));
                assert!(command.ends_with("Foo_Bar.mwk"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn stale_output_does_not_satisfy_postcondition() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        std::fs::write(&job.intermediate_path, "old").unwrap();
        let result = invoke_converter(&Silent, &markdown_invocation(&job)).await;
        assert!(matches!(result, Err(ArchiveError::ConversionFailed { .. })));
        assert!(!job.intermediate_path.exists());
    }
}
