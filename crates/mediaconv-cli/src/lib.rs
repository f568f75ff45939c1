use anyhow::Context;
use mediaconv_core::models::{DownloadedArtifact, SupportedFormats};
use mediaconv_core::{Feedback, FeedbackSink, NegotiationError, SessionError, Severity};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

/// Name used when the server-supplied name has nothing usable left.
const FALLBACK_FILE_NAME: &str = "converted";

/// Widest a formats table column may get before cells are shortened.
const MAX_COLUMN_WIDTH: usize = 16;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Render the supported formats as one column per media family.
///
/// The table has as many rows as the longest family; shorter columns are
/// left blank.
pub fn render_formats_table(formats: &SupportedFormats) -> String {
    let headers: Vec<String> = formats
        .families()
        .map(|(family, _)| truncate_string(&family.to_uppercase(), MAX_COLUMN_WIDTH))
        .collect();
    let rows: Vec<Vec<String>> = formats
        .rows()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| {
                    cell.map(|tag| truncate_string(tag.as_str(), MAX_COLUMN_WIDTH))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            rows.iter()
                .map(|row| row[col].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_row(&mut out, &headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// Reduce a server-supplied file name to a single safe path component.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.');

    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Write `artifact` into `dir`, creating the directory if needed.
pub async fn write_artifact(dir: &Path, artifact: &DownloadedArtifact) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let path = dir.join(sanitize_file_name(&artifact.file_name));
    tokio::fs::write(&path, &artifact.content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), bytes = artifact.len(), "Saved conversion result");
    Ok(path)
}

/// Prints user-facing feedback, one line per message. Binaries write to
/// stderr so stdout stays free for JSON output.
pub struct ConsoleFeedback {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleFeedback {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl FeedbackSink for ConsoleFeedback {
    fn notify(&self, feedback: Feedback) {
        let line = match feedback.severity {
            Severity::Neutral => return,
            Severity::Progress => feedback.message,
            Severity::Warning => format!("warning: {}", feedback.message),
            Severity::Error => format!("error: {}", feedback.message),
        };
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{}", line);
        }
    }
}

/// Whether the orchestrator has already shown this failure through its feedback sink.
pub fn already_reported(err: &anyhow::Error) -> bool {
    err.downcast_ref::<NegotiationError>().is_some() || err.downcast_ref::<SessionError>().is_some()
}

/// Map the outcome of a command to an exit code.
///
/// Failures the feedback sink has shown are not printed a second time; the
/// raw error is still in the tracing output.
pub fn finish(result: anyhow::Result<()>, out: &mut impl Write) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if already_reported(&err) => ExitCode::FAILURE,
        Err(err) => {
            let _ = writeln!(out, "error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaconv_core::models::FormatTag;
    use mediaconv_orchestrator::test_helpers::{input_files, media_service, transport};
    use mediaconv_orchestrator::ConversionOrchestrator;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    /// Writer whose contents stay readable after it is handed to a sink.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn is_failure(code: ExitCode) -> bool {
        format!("{:?}", code) == format!("{:?}", ExitCode::FAILURE)
    }

    fn formats() -> SupportedFormats {
        let mut families = BTreeMap::new();
        families.insert(
            "audio".to_string(),
            vec![FormatTag::parse("MP3"), FormatTag::parse("WAV")],
        );
        families.insert(
            "image".to_string(),
            vec![
                FormatTag::parse("PNG"),
                FormatTag::parse("JPG"),
                FormatTag::parse("GIF"),
            ],
        );
        SupportedFormats::new(families)
    }

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_counts_characters() {
        assert_eq!(truncate_string("ééééé", 5), "ééééé");
        assert_eq!(truncate_string("éééééé", 5), "éé...");
    }

    #[test]
    fn formats_table_has_row_per_longest_family() {
        let table = render_formats_table(&formats());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 2 + 3);
        assert_eq!(lines[0], "AUDIO  IMAGE");
        assert_eq!(lines[1], "-----  -----");
        assert_eq!(lines[2], "MP3    PNG");
        assert_eq!(lines[3], "WAV    JPG");
        assert_eq!(lines[4], "       GIF");
    }

    #[test]
    fn formats_table_empty() {
        let table = render_formats_table(&SupportedFormats::default());
        assert_eq!(table, "\n\n");
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\temp\\out.jpg"), "out.jpg");
        assert_eq!(sanitize_file_name("a.jpg"), "a.jpg");
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_file_name("a:b*c?.zip"), "a_b_c_.zip");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
    }

    #[test]
    fn sanitize_falls_back_when_nothing_left() {
        assert_eq!(sanitize_file_name(""), FALLBACK_FILE_NAME);
        assert_eq!(sanitize_file_name("dir/"), FALLBACK_FILE_NAME);
        assert_eq!(sanitize_file_name(".."), FALLBACK_FILE_NAME);
    }

    #[test]
    fn console_feedback_prefixes_by_severity() {
        let buffer = SharedBuffer::default();
        let console = ConsoleFeedback::new(buffer.clone());

        console.notify(Feedback::progress("Uploading files..."));
        console.notify(Feedback::clear());
        console.notify(Feedback::warning("Please select a file to convert."));
        console.notify(Feedback::error("boom"));

        assert_eq!(
            buffer.lines(),
            vec![
                "Uploading files...",
                "warning: Please select a file to convert.",
                "error: boom",
            ]
        );
    }

    #[tokio::test]
    async fn failed_negotiation_is_shown_once() {
        let service = media_service();
        service.fail_conversions("PNG", transport("connection refused"));
        let buffer = SharedBuffer::default();
        let mut orchestrator = ConversionOrchestrator::new(service)
            .with_feedback(Arc::new(ConsoleFeedback::new(buffer.clone())));

        let result = orchestrator
            .select_files(&input_files(&["a.png"]))
            .await
            .map(|_| ())
            .map_err(anyhow::Error::from);
        let code = finish(result, &mut buffer.clone());

        assert!(is_failure(code));
        assert_eq!(
            buffer.lines(),
            vec![
                "error: An error occurred while getting valid conversion options. \
                 Please try again."
            ]
        );
    }

    #[tokio::test]
    async fn refused_conversion_is_shown_once() {
        let buffer = SharedBuffer::default();
        let mut orchestrator = ConversionOrchestrator::new(media_service())
            .with_feedback(Arc::new(ConsoleFeedback::new(buffer.clone())));

        let result = orchestrator
            .convert(&[], &FormatTag::parse("JPG"))
            .await
            .map(|_| ())
            .map_err(anyhow::Error::from);
        let code = finish(result, &mut buffer.clone());

        assert!(is_failure(code));
        assert_eq!(buffer.lines(), vec!["warning: Please select a file to convert."]);
    }

    #[test]
    fn unreported_failure_is_printed_by_finish() {
        let mut out = Vec::new();
        let err = anyhow::anyhow!("No such file").context("Failed to read a.png");

        assert!(is_failure(finish(Err(err), &mut out)));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "error: Failed to read a.png: No such file\n"
        );
        assert!(!is_failure(finish(Ok(()), &mut Vec::new())));
    }

    #[tokio::test]
    async fn write_artifact_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let artifact = DownloadedArtifact::new("../a.jpg", b"jpeg".to_vec());

        let path = write_artifact(&out, &artifact).await.unwrap();

        assert_eq!(path, out.join("a.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"jpeg");
    }
}
