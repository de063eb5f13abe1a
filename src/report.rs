use console::Style;
use std::io::Write;
use tracing::warn;

use crate::executor::ExecutionResult;

pub const SEPARATOR_WIDTH: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    Success,
    Failure,
    Separator,
    Label,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub tag: LineTag,
    pub text: String,
}

impl ReportLine {
    fn new(tag: LineTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
        }
    }
}

pub fn separator() -> ReportLine {
    ReportLine::new(LineTag::Separator, "-".repeat(SEPARATOR_WIDTH))
}

/// Builds the report for one run. Pure: sinks decide color and destination.
///
/// The label goes out whenever one is given and stderr is non-empty, even
/// when the command succeeded: analysis tools chatter on stderr without
/// failing.
pub fn format(result: &ExecutionResult, label: Option<&str>) -> Vec<ReportLine> {
    let mut lines = vec![separator()];

    if let Some(label) = label {
        if !result.stderr.is_empty() {
            lines.push(ReportLine::new(LineTag::Label, label));
        }
    }

    match &result.error {
        None => {
            if !result.stdout.is_empty() {
                lines.push(ReportLine::new(LineTag::Success, result.stdout.as_str()));
            }
        }
        Some(failure) => {
            let before = lines.len();
            for text in [&result.stdout, &result.stderr] {
                if !text.is_empty() {
                    lines.push(ReportLine::new(LineTag::Failure, text.as_str()));
                }
            }
            if lines.len() == before {
                lines.push(ReportLine::new(LineTag::Failure, failure.to_string()));
            }
        }
    }

    lines
}

fn style_for(tag: LineTag) -> Style {
    match tag {
        LineTag::Success => Style::new().green(),
        LineTag::Failure => Style::new().red(),
        LineTag::Separator => Style::new().dim(),
        LineTag::Label => Style::new().cyan().bold(),
    }
}

/// Renders lines as text, one `\n`-terminated entry per line. Captured
/// output keeps its inner newlines but loses the trailing ones.
pub fn render(lines: &[ReportLine], color: bool) -> String {
    let mut out = String::new();
    for line in lines {
        let text = line.text.trim_end_matches(['\n', '\r']);
        let text = match line.tag {
            LineTag::Label => format!("[{}]", text),
            _ => text.to_string(),
        };
        if color {
            out.push_str(
                &style_for(line.tag)
                    .force_styling(true)
                    .apply_to(text)
                    .to_string(),
            );
        } else {
            out.push_str(&text);
        }
        out.push('\n');
    }
    out
}

/// Destination for finished reports. Shared between concurrently running
/// commands.
pub trait ReportSink: Send + Sync {
    fn emit(&self, lines: &[ReportLine]);
}

/// Writes each report to stdout in one locked write.
pub struct ConsoleSink {
    color: bool,
}

impl ConsoleSink {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Color on when stdout supports it, unless `no_color` is set.
    pub fn detect(no_color: bool) -> Self {
        Self::new(!no_color && console::colors_enabled())
    }
}

impl ReportSink for ConsoleSink {
    fn emit(&self, lines: &[ReportLine]) {
        let text = render(lines, self.color);
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
            warn!(error = %e, "failed to write report");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CommandFailed;

    fn ok(stdout: &str, stderr: &str) -> ExecutionResult {
        ExecutionResult {
            error: None,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    fn failed(stdout: &str, stderr: &str) -> ExecutionResult {
        ExecutionResult {
            error: Some(CommandFailed {
                command: "go test".to_string(),
                reason: "exited with code 1".to_string(),
            }),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    fn tags(lines: &[ReportLine]) -> Vec<LineTag> {
        lines.iter().map(|l| l.tag).collect()
    }

    #[test]
    fn success_is_separator_then_stdout() {
        let lines = format(&ok("ok\n", ""), None);
        assert_eq!(
            lines,
            vec![separator(), ReportLine::new(LineTag::Success, "ok\n")]
        );
        assert_eq!(lines[0].text.len(), SEPARATOR_WIDTH);
    }

    #[test]
    fn success_with_no_output_is_just_separator() {
        assert_eq!(format(&ok("", ""), None), vec![separator()]);
    }

    #[test]
    fn failure_with_only_stderr() {
        let lines = format(&failed("", "boom"), None);
        assert_eq!(
            lines,
            vec![separator(), ReportLine::new(LineTag::Failure, "boom")]
        );
    }

    #[test]
    fn failure_emits_error_before_trace() {
        let lines = format(&failed("--- FAIL: TestRoute\n", "exit status 1\n"), None);
        assert_eq!(
            tags(&lines),
            vec![LineTag::Separator, LineTag::Failure, LineTag::Failure]
        );
        assert_eq!(lines[1].text, "--- FAIL: TestRoute\n");
        assert_eq!(lines[2].text, "exit status 1\n");
    }

    #[test]
    fn failure_with_only_stdout_omits_empty_trace() {
        let lines = format(&failed("FAIL\n", ""), None);
        assert_eq!(tags(&lines), vec![LineTag::Separator, LineTag::Failure]);
        assert_eq!(lines[1].text, "FAIL\n");
    }

    #[test]
    fn silent_failure_falls_back_to_diagnostic() {
        let lines = format(&failed("", ""), None);
        assert_eq!(tags(&lines), vec![LineTag::Separator, LineTag::Failure]);
        assert_eq!(lines[1].text, "`go test` exited with code 1");
    }

    #[test]
    fn label_only_when_stderr_present() {
        let with = format(&failed("", "vet: unreachable code"), Some("vet"));
        assert_eq!(
            tags(&with),
            vec![LineTag::Separator, LineTag::Label, LineTag::Failure]
        );
        assert_eq!(with[1].text, "vet");

        let without = format(&failed("FAIL\n", ""), Some("test"));
        assert!(!tags(&without).contains(&LineTag::Label));
    }

    #[test]
    fn label_on_success_with_stderr_chatter() {
        let lines = format(&ok("", "go: downloading example.com/mod\n"), Some("vet"));
        assert_eq!(tags(&lines), vec![LineTag::Separator, LineTag::Label]);
    }

    #[test]
    fn format_is_pure() {
        let result = failed("out", "err");
        assert_eq!(format(&result, Some("vet")), format(&result, Some("vet")));
    }

    #[test]
    fn render_plain_report() {
        let lines = format(&failed("", "main.go:3: unreachable code\n"), Some("vet"));
        insta::assert_snapshot!(render(&lines, false).trim_end(), @r"
--------------------------------------------------------------------------------
[vet]
main.go:3: unreachable code
");
    }

    #[test]
    fn render_keeps_inner_newlines() {
        let lines = format(&ok("ok  \tpkg/a\nok  \tpkg/b\n", ""), None);
        let text = render(&lines, false);
        assert!(text.ends_with("ok  \tpkg/a\nok  \tpkg/b\n"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn render_colored_uses_ansi() {
        let lines = format(&failed("", "boom"), None);
        let text = render(&lines, true);
        assert!(text.contains("\u{1b}["), "expected escape codes: {:?}", text);
        assert!(text.contains("boom"));
    }
}
