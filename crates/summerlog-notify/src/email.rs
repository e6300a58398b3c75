use std::fmt::Write;

use pulldown_cmark::{Options, Parser, html};
use summerlog_summary::SummaryResult;
use time::OffsetDateTime;

const SEVERITIES: [&str; 3] = ["high", "medium", "low"];

const STYLE: &str = r#"<style>
    body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif; line-height: 1.6; color: #333; background-color: #f8f9fa; padding: 20px; }
    h1, h2, h3 { color: #2c3e50; border-bottom: 2px solid #eaecef; padding-bottom: 0.3em; }
    code { background-color: #e8eaed; padding: 2px 6px; border-radius: 6px; font-family: "SFMono-Regular", Consolas, "Liberation Mono", Menlo, Courier, monospace; }
    pre { background-color: #e8eaed; padding: 1em; border-radius: 6px; overflow-x: auto; }
    ul { padding-left: 20px; }
    li { margin-bottom: 0.5em; }
    .meta { color: #6a737d; font-size: 0.9em; }
    .severity-high { background-color: #e74c3c; color: white; padding: 4px 10px; border-radius: 15px; font-size: 0.85em; font-weight: bold; text-transform: uppercase; }
    .severity-medium { background-color: #f39c12; color: white; padding: 4px 10px; border-radius: 15px; font-size: 0.85em; font-weight: bold; text-transform: uppercase; }
    .severity-low { background-color: #3498db; color: white; padding: 4px 10px; border-radius: 15px; font-size: 0.85em; font-weight: bold; text-transform: uppercase; }
</style>"#;

const FOOTER: &str = "Sent by summerlog. Secrets were redacted before summarization.";

/// A rendered email ready for delivery: plain text plus an HTML alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub text: String,
    pub html: String,
}

fn date_stamp(ts: OffsetDateTime) -> String {
    format!("{}-{:02}-{:02}", ts.year(), u8::from(ts.month()), ts.day())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<span class="severity-high">HIGH</span>` becomes `[HIGH]`.
fn plain_severity(markdown: &str) -> String {
    let mut text = markdown.to_string();
    for level in SEVERITIES {
        let open = format!("<span class=\"severity-{}\">", level);
        while let Some(start) = text.find(&open) {
            let inner_start = start + open.len();
            let Some(len) = text[inner_start..].find("</span>") else {
                text.replace_range(start..inner_start, "");
                continue;
            };
            let label = text[inner_start..inner_start + len].trim().to_uppercase();
            text.replace_range(start..inner_start + len + "</span>".len(), &format!("[{}]", label));
        }
    }
    text
}

/// Markdown to an HTML fragment; inline severity spans pass through.
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Summary email. The subject carries the run's start date.
pub fn compose_summary_email(
    summary: &SummaryResult,
    started_at: OffsetDateTime,
    failed: &[String],
) -> EmailMessage {
    let subject = format!("Container Log Summary - {}", date_stamp(started_at));

    let mut meta = vec![
        format!("Container log summary for {}.", summary.window.describe()),
        format!(
            "Containers: {} succeeded, {} failed",
            summary.containers.len(),
            failed.len()
        ),
    ];
    if !summary.containers.is_empty() {
        meta.push(format!("Summarized: {}", summary.containers.join(", ")));
    }
    if !failed.is_empty() {
        meta.push(format!("Logs unavailable: {}", failed.join(", ")));
    }

    let markdown = summary.text.trim();

    let mut text = meta.join("\n");
    let _ = write!(text, "\n\n{}\n\n-- \n{}\n", plain_severity(markdown), FOOTER);

    let mut html = String::from("<html><head><meta charset=\"utf-8\">");
    html.push_str(STYLE);
    html.push_str("</head><body>\n");
    for line in &meta {
        let _ = writeln!(html, "<p class=\"meta\">{}</p>", escape_html(line));
    }
    html.push_str(&render_markdown(markdown));
    let _ = writeln!(html, "<hr>\n<p class=\"meta\">{}</p>", FOOTER);
    html.push_str("</body></html>\n");

    EmailMessage { subject, text, html }
}

#[cfg(test)]
mod tests {
    use super::*;
    use summerlog_core::CaptureWindow;
    use time::macros::datetime;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn result(text: &str, containers: &[&str], started: OffsetDateTime) -> SummaryResult {
        SummaryResult {
            text: text.to_string(),
            containers: names(containers),
            window: CaptureWindow::since_last_run(None, 24, started),
        }
    }

    const SUMMARY: &str = "### 1. Overall Health Summary\nMostly healthy.\n\n\
                           ### 2. Key Events & Issues\n\
                           - `db`: <span class=\"severity-high\">HIGH</span> connection pool exhausted\n\
                           - `web`: <span class=\"severity-low\">LOW</span> slow request\n";

    #[test]
    fn test_subject_uses_run_start_date() {
        let started = datetime!(2026-03-02 23:59:59 UTC);
        let email = compose_summary_email(&result("ok", &["web"], started), started, &[]);
        assert_eq!(email.subject, "Container Log Summary - 2026-03-02");
    }

    #[test]
    fn test_text_reports_partial_collection() {
        let started = datetime!(2026-03-02 08:00 UTC);
        let email = compose_summary_email(
            &result("All good.", &["web", "db"], started),
            started,
            &names(&["worker"]),
        );

        assert!(email.text.contains("2 succeeded, 1 failed"));
        assert!(email.text.contains("Logs unavailable: worker"));
        assert!(email.text.contains("All good."));
        assert!(email.html.contains("Logs unavailable: worker"));
    }

    #[test]
    fn test_html_part_renders_markdown_and_severity_badges() {
        let started = datetime!(2026-03-02 08:00 UTC);
        let email = compose_summary_email(&result(SUMMARY, &["web", "db"], started), started, &[]);

        assert!(email.html.starts_with("<html><head>"));
        assert!(email.html.contains(".severity-high { background-color: #e74c3c;"));
        assert!(email.html.contains("<h3>1. Overall Health Summary</h3>"));
        assert!(email.html.contains("<li><code>db</code>: <span class=\"severity-high\">HIGH</span>"));
        assert!(email.html.contains("<span class=\"severity-low\">LOW</span>"));
    }

    #[test]
    fn test_text_part_shows_severity_as_tags() {
        let started = datetime!(2026-03-02 08:00 UTC);
        let email = compose_summary_email(&result(SUMMARY, &["db"], started), started, &[]);

        assert!(email.text.contains("- `db`: [HIGH] connection pool exhausted"));
        assert!(email.text.contains("[LOW] slow request"));
        assert!(!email.text.contains("<span"));
    }

    #[test]
    fn test_meta_lines_are_escaped() {
        let started = datetime!(2026-03-02 08:00 UTC);
        let email = compose_summary_email(&result("ok", &["a<b>"], started), started, &[]);
        assert!(email.html.contains("Summarized: a&lt;b&gt;"));
    }

    #[test]
    fn test_unclosed_span_is_dropped_from_text() {
        assert_eq!(plain_severity("<span class=\"severity-medium\">MEDIUM"), "MEDIUM");
    }
}
