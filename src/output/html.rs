use std::collections::BTreeMap;

use chrono::Utc;

use super::{effective_severity, escape_markup};
use crate::rules::{RuleResult, Severity};

/// Render results as a standalone HTML page.
pub fn render(results: &[RuleResult]) -> String {
    let mut rows: Vec<(&RuleResult, &crate::rules::RuleViolation)> = results
        .iter()
        .flat_map(|r| r.violations.iter().map(move |v| (r, v)))
        .collect();
    rows.sort_by(|(ra, a), (rb, b)| {
        effective_severity(b)
            .cmp(&effective_severity(a))
            .then_with(|| ra.file_name.cmp(&rb.file_name))
            .then_with(|| a.line.cmp(&b.line))
    });

    let mut per_severity: BTreeMap<Severity, usize> = BTreeMap::new();
    for (_, v) in &rows {
        *per_severity.entry(effective_severity(v)).or_default() += 1;
    }
    let tiles: String = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ]
    .iter()
    .map(|sev| {
        format!(
            "<div class=\"tile {sev}\"><b>{}</b><span>{sev}</span></div>",
            per_severity.get(sev).copied().unwrap_or_default()
        )
    })
    .collect();

    let body = if rows.is_empty() {
        "<p class=\"none\">No rule violations found.</p>".to_string()
    } else {
        let tr: String = rows
            .iter()
            .map(|(result, v)| {
                let rule = match &v.url {
                    Some(url) => format!(
                        "<a href=\"{}\">{}</a>",
                        escape_markup(url),
                        escape_markup(&v.rule_name)
                    ),
                    None => escape_markup(&v.rule_name),
                };
                format!(
                    "<tr class=\"{sev}\"><td>{label}</td><td>{engine}</td><td>{rule}</td><td><code>{file}:{line}:{column}</code></td><td>{message}</td><td>{category}</td></tr>\n",
                    sev = effective_severity(v),
                    label = escape_markup(&v.severity_label()),
                    engine = escape_markup(&result.engine),
                    file = escape_markup(&result.file_name),
                    line = v.line,
                    column = v.column,
                    message = escape_markup(&v.message),
                    category = escape_markup(&v.category),
                )
            })
            .collect();
        format!(
            "<table>\n<thead><tr><th>Severity</th><th>Engine</th><th>Rule</th><th>Location</th><th>Message</th><th>Category</th></tr></thead>\n<tbody>\n{tr}</tbody>\n</table>"
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Code Analyzer Results</title>
<style>
  body {{ font-family: system-ui, sans-serif; margin: 2rem; color: #1f2328; }}
  .tiles {{ display: flex; gap: 0.75rem; margin: 1rem 0; }}
  .tile {{ border: 1px solid #d0d7de; border-radius: 6px; padding: 0.5rem 1rem; text-align: center; }}
  .tile b {{ display: block; font-size: 1.5rem; }}
  table {{ border-collapse: collapse; width: 100%; }}
  th, td {{ border-bottom: 1px solid #d0d7de; padding: 0.4rem 0.6rem; text-align: left; vertical-align: top; }}
  tr.critical td:first-child, .tile.critical b {{ color: #cf222e; }}
  tr.high td:first-child, .tile.high b {{ color: #bc4c00; }}
  tr.medium td:first-child, .tile.medium b {{ color: #9a6700; }}
  .none {{ color: #1a7f37; }}
</style>
</head>
<body>
<h1>Code Analyzer Results</h1>
<p>{violations} violation(s) in {files} file(s). Generated {generated}.</p>
<div class="tiles">{tiles}</div>
{body}
<footer><small>codeanalyzer {version}</small></footer>
</body>
</html>
"#,
        violations = rows.len(),
        files = results.len(),
        generated = Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        version = env!("CARGO_PKG_VERSION"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::sample;

    #[test]
    fn renders_rows_and_counts() {
        let html = render(&sample());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("3 violation(s) in 2 file(s)"));
        assert_eq!(html.matches("<tr class=").count(), 3);
        assert!(html.contains("<div class=\"tile high\"><b>3</b>"));
    }

    #[test]
    fn escapes_and_links() {
        let mut results = sample();
        results[0].violations[0].url = Some("https://example.com/no-eval?a=1&b=2".into());
        let html = render(&results);
        assert!(html.contains("&lt;arbitrary&gt;"));
        assert!(html.contains("href=\"https://example.com/no-eval?a=1&amp;b=2\""));
    }

    #[test]
    fn empty_page() {
        assert!(render(&[]).contains("No rule violations found."));
    }
}
