use super::escape_markup;
use crate::rules::RuleResult;

/// Render results as a flat XML document.
pub fn render(results: &[RuleResult]) -> String {
    let total: usize = results.iter().map(|r| r.violations.len()).sum();
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<results total=\"{}\">\n", total));

    for result in results {
        xml.push_str(&format!(
            "  <result file=\"{}\" engine=\"{}\">\n",
            escape_markup(&result.file_name),
            escape_markup(&result.engine)
        ));
        for v in &result.violations {
            let mut attrs = format!(
                "rule=\"{}\" severity=\"{}\" line=\"{}\" column=\"{}\"",
                escape_markup(&v.rule_name),
                escape_markup(&v.severity_label()),
                v.line,
                v.column
            );
            if let Some(end_line) = v.end_line {
                attrs.push_str(&format!(" endLine=\"{}\"", end_line));
            }
            if let Some(end_column) = v.end_column {
                attrs.push_str(&format!(" endColumn=\"{}\"", end_column));
            }
            attrs.push_str(&format!(" category=\"{}\"", escape_markup(&v.category)));
            if let Some(url) = &v.url {
                attrs.push_str(&format!(" url=\"{}\"", escape_markup(url)));
            }
            xml.push_str(&format!(
                "    <violation {}>{}</violation>\n",
                attrs,
                escape_markup(&v.message)
            ));
        }
        xml.push_str("  </result>\n");
    }

    xml.push_str("</results>\n");
    xml
}
