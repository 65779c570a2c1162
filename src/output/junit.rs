use chrono::{SecondsFormat, Utc};

use super::escape_markup;
use crate::rules::RuleResult;

/// Render results as a JUnit report: one test case per file, one failure per
/// violation.
pub fn render(results: &[RuleResult]) -> String {
    let failures: usize = results.iter().map(|r| r.violations.len()).sum();
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<testsuites name=\"codeanalyzer\" tests=\"{tests}\" failures=\"{failures}\">\n",
        tests = results.len(),
    ));
    xml.push_str(&format!(
        "  <testsuite name=\"codeanalyzer\" tests=\"{tests}\" failures=\"{failures}\" errors=\"0\" timestamp=\"{timestamp}\">\n",
        tests = results.len(),
    ));

    for result in results {
        xml.push_str(&format!(
            "    <testcase name=\"{}\" classname=\"{}\">\n",
            escape_markup(&result.file_name),
            escape_markup(&result.engine)
        ));
        for v in &result.violations {
            let body = format!(
                "{}: {}\nCategory: {}\nFile: {}\nLine: {}\nColumn: {}\n{}",
                v.severity_label(),
                v.message,
                v.category,
                result.file_name,
                v.line,
                v.column,
                v.url.as_deref().unwrap_or("")
            );
            xml.push_str(&format!(
                "      <failure message=\"{}:{} {}\" type=\"{}\">\n{}\n      </failure>\n",
                escape_markup(&result.file_name),
                v.line,
                escape_markup(&v.message),
                escape_markup(&v.rule_name),
                escape_markup(body.trim_end())
            ));
        }
        xml.push_str("    </testcase>\n");
    }

    xml.push_str("  </testsuite>\n</testsuites>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::sample;

    #[test]
    fn one_testcase_per_file() {
        let xml = render(&sample());
        assert!(xml.contains("tests=\"2\" failures=\"3\""));
        assert_eq!(xml.matches("<testcase ").count(), 2);
        assert_eq!(xml.matches("<failure ").count(), 3);
        assert!(xml.contains("type=\"no-eval\""));
    }

    #[test]
    fn failure_body_carries_location() {
        let xml = render(&sample());
        assert!(xml.contains("File: config/settings.yaml\nLine: 7\nColumn: 5"));
    }
}
