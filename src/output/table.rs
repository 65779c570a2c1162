use crate::rules::{RuleResult, RuleViolation};

/// Render results as plain text, one block per file, violations sorted by
/// position.
pub fn render(results: &[RuleResult]) -> String {
    let mut output = String::new();

    if results.is_empty() {
        output.push_str("\n  No rule violations found.\n\n");
        return output;
    }

    let total: usize = results.iter().map(|r| r.violations.len()).sum();
    output.push_str(&format!(
        "\n  {} violation(s) in {} file(s):\n\n",
        total,
        results.len()
    ));

    for result in results {
        output.push_str(&format!("  {}\n", result.file_name));

        let mut sorted: Vec<&RuleViolation> = result.violations.iter().collect();
        sorted.sort_by_key(|v| (v.line, v.column));

        for v in sorted {
            let position = format!("{}:{}", v.line, v.column);
            let severity = format!("[{}]", v.severity_label());
            output.push_str(&format!(
                "    {:<9} {:<10} {}:{}  {}\n",
                position, severity, result.engine, v.rule_name, v.message
            ));
            if let Some(url) = &v.url {
                output.push_str(&format!("              see {}\n", url));
            }
        }
        output.push('\n');
    }

    output
}
