use crate::rules::RuleResult;

const HEADER: &[&str] = &[
    "Problem",
    "File",
    "Severity",
    "Line",
    "Column",
    "Rule",
    "Description",
    "URL",
    "Category",
    "Engine",
];

/// Render one quoted CSV row per violation, numbered from 1.
pub fn render(results: &[RuleResult]) -> String {
    let mut rows = vec![row(HEADER.iter().map(|h| h.to_string()))];
    let mut problem = 0;

    for result in results {
        for v in &result.violations {
            problem += 1;
            rows.push(row([
                problem.to_string(),
                result.file_name.clone(),
                v.severity_label(),
                v.line.to_string(),
                v.column.to_string(),
                v.rule_name.clone(),
                v.message.clone(),
                v.url.clone().unwrap_or_default(),
                v.category.clone(),
                result.engine.clone(),
            ]));
        }
    }

    let mut csv = rows.join("\n");
    csv.push('\n');
    csv
}

fn row(fields: impl IntoIterator<Item = String>) -> String {
    fields
        .into_iter()
        .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}
