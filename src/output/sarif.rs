use std::collections::BTreeMap;

use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::effective_severity;
use crate::error::Result;
use crate::rules::{RuleResult, RuleViolation, Severity};

const SCHEMA: &str =
    "https://docs.oasis-open.org/sarif/sarif/v2.1.0/errata01/os/schemas/sarif-schema-2.1.0.json";

/// Render results as a SARIF 2.1.0 log with one run per engine, in the order
/// engines first appear.
pub fn render(results: &[RuleResult]) -> Result<String> {
    let mut engines: Vec<&str> = Vec::new();
    for result in results {
        if !engines.contains(&result.engine.as_str()) {
            engines.push(&result.engine);
        }
    }

    let runs: Vec<Value> = engines
        .into_iter()
        .map(|engine| {
            let engine_results: Vec<&RuleResult> =
                results.iter().filter(|r| r.engine == engine).collect();
            engine_run(engine, &engine_results)
        })
        .collect();

    let sarif = json!({
        "$schema": SCHEMA,
        "version": "2.1.0",
        "runs": runs,
    });

    let output = serde_json::to_string_pretty(&sarif)?;
    Ok(output)
}

fn engine_run(engine: &str, results: &[&RuleResult]) -> Value {
    // Rule index order is the sorted rule name order.
    let mut rules: BTreeMap<&str, &RuleViolation> = BTreeMap::new();
    for v in results.iter().flat_map(|r| &r.violations) {
        rules.entry(v.rule_name.as_str()).or_insert(v);
    }
    let rule_index: BTreeMap<&str, usize> = rules
        .keys()
        .enumerate()
        .map(|(idx, name)| (*name, idx))
        .collect();

    let rule_descriptors: Vec<Value> = rules
        .values()
        .map(|v| {
            let mut rule = json!({
                "id": v.rule_name,
                "name": v.rule_name,
                "shortDescription": { "text": v.message },
                "defaultConfiguration": {
                    "level": sarif_level(effective_severity(v)),
                },
                "properties": {
                    "category": v.category,
                    "severity": v.severity,
                },
            });
            if let Some(url) = &v.url {
                rule["helpUri"] = json!(url);
            }
            rule
        })
        .collect();

    let sarif_results: Vec<Value> = results
        .iter()
        .flat_map(|r| r.violations.iter().map(move |v| (*r, v)))
        .map(|(result, v)| {
            let mut region = json!({
                "startLine": v.line,
                "startColumn": v.column,
            });
            if let Some(end_line) = v.end_line {
                region["endLine"] = json!(end_line);
            }
            if let Some(end_column) = v.end_column {
                region["endColumn"] = json!(end_column);
            }

            json!({
                "ruleId": v.rule_name,
                "ruleIndex": rule_index.get(v.rule_name.as_str()).copied().unwrap_or_default(),
                "level": sarif_level(effective_severity(v)),
                "message": { "text": v.message },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": { "uri": result.file_name },
                        "region": region,
                    },
                }],
                "partialFingerprints": {
                    "primaryLocationLineHash": fingerprint(engine, &result.file_name, v),
                },
            })
        })
        .collect();

    json!({
        "tool": {
            "driver": {
                "name": engine,
                "version": env!("CARGO_PKG_VERSION"),
                "semanticVersion": env!("CARGO_PKG_VERSION"),
                "rules": rule_descriptors,
            },
        },
        "results": sarif_results,
        "automationDetails": {
            "id": format!("codeanalyzer/{}/", engine),
            "guid": Uuid::new_v4().to_string(),
        },
    })
}

/// Stable identity for a violation across runs.
fn fingerprint(engine: &str, file: &str, v: &RuleViolation) -> String {
    let mut hasher = Sha256::new();
    hasher.update(engine.as_bytes());
    hasher.update([0]);
    hasher.update(file.as_bytes());
    hasher.update([0]);
    hasher.update(v.rule_name.as_bytes());
    hasher.update([0]);
    hasher.update(v.line.to_string().as_bytes());
    hasher.update([0]);
    hasher.update(v.message.as_bytes());
    hex::encode(hasher.finalize())
}

fn sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low | Severity::Info => "note",
    }
}
