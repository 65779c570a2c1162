use crate::error::Result;
use crate::rules::RuleResult;

/// Render rule results as a pretty-printed JSON array.
pub fn render(results: &[RuleResult]) -> Result<String> {
    let json = serde_json::to_string_pretty(results)?;
    Ok(json)
}
