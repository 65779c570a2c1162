//! Credential-leak rules for the `secrets` engine. These apply to any text
//! file the engine accepts.

use once_cell::sync::Lazy;

use crate::engine::PatternRule;

pub const ENGINE_NAME: &str = "secrets";

pub const TARGET_PATTERNS: &[&str] = &[
    "!**/.git/**",
    "!**/node_modules/**",
    "!**/*.png",
    "!**/*.jpg",
    "!**/*.jpeg",
    "!**/*.gif",
    "!**/*.ico",
    "!**/*.pdf",
    "!**/*.zip",
    "!**/*.gz",
    "!**/*.jar",
    "!**/*.woff",
    "!**/*.woff2",
    "!**/*.lock",
];

pub static RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule::new(
            "aws-access-key",
            r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b",
            "AWS access key ID committed to source",
        )
        .categories(&["Security"])
        .rulesets(&["Secrets"])
        .severity(1),
        PatternRule::new(
            "private-key",
            r"-----BEGIN (?:RSA |EC |DSA |OPENSSH |PGP )?PRIVATE KEY",
            "Private key material committed to source",
        )
        .categories(&["Security"])
        .rulesets(&["Secrets"])
        .severity(1),
        PatternRule::new(
            "github-token",
            r"\bgh[pousr]_[A-Za-z0-9]{36,}\b",
            "GitHub token committed to source",
        )
        .categories(&["Security"])
        .rulesets(&["Secrets"])
        .severity(1),
        PatternRule::new(
            "slack-token",
            r"\bxox[abposr]-[A-Za-z0-9-]{10,}",
            "Slack token committed to source",
        )
        .categories(&["Security"])
        .rulesets(&["Secrets"])
        .severity(2),
        PatternRule::new(
            "generic-secret",
            r#"(?i)\b(?:api[_-]?key|secret|token|passw(?:or)?d)\b\s*[:=]\s*['"][^'"\s]{8,}['"]"#,
            "Hard-coded credential assigned to a sensitive name",
        )
        .categories(&["Security"])
        .rulesets(&["Secrets"])
        .severity(2),
        PatternRule::new(
            "sensitive-env-echo",
            r"(?i)\becho\b.*\$\{?(?:AWS_|SECRET|TOKEN|PASSWORD|API_KEY|PRIVATE_KEY)",
            "Sensitive environment variable written to output",
        )
        .categories(&["Security"])
        .rulesets(&["Secrets"])
        .languages(&["shell"])
        .severity(3)
        .disabled_by_default(),
    ]
});
