//! Language-aware code rules for the `regex` engine.

use once_cell::sync::Lazy;

use crate::engine::PatternRule;

pub const ENGINE_NAME: &str = "regex";

pub const TARGET_PATTERNS: &[&str] = &[
    "**/*.js",
    "**/*.jsx",
    "**/*.mjs",
    "**/*.cjs",
    "**/*.ts",
    "**/*.tsx",
    "**/*.py",
    "**/*.sh",
    "**/*.bash",
    "**/*.cls",
    "**/*.trigger",
    "!**/node_modules/**",
    "!**/.git/**",
    "!**/dist/**",
    "!**/vendor/**",
];

const JS_TS: &[&str] = &["javascript", "typescript"];

pub static RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule::new("no-eval", r"\beval\s*\(", "eval() executes arbitrary code")
            .description("Disallow eval() and similar dynamic code execution")
            .categories(&["Security"])
            .rulesets(&["Recommended"])
            .languages(JS_TS)
            .severity(1),
        PatternRule::new(
            "no-implied-eval",
            r#"\bset(?:Timeout|Interval)\s*\(\s*['"`]"#,
            "String argument to setTimeout/setInterval is evaluated as code",
        )
        .categories(&["Security"])
        .rulesets(&["Recommended"])
        .languages(JS_TS)
        .severity(2),
        PatternRule::new("no-debugger", r"^\s*debugger\s*;?\s*$", "Remove debugger statement")
            .categories(&["Best Practices"])
            .rulesets(&["Recommended"])
            .languages(JS_TS)
            .severity(3),
        PatternRule::new(
            "no-console",
            r"\bconsole\.(?:log|debug|info|trace)\s*\(",
            "Unexpected console output",
        )
        .categories(&["Best Practices"])
        .rulesets(&["Strict"])
        .languages(JS_TS)
        .severity(4)
        .disabled_by_default(),
        PatternRule::new("py-exec", r"\b(?:exec|eval)\s*\(", "Dynamic code execution")
            .categories(&["Security"])
            .rulesets(&["Recommended"])
            .languages(&["python"])
            .severity(1),
        PatternRule::new(
            "py-shell-true",
            r"\bsubprocess\.\w+\(.*shell\s*=\s*True",
            "subprocess call with shell=True is open to command injection",
        )
        .categories(&["Security"])
        .rulesets(&["Recommended"])
        .languages(&["python"])
        .severity(2),
        PatternRule::new("py-bare-except", r"^\s*except\s*:", "Bare except swallows every error")
            .categories(&["Error Prone"])
            .rulesets(&["Recommended"])
            .languages(&["python"])
            .severity(3),
        PatternRule::new(
            "sh-curl-pipe",
            r"\b(?:curl|wget)\b[^|]*\|\s*(?:sudo\s+)?(?:ba|z)?sh\b",
            "Piping a download into a shell runs unverified code",
        )
        .categories(&["Security"])
        .rulesets(&["Recommended"])
        .languages(&["shell"])
        .severity(1),
        PatternRule::new(
            "sh-runtime-install",
            r"\b(?:pip3?\s+install|npm\s+(?:install|i)\b|yarn\s+add|pnpm\s+add)",
            "Package installed at runtime",
        )
        .categories(&["Security"])
        .rulesets(&["Strict"])
        .languages(&["shell"])
        .severity(3)
        .disabled_by_default(),
        PatternRule::new(
            "apex-soql-in-loop",
            r"\bfor\s*\([^)]*:\s*\[\s*SELECT\b",
            "SOQL query inside a loop header",
        )
        .categories(&["Performance"])
        .rulesets(&["Recommended"])
        .languages(&["apex"])
        .severity(2),
        PatternRule::new("apex-debug", r"\bSystem\.debug\s*\(", "Remove System.debug call")
            .categories(&["Best Practices"])
            .rulesets(&["Strict"])
            .languages(&["apex"])
            .severity(4)
            .disabled_by_default(),
        PatternRule::new("todo-comment", r"\b(?:TODO|FIXME|XXX)\b", "Unresolved work marker")
            .categories(&["Documentation"])
            .rulesets(&["Strict"])
            .severity(5)
            .disabled_by_default(),
        PatternRule::new("trailing-whitespace", r"[ \t]+$", "Trailing whitespace")
            .categories(&["Code Style"])
            .rulesets(&["Strict"])
            .severity(5)
            .disabled_by_default(),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn rule(name: &str) -> Regex {
        let def = RULES.iter().find(|r| r.name == name).unwrap();
        Regex::new(&def.pattern).unwrap()
    }

    #[test]
    fn all_patterns_compile() {
        for def in RULES.iter() {
            assert!(Regex::new(&def.pattern).is_ok(), "{} does not compile", def.name);
        }
    }

    #[test]
    fn curl_pipe_detection() {
        let re = rule("sh-curl-pipe");
        assert!(re.is_match("curl -fsSL https://get.example.sh | bash"));
        assert!(re.is_match("wget -qO- https://x.io/i | sudo sh"));
        assert!(!re.is_match("curl -o out.tar.gz https://x.io/pkg"));
    }

    #[test]
    fn implied_eval_detection() {
        let re = rule("no-implied-eval");
        assert!(re.is_match("setTimeout(\"alert(1)\", 10)"));
        assert!(!re.is_match("setTimeout(() => go(), 10)"));
    }

    #[test]
    fn soql_loop_detection() {
        let re = rule("apex-soql-in-loop");
        assert!(re.is_match("for (Account a : [SELECT Id FROM Account]) {"));
        assert!(!re.is_match("List<Account> accts = [SELECT Id FROM Account];"));
    }
}
