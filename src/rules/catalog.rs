use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::filter::{matches_all, RuleFilter};
use super::Rule;
use crate::engine::EngineRegistry;
use crate::error::{Result, ScanError};

/// `[rules]` section of the config: flips `default_enabled` for the named
/// rules (`engine:rule`) while the catalog is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleToggles {
    #[serde(default)]
    pub enable: Vec<String>,
    #[serde(default)]
    pub disable: Vec<String>,
}

impl RuleToggles {
    /// Apply toggles in place. `disable` wins over `enable` for the same rule.
    pub fn apply(&self, rules: &mut [Rule]) {
        let mut used = HashSet::new();
        for rule in rules.iter_mut() {
            let key = rule.qualified_name();
            if self.enable.contains(&key) {
                rule.default_enabled = true;
                used.insert(key.clone());
            }
            if self.disable.contains(&key) {
                rule.default_enabled = false;
                used.insert(key);
            }
        }
        for key in self.enable.iter().chain(&self.disable) {
            if !used.contains(key) {
                warn!(rule = %key, "rule toggle does not name a known rule");
            }
        }
    }
}

/// Rules belonging to one engine, in catalog order.
#[derive(Debug, Clone)]
pub struct RuleGroup<'a> {
    pub engine: &'a str,
    pub rules: Vec<&'a Rule>,
}

/// Read-only query layer over every known rule.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: Vec<Rule>,
}

impl RuleCatalog {
    /// Build a catalog from rules in order. Later duplicates of an
    /// `(engine, name)` pair are dropped.
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(rules.len());
        for rule in rules {
            if seen.insert((rule.engine.clone(), rule.name.clone())) {
                unique.push(rule);
            } else {
                warn!(rule = %rule.qualified_name(), "duplicate rule ignored");
            }
        }
        Self { rules: unique }
    }

    /// Collect the rules of every registered engine and apply config toggles.
    pub fn init(registry: &EngineRegistry, toggles: &RuleToggles) -> Self {
        let mut rules = Vec::new();
        for engine in registry.engines() {
            let engine_rules = engine.rules();
            debug!(engine = %engine.name(), count = engine_rules.len(), "loaded engine rules");
            rules.extend(engine_rules);
        }
        toggles.apply(&mut rules);
        Self::new(rules)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules matching `filters`, restricted to default-enabled rules.
    pub fn get_rules_matching_criteria(&self, filters: &[RuleFilter]) -> Vec<&Rule> {
        self.query(filters, true)
    }

    /// Rules matching exactly `filters`, enabled or not. No filters means
    /// every rule.
    pub fn get_rules_matching_only_explicit_criteria(&self, filters: &[RuleFilter]) -> Vec<&Rule> {
        self.query(filters, false)
    }

    /// Matching rules bucketed per engine, engines in order of first
    /// appearance in the catalog.
    pub fn get_rule_groups_matching_filters(
        &self,
        filters: &[RuleFilter],
        use_implicit_default: bool,
    ) -> Vec<RuleGroup<'_>> {
        let mut groups: Vec<RuleGroup<'_>> = Vec::new();
        for rule in self.query(filters, use_implicit_default) {
            match groups.iter_mut().find(|g| g.engine == rule.engine) {
                Some(group) => group.rules.push(rule),
                None => groups.push(RuleGroup {
                    engine: &rule.engine,
                    rules: vec![rule],
                }),
            }
        }
        groups
    }

    /// Exact lookup by engine and rule name.
    pub fn get_rule(&self, engine: &str, name: &str) -> Result<&Rule> {
        self.rules
            .iter()
            .find(|r| r.engine == engine && r.name == name)
            .ok_or_else(|| ScanError::RuleNotFound {
                engine: engine.into(),
                rule: name.into(),
            })
    }

    fn query(&self, filters: &[RuleFilter], use_implicit_default: bool) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|rule| !use_implicit_default || rule.default_enabled)
            .filter(|rule| matches_all(filters, rule))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_rule;
    use pretty_assertions::assert_eq;

    fn catalog() -> RuleCatalog {
        RuleCatalog::new(vec![
            Rule {
                categories: vec!["Best Practices".into()],
                languages: vec!["apex".into()],
                rulesets: vec!["Quickstart".into()],
                ..test_rule("pmd", "AvoidGlobalModifier")
            },
            Rule {
                categories: vec!["Best Practices".into(), "Design".into()],
                languages: vec!["apex".into()],
                ..test_rule("pmd", "ApexUnitTestClassShouldHaveAsserts")
            },
            Rule {
                categories: vec!["Security".into()],
                languages: vec!["apex".into()],
                rulesets: vec!["Quickstart".into()],
                ..test_rule("pmd", "ApexCRUDViolation")
            },
            Rule {
                categories: vec!["Best Practices".into()],
                languages: vec!["javascript".into()],
                default_enabled: false,
                ..test_rule("eslint", "no-console")
            },
            Rule {
                categories: vec!["Possible Errors".into()],
                languages: vec!["javascript".into()],
                ..test_rule("eslint", "no-debugger")
            },
        ])
    }

    fn names(rules: &[&Rule]) -> Vec<String> {
        rules.iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn no_filters_returns_default_enabled_subset() {
        let catalog = catalog();
        let rules = catalog.get_rules_matching_criteria(&[]);
        assert_eq!(rules.len(), 4);
        assert!(rules.iter().all(|r| r.default_enabled));
    }

    #[test]
    fn explicit_query_without_filters_returns_everything() {
        let catalog = catalog();
        assert_eq!(catalog.get_rules_matching_only_explicit_criteria(&[]).len(), 5);
    }

    #[test]
    fn category_filter_selects_tagged_rules() {
        let catalog = catalog();
        let rules = catalog.get_rules_matching_criteria(&[
            RuleFilter::category(["Best Practices"]),
            RuleFilter::engine(["pmd"]),
        ]);
        assert_eq!(rules.len(), 2);
        assert!(rules
            .iter()
            .all(|r| r.categories.contains(&"Best Practices".to_string())));
    }

    #[test]
    fn explicit_filter_does_not_reenable_disabled_rule() {
        let catalog = catalog();
        let filters = [RuleFilter::engine(["eslint"]), RuleFilter::category(["Best Practices"])];
        assert!(catalog.get_rules_matching_criteria(&filters).is_empty());
        assert_eq!(
            names(&catalog.get_rules_matching_only_explicit_criteria(&filters)),
            vec!["no-console"]
        );
    }

    #[test]
    fn unsatisfiable_filters_yield_empty() {
        let catalog = catalog();
        let rules = catalog.get_rules_matching_criteria(&[
            RuleFilter::engine(["eslint"]),
            RuleFilter::language(["apex"]),
        ]);
        assert!(rules.is_empty());
    }

    #[test]
    fn groups_follow_catalog_order() {
        let catalog = catalog();
        let groups = catalog.get_rule_groups_matching_filters(&[], true);
        let engines: Vec<&str> = groups.iter().map(|g| g.engine).collect();
        assert_eq!(engines, vec!["pmd", "eslint"]);
        assert_eq!(groups[0].rules.len(), 3);
        assert_eq!(names(&groups[1].rules), vec!["no-debugger"]);
    }

    #[test]
    fn groups_skip_engines_without_matches() {
        let catalog = catalog();
        let groups = catalog.get_rule_groups_matching_filters(&[RuleFilter::ruleset(["quickstart"])], true);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].engine, "pmd");
    }

    #[test]
    fn lookup_by_engine_and_name() {
        let catalog = catalog();
        assert_eq!(catalog.get_rule("eslint", "no-console").unwrap().engine, "eslint");
        let err = catalog.get_rule("eslint", "AvoidGlobalModifier").unwrap_err();
        assert!(matches!(err, ScanError::RuleNotFound { .. }));
    }

    #[test]
    fn duplicates_are_dropped() {
        let catalog = RuleCatalog::new(vec![
            test_rule("regex", "no-eval"),
            Rule {
                description: "second".into(),
                ..test_rule("regex", "no-eval")
            },
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.rules()[0].description, "no-eval description");
    }

    #[test]
    fn toggles_flip_default_enabled() {
        let mut rules = vec![
            Rule {
                default_enabled: false,
                ..test_rule("regex", "no-console")
            },
            test_rule("regex", "no-eval"),
        ];
        let toggles = RuleToggles {
            enable: vec!["regex:no-console".into()],
            disable: vec!["regex:no-eval".into(), "regex:unknown".into()],
        };
        toggles.apply(&mut rules);
        assert!(rules[0].default_enabled);
        assert!(!rules[1].default_enabled);
    }
}
