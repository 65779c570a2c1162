mod code;
mod secrets;

use super::{Engine, PatternEngine};

/// Returns every built-in engine, uninitialized, in registration order.
pub fn all_engines() -> Vec<Box<dyn Engine>> {
    vec![
        Box::new(PatternEngine::new(
            code::ENGINE_NAME,
            code::RULES.as_slice(),
            code::TARGET_PATTERNS,
        )),
        Box::new(PatternEngine::new(
            secrets::ENGINE_NAME,
            secrets::RULES.as_slice(),
            secrets::TARGET_PATTERNS,
        )),
    ]
}
