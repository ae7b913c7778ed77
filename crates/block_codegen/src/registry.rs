// Generator Registry - Maps block types to generation rules
//
// Rules are looked up by block type name. Registering a rule for a type that
// already has one replaces it; categories are registered in a fixed order so
// the last registration wins deterministically.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{BlockContext, Fragment, GenerateResult};

// ─────────────────────────────────────────────────────────────────────────────
// Block Generator Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A generation rule for one block type
pub trait BlockGenerator: Send + Sync {
    /// Produce the fragment for the block in `ctx`
    fn generate(&self, ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment>;
}

/// Function-based generation rule
pub struct FnBlockGenerator<F>
where
    F: Fn(&mut BlockContext<'_, '_>) -> GenerateResult<Fragment> + Send + Sync,
{
    func: F,
}

impl<F> FnBlockGenerator<F>
where
    F: Fn(&mut BlockContext<'_, '_>) -> GenerateResult<Fragment> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> BlockGenerator for FnBlockGenerator<F>
where
    F: Fn(&mut BlockContext<'_, '_>) -> GenerateResult<Fragment> + Send + Sync,
{
    fn generate(&self, ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment> {
        (self.func)(ctx)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Generator Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Registry of generation rules keyed by block type
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    rules: HashMap<String, Arc<dyn BlockGenerator>>,
}

impl GeneratorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, replacing any existing rule for the type
    pub fn register(&mut self, block_type: &str, rule: Arc<dyn BlockGenerator>) {
        if self.rules.insert(block_type.to_string(), rule).is_some() {
            tracing::debug!(block_type = %block_type, "Replaced generation rule");
        }
    }

    /// Register a rule from a function
    pub fn register_fn<F>(&mut self, block_type: &str, func: F)
    where
        F: Fn(&mut BlockContext<'_, '_>) -> GenerateResult<Fragment> + Send + Sync + 'static,
    {
        self.register(block_type, Arc::new(FnBlockGenerator::new(func)));
    }

    /// Get the rule for a block type
    pub fn get(&self, block_type: &str) -> Option<&Arc<dyn BlockGenerator>> {
        self.rules.get(block_type)
    }

    /// Check if a rule exists for a block type
    pub fn contains(&self, block_type: &str) -> bool {
        self.rules.contains_key(block_type)
    }

    /// All block types with a rule
    pub fn block_types(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(|s| s.as_str())
    }

    /// Get rule count
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.block_types().collect();
        types.sort_unstable();
        f.debug_struct("GeneratorRegistry").field("rules", &types).finish()
    }
}
