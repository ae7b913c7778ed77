// Generator Context - Block shapes, rules and output settings in one place
//
// A context is built once (usually with `GeneratorContext::builtin`) and then
// shared by every generation pass. It holds no per-pass state.

use std::sync::Arc;

use block_types::{BlockDef, BlockDocument, BlockRegistry};
use serde::{Deserialize, Serialize};

use crate::{BlockContext, BlockGenerator, Fragment, GenerateResult, GeneratedCode, GeneratorRegistry, generate};

/// Default indentation for nested bodies
pub const DEFAULT_INDENT: &str = "    ";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Output settings for generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// One level of indentation
    pub indent: String,
    /// Fixed seed for generated identifiers (None = random per pass)
    pub seed: Option<u64>,
    /// Statement placed at the top of every loop and handler body;
    /// `%1` is replaced with the quoted block id
    pub loop_trap: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT.to_string(),
            seed: None,
            loop_trap: None,
        }
    }
}

impl GeneratorConfig {
    /// Indent with `width` spaces
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent = " ".repeat(width);
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_loop_trap(mut self, loop_trap: Option<String>) -> Self {
        self.loop_trap = loop_trap;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Generator Context
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a generation pass needs besides the document
#[derive(Debug, Clone, Default)]
pub struct GeneratorContext {
    blocks: BlockRegistry,
    generators: GeneratorRegistry,
    config: GeneratorConfig,
}

impl GeneratorContext {
    /// Create an empty context (no block types, no rules)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with every built-in category registered
    pub fn builtin() -> Self {
        let mut context = Self::new();
        crate::blocks::register_builtin_blocks(&mut context);
        context
    }

    /// Replace the output settings
    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GeneratorConfig {
        &mut self.config
    }

    /// Block shapes (for the palette and the shape checker)
    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    /// Generation rules
    pub fn generators(&self) -> &GeneratorRegistry {
        &self.generators
    }

    /// Register a block shape; the last registration for a type wins
    pub fn register_block_type(&mut self, definition: BlockDef) -> Option<BlockDef> {
        self.blocks.register(definition)
    }

    /// Register a rule; the last registration for a type wins
    pub fn register_generator(&mut self, block_type: &str, rule: Arc<dyn BlockGenerator>) {
        self.generators.register(block_type, rule);
    }

    /// Register a rule from a function
    pub fn register_fn<F>(&mut self, block_type: &str, func: F)
    where
        F: Fn(&mut BlockContext<'_, '_>) -> GenerateResult<Fragment> + Send + Sync + 'static,
    {
        self.generators.register_fn(block_type, func);
    }

    /// Register a shape and its rule together
    pub fn register<F>(&mut self, definition: BlockDef, func: F)
    where
        F: Fn(&mut BlockContext<'_, '_>) -> GenerateResult<Fragment> + Send + Sync + 'static,
    {
        let block_type = definition.block_type.clone();
        self.register_block_type(definition);
        self.register_fn(&block_type, func);
    }

    /// Run one generation pass
    pub fn generate(&self, document: &BlockDocument) -> GenerateResult<GeneratedCode> {
        generate(document, self)
    }
}
