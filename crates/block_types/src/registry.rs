// Block Registry - Stores block shapes for the palette and the shape checker
//
// Registering a block type under a name that already exists replaces the old
// shape. Categories routinely redeclare shared block types, so the last
// registration wins while the block keeps its original palette position.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{BlockDef, BlockDocument, InputKind, NEXT_SLOT, ShadowDef};

// ─────────────────────────────────────────────────────────────────────────────
// Palette
// ─────────────────────────────────────────────────────────────────────────────

/// One block entry in the palette
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteBlock {
    /// Block type
    #[serde(rename = "type")]
    pub block_type: String,
    /// Shadows pre-filled into value inputs (slot name -> shadow)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub inputs: HashMap<String, ShadowDef>,
}

/// One palette category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteCategory {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    pub blocks: Vec<PaletteBlock>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Shape Violations
// ─────────────────────────────────────────────────────────────────────────────

/// A place where a document does not match the registered shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeViolation {
    pub block_id: String,
    pub message: String,
}

impl std::fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block '{}': {}", self.block_id, self.message)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Registry of all known block shapes
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    blocks: HashMap<String, BlockDef>,
    /// First-registration order, for the palette
    order: Vec<String>,
}

impl BlockRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block shape, returning the shape it replaced (if any)
    pub fn register(&mut self, definition: BlockDef) -> Option<BlockDef> {
        let block_type = definition.block_type.clone();
        let previous = self.blocks.insert(block_type.clone(), definition);
        match &previous {
            Some(old) => tracing::debug!(
                block_type = %block_type,
                old_category = %old.category,
                "Replaced block shape"
            ),
            None => self.order.push(block_type),
        }
        previous
    }

    /// Get a block shape by type
    pub fn get(&self, block_type: &str) -> Option<&BlockDef> {
        self.blocks.get(block_type)
    }

    /// Check if a block type is registered
    pub fn contains(&self, block_type: &str) -> bool {
        self.blocks.contains_key(block_type)
    }

    /// All shapes in first-registration order
    pub fn definitions(&self) -> impl Iterator<Item = &BlockDef> {
        self.order.iter().filter_map(|t| self.blocks.get(t))
    }

    /// Shapes in a category, in first-registration order
    pub fn blocks_in_category(&self, category: &str) -> Vec<&BlockDef> {
        self.definitions().filter(|d| d.category == category).collect()
    }

    /// Categories in the order their first block was registered
    pub fn categories(&self) -> Vec<String> {
        let mut cats: Vec<String> = Vec::new();
        for def in self.definitions() {
            if !cats.contains(&def.category) {
                cats.push(def.category.clone());
            }
        }
        cats
    }

    /// Build the palette the editor shows
    pub fn palette(&self) -> Vec<PaletteCategory> {
        self.categories()
            .into_iter()
            .map(|name| {
                let defs = self.blocks_in_category(&name);
                let colour = defs.iter().find_map(|d| d.colour.clone());
                let blocks = defs
                    .iter()
                    .map(|d| PaletteBlock {
                        block_type: d.block_type.clone(),
                        inputs: d
                            .value_inputs()
                            .filter_map(|i| i.shadow.clone().map(|s| (i.name.clone(), s)))
                            .collect(),
                    })
                    .collect();
                PaletteCategory { name, colour, blocks }
            })
            .collect()
    }

    /// Get shape count
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Compare every block of a document against the registered shapes.
    ///
    /// Blocks of unregistered types are reported once and otherwise skipped.
    /// Blocks carrying editor state (e.g. `elseIfCount`) add inputs at edit
    /// time, so unlisted input names are not reported for them.
    pub fn check_document(&self, document: &BlockDocument) -> Vec<ShapeViolation> {
        let mut violations = Vec::new();
        let index = document.index();
        let mut report = |block_id: &str, message: String| {
            violations.push(ShapeViolation {
                block_id: block_id.to_string(),
                message,
            })
        };

        for block in &document.blocks {
            let Some(def) = self.get(&block.block_type) else {
                report(&block.id, format!("unknown block type '{}'", block.block_type));
                continue;
            };
            let dynamic_inputs = !block.extra_state.is_null();

            for name in block.fields.keys() {
                if def.get_field(name).is_none() {
                    report(&block.id, format!("unknown field '{}'", name));
                }
            }

            for (slot, input) in &block.inputs {
                match def.get_input(slot).map(|i| i.kind) {
                    Some(InputKind::Value) => {}
                    Some(InputKind::Statement) => {
                        report(&block.id, format!("'{}' is a statement input, not a value input", slot))
                    }
                    None if dynamic_inputs => {}
                    None => report(&block.id, format!("unknown value input '{}'", slot)),
                }
                for child in input.referenced() {
                    let child_def = index.get(child).and_then(|c| self.get(&c.block_type));
                    if child_def.is_some_and(|c| !c.is_expression()) {
                        report(&block.id, format!("'{}' holds block '{}' which has no output", slot, child));
                    }
                }
            }

            for (slot, head) in &block.statements {
                match def.get_input(slot).map(|i| i.kind) {
                    Some(InputKind::Statement) => {}
                    Some(InputKind::Value) => {
                        report(&block.id, format!("'{}' is a value input, not a statement input", slot))
                    }
                    None if dynamic_inputs => {}
                    None => report(&block.id, format!("unknown statement input '{}'", slot)),
                }
                let head_def = index.get(head.as_str()).and_then(|c| self.get(&c.block_type));
                if head_def.is_some_and(|c| !c.previous) {
                    report(&block.id, format!("'{}' holds block '{}' which cannot be nested", slot, head));
                }
            }

            if let Some(next) = &block.next {
                if !def.next {
                    report(&block.id, format!("has a {} block but no next connection", NEXT_SLOT));
                }
                let next_def = index.get(next.as_str()).and_then(|c| self.get(&c.block_type));
                if next_def.is_some_and(|c| !c.previous) {
                    report(&block.id, format!("is followed by block '{}' which cannot be chained", next));
                }
            }
        }

        violations
    }
}
