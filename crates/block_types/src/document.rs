// Block Document - The block graph a workspace persists
//
// A document is a flat list of block instances plus the ordered list of
// top-level statement chains that make up the program. Blocks reference each
// other by id: value inputs, statement inputs and `next` pointers. Blocks not
// reachable from a root are inert; they are kept but never generated.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::FieldValue;

/// Current version of the flat document format
pub const DOCUMENT_VERSION: u32 = 1;

/// Slot name used when reporting problems with a `next` pointer
pub const NEXT_SLOT: &str = "next";

/// Slot name used when reporting problems with the root list
pub const ROOT_SLOT: &str = "root";

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur when reading or validating a document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Failed to parse document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(u32),

    #[error("Duplicate block id: {0}")]
    DuplicateBlockId(String),

    #[error("Block '{block_id}' slot '{slot}' references missing block '{missing_id}'")]
    DanglingReference {
        block_id: String,
        slot: String,
        missing_id: String,
    },

    #[error("Block '{0}' is connected to more than one place")]
    SharedBlock(String),

    #[error("Malformed workspace JSON: {0}")]
    MalformedWorkspace(String),
}

impl DocumentError {
    /// The block the error is about, if any
    pub fn block_id(&self) -> Option<&str> {
        match self {
            DocumentError::DuplicateBlockId(id) | DocumentError::SharedBlock(id) => Some(id),
            DocumentError::DanglingReference { block_id, .. } => Some(block_id),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Instances
// ─────────────────────────────────────────────────────────────────────────────

/// Position in the visual editor (for UI purposes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// What is plugged into a value slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueInput {
    /// User-connected block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    /// Shadow block used when nothing is connected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<String>,
}

impl ValueInput {
    /// The block generation should use: the connected block, else the shadow
    pub fn effective(&self) -> Option<&str> {
        self.block.as_deref().or(self.shadow.as_deref())
    }

    /// Every block id this slot references
    pub fn referenced(&self) -> impl Iterator<Item = &str> {
        self.block.as_deref().into_iter().chain(self.shadow.as_deref())
    }
}

/// A block instance within a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInstance {
    /// Unique id within the document
    pub id: String,
    /// Block type (references BlockDef.block_type)
    #[serde(rename = "type")]
    pub block_type: String,
    /// Authored field values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldValue>,
    /// Value slots (slot name -> connected/shadow block)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, ValueInput>,
    /// Statement slots (slot name -> head of the nested chain)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub statements: BTreeMap<String, String>,
    /// Following block in the same chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Whether this is a shadow (palette default) block
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub shadow: bool,
    /// Position in the visual editor
    #[serde(default)]
    pub position: Position,
    /// Block-specific editor state (e.g., `{"elseIfCount": 1}`)
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra_state: serde_json::Value,
}

impl BlockInstance {
    /// Create a block with a fresh id
    pub fn new(block_type: &str) -> Self {
        Self::with_id(&uuid::Uuid::new_v4().to_string(), block_type)
    }

    /// Create a block with a given id
    pub fn with_id(id: &str, block_type: &str) -> Self {
        Self {
            id: id.to_string(),
            block_type: block_type.to_string(),
            fields: BTreeMap::new(),
            inputs: BTreeMap::new(),
            statements: BTreeMap::new(),
            next: None,
            shadow: false,
            position: Position::default(),
            extra_state: serde_json::Value::Null,
        }
    }

    /// Set a field value
    pub fn field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Connect a block to a value slot
    pub fn input(mut self, slot: &str, block_id: &str) -> Self {
        self.inputs.entry(slot.to_string()).or_default().block = Some(block_id.to_string());
        self
    }

    /// Put a shadow block into a value slot
    pub fn shadow_input(mut self, slot: &str, block_id: &str) -> Self {
        self.inputs.entry(slot.to_string()).or_default().shadow = Some(block_id.to_string());
        self
    }

    /// Nest a chain into a statement slot
    pub fn statement(mut self, slot: &str, head_id: &str) -> Self {
        self.statements.insert(slot.to_string(), head_id.to_string());
        self
    }

    /// Chain the following block
    pub fn then(mut self, next_id: &str) -> Self {
        self.next = Some(next_id.to_string());
        self
    }

    /// Mark as a shadow block
    pub fn as_shadow(mut self) -> Self {
        self.shadow = true;
        self
    }

    /// Set the editor state
    pub fn extra_state(mut self, state: serde_json::Value) -> Self {
        self.extra_state = state;
        self
    }

    /// Get a field value
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Every (slot, referenced id) pair this block holds, in a stable order
    pub fn references(&self) -> Vec<(&str, &str)> {
        let mut refs = Vec::new();
        for (slot, input) in &self.inputs {
            for id in input.referenced() {
                refs.push((slot.as_str(), id));
            }
        }
        for (slot, head) in &self.statements {
            refs.push((slot.as_str(), head.as_str()));
        }
        if let Some(next) = &self.next {
            refs.push((NEXT_SLOT, next.as_str()));
        }
        refs
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Document
// ─────────────────────────────────────────────────────────────────────────────

/// A complete block graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDocument {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Heads of the top-level statement chains, in program order
    #[serde(default)]
    pub roots: Vec<String>,
    /// Every block in the workspace, connected or not
    #[serde(default)]
    pub blocks: Vec<BlockInstance>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

impl Default for BlockDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            roots: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Add a block (not connected to anything yet)
    pub fn add_block(&mut self, block: BlockInstance) -> &mut Self {
        self.blocks.push(block);
        self
    }

    /// Append a top-level chain head
    pub fn add_root(&mut self, block_id: &str) -> &mut Self {
        self.roots.push(block_id.to_string());
        self
    }

    /// Get a block by id
    pub fn get_block(&self, id: &str) -> Option<&BlockInstance> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Get a mutable block by id
    pub fn get_block_mut(&mut self, id: &str) -> Option<&mut BlockInstance> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    /// Build an id -> block index
    pub fn index(&self) -> HashMap<&str, &BlockInstance> {
        self.blocks.iter().map(|b| (b.id.as_str(), b)).collect()
    }

    /// Ids of every block reachable from a root, in walk order.
    /// Missing references are skipped; `validate` reports them.
    pub fn reachable_ids(&self) -> Vec<String> {
        let index = self.index();
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<&str> = self.roots.iter().rev().map(|s| s.as_str()).collect();

        while let Some(id) = stack.pop() {
            let Some(block) = index.get(id) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            order.push(id.to_string());
            for (_, child) in block.references().into_iter().rev() {
                stack.push(child);
            }
        }

        order
    }

    /// Ids of blocks no root reaches
    pub fn inert_ids(&self) -> Vec<String> {
        let reachable: HashSet<String> = self.reachable_ids().into_iter().collect();
        self.blocks
            .iter()
            .filter(|b| !reachable.contains(&b.id))
            .map(|b| b.id.clone())
            .collect()
    }

    /// Drop every block not reachable from a root; returns how many were removed
    pub fn prune_unreachable(&mut self) -> usize {
        let reachable: HashSet<String> = self.reachable_ids().into_iter().collect();
        let before = self.blocks.len();
        self.blocks.retain(|b| reachable.contains(&b.id));
        before - self.blocks.len()
    }

    /// Check document integrity: unique ids, no dangling references, and every
    /// block referenced from at most one connection point (roots count as one).
    pub fn validate(&self) -> Result<(), DocumentError> {
        let mut ids = HashSet::new();
        for block in &self.blocks {
            if !ids.insert(block.id.as_str()) {
                return Err(DocumentError::DuplicateBlockId(block.id.clone()));
            }
        }

        let mut referenced: HashSet<&str> = HashSet::new();
        for root in &self.roots {
            if !ids.contains(root.as_str()) {
                return Err(DocumentError::DanglingReference {
                    block_id: root.clone(),
                    slot: ROOT_SLOT.to_string(),
                    missing_id: root.clone(),
                });
            }
            if !referenced.insert(root.as_str()) {
                return Err(DocumentError::SharedBlock(root.clone()));
            }
        }

        for block in &self.blocks {
            for (slot, child) in block.references() {
                if !ids.contains(child) {
                    return Err(DocumentError::DanglingReference {
                        block_id: block.id.clone(),
                        slot: slot.to_string(),
                        missing_id: child.to_string(),
                    });
                }
                if !referenced.insert(child) {
                    return Err(DocumentError::SharedBlock(child.to_string()));
                }
            }
        }

        Ok(())
    }

    /// Whether two documents have the same reachable structure: same roots,
    /// and for every reachable block the same type, fields, shadow flag and
    /// connections. Positions and inert blocks are ignored.
    pub fn structurally_eq(&self, other: &BlockDocument) -> bool {
        if self.roots != other.roots {
            return false;
        }
        let ours = self.reachable_ids();
        if ours != other.reachable_ids() {
            return false;
        }
        let (a, b) = (self.index(), other.index());
        ours.iter().all(|id| match (a.get(id.as_str()), b.get(id.as_str())) {
            (Some(x), Some(y)) => {
                x.block_type == y.block_type
                    && x.fields == y.fields
                    && x.inputs == y.inputs
                    && x.statements == y.statements
                    && x.next == y.next
                    && x.shadow == y.shadow
                    && x.extra_state == y.extra_state
            }
            _ => false,
        })
    }

    /// Serialize to the flat JSON format
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse the flat JSON format.
    ///
    /// Only syntax, version and id uniqueness are checked here; connection
    /// integrity is reported by `validate` or by the code generator.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        let document: BlockDocument = serde_json::from_str(text)?;
        if document.version > DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion(document.version));
        }
        let mut ids = HashSet::new();
        for block in &document.blocks {
            if !ids.insert(block.id.as_str()) {
                return Err(DocumentError::DuplicateBlockId(block.id.clone()));
            }
        }
        Ok(document)
    }
}

/// Serialize a document to text
pub fn serialize(document: &BlockDocument) -> Result<String, DocumentError> {
    document.to_json()
}

/// Deserialize a document from text
pub fn deserialize(text: &str) -> Result<BlockDocument, DocumentError> {
    BlockDocument::from_json(text)
}
