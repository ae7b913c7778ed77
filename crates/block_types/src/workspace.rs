// Workspace Format - Import/export of the block editor's nested JSON
//
// The editor saves its workspace as nested JSON: every top-level stack is a
// tree where children live inline under `inputs.<name>.block|shadow` and the
// rest of a chain under `next.block`. Value and statement inputs share the
// `inputs` key, so importing needs the BlockRegistry to tell them apart.
//
//   {"blocks": {"languageVersion": 0, "blocks": [
//       {"type": "loops_forever", "id": "a", "x": 10, "y": 20,
//        "inputs": {"loop_body": {"block": {"type": "say", ...}}},
//        "next": {"block": {...}}}
//   ]}}
//
// Disabled top-level stacks are imported as inert blocks and exported back as
// disabled stacks, so floating blocks survive a trip through the editor.

use std::collections::HashSet;

use serde_json::{Map, Value, json};

use crate::{BlockDocument, BlockInstance, BlockRegistry, DocumentError, FieldValue, InputKind, Position};

/// Version tag the editor writes into its workspace JSON
pub const WORKSPACE_LANGUAGE_VERSION: u64 = 0;

// ─────────────────────────────────────────────────────────────────────────────
// Import
// ─────────────────────────────────────────────────────────────────────────────

/// Parse a workspace JSON string into a document
pub fn import_workspace_str(text: &str, registry: &BlockRegistry) -> Result<BlockDocument, DocumentError> {
    let value: Value = serde_json::from_str(text)?;
    import_workspace(&value, registry)
}

/// Convert the editor's nested workspace JSON into a flat document.
///
/// Enabled top-level stacks become roots in workspace order. Blocks without
/// an id get a fresh one.
pub fn import_workspace(value: &Value, registry: &BlockRegistry) -> Result<BlockDocument, DocumentError> {
    let top = value
        .get("blocks")
        .and_then(|b| b.get("blocks"))
        .and_then(Value::as_array);

    let mut importer = Importer {
        registry,
        blocks: Vec::new(),
        ids: HashSet::new(),
    };
    let mut roots = Vec::new();

    for stack in top.into_iter().flatten() {
        let id = importer.import_block(stack, false)?;
        if let Some(block) = importer.blocks.iter_mut().find(|b| b.id == id) {
            block.position = Position {
                x: stack.get("x").and_then(Value::as_f64).unwrap_or(0.0) as f32,
                y: stack.get("y").and_then(Value::as_f64).unwrap_or(0.0) as f32,
            };
        }
        if is_enabled(stack) {
            roots.push(id);
        } else {
            tracing::debug!(block_id = %id, "Imported disabled stack as inert");
        }
    }

    let mut document = BlockDocument::new();
    document.roots = roots;
    document.blocks = importer.blocks;
    Ok(document)
}

fn is_enabled(block: &Value) -> bool {
    let enabled = block.get("enabled").and_then(Value::as_bool).unwrap_or(true);
    let disabled_reasons = block
        .get("disabledReasons")
        .and_then(Value::as_array)
        .is_some_and(|r| !r.is_empty());
    enabled && !disabled_reasons
}

struct Importer<'r> {
    registry: &'r BlockRegistry,
    blocks: Vec<BlockInstance>,
    ids: HashSet<String>,
}

impl Importer<'_> {
    /// Import one block and everything nested under it; returns its id
    fn import_block(&mut self, value: &Value, shadow: bool) -> Result<String, DocumentError> {
        let object = value
            .as_object()
            .ok_or_else(|| DocumentError::MalformedWorkspace("block is not an object".to_string()))?;
        let block_type = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DocumentError::MalformedWorkspace("block has no type".to_string()))?;

        let mut block = match object.get("id").and_then(Value::as_str) {
            Some(id) => BlockInstance::with_id(id, block_type),
            None => BlockInstance::new(block_type),
        };
        if !self.ids.insert(block.id.clone()) {
            return Err(DocumentError::DuplicateBlockId(block.id));
        }
        block.shadow = shadow;
        if let Some(state) = object.get("extraState") {
            block.extra_state = state.clone();
        }
        if let Some(fields) = object.get("fields").and_then(Value::as_object) {
            for (name, raw) in fields {
                let value: FieldValue = serde_json::from_value(raw.clone()).map_err(|_| {
                    DocumentError::MalformedWorkspace(format!(
                        "block '{}' field '{}' has an unsupported value",
                        block.id, name
                    ))
                })?;
                block.fields.insert(name.clone(), value);
            }
        }

        let id = block.id.clone();
        let slot = self.blocks.len();
        self.blocks.push(block);

        if let Some(inputs) = object.get("inputs").and_then(Value::as_object) {
            for (name, input) in inputs {
                let child = match input.get("block") {
                    Some(b) => Some(self.import_block(b, false)?),
                    None => None,
                };
                let child_shadow = match input.get("shadow") {
                    Some(s) => Some(self.import_block(s, true)?),
                    None => None,
                };

                let is_statement = self
                    .registry
                    .get(block_type)
                    .and_then(|d| d.get_input(name))
                    .is_some_and(|i| i.kind == InputKind::Statement);

                let block = &mut self.blocks[slot];
                if is_statement {
                    if let Some(head) = child {
                        block.statements.insert(name.clone(), head);
                    }
                } else if child.is_some() || child_shadow.is_some() {
                    let entry = block.inputs.entry(name.clone()).or_default();
                    entry.block = child;
                    entry.shadow = child_shadow;
                }
            }
        }

        if let Some(next) = object.get("next").and_then(|n| n.get("block")) {
            let next_id = self.import_block(next, false)?;
            self.blocks[slot].next = Some(next_id);
        }

        Ok(id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Export
// ─────────────────────────────────────────────────────────────────────────────

/// Convert a flat document into the editor's nested workspace JSON.
///
/// Roots come first in order; inert trees follow as disabled stacks.
pub fn export_workspace(document: &BlockDocument) -> Result<Value, DocumentError> {
    document.validate()?;

    let index = document.index();
    let mut referenced: HashSet<&str> = HashSet::new();
    for block in &document.blocks {
        for (_, child) in block.references() {
            referenced.insert(child);
        }
    }

    let mut exporter = Exporter {
        document,
        emitted: HashSet::new(),
    };
    let mut stacks = Vec::new();

    for root in &document.roots {
        stacks.push(exporter.export_stack(root, true)?);
    }
    for block in &document.blocks {
        let id = block.id.as_str();
        if !referenced.contains(id) && !document.roots.iter().any(|r| r == id) {
            stacks.push(exporter.export_stack(id, false)?);
        }
    }

    if exporter.emitted.len() != index.len() {
        let stranded = document
            .blocks
            .iter()
            .find(|b| !exporter.emitted.contains(b.id.as_str()))
            .map(|b| b.id.clone())
            .unwrap_or_default();
        return Err(DocumentError::MalformedWorkspace(format!(
            "block '{}' is part of a chain with no head",
            stranded
        )));
    }

    Ok(json!({
        "blocks": {
            "languageVersion": WORKSPACE_LANGUAGE_VERSION,
            "blocks": stacks,
        }
    }))
}

/// Serialize a document to workspace JSON text
pub fn export_workspace_string(document: &BlockDocument) -> Result<String, DocumentError> {
    Ok(serde_json::to_string_pretty(&export_workspace(document)?)?)
}

struct Exporter<'d> {
    document: &'d BlockDocument,
    emitted: HashSet<&'d str>,
}

impl<'d> Exporter<'d> {
    fn export_stack(&mut self, id: &'d str, enabled: bool) -> Result<Value, DocumentError> {
        let mut value = self.export_block(id)?;
        if let (Some(object), Some(block)) = (value.as_object_mut(), self.document.get_block(id)) {
            object.insert("x".to_string(), json!(block.position.x));
            object.insert("y".to_string(), json!(block.position.y));
            if !enabled {
                object.insert("enabled".to_string(), Value::Bool(false));
            }
        }
        Ok(value)
    }

    fn export_block(&mut self, id: &'d str) -> Result<Value, DocumentError> {
        let document = self.document;
        let block = document
            .get_block(id)
            .ok_or_else(|| DocumentError::MalformedWorkspace(format!("missing block '{}'", id)))?;
        self.emitted.insert(block.id.as_str());

        let mut object = Map::new();
        object.insert("type".to_string(), Value::String(block.block_type.clone()));
        object.insert("id".to_string(), Value::String(block.id.clone()));
        if !block.extra_state.is_null() {
            object.insert("extraState".to_string(), block.extra_state.clone());
        }
        if !block.fields.is_empty() {
            object.insert("fields".to_string(), serde_json::to_value(&block.fields)?);
        }

        let mut inputs = Map::new();
        for (slot, input) in &block.inputs {
            let mut entry = Map::new();
            if let Some(child) = &input.block {
                entry.insert("block".to_string(), self.export_block(child)?);
            }
            if let Some(shadow) = &input.shadow {
                entry.insert("shadow".to_string(), self.export_block(shadow)?);
            }
            inputs.insert(slot.clone(), Value::Object(entry));
        }
        for (slot, head) in &block.statements {
            inputs.insert(slot.clone(), json!({ "block": self.export_block(head)? }));
        }
        if !inputs.is_empty() {
            object.insert("inputs".to_string(), Value::Object(inputs));
        }

        if let Some(next) = &block.next {
            object.insert("next".to_string(), json!({ "block": self.export_block(next)? }));
        }

        Ok(Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockDef, InputDef};

    fn registry() -> BlockRegistry {
        let mut registry = BlockRegistry::new();
        registry.register(
            BlockDef::statement("loops_repeat_count", "Loops")
                .input(InputDef::value("loop_count"))
                .input(InputDef::statement("loop_body")),
        );
        registry
    }

    const WORKSPACE: &str = r#"{
        "blocks": {
            "languageVersion": 0,
            "blocks": [
                {
                    "type": "loops_repeat_count", "id": "loop", "x": 12, "y": 40,
                    "inputs": {
                        "loop_count": {
                            "shadow": {"type": "inline_number", "id": "count", "fields": {"value": 10}}
                        },
                        "loop_body": {
                            "block": {
                                "type": "say", "id": "say1",
                                "inputs": {"text": {"block": {"type": "listen", "id": "listen1"}}},
                                "next": {"block": {"type": "play_sound", "id": "play", "fields": {"sounds": "honk.mp3"}}}
                            }
                        }
                    }
                },
                {"type": "say", "id": "floating", "x": 300, "y": 0, "enabled": false}
            ]
        }
    }"#;

    #[test]
    fn test_import_classifies_inputs() {
        let doc = import_workspace_str(WORKSPACE, &registry()).unwrap();

        assert_eq!(doc.roots, vec!["loop"]);
        let lp = doc.get_block("loop").unwrap();
        assert_eq!(lp.position, Position { x: 12.0, y: 40.0 });
        assert_eq!(lp.statements["loop_body"], "say1");
        assert_eq!(lp.inputs["loop_count"].shadow.as_deref(), Some("count"));
        assert!(doc.get_block("count").unwrap().shadow);
        assert_eq!(doc.get_block("say1").unwrap().next.as_deref(), Some("play"));

        // Unknown types treat every input as a value input
        assert_eq!(doc.get_block("say1").unwrap().inputs["text"].block.as_deref(), Some("listen1"));

        // The disabled stack is kept but inert
        assert_eq!(doc.inert_ids(), vec!["floating"]);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_export_then_import_is_structurally_equal() {
        let doc = import_workspace_str(WORKSPACE, &registry()).unwrap();
        let exported = export_workspace(&doc).unwrap();

        let stacks = exported["blocks"]["blocks"].as_array().unwrap();
        assert_eq!(stacks.len(), 2);
        assert_eq!(stacks[1]["enabled"], false);
        assert_eq!(stacks[0]["inputs"]["loop_body"]["block"]["next"]["block"]["id"], "play");

        let back = import_workspace(&exported, &registry()).unwrap();
        assert!(doc.structurally_eq(&back));
        assert_eq!(back.inert_ids(), vec!["floating"]);
    }

    #[test]
    fn test_missing_ids_are_generated() {
        let text = r#"{"blocks": {"languageVersion": 0, "blocks": [{"type": "listen"}, {"type": "listen"}]}}"#;
        let doc = import_workspace_str(text, &BlockRegistry::new()).unwrap();
        assert_eq!(doc.roots.len(), 2);
        assert_ne!(doc.roots[0], doc.roots[1]);
    }

    #[test]
    fn test_import_errors() {
        let dup = r#"{"blocks": {"blocks": [{"type": "a", "id": "x"}, {"type": "b", "id": "x"}]}}"#;
        assert!(matches!(
            import_workspace_str(dup, &BlockRegistry::new()),
            Err(DocumentError::DuplicateBlockId(id)) if id == "x"
        ));

        let untyped = r#"{"blocks": {"blocks": [{"id": "x"}]}}"#;
        assert!(matches!(
            import_workspace_str(untyped, &BlockRegistry::new()),
            Err(DocumentError::MalformedWorkspace(_))
        ));
    }

    #[test]
    fn test_empty_workspace() {
        let doc = import_workspace(&json!({}), &BlockRegistry::new()).unwrap();
        assert!(doc.roots.is_empty());
        assert!(doc.blocks.is_empty());
    }

    #[test]
    fn test_export_rejects_headless_cycle() {
        let mut doc = BlockDocument::new();
        doc.add_block(BlockInstance::with_id("a", "say").then("b"))
            .add_block(BlockInstance::with_id("b", "say").then("a"));
        assert!(matches!(export_workspace(&doc), Err(DocumentError::MalformedWorkspace(_))));
    }
}
