// Graph Walker - Drives one generation pass over a document
//
// A pass owns its identifier allocator and its auxiliary declaration buffer;
// both start empty and are dropped when the pass ends. Roots are walked in
// document order and every chain follows its `next` pointers exactly.

use std::collections::{HashMap, HashSet};

use block_types::{BlockDocument, BlockInstance, FieldValue, NEXT_SLOT};
use serde::{Deserialize, Serialize};

use crate::{
    Fragment, GenerateError, GenerateResult, GeneratorConfig, GeneratorContext, IdentifierAllocator, Precedence, quote,
};

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

/// A top-level definition hoisted out of the block that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryDeclaration {
    /// Name the main text refers to
    pub name: String,
    /// Complete definition text
    pub code: String,
}

/// Result of a generation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// Code of the top-level chains, in root order
    pub main: String,
    /// Hoisted declarations joined in the order they were produced
    pub auxiliary: String,
    pub declarations: Vec<AuxiliaryDeclaration>,
}

impl GeneratedCode {
    /// Auxiliary declarations followed by the main text
    pub fn source(&self) -> String {
        match (self.auxiliary.is_empty(), self.main.is_empty()) {
            (true, _) => self.main.clone(),
            (false, true) => self.auxiliary.clone(),
            (false, false) => format!("{}\n{}", self.auxiliary, self.main),
        }
    }
}

/// Generate code for a document with the given context
pub fn generate(document: &BlockDocument, context: &GeneratorContext) -> GenerateResult<GeneratedCode> {
    let mut pass = Pass::new(document, context)?;

    let mut main = String::new();
    for root in &document.roots {
        let head = pass
            .index
            .get(root.as_str())
            .copied()
            .ok_or_else(|| GenerateError::MissingRoot(root.clone()))?;
        main.push_str(&pass.chain_to_code(head)?);
    }

    let declarations = pass.declarations;
    let auxiliary = declarations
        .iter()
        .map(|d| d.code.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    tracing::debug!(
        roots = document.roots.len(),
        blocks = pass.visited.len(),
        declarations = declarations.len(),
        "Generated document"
    );

    Ok(GeneratedCode {
        main,
        auxiliary,
        declarations,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Pass State
// ─────────────────────────────────────────────────────────────────────────────

/// State of one generation pass
pub(crate) struct Pass<'a> {
    index: HashMap<&'a str, &'a BlockInstance>,
    blocks: &'a [BlockInstance],
    context: &'a GeneratorContext,
    allocator: IdentifierAllocator,
    declarations: Vec<AuxiliaryDeclaration>,
    visited: HashSet<&'a str>,
    /// Keys of the previews this pass is nested in
    previewing: Vec<String>,
}

impl<'a> Pass<'a> {
    fn new(document: &'a BlockDocument, context: &'a GeneratorContext) -> GenerateResult<Self> {
        let mut index = HashMap::with_capacity(document.blocks.len());
        for block in &document.blocks {
            if index.insert(block.id.as_str(), block).is_some() {
                return Err(GenerateError::DuplicateBlockId(block.id.clone()));
            }
        }

        Ok(Self {
            index,
            blocks: &document.blocks,
            context,
            allocator: IdentifierAllocator::with_seed(context.config().seed),
            declarations: Vec::new(),
            visited: HashSet::new(),
            previewing: Vec::new(),
        })
    }

    fn config(&self) -> &'a GeneratorConfig {
        self.context.config()
    }

    fn resolve(&self, parent: &BlockInstance, slot: &str, id: &str) -> GenerateResult<&'a BlockInstance> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GenerateError::DanglingReference {
                block_id: parent.id.clone(),
                slot: slot.to_string(),
                missing_id: id.to_string(),
            })
    }

    /// Run the rule for one block
    fn generate_block(&mut self, block: &'a BlockInstance) -> GenerateResult<Fragment> {
        if !self.visited.insert(block.id.as_str()) {
            return Err(GenerateError::SharedBlock(block.id.clone()));
        }

        let context = self.context;
        let rule = context
            .generators()
            .get(&block.block_type)
            .ok_or_else(|| GenerateError::UnknownBlockType {
                block_id: block.id.clone(),
                block_type: block.block_type.clone(),
            })?;

        tracing::trace!(block_id = %block.id, block_type = %block.block_type, "Generating block");
        rule.generate(&mut BlockContext { block, pass: self })
    }

    /// Code of a value slot as it must appear at `outer` binding
    fn value_to_code(&mut self, block: &'a BlockInstance, slot: &str, outer: Precedence) -> GenerateResult<String> {
        let Some(id) = block.inputs.get(slot).and_then(|input| input.effective()) else {
            return Ok(String::new());
        };
        let child = self.resolve(block, slot, id)?;

        match self.generate_block(child)? {
            Fragment::Expression(expression) => Ok(expression.wrap(outer)),
            Fragment::Statement(_) => Err(GenerateError::ExpectedExpression {
                block_id: child.id.clone(),
                parent_id: block.id.clone(),
                slot: slot.to_string(),
            }),
        }
    }

    /// Code of a nested chain, indented one level
    fn statement_to_code(&mut self, block: &'a BlockInstance, slot: &str) -> GenerateResult<String> {
        let Some(head_id) = block.statements.get(slot) else {
            return Ok(String::new());
        };
        let head = self.resolve(block, slot, head_id)?;
        let code = self.chain_to_code(head)?;
        Ok(indent_lines(&code, &self.config().indent))
    }

    /// Code of a chain, following `next` pointers in order
    fn chain_to_code(&mut self, head: &'a BlockInstance) -> GenerateResult<String> {
        let mut code = String::new();
        let mut current = Some(head);

        while let Some(block) = current {
            code.push_str(&self.generate_block(block)?.into_lines());
            current = match &block.next {
                Some(next) => Some(self.resolve(block, NEXT_SLOT, next)?),
                None => None,
            };
        }

        Ok(code)
    }
}

/// Prefix every non-blank line with `indent`
pub fn indent_lines(code: &str, indent: &str) -> String {
    code.split_inclusive('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{}{}", indent, line)
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Context
// ─────────────────────────────────────────────────────────────────────────────

/// What a generation rule sees: its block plus callbacks into the pass
pub struct BlockContext<'c, 'a> {
    block: &'a BlockInstance,
    pass: &'c mut Pass<'a>,
}

impl<'c, 'a> BlockContext<'c, 'a> {
    /// The block being generated
    pub fn block(&self) -> &'a BlockInstance {
        self.block
    }

    pub fn block_id(&self) -> &'a str {
        &self.block.id
    }

    /// Get a field value
    pub fn field(&self, name: &str) -> Option<&'a FieldValue> {
        self.block.fields.get(name)
    }

    /// Field as text (empty when absent)
    pub fn field_str(&self, name: &str) -> String {
        self.field(name).map(|v| v.to_string()).unwrap_or_default()
    }

    /// Field as a number
    pub fn field_number(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(|v| v.as_f64())
    }

    /// Field as a bool
    pub fn field_bool(&self, name: &str) -> Option<bool> {
        self.field(name).and_then(|v| v.as_bool())
    }

    /// Editor state entry (e.g. `elseIfCount`)
    pub fn extra_state(&self, key: &str) -> Option<&'a serde_json::Value> {
        self.block.extra_state.get(key)
    }

    /// Generate a value slot at `outer` binding. An empty slot yields "".
    pub fn value(&mut self, slot: &str, outer: Precedence) -> GenerateResult<String> {
        self.pass.value_to_code(self.block, slot, outer)
    }

    /// Generate a statement slot, indented one level. An empty slot yields "".
    pub fn statements(&mut self, slot: &str) -> GenerateResult<String> {
        self.pass.statement_to_code(self.block, slot)
    }

    /// Generate a statement slot, or an indented `pass` when it is empty
    pub fn statements_or_pass(&mut self, slot: &str) -> GenerateResult<String> {
        let body = self.statements(slot)?;
        if body.trim().is_empty() {
            return Ok(format!("{}pass\n", self.indent()));
        }
        Ok(body)
    }

    /// Generate a body slot: the configured loop trap first, then the nested
    /// chain, or `pass` when both are empty
    pub fn body(&mut self, slot: &str) -> GenerateResult<String> {
        let mut body = self.statements(slot)?;
        if let Some(trap) = &self.pass.config().loop_trap {
            let trap = trap.replace("%1", &quote(&self.block.id));
            let mut trapped = indent_lines(&Fragment::statement(trap).into_lines(), self.indent());
            trapped.push_str(&body);
            body = trapped;
        }
        if body.trim().is_empty() {
            body = format!("{}pass\n", self.indent());
        }
        Ok(body)
    }

    /// One level of indentation
    pub fn indent(&self) -> &'a str {
        &self.pass.config().indent
    }

    /// Allocate a fresh identifier for a hoisted definition
    pub fn allocate(&mut self, prefix: &str) -> GenerateResult<String> {
        self.pass
            .allocator
            .allocate(prefix)
            .map_err(|collision| GenerateError::DuplicateIdentifier {
                block_id: self.block.id.clone(),
                identifier: collision.0,
            })
    }

    /// Whether a declaration with this name was already hoisted in this pass
    pub fn is_declared(&self, name: &str) -> bool {
        self.declaration(name).is_some()
    }

    /// A declaration hoisted earlier in this pass
    pub fn declaration(&self, name: &str) -> Option<&AuxiliaryDeclaration> {
        self.pass.declarations.iter().find(|d| d.name == name)
    }

    /// Every block of the document, in document order
    pub fn document_blocks(&self) -> &'a [BlockInstance] {
        self.pass.blocks
    }

    /// Generate a body slot of another block in a scratch pass, as `body`
    /// would. This pass is left untouched: nothing is marked visited and no
    /// identifiers are used up. Returns `None` when a preview under the same
    /// `key` is already in progress, which stops recursive definitions.
    pub fn preview_body(&self, block: &'a BlockInstance, slot: &str, key: &str) -> GenerateResult<Option<String>> {
        if self.pass.previewing.iter().any(|k| k == key) {
            return Ok(None);
        }

        let mut previewing = self.pass.previewing.clone();
        previewing.push(key.to_string());
        let mut scratch = Pass {
            index: self.pass.index.clone(),
            blocks: self.pass.blocks,
            context: self.pass.context,
            allocator: self.pass.allocator.clone(),
            declarations: Vec::new(),
            visited: HashSet::new(),
            previewing,
        };

        tracing::trace!(block_id = %block.id, key = %key, "Previewing body");
        BlockContext { block, pass: &mut scratch }.body(slot).map(Some)
    }

    /// Hoist a top-level definition out of this block
    pub fn add_declaration(&mut self, name: &str, code: impl Into<String>) {
        let mut code = code.into();
        if !code.ends_with('\n') {
            code.push('\n');
        }
        tracing::trace!(block_id = %self.block.id, name = %name, "Hoisted declaration");
        self.pass.declarations.push(AuxiliaryDeclaration {
            name: name.to_string(),
            code,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_types::BlockDef;

    /// Context with a handful of hand-written rules
    fn test_context() -> GeneratorContext {
        let mut context = GeneratorContext::new();
        context.register_fn("number", |ctx| Ok(Fragment::expression(ctx.field_str("value"), Precedence::Atomic)));
        context.register_fn("add", |ctx| {
            let a = ctx.value("a", Precedence::Additive)?;
            let b = ctx.value("b", Precedence::Additive)?;
            Ok(Fragment::expression(format!("{} + {}", a, b), Precedence::Additive))
        });
        context.register_fn("times", |ctx| {
            let a = ctx.value("a", Precedence::Multiplicative)?;
            let b = ctx.value("b", Precedence::Multiplicative)?;
            Ok(Fragment::expression(format!("{} * {}", a, b), Precedence::Multiplicative))
        });
        context.register_fn("print", |ctx| {
            let value = ctx.value("value", Precedence::None)?;
            Ok(Fragment::statement(format!("print({})\n", value)))
        });
        context.register_fn("forever", |ctx| {
            let body = ctx.body("body")?;
            Ok(Fragment::statement(format!("while True:\n{}", body)))
        });
        context.register_fn("helper", |ctx| {
            let name = ctx.allocate("helper")?;
            ctx.add_declaration(&name, format!("def {}():\n    return 1\n", name));
            Ok(Fragment::expression(format!("{}()", name), Precedence::FunctionCall))
        });
        context
    }

    fn print(id: &str, value: &str) -> BlockInstance {
        BlockInstance::with_id(id, "print").input("value", value)
    }

    fn number(id: &str, value: i64) -> BlockInstance {
        BlockInstance::with_id(id, "number").field("value", value)
    }

    #[test]
    fn test_chain_order_is_preserved() {
        let mut doc = BlockDocument::new();
        doc.add_block(print("a", "n1").then("b"))
            .add_block(print("b", "n2").then("c"))
            .add_block(print("c", "n3"))
            .add_block(number("n1", 1))
            .add_block(number("n2", 2))
            .add_block(number("n3", 3))
            .add_root("a");

        let code = generate(&doc, &test_context()).unwrap();
        assert_eq!(code.main, "print(1)\nprint(2)\nprint(3)\n");
        assert!(code.auxiliary.is_empty());
    }

    #[test]
    fn test_roots_are_concatenated_in_order() {
        let mut doc = BlockDocument::new();
        doc.add_block(print("second", "n2"))
            .add_block(print("first", "n1"))
            .add_block(number("n1", 1))
            .add_block(number("n2", 2))
            .add_root("first")
            .add_root("second");

        assert_eq!(generate(&doc, &test_context()).unwrap().main, "print(1)\nprint(2)\n");
    }

    #[test]
    fn test_precedence_parenthesizes() {
        let mut doc = BlockDocument::new();
        doc.add_block(print("p", "mul"))
            .add_block(BlockInstance::with_id("mul", "times").input("a", "sum").input("b", "n3"))
            .add_block(BlockInstance::with_id("sum", "add").input("a", "n1").input("b", "n2"))
            .add_block(number("n1", 1))
            .add_block(number("n2", 2))
            .add_block(number("n3", 3))
            .add_root("p");

        assert_eq!(generate(&doc, &test_context()).unwrap().main, "print((1 + 2) * 3)\n");
    }

    #[test]
    fn test_unconnected_input_is_empty() {
        let mut doc = BlockDocument::new();
        doc.add_block(BlockInstance::with_id("p", "print")).add_root("p");

        assert_eq!(generate(&doc, &test_context()).unwrap().main, "print()\n");
    }

    #[test]
    fn test_shadow_is_used_when_nothing_is_connected() {
        let mut doc = BlockDocument::new();
        doc.add_block(BlockInstance::with_id("p", "print").shadow_input("value", "s"))
            .add_block(number("s", 10).as_shadow())
            .add_block(BlockInstance::with_id("q", "print").input("value", "n").shadow_input("value", "s2"))
            .add_block(number("n", 5))
            .add_block(number("s2", 10).as_shadow())
            .add_root("p")
            .add_root("q");

        assert_eq!(generate(&doc, &test_context()).unwrap().main, "print(10)\nprint(5)\n");
    }

    #[test]
    fn test_nested_bodies_are_indented() {
        let mut doc = BlockDocument::new();
        doc.add_block(BlockInstance::with_id("outer", "forever").statement("body", "inner"))
            .add_block(BlockInstance::with_id("inner", "forever").statement("body", "p").then("q"))
            .add_block(print("p", "n1"))
            .add_block(print("q", "n2"))
            .add_block(number("n1", 1))
            .add_block(number("n2", 2))
            .add_block(BlockInstance::with_id("empty", "forever"))
            .add_root("outer")
            .add_root("empty");

        let code = generate(&doc, &test_context()).unwrap();
        assert_eq!(
            code.main,
            "while True:\n    while True:\n        print(1)\n    print(2)\nwhile True:\n    pass\n"
        );
    }

    #[test]
    fn test_loop_trap_is_injected() {
        let mut context = test_context();
        context.config_mut().loop_trap = Some("checkpoint(%1)".to_string());

        let mut doc = BlockDocument::new();
        doc.add_block(BlockInstance::with_id("loop", "forever")).add_root("loop");

        assert_eq!(
            generate(&doc, &context).unwrap().main,
            "while True:\n    checkpoint(\"loop\")\n"
        );
    }

    #[test]
    fn test_loop_trap_escapes_block_id() {
        let mut context = test_context();
        context.config_mut().loop_trap = Some("checkpoint(%1)".to_string());

        let mut doc = BlockDocument::new();
        doc.add_block(BlockInstance::with_id("it's\\here", "forever")).add_root("it's\\here");

        assert_eq!(
            generate(&doc, &context).unwrap().main,
            "while True:\n    checkpoint(\"it's\\\\here\")\n"
        );
    }

    #[test]
    fn test_naked_expression_at_top_level() {
        let mut doc = BlockDocument::new();
        doc.add_block(number("n", 4)).add_root("n");
        assert_eq!(generate(&doc, &test_context()).unwrap().main, "4\n");
    }

    #[test]
    fn test_statement_in_value_slot_is_rejected() {
        let mut doc = BlockDocument::new();
        doc.add_block(print("p", "q")).add_block(print("q", "")).add_root("p");
        doc.get_block_mut("q").unwrap().inputs.clear();

        let err = generate(&doc, &test_context()).unwrap_err();
        assert!(matches!(err, GenerateError::ExpectedExpression { ref slot, .. } if slot == "value"));
        assert_eq!(err.block_id(), "q");
    }

    #[test]
    fn test_unknown_type_fails_closed() {
        let mut doc = BlockDocument::new();
        doc.add_block(print("p", "n1").then("bad"))
            .add_block(number("n1", 1))
            .add_block(BlockInstance::with_id("bad", "not_a_real_type"))
            .add_root("p");

        let err = generate(&doc, &test_context()).unwrap_err();
        assert!(matches!(
            &err,
            GenerateError::UnknownBlockType { block_id, block_type }
                if block_id == "bad" && block_type == "not_a_real_type"
        ));
        assert_eq!(err.block_id(), "bad");
        assert!(err.to_string().contains("not_a_real_type"));
    }

    #[test]
    fn test_dangling_and_missing_root() {
        let mut doc = BlockDocument::new();
        doc.add_block(print("p", "ghost")).add_root("p");
        let err = generate(&doc, &test_context()).unwrap_err();
        assert!(matches!(
            &err,
            GenerateError::DanglingReference { block_id, slot, missing_id }
                if block_id == "p" && slot == "value" && missing_id == "ghost"
        ));

        let mut doc = BlockDocument::new();
        doc.add_root("nowhere");
        assert!(matches!(generate(&doc, &test_context()), Err(GenerateError::MissingRoot(id)) if id == "nowhere"));
    }

    #[test]
    fn test_cycles_and_sharing_are_rejected() {
        let mut doc = BlockDocument::new();
        doc.add_block(print("a", "").then("b"))
            .add_block(print("b", "").then("a"))
            .add_root("a");
        for block in &mut doc.blocks {
            block.inputs.clear();
        }
        assert!(matches!(generate(&doc, &test_context()), Err(GenerateError::SharedBlock(id)) if id == "a"));

        let mut doc = BlockDocument::new();
        doc.add_block(print("a", "n"))
            .add_block(print("b", "n"))
            .add_block(number("n", 1))
            .add_root("a")
            .add_root("b");
        assert!(matches!(generate(&doc, &test_context()), Err(GenerateError::SharedBlock(id)) if id == "n"));
    }

    #[test]
    fn test_duplicate_block_ids_are_rejected() {
        let mut doc = BlockDocument::new();
        doc.add_block(number("n", 1)).add_block(number("n", 2)).add_root("n");
        assert!(matches!(generate(&doc, &test_context()), Err(GenerateError::DuplicateBlockId(id)) if id == "n"));
    }

    #[test]
    fn test_inert_blocks_are_ignored() {
        let mut doc = BlockDocument::new();
        doc.add_block(print("p", "n1"))
            .add_block(number("n1", 1))
            .add_block(BlockInstance::with_id("floating", "not_a_real_type"))
            .add_root("p");

        assert_eq!(generate(&doc, &test_context()).unwrap().main, "print(1)\n");
    }

    #[test]
    fn test_declarations_are_scoped_to_one_pass() {
        let mut context = test_context();
        context.config_mut().seed = Some(3);

        let mut doc = BlockDocument::new();
        doc.add_block(print("p", "h")).add_block(BlockInstance::with_id("h", "helper")).add_root("p");

        let first = generate(&doc, &context).unwrap();
        let second = generate(&doc, &context).unwrap();

        assert_eq!(first.declarations.len(), 1);
        assert_eq!(second.declarations.len(), 1);
        assert_eq!(first, second);

        let name = &first.declarations[0].name;
        assert_eq!(first.main, format!("print({}())\n", name));
        assert_eq!(first.auxiliary, format!("def {}():\n    return 1\n", name));
        assert_eq!(first.source(), format!("{}\n{}", first.auxiliary, first.main));
    }

    #[test]
    fn test_later_rule_replaces_earlier() {
        let mut context = test_context();
        context.register_block_type(BlockDef::expression("number", "Math"));
        context.register_fn("number", |ctx| Ok(Fragment::expression(format!("n{}", ctx.field_str("value")), Precedence::Atomic)));

        let mut doc = BlockDocument::new();
        doc.add_block(print("p", "n")).add_block(number("n", 7)).add_root("p");
        assert_eq!(generate(&doc, &context).unwrap().main, "print(n7)\n");
    }

    #[test]
    fn test_indent_lines_skips_blank_lines() {
        assert_eq!(indent_lines("a\n\nb\n", "  "), "  a\n\n  b\n");
        assert_eq!(indent_lines("", "  "), "");
    }
}
