// Logic blocks - Conditionals, comparisons and boolean operators

use block_types::{BlockDef, FieldDef, InputDef};

use super::loops::repeat;
use crate::{BlockContext, Fragment, GenerateResult, GeneratorContext, Precedence};

const LOGIC_COLOUR: &str = "#58c059";

const COMPARISONS: &[(&str, &str)] = &[
    ("=", "=="),
    ("\u{2260}", "!="),
    ("<", "<"),
    ("\u{2264}", "<="),
    (">", ">"),
    ("\u{2265}", ">="),
];

const BOOLEANS: &[(&str, &str)] = &[("and", "and"), ("or", "or")];

pub fn register_logic_blocks(context: &mut GeneratorContext) {
    context.register(
        BlockDef::statement("logic_if", "Logic")
            .colour(LOGIC_COLOUR)
            .input(InputDef::value("if_condition"))
            .input(InputDef::statement("if_body"))
            .input(InputDef::statement("else_body")),
        logic_if,
    );

    context.register(
        BlockDef::expression("logic_compare", "Logic")
            .colour(LOGIC_COLOUR)
            .input(InputDef::value("this"))
            .field(FieldDef::dropdown("operator", COMPARISONS))
            .input(InputDef::value("that")),
        |ctx| binary(ctx, COMPARISONS),
    );

    context.register(
        BlockDef::expression("logic_boolean", "Logic")
            .colour(LOGIC_COLOUR)
            .input(InputDef::value("this"))
            .field(FieldDef::dropdown("operator", BOOLEANS))
            .input(InputDef::value("that")),
        |ctx| binary(ctx, BOOLEANS),
    );

    context.register(
        BlockDef::expression("logic_not", "Logic")
            .colour(LOGIC_COLOUR)
            .input(InputDef::value("this")),
        |ctx| {
            let operand = ctx.value("this", Precedence::LogicalNot)?;
            let operand = if operand.is_empty() { "True".to_string() } else { operand };
            Ok(Fragment::expression(format!("not {}", operand), Precedence::LogicalNot))
        },
    );

    // The logic category carries its own copy of the repeat block; the loops
    // category registers it again later and that registration is the one kept
    context.register(
        BlockDef::statement("loops_repeat", "Logic")
            .colour(LOGIC_COLOUR)
            .input(InputDef::value("loop_count"))
            .input(InputDef::statement("loop_body")),
        repeat,
    );
}

/// `if` / `elif` / `else`. Branch counts come from the block's editor state:
/// `elseIfCount` adds `else_if_condition_N` / `else_if_body_N` pairs and
/// `hasElse` enables `else_body`.
fn logic_if(ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment> {
    let else_if_count = ctx.extra_state("elseIfCount").and_then(|v| v.as_u64()).unwrap_or(0);
    let has_else = ctx.extra_state("hasElse").and_then(|v| v.as_bool()).unwrap_or(false)
        || ctx.block().statements.contains_key("else_body");

    let mut code = format!(
        "if {}:\n{}",
        condition(ctx, "if_condition")?,
        ctx.statements_or_pass("if_body")?
    );
    for n in 0..else_if_count {
        let test = condition(ctx, &format!("else_if_condition_{}", n))?;
        let body = ctx.statements_or_pass(&format!("else_if_body_{}", n))?;
        code.push_str(&format!("elif {}:\n{}", test, body));
    }
    if has_else {
        code.push_str(&format!("else:\n{}", ctx.statements_or_pass("else_body")?));
    }

    Ok(Fragment::statement(code))
}

fn condition(ctx: &mut BlockContext<'_, '_>, slot: &str) -> GenerateResult<String> {
    let test = ctx.value(slot, Precedence::None)?;
    Ok(if test.is_empty() { "False".to_string() } else { test })
}

/// Infix operator chosen from a dropdown; unknown choices fall back to the first
fn binary(ctx: &mut BlockContext<'_, '_>, operators: &[(&str, &str)]) -> GenerateResult<Fragment> {
    let chosen = ctx.field_str("operator");
    let operator = operators
        .iter()
        .map(|(_, op)| *op)
        .find(|op| *op == chosen)
        .or_else(|| operators.first().map(|(_, op)| *op))
        .unwrap_or("==");
    let precedence = Precedence::of_operator(operator).unwrap_or(Precedence::Relational);

    let left = ctx.value("this", precedence)?;
    let right = ctx.value("that", precedence)?;
    let left = if left.is_empty() { "None".to_string() } else { left };
    let right = if right.is_empty() { "None".to_string() } else { right };

    Ok(Fragment::expression(format!("{} {} {}", left, operator, right), precedence))
}
