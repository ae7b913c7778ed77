// Common blocks - Inline literals used as shadows throughout the palette

use block_types::{BlockDef, FieldDef, FieldValue};

use crate::{BlockContext, Fragment, GenerateResult, GeneratorContext, Precedence, quote};

const TEXT_COLOUR: &str = "#00c0e9";

pub fn register_common_blocks(context: &mut GeneratorContext) {
    // Raw code, inserted as typed
    context.register(
        BlockDef::expression("inline_text", "Text")
            .colour(TEXT_COLOUR)
            .field(FieldDef::text("value", "")),
        |ctx| Ok(Fragment::expression(ctx.field_str("value"), Precedence::Atomic)),
    );

    context.register(
        BlockDef::expression("inline_string", "Text")
            .colour(TEXT_COLOUR)
            .field(FieldDef::text("value", "")),
        |ctx| Ok(Fragment::expression(quote(&ctx.field_str("value")), Precedence::Atomic)),
    );

    context.register(
        BlockDef::expression("inline_number", "Text")
            .colour(TEXT_COLOUR)
            .field(FieldDef::number("value", 1)),
        inline_number,
    );
}

fn inline_number(ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment> {
    let literal = match ctx.field("value") {
        Some(FieldValue::Number(n)) => n.to_string(),
        Some(other) => other.as_f64().map(number_literal).unwrap_or_else(|| "0".to_string()),
        None => "0".to_string(),
    };
    let precedence = if literal.starts_with('-') {
        Precedence::Unary
    } else {
        Precedence::Atomic
    };
    Ok(Fragment::expression(literal, precedence))
}

/// Python spelling of a number: integral values without a fraction
fn number_literal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else if value.is_finite() {
        format!("{}", value)
    } else {
        "0".to_string()
    }
}
