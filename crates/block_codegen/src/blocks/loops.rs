// Loop blocks

use block_types::{BlockDef, InputDef, ShadowDef};

use crate::{BlockContext, Fragment, GenerateResult, GeneratorContext, Precedence};

const LOOPS_COLOUR: &str = "#4c97ff";

pub fn register_loop_blocks(context: &mut GeneratorContext) {
    context.register(
        BlockDef::statement("loops_forever", "Loops")
            .colour(LOOPS_COLOUR)
            .input(InputDef::statement("loop_body")),
        |ctx| {
            let body = ctx.body("loop_body")?;
            Ok(Fragment::statement(format!("while True:\n{}", body)))
        },
    );

    for block_type in ["loops_repeat_count", "loops_repeat"] {
        context.register(
            BlockDef::statement(block_type, "Loops")
                .colour(LOOPS_COLOUR)
                .input(InputDef::value("loop_count").with_shadow(ShadowDef::new("inline_number").with_field("value", 10)))
                .input(InputDef::statement("loop_body")),
            repeat,
        );
    }
}

/// `for _ in range(n):` around the body
pub(crate) fn repeat(ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment> {
    let count = ctx.value("loop_count", Precedence::None)?;
    let count = if count.is_empty() { "0".to_string() } else { count };
    let body = ctx.body("loop_body")?;
    Ok(Fragment::statement(format!("for _ in range({}):\n{}", count, body)))
}
