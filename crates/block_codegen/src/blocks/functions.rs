// Function blocks - User-defined procedures
//
// A definition is hoisted into the auxiliary text under the name the user
// typed; calls refer to it by that name. A body that awaits makes the
// definition an `async def`, and calls to it are awaited.

use block_types::{BlockDef, FieldDef, InputDef};

use crate::{
    BlockContext, Fragment, GenerateError, GenerateResult, GeneratorContext, awaits, function_definition,
    identifier_part,
};

const FUNCTIONS_COLOUR: &str = "#ff6680";

pub fn register_function_blocks(context: &mut GeneratorContext) {
    context.register(
        BlockDef::statement("functions_define", "Functions")
            .colour(FUNCTIONS_COLOUR)
            .field(FieldDef::text("function_name", ""))
            .input(InputDef::statement("function_body")),
        define,
    );

    context.register(
        BlockDef::statement("functions_call", "Functions")
            .colour(FUNCTIONS_COLOUR)
            .field(FieldDef::label("function_name")),
        call,
    );
}

fn define(ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment> {
    let body = ctx.body("function_body")?;
    let name = identifier_part(&ctx.field_str("function_name"));
    let name = if name.is_empty() { ctx.allocate("function")? } else { name };

    if ctx.is_declared(&name) {
        return Err(GenerateError::DuplicateIdentifier {
            block_id: ctx.block_id().to_string(),
            identifier: name,
        });
    }

    ctx.add_declaration(&name, function_definition(&name, "", &body));
    Ok(Fragment::statement(""))
}

fn call(ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment> {
    let name = identifier_part(&ctx.field_str("function_name"));
    if name.is_empty() {
        return Ok(Fragment::statement(""));
    }

    if is_async(ctx, &name) {
        Ok(Fragment::statement(format!("await {}()\n", name)))
    } else {
        Ok(Fragment::statement(format!("{}()\n", name)))
    }
}

/// Whether the function called `name` is defined with `async def`
fn is_async(ctx: &BlockContext<'_, '_>, name: &str) -> bool {
    if let Some(declaration) = ctx.declaration(name) {
        return declaration.code.starts_with("async def");
    }

    // The call comes before its definition: look ahead at the definition's
    // body. Errors in it are reported when the definition itself generates.
    let definition = ctx.document_blocks().iter().find(|block| {
        block.block_type == "functions_define"
            && block
                .fields
                .get("function_name")
                .is_some_and(|value| identifier_part(&value.to_string()) == name)
    });
    match definition {
        Some(block) => matches!(ctx.preview_body(block, "function_body", name), Ok(Some(body)) if awaits(&body)),
        None => false,
    }
}
