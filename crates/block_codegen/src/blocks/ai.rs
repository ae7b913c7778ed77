// AI blocks - Summarizing files
//
// The summarize block needs two awaits, so its work goes into a hoisted async
// helper and the block itself becomes a call to that helper.

use block_types::{BlockDef, InputDef};

use crate::{BlockContext, Fragment, GenerateResult, GeneratorContext, Precedence, indent_lines};

const AI_COLOUR: &str = "#3EB049";

pub fn register_ai_blocks(context: &mut GeneratorContext) {
    context.register(
        BlockDef::expression("summarize", "AI")
            .colour(AI_COLOUR)
            .input(InputDef::value("files")),
        summarize,
    );
}

fn summarize(ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment> {
    let files = ctx.value("files", Precedence::None)?;
    let name = ctx.allocate("summarize")?;

    let body = format!(
        concat!(
            "from invent.ai import summarize\n",
            "content = await invent.read_files({files})\n",
            "summary = await summarize(context=\"\\n\\n\".join(content))\n",
            "return summary\n",
        ),
        files = files
    );
    ctx.add_declaration(&name, format!("async def {}():\n{}", name, indent_lines(&body, ctx.indent())));

    Ok(Fragment::expression(format!("await {}()", name), Precedence::Await))
}

#[cfg(test)]
mod tests {
    use block_types::BlockInstance;

    use crate::blocks::test_support::generate;

    #[test]
    fn test_summarize_hoists_helper() {
        let code = generate(vec![
            BlockInstance::with_id("say", "say").input("text", "sum"),
            BlockInstance::with_id("sum", "summarize").input("files", "f"),
            BlockInstance::with_id("f", "inline_text").field("value", "[\"notes.txt\"]"),
        ]);

        assert_eq!(code.declarations.len(), 1);
        let name = &code.declarations[0].name;
        assert!(name.starts_with("summarize_"));
        assert_eq!(code.main, format!("invent.say(await {}())\n", name));
        assert_eq!(
            code.auxiliary,
            format!(
                concat!(
                    "async def {}():\n",
                    "    from invent.ai import summarize\n",
                    "    content = await invent.read_files([\"notes.txt\"])\n",
                    "    summary = await summarize(context=\"\\n\\n\".join(content))\n",
                    "    return summary\n",
                ),
                name
            )
        );
    }

    #[test]
    fn test_two_summaries_get_distinct_helpers() {
        let code = generate(vec![
            BlockInstance::with_id("a", "say").input("text", "s1").then("b"),
            BlockInstance::with_id("s1", "summarize"),
            BlockInstance::with_id("b", "say").input("text", "s2"),
            BlockInstance::with_id("s2", "summarize"),
        ]);

        assert_eq!(code.declarations.len(), 2);
        assert_ne!(code.declarations[0].name, code.declarations[1].name);
        // Declarations are separated by a blank line
        assert_eq!(
            code.auxiliary,
            format!("{}\n{}", code.declarations[0].code, code.declarations[1].code)
        );
    }
}
