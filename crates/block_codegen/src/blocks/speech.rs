// Speech blocks

use block_types::{BlockDef, InputDef, ShadowDef};

use crate::{Fragment, GeneratorContext, Precedence};

const SPEECH_COLOUR: &str = "#3EB049";

pub fn register_speech_blocks(context: &mut GeneratorContext) {
    context.register(
        BlockDef::statement("say", "Speech")
            .colour(SPEECH_COLOUR)
            .input(InputDef::value("text").with_shadow(ShadowDef::new("inline_string").with_field("value", "hello"))),
        |ctx| {
            let text = ctx.value("text", Precedence::None)?;
            Ok(Fragment::statement(format!("invent.say({})\n", text)))
        },
    );

    context.register(BlockDef::expression("listen", "Speech").colour("#9966ff"), |_| {
        Ok(Fragment::expression("await invent.listen()", Precedence::Await))
    });

    context.register(
        BlockDef::statement("set_voice", "Speech")
            .colour(SPEECH_COLOUR)
            .input(InputDef::value("value")),
        |ctx| {
            let voice = ctx.value("value", Precedence::None)?;
            Ok(Fragment::statement(format!("invent.set_voice({})\n", voice)))
        },
    );
}

#[cfg(test)]
mod tests {
    use block_types::BlockInstance;

    use crate::blocks::test_support::generate;

    #[test]
    fn test_listen_then_say() {
        let code = generate(vec![
            BlockInstance::with_id("voice", "set_voice").input("value", "name").then("say"),
            BlockInstance::with_id("name", "inline_string").field("value", "Daniel"),
            BlockInstance::with_id("say", "say").input("text", "listen"),
            BlockInstance::with_id("listen", "listen"),
        ]);
        assert_eq!(
            code.main,
            "invent.set_voice(\"Daniel\")\ninvent.say(await invent.listen())\n"
        );
    }
}
