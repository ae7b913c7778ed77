// Channel blocks - Publish/subscribe messaging between parts of the app
//
// Subscribing hoists the handler body into a generated function (`async def`
// when the body awaits) and leaves a registration call in place of the block:
//
//   def subscribe_Xy12Ab34Cd(message):
//       ...
//
//   invent.subscribe(subscribe_Xy12Ab34Cd, to_channel=["alerts"], when_subject=["temp","humidity"])

use block_types::{BlockDef, FieldDef, InputDef, ShadowDef};

use crate::{
    BlockContext, Fragment, GenerateResult, GeneratorContext, Precedence, function_definition, identifier_part, quote,
};

const CHANNELS_COLOUR: &str = "#ffac1a";

pub fn register_channel_blocks(context: &mut GeneratorContext) {
    context.register(
        BlockDef::expression("channels_channels", "Channels")
            .colour(CHANNELS_COLOUR)
            .field(FieldDef::text("channel", "")),
        |ctx| Ok(Fragment::expression(string_list(&ctx.field_str("channel")), Precedence::Collection)),
    );

    context.register(
        BlockDef::expression("channels_subjects", "Channels")
            .colour(CHANNELS_COLOUR)
            .field(FieldDef::text("subjects", "")),
        |ctx| Ok(Fragment::expression(string_list(&ctx.field_str("subjects")), Precedence::Collection)),
    );

    context.register(
        BlockDef::statement("channels_subscribe", "Channels")
            .colour(CHANNELS_COLOUR)
            .field(FieldDef::text("channel", ""))
            .field(FieldDef::text("subjects", ""))
            .input(InputDef::statement("body")),
        subscribe,
    );

    context.register(
        BlockDef::statement("channels_unsubscribe", "Channels")
            .colour(CHANNELS_COLOUR)
            .field(FieldDef::text("function_name", ""))
            .input(InputDef::value("subjects").with_shadow(ShadowDef::new("channels_subjects")))
            .input(InputDef::value("channel").with_shadow(ShadowDef::new("channels_channels"))),
        unsubscribe,
    );

    context.register(
        BlockDef::statement("channels_publish", "Channels")
            .colour(CHANNELS_COLOUR)
            .input(InputDef::value("message").with_shadow(ShadowDef::new("inline_string").with_field("value", "message")))
            .input(InputDef::value("channel").with_shadow(ShadowDef::new("channels_channels"))),
        |ctx| {
            let message = ctx.value("message", Precedence::None)?;
            let channel = list_or_empty(ctx.value("channel", Precedence::None)?);
            Ok(Fragment::statement(format!(
                "invent.publish({}, to_channel={})\n",
                message, channel
            )))
        },
    );

    context.register(
        BlockDef::expression("channels_create_message", "Channels")
            .colour(CHANNELS_COLOUR)
            .input(InputDef::value("subject").with_shadow(ShadowDef::new("inline_string").with_field("value", "")))
            .input(InputDef::value("data")),
        |ctx| {
            let subject = ctx.value("subject", Precedence::None)?;
            let subject = if subject.is_empty() { quote("") } else { subject };
            let data = ctx.value("data", Precedence::None)?;
            let code = if data.is_empty() {
                format!("invent.Message({})", subject)
            } else {
                format!("invent.Message({}, data={})", subject, data)
            };
            Ok(Fragment::expression(code, Precedence::FunctionCall))
        },
    );
}

fn subscribe(ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment> {
    let channels = string_list(&ctx.field_str("channel"));
    let subjects = string_list(&ctx.field_str("subjects"));
    let body = ctx.body("body")?;
    let name = ctx.allocate("subscribe")?;

    ctx.add_declaration(&name, function_definition(&name, "message", &body));

    Ok(Fragment::statement(format!(
        "invent.subscribe({}, to_channel={}, when_subject={})\n",
        name, channels, subjects
    )))
}

fn unsubscribe(ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment> {
    let handler = identifier_part(&ctx.field_str("function_name"));
    let subjects = list_or_empty(ctx.value("subjects", Precedence::None)?);
    let channel = list_or_empty(ctx.value("channel", Precedence::None)?);
    Ok(Fragment::statement(format!(
        "invent.unsubscribe({}, from_channel={}, when_subject={})\n",
        handler, channel, subjects
    )))
}

/// `"temp, humidity"` -> `["temp","humidity"]`
pub(crate) fn string_list(text: &str) -> String {
    let items: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(quote)
        .collect();
    format!("[{}]", items.join(","))
}

fn list_or_empty(code: String) -> String {
    if code.is_empty() { "[]".to_string() } else { code }
}
