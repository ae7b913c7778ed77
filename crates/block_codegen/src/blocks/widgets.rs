// Widget blocks - Event handlers bound to widgets on the page
//
// A "when" block becomes a decorated async function; the decorator registers
// it with the runtime when the module is imported.

use block_types::{BlockDef, FieldDef, InputDef, ShadowDef};

use crate::{BlockContext, Fragment, GenerateResult, GeneratorContext, Precedence, identifier_part, quote};

pub(crate) const WIDGETS_COLOUR: &str = "#FCC331";

pub fn register_widget_blocks(context: &mut GeneratorContext) {
    context.register(
        BlockDef::expression("widgets_widgets", "Widgets")
            .colour(WIDGETS_COLOUR)
            .field(FieldDef::dropdown("widget", &[("No Widgets", "")])),
        |ctx| Ok(Fragment::expression(quote(&ctx.field_str("widget")), Precedence::Atomic)),
    );

    context.register(
        BlockDef::expression("widgets_events", "Widgets")
            .colour(WIDGETS_COLOUR)
            .field(FieldDef::dropdown("event", &[("pressed", "press"), ("touched", "touch")])),
        |ctx| Ok(Fragment::expression(quote(&ctx.field_str("event")), Precedence::Atomic)),
    );

    context.register(
        BlockDef::statement("widgets_when", "Widgets")
            .colour(WIDGETS_COLOUR)
            .input(InputDef::value("widget").with_shadow(ShadowDef::new("widgets_widgets")))
            .input(InputDef::value("event").with_shadow(ShadowDef::new("widgets_events")))
            .input(InputDef::statement("function_body")),
        |ctx| when_handler(ctx, "widget"),
    );
}

/// `@invent.when(<event>, <source>)` over `async def when_<source>_is_<event>(message):`
pub(crate) fn when_handler(ctx: &mut BlockContext<'_, '_>, source_slot: &str) -> GenerateResult<Fragment> {
    let source = literal_or_empty(ctx.value(source_slot, Precedence::None)?);
    let event = literal_or_empty(ctx.value("event", Precedence::None)?);
    let body = ctx.body("function_body")?;

    let name = format!("when_{}_is_{}", identifier_part(&source), identifier_part(&event));
    Ok(Fragment::statement(format!(
        "@invent.when({}, {})\nasync def {}(message):\n{}",
        event, source, name, body
    )))
}

fn literal_or_empty(code: String) -> String {
    if code.is_empty() { quote("") } else { code }
}
