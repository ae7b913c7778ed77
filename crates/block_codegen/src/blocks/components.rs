// Component blocks - The component flavour of the "when" handler

use block_types::{BlockDef, FieldDef, InputDef, ShadowDef};

use super::widgets::{WIDGETS_COLOUR, when_handler};
use crate::{Fragment, GeneratorContext, Precedence, quote};

pub fn register_component_blocks(context: &mut GeneratorContext) {
    context.register(
        BlockDef::expression("components_component_dropdown", "Components")
            .colour(WIDGETS_COLOUR)
            .field(FieldDef::dropdown("component", &[("Button1", "Button1")])),
        |ctx| Ok(Fragment::expression(quote(&ctx.field_str("component")), Precedence::Atomic)),
    );

    context.register(
        BlockDef::expression("components_events_dropdown", "Components")
            .colour(WIDGETS_COLOUR)
            .field(FieldDef::dropdown(
                "event",
                &[("pressed", "pressed"), ("touched", "touched"), ("held", "held")],
            )),
        |ctx| Ok(Fragment::expression(quote(&ctx.field_str("event")), Precedence::Atomic)),
    );

    context.register(
        BlockDef::statement("components_when", "Components")
            .colour(WIDGETS_COLOUR)
            .input(InputDef::value("component").with_shadow(ShadowDef::new("components_component_dropdown")))
            .input(InputDef::value("event").with_shadow(ShadowDef::new("components_events_dropdown")))
            .input(InputDef::statement("function_body")),
        |ctx| when_handler(ctx, "component"),
    );
}
