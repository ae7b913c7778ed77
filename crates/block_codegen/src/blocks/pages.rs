// Page blocks - Switching the visible page
//
// The palette uses the `pages_` names; `pages` and `show_page` are the
// names older projects were saved with.

use block_types::{BlockDef, FieldDef, InputDef, ShadowDef};

use crate::{BlockContext, Fragment, GenerateResult, GeneratorContext, Precedence, quote};

const PAGES_COLOUR: &str = "#ff6680";

pub fn register_page_blocks(context: &mut GeneratorContext) {
    for (page, show_page) in [("pages", "show_page"), ("pages_pages", "pages_show_page")] {
        context.register(
            BlockDef::expression(page, "Pages")
                .colour(PAGES_COLOUR)
                .field(FieldDef::dropdown("page", &[("No Pages", "")])),
            |ctx| Ok(Fragment::expression(quote(&ctx.field_str("page")), Precedence::Atomic)),
        );

        context.register(
            BlockDef::statement(show_page, "Pages")
                .colour(PAGES_COLOUR)
                .input(InputDef::value("page").with_shadow(ShadowDef::new(page))),
            show_page_rule,
        );
    }
}

fn show_page_rule(ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment> {
    let page = ctx.value("page", Precedence::None)?;
    Ok(Fragment::statement(format!("invent.show_page({})\n", page)))
}
