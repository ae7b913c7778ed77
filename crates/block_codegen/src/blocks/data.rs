// Data blocks - Reading and writing the app's datastore

use block_types::{BlockDef, FieldDef, InputDef, ShadowDef};

use crate::{BlockContext, Fragment, GenerateResult, GeneratorContext, Precedence, quote};

pub(crate) const DATA_COLOUR: &str = "#ff8c1b";

/// Choices shown before the project defines any datastore values
pub(crate) const NO_DATA_VALUES: &[(&str, &str)] = &[("No Data Values", "")];

pub fn register_data_blocks(context: &mut GeneratorContext) {
    context.register(
        BlockDef::expression("data_values", "Data")
            .colour(DATA_COLOUR)
            .field(FieldDef::dropdown("key", NO_DATA_VALUES)),
        datastore_key,
    );

    context.register(
        BlockDef::expression("data_get_value", "Data")
            .colour(DATA_COLOUR)
            .field(FieldDef::dropdown("key", NO_DATA_VALUES)),
        get_value,
    );

    context.register(
        BlockDef::statement("data_set_value", "Data")
            .colour(DATA_COLOUR)
            .input(InputDef::value("key").with_shadow(ShadowDef::new("data_values")))
            .input(InputDef::value("value").with_shadow(ShadowDef::new("inline_string").with_field("value", "value"))),
        set_value,
    );

    context.register(
        BlockDef::statement("data_change_value_by", "Data")
            .colour(DATA_COLOUR)
            .input(InputDef::value("key").with_shadow(ShadowDef::new("data_values")))
            .input(InputDef::value("value").with_shadow(ShadowDef::new("inline_number").with_field("value", 1))),
        change_value_by,
    );
}

/// A datastore key as a string literal
pub(crate) fn datastore_key(ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment> {
    Ok(Fragment::expression(quote(&ctx.field_str("key")), Precedence::Atomic))
}

pub(crate) fn get_value(ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment> {
    let code = format!("invent.datastore[{}]", quote(&ctx.field_str("key")));
    Ok(Fragment::expression(code, Precedence::Member))
}

pub(crate) fn set_value(ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment> {
    let key = key_or_empty(ctx.value("key", Precedence::None)?);
    let value = or_default(ctx.value("value", Precedence::None)?, "None");
    Ok(Fragment::statement(format!("invent.datastore[{}] = {}\n", key, value)))
}

pub(crate) fn change_value_by(ctx: &mut BlockContext<'_, '_>) -> GenerateResult<Fragment> {
    let key = key_or_empty(ctx.value("key", Precedence::None)?);
    let value = or_default(ctx.value("value", Precedence::Additive)?, "0");
    Ok(Fragment::statement(format!(
        "invent.datastore[{key}] = invent.datastore[{key}] + {value}\n"
    )))
}

fn key_or_empty(code: String) -> String {
    if code.is_empty() { quote("") } else { code }
}

fn or_default(code: String, default: &str) -> String {
    if code.is_empty() { default.to_string() } else { code }
}
