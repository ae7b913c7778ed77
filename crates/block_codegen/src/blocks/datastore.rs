// Datastore blocks - Older names for the data blocks, kept so saved projects
// that still use them generate the same code.

use block_types::{BlockDef, FieldDef, InputDef, ShadowDef};

use super::data::{DATA_COLOUR, NO_DATA_VALUES, change_value_by, datastore_key, get_value, set_value};
use crate::GeneratorContext;

pub fn register_datastore_blocks(context: &mut GeneratorContext) {
    context.register(
        BlockDef::expression("datastore_values", "Datastore")
            .colour(DATA_COLOUR)
            .field(FieldDef::dropdown("key", NO_DATA_VALUES)),
        datastore_key,
    );

    context.register(
        BlockDef::expression("get_datastore_value", "Datastore")
            .colour(DATA_COLOUR)
            .field(FieldDef::dropdown("key", NO_DATA_VALUES)),
        get_value,
    );

    context.register(
        BlockDef::statement("set_datastore", "Datastore")
            .colour(DATA_COLOUR)
            .input(InputDef::value("key").with_shadow(ShadowDef::new("datastore_values")))
            .input(InputDef::value("value")),
        set_value,
    );

    context.register(
        BlockDef::statement("change_datastore_value_by", "Datastore")
            .colour(DATA_COLOUR)
            .input(InputDef::value("key").with_shadow(ShadowDef::new("datastore_values")))
            .input(InputDef::value("value")),
        change_value_by,
    );
}

#[cfg(test)]
mod tests {
    use block_types::BlockInstance;

    use crate::blocks::test_support::generate;

    #[test]
    fn test_legacy_names_match_data_blocks() {
        let legacy = generate(vec![
            BlockInstance::with_id("set", "set_datastore").input("key", "k").input("value", "v"),
            BlockInstance::with_id("k", "datastore_values").field("key", "clicks"),
            BlockInstance::with_id("v", "get_datastore_value").field("key", "other"),
        ]);
        let current = generate(vec![
            BlockInstance::with_id("set", "data_set_value").input("key", "k").input("value", "v"),
            BlockInstance::with_id("k", "data_values").field("key", "clicks"),
            BlockInstance::with_id("v", "data_get_value").field("key", "other"),
        ]);

        assert_eq!(legacy.main, current.main);
        assert_eq!(legacy.main, "invent.datastore[\"clicks\"] = invent.datastore[\"other\"]\n");
    }
}
