//! Built-in Block Registration
//!
//! Registers the shapes and generation rules of every palette category.
//! Categories are registered in a fixed order; a category that redeclares a
//! block type (logic's `loops_repeat`, for example) replaces the earlier one.

mod ai;
mod channels;
mod common;
mod components;
mod data;
mod datastore;
mod functions;
mod logic;
mod loops;
mod media;
mod pages;
mod speech;
mod widgets;

pub use ai::register_ai_blocks;
pub use channels::register_channel_blocks;
pub use common::register_common_blocks;
pub use components::register_component_blocks;
pub use data::register_data_blocks;
pub use datastore::register_datastore_blocks;
pub use functions::register_function_blocks;
pub use logic::register_logic_blocks;
pub use loops::register_loop_blocks;
pub use media::register_media_blocks;
pub use pages::register_page_blocks;
pub use speech::register_speech_blocks;
pub use widgets::register_widget_blocks;

use crate::GeneratorContext;

/// Register all built-in block categories
pub fn register_builtin_blocks(context: &mut GeneratorContext) {
    register_common_blocks(context);
    register_data_blocks(context);
    register_datastore_blocks(context);
    register_widget_blocks(context);
    register_component_blocks(context);
    register_page_blocks(context);
    register_media_blocks(context);
    register_speech_blocks(context);
    register_ai_blocks(context);
    register_channel_blocks(context);
    register_logic_blocks(context);
    register_loop_blocks(context);
    register_function_blocks(context);

    tracing::info!("Registered {} built-in block types", context.blocks().len());
}

#[cfg(test)]
pub(crate) mod test_support {
    use block_types::{BlockDocument, BlockInstance};

    use crate::{GeneratedCode, GeneratorConfig, GeneratorContext};

    /// Built-in context with a fixed identifier seed
    pub fn context() -> GeneratorContext {
        GeneratorContext::builtin().with_config(GeneratorConfig::default().with_seed(Some(11)))
    }

    /// Document whose single root is the first block given
    pub fn document(blocks: Vec<BlockInstance>) -> BlockDocument {
        let mut doc = BlockDocument::new();
        if let Some(first) = blocks.first() {
            doc.add_root(&first.id);
        }
        for block in blocks {
            doc.add_block(block);
        }
        doc
    }

    pub fn generate(blocks: Vec<BlockInstance>) -> GeneratedCode {
        context().generate(&document(blocks)).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use block_types::{BlockInstance, deserialize, serialize};

    use super::test_support::{context, document};
    use crate::GenerateError;

    fn program() -> Vec<BlockInstance> {
        vec![
            BlockInstance::with_id("when", "widgets_when")
                .shadow_input("widget", "button")
                .shadow_input("event", "press")
                .statement("function_body", "set"),
            BlockInstance::with_id("button", "widgets_widgets").field("widget", "honk-button").as_shadow(),
            BlockInstance::with_id("press", "widgets_events").field("event", "press").as_shadow(),
            BlockInstance::with_id("set", "data_change_value_by")
                .shadow_input("key", "key")
                .input("value", "one")
                .then("sum"),
            BlockInstance::with_id("key", "data_values").field("key", "honks").as_shadow(),
            BlockInstance::with_id("one", "inline_number").field("value", 1),
            BlockInstance::with_id("sum", "say").input("text", "summary"),
            BlockInstance::with_id("summary", "summarize"),
        ]
    }

    #[test]
    fn test_program_across_categories() {
        let code = context().generate(&document(program())).unwrap();
        let helper = &code.declarations[0].name;

        assert_eq!(
            code.main,
            format!(
                concat!(
                    "@invent.when(\"press\", \"honk-button\")\n",
                    "async def when_honk_button_is_press(message):\n",
                    "    invent.datastore[\"honks\"] = invent.datastore[\"honks\"] + 1\n",
                    "    invent.say(await {}())\n",
                ),
                helper
            )
        );
    }

    #[test]
    fn test_round_trip_regenerates_identical_text() {
        let context = context();
        let original = document(program());
        let restored = deserialize(&serialize(&original).unwrap()).unwrap();

        assert!(original.structurally_eq(&restored));
        assert_eq!(context.generate(&original).unwrap(), context.generate(&restored).unwrap());
    }

    #[test]
    fn test_unregistered_type_yields_no_text() {
        let doc = document(vec![
            BlockInstance::with_id("say", "say").then("mystery"),
            BlockInstance::with_id("mystery", "not_a_real_type"),
        ]);

        match context().generate(&doc) {
            Err(GenerateError::UnknownBlockType { block_id, block_type }) => {
                assert_eq!(block_id, "mystery");
                assert_eq!(block_type, "not_a_real_type");
            }
            other => panic!("expected unknown block type, got {:?}", other),
        }
    }
}
