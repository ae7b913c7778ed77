// Media blocks - Playing sounds from the app's media folder
//
// Sound files resolve through the runtime's media path object, so
// `honk.mp3` becomes `invent.media.sounds.honk.mp3`.

use block_types::{BlockDef, FieldDef, InputDef, ShadowDef};

use crate::{Fragment, GeneratorContext, Precedence, unquote};

const MEDIA_COLOUR: &str = "#ca65cc";

const SOUNDS: &[(&str, &str)] = &[("honk.mp3", "honk.mp3"), ("oink.mp3", "oink.mp3")];

pub fn register_media_blocks(context: &mut GeneratorContext) {
    context.register(
        BlockDef::expression("media_sound_files", "Media")
            .colour(MEDIA_COLOUR)
            .field(FieldDef::dropdown("file", SOUNDS)),
        |ctx| Ok(Fragment::expression(ctx.field_str("file"), Precedence::Atomic)),
    );

    context.register(
        BlockDef::statement("media_play_sound", "Media")
            .colour(MEDIA_COLOUR)
            .input(InputDef::value("file").with_shadow(ShadowDef::new("media_sound_files"))),
        |ctx| {
            let file = ctx.value("file", Precedence::Atomic)?;
            Ok(Fragment::statement(play_sound(unquote(&file))))
        },
    );

    // Single-block form from before sounds became a separate value block
    context.register(
        BlockDef::statement("play_sound", "Media")
            .colour(MEDIA_COLOUR)
            .field(FieldDef::dropdown("sounds", SOUNDS)),
        |ctx| Ok(Fragment::statement(play_sound(&ctx.field_str("sounds")))),
    );
}

fn play_sound(file: &str) -> String {
    format!("invent.play_sound(invent.media.sounds.{})\n", file)
}
