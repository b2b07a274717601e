pub mod assemble;
pub mod config;
pub mod error;
pub mod files;
pub mod layout;
pub mod validate;

use tabforge_base::{Song, TabError, TabWarning};

/// A finished tab plus the non-fatal findings collected on the way.
#[derive(Debug)]
pub struct RenderOutput {
    pub text: String,
    pub warnings: Vec<TabWarning>,
}

/// Check a song without rendering it.
pub fn validate(song: &Song) -> Result<Vec<TabWarning>, Vec<TabError>> {
    validate::validate_song(song)
}

/// Validate, then render. A song that fails validation never reaches the
/// layout engine, so rendering can assume every beat, string and fret is
/// in range.
pub fn render(song: &Song) -> Result<RenderOutput, Vec<TabError>> {
    let warnings = validate::validate_song(song)?;
    let (ts, inst) = validate::resolve_configs(song)?;
    let text = assemble::render_song(song, ts, inst);
    Ok(RenderOutput { text, warnings })
}
