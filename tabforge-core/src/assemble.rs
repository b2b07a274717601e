use std::collections::HashMap;

use log::debug;
use tabforge_base::*;

use crate::config::{InstrumentConfig, TimeSignatureConfig};
use crate::layout;

/// One playable occurrence of a part. The same part definition can appear
/// several times in the structure; each occurrence gets its own number.
pub struct SectionInstance<'a> {
    pub display_name: Option<String>,
    pub description: Option<&'a str>,
    pub tempo_change: Option<u32>,
    pub key_change: Option<&'a str>,
    pub measures: &'a [Measure],
}

/// Expand the structure into numbered section instances, in playing
/// order: Verse, Chorus, Verse becomes Verse 1, Chorus 1, Verse 2.
/// A flat measures array becomes one unnamed section.
pub fn resolve_structure(song: &Song) -> Vec<SectionInstance<'_>> {
    if let (Some(parts), Some(structure)) = (&song.parts, &song.structure) {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut sections = Vec::new();
        for name in structure {
            let part = match parts.get(name) {
                Some(part) => part,
                None => continue, // rejected during validation
            };
            let n = counts.entry(name.as_str()).or_insert(0);
            *n += 1;
            sections.push(SectionInstance {
                display_name: Some(format!("{} {}", name, n)),
                description: part.description.as_deref(),
                tempo_change: part.tempo_change,
                key_change: part.key_change.as_deref(),
                measures: &part.measures,
            });
        }
        sections
    } else if let Some(measures) = &song.measures {
        vec![SectionInstance {
            display_name: None,
            description: None,
            tempo_change: None,
            key_change: None,
            measures,
        }]
    } else {
        Vec::new()
    }
}

fn push_header(song: &Song, ts_key: &str, out: &mut Vec<String>) {
    out.push(format!("# {}", song.title));
    if let Some(artist) = &song.artist {
        out.push(format!("**Artist:** {}", artist));
    }
    if let Some(description) = &song.description {
        out.push(format!("*{}*", description));
    }

    let mut info = vec![format!("**Time Signature:** {}", ts_key)];
    if let Some(tempo) = song.tempo {
        info.push(format!("**Tempo:** {} BPM", tempo));
    }
    if let Some(key) = &song.key {
        info.push(format!("**Key:** {}", key));
    }
    if let Some(capo) = song.capo {
        info.push(format!("**Capo:** {}", capo));
    }
    out.push(info.join(" | "));

    if let Some(structure) = &song.structure {
        out.push(String::new());
        out.push(format!("**Song Structure:** {}", structure.join(" → ")));
    }
    if let Some(parts) = &song.parts {
        out.push(String::new());
        out.push("**Parts Defined:**".to_owned());
        for (name, part) in parts.iter() {
            let count = part.measures.len();
            let noun = if count == 1 { "measure" } else { "measures" };
            match &part.description {
                Some(d) => out.push(format!("- **{}**: {} {} - {}", name, count, noun, d)),
                None => out.push(format!("- **{}**: {} {}", name, count, noun)),
            }
        }
    }
}

/// Render a validated song to its full tab document. Callers resolve the
/// time signature and instrument first; a song that passed validation
/// always has both.
pub fn render_song(song: &Song, ts: &TimeSignatureConfig, inst: &InstrumentConfig) -> String {
    let mut out = Vec::new();
    push_header(song, &song.time_signature, &mut out);

    let sections = resolve_structure(song);
    debug!("rendering {} section(s)", sections.len());
    for section in &sections {
        out.push(String::new());
        if let Some(name) = &section.display_name {
            out.push(format!("## {}", name));
            if let Some(description) = section.description {
                out.push(format!("*{}*", description));
            }
            if let Some(tempo) = section.tempo_change {
                if song.tempo != Some(tempo) {
                    out.push(format!("**Tempo:** {} BPM", tempo));
                }
            }
            if let Some(key) = section.key_change {
                if song.key.as_deref() != Some(key) {
                    out.push(format!("**Key:** {}", key));
                }
            }
            out.push(String::new());
        }
        out.extend(layout::render_measures(
            section.measures,
            ts,
            inst,
            song.tuning.as_deref(),
        ));
    }
    out.push(String::new());
    out.join("\n")
}
