use tabforge_base::*;

use crate::config::{InstrumentConfig, TimeSignatureConfig};

pub const MEASURES_PER_SYSTEM: usize = 4;

const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];
const SUBSCRIPT_DIGITS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];

fn map_digits(s: &str, table: &[char; 10]) -> String {
    s.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => table[d as usize],
            None => c,
        })
        .collect()
}

/// Bend amounts print as fraction glyphs: 0.5 -> "½", 1.5 -> "1½".
/// Amounts that are not quarter multiples print as plain decimals.
pub(crate) fn semitone_label(semitones: f64) -> String {
    let whole = semitones.trunc() as i64;
    let frac = semitones - whole as f64;
    let glyph = if (frac - 0.25).abs() < 1e-6 {
        Some("¼")
    } else if (frac - 0.5).abs() < 1e-6 {
        Some("½")
    } else if (frac - 0.75).abs() < 1e-6 {
        Some("¾")
    } else if frac.abs() < 1e-6 {
        Some("")
    } else {
        None
    };
    match glyph {
        Some(glyph) if whole == 0 && !glyph.is_empty() => glyph.to_owned(),
        Some(glyph) => format!("{}{}", whole, glyph),
        None => format!("{}", semitones),
    }
}

fn vibrato_mark(token: &mut String, vibrato: bool) {
    if vibrato {
        token.push('~');
    }
}

/// Everything one measure places on the tab, bucketed per beat anchor.
/// Cells hold finished tokens; the empty string means "nothing here".
struct MeasureGrid {
    chords: Vec<String>,
    dynamics: Vec<String>,
    annotations: Vec<String>,
    strings: Vec<Vec<String>>,
    strum: Vec<String>,
    // palm-mute continuations: (start slot, token length, last covered slot)
    spans: Vec<(usize, usize, usize)>,
    // grace glyphs land after the main pass, so they replace the target
    // token no matter which of the two events the document lists first
    graces: Vec<(i32, usize, String)>,
}

impl MeasureGrid {
    fn new(slots: usize, string_count: usize) -> Self {
        MeasureGrid {
            chords: vec![String::new(); slots],
            dynamics: vec![String::new(); slots],
            annotations: vec![String::new(); slots],
            strings: vec![vec![String::new(); slots]; string_count],
            strum: vec![String::new(); slots],
            spans: Vec::new(),
            graces: Vec::new(),
        }
    }

    fn set_string(&mut self, string: i32, slot: usize, token: String) {
        if string >= 1 && (string as usize) <= self.strings.len() {
            self.strings[string as usize - 1][slot] = token;
        }
    }

    // Overlay rows keep the first writer; later arrivals at the same
    // anchor would otherwise overprint each other.
    fn set_overlay(row: &mut [String], slot: usize, token: String) {
        if row[slot].is_empty() {
            row[slot] = token;
        }
    }
}

fn build_grid(measure: &Measure, ts: &TimeSignatureConfig, inst: &InstrumentConfig) -> MeasureGrid {
    let mut grid = MeasureGrid::new(ts.strum_slots(), inst.strings);

    if let Some(pattern) = &measure.strum_pattern {
        for (slot, stroke) in pattern.iter().take(ts.strum_slots()).enumerate() {
            grid.strum[slot] = stroke.clone();
        }
    }

    for event in &measure.events {
        let slot = match ts.slot_of(event.beat()) {
            Some(slot) => slot,
            None => continue,
        };
        match event {
            Event::Note { string, fret, vibrato, emphasis, .. } => {
                let mut token = fret.to_string();
                vibrato_mark(&mut token, *vibrato);
                grid.set_string(*string, slot, token);
                place_emphasis(&mut grid, slot, emphasis);
            }
            Event::Chord { name, frets, emphasis, .. } => {
                for entry in frets {
                    grid.set_string(entry.string, slot, entry.fret.to_string());
                }
                if let Some(name) = name {
                    MeasureGrid::set_overlay(&mut grid.chords, slot, name.clone());
                }
                place_emphasis(&mut grid, slot, emphasis);
            }
            Event::HammerOn { string, from_fret, to_fret, vibrato, emphasis, .. } => {
                let mut token = format!("{}h{}", from_fret, to_fret);
                vibrato_mark(&mut token, *vibrato);
                grid.set_string(*string, slot, token);
                place_emphasis(&mut grid, slot, emphasis);
            }
            Event::PullOff { string, from_fret, to_fret, vibrato, emphasis, .. } => {
                let mut token = format!("{}p{}", from_fret, to_fret);
                vibrato_mark(&mut token, *vibrato);
                grid.set_string(*string, slot, token);
                place_emphasis(&mut grid, slot, emphasis);
            }
            Event::Slide { string, from_fret, to_fret, direction, vibrato, emphasis, .. } => {
                let glyph = match direction {
                    SlideDirection::Up => '/',
                    SlideDirection::Down => '\\',
                };
                let mut token = format!("{}{}{}", from_fret, glyph, to_fret);
                vibrato_mark(&mut token, *vibrato);
                grid.set_string(*string, slot, token);
                place_emphasis(&mut grid, slot, emphasis);
            }
            Event::Bend { string, fret, semitones, vibrato, emphasis, .. } => {
                let mut token = format!("{}b{}", fret, semitone_label(*semitones));
                vibrato_mark(&mut token, *vibrato);
                grid.set_string(*string, slot, token);
                place_emphasis(&mut grid, slot, emphasis);
            }
            Event::GraceNote { string, fret, grace_fret, grace_type, .. } => {
                let table = match grace_type {
                    GraceType::Acciaccatura => &SUPERSCRIPT_DIGITS,
                    GraceType::Appoggiatura => &SUBSCRIPT_DIGITS,
                };
                let token = format!("{}{}", map_digits(&grace_fret.to_string(), table), fret);
                grid.graces.push((*string, slot, token));
            }
            Event::PalmMute { beat, duration, intensity, .. } => {
                let code = intensity.unwrap_or(Intensity::Medium).code();
                let token = format!("PM({})", code);
                let token_len = token.chars().count();
                MeasureGrid::set_overlay(&mut grid.annotations, slot, token);
                // dashes run under every anchor the mute still covers,
                // clamped to the end of the measure
                let end = (beat + duration).min(ts.beat_span_end());
                let mut last = slot;
                for (i, b) in ts.beats.iter().enumerate() {
                    if *b < end - 1e-6 {
                        last = i;
                    }
                }
                grid.spans.push((slot, token_len, last));
            }
            Event::Chuck { intensity, .. } => {
                let token = match intensity {
                    Some(i) => format!("X{}", i.code()),
                    None => "X".to_owned(),
                };
                MeasureGrid::set_overlay(&mut grid.annotations, slot, token);
            }
        }
    }

    let graces = std::mem::take(&mut grid.graces);
    for (string, slot, mut token) in graces {
        if string < 1 || string as usize > grid.strings.len() {
            continue;
        }
        let cell = &mut grid.strings[string as usize - 1][slot];
        // keep the target note's vibrato mark on the ornamented token
        if cell.ends_with('~') {
            token.push('~');
        }
        *cell = token;
    }
    grid
}

fn place_emphasis(grid: &mut MeasureGrid, slot: usize, emphasis: &Option<String>) {
    if let Some(emphasis) = emphasis {
        MeasureGrid::set_overlay(&mut grid.dynamics, slot, emphasis.clone());
    }
}

/// One measure rendered to fixed-width row contents. Every string has the
/// same char count, so bars and overlays line up when measures are joined
/// side by side.
pub struct MeasureBlock {
    pub chords: Option<String>,
    pub dynamics: Option<String>,
    pub annotations: Option<String>,
    pub ruler: String,
    pub strings: Vec<String>,
    pub strum: Option<String>,
}

impl MeasureBlock {
    pub fn width(&self) -> usize {
        self.ruler.chars().count()
    }
}

fn cell_width(token: &str) -> usize {
    token.chars().count()
}

fn row_content(cells: &[String], widths: &[usize], fill: char) -> String {
    let mut out = String::new();
    for (cell, w) in cells.iter().zip(widths) {
        out.push(fill);
        out.push_str(cell);
        for _ in cell_width(cell)..*w {
            out.push(fill);
        }
    }
    out.push(fill);
    out
}

pub fn measure_block(
    measure: &Measure,
    ts: &TimeSignatureConfig,
    inst: &InstrumentConfig,
) -> MeasureBlock {
    let grid = build_grid(measure, ts, inst);
    let slots = ts.strum_slots();

    // Pass one: each anchor is as wide as the widest token placed on it,
    // across every row of the measure, and never narrower than one char.
    let mut widths = vec![1usize; slots];
    for slot in 0..slots {
        let mut w = ts.ruler[slot].chars().count();
        for row in [&grid.chords, &grid.dynamics, &grid.annotations, &grid.strum] {
            w = w.max(cell_width(&row[slot]));
        }
        for string in &grid.strings {
            w = w.max(cell_width(&string[slot]));
        }
        widths[slot] = widths[slot].max(w);
    }

    let offset_of = |slot: usize| -> usize {
        1 + widths[..slot].iter().map(|w| w + 1).sum::<usize>()
    };

    let ruler_cells: Vec<String> = ts.ruler.iter().map(|s| (*s).to_owned()).collect();
    let ruler = row_content(&ruler_cells, &widths, ' ');

    let mut annotations = row_content(&grid.annotations, &widths, ' ');
    if !grid.spans.is_empty() {
        let mut chars: Vec<char> = annotations.chars().collect();
        for (slot, token_len, last) in &grid.spans {
            let start = offset_of(*slot) + token_len;
            let end = offset_of(*last) + widths[*last];
            for c in chars.iter_mut().take(end).skip(start) {
                if *c == ' ' {
                    *c = '-';
                }
            }
        }
        annotations = chars.into_iter().collect();
    }

    let present = |row: &str| -> Option<String> {
        if row.chars().all(|c| c == ' ') {
            None
        } else {
            Some(row.to_owned())
        }
    };

    MeasureBlock {
        chords: present(&row_content(&grid.chords, &widths, ' ')),
        dynamics: present(&row_content(&grid.dynamics, &widths, ' ')),
        annotations: present(&annotations),
        ruler,
        strings: grid
            .strings
            .iter()
            .map(|cells| row_content(cells, &widths, '-'))
            .collect(),
        strum: present(&row_content(&grid.strum, &widths, ' ')),
    }
}

/// String labels in top-to-bottom order, padded to a common width.
pub fn string_labels(inst: &InstrumentConfig, tuning: Option<&[String]>) -> Vec<String> {
    let names: Vec<&str> = match tuning {
        Some(t) if t.len() == inst.strings => t.iter().map(|s| s.as_str()).collect(),
        _ => inst.tuning.to_vec(),
    };
    let w = names
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(1)
        .max(2);
    names.iter().map(|n| format!("{:<1$}", n, w)).collect()
}

/// Lay a run of measures out as systems of up to four, one line group per
/// system, blank line between systems.
pub fn render_measures(
    measures: &[Measure],
    ts: &TimeSignatureConfig,
    inst: &InstrumentConfig,
    tuning: Option<&[String]>,
) -> Vec<String> {
    let labels = string_labels(inst, tuning);
    let label_w = labels.first().map(|l| l.chars().count()).unwrap_or(2);
    let blocks: Vec<MeasureBlock> = measures
        .iter()
        .map(|m| measure_block(m, ts, inst))
        .collect();

    let mut lines = Vec::new();
    for (i, system) in blocks.chunks(MEASURES_PER_SYSTEM).enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        let overlay = |select: fn(&MeasureBlock) -> Option<&String>| -> Option<String> {
            if system.iter().all(|b| select(b).is_none()) {
                return None;
            }
            let mut line = " ".repeat(label_w + 1);
            for block in system {
                match select(block) {
                    Some(content) => line.push_str(content),
                    None => line.push_str(&" ".repeat(block.width())),
                }
                line.push(' ');
            }
            Some(line)
        };

        if let Some(line) = overlay(|b| b.chords.as_ref()) {
            lines.push(line);
        }
        if let Some(line) = overlay(|b| b.dynamics.as_ref()) {
            lines.push(line);
        }
        if let Some(line) = overlay(|b| b.annotations.as_ref()) {
            lines.push(line);
        }

        let mut ruler_line = " ".repeat(label_w + 1);
        for block in system {
            ruler_line.push_str(&block.ruler);
            ruler_line.push(' ');
        }
        lines.push(ruler_line);

        for (s, label) in labels.iter().enumerate() {
            let mut line = label.clone();
            line.push('|');
            for block in system {
                line.push_str(&block.strings[s]);
                line.push('|');
            }
            lines.push(line);
        }

        if let Some(line) = overlay(|b| b.strum.as_ref()) {
            lines.push(line);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    fn measure(events: &str) -> Measure {
        serde_json::from_str(&format!(r#"{{"events":[{}]}}"#, events)).unwrap()
    }

    fn guitar_44(events: &str) -> Vec<String> {
        let m = measure(events);
        render_measures(
            &[m],
            config::time_signature("4/4").unwrap(),
            config::instrument("guitar").unwrap(),
            None,
        )
    }

    #[test]
    fn single_notes_line_up_under_the_ruler() {
        let lines = guitar_44(
            r#"{"type":"note","string":1,"beat":1.0,"fret":3},
               {"type":"note","string":2,"beat":2.0,"fret":5,"vibrato":true}"#,
        );
        assert_eq!(lines[0], "    1 & 2  & 3 & 4 &  ");
        assert_eq!(lines[1], "e |-3----------------|");
        assert_eq!(lines[2], "B |-----5~-----------|");
        assert_eq!(lines[3], "G |------------------|");
        assert_eq!(lines.len(), 7);
        // ruler and string rows share one length
        let len = lines[0].chars().count();
        for line in &lines {
            assert_eq!(line.chars().count(), len);
        }
    }

    #[test]
    fn multi_digit_fret_widens_its_column_everywhere() {
        let lines = guitar_44(
            r#"{"type":"note","string":1,"beat":1.0,"fret":12},
               {"type":"note","string":2,"beat":1.0,"fret":3}"#,
        );
        assert_eq!(lines[1], "e |-12---------------|");
        assert_eq!(lines[2], "B |-3----------------|");
        let len = lines[1].chars().count();
        for line in &lines[1..] {
            assert_eq!(line.chars().count(), len);
        }
    }

    #[test]
    fn technique_tokens() {
        let lines = guitar_44(
            r#"{"type":"hammerOn","string":3,"startBeat":1.0,"fromFret":3,"toFret":5},
               {"type":"pullOff","string":4,"startBeat":2.0,"fromFret":7,"toFret":5},
               {"type":"slide","string":5,"startBeat":3.0,"fromFret":3,"toFret":7,"direction":"up"},
               {"type":"slide","string":6,"startBeat":4.0,"fromFret":7,"toFret":3,"direction":"down"}"#,
        );
        assert!(lines[3].contains("3h5"));
        assert!(lines[4].contains("7p5"));
        assert!(lines[5].contains("3/7"));
        assert!(lines[6].contains("7\\3"));
    }

    #[test]
    fn bend_fraction_glyphs() {
        assert_eq!(semitone_label(0.25), "¼");
        assert_eq!(semitone_label(0.5), "½");
        assert_eq!(semitone_label(0.75), "¾");
        assert_eq!(semitone_label(1.0), "1");
        assert_eq!(semitone_label(1.5), "1½");
        assert_eq!(semitone_label(2.0), "2");
        let lines = guitar_44(
            r#"{"type":"bend","string":2,"beat":1.0,"fret":7,"semitones":0.5}"#,
        );
        assert!(lines[2].contains("7b½"));
    }

    #[test]
    fn grace_note_glyphs() {
        let lines = guitar_44(
            r#"{"type":"note","string":2,"beat":1.0,"fret":5},
               {"type":"graceNote","string":2,"beat":1.0,"fret":5,"graceFret":3}"#,
        );
        assert!(lines[2].contains("³5"));
        let lines = guitar_44(
            r#"{"type":"note","string":2,"beat":1.0,"fret":5},
               {"type":"graceNote","string":2,"beat":1.0,"fret":5,"graceFret":3,
                "graceType":"appoggiatura"}"#,
        );
        assert!(lines[2].contains("₃5"));
    }

    #[test]
    fn palm_mute_span_dashes() {
        let lines = guitar_44(
            r#"{"type":"palmMute","beat":1.0,"duration":2.0,"intensity":"light"}"#,
        );
        // annotation row sits above the ruler
        assert!(lines[0].contains("PM(L)------"));
        assert!(!lines[0].contains("PM(L)-------"));
    }

    #[test]
    fn palm_mute_clamps_to_measure_end() {
        let long = guitar_44(
            r#"{"type":"palmMute","beat":4.0,"duration":9.0,"intensity":"heavy"}"#,
        );
        let clamped = guitar_44(
            r#"{"type":"palmMute","beat":4.0,"duration":1.5,"intensity":"heavy"}"#,
        );
        assert_eq!(long[0], clamped[0]);
    }

    #[test]
    fn chord_name_and_dynamics_rows() {
        let lines = guitar_44(
            r#"{"type":"chord","beat":1.0,"name":"G","emphasis":"mf","frets":[
                {"string":6,"fret":3},{"string":5,"fret":2},{"string":1,"fret":3}]}"#,
        );
        assert!(lines[0].contains('G'));
        assert!(lines[1].contains("mf"));
        // rows below the overlays: ruler then six strings
        assert_eq!(lines.len(), 2 + 1 + 6);
        assert!(lines[3].starts_with("e |-3"));
        assert!(lines[8].starts_with("E |-3"));
    }

    #[test]
    fn muted_and_open_strings() {
        let lines = guitar_44(
            r#"{"type":"chord","beat":2.0,"frets":[
                {"string":6,"fret":"x"},{"string":5,"fret":0}]}"#,
        );
        assert!(lines[5].contains("-0-"));
        assert!(lines[6].contains("-x-"));
    }

    #[test]
    fn strum_row_below_strings() {
        let m: Measure = serde_json::from_str(
            r#"{"strumPattern":["D","","U","","D","","U",""],"events":[]}"#,
        )
        .unwrap();
        let lines = render_measures(
            &[m],
            config::time_signature("4/4").unwrap(),
            config::instrument("guitar").unwrap(),
            None,
        );
        assert_eq!(lines.len(), 1 + 6 + 1);
        assert_eq!(lines[7], "    D   U   D   U    ");
        assert_eq!(
            lines[7].chars().count(),
            lines[1].chars().count()
        );
    }

    #[test]
    fn five_measures_split_into_two_systems() {
        let ms: Vec<Measure> = (0..5).map(|_| measure("")).collect();
        let lines = render_measures(
            &ms,
            config::time_signature("4/4").unwrap(),
            config::instrument("guitar").unwrap(),
            None,
        );
        // 7 lines per system plus a separating blank
        assert_eq!(lines.len(), 7 + 1 + 7);
        assert_eq!(lines[7], "");
        assert!(lines[8].trim_start().starts_with("1 &"));
    }

    #[test]
    fn custom_tuning_labels() {
        let labels = string_labels(
            config::instrument("guitar").unwrap(),
            Some(&[
                "d".to_owned(),
                "A".to_owned(),
                "F#".to_owned(),
                "D".to_owned(),
                "A".to_owned(),
                "D".to_owned(),
            ]),
        );
        assert_eq!(labels[0], "d ");
        assert_eq!(labels[2], "F#");
    }

    #[test]
    fn measures_in_one_system_share_every_row_length() {
        let m1 = measure(r#"{"type":"note","string":1,"beat":1.0,"fret":12}"#);
        let m2 = measure(r#"{"type":"note","string":6,"beat":4.5,"fret":0}"#);
        let lines = render_measures(
            &[m1, m2],
            config::time_signature("4/4").unwrap(),
            config::instrument("guitar").unwrap(),
            None,
        );
        let len = lines[0].chars().count();
        for line in &lines {
            assert_eq!(line.chars().count(), len);
        }
    }

    #[test]
    fn grace_glyph_survives_event_order() {
        let lines = guitar_44(
            r#"{"type":"graceNote","string":2,"beat":1.0,"fret":5,"graceFret":3},
               {"type":"note","string":2,"beat":1.0,"fret":5}"#,
        );
        assert!(lines[2].contains("³5"));
    }

    #[test]
    fn grace_glyph_keeps_target_vibrato() {
        let lines = guitar_44(
            r#"{"type":"graceNote","string":2,"beat":1.0,"fret":5,"graceFret":3},
               {"type":"note","string":2,"beat":1.0,"fret":5,"vibrato":true}"#,
        );
        assert!(lines[2].contains("³5~"));
    }

    #[test]
    fn every_row_of_a_block_has_the_same_length() {
        let m: Measure = serde_json::from_str(
            r#"{"strumPattern":["D","","U","","D","","U",""],
                "events":[
                 {"type":"chord","beat":1.0,"name":"Am7","emphasis":"mf","frets":[
                  {"string":5,"fret":0},{"string":4,"fret":2}]},
                 {"type":"palmMute","beat":3.0,"duration":1.0},
                 {"type":"note","string":1,"beat":2.0,"fret":12}]}"#,
        )
        .unwrap();
        let lines = render_measures(
            &[m],
            config::time_signature("4/4").unwrap(),
            config::instrument("guitar").unwrap(),
            None,
        );
        // chords, dynamics, annotations, ruler, six strings, strum
        assert_eq!(lines.len(), 11);
        let len = lines[0].chars().count();
        for line in &lines {
            assert_eq!(line.chars().count(), len, "row: {:?}", line);
        }
    }
}
