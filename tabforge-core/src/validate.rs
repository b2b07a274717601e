use std::collections::HashMap;

use log::debug;
use tabforge_base::*;

use crate::config::{self, InstrumentConfig, TimeSignatureConfig};

/// Run every check against a song. Structural problems (unknown
/// time signature or instrument, malformed shape, unresolvable part
/// references) fail fast; everything after that is collected so one pass
/// reports as many field-level errors as possible, in document order.
pub fn validate_song(song: &Song) -> Result<Vec<TabWarning>, Vec<TabError>> {
    let (ts, inst) = resolve_configs(song)?;
    validate_shape(song)?;

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if let Some(tuning) = &song.tuning {
        if tuning.len() != inst.strings {
            errors.push(
                TabError::new(
                    ErrorKind::TuningMismatch,
                    format!(
                        "Custom tuning has {} strings, expected {} for {}",
                        tuning.len(),
                        inst.strings,
                        inst.name
                    ),
                )
                .suggest(format!(
                    "Provide exactly {} pitch names, string 1 first",
                    inst.strings
                )),
            );
        }
    }

    if let Some(parts) = &song.parts {
        for (name, part) in parts.iter() {
            debug!("validating part '{}'", name);
            for (idx, measure) in part.measures.iter().enumerate() {
                let cx = MeasureCx {
                    part: Some(name),
                    index: idx + 1,
                    ts,
                    ts_key: &song.time_signature,
                    inst,
                };
                validate_measure(measure, &cx, &mut errors, &mut warnings);
            }
        }
    } else if let Some(measures) = &song.measures {
        for (idx, measure) in measures.iter().enumerate() {
            let cx = MeasureCx {
                part: None,
                index: idx + 1,
                ts,
                ts_key: &song.time_signature,
                inst,
            };
            validate_measure(measure, &cx, &mut errors, &mut warnings);
        }
    }

    if errors.is_empty() {
        debug!("validation passed with {} warnings", warnings.len());
        Ok(warnings)
    } else {
        debug!("validation failed with {} errors", errors.len());
        Err(errors)
    }
}

/// Look up the static configs a song names. Both lookups have to succeed
/// before any per-measure check can run.
pub(crate) fn resolve_configs(
    song: &Song,
) -> Result<(&'static TimeSignatureConfig, &'static InstrumentConfig), Vec<TabError>> {
    let ts = config::time_signature(&song.time_signature).ok_or_else(|| {
        vec![
            TabError::new(
                ErrorKind::ValidationError,
                format!("Unsupported time signature: {}", song.time_signature),
            )
            .suggest(format!(
                "Use supported time signatures: {}",
                config::supported_time_signatures().join(", ")
            )),
        ]
    })?;
    let inst = config::instrument(&song.instrument).ok_or_else(|| {
        vec![
            TabError::new(
                ErrorKind::ValidationError,
                format!("Invalid instrument: {}", song.instrument),
            )
            .suggest(format!(
                "Supported instruments: {}",
                config::supported_instruments().join(", ")
            )),
        ]
    })?;
    Ok((ts, inst))
}

/// Shape checks that make further field-level validation meaningless.
fn validate_shape(song: &Song) -> Result<(), Vec<TabError>> {
    let structural = |msg: &str, suggestion: &str| {
        vec![TabError::new(ErrorKind::ValidationError, msg).suggest(suggestion)]
    };

    match (&song.measures, &song.parts, &song.structure) {
        (Some(_), Some(_), _) => {
            return Err(structural(
                "'measures' and 'parts' are mutually exclusive",
                "Use the flat 'measures' array or 'parts' with 'structure', not both",
            ))
        }
        (Some(_), None, Some(_)) => {
            return Err(structural(
                "'structure' requires a 'parts' mapping",
                "Define the named parts that 'structure' refers to",
            ))
        }
        (None, None, _) => {
            return Err(structural(
                "Song must define either 'parts' with 'structure' or a 'measures' array",
                "Add \"parts\": {\"Verse\": {\"measures\": [...]}} and \"structure\": [\"Verse\"]",
            ))
        }
        (Some(measures), None, None) => {
            if measures.is_empty() {
                return Err(structural(
                    "Measures must be a non-empty array",
                    "Provide at least one measure with events",
                ));
            }
        }
        (None, Some(parts), structure) => {
            if parts.is_empty() {
                return Err(structural(
                    "Parts must be a non-empty object",
                    "Provide at least one part definition like: \"parts\": {\"Verse\": {\"measures\": [...]}}",
                ));
            }
            let structure = match structure {
                Some(s) if !s.is_empty() => s,
                _ => {
                    return Err(structural(
                        "Structure must be a non-empty array",
                        "Provide a structure array like: \"structure\": [\"Verse\", \"Chorus\"]",
                    ))
                }
            };
            for (name, part) in parts.iter() {
                if part.measures.is_empty() {
                    return Err(structural(
                        &format!("Part '{}' has an empty measures array", name),
                        "Each part must have at least one measure",
                    ));
                }
            }
            for name in structure {
                if !parts.contains(name) {
                    let available: Vec<&str> =
                        parts.iter().map(|(n, _)| n.as_str()).collect();
                    return Err(vec![
                        TabError::new(
                            ErrorKind::UnknownPart,
                            format!("Structure references undefined part '{}'", name),
                        )
                        .suggest(format!(
                            "Available parts: {}. Check spelling or add part definition.",
                            available.join(", ")
                        )),
                    ]);
                }
            }
        }
    }
    Ok(())
}

fn beat_suggestion(ts: &TimeSignatureConfig) -> String {
    let list: Vec<String> = ts.beats.iter().map(|b| fmt_beat(*b)).collect();
    format!("Use valid beat values: {}", list.join(", "))
}

struct MeasureCx<'a> {
    part: Option<&'a str>,
    index: usize,
    ts: &'a TimeSignatureConfig,
    // signature literal as the document writes it ("4/4")
    ts_key: &'a str,
    inst: &'a InstrumentConfig,
}

impl MeasureCx<'_> {
    fn err(&self, kind: ErrorKind, message: String) -> TabError {
        TabError::new(kind, message)
            .in_part(self.part)
            .at_measure(self.index)
    }
    fn warn(&self, message: String) -> TabWarning {
        TabWarning::formatting(message).at_measure(self.index)
    }
}

fn validate_measure(
    measure: &Measure,
    cx: &MeasureCx,
    errors: &mut Vec<TabError>,
    warnings: &mut Vec<TabWarning>,
) {
    if let Some(pattern) = &measure.strum_pattern {
        if pattern.len() != cx.ts.strum_slots() {
            errors.push(
                cx.err(
                    ErrorKind::StrumPatternLengthMismatch,
                    format!(
                        "Strum pattern has {} positions, expected {} for {}",
                        pattern.len(),
                        cx.ts.strum_slots(),
                        cx.ts_key
                    ),
                )
                .suggest(format!(
                    "Use exactly {} elements for {}",
                    cx.ts.strum_slots(),
                    cx.ts_key
                )),
            );
        }
        for (i, stroke) in pattern.iter().enumerate() {
            if !matches!(stroke.as_str(), "" | "D" | "U") {
                errors.push(
                    cx.err(
                        ErrorKind::ValidationError,
                        format!("Invalid strum direction '{}' at position {}", stroke, i),
                    )
                    .suggest("Use 'D' for down, 'U' for up, or '' for no strum"),
                );
            }
        }
    }

    // One pitched sound per (string, anchor). Grace notes are checked
    // against this map after every main event has claimed its cell.
    let mut occupied: HashMap<(i32, usize), ()> = HashMap::new();
    let mut grace_notes: Vec<(i32, Beat)> = Vec::new();

    for event in &measure.events {
        validate_event(event, cx, &mut occupied, &mut grace_notes, errors, warnings);
    }

    for (string, beat) in grace_notes {
        let slot = match cx.ts.slot_of(beat) {
            Some(slot) => slot,
            None => continue, // already reported as an invalid beat
        };
        if !occupied.contains_key(&(string, slot)) {
            errors.push(
                cx.err(
                    ErrorKind::OrphanGraceNote,
                    format!(
                        "Grace note on string {} has no target note at beat {}",
                        string,
                        fmt_beat(beat)
                    ),
                )
                .at_beat(beat)
                .suggest("Grace notes must lead into a main note at the same beat and string"),
            );
        }
    }
}

fn validate_event(
    event: &Event,
    cx: &MeasureCx,
    occupied: &mut HashMap<(i32, usize), ()>,
    grace_notes: &mut Vec<(i32, Beat)>,
    errors: &mut Vec<TabError>,
    warnings: &mut Vec<TabWarning>,
) {
    let beat = event.beat();
    let slot = cx.ts.slot_of(beat);
    if slot.is_none() {
        errors.push(
            cx.err(
                ErrorKind::ValidationError,
                format!(
                    "Beat {} invalid for {} time signature",
                    fmt_beat(beat),
                    cx.ts_key
                ),
            )
            .at_beat(beat)
            .suggest(beat_suggestion(cx.ts)),
        );
    }

    let mut claim = |string: i32, errors: &mut Vec<TabError>| {
        if let Some(slot) = slot {
            if cx.inst.valid_string(string) && occupied.insert((string, slot), ()).is_some() {
                errors.push(
                    cx.err(
                        ErrorKind::NoteConflict,
                        format!(
                            "Multiple events on string {} at beat {}",
                            string,
                            fmt_beat(beat)
                        ),
                    )
                    .at_beat(beat)
                    .suggest("Move one event to a different beat or different string"),
                );
            }
        }
    };

    match event {
        Event::Note { string, fret, emphasis, .. } => {
            check_string(*string, beat, cx, errors);
            check_fret(fret, beat, cx, errors, warnings);
            check_emphasis(emphasis, beat, cx, errors);
            claim(*string, errors);
        }
        Event::Chord { frets, emphasis, .. } => {
            if frets.is_empty() {
                errors.push(
                    cx.err(
                        ErrorKind::ValidationError,
                        "Chord must have at least one fret".to_owned(),
                    )
                    .at_beat(beat)
                    .suggest("Add a 'frets' array with string/fret entries"),
                );
            }
            let mut seen: Vec<i32> = Vec::new();
            for entry in frets {
                check_string(entry.string, beat, cx, errors);
                check_fret(&entry.fret, beat, cx, errors, warnings);
                if seen.contains(&entry.string) {
                    errors.push(
                        cx.err(
                            ErrorKind::NoteConflict,
                            format!("Chord has duplicate entries for string {}", entry.string),
                        )
                        .at_beat(beat)
                        .suggest("Each string can only appear once per chord"),
                    );
                } else {
                    seen.push(entry.string);
                    claim(entry.string, errors);
                }
            }
            check_emphasis(emphasis, beat, cx, errors);
        }
        Event::HammerOn { string, from_fret, to_fret, emphasis, .. } => {
            check_string(*string, beat, cx, errors);
            check_fret_number(*from_fret, beat, cx, errors, warnings);
            check_fret_number(*to_fret, beat, cx, errors, warnings);
            if to_fret <= from_fret {
                errors.push(
                    cx.err(
                        ErrorKind::TechniqueDirectionError,
                        format!(
                            "Hammer-on fromFret ({}) must be lower than toFret ({})",
                            from_fret, to_fret
                        ),
                    )
                    .at_beat(beat)
                    .suggest("Hammer-ons go to higher frets - check fromFret and toFret values"),
                );
            }
            check_emphasis(emphasis, beat, cx, errors);
            claim(*string, errors);
        }
        Event::PullOff { string, from_fret, to_fret, emphasis, .. } => {
            check_string(*string, beat, cx, errors);
            check_fret_number(*from_fret, beat, cx, errors, warnings);
            check_fret_number(*to_fret, beat, cx, errors, warnings);
            if to_fret >= from_fret {
                errors.push(
                    cx.err(
                        ErrorKind::TechniqueDirectionError,
                        format!(
                            "Pull-off fromFret ({}) must be higher than toFret ({})",
                            from_fret, to_fret
                        ),
                    )
                    .at_beat(beat)
                    .suggest("Pull-offs go to lower frets - check fromFret and toFret values"),
                );
            }
            check_emphasis(emphasis, beat, cx, errors);
            claim(*string, errors);
        }
        Event::Slide { string, from_fret, to_fret, direction, emphasis, .. } => {
            check_string(*string, beat, cx, errors);
            check_fret_number(*from_fret, beat, cx, errors, warnings);
            check_fret_number(*to_fret, beat, cx, errors, warnings);
            let agrees = match direction {
                SlideDirection::Up => to_fret > from_fret,
                SlideDirection::Down => to_fret < from_fret,
            };
            if !agrees {
                errors.push(
                    cx.err(
                        ErrorKind::TechniqueDirectionError,
                        format!(
                            "Slide direction '{}' does not match fret movement ({} -> {})",
                            direction, from_fret, to_fret
                        ),
                    )
                    .at_beat(beat)
                    .suggest("Use 'up' when toFret is higher than fromFret, 'down' when lower"),
                );
            }
            check_emphasis(emphasis, beat, cx, errors);
            claim(*string, errors);
        }
        Event::Bend { string, fret, semitones, emphasis, .. } => {
            check_string(*string, beat, cx, errors);
            check_fret_number(*fret, beat, cx, errors, warnings);
            if *semitones < MIN_SEMITONES || *semitones > MAX_SEMITONES {
                errors.push(
                    cx.err(
                        ErrorKind::ValidationError,
                        format!("Invalid semitones value: {}", semitones),
                    )
                    .at_beat(beat)
                    .suggest(format!(
                        "Use a bend amount between {} and {} semitones",
                        MIN_SEMITONES, MAX_SEMITONES
                    )),
                );
            }
            check_emphasis(emphasis, beat, cx, errors);
            claim(*string, errors);
        }
        Event::GraceNote { string, fret, grace_fret, .. } => {
            check_string(*string, beat, cx, errors);
            check_fret(fret, beat, cx, errors, warnings);
            check_fret(grace_fret, beat, cx, errors, warnings);
            if slot.is_some() && beat >= cx.ts.max_beat() {
                errors.push(
                    cx.err(
                        ErrorKind::ValidationError,
                        format!("Grace note has invalid timing at beat {}", fmt_beat(beat)),
                    )
                    .at_beat(beat)
                    .suggest(format!(
                        "Grace notes should be placed before beat {}",
                        fmt_beat(cx.ts.max_beat())
                    )),
                );
            }
            grace_notes.push((*string, beat));
        }
        Event::PalmMute { duration, .. } => {
            if *duration <= 0.0 {
                errors.push(
                    cx.err(
                        ErrorKind::ValidationError,
                        format!("Palm mute duration must be positive, got {}", duration),
                    )
                    .at_beat(beat),
                );
            } else if beat + duration > cx.ts.beat_span_end() {
                warnings.push(
                    cx.warn(format!(
                        "Palm mute at beat {} extends past the end of the measure",
                        fmt_beat(beat)
                    ))
                    .at_beat(beat)
                    .suggest("The span clamps to the final beat of the measure at render time"),
                );
            }
        }
        Event::Chuck { .. } => {}
    }
}

fn check_string(string: i32, beat: Beat, cx: &MeasureCx, errors: &mut Vec<TabError>) {
    if !cx.inst.valid_string(string) {
        errors.push(
            cx.err(
                ErrorKind::StringOutOfRange,
                format!("Invalid string number: {}", string),
            )
            .at_beat(beat)
            .suggest(format!(
                "Use strings 1-{} for {}",
                cx.inst.strings, cx.inst.name
            )),
        );
    }
}

fn check_fret_number(
    fret: i32,
    beat: Beat,
    cx: &MeasureCx,
    errors: &mut Vec<TabError>,
    warnings: &mut Vec<TabWarning>,
) {
    if fret < 0 || fret > cx.inst.max_fret {
        errors.push(
            cx.err(
                ErrorKind::ValidationError,
                format!("Invalid fret number: {}", fret),
            )
            .at_beat(beat)
            .suggest(format!(
                "Fret numbers must be 0-{} or 'x' for muted strings",
                cx.inst.max_fret
            )),
        );
    } else if fret >= 10 {
        warnings.push(
            cx.warn(format!("Multi-digit fret ({}) may affect column alignment", fret))
                .at_beat(beat)
                .suggest(format!("Fret {} widens its beat column to 2 characters", fret)),
        );
    }
}

fn check_fret(
    fret: &Fret,
    beat: Beat,
    cx: &MeasureCx,
    errors: &mut Vec<TabError>,
    warnings: &mut Vec<TabWarning>,
) {
    match fret {
        Fret::Number(n) => check_fret_number(*n, beat, cx, errors, warnings),
        Fret::Mark(mark) => {
            if !fret.is_muted() {
                errors.push(
                    cx.err(
                        ErrorKind::ValidationError,
                        format!("Invalid fret value: '{}'", mark),
                    )
                    .at_beat(beat)
                    .suggest(format!(
                        "Fret must be a number (0-{}) or 'x' for muted strings",
                        cx.inst.max_fret
                    )),
                );
            }
        }
    }
}

fn check_emphasis(
    emphasis: &Option<String>,
    beat: Beat,
    cx: &MeasureCx,
    errors: &mut Vec<TabError>,
) {
    if let Some(emphasis) = emphasis {
        if !config::is_valid_emphasis(emphasis) {
            errors.push(
                cx.err(
                    ErrorKind::ValidationError,
                    format!("Invalid emphasis value '{}'", emphasis),
                )
                .at_beat(beat)
                .suggest("Use dynamics (pp, p, mp, mf, f, ff) or marks (>, -, ., <, dim., cresc.)"),
            );
        }
    }
}
