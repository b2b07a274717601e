
use std::fmt;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub type Beat = f64;

pub const MUTED_MARK: &str = "x";
pub const MIN_SEMITONES: f64 = 0.25;
pub const MAX_SEMITONES: f64 = 3.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_time_signature")]
    pub time_signature: String,
    #[serde(default)]
    pub tempo: Option<u32>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub capo: Option<u8>,
    #[serde(default = "default_instrument")]
    pub instrument: String,
    #[serde(default)]
    pub tuning: Option<Vec<String>>,
    #[serde(default)]
    pub measures: Option<Vec<Measure>>,
    #[serde(default)]
    pub parts: Option<PartMap>,
    #[serde(default)]
    pub structure: Option<Vec<String>>,
}

fn default_time_signature() -> String {
    "4/4".to_owned()
}

fn default_instrument() -> String {
    "guitar".to_owned()
}

//Field names stay snake_case on the wire, unlike the song root
#[derive(Debug, Clone, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tempo_change: Option<u32>,
    #[serde(default)]
    pub key_change: Option<String>,
    pub measures: Vec<Measure>,
}

/// Part definitions in document order. A plain map would lose the order
/// the author wrote the parts in, which drives both the parts summary
/// and the reporting order of validation errors.
#[derive(Debug, Clone, Default)]
pub struct PartMap(pub Vec<(String, Part)>);

impl PartMap {
    pub fn get(&self, name: &str) -> Option<&Part> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, (String, Part)> {
        self.0.iter()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for PartMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PartMapVisitor;
        impl<'de> Visitor<'de> for PartMapVisitor {
            type Value = PartMap;
            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a map of part name to part definition")
            }
            fn visit_map<A>(self, mut access: A) -> Result<PartMap, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some((name, part)) = access.next_entry::<String, Part>()? {
                    entries.push((name, part));
                }
                Ok(PartMap(entries))
            }
        }
        deserializer.deserialize_map(PartMapVisitor)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Measure {
    #[serde(default, rename = "strumPattern")]
    pub strum_pattern: Option<Vec<String>>,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// A fret coordinate: a number, or the muted mark "x".
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Fret {
    Number(i32),
    Mark(String),
}

impl Fret {
    pub fn is_muted(&self) -> bool {
        matches!(self, Fret::Mark(s) if s.eq_ignore_ascii_case(MUTED_MARK))
    }
}

impl fmt::Display for Fret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Fret::Number(n) => write!(f, "{}", n),
            Fret::Mark(_) => write!(f, "{}", MUTED_MARK),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideDirection {
    Up,
    Down,
}

impl fmt::Display for SlideDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SlideDirection::Up => write!(f, "up"),
            SlideDirection::Down => write!(f, "down"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraceType {
    Acciaccatura,
    Appoggiatura,
}

impl Default for GraceType {
    fn default() -> Self {
        GraceType::Acciaccatura
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Light,
    Medium,
    Heavy,
}

impl Intensity {
    pub fn code(&self) -> char {
        match self {
            Intensity::Light => 'L',
            Intensity::Medium => 'M',
            Intensity::Heavy => 'H',
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChordFret {
    pub string: i32,
    pub fret: Fret,
}

/// One notation element. The `type` field of the JSON document selects
/// the variant; every consumer matches exhaustively so a new technique
/// cannot be half-supported.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "note", rename_all = "camelCase")]
    Note {
        string: i32,
        beat: Beat,
        fret: Fret,
        #[serde(default)]
        vibrato: bool,
        #[serde(default)]
        emphasis: Option<String>,
    },
    #[serde(rename = "chord", rename_all = "camelCase")]
    Chord {
        beat: Beat,
        #[serde(default, alias = "chordName")]
        name: Option<String>,
        frets: Vec<ChordFret>,
        #[serde(default)]
        emphasis: Option<String>,
    },
    #[serde(rename = "hammerOn", rename_all = "camelCase")]
    HammerOn {
        string: i32,
        start_beat: Beat,
        from_fret: i32,
        to_fret: i32,
        #[serde(default)]
        vibrato: bool,
        #[serde(default)]
        emphasis: Option<String>,
    },
    #[serde(rename = "pullOff", rename_all = "camelCase")]
    PullOff {
        string: i32,
        start_beat: Beat,
        from_fret: i32,
        to_fret: i32,
        #[serde(default)]
        vibrato: bool,
        #[serde(default)]
        emphasis: Option<String>,
    },
    #[serde(rename = "slide", rename_all = "camelCase")]
    Slide {
        string: i32,
        start_beat: Beat,
        from_fret: i32,
        to_fret: i32,
        direction: SlideDirection,
        #[serde(default)]
        vibrato: bool,
        #[serde(default)]
        emphasis: Option<String>,
    },
    #[serde(rename = "bend", rename_all = "camelCase")]
    Bend {
        string: i32,
        beat: Beat,
        fret: i32,
        semitones: f64,
        #[serde(default)]
        vibrato: bool,
        #[serde(default)]
        emphasis: Option<String>,
    },
    #[serde(rename = "graceNote", rename_all = "camelCase")]
    GraceNote {
        string: i32,
        beat: Beat,
        fret: Fret,
        grace_fret: Fret,
        #[serde(default)]
        grace_type: GraceType,
    },
    #[serde(rename = "palmMute", rename_all = "camelCase")]
    PalmMute {
        beat: Beat,
        #[serde(default = "default_duration")]
        duration: f64,
        #[serde(default)]
        intensity: Option<Intensity>,
    },
    #[serde(rename = "chuck", rename_all = "camelCase")]
    Chuck {
        beat: Beat,
        #[serde(default)]
        intensity: Option<Intensity>,
    },
}

fn default_duration() -> f64 {
    1.0
}

impl Event {
    /// The beat (or start beat) this event is anchored at.
    pub fn beat(&self) -> Beat {
        match self {
            Event::Note { beat, .. }
            | Event::Chord { beat, .. }
            | Event::Bend { beat, .. }
            | Event::GraceNote { beat, .. }
            | Event::PalmMute { beat, .. }
            | Event::Chuck { beat, .. } => *beat,
            Event::HammerOn { start_beat, .. }
            | Event::PullOff { start_beat, .. }
            | Event::Slide { start_beat, .. } => *start_beat,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Event::Note { .. } => "note",
            Event::Chord { .. } => "chord",
            Event::HammerOn { .. } => "hammerOn",
            Event::PullOff { .. } => "pullOff",
            Event::Slide { .. } => "slide",
            Event::Bend { .. } => "bend",
            Event::GraceNote { .. } => "graceNote",
            Event::PalmMute { .. } => "palmMute",
            Event::Chuck { .. } => "chuck",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    TuningMismatch,
    UnknownPart,
    StringOutOfRange,
    TechniqueDirectionError,
    NoteConflict,
    OrphanGraceNote,
    StrumPatternLengthMismatch,
}

/// A single validation failure, shaped for the JSON error payload.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct TabError {
    #[serde(rename = "isError")]
    pub is_error: bool,
    #[serde(rename = "errorType")]
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beat: Option<Beat>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl TabError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        TabError {
            is_error: true,
            kind,
            part: None,
            measure: None,
            beat: None,
            message: message.into(),
            suggestion: None,
        }
    }
    pub fn in_part(mut self, part: Option<&str>) -> Self {
        self.part = part.map(str::to_owned);
        self
    }
    pub fn at_measure(mut self, measure: usize) -> Self {
        self.measure = Some(measure);
        self
    }
    pub fn at_beat(mut self, beat: Beat) -> Self {
        self.beat = Some(beat);
        self
    }
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Valid but risky input; attached to a successful result.
#[derive(Debug, Clone, Serialize)]
pub struct TabWarning {
    #[serde(rename = "warningType")]
    pub warning_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beat: Option<Beat>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl TabWarning {
    pub fn formatting(message: impl Into<String>) -> Self {
        TabWarning {
            warning_type: "formatting_warning".to_owned(),
            measure: None,
            beat: None,
            message: message.into(),
            suggestion: None,
        }
    }
    pub fn at_measure(mut self, measure: usize) -> Self {
        self.measure = Some(measure);
        self
    }
    pub fn at_beat(mut self, beat: Beat) -> Self {
        self.beat = Some(beat);
        self
    }
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Beats print like the input document writes them: whole beats keep one
/// decimal ("1.0"), everything else keeps its own digits ("1.33").
pub fn fmt_beat(beat: Beat) -> String {
    let s = format!("{}", beat);
    if s.contains('.') {
        s
    } else {
        format!("{:.1}", beat)
    }
}
