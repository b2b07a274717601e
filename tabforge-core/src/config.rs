use std::collections::{HashMap, HashSet};
use tabforge_base::Beat;

/// Immutable per-instrument data. Tuning is ordered string 1 to string N,
/// string 1 being the highest-pitched (topmost) line of the tab.
#[derive(Debug)]
pub struct InstrumentConfig {
    pub name: &'static str,
    pub strings: usize,
    pub tuning: &'static [&'static str],
    pub max_fret: i32,
}

impl InstrumentConfig {
    pub fn valid_string(&self, string: i32) -> bool {
        string >= 1 && string <= self.strings as i32
    }
}

/// Immutable per-time-signature data. `beats` is the ordered set of legal
/// beat anchors within one measure; `ruler` carries one label per anchor.
#[derive(Debug)]
pub struct TimeSignatureConfig {
    pub name: &'static str,
    pub beats_per_measure: u8,
    pub beat_unit: u8,
    pub beats: &'static [Beat],
    pub ruler: &'static [&'static str],
}

impl TimeSignatureConfig {
    /// Anchor index of a beat value, or None if the beat is not legal.
    pub fn slot_of(&self, beat: Beat) -> Option<usize> {
        self.beats.iter().position(|b| (b - beat).abs() < 1e-6)
    }

    pub fn strum_slots(&self) -> usize {
        self.beats.len()
    }

    /// First beat past the end of the measure (e.g. 5.0 in 4/4).
    pub fn beat_span_end(&self) -> Beat {
        self.beats_per_measure as Beat + 1.0
    }

    pub fn max_beat(&self) -> Beat {
        *self.beats.last().unwrap_or(&1.0)
    }
}

lazy_static::lazy_static! {
    pub static ref INSTRUMENTS: HashMap<&'static str, InstrumentConfig> = {
        HashMap::from([
            ("guitar", InstrumentConfig{
                name : "guitar",
                strings : 6,
                tuning : &["e","B","G","D","A","E"],
                max_fret : 24
            }),
            ("ukulele", InstrumentConfig{
                name : "ukulele",
                strings : 4,
                tuning : &["A","E","C","G"],
                max_fret : 24
            }),
            ("bass", InstrumentConfig{
                name : "bass",
                strings : 4,
                tuning : &["G","D","A","E"],
                max_fret : 24
            }),
            ("mandolin", InstrumentConfig{
                name : "mandolin",
                strings : 4,
                tuning : &["E","A","D","G"],
                max_fret : 24
            }),
            ("banjo", InstrumentConfig{
                name : "banjo",
                strings : 5,
                tuning : &["g","D","B","G","D"],
                max_fret : 24
            }),
            ("seven string", InstrumentConfig{
                name : "seven string",
                strings : 7,
                tuning : &["e","b","G","D","A","E","B"],
                max_fret : 24
            }),
        ])
    };

    pub static ref TIME_SIGNATURES: HashMap<&'static str, TimeSignatureConfig> = {
        HashMap::from([
            ("4/4", TimeSignatureConfig{
                name : "Common Time",
                beats_per_measure : 4,
                beat_unit : 4,
                beats : &[1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5],
                ruler : &["1","&","2","&","3","&","4","&"]
            }),
            ("3/4", TimeSignatureConfig{
                name : "Waltz Time",
                beats_per_measure : 3,
                beat_unit : 4,
                beats : &[1.0, 1.5, 2.0, 2.5, 3.0, 3.5],
                ruler : &["1","&","2","&","3","&"]
            }),
            //Compound duple: two main beats in triplet subdivision
            ("6/8", TimeSignatureConfig{
                name : "Compound Duple",
                beats_per_measure : 2,
                beat_unit : 8,
                beats : &[1.0, 1.33, 1.67, 2.0, 2.33, 2.67],
                ruler : &["1","&","a","2","&","a"]
            }),
            ("2/4", TimeSignatureConfig{
                name : "Cut Time",
                beats_per_measure : 2,
                beat_unit : 4,
                beats : &[1.0, 1.5, 2.0, 2.5],
                ruler : &["1","&","2","&"]
            }),
        ])
    };

    pub static ref VALID_EMPHASIS: HashSet<&'static str> = {
        HashSet::from([
            "pp", "p", "mp", "mf", "f", "ff",
            ">", "-", ".", "<",
            "dim.", "cresc."
        ])
    };
}

pub fn instrument(name: &str) -> Option<&'static InstrumentConfig> {
    INSTRUMENTS.get(name)
}

pub fn time_signature(name: &str) -> Option<&'static TimeSignatureConfig> {
    TIME_SIGNATURES.get(name)
}

pub fn supported_time_signatures() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = TIME_SIGNATURES.keys().copied().collect();
    names.sort_unstable();
    names
}

pub fn supported_instruments() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = INSTRUMENTS.keys().copied().collect();
    names.sort_unstable();
    names
}

pub fn is_valid_emphasis(emphasis: &str) -> bool {
    VALID_EMPHASIS.contains(emphasis)
}
