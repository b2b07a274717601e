use tabforge_base::Song;
use tabforge_core::{render, validate};

fn song(json: &str) -> Song {
    serde_json::from_str(json).unwrap()
}

#[test]
fn open_g_chord_document() {
    let s = song(
        r#"{
            "title": "Campfire",
            "artist": "Anon",
            "timeSignature": "4/4",
            "tempo": 120,
            "key": "G",
            "measures": [{
                "strumPattern": ["D", "", "D", "U", "", "U", "D", ""],
                "events": [{
                    "type": "chord", "beat": 1.0, "name": "G",
                    "frets": [
                        {"string": 6, "fret": 3},
                        {"string": 5, "fret": 2},
                        {"string": 4, "fret": 0},
                        {"string": 3, "fret": 0},
                        {"string": 2, "fret": 0},
                        {"string": 1, "fret": 3}
                    ]
                }]
            }]
        }"#,
    );
    let out = render(&s).unwrap();
    assert!(out.warnings.is_empty());
    let lines: Vec<&str> = out.text.lines().collect();
    assert_eq!(lines[0], "# Campfire");
    assert_eq!(lines[1], "**Artist:** Anon");
    assert_eq!(
        lines[2],
        "**Time Signature:** 4/4 | **Tempo:** 120 BPM | **Key:** G"
    );
    assert_eq!(lines[3], "");
    assert_eq!(lines[4].trim_end(), "    G");
    assert_eq!(lines[5].trim_end(), "    1 & 2 & 3 & 4 &");
    assert_eq!(lines[6], "e |-3---------------|");
    assert_eq!(lines[7], "B |-0---------------|");
    assert_eq!(lines[8], "G |-0---------------|");
    assert_eq!(lines[9], "D |-0---------------|");
    assert_eq!(lines[10], "A |-2---------------|");
    assert_eq!(lines[11], "E |-3---------------|");
    assert_eq!(lines[12].trim_end(), "    D   D U   U D");
    // chord row through strum row, one shared length
    let len = lines[6].chars().count();
    for line in &lines[4..=12] {
        assert_eq!(line.chars().count(), len, "row: {:?}", line);
    }
}

#[test]
fn verse_with_g_major_and_strum_row() {
    let s = song(
        r#"{
            "title": "One Verse",
            "timeSignature": "4/4",
            "parts": {"Verse": {"measures": [{
                "strumPattern": ["D", "", "U", "", "D", "U", "D", "U"],
                "events": [{
                    "type": "chord", "beat": 1.0,
                    "frets": [
                        {"string": 6, "fret": 3},
                        {"string": 5, "fret": 2},
                        {"string": 1, "fret": 3}
                    ]
                }]
            }]}},
            "structure": ["Verse"]
        }"#,
    );
    let text = render(&s).unwrap().text;
    let lines: Vec<&str> = text.lines().collect();
    let ruler_at = lines
        .iter()
        .position(|l| l.trim_end() == "    1 & 2 & 3 & 4 &")
        .unwrap();
    assert_eq!(lines[ruler_at + 1], "e |-3---------------|");
    assert_eq!(lines[ruler_at + 5], "A |-2---------------|");
    assert_eq!(lines[ruler_at + 6], "E |-3---------------|");
    assert_eq!(lines[ruler_at + 7].trim_end(), "    D   U   D U D U");
    let len = lines[ruler_at].chars().count();
    for line in &lines[ruler_at..=ruler_at + 7] {
        assert_eq!(line.chars().count(), len, "row: {:?}", line);
    }
    assert!(text.contains("## Verse 1"));
}

#[test]
fn grace_note_listed_before_its_target_still_renders() {
    let s = song(
        r#"{"title":"T","measures":[{
            "events":[
                {"type":"graceNote","string":2,"beat":1.0,"fret":5,"graceFret":3},
                {"type":"note","string":2,"beat":1.0,"fret":5}]}]}"#,
    );
    let out = render(&s).unwrap();
    assert!(out.text.contains("³5"));
}

#[test]
fn rendering_is_deterministic() {
    let s = song(
        r#"{"title":"T","measures":[
            {"events":[{"type":"note","string":1,"beat":1.0,"fret":12},
                       {"type":"palmMute","beat":2.0,"duration":2.0}]},
            {"events":[{"type":"bend","string":2,"beat":3.0,"fret":7,"semitones":1.5}]}]}"#,
    );
    let first = render(&s).unwrap().text;
    let second = render(&s).unwrap().text;
    assert_eq!(first, second);
}

#[test]
fn undefined_part_reference_renders_nothing() {
    let s = song(
        r#"{"title":"T",
            "parts": {"Verse": {"measures": [{"events": []}]}},
            "structure": ["Verse", "Bridge"]}"#,
    );
    let errs = render(&s).unwrap_err();
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].message, "Structure references undefined part 'Bridge'");
}

#[test]
fn invalid_beat_error_payload() {
    let s = song(
        r#"{"title":"T","timeSignature":"4/4","measures":[{
            "events":[{"type":"note","string":1,"beat":4.7,"fret":3}]}]}"#,
    );
    let errs = validate(&s).unwrap_err();
    assert_eq!(errs.len(), 1);
    let payload = serde_json::to_value(&errs[0]).unwrap();
    assert_eq!(
        payload,
        serde_json::json!({
            "isError": true,
            "errorType": "validation_error",
            "measure": 1,
            "beat": 4.7,
            "message": "Beat 4.7 invalid for 4/4 time signature",
            "suggestion": "Use valid beat values: 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5"
        })
    );
}

#[test]
fn render_refuses_an_invalid_song() {
    let s = song(
        r#"{"title":"T","measures":[{
            "events":[{"type":"note","string":9,"beat":1.0,"fret":3}]}]}"#,
    );
    assert!(render(&s).is_err());
}

#[test]
fn structure_is_rendered_in_playing_order() {
    let s = song(
        r#"{
            "title": "Loop",
            "parts": {
                "Verse": {"measures": [{"events": [
                    {"type":"note","string":1,"beat":1.0,"fret":0}]}]},
                "Chorus": {"measures": [{"events": [
                    {"type":"note","string":1,"beat":1.0,"fret":5}]}]}
            },
            "structure": ["Verse", "Chorus", "Verse"]
        }"#,
    );
    let text = render(&s).unwrap().text;
    let verse1 = text.find("## Verse 1").unwrap();
    let chorus1 = text.find("## Chorus 1").unwrap();
    let verse2 = text.find("## Verse 2").unwrap();
    assert!(verse1 < chorus1 && chorus1 < verse2);
    assert!(text.contains("**Song Structure:** Verse → Chorus → Verse"));
}

#[test]
fn compound_meter_ruler_and_beats() {
    let good = song(
        r#"{"title":"T","timeSignature":"6/8","measures":[{
            "events":[{"type":"note","string":3,"beat":1.33,"fret":2}]}]}"#,
    );
    let text = render(&good).unwrap().text;
    assert!(text.contains("    1 & a 2 & a"));

    let bad = song(
        r#"{"title":"T","timeSignature":"6/8","measures":[{
            "events":[{"type":"note","string":3,"beat":1.5,"fret":2}]}]}"#,
    );
    let errs = validate(&bad).unwrap_err();
    assert_eq!(errs[0].message, "Beat 1.5 invalid for 6/8 time signature");
    assert_eq!(
        errs[0].suggestion.as_deref(),
        Some("Use valid beat values: 1.0, 1.33, 1.67, 2.0, 2.33, 2.67")
    );
}

#[test]
fn instrument_bounds_follow_the_selected_instrument() {
    let s = song(
        r#"{"title":"T","instrument":"ukulele","measures":[{
            "events":[{"type":"note","string":5,"beat":1.0,"fret":3}]}]}"#,
    );
    let errs = validate(&s).unwrap_err();
    assert_eq!(errs[0].message, "Invalid string number: 5");
    assert_eq!(
        errs[0].suggestion.as_deref(),
        Some("Use strings 1-4 for ukulele")
    );

    let ok = song(
        r#"{"title":"T","instrument":"ukulele","measures":[{
            "events":[{"type":"note","string":4,"beat":1.0,"fret":3}]}]}"#,
    );
    let text = render(&ok).unwrap().text;
    assert!(text.contains("A |"));
    assert!(text.contains("G |-3"));
}

#[test]
fn unsupported_signature_fails_before_anything_else() {
    let s = song(
        r#"{"title":"T","timeSignature":"5/4","measures":[{
            "events":[{"type":"note","string":1,"beat":4.7,"fret":99}]}]}"#,
    );
    let errs = validate(&s).unwrap_err();
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].message, "Unsupported time signature: 5/4");
    assert_eq!(
        errs[0].suggestion.as_deref(),
        Some("Use supported time signatures: 2/4, 3/4, 4/4, 6/8")
    );
}

#[test]
fn warnings_ride_along_with_a_successful_render() {
    let s = song(
        r#"{"title":"T","measures":[{
            "events":[{"type":"note","string":1,"beat":1.0,"fret":12}]}]}"#,
    );
    let out = render(&s).unwrap();
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].message.contains("Multi-digit fret (12)"));
    assert!(out.text.contains("e |-12"));
}

#[test]
fn part_error_names_the_part() {
    let s = song(
        r#"{
            "title": "T",
            "parts": {"Bridge": {"measures": [
                {"events": []},
                {"events": [{"type":"note","string":1,"beat":9.0,"fret":1}]}
            ]}},
            "structure": ["Bridge"]
        }"#,
    );
    let errs = validate(&s).unwrap_err();
    assert_eq!(errs[0].part.as_deref(), Some("Bridge"));
    assert_eq!(errs[0].measure, Some(2));
}
