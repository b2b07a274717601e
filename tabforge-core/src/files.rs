use std::fs;
use std::io::Read;
use std::path::Path;

use tabforge_base::Song;

use crate::error::{LoadError, LoadErrorPayload};

pub fn song_from_str(source: &str) -> Result<Song, serde_json::Error> {
    serde_json::from_str(source)
}

pub fn read_song(file_name: &Path) -> Result<Song, LoadError> {
    let wrap = |detail: LoadErrorPayload| LoadError {
        file: file_name.to_string_lossy().to_string(),
        detail,
    };
    let source = fs::read_to_string(file_name).map_err(|e| wrap(e.into()))?;
    song_from_str(&source).map_err(|e| wrap(e.into()))
}

/// "-" reads the document from stdin, anything else is a path.
pub fn read_song_arg(arg: &str) -> Result<Song, LoadError> {
    if arg == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .map_err(|e| LoadError {
                file: "<stdin>".to_owned(),
                detail: e.into(),
            })?;
        song_from_str(&source).map_err(|e| LoadError {
            file: "<stdin>".to_owned(),
            detail: e.into(),
        })
    } else {
        read_song(Path::new(arg))
    }
}
