use std::process::ExitCode;

use tabforge_core as core;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (check_only, inputs): (Vec<&String>, Vec<&String>) =
        args.iter().partition(|a| a.as_str() == "--check");
    let check_only = !check_only.is_empty();

    let arg = match inputs.as_slice() {
        [one] => one.as_str(),
        [] => "-",
        _ => {
            eprintln!("usage: tabforge [--check] [song.json | -]");
            return ExitCode::from(2);
        }
    };

    let song = match core::files::read_song_arg(arg) {
        Ok(song) => song,
        Err(e) => {
            eprintln!("{}", e);
            if let core::error::LoadErrorPayload::ParseError(detail) = &e.detail {
                eprintln!("  {}", detail);
            }
            return ExitCode::from(2);
        }
    };

    if check_only {
        return match core::validate(&song) {
            Ok(warnings) => {
                report_warnings(&warnings);
                ExitCode::SUCCESS
            }
            Err(errors) => {
                report_errors(&errors);
                ExitCode::FAILURE
            }
        };
    }

    match core::render(&song) {
        Ok(out) => {
            report_warnings(&out.warnings);
            print!("{}", out.text);
            ExitCode::SUCCESS
        }
        Err(errors) => {
            report_errors(&errors);
            ExitCode::FAILURE
        }
    }
}

fn report_errors(errors: &[tabforge_base::TabError]) {
    match serde_json::to_string_pretty(errors) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => {
            for e in errors {
                eprintln!("{}", e);
            }
        }
    }
}

fn report_warnings(warnings: &[tabforge_base::TabWarning]) {
    for w in warnings {
        match w.measure {
            Some(m) => eprintln!("warning (measure {}): {}", m, w.message),
            None => eprintln!("warning: {}", w.message),
        }
    }
}
