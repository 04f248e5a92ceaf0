//! Interactive click session.
//!
//! Each prompt stands in for a map click. Repeating the previous
//! coordinate reuses the cached result, the way re-rendering the same
//! selection does on the map.

use dialoguer::Input;
use site_map_geometry::GeoPoint;
use site_map_source::Dataset;

use crate::output;

/// A parsed session prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Click(GeoPoint),
    Clear,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => return Ok(Command::Quit),
        "clear" => return Ok(Command::Clear),
        _ => {}
    }

    let parts: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();

    let [lat, lon] = parts.as_slice() else {
        return Err(format!("expected 'LAT, LON', got '{line}'"));
    };

    let lat = lat
        .parse::<f64>()
        .map_err(|e| format!("invalid latitude '{lat}': {e}"))?;
    let lon = lon
        .parse::<f64>()
        .map_err(|e| format!("invalid longitude '{lon}': {e}"))?;

    Ok(Command::Click(GeoPoint::new(lat, lon)))
}

/// Runs the prompt loop until the user quits.
///
/// # Errors
///
/// Returns an error if the terminal prompt fails. Analysis errors are
/// printed and the session continues.
pub fn run(dataset: &Dataset) -> Result<(), Box<dyn std::error::Error>> {
    let mut orchestrator = dataset.orchestrator();

    println!("Enter a click as 'LAT, LON', 'clear' to reset the selection, or 'quit'.");

    loop {
        let line: String = Input::new().with_prompt("Click").interact_text()?;

        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Clear) => {
                orchestrator.clear_selection();
                println!("Selection cleared.");
            }
            Ok(Command::Click(point)) => match orchestrator.handle_click(point) {
                Ok(outcome) => {
                    if outcome.reused {
                        println!("(same location as the previous click)");
                    }
                    print!("{}", output::format_result(&outcome.result, &dataset.catalog));
                }
                Err(e) => {
                    log::error!("Analysis failed: {e}");
                    println!("Could not analyze {point}: {e}");
                }
            },
            Err(message) => println!("{message}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_click_coordinates() {
        assert_eq!(
            parse_command("47.25, -122.45"),
            Ok(Command::Click(GeoPoint::new(47.25, -122.45)))
        );
        assert_eq!(
            parse_command("  47.25   -122.45 "),
            Ok(Command::Click(GeoPoint::new(47.25, -122.45)))
        );
    }

    #[test]
    fn parses_session_keywords() {
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
        assert_eq!(parse_command("Q"), Ok(Command::Quit));
        assert_eq!(parse_command("clear"), Ok(Command::Clear));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_command("47.25").is_err());
        assert!(parse_command("north, west").is_err());
        assert!(parse_command("1, 2, 3").is_err());
    }
}
