/// Perspective Terminal - Engraved Business Card
///
/// Renders the card with truecolor half blocks.
/// Controls:
///   - Left mouse drag: Rotate the card
///   - Hover the title: Reveal the letter colours
///   - WASD / Arrow Keys: Nudge the rotation
///   - Q/ESC: Quit
///
/// Usage: perspective-terminal [config.toml]
use std::error::Error;
use std::time::{SystemTime, UNIX_EPOCH};

use perspective_core::{parse_fonts, CardConfig, Config};
use perspective_terminal::TerminalApp;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => CardConfig::load_from_file(&path)?,
        None => CardConfig::default(),
    };

    let title_json = std::fs::read_to_string(&config.assets.title_font)?;
    let body_json = std::fs::read_to_string(&config.assets.body_font)?;
    let (title, body) = parse_fonts(&title_json, &body_json)?;

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();

    println!("Perspective Terminal - building card (press Q to quit)...");
    let mut app = TerminalApp::new(config, &title, &body, seed)?;
    app.run()?;

    Ok(())
}
