/// Example: Render the card's face textures to PNG files
///
/// Usage: cargo run --example mask_preview -- [output-dir] [config.toml]
use std::error::Error;
use std::path::PathBuf;

use perspective_core::{parse_fonts, Card, CardConfig, CardFonts, Config, RenderContext};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));
    let config = match args.next() {
        Some(path) => CardConfig::load_from_file(&path)?,
        None => CardConfig::default(),
    };

    let title_json = std::fs::read_to_string(&config.assets.title_font)?;
    let body_json = std::fs::read_to_string(&config.assets.body_font)?;
    let (title, body) = parse_fonts(&title_json, &body_json)?;

    let mut ctx = RenderContext::new(1, 1);
    let mut rng = StdRng::seed_from_u64(0);
    let card = Card::build(&config, CardFonts { title: &title, body: &body }, &mut ctx, &mut rng);

    std::fs::create_dir_all(&out_dir)?;
    let mut outputs = vec![
        ("front_mask.png", card.front.mask.image()),
        ("back_mask.png", card.back.mask.image()),
    ];
    if let Some(colors) = card.front.letter_colors.as_ref() {
        outputs.push(("front_letters.png", colors.image()));
    }
    for (name, image) in outputs {
        let path = out_dir.join(name);
        image.save(&path)?;
        println!("Wrote {} ({}x{})", path.display(), image.width(), image.height());
    }

    Ok(())
}
