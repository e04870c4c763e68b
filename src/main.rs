mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use img2mosaic::svg_generator::rgb_hex;
use img2mosaic::{
    generate_mosaic, mosaic_to_svg, save_svg, save_variants, MosaicOutput, Palettes, Point, TilePass,
};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct TileRecord<'a> {
    polygon: &'a [Point],
    angle: f64,
    pass: TilePass,
    color: String,
}

#[derive(Serialize)]
struct MosaicRecord<'a> {
    width: u32,
    height: u32,
    tiles: Vec<TileRecord<'a>>,
    warnings: Vec<String>,
}

fn write_json(output: &MosaicOutput, path: &Path) -> Result<()> {
    let record = MosaicRecord {
        width: output.width,
        height: output.height,
        tiles: output
            .final_tiles
            .iter()
            .zip(&output.colors)
            .map(|(tile, color)| TileRecord {
                polygon: &tile.polygon,
                angle: tile.angle,
                pass: tile.pass,
                color: rgb_hex(*color),
            })
            .collect(),
        warnings: output.warnings.iter().map(|w| w.to_string()).collect(),
    };
    let text = serde_json::to_string_pretty(&record)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let output_path = cli.output_path();
    let options = cli.mosaic_options()?;

    let mut palettes = Palettes::builtin();
    if let Some(path) = &cli.palettes {
        let extra = Palettes::from_json_file(path)
            .with_context(|| format!("loading palettes from {}", path.display()))?;
        palettes.extend(extra);
    }

    println!(
        "Converting {} to {}...",
        cli.input.display(),
        output_path.display()
    );

    let output = generate_mosaic(&cli.input, &options, &palettes)?;
    save_svg(&mosaic_to_svg(&output), &output_path)?;

    if cli.recolor {
        for path in save_variants(&output, &output_path)? {
            println!("Wrote {}", path.display());
        }
    }
    if let Some(json_path) = &cli.json {
        write_json(&output, json_path)?;
    }

    println!(
        "Mosaic complete: {} tiles, {} warnings",
        output.final_tiles.len(),
        output.warnings.len()
    );
    Ok(())
}
