use crate::error::Result;
use crate::geometry::Point;
use crate::tiles::Tile;
use rgb::RGB8;
use std::path::Path;
use svg::node::element::{Path as SvgPath, Rectangle};
use svg::Document;

/// `#rrggbb` for a color.
pub fn rgb_hex(c: RGB8) -> String {
    format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
}

/// Grey of the given brightness (0.0 black, 1.0 white).
pub fn background_color(brightness: f64) -> RGB8 {
    let level = (brightness.clamp(0.0, 1.0) * 255.0).round() as u8;
    RGB8::new(level, level, level)
}

/// Format a coordinate compactly: integers without decimals, else at most
/// two decimals with trailing zeros stripped.
fn fmt_coord(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if (rounded - rounded.round()).abs() < 1e-9 {
        format!("{}", rounded.round() as i64)
    } else {
        let s = format!("{:.2}", rounded);
        s.trim_end_matches('0').to_string()
    }
}

/// Closed `M..L..Z` path for one polygon ring.
pub fn polygon_path_data(pts: &[Point]) -> String {
    let Some(first) = pts.first() else {
        return String::new();
    };
    let mut path = format!("M{} {}", fmt_coord(first.x), fmt_coord(first.y));
    for p in &pts[1..] {
        path.push_str(&format!("L{} {}", fmt_coord(p.x), fmt_coord(p.y)));
    }
    path.push('Z');
    path
}

/// Build the SVG document: a background rectangle and one filled path per
/// tile, in tile (paint) order. Tiles without a color are skipped.
pub fn render_svg(
    tiles: &[Tile],
    colors: &[RGB8],
    width: u32,
    height: u32,
    background_brightness: f64,
) -> Document {
    let background = Rectangle::new()
        .set("width", width)
        .set("height", height)
        .set("fill", rgb_hex(background_color(background_brightness)));

    let mut document = Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", format!("0 0 {} {}", width, height))
        .add(background);

    for (tile, color) in tiles.iter().zip(colors) {
        if tile.polygon.len() < 3 {
            continue;
        }
        let path = SvgPath::new()
            .set("d", polygon_path_data(&tile.polygon))
            .set("fill", rgb_hex(*color))
            .set("stroke", "none");
        document = document.add(path);
    }
    document
}

pub fn save_svg(document: &Document, output_path: &Path) -> Result<()> {
    svg::save(output_path, document)?;
    Ok(())
}
