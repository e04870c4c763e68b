#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::geometry::oriented_square;
    use crate::tiles::TilePass;
    use std::fs;

    fn create_test_tiles() -> (Vec<Tile>, Vec<RGB8>) {
        let tiles = vec![
            Tile {
                polygon: oriented_square(Point::new(10.0, 10.0), 4.0, 0.0),
                angle: 0.0,
                chain: Some(0),
                pass: TilePass::Primary,
            },
            Tile {
                polygon: vec![
                    Point::new(30.0, 30.0),
                    Point::new(37.5, 30.0),
                    Point::new(33.25, 36.0),
                ],
                angle: 45.0,
                chain: None,
                pass: TilePass::Gap,
            },
        ];
        let colors = vec![RGB8::new(255, 0, 0), RGB8::new(0, 0, 255)];
        (tiles, colors)
    }

    #[test]
    fn test_render_svg_basic() {
        let (tiles, colors) = create_test_tiles();
        let content = render_svg(&tiles, &colors, 100, 80, 0.2).to_string();
        assert!(content.contains("<svg"));
        assert!(content.contains("width=\"100\""));
        assert!(content.contains("height=\"80\""));
        assert!(content.contains("viewBox=\"0 0 100 80\""));
        assert!(content.contains("</svg>"));
    }

    #[test]
    fn test_background_brightness() {
        let (tiles, colors) = create_test_tiles();
        let content = render_svg(&tiles, &colors, 100, 100, 0.2).to_string();
        assert!(content.contains("#333333"));
        assert_eq!(background_color(0.0), RGB8::new(0, 0, 0));
        assert_eq!(background_color(1.0), RGB8::new(255, 255, 255));
        assert_eq!(background_color(3.0), RGB8::new(255, 255, 255));
    }

    #[test]
    fn test_one_path_per_tile_in_order() {
        let (tiles, colors) = create_test_tiles();
        let content = render_svg(&tiles, &colors, 100, 100, 0.0).to_string();
        assert_eq!(content.matches("<path").count(), 2);
        let red = content.find("#ff0000").unwrap();
        let blue = content.find("#0000ff").unwrap();
        assert!(red < blue);
    }

    #[test]
    fn test_tiles_without_color_are_skipped() {
        let (tiles, colors) = create_test_tiles();
        let content = render_svg(&tiles, &colors[..1], 100, 100, 0.0).to_string();
        assert_eq!(content.matches("<path").count(), 1);
    }

    #[test]
    fn test_polygon_path_data() {
        let (tiles, _) = create_test_tiles();
        assert_eq!(polygon_path_data(&tiles[0].polygon), "M6 6L14 6L14 14L6 14Z");
        assert_eq!(polygon_path_data(&tiles[1].polygon), "M30 30L37.5 30L33.25 36Z");
        assert_eq!(polygon_path_data(&[]), "");
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(rgb_hex(RGB8::new(255, 128, 0)), "#ff8000");
        assert_eq!(rgb_hex(RGB8::new(0, 0, 0)), "#000000");
    }

    #[test]
    fn test_save_svg() {
        let (tiles, colors) = create_test_tiles();
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("mosaic.svg");
        let document = render_svg(&tiles, &colors, 50, 50, 0.5);
        save_svg(&document, &output_path).unwrap();
        let content = fs::read_to_string(&output_path).unwrap();
        assert!(content.contains("<path"));
        assert!(content.contains("#808080"));
    }

    #[test]
    fn test_save_svg_to_missing_directory_fails() {
        let (tiles, colors) = create_test_tiles();
        let document = render_svg(&tiles, &colors, 50, 50, 0.5);
        let result = save_svg(&document, Path::new("/nonexistent/dir/mosaic.svg"));
        assert!(matches!(result, Err(crate::error::MosaicError::Io(_))));
    }
}
