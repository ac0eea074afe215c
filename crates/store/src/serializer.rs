//! Drawing serialization: live shapes to save data and back

use crate::{BackgroundData, CanvasSize, DrawingSaveData, Result, SaveData, StoreError};
use art_model::{ArtShape, Shape};
use tracing::debug;

/// Snapshot live shapes into save data, in the order given (layer order)
pub fn capture(
    size: CanvasSize,
    background: Option<BackgroundData>,
    shapes: &[ArtShape],
) -> DrawingSaveData {
    debug!(shapes = shapes.len(), "capture drawing");
    DrawingSaveData {
        size,
        save_data: SaveData {
            background,
            shapes: shapes.iter().map(|shape| shape.serialize()).collect(),
        },
    }
}

/// Rebuild shapes from save data.
///
/// The returned shapes are detached and sink-less; the caller attaches them
/// to a layer (usually through append commands) and wires sinks afterwards.
/// An unknown shape type fails the whole load rather than dropping the shape.
pub fn restore(data: &DrawingSaveData) -> Result<Vec<ArtShape>> {
    debug!(shapes = data.save_data.shapes.len(), "restore drawing");
    data.save_data
        .shapes
        .iter()
        .map(|record| ArtShape::from_record(record).map_err(StoreError::from))
        .collect()
}

/// Serialize save data to JSON text
pub fn serialize(data: &DrawingSaveData) -> Result<String> {
    let json = serde_json::to_string_pretty(data)?;
    Ok(json)
}

/// Parse save data from JSON text.
/// Shape type tags are validated eagerly so corrupt data fails here, before
/// any reconstruction work.
pub fn deserialize(json: &str) -> Result<DrawingSaveData> {
    let data: DrawingSaveData = serde_json::from_str(json)?;
    for record in &data.save_data.shapes {
        if !record.has_known_type() {
            return Err(StoreError::InvalidFormat(format!(
                "unknown shape type '{}'",
                record.shape_type
            )));
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use art_model::{
        EllipseShape, HasFill, HasStroke, HasText, ImageShape, Offset, PathData, PathShape, Point,
        RectShape, TextShape,
    };
    use proptest::prelude::*;

    fn sample_drawing() -> (DrawingSaveData, Vec<ArtShape>) {
        let mut rect = RectShape::new(0.0, 0.0, 50.0, 50.0);
        rect.set_fill_color("#ff0000").unwrap();
        rect.set_stroke_width(2.0).unwrap();

        let path = PathShape::new(
            PathData::start_at(Point::new(10.0, 10.0)).line_by(Offset::new(5.0, -3.0)),
        );
        let ellipse = EllipseShape::new(30.0, 30.0, 10.0, 8.0);
        let image = ImageShape::new(1.0, 2.0, 3.0, 4.0, "photo.png");
        let mut text = TextShape::new(5.0, 40.0, "caption");
        text.set_font_family("serif").unwrap();

        let shapes = vec![
            ArtShape::Rect(rect),
            ArtShape::Path(path),
            ArtShape::Ellipse(ellipse),
            ArtShape::Image(image),
            ArtShape::Text(text),
        ];
        let data = capture(
            CanvasSize::new(800.0, 600.0),
            Some(BackgroundData::color("#fafafa")),
            &shapes,
        );
        (data, shapes)
    }

    #[test]
    fn full_drawing_round_trips() {
        let (data, shapes) = sample_drawing();

        let json = serialize(&data).unwrap();
        let loaded = deserialize(&json).unwrap();
        assert_eq!(loaded, data);

        let restored = restore(&loaded).unwrap();
        assert_eq!(restored.len(), shapes.len());
        for (restored, original) in restored.iter().zip(&shapes) {
            assert_eq!(restored.serialize(), original.serialize());
        }
    }

    #[test]
    fn unknown_shape_type_fails_the_load() {
        let (data, _) = sample_drawing();
        let json = serialize(&data).unwrap().replace("\"rect\"", "\"polygon\"");
        assert!(matches!(
            deserialize(&json),
            Err(StoreError::InvalidFormat(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(matches!(
            deserialize("{\"size\": oops"),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn text_content_survives_through_the_data_bag() {
        let text = TextShape::new(0.0, 10.0, "hello world");
        let data = capture(CanvasSize::new(100.0, 100.0), None, &[ArtShape::Text(text)]);

        let restored = restore(&data).unwrap();
        match &restored[0] {
            ArtShape::Text(text) => {
                assert_eq!(text.text_content().as_deref(), Some("hello world"))
            }
            other => panic!("expected a text shape, got {:?}", other.shape_type()),
        }
    }

    proptest! {
        #[test]
        fn rect_geometry_round_trips(
            x in -1000.0f64..1000.0,
            y in -1000.0f64..1000.0,
            width in 0.0f64..500.0,
            height in 0.0f64..500.0,
            opacity in 0.0f64..1.0,
        ) {
            let mut rect = RectShape::new(x, y, width, height);
            rect.set_fill_opacity(opacity).unwrap();
            let data = capture(CanvasSize::new(2000.0, 2000.0), None, &[ArtShape::Rect(rect)]);

            let json = serialize(&data).unwrap();
            let restored = restore(&deserialize(&json).unwrap()).unwrap();
            prop_assert_eq!(restored[0].serialize(), data.save_data.shapes[0].clone());
        }
    }
}
