//! Board items: footprints, tracks, zones, free graphics and groups

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::{normalize_angle, ItemId, NetCode, Point, Size};

/// Attributes the model does not interpret, written back unchanged on save
pub type Extra = Map<String, Value>;

/// How a footprint's pads connect to surrounding copper zones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneConnection {
    #[default]
    Inherited,
    None,
    ThermalReliefs,
    Full,
}

/// Horizontal text justification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HJustify {
    Left,
    #[default]
    Center,
    Right,
}

/// Vertical text justification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VJustify {
    Top,
    #[default]
    Center,
    Bottom,
}

fn default_true() -> bool {
    true
}

/// A named text field attached to a footprint (reference, value, user text)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub text: String,
    pub position: Point,
    /// Rotation relative to the owning footprint, in degrees
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub layer: String,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub thickness: i64,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub multiline: bool,
    #[serde(default = "default_true")]
    pub keep_upright: bool,
    #[serde(default)]
    pub h_justify: HJustify,
    #[serde(default)]
    pub v_justify: VJustify,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Field {
    pub fn new(name: impl Into<String>, position: Point) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            position,
            angle: 0.0,
            layer: String::new(),
            size: Size::default(),
            thickness: 0,
            bold: false,
            italic: false,
            visible: true,
            multiline: false,
            keep_upright: true,
            h_justify: HJustify::default(),
            v_justify: VJustify::default(),
            extra: Extra::new(),
        }
    }

    /// Copy the visual attributes of `other`, leaving name, text, position and layer alone
    pub fn copy_style_from(&mut self, other: &Field) {
        self.size = other.size;
        self.thickness = other.thickness;
        self.bold = other.bold;
        self.italic = other.italic;
        self.visible = other.visible;
        self.multiline = other.multiline;
        self.keep_upright = other.keep_upright;
        self.h_justify = other.h_justify;
        self.v_justify = other.v_justify;
    }
}

/// A footprint pad and the net it is connected to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pad {
    /// Pad number as printed on the footprint ("1", "A3", ...). May be empty.
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub net: NetCode,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Pad {
    pub fn new(number: impl Into<String>, net: NetCode) -> Self {
        Self {
            number: number.into(),
            net,
            extra: Extra::new(),
        }
    }
}

/// A placed component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    #[serde(default)]
    pub id: ItemId,
    /// Hierarchical path of the schematic symbol: `/<sheet>/<sheet>/<symbol>`
    #[serde(default)]
    pub path: Option<String>,
    pub reference: String,
    #[serde(default)]
    pub value: String,
    /// Schematic file of the sheet the symbol lives on
    #[serde(default)]
    pub sheetfile: Option<String>,
    /// Human-readable name of the sheet the symbol lives on
    #[serde(default)]
    pub sheetname: Option<String>,
    pub position: Point,
    #[serde(default)]
    pub orientation: f64,
    #[serde(default)]
    pub flipped: bool,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub local_clearance: Option<i64>,
    #[serde(default)]
    pub solder_mask_margin: Option<i64>,
    #[serde(default)]
    pub solder_paste_margin: Option<i64>,
    #[serde(default)]
    pub solder_paste_ratio: Option<f64>,
    #[serde(default)]
    pub zone_connection: ZoneConnection,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub pads: Vec<Pad>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Footprint {
    pub fn new(reference: impl Into<String>, position: Point) -> Self {
        Self {
            id: ItemId::default(),
            path: None,
            reference: reference.into(),
            value: String::new(),
            sheetfile: None,
            sheetname: None,
            position,
            orientation: 0.0,
            flipped: false,
            size: Size::default(),
            local_clearance: None,
            solder_mask_margin: None,
            solder_paste_margin: None,
            solder_paste_ratio: None,
            zone_connection: ZoneConnection::default(),
            fields: Vec::new(),
            pads: Vec::new(),
            extra: Extra::new(),
        }
    }

    /// Bounding area in mm²
    pub fn area(&self) -> f64 {
        self.size.area_mm2()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Flip the footprint to the other side of the board, mirroring top to bottom
    /// around its own position.
    pub fn flip(&mut self) {
        let cy = self.position.y;
        self.flipped = !self.flipped;
        self.orientation = normalize_angle(-self.orientation);
        for field in &mut self.fields {
            field.position.y = 2 * cy - field.position.y;
            field.angle = normalize_angle(-field.angle);
            field.layer = flip_layer(&field.layer);
        }
    }
}

/// Swap a front-side layer name for its back-side twin and vice versa
pub fn flip_layer(layer: &str) -> String {
    if let Some(rest) = layer.strip_prefix("F.") {
        format!("B.{}", rest)
    } else if let Some(rest) = layer.strip_prefix("B.") {
        format!("F.{}", rest)
    } else {
        layer.to_string()
    }
}

/// Geometry of a copper track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackShape {
    Segment {
        start: Point,
        end: Point,
    },
    Arc {
        start: Point,
        mid: Point,
        end: Point,
    },
    Via {
        position: Point,
        #[serde(default)]
        drill: i64,
    },
    /// A track kind this engine does not know how to replicate, kept verbatim
    #[serde(untagged)]
    Unknown(Extra),
}

impl TrackShape {
    pub fn kind(&self) -> &'static str {
        match self {
            TrackShape::Segment { .. } => "segment",
            TrackShape::Arc { .. } => "arc",
            TrackShape::Via { .. } => "via",
            TrackShape::Unknown(_) => "unknown",
        }
    }
}

/// A copper connection: segment, arc or via
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTrack")]
pub struct Track {
    pub id: ItemId,
    #[serde(flatten)]
    pub shape: TrackShape,
    pub width: i64,
    pub layer: String,
    pub net: NetCode,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Deserialize)]
struct RawTrack {
    #[serde(default)]
    id: ItemId,
    #[serde(default)]
    width: i64,
    #[serde(default)]
    layer: String,
    #[serde(default)]
    net: NetCode,
    #[serde(flatten)]
    rest: Extra,
}

impl TryFrom<RawTrack> for Track {
    type Error = serde_json::Error;

    fn try_from(raw: RawTrack) -> Result<Self, Self::Error> {
        let (shape, extra) = split_shape(raw.rest)?;
        Ok(Self {
            id: raw.id,
            shape,
            width: raw.width,
            layer: raw.layer,
            net: raw.net,
            extra,
        })
    }
}

/// Separate an item's shape from the leftover attributes the shape did not consume.
///
/// The shape is parsed from everything not claimed by the item's common
/// fields, then serialized again to learn which keys it owns.
fn split_shape<S>(mut rest: Extra) -> Result<(S, Extra), serde_json::Error>
where
    S: DeserializeOwned + Serialize,
{
    let shape: S = serde_json::from_value(Value::Object(rest.clone()))?;
    if let Value::Object(consumed) = serde_json::to_value(&shape)? {
        rest.retain(|key, _| !consumed.contains_key(key));
    }
    Ok((shape, rest))
}

impl Track {
    pub fn segment(start: Point, end: Point, width: i64, layer: &str, net: NetCode) -> Self {
        Self {
            id: ItemId::default(),
            shape: TrackShape::Segment { start, end },
            width,
            layer: layer.to_string(),
            net,
            extra: Extra::new(),
        }
    }
}

/// A filled copper region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    pub outline: Vec<Point>,
    #[serde(default)]
    pub layer: String,
    #[serde(default)]
    pub net: NetCode,
    #[serde(default)]
    pub priority: u32,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Zone {
    /// The point the zone is positioned by: its first outline vertex
    pub fn reference_point(&self) -> Option<Point> {
        self.outline.first().copied()
    }
}

/// Geometry of a free graphic item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawingShape {
    Line {
        start: Point,
        end: Point,
    },
    Arc {
        start: Point,
        mid: Point,
        end: Point,
    },
    Circle {
        center: Point,
        /// A point on the circumference
        end: Point,
    },
    /// Axis-aligned rectangle given by two opposite corners
    Rect {
        start: Point,
        end: Point,
    },
    Polygon {
        points: Vec<Point>,
    },
    Text {
        position: Point,
        #[serde(default)]
        angle: f64,
        text: String,
    },
    /// A graphic kind this engine does not know how to replicate, kept verbatim
    #[serde(untagged)]
    Unknown(Extra),
}

impl DrawingShape {
    pub fn kind(&self) -> &'static str {
        match self {
            DrawingShape::Line { .. } => "line",
            DrawingShape::Arc { .. } => "arc",
            DrawingShape::Circle { .. } => "circle",
            DrawingShape::Rect { .. } => "rect",
            DrawingShape::Polygon { .. } => "polygon",
            DrawingShape::Text { .. } => "text",
            DrawingShape::Unknown(_) => "unknown",
        }
    }
}

/// A free graphic item drawn directly on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDrawing")]
pub struct Drawing {
    pub id: ItemId,
    #[serde(flatten)]
    pub shape: DrawingShape,
    pub layer: String,
    pub width: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Deserialize)]
struct RawDrawing {
    #[serde(default)]
    id: ItemId,
    #[serde(default)]
    layer: String,
    #[serde(default)]
    width: i64,
    #[serde(flatten)]
    rest: Extra,
}

impl TryFrom<RawDrawing> for Drawing {
    type Error = serde_json::Error;

    fn try_from(raw: RawDrawing) -> Result<Self, Self::Error> {
        let (shape, extra) = split_shape(raw.rest)?;
        Ok(Self {
            id: raw.id,
            shape,
            layer: raw.layer,
            width: raw.width,
            extra,
        })
    }
}

/// A named set of board items that move together
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub members: BTreeSet<ItemId>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeSet::new(),
            extra: Extra::new(),
        }
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.members.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_layer() {
        assert_eq!(flip_layer("F.Cu"), "B.Cu");
        assert_eq!(flip_layer("B.SilkS"), "F.SilkS");
        assert_eq!(flip_layer("Edge.Cuts"), "Edge.Cuts");
    }

    #[test]
    fn test_footprint_flip_mirrors_fields() {
        let mut fp = Footprint::new("U1", Point::new(1000, 1000));
        fp.orientation = 90.0;
        let mut field = Field::new("Reference", Point::new(1000, 800));
        field.layer = "F.SilkS".to_string();
        fp.fields.push(field);

        fp.flip();

        assert!(fp.flipped);
        assert_eq!(fp.orientation, -90.0);
        let field = fp.field("Reference").unwrap();
        assert_eq!(field.position, Point::new(1000, 1200));
        assert_eq!(field.layer, "B.SilkS");

        fp.flip();
        assert!(!fp.flipped);
        assert_eq!(fp.field("Reference").unwrap().position, Point::new(1000, 800));
    }

    #[test]
    fn test_track_json_shape() {
        let json = r#"{"type": "segment", "start": {"x": 0, "y": 0}, "end": {"x": 10, "y": 0}, "width": 250000, "layer": "F.Cu", "net": 3}"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.shape.kind(), "segment");
        assert_eq!(track.net, NetCode(3));
        assert!(!track.id.is_assigned());
    }

    #[test]
    fn test_unknown_drawing_kind_is_kept_verbatim() {
        let json = r#"{"type": "bezier", "layer": "F.SilkS", "c1": {"x": 1, "y": 2}}"#;
        let drawing: Drawing = serde_json::from_str(json).unwrap();
        assert_eq!(drawing.shape.kind(), "unknown");
        assert_eq!(drawing.layer, "F.SilkS");

        let written: Value = serde_json::to_value(&drawing).unwrap();
        assert_eq!(written["type"], "bezier");
        assert_eq!(written["c1"], serde_json::json!({"x": 1, "y": 2}));
    }

    #[test]
    fn test_unknown_track_kind_keeps_its_geometry() {
        let json = r#"{"type": "teardrop", "points": [1, 2], "width": 5, "net": 2}"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.shape.kind(), "unknown");
        assert_eq!(track.net, NetCode(2));

        let written: Value = serde_json::to_value(&track).unwrap();
        assert_eq!(written["type"], "teardrop");
        assert_eq!(written["points"], serde_json::json!([1, 2]));
        assert_eq!(written["width"], 5);
    }

    #[test]
    fn test_attributes_of_known_items_survive() {
        let json = r#"{"type": "segment", "start": {"x": 0, "y": 0}, "end": {"x": 1, "y": 0}, "locked": true, "uuid": "abc"}"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.shape.kind(), "segment");
        assert_eq!(track.extra.len(), 2);
        let written: Value = serde_json::to_value(&track).unwrap();
        assert_eq!(written["locked"], true);
        assert_eq!(written["uuid"], "abc");
        assert_eq!(written["type"], "segment");

        let json = r#"{"reference": "U1", "position": {"x": 0, "y": 0}, "attr": ["smd"], "pads": [{"number": "1", "shape": "oval"}]}"#;
        let fp: Footprint = serde_json::from_str(json).unwrap();
        let written: Value = serde_json::to_value(&fp).unwrap();
        assert_eq!(written["attr"], serde_json::json!(["smd"]));
        assert_eq!(written["pads"][0]["shape"], "oval");
    }
}
