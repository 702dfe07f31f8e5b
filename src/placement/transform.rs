//! Rigid transform from room coordinates to target board coordinates.
//!
//! The transform is derived from one anchor footprint present in both the room
//! and the target board: every room item keeps its offset and rotation
//! relative to the room anchor, re-expressed relative to the target anchor.
//!
//! ## Angle Convention
//!
//! Board angles are in degrees, counter-clockwise positive as seen on screen.
//! Because the y axis points down, rotating an offset `(dx, dy)` by `θ` is:
//! ```text
//! x' =  dx * cos(θ) + dy * sin(θ)
//! y' = -dx * sin(θ) + dy * cos(θ)
//! ```
//! Results are rounded half away from zero to whole nanometres so repeated
//! runs on the same room reproduce the same coordinates.

use crate::board::{
    normalize_angle, round_to_nm, Drawing, DrawingShape, Field, Footprint, ItemId, Point, Track,
    TrackShape, Zone,
};

/// Position and orientation of an anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Point,
    /// Orientation in degrees
    pub orientation: f64,
}

impl Pose {
    pub fn new(position: Point, orientation: f64) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

impl From<&Footprint> for Pose {
    fn from(fp: &Footprint) -> Self {
        Self::new(fp.position, fp.orientation)
    }
}

/// Maps room coordinates onto the target board
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionTransform {
    /// Anchor pose in the room
    pub template: Pose,
    /// Anchor pose on the target board
    pub target: Pose,
}

impl PositionTransform {
    pub fn new(template: Pose, target: Pose) -> Self {
        Self { template, target }
    }

    /// The transform mapping target coordinates back into the room
    pub fn inverse(&self) -> Self {
        Self {
            template: self.target,
            target: self.template,
        }
    }

    /// Rotation applied by this transform, in degrees
    pub fn rotation(&self) -> f64 {
        self.target.orientation - self.template.orientation
    }

    /// Whether the rotation is a whole number of quarter turns
    pub fn is_right_angle(&self) -> bool {
        let quarter = self.rotation() / 90.0;
        (quarter - quarter.round()).abs() < 1e-9
    }

    /// Map a room point onto the target board
    pub fn point(&self, p: Point) -> Point {
        let dx = (p.x - self.template.position.x) as f64;
        let dy = (p.y - self.template.position.y) as f64;
        let theta = self.rotation().to_radians();
        let (sin, cos) = theta.sin_cos();

        let x = dx * cos + dy * sin + self.target.position.x as f64;
        let y = -dx * sin + dy * cos + self.target.position.y as f64;
        Point::new(round_to_nm(x), round_to_nm(y))
    }

    /// Map a room orientation onto the target board
    pub fn angle(&self, degrees: f64) -> f64 {
        normalize_angle(degrees - self.template.orientation + self.target.orientation)
    }

    /// Place `target` where `template` sits in the room, relative to the target anchor.
    ///
    /// The flip state is corrected first so that flips never accumulate across runs.
    pub fn footprint(&self, template: &Footprint, target: &mut Footprint) {
        if template.flipped != target.flipped {
            target.flip();
        }

        target.local_clearance = template.local_clearance;
        target.solder_mask_margin = template.solder_mask_margin;
        target.solder_paste_margin = template.solder_paste_margin;
        target.solder_paste_ratio = template.solder_paste_ratio;
        target.zone_connection = template.zone_connection;

        target.position = self.point(template.position);
        target.orientation = self.angle(template.orientation);
    }

    /// Move a footprint field to match its room counterpart.
    ///
    /// Only the position is transformed; a field's rotation stacks with its
    /// footprint's and is left alone.
    pub fn field(&self, src: &Field, dst: &mut Field) {
        dst.copy_style_from(src);
        dst.position = self.point(src.position);
    }

    /// A copy of `track` placed on the target board. The net is left unchanged.
    pub fn track(&self, track: &Track) -> Track {
        let shape = match &track.shape {
            TrackShape::Segment { start, end } => TrackShape::Segment {
                start: self.point(*start),
                end: self.point(*end),
            },
            TrackShape::Arc { start, mid, end } => TrackShape::Arc {
                start: self.point(*start),
                mid: self.point(*mid),
                end: self.point(*end),
            },
            TrackShape::Via { position, drill } => TrackShape::Via {
                position: self.point(*position),
                drill: *drill,
            },
            TrackShape::Unknown(raw) => TrackShape::Unknown(raw.clone()),
        };
        Track {
            id: ItemId::default(),
            shape,
            width: track.width,
            layer: track.layer.clone(),
            net: track.net,
            extra: track.extra.clone(),
        }
    }

    /// A copy of `zone` placed on the target board.
    ///
    /// The board model positions zones by their outline vertices directly, so
    /// each vertex is transformed in place of a move-to-origin-then-target step.
    pub fn zone(&self, zone: &Zone) -> Zone {
        Zone {
            id: ItemId::default(),
            name: zone.name.clone(),
            outline: zone.outline.iter().map(|p| self.point(*p)).collect(),
            layer: zone.layer.clone(),
            net: zone.net,
            priority: zone.priority,
            extra: zone.extra.clone(),
        }
    }

    /// A copy of a free graphic placed on the target board
    pub fn drawing(&self, drawing: &Drawing) -> Drawing {
        let shape = match &drawing.shape {
            DrawingShape::Line { start, end } => DrawingShape::Line {
                start: self.point(*start),
                end: self.point(*end),
            },
            DrawingShape::Arc { start, mid, end } => DrawingShape::Arc {
                start: self.point(*start),
                mid: self.point(*mid),
                end: self.point(*end),
            },
            DrawingShape::Circle { center, end } => DrawingShape::Circle {
                center: self.point(*center),
                end: self.point(*end),
            },
            DrawingShape::Rect { start, end } => self.rect(*start, *end),
            DrawingShape::Polygon { points } => DrawingShape::Polygon {
                points: points.iter().map(|p| self.point(*p)).collect(),
            },
            DrawingShape::Text {
                position,
                angle,
                text,
            } => DrawingShape::Text {
                position: self.point(*position),
                angle: self.angle(*angle),
                text: text.clone(),
            },
            DrawingShape::Unknown(raw) => DrawingShape::Unknown(raw.clone()),
        };
        Drawing {
            id: ItemId::default(),
            shape,
            layer: drawing.layer.clone(),
            width: drawing.width,
            extra: drawing.extra.clone(),
        }
    }

    /// Rectangles stay rectangles under quarter turns and become polygons otherwise
    fn rect(&self, start: Point, end: Point) -> DrawingShape {
        if self.is_right_angle() {
            return DrawingShape::Rect {
                start: self.point(start),
                end: self.point(end),
            };
        }
        let corners = [
            start,
            Point::new(end.x, start.y),
            end,
            Point::new(start.x, end.y),
        ];
        DrawingShape::Polygon {
            points: corners.iter().map(|p| self.point(*p)).collect(),
        }
    }
}
