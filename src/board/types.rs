//! Core value types shared by every board item

use std::fmt;

use serde::{Deserialize, Serialize};

/// Nanometres per millimetre, the board's integer length unit
pub const NM_PER_MM: f64 = 1_000_000.0;

/// A point on the board in integer nanometres.
///
/// The y axis points down, as on every PCB editor canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Build a point from millimetre coordinates, rounding to the nearest nanometre
    pub fn from_mm(x: f64, y: f64) -> Self {
        Self {
            x: round_to_nm(x * NM_PER_MM),
            y: round_to_nm(y * NM_PER_MM),
        }
    }

    pub fn offset(&self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.4}, {:.4})",
            self.x as f64 / NM_PER_MM,
            self.y as f64 / NM_PER_MM
        )
    }
}

/// Width and height of an item's bounding box, in nanometres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i64,
    pub height: i64,
}

impl Size {
    pub fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    /// Area in mm²
    pub fn area_mm2(&self) -> f64 {
        (self.width as f64 / NM_PER_MM) * (self.height as f64 / NM_PER_MM)
    }
}

/// Round a floating point coordinate to the integer unit, half away from zero.
///
/// `f64::round` already rounds half away from zero; the helper exists so every
/// caller goes through the same conversion.
pub fn round_to_nm(value: f64) -> i64 {
    value.round() as i64
}

/// Normalize an angle in degrees into `(-180, 180]`
pub fn normalize_angle(degrees: f64) -> f64 {
    let mut a = degrees % 360.0;
    if a <= -180.0 {
        a += 360.0;
    } else if a > 180.0 {
        a -= 360.0;
    }
    // Avoid handing out negative zero.
    if a == 0.0 {
        0.0
    } else {
        a
    }
}

/// Identifier of an item inside one board. `0` means "not yet assigned".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl ItemId {
    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Electrical net code, local to one board. `NetCode::NONE` is "no net".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NetCode(pub u32);

impl NetCode {
    pub const NONE: NetCode = NetCode(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

/// A named net
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Net {
    pub code: NetCode,
    pub name: String,
}

impl Net {
    /// Global nets (power symbols, global labels) are not prefixed with a sheet path
    pub fn is_global(&self) -> bool {
        !self.name.is_empty() && !self.name.starts_with('/')
    }
}

/// Registry of the nets declared on a board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetRegistry {
    nets: Vec<Net>,
}

impl NetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a net by its code
    pub fn get(&self, code: NetCode) -> Option<&Net> {
        self.nets.iter().find(|n| n.code == code)
    }

    /// Look up a net code by name
    pub fn find(&self, name: &str) -> Option<NetCode> {
        self.nets.iter().find(|n| n.name == name).map(|n| n.code)
    }

    /// Look up a net by name, registering it with a fresh code if absent
    pub fn find_or_create(&mut self, name: &str) -> NetCode {
        if let Some(code) = self.find(name) {
            return code;
        }
        let next = self.nets.iter().map(|n| n.code.0).max().unwrap_or(0) + 1;
        let code = NetCode(next);
        self.nets.push(Net {
            code,
            name: name.to_string(),
        });
        code
    }

    pub fn iter(&self) -> impl Iterator<Item = &Net> {
        self.nets.iter()
    }

    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }
}
