use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::FormatError;

/// Map file formats known to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapFormat {
    Standard,
    Quake2,
    Quake3,
    Quake3Legacy,
    Daikatana,
    Valve,
    Hexen2,
    Unknown,
}

impl MapFormat {
    pub fn name(&self) -> &'static str {
        match self {
            MapFormat::Standard => "Standard",
            MapFormat::Quake2 => "Quake2",
            MapFormat::Quake3 => "Quake3",
            MapFormat::Quake3Legacy => "Quake3 (legacy)",
            MapFormat::Daikatana => "Daikatana",
            MapFormat::Valve => "Valve",
            MapFormat::Hexen2 => "Hexen2",
            MapFormat::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for MapFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MapFormat {
    type Err = FormatError;

    /// Parse a format name as written in game configurations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Standard" => Ok(MapFormat::Standard),
            "Quake2" => Ok(MapFormat::Quake2),
            "Quake3" => Ok(MapFormat::Quake3),
            "Quake3 (legacy)" | "Quake3Legacy" => Ok(MapFormat::Quake3Legacy),
            "Daikatana" => Ok(MapFormat::Daikatana),
            "Valve" => Ok(MapFormat::Valve),
            "Hexen2" => Ok(MapFormat::Hexen2),
            "Unknown" => Ok(MapFormat::Unknown),
            other => Err(FormatError::UnknownFormat(other.to_string())),
        }
    }
}

/// How one brush face is rendered to text. Each dialect extends the plain
/// Quake record with a little extra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceDialect {
    /// Points, texture name, offsets, rotation and scale.
    Quake,
    /// Quake plus surface contents, flags and value.
    Quake2,
    /// Quake2 with optional surface attributes and an optional colour.
    Daikatana,
    /// Texture axes instead of the implicit projection.
    Valve,
    /// Quake plus a trailing zero.
    Hexen2,
}

impl FaceDialect {
    /// The writer for a map format. Quake 3 maps are written with the
    /// Quake 2 writer.
    pub fn for_format(format: MapFormat) -> Result<Self, FormatError> {
        match format {
            MapFormat::Standard => Ok(FaceDialect::Quake),
            MapFormat::Quake2 | MapFormat::Quake3 | MapFormat::Quake3Legacy => Ok(FaceDialect::Quake2),
            MapFormat::Daikatana => Ok(FaceDialect::Daikatana),
            MapFormat::Valve => Ok(FaceDialect::Valve),
            MapFormat::Hexen2 => Ok(FaceDialect::Hexen2),
            MapFormat::Unknown => Err(FormatError::UnsupportedFormat(format)),
        }
    }
}
