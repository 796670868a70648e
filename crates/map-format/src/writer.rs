use std::fmt::{self, Write};

use brush_kernel::Polyhedron;
use tracing::debug;

use crate::errors::FormatError;
use crate::face::{FaceRecord, SurfaceAttributes, TextureAttributes, TextureAxes};
use crate::format::{FaceDialect, MapFormat};
use crate::numbers::{ftos, general, FLOAT_PRECISION, VALVE_PRECISION};

impl FaceDialect {
    /// Write one face as a single line, newline included.
    pub fn write_face<W: Write>(&self, out: &mut W, face: &FaceRecord) -> fmt::Result {
        write_points(out, face)?;
        out.write_char(' ')?;
        match self {
            FaceDialect::Quake => write_texture(out, &face.texture)?,
            FaceDialect::Quake2 => {
                write_texture(out, &face.texture)?;
                // Always written, even when zero, so other tools parse the line.
                out.write_char(' ')?;
                write_surface(out, &face.surface.unwrap_or_default())?;
            }
            FaceDialect::Daikatana => {
                write_texture(out, &face.texture)?;
                if face.surface.is_some() || face.color.is_some() {
                    out.write_char(' ')?;
                    write_surface(out, &face.surface.unwrap_or_default())?;
                }
                if let Some([r, g, b]) = face.color {
                    write!(out, " {r} {g} {b}")?;
                }
            }
            FaceDialect::Valve => write_valve_texture(out, face)?,
            FaceDialect::Hexen2 => {
                write_texture(out, &face.texture)?;
                out.write_str(" 0")?;
            }
        }
        out.write_char('\n')
    }
}

fn write_points<W: Write>(out: &mut W, face: &FaceRecord) -> fmt::Result {
    for (i, p) in face.points.iter().enumerate() {
        if i > 0 {
            out.write_char(' ')?;
        }
        write!(
            out,
            "( {} {} {} )",
            ftos(p.x, FLOAT_PRECISION),
            ftos(p.y, FLOAT_PRECISION),
            ftos(p.z, FLOAT_PRECISION)
        )?;
    }
    Ok(())
}

fn write_texture<W: Write>(out: &mut W, texture: &TextureAttributes) -> fmt::Result {
    write!(
        out,
        "{} {} {} {} {} {}",
        texture.written_name(),
        ftos(texture.x_offset, FLOAT_PRECISION),
        ftos(texture.y_offset, FLOAT_PRECISION),
        ftos(texture.rotation, FLOAT_PRECISION),
        ftos(texture.x_scale, FLOAT_PRECISION),
        ftos(texture.y_scale, FLOAT_PRECISION)
    )
}

fn write_surface<W: Write>(out: &mut W, surface: &SurfaceAttributes) -> fmt::Result {
    write!(out, "{} {} {}", surface.contents, surface.flags, ftos(surface.value, FLOAT_PRECISION))
}

fn write_valve_texture<W: Write>(out: &mut W, face: &FaceRecord) -> fmt::Result {
    let axes = face.axes.unwrap_or_else(|| {
        let [p0, p1, p2] = face.points;
        TextureAxes::paraxial(&(p2 - p0).cross(&(p1 - p0)))
    });
    let g = |v: f64| general(v, VALVE_PRECISION);
    let t = &face.texture;
    write!(
        out,
        "{} [ {} {} {} {} ] [ {} {} {} {} ] {} {} {}",
        t.written_name(),
        g(axes.x_axis.x),
        g(axes.x_axis.y),
        g(axes.x_axis.z),
        g(t.x_offset),
        g(axes.y_axis.x),
        g(axes.y_axis.y),
        g(axes.y_axis.z),
        g(t.y_offset),
        g(t.rotation),
        g(t.x_scale),
        g(t.y_scale)
    )
}

/// Writes entities and brushes in the `.map` block layout, numbering each
/// block with a comment.
pub struct BrushWriter<W: Write> {
    out: W,
    dialect: FaceDialect,
    entity_no: usize,
    brush_no: usize,
}

impl<W: Write> BrushWriter<W> {
    pub fn new(out: W, dialect: FaceDialect) -> Self {
        Self { out, dialect, entity_no: 0, brush_no: 0 }
    }

    pub fn for_format(out: W, format: MapFormat) -> Result<Self, FormatError> {
        Ok(Self::new(out, FaceDialect::for_format(format)?))
    }

    pub fn dialect(&self) -> FaceDialect {
        self.dialect
    }

    /// Open an entity block and write its key/value pairs. Brush numbers
    /// restart inside each entity.
    pub fn begin_entity(&mut self, attributes: &[(&str, &str)]) -> Result<(), FormatError> {
        writeln!(self.out, "// entity {}", self.entity_no)?;
        self.out.write_str("{\n")?;
        for (key, value) in attributes {
            writeln!(self.out, "\"{}\" \"{}\"", escape(key), escape(value))?;
        }
        self.brush_no = 0;
        Ok(())
    }

    pub fn end_entity(&mut self) -> Result<(), FormatError> {
        self.out.write_str("}\n")?;
        self.entity_no += 1;
        Ok(())
    }

    pub fn write_brush(&mut self, faces: &[FaceRecord]) -> Result<(), FormatError> {
        writeln!(self.out, "// brush {}", self.brush_no)?;
        self.out.write_str("{\n")?;
        for face in faces {
            self.dialect.write_face(&mut self.out, face)?;
        }
        self.out.write_str("}\n")?;
        self.brush_no += 1;
        Ok(())
    }

    /// Write every face of `poly` with the same texture.
    pub fn write_polyhedron(&mut self, poly: &Polyhedron, texture: &TextureAttributes) -> Result<(), FormatError> {
        let faces = poly
            .face_ids()
            .iter()
            .map(|&f| FaceRecord::from_face(poly, f, texture.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(faces = faces.len(), dialect = ?self.dialect, "writing brush");
        self.write_brush(&faces)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn escape(s: &str) -> String {
    s.replace('"', "\\\"")
}
