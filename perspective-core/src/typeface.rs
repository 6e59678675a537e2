/// Typeface JSON loading and outline parsing.
///
/// Glyph outlines are stored as strings of space separated drawing commands
/// in font units:
///
/// ```text
/// m x y                      move to
/// l x y                      line to
/// q x y cx cy                quadratic curve to (x, y) through control (cx, cy)
/// b x y c1x c1y c2x c2y      cubic curve to (x, y)
/// z                          close (optional, contours close implicitly)
/// ```
use std::collections::HashMap;

use log::warn;
use nalgebra::Point2;
use nom::{
    branch::alt,
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, map, value},
    multi::many0,
    number::complete::float,
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};
use serde::Deserialize;

use crate::error::FontError;

/// One outline drawing command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlineCommand {
    MoveTo(Point2<f32>),
    LineTo(Point2<f32>),
    QuadTo {
        ctrl: Point2<f32>,
        to: Point2<f32>,
    },
    CubicTo {
        ctrl1: Point2<f32>,
        ctrl2: Point2<f32>,
        to: Point2<f32>,
    },
    Close,
}

impl OutlineCommand {
    fn transformed(self, scale: f32, offset: Point2<f32>) -> Self {
        let t = |p: Point2<f32>| Point2::new(p.x * scale + offset.x, p.y * scale + offset.y);
        match self {
            Self::MoveTo(p) => Self::MoveTo(t(p)),
            Self::LineTo(p) => Self::LineTo(t(p)),
            Self::QuadTo { ctrl, to } => Self::QuadTo {
                ctrl: t(ctrl),
                to: t(to),
            },
            Self::CubicTo { ctrl1, ctrl2, to } => Self::CubicTo {
                ctrl1: t(ctrl1),
                ctrl2: t(ctrl2),
                to: t(to),
            },
            Self::Close => Self::Close,
        }
    }
}

/// Parse a glyph outline string
pub fn parse_outline(input: &str) -> Result<Vec<OutlineCommand>, String> {
    match all_consuming(terminated(many0(parse_command), multispace0))(input) {
        Ok((_, commands)) => Ok(commands),
        Err(e) => Err(format!("{:?}", e)),
    }
}

fn parse_command(input: &str) -> IResult<&str, OutlineCommand> {
    preceded(
        multispace0,
        alt((
            map(preceded(char('m'), parse_point), OutlineCommand::MoveTo),
            map(preceded(char('l'), parse_point), OutlineCommand::LineTo),
            map(preceded(char('q'), pair(parse_point, parse_point)), |(to, ctrl)| {
                OutlineCommand::QuadTo { ctrl, to }
            }),
            map(
                preceded(char('b'), tuple((parse_point, parse_point, parse_point))),
                |(to, ctrl1, ctrl2)| OutlineCommand::CubicTo { ctrl1, ctrl2, to },
            ),
            value(OutlineCommand::Close, char('z')),
        )),
    )(input)
}

fn parse_point(input: &str) -> IResult<&str, Point2<f32>> {
    let (input, x) = preceded(multispace1, float)(input)?;
    let (input, y) = preceded(multispace1, float)(input)?;
    Ok((input, Point2::new(x, y)))
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBoundingBox {
    #[serde(default)]
    y_min: f32,
    #[serde(default)]
    y_max: f32,
}

#[derive(Debug, Deserialize)]
struct RawGlyph {
    #[serde(default)]
    ha: f32,
    #[serde(default)]
    o: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTypeface {
    glyphs: HashMap<String, RawGlyph>,
    resolution: f32,
    #[serde(default)]
    bounding_box: RawBoundingBox,
    #[serde(default)]
    underline_thickness: f32,
    #[serde(default)]
    family_name: Option<String>,
}

/// A parsed glyph: horizontal advance and outline in font units
#[derive(Debug, Clone)]
pub struct Glyph {
    pub advance: f32,
    pub outline: Vec<OutlineCommand>,
}

/// Contours of one laid-out glyph, scaled to world units
#[derive(Debug, Clone)]
pub struct GlyphPath {
    pub ch: char,
    pub commands: Vec<OutlineCommand>,
}

#[derive(Debug, Clone)]
pub struct Typeface {
    pub family_name: String,
    glyphs: HashMap<char, Glyph>,
    resolution: f32,
    line_height_units: f32,
}

impl Typeface {
    /// Parse a typeface JSON document. Fonts parse synchronously.
    pub fn from_json(json: &str) -> Result<Self, FontError> {
        let raw: RawTypeface = serde_json::from_str(json)?;
        if !(raw.resolution > 0.0) {
            return Err(FontError::Resolution(raw.resolution));
        }

        let mut glyphs = HashMap::with_capacity(raw.glyphs.len());
        for (key, glyph) in raw.glyphs {
            let mut chars = key.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                warn!("Skipping multi-character glyph key {:?}", key);
                continue;
            };
            let outline = match glyph.o.as_deref() {
                Some(o) => parse_outline(o).map_err(|message| FontError::Outline { glyph: ch, message })?,
                None => Vec::new(),
            };
            glyphs.insert(
                ch,
                Glyph {
                    advance: glyph.ha,
                    outline,
                },
            );
        }

        Ok(Self {
            family_name: raw.family_name.unwrap_or_default(),
            glyphs,
            resolution: raw.resolution,
            line_height_units: raw.bounding_box.y_max - raw.bounding_box.y_min
                + raw.underline_thickness,
        })
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    pub fn line_height(&self, size: f32) -> f32 {
        self.line_height_units * size / self.resolution
    }

    /// Lay out `text` at `size` world units per em.
    ///
    /// Missing glyphs fall back to `?`; when that is missing too the character
    /// is dropped without advancing. `\n` starts a new line below.
    pub fn layout(&self, text: &str, size: f32) -> Vec<GlyphPath> {
        let scale = size / self.resolution;
        let line_height = self.line_height(size);
        let mut offset = Point2::new(0.0f32, 0.0f32);
        let mut paths = Vec::new();

        for ch in text.chars() {
            if ch == '\n' {
                offset.x = 0.0;
                offset.y -= line_height;
                continue;
            }
            let Some(glyph) = self.glyph(ch).or_else(|| self.glyph('?')) else {
                warn!(
                    "Character {:?} does not exist in typeface {:?}",
                    ch, self.family_name
                );
                continue;
            };
            paths.push(GlyphPath {
                ch,
                commands: glyph
                    .outline
                    .iter()
                    .map(|c| c.transformed(scale, offset))
                    .collect(),
            });
            offset.x += glyph.advance * scale;
        }

        paths
    }
}
