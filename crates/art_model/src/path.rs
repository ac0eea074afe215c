//! Typed model of the path data string used by freehand shapes
//!
//! Freehand drawing produces an absolute leading moveto followed by relative
//! line segments, so translating the whole path only needs the leading
//! moveto shifted. Absolute segments further in are shifted as well so that
//! translation stays correct for any well-formed data.

use crate::{ArtModelError, Bounds, Offset, Point, Result};

/// One command in a path data string
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Absolute moveto (`M`)
    MoveTo(Point),
    /// Absolute lineto (`L`)
    LineTo(Point),
    /// Relative lineto (`l`)
    LineBy(Offset),
    /// Absolute cubic curve (`C`): two control points, then the endpoint
    CurveTo(Point, Point, Point),
    /// Relative cubic curve (`c`)
    CurveBy(Offset, Offset, Offset),
    /// Close the subpath (`Z`)
    Close,
}

/// Parsed path data
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathData {
    segments: Vec<PathSegment>,
}

impl PathData {
    /// Start a path at an absolute point
    pub fn start_at(point: Point) -> Self {
        Self {
            segments: vec![PathSegment::MoveTo(point)],
        }
    }

    /// Append a relative line segment
    pub fn line_by(mut self, offset: Offset) -> Self {
        self.segments.push(PathSegment::LineBy(offset));
        self
    }

    /// Append an absolute line segment
    pub fn line_to(mut self, point: Point) -> Self {
        self.segments.push(PathSegment::LineTo(point));
        self
    }

    /// Close the path
    pub fn close(mut self) -> Self {
        self.segments.push(PathSegment::Close);
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The leading moveto, if the path is non-empty
    pub fn start(&self) -> Option<Point> {
        match self.segments.first() {
            Some(PathSegment::MoveTo(point)) => Some(*point),
            _ => None,
        }
    }

    /// Translate the whole path: absolute segments shift, relative segments
    /// already follow their predecessor.
    pub fn translate(&mut self, offset: Offset) {
        for segment in &mut self.segments {
            match segment {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => *p = p.translated(offset),
                PathSegment::CurveTo(c1, c2, p) => {
                    *c1 = c1.translated(offset);
                    *c2 = c2.translated(offset);
                    *p = p.translated(offset);
                }
                PathSegment::LineBy(_) | PathSegment::CurveBy(_, _, _) | PathSegment::Close => {}
            }
        }
    }

    /// Bounding box over every absolute-resolved point, control points
    /// included (the same over-approximation SVG consumers tolerate).
    pub fn bounds(&self) -> Option<Bounds> {
        let mut current = self.start()?;
        let mut min = current;
        let mut max = current;
        let mut grow = |p: Point| {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        };

        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => {
                    current = p;
                    grow(p);
                }
                PathSegment::LineBy(d) => {
                    current = current.translated(d);
                    grow(current);
                }
                PathSegment::CurveTo(c1, c2, p) => {
                    grow(c1);
                    grow(c2);
                    current = p;
                    grow(p);
                }
                PathSegment::CurveBy(d1, d2, d) => {
                    grow(current.translated(d1));
                    grow(current.translated(d2));
                    current = current.translated(d);
                    grow(current);
                }
                PathSegment::Close => {}
            }
        }

        Some(Bounds::from_points(min, max))
    }

    /// Parse path data from its string form
    pub fn parse(d: &str) -> Result<PathData> {
        let mut segments = Vec::new();
        let mut tokens = d
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty());

        fn take_number_from<'a, I: Iterator<Item = &'a str>>(tokens: &mut I) -> Result<f64> {
            let token = tokens.next().ok_or_else(|| {
                ArtModelError::InvalidPathData("unexpected end of path data".to_string())
            })?;
            token.parse::<f64>().map_err(|_| {
                ArtModelError::InvalidPathData(format!("expected a number, found '{}'", token))
            })
        }

        while let Some(token) = tokens.next() {
            match token {
                "M" => {
                    let x = take_number_from(&mut tokens)?;
                    let y = take_number_from(&mut tokens)?;
                    segments.push(PathSegment::MoveTo(Point::new(x, y)));
                }
                "L" => {
                    let x = take_number_from(&mut tokens)?;
                    let y = take_number_from(&mut tokens)?;
                    segments.push(PathSegment::LineTo(Point::new(x, y)));
                }
                "l" => {
                    let dx = take_number_from(&mut tokens)?;
                    let dy = take_number_from(&mut tokens)?;
                    segments.push(PathSegment::LineBy(Offset::new(dx, dy)));
                }
                "C" => {
                    let x1 = take_number_from(&mut tokens)?;
                    let y1 = take_number_from(&mut tokens)?;
                    let x2 = take_number_from(&mut tokens)?;
                    let y2 = take_number_from(&mut tokens)?;
                    let x = take_number_from(&mut tokens)?;
                    let y = take_number_from(&mut tokens)?;
                    segments.push(PathSegment::CurveTo(
                        Point::new(x1, y1),
                        Point::new(x2, y2),
                        Point::new(x, y),
                    ));
                }
                "c" => {
                    let dx1 = take_number_from(&mut tokens)?;
                    let dy1 = take_number_from(&mut tokens)?;
                    let dx2 = take_number_from(&mut tokens)?;
                    let dy2 = take_number_from(&mut tokens)?;
                    let dx = take_number_from(&mut tokens)?;
                    let dy = take_number_from(&mut tokens)?;
                    segments.push(PathSegment::CurveBy(
                        Offset::new(dx1, dy1),
                        Offset::new(dx2, dy2),
                        Offset::new(dx, dy),
                    ));
                }
                "Z" | "z" => segments.push(PathSegment::Close),
                other => {
                    return Err(ArtModelError::InvalidPathData(format!(
                        "unsupported path command '{}'",
                        other
                    )))
                }
            }
        }

        if !matches!(segments.first(), Some(PathSegment::MoveTo(_))) {
            return Err(ArtModelError::InvalidPathData(
                "path data must begin with an absolute moveto".to_string(),
            ));
        }

        Ok(PathData { segments })
    }
}

impl std::fmt::Display for PathData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                write!(f, " ")?;
            }
            match *segment {
                PathSegment::MoveTo(p) => write!(f, "M {} {}", p.x, p.y)?,
                PathSegment::LineTo(p) => write!(f, "L {} {}", p.x, p.y)?,
                PathSegment::LineBy(d) => write!(f, "l {} {}", d.dx, d.dy)?,
                PathSegment::CurveTo(c1, c2, p) => {
                    write!(f, "C {} {} {} {} {} {}", c1.x, c1.y, c2.x, c2.y, p.x, p.y)?
                }
                PathSegment::CurveBy(d1, d2, d) => write!(
                    f,
                    "c {} {} {} {} {} {}",
                    d1.dx, d1.dy, d2.dx, d2.dy, d.dx, d.dy
                )?,
                PathSegment::Close => write!(f, "Z")?,
            }
        }
        Ok(())
    }
}
