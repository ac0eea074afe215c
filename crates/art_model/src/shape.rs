//! Shape variants and capability traits
//!
//! Shapes are a closed sum type (`ArtShape`) over per-variant structs, each
//! wrapping a retained element plus an optional command sink. Capabilities
//! (stroke, fill, text) are separate traits implemented only by the variants
//! that carry them. Setters construct the matching command, execute it, and
//! route a copy to the sink when one is attached; without a sink the
//! mutation still applies, just untracked.

use crate::{
    ArtCommand, ArtModelError, AttrValue, Bounds, CommandEvent, DragSession, Element, ElementTag,
    NamespacedAttr, Offset, PathData, Point, Result, ShapeData, ShapeRecord, SinkRef,
};

/// XML namespace used for image hrefs
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Font size applied to text shapes that specify none
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Shared per-shape state: the render handle and the optional command sink
#[derive(Clone)]
struct ShapeCore {
    element: Element,
    sink: Option<SinkRef>,
    data: Option<serde_json::Value>,
}

impl std::fmt::Debug for ShapeCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeCore")
            .field("element", &self.element)
            .field("sink", &self.sink.as_ref().map(|_| "CommandSink"))
            .field("data", &self.data)
            .finish()
    }
}

impl ShapeCore {
    fn new(element: Element) -> Self {
        Self {
            element,
            sink: None,
            data: None,
        }
    }

    /// Execute a command and route a copy to the attached sink, if any.
    /// Returns the executed command so callers can batch it.
    fn submit(&self, mut command: ArtCommand) -> Result<ArtCommand> {
        command.execute()?;
        if let Some(sink) = &self.sink {
            sink.borrow_mut().append_command(command.clone());
        }
        Ok(command)
    }

    fn set_style_prop(&self, prop: &str, value: &str) -> Result<ArtCommand> {
        self.submit(ArtCommand::style_prop(self.element.clone(), prop, value))
    }

    fn set_number_attr(&self, name: &str, value: f64) -> Result<ArtCommand> {
        self.submit(ArtCommand::attr(
            self.element.clone(),
            vec![(name.to_string(), AttrValue::Number(value))],
        ))
    }

    fn set_text_attr(&self, name: &str, value: &str) -> Result<ArtCommand> {
        self.submit(ArtCommand::attr(
            self.element.clone(),
            vec![(name.to_string(), AttrValue::from(value))],
        ))
    }
}

// ===========================================================================
// Per-variant position and movement, dispatched on the element tag
// ===========================================================================

/// Current position of a shape element: x/y attributes for rect, image, and
/// text; the center for ellipses; the leading moveto for paths.
pub(crate) fn position_of(element: &Element) -> Result<Point> {
    match element.tag() {
        ElementTag::Rect | ElementTag::Image | ElementTag::Text => Ok(Point::new(
            element.number_attr("x").unwrap_or(0.0),
            element.number_attr("y").unwrap_or(0.0),
        )),
        ElementTag::Ellipse => Ok(Point::new(
            element.number_attr("cx").unwrap_or(0.0),
            element.number_attr("cy").unwrap_or(0.0),
        )),
        ElementTag::Path => {
            let data = path_data_of(element)?;
            data.start().ok_or_else(|| {
                ArtModelError::InvalidPathData("path has no leading moveto".to_string())
            })
        }
        ElementTag::Layer => Err(ArtModelError::InvalidRecord(
            "layer elements have no position".to_string(),
        )),
    }
}

/// Build the attr command that moves a shape element by `offset`
pub(crate) fn move_command(element: &Element, offset: Offset) -> Result<ArtCommand> {
    match element.tag() {
        ElementTag::Rect | ElementTag::Image | ElementTag::Text => {
            let position = position_of(element)?;
            Ok(ArtCommand::attr(
                element.clone(),
                vec![
                    ("x".to_string(), AttrValue::Number(position.x + offset.dx)),
                    ("y".to_string(), AttrValue::Number(position.y + offset.dy)),
                ],
            ))
        }
        ElementTag::Ellipse => {
            let position = position_of(element)?;
            Ok(ArtCommand::attr(
                element.clone(),
                vec![
                    ("cx".to_string(), AttrValue::Number(position.x + offset.dx)),
                    ("cy".to_string(), AttrValue::Number(position.y + offset.dy)),
                ],
            ))
        }
        ElementTag::Path => {
            let mut data = path_data_of(element)?;
            data.translate(offset);
            Ok(ArtCommand::attr(
                element.clone(),
                vec![("d".to_string(), AttrValue::from(data.to_string()))],
            ))
        }
        ElementTag::Layer => Err(ArtModelError::InvalidRecord(
            "layer elements cannot be moved".to_string(),
        )),
    }
}

/// Direct, history-bypassing translation used by drag sessions
pub(crate) fn translate_direct(element: &Element, offset: Offset) -> Result<()> {
    match element.tag() {
        ElementTag::Rect | ElementTag::Image | ElementTag::Text => {
            let position = position_of(element)?;
            element.set_attr("x", position.x + offset.dx);
            element.set_attr("y", position.y + offset.dy);
            Ok(())
        }
        ElementTag::Ellipse => {
            let position = position_of(element)?;
            element.set_attr("cx", position.x + offset.dx);
            element.set_attr("cy", position.y + offset.dy);
            Ok(())
        }
        ElementTag::Path => {
            let mut data = path_data_of(element)?;
            let cached = element.cached_path_bounds();
            data.translate(offset);
            element.set_attr("d", data.to_string());
            if let Some(bounds) = cached {
                element.set_cached_path_bounds(Some(bounds.translated(offset)));
            }
            Ok(())
        }
        ElementTag::Layer => Err(ArtModelError::InvalidRecord(
            "layer elements cannot be moved".to_string(),
        )),
    }
}

fn path_data_of(element: &Element) -> Result<PathData> {
    let d = element
        .attr("d")
        .and_then(|v| v.as_text().map(str::to_string))
        .ok_or_else(|| ArtModelError::InvalidPathData("path element has no data".to_string()))?;
    PathData::parse(&d)
}

// ===========================================================================
// The common shape contract
// ===========================================================================

pub trait Shape {
    /// The shape's render handle, a stable identity usable for
    /// parent/child attachment
    fn element(&self) -> Element;

    /// Wire discriminator ("path", "rect", ...)
    fn shape_type(&self) -> &'static str;

    /// Visual bounding box at the shape's current position
    fn bounds(&self) -> Bounds;

    fn command_sink(&self) -> Option<SinkRef>;
    fn set_command_sink(&mut self, sink: Option<SinkRef>);

    /// Opaque payload the host application may attach; carried through
    /// serialization untouched
    fn user_data(&self) -> Option<serde_json::Value>;
    fn set_user_data(&mut self, data: Option<serde_json::Value>);

    fn has_command_sink(&self) -> bool {
        self.command_sink().is_some()
    }

    /// True iff the shape has no parent attachment
    fn is_alone(&self) -> bool {
        !self.element().is_attached()
    }

    /// Point hit-test. A shape that is alone never matches.
    fn hit_test(&self, x: f64, y: f64) -> bool {
        !self.is_alone() && self.bounds().contains(Point::new(x, y))
    }

    /// Full-containment test against `area`. A shape that is alone never
    /// matches; a shape merely overlapping the area does not either.
    fn is_in_bounds(&self, area: &Bounds) -> bool {
        !self.is_alone() && area.contains_bounds(&self.bounds())
    }

    /// Move by a relative offset. Builds the attr command, executes it,
    /// routes a copy to the attached sink, and returns the command so a
    /// caller can batch it into a sequence. Without a sink the mutation is
    /// applied immediately with no history tracking.
    fn move_by(&mut self, offset: Offset) -> Result<ArtCommand> {
        let mut command = move_command(&self.element(), offset)?;
        command.execute()?;
        if let Some(sink) = self.command_sink() {
            sink.borrow_mut().append_command(command.clone());
        }
        Ok(command)
    }

    /// Move to an absolute position (the same attribute set `move_by`
    /// shifts)
    fn move_to(&mut self, point: Point) -> Result<ArtCommand> {
        let current = position_of(&self.element())?;
        self.move_by(current.offset_to(point))
    }

    /// Snapshot this shape into its wire record
    fn serialize(&self) -> ShapeRecord {
        let element = self.element();
        let attrs_ns = element.attrs_ns();
        let data = ShapeData {
            text_content: element.text(),
            extra: self.user_data(),
        };
        ShapeRecord {
            shape_type: self.shape_type().to_string(),
            attr: element.attrs(),
            attr_ns: (!attrs_ns.is_empty()).then_some(attrs_ns),
            style: element.styles(),
            data: (!data.is_empty()).then_some(data),
        }
    }

    /// Start an interactive move. A session already active on this shape is
    /// cancelled first (its visual position reverts).
    fn begin_drag(&mut self) -> Result<DragSession> {
        DragSession::begin(self.element(), self.command_sink())
    }
}

// ===========================================================================
// Capability traits
// ===========================================================================

/// Shapes with a stroked outline (path, rect, ellipse)
pub trait HasStroke: Shape {
    fn stroke_color(&self) -> Option<String> {
        self.element().style("stroke")
    }

    fn stroke_width(&self) -> Option<f64> {
        self.element()
            .style("stroke-width")
            .and_then(|v| v.parse().ok())
    }

    fn stroke_opacity(&self) -> Option<f64> {
        self.element()
            .style("stroke-opacity")
            .and_then(|v| v.parse().ok())
    }

    fn set_stroke_color(&mut self, color: &str) -> Result<ArtCommand>;
    fn set_stroke_width(&mut self, width: f64) -> Result<ArtCommand>;
    fn set_stroke_opacity(&mut self, opacity: f64) -> Result<ArtCommand>;
}

/// Shapes with a filled interior (rect, ellipse)
pub trait HasFill: Shape {
    fn fill_color(&self) -> Option<String> {
        self.element().style("fill")
    }

    fn fill_opacity(&self) -> Option<f64> {
        self.element()
            .style("fill-opacity")
            .and_then(|v| v.parse().ok())
    }

    fn set_fill_color(&mut self, color: &str) -> Result<ArtCommand>;
    fn set_fill_opacity(&mut self, opacity: f64) -> Result<ArtCommand>;
}

/// Shapes carrying a text run (text only)
pub trait HasText: Shape {
    fn text_content(&self) -> Option<String> {
        self.element().text()
    }

    fn font_size(&self) -> Option<f64> {
        self.element().number_attr("font-size")
    }

    fn font_family(&self) -> Option<String> {
        self.element()
            .attr("font-family")
            .and_then(|v| v.as_text().map(str::to_string))
    }

    fn set_text_content(&mut self, text: &str) -> Result<ArtCommand>;
    fn set_font_size(&mut self, size: f64) -> Result<ArtCommand>;
    fn set_font_family(&mut self, family: &str) -> Result<ArtCommand>;
}

// ===========================================================================
// Concrete variants
// ===========================================================================

/// Freehand path shape
#[derive(Debug, Clone)]
pub struct PathShape {
    core: ShapeCore,
}

impl PathShape {
    pub fn new(data: PathData) -> Self {
        let element = Element::new(ElementTag::Path);
        element.set_attr("d", data.to_string());
        Self {
            core: ShapeCore::new(element),
        }
    }

    pub(crate) fn from_element(element: Element) -> Self {
        Self {
            core: ShapeCore::new(element),
        }
    }

    pub fn path_data(&self) -> Result<PathData> {
        path_data_of(&self.core.element)
    }

    pub fn set_path_data(&mut self, data: &PathData) -> Result<ArtCommand> {
        self.core.set_text_attr("d", &data.to_string())
    }
}

impl Shape for PathShape {
    fn element(&self) -> Element {
        self.core.element.clone()
    }

    fn shape_type(&self) -> &'static str {
        "path"
    }

    fn bounds(&self) -> Bounds {
        if let Some(bounds) = self.core.element.cached_path_bounds() {
            return bounds;
        }
        let bounds = self
            .path_data()
            .ok()
            .and_then(|data| data.bounds())
            .unwrap_or(Bounds::new(0.0, 0.0, 0.0, 0.0));
        self.core.element.set_cached_path_bounds(Some(bounds));
        bounds
    }

    fn command_sink(&self) -> Option<SinkRef> {
        self.core.sink.clone()
    }

    fn set_command_sink(&mut self, sink: Option<SinkRef>) {
        self.core.sink = sink;
    }

    fn user_data(&self) -> Option<serde_json::Value> {
        self.core.data.clone()
    }

    fn set_user_data(&mut self, data: Option<serde_json::Value>) {
        self.core.data = data;
    }
}

impl HasStroke for PathShape {
    fn set_stroke_color(&mut self, color: &str) -> Result<ArtCommand> {
        self.core.set_style_prop("stroke", color)
    }

    fn set_stroke_width(&mut self, width: f64) -> Result<ArtCommand> {
        self.core.set_style_prop("stroke-width", &width.to_string())
    }

    fn set_stroke_opacity(&mut self, opacity: f64) -> Result<ArtCommand> {
        self.core.set_style_prop("stroke-opacity", &opacity.to_string())
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone)]
pub struct RectShape {
    core: ShapeCore,
}

impl RectShape {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        let element = Element::new(ElementTag::Rect);
        element.set_attr("x", x);
        element.set_attr("y", y);
        element.set_attr("width", width);
        element.set_attr("height", height);
        Self {
            core: ShapeCore::new(element),
        }
    }

    pub(crate) fn from_element(element: Element) -> Self {
        Self {
            core: ShapeCore::new(element),
        }
    }

    pub fn width(&self) -> f64 {
        self.core.element.number_attr("width").unwrap_or(0.0)
    }

    pub fn height(&self) -> f64 {
        self.core.element.number_attr("height").unwrap_or(0.0)
    }

    pub fn set_size(&mut self, width: f64, height: f64) -> Result<ArtCommand> {
        self.core.submit(ArtCommand::attr(
            self.core.element.clone(),
            vec![
                ("width".to_string(), AttrValue::Number(width)),
                ("height".to_string(), AttrValue::Number(height)),
            ],
        ))
    }
}

impl Shape for RectShape {
    fn element(&self) -> Element {
        self.core.element.clone()
    }

    fn shape_type(&self) -> &'static str {
        "rect"
    }

    fn bounds(&self) -> Bounds {
        Bounds::new(
            self.core.element.number_attr("x").unwrap_or(0.0),
            self.core.element.number_attr("y").unwrap_or(0.0),
            self.width(),
            self.height(),
        )
    }

    fn command_sink(&self) -> Option<SinkRef> {
        self.core.sink.clone()
    }

    fn set_command_sink(&mut self, sink: Option<SinkRef>) {
        self.core.sink = sink;
    }

    fn user_data(&self) -> Option<serde_json::Value> {
        self.core.data.clone()
    }

    fn set_user_data(&mut self, data: Option<serde_json::Value>) {
        self.core.data = data;
    }
}

impl HasStroke for RectShape {
    fn set_stroke_color(&mut self, color: &str) -> Result<ArtCommand> {
        self.core.set_style_prop("stroke", color)
    }

    fn set_stroke_width(&mut self, width: f64) -> Result<ArtCommand> {
        self.core.set_style_prop("stroke-width", &width.to_string())
    }

    fn set_stroke_opacity(&mut self, opacity: f64) -> Result<ArtCommand> {
        self.core.set_style_prop("stroke-opacity", &opacity.to_string())
    }
}

impl HasFill for RectShape {
    fn set_fill_color(&mut self, color: &str) -> Result<ArtCommand> {
        self.core.set_style_prop("fill", color)
    }

    fn set_fill_opacity(&mut self, opacity: f64) -> Result<ArtCommand> {
        self.core.set_style_prop("fill-opacity", &opacity.to_string())
    }
}

/// Ellipse, positioned by its center
#[derive(Debug, Clone)]
pub struct EllipseShape {
    core: ShapeCore,
}

impl EllipseShape {
    pub fn new(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        let element = Element::new(ElementTag::Ellipse);
        element.set_attr("cx", cx);
        element.set_attr("cy", cy);
        element.set_attr("rx", rx);
        element.set_attr("ry", ry);
        Self {
            core: ShapeCore::new(element),
        }
    }

    pub(crate) fn from_element(element: Element) -> Self {
        Self {
            core: ShapeCore::new(element),
        }
    }

    pub fn set_radii(&mut self, rx: f64, ry: f64) -> Result<ArtCommand> {
        self.core.submit(ArtCommand::attr(
            self.core.element.clone(),
            vec![
                ("rx".to_string(), AttrValue::Number(rx)),
                ("ry".to_string(), AttrValue::Number(ry)),
            ],
        ))
    }
}

impl Shape for EllipseShape {
    fn element(&self) -> Element {
        self.core.element.clone()
    }

    fn shape_type(&self) -> &'static str {
        "ellipse"
    }

    fn bounds(&self) -> Bounds {
        let cx = self.core.element.number_attr("cx").unwrap_or(0.0);
        let cy = self.core.element.number_attr("cy").unwrap_or(0.0);
        let rx = self.core.element.number_attr("rx").unwrap_or(0.0);
        let ry = self.core.element.number_attr("ry").unwrap_or(0.0);
        Bounds::new(cx - rx, cy - ry, rx * 2.0, ry * 2.0)
    }

    fn command_sink(&self) -> Option<SinkRef> {
        self.core.sink.clone()
    }

    fn set_command_sink(&mut self, sink: Option<SinkRef>) {
        self.core.sink = sink;
    }

    fn user_data(&self) -> Option<serde_json::Value> {
        self.core.data.clone()
    }

    fn set_user_data(&mut self, data: Option<serde_json::Value>) {
        self.core.data = data;
    }
}

impl HasStroke for EllipseShape {
    fn set_stroke_color(&mut self, color: &str) -> Result<ArtCommand> {
        self.core.set_style_prop("stroke", color)
    }

    fn set_stroke_width(&mut self, width: f64) -> Result<ArtCommand> {
        self.core.set_style_prop("stroke-width", &width.to_string())
    }

    fn set_stroke_opacity(&mut self, opacity: f64) -> Result<ArtCommand> {
        self.core.set_style_prop("stroke-opacity", &opacity.to_string())
    }
}

impl HasFill for EllipseShape {
    fn set_fill_color(&mut self, color: &str) -> Result<ArtCommand> {
        self.core.set_style_prop("fill", color)
    }

    fn set_fill_opacity(&mut self, opacity: f64) -> Result<ArtCommand> {
        self.core.set_style_prop("fill-opacity", &opacity.to_string())
    }
}

/// Placed image, referenced by href
#[derive(Debug, Clone)]
pub struct ImageShape {
    core: ShapeCore,
}

impl ImageShape {
    pub fn new(x: f64, y: f64, width: f64, height: f64, href: &str) -> Self {
        let element = Element::new(ElementTag::Image);
        element.set_attr("x", x);
        element.set_attr("y", y);
        element.set_attr("width", width);
        element.set_attr("height", height);
        element.set_attr_ns(XLINK_NS, "href", href);
        Self {
            core: ShapeCore::new(element),
        }
    }

    pub(crate) fn from_element(element: Element) -> Self {
        Self {
            core: ShapeCore::new(element),
        }
    }

    pub fn href(&self) -> Option<String> {
        self.core.element.attr_ns(XLINK_NS, "href")
    }

    pub fn set_href(&mut self, href: &str) -> Result<ArtCommand> {
        self.core.submit(ArtCommand::attr_with_ns(
            self.core.element.clone(),
            Vec::new(),
            vec![NamespacedAttr::new(XLINK_NS, "href", href)],
        ))
    }
}

impl Shape for ImageShape {
    fn element(&self) -> Element {
        self.core.element.clone()
    }

    fn shape_type(&self) -> &'static str {
        "image"
    }

    fn bounds(&self) -> Bounds {
        Bounds::new(
            self.core.element.number_attr("x").unwrap_or(0.0),
            self.core.element.number_attr("y").unwrap_or(0.0),
            self.core.element.number_attr("width").unwrap_or(0.0),
            self.core.element.number_attr("height").unwrap_or(0.0),
        )
    }

    fn command_sink(&self) -> Option<SinkRef> {
        self.core.sink.clone()
    }

    fn set_command_sink(&mut self, sink: Option<SinkRef>) {
        self.core.sink = sink;
    }

    fn user_data(&self) -> Option<serde_json::Value> {
        self.core.data.clone()
    }

    fn set_user_data(&mut self, data: Option<serde_json::Value>) {
        self.core.data = data;
    }
}

/// Single text run positioned at a baseline point
#[derive(Debug, Clone)]
pub struct TextShape {
    core: ShapeCore,
}

impl TextShape {
    pub fn new(x: f64, y: f64, content: &str) -> Self {
        let element = Element::new(ElementTag::Text);
        element.set_attr("x", x);
        element.set_attr("y", y);
        element.set_text(Some(content.to_string()));
        Self::from_element(element)
    }

    /// Wrap an element, applying font defaults only where absent. Staged
    /// text set before this call survives untouched.
    pub(crate) fn from_element(element: Element) -> Self {
        if element.number_attr("font-size").is_none() {
            element.set_attr("font-size", DEFAULT_FONT_SIZE);
        }
        Self {
            core: ShapeCore::new(element),
        }
    }
}

impl Shape for TextShape {
    fn element(&self) -> Element {
        self.core.element.clone()
    }

    fn shape_type(&self) -> &'static str {
        "text"
    }

    /// Approximate box around the text run. The model carries no shaper, so
    /// the advance width is estimated from the character count.
    fn bounds(&self) -> Bounds {
        let x = self.core.element.number_attr("x").unwrap_or(0.0);
        let y = self.core.element.number_attr("y").unwrap_or(0.0);
        let size = self
            .core
            .element
            .number_attr("font-size")
            .unwrap_or(DEFAULT_FONT_SIZE);
        let chars = self
            .core
            .element
            .text()
            .map(|t| t.chars().count())
            .unwrap_or(0);
        let width = chars as f64 * size * 0.6;
        Bounds::new(x, y - size, width, size * 1.25)
    }

    fn command_sink(&self) -> Option<SinkRef> {
        self.core.sink.clone()
    }

    fn set_command_sink(&mut self, sink: Option<SinkRef>) {
        self.core.sink = sink;
    }

    fn user_data(&self) -> Option<serde_json::Value> {
        self.core.data.clone()
    }

    fn set_user_data(&mut self, data: Option<serde_json::Value>) {
        self.core.data = data;
    }
}

impl HasText for TextShape {
    /// Replace the full text run. Not an attribute change, so this snapshots
    /// old and new content into a custom command.
    fn set_text_content(&mut self, text: &str) -> Result<ArtCommand> {
        let element = self.core.element.clone();
        let id = element.id();
        let old = element.text();
        let new = Some(text.to_string());

        let exec_element = element.clone();
        let exec_old = old.clone();
        let exec_new = new.clone();
        let undo_element = element;
        let undo_old = old;
        let undo_new = new;

        let command = ArtCommand::custom(
            move || {
                exec_element.set_text(exec_new.clone());
                CommandEvent::Text {
                    element: id,
                    old: exec_old.clone(),
                    new: exec_new.clone(),
                }
            },
            move || {
                undo_element.set_text(undo_old.clone());
                CommandEvent::Text {
                    element: id,
                    old: undo_new.clone(),
                    new: undo_old.clone(),
                }
            },
        );
        self.core.submit(command)
    }

    fn set_font_size(&mut self, size: f64) -> Result<ArtCommand> {
        self.core.set_number_attr("font-size", size)
    }

    fn set_font_family(&mut self, family: &str) -> Result<ArtCommand> {
        self.core.set_text_attr("font-family", family)
    }
}

// ===========================================================================
// The tagged union over all variants
// ===========================================================================

/// Any shape in the document
#[derive(Debug, Clone)]
pub enum ArtShape {
    Path(PathShape),
    Rect(RectShape),
    Ellipse(EllipseShape),
    Image(ImageShape),
    Text(TextShape),
}

impl ArtShape {
    /// Rebuild a shape from its wire record.
    ///
    /// An unrecognized type tag is a decode error: silently dropping shapes
    /// on load would corrupt documents without telling anyone.
    pub fn from_record(record: &ShapeRecord) -> Result<ArtShape> {
        let tag = match record.shape_type.as_str() {
            "path" => ElementTag::Path,
            "rect" => ElementTag::Rect,
            "ellipse" => ElementTag::Ellipse,
            "image" => ElementTag::Image,
            "text" => ElementTag::Text,
            other => return Err(ArtModelError::UnknownShapeType(other.to_string())),
        };

        let element = Element::new(tag);
        for (name, value) in &record.attr {
            element.set_attr(name.clone(), value.clone());
        }
        if let Some(attrs_ns) = &record.attr_ns {
            for attr in attrs_ns {
                element.set_attr_ns(&attr.ns, &attr.name, attr.value.clone());
            }
        }
        for (prop, value) in &record.style {
            element.set_style(prop.clone(), value);
        }
        // Text is restored before the constructor runs so its defaults only
        // fill genuine gaps.
        if let Some(data) = &record.data {
            if let Some(text) = &data.text_content {
                element.set_text(Some(text.clone()));
            }
        }

        if tag == ElementTag::Path {
            // Validate eagerly; a path record without parseable data is
            // corrupt, not merely empty.
            path_data_of(&element)?;
        }

        let mut shape = match tag {
            ElementTag::Path => ArtShape::Path(PathShape::from_element(element)),
            ElementTag::Rect => ArtShape::Rect(RectShape::from_element(element)),
            ElementTag::Ellipse => ArtShape::Ellipse(EllipseShape::from_element(element)),
            ElementTag::Image => ArtShape::Image(ImageShape::from_element(element)),
            ElementTag::Text => ArtShape::Text(TextShape::from_element(element)),
            ElementTag::Layer => {
                return Err(ArtModelError::UnknownShapeType(record.shape_type.clone()))
            }
        };

        if let Some(data) = &record.data {
            if let Some(extra) = &data.extra {
                shape.set_user_data(Some(extra.clone()));
            }
        }

        Ok(shape)
    }
}

macro_rules! each_variant {
    ($self:ident, $shape:ident => $body:expr) => {
        match $self {
            ArtShape::Path($shape) => $body,
            ArtShape::Rect($shape) => $body,
            ArtShape::Ellipse($shape) => $body,
            ArtShape::Image($shape) => $body,
            ArtShape::Text($shape) => $body,
        }
    };
}

impl Shape for ArtShape {
    fn element(&self) -> Element {
        each_variant!(self, shape => shape.element())
    }

    fn shape_type(&self) -> &'static str {
        each_variant!(self, shape => shape.shape_type())
    }

    fn bounds(&self) -> Bounds {
        each_variant!(self, shape => shape.bounds())
    }

    fn command_sink(&self) -> Option<SinkRef> {
        each_variant!(self, shape => shape.command_sink())
    }

    fn set_command_sink(&mut self, sink: Option<SinkRef>) {
        each_variant!(self, shape => shape.set_command_sink(sink))
    }

    fn user_data(&self) -> Option<serde_json::Value> {
        each_variant!(self, shape => shape.user_data())
    }

    fn set_user_data(&mut self, data: Option<serde_json::Value>) {
        each_variant!(self, shape => shape.set_user_data(data))
    }
}
