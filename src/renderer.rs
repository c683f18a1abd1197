use crate::color_palette::Color;
use crate::hills::path_commands;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub const fn new(x: f64, y: f64) -> Self {
        PointF { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectShape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Color,
    pub opacity: f64,
}

impl GradientStop {
    pub const fn new(offset: f64, color: Color, opacity: f64) -> Self {
        GradientStop {
            offset,
            color,
            opacity,
        }
    }
}

/// Gradient geometry as the scene uses it: vertical linear bands and
/// center-anchored radial glows. Stops are ordered by offset.
#[derive(Debug, Clone, PartialEq)]
pub enum GradientSpec {
    /// Top-to-bottom linear gradient across the filled rectangle.
    Linear { stops: Vec<GradientStop> },
    /// Radial gradient centered in the filled rectangle; `radius` is a
    /// fraction of the rectangle's shorter side.
    Radial { radius: f64, stops: Vec<GradientStop> },
}

impl GradientSpec {
    pub fn vertical(stops: Vec<GradientStop>) -> Self {
        GradientSpec::Linear { stops }
    }

    pub fn radial(radius: f64, stops: Vec<GradientStop>) -> Self {
        GradientSpec::Radial { radius, stops }
    }
}

/// Opaque handle to a created path element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathId(usize);

/// Opaque handle to a created rectangle element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RectId(usize);

/// Opaque handle to a created gradient definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GradientId(usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Solid(Color),
    Gradient(GradientId),
}

/// Rendering collaborator consumed by the scene.
///
/// Creation calls hand back opaque handles; later calls reuse them for
/// in-place animated updates. An animate call issued while a previous one is
/// still in flight redirects the element to the new target.
pub trait SceneRenderer {
    /// Creates a filled closed path from a point list.
    fn create_path(&mut self, points: &[PointF], fill: Color) -> PathId;
    /// Animates an existing path to a new shape and fill over `duration`.
    fn animate_path(&mut self, id: PathId, points: &[PointF], fill: Color, duration: Duration);
    fn create_rect(&mut self, shape: RectShape, fill: Fill, opacity: f64) -> RectId;
    fn animate_rect_fill(&mut self, id: RectId, fill: Color, duration: Duration);
    fn animate_rect_frame(&mut self, id: RectId, y: f64, height: f64, duration: Duration);
    fn create_gradient(&mut self, spec: GradientSpec) -> GradientId;
    /// Replaces a gradient's stops immediately, without a transition.
    fn update_gradient(&mut self, id: GradientId, spec: GradientSpec);
}

// ---------------------------------------------------------------------------

trait Interpolate {
    fn interpolate(start: &Self, target: &Self, t: f64) -> Self;
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn ease_in_out(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

impl Interpolate for Color {
    fn interpolate(start: &Self, target: &Self, t: f64) -> Self {
        let chan = |a: u8, b: u8| lerp(a as f64, b as f64, t).round() as u8;
        Color::new(
            chan(start.r, target.r),
            chan(start.g, target.g),
            chan(start.b, target.b),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PathAttrs {
    points: Vec<PointF>,
    fill: Color,
}

impl Interpolate for PathAttrs {
    fn interpolate(start: &Self, target: &Self, t: f64) -> Self {
        // Pointwise morph when the topology matches; a resolution change
        // has no sensible in-between, so it snaps to the target shape.
        let points = if start.points.len() == target.points.len() {
            start
                .points
                .iter()
                .zip(&target.points)
                .map(|(a, b)| PointF::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t)))
                .collect()
        } else {
            target.points.clone()
        };
        PathAttrs {
            points,
            fill: Color::interpolate(&start.fill, &target.fill, t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RectAttrs {
    shape: RectShape,
    fill: Fill,
    opacity: f64,
}

impl Interpolate for RectAttrs {
    fn interpolate(start: &Self, target: &Self, t: f64) -> Self {
        let fill = match (start.fill, target.fill) {
            (Fill::Solid(a), Fill::Solid(b)) => Fill::Solid(Color::interpolate(&a, &b, t)),
            _ => target.fill,
        };
        RectAttrs {
            shape: RectShape {
                x: lerp(start.shape.x, target.shape.x, t),
                y: lerp(start.shape.y, target.shape.y, t),
                width: lerp(start.shape.width, target.shape.width, t),
                height: lerp(start.shape.height, target.shape.height, t),
            },
            fill,
            opacity: lerp(start.opacity, target.opacity, t),
        }
    }
}

#[derive(Debug, Clone)]
struct Tween<T> {
    start: T,
    target: T,
    elapsed: Duration,
    duration: Duration,
}

impl<T> Tween<T> {
    fn advance(&mut self, dt: Duration) {
        if self.elapsed < self.duration {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }
    }

    fn animating(&self) -> bool {
        self.elapsed < self.duration
    }

    fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            1.0
        } else {
            (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        }
    }
}

impl<T: Interpolate + Clone> Tween<T> {
    fn fixed(value: T) -> Self {
        Tween {
            start: value.clone(),
            target: value,
            elapsed: Duration::ZERO,
            duration: Duration::ZERO,
        }
    }

    fn current(&self) -> T {
        let t = self.progress();
        if t >= 1.0 {
            self.target.clone()
        } else {
            T::interpolate(&self.start, &self.target, ease_in_out(t))
        }
    }

    /// A new command supersedes the in-flight one: restart from wherever the
    /// animation currently is and head for the new target.
    fn retarget(&mut self, target: T, duration: Duration) {
        self.start = self.current();
        self.target = target;
        self.elapsed = Duration::ZERO;
        self.duration = duration;
    }
}

#[derive(Debug, Clone)]
enum Element {
    Path(Tween<PathAttrs>),
    Rect(Tween<RectAttrs>),
}

impl Element {
    fn advance(&mut self, dt: Duration) {
        match self {
            Element::Path(tween) => tween.advance(dt),
            Element::Rect(tween) => tween.advance(dt),
        }
    }

    fn animating(&self) -> bool {
        match self {
            Element::Path(tween) => tween.animating(),
            Element::Rect(tween) => tween.animating(),
        }
    }
}

/// Retained display list with per-element tween state.
///
/// Elements paint in creation order (back to front). The renderer has no
/// clock of its own; the host steps it with [`RetainedRenderer::advance`]
/// and takes snapshots with [`RetainedRenderer::rasterize`] or
/// [`RetainedRenderer::to_svg`].
pub struct RetainedRenderer {
    width: f64,
    height: f64,
    elements: Vec<Element>,
    gradients: Vec<GradientSpec>,
}

impl RetainedRenderer {
    pub fn new(width: f64, height: f64) -> Self {
        RetainedRenderer {
            width,
            height,
            elements: Vec::new(),
            gradients: Vec::new(),
        }
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn gradient_count(&self) -> usize {
        self.gradients.len()
    }

    pub fn animating(&self) -> bool {
        self.elements.iter().any(Element::animating)
    }

    /// Steps every in-flight animation forward by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        for element in &mut self.elements {
            element.advance(dt);
        }
    }

    /// Renders the current frame at an integer scale factor.
    pub fn rasterize(&self, scale: u32) -> RgbImage {
        let s = scale.max(1) as f64;
        let width = (self.width * s) as u32;
        let height = (self.height * s) as u32;
        let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

        for element in &self.elements {
            match element {
                Element::Rect(tween) => self.paint_rect(&mut img, &tween.current(), s),
                Element::Path(tween) => paint_path(&mut img, &tween.current(), s),
            }
        }
        img
    }

    /// Serializes the current frame as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        let mut defs = String::new();
        for (i, spec) in self.gradients.iter().enumerate() {
            defs.push_str(&gradient_def(i, spec));
        }

        let mut body = String::new();
        for element in &self.elements {
            match element {
                Element::Rect(tween) => {
                    let rect = tween.current();
                    let fill = match rect.fill {
                        Fill::Solid(color) => color.to_hex(),
                        Fill::Gradient(GradientId(i)) => format!("url(#grad{})", i),
                    };
                    body.push_str(&format!(
                        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" opacity=\"{}\"/>\n",
                        rect.shape.x, rect.shape.y, rect.shape.width, rect.shape.height, fill, rect.opacity
                    ));
                }
                Element::Path(tween) => {
                    let path = tween.current();
                    body.push_str(&format!(
                        "  <path d=\"{}\" fill=\"{}\"/>\n",
                        path_commands(&path.points),
                        path.fill.to_hex()
                    ));
                }
            }
        }

        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
             viewBox=\"0 0 {w} {h}\">\n<defs>\n{defs}</defs>\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            defs = defs,
            body = body
        )
    }

    fn paint_rect(&self, img: &mut RgbImage, attrs: &RectAttrs, s: f64) {
        let (iw, ih) = img.dimensions();
        let x0 = ((attrs.shape.x * s).round().max(0.0)) as u32;
        let y0 = ((attrs.shape.y * s).round().max(0.0)) as u32;
        let x1 = (((attrs.shape.x + attrs.shape.width) * s).round().min(iw as f64)) as u32;
        let y1 = (((attrs.shape.y + attrs.shape.height) * s).round().min(ih as f64)) as u32;
        if x1 <= x0 || y1 <= y0 {
            return;
        }

        for py in y0..y1 {
            for px in x0..x1 {
                let (color, stop_opacity) = match attrs.fill {
                    Fill::Solid(color) => (color, 1.0),
                    Fill::Gradient(id) => {
                        let spec = &self.gradients[id.0];
                        let t = match spec {
                            GradientSpec::Linear { .. } => {
                                (py - y0) as f64 / (y1 - y0).max(1) as f64
                            }
                            GradientSpec::Radial { radius, .. } => {
                                let cx = (x0 + x1) as f64 / 2.0;
                                let cy = (y0 + y1) as f64 / 2.0;
                                let r = radius * (x1 - x0).min(y1 - y0) as f64;
                                let dx = px as f64 + 0.5 - cx;
                                let dy = py as f64 + 0.5 - cy;
                                if r > 0.0 {
                                    ((dx * dx + dy * dy).sqrt() / r).min(1.0)
                                } else {
                                    1.0
                                }
                            }
                        };
                        let stops = match spec {
                            GradientSpec::Linear { stops } => stops,
                            GradientSpec::Radial { stops, .. } => stops,
                        };
                        sample_stops(stops, t)
                    }
                };
                let alpha = (stop_opacity * attrs.opacity).clamp(0.0, 1.0);
                if alpha <= 0.0 {
                    continue;
                }
                let pixel = img.get_pixel_mut(px, py);
                for (chan, target) in pixel.0.iter_mut().zip([color.r, color.g, color.b]) {
                    *chan = (*chan as f64 * (1.0 - alpha) + target as f64 * alpha).round() as u8;
                }
            }
        }
    }
}

impl SceneRenderer for RetainedRenderer {
    fn create_path(&mut self, points: &[PointF], fill: Color) -> PathId {
        self.elements.push(Element::Path(Tween::fixed(PathAttrs {
            points: points.to_vec(),
            fill,
        })));
        PathId(self.elements.len() - 1)
    }

    fn animate_path(&mut self, id: PathId, points: &[PointF], fill: Color, duration: Duration) {
        if let Some(Element::Path(tween)) = self.elements.get_mut(id.0) {
            tween.retarget(
                PathAttrs {
                    points: points.to_vec(),
                    fill,
                },
                duration,
            );
        }
    }

    fn create_rect(&mut self, shape: RectShape, fill: Fill, opacity: f64) -> RectId {
        self.elements.push(Element::Rect(Tween::fixed(RectAttrs {
            shape,
            fill,
            opacity,
        })));
        RectId(self.elements.len() - 1)
    }

    fn animate_rect_fill(&mut self, id: RectId, fill: Color, duration: Duration) {
        if let Some(Element::Rect(tween)) = self.elements.get_mut(id.0) {
            let mut target = tween.target;
            target.fill = Fill::Solid(fill);
            tween.retarget(target, duration);
        }
    }

    fn animate_rect_frame(&mut self, id: RectId, y: f64, height: f64, duration: Duration) {
        if let Some(Element::Rect(tween)) = self.elements.get_mut(id.0) {
            let mut target = tween.target;
            target.shape.y = y;
            target.shape.height = height;
            tween.retarget(target, duration);
        }
    }

    fn create_gradient(&mut self, spec: GradientSpec) -> GradientId {
        self.gradients.push(spec);
        GradientId(self.gradients.len() - 1)
    }

    fn update_gradient(&mut self, id: GradientId, spec: GradientSpec) {
        if let Some(slot) = self.gradients.get_mut(id.0) {
            *slot = spec;
        }
    }
}

fn paint_path(img: &mut RgbImage, attrs: &PathAttrs, s: f64) {
    if attrs.points.len() < 3 {
        return;
    }
    let mut poly: Vec<Point<i32>> = attrs
        .points
        .iter()
        .map(|p| Point::new((p.x * s).round() as i32, (p.y * s).round() as i32))
        .collect();
    // The polygon filler closes the contour itself and rejects an explicit
    // duplicate endpoint, so collapse rounding artifacts first.
    poly.dedup();
    if poly.len() >= 2 && poly.first() == poly.last() {
        let _ = poly.pop();
    }
    if poly.len() < 3 {
        return;
    }
    draw_polygon_mut(
        img,
        &poly,
        Rgb([attrs.fill.r, attrs.fill.g, attrs.fill.b]),
    );
}

fn sample_stops(stops: &[GradientStop], t: f64) -> (Color, f64) {
    match stops {
        [] => (Color::WHITE, 0.0),
        [only] => (only.color, only.opacity),
        _ => {
            if t <= stops[0].offset {
                return (stops[0].color, stops[0].opacity);
            }
            for pair in stops.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if t <= b.offset {
                    let span = b.offset - a.offset;
                    let local = if span <= f64::EPSILON {
                        1.0
                    } else {
                        (t - a.offset) / span
                    };
                    return (
                        Color::interpolate(&a.color, &b.color, local),
                        lerp(a.opacity, b.opacity, local),
                    );
                }
            }
            let last = stops[stops.len() - 1];
            (last.color, last.opacity)
        }
    }
}

fn gradient_def(index: usize, spec: &GradientSpec) -> String {
    let stop_lines = |stops: &[GradientStop]| {
        stops
            .iter()
            .map(|s| {
                format!(
                    "    <stop offset=\"{}\" stop-color=\"{}\" stop-opacity=\"{}\"/>\n",
                    s.offset,
                    s.color.to_hex(),
                    s.opacity
                )
            })
            .collect::<String>()
    };
    match spec {
        GradientSpec::Linear { stops } => format!(
            "  <linearGradient id=\"grad{}\" x1=\"0\" y1=\"0\" x2=\"0\" y2=\"1\">\n{}  </linearGradient>\n",
            index,
            stop_lines(stops)
        ),
        GradientSpec::Radial { radius, stops } => format!(
            "  <radialGradient id=\"grad{}\" cx=\"0.5\" cy=\"0.5\" r=\"{}\">\n{}  </radialGradient>\n",
            index,
            radius,
            stop_lines(stops)
        ),
    }
}
