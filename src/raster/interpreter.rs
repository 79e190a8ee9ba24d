//! Content stream interpreter painting onto a tiny-skia pixmap.

use lopdf::content::Operation;
use lopdf::{Dictionary, Object};
use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    StrokeDash, Transform,
};

use crate::backend::{number, LopdfBackend};

use super::image::decode_image;

/// Nested form XObjects deeper than this are skipped.
const MAX_FORM_DEPTH: usize = 8;

/// Greeked text bars cover this fraction of the font size above the baseline.
const TEXT_BAR_HEIGHT: f32 = 0.5;

/// Advance used for glyphs whose width is unknown, in text space units.
const DEFAULT_GLYPH_WIDTH: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rgb(f32, f32, f32);

impl Rgb {
    const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);

    fn gray(g: f32) -> Self {
        Rgb(g, g, g)
    }

    fn cmyk(c: f32, m: f32, y: f32, k: f32) -> Self {
        Rgb((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
    }

    /// Interpret `sc`/`scn` style operands by component count.
    fn from_components(c: &[f32]) -> Option<Self> {
        match c {
            [g] => Some(Rgb::gray(*g)),
            [r, g, b] => Some(Rgb(*r, *g, *b)),
            [c, m, y, k] => Some(Rgb::cmyk(*c, *m, *y, *k)),
            _ => None,
        }
    }

    fn rgb8(self) -> [u8; 3] {
        [channel(self.0), channel(self.1), channel(self.2)]
    }

    fn paint(self, alpha: f32) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(
            channel(self.0),
            channel(self.1),
            channel(self.2),
            channel(alpha),
        );
        paint.anti_alias = true;
        paint
    }
}

fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[derive(Debug, Clone)]
struct TextState {
    font: Option<Vec<u8>>,
    size: f32,
    char_space: f32,
    word_space: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
    render_mode: i64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            size: 1.0,
            char_space: 0.0,
            word_space: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
            render_mode: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Transform,
    fill: Rgb,
    stroke: Rgb,
    fill_alpha: f32,
    stroke_alpha: f32,
    line_width: f32,
    line_cap: LineCap,
    line_join: LineJoin,
    miter_limit: f32,
    dash: Option<(Vec<f32>, f32)>,
    text: TextState,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Transform::identity(),
            fill: Rgb::BLACK,
            stroke: Rgb::BLACK,
            fill_alpha: 1.0,
            stroke_alpha: 1.0,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: None,
            text: TextState::default(),
        }
    }
}

/// Width table of a simple or composite font, enough to place greeked text.
struct FontMetrics {
    first_char: u32,
    widths: Vec<f32>,
    default_width: f32,
    two_byte: bool,
}

impl FontMetrics {
    fn advance(&self, code: u32) -> f32 {
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .map(|w| w / 1000.0)
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width)
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            first_char: 0,
            widths: Vec::new(),
            default_width: DEFAULT_GLYPH_WIDTH,
            two_byte: false,
        }
    }
}

pub(super) struct Painter<'a> {
    backend: &'a LopdfBackend,
    pixmap: &'a mut Pixmap,
    base: Transform,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    path: PathBuilder,
    current_point: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
    text_matrix: Transform,
    line_matrix: Transform,
    depth: usize,
}

impl<'a> Painter<'a> {
    pub(super) fn new(backend: &'a LopdfBackend, pixmap: &'a mut Pixmap, base: Transform) -> Self {
        Self {
            backend,
            pixmap,
            base,
            state: GraphicsState::default(),
            stack: Vec::new(),
            path: PathBuilder::new(),
            current_point: None,
            subpath_start: None,
            text_matrix: Transform::identity(),
            line_matrix: Transform::identity(),
            depth: 0,
        }
    }

    /// Paint a sequence of operations against a resource dictionary.
    pub(super) fn run(&mut self, operations: &[Operation], resources: Option<&Dictionary>) {
        for op in operations {
            self.apply(op, resources);
        }
    }

    fn apply(&mut self, op: &Operation, resources: Option<&Dictionary>) {
        let nums: Vec<f32> = op
            .operands
            .iter()
            .filter_map(|o| number(self.backend.resolve(o)))
            .collect();

        match (op.operator.as_str(), nums.as_slice()) {
            // Graphics state
            ("q", _) => self.stack.push(self.state.clone()),
            ("Q", _) => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            ("cm", [a, b, c, d, e, f]) => {
                let m = Transform::from_row(*a, *b, *c, *d, *e, *f);
                self.state.ctm = self.state.ctm.pre_concat(m);
            }
            ("w", [w]) => self.state.line_width = *w,
            ("J", [cap]) => {
                self.state.line_cap = match *cap as i64 {
                    1 => LineCap::Round,
                    2 => LineCap::Square,
                    _ => LineCap::Butt,
                }
            }
            ("j", [join]) => {
                self.state.line_join = match *join as i64 {
                    1 => LineJoin::Round,
                    2 => LineJoin::Bevel,
                    _ => LineJoin::Miter,
                }
            }
            ("M", [limit]) => self.state.miter_limit = *limit,
            ("d", _) => self.set_dash(&op.operands),
            ("gs", _) => self.apply_ext_g_state(&op.operands, resources),

            // Color
            ("g", [g]) => self.state.fill = Rgb::gray(*g),
            ("G", [g]) => self.state.stroke = Rgb::gray(*g),
            ("rg", [r, g, b]) => self.state.fill = Rgb(*r, *g, *b),
            ("RG", [r, g, b]) => self.state.stroke = Rgb(*r, *g, *b),
            ("k", [c, m, y, k]) => self.state.fill = Rgb::cmyk(*c, *m, *y, *k),
            ("K", [c, m, y, k]) => self.state.stroke = Rgb::cmyk(*c, *m, *y, *k),
            ("cs", _) => self.state.fill = Rgb::BLACK,
            ("CS", _) => self.state.stroke = Rgb::BLACK,
            ("sc" | "scn", c) => {
                if let Some(rgb) = Rgb::from_components(c) {
                    self.state.fill = rgb;
                }
            }
            ("SC" | "SCN", c) => {
                if let Some(rgb) = Rgb::from_components(c) {
                    self.state.stroke = rgb;
                }
            }

            // Path construction
            ("m", [x, y]) => {
                self.path.move_to(*x, *y);
                self.current_point = Some((*x, *y));
                self.subpath_start = Some((*x, *y));
            }
            ("l", [x, y]) => {
                self.ensure_started();
                self.path.line_to(*x, *y);
                self.current_point = Some((*x, *y));
            }
            ("c", [x1, y1, x2, y2, x3, y3]) => {
                self.ensure_started();
                self.path.cubic_to(*x1, *y1, *x2, *y2, *x3, *y3);
                self.current_point = Some((*x3, *y3));
            }
            ("v", [x2, y2, x3, y3]) => {
                if let Some((x0, y0)) = self.current_point {
                    self.path.cubic_to(x0, y0, *x2, *y2, *x3, *y3);
                    self.current_point = Some((*x3, *y3));
                }
            }
            ("y", [x1, y1, x3, y3]) => {
                self.ensure_started();
                self.path.cubic_to(*x1, *y1, *x3, *y3, *x3, *y3);
                self.current_point = Some((*x3, *y3));
            }
            ("re", [x, y, w, h]) => {
                self.path.move_to(*x, *y);
                self.path.line_to(x + w, *y);
                self.path.line_to(x + w, y + h);
                self.path.line_to(*x, y + h);
                self.path.close();
                self.current_point = Some((*x, *y));
                self.subpath_start = Some((*x, *y));
            }
            ("h", _) => self.close_subpath(),

            // Path painting
            ("S", _) => self.paint_path(false, true, FillRule::Winding),
            ("s", _) => {
                self.close_subpath();
                self.paint_path(false, true, FillRule::Winding);
            }
            ("f" | "F", _) => self.paint_path(true, false, FillRule::Winding),
            ("f*", _) => self.paint_path(true, false, FillRule::EvenOdd),
            ("B", _) => self.paint_path(true, true, FillRule::Winding),
            ("B*", _) => self.paint_path(true, true, FillRule::EvenOdd),
            ("b", _) => {
                self.close_subpath();
                self.paint_path(true, true, FillRule::Winding);
            }
            ("b*", _) => {
                self.close_subpath();
                self.paint_path(true, true, FillRule::EvenOdd);
            }
            // Clipping is not applied; `W n` just discards the path.
            ("n", _) => self.reset_path(),

            // Text objects and state
            ("BT", _) => {
                self.text_matrix = Transform::identity();
                self.line_matrix = Transform::identity();
            }
            ("Tf", _) => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    self.state.text.font = Some(name.clone());
                }
                if let Some(size) = nums.first() {
                    self.state.text.size = *size;
                }
            }
            ("Tc", [v]) => self.state.text.char_space = *v,
            ("Tw", [v]) => self.state.text.word_space = *v,
            ("Tz", [v]) => self.state.text.horizontal_scale = *v / 100.0,
            ("TL", [v]) => self.state.text.leading = *v,
            ("Ts", [v]) => self.state.text.rise = *v,
            ("Tr", [v]) => self.state.text.render_mode = *v as i64,
            ("Td", [tx, ty]) => self.move_text(*tx, *ty),
            ("TD", [tx, ty]) => {
                self.state.text.leading = -*ty;
                self.move_text(*tx, *ty);
            }
            ("Tm", [a, b, c, d, e, f]) => {
                self.line_matrix = Transform::from_row(*a, *b, *c, *d, *e, *f);
                self.text_matrix = self.line_matrix;
            }
            ("T*", _) => self.move_text(0.0, -self.state.text.leading),

            // Text showing
            ("Tj", _) => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show_text(bytes, resources);
                }
            }
            ("'", _) => {
                self.move_text(0.0, -self.state.text.leading);
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show_text(bytes, resources);
                }
            }
            ("\"", _) => {
                if let [aw, ac, ..] = nums.as_slice() {
                    self.state.text.word_space = *aw;
                    self.state.text.char_space = *ac;
                }
                self.move_text(0.0, -self.state.text.leading);
                if let Some(Object::String(bytes, _)) = op.operands.get(2) {
                    self.show_text(bytes, resources);
                }
            }
            ("TJ", _) => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    self.show_text_array(items, resources);
                }
            }

            // External objects
            ("Do", _) => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    self.paint_xobject(name, resources);
                }
            }

            _ => {}
        }
    }

    fn ensure_started(&mut self) {
        if self.current_point.is_none() {
            self.path.move_to(0.0, 0.0);
            self.current_point = Some((0.0, 0.0));
            self.subpath_start = Some((0.0, 0.0));
        }
    }

    fn close_subpath(&mut self) {
        if self.current_point.is_some() {
            self.path.close();
            self.current_point = self.subpath_start;
        }
    }

    fn reset_path(&mut self) {
        self.path = PathBuilder::new();
        self.current_point = None;
        self.subpath_start = None;
    }

    fn take_path(&mut self) -> Option<Path> {
        let builder = std::mem::replace(&mut self.path, PathBuilder::new());
        self.current_point = None;
        self.subpath_start = None;
        builder.finish()
    }

    fn device_transform(&self) -> Transform {
        self.base.pre_concat(self.state.ctm)
    }

    fn paint_path(&mut self, fill: bool, stroke: bool, rule: FillRule) {
        let Some(path) = self.take_path() else {
            return;
        };
        let transform = self.device_transform();

        if fill {
            let paint = self.state.fill.paint(self.state.fill_alpha);
            self.pixmap.fill_path(&path, &paint, rule, transform, None);
        }
        if stroke {
            let paint = self.state.stroke.paint(self.state.stroke_alpha);
            let stroke = Stroke {
                width: self.state.line_width.max(0.0),
                line_cap: self.state.line_cap,
                line_join: self.state.line_join,
                miter_limit: self.state.miter_limit,
                dash: self
                    .state
                    .dash
                    .as_ref()
                    .and_then(|(array, phase)| StrokeDash::new(array.clone(), *phase)),
            };
            self.pixmap
                .stroke_path(&path, &paint, &stroke, transform, None);
        }
    }

    fn set_dash(&mut self, operands: &[Object]) {
        let array: Vec<f32> = operands
            .first()
            .and_then(|o| self.backend.resolve(o).as_array().ok())
            .map(|a| a.iter().filter_map(number).collect())
            .unwrap_or_default();
        let phase = operands.get(1).and_then(number).unwrap_or(0.0);
        self.state.dash = if array.is_empty() {
            None
        } else {
            Some((array, phase))
        };
    }

    fn apply_ext_g_state(&mut self, operands: &[Object], resources: Option<&Dictionary>) {
        let Some(Object::Name(name)) = operands.first() else {
            return;
        };
        let Some(state) = self.lookup_resource(resources, b"ExtGState", name) else {
            return;
        };
        if let Some(a) = state.get(b"ca").ok().and_then(number) {
            self.state.fill_alpha = a.clamp(0.0, 1.0);
        }
        if let Some(a) = state.get(b"CA").ok().and_then(number) {
            self.state.stroke_alpha = a.clamp(0.0, 1.0);
        }
        if let Some(w) = state.get(b"LW").ok().and_then(number) {
            self.state.line_width = w;
        }
    }

    fn lookup_resource<'r>(
        &self,
        resources: Option<&'r Dictionary>,
        category: &[u8],
        name: &[u8],
    ) -> Option<&'r Dictionary>
    where
        'a: 'r,
    {
        let backend: &'r LopdfBackend = self.backend;
        let group = backend.resolve_dict(resources?.get(category).ok()?)?;
        let entry = group.get(name).ok()?;
        backend.resolve_dict(entry)
    }

    fn move_text(&mut self, tx: f32, ty: f32) {
        self.line_matrix = self.line_matrix.pre_concat(Transform::from_translate(tx, ty));
        self.text_matrix = self.line_matrix;
    }

    fn font_metrics(&self, resources: Option<&Dictionary>) -> FontMetrics {
        let Some(font_name) = self.state.text.font.as_deref() else {
            return FontMetrics::default();
        };
        let Some(font) = self.lookup_resource(resources, b"Font", font_name) else {
            return FontMetrics::default();
        };

        let subtype = font.get(b"Subtype").ok().and_then(|o| o.as_name().ok());
        if subtype == Some(b"Type0".as_slice()) {
            let default_width = font
                .get(b"DescendantFonts")
                .ok()
                .and_then(|o| self.backend.resolve(o).as_array().ok())
                .and_then(|a| a.first())
                .and_then(|o| self.backend.resolve_dict(o))
                .and_then(|d| d.get(b"DW").ok())
                .and_then(number)
                .map(|w| w / 1000.0)
                .unwrap_or(1.0);
            return FontMetrics {
                default_width,
                two_byte: true,
                ..FontMetrics::default()
            };
        }

        let first_char = font
            .get(b"FirstChar")
            .ok()
            .and_then(number)
            .map(|v| v.max(0.0) as u32)
            .unwrap_or(0);
        let widths = font
            .get(b"Widths")
            .ok()
            .and_then(|o| self.backend.resolve(o).as_array().ok())
            .map(|a| {
                a.iter()
                    .map(|w| number(self.backend.resolve(w)).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();

        FontMetrics {
            first_char,
            widths,
            ..FontMetrics::default()
        }
    }

    fn show_text_array(&mut self, items: &[Object], resources: Option<&Dictionary>) {
        for item in items {
            match item {
                Object::String(bytes, _) => self.show_text(bytes, resources),
                other => {
                    if let Some(adjust) = number(other) {
                        let text = &self.state.text;
                        let tx = -adjust / 1000.0 * text.size * text.horizontal_scale;
                        self.text_matrix =
                            self.text_matrix.pre_concat(Transform::from_translate(tx, 0.0));
                    }
                }
            }
        }
    }

    /// Advance through a string, painting one bar per run of non-space glyphs.
    fn show_text(&mut self, bytes: &[u8], resources: Option<&Dictionary>) {
        let metrics = self.font_metrics(resources);
        let text = self.state.text.clone();
        let visible = !matches!(text.render_mode, 3 | 7);

        let codes: Vec<u32> = if metrics.two_byte {
            bytes
                .chunks(2)
                .map(|c| c.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32))
                .collect()
        } else {
            bytes.iter().map(|b| *b as u32).collect()
        };

        let mut x = 0.0f32;
        let mut run_start: Option<f32> = None;
        let mut bars: Vec<(f32, f32)> = Vec::new();

        for code in codes {
            let is_space = !metrics.two_byte && code == 32;
            if is_space {
                if let Some(start) = run_start.take() {
                    bars.push((start, x));
                }
            } else if run_start.is_none() {
                run_start = Some(x);
            }

            let mut advance = metrics.advance(code) * text.size + text.char_space;
            if is_space {
                advance += text.word_space;
            }
            x += advance * text.horizontal_scale;
        }
        if let Some(start) = run_start {
            bars.push((start, x));
        }

        if visible && !bars.is_empty() {
            self.paint_text_bars(&bars, &text);
        }

        self.text_matrix = self.text_matrix.pre_concat(Transform::from_translate(x, 0.0));
    }

    fn paint_text_bars(&mut self, bars: &[(f32, f32)], text: &TextState) {
        let mut builder = PathBuilder::new();
        let top = text.rise + text.size * TEXT_BAR_HEIGHT;
        for &(start, end) in bars {
            let (left, right) = (start.min(end), start.max(end));
            let (bottom, top) = (text.rise.min(top), text.rise.max(top));
            if let Some(rect) = Rect::from_ltrb(left, bottom, right, top) {
                builder.push_rect(rect);
            }
        }
        let Some(path) = builder.finish() else {
            return;
        };

        let (color, alpha) = match text.render_mode {
            1 | 5 => (self.state.stroke, self.state.stroke_alpha),
            _ => (self.state.fill, self.state.fill_alpha),
        };
        let paint = color.paint(alpha);
        let transform = self.device_transform().pre_concat(self.text_matrix);
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, transform, None);
    }

    fn paint_xobject(&mut self, name: &[u8], resources: Option<&Dictionary>) {
        let backend = self.backend;
        let Some(entry) = resources
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|o| backend.resolve_dict(o))
            .and_then(|d| d.get(name).ok())
        else {
            log::debug!("XObject {} not found", String::from_utf8_lossy(name));
            return;
        };
        let Object::Stream(stream) = backend.resolve(entry) else {
            return;
        };

        match stream.dict.get(b"Subtype").ok().and_then(|o| o.as_name().ok()) {
            Some(b"Image") => match decode_image(backend, stream, self.state.fill.rgb8()) {
                Some(image) => {
                    let (w, h) = (image.width() as f32, image.height() as f32);
                    let unit = Transform::from_row(1.0 / w, 0.0, 0.0, -1.0 / h, 0.0, 1.0);
                    let transform = self.device_transform().pre_concat(unit);
                    let paint = PixmapPaint {
                        opacity: self.state.fill_alpha,
                        quality: tiny_skia::FilterQuality::Bilinear,
                        ..PixmapPaint::default()
                    };
                    self.pixmap
                        .draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
                }
                None => log::warn!(
                    "Skipping unsupported image {}",
                    String::from_utf8_lossy(name)
                ),
            },
            Some(b"Form") => self.paint_form(stream, resources),
            _ => {}
        }
    }

    fn paint_form(&mut self, stream: &lopdf::Stream, parent: Option<&Dictionary>) {
        if self.depth >= MAX_FORM_DEPTH {
            log::warn!("Form XObjects nested too deeply, skipping");
            return;
        }
        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let Ok(operations) = self.backend.decode_content(&data) else {
            return;
        };

        let nums: Vec<f32> = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| self.backend.resolve(o).as_array().ok())
            .map(|a| a.iter().filter_map(number).collect())
            .unwrap_or_default();
        let own_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| self.backend.resolve_dict(o));

        let saved_state = self.state.clone();
        let saved_stack = self.stack.len();
        let saved_text = (self.text_matrix, self.line_matrix);
        if let [a, b, c, d, e, f] = nums.as_slice() {
            let m = Transform::from_row(*a, *b, *c, *d, *e, *f);
            self.state.ctm = self.state.ctm.pre_concat(m);
        }

        self.depth += 1;
        self.reset_path();
        self.run(&operations, own_resources.or(parent));
        self.depth -= 1;

        self.stack.truncate(saved_stack);
        self.state = saved_state;
        (self.text_matrix, self.line_matrix) = saved_text;
    }
}
