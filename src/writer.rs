use std::path::Path;

use crate::error::Error;
use crate::pdf::PdfDocument;

/// Width of an A4 page in points.
pub const PAGE_WIDTH: f32 = 595.28;
/// Height of an A4 page in points.
pub const PAGE_HEIGHT: f32 = 841.89;

/// The margin applied around the page content. `cursor_to` in non-raw mode offsets
/// both coordinates by this constant.
pub const PAGE_PADDING: f32 = 20.0;

/// How far below the text baseline the link underline is stroked.
const LINK_BOTTOM_GAP: f32 = 2.0;
/// The vertical step of `new_line` and `retreat_line`. This is the sub-header
/// vertical gap regardless of what size class was last written, a known
/// imprecision kept from the reference behavior.
const LINE_GAP: f32 = 5.0;

/// The color the link underline is stroked with.
const UNDERLINE_COLOR: [f32; 3] = [0.7, 0.7, 0.74];
/// The default text fill color.
pub const BLACK: [f32; 3] = [0.0, 0.0, 0.0];

/// The three text sizes an invoice is composed of. Each class carries its own
/// point size and the gaps added to the cursor after a write in that class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeClass {
    Header,
    SubHeader,
    #[default]
    Text,
}

impl SizeClass {
    /// The font size of this class, in points.
    pub fn point_size(&self) -> f32 {
        match self {
            SizeClass::Header => 20.0,
            SizeClass::SubHeader => 15.0,
            SizeClass::Text => 12.0,
        }
    }

    /// The horizontal gap added after a write which advances horizontally.
    fn gap_x(&self) -> f32 {
        match self {
            SizeClass::Header => 3.0,
            SizeClass::SubHeader => 3.0,
            SizeClass::Text => 2.0,
        }
    }

    /// The vertical gap added after a write which advances vertically.
    fn gap_y(&self) -> f32 {
        match self {
            SizeClass::Header => 6.0,
            SizeClass::SubHeader => 5.0,
            SizeClass::Text => 4.0,
        }
    }
}

/// Which way the cursor moves after a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// The cursor stays where it is, used for static labels.
    #[default]
    None,
    /// Advance `x` by the text width plus the class horizontal gap.
    Horizontal,
    /// Advance `y` by the text height plus the class vertical gap.
    Vertical,
    /// Advance both axes.
    Diagonal,
}

/// The current write position on the page, in content coordinates: `x` grows
/// rightwards and `y` grows downwards from the top margin. The flip to the
/// bottom-left PDF coordinate space happens inside `write`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub x: f32,
    pub y: f32,
}

/// One atomic placement operation against the writer: the text, its size class,
/// its fill color and optionally a URL to attach as a clickable link.
#[derive(Debug, Clone)]
pub struct WriteSpec {
    pub text: String,
    pub size: SizeClass,
    pub color: [f32; 3],
    pub url: Option<String>,
}

impl WriteSpec {
    /// A plain black `Text`-class spec for the given text.
    pub fn text<S: Into<String>>(text: S) -> WriteSpec {
        WriteSpec {
            text: text.into(),
            size: SizeClass::Text,
            color: BLACK,
            url: None,
        }
    }

    /// Changes the size class of the spec.
    pub fn size(mut self, size: SizeClass) -> WriteSpec {
        self.size = size;
        self
    }

    /// Changes the fill color of the spec.
    pub fn color(mut self, color: [f32; 3]) -> WriteSpec {
        self.color = color;
        self
    }

    /// Attaches a clickable link to the spec.
    pub fn url<S: Into<String>>(mut self, url: S) -> WriteSpec {
        self.url = Some(url.into());
        self
    }
}

/// A cursor-based writer over a single fixed-size PDF page.
///
/// The writer owns a mutable write position and exposes primitives to place text,
/// register clickable link markers and move the cursor around. It enforces no
/// column discipline: renderers re-anchor the cursor between sections themselves,
/// usually by snapshotting it through `cursor` and restoring it later. Writing
/// outside the page box silently draws outside the visible area, which is an
/// accepted limitation of the single-page model rather than an error.
pub struct Writer {
    document: PdfDocument,
    cursor: Cursor,
    /// Page width in points, readable by renderers for column arithmetic.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
}

impl Writer {
    /// Creates a blank A4 page and embeds the monospace font found at the given
    /// path. The cursor starts at the top-left content corner, one padding away
    /// from both page edges.
    pub fn initialize(identifier: String, font_path: &Path) -> Result<Writer, Error> {
        let document = PdfDocument::with_font(identifier, PAGE_WIDTH, PAGE_HEIGHT, font_path)?;

        Ok(Writer {
            document,
            cursor: Cursor {
                x: PAGE_PADDING,
                y: PAGE_PADDING,
            },
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
        })
    }

    /// Places one piece of text at the current cursor and then advances the cursor
    /// according to the given direction. The stored `y` grows downwards from the
    /// top of the page, so the draw position flips it against the page height.
    /// If the spec carries a URL, a link annotation spanning the text box is
    /// registered and a thin underline is stroked below the baseline.
    pub fn write(&mut self, direction: Direction, spec: &WriteSpec) {
        let point_size = spec.size.point_size();
        let text_width = self.document.font().text_width(&spec.text, point_size);
        let text_height = self.document.font().text_height(point_size);

        // The baseline sits one point size below the stored cursor line
        let start = [self.cursor.x, self.height - self.cursor.y - point_size];
        let end = [self.cursor.x + text_width, self.height - self.cursor.y];

        self.document
            .write_text(&spec.text, point_size, spec.color, start);

        if let Some(url) = &spec.url {
            self.document.add_link_annotation(
                [start[0], start[1], end[0], end[1] - LINK_BOTTOM_GAP],
                url,
            );
            self.document.draw_line(
                [start[0], start[1] - LINK_BOTTOM_GAP],
                [end[0], start[1] - LINK_BOTTOM_GAP],
                UNDERLINE_COLOR,
                1.0,
            );
        }

        if matches!(direction, Direction::Horizontal | Direction::Diagonal) {
            self.cursor.x += text_width + spec.size.gap_x();
        }
        if matches!(direction, Direction::Vertical | Direction::Diagonal) {
            self.cursor.y += text_height + spec.size.gap_y();
        }
    }

    /// Applies `write` with a shared direction to every present item. Absent items
    /// model optional invoice fields: they are skipped entirely, contributing no
    /// draw call and no cursor movement. Empty text counts as absent.
    pub fn bulk_write<I>(&mut self, direction: Direction, items: I)
    where
        I: IntoIterator<Item = Option<WriteSpec>>,
    {
        for item in items {
            if let Some(spec) = item {
                if !spec.text.is_empty() {
                    self.write(direction, &spec);
                }
            }
        }
    }

    /// Sets the cursor absolutely. When `raw` is false both coordinates are offset
    /// by the page padding; raw mode uses them exactly as given, for callers which
    /// already think in padded coordinates.
    pub fn cursor_to(&mut self, x: f32, y: f32, raw: bool) {
        let offset = if raw { 0.0 } else { PAGE_PADDING };
        self.cursor.x = x + offset;
        self.cursor.y = y + offset;
    }

    /// Moves the cursor down by the given number of line gaps.
    pub fn new_line(&mut self, repeat: u32) {
        self.cursor.y += repeat as f32 * LINE_GAP;
    }

    /// Moves the cursor back up by the given number of line gaps.
    pub fn retreat_line(&mut self, repeat: u32) {
        self.cursor.y -= repeat as f32 * LINE_GAP;
    }

    /// A snapshot of the current cursor.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Restores a previously snapshotted cursor.
    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    /// Serializes the whole document and persists it at the given path. This is
    /// terminal: the writer is not meant to be used after saving.
    pub fn save(&mut self, pdf_path: &Path) -> Result<(), Error> {
        self.document.save_to_file(pdf_path)
    }

    /// Serializes the whole document to bytes, mainly for tests which want to load
    /// the result back instead of touching the filesystem.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, Error> {
        self.document.save_to_bytes()
    }

    /// The width of the given text at the given size class, in points.
    pub fn measure(&self, text: &str, size: SizeClass) -> f32 {
        self.document.font().text_width(text, size.point_size())
    }
}
