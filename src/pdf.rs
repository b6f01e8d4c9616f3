use lopdf::{Object, StringFormat};
use owned_ttf_parser::{AsFaceRef as _, Face, OwnedFace};
use std::{
    collections::{BTreeMap, HashMap},
    io::BufWriter,
    mem,
    path::Path,
};
use time::OffsetDateTime;
use unicode_normalization::UnicodeNormalization as _;

use crate::error::{Error, ErrorKind};

/// The (insofar) relevant vertical metrics of a font.
#[derive(Clone, Copy, Debug, Default)]
pub struct FontMetrics {
    /// The ascent of the font.
    pub ascent: i16,
    /// The descent of the font.
    pub descent: i16,
    /// The number of units per em of the font.
    pub units_per_em: u16,
}

/// A font face loaded from a TTF font, together with its measure of units per em.
#[derive(Clone, Debug)]
struct TtfFontFace {
    /// The underlying font face which is represented through the `ttf_parser` crate.
    inner: std::sync::Arc<OwnedFace>,
    /// The number of units per em of the font face.
    units_per_em: u16,
}

impl TtfFontFace {
    /// Constructs a font face from the underlying raw data extracted from the TTF font file.
    fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let face = OwnedFace::from_vec(data.to_vec(), 0).map_err(|error| {
            Error::with_error(ErrorKind::Initialization, "Failed to parse font", &error)
        })?;
        let units_per_em = face.as_face_ref().units_per_em();

        Ok(Self {
            inner: std::sync::Arc::new(face),
            units_per_em,
        })
    }

    /// Retrieve the font metrics from the associated font face.
    fn font_metrics(&self) -> FontMetrics {
        FontMetrics {
            ascent: self.face().ascender(),
            descent: self.face().descender(),
            units_per_em: self.units_per_em,
        }
    }

    /// Retrieve the glyph ID of a specific codepoint, which in our case is just a `char`.
    fn glyph_id(&self, codepoint: char) -> Option<u16> {
        self.face()
            .glyph_index(codepoint)
            .map(|glyph_id| glyph_id.0)
    }

    /// Retrieve the horizontal advance of a glyph, in font units.
    fn glyph_advance(&self, glyph_id: u16) -> Option<u16> {
        self.face()
            .glyph_hor_advance(owned_ttf_parser::GlyphId(glyph_id))
    }

    /// Retrieve the mapping between the glyph IDs and the characters (codepoints) of the
    /// unicode subtables of the font.
    fn glyph_ids(&self) -> HashMap<u16, char> {
        let font_subtables = self.face().tables().cmap.map(|cmap| {
            cmap.subtables
                .into_iter()
                .filter(|font_subtable| font_subtable.is_unicode())
        });
        let Some(font_subtables) = font_subtables else {
            return HashMap::new();
        };

        let mut gid_to_codepoint_map =
            HashMap::with_capacity(self.face().number_of_glyphs().into());
        for font_subtable in font_subtables {
            font_subtable.codepoints(|codepoint| {
                use std::convert::TryFrom as _;

                if let Ok(character) = char::try_from(codepoint) {
                    if let Some(glyph_index) = font_subtable
                        .glyph_index(codepoint)
                        .filter(|index| index.0 > 0)
                    {
                        gid_to_codepoint_map
                            .entry(glyph_index.0)
                            .or_insert(character);
                    }
                }
            })
        }

        gid_to_codepoint_map
    }

    /// Retrieve the total number of glyphs present in the font face.
    fn glyph_count(&self) -> u16 {
        self.face().number_of_glyphs()
    }

    /// Retrieve the underlying font face as a reference.
    fn face(&self) -> &Face<'_> {
        self.inner.as_face_ref()
    }
}

/// A TTF font embedded into the document, used both for measuring text and for
/// drawing it. The whole font program is carried into the PDF so that any viewer
/// renders the invoice the same way.
#[derive(Debug, Clone)]
pub struct Font {
    /// The byte data the font was loaded from.
    bytes: Vec<u8>,
    /// The actual font face, together with its measure of units per em.
    ttf_face: TtfFontFace,
    /// The identifier of the font face inside the PDF resources.
    face_identifier: String,
}

impl Font {
    /// Loads a font from the raw bytes of a TTF file.
    fn from_bytes(bytes: Vec<u8>, face_identifier: String) -> Result<Self, Error> {
        let ttf_face = TtfFontFace::from_bytes(&bytes)?;
        Ok(Font {
            bytes,
            ttf_face,
            face_identifier,
        })
    }

    /// Measures the width of a line of text at the given font size, in points.
    /// Characters which have no glyph in the font are skipped, mirroring how
    /// they are skipped when the text is drawn.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let scaling = font_size / f32::from(self.ttf_face.units_per_em);
        let mut width_in_font_units = 0u32;
        for character in text.nfc() {
            let Some(glyph_id) = self.ttf_face.glyph_id(character) else {
                log::warn!("Unable to find the character {:?} in the font", character);
                continue;
            };
            if let Some(advance) = self.ttf_face.glyph_advance(glyph_id) {
                width_in_font_units += u32::from(advance);
            }
        }

        width_in_font_units as f32 * scaling
    }

    /// Measures the line height of the font at the given font size, in points.
    /// This is the ascent-to-descent extent, independent of any specific text.
    pub fn text_height(&self, font_size: f32) -> f32 {
        let metrics = self.ttf_face.font_metrics();
        let extent = i32::from(metrics.ascent) - i32::from(metrics.descent);
        extent as f32 * font_size / f32::from(metrics.units_per_em)
    }

    /// Converts a line of text into the glyph ID byte string expected by the `Tj`
    /// operator for a font encoded with `Identity-H`.
    fn encode_text(&self, text: &str) -> Vec<u8> {
        let mut glyph_id_bytes = Vec::with_capacity(text.len() * 2);
        for character in text.nfc() {
            if let Some(glyph_id) = self.ttf_face.glyph_id(character) {
                glyph_id_bytes.push((glyph_id >> 8) as u8);
                glyph_id_bytes.push((glyph_id & 255) as u8);
            } else {
                log::warn!("Unable to find the character {:?} in the font", character);
            }
        }

        glyph_id_bytes
    }

    /// Takes the font and inserts it into the PDF document as a `Type0` font with
    /// an embedded font program, returning the associated PDF dictionary. The PDF
    /// specification requires the widths array, a descriptor and a `ToUnicode`
    /// character map for text extraction to work in viewers.
    fn insert_into_document(&self, inner_document: &mut lopdf::Document) -> lopdf::Dictionary {
        use lopdf::Object::*;

        let face_metrics = self.ttf_face.font_metrics();

        // The `Length1` key carries the decompressed length of the font program
        let font_stream = lopdf::Stream::new(
            lopdf::Dictionary::from_iter(vec![("Length1", Integer(self.bytes.len() as i64))]),
            self.bytes.clone(),
        )
        .with_compression(false);

        let mut font_vector: Vec<(::std::string::String, lopdf::Object)> = vec![
            ("Type".into(), Name("Font".into())),
            ("Subtype".into(), Name("Type0".into())),
            (
                "BaseFont".into(),
                Name(self.face_identifier.clone().into_bytes()),
            ),
            // `Identity-H` is used for horizontal writing
            ("Encoding".into(), Name("Identity-H".into())),
        ];

        let mut font_descriptor_vector: Vec<(::std::string::String, lopdf::Object)> = vec![
            ("Type".into(), Name("FontDescriptor".into())),
            (
                "FontName".into(),
                Name(self.face_identifier.clone().into_bytes()),
            ),
            ("Ascent".into(), Integer(i64::from(face_metrics.ascent))),
            ("Descent".into(), Integer(i64::from(face_metrics.descent))),
            ("CapHeight".into(), Integer(i64::from(face_metrics.ascent))),
            ("ItalicAngle".into(), Integer(0)),
            // The font uses the Adobe standard Latin character set or a subset of it
            ("Flags".into(), Integer(32)),
            ("StemV".into(), Integer(80)),
        ];

        // Associate each glyph ID with its codepoint and width so that both the
        // widths array and the ToUnicode map can be derived from one traversal
        let mut gid_to_glyph_properties_map = BTreeMap::<u16, (u32, u32)>::new();
        let mut maximum_glyph_width = 0u32;
        for (glyph_id, character) in self.ttf_face.glyph_ids() {
            if let Some(advance) = self.ttf_face.glyph_advance(glyph_id) {
                maximum_glyph_width = maximum_glyph_width.max(u32::from(advance));
                gid_to_glyph_properties_map
                    .insert(glyph_id, (character as u32, u32::from(advance)));
            }
        }

        // Glyph IDs in a (beginbfchar endbfchar) block have to share the first byte
        // and a block holds at most 100 entries, so split the mapping accordingly
        let mut all_gid_to_character_blocks = Vec::new();
        let mut current_gid_to_character_block: Vec<(u32, u32)> = Vec::new();
        let mut current_first_bit: u16 = 0;
        for (glyph_id, (character, _)) in gid_to_glyph_properties_map.iter() {
            if (*glyph_id >> 8) != current_first_bit || current_gid_to_character_block.len() >= 100
            {
                all_gid_to_character_blocks.push(mem::take(&mut current_gid_to_character_block));
                current_first_bit = *glyph_id >> 8;
            }
            current_gid_to_character_block.push((u32::from(*glyph_id), *character));
        }
        all_gid_to_character_blocks.push(current_gid_to_character_block);

        let cid_to_unicode_map =
            generate_cid_to_unicode_map(self.face_identifier.clone(), all_gid_to_character_blocks);
        let cid_to_unicode_map_stream = lopdf::Stream::new(
            lopdf::Dictionary::new(),
            cid_to_unicode_map.as_bytes().to_vec(),
        );
        let cid_to_unicode_map_stream_id = inner_document.add_object(cid_to_unicode_map_stream);

        // Scale the glyph widths so that they fit into the 1000 units per em
        // square assumed by the PDF text model (see page 439 in the PDF 1.7
        // reference for the structure of the `W` array)
        let percentage_font_scaling = 1000.0 / (face_metrics.units_per_em as f32);
        let mut width_objects = Vec::<Object>::new();
        for glyph_id in 0..self.ttf_face.glyph_count() {
            if let Some(advance) = self.ttf_face.glyph_advance(glyph_id) {
                width_objects.push(Integer(i64::from(glyph_id)));
                width_objects.push(Array(vec![Integer(
                    (f32::from(advance) * percentage_font_scaling) as i64,
                )]));
            } else {
                log::warn!(
                    "Glyph ID {} for the font {:?} has no width, skipping it when adding it to the document",
                    glyph_id,
                    self.face_identifier
                );
            }
        }

        let mut font_descriptors = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Font".into())),
            ("Subtype", Name("CIDFontType2".into())),
            ("BaseFont", Name(self.face_identifier.clone().into())),
            (
                "CIDSystemInfo",
                Dictionary(lopdf::Dictionary::from_iter(vec![
                    ("Registry", String("Adobe".into(), StringFormat::Literal)),
                    ("Ordering", String("Identity".into(), StringFormat::Literal)),
                    ("Supplement", Integer(0)),
                ])),
            ),
            ("W", Array(width_objects)),
            ("DW", Integer(1000)),
        ]);

        font_descriptor_vector.push((
            "FontFile2".into(),
            Reference(inner_document.add_object(font_stream)),
        ));
        // Although the bounding box is technically not needed, Adobe Reader wants it
        font_descriptor_vector.push((
            "FontBBox".into(),
            Array(vec![
                Integer(0),
                Integer(i64::from(face_metrics.descent)),
                Integer(i64::from(maximum_glyph_width)),
                Integer(i64::from(face_metrics.ascent)),
            ]),
        ));

        let font_descriptor_vector_id =
            inner_document.add_object(lopdf::Dictionary::from_iter(font_descriptor_vector));
        font_descriptors.set("FontDescriptor", Reference(font_descriptor_vector_id));

        font_vector.push((
            "DescendantFonts".into(),
            Array(vec![Dictionary(font_descriptors)]),
        ));
        font_vector.push(("ToUnicode".into(), Reference(cid_to_unicode_map_stream_id)));

        lopdf::Dictionary::from_iter(font_vector)
    }
}

/// This struct represents the actual one-page PDF document on a high-level. It is an
/// interface to the underlying `lopdf::Document` with the addition of the embedded
/// font, the accumulated drawing operations and the link annotations of the page.
///
/// Drawing positions are expressed in points with the origin at the bottom-left
/// corner of the page, exactly as the PDF specification mandates. The flipping of
/// the vertical axis for top-anchored layouts is the business of the caller.
pub struct PdfDocument {
    /// The underlying PDF document: this is a low-level interface and shouldn't be
    /// directly interacted with unless strictly necessary.
    pub inner_document: lopdf::Document,
    /// The identifier of the document, it is used in order to set the PDF `ID` tag.
    pub identifier: String,
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    /// The embedded font together with the object ID reserved for it.
    font: (lopdf::ObjectId, Font),
    /// The drawing operations accumulated for the single page content stream.
    operations: Vec<lopdf::content::Operation>,
    /// The link annotations accumulated for the single page.
    annotations: Vec<lopdf::Dictionary>,
}

impl PdfDocument {
    /// Create a new one-page `PdfDocument` of the given size in points, embedding
    /// the TTF font found at the given path. The underlying PDF document defaults
    /// to version 1.5 of the PDF specification.
    pub fn with_font(
        identifier: String,
        page_width: f32,
        page_height: f32,
        font_path: &Path,
    ) -> Result<Self, Error> {
        let font_bytes = std::fs::read(font_path).map_err(|error| {
            Error::with_error(
                ErrorKind::Initialization,
                format!("Failed to read font {:?}", font_path),
                &error,
            )
        })?;
        let font = Font::from_bytes(font_bytes, "F0".into())?;

        let mut inner_document = lopdf::Document::with_version("1.5");
        let font_object_id = inner_document.new_object_id();

        Ok(PdfDocument {
            inner_document,
            identifier,
            width: page_width,
            height: page_height,
            font: (font_object_id, font),
            operations: Vec::new(),
            annotations: Vec::new(),
        })
    }

    /// The embedded font, for measuring text before placing it.
    pub fn font(&self) -> &Font {
        &self.font.1
    }

    /// Writes the text in the embedded font at the given size, color and position
    /// onto the page. The position is the left end of the text baseline, in points
    /// from the bottom-left corner of the page.
    pub fn write_text(&mut self, text: &str, font_size: f32, color: [f32; 3], position: [f32; 2]) {
        use lopdf::content::Operation;

        let glyph_id_bytes = self.font.1.encode_text(text);
        let face_identifier = self.font.1.face_identifier.clone();
        let [x, y] = position;
        let [r, g, b] = color;
        self.operations.extend(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![face_identifier.into(), font_size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new(
                "rg",
                vec![r, g, b].into_iter().map(lopdf::Object::Real).collect(),
            ),
            Operation::new(
                "Tj",
                vec![lopdf::Object::String(
                    glyph_id_bytes,
                    StringFormat::Hexadecimal,
                )],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Strokes a straight line between the two given points.
    pub fn draw_line(&mut self, from: [f32; 2], to: [f32; 2], color: [f32; 3], thickness: f32) {
        use lopdf::content::Operation;

        let [r, g, b] = color;
        self.operations.extend(vec![
            Operation::new(
                "RG",
                vec![r, g, b].into_iter().map(lopdf::Object::Real).collect(),
            ),
            Operation::new("w", vec![thickness.into()]),
            Operation::new("m", vec![from[0].into(), from[1].into()]),
            Operation::new("l", vec![to[0].into(), to[1].into()]),
            Operation::new("S", vec![]),
        ]);
    }

    /// Registers a clickable link annotation over the given rectangle, expressed as
    /// `[lower_left_x, lower_left_y, upper_right_x, upper_right_y]` in page points.
    pub fn add_link_annotation(&mut self, rectangle: [f32; 4], url: &str) {
        use lopdf::Object::*;

        let action = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Action".into())),
            ("S", Name("URI".into())),
            (
                "URI",
                String(url.as_bytes().to_vec(), StringFormat::Literal),
            ),
        ]);
        let annotation = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Annot".into())),
            ("Subtype", Name("Link".into())),
            (
                "Rect",
                Array(rectangle.iter().map(|value| Real(*value)).collect()),
            ),
            ("Border", Array(vec![Integer(0), Integer(0), Integer(0)])),
            ("C", Array(vec![Integer(0), Integer(0), Integer(1)])),
            ("A", Dictionary(action)),
        ]);

        self.annotations.push(annotation);
    }

    /// Assembles the catalog, the page tree, the resources and the content stream
    /// of the page, then serializes the whole document to bytes. This consumes the
    /// accumulated operations: the document is meant to be saved exactly once.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, Error> {
        use lopdf::Object::*;
        use lopdf::StringFormat::*;

        let now = OffsetDateTime::now_utc();
        let document_info = lopdf::Dictionary::from_iter(vec![
            ("Trapped", "False".into()),
            (
                "CreationDate",
                String(to_pdf_timestamp_format(&now).into_bytes(), Literal),
            ),
            (
                "ModDate",
                String(to_pdf_timestamp_format(&now).into_bytes(), Literal),
            ),
            ("Title", String("Invoice".to_string().into_bytes(), Literal)),
            (
                "Producer",
                String("invoicr".to_string().into_bytes(), Literal),
            ),
            (
                "Identifier",
                String(self.identifier.clone().into_bytes(), Literal),
            ),
        ]);
        let document_info_id = self.inner_document.add_object(Dictionary(document_info));

        let pages_id = self.inner_document.new_object_id();
        let catalog = lopdf::Dictionary::from_iter(vec![
            ("Type", "Catalog".into()),
            ("PageLayout", "OneColumn".into()),
            ("PageMode", "UseNone".into()),
            ("Pages", Reference(pages_id)),
        ]);
        let catalog_id = self.inner_document.add_object(catalog);

        self.inner_document
            .trailer
            .set("Root", Reference(catalog_id));
        self.inner_document
            .trailer
            .set("Info", Reference(document_info_id));
        self.inner_document.trailer.set(
            "ID",
            Array(vec![
                String(self.identifier.clone().into_bytes(), Literal),
                String(self.identifier.clone().into_bytes(), Literal),
            ]),
        );

        // Embed the font and collect the page resources
        let font_dictionary_object = self.font.1.insert_into_document(&mut self.inner_document);
        self.inner_document
            .objects
            .insert(self.font.0, Dictionary(font_dictionary_object));
        let mut fonts_dictionary = lopdf::Dictionary::new();
        fonts_dictionary.set(self.font.1.face_identifier.clone(), Reference(self.font.0));
        let resources_id = self
            .inner_document
            .add_object(Dictionary(lopdf::Dictionary::from_iter(vec![(
                "Font",
                Dictionary(fonts_dictionary),
            )])));

        // Encode the accumulated drawing operations into the page content stream
        let content = lopdf::content::Content {
            operations: mem::take(&mut self.operations),
        };
        let content_bytes = content.encode().map_err(|error| {
            Error::with_error(
                ErrorKind::Persistence,
                "Failed to encode the page content stream",
                &error,
            )
        })?;
        let page_content_id = self
            .inner_document
            .add_object(lopdf::Stream::new(lopdf::Dictionary::new(), content_bytes));

        let annotation_references: Vec<Object> = mem::take(&mut self.annotations)
            .into_iter()
            .map(|annotation| Reference(self.inner_document.add_object(annotation)))
            .collect();

        let page_dictionary = lopdf::Dictionary::from_iter(vec![
            ("Type", "Page".into()),
            ("Rotate", Integer(0)),
            (
                "MediaBox",
                vec![0.into(), 0.into(), self.width.into(), self.height.into()].into(),
            ),
            (
                "TrimBox",
                vec![0.into(), 0.into(), self.width.into(), self.height.into()].into(),
            ),
            (
                "CropBox",
                vec![0.into(), 0.into(), self.width.into(), self.height.into()].into(),
            ),
            ("Annots", Array(annotation_references)),
            ("Parent", Reference(pages_id)),
            ("Resources", Reference(resources_id)),
            ("Contents", Reference(page_content_id)),
        ]);
        let page_id = self.inner_document.add_object(page_dictionary);

        let pages = lopdf::Dictionary::from_iter(vec![
            ("Type", "Pages".into()),
            ("Count", Integer(1)),
            ("Kids", Array(vec![Reference(page_id)])),
        ]);
        self.inner_document
            .objects
            .insert(pages_id, Dictionary(pages));

        let mut pdf_document_bytes = Vec::new();
        let mut writer = BufWriter::new(&mut pdf_document_bytes);
        self.inner_document.save_to(&mut writer).map_err(|error| {
            Error::with_error(
                ErrorKind::Persistence,
                "Error while saving the PDF document to bytes",
                &error,
            )
        })?;
        mem::drop(writer);

        Ok(pdf_document_bytes)
    }

    /// Serializes the document and persists it at the given path.
    pub fn save_to_file(&mut self, pdf_path: &Path) -> Result<(), Error> {
        let pdf_document_bytes = self.save_to_bytes()?;
        std::fs::write(pdf_path, pdf_document_bytes).map_err(|error| {
            Error::with_error(
                ErrorKind::Persistence,
                format!("Failed to write the PDF document {:?}", pdf_path),
                &error,
            )
        })
    }
}

type CmapBlock = Vec<(u32, u32)>;

/// Generates a CMAP (character map) from valid cmap blocks by iterating over them.
/// The surrounding postscript scaffolding is the one mandated by the PDF
/// specification for `ToUnicode` character maps.
fn generate_cid_to_unicode_map(face_name: String, all_cmap_blocks: Vec<CmapBlock>) -> String {
    let mut cid_to_unicode_map = format!(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo <<\n\
         /Registry (Adobe)\n\
         /Ordering (UCS)\n\
         /Supplement 0\n\
         >> def\n\
         /CMapName /{face_name} def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <ffff>\n\
         endcodespacerange\n"
    );

    for cmap_block in all_cmap_blocks
        .into_iter()
        .filter(|block| !block.is_empty())
    {
        cid_to_unicode_map.push_str(format!("{} beginbfchar\r\n", cmap_block.len()).as_str());
        for (glyph_id, unicode) in cmap_block {
            cid_to_unicode_map.push_str(format!("<{glyph_id:04x}> <{unicode:04x}>\n").as_str());
        }
        cid_to_unicode_map.push_str("endbfchar\r\n");
    }

    cid_to_unicode_map.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );

    cid_to_unicode_map
}

/// Formats the given time so that it matches what the PDF specification expects.
/// An example of it is the following: D:20170505150224+02'00'.
fn to_pdf_timestamp_format(date: &OffsetDateTime) -> String {
    let offset = date.offset();
    let offset_sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset_sign}{:02}'{:02}'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        offset.whole_hours().abs(),
        offset.minutes_past_hour().abs(),
    )
}
