//! [`DocumentEngine`] backed by `lopdf`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::content::{self, PageScan, ShowKind, ShowOp};
use super::encoding::encode_win_ansi;
use super::fonts::{self, get_number, resolve};
use super::{layout, DocumentEngine, ImagePolicy, PageId, RedactOptions, TextInsertion, TextPage};
use crate::detect;
use crate::error::{Error, Result};
use crate::font::SubstituteFont;
use crate::model::{Point, Rect, Rgb};
use crate::options::SaveOptions;

/// Page size used when no `MediaBox` is found (US Letter).
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Longest `Parent` chain followed for inherited page attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Where a page keeps its resource dictionary.
#[derive(Debug, Clone, Copy)]
enum ResourcesLoc {
    /// `/Resources n 0 R`
    Indirect(ObjectId),
    /// `/Resources << ... >>` inside the page dictionary
    Inline,
}

/// Document engine over an in-memory `lopdf::Document`.
pub struct LopdfEngine {
    doc: Document,
    /// Pending redaction rectangles by page number
    redactions: HashMap<u32, Vec<Rect>>,
    /// Pages whose original content is enclosed in `q`/`Q`
    wrapped: HashSet<PageId>,
    /// Font objects added for inserted text
    fonts: HashMap<SubstituteFont, ObjectId>,
}

impl LopdfEngine {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        detect::detect_header_from_path(path)?;
        let doc = Document::load(path).map_err(open_error)?;
        Ok(Self::from_document(doc))
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        detect::detect_header_from_bytes(data)?;
        let doc = Document::load_mem(data).map_err(open_error)?;
        Ok(Self::from_document(doc))
    }

    /// Load from a reader.
    pub fn load_reader<R: std::io::Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::load_bytes(&data)
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: Document) -> Self {
        Self {
            doc,
            redactions: HashMap::new(),
            wrapped: HashSet::new(),
            fonts: HashMap::new(),
        }
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &Document {
        &self.doc
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn page_id(&self, page: u32) -> Result<PageId> {
        let pages = self.doc.get_pages();
        pages
            .get(&page)
            .copied()
            .ok_or(Error::PageOutOfRange(page, pages.len() as u32))
    }

    fn page_dict_mut(&mut self, page_id: PageId) -> Result<&mut Dictionary> {
        Ok(self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)?)
    }

    /// Look up a page attribute, following `Parent` for inherited ones.
    fn inherited(&self, page_id: PageId, key: &[u8]) -> Option<&Object> {
        let mut node = self.doc.get_dictionary(page_id).ok();
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let dict = node?;
            if let Ok(value) = dict.get(key) {
                return Some(resolve(&self.doc, value));
            }
            node = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|id| self.doc.get_dictionary(id))
                .ok();
        }
        None
    }

    fn page_size(&self, page_id: PageId) -> (f32, f32) {
        let media_box: Option<Vec<f32>> = self
            .inherited(page_id, b"MediaBox")
            .and_then(|o| o.as_array().ok())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| get_number(resolve(&self.doc, v)))
                    .collect()
            });
        match media_box.as_deref() {
            Some([x0, y0, x1, y1]) => ((x1 - x0).abs(), (y1 - y0).abs()),
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    /// Resource names of the page's image XObjects.
    fn image_names(&self, page_id: PageId) -> HashSet<Vec<u8>> {
        let xobjects = self
            .inherited(page_id, b"Resources")
            .and_then(|o| o.as_dict().ok())
            .and_then(|resources| resources.get(b"XObject").ok())
            .map(|o| resolve(&self.doc, o))
            .and_then(|o| o.as_dict().ok());
        let Some(xobjects) = xobjects else {
            return HashSet::new();
        };

        xobjects
            .iter()
            .filter(|(_, obj)| match resolve(&self.doc, obj) {
                Object::Stream(stream) => stream
                    .dict
                    .get(b"Subtype")
                    .and_then(Object::as_name)
                    .is_ok_and(|name| name == b"Image"),
                _ => false,
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Concatenated, decompressed content of a page.
    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page = self.doc.get_dictionary(page_id)?;
        let Ok(contents) = page.get(b"Contents") else {
            return Ok(Vec::new());
        };

        let mut data = Vec::new();
        for item in content_items(&self.doc, contents) {
            if let Object::Stream(stream) = resolve(&self.doc, item) {
                let bytes = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                data.extend_from_slice(&bytes);
                data.push(b'\n');
            }
        }
        Ok(data)
    }

    fn operations(&self, page_id: PageId) -> Result<Vec<Operation>> {
        let data = self.page_content(page_id)?;
        Content::decode(&data)
            .map(|content| content.operations)
            .map_err(|e| Error::TextExtract(format!("page content: {}", e)))
    }

    /// Interpret a page's content.
    fn scan_page(&self, page_id: PageId, operations: &[Operation]) -> Result<PageScan> {
        let fonts = fonts::page_fonts(&self.doc, page_id)
            .map_err(|e| Error::TextExtract(format!("page fonts: {}", e)))?;
        let images = self.image_names(page_id);
        Ok(content::scan(operations, &fonts, &images))
    }

    fn add_content(&mut self, operations: Vec<Operation>) -> Result<ObjectId> {
        let data = Content { operations }.encode()?;
        Ok(self.doc.add_object(Stream::new(Dictionary::new(), data)))
    }

    /// Enclose the page's current content in `q`/`Q` so appended content
    /// starts from the default graphics state.
    fn wrap_contents(&mut self, page_id: PageId) -> Result<()> {
        if self.wrapped.contains(&page_id) {
            return Ok(());
        }

        let existing: Vec<Object> = {
            let page = self.doc.get_dictionary(page_id)?;
            match page.get(b"Contents") {
                Ok(contents) => content_items(&self.doc, contents)
                    .into_iter()
                    .cloned()
                    .collect(),
                Err(_) => Vec::new(),
            }
        };

        let open = self.add_content(vec![Operation::new("q", vec![])])?;
        let close = self.add_content(vec![Operation::new("Q", vec![])])?;

        let mut items = Vec::with_capacity(existing.len() + 2);
        items.push(Object::Reference(open));
        items.extend(existing);
        items.push(Object::Reference(close));

        self.page_dict_mut(page_id)?
            .set("Contents", Object::Array(items));
        self.wrapped.insert(page_id);
        Ok(())
    }

    fn append_contents(&mut self, page_id: PageId, stream_id: ObjectId) -> Result<()> {
        let page = self.page_dict_mut(page_id)?;
        let contents = match page.get(b"Contents").ok().cloned() {
            Some(Object::Array(mut items)) => {
                items.push(Object::Reference(stream_id));
                Object::Array(items)
            }
            Some(existing @ Object::Reference(_)) => {
                Object::Array(vec![existing, Object::Reference(stream_id)])
            }
            _ => Object::Reference(stream_id),
        };
        page.set("Contents", contents);
        Ok(())
    }

    /// Font object for a substitute face, created on first use.
    fn font_object(&mut self, font: SubstituteFont) -> ObjectId {
        if let Some(id) = self.fonts.get(&font) {
            return *id;
        }
        let id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(font.base_font().as_bytes().to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        self.fonts.insert(font, id);
        id
    }

    /// Give the page a resource dictionary of its own, copying an inherited
    /// one if needed.
    fn own_resources(&mut self, page_id: PageId) -> Result<ResourcesLoc> {
        match self.doc.get_dictionary(page_id)?.get(b"Resources") {
            Ok(Object::Reference(id)) => return Ok(ResourcesLoc::Indirect(*id)),
            Ok(Object::Dictionary(_)) => return Ok(ResourcesLoc::Inline),
            _ => {}
        }

        let inherited = self
            .inherited(page_id, b"Resources")
            .and_then(|o| o.as_dict().ok())
            .cloned()
            .unwrap_or_else(Dictionary::new);
        self.page_dict_mut(page_id)?
            .set("Resources", Object::Dictionary(inherited));
        Ok(ResourcesLoc::Inline)
    }

    fn resources_mut(&mut self, page_id: PageId, loc: ResourcesLoc) -> Result<&mut Dictionary> {
        match loc {
            ResourcesLoc::Indirect(id) => Ok(self
                .doc
                .get_object_mut(id)
                .and_then(Object::as_dict_mut)?),
            ResourcesLoc::Inline => Ok(self
                .page_dict_mut(page_id)?
                .get_mut(b"Resources")
                .and_then(Object::as_dict_mut)?),
        }
    }

    /// Make a substitute face available to the page. Returns its resource name.
    fn register_font(&mut self, page_id: PageId, font: SubstituteFont) -> Result<Vec<u8>> {
        let font_id = self.font_object(font);
        let key = font.resource_key().as_bytes().to_vec();
        let loc = self.own_resources(page_id)?;

        let shared_fonts = self
            .resources_mut(page_id, loc)?
            .get(b"Font")
            .and_then(Object::as_reference)
            .ok();

        match shared_fonts {
            Some(fonts_id) => {
                self.doc
                    .get_object_mut(fonts_id)
                    .and_then(Object::as_dict_mut)?
                    .set(key.clone(), Object::Reference(font_id));
            }
            None => {
                let resources = self.resources_mut(page_id, loc)?;
                if let Ok(Object::Dictionary(fonts)) = resources.get_mut(b"Font") {
                    fonts.set(key.clone(), Object::Reference(font_id));
                } else {
                    let mut fonts = Dictionary::new();
                    fonts.set(key.clone(), Object::Reference(font_id));
                    resources.set("Font", Object::Dictionary(fonts));
                }
            }
        }

        Ok(key)
    }

    fn stamp_metadata(&mut self) {
        let info_id = match self.doc.trailer.get(b"Info").ok().cloned() {
            Some(Object::Reference(id)) => id,
            Some(Object::Dictionary(info)) => self.doc.add_object(info),
            _ => self.doc.add_object(Dictionary::new()),
        };
        self.doc.trailer.set("Info", Object::Reference(info_id));

        let date = format!("D:{}", Utc::now().format("%Y%m%d%H%M%SZ"));
        let producer = format!("regender {}", crate::VERSION);

        if let Ok(Object::Dictionary(info)) = self.doc.get_object_mut(info_id) {
            info.set(
                "ModDate",
                Object::String(date.into_bytes(), StringFormat::Literal),
            );
            info.set(
                "Producer",
                Object::String(producer.into_bytes(), StringFormat::Literal),
            );
        }
    }
}

impl DocumentEngine for LopdfEngine {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn text_page(&self, page: u32) -> Result<TextPage> {
        let page_id = self.page_id(page)?;
        let operations = self.operations(page_id)?;
        let scan = self.scan_page(page_id, &operations)?;
        let (width, height) = self.page_size(page_id);

        Ok(TextPage {
            number: page,
            width,
            height,
            blocks: layout::blocks(&scan),
        })
    }

    fn add_redaction(&mut self, page: u32, rect: Rect) -> Result<()> {
        self.page_id(page)?;
        self.redactions.entry(page).or_default().push(rect);
        Ok(())
    }

    fn apply_redactions(&mut self, page: u32, options: &RedactOptions) -> Result<usize> {
        let page_id = self.page_id(page)?;
        let rects = match self.redactions.remove(&page) {
            Some(rects) if !rects.is_empty() => rects,
            _ => return Ok(0),
        };

        let operations = self
            .operations(page_id)
            .map_err(|e| Error::Redaction(e.to_string()))?;
        let scan = self
            .scan_page(page_id, &operations)
            .map_err(|e| Error::Redaction(e.to_string()))?;
        let mut edits = plan_removal(&scan, &rects, options.images);
        let removed = edits.len();

        let mut rewritten = Vec::with_capacity(operations.len() + 2);
        rewritten.push(Operation::new("q", vec![]));
        for (index, op) in operations.into_iter().enumerate() {
            match edits.remove(&index) {
                Some(replacement) => rewritten.extend(replacement),
                None => rewritten.push(op),
            }
        }
        rewritten.push(Operation::new("Q", vec![]));

        if let Some(fill) = options.fill {
            for rect in &rects {
                rewritten.extend(fill_rect(rect, fill));
            }
        }

        let stream_id = self.add_content(rewritten)?;
        self.page_dict_mut(page_id)?
            .set("Contents", Object::Reference(stream_id));
        self.wrapped.insert(page_id);

        log::debug!(
            "page {}: {} rect(s) applied, {} operation(s) removed",
            page,
            rects.len(),
            removed
        );
        Ok(removed)
    }

    fn insert_text(
        &mut self,
        page: u32,
        origin: Point,
        text: &str,
        style: &TextInsertion,
    ) -> Result<()> {
        if !(style.size.is_finite() && style.size > 0.0) {
            return Err(Error::GlyphInsertion(format!(
                "invalid font size {}",
                style.size
            )));
        }
        if let Some(scale) = style.horizontal_scale {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(Error::GlyphInsertion(format!(
                    "invalid horizontal scale {}",
                    scale
                )));
            }
        }

        let page_id = self.page_id(page)?;
        let bytes = encode_win_ansi(text)?;
        let key = self.register_font(page_id, style.font)?;
        self.wrap_contents(page_id)?;

        let color = style.color;
        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "rg",
                vec![
                    Object::Real(color.r),
                    Object::Real(color.g),
                    Object::Real(color.b),
                ],
            ),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(key), Object::Real(style.size)]),
        ];
        if let Some(scale) = style.horizontal_scale {
            operations.push(Operation::new("Tz", vec![Object::Real(scale * 100.0)]));
        }
        operations.extend([
            Operation::new(
                "Tm",
                vec![
                    1.into(),
                    0.into(),
                    0.into(),
                    1.into(),
                    Object::Real(origin.x),
                    Object::Real(origin.y),
                ],
            ),
            Operation::new("Tj", vec![Object::String(bytes, StringFormat::Hexadecimal)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ]);

        let stream_id = self.add_content(operations)?;
        self.append_contents(page_id, stream_id)
    }

    fn save_to(&mut self, writer: &mut dyn Write, options: &SaveOptions) -> Result<()> {
        if options.stamp_metadata {
            self.stamp_metadata();
        }
        if options.garbage_collect {
            self.doc.prune_objects();
            self.doc.delete_zero_length_streams();
            self.doc.renumber_objects();
            // Object ids changed.
            self.fonts.clear();
            self.wrapped.clear();
        }
        if options.compress {
            self.doc.compress();
        }

        let mut writer = writer;
        self.doc
            .save_to(&mut writer)
            .map_err(|e| Error::Save(e.to_string()))?;
        Ok(())
    }
}

fn open_error(err: lopdf::Error) -> Error {
    match err {
        lopdf::Error::Decryption(_) => Error::Encrypted,
        lopdf::Error::IO(e) => Error::Io(e),
        other => Error::DocumentOpen(other.to_string()),
    }
}

/// Streams (or references to them) listed by a `Contents` entry.
fn content_items<'a>(doc: &'a Document, contents: &'a Object) -> Vec<&'a Object> {
    match resolve(doc, contents) {
        Object::Array(items) => items.iter().collect(),
        _ => vec![contents],
    }
}

/// Replacement operations by operation index for everything under `rects`.
fn plan_removal(
    scan: &PageScan,
    rects: &[Rect],
    images: ImagePolicy,
) -> HashMap<usize, Vec<Operation>> {
    let mut edits = HashMap::new();

    for show in &scan.shows {
        let centre = show.bbox.center();
        if rects.iter().any(|r| r.contains(centre)) {
            edits.insert(show.index, blank_show(show));
        }
    }

    if images == ImagePolicy::Remove {
        for image in &scan.images {
            if rects.iter().any(|r| r.intersects(&image.bbox)) {
                edits.insert(image.index, Vec::new());
            }
        }
    }

    edits
}

/// Operations that keep a show's effect on the text state without drawing.
fn blank_show(show: &ShowOp) -> Vec<Operation> {
    let mut ops = Vec::new();
    match show.kind {
        ShowKind::Inline => {}
        ShowKind::NextLine => ops.push(Operation::new("T*", vec![])),
        ShowKind::NextLineSpaced {
            word_spacing,
            char_spacing,
        } => {
            ops.push(Operation::new("Tw", vec![Object::Real(word_spacing)]));
            ops.push(Operation::new("Tc", vec![Object::Real(char_spacing)]));
            ops.push(Operation::new("T*", vec![]));
        }
    }

    let per_unit = show.font_size * show.horizontal_scale;
    if per_unit.abs() > f32::EPSILON && show.advance != 0.0 {
        let adjustment = -show.advance * 1000.0 / per_unit;
        ops.push(Operation::new(
            "TJ",
            vec![Object::Array(vec![Object::Real(adjustment)])],
        ));
    }
    ops
}

fn fill_rect(rect: &Rect, color: Rgb) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "rg",
            vec![
                Object::Real(color.r),
                Object::Real(color.g),
                Object::Real(color.b),
            ],
        ),
        Operation::new(
            "re",
            vec![
                Object::Real(rect.x0),
                Object::Real(rect.y0),
                Object::Real(rect.width()),
                Object::Real(rect.height()),
            ],
        ),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
    ]
}
