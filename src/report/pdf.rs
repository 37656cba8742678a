// =============================================================================
// PDF rendering of a text report — printpdf backend
// =============================================================================
//
// A `TextDocument` is an ordered list of left-aligned lines. Layout flows
// the lines top to bottom over as many A4 pages as needed; rendering hands
// each placed line to printpdf with one of the built-in Type1 fonts.
// =============================================================================

use anyhow::Result;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};

/// A4 in millimetres.
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 18.0;

/// One typographic point in millimetres.
const PT_TO_MM: f32 = 25.4 / 72.0;
const LINE_SPACING: f32 = 1.4;

/// Built-in fonts available to report text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Mono,
}

impl Font {
    fn builtin(self) -> BuiltinFont {
        match self {
            Self::Regular => BuiltinFont::Helvetica,
            Self::Bold => BuiltinFont::HelveticaBold,
            Self::Mono => BuiltinFont::Courier,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub font: Font,
    pub size: f32,
    pub text: String,
}

impl TextLine {
    fn leading_mm(&self) -> f32 {
        self.size * LINE_SPACING * PT_TO_MM
    }
}

/// A line with its baseline position on a page, measured from the bottom
/// edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placed<'a> {
    pub line: &'a TextLine,
    pub y_mm: f32,
}

#[derive(Debug, Clone)]
pub struct TextDocument {
    title: String,
    lines: Vec<TextLine>,
}

impl TextDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(&mut self, font: Font, size: f32, text: impl Into<String>) -> &mut Self {
        self.lines.push(TextLine {
            font,
            size,
            text: text.into(),
        });
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.line(Font::Regular, 8.0, "")
    }

    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    /// Distribute every line over pages. A line that does not fit above the
    /// bottom margin starts a new page; nothing is dropped.
    pub fn layout(&self) -> Vec<Vec<Placed<'_>>> {
        let top = PAGE_HEIGHT_MM - MARGIN_MM;
        let mut pages: Vec<Vec<Placed<'_>>> = vec![Vec::new()];
        let mut y = top;

        for line in &self.lines {
            let leading = line.leading_mm();
            let page_has_lines = pages.last().map_or(false, |p| !p.is_empty());
            if y - leading < MARGIN_MM && page_has_lines {
                pages.push(Vec::new());
                y = top;
            }
            y -= leading;
            if let Some(page) = pages.last_mut() {
                page.push(Placed { line, y_mm: y });
            }
        }
        pages
    }

    /// Render every page into PDF bytes.
    pub fn render(&self) -> Result<Vec<u8>> {
        let pages = self.layout();
        let (doc, first_page, first_layer) = PdfDocument::new(
            self.title.clone(),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Page 1".to_string(),
        );
        let fonts = FontSet::load(&doc)?;

        let mut target = (first_page, first_layer);
        for (n, placed) in pages.iter().enumerate() {
            if n > 0 {
                target = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), format!("Page {}", n + 1));
            }
            let layer = doc.get_page(target.0).get_layer(target.1);
            for p in placed.iter().filter(|p| !p.line.text.is_empty()) {
                layer.use_text(
                    p.line.text.clone(),
                    p.line.size,
                    Mm(MARGIN_MM),
                    Mm(p.y_mm),
                    fonts.get(p.line.font),
                );
            }
        }

        doc.save_to_bytes()
            .map_err(|e| anyhow::anyhow!("failed to serialise PDF: {e:?}"))
    }
}

struct FontSet {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    mono: IndirectFontRef,
}

impl FontSet {
    fn load(doc: &PdfDocumentReference) -> Result<Self> {
        let add = |font: Font| {
            doc.add_builtin_font(font.builtin())
                .map_err(|e| anyhow::anyhow!("failed to add font {font:?}: {e:?}"))
        };
        Ok(Self {
            regular: add(Font::Regular)?,
            bold: add(Font::Bold)?,
            mono: add(Font::Mono)?,
        })
    }

    fn get(&self, font: Font) -> &IndirectFontRef {
        match font {
            Font::Regular => &self.regular,
            Font::Bold => &self.bold,
            Font::Mono => &self.mono,
        }
    }
}
