//! Layout analysis for PDF pages.
//!
//! Extracts positioned text spans from page content streams, groups them into
//! lines, and renders lines as text with horizontal gaps preserved as runs of
//! spaces.

use std::collections::BTreeMap;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::encoding::{clean_bytes, InvalidBytes};
use crate::error::{Error, Result};

/// Estimated glyph advance as a fraction of the font size.
const CHAR_WIDTH_FACTOR: f32 = 0.5;

/// Most spaces rendered for one horizontal gap.
const MAX_GAP_SPACES: usize = 8;

/// A text span with position information.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated width of the text
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
}

impl TextSpan {
    /// Create a new text span, estimating its width from the font size.
    pub fn new(text: String, x: f32, y: f32, font_size: f32) -> Self {
        let width = text.chars().count() as f32 * font_size * CHAR_WIDTH_FACTOR;
        Self {
            text,
            x,
            y,
            width,
            font_size,
        }
    }

    /// Right edge of the span.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    fn char_width(&self) -> f32 {
        (self.font_size * CHAR_WIDTH_FACTOR).max(0.1)
    }
}

/// Spans sharing a baseline, sorted left to right.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// Average baseline of the spans
    pub y: f32,
    /// Spans in this line, sorted by X
    pub spans: Vec<TextSpan>,
}

impl TextLine {
    fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.x.total_cmp(&b.x));
        let y = if spans.is_empty() {
            0.0
        } else {
            spans.iter().map(|s| s.y).sum::<f32>() / spans.len() as f32
        };
        Self { y, spans }
    }

    /// Render the line, turning horizontal gaps into spaces.
    ///
    /// A gap of roughly one character becomes one space; wider gaps become
    /// proportionally more up to `MAX_GAP_SPACES`, and never fewer than two
    /// once the gap exceeds two character widths. Adjacent ideographs are
    /// joined without a space.
    pub fn render(&self) -> String {
        let mut result = String::new();

        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                let prev = &self.spans[i - 1];
                let spaces = gap_spaces(prev, span);
                if spaces > 0 && !result.ends_with(' ') && !span.text.starts_with(' ') {
                    result.extend(std::iter::repeat(' ').take(spaces));
                }
            }
            result.push_str(&span.text);
        }

        result
    }
}

/// Number of spaces to render between two neighbouring spans.
fn gap_spaces(prev: &TextSpan, span: &TextSpan) -> usize {
    let gap = span.x - prev.right();
    let char_width = prev.char_width().max(span.char_width());

    if gap <= char_width * 0.2 {
        return 0;
    }

    let joins_ideographs = matches!(
        (prev.text.chars().last(), span.text.chars().next()),
        (Some(a), Some(b)) if is_spaceless_script_char(a) && is_spaceless_script_char(b)
    );
    if joins_ideographs && gap < char_width {
        return 0;
    }

    let proportional = (gap / char_width).round().min(MAX_GAP_SPACES as f32) as usize;
    let min = if gap > char_width * 2.0 { 2 } else { 1 };
    proportional.clamp(min, MAX_GAP_SPACES)
}

/// Group spans into lines by baseline, top of the page first.
///
/// Spans whose baseline is within `y_tolerance_factor` times their font size
/// of the line's first span join that line.
pub fn group_into_lines(spans: &[TextSpan], y_tolerance_factor: f32) -> Vec<TextLine> {
    let mut sorted = spans.to_vec();
    // PDF coordinates grow upwards
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in sorted {
        let tolerance = span.font_size * y_tolerance_factor;
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }

    if !current.is_empty() {
        lines.push(TextLine::from_spans(current));
    }

    lines
}

/// Render a page's spans as text, one output line per text line.
pub fn render_page_text(spans: &[TextSpan], y_tolerance_factor: f32) -> String {
    group_into_lines(spans, y_tolerance_factor)
        .iter()
        .map(TextLine::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads positioned text from the pages of a loaded document.
pub struct SpanExtractor<'a> {
    doc: &'a LopdfDocument,
    invalid_bytes: InvalidBytes,
}

impl<'a> SpanExtractor<'a> {
    /// Create an extractor for a document.
    pub fn new(doc: &'a LopdfDocument, invalid_bytes: InvalidBytes) -> Self {
        Self { doc, invalid_bytes }
    }

    /// Extract text spans from a page.
    ///
    /// A page whose content stream is missing or unreadable yields no spans.
    pub fn page_spans(&self, page_id: ObjectId) -> Result<Vec<TextSpan>> {
        let fonts = match self.doc.get_page_fonts(page_id) {
            Ok(fonts) => fonts,
            Err(e) => {
                log::warn!("Page {:?}: cannot read fonts: {}", page_id, e);
                BTreeMap::new()
            }
        };

        let Some(content) = self.page_content(page_id) else {
            return Ok(Vec::new());
        };

        match lopdf::content::Content::decode(&content) {
            Ok(content) => self.spans_from_operations(&content.operations, &fonts),
            Err(e) => {
                log::warn!("Page {:?}: cannot decode content stream: {}", page_id, e);
                Ok(Vec::new())
            }
        }
    }

    /// Concatenated, decompressed content streams of a page.
    fn page_content(&self, page_id: ObjectId) -> Option<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id).ok()?;
        let contents = page_dict.get(b"Contents").ok()?;

        let stream_data = |id: ObjectId| -> Option<Vec<u8>> {
            match self.doc.get_object(id) {
                // Unfiltered streams have nothing to decompress
                Ok(Object::Stream(s)) => {
                    Some(s.decompressed_content().unwrap_or_else(|_| s.content.clone()))
                }
                _ => None,
            }
        };

        match contents {
            Object::Reference(r) => stream_data(*r),
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Reference(r) = obj {
                        if let Some(data) = stream_data(*r) {
                            content.extend_from_slice(&data);
                            content.push(b' ');
                        }
                    }
                }
                Some(content)
            }
            _ => None,
        }
    }

    fn spans_from_operations(
        &self,
        operations: &[lopdf::content::Operation],
        fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    ) -> Result<Vec<TextSpan>> {
        let mut spans = Vec::new();
        let mut font_name: Vec<u8> = Vec::new();
        let mut font_size: f32 = 12.0;
        let mut matrix = TextMatrix::default();
        let mut in_text_block = false;

        for op in operations {
            let operator = op.operator.as_str();
            match operator {
                "BT" => {
                    in_text_block = true;
                    matrix.reset();
                }
                "ET" => in_text_block = false,
                "Tf" => {
                    if op.operands.len() >= 2 {
                        if let Object::Name(name) = &op.operands[0] {
                            font_name = name.clone();
                        }
                        font_size = get_number(&op.operands[1]).unwrap_or(12.0);
                    }
                }
                "TL" => {
                    if let Some(leading) = op.operands.first().and_then(get_number) {
                        matrix.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    if op.operands.len() >= 2 {
                        let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                        let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                        if operator == "TD" {
                            matrix.leading = -ty;
                        }
                        matrix.translate_line(tx, ty);
                    }
                }
                "Tm" => {
                    if op.operands.len() >= 6 {
                        let n = |i: usize, default: f32| get_number(&op.operands[i]).unwrap_or(default);
                        matrix.set(n(0, 1.0), n(1, 0.0), n(2, 0.0), n(3, 1.0), n(4, 0.0), n(5, 0.0));
                    }
                }
                "T*" => matrix.next_line(),
                "Tj" | "TJ" | "'" | "\"" => {
                    if !in_text_block {
                        continue;
                    }
                    if operator == "'" || operator == "\"" {
                        matrix.next_line();
                    }

                    let encoding = fonts
                        .get(&font_name)
                        .and_then(|f| f.get_font_encoding(self.doc).ok());
                    let decode = |bytes: &[u8]| -> Result<String> {
                        match encoding
                            .as_ref()
                            .and_then(|enc| LopdfDocument::decode_text(enc, bytes).ok())
                        {
                            Some(text) => Ok(text),
                            None => decode_text_simple(bytes, self.invalid_bytes),
                        }
                    };

                    let text = match operator {
                        "TJ" => match op.operands.first() {
                            Some(Object::Array(items)) => decode_tj_array(items, decode)?,
                            _ => String::new(),
                        },
                        _ => {
                            let index = if operator == "\"" { 2 } else { 0 };
                            match op.operands.get(index) {
                                Some(Object::String(bytes, _)) => decode(bytes.as_slice())?,
                                _ => String::new(),
                            }
                        }
                    };

                    let (x, y) = matrix.position();
                    let effective_size = font_size * matrix.scale();
                    let advance = text.chars().count() as f32 * font_size * CHAR_WIDTH_FACTOR;
                    if !text.trim().is_empty() {
                        spans.push(TextSpan::new(text, x, y, effective_size));
                    }
                    matrix.advance(advance);
                }
                _ => {}
            }
        }

        Ok(spans)
    }
}

/// Decode a TJ array; large negative adjustments become word spaces.
fn decode_tj_array<F>(items: &[Object], decode: F) -> Result<String>
where
    F: Fn(&[u8]) -> Result<String>,
{
    // In thousandths of text space; about a fifth of an em.
    let space_threshold = 200.0;
    let mut combined = String::new();

    for item in items {
        match item {
            Object::String(bytes, _) => combined.push_str(&decode(bytes.as_slice())?),
            Object::Integer(_) | Object::Real(_) => {
                let adjustment = -get_number(item).unwrap_or(0.0);
                let needs_space = adjustment > space_threshold
                    && !combined.ends_with(' ')
                    && !combined.ends_with('\u{00A0}')
                    && combined
                        .chars()
                        .last()
                        .is_some_and(|c| !is_spaceless_script_char(c));
                if needs_space {
                    combined.push(' ');
                }
            }
            _ => {}
        }
    }

    Ok(combined)
}

#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32, // X translation
    f: f32, // Y translation
    line_x: f32,
    line_y: f32,
    leading: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            line_x: 0.0,
            line_y: 0.0,
            leading: 12.0,
        }
    }
}

impl TextMatrix {
    fn reset(&mut self) {
        let leading = self.leading;
        *self = Self {
            leading,
            ..Self::default()
        };
    }

    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
        self.line_x = e;
        self.line_y = f;
    }

    /// Move to the start of the next line, offset from the current line start.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        self.line_x += tx * self.a + ty * self.c;
        self.line_y += tx * self.b + ty * self.d;
        self.e = self.line_x;
        self.f = self.line_y;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    /// Advance along the baseline after showing text.
    fn advance(&mut self, tx: f32) {
        self.e += tx * self.a;
        self.f += tx * self.b;
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        // Hiragana, Katakana
        || (0x3040..=0x30FF).contains(&code)
        // CJK Symbols and Punctuation
        || (0x3000..=0x303F).contains(&code)
}

/// Decode string bytes when the font gives no usable encoding.
///
/// UTF-16BE with a byte order mark is honoured; anything else is treated as
/// UTF-8 and cleaned according to `policy`.
pub(crate) fn decode_text_simple(bytes: &[u8], policy: InvalidBytes) -> Result<String> {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]));

        let mut text = String::new();
        for decoded in char::decode_utf16(units) {
            match (decoded, policy) {
                (Ok(c), _) => text.push(c),
                (Err(_), InvalidBytes::Drop) => {}
                (Err(_), InvalidBytes::Replace) => text.push(char::REPLACEMENT_CHARACTER),
                (Err(e), InvalidBytes::Error) => {
                    return Err(Error::Encoding(format!(
                        "unpaired UTF-16 surrogate 0x{:04X}",
                        e.unpaired_surrogate()
                    )));
                }
            }
        }
        return Ok(text);
    }

    clean_bytes(bytes, policy)
}
