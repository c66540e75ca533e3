//! Document model read from `word/document.xml`.
//!
//! The walker keeps only what the two transforms need: paragraph and run
//! styles, bold/italic/underline, text, tabs and breaks, tables, and image
//! references. Everything else in the WordprocessingML body is skipped.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use docsift_core::DocxMessage;

use crate::package::attr;

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub style_id: Option<String>,
    /// Carries list numbering (`w:numPr`).
    pub numbered: bool,
    pub children: Vec<Inline>,
}

impl Paragraph {
    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Inline::Run(run) => Some(run.text.as_str()),
                Inline::Image { .. } => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Run(Run),
    Image {
        rel_id: String,
        alt_text: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub style_id: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub text: String,
}

/// Rows of cells; each cell holds its own blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<Vec<Block>>>,
}

#[derive(Debug, Default)]
pub struct DocumentModel {
    pub body: Vec<Block>,
    pub messages: Vec<DocxMessage>,
}

impl DocumentModel {
    /// All paragraphs in reading order, table cells flattened.
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        let mut out = Vec::new();
        collect_paragraphs(&self.body, &mut out);
        out
    }
}

fn collect_paragraphs<'a>(blocks: &'a [Block], out: &mut Vec<&'a Paragraph>) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => out.push(p),
            Block::Table(t) => {
                for cell in t.rows.iter().flatten() {
                    collect_paragraphs(cell, out);
                }
            }
        }
    }
}

/// `w:val` toggles: absent means on; `0`, `false`, `none` mean off.
fn toggle(e: &BytesStart) -> bool {
    !matches!(
        attr(e, b"w:val").as_deref(),
        Some("0") | Some("false") | Some("none")
    )
}

#[derive(Default)]
struct Walker {
    body: Vec<Block>,
    tables: Vec<TableBuilder>,
    paragraph: Option<Paragraph>,
    run: Option<Run>,
    in_text: bool,
    alt_text: Option<String>,
    messages: Vec<DocxMessage>,
}

#[derive(Default)]
struct TableBuilder {
    table: Table,
    row: Vec<Vec<Block>>,
    cell: Vec<Block>,
}

impl Walker {
    fn push_block(&mut self, block: Block) {
        match self.tables.last_mut() {
            Some(t) => t.cell.push(block),
            None => self.body.push(block),
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(text);
        }
    }

    fn open(&mut self, e: &BytesStart) {
        match e.name().as_ref() {
            b"w:p" => self.paragraph = Some(Paragraph::default()),
            b"w:r" => self.run = Some(Run::default()),
            b"w:t" => self.in_text = true,
            b"w:tbl" => self.tables.push(TableBuilder::default()),
            b"w:tr" => {
                if let Some(t) = self.tables.last_mut() {
                    t.row.clear();
                }
            }
            b"w:tc" => {
                if let Some(t) = self.tables.last_mut() {
                    t.cell.clear();
                }
            }
            _ => self.leaf(e),
        }
    }

    /// Elements that carry all their information in attributes.
    fn leaf(&mut self, e: &BytesStart) {
        match e.name().as_ref() {
            b"w:pStyle" => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.style_id = attr(e, b"w:val");
                }
            }
            b"w:numPr" => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.numbered = true;
                }
            }
            b"w:rStyle" => {
                if let Some(r) = self.run.as_mut() {
                    r.style_id = attr(e, b"w:val");
                }
            }
            b"w:b" => {
                if let Some(r) = self.run.as_mut() {
                    r.bold = toggle(e);
                }
            }
            b"w:i" => {
                if let Some(r) = self.run.as_mut() {
                    r.italic = toggle(e);
                }
            }
            b"w:u" => {
                if let Some(r) = self.run.as_mut() {
                    r.underline = toggle(e);
                }
            }
            // w:tab also appears as a tab stop inside w:tabs; only runs count
            b"w:tab" => self.push_text("\t"),
            b"w:br" | b"w:cr" => self.push_text("\n"),
            b"wp:docPr" => self.alt_text = attr(e, b"descr").filter(|d| !d.is_empty()),
            b"a:blip" => {
                if let Some(rel_id) = attr(e, b"r:embed") {
                    self.messages.push(DocxMessage::info(format!(
                        "Found embedded image (relationship {})",
                        rel_id
                    )));
                    let image = Inline::Image {
                        rel_id,
                        alt_text: self.alt_text.take(),
                    };
                    if let Some(p) = self.paragraph.as_mut() {
                        p.children.push(image);
                    }
                }
            }
            b"w:object" | b"w:pict" => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                self.messages.push(DocxMessage::warning(format!(
                    "Unsupported embedded content <{}> was ignored",
                    tag
                )));
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"w:t" => self.in_text = false,
            b"w:r" => {
                if let (Some(run), Some(p)) = (self.run.take(), self.paragraph.as_mut()) {
                    p.children.push(Inline::Run(run));
                }
            }
            b"w:p" => {
                if let Some(p) = self.paragraph.take() {
                    self.push_block(Block::Paragraph(p));
                }
            }
            b"w:tc" => {
                if let Some(t) = self.tables.last_mut() {
                    let cell = std::mem::take(&mut t.cell);
                    t.row.push(cell);
                }
            }
            b"w:tr" => {
                if let Some(t) = self.tables.last_mut() {
                    let row = std::mem::take(&mut t.row);
                    t.table.rows.push(row);
                }
            }
            b"w:tbl" => {
                if let Some(t) = self.tables.pop() {
                    self.push_block(Block::Table(t.table));
                }
            }
            _ => {}
        }
    }
}

/// Walk `word/document.xml` into a [`DocumentModel`].
pub fn read_document(xml: &str) -> Result<DocumentModel, String> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();
    let mut walker = Walker::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                // w:object/w:pict open with children; report once on open
                walker.open(e);
            }
            Ok(Event::Empty(ref e)) => {
                walker.open(e);
                walker.close(e.name().as_ref());
            }
            Ok(Event::Text(ref e)) => {
                if walker.in_text {
                    let text = e
                        .unescape()
                        .map_err(|err| format!("Invalid text in document body: {}", err))?;
                    walker.push_text(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if walker.in_text {
                    walker.push_text(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::End(ref e)) => walker.close(e.name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "Failed to parse document body at position {}: {}",
                    reader.error_position(),
                    e
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(DocumentModel {
        body: walker.body,
        messages: walker.messages,
    })
}
