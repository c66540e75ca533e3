//! The OPC package around a Word document: the zip container, the main
//! document part, and the optional style and relationship parts.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";
const MEDIA_PREFIX: &str = "word/media/";

/// A declared paragraph or run style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDef {
    pub id: String,
    pub name: String,
}

/// Parts of a `.docx` package needed for conversion.
#[derive(Debug, Default)]
pub struct DocxPackage {
    pub document_xml: String,
    /// Paragraph styles by style id.
    pub paragraph_styles: HashMap<String, StyleDef>,
    /// Character styles by style id.
    pub run_styles: HashMap<String, StyleDef>,
    /// Relationship id to target part name (e.g. `word/media/image1.png`).
    pub relationships: HashMap<String, String>,
    /// Bytes of embedded media, keyed by part name.
    pub media: HashMap<String, Vec<u8>>,
}

impl DocxPackage {
    /// Open a package from raw bytes.
    ///
    /// Fails if the bytes are not a zip archive, if `word/document.xml` is
    /// missing, or if a present part cannot be read.
    pub fn open(data: &[u8]) -> Result<Self, String> {
        let cursor = Cursor::new(data);
        let mut archive =
            ZipArchive::new(cursor).map_err(|e| format!("Failed to open DOCX archive: {}", e))?;

        let mut package = DocxPackage::default();
        let mut found_document = false;
        let mut styles_xml = None;
        let mut rels_xml = None;

        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| format!("Failed to read DOCX entry: {}", e))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();

            match name.as_str() {
                DOCUMENT_PART => {
                    package.document_xml = read_string(&mut file, &name)?;
                    found_document = true;
                }
                STYLES_PART => styles_xml = Some(read_string(&mut file, &name)?),
                RELS_PART => rels_xml = Some(read_string(&mut file, &name)?),
                _ if name.starts_with(MEDIA_PREFIX) => {
                    let mut bytes = Vec::with_capacity(file.size() as usize);
                    file.read_to_end(&mut bytes)
                        .map_err(|e| format!("Failed to read {}: {}", name, e))?;
                    package.media.insert(name, bytes);
                }
                _ => {}
            }
        }

        if !found_document {
            return Err(
                "Could not find main document part. Are you sure this is a valid .docx file?"
                    .to_string(),
            );
        }

        if let Some(xml) = styles_xml {
            let (paragraph, run) = parse_styles(&xml)?;
            package.paragraph_styles = paragraph;
            package.run_styles = run;
        }
        if let Some(xml) = rels_xml {
            package.relationships = parse_relationships(&xml)?;
        }

        tracing::debug!(
            paragraph_styles = package.paragraph_styles.len(),
            relationships = package.relationships.len(),
            media = package.media.len(),
            "opened DOCX package"
        );
        Ok(package)
    }

    /// Media bytes and MIME type for an image relationship.
    pub fn image(&self, rel_id: &str) -> Option<(&'static str, &[u8])> {
        let target = self.relationships.get(rel_id)?;
        let bytes = self.media.get(target)?;
        Some((image_mime(target), bytes.as_slice()))
    }
}

fn read_string(file: &mut impl Read, name: &str) -> Result<String, String> {
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| format!("Failed to read {}: {}", name, e))?;
    Ok(content)
}

/// Unescaped value of an attribute. Parts are read into `String`s before
/// parsing, so attribute bytes are always UTF-8.
pub(crate) fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    let a = e.attributes().flatten().find(|a| a.key.as_ref() == key)?;
    let raw = std::str::from_utf8(&a.value).ok()?;
    unescape(raw).ok().map(|v| v.into_owned())
}

type StyleTable = HashMap<String, StyleDef>;

fn parse_styles(xml: &str) -> Result<(StyleTable, StyleTable), String> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();
    let mut paragraph = HashMap::new();
    let mut run = HashMap::new();

    // (type, id, name) of the w:style being read
    let mut current: Option<(String, String, Option<String>)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:style" => {
                let kind = attr(e, b"w:type").unwrap_or_default();
                let id = attr(e, b"w:styleId").unwrap_or_default();
                current = Some((kind, id, None));
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"w:name" => {
                if let Some((_, _, name)) = current.as_mut() {
                    *name = attr(e, b"w:val");
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"w:style" => {
                if let Some((kind, id, name)) = current.take() {
                    let def = StyleDef {
                        name: name.unwrap_or_else(|| id.clone()),
                        id: id.clone(),
                    };
                    match kind.as_str() {
                        "paragraph" => {
                            paragraph.insert(id, def);
                        }
                        "character" => {
                            run.insert(id, def);
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("Failed to parse {}: {}", STYLES_PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok((paragraph, run))
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, String>, String> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let external = attr(e, b"TargetMode").as_deref() == Some("External");
                if let (false, Some(id), Some(target)) =
                    (external, attr(e, b"Id"), attr(e, b"Target"))
                {
                    rels.insert(id, resolve_target(&target));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("Failed to parse {}: {}", RELS_PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Relationship targets are relative to `word/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("word/{}", target.trim_start_matches("./")),
    }
}

fn image_mime(part: &str) -> &'static str {
    let lower = part.to_lowercase();
    match lower.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("webp") => "image/webp",
        Some("emf") => "image/x-emf",
        Some("wmf") => "image/x-wmf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_are_split_by_type() {
        let xml = r#"<w:styles xmlns:w="w">
            <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
            <w:style w:type="character" w:styleId="Emph"><w:name w:val="Emphasis"/></w:style>
            <w:style w:type="table" w:styleId="Grid"><w:name w:val="Table Grid"/></w:style>
        </w:styles>"#;
        let (paragraph, run) = parse_styles(xml).unwrap();
        assert_eq!(paragraph["Heading1"].name, "heading 1");
        assert_eq!(run["Emph"].name, "Emphasis");
        assert!(!paragraph.contains_key("Grid"));
    }

    #[test]
    fn relationship_targets_resolve_under_word() {
        let xml = r#"<Relationships>
            <Relationship Id="rId4" Type="image" Target="media/image1.png"/>
            <Relationship Id="rId5" Type="hyperlink" Target="https://example.com" TargetMode="External"/>
            <Relationship Id="rId6" Type="image" Target="/word/media/image2.jpeg"/>
        </Relationships>"#;
        let rels = parse_relationships(xml).unwrap();
        assert_eq!(rels["rId4"], "word/media/image1.png");
        assert_eq!(rels["rId6"], "word/media/image2.jpeg");
        assert!(!rels.contains_key("rId5"));
    }

    #[test]
    fn attribute_values_are_unescaped() {
        let xml = r#"<w:styles xmlns:w="w">
            <w:style w:type="paragraph" w:styleId="Terms"><w:name w:val="Terms &amp; Conditions"/></w:style>
        </w:styles>"#;
        let (paragraph, _) = parse_styles(xml).unwrap();
        assert_eq!(paragraph["Terms"].name, "Terms & Conditions");
    }

    #[test]
    fn non_zip_bytes_fail() {
        assert!(DocxPackage::open(b"PK but not really").is_err());
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(image_mime("word/media/a.PNG"), "image/png");
        assert_eq!(image_mime("word/media/a.jpeg"), "image/jpeg");
        assert_eq!(image_mime("word/media/a"), "application/octet-stream");
    }
}
