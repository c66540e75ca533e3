//! HTML transform of the document model.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use docsift_core::DocxMessage;

use crate::document::{Block, DocumentModel, Inline, Paragraph, Run, Table};
use crate::package::DocxPackage;
use crate::style_map::{HtmlElement, HtmlPath, Matcher, StyleMap};

/// Paragraph style names that render as a plain paragraph without comment.
const PLAIN_PARAGRAPH_STYLES: &[&str] = &["normal", "list paragraph", "body text", "default"];

/// Render the body to HTML. Empty paragraphs are skipped.
pub fn render_html(
    model: &DocumentModel,
    package: &DocxPackage,
    style_map: &StyleMap,
) -> (String, Vec<DocxMessage>) {
    let mut renderer = Renderer {
        package,
        style_map,
        messages: Vec::new(),
    };
    let mut out = String::new();
    renderer.blocks(&model.body, &mut out);
    (out, renderer.messages)
}

struct Renderer<'a> {
    package: &'a DocxPackage,
    style_map: &'a StyleMap,
    messages: Vec<DocxMessage>,
}

impl Renderer<'_> {
    fn warn_once(&mut self, message: String) {
        if !self.messages.iter().any(|m| m.message == message) {
            self.messages.push(DocxMessage::warning(message));
        }
    }

    fn blocks(&mut self, blocks: &[Block], out: &mut String) {
        let mut open: Vec<HtmlElement> = Vec::new();
        for block in blocks {
            match block {
                Block::Paragraph(p) => {
                    let HtmlPath::Elements(path) = self.paragraph_path(p) else {
                        continue;
                    };
                    let content = self.inlines(&p.children);
                    if content.is_empty() {
                        continue;
                    }
                    // Reuse open non-fresh ancestors with the same shape
                    let shared = open
                        .iter()
                        .zip(path.iter())
                        .take_while(|(o, e)| !e.fresh && o.same_shape(e))
                        .count();
                    close_to(&mut open, shared, out);
                    for element in &path[shared..] {
                        open_tag(element, out);
                        open.push(element.clone());
                    }
                    out.push_str(&content);
                }
                Block::Table(t) => {
                    close_to(&mut open, 0, out);
                    self.table(t, out);
                }
            }
        }
        close_to(&mut open, 0, out);
    }

    fn table(&mut self, table: &Table, out: &mut String) {
        out.push_str("<table>");
        for row in &table.rows {
            out.push_str("<tr>");
            for cell in row {
                out.push_str("<td>");
                self.blocks(cell, out);
                out.push_str("</td>");
            }
            out.push_str("</tr>");
        }
        out.push_str("</table>");
    }

    fn paragraph_path(&mut self, p: &Paragraph) -> HtmlPath {
        let (id, name) = match p.style_id.as_deref() {
            Some(id) => {
                let name = self
                    .package
                    .paragraph_styles
                    .get(id)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| id.to_string());
                (Some(id), name)
            }
            None => (None, String::new()),
        };

        if let Some(id) = id {
            if let Some(path) = self.style_map.paragraph(id, &name) {
                return path.clone();
            }
        }

        let lower = name.to_lowercase();
        if let Some(level) = lower
            .strip_prefix("heading ")
            .and_then(|n| n.trim().parse::<u8>().ok())
            .filter(|n| (1..=6).contains(n))
        {
            return HtmlPath::single(&format!("h{}", level), true);
        }
        if lower == "title" {
            return HtmlPath::single("h1", true);
        }
        if p.numbered {
            return HtmlPath::Elements(vec![
                HtmlElement::new("ul", false),
                HtmlElement::new("li", true),
            ]);
        }
        if let Some(id) = id {
            if !PLAIN_PARAGRAPH_STYLES.contains(&lower.as_str()) {
                self.warn_once(format!(
                    "Unrecognised paragraph style: '{}' (Style ID: {})",
                    name, id
                ));
            }
        }
        HtmlPath::single("p", true)
    }

    fn inlines(&mut self, children: &[Inline]) -> String {
        let package = self.package;
        let mut out = String::new();
        for child in children {
            match child {
                Inline::Run(run) => out.push_str(&self.run(run)),
                Inline::Image { rel_id, alt_text } => match package.image(rel_id) {
                    Some((mime, bytes)) => {
                        out.push_str("<img src=\"data:");
                        out.push_str(mime);
                        out.push_str(";base64,");
                        out.push_str(&BASE64.encode(bytes));
                        out.push('"');
                        if let Some(alt) = alt_text {
                            out.push_str(" alt=\"");
                            out.push_str(&escape(alt));
                            out.push('"');
                        }
                        out.push_str(" />");
                    }
                    None => self.warn_once(format!(
                        "Could not find image file for relationship {}",
                        rel_id
                    )),
                },
            }
        }
        out
    }

    fn run(&mut self, run: &Run) -> String {
        if run.text.is_empty() {
            return String::new();
        }
        let style_map = self.style_map;
        let mut html = escape(&run.text).replace('\n', "<br />");

        if run.underline {
            if let Some(path) = self.style_map.formatting(&Matcher::Underline) {
                html = wrap(html, path);
            }
        }
        if run.italic {
            let path = self
                .style_map
                .formatting(&Matcher::Italic)
                .cloned()
                .unwrap_or_else(|| HtmlPath::single("em", false));
            html = wrap(html, &path);
        }
        if run.bold {
            let path = self
                .style_map
                .formatting(&Matcher::Bold)
                .cloned()
                .unwrap_or_else(|| HtmlPath::single("strong", false));
            html = wrap(html, &path);
        }

        if let Some(id) = run.style_id.as_deref() {
            let name = self
                .package
                .run_styles
                .get(id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| id.to_string());
            match style_map.run(id, &name) {
                Some(HtmlPath::Ignore) => return String::new(),
                Some(path) => html = wrap(html, path),
                None => self.warn_once(format!(
                    "Unrecognised run style: '{}' (Style ID: {})",
                    name, id
                )),
            }
        }
        html
    }
}

/// Wrap content in a path's elements. `Ignore` leaves the content bare.
fn wrap(content: String, path: &HtmlPath) -> String {
    let HtmlPath::Elements(elements) = path else {
        return content;
    };
    let mut out = String::new();
    for element in elements {
        open_tag(element, &mut out);
    }
    out.push_str(&content);
    for element in elements.iter().rev() {
        close_tag(element, &mut out);
    }
    out
}

fn close_to(open: &mut Vec<HtmlElement>, depth: usize, out: &mut String) {
    while open.len() > depth {
        if let Some(element) = open.pop() {
            close_tag(&element, out);
        }
    }
}

fn open_tag(element: &HtmlElement, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    if !element.classes.is_empty() {
        out.push_str(" class=\"");
        out.push_str(&element.classes.join(" "));
        out.push('"');
    }
    out.push('>');
}

fn close_tag(element: &HtmlElement, out: &mut String) {
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::read_document;
    use crate::package::StyleDef;

    fn model(inner: &str) -> DocumentModel {
        let xml = format!(
            r#"<w:document xmlns:w="w"><w:body>{}</w:body></w:document>"#,
            inner
        );
        read_document(&xml).unwrap()
    }

    fn package_with_styles(styles: &[(&str, &str)]) -> DocxPackage {
        let mut package = DocxPackage::default();
        for (id, name) in styles {
            package.paragraph_styles.insert(
                id.to_string(),
                StyleDef {
                    id: id.to_string(),
                    name: name.to_string(),
                },
            );
        }
        package
    }

    fn para(style: Option<&str>, text: &str) -> String {
        let ppr = style
            .map(|s| format!(r#"<w:pPr><w:pStyle w:val="{}"/></w:pPr>"#, s))
            .unwrap_or_default();
        format!("<w:p>{}<w:r><w:t>{}</w:t></w:r></w:p>", ppr, text)
    }

    #[test]
    fn headings_title_and_paragraphs() {
        let doc = model(
            &[
                para(Some("Title"), "Lease"),
                para(Some("Heading2"), "Rent"),
                para(None, "Tenant pays &amp; landlord &lt;receives&gt;"),
            ]
            .concat(),
        );
        let package = package_with_styles(&[("Title", "Title"), ("Heading2", "heading 2")]);
        let (html, messages) = render_html(&doc, &package, &StyleMap::default());
        assert_eq!(
            html,
            "<h1>Lease</h1><h2>Rent</h2><p>Tenant pays &amp; landlord &lt;receives&gt;</p>"
        );
        assert!(messages.is_empty());
    }

    #[test]
    fn bold_italic_nesting_and_underline_ignored() {
        let doc = model(
            r#"<w:p><w:r><w:rPr><w:b/><w:i/><w:u w:val="single"/></w:rPr><w:t>Notice</w:t></w:r></w:p>"#,
        );
        let (html, _) = render_html(&doc, &DocxPackage::default(), &StyleMap::default());
        assert_eq!(html, "<p><strong><em>Notice</em></strong></p>");
    }

    #[test]
    fn numbered_paragraphs_share_one_list() {
        let item = |t: &str| {
            format!(
                r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/></w:numPr></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>"#,
                t
            )
        };
        let doc = model(&[item("one"), item("two"), para(None, "after")].concat());
        let (html, _) = render_html(&doc, &DocxPackage::default(), &StyleMap::default());
        assert_eq!(html, "<ul><li>one</li><li>two</li></ul><p>after</p>");
    }

    #[test]
    fn unknown_styles_warn_once_and_custom_map_applies() {
        let doc = model(
            &[
                para(Some("Clause"), "First"),
                para(Some("Clause"), "Second"),
                para(Some("Recital"), "Whereas"),
            ]
            .concat(),
        );
        let package = package_with_styles(&[("Clause", "Clause"), ("Recital", "Recital")]);
        let (map, _) = StyleMap::parse(&["p[style-name='Recital'] => p.recital:fresh".to_string()]);
        let (html, messages) = render_html(&doc, &package, &map);
        assert_eq!(
            html,
            "<p>First</p><p>Second</p><p class=\"recital\">Whereas</p>"
        );
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].message,
            "Unrecognised paragraph style: 'Clause' (Style ID: Clause)"
        );
    }

    #[test]
    fn ignored_paragraphs_and_empty_paragraphs_are_dropped() {
        let doc = model(&[para(Some("Draft"), "secret"), "<w:p/>".to_string(), para(None, "kept")].concat());
        let package = package_with_styles(&[("Draft", "Draft Note")]);
        let (map, _) = StyleMap::parse(&["p[style-name='Draft Note'] => !".to_string()]);
        let (html, _) = render_html(&doc, &package, &map);
        assert_eq!(html, "<p>kept</p>");
    }

    #[test]
    fn ignored_run_style_drops_text_but_ignored_formatting_keeps_it() {
        let doc = model(
            r#"<w:p><w:r><w:rPr><w:rStyle w:val="Hidden"/></w:rPr><w:t>internal</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>Public</w:t></w:r></w:p>"#,
        );
        let mut package = DocxPackage::default();
        package.run_styles.insert(
            "Hidden".into(),
            StyleDef {
                id: "Hidden".into(),
                name: "Hidden Text".into(),
            },
        );
        let (map, _) = StyleMap::parse(&[
            "r[style-name='Hidden Text'] => !".to_string(),
            "b => !".to_string(),
        ]);
        let (html, messages) = render_html(&doc, &package, &map);
        assert_eq!(html, "<p>Public</p>");
        assert!(messages.is_empty());
    }

    #[test]
    fn tables_render_cells() {
        let doc = model(
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>A</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>B</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        );
        let (html, _) = render_html(&doc, &DocxPackage::default(), &StyleMap::default());
        assert_eq!(html, "<table><tr><td><p>A</p></td><td><p>B</p></td></tr></table>");
    }

    #[test]
    fn images_become_data_uris() {
        let mut package = DocxPackage::default();
        package
            .relationships
            .insert("rId1".into(), "word/media/seal.png".into());
        package
            .media
            .insert("word/media/seal.png".into(), vec![1, 2, 3]);
        let doc = model(
            r#"<w:p><w:r><w:drawing><a:blip xmlns:a="a" xmlns:r="r" r:embed="rId1"/></w:drawing></w:r></w:p>"#,
        );
        let (html, _) = render_html(&doc, &package, &StyleMap::default());
        assert_eq!(html, "<p><img src=\"data:image/png;base64,AQID\" /></p>");
    }
}
