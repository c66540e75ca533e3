//! Reading the document information dictionary.
//!
//! PDF text strings are either UTF-16BE with a byte-order mark or
//! PDFDocEncoding; dates use the `D:YYYYMMDDHHmmSSOHH'mm'` form where every
//! field after the year is optional.

use chrono::{DateTime, FixedOffset, TimeZone};
use lopdf::{Dictionary, Document, Object};

use docsift_core::PdfMetadata;

/// Read title/author/dates from the trailer `Info` dictionary.
///
/// A document without an `Info` entry has empty metadata; an `Info` entry
/// that cannot be resolved to a dictionary is an error.
pub fn read_metadata(doc: &Document) -> Result<PdfMetadata, String> {
    let info = match doc.trailer.get(b"Info") {
        Ok(obj) => obj,
        Err(_) => return Ok(PdfMetadata::default()),
    };
    let info = match info {
        Object::Reference(id) => doc
            .get_object(*id)
            .map_err(|e| format!("unresolvable Info reference: {}", e))?,
        other => other,
    };
    let dict = info
        .as_dict()
        .map_err(|_| "Info entry is not a dictionary".to_string())?;

    Ok(PdfMetadata {
        title: text_field(dict, b"Title"),
        author: text_field(dict, b"Author"),
        subject: text_field(dict, b"Subject"),
        creator: text_field(dict, b"Creator"),
        producer: text_field(dict, b"Producer"),
        creation_date: text_field(dict, b"CreationDate").and_then(|d| parse_pdf_date(&d)),
        modification_date: text_field(dict, b"ModDate").and_then(|d| parse_pdf_date(&d)),
    })
}

fn text_field(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => {
            let s = decode_text_string(bytes);
            let s = s.trim_matches('\0').trim();
            if s.is_empty() { None } else { Some(s.to_string()) }
        }
        _ => None,
    }
}

/// Decode a PDF text string.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| pdf_doc_char(b)).collect()
}

/// PDFDocEncoding matches Latin-1 except in the 0x18-0x1F and 0x80-0x9F
/// ranges.
fn pdf_doc_char(b: u8) -> char {
    match b {
        0x18 => '\u{02D8}',
        0x19 => '\u{02C7}',
        0x1A => '\u{02C6}',
        0x1B => '\u{02D9}',
        0x1C => '\u{02DD}',
        0x1D => '\u{02DB}',
        0x1E => '\u{02DA}',
        0x1F => '\u{02DC}',
        0x80 => '\u{2022}',
        0x81 => '\u{2020}',
        0x82 => '\u{2021}',
        0x83 => '\u{2026}',
        0x84 => '\u{2014}',
        0x85 => '\u{2013}',
        0x86 => '\u{0192}',
        0x87 => '\u{2044}',
        0x88 => '\u{2039}',
        0x89 => '\u{203A}',
        0x8A => '\u{2212}',
        0x8B => '\u{2030}',
        0x8C => '\u{201E}',
        0x8D => '\u{201C}',
        0x8E => '\u{201D}',
        0x8F => '\u{2018}',
        0x90 => '\u{2019}',
        0x91 => '\u{201A}',
        0x92 => '\u{2122}',
        0x93 => '\u{FB01}',
        0x94 => '\u{FB02}',
        0x95 => '\u{0141}',
        0x96 => '\u{0152}',
        0x97 => '\u{0160}',
        0x98 => '\u{0178}',
        0x99 => '\u{017D}',
        0x9A => '\u{0131}',
        0x9B => '\u{0142}',
        0x9C => '\u{0153}',
        0x9D => '\u{0161}',
        0x9E => '\u{017E}',
        0xA0 => '\u{20AC}',
        other => char::from(other),
    }
}

/// Parse a PDF date string such as `D:20240115103000+05'30'`.
///
/// Returns `None` for anything without at least a four-digit year.
pub fn parse_pdf_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);

    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }
    let field = |start: usize, len: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + len) {
            Some(part) => part.parse().ok(),
            None => Some(default),
        }
    };
    let year: i32 = digits[..4].parse().ok()?;
    let month = field(4, 2, 1)?;
    let day = field(6, 2, 1)?;
    let hour = field(8, 2, 0)?;
    let minute = field(10, 2, 0)?;
    let second = field(12, 2, 0)?;

    let offset = parse_offset(&s[digits.len()..])?;
    offset
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
}

/// `Z`, `+HH'mm'`, `-HH'mm`, `+HH` or nothing (UTC).
fn parse_offset(tz: &str) -> Option<FixedOffset> {
    let mut chars = tz.chars();
    let sign = match chars.next() {
        None | Some('Z') => return FixedOffset::east_opt(0),
        Some('+') => 1,
        Some('-') => -1,
        Some(_) => return FixedOffset::east_opt(0),
    };
    let nums: Vec<i32> = chars
        .as_str()
        .split('\'')
        .filter(|p| !p.is_empty())
        .filter_map(|p| p.parse().ok())
        .collect();
    let hours = nums.first().copied().unwrap_or(0);
    let minutes = nums.get(1).copied().unwrap_or(0);
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
