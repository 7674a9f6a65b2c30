//! Flat XML documents.
//!
//! The provider exchanges a single root element wrapping scalar children:
//!
//! ```text
//! <xml><return_code>SUCCESS</return_code><result_code>SUCCESS</result_code></xml>
//! ```

use quick_xml::{Reader, escape::partial_escape, events::Event};

use crate::{
    error::{Result, WechatError},
    field::FieldSet,
};

/// Root element name used for outbound documents.
pub const XML_ROOT: &str = "xml";

/// Serializes the non-empty fields of `fields` as a flat XML document.
///
/// Values are written as-is unless they contain markup characters, which are
/// entity-escaped so the document stays well-formed.
///
/// # Examples
///
/// ```
/// use openwechat::{codec::to_xml, field::FieldSet};
///
/// let mut fields = FieldSet::new();
/// fields.insert("mch_id", "100");
/// fields.insert("total_fee", 1_i64);
/// fields.insert("device_info", "");
///
/// assert_eq!(to_xml(&fields), "<xml><mch_id>100</mch_id><total_fee>1</total_fee></xml>");
/// ```
#[must_use]
pub fn to_xml(fields: &FieldSet) -> String {
    let mut xml = format!("<{XML_ROOT}>");
    for (name, value) in fields.non_empty() {
        let text = value.as_wire_str();
        xml.push('<');
        xml.push_str(name);
        xml.push('>');
        xml.push_str(&partial_escape(&*text));
        xml.push_str("</");
        xml.push_str(name);
        xml.push('>');
    }
    xml.push_str(&format!("</{XML_ROOT}>"));
    xml
}

/// Parses a flat XML document into a field set.
///
/// Every element that directly encloses text (`<tag>text</tag>`) contributes
/// one entry. Text between sibling elements and text a parent holds before its
/// first child are discarded. The root element name is not checked.
///
/// # Errors
///
/// Returns [`WechatError::XmlParse`] if the document is malformed, ends with
/// unclosed elements, has no root element, or carries text outside the root.
pub fn from_xml(body: &[u8]) -> Result<FieldSet> {
    let text = std::str::from_utf8(body)
        .map_err(|e| WechatError::XmlParse(format!("body is not UTF-8: {e}")))?;
    let mut reader = Reader::from_str(text);

    let mut fields = FieldSet::new();
    let mut depth = 0_usize;
    let mut saw_root = false;
    // Innermost open element and the text collected since it opened.
    let mut leaf: Option<(String, Option<String>)> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            WechatError::XmlParse(format!("{e} at position {}", reader.buffer_position()))
        })?;

        match event {
            Event::Start(start) => {
                if depth == 0 {
                    if saw_root {
                        return Err(WechatError::XmlParse("multiple root elements".to_owned()));
                    }
                    saw_root = true;
                }
                depth += 1;
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                leaf = Some((name, None));
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if let Some((name, Some(value))) = leaf.take() {
                    fields.insert(name, value);
                }
            }
            Event::Empty(_) => {
                if depth == 0 {
                    if saw_root {
                        return Err(WechatError::XmlParse("multiple root elements".to_owned()));
                    }
                    saw_root = true;
                }
                leaf = None;
            }
            Event::Text(content) => {
                let value = content.unescape().map_err(|e| WechatError::XmlParse(e.to_string()))?;
                append_text(depth, &mut leaf, &value)?;
            }
            Event::CData(content) => {
                let value = std::str::from_utf8(&content)
                    .map_err(|e| WechatError::XmlParse(format!("CDATA is not UTF-8: {e}")))?;
                append_text(depth, &mut leaf, value)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(WechatError::XmlParse(format!(
            "unexpected end of document with {depth} unclosed element(s)"
        )));
    }
    if !saw_root {
        return Err(WechatError::XmlParse("document has no root element".to_owned()));
    }

    Ok(fields)
}

fn append_text(
    depth: usize,
    leaf: &mut Option<(String, Option<String>)>,
    value: &str,
) -> Result<()> {
    if depth == 0 {
        if !value.trim().is_empty() {
            return Err(WechatError::XmlParse("text outside the root element".to_owned()));
        }
        return Ok(());
    }
    if let Some((_, text)) = leaf.as_mut() {
        text.get_or_insert_with(String::new).push_str(value);
    }
    Ok(())
}
