//! Small XML helpers shared by the package readers and writers.
//!
//! Parts are edited as text: we locate element boundaries with quick-xml
//! and splice generated markup in, leaving everything else byte-identical.

use crate::error::Result;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;
use std::ops::Range;

/// Escape text for use in element content or attribute values.
pub(crate) fn escape(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Read an attribute by local name (ignoring the namespace prefix).
pub(crate) fn attr(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.local_name().as_ref() == local {
            Some(
                a.unescape_value()
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned()),
            )
        } else {
            None
        }
    })
}

/// Read a namespaced attribute such as `r:id`, skipping an unprefixed
/// attribute with the same local name.
pub(crate) fn prefixed_attr(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.prefix().is_some() && a.key.local_name().as_ref() == local {
            Some(String::from_utf8_lossy(&a.value).into_owned())
        } else {
            None
        }
    })
}

/// Read an attribute by its exact qualified name.
pub(crate) fn exact_attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Byte range covering the first element with the given local name,
/// including its start and end tags.
pub(crate) fn element_span(xml: &str, local: &[u8]) -> Result<Option<Range<usize>>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut start: Option<usize> = None;
    let mut depth = 0usize;

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) => {
                if start.is_some() {
                    depth += 1;
                } else if e.name().local_name().as_ref() == local {
                    start = Some(before);
                    depth = 0;
                }
            }
            Event::Empty(e) => {
                if start.is_none() && e.name().local_name().as_ref() == local {
                    return Ok(Some(before..reader.buffer_position() as usize));
                }
            }
            Event::End(_) => {
                if let Some(s) = start {
                    if depth == 0 {
                        return Ok(Some(s..reader.buffer_position() as usize));
                    }
                    depth -= 1;
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Byte offset of the last closing tag with the given local name.
pub(crate) fn closing_tag_offset(xml: &str, local: &[u8]) -> Result<Option<usize>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut found = None;

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::End(e) if e.name().local_name().as_ref() == local => found = Some(before),
            Event::Eof => return Ok(found),
            _ => {}
        }
    }
}

/// Insert `fragment` right before the last closing tag of `local`.
pub(crate) fn insert_before_close(xml: &str, local: &[u8], fragment: &str) -> Result<Option<String>> {
    Ok(closing_tag_offset(xml, local)?.map(|pos| {
        let mut out = String::with_capacity(xml.len() + fragment.len());
        out.push_str(&xml[..pos]);
        out.push_str(fragment);
        out.push_str(&xml[pos..]);
        out
    }))
}
