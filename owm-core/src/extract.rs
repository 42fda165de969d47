//! Best-effort attribute scraping.
//!
//! This is not an XML parser. [`extract_attribute`] finds the first `<tag ` in a
//! buffer and returns the quoted value of one attribute inside it. Nested or
//! repeated tags, entity escaping and malformed markup are not handled.
//!
//! The opening marker requires a space after the tag name, so `<times ...>` never
//! matches `time`, but an attribute-less `<time>` is never found either.

/// Returns the value of `attribute` inside the first `<tag ...>` of `buffer`.
///
/// The attribute name must occur before the tag's closing marker `</tag>`. A
/// self-closing tag has no closing marker, in which case the search stops at the
/// end of the opening element instead, so a missing attribute is not picked up
/// from a later sibling. An empty value (`attr=""`) reads the same as a missing one.
///
/// ```
/// use owm_core::extract_attribute;
///
/// let xml = r#"<symbol number="800" name="clear sky" var="01d"/>"#;
/// assert_eq!(extract_attribute(xml, "symbol", "name"), Some("clear sky"));
/// assert_eq!(extract_attribute(xml, "symbol", "icon"), None);
/// ```
pub fn extract_attribute<'a>(buffer: &'a str, tag: &str, attribute: &str) -> Option<&'a str> {
    let open = opening_marker(buffer, tag)?;
    let bound = search_bound(buffer, tag, open);

    let attribute_start = open + buffer[open..].find(attribute)?;
    if attribute_start >= bound {
        return None;
    }

    let quote = attribute_start + buffer[attribute_start..].find('"')?;
    let value_start = quote + 1;
    let value_end = value_start + buffer[value_start..].find('"')?;

    let value = &buffer[value_start..value_end];
    (!value.is_empty()).then_some(value)
}

fn opening_marker(buffer: &str, tag: &str) -> Option<usize> {
    buffer.find(&format!("<{tag} "))
}

fn closing_marker(buffer: &str, tag: &str) -> Option<usize> {
    buffer.find(&closing(tag))
}

/// The closing marker `</tag>`.
pub(crate) fn closing(tag: &str) -> String {
    format!("</{tag}>")
}

// Exclusive upper bound for the attribute name offset.
fn search_bound(buffer: &str, tag: &str, open: usize) -> usize {
    match closing_marker(buffer, tag) {
        Some(close) => close,
        None => buffer[open..].find('>').map_or(buffer.len(), |end| open + end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRY: &str =
        r#"<time from="2020-01-01" to="2020-01-02"><symbol number="800" name="clear"/></time>"#;

    #[test]
    fn reads_value_between_open_and_close_markers() {
        assert_eq!(extract_attribute(ENTRY, "time", "from"), Some("2020-01-01"));
        assert_eq!(extract_attribute(ENTRY, "time", "to"), Some("2020-01-02"));
    }

    #[test]
    fn reads_self_closing_tags() {
        assert_eq!(extract_attribute(ENTRY, "symbol", "number"), Some("800"));
        assert_eq!(extract_attribute(ENTRY, "symbol", "name"), Some("clear"));
    }

    #[test]
    fn missing_tag_has_no_value() {
        assert_eq!(extract_attribute(ENTRY, "humidity", "value"), None);
        assert_eq!(extract_attribute("", "time", "from"), None);
    }

    #[test]
    fn attribute_after_closing_marker_is_ignored() {
        let xml = r#"<time from="a"></time><other day="b"/>"#;
        assert_eq!(extract_attribute(xml, "time", "day"), None);
    }

    #[test]
    fn missing_attribute_is_not_taken_from_a_later_sibling() {
        let xml = r#"<precipitation mode="no"/><weather number="800" value="clear sky"/>"#;
        assert_eq!(extract_attribute(xml, "precipitation", "value"), None);
        assert_eq!(extract_attribute(xml, "precipitation", "mode"), Some("no"));
    }

    #[test]
    fn unquoted_attribute_has_no_value() {
        assert_eq!(extract_attribute("<humidity value=77 ", "humidity", "value"), None);
        assert_eq!(extract_attribute(r#"<humidity value="77 "#, "humidity", "value"), None);
    }

    #[test]
    fn empty_quoted_value_has_no_value() {
        let xml = r#"<weather number="800" value=""/>"#;
        assert_eq!(extract_attribute(xml, "weather", "value"), None);
        assert_eq!(extract_attribute(xml, "weather", "number"), Some("800"));
    }

    #[test]
    fn opening_marker_needs_trailing_space() {
        let xml = r#"<timezone>3600</timezone><times from="x"/><time from="y"></time>"#;
        assert_eq!(extract_attribute(xml, "time", "from"), Some("y"));
        assert_eq!(extract_attribute("<time>plain</time>", "time", "from"), None);
    }

    #[test]
    fn first_occurrence_wins() {
        let xml = r#"<temperature value="1"/><temperature value="2"/>"#;
        assert_eq!(extract_attribute(xml, "temperature", "value"), Some("1"));
    }

}
