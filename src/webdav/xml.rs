/// Properties requested when listing a folder.
pub const LISTING_PROPS: &[&str] = &[
    "resourcetype",
    "getlastmodified",
    "getcontentlength",
    "getcontenttype",
    "getetag",
    "displayname",
];

pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Build a `PROPFIND` body asking for the given `DAV:` properties.
///
/// An empty slice produces `<D:allprop/>`.
pub fn build_propfind_body(props: &[&str]) -> String {
    let mut body = String::from(r#"<?xml version="1.0" encoding="utf-8"?><D:propfind xmlns:D="DAV:">"#);
    if props.is_empty() {
        body.push_str("<D:allprop/>");
    } else {
        body.push_str("<D:prop>");
        for prop in props {
            body.push_str("<D:");
            body.push_str(&escape_xml(prop));
            body.push_str("/>");
        }
        body.push_str("</D:prop>");
    }
    body.push_str("</D:propfind>");
    body
}
