/// Relationship parsing for OPC packages.
///
/// Only what is needed to locate related parts is modelled: a relationship's
/// type, its target and whether that target is external.
use crate::common::xml::unescape_xml;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::target_mode;
use quick_xml::Reader;
use quick_xml::events::Event;
use smallvec::SmallVec;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    pub r_id: String,
    /// Relationship type URI
    pub reltype: String,
    /// Target reference (relative URI or external URL)
    pub target_ref: String,
    /// Target mode (Internal or External)
    pub target_mode: String,
}

impl Relationship {
    /// Check if this is an external relationship.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.target_mode == target_mode::EXTERNAL
    }

    /// Resolve the target against the directory of the source part.
    ///
    /// `base_dir` is the member directory of the source (`""` for the package
    /// itself, `"word"` for `word/document.xml`). The result is a member name
    /// without a leading slash.
    pub fn target_membername(&self, base_dir: &str) -> String {
        resolve_member(base_dir, &self.target_ref)
    }
}

/// Parse a `.rels` part into its relationships.
pub fn parse_rels_xml(rels_xml: &[u8]) -> Result<SmallVec<[Relationship; 8]>> {
    let mut rels = SmallVec::new();
    let mut reader = Reader::from_reader(rels_xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut r_id = None;
                    let mut reltype = None;
                    let mut target_ref = None;
                    let mut mode = target_mode::INTERNAL.to_string();

                    for attr in e.attributes() {
                        let attr = attr?;
                        let value = unescape_xml(std::str::from_utf8(&attr.value)?);
                        match attr.key.as_ref() {
                            b"Id" => r_id = Some(value),
                            b"Type" => reltype = Some(value),
                            b"Target" => target_ref = Some(value),
                            b"TargetMode" => mode = value,
                            _ => {},
                        }
                    }

                    if let (Some(r_id), Some(reltype), Some(target_ref)) = (r_id, reltype, target_ref)
                    {
                        rels.push(Relationship {
                            r_id,
                            reltype,
                            target_ref,
                            target_mode: mode,
                        });
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(OoxmlError::Xml(format!("Rels parse error: {}", e))),
            _ => {},
        }
        buf.clear();
    }

    Ok(rels)
}

/// Resolve a relative part reference against a member directory.
///
/// Absolute references (leading `/`) are taken from the package root.
/// `..` segments walk up; `.` segments are dropped.
pub fn resolve_member(base_dir: &str, target: &str) -> String {
    let mut segments: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|s| !s.is_empty()).collect()
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Directory part of a member name (`"word"` for `"word/document.xml"`).
pub fn member_dir(membername: &str) -> &str {
    let membername = membername.trim_start_matches('/');
    match membername.rfind('/') {
        Some(idx) => &membername[..idx],
        None => "",
    }
}

/// Member name of the `.rels` part that belongs to `membername`.
///
/// The package itself (`""`) maps to `_rels/.rels`.
pub fn rels_membername(membername: &str) -> String {
    let membername = membername.trim_start_matches('/');
    if membername.is_empty() {
        return "_rels/.rels".to_string();
    }
    let dir = member_dir(membername);
    let file = &membername[dir.len()..].trim_start_matches('/');
    if dir.is_empty() {
        format!("_rels/{}.rels", file)
    } else {
        format!("{}/_rels/{}.rels", dir, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as rt;

    const PKG_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/>
</Relationships>"#;

    #[test]
    fn test_parse_package_rels() {
        let rels = parse_rels_xml(PKG_RELS.as_bytes()).unwrap();
        assert_eq!(rels.len(), 3);

        let main = rels.iter().find(|r| r.reltype == rt::OFFICE_DOCUMENT).unwrap();
        assert_eq!(main.r_id, "rId1");
        assert_eq!(main.target_membername(""), "word/document.xml");
        assert!(!main.is_external());

        let link = rels.iter().find(|r| r.r_id == "rId9").unwrap();
        assert!(link.is_external());
        assert_eq!(link.target_ref, "https://example.com/?a=1&b=2");
    }

    #[test]
    fn test_resolve_member() {
        assert_eq!(resolve_member("word", "styles.xml"), "word/styles.xml");
        assert_eq!(resolve_member("word", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_member("word", "/word/styles.xml"), "word/styles.xml");
        assert_eq!(resolve_member("", "./word/document.xml"), "word/document.xml");
    }

    #[test]
    fn test_rels_membername() {
        assert_eq!(rels_membername(""), "_rels/.rels");
        assert_eq!(rels_membername("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_membername("/word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(member_dir("word/document.xml"), "word");
        assert_eq!(member_dir("document.xml"), "");
    }
}
