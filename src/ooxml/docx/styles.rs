/// Styles - style ID to display name resolution.
///
/// Paragraphs reference their style by ID (`w:pPr/w:pStyle/@w:val`), while
/// users configure styles by the name Word shows (`Heading 1`). The styles
/// part maps one onto the other.
use crate::ooxml::error::Result;
use quick_xml::Reader;
use quick_xml::events::Event;
use smallvec::SmallVec;

/// A single style definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    /// Style ID used in references (e.g. `Heading1`)
    pub style_id: String,
    /// Display name (e.g. `heading 1` or `Heading 1`)
    pub name: Option<String>,
    /// Style type (`paragraph`, `character`, `table`, `numbering`)
    pub style_type: String,
    /// ID of the style this one is based on
    pub based_on: Option<String>,
}

/// A collection of styles defined in a Word document.
#[derive(Debug, Clone, Default)]
pub struct Styles {
    style_list: SmallVec<[Style; 32]>,
}

impl Styles {
    /// Parse `word/styles.xml`.
    pub fn parse(xml_bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml_bytes);
        reader.config_mut().trim_text(true);

        let mut style_list = SmallVec::new();
        let mut current: Option<Style> = None;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.local_name().as_ref() == b"style" => {
                    let mut style = Style {
                        style_id: String::new(),
                        name: None,
                        style_type: "paragraph".to_string(),
                        based_on: None,
                    };
                    for attr in e.attributes().flatten() {
                        let Ok(value) = attr.decode_and_unescape_value(reader.decoder()) else {
                            continue;
                        };
                        match attr.key.local_name().as_ref() {
                            b"styleId" => style.style_id = value.to_string(),
                            b"type" => style.style_type = value.to_string(),
                            _ => {},
                        }
                    }
                    current = Some(style);
                },
                Event::Empty(ref e) => {
                    let Some(style) = current.as_mut() else {
                        continue;
                    };
                    let target = match e.local_name().as_ref() {
                        b"name" => &mut style.name,
                        b"basedOn" => &mut style.based_on,
                        _ => continue,
                    };
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"val"
                            && let Ok(value) = attr.decode_and_unescape_value(reader.decoder())
                        {
                            *target = Some(value.to_string());
                        }
                    }
                },
                Event::End(ref e) if e.local_name().as_ref() == b"style" => {
                    if let Some(style) = current.take()
                        && !style.style_id.is_empty()
                    {
                        style_list.push(style);
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }

        Ok(Self { style_list })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.style_list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.style_list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Style> {
        self.style_list.iter()
    }

    /// Get a style by its ID.
    pub fn get_by_id(&self, style_id: &str) -> Option<&Style> {
        self.style_list.iter().find(|s| s.style_id == style_id)
    }

    /// Get a style by its display name.
    pub fn get_by_name(&self, name: &str) -> Option<&Style> {
        self.style_list
            .iter()
            .find(|s| s.name.as_deref() == Some(name))
    }

    /// Display name for a style ID, falling back to the ID itself.
    ///
    /// Word writes built-in names in lowercase (`heading 1`) and shows them
    /// capitalised, so the first letter is upper-cased for built-ins.
    pub fn display_name<'a>(&'a self, style_id: &'a str) -> std::borrow::Cow<'a, str> {
        match self.get_by_id(style_id).and_then(|s| s.name.as_deref()) {
            Some(name) => capitalize_first(name),
            None => std::borrow::Cow::Borrowed(style_id),
        }
    }
}

fn capitalize_first(name: &str) -> std::borrow::Cow<'_, str> {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => {
            std::borrow::Cow::Owned(first.to_uppercase().chain(chars).collect())
        },
        _ => std::borrow::Cow::Borrowed(name),
    }
}
