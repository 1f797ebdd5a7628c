//! Streaming parser for the package descriptor (`.opf`).
//!
//! Elements are matched on their local name, so `<dc:title>`, `<title
//! xmlns="...">` and `<opf:item>` all land in the same place regardless of
//! how the descriptor declares its namespaces. Parsing stops at the first
//! syntax error and keeps whatever was read up to that point.

use crate::models::{BookMetadata, GuideReference, ManifestItem, MetaMarker, normalize_genres};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};
use std::borrow::Cow;

/// The parts of a descriptor the rest of the crate cares about.
#[derive(Debug, Default)]
pub(crate) struct Descriptor {
    pub(crate) metadata: BookMetadata,
    pub(crate) markers: Vec<MetaMarker>,
    pub(crate) manifest: Vec<ManifestItem>,
    pub(crate) guide: Vec<GuideReference>,
}

/// Result of a parse: always a descriptor, plus the reason parsing stopped
/// early, if it did.
pub(crate) struct Parsed {
    pub(crate) descriptor: Descriptor,
    pub(crate) failure: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Metadata,
    Manifest,
    Guide,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Creator,
    Title,
    Description,
    Subject,
    Language,
}
impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        Some(match name {
            b"creator" => Self::Creator,
            b"title" => Self::Title,
            b"description" => Self::Description,
            b"subject" => Self::Subject,
            b"language" => Self::Language,
            _ => return None,
        })
    }

    fn local_name(self) -> &'static [u8] {
        match self {
            Self::Creator => b"creator",
            Self::Title => b"title",
            Self::Description => b"description",
            Self::Subject => b"subject",
            Self::Language => b"language",
        }
    }
}

#[derive(Default)]
struct Builder {
    creators: Vec<String>,
    titles: Vec<String>,
    descriptions: Vec<String>,
    subjects: Vec<String>,
    languages: Vec<String>,
    markers: Vec<MetaMarker>,
    manifest: Vec<ManifestItem>,
    guide: Vec<GuideReference>,
}
impl Builder {
    fn push(&mut self, field: Field, text: String) {
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }
        match field {
            Field::Creator => self.creators.push(text),
            Field::Title => self.titles.push(text),
            Field::Description => self.descriptions.push(text),
            Field::Subject => self.subjects.push(text),
            Field::Language => self.languages.push(text),
        }
    }

    fn element(&mut self, section: Section, element: &BytesStart<'_>) {
        match (section, element.local_name().as_ref()) {
            (Section::Metadata, b"meta") => {
                if let Some(name) = attribute(element, b"name") {
                    let content = attribute(element, b"content").unwrap_or_default();
                    self.markers.push(MetaMarker { name, content });
                }
            },
            (Section::Manifest, b"item") => self.manifest.push(ManifestItem {
                id: attribute(element, b"id").unwrap_or_default(),
                href: attribute(element, b"href").unwrap_or_default(),
                properties: attribute(element, b"properties").unwrap_or_default(),
            }),
            (Section::Guide, b"reference") => self.guide.push(GuideReference {
                kind: attribute(element, b"type").unwrap_or_default(),
                href: attribute(element, b"href").unwrap_or_default(),
                title: attribute(element, b"title").unwrap_or_default(),
            }),
            _ => {},
        }
    }

    fn build(self) -> Descriptor {
        let first = |values: Vec<String>| values.into_iter().next().unwrap_or_default();
        let metadata = BookMetadata {
            author: self.creators.join(", "),
            title: first(self.titles),
            description: first(self.descriptions),
            genres: normalize_genres(&self.subjects),
            language: first(self.languages),
        };
        Descriptor {
            metadata,
            markers: self.markers,
            manifest: self.manifest,
            guide: self.guide,
        }
    }
}

/// Reads an attribute by local name, unescaping its value.
pub(crate) fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(Cow::into_owned))
}

/// Unescapes text, falling back to the raw bytes for entities XML doesn't
/// know about (`&nbsp;` and friends are common in descriptions).
fn text(text: &BytesText<'_>) -> String {
    text.unescape()
        .map(Cow::into_owned)
        .unwrap_or_else(|_| String::from_utf8_lossy(text).into_owned())
}

pub(crate) fn parse(xml: &[u8]) -> Parsed {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut builder = Builder::default();
    let mut section = Section::Other;
    // The Dublin Core field currently collecting text, and its buffer. Nested
    // markup inside a field (XHTML in descriptions) only contributes text.
    let mut field: Option<Field> = None;
    let mut buffer = String::new();
    let failure = loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                if field.is_some() {
                    continue;
                }
                match element.local_name().as_ref() {
                    b"metadata" => section = Section::Metadata,
                    b"manifest" => section = Section::Manifest,
                    b"guide" => section = Section::Guide,
                    name if section == Section::Metadata => {
                        field = Field::from_local_name(name);
                        buffer.clear();
                        builder.element(section, &element);
                    },
                    _ => builder.element(section, &element),
                }
            },
            Ok(Event::Empty(element)) => {
                if field.is_none() {
                    builder.element(section, &element);
                }
            },
            Ok(Event::Text(content)) if field.is_some() => {
                if !buffer.is_empty() {
                    buffer.push(' ');
                }
                buffer.push_str(&text(&content));
            },
            Ok(Event::CData(content)) if field.is_some() => {
                buffer.push_str(&String::from_utf8_lossy(&content.into_inner()));
            },
            Ok(Event::End(element)) => {
                let name = element.local_name();
                match field {
                    Some(current) if current.local_name() == name.as_ref() => {
                        builder.push(current, std::mem::take(&mut buffer));
                        field = None;
                    },
                    Some(_) => {},
                    None => {
                        if matches!(name.as_ref(), b"metadata" | b"manifest" | b"guide") {
                            section = Section::Other;
                        }
                    },
                }
            },
            Ok(Event::Eof) => break None,
            Ok(_) => {},
            Err(err) => break Some(format!("{} (at byte {})", err, reader.error_position())),
        }
    };
    Parsed { descriptor: builder.build(), failure }
}
