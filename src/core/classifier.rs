//! Infers which game entity a markup document inside a mod archive defines.
//!
//! The root element (or one of its direct children) is matched against known
//! type tags first. When that fails, folder names in the member path decide.
//! Documents matching neither are not entities and are skipped.

use crate::models::entity::{EntityCategory, EntityInfo};
use camino::Utf8Path;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

const TYPE_TAGS: &[(&str, EntityCategory)] = &[
    ("animal", EntityCategory::Animal),
    ("bfanimal", EntityCategory::Animal),
    ("building", EntityCategory::Building),
    ("shelter", EntityCategory::Building),
    ("scenery", EntityCategory::Scenery),
    ("fence", EntityCategory::Fence),
    ("barrier", EntityCategory::Fence),
    ("path", EntityCategory::Path),
    ("foliage", EntityCategory::Foliage),
    ("plant", EntityCategory::Foliage),
    ("guest", EntityCategory::Guest),
    ("staff", EntityCategory::Staff),
    ("keeper", EntityCategory::Staff),
    ("object", EntityCategory::Object),
];

const FOLDER_TAGS: &[(&str, EntityCategory)] = &[
    ("animals", EntityCategory::Animal),
    ("buildings", EntityCategory::Building),
    ("scenery", EntityCategory::Scenery),
    ("fences", EntityCategory::Fence),
    ("paths", EntityCategory::Path),
    ("foliage", EntityCategory::Foliage),
    ("guests", EntityCategory::Guest),
    ("staff", EntityCategory::Staff),
    ("objects", EntityCategory::Object),
];

const CODENAME_FIELDS: &[&str] = &["codename", "code_name", "ccodename", "entityname"];
const DISPLAY_NAME_FIELDS: &[&str] = &["displayname", "display_name", "cdisplayname", "name", "title"];
const DESCRIPTION_FIELDS: &[&str] = &["description", "cdescription", "desc", "info"];
const TYPE_ATTRIBUTE: &str = "type";
/// Deepest element (root = 0) whose attributes and text are read as fields.
const FIELD_DEPTH: usize = 1;

/// Flattened view of a parsed document: element names plus the first value seen
/// for each field, taken from element text or attributes.
#[derive(Debug, Default)]
struct ParsedDocument {
    root: Option<String>,
    root_children: Vec<String>,
    root_type: Option<String>,
    fields: HashMap<String, String>,
}

impl ParsedDocument {
    fn field(&self, candidates: &[&str]) -> Option<String> {
        candidates.iter().find_map(|c| self.fields.get(*c).cloned())
    }
}

/// Classifies one markup member. Returns `None` when the document is malformed
/// or does not look like an entity definition.
pub fn classify(member_path: &str, bytes: &[u8]) -> Option<EntityInfo> {
    let doc = parse(bytes)?;

    let category = category_from_elements(&doc).or_else(|| category_from_path(member_path))?;

    let codename = doc
        .field(CODENAME_FIELDS)
        .or_else(|| doc.root_type.clone())
        .unwrap_or_else(|| base_name(member_path));

    let display_name = doc
        .field(DISPLAY_NAME_FIELDS)
        .unwrap_or_else(|| codename.clone());

    Some(EntityInfo {
        source_filename: member_path.to_string(),
        category,
        codename,
        display_name,
        description: doc.field(DESCRIPTION_FIELDS),
    })
}

fn parse(bytes: &[u8]) -> Option<ParsedDocument> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut doc = ParsedDocument::default();
    let mut stack: Vec<String> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = open_element(&mut doc, &stack, &e);
                stack.push(name);
            }
            Ok(Event::Empty(e)) => {
                open_element(&mut doc, &stack, &e);
            }
            // Only the root and its direct children carry entity fields.
            Ok(Event::Text(t)) if stack.len() <= FIELD_DEPTH + 1 => {
                if let (Some(current), Ok(text)) = (stack.last(), t.unescape()) {
                    let text = text.trim();
                    if !text.is_empty() {
                        doc.fields
                            .entry(current.clone())
                            .or_insert_with(|| text.to_string());
                    }
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            // Unclosed elements make the document malformed.
            Ok(Event::Eof) if !stack.is_empty() => return None,
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }

    doc.root.is_some().then_some(doc)
}

/// Records an element and its attributes; returns its lowercased local name.
fn open_element(doc: &mut ParsedDocument, stack: &[String], e: &BytesStart<'_>) -> String {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();

    match stack.len() {
        0 if doc.root.is_none() => {
            doc.root = Some(name.clone());
            doc.root_type = attr_value(e, TYPE_ATTRIBUTE);
        }
        1 => doc.root_children.push(name.clone()),
        _ => {}
    }

    if stack.len() > FIELD_DEPTH {
        return name;
    }

    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_lowercase();
        if let Ok(value) = attr.unescape_value() {
            let value = value.trim();
            if !value.is_empty() {
                doc.fields.entry(key).or_insert_with(|| value.to_string());
            }
        }
    }

    name
}

fn attr_value(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref().eq_ignore_ascii_case(key.as_bytes()))
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn category_from_elements(doc: &ParsedDocument) -> Option<EntityCategory> {
    doc.root
        .iter()
        .chain(doc.root_children.iter())
        .find_map(|name| lookup(TYPE_TAGS, name))
}

fn category_from_path(member_path: &str) -> Option<EntityCategory> {
    let normalized = member_path.replace('\\', "/").to_lowercase();
    let mut segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    // The last segment is the file itself.
    segments.pop();
    segments.iter().find_map(|segment| lookup(FOLDER_TAGS, segment))
}

fn lookup(table: &[(&str, EntityCategory)], name: &str) -> Option<EntityCategory> {
    table
        .iter()
        .find(|(tag, _)| *tag == name)
        .map(|(_, category)| *category)
}

fn base_name(member_path: &str) -> String {
    let normalized = member_path.replace('\\', "/");
    Utf8Path::new(&normalized)
        .file_stem()
        .unwrap_or(&normalized)
        .to_string()
}
