//! lopdf-backed reading and writing of label documents.

use crate::domain::model::PageRecord;
use crate::render::{DrawOp, Font, Page};
use crate::utils::error::{LabelError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

const PRODUCER: &str = concat!("label-etl ", env!("CARGO_PKG_VERSION"));

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Encode text for a WinAnsiEncoding base-14 font. Characters outside Latin-1
/// become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => b'?',
        })
        .collect()
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

fn page_operations(page: &Page) -> Vec<Operation> {
    let mut operations = Vec::new();

    for op in &page.ops {
        match op {
            DrawOp::Text {
                font,
                size,
                x,
                y,
                text,
            } => {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![Object::Name(font.resource_name().as_bytes().to_vec()), real(*size)],
                ));
                operations.push(Operation::new("Td", vec![real(*x), real(*y)]));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            DrawOp::Line { from, to, dash } => {
                operations.push(Operation::new("q", vec![]));
                if let Some((on, off)) = dash {
                    operations.push(Operation::new(
                        "d",
                        vec![Object::Array(vec![real(*on), real(*off)]), Object::Integer(0)],
                    ));
                }
                operations.push(Operation::new("m", vec![real(from.0), real(from.1)]));
                operations.push(Operation::new("l", vec![real(to.0), real(to.1)]));
                operations.push(Operation::new("S", vec![]));
                operations.push(Operation::new("Q", vec![]));
            }
        }
    }

    operations
}

fn font_object(font: Font) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Build a PDF holding `pages` in order. Each page keeps its own media box, so
/// label and A4 pages can share one file.
pub fn render_document(pages: &[Page]) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_object(Font::Helvetica));
    let bold_id = doc.add_object(font_object(Font::HelveticaBold));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            Font::Helvetica.resource_name() => regular_id,
            Font::HelveticaBold.resource_name() => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page_operations(page),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), real(page.width), real(page.height)],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let created = chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal(PRODUCER),
        "CreationDate" => Object::string_literal(created),
    });
    doc.trailer.set("Info", info_id);

    save(doc)
}

fn save(mut doc: Document) -> Result<Vec<u8>> {
    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Parse an existing document held in memory.
pub fn load_document(path: &str, bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes).map_err(|e| LabelError::DocumentReadFailure {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// Extract the text of every page, in document order.
///
/// A page whose text cannot be decoded yields an empty record instead of failing
/// the run; it will simply not match any id.
pub fn extract_pages(doc: &Document) -> Vec<PageRecord> {
    doc.get_pages()
        .keys()
        .enumerate()
        .map(|(index, &number)| {
            let text = doc.extract_text(&[number]).unwrap_or_else(|e| {
                tracing::warn!("Could not extract text from page {}: {}", number, e);
                String::new()
            });
            PageRecord::new(index, text)
        })
        .collect()
}

fn pages_root(doc: &Document) -> Result<ObjectId> {
    let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
    Ok(doc.get_dictionary(catalog_id)?.get(b"Pages")?.as_reference()?)
}

/// Attributes `page_id` inherits from ancestors and does not set itself.
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Result<Vec<(Vec<u8>, Object)>> {
    let page = doc.get_dictionary(page_id)?;
    let mut missing: Vec<&[u8]> = INHERITABLE_KEYS
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    let mut found = Vec::new();

    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(node_id) = parent {
        if missing.is_empty() || depth > 64 {
            break;
        }
        let node = doc.get_dictionary(node_id)?;
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                found.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    Ok(found)
}

/// Rewrite `doc` so it holds exactly the pages at `selection` (0-based document
/// positions), in that order, under a single flat page tree.
pub fn reorder_pages(mut doc: Document, selection: &[usize]) -> Result<Vec<u8>> {
    let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
    let root_id = pages_root(&doc)?;

    let mut kids = Vec::with_capacity(selection.len());
    for &index in selection {
        let page_id = *page_ids.get(index).ok_or_else(|| LabelError::DocumentReadFailure {
            path: "<memory>".to_string(),
            message: format!("page index {} out of range ({} pages)", index, page_ids.len()),
        })?;

        let inherited = inherited_attributes(&doc, page_id)?;
        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        for (key, value) in inherited {
            page.set(key, value);
        }
        page.set("Parent", root_id);
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    let root = doc.get_object_mut(root_id)?.as_dict_mut()?;
    root.set("Kids", kids);
    root.set("Count", count);
    root.remove(b"Parent");

    let pruned = doc.prune_objects();
    tracing::debug!("Pruned {} unreferenced objects", pruned.len());

    save(doc)
}
