//! Assembling pages from several documents into one, using lopdf

use std::collections::{BTreeMap, HashSet};
use lopdf::{Dictionary, Document, Object, ObjectId};
use crate::error::{Error, Result};
use crate::pdf::page::flatten_inherited;

/// Pages to take from one loaded document
#[derive(Debug)]
pub struct PageSelection {
    pub document: Document,
    /// 1-based page numbers, in output order; repeats are allowed
    pub pages: Vec<u32>,
}

/// Build a new document from the selected pages, in selection order
///
/// Based on the lopdf merge example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
///
/// Inherited page attributes are copied onto each page before it is moved
/// under the new page tree. A page selected more than once is duplicated as
/// a separate page object sharing the same content and resources. Objects
/// only reachable from unselected pages are pruned.
pub fn assemble(selections: Vec<PageSelection>, version: &str) -> Result<Document> {
    if selections.is_empty() {
        return Err(Error::General("No input documents provided".to_string()));
    }

    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for PageSelection { mut document, pages } in selections {
        // Renumber objects in this document to avoid conflicts
        document.renumber_objects_with(max_id);

        let numbered = document.get_pages();
        let mut taken = HashSet::new();

        for number in pages {
            let page_id = *numbered.get(&number).ok_or_else(|| {
                Error::Range(format!(
                    "Page {} does not exist (document has {} pages)",
                    number,
                    numbered.len()
                ))
            })?;

            flatten_inherited(&mut document, page_id)?;

            let page_id = if taken.insert(page_id) {
                page_id
            } else {
                let copy = document.get_dictionary(page_id)?.clone();
                document.add_object(copy)
            };
            page_ids.push(page_id);
        }

        max_id = document.max_id + 1;
        objects.extend(document.objects);
    }

    let mut assembled = Document::with_version(version);

    // Add all collected objects first, then allocate catalog/pages above them
    assembled.objects.extend(objects);
    assembled.max_id = max_id - 1;

    let pages_id = assembled.new_object_id();

    let kids: Vec<Object> = page_ids
        .iter()
        .map(|&id| Object::Reference(id))
        .collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let catalog_id = assembled.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    assembled.objects.insert(catalog_id, Object::Dictionary(catalog));
    assembled.objects.insert(pages_id, Object::Dictionary(pages_object));
    assembled.trailer.set("Root", Object::Reference(catalog_id));

    for &page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = assembled.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    // Old catalogs, page tree nodes and unselected pages are now unreachable
    assembled.prune_objects();

    Ok(assembled)
}
