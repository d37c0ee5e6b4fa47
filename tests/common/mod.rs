//! Fixture PDFs built with lopdf for the integration tests

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::path::{Path, PathBuf};

/// Height of fixture pages, tall enough to crop from y = 800 upwards
pub const PAGE_HEIGHT: f32 = 1008.0;

/// Width of fixture page `i` (0-based): unique per page so order can be checked
pub fn page_width(i: usize) -> f32 {
    600.0 + i as f32
}

fn page_content(number: usize) -> Vec<u8> {
    Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(24)]),
            Operation::new("Td", vec![Object::Integer(72), Object::Integer(900)]),
            Operation::new(
                "Tj",
                vec![Object::String(format!("Page {}", number).into_bytes(), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ],
    }
    .encode()
    .expect("Failed to encode fixture content")
}

fn build(count: usize, inherited: bool) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]));

    let mut page_ids: Vec<ObjectId> = Vec::new();
    for i in 0..count {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), page_content(i + 1)));
        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        if !inherited {
            page.set("MediaBox", media_box(page_width(i), PAGE_HEIGHT));
            page.set("Resources", Object::Reference(resources_id));
        }
        page_ids.push(doc.add_object(page));
    }

    let mut pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(count as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    if inherited {
        pages.set("MediaBox", media_box(page_width(0), PAGE_HEIGHT));
        pages.set("Resources", Object::Reference(resources_id));
        pages.set("Rotate", Object::Integer(90));
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

fn media_box(width: f32, height: f32) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(width),
        Object::Real(height),
    ])
}

fn save(mut doc: Document, dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    doc.save(&path).expect("Failed to save fixture PDF");
    path
}

/// A `count`-page PDF; page `i` is `page_width(i)` x `PAGE_HEIGHT`
pub fn write_pdf(dir: &Path, name: &str, count: usize) -> PathBuf {
    save(build(count, false), dir, name)
}

/// A PDF whose MediaBox, Resources and a 90 degree Rotate live on the Pages node
pub fn write_inherited_pdf(dir: &Path, name: &str, count: usize) -> PathBuf {
    save(build(count, true), dir, name)
}

/// Widths of every page of a PDF on disk, in page order
pub fn page_widths(path: &Path) -> Vec<f32> {
    let doc = Document::load(path).expect("Failed to load PDF");
    doc.get_pages()
        .values()
        .map(|&id| {
            let page = doc.get_dictionary(id).expect("Page is not a dictionary");
            let media = page
                .get(b"MediaBox")
                .and_then(Object::as_array)
                .expect("Page has no MediaBox");
            media[2].as_float().unwrap() - media[0].as_float().unwrap()
        })
        .collect()
}
