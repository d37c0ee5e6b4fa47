//! In-memory fixture documents for unit tests

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

fn page_content(number: usize) -> Vec<u8> {
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
            Operation::new("Td", vec![Object::Integer(72), Object::Integer(72)]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    format!("Page {}", number).into_bytes(),
                    lopdf::StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    content.encode().unwrap()
}

fn font_resources(doc: &mut Document) -> ObjectId {
    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]))
}

fn media_box(width: f32, height: f32) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(width),
        Object::Real(height),
    ])
}

fn finish(mut doc: Document, pages_id: ObjectId, mut pages: Dictionary, page_ids: Vec<ObjectId>) -> Document {
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(page_ids.len() as i64));
    pages.set(
        "Kids",
        Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
    );
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

/// One page per entry of `sizes`, each carrying its own MediaBox
pub(crate) fn sample_document(sizes: &[(f32, f32)]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let resources_id = font_resources(&mut doc);

    let page_ids = sizes
        .iter()
        .enumerate()
        .map(|(i, &(width, height))| {
            let content_id = doc.add_object(Stream::new(Dictionary::new(), page_content(i + 1)));
            doc.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("MediaBox", media_box(width, height)),
                ("Resources", Object::Reference(resources_id)),
                ("Contents", Object::Reference(content_id)),
            ]))
        })
        .collect();

    finish(doc, pages_id, Dictionary::new(), page_ids)
}

/// `count` pages whose MediaBox, Rotate and Resources live on the Pages node
pub(crate) fn sample_document_with_inherited_boxes(
    count: usize,
    (width, height): (f32, f32),
    rotate: i64,
) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let resources_id = font_resources(&mut doc);

    let page_ids = (0..count)
        .map(|i| {
            let content_id = doc.add_object(Stream::new(Dictionary::new(), page_content(i + 1)));
            doc.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
            ]))
        })
        .collect();

    let pages = Dictionary::from_iter(vec![
        ("MediaBox", media_box(width, height)),
        ("Rotate", Object::Integer(rotate)),
        ("Resources", Object::Reference(resources_id)),
    ]);

    finish(doc, pages_id, pages, page_ids)
}
