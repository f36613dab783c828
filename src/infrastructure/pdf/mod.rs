use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::domain::error::{AppError, Result};
use crate::domain::report::{ReportFont, ReportLayout};

const FONTS: [(ReportFont, &str); 3] = [
    (ReportFont::Bold, "F1"),
    (ReportFont::Regular, "F2"),
    (ReportFont::Oblique, "F3"),
];

fn resource_name(font: ReportFont) -> &'static str {
    FONTS
        .iter()
        .find(|(f, _)| *f == font)
        .map(|(_, name)| *name)
        .unwrap_or("F2")
}

/// Draws a single-page layout with the standard Type1 Helvetica family.
///
/// Content streams are left uncompressed.
pub fn render(layout: &ReportLayout) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for (font, name) in FONTS {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(name, font_id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let content = Content {
        operations: operations(layout),
    };
    let encoded = content
        .encode()
        .map_err(|e| AppError::Internal(format!("Failed to encode report content: {}", e)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), layout.width.into(), layout.height.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| AppError::Internal(format!("Failed to write report: {}", e)))?;
    Ok(bytes)
}

fn operations(layout: &ReportLayout) -> Vec<Operation> {
    let mut ops = Vec::new();
    for line in &layout.lines {
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![resource_name(line.font).into(), line.size.into()],
        ));
        ops.push(Operation::new("Td", vec![line.x.into(), line.y.into()]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(line.text.as_str())],
        ));
        ops.push(Operation::new("ET", vec![]));
    }
    for separator in &layout.separators {
        ops.push(Operation::new(
            "m",
            vec![separator.from.0.into(), separator.from.1.into()],
        ));
        ops.push(Operation::new(
            "l",
            vec![separator.to.0.into(), separator.to.1.into()],
        ));
        ops.push(Operation::new("S", vec![]));
    }
    ops
}
