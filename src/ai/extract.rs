use lopdf::Document;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("text extraction failed: {0}")]
pub struct ExtractionFailed(pub String);

/// Turns an uploaded file into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8], content_type: &str) -> Result<String, ExtractionFailed>;
}

/// `text/plain; charset=utf-8` -> `text/plain`
fn base_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Accepts `text/*` and JSON bodies that are valid UTF-8.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], content_type: &str) -> Result<String, ExtractionFailed> {
        let mime = base_mime(content_type);
        if !(mime.starts_with("text/") || mime == "application/json") {
            return Err(ExtractionFailed(format!("unsupported content type {mime}")));
        }
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| ExtractionFailed(format!("not valid UTF-8: {e}")))
    }
}

/// Text layer of every page, in page order. Scanned pages without a text
/// layer come back empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8], _content_type: &str) -> Result<String, ExtractionFailed> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| ExtractionFailed(format!("unreadable PDF: {e}")))?;
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        debug!(pages = pages.len(), "extracting PDF text");
        doc.extract_text(&pages)
            .map_err(|e| ExtractionFailed(format!("PDF text layer: {e}")))
    }
}

/// Picks an extractor by content type. This is the one wired into the app.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentExtractor {
    plain: PlainTextExtractor,
    pdf: PdfTextExtractor,
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, bytes: &[u8], content_type: &str) -> Result<String, ExtractionFailed> {
        match base_mime(content_type).as_str() {
            "application/pdf" => self.pdf.extract(bytes, content_type),
            _ => self.plain.extract(bytes, content_type),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use lopdf::{
        content::{Content, Operation},
        dictionary, Object, Stream,
    };

    use super::*;

    /// One-page PDF with `text` drawn in Courier.
    pub(crate) fn pdf_with_text(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn text_and_json_are_accepted() {
        let x = PlainTextExtractor;
        assert_eq!(x.extract(b"Hb 13.2", "text/plain; charset=utf-8").unwrap(), "Hb 13.2");
        assert_eq!(x.extract(b"{\"a\":1}", "application/json").unwrap(), "{\"a\":1}");
    }

    #[test]
    fn binary_and_invalid_utf8_fail() {
        let x = PlainTextExtractor;
        assert!(x.extract(b"%PDF-1.7", "application/pdf").is_err());
        assert!(x.extract(&[0xff, 0xfe, 0x00], "text/plain").is_err());
    }

    #[test]
    fn pdf_text_layer_is_read() {
        let pdf = pdf_with_text("Fasting glucose 5.4 mmol per litre");
        let text = PdfTextExtractor.extract(&pdf, "application/pdf").unwrap();
        assert!(text.contains("Fasting glucose 5.4"), "got {text:?}");
    }

    #[test]
    fn content_type_picks_the_extractor() {
        let x = DocumentExtractor::default();
        let pdf = pdf_with_text("Blood pressure stable");
        assert!(x
            .extract(&pdf, "Application/PDF")
            .unwrap()
            .contains("Blood pressure stable"));
        assert_eq!(x.extract(b"plain note", "text/plain").unwrap(), "plain note");
        assert!(x.extract(b"%PDF-1.7 binary", "application/pdf").is_err());
        assert!(x.extract(b"GIF89a", "image/gif").is_err());
    }
}
