//! PDF text extraction.

use super::{resolve_path, wrong_kind, Extractor, SourceDescriptor, SourceKind};
use crate::chunking::SourceText;
use crate::error::{DocqaError, Result};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Extracts one text segment per PDF page.
#[derive(Debug, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for PdfExtractor {
    #[instrument(skip(self, source), fields(source = %source.label()))]
    async fn extract(&self, source: &SourceDescriptor) -> Result<Vec<SourceText>> {
        let SourceDescriptor::Pdf { path } = source else {
            return Err(wrong_kind(SourceKind::Pdf, source));
        };

        let path = resolve_path(path).await?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| DocqaError::Extraction(format!("failed to read {}: {}", path.display(), e)))?;

        // pdf-extract is CPU-bound and may panic on malformed input.
        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        })
        .await
        .map_err(|e| DocqaError::Extraction(format!("PDF extraction task failed: {}", e)))?
        .map_err(|e| DocqaError::Extraction(format!("PDF extraction error: {}", e)))?;

        let origin = path.display().to_string();
        let segments = pages_to_segments(pages, &origin)?;

        debug!("Extracted {} text pages from {}", segments.len(), origin);
        Ok(segments)
    }
}

/// Pair page texts with provenance; a PDF with no text on any page is empty input.
fn pages_to_segments(pages: Vec<String>, origin: &str) -> Result<Vec<SourceText>> {
    if pages.iter().all(|page| page.trim().is_empty()) {
        return Err(DocqaError::EmptyInput(format!(
            "PDF contains no extractable text (it may be image-based or encrypted): {}",
            origin
        )));
    }

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| SourceText::page(text, Some(origin.to_string()), i as u32))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_pages_keep_order_and_provenance() {
        let segments = pages_to_segments(
            vec!["Intro".to_string(), "".to_string(), "Results".to_string()],
            "/docs/paper.pdf",
        )
        .unwrap();

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2].text, "Results");
        assert_eq!(segments[2].page, Some(2));
        assert!(segments
            .iter()
            .all(|s| s.source.as_deref() == Some("/docs/paper.pdf")));
    }

    #[test]
    fn test_textless_pdf_is_empty_input() {
        let result = pages_to_segments(vec![" ".to_string(), "\n".to_string()], "/scan.pdf");
        assert!(matches!(result, Err(DocqaError::EmptyInput(_))));

        let result = pages_to_segments(Vec::new(), "/blank.pdf");
        assert!(matches!(result, Err(DocqaError::EmptyInput(_))));
    }

    #[tokio::test]
    async fn test_missing_pdf() {
        let result = PdfExtractor::new()
            .extract(&SourceDescriptor::Pdf {
                path: PathBuf::from("/no/such/file.pdf"),
            })
            .await;
        assert!(matches!(result, Err(DocqaError::SourceNotFound(_))));
    }

    /// A minimal PDF with one Helvetica text line per page.
    fn text_pdf(pages: &[&str]) -> Vec<u8> {
        let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");

        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];
        for (page_id, text) in page_ids.iter().zip(pages) {
            let content = format!("BT /F1 24 Tf 72 720 Td ({}) Tj ET", text);
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                page_id + 1
            ));
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                content.len(),
                content
            ));
        }

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref
            )
            .as_bytes(),
        );
        pdf
    }

    #[tokio::test]
    async fn test_multi_page_pdf() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        std::fs::write(file.path(), text_pdf(&["Introduction", "Results"])).unwrap();

        let segments = PdfExtractor::new()
            .extract(&SourceDescriptor::Pdf {
                path: file.path().to_path_buf(),
            })
            .await
            .unwrap();

        assert_eq!(segments.len(), 2);
        assert!(segments[0].text.contains("Introduction"), "{:?}", segments[0].text);
        assert!(segments[1].text.contains("Results"), "{:?}", segments[1].text);
        assert_eq!(segments[0].page, Some(0));
        assert_eq!(segments[1].page, Some(1));

        let expected = file.path().canonicalize().unwrap();
        assert!(segments
            .iter()
            .all(|s| s.source.as_deref() == expected.to_str()));
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_extraction_failure() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        std::fs::write(file.path(), b"this is not a pdf").unwrap();

        let result = PdfExtractor::new()
            .extract(&SourceDescriptor::Pdf {
                path: file.path().to_path_buf(),
            })
            .await;
        assert!(matches!(result, Err(DocqaError::Extraction(_))));
    }
}
