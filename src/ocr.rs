// src/ocr.rs
//
// Two implementations: Tesseract through leptess when the `ocr` feature is
// enabled, and a stub that returns an error when it's not. This avoids linking
// leptonica/tesseract on machines where they're not installed.

#[cfg(feature = "ocr")]
mod real {
    use leptess::LepTess;
    use tracing::info;

    pub fn image_to_text(image_bytes: &[u8]) -> Result<String, Box<dyn std::error::Error>> {
        let mut lt = LepTess::new(None, "eng").map_err(|e| format!("tesseract init: {e}"))?;
        lt.set_image_from_mem(image_bytes)
            .map_err(|e| format!("loading image: {e}"))?;
        let text = lt
            .get_utf8_text()
            .map_err(|e| format!("tesseract run: {e}"))?;
        info!(chars = text.len(), "OCR complete");
        Ok(text)
    }
}

#[cfg(not(feature = "ocr"))]
mod stub {
    pub fn image_to_text(_image_bytes: &[u8]) -> Result<String, Box<dyn std::error::Error>> {
        Err("OCR feature not enabled; build with --features ocr and install Tesseract/Leptonica".into())
    }
}

#[cfg(feature = "ocr")]
pub use real::image_to_text;
#[cfg(not(feature = "ocr"))]
pub use stub::image_to_text;

#[cfg(all(test, not(feature = "ocr")))]
mod tests {
    use super::*;

    #[test]
    fn test_stub_explains_how_to_enable() {
        let err = image_to_text(b"\x89PNG").unwrap_err();
        assert!(err.to_string().contains("--features ocr"));
    }
}
