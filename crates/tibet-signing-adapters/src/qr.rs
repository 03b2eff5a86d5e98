use qr_code::QrCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QrRenderError {
    #[error("failed to encode qr content: {0}")]
    Qr(#[from] qr_code::types::QrError),
}

/// Module grid of an encoded payload, row-major, `true` for dark modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    pub width: usize,
    pub modules: Vec<bool>,
}

impl QrMatrix {
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && self.modules.get(y * self.width + x).copied().unwrap_or(false)
    }
}

pub fn render_text_qr(content: &str) -> Result<String, QrRenderError> {
    let qr = QrCode::new(content)?;
    Ok(qr.to_string(true, 3))
}

pub fn render_matrix(content: &str) -> Result<QrMatrix, QrRenderError> {
    let qr = QrCode::new(content)?;
    Ok(QrMatrix {
        width: qr.width(),
        modules: qr.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::{render_matrix, render_text_qr};

    #[test]
    fn pairing_uri_renders_square_matrix() {
        let uri = "wc:7f6e5d4c@2?relay-protocol=irn&symKey=00112233";
        let matrix = render_matrix(uri).expect("matrix");
        assert_eq!(matrix.modules.len(), matrix.width * matrix.width);
        assert!(matrix.is_dark(0, 0));
        assert!(!matrix.is_dark(matrix.width, 0));
        assert!(!render_text_qr(uri).expect("text").is_empty());
    }
}
