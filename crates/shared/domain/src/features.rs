use crate::constants::{OCR, PDF, WORD};

string_id! {
    /// A user-facing capability requested by navigation (e.g. `"OCR"`).
    FeatureId
}

impl FeatureId {
    #[must_use]
    pub fn ocr() -> Self {
        Self::new(OCR)
    }

    #[must_use]
    pub fn pdf() -> Self {
        Self::new(PDF)
    }

    #[must_use]
    pub fn word() -> Self {
        Self::new(WORD)
    }

    /// Whether the identifier is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}
