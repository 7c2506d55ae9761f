//! Well-known identifiers.

/// Optical character recognition tool.
pub const OCR: &str = "OCR";
/// PDF tool.
pub const PDF: &str = "PDF";
/// Word document tool.
pub const WORD: &str = "WORD";

/// The module that bundles the product tools.
pub const MODULE_01: &str = "Module01";
/// Highest module number the catalog knows about.
pub const MAX_MODULE_NUMBER: u8 = 13;

/// Route id of the home screen.
pub const HOME_ROUTE: &str = "home_screen";
/// Route id prefix of a feature screen; the feature id follows after a `/`.
pub const FEATURE_ROUTE_PREFIX: &str = "feature_screen";
