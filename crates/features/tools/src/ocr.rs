use crate::tool::stub_tool;

stub_tool!(
    /// Text recognition tool. Holds no engine yet.
    OcrProcessor,
    "ocr"
);
