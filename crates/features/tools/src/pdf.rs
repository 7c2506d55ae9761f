use crate::tool::stub_tool;

stub_tool!(
    /// PDF reader tool.
    PdfProcessor,
    "pdf"
);
