use crate::tool::stub_tool;

stub_tool!(WordProcessor, "word");
