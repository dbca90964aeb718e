pub mod convert;
pub mod correlator;
pub mod tokens;

pub use convert::{default_converters, Converter, MarkdownCopy, PdfToText, VttFlatten};
pub use correlator::{ExtractionIndex, SOURCE_EXTENSIONS};
pub use tokens::{estimate_tokens, token_count_or_blank};
