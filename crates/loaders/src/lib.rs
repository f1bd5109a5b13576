pub mod local;
pub mod pdf_file;
pub mod record;
pub mod web_page;

pub use local::{LocalQnaPairLoader, LocalTextLoader};
pub use pdf_file::PdfFileLoader;
pub use record::{Metadata, RawRecord, SourceInput};
pub use web_page::WebPageLoader;

use anyhow::Result;
use async_trait::async_trait;

/// A source loader turns one source descriptor into raw text records.
///
/// Implementations exist per source kind (web page, PDF, local payloads) and
/// are selected by the caller; the rest of the pipeline only sees the
/// resulting [`RawRecord`]s.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load_data(&self, input: &SourceInput) -> Result<Vec<RawRecord>>;
}

/// Collapse runs of whitespace into single spaces and trim the ends.
///
/// Loaders run every piece of extracted text through this before handing it
/// to the chunkers, so chunk identity is computed over normalized text.
pub fn clean_string(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_string_collapses_whitespace() {
        assert_eq!(
            clean_string("  hello \n\n world\t again  "),
            "hello world again"
        );
    }

    #[test]
    fn clean_string_of_blank_input_is_empty() {
        assert_eq!(clean_string(" \n \t "), "");
    }
}
