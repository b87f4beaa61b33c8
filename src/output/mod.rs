// src/output/mod.rs
// =============================================================================
// Writing the finished dataset to disk.
//
// - dataset: the pretty-printed JSON document (comments.json)
// - markdown: one Markdown file per issue under <destination>/md/
// =============================================================================

mod dataset;
mod markdown;

pub use dataset::write_dataset;
pub use markdown::{markdown_dir, MarkdownRenderer};
