// Resume page layout: standard-font metrics and the flow of sections onto letter pages.
// Layout is CPU-bound and runs inside tokio::task::spawn_blocking together with rendering.

pub mod flow;
pub mod font_metrics;

pub use flow::layout_document;
pub use font_metrics::{default_page_config, PageConfig, StandardFont};
