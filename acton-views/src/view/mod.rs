//! Template views and view name resolution

mod descriptor;
mod naming;

pub use descriptor::{TemplateView, TemplateViewBuilder, DEFAULT_CHARACTER_ENCODING};
pub use naming::{resolve_view_name, VIEW_BASE_DIR, VIEW_SUFFIX};
