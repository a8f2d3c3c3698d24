//! Filename derivation for downloaded pages.
//!
//! A naming template is rendered with the illustration's title, author, id and
//! page index, sanitized, and suffixed with the source file's extension.

mod path;
mod sanitize;
mod template;

pub use path::extension_from_url;
pub use sanitize::sanitize_filename;
pub use template::{render_template, NamingContext, PLACEHOLDERS};

/// Naming template used when the user never saved one.
pub const DEFAULT_NAMING_TEMPLATE: &str = "{id}-{p}";

/// Derives the filename for one page: rendered template, sanitized, plus `.ext`.
///
/// If the rendered stem sanitizes to nothing, the default template is used instead
/// so every file still gets a name.
///
/// # Examples
///
/// - template `{title}-{id}-{p}`, title `My:Art`, id 123, page 0, url `.../123_p0.png` → `My_Art-123-0.png`
pub fn derive_filename(template: &str, ctx: &NamingContext<'_>, url: &str) -> String {
    let mut stem = sanitize_filename(&render_template(template, ctx));
    if stem.trim().is_empty() {
        stem = sanitize_filename(&render_template(DEFAULT_NAMING_TEMPLATE, ctx));
    }
    format!("{}.{}", stem, extension_from_url(url))
}
