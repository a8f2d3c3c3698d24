//! Single-pass placeholder substitution.

/// Placeholder tokens understood by the naming template.
pub const PLACEHOLDERS: [&str; 4] = ["{title}", "{author}", "{id}", "{p}"];

/// Values substituted into a naming template.
#[derive(Debug, Clone, Copy)]
pub struct NamingContext<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub id: u64,
    /// Zero-based page index.
    pub page: usize,
}

/// Replaces every `{title}`, `{author}`, `{id}` and `{p}` in `template`.
///
/// Substitution is literal and single-pass: text inserted for one placeholder
/// is never scanned again, so a title containing `{id}` stays as typed.
/// Unknown `{...}` sequences are copied through unchanged.
pub fn render_template(template: &str, ctx: &NamingContext<'_>) -> String {
    let id = ctx.id.to_string();
    let page = ctx.page.to_string();
    let mut out = String::with_capacity(template.len() + ctx.title.len() + ctx.author.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let hit = PLACEHOLDERS
            .iter()
            .find(|token| tail.starts_with(**token))
            .copied();
        match hit {
            Some(token) => {
                out.push_str(match token {
                    "{title}" => ctx.title,
                    "{author}" => ctx.author,
                    "{id}" => id.as_str(),
                    _ => page.as_str(),
                });
                rest = &tail[token.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
