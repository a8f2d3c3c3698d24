//! Filename sanitization.

const ILLEGAL: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replaces `\ / : * ? " < > |` and control characters with `_`.
///
/// Nothing else is altered, so ids and page numbers in the name survive verbatim.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if ILLEGAL.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_each_illegal_char() {
        assert_eq!(sanitize_filename(r#"a\b/c:d*e?f"g<h>i|j"#), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn control_chars() {
        assert_eq!(sanitize_filename("file\x00name\n"), "file_name_");
    }

    #[test]
    fn keeps_unicode_and_spaces() {
        assert_eq!(sanitize_filename("夏の空 - 1"), "夏の空 - 1");
    }

    #[test]
    fn consecutive_chars_not_collapsed() {
        assert_eq!(sanitize_filename("::"), "__");
    }
}
