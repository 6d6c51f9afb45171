//! File-name validation shared by the association tag and save targets.
//!
//! The set of forbidden characters is fixed per OS:
//!
//! | OS      | Forbidden                                   |
//! |---------|---------------------------------------------|
//! | Windows | `< > : " / \ | ? *` and control chars 0–31  |
//! | others  | `/` and NUL                                 |

/// Returns `true` if `c` may not appear in a file name on this OS.
pub fn is_forbidden_file_name_char(c: char) -> bool {
    #[cfg(target_os = "windows")]
    {
        matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || (c as u32) < 32
    }

    #[cfg(not(target_os = "windows"))]
    {
        c == '/' || c == '\0'
    }
}

/// Returns `true` if `name` contains any character forbidden in file names.
pub fn has_forbidden_chars(name: &str) -> bool {
    name.chars().any(is_forbidden_file_name_char)
}

/// Returns `true` if `text` is empty or consists only of whitespace.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name_has_no_forbidden_chars() {
        assert!(!has_forbidden_chars("settings"));
        assert!(!has_forbidden_chars("my settings.v2"));
    }

    #[test]
    fn test_slash_is_forbidden_everywhere() {
        assert!(has_forbidden_chars("a/b"));
    }

    #[test]
    fn test_nul_is_forbidden_everywhere() {
        assert!(has_forbidden_chars("a\0b"));
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn test_windows_reserved_chars_are_forbidden() {
        for c in ['<', '>', ':', '"', '\\', '|', '?', '*', '\t'] {
            assert!(is_forbidden_file_name_char(c), "{c:?} must be forbidden");
        }
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("  \t"));
        assert!(!is_blank(" a "));
    }
}
