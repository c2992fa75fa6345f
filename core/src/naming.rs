//! Flag spelling for declared field identifiers.
//!
//! Identifiers are split into words at every lowercase→uppercase transition,
//! lowercased, joined with `-` and prefixed with [`FLAG_PREFIX`]. Identifiers
//! are read as camelCase whatever their style, so other characters (such as
//! `_`) are kept as written:
//!
//! ```
//! use argbind_core::to_flag_name;
//!
//! assert_eq!(to_flag_name("inputPath"), "--input-path");
//! assert_eq!(to_flag_name("outputFilePattern"), "--output-file-pattern");
//! assert_eq!(to_flag_name("input_path"), "--input_path");
//! ```

/// Prefix carried by every flag token.
pub const FLAG_PREFIX: &str = "--";

/// Converts a declared identifier into its external `--kebab-case` flag.
///
/// Pure and total; the tokenizer, the record binder and the usage renderer
/// all go through this function.
pub fn to_flag_name(identifier: &str) -> String {
    let mut flag = String::with_capacity(FLAG_PREFIX.len() + identifier.len() + 4);
    flag.push_str(FLAG_PREFIX);

    let mut prev_lower = false;
    for ch in identifier.chars() {
        if prev_lower && ch.is_uppercase() {
            flag.push('-');
        }
        flag.extend(ch.to_lowercase());
        prev_lower = ch.is_lowercase();
    }

    flag
}

/// Whether `token` is spelled as a flag.
pub fn is_flag(token: &str) -> bool {
    token.starts_with(FLAG_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case() {
        assert_eq!(to_flag_name("input"), "--input");
        assert_eq!(to_flag_name("inputPath"), "--input-path");
        assert_eq!(to_flag_name("outputFilePattern"), "--output-file-pattern");
    }

    #[test]
    fn test_uppercase_runs_stay_together() {
        // Only lowercase→uppercase starts a new word.
        assert_eq!(to_flag_name("URL"), "--url");
        assert_eq!(to_flag_name("baseURL"), "--base-url");
        assert_eq!(to_flag_name("Input"), "--input");
        assert_eq!(to_flag_name("file2Name"), "--file2name");
    }

    #[test]
    fn test_underscores_are_kept() {
        assert_eq!(to_flag_name("input_path"), "--input_path");
        assert_eq!(to_flag_name("_private"), "--_private");
        assert_eq!(to_flag_name("trailing_"), "--trailing_");
        assert_eq!(to_flag_name("max_retryCount"), "--max_retry-count");
        assert_ne!(to_flag_name("input_path"), to_flag_name("inputPath"));
    }

    #[test]
    fn test_is_flag() {
        assert!(is_flag("--input"));
        assert!(is_flag("--"));
        assert!(!is_flag("-i"));
        assert!(!is_flag("value"));
    }
}
