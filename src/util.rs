use std::path::PathBuf;

/// Expands a leading `~` in a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") || path.starts_with("~\\") {
        if let Some(home) = dirs::home_dir() {
            let rest = &path[1..];
            let rest = rest.trim_start_matches(['/', '\\']);
            return if rest.is_empty() { home } else { home.join(rest) };
        }
    }
    PathBuf::from(path)
}

/// Makes an instance name usable as a single path component.
///
/// Characters that are illegal on Windows or act as separators become `_`,
/// and names that would escape the parent directory are replaced outright.
/// A leading `$` becomes `_` so directory names never collide with Rojo's
/// `$className`/`$path` keys in the project file.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .enumerate()
        .map(|(i, c)| match c {
            '$' if i == 0 => '_',
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/tmp/place"), PathBuf::from("/tmp/place"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~"), home);
            assert_eq!(expand_tilde("~/Roblox/game"), home.join("Roblox/game"));
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("MainScript"), "MainScript");
        assert_eq!(sanitize_file_name("Gun Handler"), "Gun Handler");
        assert_eq!(sanitize_file_name("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_file_name("what?"), "what_");
        assert_eq!(sanitize_file_name(".."), "_");
        assert_eq!(sanitize_file_name(""), "_");
    }

    #[test]
    fn test_leading_dollar_is_replaced() {
        assert_eq!(sanitize_file_name("$className"), "_className");
        assert_eq!(sanitize_file_name("$path"), "_path");
        assert_eq!(sanitize_file_name("Cost$"), "Cost$");
    }
}
