//! Lexical path handling for Windows-style strings.
//!
//! Whitelist patterns and protected roots are compared as strings, not
//! filesystem objects: entries may name paths that do not exist on the
//! machine running the tests, and matching must not touch the disk. The
//! normal form uses forward slashes, resolves `.` and `..` without I/O,
//! and keeps the original character case; comparisons lowercase both
//! sides because NTFS is case-insensitive.

/// Windows device names that shadow real files in every directory.
/// Ordinary delete calls cannot remove them, so they are refused early.
const RESERVED_NAMES: [&str; 22] = [
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Normalizes a Windows or Unix style path string without touching the
/// filesystem.
///
/// Backslashes become forward slashes, repeated separators collapse,
/// `.` components drop, and `..` unwinds lexically, clamped at the root.
/// A drive root keeps its trailing slash (`C:/`); other results carry
/// none. An empty or fully-consumed input normalizes to `.`.
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let (root, rest) = split_root(&unified);

    let mut parts: Vec<&str> = Vec::new();
    for comp in rest.split('/') {
        match comp {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if root.is_empty() => parts.push(".."),
                // Rooted paths cannot climb above the root.
                _ => {}
            },
            comp => parts.push(comp),
        }
    }

    if root.is_empty() && parts.is_empty() {
        return ".".to_string();
    }
    let mut out = root;
    out.push_str(&parts.join("/"));
    out
}

/// Lowercased normal form used for case-insensitive comparison.
pub fn comparable(path: &str) -> String {
    normalize(path).to_lowercase()
}

/// True when `child` equals `parent` or sits anywhere beneath it.
///
/// Both arguments must already be in comparable form. Sibling prefixes
/// do not count: `c:/keep2` is not under `c:/keep`.
pub fn is_same_or_under(child: &str, parent: &str) -> bool {
    if child == parent {
        return true;
    }
    if parent.ends_with('/') {
        return child.starts_with(parent);
    }
    child.len() > parent.len()
        && child.starts_with(parent)
        && child.as_bytes()[parent.len()] == b'/'
}

/// True for `X:` drive-letter paths.
pub fn is_drive_rooted(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// True for paths that name nothing below a root: ``, `/`, `C:`, `C:/`.
pub fn is_bare_root(path: &str) -> bool {
    if path.is_empty() || path == "/" {
        return true;
    }
    let bytes = path.as_bytes();
    if bytes.len() < 2 || !bytes[0].is_ascii_alphabetic() || bytes[1] != b':' {
        return false;
    }
    match bytes.len() {
        2 => true,
        3 => bytes[2] == b'/' || bytes[2] == b'\\',
        _ => false,
    }
}

/// Number of path components after the root, on the normalized form.
/// `C:\Users` has one, `%TEMP%\cache\*` has three.
pub fn segment_count(path: &str) -> usize {
    let normalized = normalize(path);
    let (_, rest) = split_root(&normalized);
    if rest == "." {
        return 0;
    }
    rest.split('/').filter(|c| !c.is_empty()).count()
}

/// True when the string contains glob metacharacters.
pub fn has_glob_chars(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// True when the final component is a reserved device name, ignoring
/// case and extension (`NUL.txt` still refers to the NUL device).
pub fn is_reserved_device(path: &str) -> bool {
    let normalized = normalize(path);
    let name = normalized.rsplit('/').next().unwrap_or("");
    let stem = name.split('.').next().unwrap_or("");
    if stem.is_empty() {
        return false;
    }
    let lower = stem.to_ascii_lowercase();
    RESERVED_NAMES.iter().any(|r| *r == lower)
}

fn split_root(path: &str) -> (String, &str) {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        let rest = path[2..].trim_start_matches('/');
        return (format!("{}/", &path[..2]), rest);
    }
    if let Some(stripped) = path.strip_prefix('/') {
        return ("/".to_string(), stripped.trim_start_matches('/'));
    }
    (String::new(), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_mixed_slashes() {
        assert_eq!(normalize("C:/Users\\dave\\file.txt"), "C:/Users/dave/file.txt");
        assert_eq!(normalize("C:\\\\Users//dave"), "C:/Users/dave");
    }

    #[test]
    fn test_normalize_dots() {
        assert_eq!(normalize("C:\\Users\\.\\dave\\..\\other"), "C:/Users/other");
        assert_eq!(normalize("C:\\..\\..\\Users"), "C:/Users");
        assert_eq!(normalize("a/../b"), "b");
        assert_eq!(normalize("../a"), "../a");
    }

    #[test]
    fn test_normalize_roots() {
        assert_eq!(normalize("C:\\"), "C:/");
        assert_eq!(normalize("C:"), "C:/");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), ".");
        assert_eq!(normalize("C:\\Users\\"), "C:/Users");
    }

    #[test]
    fn test_comparable_lowercases() {
        assert_eq!(comparable("C:\\USERS\\Dave"), "c:/users/dave");
    }

    #[test]
    fn test_same_or_under() {
        assert!(is_same_or_under("c:/users/dave", "c:/users/dave"));
        assert!(is_same_or_under("c:/users/dave/x", "c:/users/dave"));
        assert!(is_same_or_under("c:/users", "c:/"));
        assert!(!is_same_or_under("c:/users2", "c:/users"));
        assert!(!is_same_or_under("c:/users", "c:/users/dave"));
    }

    #[test]
    fn test_is_drive_rooted() {
        assert!(is_drive_rooted("C:\\Users"));
        assert!(is_drive_rooted("d:/data"));
        assert!(!is_drive_rooted("/home/dave"));
        assert!(!is_drive_rooted("%TEMP%\\x"));
    }

    #[test]
    fn test_is_bare_root() {
        for root in ["", "/", "C:", "C:/", "C:\\", "d:"] {
            assert!(is_bare_root(root), "{root:?} should be a bare root");
        }
        for not_root in ["C:/Users", "/var", "relative", "%TEMP%"] {
            assert!(!is_bare_root(not_root), "{not_root:?} is not a bare root");
        }
    }

    #[test]
    fn test_segment_count() {
        assert_eq!(segment_count("C:\\Users"), 1);
        assert_eq!(segment_count("C:\\Users\\dave"), 2);
        assert_eq!(segment_count("%TEMP%\\cache\\*"), 3);
        assert_eq!(segment_count("C:\\"), 0);
        assert_eq!(segment_count(""), 0);
    }

    #[test]
    fn test_has_glob_chars() {
        assert!(has_glob_chars("C:\\x\\*"));
        assert!(has_glob_chars("file?.txt"));
        assert!(has_glob_chars("[ab]"));
        assert!(!has_glob_chars("C:\\plain\\path"));
    }

    #[test]
    fn test_reserved_devices() {
        assert!(is_reserved_device("C:\\project\\nul"));
        assert!(is_reserved_device("C:\\project\\NUL.txt"));
        assert!(is_reserved_device("con"));
        assert!(is_reserved_device("D:\\logs\\COM7"));
        assert!(!is_reserved_device("C:\\project\\null"));
        assert!(!is_reserved_device("C:\\project\\console.log"));
        assert!(!is_reserved_device("C:\\"));
    }
}
