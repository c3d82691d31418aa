use std::path::Path;

/// Write a file atomically: write to a `.tmp` sibling, then rename over the
/// target. Readers never observe a half-written collection file.
pub fn atomic_write_str(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)
}

/// Opaque unique record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Percent-encode a `mailto:` component (RFC 3986 unreserved set passes
/// through, everything else is `%XX`-escaped, spaces included).
pub fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_write_replaces_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.json");
        atomic_write_str(&path, "[1]").unwrap();
        atomic_write_str(&path, "[1,2]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1,2]");
        // No stray temp file left behind.
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("a b@c.com"), "a%20b%40c.com");
        assert_eq!(percent_encode("plain-text_1.~"), "plain-text_1.~");
        assert_eq!(percent_encode("line\nbreak"), "line%0Abreak");
    }
}
