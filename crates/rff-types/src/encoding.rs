//! Input text encodings detectable from a byte-order mark.

use std::fmt;

/// The encoding detected at the head of the input, if any.
///
/// Only BOM-marked encodings are detectable; a plain UTF-8 or ASCII file
/// carries no marker and yields no detection. Whenever an encoding was
/// detected, the parsed cell contents have been re-encoded to UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEncoding {
    /// UTF-8 with a leading `EF BB BF` byte-order mark.
    Utf8Bom,
    /// UTF-16 little-endian (`FF FE`).
    Utf16Le,
    /// UTF-16 big-endian (`FE FF`).
    Utf16Be,
}

impl fmt::Display for FileEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Utf8Bom => "UTF-8 (BOM)",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names() {
        assert_eq!(FileEncoding::Utf8Bom.to_string(), "UTF-8 (BOM)");
        assert_eq!(FileEncoding::Utf16Le.to_string(), "UTF-16LE");
        assert_eq!(FileEncoding::Utf16Be.to_string(), "UTF-16BE");
    }
}
