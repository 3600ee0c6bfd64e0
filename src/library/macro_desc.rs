//! Macro descriptors and the keys that identify them.

use std::fmt;

use crate::constants::STANDARD_LIBRARY_PREFIXES;

/// A symbol stored in a library.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MacroDesc {
    /// Full key, `prefix.plain` in lowercase. Macros of the original
    /// standard library have no prefix.
    pub key: String,
    /// Name shown to the user
    pub name: String,
    /// Drawing commands making up the macro
    pub description: String,
    /// Category the macro is filed under
    pub category: String,
    /// Display name of the library
    pub library: String,
    /// Library file stem, also used as key prefix
    pub filename: String,
}

impl MacroDesc {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        library: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            category: category.into(),
            library: library.into(),
            filename: filename.into(),
        }
    }

    /// Key without the library prefix
    pub fn plain_key(&self) -> &str {
        plain_macro_key(&self.key)
    }
}

impl fmt::Display for MacroDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.trim())
    }
}

/// Strip the library prefix from a full key.
///
/// `"pcb.r01"` gives `"r01"`, a key without a dot is returned as is. Only
/// the first dot separates the prefix: `"pcb.r.01"` gives `"r.01"`.
pub fn plain_macro_key(key: &str) -> &str {
    key.split_once('.').map_or(key, |(_, plain)| plain)
}

/// Build the full key of a macro from the library file stem and a plain key.
pub fn create_macro_key(filename: &str, plain_key: &str) -> String {
    format!("{}.{}", filename, plain_key).to_lowercase()
}

/// A fresh plain key derived from the clock.
pub fn create_random_macro_key() -> String {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .unsigned_abs();

    // Fold the timestamp bytes together, dropping an increasing number of
    // low bytes at every round.
    let mut t = nanos;
    let mut h: u64 = 0;
    let mut round: u32 = 0;
    while t > 0 {
        t = t.checked_shr(round * 8).unwrap_or(0);
        h ^= t & 0xFF;
        round += 1;
    }
    // Mix in the sub-second part so that keys created in a burst still differ.
    h ^= (nanos % 1_000_000) << 8;
    h.to_string()
}

/// Whether the macro belongs to a library shipped with the editor.
pub fn is_std_lib(macro_desc: &MacroDesc) -> bool {
    match macro_desc.key.split_once('.') {
        None => true,
        Some((prefix, _)) => STANDARD_LIBRARY_PREFIXES.contains(&prefix),
    }
}

/// Whether `name` can be used as a library name. The name also ends up as a
/// file name, so path separators and characters used by the file format are
/// refused.
pub fn is_valid_library_name(name: &str) -> bool {
    const FORBIDDEN: [char; 10] = ['[', '.', '/', '\\', '~', '&', ',', ';', ']', '"'];
    is_valid_node_name(name) && !name.contains(FORBIDDEN)
}

/// Whether `name` can be written as a category or macro name. Brackets,
/// braces and control characters would end the header line early.
pub fn is_valid_node_name(name: &str) -> bool {
    const FORBIDDEN: [char; 4] = ['[', ']', '{', '}'];
    !name.trim().is_empty() && !name.contains(FORBIDDEN) && !name.contains(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_macro_key() {
        assert_eq!(plain_macro_key("pcb.r01"), "r01");
        assert_eq!(plain_macro_key("r01"), "r01");
        assert_eq!(plain_macro_key("a.b.c"), "b.c");
    }

    #[test]
    fn test_create_macro_key_lowercases() {
        assert_eq!(create_macro_key("MyLib", "ABC"), "mylib.abc");
    }

    #[test]
    fn test_random_key_is_numeric() {
        let key = create_random_macro_key();
        assert!(!key.is_empty());
        assert!(key.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_is_std_lib() {
        let mut desc = MacroDesc::new("000", "R", "", "Passive", "Standard", "");
        assert!(is_std_lib(&desc));
        desc.key = "pcb.r01".to_string();
        assert!(is_std_lib(&desc));
        desc.key = "ey_libraries.x".to_string();
        assert!(is_std_lib(&desc));
        desc.key = "mylib.r01".to_string();
        assert!(!is_std_lib(&desc));
    }

    #[test]
    fn test_is_valid_library_name() {
        assert!(is_valid_library_name("my_symbols"));
        assert!(!is_valid_library_name("my.symbols"));
        assert!(!is_valid_library_name("../escape"));
        assert!(!is_valid_library_name("   "));
        assert!(!is_valid_library_name("mine\n[ZZ x]"));
    }

    #[test]
    fn test_is_valid_node_name() {
        assert!(is_valid_node_name("Big resistor, 1/4 W"));
        assert!(!is_valid_node_name("Res]istor"));
        assert!(!is_valid_node_name("[Res"));
        assert!(!is_valid_node_name("{Passive}"));
        assert!(!is_valid_node_name("Res\n[ZZ Injected]"));
        assert!(!is_valid_node_name("tab\there"));
        assert!(!is_valid_node_name(" "));
    }
}
