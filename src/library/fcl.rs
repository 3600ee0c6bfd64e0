//! Reading and writing library files.
//!
//! A library file starts with a `[FIDOLIB name]` header. `{name}` lines open
//! a category, `[KEY long name]` lines open a macro and every other line is
//! appended to the body of the current macro.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::macro_desc::{MacroDesc, create_macro_key};
use super::symbol_library::Library;
use crate::constants::{LIBRARY_EXTENSION, STANDARD_LIBRARY_STEM};

/// Errors raised while reading a library file.
#[derive(Debug, Error)]
pub enum FclError {
    #[error("line {line}: category not terminated with '}}'")]
    UnterminatedCategory { line: usize },
    #[error("line {line}: macro name not terminated with ']'")]
    UnterminatedMacro { line: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

const LIBRARY_HEADER: &str = "FIDOLIB";

/// Key prefix used for the macros of a library file: its stem, except for
/// the original standard library which has none.
pub fn key_prefix(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    if stem == STANDARD_LIBRARY_STEM {
        String::new()
    } else {
        stem.to_string()
    }
}

/// Path of the file holding the library with the given file stem.
pub fn library_path(dir: &Path, filename: &str) -> PathBuf {
    dir.join(format!("{}.{}", filename.trim(), LIBRARY_EXTENSION))
}

/// Parse the text of a library file whose keys get `prefix`.
pub fn parse_library(text: &str, prefix: &str) -> Result<Vec<MacroDesc>, FclError> {
    let mut macros: Vec<MacroDesc> = Vec::new();
    let mut current: Option<usize> = None;
    let mut category = String::new();
    let mut library = prefix.to_string();

    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.chars().count() <= 1 {
            continue;
        }

        if let Some(rest) = line.strip_prefix('{') {
            let (name, _) = rest
                .split_once('}')
                .ok_or(FclError::UnterminatedCategory { line: number + 1 })?;
            category = name.trim().to_string();
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let (header, _) = rest
                .split_once(']')
                .ok_or(FclError::UnterminatedMacro { line: number + 1 })?;
            let (key, long_name) = header.split_once(' ').unwrap_or((header, ""));
            let key = key.trim();

            if key == LIBRARY_HEADER {
                library = long_name.trim().to_string();
                current = None;
                continue;
            }

            let key = if prefix.is_empty() {
                key.to_lowercase()
            } else {
                create_macro_key(prefix, key)
            };
            let desc = MacroDesc::new(
                key.clone(),
                long_name.trim(),
                "",
                category.clone(),
                library.clone(),
                prefix,
            );

            // A repeated key replaces the earlier definition.
            match macros.iter().position(|m| m.key == key) {
                Some(index) => {
                    macros[index] = desc;
                    current = Some(index);
                }
                None => {
                    macros.push(desc);
                    current = Some(macros.len() - 1);
                }
            }
            continue;
        }

        if let Some(index) = current {
            let body = &mut macros[index].description;
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str(line);
        }
    }

    Ok(macros)
}

/// Read one library file.
pub fn read_library_file(path: &Path) -> Result<Vec<MacroDesc>, FclError> {
    let text = std::fs::read_to_string(path)?;
    parse_library(&text, &key_prefix(path))
}

/// Library files found directly inside `dir`, sorted by name.
pub fn library_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_library_file(path))
        .collect();
    files.sort();
    Ok(files)
}

fn is_library_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(LIBRARY_EXTENSION))
        .unwrap_or(false)
}

/// Load every library file of a directory.
///
/// Files that can't be read are skipped with a warning, and a missing
/// directory yields no macro at all.
pub fn load_library_directory(dir: &Path) -> Vec<MacroDesc> {
    let files = match library_files(dir) {
        Ok(files) => files,
        Err(e) => {
            warn!("Library directory {:?} is not usable: {}", dir, e);
            return Vec::new();
        }
    };

    let mut macros: Vec<MacroDesc> = Vec::new();
    for file in &files {
        match read_library_file(file) {
            Ok(read) => {
                debug!("Read {} macros from {:?}", read.len(), file);
                for desc in read {
                    match macros.iter().position(|m| m.key == desc.key) {
                        Some(index) => macros[index] = desc,
                        None => macros.push(desc),
                    }
                }
            }
            Err(e) => warn!("Problems reading library {:?}: {}", file, e),
        }
    }

    info!(
        "Loaded {} macros from {} library file(s) in {:?}",
        macros.len(),
        files.len(),
        dir
    );
    macros
}

/// Text of a library file describing `library`.
pub fn library_text(library: &Library) -> String {
    let mut text = format!("[{} {}]\n", LIBRARY_HEADER, library.name().trim());

    for category in library.all_categories() {
        text.push_str(&format!("{{{}}}\n", category.name()));
        for desc in category.all_macros() {
            // The prefix is the file name, so only the plain key is written.
            text.push_str(&format!(
                "[{} {}]\n",
                desc.plain_key().trim().to_uppercase(),
                desc.name.trim()
            ));
            text.push_str(&desc.description);
            text.push('\n');
        }
    }
    text
}

/// Write `library` into its file inside `dir`.
pub fn write_library(dir: &Path, library: &Library) -> std::io::Result<PathBuf> {
    let path = library_path(dir, library.filename());
    std::fs::write(&path, library_text(library))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::model::LibraryModel;

    const SAMPLE: &str = "[FIDOLIB My symbols]\n\
                          {Passive}\n\
                          [R01 Resistor]\n\
                          LI 0 0 10 0 0\n\
                          LI 10 0 20 0 0\n\
                          [C01 Capacitor]\n\
                          LI 0 0 5 0 0\n\
                          {Active}\n\
                          [Q01 Transistor]\n\
                          EV 0 0 10 10 0\n";

    #[test]
    fn test_parse_library_with_prefix() {
        let macros = parse_library(SAMPLE, "mysym").unwrap();
        assert_eq!(macros.len(), 3);

        assert_eq!(macros[0].key, "mysym.r01");
        assert_eq!(macros[0].name, "Resistor");
        assert_eq!(macros[0].category, "Passive");
        assert_eq!(macros[0].library, "My symbols");
        assert_eq!(macros[0].filename, "mysym");
        assert_eq!(macros[0].description, "LI 0 0 10 0 0\nLI 10 0 20 0 0");

        assert_eq!(macros[2].key, "mysym.q01");
        assert_eq!(macros[2].category, "Active");
    }

    fn written(text: &str) -> String {
        let model = LibraryModel::from_macros("/libs", parse_library(text, "mysym").unwrap());
        library_text(&model.all_libraries()[0])
    }

    #[test]
    fn test_written_library_reads_back_the_same() {
        let macros = parse_library(SAMPLE, "mysym").unwrap();
        let reread = parse_library(&written(SAMPLE), "mysym").unwrap();
        assert_eq!(reread, macros);
    }

    #[test]
    fn test_dotted_plain_key_is_written_whole() {
        let text = "[FIDOLIB Mine]\n{Cat}\n[R.01 Dotted]\nLI 0 0 1 1 0\n";
        let macros = parse_library(text, "mysym").unwrap();
        assert_eq!(macros[0].key, "mysym.r.01");

        let out = written(text);
        assert!(out.contains("[R.01 Dotted]\n"));
        assert_eq!(parse_library(&out, "mysym").unwrap(), macros);
    }

    #[test]
    fn test_parse_standard_library_has_no_prefix() {
        let macros = parse_library(SAMPLE, "").unwrap();
        assert_eq!(macros[0].key, "r01");
    }

    #[test]
    fn test_parse_unterminated_category() {
        let err = parse_library("[FIDOLIB x]\n{Broken\n", "x").unwrap_err();
        assert!(matches!(err, FclError::UnterminatedCategory { line: 2 }));
    }

    #[test]
    fn test_parse_unterminated_macro() {
        let err = parse_library("[FIDOLIB x]\n{Cat}\n[R01 Resistor\n", "x").unwrap_err();
        assert!(matches!(err, FclError::UnterminatedMacro { line: 3 }));
    }

    #[test]
    fn test_key_prefix() {
        assert_eq!(key_prefix(Path::new("/libs/mysym.fcl")), "mysym");
        assert_eq!(key_prefix(Path::new("/libs/FCDstdlib.fcl")), "");
    }

    #[test]
    fn test_load_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let macros = load_library_directory(&dir.path().join("missing"));
        assert!(macros.is_empty());
    }

    #[test]
    fn test_load_directory_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mysym.fcl"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "[R99 Ignored]\n").unwrap();
        std::fs::write(dir.path().join("broken.FCL"), "{Broken\n").unwrap();

        let macros = load_library_directory(dir.path());
        assert_eq!(macros.len(), 3);
        assert!(macros.iter().all(|m| m.filename == "mysym"));
    }
}
