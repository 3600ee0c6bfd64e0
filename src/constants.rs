//! Centralized constants used across the crate.
//!
//! This module contains magic numbers and names that are used in multiple
//! places or would benefit from being named constants.

/// Default number of drawing states retained by the undo history
pub const DEFAULT_UNDO_LEVELS: usize = 100;

/// Maximum number of recent library directories to remember in config
pub const MAX_RECENT_LIBRARIES: usize = 5;

/// File extension of symbol library files (without the dot)
pub const LIBRARY_EXTENSION: &str = "fcl";

/// File stem of the original standard library. Its macros carry no key prefix.
pub const STANDARD_LIBRARY_STEM: &str = "FCDstdlib";

/// Key prefixes of the libraries shipped with the editor. They can't be edited.
pub const STANDARD_LIBRARY_PREFIXES: [&str; 4] = ["pcb", "ihram", "elettrotecnica", "ey_libraries"];

/// Name of the category that is not shown in the symbol browser
pub const HIDDEN_CATEGORY: &str = "hidden";

/// Prefix of the temporary directories holding library snapshots
pub const SNAPSHOT_DIR_PREFIX: &str = "schematic_undo_";

/// How many random keys are tried before giving up on a macro copy
pub const KEY_GENERATION_ATTEMPTS: usize = 20;
