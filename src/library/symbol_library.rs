use std::fmt;

use super::category::Category;

/// A symbol library loaded from one file.
#[derive(Debug, Clone)]
pub struct Library {
    name: String,
    filename: String,
    is_std: bool,
    categories: Vec<Category>,
}

impl Library {
    pub(crate) fn new(name: impl Into<String>, filename: impl Into<String>, is_std: bool) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            is_std,
            categories: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// File stem of the library, also the key prefix of its macros
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Standard libraries ship with the editor and are read-only
    pub fn is_std_lib(&self) -> bool {
        self.is_std
    }

    /// Categories in display order
    pub fn all_categories(&self) -> &[Category] {
        &self.categories
    }

    pub(crate) fn categories_mut(&mut self) -> &mut Vec<Category> {
        &mut self.categories
    }

    /// Look a category up by name.
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name() == name)
    }

    pub(crate) fn category_index(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name() == name)
    }

    pub(crate) fn add_category(&mut self, category: Category) -> usize {
        self.categories.push(category);
        self.categories.len() - 1
    }

    /// Whether any category holds a macro with the given plain key.
    /// No key at all always matches.
    pub fn contains_macro_key(&self, key: Option<&str>) -> bool {
        if key.is_none() {
            return true;
        }
        self.categories.iter().any(|c| c.contains_macro_key(key))
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
