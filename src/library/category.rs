use super::macro_desc::MacroDesc;
use super::model::LibraryHandle;

/// A named group of macros inside a library.
///
/// The owning library is referenced through a [`LibraryHandle`], which the
/// [`LibraryModel`](super::LibraryModel) refuses once the tree it was taken
/// from has been rebuilt.
#[derive(Debug, Clone)]
pub struct Category {
    name: String,
    parent: LibraryHandle,
    hidden: bool,
    macros: Vec<MacroDesc>,
}

impl Category {
    pub(crate) fn new(name: impl Into<String>, parent: LibraryHandle, hidden: bool) -> Self {
        Self {
            name: name.into(),
            parent,
            hidden,
            macros: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Handle of the library holding this category
    pub fn parent_library(&self) -> LibraryHandle {
        self.parent
    }

    pub(crate) fn set_parent_library(&mut self, parent: LibraryHandle) {
        self.parent = parent;
    }

    /// Hidden categories are not shown in the symbol browser
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Macros in display order
    pub fn all_macros(&self) -> &[MacroDesc] {
        &self.macros
    }

    pub(crate) fn macros_mut(&mut self) -> &mut Vec<MacroDesc> {
        &mut self.macros
    }

    pub(crate) fn add_macro(&mut self, macro_desc: MacroDesc) {
        self.macros.push(macro_desc);
    }

    pub(crate) fn remove_macro(&mut self, key: &str) -> Option<MacroDesc> {
        let index = self.macros.iter().position(|m| m.key == key)?;
        Some(self.macros.remove(index))
    }

    /// Whether a macro with the given plain key is in this category.
    /// No key at all always matches.
    pub fn contains_macro_key(&self, key: Option<&str>) -> bool {
        let Some(key) = key else {
            return true;
        };
        self.macros.iter().any(|m| m.plain_key() == key)
    }
}
