//! In-memory index of the installed symbol libraries.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::category::Category;
use super::error::{LibraryError, Result};
use super::events::{LibraryEvent, LibraryListener, LibraryNode, dispatch};
use super::fcl;
use super::macro_desc::{
    MacroDesc, create_macro_key, create_random_macro_key, is_std_lib, is_valid_library_name,
    is_valid_node_name,
};
use super::snapshot::{SnapshotStore, capture_library_snapshot};
use super::symbol_library::Library;
use crate::constants::{HIDDEN_CATEGORY, KEY_GENERATION_ATTEMPTS};
use crate::history::UndoActor;

/// Reference to a library of a [`LibraryModel`].
///
/// Handles carry the generation of the tree they were taken from. Every
/// rebuild or structural change of the tree starts a new generation, and
/// handles from older ones are refused with [`LibraryError::StaleHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LibraryHandle {
    generation: u64,
    index: usize,
}

/// Reference to a category of a [`LibraryModel`]. See [`LibraryHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CategoryHandle {
    generation: u64,
    library: usize,
    index: usize,
}

impl CategoryHandle {
    /// Handle of the library holding the category
    pub fn library(&self) -> LibraryHandle {
        LibraryHandle {
            generation: self.generation,
            index: self.library,
        }
    }
}

/// Token returned by [`LibraryModel::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(usize);

/// All libraries found in the library directory, grouped into categories.
///
/// The tree is owned here; callers keep handles, never references, across
/// calls that change it.
pub struct LibraryModel {
    library_dir: PathBuf,
    libraries: Vec<Library>,
    generation: u64,
    listeners: Vec<(ListenerId, Box<dyn LibraryListener>)>,
    next_listener: usize,
}

impl fmt::Debug for LibraryModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryModel")
            .field("library_dir", &self.library_dir)
            .field("libraries", &self.libraries)
            .field("generation", &self.generation)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl LibraryModel {
    /// Load every library file of `library_dir`.
    pub fn load(library_dir: impl Into<PathBuf>) -> Self {
        let library_dir = library_dir.into();
        let macros = fcl::load_library_directory(&library_dir);
        Self::from_macros(library_dir, macros)
    }

    /// Build the tree from macros that were already read.
    pub fn from_macros(library_dir: impl Into<PathBuf>, macros: Vec<MacroDesc>) -> Self {
        let mut model = Self {
            library_dir: library_dir.into(),
            libraries: Vec::new(),
            generation: 0,
            listeners: Vec::new(),
            next_listener: 0,
        };
        model.rebuild(macros);
        model
    }

    /// Directory the libraries are read from and written to
    pub fn library_dir(&self) -> &Path {
        &self.library_dir
    }

    /// Point the model at another directory and reload.
    pub fn set_library_dir(&mut self, library_dir: impl Into<PathBuf>) {
        self.library_dir = library_dir.into();
        self.force_update();
    }

    /// Current generation of the tree
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn add_listener(&mut self, listener: Box<dyn LibraryListener>) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(other, _)| *other != id);
        before != self.listeners.len()
    }

    /// Discard the whole tree and read it again from disk.
    ///
    /// Every handle taken before this call becomes stale.
    pub fn force_update(&mut self) {
        let macros = fcl::load_library_directory(&self.library_dir);
        self.rebuild(macros);
        info!(
            "Library model rebuilt: {} libraries (generation {})",
            self.libraries.len(),
            self.generation
        );
        self.fire(LibraryEvent::Loaded);
    }

    fn rebuild(&mut self, macros: Vec<MacroDesc>) {
        self.generation += 1;
        self.libraries.clear();

        for mut desc in macros {
            desc.name = desc.name.trim().to_string();

            let library_index = match self
                .libraries
                .iter()
                .position(|l| l.filename() == desc.filename && l.name() == desc.library)
            {
                Some(index) => index,
                None => {
                    self.libraries.push(Library::new(
                        desc.library.clone(),
                        desc.filename.clone(),
                        is_std_lib(&desc),
                    ));
                    self.libraries.len() - 1
                }
            };

            let handle = LibraryHandle {
                generation: self.generation,
                index: library_index,
            };
            let library = &mut self.libraries[library_index];
            let category_index = match library.category_index(&desc.category) {
                Some(index) => index,
                None => {
                    let hidden = desc.category == HIDDEN_CATEGORY;
                    library.add_category(Category::new(desc.category.clone(), handle, hidden))
                }
            };
            library.categories_mut()[category_index].add_macro(desc);
        }
    }

    /// Start a new generation after libraries or categories moved around.
    fn relink(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        for (index, library) in self.libraries.iter_mut().enumerate() {
            for category in library.categories_mut() {
                category.set_parent_library(LibraryHandle { generation, index });
            }
        }
    }

    fn fire(&mut self, event: LibraryEvent) {
        for (_, listener) in &mut self.listeners {
            dispatch(listener.as_mut(), &event);
        }
    }

    // Lookups

    /// Libraries in display order
    pub fn all_libraries(&self) -> &[Library] {
        &self.libraries
    }

    /// Libraries along with their handles
    pub fn libraries(&self) -> impl Iterator<Item = (LibraryHandle, &Library)> {
        let generation = self.generation;
        self.libraries
            .iter()
            .enumerate()
            .map(move |(index, library)| (LibraryHandle { generation, index }, library))
    }

    /// Categories of every library, in display order
    pub fn all_categories(&self) -> impl Iterator<Item = &Category> {
        self.libraries.iter().flat_map(|l| l.all_categories())
    }

    /// Macros of every category, in display order
    pub fn iter_macros(&self) -> impl Iterator<Item = &MacroDesc> {
        self.all_categories().flat_map(|c| c.all_macros())
    }

    /// Every macro by full key
    pub fn all_macros(&self) -> BTreeMap<&str, &MacroDesc> {
        self.iter_macros().map(|m| (m.key.as_str(), m)).collect()
    }

    pub fn macro_by_key(&self, key: &str) -> Option<&MacroDesc> {
        self.iter_macros().find(|m| m.key == key)
    }

    /// Whether any macro has the given plain key. No key at all always
    /// matches. Keys are not required to be unique, this only reports
    /// whether one is in use.
    pub fn contains_macro_key(&self, key: Option<&str>) -> bool {
        if key.is_none() {
            return true;
        }
        self.libraries.iter().any(|l| l.contains_macro_key(key))
    }

    pub fn library_handle(&self, filename: &str) -> Option<LibraryHandle> {
        self.libraries()
            .find(|(_, library)| library.filename() == filename)
            .map(|(handle, _)| handle)
    }

    pub fn category_handle(&self, library: LibraryHandle, name: &str) -> Option<CategoryHandle> {
        let library_index = self.check_library(library).ok()?;
        let index = self.libraries[library_index].category_index(name)?;
        Some(CategoryHandle {
            generation: self.generation,
            library: library_index,
            index,
        })
    }

    pub fn library(&self, handle: LibraryHandle) -> Result<&Library> {
        let index = self.check_library(handle)?;
        Ok(&self.libraries[index])
    }

    pub fn category(&self, handle: CategoryHandle) -> Result<&Category> {
        let (library, index) = self.check_category(handle)?;
        Ok(&self.libraries[library].all_categories()[index])
    }

    /// Library owning `category`, refused if the category comes from an
    /// older generation.
    pub fn parent_library(&self, category: &Category) -> Result<&Library> {
        self.library(category.parent_library())
    }

    fn check_library(&self, handle: LibraryHandle) -> Result<usize> {
        if handle.generation != self.generation || handle.index >= self.libraries.len() {
            return Err(LibraryError::StaleHandle);
        }
        Ok(handle.index)
    }

    fn check_category(&self, handle: CategoryHandle) -> Result<(usize, usize)> {
        let library = self.check_library(handle.library())?;
        if handle.index >= self.libraries[library].all_categories().len() {
            return Err(LibraryError::StaleHandle);
        }
        Ok((library, handle.index))
    }

    /// Position of a macro as (library, category, macro) indices.
    fn locate_macro(&self, key: &str) -> Result<(usize, usize, usize)> {
        for (li, library) in self.libraries.iter().enumerate() {
            for (ci, category) in library.all_categories().iter().enumerate() {
                if let Some(mi) = category.all_macros().iter().position(|m| m.key == key) {
                    return Ok((li, ci, mi));
                }
            }
        }
        Err(LibraryError::MacroNotFound(key.to_string()))
    }

    fn library_node(&self, index: usize) -> LibraryNode {
        let library = &self.libraries[index];
        LibraryNode::Library {
            filename: library.filename().to_string(),
            name: library.name().to_string(),
        }
    }

    fn category_node(&self, library: usize, index: usize) -> LibraryNode {
        let library = &self.libraries[library];
        LibraryNode::Category {
            filename: library.filename().to_string(),
            name: library.all_categories()[index].name().to_string(),
        }
    }

    fn ensure_editable(&self, library: usize, what: &str) -> Result<()> {
        if self.libraries[library].is_std_lib() {
            return Err(LibraryError::IllegalLibraryAccess(format!(
                "{} in a standard library can't be modified",
                what
            )));
        }
        Ok(())
    }

    // Edits

    /// Remove a category and all its macros.
    pub fn remove_category(&mut self, handle: CategoryHandle) -> Result<()> {
        let (library, index) = self.check_category(handle)?;
        self.ensure_editable(library, "A category")?;

        let node = self.category_node(library, index);
        self.libraries[library].categories_mut().remove(index);
        self.relink();
        self.persist(library);

        let parent = Some(self.library_node(library));
        self.fire(LibraryEvent::Removed { parent, node });
        Ok(())
    }

    /// Remove a library and delete its file.
    pub fn remove_library(&mut self, handle: LibraryHandle) -> Result<()> {
        let index = self.check_library(handle)?;
        self.ensure_editable(index, "A library")?;

        let node = self.library_node(index);
        let removed = self.libraries.remove(index);
        self.relink();

        let path = fcl::library_path(&self.library_dir, removed.filename());
        match std::fs::remove_file(&path) {
            Ok(()) => debug!("Deleted library file {:?}", path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Library file not found: {:?}", path)
            }
            Err(e) => warn!("Failed to delete library file {:?}: {}", path, e),
        }

        self.fire(LibraryEvent::Removed { parent: None, node });
        Ok(())
    }

    /// Remove one macro.
    pub fn remove_macro(&mut self, key: &str) -> Result<()> {
        let (library, category, _) = self.locate_macro(key)?;
        self.ensure_editable(library, "A macro")?;

        self.libraries[library].categories_mut()[category].remove_macro(key);
        self.persist(library);

        let parent = Some(self.category_node(library, category));
        self.fire(LibraryEvent::Removed {
            parent,
            node: LibraryNode::Macro {
                key: key.to_string(),
            },
        });
        Ok(())
    }

    /// Change the name shown for a macro.
    pub fn rename_macro(&mut self, key: &str, new_name: &str) -> Result<()> {
        if new_name.trim().is_empty() {
            return Err(LibraryError::IllegalName("name length must not be zero".into()));
        }
        if !is_valid_node_name(new_name) {
            return Err(LibraryError::IllegalName(new_name.to_string()));
        }
        let (library, category, index) = self.locate_macro(key)?;
        self.ensure_editable(library, "A macro")?;

        let desc = &mut self.libraries[library].categories_mut()[category].macros_mut()[index];
        let old_name = std::mem::replace(&mut desc.name, new_name.trim().to_string());
        self.persist(library);

        let parent = Some(self.category_node(library, category));
        self.fire(LibraryEvent::Renamed {
            parent,
            node: LibraryNode::Macro {
                key: key.to_string(),
            },
            old_name,
        });
        Ok(())
    }

    /// Rename a category, updating its macros.
    pub fn rename_category(&mut self, handle: CategoryHandle, new_name: &str) -> Result<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(LibraryError::IllegalName("name length must not be zero".into()));
        }
        let (library, index) = self.check_category(handle)?;
        self.ensure_editable(library, "A category")?;
        if !is_valid_node_name(new_name) {
            return Err(LibraryError::IllegalName(new_name.to_string()));
        }

        let category = &mut self.libraries[library].categories_mut()[index];
        let old_name = category.name().to_string();
        category.set_name(new_name);
        self.synchronize_macros(library);
        self.persist(library);

        let parent = Some(self.library_node(library));
        let node = self.category_node(library, index);
        self.fire(LibraryEvent::Renamed {
            parent,
            node,
            old_name,
        });
        Ok(())
    }

    /// Rename a library. Its file keeps the same name.
    pub fn rename_library(&mut self, handle: LibraryHandle, new_name: &str) -> Result<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(LibraryError::IllegalName("name length must not be zero".into()));
        }
        let index = self.check_library(handle)?;
        self.ensure_editable(index, "A library")?;
        if !is_valid_library_name(new_name) {
            return Err(LibraryError::IllegalName(new_name.to_string()));
        }

        let old_name = self.libraries[index].name().to_string();
        self.libraries[index].set_name(new_name);
        self.synchronize_macros(index);
        self.persist(index);

        let node = self.library_node(index);
        self.fire(LibraryEvent::Renamed {
            parent: None,
            node,
            old_name,
        });
        Ok(())
    }

    /// Copy a macro into a category, under a new random key. Returns the
    /// full key of the copy.
    pub fn copy_macro(&mut self, key: &str, destination: CategoryHandle) -> Result<String> {
        let (dest_library, dest_category) = self.check_category(destination)?;
        self.ensure_editable(dest_library, "A category")?;
        let (li, ci, mi) = self.locate_macro(key)?;

        let mut copy = self.libraries[li].all_categories()[ci].all_macros()[mi].clone();
        let plain = self.unused_plain_key(dest_library, &[])?;
        copy.key = create_macro_key(self.libraries[dest_library].filename(), &plain);
        let new_key = copy.key.clone();

        self.libraries[dest_library].categories_mut()[dest_category].add_macro(copy);
        self.synchronize_macros(dest_library);
        self.persist(dest_library);

        let parent = Some(self.category_node(dest_library, dest_category));
        self.fire(LibraryEvent::Added {
            parent,
            node: LibraryNode::Macro {
                key: new_key.clone(),
            },
        });
        Ok(new_key)
    }

    /// Copy a category with all its macros into a library. Every macro copy
    /// gets a new random key.
    pub fn copy_category(
        &mut self,
        source: CategoryHandle,
        destination: LibraryHandle,
    ) -> Result<CategoryHandle> {
        let (source_library, source_index) = self.check_category(source)?;
        let dest_library = self.check_library(destination)?;
        self.ensure_editable(dest_library, "A category")?;

        let original = self.libraries[source_library].all_categories()[source_index].clone();
        let mut copy = Category::new(original.name(), destination, original.is_hidden());
        let mut taken: Vec<String> = Vec::new();
        for desc in original.all_macros() {
            let plain = self.unused_plain_key(dest_library, &taken)?;
            let mut desc = desc.clone();
            desc.key = create_macro_key(self.libraries[dest_library].filename(), &plain);
            taken.push(plain);
            copy.add_macro(desc);
        }

        let index = self.libraries[dest_library].add_category(copy);
        self.synchronize_macros(dest_library);
        self.persist(dest_library);

        let parent = Some(self.library_node(dest_library));
        let node = self.category_node(dest_library, index);
        self.fire(LibraryEvent::Added { parent, node });

        Ok(CategoryHandle {
            generation: self.generation,
            library: dest_library,
            index,
        })
    }

    /// Give a macro a new plain key.
    pub fn change_key(&mut self, key: &str, new_key: &str) -> Result<()> {
        let new_key = new_key.trim();
        if new_key.is_empty() {
            return Err(LibraryError::IllegalKey("key length must not be zero".into()));
        }
        if new_key.contains(|c: char| c == '[' || c == ']' || c == '.' || c.is_whitespace()) {
            return Err(LibraryError::IllegalKey(new_key.to_string()));
        }
        let (library, category, index) = self.locate_macro(key)?;
        self.ensure_editable(library, "A macro")?;
        let lowered = new_key.to_lowercase();
        if self.libraries[library].contains_macro_key(Some(lowered.as_str())) {
            return Err(LibraryError::IllegalKey("new key already exists".into()));
        }

        let desc = &mut self.libraries[library].categories_mut()[category].macros_mut()[index];
        let old_key = desc.plain_key().to_string();
        desc.key = create_macro_key(&desc.filename, new_key);
        let node = LibraryNode::Macro {
            key: desc.key.clone(),
        };
        self.persist(library);

        let parent = Some(self.category_node(library, category));
        self.fire(LibraryEvent::KeyChanged {
            parent,
            node,
            old_key,
        });
        Ok(())
    }

    fn unused_plain_key(&self, library: usize, taken: &[String]) -> Result<String> {
        for _ in 0..KEY_GENERATION_ATTEMPTS {
            let key = create_random_macro_key();
            let in_use = self.libraries[library].contains_macro_key(Some(key.as_str()));
            if !in_use && !taken.contains(&key) {
                return Ok(key);
            }
        }
        Err(LibraryError::KeyGenerationFailed)
    }

    /// Bring the macros of a library in line with its name, file and
    /// categories.
    fn synchronize_macros(&mut self, library: usize) {
        let library = &mut self.libraries[library];
        if library.is_std_lib() {
            return;
        }
        let name = library.name().to_string();
        let filename = library.filename().to_string();
        for category in library.categories_mut() {
            let category_name = category.name().to_string();
            for desc in category.macros_mut() {
                desc.category = category_name.clone();
                desc.library = name.clone();
                desc.filename = filename.clone();
                desc.key = create_macro_key(&filename, desc.plain_key());
            }
        }
    }

    // Persistence

    /// Write every editable library to its file.
    pub fn save(&self) -> Result<()> {
        for library in self.libraries.iter().filter(|l| !l.is_std_lib()) {
            fcl::write_library(&self.library_dir, library)?;
        }
        Ok(())
    }

    fn persist(&self, library: usize) {
        let library = &self.libraries[library];
        if library.is_std_lib() {
            return;
        }
        if let Err(e) = fcl::write_library(&self.library_dir, library) {
            warn!("Failed to save library {:?}: {}", library.filename(), e);
        }
    }

    /// Snapshot the library files below `root` and hand the snapshot to
    /// `actor`. Failures are logged; the snapshot is then simply missing.
    pub fn save_library_state(
        &self,
        store: &dyn SnapshotStore,
        root: &Path,
        actor: &mut dyn UndoActor,
    ) -> Option<PathBuf> {
        match capture_library_snapshot(store, &self.library_dir, root) {
            Ok(dir) => {
                actor.save_undo_library(dir.clone());
                Some(dir)
            }
            Err(e) => {
                warn!("Cannot save the library state: {}", e);
                None
            }
        }
    }
}
