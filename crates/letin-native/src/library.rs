//! The native-library boundary (§6): a library exposes `initialize`,
//! `finalize`, and `new_native_function_handler`, the last of which hands
//! back a set of named functions to register into a [`NativeTable`]. Actual
//! `dlopen`/`LoadLibrary` is out of scope here — `NativeLibraryLoader` is the
//! seam a real loader would implement; [`StaticLibraryLoader`] is the single
//! in-process implementation used by tests and by a statically-linked build.

use crate::error::{NativeError, Result};
use crate::table::NativeTable;
use rustc_hash::FxHashMap;

/// One native library: named functions to register, keyed by the name the
/// loader's symbol table gave the relocation (`NO_NATIVE_FUN_SYM` if a
/// module references a name this library doesn't provide).
pub trait NativeLibrary: Send + Sync {
    fn initialize(&self) -> bool {
        true
    }
    fn finalize(&self) {}
    fn functions(&self) -> Vec<(String, Box<dyn Fn(&letin_gc::GarbageCollector, Vec<letin_value::Value>) -> letin_vm::Result<letin_value::Value> + Send + Sync>)>;
}

/// Loads native libraries. The dynamic-loading mechanism itself (finding and
/// `dlopen`ing a `.so`/`.dll` by path) is out of scope (§6); this trait is
/// the interface a real implementation would sit behind.
pub trait NativeLibraryLoader {
    fn load(&self, name: &str) -> Result<Box<dyn NativeLibrary>>;
}

/// An in-process registry of libraries, standing in for `dlopen` for tests
/// and for any build that links its native modules statically rather than
/// loading them from a shared object at runtime.
#[derive(Default)]
pub struct StaticLibraryLoader {
    libraries: FxHashMap<String, Box<dyn Fn() -> Box<dyn NativeLibrary> + Send + Sync>>,
}

impl StaticLibraryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, make: impl Fn() -> Box<dyn NativeLibrary> + Send + Sync + 'static) {
        self.libraries.insert(name.into(), Box::new(make));
    }
}

impl NativeLibraryLoader for StaticLibraryLoader {
    fn load(&self, name: &str) -> Result<Box<dyn NativeLibrary>> {
        self.libraries
            .get(name)
            .map(|make| make())
            .ok_or_else(|| NativeError::BadLibrary(name.to_string()))
    }
}

/// Register every function a loaded library provides into `table`, starting
/// at `first_index` and assigning indices in declaration order. Returns the
/// name-to-index map a loader would merge into the environment's native
/// function symbol table.
pub fn register_library(
    table: &mut NativeTable,
    library: &dyn NativeLibrary,
    first_index: u32,
) -> FxHashMap<String, u32> {
    let mut symbols = FxHashMap::default();
    for (i, (name, f)) in library.functions().into_iter().enumerate() {
        let index = first_index + i as u32;
        let _ = table.register(index, move |gc, args| f(gc, args));
        symbols.insert(name, index);
    }
    symbols
}
