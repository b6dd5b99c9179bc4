//! String interner for identifier storage.
//!
//! Provides O(1) interning and lookup. The verifier pass itself is
//! single-threaded, but the interner is shared with the host frontend which
//! may populate the translation unit from multiple parsing threads, so
//! access goes through a `parking_lot::RwLock`.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;

/// An interned identifier: a 32-bit handle into the [`StringInterner`].
///
/// Equality and hashing compare the handle, not the string content.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// The empty string, pre-interned at index 0.
    pub const EMPTY: Name = Name(0);

    /// Create a name from a raw index. The caller must ensure the index
    /// came from the same interner the name will be resolved against.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    /// Get the raw index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

struct InternerState {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents.
    strings: Vec<&'static str>,
}

/// String interner with O(1) lookup and equality comparison.
pub struct StringInterner {
    state: RwLock<InternerState>,
}

impl StringInterner {
    /// Create a new interner with the empty string pre-interned.
    pub fn new() -> Self {
        let mut map = FxHashMap::default();
        let empty: &'static str = "";
        map.insert(empty, 0);
        StringInterner {
            state: RwLock::new(InternerState {
                map,
                strings: vec![empty],
            }),
        }
    }

    /// Intern a string, returning its [`Name`].
    pub fn intern(&self, s: &str) -> Name {
        // Fast path: already interned.
        {
            let guard = self.state.read();
            if let Some(&idx) = guard.map.get(s) {
                return Name(idx);
            }
        }

        let mut guard = self.state.write();
        // Double-check after acquiring the write lock.
        if let Some(&idx) = guard.map.get(s) {
            return Name(idx);
        }

        // Leak the string to get 'static lifetime. Interned strings live for
        // the process lifetime, matching the single-pass plugin model.
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let idx = u32::try_from(guard.strings.len()).unwrap_or_else(|_| {
            panic!("interner exceeded capacity: {} strings", guard.strings.len())
        });
        guard.strings.push(leaked);
        guard.map.insert(leaked, idx);
        Name(idx)
    }

    /// Resolve a [`Name`] back to its string content.
    ///
    /// # Panics
    /// Panics if the name did not come from this interner.
    pub fn lookup(&self, name: Name) -> &'static str {
        let guard = self.state.read();
        guard.strings[name.0 as usize]
    }

    /// Number of interned strings (including the pre-interned empty string).
    pub fn len(&self) -> usize {
        self.state.read().strings.len()
    }

    /// Check if only the empty string is interned.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringInterner")
            .field("len", &self.len())
            .finish()
    }
}
