//! Cell ids and identity keys.
//!
//! One interned type serves both: an element's resolved key becomes the id
//! of the engine cell it drives. Keys minted for unidentified elements are
//! derived from their parent's key (`__root:3`, `__root:3:0`), so a key
//! names where in the tree it was first seen.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Separates a minted key from the scope it was minted under.
const SCOPE_SEP: char = ':';

/// Prefix of ids the engine assigns to cells added without one.
const GENERATED: &str = "__cell_";

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(Spur);

impl CellId {
    pub fn intern(s: &str) -> Self {
        CellId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// The `n`th key minted under `scope`. The caller owns the counter.
    pub fn mint(scope: CellId, n: u64) -> Self {
        Self::intern(&format!("{scope}{SCOPE_SEP}{n}"))
    }

    /// Scope this key was minted under, if it was minted.
    pub fn scope(&self) -> Option<CellId> {
        let (scope, n) = self.as_str().rsplit_once(SCOPE_SEP)?;
        n.parse::<u64>().ok()?;
        Some(Self::intern(scope))
    }

    /// A process-unique id for a cell created with neither an id nor a
    /// resolved key, e.g. by an adapter used without a canvas root.
    pub fn generate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{GENERATED}{n}"))
    }

    pub fn is_generated(&self) -> bool {
        self.as_str().starts_with(GENERATED)
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CellId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = Cow::<'de, str>::deserialize(deserializer)?;
        Ok(CellId::intern(&s))
    }
}
