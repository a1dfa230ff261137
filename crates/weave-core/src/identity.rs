//! Identity resolution: stable reconciliation keys for declarative children.
//!
//! Every child gets a key that binds it to one long-lived engine instance
//! across renders:
//!
//! - an explicit `id` attribute (or a key set by the caller) is the key,
//!   verbatim;
//! - otherwise the key is looked up by a content hash of the element's kind
//!   and data props (handlers excluded), scoped per parent, and minted under
//!   that parent's key on first sight.
//!
//! Tables are keyed by `(hash, occurrence)` so two identical unidentified
//! siblings still get distinct keys, and the same pair again on the next
//! render. Unidentified edges never record their key: an edge can be
//! deleted engine-side when an endpoint disappears, and reusing its key
//! would bind the new declaration to a dead instance.
//!
//! Each pass rebuilds the table from what it resolved, so keys of elements
//! no longer declared are forgotten along with the scopes of their parents.
//! The table belongs to one canvas root and is cleared when that root is
//! disposed.

use crate::id::CellId;
use crate::model::{Element, ElementKind};
use crate::props::{DataProps, data_props};
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Scope of a canvas root's top-level children.
pub const ROOT_SCOPE: &str = "__root";

type Scope = HashMap<(u64, usize), CellId>;

/// Per-root memo of hash-derived keys, one sub-table per parent scope.
#[derive(Debug, Default)]
pub struct IdentityTable {
    scopes: HashMap<CellId, Scope>,
    minted: u64,
}

impl IdentityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve keys for the top-level children of a root.
    ///
    /// On error the table is left as it was before the pass.
    pub fn resolve_root(&mut self, children: Vec<Element>) -> Result<Vec<Element>, String> {
        let mut seen = HashMap::new();
        let resolved = self.resolve(CellId::intern(ROOT_SCOPE), children, &mut seen)?;
        self.scopes = seen;
        Ok(resolved)
    }

    /// Resolve keys for `children` under `scope`, recursing into each
    /// child's own children with the child's key as their scope. Memoized
    /// keys used by this pass are recorded in `seen`.
    ///
    /// Kinds that carry an id get the resolved key written back as their
    /// `id` attribute when they declared none.
    fn resolve(
        &mut self,
        scope: CellId,
        children: Vec<Element>,
        seen: &mut HashMap<CellId, Scope>,
    ) -> Result<Vec<Element>, String> {
        let mut occurrences: HashMap<u64, usize> = HashMap::new();
        let mut resolved = Vec::with_capacity(children.len());

        for mut child in children {
            let key = match child.props.id().or(child.key) {
                Some(id) => id,
                None => {
                    let hash = content_hash(&child.kind, &data_props(&child.props))?;
                    let occurrence = occurrences.entry(hash).or_insert(0);
                    let slot = (hash, *occurrence);
                    *occurrence += 1;
                    let key = self.lookup_or_mint(scope, slot);
                    if !child.kind.is_edge_like() {
                        seen.entry(scope).or_default().insert(slot, key);
                    }
                    key
                }
            };

            if child.kind.carries_id() && child.props.id().is_none() {
                child.props.set("id", key.as_str());
            }
            child.key = Some(key);

            let grandchildren = std::mem::take(&mut child.children);
            child.children = self.resolve(key, grandchildren, seen)?;
            resolved.push(child);
        }

        Ok(resolved)
    }

    fn lookup_or_mint(&mut self, scope: CellId, slot: (u64, usize)) -> CellId {
        if let Some(key) = self.scopes.get(&scope).and_then(|t| t.get(&slot)) {
            return *key;
        }
        let key = CellId::mint(scope, self.minted);
        self.minted += 1;
        key
    }

    /// Number of memoized keys across all scopes.
    pub fn len(&self) -> usize {
        self.scopes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every memoized key. Keys minted afterwards never repeat
    /// earlier ones.
    pub fn clear(&mut self) {
        self.scopes.clear();
    }
}

/// Structural hash of an element's kind and data props.
///
/// The pair is serialized with MessagePack; `serde_json::Map` keeps keys
/// sorted, so equal props always produce equal bytes.
pub fn content_hash(kind: &ElementKind, data: &DataProps) -> Result<u64, String> {
    let bytes = rmp_serde::to_vec(&(kind.tag(), data))
        .map_err(|e| format!("Cannot hash {kind} props: {e}"))?;
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    Ok(hasher.finish())
}
