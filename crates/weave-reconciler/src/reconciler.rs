//! Keyed child-list reconciler.
//!
//! Keeps a fiber per mounted element and drives a [`HostConfig`] so the host
//! matches the latest element tree. For every level the order of host calls
//! is: deletions, then updates, then placements. New subtrees are built
//! bottom-up: children are created first, then their parent, then each
//! child is attached with `append_initial_child`.
//!
//! Siblings are matched by key. Elements without a key are matched by their
//! position in the list.

use crate::host::HostConfig;
use std::collections::{HashMap, HashSet};
use weave_core::{CellId, Element, ElementKind, Props};

/// Identity of a fiber among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FiberKey {
    /// The element's resolved key.
    Keyed(CellId),
    /// Index in the parent's child list.
    Positional(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FiberId(usize);

struct Fiber<I> {
    key: FiberKey,
    kind: ElementKind,
    props: Props,
    /// Taken out while the host holds it mutably.
    instance: Option<I>,
    children: Vec<FiberId>,
}

pub struct Reconciler<H: HostConfig> {
    host: H,
    fibers: HashMap<FiberId, Fiber<H::Instance>>,
    roots: Vec<FiberId>,
    next_fiber: usize,
}

impl<H: HostConfig> Reconciler<H> {
    pub fn new(host: H) -> Self {
        host.root_host_context();
        Self {
            host,
            fibers: HashMap::new(),
            roots: Vec::new(),
            next_fiber: 0,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Number of mounted elements, at every depth.
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Keys of the top-level elements, in order.
    pub fn root_keys(&self) -> Vec<FiberKey> {
        self.roots
            .iter()
            .filter_map(|id| self.fibers.get(id))
            .map(|f| f.key)
            .collect()
    }

    /// The live instance of the top-level element keyed `key`.
    pub fn instance(&self, key: CellId) -> Option<&H::Instance> {
        self.roots
            .iter()
            .filter_map(|id| self.fibers.get(id))
            .find(|f| f.key == FiberKey::Keyed(key))
            .and_then(|f| f.instance.as_ref())
    }

    /// Make the host match `elements`. An empty list unmounts everything.
    ///
    /// On a host error the commit stops; whatever was already committed
    /// stays mounted and tracked.
    pub fn update_container(&mut self, elements: Vec<Element>) -> Result<(), String> {
        self.host.prepare_for_commit();
        let old = std::mem::take(&mut self.roots);
        let (roots, result) = self.reconcile_children(None, old, elements);
        self.roots = roots;
        self.host.reset_after_commit();
        result
    }

    fn reconcile_children(
        &mut self,
        parent: Option<FiberId>,
        old: Vec<FiberId>,
        elements: Vec<Element>,
    ) -> (Vec<FiberId>, Result<(), String>) {
        let mut by_key: HashMap<FiberKey, (usize, FiberId)> = HashMap::new();
        for (index, id) in old.iter().enumerate() {
            if let Some(fiber) = self.fibers.get(id) {
                by_key.insert(fiber.key, (index, *id));
            }
        }

        // Match new elements to surviving fibers of the same kind.
        let keyed = assign_keys(elements);
        let mut matched: Vec<Option<(usize, FiberId)>> = Vec::with_capacity(keyed.len());
        for (key, element) in &keyed {
            let hit = by_key
                .remove(key)
                .filter(|(_, id)| self.fibers.get(id).is_some_and(|f| f.kind == element.kind));
            matched.push(hit);
        }

        let kept: HashSet<FiberId> = matched.iter().flatten().map(|(_, id)| *id).collect();
        for id in old.iter().filter(|id| !kept.contains(id)) {
            self.delete_subtree(parent, *id);
        }

        let mut next = Vec::with_capacity(keyed.len());
        let mut placements = Vec::new();
        let mut last_placed = 0;
        let mut result = Ok(());
        let mut pending = keyed.into_iter().zip(matched);

        for ((key, element), hit) in pending.by_ref() {
            let step = match hit {
                Some((old_index, id)) => self.update_fiber(id, element).map(|()| {
                    if old_index < last_placed {
                        placements.push(next.len());
                    } else {
                        last_placed = old_index;
                    }
                    id
                }),
                None => self.mount_fiber(key, element).map(|id| {
                    placements.push(next.len());
                    id
                }),
            };
            match step {
                Ok(id) => next.push(id),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        // Fibers matched after a failure stay mounted as they were.
        next.extend(pending.filter_map(|(_, hit)| hit.map(|(_, id)| id)));

        for &index in placements.iter().rev() {
            let before = next.get(index + 1).copied();
            if let Err(e) = self.place(parent, next[index], before)
                && result.is_ok()
            {
                result = Err(e);
            }
        }
        (next, result)
    }

    fn update_fiber(&mut self, id: FiberId, element: Element) -> Result<(), String> {
        let Element {
            props, children, ..
        } = element;
        let Some(fiber) = self.fibers.get_mut(&id) else {
            return Ok(());
        };

        if fiber.props != props {
            if let Some(mut instance) = fiber.instance.take() {
                let result = self.host.commit_update(&mut instance, &fiber.props, &props);
                fiber.instance = Some(instance);
                result?;
            }
            fiber.props = props;
        }

        let old_children = std::mem::take(&mut fiber.children);
        let (children, result) = self.reconcile_children(Some(id), old_children, children);
        if let Some(fiber) = self.fibers.get_mut(&id) {
            fiber.children = children;
        }
        result
    }

    fn mount_fiber(&mut self, key: FiberKey, element: Element) -> Result<FiberId, String> {
        let Element {
            kind,
            props,
            children,
            ..
        } = element;
        self.host.child_host_context(&kind);

        let mut mounted = Vec::with_capacity(children.len());
        for (child_key, child) in assign_keys(children) {
            match self.mount_fiber(child_key, child) {
                Ok(child_id) => mounted.push(child_id),
                Err(e) => {
                    self.abandon(mounted);
                    return Err(e);
                }
            }
        }

        let mut instance = match self.host.create_instance(&kind, &props) {
            Ok(instance) => instance,
            Err(e) => {
                self.abandon(mounted);
                return Err(e);
            }
        };
        let mut failure = None;
        for &child_id in &mounted {
            let Some(mut child) = self.take(child_id) else {
                continue;
            };
            let attached = self.host.append_initial_child(&mut instance, &mut child);
            self.restore(child_id, child);
            if let Err(e) = attached {
                failure = Some(e);
                break;
            }
        }
        if let Some(e) = failure {
            self.host.remove_child_from_container(&mut instance);
            self.host.detach_deleted_instance(&mut instance);
            self.abandon(mounted);
            return Err(e);
        }
        self.host.finalize_initial_children(&mut instance);

        let id = FiberId(self.next_fiber);
        self.next_fiber += 1;
        self.fibers.insert(
            id,
            Fiber {
                key,
                kind,
                props,
                instance: Some(instance),
                children: mounted,
            },
        );
        Ok(id)
    }

    /// Roll back subtrees mounted for a parent that failed.
    fn abandon(&mut self, mounted: Vec<FiberId>) {
        for id in mounted {
            self.delete_subtree(None, id);
        }
    }

    fn place(&mut self, parent: Option<FiberId>, child: FiberId, before: Option<FiberId>) -> Result<(), String> {
        let Some(mut instance) = self.take(child) else {
            return Ok(());
        };
        let result = match parent {
            Some(parent) => match self.take(parent) {
                Some(mut owner) => {
                    let anchor = before
                        .and_then(|b| self.fibers.get(&b))
                        .and_then(|f| f.instance.as_ref());
                    let placed = match anchor {
                        Some(anchor) => self.host.insert_before(&mut owner, &mut instance, anchor),
                        None => self.host.append_child(&mut owner, &mut instance),
                    };
                    self.restore(parent, owner);
                    placed
                }
                None => Ok(()),
            },
            None => {
                let anchor = before
                    .and_then(|b| self.fibers.get(&b))
                    .and_then(|f| f.instance.as_ref());
                match anchor {
                    Some(anchor) => self.host.insert_in_container_before(&mut instance, anchor),
                    None => self.host.append_child_to_container(&mut instance),
                }
            }
        };
        self.restore(child, instance);
        result
    }

    /// Remove the subtree's root from its parent, then detach every
    /// instance in the subtree and drop the fibers.
    fn delete_subtree(&mut self, parent: Option<FiberId>, root: FiberId) {
        if let Some(mut instance) = self.take(root) {
            match parent.and_then(|p| self.take(p).map(|owner| (p, owner))) {
                Some((p, mut owner)) => {
                    self.host.remove_child(&mut owner, &mut instance);
                    self.restore(p, owner);
                }
                None => self.host.remove_child_from_container(&mut instance),
            }
            self.restore(root, instance);
        }

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(fiber) = self.fibers.remove(&id) else {
                continue;
            };
            stack.extend(fiber.children);
            if let Some(mut instance) = fiber.instance {
                self.host.detach_deleted_instance(&mut instance);
            }
        }
    }

    fn take(&mut self, id: FiberId) -> Option<H::Instance> {
        self.fibers.get_mut(&id).and_then(|f| f.instance.take())
    }

    fn restore(&mut self, id: FiberId, instance: H::Instance) {
        if let Some(fiber) = self.fibers.get_mut(&id) {
            fiber.instance = Some(instance);
        }
    }
}

/// Key each element by its resolved key, or its index when it has none.
/// A repeated key falls back to the index.
fn assign_keys(elements: Vec<Element>) -> Vec<(FiberKey, Element)> {
    let mut seen = HashSet::new();
    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            let key = match element.key {
                Some(key) if seen.insert(key) => FiberKey::Keyed(key),
                Some(key) => {
                    log::warn!("duplicate key {key} among siblings; matched by position");
                    FiberKey::Positional(index)
                }
                None => FiberKey::Positional(index),
            };
            (key, element)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Records every host call; instances are their element's `name` prop.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_on: Option<String>,
    }

    fn name(props: &Props) -> String {
        props
            .data("name")
            .and_then(|v| v.as_str())
            .unwrap_or("?")
            .to_string()
    }

    impl HostConfig for Recorder {
        type Instance = String;

        fn create_instance(&mut self, _kind: &ElementKind, props: &Props) -> Result<String, String> {
            let name = name(props);
            if self.fail_on.as_deref() == Some(name.as_str()) {
                return Err(format!("cannot create {name}"));
            }
            self.calls.push(format!("create {name}"));
            Ok(name)
        }

        fn append_initial_child(&mut self, parent: &mut String, child: &mut String) -> Result<(), String> {
            self.calls.push(format!("initial {child} -> {parent}"));
            Ok(())
        }

        fn append_child(&mut self, parent: &mut String, child: &mut String) -> Result<(), String> {
            self.calls.push(format!("append {child} -> {parent}"));
            Ok(())
        }

        fn insert_before(&mut self, parent: &mut String, child: &mut String, before: &String) -> Result<(), String> {
            self.calls.push(format!("insert {child} -> {parent} before {before}"));
            Ok(())
        }

        fn append_child_to_container(&mut self, child: &mut String) -> Result<(), String> {
            self.calls.push(format!("append {child}"));
            Ok(())
        }

        fn insert_in_container_before(&mut self, child: &mut String, before: &String) -> Result<(), String> {
            self.calls.push(format!("insert {child} before {before}"));
            Ok(())
        }

        fn remove_child(&mut self, parent: &mut String, child: &mut String) {
            self.calls.push(format!("remove {child} <- {parent}"));
        }

        fn remove_child_from_container(&mut self, child: &mut String) {
            self.calls.push(format!("remove {child}"));
        }

        fn commit_update(&mut self, instance: &mut String, _old: &Props, new: &Props) -> Result<(), String> {
            self.calls.push(format!("update {instance}"));
            *instance = name(new);
            Ok(())
        }

        fn detach_deleted_instance(&mut self, instance: &mut String) {
            self.calls.push(format!("detach {instance}"));
        }
    }

    fn el(key: &str) -> Element {
        Element::node().key(key).prop("name", key)
    }

    fn drain(r: &mut Reconciler<Recorder>) -> Vec<String> {
        std::mem::take(&mut r.host_mut().calls)
    }

    #[test]
    fn subtrees_are_built_bottom_up() {
        let mut r = Reconciler::new(Recorder::default());
        let tree = el("rc_e").children([el("rc_l1"), el("rc_l2")]);
        r.update_container(vec![tree]).unwrap();
        assert_eq!(
            drain(&mut r),
            vec![
                "create rc_l1",
                "create rc_l2",
                "create rc_e",
                "initial rc_l1 -> rc_e",
                "initial rc_l2 -> rc_e",
                "append rc_e",
            ]
        );
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn deletions_then_updates_then_placements() {
        let mut r = Reconciler::new(Recorder::default());
        r.update_container(vec![el("rc_a"), el("rc_b")]).unwrap();
        drain(&mut r);

        let changed = el("rc_b").prop("x", 1);
        r.update_container(vec![changed, el("rc_c")]).unwrap();
        assert_eq!(
            drain(&mut r),
            vec![
                "remove rc_a",
                "detach rc_a",
                "update rc_b",
                "create rc_c",
                "append rc_c",
            ]
        );
    }

    #[test]
    fn unchanged_props_skip_commit_update() {
        let mut r = Reconciler::new(Recorder::default());
        r.update_container(vec![el("rc_same")]).unwrap();
        drain(&mut r);
        r.update_container(vec![el("rc_same")]).unwrap();
        assert!(drain(&mut r).is_empty());
    }

    #[test]
    fn moved_fibers_are_placed_before_their_successor() {
        let mut r = Reconciler::new(Recorder::default());
        let parent = |kids: Vec<Element>| el("rc_p").children(kids);
        r.update_container(vec![parent(vec![el("rc_1"), el("rc_2"), el("rc_3")])])
            .unwrap();
        drain(&mut r);

        r.update_container(vec![parent(vec![el("rc_3"), el("rc_1"), el("rc_2")])])
            .unwrap();
        assert_eq!(
            drain(&mut r),
            vec!["append rc_2 -> rc_p", "insert rc_1 -> rc_p before rc_2"]
        );
    }

    #[test]
    fn deleting_a_subtree_removes_its_root_once() {
        let mut r = Reconciler::new(Recorder::default());
        r.update_container(vec![el("rc_edge").child(el("rc_label"))])
            .unwrap();
        drain(&mut r);

        r.update_container(vec![]).unwrap();
        let calls = drain(&mut r);
        assert_eq!(calls[0], "remove rc_edge");
        assert_eq!(
            calls.iter().filter(|c| c.starts_with("remove")).count(),
            1
        );
        assert!(calls.contains(&"detach rc_label".to_string()));
        assert!(r.is_empty());
    }

    #[test]
    fn removing_a_child_goes_through_its_parent() {
        let mut r = Reconciler::new(Recorder::default());
        r.update_container(vec![el("rc_o").children([el("rc_k1"), el("rc_k2")])])
            .unwrap();
        drain(&mut r);

        r.update_container(vec![el("rc_o").child(el("rc_k1"))]).unwrap();
        assert_eq!(
            drain(&mut r),
            vec!["remove rc_k2 <- rc_o", "detach rc_k2"]
        );
    }

    #[test]
    fn kind_change_remounts() {
        let mut r = Reconciler::new(Recorder::default());
        r.update_container(vec![el("rc_kind")]).unwrap();
        drain(&mut r);

        let edge = Element::edge().key("rc_kind").prop("name", "rc_kind2");
        r.update_container(vec![edge]).unwrap();
        assert_eq!(
            drain(&mut r),
            vec![
                "remove rc_kind",
                "detach rc_kind",
                "create rc_kind2",
                "append rc_kind2"
            ]
        );
    }

    #[test]
    fn failed_subtree_is_rolled_back() {
        let mut r = Reconciler::new(Recorder {
            fail_on: Some("rc_bad".into()),
            ..Default::default()
        });
        let tree = el("rc_bad").child(el("rc_ok"));
        let err = r.update_container(vec![el("rc_first"), tree]).unwrap_err();
        assert_eq!(err, "cannot create rc_bad");
        assert_eq!(r.root_keys(), vec![FiberKey::Keyed(CellId::intern("rc_first"))]);
        let calls = drain(&mut r);
        assert!(calls.contains(&"remove rc_ok".to_string()));
        assert!(calls.contains(&"detach rc_ok".to_string()));
    }

    #[test]
    fn instance_lookup_by_key() {
        let mut r = Reconciler::new(Recorder::default());
        r.update_container(vec![el("rc_ref")]).unwrap();
        assert_eq!(
            r.instance(CellId::intern("rc_ref")).map(String::as_str),
            Some("rc_ref")
        );
        assert_eq!(r.instance(CellId::intern("rc_missing")), None);
    }

    #[test]
    fn unkeyed_elements_match_by_position() {
        let mut r = Reconciler::new(Recorder::default());
        let plain = |name: &str| Element::node().prop("name", name);
        r.update_container(vec![plain("rc_x"), plain("rc_y")]).unwrap();
        drain(&mut r);
        r.update_container(vec![plain("rc_x2"), plain("rc_y")]).unwrap();
        assert_eq!(drain(&mut r), vec!["update rc_x"]);
        assert_eq!(
            r.root_keys(),
            vec![FiberKey::Positional(0), FiberKey::Positional(1)]
        );
    }
}
