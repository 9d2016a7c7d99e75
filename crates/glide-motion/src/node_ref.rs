//! Element references.
//!
//! A [`NodeRef`] is a shared slot the host fills once an element is attached
//! to a render surface. Several owners often need the same element (the
//! caller's own ref plus an effect's internal ref); [`merge_refs`] fans a
//! single attachment out to all of them.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Identifies a host element that animations can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

impl TargetId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target-{}", self.0)
    }
}

/// Shared, clonable slot holding the attached element, if any.
#[derive(Debug, Clone, Default)]
pub struct NodeRef {
    slot: Rc<Cell<Option<TargetId>>>,
}

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<TargetId> {
        self.slot.get()
    }

    pub fn set(&self, target: Option<TargetId>) {
        self.slot.set(target);
    }

    pub fn is_attached(&self) -> bool {
        self.get().is_some()
    }

    /// Whether two refs share a slot.
    pub fn ptr_eq(&self, other: &NodeRef) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

/// Callback invoked with the attached element (or `None` on detach).
pub type RefCallback = Rc<dyn Fn(Option<TargetId>)>;

enum RefSink {
    Slot(NodeRef),
    Callback(RefCallback),
}

/// A set of refs that all receive the same attachment.
#[derive(Default)]
pub struct MergedRef {
    sinks: Vec<RefSink>,
}

impl MergedRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ref(mut self, node_ref: &NodeRef) -> Self {
        self.sinks.push(RefSink::Slot(node_ref.clone()));
        self
    }

    pub fn with_callback(mut self, callback: impl Fn(Option<TargetId>) + 'static) -> Self {
        self.sinks.push(RefSink::Callback(Rc::new(callback)));
        self
    }

    pub fn set(&self, target: Option<TargetId>) {
        for sink in &self.sinks {
            match sink {
                RefSink::Slot(node_ref) => node_ref.set(target),
                RefSink::Callback(callback) => callback(target),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl fmt::Debug for MergedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergedRef").field("sinks", &self.sinks.len()).finish()
    }
}

/// Combine refs so one `set` updates all of them.
pub fn merge_refs(refs: &[NodeRef]) -> MergedRef {
    refs.iter().fold(MergedRef::new(), |merged, r| merged.with_ref(r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_merge_fans_out() {
        let outer = NodeRef::new();
        let inner = NodeRef::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();

        let merged = merge_refs(&[outer.clone(), inner.clone()])
            .with_callback(move |t| log.borrow_mut().push(t));
        assert_eq!(merged.len(), 3);

        merged.set(Some(TargetId(5)));
        assert_eq!(outer.get(), Some(TargetId(5)));
        assert_eq!(inner.get(), Some(TargetId(5)));

        merged.set(None);
        assert!(!outer.is_attached());
        assert_eq!(*seen.borrow(), vec![Some(TargetId(5)), None]);
    }

    #[test]
    fn test_clones_share_slot() {
        let a = NodeRef::new();
        let b = a.clone();
        b.set(Some(TargetId(1)));
        assert_eq!(a.get(), Some(TargetId(1)));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&NodeRef::new()));
    }
}
