// This module implements the scoped holder of the current arch configuration. ScopeStack is
// an explicit LIFO stack of Scope frames; the bottom frame is the root scope, which exists for
// the whole lifetime of the stack and starts Unset. Every frame remembers the spec that was
// active before its last change (the `previous` slot), which set_active fills in before
// overwriting and restore_previous can swap back. Nested scopes are entered with push and left
// with pop; the frame below the top is the parent scope. Reads never mutate state; an explicit
// target descriptor bypasses the stack entirely and answers from its own arch attribute.
// Nested frames carry a process-unique id so that a holder can leave exactly the frame it
// entered; the root frame always has id 0.

//! Scoped arch configuration stack.

use std::sync::atomic::{AtomicU64, Ordering};

use super::error::{ArchError, ArchResult};
use super::spec::{ArchSpec, ArchValue};
use crate::target::Target;

/// One frame of the arch scope stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    id: ScopeId,
    active: ArchSpec,
    previous: Option<ArchSpec>,
}

/// Identifies a scope frame. Never reused within a process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

impl Scope {
    fn new(active: ArchSpec, previous: Option<ArchSpec>) -> Self {
        let id = ScopeId(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed));
        Self { id, active, previous }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Currently effective spec of this scope.
    pub fn active(&self) -> &ArchSpec {
        &self.active
    }

    /// Spec that was active before the last change in this scope, if any.
    pub fn previous(&self) -> Option<&ArchSpec> {
        self.previous.as_ref()
    }
}

/// Stack of arch scopes. Never empty: the root frame cannot be popped.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<Scope>,
}

impl ScopeStack {
    /// Create a stack holding only an unset root scope.
    pub fn new() -> Self {
        Self {
            frames: vec![Scope::default()],
        }
    }

    /// The current (innermost) scope.
    pub fn current(&self) -> &Scope {
        // frames always holds the root
        &self.frames[self.frames.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Scope {
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }

    /// Number of frames, the root included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Active spec of the current scope.
    pub fn active(&self) -> &ArchSpec {
        &self.current().active
    }

    /// Replace the active spec in place, recording the old one as `previous`.
    pub fn set_active(&mut self, spec: ArchSpec) {
        let scope = self.current_mut();
        log::debug!("arch scope: {} -> {}", scope.active, spec);
        let old = std::mem::replace(&mut scope.active, spec);
        scope.previous = Some(old);
    }

    /// Resolve the arch visible to a caller.
    ///
    /// Without a target this is the active spec of the current scope. With a
    /// target, the scope is ignored and the target's own `arch` attribute is
    /// returned.
    pub fn get_active(&self, target: Option<&Target>) -> ArchValue {
        match target {
            None => self.active().to_value(),
            Some(target) => target.arch().into(),
        }
    }

    /// Clear the active spec. `previous` is left untouched.
    pub fn reset(&mut self) {
        log::debug!("arch scope: reset");
        self.current_mut().active = ArchSpec::Unset;
    }

    /// Swap the recorded previous spec back into place.
    ///
    /// Returns false when the current scope has no previous spec.
    pub fn restore_previous(&mut self) -> bool {
        let scope = self.current_mut();
        match scope.previous.take() {
            Some(previous) => {
                let replaced = std::mem::replace(&mut scope.active, previous);
                scope.previous = Some(replaced);
                true
            }
            None => false,
        }
    }

    /// Enter a nested scope with `spec` active.
    pub fn push(&mut self, spec: ArchSpec) -> ScopeId {
        let parent = self.active().clone();
        log::debug!("arch scope: push depth {} ({})", self.frames.len() + 1, spec);
        let scope = Scope::new(spec, Some(parent));
        let id = scope.id;
        self.frames.push(scope);
        id
    }

    /// Whether the frame `id` is still on the stack.
    pub fn contains(&self, id: ScopeId) -> bool {
        self.frames.iter().any(|scope| scope.id == id)
    }

    /// Leave the frame `id` together with every frame nested inside it.
    ///
    /// Returns the number of frames popped; zero when `id` is the root or is
    /// no longer on the stack.
    pub fn pop_to(&mut self, id: ScopeId) -> usize {
        match self.frames.iter().position(|scope| scope.id == id) {
            Some(pos) if pos > 0 => {
                let popped = self.frames.len() - pos;
                log::debug!("arch scope: pop {} frame(s) down to depth {}", popped, pos);
                self.frames.truncate(pos);
                popped
            }
            _ => 0,
        }
    }

    /// Leave the current scope, making its parent current again.
    pub fn pop(&mut self) -> ArchResult<Scope> {
        if self.frames.len() == 1 {
            return Err(ArchError::RootScope);
        }
        log::debug!("arch scope: pop depth {}", self.frames.len());
        self.frames.pop().ok_or(ArchError::RootScope)
    }

    /// Drop every nested scope and clear the root.
    pub fn clear(&mut self) {
        self.frames.truncate(1);
        self.frames[0] = Scope::default();
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spec::GencodeList;

    fn single(code: &str) -> ArchSpec {
        ArchSpec::Single(code.to_string())
    }

    #[test]
    fn test_new_stack_is_unset() {
        let stack = ScopeStack::new();
        assert_eq!(stack.depth(), 1);
        assert!(stack.active().is_unset());
        assert_eq!(stack.current().previous(), None);
        assert_eq!(stack.get_active(None), ArchValue::None);
    }

    #[test]
    fn test_set_active_records_previous() {
        let mut stack = ScopeStack::new();
        stack.set_active(single("sm_70"));
        assert_eq!(stack.current().previous(), Some(&ArchSpec::Unset));

        stack.set_active(ArchSpec::GencodeList(GencodeList::for_compute_capability("80")));
        assert_eq!(stack.current().previous(), Some(&single("sm_70")));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_reset_keeps_previous() {
        let mut stack = ScopeStack::new();
        stack.set_active(single("sm_70"));
        stack.set_active(single("sm_80"));
        stack.reset();

        assert!(stack.active().is_unset());
        assert_eq!(stack.current().previous(), Some(&single("sm_70")));
    }

    #[test]
    fn test_restore_previous() {
        let mut stack = ScopeStack::new();
        assert!(!stack.restore_previous());

        stack.set_active(single("sm_70"));
        stack.set_active(single("sm_80"));
        assert!(stack.restore_previous());
        assert_eq!(stack.active(), &single("sm_70"));
        assert_eq!(stack.current().previous(), Some(&single("sm_80")));
    }

    #[test]
    fn test_push_pop_lifo() {
        let mut stack = ScopeStack::new();
        stack.set_active(single("sm_52"));

        stack.push(single("sm_70"));
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current().previous(), Some(&single("sm_52")));

        stack.push(single("sm_80"));
        stack.reset();
        assert!(stack.active().is_unset());

        let popped = stack.pop().unwrap();
        assert!(popped.active().is_unset());
        assert_eq!(stack.active(), &single("sm_70"));

        stack.pop().unwrap();
        assert_eq!(stack.active(), &single("sm_52"));
        assert!(matches!(stack.pop(), Err(ArchError::RootScope)));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_get_active_with_target() {
        let mut stack = ScopeStack::new();
        stack.set_active(single("sm_52"));

        let target = Target::parse("cuda -arch=sm_86").unwrap();
        assert_eq!(stack.get_active(Some(&target)), ArchValue::Str("sm_86".to_string()));

        let target = Target::parse("cuda").unwrap();
        assert_eq!(stack.get_active(Some(&target)), ArchValue::None);
        assert_eq!(stack.active(), &single("sm_52"));
    }

    #[test]
    fn test_pop_to_owned_frame_only() {
        let mut stack = ScopeStack::new();
        let outer = stack.push(single("sm_70"));
        let inner = stack.push(single("sm_80"));
        assert_ne!(outer, inner);
        assert!(stack.contains(inner));

        assert_eq!(stack.pop_to(outer), 2);
        assert_eq!(stack.depth(), 1);
        assert!(!stack.contains(inner));

        let live = stack.push(single("sm_90"));
        assert_eq!(stack.pop_to(inner), 0);
        assert_eq!(stack.pop_to(live), 1);
        assert!(!stack.contains(live));

        let root = stack.current().id();
        assert_eq!(stack.pop_to(root), 0);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_ids_survive_clear() {
        let mut stack = ScopeStack::new();
        let stale = stack.push(single("sm_70"));
        stack.clear();
        let live = stack.push(single("sm_80"));
        assert_ne!(stale, live);
        assert_eq!(stack.pop_to(stale), 0);
        assert_eq!(stack.active(), &single("sm_80"));
    }

    #[test]
    fn test_clear() {
        let mut stack = ScopeStack::new();
        stack.set_active(single("sm_52"));
        stack.push(single("sm_70"));
        stack.clear();
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.current(), &Scope::default());
    }
}
