// This module is the public accessor surface over the current thread's arch scope stack:
// set_target_arch parses and installs a new spec, get_target_arch reports the active one (or
// an explicit target's arch), reset_target_arch clears it, and compile hands kernel source to
// the device compiler for the active arch. The holder is a thread_local RefCell, so each thread
// of control sees its own stack and no locking happens; code that needs to share a
// configuration across threads passes a ScopeStack explicitly instead. enter_target_arch opens
// a nested scope whose guard pops exactly that frame (and anything nested in it) on drop; a
// guard whose frame is already gone leaves the stack alone.

//! Accessors for the current arch configuration.
//!
//! ```no_run
//! use cuda_scope::api;
//!
//! api::set_target_arch("sm_75", true)?;
//! let fatbin = api::compile("extern \"C\" __global__ void k() {}")?;
//! # Ok::<(), cuda_scope::ArchError>(())
//! ```

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::core::{ArchResult, ArchSpec, ArchSpecParser, ArchValue, ScopeId, ScopeStack};
use crate::nvcc::{CompileDispatcher, DeviceCompiler, NvccCompiler, ToolchainError};
use crate::target::Target;

thread_local! {
    static CURRENT: RefCell<ScopeStack> = RefCell::new(ScopeStack::new());
}

/// Run `f` with the current thread's scope stack.
pub fn with_scope_stack<R>(f: impl FnOnce(&ScopeStack) -> R) -> R {
    CURRENT.with(|stack| f(&*stack.borrow()))
}

fn with_scope_stack_mut<R>(f: impl FnOnce(&mut ScopeStack) -> R) -> R {
    CURRENT.with(|stack| f(&mut *stack.borrow_mut()))
}

/// Start from a fresh root scope.
pub fn init() {
    with_scope_stack_mut(|stack| *stack = ScopeStack::new());
}

/// Drop nested scopes and clear the root.
pub fn teardown() {
    with_scope_stack_mut(ScopeStack::clear);
}

/// Parse `arch` and make it the active arch of the current scope.
///
/// With `gencode` set, a short form such as `sm_75` becomes
/// `["-gencode", "arch=compute_75,code=sm_75"]`; otherwise it is kept as the
/// `-arch` value. Explicit lists must contain `-gencode`.
pub fn set_target_arch(arch: impl Into<ArchValue>, gencode: bool) -> ArchResult<()> {
    let spec = ArchSpecParser::parse(arch.into(), gencode)?;
    with_scope_stack_mut(|stack| stack.set_active(spec));
    Ok(())
}

/// The active arch, or the arch of `target` when one is given.
pub fn get_target_arch(target: Option<&Target>) -> ArchValue {
    with_scope_stack(|stack| stack.get_active(target))
}

/// Clear the active arch.
pub fn reset_target_arch() {
    with_scope_stack_mut(ScopeStack::reset);
}

/// Compile kernel source with nvcc for the active arch.
pub fn compile(code: &str) -> Result<Vec<u8>, ToolchainError> {
    compile_with(NvccCompiler::from_env(), code)
}

/// Compile kernel source with `compiler` for the active arch.
pub fn compile_with<C: DeviceCompiler>(compiler: C, code: &str) -> Result<Vec<u8>, ToolchainError> {
    // snapshot first: the compiler may call back into this module
    let arch = get_target_arch(None);
    CompileDispatcher::new(compiler).compile_for(&arch, code)
}

/// Enter a nested scope with `arch` active until the guard is dropped.
pub fn enter_target_arch(arch: impl Into<ArchValue>, gencode: bool) -> ArchResult<ScopeGuard> {
    let spec = ArchSpecParser::parse(arch.into(), gencode)?;
    Ok(ScopeGuard::enter(spec))
}

/// Pops the scope it entered when dropped. Bound to the creating thread.
#[must_use = "the scope is left as soon as the guard is dropped"]
pub struct ScopeGuard {
    id: ScopeId,
    _not_send: PhantomData<*const ()>,
}

impl ScopeGuard {
    fn enter(spec: ArchSpec) -> Self {
        let id = with_scope_stack_mut(|stack| stack.push(spec));
        Self {
            id,
            _not_send: PhantomData,
        }
    }

    /// Id of the frame this guard entered.
    pub fn id(&self) -> ScopeId {
        self.id
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let id = self.id;
        // try_with: the thread-local may already be gone during thread exit.
        let result = CURRENT.try_with(|cell| {
            let Ok(mut stack) = cell.try_borrow_mut() else {
                log::warn!("arch scope {:?} dropped while the stack is borrowed", id);
                return;
            };
            if stack.current().id() != id {
                if stack.contains(id) {
                    log::warn!("arch scope {:?} dropped with nested scopes still open", id);
                } else {
                    log::warn!("arch scope {:?} already left; nothing to pop", id);
                    return;
                }
            }
            stack.pop_to(id);
        });
        if result.is_err() {
            log::debug!("arch scope {:?} dropped after thread-local teardown", id);
        }
    }
}
