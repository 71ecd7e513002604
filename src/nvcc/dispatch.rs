// This module decides what a kernel is compiled into. CompileDispatcher owns a DeviceCompiler
// and, for each request, reads the active arch of a ScopeStack (or takes an explicit ArchValue),
// maps it to an OutputMode with OutputMode::for_arch and forwards the source. Compiler errors
// pass through unchanged; the dispatcher adds no retries and no caching.

//! Compile dispatch.
//!
//! [`CompileDispatcher`] reads the active arch of a [`ScopeStack`], picks the
//! output mode for it and forwards the kernel source to a [`DeviceCompiler`].
//! A directive list always produces a fat binary; an unset or single arch
//! always produces ptx. Downstream loaders branch on that format.

use super::compiler::{DeviceCompiler, OutputMode, ToolchainError};
use crate::core::{ArchValue, ScopeStack};

pub struct CompileDispatcher<C> {
    compiler: C,
}

impl<C: DeviceCompiler> CompileDispatcher<C> {
    pub fn new(compiler: C) -> Self {
        Self { compiler }
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Compile `code` for the arch active in `scope`.
    pub fn compile(&self, scope: &ScopeStack, code: &str) -> Result<Vec<u8>, ToolchainError> {
        self.compile_for(&scope.get_active(None), code)
    }

    /// Compile `code` for an already resolved arch value.
    pub fn compile_for(&self, arch: &ArchValue, code: &str) -> Result<Vec<u8>, ToolchainError> {
        let mode = OutputMode::for_arch(arch);
        log::info!("dispatching kernel compile: mode={} arch={}", mode, arch);
        self.compiler.compile(code, mode, arch)
    }
}
