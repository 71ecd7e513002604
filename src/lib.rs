//! cuda-scope - target architecture configuration for CUDA code generation.
//!
//! The crate keeps the "current" nvcc architecture configuration in a scoped
//! stack, normalises user supplied arch arguments, and dispatches kernel source
//! to nvcc, asking for a fat binary when several architectures were requested
//! through `-gencode` directives and for ptx otherwise.
//!
//! # Primary Usage
//!
//! ```no_run
//! use cuda_scope::api;
//!
//! // ["-gencode", "arch=compute_75,code=sm_75"] -> fatbin
//! api::set_target_arch("sm_75", true)?;
//! let fatbin = api::compile("extern \"C\" __global__ void k() {}")?;
//!
//! // "sm_75" passed as -arch -> ptx
//! api::set_target_arch("sm_75", false)?;
//! let ptx = api::compile("extern \"C\" __global__ void k() {}")?;
//! # Ok::<(), cuda_scope::ArchError>(())
//! ```
//!
//! # Architecture
//!
//! - [`core`] - arch specifications, parsing and the scope stack
//! - [`nvcc`] - nvcc configuration, invocation and compile dispatch
//! - [`api`] - accessors over the current thread's scope stack
//! - [`registry`] - the accessors as named, dynamically typed entry points
//! - [`target`] - target descriptors carrying their own arch
//! - [`device`] - device type codes

pub mod api;
pub mod core;
pub mod device;
pub mod nvcc;
pub mod registry;
pub mod target;

pub use crate::core::{
    ArchError, ArchResult, ArchSpec, ArchSpecParser, ArchValue, GencodeList, Scope, ScopeId,
    ScopeStack, GENCODE_FLAG,
};
pub use device::{cuda_device_type, DeviceType};
pub use nvcc::{
    CompileDispatcher, DeviceCompiler, NvccCompiler, NvccConfig, OutputMode, ToolchainError,
};
pub use registry::{ArgValue, Registry};
pub use target::Target;
