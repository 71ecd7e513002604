// This module groups everything that talks to the external CUDA toolchain: the nvcc
// configuration read from the environment, the DeviceCompiler seam with its nvcc-backed
// implementation, and the dispatcher that turns the active arch configuration into an output
// mode and a compiler call.

//! External toolchain integration.

pub mod compiler;
pub mod config;
pub mod dispatch;

pub use compiler::{DeviceCompiler, NvccCompiler, OutputMode, ToolchainError};
pub use config::NvccConfig;
pub use dispatch::CompileDispatcher;
