// This module wraps the external device compiler. DeviceCompiler is the seam the dispatcher
// calls through: it takes kernel source, the requested OutputMode and the arch value, and
// returns the compiled bytes. NvccCompiler is the real implementation. For every compile it
// creates a scratch directory, writes the source to my_kernel.cu, runs nvcc with the mode flag,
// optimisation level, arch arguments (list entries verbatim, -arch for a single string,
// nothing when unset), user options, the output path and optionally -ccbin, and reads back the
// produced file. A non-zero exit status reports the kernel source together with the combined
// compiler output; an empty output file is treated as a failure as well.

//! External device compiler invocation.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

use super::config::NvccConfig;
use crate::core::ArchValue;

/// Binary format requested from the device compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// Single-architecture intermediate assembly.
    Ptx,
    /// Single-architecture device binary.
    Cubin,
    /// Combined binary for several architectures.
    Fatbin,
}

impl OutputMode {
    /// Pick the output format for an arch value: a directive list asks for a
    /// fat binary, anything else for ptx.
    pub fn for_arch(arch: &ArchValue) -> Self {
        match arch {
            ArchValue::List(_) => OutputMode::Fatbin,
            ArchValue::None | ArchValue::Str(_) => OutputMode::Ptx,
        }
    }

    /// Name used for the nvcc flag and the output file extension.
    pub fn as_str(self) -> &'static str {
        match self {
            OutputMode::Ptx => "ptx",
            OutputMode::Cubin => "cubin",
            OutputMode::Fatbin => "fatbin",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of the external device compiler.
#[derive(Error, Debug)]
pub enum ToolchainError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{code}\nCompilation error ({status}):\n{output}")]
    Failed {
        status: ExitStatus,
        code: String,
        output: String,
    },

    #[error("Compilation error: empty result is generated")]
    EmptyOutput,

    #[error("{context} {path}: {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Compiles kernel source into a device binary.
pub trait DeviceCompiler {
    fn compile(
        &self,
        code: &str,
        mode: OutputMode,
        arch: &ArchValue,
    ) -> Result<Vec<u8>, ToolchainError>;
}

impl<C: DeviceCompiler + ?Sized> DeviceCompiler for &C {
    fn compile(
        &self,
        code: &str,
        mode: OutputMode,
        arch: &ArchValue,
    ) -> Result<Vec<u8>, ToolchainError> {
        (**self).compile(code, mode, arch)
    }
}

impl<C: DeviceCompiler + ?Sized> DeviceCompiler for Box<C> {
    fn compile(
        &self,
        code: &str,
        mode: OutputMode,
        arch: &ArchValue,
    ) -> Result<Vec<u8>, ToolchainError> {
        (**self).compile(code, mode, arch)
    }
}

/// Base name of the temporary kernel files.
const KERNEL_STEM: &str = "my_kernel";

/// [`DeviceCompiler`] backed by the nvcc command line tool.
#[derive(Debug, Clone, Default)]
pub struct NvccCompiler {
    config: NvccConfig,
}

impl NvccCompiler {
    pub fn new(config: NvccConfig) -> Self {
        Self { config }
    }

    /// Compiler configured from the process environment.
    pub fn from_env() -> Self {
        Self::new(NvccConfig::from_env())
    }

    pub fn config(&self) -> &NvccConfig {
        &self.config
    }

    /// Arguments passed to nvcc, program name excluded.
    pub fn command_args(
        &self,
        mode: OutputMode,
        arch: &ArchValue,
        source: &Path,
        output: &Path,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            format!("--{}", mode).into(),
            self.config.opt_level.clone().into(),
        ];

        match arch {
            ArchValue::List(entries) => args.extend(entries.iter().map(OsString::from)),
            ArchValue::Str(code) => {
                args.push("-arch".into());
                args.push(code.into());
            }
            ArchValue::None => {}
        }

        args.extend(self.config.options.iter().map(OsString::from));
        args.push("-o".into());
        args.push(output.into());
        args.push(source.into());

        if let Some(cxx) = &self.config.host_compiler {
            args.push("-ccbin".into());
            args.push(cxx.into());
        }
        args
    }

    fn run(
        &self,
        scratch: &ScratchDir,
        code: &str,
        mode: OutputMode,
        arch: &ArchValue,
    ) -> Result<Vec<u8>, ToolchainError> {
        let source = scratch.path().join(format!("{}.cu", KERNEL_STEM));
        let output = scratch.path().join(format!("{}.{}", KERNEL_STEM, mode));

        fs::write(&source, code).map_err(|source_err| ToolchainError::Io {
            context: "failed to write kernel source",
            path: source.clone(),
            source: source_err,
        })?;

        let args = self.command_args(mode, arch, &source, &output);
        log::trace!("{} {:?}", self.config.nvcc.display(), args);

        let result = Command::new(&self.config.nvcc)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ToolchainError::Spawn {
                program: self.config.nvcc.display().to_string(),
                source: e,
            })?;

        if !result.status.success() {
            let mut combined = String::from_utf8_lossy(&result.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&result.stderr));
            return Err(ToolchainError::Failed {
                status: result.status,
                code: code.to_string(),
                output: combined,
            });
        }

        let data = fs::read(&output).map_err(|e| ToolchainError::Io {
            context: "failed to read compiler output",
            path: output.clone(),
            source: e,
        })?;
        if data.is_empty() {
            return Err(ToolchainError::EmptyOutput);
        }
        Ok(data)
    }
}

impl DeviceCompiler for NvccCompiler {
    fn compile(
        &self,
        code: &str,
        mode: OutputMode,
        arch: &ArchValue,
    ) -> Result<Vec<u8>, ToolchainError> {
        let scratch = ScratchDir::create(&self.config.work_dir, self.config.keep_temps)?;
        log::info!("nvcc: compiling {} bytes of source to {} (arch {})", code.len(), mode, arch);
        let data = self.run(&scratch, code, mode, arch)?;
        log::debug!("nvcc: produced {} bytes", data.len());
        Ok(data)
    }
}

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Per-compile directory, removed on drop unless kept.
struct ScratchDir {
    path: PathBuf,
    keep: bool,
}

impl ScratchDir {
    fn create(parent: &Path, keep: bool) -> Result<Self, ToolchainError> {
        let n = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = parent.join(format!("cuda-scope-{}-{}", std::process::id(), n));
        fs::create_dir_all(&path).map_err(|e| ToolchainError::Io {
            context: "failed to create scratch directory",
            path: path.clone(),
            source: e,
        })?;
        Ok(Self { path, keep })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.keep {
            log::debug!("keeping nvcc scratch directory {}", self.path.display());
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.path) {
            log::warn!("failed to remove {}: {}", self.path.display(), e);
        }
    }
}
