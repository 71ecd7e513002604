// This module holds the configuration of the external nvcc invocation: which nvcc binary to
// run, the host C++ compiler passed through -ccbin, the optimisation flag, extra options, the
// directory used for the temporary kernel source and output files, and whether those files
// are kept after compilation. NvccConfig::from_env reads the conventional CUDA environment
// variables so that a default compiler works without any explicit setup.

//! nvcc invocation settings.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Root of the CUDA toolkit; nvcc is looked up in `$CUDA_PATH/bin`.
pub const CUDA_PATH_VAR: &str = "CUDA_PATH";
/// Host C++ compiler forwarded to nvcc with `-ccbin`.
pub const HOST_CXX_VAR: &str = "CUDAHOSTCXX";
/// Directory for temporary kernel files.
pub const WORK_DIR_VAR: &str = "CUDA_SCOPE_WORK_DIR";
/// Keep temporary kernel files after compilation when set to `1` or `true`.
pub const KEEP_TEMPS_VAR: &str = "CUDA_SCOPE_KEEP_TEMPS";

/// Settings for running nvcc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NvccConfig {
    /// Program to run.
    pub nvcc: PathBuf,
    /// Host compiler passed with `-ccbin`.
    pub host_compiler: Option<PathBuf>,
    /// Optimisation flag, `-O3` by default.
    pub opt_level: String,
    /// Extra options appended after the arch arguments.
    pub options: Vec<String>,
    /// Parent directory for per-compile scratch directories.
    pub work_dir: PathBuf,
    /// Keep the scratch directory after compiling.
    pub keep_temps: bool,
}

impl Default for NvccConfig {
    fn default() -> Self {
        Self {
            nvcc: PathBuf::from("nvcc"),
            host_compiler: None,
            opt_level: "-O3".to_string(),
            options: Vec::new(),
            work_dir: env::temp_dir(),
            keep_temps: false,
        }
    }
}

impl NvccConfig {
    /// Build a configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var_os(name))
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(cuda_path) = non_empty(CUDA_PATH_VAR) {
            config.nvcc = nvcc_in_toolkit(Path::new(&cuda_path));
        }
        config.host_compiler = non_empty(HOST_CXX_VAR).map(PathBuf::from);
        if let Some(dir) = non_empty(WORK_DIR_VAR) {
            config.work_dir = PathBuf::from(dir);
        }
        config.keep_temps = non_empty(KEEP_TEMPS_VAR)
            .map(|v| {
                let v = v.to_string_lossy().to_lowercase();
                v == "1" || v == "true"
            })
            .unwrap_or(false);

        log::debug!("nvcc config: {:?}", config);
        config
    }

    pub fn with_nvcc(mut self, nvcc: impl Into<PathBuf>) -> Self {
        self.nvcc = nvcc.into();
        self
    }

    pub fn with_host_compiler(mut self, cxx: impl Into<PathBuf>) -> Self {
        self.host_compiler = Some(cxx.into());
        self
    }

    pub fn with_opt_level(mut self, opt: impl Into<String>) -> Self {
        self.opt_level = opt.into();
        self
    }

    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_keep_temps(mut self, keep: bool) -> Self {
        self.keep_temps = keep;
        self
    }
}

fn nvcc_in_toolkit(cuda_path: &Path) -> PathBuf {
    let name = if cfg!(windows) { "nvcc.exe" } else { "nvcc" };
    cuda_path.join("bin").join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let vars: HashMap<String, OsString> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = NvccConfig::from_vars(lookup(&[]));
        assert_eq!(config.nvcc, PathBuf::from("nvcc"));
        assert_eq!(config.host_compiler, None);
        assert_eq!(config.opt_level, "-O3");
        assert!(!config.keep_temps);
    }

    #[test]
    fn test_from_vars() {
        let config = NvccConfig::from_vars(lookup(&[
            ("CUDA_PATH", "/usr/local/cuda-12.4"),
            ("CUDAHOSTCXX", "/usr/bin/g++-12"),
            ("CUDA_SCOPE_WORK_DIR", "/scratch"),
            ("CUDA_SCOPE_KEEP_TEMPS", "TRUE"),
        ]));
        assert!(config.nvcc.starts_with("/usr/local/cuda-12.4/bin"));
        assert_eq!(config.host_compiler, Some(PathBuf::from("/usr/bin/g++-12")));
        assert_eq!(config.work_dir, PathBuf::from("/scratch"));
        assert!(config.keep_temps);
    }

    #[test]
    fn test_empty_vars_ignored() {
        let config = NvccConfig::from_vars(lookup(&[("CUDA_PATH", ""), ("CUDAHOSTCXX", "")]));
        assert_eq!(config.nvcc, PathBuf::from("nvcc"));
        assert_eq!(config.host_compiler, None);
    }

    #[test]
    fn test_builders() {
        let config = NvccConfig::default()
            .with_nvcc("/opt/cuda/bin/nvcc")
            .with_opt_level("-O2")
            .with_option("-lineinfo")
            .with_keep_temps(true);
        assert_eq!(config.nvcc, PathBuf::from("/opt/cuda/bin/nvcc"));
        assert_eq!(config.opt_level, "-O2");
        assert_eq!(config.options, vec!["-lineinfo".to_string()]);
        assert!(config.keep_temps);
    }
}
