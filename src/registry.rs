// This module exposes the arch accessors and the compile callback as named, dynamically typed
// entry points, the way a host framework looks them up by string. ArgValue is the dynamic value
// exchanged with callers. Converting an ArgValue into an ArchValue is where unsupported argument
// shapes are rejected with InvalidSpecType. Registry::with_cuda_functions installs the four
// CUDA entry points; any other packed function can be registered alongside them.

//! Named entry points with dynamically typed arguments.

use std::collections::HashMap;
use std::fmt;

use crate::api;
use crate::core::{ArchError, ArchResult, ArchValue};
use crate::nvcc::DeviceCompiler;
use crate::target::Target;

pub const SET_TARGET_ARCH: &str = "target.set_cuda_target_arch";
pub const GET_TARGET_ARCH: &str = "target.get_cuda_target_arch";
pub const RESET_TARGET_ARCH: &str = "target.reset_cuda_target_arch";
pub const COMPILE_CALLBACK: &str = "tvm_callback_cuda_compile";

/// Dynamically typed argument or return value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ArgValue>),
    Bytes(Vec<u8>),
}

impl ArgValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgValue::None => "none",
            ArgValue::Bool(_) => "bool",
            ArgValue::Int(_) => "int",
            ArgValue::Float(_) => "float",
            ArgValue::Str(_) => "str",
            ArgValue::List(_) => "list",
            ArgValue::Bytes(_) => "bytes",
        }
    }
}

impl From<ArchValue> for ArgValue {
    fn from(value: ArchValue) -> Self {
        match value {
            ArchValue::None => ArgValue::None,
            ArchValue::Str(s) => ArgValue::Str(s),
            ArchValue::List(entries) => {
                ArgValue::List(entries.into_iter().map(ArgValue::Str).collect())
            }
        }
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Str(s.to_string())
    }
}

impl TryFrom<ArgValue> for ArchValue {
    type Error = ArchError;

    fn try_from(value: ArgValue) -> Result<Self, Self::Error> {
        match value {
            ArgValue::None => Ok(ArchValue::None),
            ArgValue::Str(s) => Ok(ArchValue::Str(s)),
            ArgValue::List(items) => items
                .into_iter()
                .map(|item| match item {
                    ArgValue::Str(s) => Ok(s),
                    other => Err(ArchError::InvalidSpecType {
                        found: format!("list containing {}", other.type_name()),
                    }),
                })
                .collect::<ArchResult<Vec<_>>>()
                .map(ArchValue::List),
            other => Err(ArchError::InvalidSpecType {
                found: other.type_name().to_string(),
            }),
        }
    }
}

/// A registered entry point.
pub type PackedFunc = Box<dyn Fn(&[ArgValue]) -> ArchResult<ArgValue>>;

/// Functions addressable by name.
#[derive(Default)]
pub struct Registry {
    funcs: HashMap<String, PackedFunc>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the CUDA arch accessors and a compile callback using
    /// `compiler`.
    pub fn with_cuda_functions<C>(compiler: C) -> Self
    where
        C: DeviceCompiler + 'static,
    {
        let mut registry = Self::new();
        registry.register(SET_TARGET_ARCH, |args| {
            expect_arity(SET_TARGET_ARCH, args, 1..=2)?;
            let arch = ArchValue::try_from(args[0].clone())?;
            let gencode = match args.get(1) {
                None => true,
                Some(ArgValue::Bool(b)) => *b,
                Some(ArgValue::Int(i)) => *i != 0,
                Some(other) => {
                    let reason = format!("gencode must be a bool, got {}", other.type_name());
                    return Err(invalid_argument(SET_TARGET_ARCH, reason));
                }
            };
            api::set_target_arch(arch, gencode)?;
            Ok(ArgValue::None)
        });
        registry.register(GET_TARGET_ARCH, |args| {
            expect_arity(GET_TARGET_ARCH, args, 0..=1)?;
            let target = match args.first() {
                None | Some(ArgValue::None) => None,
                Some(ArgValue::Str(raw)) => Some(Target::parse(raw)?),
                Some(other) => {
                    let reason = format!("target must be a str, got {}", other.type_name());
                    return Err(invalid_argument(GET_TARGET_ARCH, reason));
                }
            };
            Ok(api::get_target_arch(target.as_ref()).into())
        });
        registry.register(RESET_TARGET_ARCH, |args| {
            expect_arity(RESET_TARGET_ARCH, args, 0..=0)?;
            api::reset_target_arch();
            Ok(ArgValue::None)
        });
        registry.register(COMPILE_CALLBACK, move |args| {
            expect_arity(COMPILE_CALLBACK, args, 1..=1)?;
            let ArgValue::Str(code) = &args[0] else {
                let reason = format!("code must be a str, got {}", args[0].type_name());
                return Err(invalid_argument(COMPILE_CALLBACK, reason));
            };
            Ok(ArgValue::Bytes(api::compile_with(&compiler, code)?))
        });
        registry
    }

    /// Register `func` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[ArgValue]) -> ArchResult<ArgValue> + 'static,
    {
        if self.funcs.insert(name.to_string(), Box::new(func)).is_some() {
            log::debug!("registry: replaced {}", name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.funcs.keys().map(String::as_str)
    }

    /// Call the function registered under `name`.
    pub fn call(&self, name: &str, args: &[ArgValue]) -> ArchResult<ArgValue> {
        let func = self.funcs.get(name).ok_or_else(|| ArchError::UnknownFunction {
            name: name.to_string(),
        })?;
        func(args)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("funcs", &names).finish()
    }
}

fn invalid_argument(func: &str, reason: String) -> ArchError {
    ArchError::InvalidArgument {
        func: func.to_string(),
        reason,
    }
}

fn expect_arity(
    func: &str,
    args: &[ArgValue],
    range: std::ops::RangeInclusive<usize>,
) -> ArchResult<()> {
    if range.contains(&args.len()) {
        Ok(())
    } else {
        Err(invalid_argument(
            func,
            format!("expected {}..={} arguments, got {}", range.start(), range.end(), args.len()),
        ))
    }
}
