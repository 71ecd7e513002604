// This module names the device a compiled kernel is meant for. DeviceType carries the DLPack
// DLDeviceType numbering so that codes can be handed to runtimes that speak that convention.
// from_name accepts the conventional target names, aliases included. The CUDA code is fixed by
// the numbering, so cuda_device_type is a plain constant rather than a runtime lookup.

//! Device type codes.
//!
//! Codes follow the DLPack `DLDeviceType` numbering.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DeviceType {
    Cpu = 1,
    Cuda = 2,
    CudaHost = 3,
    OpenCl = 4,
    Vulkan = 7,
    Metal = 8,
    Vpi = 9,
    Rocm = 10,
    RocmHost = 11,
    ExtDev = 12,
    CudaManaged = 13,
    OneApi = 14,
    WebGpu = 15,
    Hexagon = 16,
}

impl DeviceType {
    /// Look up a device type by its conventional name.
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "cpu" | "llvm" | "c" => DeviceType::Cpu,
            "cuda" | "gpu" | "nvptx" | "cuda_gpu" => DeviceType::Cuda,
            "cuda_host" => DeviceType::CudaHost,
            "opencl" | "cl" => DeviceType::OpenCl,
            "vulkan" | "vk" => DeviceType::Vulkan,
            "metal" => DeviceType::Metal,
            "vpi" => DeviceType::Vpi,
            "rocm" => DeviceType::Rocm,
            "rocm_host" => DeviceType::RocmHost,
            "ext_dev" => DeviceType::ExtDev,
            "cuda_managed" => DeviceType::CudaManaged,
            "oneapi" => DeviceType::OneApi,
            "webgpu" => DeviceType::WebGpu,
            "hexagon" => DeviceType::Hexagon,
            _ => return None,
        };
        Some(ty)
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// The device type CUDA kernels run on.
pub const fn cuda_device_type() -> DeviceType {
    DeviceType::Cuda
}
