//! Boundary contract for native inference engines.
//!
//! An engine compiles a model into an executable session; this crate
//! defines the types crossing that boundary (tensor values, memory
//! locations, I/O descriptors) and the traits an engine implements.
//! The session lifecycle and marshaling layer lives in
//! `inferlink-session`.
//!
//! With the `ort` feature, an [ONNX Runtime](https://onnxruntime.ai)
//! engine is provided through a thin C shim; the shim and
//! libonnxruntime are linked externally by the build system.

mod backend;
mod engine;
mod env;
mod error;
#[cfg(feature = "ort")]
mod ffi;
#[cfg(feature = "ort")]
mod ort;
mod tensor;

pub use backend::{BackendInfo, list_supported_backends};
pub use engine::{Engine, EngineOptions, EngineSession, IoBinding, ModelSource, OptLevel, RunOptions};
pub use env::{EngineEnv, LogLevel, env, init_env};
pub use error::Error;
#[cfg(feature = "ort")]
pub use ort::{OrtEngine, OrtSession};
pub use tensor::{
    Dim, ElementType, IoDesc, MemoryLocation, NativeValue, Ownership, TensorValue, ValueKind,
    element_count,
};
