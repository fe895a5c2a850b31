//! Traits a native inference engine implements to plug into the session
//! layer, plus the option records crossing that boundary.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use serde::Deserialize;

use crate::env::EngineEnv;
use crate::error::Error;
use crate::tensor::{IoDesc, MemoryLocation, NativeValue};

/// Where the model comes from. A tagged source instead of sniffing the
/// call shape: exactly one of path or in-memory bytes.
#[derive(Debug, Clone, Copy)]
pub enum ModelSource<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

/// Graph optimization level requested from the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptLevel {
    DisableAll,
    Basic,
    Extended,
    #[default]
    All,
}

/// Options the engine consumes at session creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Execution providers to try, in preference order. Empty means the
    /// engine default (CPU).
    pub execution_providers: Vec<String>,

    pub opt_level: OptLevel,

    /// 0 means the engine default.
    pub intra_op_threads: usize,
    pub inter_op_threads: usize,

    pub enable_profiling: bool,
}

/// Per-invocation options. Never changes which outputs are computed.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Logging tag attached to this invocation.
    pub tag: Option<String>,

    /// Cooperative cancellation flag the engine may honor mid-run.
    pub terminate: Option<Arc<AtomicBool>>,
}

/// A native inference engine (model compiler/executor).
pub trait Engine: Send + Sync {
    type Session: EngineSession;

    fn name(&self) -> &'static str;

    /// Compiles/loads a model into an executable native session.
    fn create_session(
        &self,
        env: &EngineEnv,
        source: ModelSource<'_>,
        options: &EngineOptions,
    ) -> Result<Self::Session, Error>;
}

/// One loaded native session. Not safe for concurrent invocations; the
/// session layer serializes calls through `&mut self`.
pub trait EngineSession: Send {
    type Binding: IoBinding;

    /// Declared inputs, in model order.
    fn input_descs(&self) -> Result<Vec<IoDesc>, Error>;

    /// Declared outputs, in model order.
    fn output_descs(&self) -> Result<Vec<IoDesc>, Error>;

    /// Direct feed/fetch execution. `outputs` slots with `None` are
    /// allocated by the engine; `Some` values are reused in place.
    /// Returns one value per requested output, in request order.
    fn run(
        &mut self,
        inputs: Vec<(String, NativeValue)>,
        outputs: Vec<(String, Option<NativeValue>)>,
        options: &RunOptions,
    ) -> Result<Vec<NativeValue>, Error>;

    fn create_binding(&mut self) -> Result<Self::Binding, Error>;

    /// Executes with inputs/outputs pre-attached to the binding.
    fn run_bound(&mut self, binding: &mut Self::Binding, options: &RunOptions)
    -> Result<(), Error>;

    /// Flushes the profiling trace accumulated since load and returns its
    /// path. Engine-defined when profiling was not enabled.
    fn end_profiling(&mut self) -> Result<String, Error>;
}

/// Pre-attaches inputs and output memory locations before a bound run,
/// avoiding implicit copies.
pub trait IoBinding {
    fn bind_input(&mut self, name: &str, value: NativeValue) -> Result<(), Error>;

    /// Requests that the named output be produced in `location`.
    fn bind_output(&mut self, name: &str, location: &MemoryLocation) -> Result<(), Error>;

    /// Retrieves the bound output values after a successful run.
    fn take_outputs(&mut self) -> Result<Vec<NativeValue>, Error>;

    /// Clears all bindings for reuse on the next run.
    fn clear(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_options_from_json() {
        let opts: EngineOptions = serde_json::from_str(
            r#"{
                "execution_providers": ["cuda", "cpu"],
                "opt_level": "extended",
                "intra_op_threads": 4,
                "enable_profiling": true
            }"#,
        )
        .unwrap();
        assert_eq!(opts.execution_providers, vec!["cuda", "cpu"]);
        assert_eq!(opts.opt_level, OptLevel::Extended);
        assert_eq!(opts.intra_op_threads, 4);
        assert_eq!(opts.inter_op_threads, 0);
        assert!(opts.enable_profiling);
    }

    #[test]
    fn engine_options_defaults() {
        let opts: EngineOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.opt_level, OptLevel::All);
        assert!(!opts.enable_profiling);
    }
}
