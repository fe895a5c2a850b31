//! Inference session layer over a native model-execution engine.
//!
//! Owns the session lifecycle (`Uninitialized -> Loaded -> Disposed`),
//! caches the model's input/output schema at load, marshals host values
//! across the CPU/device boundary, and coordinates each run either in
//! direct feed/fetch mode or through explicit I/O binding when outputs
//! are configured to land in a particular memory space.
//!
//! # Usage
//!
//! ```no_run
//! use std::collections::HashMap;
//! use inferlink_engine::{Engine, ModelSource};
//! use inferlink_session::{Error, HostValue, Session, SessionOptions};
//!
//! fn classify<E: Engine>(engine: E) -> Result<Vec<f32>, Error> {
//!     let mut session = Session::new(engine);
//!     session.load(ModelSource::Path("model.onnx".as_ref()), &SessionOptions::default())?;
//!
//!     let feed = HashMap::from([
//!         ("x".to_string(), HostValue::from_f32(vec![1, 3], &[1.0, 2.0, 3.0])?),
//!     ]);
//!     let fetch = HashMap::from([("y".to_string(), None)]);
//!     let results = session.run(&feed, &fetch, None)?;
//!     let y = results["y"].as_f32()?;
//!
//!     session.dispose()?;
//!     Ok(y)
//! }
//! ```

mod host;
mod location;
mod marshal;
mod options;
mod schema;
mod session;

pub use host::{HostTensor, HostValue};
pub use location::resolve_output_locations;
pub use marshal::{to_host, to_native};
pub use options::SessionOptions;
pub use schema::Schema;
pub use session::Session;

pub use inferlink_engine::{
    BackendInfo, Dim, ElementType, Engine, EngineOptions, EngineSession, Error, IoBinding, IoDesc,
    MemoryLocation, ModelSource, NativeValue, OptLevel, Ownership, RunOptions, TensorValue,
    ValueKind, list_supported_backends,
};
