//! Session lifecycle and run coordination.

use std::collections::HashMap;

use inferlink_engine::{
    Engine, EngineSession, Error, IoBinding, IoDesc, LogLevel, MemoryLocation, ModelSource,
    NativeValue, RunOptions, init_env,
};
use tracing::debug;

use crate::host::HostValue;
use crate::location::resolve_output_locations;
use crate::marshal::{to_host, to_native};
use crate::options::SessionOptions;
use crate::schema::Schema;

/// Output binding context: one resolved location per declared output,
/// plus the engine's binding handle.
struct Bound<B> {
    locations: Vec<MemoryLocation>,
    context: B,
}

struct Active<S: EngineSession> {
    native: S,
    schema: Schema,
    /// Present iff at least one output prefers a non-default location.
    bound: Option<Bound<S::Binding>>,
}

enum State<S: EngineSession> {
    Uninitialized,
    Loaded(Box<Active<S>>),
    Disposed,
}

/// A loaded, executable instance of a compiled model, bound to one
/// native engine session.
///
/// Lifecycle is strict: `Uninitialized -> Loaded -> Disposed`, one
/// transition each. `run`, `dispose`, and `end_profiling` take
/// `&mut self`, so at most one operation is in flight per session.
pub struct Session<E: Engine> {
    engine: E,
    state: State<E::Session>,
}

impl<E: Engine> Session<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            state: State::Uninitialized,
        }
    }

    fn active(&self) -> Result<&Active<E::Session>, Error> {
        match &self.state {
            State::Uninitialized => Err(Error::NotInitialized),
            State::Disposed => Err(Error::AlreadyDisposed),
            State::Loaded(active) => Ok(active),
        }
    }

    fn active_mut(&mut self) -> Result<&mut Active<E::Session>, Error> {
        match &mut self.state {
            State::Uninitialized => Err(Error::NotInitialized),
            State::Disposed => Err(Error::AlreadyDisposed),
            State::Loaded(active) => Ok(active),
        }
    }

    /// Loads the model and caches its input/output schema. All state is
    /// built in temporaries and committed only on full success; a failed
    /// load leaves the session Uninitialized.
    pub fn load(&mut self, source: ModelSource<'_>, options: &SessionOptions) -> Result<(), Error> {
        match self.state {
            State::Loaded(_) => return Err(Error::AlreadyLoaded),
            State::Disposed => return Err(Error::AlreadyDisposed),
            State::Uninitialized => {}
        }
        match source {
            ModelSource::Path(p) if p.as_os_str().is_empty() => {
                return Err(Error::InvalidArgument("empty model path".into()));
            }
            ModelSource::Bytes(b) if b.is_empty() => {
                return Err(Error::InvalidArgument("empty model data".into()));
            }
            _ => {}
        }

        let env = init_env("inferlink", LogLevel::default());
        let mut native = self.engine.create_session(env, source, &options.engine)?;
        let schema = Schema::new(native.input_descs()?, native.output_descs()?);
        let bound = match resolve_output_locations(
            schema.outputs(),
            &options.preferred_output_locations,
        )? {
            Some(locations) => {
                let context = native.create_binding()?;
                Some(Bound { locations, context })
            }
            None => None,
        };

        debug!(
            engine = self.engine.name(),
            inputs = schema.inputs().len(),
            outputs = schema.outputs().len(),
            binding = bound.is_some(),
            "model loaded"
        );
        self.state = State::Loaded(Box::new(Active {
            native,
            schema,
            bound,
        }));
        Ok(())
    }

    /// Declared inputs, in model order.
    pub fn input_metadata(&self) -> Result<&[IoDesc], Error> {
        Ok(self.active()?.schema.inputs())
    }

    /// Declared outputs, in model order.
    pub fn output_metadata(&self) -> Result<&[IoDesc], Error> {
        Ok(self.active()?.schema.outputs())
    }

    /// Executes one inference invocation.
    ///
    /// Feed and fetch names absent from the schema are silently ignored,
    /// supporting sparse partial-run callers. A fetch entry of `None`
    /// asks the engine to allocate that output; `Some(value)` reuses the
    /// supplied value in place (direct mode only).
    pub fn run(
        &mut self,
        feed: &HashMap<String, HostValue>,
        fetch: &HashMap<String, Option<HostValue>>,
        options: Option<&RunOptions>,
    ) -> Result<HashMap<String, HostValue>, Error> {
        let active = self.active_mut()?;
        let Active {
            native,
            schema,
            bound,
        } = active;

        let default_options = RunOptions::default();
        let options = options.unwrap_or(&default_options);

        // Filter the feed to schema inputs, preserving schema order.
        let mut inputs: Vec<(String, NativeValue)> = Vec::new();
        for desc in schema.inputs() {
            if let Some(value) = feed.get(&desc.name) {
                let native_value = to_native(value, Some(&desc.kind), &value.location())?;
                inputs.push((desc.name.clone(), native_value));
            }
        }

        match bound {
            None => {
                let mut fetch_names: Vec<String> = Vec::new();
                let mut outputs: Vec<(String, Option<NativeValue>)> = Vec::new();
                for desc in schema.outputs() {
                    if let Some(slot) = fetch.get(&desc.name) {
                        let value = match slot {
                            None => None,
                            Some(value) => {
                                Some(to_native(value, Some(&desc.kind), &value.location())?)
                            }
                        };
                        fetch_names.push(desc.name.clone());
                        outputs.push((desc.name.clone(), value));
                    }
                }

                let results = native.run(inputs, outputs, options)?;
                if results.len() != fetch_names.len() {
                    return Err(Error::Engine(format!(
                        "engine returned {} outputs, expected {}",
                        results.len(),
                        fetch_names.len()
                    )));
                }

                let mut out = HashMap::with_capacity(results.len());
                for (name, value) in fetch_names.into_iter().zip(results) {
                    out.insert(name, to_host(value)?);
                }
                Ok(out)
            }
            Some(bound) => {
                // Pre-allocated outputs are not supported with binding.
                for desc in schema.outputs() {
                    if matches!(fetch.get(&desc.name), Some(Some(_))) {
                        return Err(Error::InvalidArgument(format!(
                            "output {:?}: pre-allocated values are not supported with io binding",
                            desc.name
                        )));
                    }
                }

                bound.context.clear();
                for (name, value) in inputs {
                    bound.context.bind_input(&name, value)?;
                }
                for (desc, location) in schema.outputs().iter().zip(&bound.locations) {
                    bound.context.bind_output(&desc.name, location)?;
                }

                native.run_bound(&mut bound.context, options)?;

                let results = bound.context.take_outputs()?;
                if results.len() != schema.outputs().len() {
                    return Err(Error::Engine(format!(
                        "binding produced {} outputs, expected {}",
                        results.len(),
                        schema.outputs().len()
                    )));
                }

                let mut out = HashMap::with_capacity(results.len());
                for (desc, value) in schema.outputs().iter().zip(results) {
                    out.insert(desc.name.clone(), to_host(value)?);
                }
                Ok(out)
            }
        }
    }

    /// Flushes the engine's profiling trace and returns its path.
    pub fn end_profiling(&mut self) -> Result<String, Error> {
        self.active_mut()?.native.end_profiling()
    }

    /// Releases the binding context, then the native session. Not
    /// idempotent: disposing twice is an error.
    pub fn dispose(&mut self) -> Result<(), Error> {
        match self.state {
            State::Uninitialized => return Err(Error::NotInitialized),
            State::Disposed => return Err(Error::AlreadyDisposed),
            State::Loaded(_) => {}
        }
        let state = std::mem::replace(&mut self.state, State::Disposed);
        if let State::Loaded(active) = state {
            let Active { native, bound, .. } = *active;
            // Binding context holds buffers tied to the session; release
            // it first.
            drop(bound);
            drop(native);
        }
        debug!(engine = self.engine.name(), "session disposed");
        Ok(())
    }
}
