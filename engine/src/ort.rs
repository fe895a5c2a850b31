//! ONNX Runtime engine through the C shim in `ffi.rs`.
//!
//! libonnxruntime and the shim are dynamically linked by the build
//! system; this module is compiled only with the `ort` feature. Tensor
//! support is currently f32, matching the shim surface.

use std::ffi::{CStr, CString};
use std::ptr;

use bytes::Bytes;
use once_cell::sync::OnceCell;

use crate::engine::{Engine, EngineOptions, EngineSession, IoBinding, ModelSource, RunOptions};
use crate::env::{EngineEnv, LogLevel};
use crate::error::Error;
use crate::ffi;
use crate::tensor::{
    Dim, ElementType, IoDesc, MemoryLocation, NativeValue, Ownership, TensorValue, ValueKind,
};

/// Gets the ORT API pointer (cached after first call).
fn api() -> *const ffi::OrtApi {
    unsafe { ffi::ort_api() }
}

/// Converts an OrtStatus to a Rust Result, preserving the engine's
/// message verbatim.
fn check_status(status: *mut ffi::OrtStatus) -> Result<(), Error> {
    if status.is_null() {
        return Ok(());
    }
    let msg = unsafe {
        let ptr = ffi::ort_error_message(api(), status);
        let s = CStr::from_ptr(ptr).to_string_lossy().into_owned();
        ffi::ort_release_status(api(), status);
        s
    };
    Err(Error::Engine(msg))
}

fn c_string(s: &str) -> Result<CString, Error> {
    CString::new(s).map_err(|e| Error::InvalidArgument(e.to_string()))
}

fn ort_log_level(level: LogLevel) -> i32 {
    match level {
        LogLevel::Verbose => 0,
        LogLevel::Info => 1,
        LogLevel::Warning => 2,
        LogLevel::Error => 3,
        LogLevel::Fatal => 4,
    }
}

struct OrtEnvHandle(*mut ffi::OrtEnv);

unsafe impl Send for OrtEnvHandle {}
unsafe impl Sync for OrtEnvHandle {}

impl Drop for OrtEnvHandle {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { ffi::ort_release_env(api(), self.0) };
            self.0 = ptr::null_mut();
        }
    }
}

/// ONNX Runtime engine. The native OrtEnv is created on the first
/// session load and shared for the life of the process.
pub struct OrtEngine {
    env: OnceCell<OrtEnvHandle>,
}

impl OrtEngine {
    pub fn new() -> Self {
        Self {
            env: OnceCell::new(),
        }
    }

    fn ort_env(&self, env: &EngineEnv) -> Result<*mut ffi::OrtEnv, Error> {
        let handle = self.env.get_or_try_init(|| {
            let c_name = c_string(&env.name)?;
            let mut out: *mut ffi::OrtEnv = ptr::null_mut();
            check_status(unsafe {
                ffi::ort_create_env(api(), ort_log_level(env.log_level), c_name.as_ptr(), &mut out)
            })?;
            Ok::<_, Error>(OrtEnvHandle(out))
        })?;
        Ok(handle.0)
    }
}

impl Default for OrtEngine {
    fn default() -> Self {
        Self::new()
    }
}

struct SessionOptionsHandle(*mut ffi::OrtSessionOptions);

impl Drop for SessionOptionsHandle {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { ffi::ort_release_session_options(api(), self.0) };
        }
    }
}

fn build_session_options(options: &EngineOptions) -> Result<SessionOptionsHandle, Error> {
    let mut opts: *mut ffi::OrtSessionOptions = ptr::null_mut();
    check_status(unsafe { ffi::ort_create_session_options(api(), &mut opts) })?;
    let opts = SessionOptionsHandle(opts);

    let level = match options.opt_level {
        crate::engine::OptLevel::DisableAll => 0,
        crate::engine::OptLevel::Basic => 1,
        crate::engine::OptLevel::Extended => 2,
        crate::engine::OptLevel::All => 99,
    };
    check_status(unsafe { ffi::ort_session_options_set_opt_level(api(), opts.0, level) })?;

    if options.intra_op_threads > 0 {
        check_status(unsafe {
            ffi::ort_session_options_set_intra_threads(api(), opts.0, options.intra_op_threads as i32)
        })?;
    }
    if options.inter_op_threads > 0 {
        check_status(unsafe {
            ffi::ort_session_options_set_inter_threads(api(), opts.0, options.inter_op_threads as i32)
        })?;
    }
    if options.enable_profiling {
        let prefix = c_string("inferlink")?;
        check_status(unsafe {
            ffi::ort_session_options_enable_profiling(api(), opts.0, prefix.as_ptr())
        })?;
    }
    for provider in &options.execution_providers {
        if provider == "cpu" {
            continue;
        }
        let c_name = c_string(provider)?;
        check_status(unsafe {
            ffi::ort_session_options_append_provider(api(), opts.0, c_name.as_ptr())
        })?;
    }
    Ok(opts)
}

impl Engine for OrtEngine {
    type Session = OrtSession;

    fn name(&self) -> &'static str {
        "onnxruntime"
    }

    fn create_session(
        &self,
        env: &EngineEnv,
        source: ModelSource<'_>,
        options: &EngineOptions,
    ) -> Result<OrtSession, Error> {
        let ort_env = self.ort_env(env)?;
        let opts = build_session_options(options)?;

        let mut session: *mut ffi::OrtSession = ptr::null_mut();
        let status = match source {
            ModelSource::Path(path) => {
                let c_path = c_string(&path.to_string_lossy())?;
                unsafe {
                    ffi::ort_create_session_from_file(api(), ort_env, c_path.as_ptr(), opts.0, &mut session)
                }
            }
            ModelSource::Bytes(data) => {
                if data.is_empty() {
                    return Err(Error::InvalidArgument("empty model data".into()));
                }
                unsafe {
                    ffi::ort_create_session_from_memory(
                        api(),
                        ort_env,
                        data.as_ptr() as *const _,
                        data.len(),
                        opts.0,
                        &mut session,
                    )
                }
            }
        };
        check_status(status)?;

        Ok(OrtSession { session })
    }
}

/// Holds a loaded ONNX Runtime session.
pub struct OrtSession {
    session: *mut ffi::OrtSession,
}

unsafe impl Send for OrtSession {}

impl OrtSession {
    fn io_descs(&self, is_input: bool) -> Result<Vec<IoDesc>, Error> {
        let flag = if is_input { 1 } else { 0 };
        let mut count: usize = 0;
        check_status(unsafe { ffi::ort_io_count(api(), self.session, flag, &mut count) })?;

        let mut descs = Vec::with_capacity(count);
        for i in 0..count {
            let mut name_ptr: *mut std::os::raw::c_char = ptr::null_mut();
            check_status(unsafe { ffi::ort_io_name(api(), self.session, flag, i, &mut name_ptr) })?;
            let name = unsafe {
                let s = CStr::from_ptr(name_ptr).to_string_lossy().into_owned();
                ffi::ort_free_name(api(), name_ptr);
                s
            };

            let mut is_tensor: i32 = 0;
            check_status(unsafe {
                ffi::ort_io_is_tensor(api(), self.session, flag, i, &mut is_tensor)
            })?;
            if is_tensor == 0 {
                descs.push(IoDesc {
                    name,
                    kind: ValueKind::Sequence,
                });
                continue;
            }

            let mut code: i32 = 0;
            check_status(unsafe {
                ffi::ort_io_elem_type(api(), self.session, flag, i, &mut code)
            })?;
            let element_type = elem_type_from_code(code)?;

            let mut ndim: usize = 0;
            check_status(unsafe { ffi::ort_io_ndim(api(), self.session, flag, i, &mut ndim) })?;
            let mut shape = Vec::with_capacity(ndim);
            for axis in 0..ndim {
                let mut d: i64 = 0;
                check_status(unsafe {
                    ffi::ort_io_dim(api(), self.session, flag, i, axis, &mut d)
                })?;
                if d >= 0 {
                    shape.push(Dim::Size(d));
                } else {
                    let mut sym: *const std::os::raw::c_char = ptr::null();
                    check_status(unsafe {
                        ffi::ort_io_symbolic_dim(api(), self.session, flag, i, axis, &mut sym)
                    })?;
                    let name = if sym.is_null() {
                        String::new()
                    } else {
                        unsafe { CStr::from_ptr(sym).to_string_lossy().into_owned() }
                    };
                    shape.push(Dim::Symbolic(name));
                }
            }

            descs.push(IoDesc {
                name,
                kind: ValueKind::Tensor {
                    element_type,
                    shape,
                },
            });
        }
        Ok(descs)
    }
}

fn elem_type_from_code(code: i32) -> Result<ElementType, Error> {
    match code {
        1 => Ok(ElementType::F32),
        2 => Ok(ElementType::U8),
        3 => Ok(ElementType::I8),
        4 => Ok(ElementType::U16),
        5 => Ok(ElementType::I16),
        6 => Ok(ElementType::I32),
        7 => Ok(ElementType::I64),
        8 => Ok(ElementType::Str),
        9 => Ok(ElementType::Bool),
        11 => Ok(ElementType::F64),
        12 => Ok(ElementType::U32),
        13 => Ok(ElementType::U64),
        other => Err(Error::Engine(format!("unsupported element type code {other}"))),
    }
}

/// An OrtValue with its pinned backing data.
struct OrtValueHandle {
    value: *mut ffi::OrtValue,
    _pinned: Option<Vec<f32>>,
}

impl Drop for OrtValueHandle {
    fn drop(&mut self) {
        if !self.value.is_null() {
            unsafe { ffi::ort_release_value(api(), self.value) };
            self.value = ptr::null_mut();
        }
    }
}

fn tensor_to_ort(tensor: &TensorValue) -> Result<OrtValueHandle, Error> {
    if tensor.element_type != ElementType::F32 {
        return Err(Error::Engine(format!(
            "ort shim supports f32 tensors, got {}",
            tensor.element_type
        )));
    }
    tensor.validate()?;

    let mut data: Vec<f32> = tensor
        .data
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    let mut mem_info: *mut ffi::OrtMemoryInfo = ptr::null_mut();
    check_status(unsafe { ffi::ort_create_cpu_memory_info(api(), &mut mem_info) })?;

    let mut value: *mut ffi::OrtValue = ptr::null_mut();
    let status = unsafe {
        ffi::ort_create_tensor_float(
            api(),
            mem_info,
            data.as_mut_ptr(),
            data.len(),
            tensor.shape.as_ptr(),
            tensor.shape.len(),
            &mut value,
        )
    };
    unsafe { ffi::ort_release_memory_info(api(), mem_info) };
    check_status(status)?;

    Ok(OrtValueHandle {
        value,
        _pinned: Some(data),
    })
}

fn ort_to_tensor(value: *mut ffi::OrtValue) -> Result<TensorValue, Error> {
    let mut ndim: usize = 0;
    check_status(unsafe { ffi::ort_get_tensor_ndim(api(), value, &mut ndim) })?;
    let mut shape = vec![0i64; ndim];
    if ndim > 0 {
        check_status(unsafe {
            ffi::ort_get_tensor_shape(api(), value, shape.as_mut_ptr(), ndim)
        })?;
    }

    let total: usize = shape.iter().map(|&d| d.max(0) as usize).product();
    let mut data_ptr: *mut f32 = ptr::null_mut();
    check_status(unsafe { ffi::ort_get_tensor_float_data(api(), value, &mut data_ptr) })?;

    let mut bytes = vec![0u8; total * 4];
    unsafe {
        ptr::copy_nonoverlapping(data_ptr as *const u8, bytes.as_mut_ptr(), bytes.len());
    }

    Ok(TensorValue {
        element_type: ElementType::F32,
        shape,
        data: Bytes::from(bytes),
        location: MemoryLocation::Cpu,
        ownership: Ownership::Session,
    })
}

struct RunOptionsHandle(*mut ffi::OrtRunOptions);

impl Drop for RunOptionsHandle {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { ffi::ort_release_run_options(api(), self.0) };
        }
    }
}

fn build_run_options(options: &RunOptions) -> Result<RunOptionsHandle, Error> {
    let terminate = options
        .terminate
        .as_ref()
        .is_some_and(|t| t.load(std::sync::atomic::Ordering::Relaxed));
    if options.tag.is_none() && !terminate {
        return Ok(RunOptionsHandle(ptr::null_mut()));
    }

    let mut opts: *mut ffi::OrtRunOptions = ptr::null_mut();
    check_status(unsafe { ffi::ort_create_run_options(api(), &mut opts) })?;
    let opts = RunOptionsHandle(opts);

    if let Some(tag) = &options.tag {
        let c_tag = c_string(tag)?;
        check_status(unsafe { ffi::ort_run_options_set_tag(api(), opts.0, c_tag.as_ptr()) })?;
    }
    if terminate {
        check_status(unsafe { ffi::ort_run_options_set_terminate(api(), opts.0) })?;
    }
    Ok(opts)
}

fn expect_tensor(value: &NativeValue) -> Result<&TensorValue, Error> {
    match value {
        NativeValue::Tensor(t) => Ok(t),
        _ => Err(Error::Engine("ort shim supports tensor values only".into())),
    }
}

impl EngineSession for OrtSession {
    type Binding = OrtBinding;

    fn input_descs(&self) -> Result<Vec<IoDesc>, Error> {
        self.io_descs(true)
    }

    fn output_descs(&self) -> Result<Vec<IoDesc>, Error> {
        self.io_descs(false)
    }

    fn run(
        &mut self,
        inputs: Vec<(String, NativeValue)>,
        outputs: Vec<(String, Option<NativeValue>)>,
        options: &RunOptions,
    ) -> Result<Vec<NativeValue>, Error> {
        let c_input_names: Vec<CString> = inputs
            .iter()
            .map(|(n, _)| c_string(n))
            .collect::<Result<_, _>>()?;
        let input_handles: Vec<OrtValueHandle> = inputs
            .iter()
            .map(|(_, v)| tensor_to_ort(expect_tensor(v)?))
            .collect::<Result<_, _>>()?;

        let c_output_names: Vec<CString> = outputs
            .iter()
            .map(|(n, _)| c_string(n))
            .collect::<Result<_, _>>()?;
        let mut output_handles: Vec<Option<OrtValueHandle>> = outputs
            .iter()
            .map(|(_, v)| match v {
                Some(v) => Ok(Some(tensor_to_ort(expect_tensor(v)?)?)),
                None => Ok(None),
            })
            .collect::<Result<_, Error>>()?;

        let input_ptrs: Vec<*const std::os::raw::c_char> =
            c_input_names.iter().map(|s| s.as_ptr()).collect();
        let input_values: Vec<*const ffi::OrtValue> =
            input_handles.iter().map(|h| h.value as *const _).collect();
        let output_ptrs: Vec<*const std::os::raw::c_char> =
            c_output_names.iter().map(|s| s.as_ptr()).collect();
        let mut output_values: Vec<*mut ffi::OrtValue> = output_handles
            .iter()
            .map(|h| h.as_ref().map_or(ptr::null_mut(), |h| h.value))
            .collect();

        let run_opts = build_run_options(options)?;
        check_status(unsafe {
            ffi::ort_run(
                api(),
                self.session,
                run_opts.0,
                if input_ptrs.is_empty() { ptr::null() } else { input_ptrs.as_ptr() },
                if input_values.is_empty() { ptr::null() } else { input_values.as_ptr() },
                input_values.len(),
                if output_ptrs.is_empty() { ptr::null() } else { output_ptrs.as_ptr() },
                output_values.len(),
                output_values.as_mut_ptr(),
            )
        })?;

        let mut results = Vec::with_capacity(output_values.len());
        for (i, value) in output_values.iter().enumerate() {
            results.push(NativeValue::Tensor(ort_to_tensor(*value)?));
            // Engine-allocated slots are released here; reused slots are
            // released with their handle.
            if output_handles[i].is_none() {
                unsafe { ffi::ort_release_value(api(), *value) };
            } else {
                output_handles[i] = None;
            }
        }
        drop(output_handles);
        Ok(results)
    }

    fn create_binding(&mut self) -> Result<OrtBinding, Error> {
        let mut binding: *mut ffi::OrtIoBinding = ptr::null_mut();
        check_status(unsafe { ffi::ort_create_io_binding(api(), self.session, &mut binding) })?;
        Ok(OrtBinding {
            binding,
            pinned: Vec::new(),
        })
    }

    fn run_bound(&mut self, binding: &mut OrtBinding, options: &RunOptions) -> Result<(), Error> {
        let run_opts = build_run_options(options)?;
        check_status(unsafe {
            ffi::ort_run_with_binding(api(), self.session, run_opts.0, binding.binding)
        })
    }

    fn end_profiling(&mut self) -> Result<String, Error> {
        let mut name_ptr: *mut std::os::raw::c_char = ptr::null_mut();
        check_status(unsafe {
            ffi::ort_session_end_profiling(api(), self.session, &mut name_ptr)
        })?;
        let name = unsafe {
            let s = CStr::from_ptr(name_ptr).to_string_lossy().into_owned();
            ffi::ort_free_name(api(), name_ptr);
            s
        };
        Ok(name)
    }
}

impl Drop for OrtSession {
    fn drop(&mut self) {
        if !self.session.is_null() {
            unsafe { ffi::ort_release_session(api(), self.session) };
            self.session = ptr::null_mut();
        }
    }
}

/// ORT I/O binding context. Bound input values stay pinned until the
/// binding is cleared or dropped.
pub struct OrtBinding {
    binding: *mut ffi::OrtIoBinding,
    pinned: Vec<OrtValueHandle>,
}

unsafe impl Send for OrtBinding {}

impl IoBinding for OrtBinding {
    fn bind_input(&mut self, name: &str, value: NativeValue) -> Result<(), Error> {
        let handle = tensor_to_ort(expect_tensor(&value)?)?;
        let c_name = c_string(name)?;
        check_status(unsafe {
            ffi::ort_bind_input(api(), self.binding, c_name.as_ptr(), handle.value)
        })?;
        self.pinned.push(handle);
        Ok(())
    }

    fn bind_output(&mut self, name: &str, location: &MemoryLocation) -> Result<(), Error> {
        let mut mem_info: *mut ffi::OrtMemoryInfo = ptr::null_mut();
        match location {
            MemoryLocation::Cpu => {
                check_status(unsafe { ffi::ort_create_cpu_memory_info(api(), &mut mem_info) })?;
            }
            MemoryLocation::DeviceBuffer(space) => {
                let c_space = c_string(space)?;
                check_status(unsafe {
                    ffi::ort_create_device_memory_info(api(), c_space.as_ptr(), &mut mem_info)
                })?;
            }
        }
        let c_name = c_string(name)?;
        let status = unsafe { ffi::ort_bind_output(api(), self.binding, c_name.as_ptr(), mem_info) };
        unsafe { ffi::ort_release_memory_info(api(), mem_info) };
        check_status(status)
    }

    fn take_outputs(&mut self) -> Result<Vec<NativeValue>, Error> {
        let mut values: *mut *mut ffi::OrtValue = ptr::null_mut();
        let mut count: usize = 0;
        check_status(unsafe {
            ffi::ort_binding_output_values(api(), self.binding, &mut values, &mut count)
        })?;

        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let value = unsafe { *values.add(i) };
            let tensor = ort_to_tensor(value);
            unsafe { ffi::ort_release_value(api(), value) };
            out.push(NativeValue::Tensor(tensor?));
        }
        unsafe { ffi::ort_free_output_values(api(), values) };
        Ok(out)
    }

    fn clear(&mut self) {
        unsafe { ffi::ort_clear_bindings(api(), self.binding) };
        self.pinned.clear();
    }
}

impl Drop for OrtBinding {
    fn drop(&mut self) {
        if !self.binding.is_null() {
            unsafe { ffi::ort_release_io_binding(api(), self.binding) };
            self.binding = ptr::null_mut();
        }
    }
}
