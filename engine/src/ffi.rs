//! Raw FFI bindings for the ONNX Runtime C API.
//!
//! These declarations match `onnxruntime_c_api.h`. We hand-write them
//! for the subset we need, avoiding bindgen complexity.
//!
//! The ORT C API is a function pointer table; calling through function
//! pointers from Rust FFI is cumbersome, so a thin C shim (`ort_shim.c`,
//! linked by the build system together with libonnxruntime) wraps each
//! entry point we use.

use std::os::raw::{c_char, c_float, c_void};

// Opaque types — the ORT C API uses opaque pointers.
pub type OrtApi = c_void;
pub type OrtEnv = c_void;
pub type OrtSession = c_void;
pub type OrtSessionOptions = c_void;
pub type OrtRunOptions = c_void;
pub type OrtIoBinding = c_void;
pub type OrtMemoryInfo = c_void;
pub type OrtValue = c_void;
pub type OrtStatus = c_void;

unsafe extern "C" {
    pub fn ort_api() -> *const OrtApi;
    pub fn ort_create_env(
        api: *const OrtApi,
        log_level: i32,
        name: *const c_char,
        out: *mut *mut OrtEnv,
    ) -> *mut OrtStatus;

    // --- Session options ---
    pub fn ort_create_session_options(api: *const OrtApi, out: *mut *mut OrtSessionOptions) -> *mut OrtStatus;
    pub fn ort_session_options_set_opt_level(api: *const OrtApi, opts: *mut OrtSessionOptions, level: i32) -> *mut OrtStatus;
    pub fn ort_session_options_set_intra_threads(api: *const OrtApi, opts: *mut OrtSessionOptions, n: i32) -> *mut OrtStatus;
    pub fn ort_session_options_set_inter_threads(api: *const OrtApi, opts: *mut OrtSessionOptions, n: i32) -> *mut OrtStatus;
    pub fn ort_session_options_enable_profiling(api: *const OrtApi, opts: *mut OrtSessionOptions, prefix: *const c_char) -> *mut OrtStatus;
    pub fn ort_session_options_append_provider(api: *const OrtApi, opts: *mut OrtSessionOptions, name: *const c_char) -> *mut OrtStatus;

    // --- Session ---
    pub fn ort_create_session_from_file(
        api: *const OrtApi,
        env: *mut OrtEnv,
        path: *const c_char,
        opts: *mut OrtSessionOptions,
        out: *mut *mut OrtSession,
    ) -> *mut OrtStatus;
    pub fn ort_create_session_from_memory(
        api: *const OrtApi,
        env: *mut OrtEnv,
        model_data: *const c_void,
        model_data_len: usize,
        opts: *mut OrtSessionOptions,
        out: *mut *mut OrtSession,
    ) -> *mut OrtStatus;
    pub fn ort_session_end_profiling(api: *const OrtApi, session: *mut OrtSession, out: *mut *mut c_char) -> *mut OrtStatus;

    // --- Reflection (is_input selects the input or output list) ---
    pub fn ort_io_count(api: *const OrtApi, session: *mut OrtSession, is_input: i32, out: *mut usize) -> *mut OrtStatus;
    pub fn ort_io_name(api: *const OrtApi, session: *mut OrtSession, is_input: i32, index: usize, out: *mut *mut c_char) -> *mut OrtStatus;
    pub fn ort_io_is_tensor(api: *const OrtApi, session: *mut OrtSession, is_input: i32, index: usize, out: *mut i32) -> *mut OrtStatus;
    pub fn ort_io_elem_type(api: *const OrtApi, session: *mut OrtSession, is_input: i32, index: usize, out: *mut i32) -> *mut OrtStatus;
    pub fn ort_io_ndim(api: *const OrtApi, session: *mut OrtSession, is_input: i32, index: usize, out: *mut usize) -> *mut OrtStatus;
    pub fn ort_io_dim(api: *const OrtApi, session: *mut OrtSession, is_input: i32, index: usize, axis: usize, out: *mut i64) -> *mut OrtStatus;
    /// Writes the symbolic name for an axis, or an empty string when the
    /// axis is concrete.
    pub fn ort_io_symbolic_dim(api: *const OrtApi, session: *mut OrtSession, is_input: i32, index: usize, axis: usize, out: *mut *const c_char) -> *mut OrtStatus;

    // --- Values ---
    pub fn ort_create_cpu_memory_info(api: *const OrtApi, out: *mut *mut OrtMemoryInfo) -> *mut OrtStatus;
    pub fn ort_create_device_memory_info(api: *const OrtApi, space: *const c_char, out: *mut *mut OrtMemoryInfo) -> *mut OrtStatus;
    pub fn ort_create_tensor_float(
        api: *const OrtApi,
        info: *mut OrtMemoryInfo,
        data: *mut c_float,
        data_len: usize,
        shape: *const i64,
        shape_len: usize,
        out: *mut *mut OrtValue,
    ) -> *mut OrtStatus;
    pub fn ort_get_tensor_float_data(api: *const OrtApi, value: *mut OrtValue, out: *mut *mut c_float) -> *mut OrtStatus;
    pub fn ort_get_tensor_ndim(api: *const OrtApi, value: *mut OrtValue, ndim: *mut usize) -> *mut OrtStatus;
    pub fn ort_get_tensor_shape(api: *const OrtApi, value: *mut OrtValue, shape: *mut i64, shape_len: usize) -> *mut OrtStatus;

    // --- Run ---
    pub fn ort_create_run_options(api: *const OrtApi, out: *mut *mut OrtRunOptions) -> *mut OrtStatus;
    pub fn ort_run_options_set_tag(api: *const OrtApi, opts: *mut OrtRunOptions, tag: *const c_char) -> *mut OrtStatus;
    pub fn ort_run_options_set_terminate(api: *const OrtApi, opts: *mut OrtRunOptions) -> *mut OrtStatus;
    pub fn ort_run(
        api: *const OrtApi,
        session: *mut OrtSession,
        run_options: *mut OrtRunOptions,
        input_names: *const *const c_char,
        inputs: *const *const OrtValue,
        num_inputs: usize,
        output_names: *const *const c_char,
        num_outputs: usize,
        outputs: *mut *mut OrtValue,
    ) -> *mut OrtStatus;

    // --- IO binding ---
    pub fn ort_create_io_binding(api: *const OrtApi, session: *mut OrtSession, out: *mut *mut OrtIoBinding) -> *mut OrtStatus;
    pub fn ort_bind_input(api: *const OrtApi, binding: *mut OrtIoBinding, name: *const c_char, value: *const OrtValue) -> *mut OrtStatus;
    pub fn ort_bind_output(api: *const OrtApi, binding: *mut OrtIoBinding, name: *const c_char, info: *mut OrtMemoryInfo) -> *mut OrtStatus;
    pub fn ort_clear_bindings(api: *const OrtApi, binding: *mut OrtIoBinding);
    pub fn ort_run_with_binding(api: *const OrtApi, session: *mut OrtSession, run_options: *mut OrtRunOptions, binding: *mut OrtIoBinding) -> *mut OrtStatus;
    pub fn ort_binding_output_values(api: *const OrtApi, binding: *mut OrtIoBinding, out: *mut *mut *mut OrtValue, count: *mut usize) -> *mut OrtStatus;
    pub fn ort_free_output_values(api: *const OrtApi, values: *mut *mut OrtValue);

    // --- Errors and release ---
    pub fn ort_error_message(api: *const OrtApi, status: *mut OrtStatus) -> *const c_char;
    pub fn ort_release_status(api: *const OrtApi, status: *mut OrtStatus);
    pub fn ort_release_env(api: *const OrtApi, env: *mut OrtEnv);
    pub fn ort_release_session(api: *const OrtApi, s: *mut OrtSession);
    pub fn ort_release_session_options(api: *const OrtApi, o: *mut OrtSessionOptions);
    pub fn ort_release_run_options(api: *const OrtApi, o: *mut OrtRunOptions);
    pub fn ort_release_io_binding(api: *const OrtApi, b: *mut OrtIoBinding);
    pub fn ort_release_memory_info(api: *const OrtApi, i: *mut OrtMemoryInfo);
    pub fn ort_release_value(api: *const OrtApi, v: *mut OrtValue);
    pub fn ort_free_name(api: *const OrtApi, name: *mut c_char);
}
