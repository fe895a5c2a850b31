//! Static capability report: which execution providers this build can
//! target. Assembled from the provider features compiled in, independent
//! of any session.

/// One available execution provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInfo {
    pub name: &'static str,
    /// Whether the provider's native library ships with this build, as
    /// opposed to being discovered at run time.
    pub bundled: bool,
}

/// Lists the execution providers statically linked into this build.
/// CPU is always present and bundled.
pub fn list_supported_backends() -> Vec<BackendInfo> {
    let mut backends = vec![BackendInfo {
        name: "cpu",
        bundled: true,
    }];
    if cfg!(feature = "webgpu") {
        backends.push(BackendInfo {
            name: "webgpu",
            bundled: true,
        });
    }
    if cfg!(feature = "cuda") {
        backends.push(BackendInfo {
            name: "cuda",
            bundled: false,
        });
    }
    if cfg!(feature = "tensorrt") {
        backends.push(BackendInfo {
            name: "tensorrt",
            bundled: false,
        });
    }
    if cfg!(feature = "coreml") {
        backends.push(BackendInfo {
            name: "coreml",
            bundled: true,
        });
    }
    backends
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_is_always_bundled() {
        let backends = list_supported_backends();
        assert_eq!(backends[0].name, "cpu");
        assert!(backends[0].bundled);
    }
}
