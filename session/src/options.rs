//! Session configuration record.

use std::collections::BTreeMap;

use inferlink_engine::EngineOptions;
use serde::Deserialize;

/// Options supplied at load time. Engine-facing fields pass through to
/// the native engine; `preferred_output_locations` configures I/O
/// binding (see [`crate::resolve_output_locations`]).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    #[serde(flatten)]
    pub engine: EngineOptions,

    /// Output name to location token (`"cpu"` or a device buffer space
    /// id such as `"gpu-buffer"`).
    pub preferred_output_locations: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use inferlink_engine::OptLevel;

    #[test]
    fn options_from_json() {
        let opts: SessionOptions = serde_json::from_str(
            r#"{
                "opt_level": "basic",
                "enable_profiling": true,
                "preferred_output_locations": { "y": "gpu-buffer" }
            }"#,
        )
        .unwrap();
        assert_eq!(opts.engine.opt_level, OptLevel::Basic);
        assert!(opts.engine.enable_profiling);
        assert_eq!(opts.preferred_output_locations["y"], "gpu-buffer");
    }

    #[test]
    fn default_options_are_direct_mode() {
        let opts = SessionOptions::default();
        assert!(opts.preferred_output_locations.is_empty());
        assert!(!opts.engine.enable_profiling);
    }
}
