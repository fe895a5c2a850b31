//! Resolves configured output location tokens against the output schema.

use std::collections::BTreeMap;

use inferlink_engine::{Error, IoDesc, MemoryLocation};

/// Produces the per-output memory location list from configured
/// overrides.
///
/// No overrides means every output defaults to CPU and direct execution
/// is used (`None`). Non-empty overrides engage binding mode, which
/// requires total coverage: every override must name a declared output
/// and every declared output must have an override. A total override
/// that only names CPU degenerates back to direct execution.
pub fn resolve_output_locations(
    outputs: &[IoDesc],
    overrides: &BTreeMap<String, String>,
) -> Result<Option<Vec<MemoryLocation>>, Error> {
    if overrides.is_empty() {
        return Ok(None);
    }

    for name in overrides.keys() {
        if !outputs.iter().any(|d| d.name == *name) {
            return Err(Error::Configuration(format!(
                "preferred location names unknown output {name:?}"
            )));
        }
    }
    if overrides.len() != outputs.len() {
        return Err(Error::Configuration(format!(
            "preferred locations cover {} of {} outputs; binding requires all of them",
            overrides.len(),
            outputs.len()
        )));
    }

    let locations: Vec<MemoryLocation> = outputs
        .iter()
        .map(|d| MemoryLocation::parse(&overrides[&d.name]))
        .collect();

    if locations.iter().all(|l| l.is_default()) {
        return Ok(None);
    }
    Ok(Some(locations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use inferlink_engine::{ElementType, ValueKind};

    fn outputs(names: &[&str]) -> Vec<IoDesc> {
        names
            .iter()
            .map(|n| IoDesc {
                name: n.to_string(),
                kind: ValueKind::Tensor {
                    element_type: ElementType::F32,
                    shape: vec![],
                },
            })
            .collect()
    }

    fn overrides(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_overrides_mean_direct_mode() {
        assert_eq!(
            resolve_output_locations(&outputs(&["y"]), &BTreeMap::new()).unwrap(),
            None
        );
    }

    #[test]
    fn unknown_output_rejected() {
        let err = resolve_output_locations(&outputs(&["y"]), &overrides(&[("z", "gpu-buffer")]));
        assert!(matches!(err, Err(Error::Configuration(_))));
    }

    #[test]
    fn partial_coverage_rejected() {
        let err = resolve_output_locations(
            &outputs(&["y", "z"]),
            &overrides(&[("y", "gpu-buffer")]),
        );
        assert!(matches!(err, Err(Error::Configuration(_))));
    }

    #[test]
    fn total_coverage_in_schema_order() {
        let locations = resolve_output_locations(
            &outputs(&["y", "z"]),
            &overrides(&[("z", "gpu-buffer"), ("y", "cpu")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            locations,
            vec![
                MemoryLocation::Cpu,
                MemoryLocation::DeviceBuffer("gpu-buffer".to_string())
            ]
        );
    }

    #[test]
    fn all_cpu_override_degenerates_to_direct() {
        let resolved = resolve_output_locations(
            &outputs(&["y", "z"]),
            &overrides(&[("y", "cpu"), ("z", "cpu")]),
        )
        .unwrap();
        assert_eq!(resolved, None);
    }
}
