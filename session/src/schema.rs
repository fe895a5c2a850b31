//! Per-session input/output schema, cached once at load.

use inferlink_engine::IoDesc;

/// Immutable record of the model's declared inputs and outputs, in
/// model order. Built from engine reflection at load and never mutated;
/// safe to read concurrently.
#[derive(Debug, Clone)]
pub struct Schema {
    inputs: Vec<IoDesc>,
    outputs: Vec<IoDesc>,
}

impl Schema {
    pub fn new(inputs: Vec<IoDesc>, outputs: Vec<IoDesc>) -> Self {
        Self { inputs, outputs }
    }

    pub fn inputs(&self) -> &[IoDesc] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[IoDesc] {
        &self.outputs
    }

    pub fn input(&self, name: &str) -> Option<&IoDesc> {
        self.inputs.iter().find(|d| d.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&IoDesc> {
        self.outputs.iter().find(|d| d.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inferlink_engine::{Dim, ElementType, ValueKind};

    #[test]
    fn lookup_by_name() {
        let schema = Schema::new(
            vec![IoDesc {
                name: "x".to_string(),
                kind: ValueKind::Tensor {
                    element_type: ElementType::F32,
                    shape: vec![Dim::Symbolic("batch".to_string()), Dim::Size(3)],
                },
            }],
            vec![],
        );
        assert!(schema.input("x").is_some());
        assert!(schema.input("y").is_none());
        assert!(schema.inputs()[0].is_tensor());
    }
}
