use crate::error::{Result, SymregError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Regression dataset: named input columns plus the expected response, all
/// row-aligned. The core only reads it; loading is a collaborator concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    inputs: HashMap<String, Vec<f64>>,
    response: Vec<f64>,
    size: usize,
}

impl Dataset {
    /// Validates that every input column and the response share one length.
    pub fn new(inputs: HashMap<String, Vec<f64>>, response: Vec<f64>) -> Result<Self> {
        let size = response.len();
        for (name, column) in &inputs {
            if column.len() != size {
                return Err(SymregError::DatasetShapeMismatch(format!(
                    "input '{}' has {} rows, response has {}",
                    name,
                    column.len(),
                    size
                )));
            }
        }
        Ok(Self {
            inputs,
            response,
            size,
        })
    }

    pub fn input(&self, name: &str) -> Result<&[f64]> {
        self.inputs
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SymregError::UnknownInput(name.to_string()))
    }

    pub fn response(&self) -> &[f64] {
        &self.response
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(v: f64, n: usize) -> Vec<f64> {
        vec![v; n]
    }

    #[test]
    fn uniform_lengths_accepted() {
        let mut inputs = HashMap::new();
        inputs.insert("x".to_string(), column(1.0, 10));
        inputs.insert("y".to_string(), column(2.0, 10));
        let data = Dataset::new(inputs, column(3.0, 10)).unwrap();
        assert_eq!(data.len(), 10);
        assert_eq!(data.input("x").unwrap()[0], 1.0);
    }

    #[test]
    fn ragged_input_rejected() {
        let mut inputs = HashMap::new();
        inputs.insert("x".to_string(), column(1.0, 9));
        let err = Dataset::new(inputs, column(3.0, 10)).unwrap_err();
        assert!(matches!(err, SymregError::DatasetShapeMismatch(_)));
    }

    #[test]
    fn missing_input_is_unknown() {
        let data = Dataset::new(HashMap::new(), column(0.0, 3)).unwrap();
        assert!(matches!(
            data.input("x").unwrap_err(),
            SymregError::UnknownInput(_)
        ));
    }
}
