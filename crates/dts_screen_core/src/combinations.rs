//! Cartesian product over parameter value sequences
//!
//! Parameters are ordered by name and enumerated in row-major order, so the
//! last parameter varies fastest. Run numbering depends on this order.

use std::collections::BTreeMap;

use crate::model::{Assignment, ParameterDefinition};

/// Iterator over every index tuple of a grid with the given shape
#[derive(Debug, Clone)]
pub struct GridIndices {
    shape: Vec<usize>,
    current: Vec<usize>,
    done: bool,
}

impl GridIndices {
    pub fn new(shape: Vec<usize>) -> Self {
        let done = shape.is_empty() || shape.contains(&0);
        Self {
            current: vec![0; shape.len()],
            shape,
            done,
        }
    }
}

impl Iterator for GridIndices {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current.clone();

        // Increment indices (row-major: last dimension varies fastest)
        for i in (0..self.shape.len()).rev() {
            self.current[i] += 1;
            if self.current[i] < self.shape[i] {
                break;
            }
            self.current[i] = 0;
            if i == 0 {
                self.done = true;
            }
        }

        Some(result)
    }
}

/// Number of combinations the parameters produce
pub fn combination_count(parameters: &BTreeMap<String, ParameterDefinition>) -> usize {
    if parameters.is_empty() {
        return 0;
    }
    parameters.values().map(ParameterDefinition::len).product()
}

/// Every assignment of the full Cartesian product, in run order
pub fn generate_combinations(
    parameters: &BTreeMap<String, ParameterDefinition>,
) -> Vec<Assignment> {
    let shape: Vec<usize> = parameters.values().map(ParameterDefinition::len).collect();
    let mut combinations = Vec::with_capacity(combination_count(parameters));

    for indices in GridIndices::new(shape) {
        let assignment: Assignment = parameters
            .iter()
            .zip(&indices)
            .map(|((name, def), &idx)| (name.clone(), def.values[idx].clone()))
            .collect();
        combinations.push(assignment);
    }

    combinations
}
