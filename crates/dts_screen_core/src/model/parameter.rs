//! Parameter definitions and the inline definition grammar
//!
//! - Range: `start:end:step`, inclusive, evenly spaced
//! - List: `a,b,c`, literal tokens
//! - Singleton: `a`, one literal token

use crate::error::{Result, ScreenError, ValidationReason};

use super::value::ParameterValue;

/// Tolerance applied at the upper end of a range to absorb round-off
pub const RANGE_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Range,
    List,
    Singleton,
}

/// A named parameter and the ordered values it sweeps over
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDefinition {
    pub name: String,
    pub kind: ParameterKind,
    /// Definition text as it appeared in the template
    pub definition: String,
    pub values: Vec<ParameterValue>,
}

impl ParameterDefinition {
    /// Parse the `def` part of a `<<name:def>>` occurrence
    pub fn parse(name: &str, definition: &str) -> Result<Self> {
        let (kind, values) = if definition.contains(':') {
            (ParameterKind::Range, parse_range(name, definition)?)
        } else if definition.contains(',') {
            let values = definition
                .split(',')
                .map(|item| ParameterValue::Text(item.trim().to_string()))
                .collect();
            (ParameterKind::List, values)
        } else {
            (
                ParameterKind::Singleton,
                vec![ParameterValue::Text(definition.trim().to_string())],
            )
        };

        Ok(Self {
            name: name.to_string(),
            kind,
            definition: definition.to_string(),
            values,
        })
    }

    /// Number of values this parameter contributes to the product
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Smallest value under [`ParameterValue::compare`]
    pub fn min(&self) -> Option<&ParameterValue> {
        self.values.iter().min_by(|a, b| a.compare(b))
    }

    /// Largest value under [`ParameterValue::compare`]
    pub fn max(&self) -> Option<&ParameterValue> {
        self.values.iter().max_by(|a, b| a.compare(b))
    }
}

fn parse_range(name: &str, definition: &str) -> Result<Vec<ParameterValue>> {
    let invalid = |reason| ScreenError::Validation {
        parameter: name.to_string(),
        definition: definition.to_string(),
        reason,
    };

    let parts: Vec<&str> = definition.split(':').collect();
    if parts.len() != 3 {
        return Err(invalid(ValidationReason::FieldCount(parts.len())));
    }

    let mut fields = [0.0f64; 3];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(ValidationReason::NotNumeric(part.to_string())))?;
    }
    let [start, end, step] = fields;

    if step <= 0.0 {
        return Err(invalid(ValidationReason::NonPositiveStep(step)));
    }

    let mut values = vec![ParameterValue::Number(start)];
    let mut current = start;
    loop {
        let next = current + step;
        if next > end + RANGE_EPSILON {
            break;
        }
        if next <= current {
            return Err(invalid(ValidationReason::StepBelowPrecision {
                step,
                value: current,
            }));
        }
        values.push(ParameterValue::Number(next));
        current = next;
    }
    Ok(values)
}
