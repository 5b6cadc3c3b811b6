//! Derived-field operations run after each evaluation.

use std::fmt;
use std::str::FromStr;

use rf_mesh::{FieldArray, MeshError, UnstructuredGrid, cell_gradients, vorticity_from_gradients};

use crate::error::{ModelError, ModelResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Gradients,
    Vorticity,
}

impl FromStr for Operation {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s {
            "gradients" => Ok(Operation::Gradients),
            "vorticity" => Ok(Operation::Vorticity),
            other => Err(ModelError::UnsupportedOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Gradients => f.write_str(rf_mesh::GRADIENTS),
            Operation::Vorticity => f.write_str(rf_mesh::VORTICITY),
        }
    }
}

/// Active operations. Request order does not matter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OperationSet {
    pub gradients: bool,
    pub vorticity: bool,
}

impl OperationSet {
    /// Parse every name; one unknown name rejects the whole list.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> ModelResult<Self> {
        names.iter().try_fold(Self::default(), |mut set, name| {
            match name.as_ref().parse()? {
                Operation::Gradients => set.gradients = true,
                Operation::Vorticity => set.vorticity = true,
            }
            Ok(set)
        })
    }

    pub fn is_empty(&self) -> bool {
        !self.gradients && !self.vorticity
    }

    pub fn contains(&self, op: Operation) -> bool {
        match op {
            Operation::Gradients => self.gradients,
            Operation::Vorticity => self.vorticity,
        }
    }

    /// Cell fields derived from `field`, each under its own name.
    pub fn apply(&self, grid: &UnstructuredGrid, field: &FieldArray) -> ModelResult<Vec<FieldArray>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if self.vorticity && field.components != 3 {
            return Err(MeshError::FieldShape {
                name: field.name.clone(),
                what: "vorticity needs a vector field".to_string(),
            }
            .into());
        }
        let gradients = cell_gradients(grid, field)?;
        let mut derived = Vec::with_capacity(2);
        if self.vorticity {
            derived.push(vorticity_from_gradients(&gradients)?);
        }
        if self.gradients {
            derived.push(gradients);
        }
        Ok(derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_does_not_matter() {
        let a = OperationSet::parse(&["vorticity", "gradients"]).unwrap();
        let b = OperationSet::parse(&["gradients", "vorticity"]).unwrap();
        assert_eq!(a, b);
        assert!(a.contains(Operation::Gradients) && a.contains(Operation::Vorticity));
    }

    #[test]
    fn unknown_names_are_reported() {
        let err = OperationSet::parse(&["gradients", "bogus"]).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedOperation(ref n) if n == "bogus"));
    }

    #[test]
    fn scalar_fields_get_three_gradient_components() {
        let grid = UnstructuredGrid::structured_box([3, 1, 1], [0.0; 3], [3.0, 1.0, 1.0]).unwrap();
        let p = FieldArray::new("p", 1, vec![0.0, 1.0, 2.0]).unwrap();
        let set = OperationSet::parse(&["gradients"]).unwrap();
        let derived = set.apply(&grid, &p).unwrap();
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].name, "gradients");
        assert_eq!(derived[0].components, 3);

        let set = OperationSet::parse(&["vorticity"]).unwrap();
        assert!(set.apply(&grid, &p).is_err());
    }
}
