//! The evaluated field and everything derived from it.

use rf_mesh::{FieldArray, UnstructuredGrid, cell_to_point};

use crate::error::ModelResult;
use crate::operations::OperationSet;

/// Current field on the mesh. Built whole and swapped in whole, so a
/// failed evaluation never leaves a half-updated state behind.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldState {
    name: String,
    components: usize,
    /// Primary field first, then companions (`p`, `nut`), then derived fields.
    cell_fields: Vec<FieldArray>,
    /// Cell fields averaged onto the points, same order.
    point_fields: Vec<FieldArray>,
}

impl FieldState {
    pub(crate) fn build(
        grid: &UnstructuredGrid,
        primary: FieldArray,
        companions: Vec<FieldArray>,
        operations: &OperationSet,
    ) -> ModelResult<Self> {
        for f in &companions {
            f.expect_tuples(grid.n_cells())?;
        }
        let derived = operations.apply(grid, &primary)?;
        let name = primary.name.clone();
        let components = primary.components;

        let mut cell_fields = Vec::with_capacity(1 + companions.len() + derived.len());
        cell_fields.push(primary);
        cell_fields.extend(companions);
        cell_fields.extend(derived);
        let point_fields = cell_fields
            .iter()
            .map(|f| cell_to_point(grid, f))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            name,
            components,
            cell_fields,
            point_fields,
        })
    }

    /// Name of the evaluated field (`U` for ROM evaluations).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 1 for scalars, 3 for vectors.
    pub fn components(&self) -> usize {
        self.components
    }

    pub fn primary(&self) -> &FieldArray {
        &self.cell_fields[0]
    }

    pub fn cell_fields(&self) -> &[FieldArray] {
        &self.cell_fields
    }

    pub fn point_fields(&self) -> &[FieldArray] {
        &self.point_fields
    }

    pub fn cell_field(&self, name: &str) -> ModelResult<&FieldArray> {
        Ok(rf_mesh::field::find(&self.cell_fields, name)?)
    }

    pub fn point_field(&self, name: &str) -> ModelResult<&FieldArray> {
        Ok(rf_mesh::field::find(&self.point_fields, name)?)
    }

    pub fn has(&self, name: &str) -> bool {
        self.cell_fields.iter().any(|f| f.name == name)
    }
}
