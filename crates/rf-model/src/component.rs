//! Visualization components and their exported geometry.

use rf_mesh::{
    CellLocator, FieldArray, PolyData, StreamlineParams, UnstructuredGrid, plane_cut, surface, trace, tubes,
    write_vtp,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::StreamlineConfig;
use crate::error::{ModelError, ModelResult};

/// Component request as it arrives from a caller: a kind plus whatever
/// parameters that kind needs. Validated into a [`VisualizationComponent`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComponentSpec {
    pub kind: String,
    pub origin: Option<[f64; 3]>,
    pub normal: Option<[f64; 3]>,
    pub center: Option<[f64; 3]>,
    pub radius: Option<f64>,
    pub propagation: Option<f64>,
    pub tube_radius: Option<f64>,
    pub tube_sides: Option<usize>,
    pub resolution: Option<usize>,
    pub field: Option<String>,
}

impl ComponentSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VisualizationComponent {
    #[default]
    Surface,
    Plane {
        origin: [f64; 3],
        normal: [f64; 3],
    },
    Streamlines {
        center: [f64; 3],
        radius: f64,
        propagation: f64,
        tube_radius: f64,
        tube_sides: usize,
        resolution: usize,
        field: String,
    },
}

fn required<T: Clone>(value: &Option<T>, name: &'static str) -> ModelResult<T> {
    value.clone().ok_or(ModelError::MissingParameter(name))
}

impl TryFrom<&ComponentSpec> for VisualizationComponent {
    type Error = ModelError;

    fn try_from(spec: &ComponentSpec) -> ModelResult<Self> {
        match spec.kind.as_str() {
            "surface" => Ok(Self::Surface),
            "plane" => Ok(Self::Plane {
                origin: required(&spec.origin, "origin")?,
                normal: required(&spec.normal, "normal")?,
            }),
            "streamlines" => Ok(Self::Streamlines {
                center: required(&spec.center, "center")?,
                radius: required(&spec.radius, "radius")?,
                propagation: required(&spec.propagation, "propagation")?,
                tube_radius: required(&spec.tube_radius, "tubeRadius")?,
                tube_sides: required(&spec.tube_sides, "tubeSides")?,
                resolution: required(&spec.resolution, "resolution")?,
                field: required(&spec.field, "field")?,
            }),
            other => Err(ModelError::InvalidComponent(other.to_string())),
        }
    }
}

impl VisualizationComponent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::Plane { .. } => "plane",
            Self::Streamlines { .. } => "streamlines",
        }
    }

    /// Extract this component's geometry from the grid and its point data.
    pub fn build(
        &self,
        grid: &UnstructuredGrid,
        locator: &CellLocator,
        point_data: &[FieldArray],
        config: &StreamlineConfig,
    ) -> ModelResult<PolyData> {
        let poly = match self {
            Self::Surface => surface(grid, point_data)?,
            Self::Plane { origin, normal } => plane_cut(grid, point_data, *origin, *normal)?,
            Self::Streamlines {
                center,
                radius,
                propagation,
                tube_radius,
                tube_sides,
                resolution,
                field,
            } => {
                let params = StreamlineParams {
                    center: *center,
                    radius: *radius,
                    propagation: *propagation,
                    resolution: *resolution,
                    initial_step: config.initial_step,
                    min_step: config.min_step,
                    max_steps: config.max_steps,
                };
                let lines = trace(grid, locator, point_data, field, &params)?;
                tubes(&lines, field, *tube_radius, *tube_sides)?
            }
        };
        debug!(kind = self.kind(), points = poly.n_points(), "component built");
        Ok(poly)
    }
}

/// Exported scene: the component and its geometry with point data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneExport {
    pub component: VisualizationComponent,
    pub geometry: PolyData,
}

impl SceneExport {
    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The geometry alone, as a `.vtp` file.
    pub fn to_vtp(&self) -> ModelResult<Vec<u8>> {
        let mut bytes = Vec::new();
        write_vtp(&mut bytes, &self.geometry)?;
        Ok(bytes)
    }
}
