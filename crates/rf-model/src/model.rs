//! `FlowModel`: one mesh, one evaluator, and the queries over its field.

use std::sync::OnceLock;

use rf_archive::{ModelTopology, open_model};
use rf_mesh::{
    CellLocator, ColorMode, FieldArray, Integral, PolyData, Rendered, UnstructuredGrid, integrate_grid,
    integrate_poly, render, write_vtu,
};
use rf_rom::{AssembledRom, EngineFactory, NativeRomEngine, RomEngine, assemble};
use tracing::{info, warn};

use crate::component::{ComponentSpec, SceneExport, VisualizationComponent};
use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use crate::operations::OperationSet;
use crate::source::{ArchiveSource, Fetcher, MeshSource};
use crate::state::FieldState;

/// Name of the reconstructed velocity field.
pub const VELOCITY: &str = "U";
pub const PRESSURE: &str = "p";
pub const EDDY_VISCOSITY: &str = "nut";

/// What produces the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Reduced-order model assembled from an archive.
    Rom,
    /// Fields supplied by an external inference step.
    Inference,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Uninitialized,
    MeshLoaded,
    ModelAssembled,
    Ready,
}

/// One evaluation request.
#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    /// Solve the ROM for a viscosity and inlet velocity.
    Rom { viscosity: f64, velocity: [f64; 2] },
    /// Install an externally computed cell field. `data` holds either one
    /// value per cell or three blocks `[x.., y.., z..]` of one value per cell.
    Field { name: String, data: Vec<f64> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegrationTarget {
    Grid,
    Component,
}

struct Mesh {
    grid: UnstructuredGrid,
    locator: CellLocator,
}

pub struct FlowModel {
    backend: Backend,
    config: ModelConfig,
    factory: EngineFactory,
    fetcher: Option<Box<dyn Fetcher>>,
    phase: Phase,
    mesh: Option<Mesh>,
    rom: Option<AssembledRom>,
    operations: OperationSet,
    component: VisualizationComponent,
    field: Option<FieldState>,
    /// Geometry of `component` over `field`, built at most once per field.
    scene: OnceLock<PolyData>,
}

impl FlowModel {
    pub fn new(backend: Backend, config: ModelConfig) -> Self {
        let engine_config = config.engine_config();
        let factory: EngineFactory =
            Box::new(move || Box::new(NativeRomEngine::new(engine_config.clone())) as Box<dyn RomEngine>);
        Self {
            backend,
            config,
            factory,
            fetcher: None,
            phase: Phase::Uninitialized,
            mesh: None,
            rom: None,
            operations: OperationSet::default(),
            component: VisualizationComponent::default(),
            field: None,
            scene: OnceLock::new(),
        }
    }

    pub fn rom(config: ModelConfig) -> Self {
        Self::new(Backend::Rom, config)
    }

    pub fn inference(config: ModelConfig) -> Self {
        Self::new(Backend::Inference, config)
    }

    /// Build engines with `factory` instead of the native engine.
    pub fn with_engine_factory(mut self, factory: EngineFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn topology(&self) -> Option<&ModelTopology> {
        self.rom.as_ref().map(AssembledRom::topology)
    }

    pub fn field(&self) -> Option<&FieldState> {
        self.field.as_ref()
    }

    pub fn operations(&self) -> OperationSet {
        self.operations
    }

    pub fn component(&self) -> &VisualizationComponent {
        &self.component
    }

    pub fn grid(&self) -> Option<&UnstructuredGrid> {
        self.mesh.as_ref().map(|m| &m.grid)
    }

    fn mesh(&self) -> ModelResult<&Mesh> {
        self.mesh.as_ref().ok_or(ModelError::ModelNotReady {
            what: "no mesh loaded",
        })
    }

    fn ready(&self) -> ModelResult<(&Mesh, &FieldState)> {
        let mesh = self.mesh()?;
        let field = self.field.as_ref().ok_or(ModelError::ModelNotReady {
            what: "no field evaluated yet",
        })?;
        Ok((mesh, field))
    }

    /// Install a new field and drop the geometry built from the old one.
    fn set_field(&mut self, field: Option<FieldState>) {
        self.field = field;
        self.scene = OnceLock::new();
    }

    /// Read a JSON grid document or a `.vtu` file. Replaces any previous
    /// mesh, model and field.
    pub fn load_mesh(&mut self, source: MeshSource) -> ModelResult<()> {
        let bytes = source.into_bytes(self.fetcher.as_deref())?;
        let grid = UnstructuredGrid::from_slice(&bytes)?;
        let locator = CellLocator::new(&grid, self.config.probe_tolerance);
        info!(cells = grid.n_cells(), "mesh loaded");

        self.mesh = Some(Mesh { grid, locator });
        self.rom = None;
        self.set_field(None);
        self.phase = Phase::MeshLoaded;
        Ok(())
    }

    /// Decode a model archive and assemble a fresh engine from it.
    ///
    /// Decoding errors leave the model as it was. Once assembly starts the
    /// previous engine is gone; on failure the model is back at
    /// [`Phase::MeshLoaded`].
    pub fn load_model(&mut self, source: ArchiveSource) -> ModelResult<()> {
        if self.backend != Backend::Rom {
            return Err(ModelError::InvalidRequest {
                what: "inference models do not load archives".to_string(),
            });
        }
        self.mesh()?;
        let bytes = source.into_bytes(self.fetcher.as_deref())?;
        let (topology, archive) = open_model(bytes)?;

        self.rom = None;
        self.set_field(None);
        self.phase = Phase::MeshLoaded;
        let rom = assemble((self.factory)(), &topology, &archive)?;
        self.rom = Some(rom);
        self.phase = Phase::ModelAssembled;
        Ok(())
    }

    /// Parse and install the derived-field operations for later updates.
    /// An unknown name leaves the current set untouched.
    pub fn set_operations<S: AsRef<str>>(&mut self, names: &[S]) -> ModelResult<()> {
        self.operations = OperationSet::parse(names)?;
        Ok(())
    }

    /// Evaluate a query and replace the field state.
    pub fn update(&mut self, query: Query) -> ModelResult<()> {
        let n_cells = self.mesh()?.grid.n_cells();
        let (primary, companions) = match (self.backend, query) {
            (Backend::Rom, Query::Rom { viscosity, velocity }) => self.evaluate_rom(viscosity, velocity, n_cells)?,
            (Backend::Inference, Query::Field { name, data }) => (shape_field(name, &data, n_cells)?, Vec::new()),
            (backend, _) => {
                return Err(ModelError::InvalidRequest {
                    what: format!("query does not match the {backend:?} backend"),
                });
            }
        };

        let grid = &self.mesh()?.grid;
        let state = FieldState::build(grid, primary, companions, &self.operations)?;
        self.set_field(Some(state));
        self.phase = Phase::Ready;
        Ok(())
    }

    fn evaluate_rom(
        &mut self,
        viscosity: f64,
        velocity: [f64; 2],
        n_cells: usize,
    ) -> ModelResult<(FieldArray, Vec<FieldArray>)> {
        let rom = self.rom.as_mut().ok_or(ModelError::ModelNotReady {
            what: "no assembled model",
        })?;
        rf_core::ensure_positive(viscosity, "viscosity")?;
        for v in velocity {
            rf_core::ensure_finite(v, "inlet velocity")?;
        }

        let fields = rom.evaluate(viscosity, velocity)?;
        let sized = |what: &str, data: &[f64], components: usize| -> ModelResult<FieldArray> {
            if data.len() != components * n_cells {
                return Err(ModelError::InvalidRequest {
                    what: format!(
                        "{what} has {} values, the mesh needs {}",
                        data.len(),
                        components * n_cells
                    ),
                });
            }
            Ok(FieldArray::from_blocked(what, components, data)?)
        };

        let u = sized(VELOCITY, &fields.velocity, 3)?;
        let mut companions = Vec::new();
        if let Some(p) = &fields.pressure {
            companions.push(sized(PRESSURE, p, 1)?);
        }
        if let Some(nut) = &fields.nut {
            companions.push(sized(EDDY_VISCOSITY, nut, 1)?);
        }
        Ok((u, companions))
    }

    /// Validate `spec`, extract its geometry from the current field, and make
    /// it the active component.
    pub fn set_component(&mut self, spec: &ComponentSpec) -> ModelResult<SceneExport> {
        let component = VisualizationComponent::try_from(spec)?;
        let (mesh, field) = self.ready()?;
        let geometry = component.build(&mesh.grid, &mesh.locator, field.point_fields(), &self.config.streamlines)?;
        self.component = component.clone();
        self.scene = OnceLock::from(geometry.clone());
        Ok(SceneExport { component, geometry })
    }

    /// Geometry of the active component, extracted on first use after each
    /// update.
    fn geometry(&self) -> ModelResult<&PolyData> {
        if let Some(geometry) = self.scene.get() {
            return Ok(geometry);
        }
        let (mesh, field) = self.ready()?;
        let geometry =
            self.component
                .build(&mesh.grid, &mesh.locator, field.point_fields(), &self.config.streamlines)?;
        Ok(self.scene.get_or_init(|| geometry))
    }

    /// Current component geometry.
    pub fn scene(&self) -> ModelResult<SceneExport> {
        Ok(SceneExport {
            component: self.component.clone(),
            geometry: self.geometry()?.clone(),
        })
    }

    pub fn integrate(&self, field: &str, target: IntegrationTarget) -> ModelResult<Integral> {
        let (mesh, state) = self.ready()?;
        let integral = match target {
            IntegrationTarget::Grid => integrate_grid(&mesh.grid, state.point_field(field)?)?,
            IntegrationTarget::Component => integrate_poly(self.geometry()?, field)?,
        };
        Ok(integral)
    }

    /// Sample a point field as `[x, y, z, magnitude]`.
    pub fn probe(&self, field: &str, point: [f64; 3]) -> ModelResult<[f64; 4]> {
        let (mesh, state) = self.ready()?;
        let values = state.point_field(field)?;
        rf_mesh::probe(&mesh.grid, &mesh.locator, values, point).map_err(|err| {
            if matches!(err, rf_mesh::MeshError::OutOfDomain { .. }) {
                warn!(field, ?point, "probe outside the mesh");
            }
            err.into()
        })
    }

    /// Colors for every point of the active component.
    pub fn render(&self, field: &str, mode: ColorMode, range: Option<[f64; 2]>) -> ModelResult<Rendered> {
        Ok(render(self.geometry()?.point_field(field)?, mode, range)?)
    }

    /// The grid with the current cell and point data, as a `.vtu` file.
    pub fn export_grid(&self) -> ModelResult<Vec<u8>> {
        let mesh = self.mesh()?;
        let doc = match &self.field {
            Some(state) => mesh
                .grid
                .to_document(state.cell_fields().to_vec(), state.point_fields().to_vec()),
            None => mesh.grid.to_document(mesh.grid.cell_data().to_vec(), Vec::new()),
        };
        let mut bytes = Vec::new();
        write_vtu(&mut bytes, &doc)?;
        Ok(bytes)
    }
}

impl std::fmt::Debug for FlowModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowModel")
            .field("backend", &self.backend)
            .field("phase", &self.phase)
            .field("operations", &self.operations)
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

/// Infer scalar or vector layout from the data length.
pub fn shape_field(name: String, data: &[f64], n_cells: usize) -> ModelResult<FieldArray> {
    let components = if data.len() == 3 * n_cells {
        3
    } else if data.len() == n_cells {
        1
    } else {
        return Err(ModelError::InvalidFieldData {
            len: data.len(),
            n_cells,
        });
    };
    Ok(FieldArray::from_blocked(name, components, data)?)
}
