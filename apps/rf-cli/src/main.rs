use clap::{Args, Parser, Subcommand, ValueEnum};
use rf_archive::fixtures::SyntheticRom;
use rf_archive::{Stabilization, open_model};
use rf_mesh::UnstructuredGrid;
use rf_model::{
    ArchiveSource, ColorMode, ComponentSpec, FileFetcher, FlowModel, IntegralSum, IntegrationTarget, MeshSource,
    ModelConfig, ModelError, ModelResult, Query,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rf-cli")]
#[command(about = "romflow CLI - evaluate reduced-order flow models on unstructured meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the topology of a model archive
    Inspect {
        /// Path to the ZIP model archive
        archive: PathBuf,
    },
    /// Evaluate a model and print integrals and probes
    Evaluate {
        #[command(flatten)]
        run: RunArgs,
        /// Point to sample, as x,y,z (repeatable)
        #[arg(long, value_parser = parse_point)]
        probe: Vec<[f64; 3]>,
        /// Write the grid with the evaluated fields (.vtu)
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Evaluate a model and write a component scene as JSON, or as VTK
    /// PolyData when the output ends in .vtp
    Render {
        #[command(flatten)]
        run: RunArgs,
        /// Component description (JSON file)
        #[arg(long)]
        component: Option<PathBuf>,
        /// Field to color by
        #[arg(long, default_value = "U")]
        field: String,
        /// Color component: -1 for magnitude, 0-2 for a component
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        color_index: i32,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate a synthetic model on a generated box mesh
    Demo {
        /// Cells along x
        #[arg(long, default_value_t = 8)]
        cells: usize,
        #[arg(long, value_enum, default_value_t = Scheme::Ppe)]
        stabilization: Scheme,
        #[arg(long, default_value_t = 0.1)]
        viscosity: f64,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Grid document (JSON) or VTK unstructured grid (.vtu)
    #[arg(long)]
    mesh: PathBuf,
    /// Model archive (ZIP)
    #[arg(long)]
    archive: PathBuf,
    /// Model configuration (YAML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Kinematic viscosity
    #[arg(long)]
    viscosity: f64,
    /// Inlet velocity x component
    #[arg(long)]
    ux: f64,
    /// Inlet velocity y component
    #[arg(long, default_value_t = 0.0)]
    uy: f64,
    /// Derived fields to compute (gradients, vorticity)
    #[arg(long, value_delimiter = ',')]
    operations: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Scheme {
    Ppe,
    Supremizer,
}

fn parse_point(s: &str) -> Result<[f64; 3], String> {
    let coords = s
        .split(',')
        .map(|c| c.trim().parse::<f64>().map_err(|e| format!("{c:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    <[f64; 3]>::try_from(coords).map_err(|c| format!("expected x,y,z, got {} values", c.len()))
}

fn main() -> ModelResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { archive } => cmd_inspect(&archive),
        Commands::Evaluate { run, probe, export } => cmd_evaluate(&run, &probe, export.as_deref()),
        Commands::Render {
            run,
            component,
            field,
            color_index,
            output,
        } => cmd_render(&run, component.as_deref(), &field, color_index, output.as_deref()),
        Commands::Demo {
            cells,
            stabilization,
            viscosity,
        } => cmd_demo(cells, stabilization, viscosity),
    }
}

fn cmd_inspect(archive: &Path) -> ModelResult<()> {
    let (topology, matrices) = open_model(std::fs::read(archive)?)?;
    println!("Model archive: {}", archive.display());
    println!("  Stabilization: {}", topology.stabilization);
    println!("  Velocity modes (nPhiU): {}", topology.n_phi_u);
    println!("  Pressure modes (nPhiP): {}", topology.n_phi_p);
    println!("  Eddy-viscosity modes (nPhiNut): {}", topology.n_phi_nut);
    println!("  Training runs: {}", topology.n_runs);
    println!("  Matrices decoded: {}", matrices.len());
    println!(
        "  Eigenmodes: U={} p={} nut={}",
        matrices.has_velocity_modes(),
        matrices.has_pressure_modes(),
        matrices.has_nut_modes()
    );
    Ok(())
}

fn evaluated_model(run: &RunArgs) -> ModelResult<FlowModel> {
    let config = match &run.config {
        Some(path) => ModelConfig::from_yaml_file(path)?,
        None => ModelConfig::default(),
    };
    let mut model = FlowModel::rom(config).with_fetcher(Box::new(FileFetcher::new()));
    model.load_mesh(MeshSource::Location(run.mesh.display().to_string()))?;
    model.load_model(ArchiveSource::Location(run.archive.display().to_string()))?;
    model.set_operations(run.operations.as_slice())?;
    info!(viscosity = run.viscosity, ux = run.ux, uy = run.uy, "evaluating");
    model.update(Query::Rom {
        viscosity: run.viscosity,
        velocity: [run.ux, run.uy],
    })?;
    Ok(model)
}

fn print_integral(model: &FlowModel, field: &str) -> ModelResult<()> {
    let integral = model.integrate(field, IntegrationTarget::Grid)?;
    match integral.sum {
        IntegralSum::Scalar(v) => println!("  ∫{field} dV = {v:.6e} (V = {:.6e})", integral.extent),
        IntegralSum::Vector([x, y, z, mag]) => println!(
            "  ∫{field} dV = ({x:.6e}, {y:.6e}, {z:.6e}), |·| = {mag:.6e} (V = {:.6e})",
            integral.extent
        ),
    }
    Ok(())
}

fn print_summary(model: &FlowModel, probes: &[[f64; 3]]) -> ModelResult<()> {
    if let Some(topology) = model.topology() {
        println!(
            "✓ {} model evaluated ({} velocity modes)",
            topology.stabilization, topology.n_phi_u
        );
    }
    let Some(state) = model.field() else {
        return Ok(());
    };
    println!("Integrals:");
    for field in state.point_fields() {
        if matches!(field.components, 1 | 3) {
            print_integral(model, &field.name)?;
        }
    }
    if !probes.is_empty() {
        println!("Probes of {}:", state.name());
    }
    for &point in probes {
        match model.probe(state.name(), point) {
            Ok([x, y, z, mag]) => println!("  {point:?}: ({x:.6e}, {y:.6e}, {z:.6e}), |·| = {mag:.6e}"),
            Err(ModelError::OutOfDomain { .. }) => println!("  {point:?}: outside the mesh"),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn cmd_evaluate(run: &RunArgs, probes: &[[f64; 3]], export: Option<&Path>) -> ModelResult<()> {
    let model = evaluated_model(run)?;
    print_summary(&model, probes)?;
    if let Some(path) = export {
        std::fs::write(path, model.export_grid()?)?;
        println!("✓ Wrote grid to {}", path.display());
    }
    Ok(())
}

fn cmd_render(
    run: &RunArgs,
    component: Option<&Path>,
    field: &str,
    color_index: i32,
    output: Option<&Path>,
) -> ModelResult<()> {
    let mut model = evaluated_model(run)?;
    let spec = match component {
        Some(path) => serde_json::from_slice(&std::fs::read(path)?)?,
        None => ComponentSpec::new("surface"),
    };
    let scene = model.set_component(&spec)?;
    let colors = model.render(field, ColorMode::try_from(color_index)?, None)?;

    let vtp = output.is_some_and(|p| p.extension().is_some_and(|e| e.eq_ignore_ascii_case("vtp")));
    let bytes = if vtp {
        scene.to_vtp()?
    } else {
        let json = serde_json::json!({
            "scene": &scene,
            "colors": &colors,
        });
        serde_json::to_vec(&json)?
    };
    match output {
        Some(path) => {
            std::fs::write(path, bytes)?;
            println!(
                "✓ Wrote {} scene ({} points) to {}",
                scene.component.kind(),
                scene.geometry.n_points(),
                path.display()
            );
        }
        None => println!("{}", String::from_utf8_lossy(&bytes)),
    }
    Ok(())
}

fn cmd_demo(cells: usize, scheme: Scheme, viscosity: f64) -> ModelResult<()> {
    let stabilization = match scheme {
        Scheme::Ppe => Stabilization::Ppe,
        Scheme::Supremizer => Stabilization::Supremizer,
    };
    let grid = UnstructuredGrid::structured_box([cells.max(1), 2, 2], [0.0; 3], [cells.max(1) as f64, 1.0, 1.0])?;
    let mesh = serde_json::to_string(&grid.to_document(Vec::new(), Vec::new()))?;
    let archive = SyntheticRom::new(stabilization, grid.n_cells()).builder().to_zip_bytes()?;

    let mut model = FlowModel::rom(ModelConfig::default());
    model.load_mesh(MeshSource::Text(mesh))?;
    model.load_model(ArchiveSource::Buffer(archive))?;
    model.set_operations(&["vorticity"])?;
    model.update(Query::Rom {
        viscosity,
        velocity: [1.0, 0.0],
    })?;

    let center = grid.bounds().min.lerp(&grid.bounds().max, 0.5);
    print_summary(&model, &[[center.x, center.y, center.z]])
}
