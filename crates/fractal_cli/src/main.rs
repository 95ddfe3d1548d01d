mod settings;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fractal_core::config::FieldBoundsOverride;
use fractal_core::interpolation::InterpolationKernel;
use fractal_core::pipeline::generate;
use fractal_core::{Aabb, RunParameters, ScalarGrid3D, Timings};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fractal-gen")]
#[command(about = "Meshes self-similar quaternion Julia sets grown from a distance field", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the fractal field and write its surface as OBJ
    #[command(allow_negative_numbers = true)]
    Generate(GenerateArgs),
    /// Write a sphere signed distance field in .f3d format
    Sphere {
        output: PathBuf,
        #[arg(long, default_value_t = 64)]
        resolution: usize,
        #[arg(long, default_value_t = 0.3)]
        radius: f64,
    },
    /// Log the header and value range of a .f3d distance field
    Inspect { distance_field: PathBuf },
}

#[derive(Args)]
struct GenerateArgs {
    /// Signed distance field (.f3d)
    distance_field: PathBuf,
    /// Portal description (key: value text)
    portals: PathBuf,
    versor_octaves: usize,
    versor_scale: f64,
    /// Output samples per axis
    resolution: usize,
    alpha: f64,
    beta: f64,
    /// Output mesh (.obj)
    output: PathBuf,
    /// TOML file with additional run parameters
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    iterations: Option<usize>,
    #[arg(long)]
    escape_radius: Option<f64>,
    /// Iterations of the inner Julia set that masks the portals
    #[arg(long)]
    mask_iterations: Option<usize>,
    /// Send the Julia orbit through the portals at every step
    #[arg(long)]
    recursive_portals: bool,
    #[arg(long, value_enum)]
    kernel: Option<KernelArg>,
    #[arg(long)]
    seed: Option<u32>,
    /// Padding added to the max corner of the field bounds
    #[arg(long)]
    padding: Option<f64>,
    /// Evaluate the voxel grid on all cores before marching
    #[arg(long)]
    parallel: bool,
    /// Ignore the bounds stored in the distance field and use the unit cube
    #[arg(long)]
    unit_bounds: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum KernelArg {
    Linear,
    Quadratic,
}

impl From<KernelArg> for InterpolationKernel {
    fn from(kernel: KernelArg) -> Self {
        match kernel {
            KernelArg::Linear => InterpolationKernel::Linear,
            KernelArg::Quadratic => InterpolationKernel::Quadratic,
        }
    }
}

impl GenerateArgs {
    /// Layers the command-line values over `params`.
    fn apply(&self, mut params: RunParameters) -> RunParameters {
        params.versor_octaves = self.versor_octaves;
        params.versor_scale = self.versor_scale;
        params.resolution = self.resolution;
        params.alpha = self.alpha;
        params.beta = self.beta;
        if let Some(iterations) = self.iterations {
            params.julia.max_iterations = iterations;
        }
        if let Some(escape_radius) = self.escape_radius {
            params.julia.escape_radius = escape_radius;
        }
        if let Some(iterations) = self.mask_iterations {
            params.mask_julia.max_iterations = iterations;
        }
        params.recursive_portals |= self.recursive_portals;
        if let Some(kernel) = self.kernel {
            params.kernel = kernel.into();
        }
        if let Some(seed) = self.seed {
            params.noise_seed = seed;
        }
        if let Some(padding) = self.padding {
            params.bounds_padding = padding;
        }
        params.parallel |= self.parallel;
        if self.unit_bounds {
            params.field_bounds = Some(FieldBoundsOverride::unit());
        }
        params
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Generate(args) => cmd_generate(&args),
        Commands::Sphere {
            output,
            resolution,
            radius,
        } => cmd_sphere(&output, resolution, radius),
        Commands::Inspect { distance_field } => {
            ScalarGrid3D::load(&distance_field)?;
            Ok(())
        }
    }
}

fn cmd_generate(args: &GenerateArgs) -> Result<()> {
    let params = args.apply(settings::load_parameters(args.config.as_deref())?);
    let timings = Timings::new();
    let mesh = generate(
        &args.distance_field,
        &args.portals,
        &args.output,
        &params,
        &timings,
    )?;
    info!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        output = %args.output.display(),
        "done"
    );
    timings.log_summary();
    Ok(())
}

fn cmd_sphere(output: &std::path::Path, resolution: usize, radius: f64) -> Result<()> {
    let grid = ScalarGrid3D::from_fn([resolution; 3], Aabb::unit(), |p| {
        p.coords.norm() - radius
    })
    .context("Failed to sample sphere field.")?;
    grid.save(output)?;
    info!(resolution, radius, output = %output.display(), "sphere field written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{cmd_sphere, Cli, Commands};
    use clap::Parser;
    use fractal_core::config::FieldBoundsOverride;
    use fractal_core::interpolation::InterpolationKernel;
    use fractal_core::{RunParameters, ScalarGrid3D};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn generate_positionals_and_flags_override_parameters() {
        let cli = parse(&[
            "fractal-gen",
            "generate",
            "bunny.f3d",
            "portals.txt",
            "3",
            "2.5",
            "96",
            "4.0",
            "-0.1",
            "out.obj",
            "--iterations",
            "9",
            "--kernel",
            "quadratic",
            "--unit-bounds",
            "--parallel",
            "--mask-iterations",
            "3",
            "--recursive-portals",
        ]);
        let Commands::Generate(args) = cli.command else {
            panic!("expected the generate subcommand");
        };
        let params = args.apply(RunParameters::default());
        assert_eq!(params.versor_octaves, 3);
        assert_eq!(params.versor_scale, 2.5);
        assert_eq!(params.resolution, 96);
        assert_eq!(params.alpha, 4.0);
        assert_eq!(params.beta, -0.1);
        assert_eq!(params.julia.max_iterations, 9);
        assert_eq!(params.julia.escape_radius, 10.0);
        assert_eq!(params.kernel, InterpolationKernel::Quadratic);
        assert_eq!(params.field_bounds, Some(FieldBoundsOverride::unit()));
        assert!(params.parallel);
        assert_eq!(params.mask_julia.max_iterations, 3);
        assert!(params.recursive_portals);
        params.validate().expect("parameters should validate");
    }

    #[test]
    fn generate_requires_all_positionals() {
        assert!(Cli::try_parse_from(["fractal-gen", "generate", "a.f3d", "p.txt", "3"]).is_err());
    }

    #[test]
    fn sphere_command_writes_a_loadable_field() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("sphere.f3d");
        cmd_sphere(&path, 8, 0.25).expect("sphere written");
        let grid = ScalarGrid3D::load(&path).expect("sphere loads");
        assert_eq!(grid.resolution(), [8, 8, 8]);
        let (lo, hi) = grid.value_range();
        assert!(lo < 0.0 && hi > 0.0, "range [{lo}, {hi}]");
    }
}
