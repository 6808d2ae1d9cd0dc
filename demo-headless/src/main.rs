use canopy_light_core::{
    compute_light_capture_with, height_competition_factors,
    physics::{community_height_shading, community_weighted_mean_height, intercepted_fraction},
    LayerGridConfig, LightCaptureResult, LightCompetitionConfig, Normalization,
    SpeciesCanopyState,
};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Canopy light-competition demo with configurable community
#[derive(Parser, Debug)]
#[command(name = "canopy-light-demo")]
#[command(about = "Multi-layer canopy light competition demo", long_about = None)]
struct Args {
    /// Canopy height per species in m (comma separated)
    #[arg(long, value_delimiter = ',', default_values_t = vec![0.8, 0.4])]
    heights: Vec<f64>,

    /// Leaf area index per species (comma separated)
    #[arg(long, value_delimiter = ',', default_values_t = vec![3.0, 2.0])]
    lai: Vec<f64>,

    /// Beer-Lambert extinction coefficient
    #[arg(short = 'k', long, default_value_t = 0.6)]
    extinction: f64,

    /// Layer thickness in m
    #[arg(long, default_value_t = 0.05)]
    layer_thickness: f64,

    /// Use a fixed grid top in m instead of sizing it from the tallest species
    #[arg(long)]
    fixed_max_height: Option<f64>,

    /// Report absolute fractions of incoming light instead of community shares
    #[arg(long)]
    no_normalize: bool,

    /// Print the per-layer light profile
    #[arg(short, long)]
    profile: bool,

    /// Sweep the height of this species from 0 to --sweep-max
    #[arg(short, long)]
    sweep_species: Option<usize>,

    /// Upper end of the height sweep in m
    #[arg(long, default_value_t = 1.5)]
    sweep_max: f64,

    /// Number of sweep steps
    #[arg(long, default_value_t = 30)]
    sweep_steps: u32,

    /// Also print the simple height competition factor with this exponent
    #[arg(long)]
    height_beta: Option<f64>,

    /// Community height shading strength (α, 0-1)
    #[arg(long)]
    alpha_com_height: Option<f64>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn config(&self) -> LightCompetitionConfig {
        let grid = match self.fixed_max_height {
            Some(max_height) => LayerGridConfig::fixed(self.layer_thickness, max_height),
            None => LayerGridConfig::dynamic(self.layer_thickness),
        };
        let normalization = if self.no_normalize {
            Normalization::None
        } else {
            Normalization::Community
        };
        LightCompetitionConfig {
            grid,
            normalization,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let canopy =
        SpeciesCanopyState::from_slices(&args.heights, &args.lai).map_err(|e| e.to_string())?;
    let config = args.config();

    if let Some(species) = args.sweep_species {
        return run_sweep(args, &canopy, &config, species);
    }

    let result =
        compute_light_capture_with(&canopy, args.extinction, &config).map_err(|e| e.to_string())?;

    let height_factors = match args.height_beta {
        Some(beta) => Some(
            height_competition_factors(canopy.heights(), Some(canopy.leaf_area_indices()), beta)
                .map_err(|e| e.to_string())?,
        ),
        None => None,
    };

    if args.json {
        let output = serde_json::json!({
            "canopy": canopy,
            "config": config,
            "result": result,
            "height_competition": height_factors,
        });
        let text = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
        println!("{text}");
        return Ok(());
    }

    println!("=== Canopy Light Competition Demo ===\n");
    println!(
        "Species: {}, k: {:.2}, layers: {} x {:.3} m (top {:.2} m)",
        canopy.species_count(),
        args.extinction,
        result.grid.layer_count(),
        result.grid.layer_thickness(),
        result.grid.top()
    );
    println!(
        "Community interception (comLIE): {:.4}",
        result.community_interception
    );
    if let Some(alpha) = args.alpha_com_height {
        if let Some(cwm) = community_weighted_mean_height(canopy.heights(), canopy.leaf_area_indices())
        {
            let shading = community_height_shading(alpha, cwm);
            println!(
                "Community mean height {:.3} m, shading {:.4}, shaded interception {:.4}",
                cwm,
                shading,
                intercepted_fraction(canopy.canopy_leaf_area_index(), args.extinction, Some(shading))
            );
        }
    }
    println!();

    print_species_table(&canopy, &result, height_factors.as_deref());

    if args.profile {
        println!();
        print_profile(&result);
    }

    Ok(())
}

fn print_species_table(
    canopy: &SpeciesCanopyState,
    result: &LightCaptureResult,
    height_factors: Option<&[f64]>,
) {
    println!("Species | Height(m) |  LAI  | Light share | Height factor");
    println!("--------|-----------|-------|-------------|--------------");
    for s in 0..canopy.species_count() {
        let factor = height_factors.map_or_else(|| "-".to_string(), |f| format!("{:.4}", f[s]));
        println!(
            "{:>7} | {:>9.3} | {:>5.2} | {:>11.4} | {:>12}",
            s + 1,
            canopy.heights()[s],
            canopy.leaf_area_indices()[s],
            result.per_species_fraction[s],
            factor
        );
    }
    println!("  Total |           |       | {:>11.4} |", result.total_fraction());
}

fn print_profile(result: &LightCaptureResult) {
    println!("Layer |   Range (m)   |  LAI   | Intensity | Captured per species");
    println!("------|---------------|--------|-----------|---------------------");
    for l in (0..result.grid.layer_count()).rev() {
        if result.layer_lai[l] <= 0.0 {
            continue;
        }
        let (min, max) = result.grid.height_range(l);
        let per_species: Vec<String> = result
            .per_species_per_layer_fraction
            .iter()
            .map(|row| format!("{:.4}", row[l]))
            .collect();
        println!(
            "{:>5} | {:.2} - {:.2} | {:>6.3} | {:>9.4} | {}",
            l,
            min,
            max,
            result.layer_lai[l],
            result.layer_intensity[l],
            per_species.join("  ")
        );
    }
}

fn run_sweep(
    args: &Args,
    canopy: &SpeciesCanopyState,
    config: &LightCompetitionConfig,
    species: usize,
) -> Result<(), String> {
    if species >= canopy.species_count() {
        return Err(format!(
            "sweep species {} out of range (community has {})",
            species,
            canopy.species_count()
        ));
    }
    let steps = args.sweep_steps.max(1);

    let mut rows = Vec::with_capacity(steps as usize + 1);
    for step in 0..=steps {
        let height = args.sweep_max * f64::from(step) / f64::from(steps);
        let mut heights = canopy.heights().to_vec();
        heights[species] = height;
        let swept = SpeciesCanopyState::new(heights, canopy.leaf_area_indices().to_vec())
            .map_err(|e| e.to_string())?;
        let result =
            compute_light_capture_with(&swept, args.extinction, config).map_err(|e| e.to_string())?;
        rows.push((height, result.per_species_fraction));
    }

    if args.json {
        let output: Vec<_> = rows
            .iter()
            .map(|(height, shares)| serde_json::json!({ "height": height, "shares": shares }))
            .collect();
        let text = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
        println!("{text}");
        return Ok(());
    }

    println!("Sweeping height of species {} (k = {:.2})\n", species + 1, args.extinction);
    println!("Height(m) | Shares");
    println!("----------|-------");
    for (height, shares) in rows {
        let formatted: Vec<String> = shares.iter().map(|v| format!("{v:.4}")).collect();
        println!("{:>9.3} | {}", height, formatted.join("  "));
    }
    Ok(())
}
