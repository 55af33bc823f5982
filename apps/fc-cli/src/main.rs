use clap::{Parser, Subcommand};
use fc_app::{
    AppError, AppResult, CsvLogger, ProcessConfig, ProcessOrchestrator,
    RunOutcome, SimulationInputs, connect_hardware, simulate_cascade,
};
use fc_core::{ml_per_min, to_m3ps};
use fc_reactor::{ReactorCascade, ReactorGeometry, StageConfig};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fc-cli")]
#[command(about = "FlowCascade - model-predictive diversion for a two-reactor flow cascade", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the process against live instruments
    Run {
        /// Data log to append to (".csv" is added when missing); prompted for if omitted
        output: Option<PathBuf>,
        /// Process configuration YAML (plant defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Simulate the cascade offline with fixed inputs
    Simulate {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output CSV file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Simulated time in seconds
        #[arg(long, default_value_t = 600.0)]
        duration: f64,
        /// Simulated seconds between rows
        #[arg(long, default_value_t = 2.0)]
        interval: f64,
        /// Feed A in mL/min
        #[arg(long, default_value_t = 2.5)]
        flow_a: f64,
        /// Feed B in mL/min
        #[arg(long, default_value_t = 2.5)]
        flow_b: f64,
        /// Solvent feed in mL/min
        #[arg(long, default_value_t = 2.5)]
        solvent: f64,
        /// Primary wall temperature in °C
        #[arg(long, default_value_t = 150.0)]
        temperature: f64,
    },
    /// Validate a configuration and print the reactors' stability numbers
    CheckConfig {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { output, config } => cmd_run(output, config.as_deref()),
        Commands::Simulate {
            config,
            output,
            duration,
            interval,
            flow_a,
            flow_b,
            solvent,
            temperature,
        } => {
            let inputs = SimulationInputs {
                flow_a_ml_min: flow_a,
                flow_b_ml_min: flow_b,
                solvent_ml_min: solvent,
                temperature_c: temperature,
                duration_s: duration,
                report_interval_s: interval,
                flow_step: None,
            };
            cmd_simulate(config.as_deref(), output.as_deref(), &inputs)
        }
        Commands::CheckConfig { config } => cmd_check_config(config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> AppResult<ProcessConfig> {
    match path {
        Some(path) => ProcessConfig::load_yaml(path),
        None => Ok(ProcessConfig::default()),
    }
}

fn prompt_output() -> AppResult<PathBuf> {
    print!("Enter the name for the CSV file (minus the .csv): ");
    io::stdout().flush()?;
    let mut name = String::new();
    io::stdin().lock().read_line(&mut name)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Config("an output file name is required".into()));
    }
    Ok(PathBuf::from(name))
}

fn with_csv_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("csv")
    }
}

fn cmd_run(output: Option<PathBuf>, config_path: Option<&Path>) -> AppResult<()> {
    let config = load_config(config_path)?;
    let output = with_csv_extension(match output {
        Some(path) => path,
        None => prompt_output()?,
    });

    let logger = CsvLogger::create(&output)?;
    println!("Logging to {}", output.display());
    let (sensors, actuators) = connect_hardware(&config.instruments)?;
    let cascade = ReactorCascade::from_config(&config.cascade)?;
    let mut orchestrator =
        ProcessOrchestrator::new(config, sensors, actuators, cascade, Box::new(logger))?;

    let interrupt = orchestrator.interrupt_signal();
    ctrlc::set_handler(move || {
        println!("\nInterrupt received, shutting down");
        interrupt.request();
    })
    .map_err(io::Error::other)?;

    match orchestrator.run()? {
        RunOutcome::Completed => println!("✓ Run complete"),
        RunOutcome::Interrupted => println!("Run interrupted; pumps stopped and valve set to waste"),
    }
    Ok(())
}

fn cmd_simulate(
    config_path: Option<&Path>,
    output: Option<&Path>,
    inputs: &SimulationInputs,
) -> AppResult<()> {
    let config = load_config(config_path)?;
    let last = match output {
        Some(path) => {
            let mut file = io::BufWriter::new(std::fs::File::create(path)?);
            simulate_cascade(&config.cascade, inputs, &mut file)?
        }
        None => simulate_cascade(&config.cascade, inputs, &mut io::stdout().lock())?,
    };
    eprintln!(
        "Final outlet concentrations: reactor 1 {:.4} mg/mL, reactor 2 {:.4} mg/mL",
        last.primary, last.secondary
    );
    Ok(())
}

fn print_stage(label: &str, stage: &StageConfig, flow_m3ps: f64) -> AppResult<()> {
    let geometry = ReactorGeometry::derive(&stage.reactor)?;
    let velocity = flow_m3ps / geometry.area_m2;
    let numbers = geometry.stability(velocity);
    println!("{label}:");
    println!("  Length:     {:.4} m ({} nodes, dx = {:.3e} m)", geometry.length_m, stage.reactor.nodes, geometry.dx_m);
    println!("  Time step:  {} s", geometry.dt_s);
    println!("  Velocity:   {velocity:.4e} m/s");
    println!("  Courant:    {:.4}", numbers.courant);
    println!("  Dispersion: {:.4}", numbers.dispersion);
    println!("  Thermal:    {:.4e}", numbers.thermal);
    if numbers.within_explicit_limit() {
        println!("  ✓ Within the explicit-scheme limit");
    } else {
        println!("  ! Outside the explicit-scheme limit; expect oscillation");
    }
    Ok(())
}

fn cmd_check_config(config_path: Option<&Path>) -> AppResult<()> {
    let config = load_config(config_path)?;
    println!("✓ Configuration is valid");

    let flows = config.flow_control.clone().unwrap_or_default();
    let primary_flow = to_m3ps(ml_per_min(flows.setpoint_a + flows.setpoint_b));
    let secondary_flow = primary_flow + to_m3ps(ml_per_min(flows.setpoint_solvent));
    println!(
        "Nominal feeds: A {} mL/min, B {} mL/min, solvent {} mL/min",
        flows.setpoint_a, flows.setpoint_b, flows.setpoint_solvent
    );
    print_stage("Reactor 1", &config.cascade.primary, primary_flow)?;
    print_stage("Reactor 2", &config.cascade.secondary, secondary_flow)?;
    Ok(())
}
