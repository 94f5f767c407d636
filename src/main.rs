use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::{LevelFilter, Log, Metadata, Record};

use missile_sim::io::{csv, json, Catalog, FlightSummary, MissileRecord, Scenario};
use missile_sim::vehicle::presets;
use missile_sim::{
    compare, simulate, EngagementParameters, MissileParameters, Result, SimConfig, SimError, TrajectoryResult,
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "missile-sim", version)]
#[command(about = "Air-to-air missile trajectory simulator", long_about = None)]
struct Cli {
    /// Log to stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one missile and print the flight report
    Run {
        #[command(flatten)]
        source: Source,

        #[command(flatten)]
        engagement: EngagementArgs,

        /// Write the trajectory as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the flight summary as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Fly two missiles against the same target and compare them
    Compare {
        /// First missile: catalog name (with --catalog), preset, or record file
        first: String,

        /// Second missile
        second: String,

        /// Compiled catalog to resolve names in
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[command(flatten)]
        engagement: EngagementArgs,
    },

    /// Print derived motor and drag figures
    Info {
        #[command(flatten)]
        source: Source,
    },

    /// List missiles in a catalog, or the built-in presets
    List {
        /// Compiled catalog (JSON)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Case-insensitive name filter
        filter: Option<String>,
    },
}

#[derive(Args)]
struct Source {
    /// Flat missile record (JSON)
    #[arg(long, conflicts_with_all = ["catalog", "scenario", "preset"])]
    record: Option<PathBuf>,

    /// Compiled catalog (JSON), used with --name
    #[arg(long, requires = "name", conflicts_with_all = ["scenario", "preset"])]
    catalog: Option<PathBuf>,

    /// Missile name in the catalog
    #[arg(long, requires = "catalog")]
    name: Option<String>,

    /// Scenario file: missile record, engagement and timestep
    #[arg(long, conflicts_with = "preset")]
    scenario: Option<PathBuf>,

    /// Built-in missile
    #[arg(long, value_enum)]
    preset: Option<Preset>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    ShortRange,
    MediumRange,
}

impl Preset {
    fn parameters(self) -> MissileParameters {
        match self {
            Preset::ShortRange => presets::short_range(),
            Preset::MediumRange => presets::medium_range(),
        }
    }
}

/// Engagement overrides; unset flags keep the scenario or default value.
#[derive(Args)]
struct EngagementArgs {
    /// Launcher true airspeed (km/h) [default: 1224]
    #[arg(long)]
    speed: Option<f64>,

    /// Launch altitude (m) [default: 1000]
    #[arg(long)]
    altitude: Option<f64>,

    /// Initial target range (km) [default: 0]
    #[arg(long)]
    target_range: Option<f64>,

    /// Target true airspeed, flying away (km/h) [default: 0]
    #[arg(long)]
    target_speed: Option<f64>,

    /// Target altitude (m) [default: 1000]
    #[arg(long)]
    target_altitude: Option<f64>,

    /// Time step (s) [default: 0.01]
    #[arg(long)]
    dt: Option<f64>,
}

impl EngagementArgs {
    fn apply(&self, mut engagement: EngagementParameters, mut config: SimConfig) -> (EngagementParameters, SimConfig) {
        if let Some(v) = self.speed {
            engagement.launch_speed = v;
        }
        if let Some(v) = self.altitude {
            engagement.launch_altitude = v;
        }
        if let Some(v) = self.target_range {
            engagement.target_range = v;
        }
        if let Some(v) = self.target_speed {
            engagement.target_speed = v;
        }
        if let Some(v) = self.target_altitude {
            engagement.target_altitude = v;
        }
        if let Some(dt) = self.dt {
            config.dt = dt;
        }
        (engagement, config)
    }
}

struct Loaded {
    missile: MissileParameters,
    engagement: EngagementParameters,
    config: SimConfig,
}

impl Source {
    fn load(&self) -> Result<Loaded> {
        let defaults = |missile: MissileParameters| Loaded { missile, engagement: EngagementParameters::default(), config: SimConfig::default() };
        if let Some(path) = &self.scenario {
            let scenario = Scenario::load(path)?;
            return Ok(Loaded { missile: scenario.parameters()?, engagement: scenario.engagement, config: scenario.sim });
        }
        if let Some(path) = &self.record {
            return Ok(defaults(load_record(path)?));
        }
        if let (Some(path), Some(name)) = (&self.catalog, &self.name) {
            return Ok(defaults(Catalog::load(path)?.get(name)?));
        }
        if let Some(preset) = self.preset {
            return Ok(defaults(preset.parameters()));
        }
        Err(SimError::InvalidParameters {
            field: "missile",
            reason: "give one of --record, --catalog/--name, --scenario or --preset".into(),
        })
    }
}

fn load_record(path: &Path) -> Result<MissileParameters> {
    let fallback = path.file_stem().and_then(|s| s.to_str()).unwrap_or("missile");
    MissileRecord::load(path)?.to_parameters(fallback)
}

/// Catalog name, preset name, or record file path, in that order.
fn resolve(key: &str, catalog: Option<&Catalog>) -> Result<MissileParameters> {
    if let Some(cat) = catalog {
        if cat.data.contains_key(key) {
            return cat.get(key);
        }
    }
    if let Ok(preset) = Preset::from_str(key, true) {
        return Ok(preset.parameters());
    }
    let path = PathBuf::from(key);
    if path.exists() {
        return load_record(&path);
    }
    Err(SimError::UnknownMissile(key.to_string()))
}

// ---------------------------------------------------------------------------
// Stderr logger
// ---------------------------------------------------------------------------

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

const RULE: &str = "  ──────────────────────────────────────────────────────────────────";
const BANNER: &str = "====================================================================";

fn print_missile(m: &MissileParameters) {
    let p = m.performance();
    println!("  Missile Parameters");
    println!("{RULE}");
    println!("  Launch mass:   {:>8.1} kg    Caliber:      {:>8.3} m", m.mass, m.caliber);
    println!("  Booster end:   {:>8.1} kg    Cxk:          {:>8.3}", m.mass_end_booster, m.cxk);
    println!(
        "  Booster:       {:>8.0} N     Burn:         {:>8.2} s",
        m.force_booster, m.time_fire_booster
    );
    if m.has_sustainer() {
        println!(
            "  Sustainer:     {:>8.0} N     Burn:         {:>8.2} s",
            m.force_sustainer, m.time_fire_sustainer
        );
        println!("  Sustainer end: {:>8.1} kg", m.mass_end_sustainer);
    }
    println!("  Isp booster:   {:>8.1} s     Isp sustain:  {:>8.1} s", p.booster_isp, p.sustainer_isp);
    println!("  Delta-v:       {:>8.0} m/s   Launch TWR:   {:>8.2}", p.total_delta_v, p.launch_twr);
    println!(
        "  Total impulse: {:>8.0} N s   Drag/weight:  {:>8.4}",
        p.total_impulse, p.drag_to_weight
    );
    println!("  Engine mass:   {:>8.1} kg    Burn time:    {:>8.2} s", p.engine_mass, p.total_burn_time);
    println!("  Flight time:   {:>8.1} s", m.time_life);
    if let Some(loft) = &m.loft {
        println!(
            "  Loft:          climb {:.0} deg, dive at {:.0} deg, omega {:.1}",
            loft.elevation, loft.target_elevation, loft.omega_max
        );
    }
    if let Some(g) = m.max_load {
        println!("  Max load:      {:>8.1} g", g);
    }
    println!();
}

fn print_engagement(e: &EngagementParameters, config: &SimConfig) {
    println!("  Engagement");
    println!("{RULE}");
    println!(
        "  Launch:        {:>8.0} km/h  at {:>7.0} m",
        e.launch_speed, e.launch_altitude
    );
    println!(
        "  Target:        {:>8.0} km/h  at {:>7.0} m, {:.1} km out",
        e.target_speed, e.target_altitude, e.target_range
    );
    println!("  Time step:     {:>8.3} s", config.dt);
    println!();
}

fn print_report(m: &MissileParameters, e: &EngagementParameters, config: &SimConfig, r: &TrajectoryResult) {
    let summary = FlightSummary::from_result(r);

    println!();
    println!("{BANNER}");
    println!("  MISSILE FLIGHT SIMULATION: {}", m.name);
    println!("{BANNER}");
    println!();
    print_missile(m);
    print_engagement(e, config);

    println!("  Flight Events");
    println!("{RULE}");
    for ev in &r.events {
        println!(
            "  t={:>6.2}s   x={:>8.0}m   alt={:>7.0}m   TAS={:>6.1}m/s   {}",
            ev.time,
            ev.state.downrange(),
            ev.state.altitude(),
            ev.state.tas,
            ev.kind
        );
    }
    println!();

    println!("  Performance Summary");
    println!("{RULE}");
    println!(
        "  Max TAS:       {:>8.1} m/s at t={:.2} s (Mach {:.2})",
        summary.max_tas, summary.max_tas_time, summary.max_mach
    );
    println!("  Max altitude:  {:>8.0} m", summary.max_altitude);
    println!("  Downrange:     {:>8.0} m", summary.final_downrange);
    println!("  Max accel:     {:>8.1} m/s^2", summary.max_accel);
    println!("  Max drag:      {:>8.0} N", summary.max_drag);
    println!("  Max g-load:    {:>8.1} g", summary.max_g_load);
    if let Some(radius) = summary.min_turn_radius {
        println!("  Min radius:    {:>8.0} m", radius);
    }
    println!("  Closest pass:  {:>8.0} m", summary.closest_approach);
    println!("  Flight time:   {:>8.2} s ({})", summary.flight_time, summary.termination);
    println!();

    println!("  Trajectory");
    println!("{RULE}");
    println!(
        "  {:>7}  {:>8}  {:>8}  {:>7}  {:>6}  {:>7}  {:>9}  {:>6}  {:>8}",
        "t (s)", "x (m)", "alt (m)", "TAS", "Mach", "pitch", "range (m)", "g", "loft"
    );
    println!("  {}", "─".repeat(86));

    let interval = (r.len() / 30).max(1);
    for (i, s) in r.samples.iter().enumerate() {
        if i % interval != 0 && i != r.len() - 1 {
            continue;
        }
        println!(
            "  {:>7.2}  {:>8.0}  {:>8.0}  {:>7.1}  {:>6.2}  {:>7.2}  {:>9.0}  {:>6.1}  {:>8}",
            s.time,
            s.downrange(),
            s.altitude(),
            s.tas,
            s.mach,
            s.pitch_deg(),
            s.range_to_target(),
            s.turn.g_load,
            s.loft.to_string()
        );
    }

    println!();
    println!("  Simulation: {} samples, dt={} s", r.len(), config.dt);
    println!("{BANNER}");
    println!();
}

fn print_comparison(a: &TrajectoryResult, b: &TrajectoryResult) {
    let sa = FlightSummary::from_result(a);
    let sb = FlightSummary::from_result(b);
    let rows: [(&str, f64, f64, usize); 10] = [
        ("Flight time (s)", sa.flight_time, sb.flight_time, 2),
        ("Max TAS (m/s)", sa.max_tas, sb.max_tas, 1),
        ("Max Mach", sa.max_mach, sb.max_mach, 2),
        ("Max altitude (m)", sa.max_altitude, sb.max_altitude, 0),
        ("Downrange (m)", sa.final_downrange, sb.final_downrange, 0),
        ("Max accel (m/s^2)", sa.max_accel, sb.max_accel, 1),
        ("Max drag (N)", sa.max_drag, sb.max_drag, 0),
        ("Max g-load", sa.max_g_load, sb.max_g_load, 1),
        ("Closest pass (m)", sa.closest_approach, sb.closest_approach, 0),
        ("Final range (m)", sa.final_range_to_target, sb.final_range_to_target, 0),
    ];

    println!();
    println!("{BANNER}");
    println!("  COMPARISON");
    println!("{BANNER}");
    println!("  {:<20}  {:>18}  {:>18}", "", a.missile, b.missile);
    println!("{RULE}");
    for (label, x, y, prec) in rows {
        println!("  {:<20}  {:>18.*}  {:>18.*}", label, prec, x, prec, y);
    }
    println!("  {:<20}  {:>18}  {:>18}", "Stopped on", sa.termination, sb.termination);
    println!("{BANNER}");
    println!();
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run { source, engagement, csv: csv_path, json: json_path } => {
            let loaded = source.load()?;
            let (e, config) = engagement.apply(loaded.engagement, loaded.config);
            let result = simulate(&loaded.missile, &e, &config)?;
            print_report(&loaded.missile, &e, &config, &result);

            if let Some(path) = csv_path {
                csv::write_trajectory_file(&path, &result.samples)?;
                println!("  Trajectory written to {}", path.display());
            }
            if let Some(path) = json_path {
                json::write_summary_file(&path, &loaded.missile, &FlightSummary::from_result(&result))?;
                println!("  Summary written to {}", path.display());
            }
        }
        Commands::Compare { first, second, catalog, engagement } => {
            let catalog = catalog.map(Catalog::load).transpose()?;
            let a = resolve(&first, catalog.as_ref())?;
            let b = resolve(&second, catalog.as_ref())?;
            let (e, config) = engagement.apply(EngagementParameters::default(), SimConfig::default());
            let (ra, rb) = compare(&a, &b, &e, &config)?;
            print_comparison(&ra, &rb);
        }
        Commands::Info { source } => {
            let loaded = source.load()?;
            println!();
            println!("{BANNER}");
            println!("  {}", loaded.missile.name);
            println!("{BANNER}");
            print_missile(&loaded.missile);
        }
        Commands::List { catalog, filter } => {
            let filter = filter.unwrap_or_default();
            match catalog {
                Some(path) => {
                    let catalog = Catalog::load(path)?;
                    if let Some(version) = &catalog.version {
                        println!("catalog version {version}");
                    }
                    for name in catalog.search(&filter) {
                        println!("{name}");
                    }
                }
                None => {
                    for preset in Preset::value_variants() {
                        if let Some(name) = preset.to_possible_value() {
                            if name.get_name().contains(&filter.to_lowercase()) {
                                println!("{:<14} {}", name.get_name(), preset.parameters().name);
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
