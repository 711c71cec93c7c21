//! DotH Headless Choreography Harness
//!
//! Runs scenarios against a recording renderer and checks the invariants
//! a diagram relies on. No rendering, no assets.
//!
//! Usage:
//!   cargo run -p doth-simtest
//!   cargo run -p doth-simtest -- --scenario chobi --seed 7 --verbose
//!   cargo run -p doth-simtest -- --config my_strat.json --timeline out.json

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use doth_logic::arena::ArenaLayout;
use doth_logic::assignment::{self, SwapTopology};
use doth_logic::config::{self, validate_config, ScenarioConfig};
use doth_logic::driver::{CycleContext, CyclePhase, ScenarioDriver};
use doth_logic::entity::EntityId;
use doth_logic::group::Group;
use doth_logic::renderer::{RecordingRenderer, RenderCommand};
use doth_logic::safe_spots;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "doth-simtest")]
#[command(about = "Run DotH choreography scenarios headless and check invariants")]
struct Cli {
    /// Built-in scenario to run (default: all presets)
    #[arg(long, conflicts_with = "config")]
    scenario: Option<String>,

    /// Scenario JSON file to run instead of a preset
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured loop count
    #[arg(long)]
    loops: Option<u32>,

    /// Seed for random afflictions and scatter positions
    #[arg(long)]
    seed: Option<u64>,

    /// Write the recorded render timeline as JSON
    #[arg(long)]
    timeline: Option<PathBuf>,

    /// List built-in scenarios and exit
    #[arg(long)]
    list: bool,

    /// Print passing checks and per-cycle details
    #[arg(long, short)]
    verbose: bool,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

#[derive(Serialize)]
struct Timeline<'a> {
    scenario: &'a str,
    cycles: &'a [CycleContext],
    batches: &'a [Vec<RenderCommand>],
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.list {
        for p in config::presets() {
            println!("{:16} {} loops, {:?}", p.name, p.loops, p.formation);
        }
        return ExitCode::SUCCESS;
    }

    let scenarios = match load_scenarios(&cli) {
        Ok(s) => s,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("=== DotH Choreography Harness ===\n");
    let mut results = Vec::new();

    // 1. Assignment engine sweep over every afflicted subset
    results.extend(validate_assignment(cli.verbose));

    // 2. Scenario runs
    for scenario in scenarios {
        results.extend(run_scenario(scenario, &cli));
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || cli.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn load_scenarios(cli: &Cli) -> Result<Vec<ScenarioConfig>, String> {
    let mut scenarios = if let Some(path) = &cli.config {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("read {}: {}", path.display(), e))?;
        let scenario: ScenarioConfig = serde_json::from_str(&text)
            .map_err(|e| format!("parse {}: {}", path.display(), e))?;
        vec![scenario]
    } else if let Some(name) = &cli.scenario {
        let scenario = config::preset(name).ok_or_else(|| {
            let known: Vec<_> = config::presets().into_iter().map(|p| p.name).collect();
            format!("unknown scenario '{}' (known: {})", name, known.join(", "))
        })?;
        vec![scenario]
    } else {
        config::presets()
    };

    for s in &mut scenarios {
        if let Some(loops) = cli.loops {
            s.loops = loops;
        }
        if cli.seed.is_some() {
            s.seed = cli.seed;
        }
    }
    Ok(scenarios)
}

// ── 1. Assignment engine ────────────────────────────────────────────────

fn validate_assignment(verbose: bool) -> Vec<TestResult> {
    println!("--- Assignment Engine ---");
    let mut results = Vec::new();

    let roles = ["A", "B", "C", "D", "E", "F", "G", "H"];
    let layout = ArenaLayout::default();
    let spots = match config::preset("chobi") {
        Some(p) => p.spots,
        None => {
            results.push(TestResult {
                name: "assignment_preset".into(),
                passed: false,
                detail: "chobi preset missing".into(),
            });
            return results;
        }
    };

    let mut unbalanced = Vec::new();
    let mut bad_counts = Vec::new();
    let mut undo_failures = Vec::new();
    let mut spot_failures = Vec::new();
    let mut histogram = [0u32; 3];
    let mut lateral = 0u32;
    let mut axis = 0u32;
    let mut total = 0u32;

    for selection in four_of_eight() {
        total += 1;
        let mut group = match Group::from_roster(&roles, &layout) {
            Ok(g) => g,
            Err(e) => {
                unbalanced.push(format!("{:?}: {}", selection, e));
                continue;
            }
        };
        if let Err(e) = group.apply_afflictions(&selection.map(EntityId)) {
            unbalanced.push(format!("{:?}: {}", selection, e));
            continue;
        }
        let before = group.clone();

        let plan = match assignment::plan_exchanges(&group) {
            Ok(p) => p,
            Err(e) => {
                unbalanced.push(format!("{:?}: {}", selection, e));
                continue;
            }
        };
        match plan.topology {
            Some(SwapTopology::Lateral) => lateral += 1,
            Some(SwapTopology::Axis) => axis += 1,
            None => {}
        }

        let mut log = Vec::new();
        if let Err(e) = assignment::apply_plan(&mut group, &plan, &mut log) {
            unbalanced.push(format!("{:?}: {}", selection, e));
            continue;
        }
        if !group.is_balanced() {
            unbalanced.push(format!("{:?}", selection));
        }
        if log.len() > 2 {
            bad_counts.push(format!("{:?}: {} exchanges", selection, log.len()));
        } else {
            histogram[log.len()] += 1;
        }
        if let Err(e) = safe_spots::assign_by_pair(&group, &spots, &layout) {
            spot_failures.push(format!("{:?}: {}", selection, e));
        }
        if group.undo(&log).is_err() || group != before {
            undo_failures.push(format!("{:?}", selection));
        }
    }

    results.push(TestResult {
        name: "assignment_balances_all_pairs".into(),
        passed: unbalanced.is_empty(),
        detail: if unbalanced.is_empty() {
            format!("{} selections balanced", total)
        } else {
            format!("unbalanced: {}", unbalanced.join(", "))
        },
    });

    results.push(TestResult {
        name: "assignment_exchange_bound".into(),
        passed: bad_counts.is_empty(),
        detail: format!(
            "0 swaps: {}, 1 swap: {}, 2 swaps: {} (lateral {}, axis {})",
            histogram[0], histogram[1], histogram[2], lateral, axis
        ),
    });

    results.push(TestResult {
        name: "assignment_undo_round_trip".into(),
        passed: undo_failures.is_empty(),
        detail: if undo_failures.is_empty() {
            "pairing restored for every selection".into()
        } else {
            format!("not restored: {}", undo_failures.join(", "))
        },
    });

    results.push(TestResult {
        name: "assignment_spot_bijection".into(),
        passed: spot_failures.is_empty(),
        detail: if spot_failures.is_empty() {
            "every selection fills all 8 spots once".into()
        } else {
            spot_failures.join(", ")
        },
    });

    if verbose {
        println!(
            "  exchange histogram: {:?}, lateral={} axis={}",
            histogram, lateral, axis
        );
    }

    results
}

fn four_of_eight() -> Vec<[u8; 4]> {
    let mut out = Vec::with_capacity(70);
    for a in 0..8u8 {
        for b in a + 1..8 {
            for c in b + 1..8 {
                for d in c + 1..8 {
                    out.push([a, b, c, d]);
                }
            }
        }
    }
    out
}

// ── 2. Scenario runs ────────────────────────────────────────────────────

fn run_scenario(scenario: ScenarioConfig, cli: &Cli) -> Vec<TestResult> {
    println!("--- Scenario: {} ---", scenario.name);
    let name = scenario.name.clone();
    let mut results = Vec::new();

    let errors = validate_config(&scenario);
    results.push(TestResult {
        name: format!("{}_config_valid", name),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            format!("{} players, {} loops", scenario.roster.len(), scenario.loops)
        } else {
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        },
    });
    if !errors.is_empty() {
        return results;
    }

    let mut driver = match ScenarioDriver::from_config(scenario) {
        Ok(d) => d,
        Err(e) => {
            results.push(TestResult {
                name: format!("{}_driver", name),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };
    let initial = driver.party().clone();
    let mut renderer = RecordingRenderer::new();

    let reports = match driver.run(&mut renderer) {
        Ok(r) => r,
        Err(e) => {
            results.push(TestResult {
                name: format!("{}_run", name),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };

    let phases_ok = reports.iter().all(|r| r.completed == CyclePhase::ORDER);
    results.push(TestResult {
        name: format!("{}_cycles_complete", name),
        passed: phases_ok && driver.is_finished(),
        detail: format!(
            "{} cycles, {} render batches",
            reports.len(),
            renderer.batches().len()
        ),
    });

    let bad_placements: Vec<_> = reports
        .iter()
        .filter(|r| r.placements.len() != 8 || r.puddles.len() != 4)
        .map(|r| r.cycle + 1)
        .collect();
    results.push(TestResult {
        name: format!("{}_every_spot_filled", name),
        passed: bad_placements.is_empty(),
        detail: if bad_placements.is_empty() {
            "8 placements and 4 puddles every cycle".into()
        } else {
            format!("bad cycles: {:?}", bad_placements)
        },
    });

    let drifted = match (driver.party().group(), initial.group()) {
        (Some(now), Some(then)) => now.pairing() != then.pairing(),
        _ => false,
    } || driver
        .party()
        .entities()
        .iter()
        .zip(initial.entities())
        .any(|(now, then)| now.home != then.home || now.afflicted);
    results.push(TestResult {
        name: format!("{}_no_drift", name),
        passed: !drifted,
        detail: if drifted {
            "party differs from its starting state".into()
        } else {
            "pairing and homes restored after every cycle".into()
        },
    });

    if cli.verbose {
        for r in &reports {
            let doomed: Vec<_> = r
                .afflicted
                .iter()
                .map(|id| initial.entities()[id.index()].role.as_str())
                .collect();
            println!(
                "  cycle {}: doom on [{}], {} exchange(s)",
                r.cycle + 1,
                doomed.join(", "),
                r.exchanges.len()
            );
        }
    }

    if let Some(path) = &cli.timeline {
        let path = timeline_path(path, &name, cli);
        let timeline = Timeline {
            scenario: &name,
            cycles: &reports,
            batches: renderer.batches(),
        };
        let written = serde_json::to_string_pretty(&timeline)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(&path, json).map_err(|e| e.to_string()));
        results.push(TestResult {
            name: format!("{}_timeline_written", name),
            passed: written.is_ok(),
            detail: match written {
                Ok(()) => format!("wrote {}", path.display()),
                Err(e) => format!("{}: {}", path.display(), e),
            },
        });
    }

    results
}

/// With several scenarios, suffix the timeline file with the scenario name.
fn timeline_path(base: &std::path::Path, scenario: &str, cli: &Cli) -> PathBuf {
    if cli.scenario.is_some() || cli.config.is_some() {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "timeline".into());
    base.with_file_name(format!("{}-{}.json", stem, scenario))
}
