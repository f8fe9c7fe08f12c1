use anyhow::{anyhow, Result};
use clap::{arg, Command};
use kex_algorithms::solve_strategy;
use kex_structs::{
    config::SolverConfig,
    core::{Instance, Strategy, Task, WorkerOutput},
};
use kex_utils::{jsonify, load_json};
use kex_worker::{drive, WorkerRunner};

fn cli() -> Command {
    Command::new("kex-worker")
        .about("Computes maximum weight cycle and chain covers")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("compute_solution")
                .about("Runs a single strategy on a task and prints the worker output")
                .arg(
                    arg!([TASK] "Task json string, path to json file, or - for stdin")
                        .default_value("-")
                        .value_parser(clap::value_parser!(String)),
                ),
        )
        .subcommand(
            Command::new("solve")
                .about("Solves an instance, relaxing the cycle bound after failed attempts")
                .arg(
                    arg!(<INSTANCE> "Instance json string, path to json file, or - for stdin")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--strategy [STRATEGY] "race, basic, extended or fallback")
                        .default_value("race")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--config [CONFIG] "Solver config json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(arg!(--"no-decrease" "Do not relax the cycle bound after a failed attempt")),
        )
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = cli().get_matches();

    if let Err(e) = match matches.subcommand() {
        Some(("compute_solution", sub_m)) => compute_solution(
            sub_m
                .get_one::<String>("TASK")
                .cloned()
                .unwrap_or_else(|| "-".to_string()),
        ),
        Some(("solve", sub_m)) => match sub_m.get_one::<String>("INSTANCE") {
            Some(instance) => solve(
                instance.clone(),
                sub_m
                    .get_one::<String>("strategy")
                    .cloned()
                    .unwrap_or_default(),
                sub_m.get_one::<String>("config").cloned(),
                sub_m.get_flag("no-decrease"),
            ),
            None => Err(anyhow!("Missing instance")),
        },
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn compute_solution(task: String) -> Result<()> {
    let task: Task = load_json(&task)?;
    let result = solve_strategy(task.strategy, &task.instance, &task.config);
    let output = WorkerOutput {
        strategy: task.strategy,
        output: result.as_ref().ok().cloned().flatten(),
    };
    println!("{}", jsonify(&output));
    result.map(|_| ())
}

fn solve(instance: String, strategy: String, config: Option<String>, no_decrease: bool) -> Result<()> {
    let instance: Instance = load_json(&instance)?;
    let mut config = match config {
        Some(config) => SolverConfig::load(&config)?,
        None => SolverConfig::default(),
    };
    if no_decrease {
        config.decrease = false;
    }
    let strategy = Strategy::from_name(&strategy);
    match drive(&mut WorkerRunner, &instance, strategy, &config)? {
        Some(result) => {
            println!("{}", jsonify(&result));
            Ok(())
        }
        None => Err(anyhow!("No solution found")),
    }
}
