use anyhow::{anyhow, Result};
use kex_structs::{
    config::SolverConfig,
    core::{Instance, Strategy, Task, WorkerOutput},
};
use kex_utils::{dejsonify, jsonify, Deadline};
use log::{debug, info, warn};
use std::{
    io::{Read, Write},
    path::PathBuf,
    process::{Child, Command, Stdio},
    sync::mpsc::{sync_channel, TryRecvError},
    thread::{self, JoinHandle},
    time::Duration,
};

/// One isolated worker process: its command line and the bytes fed to its stdin.
pub struct WorkerSpec {
    pub name: String,
    pub command: Command,
    pub input: Vec<u8>,
}

#[derive(Debug)]
pub struct RaceOutcome {
    /// Index into the spawned workers and the output of the first one that produced a result.
    pub winner: Option<(usize, WorkerOutput)>,
    pub pids: Vec<u32>,
}

fn kill_all(children: &mut [Child]) {
    for child in children.iter_mut() {
        let _ = child.kill();
        let _ = child.wait();
    }
}

/// Readers finish once their child is gone and its stdout closes.
fn join_all(readers: Vec<JoinHandle<()>>) {
    for reader in readers {
        let _ = reader.join();
    }
}

/// Starts every worker and returns the first result that arrives before `timeout`.
///
/// Each worker gets a thread that feeds its stdin, reads its stdout to the end and parses a
/// `WorkerOutput`. Results go to a single-slot channel where only the first send succeeds;
/// completions go to a channel sized to the worker count. Every child is killed and reaped,
/// and every reader thread joined, before this returns.
pub fn race(workers: Vec<WorkerSpec>, timeout: Duration, poll_interval: Duration) -> Result<RaceOutcome> {
    let deadline = Deadline::new(timeout);
    let num_workers = workers.len();
    let (result_sender, result_receiver) = sync_channel::<(usize, WorkerOutput)>(1);
    let (done_sender, done_receiver) = sync_channel::<usize>(num_workers.max(1));
    let mut children = Vec::with_capacity(num_workers);
    let mut readers = Vec::with_capacity(num_workers);
    let mut pids = Vec::with_capacity(num_workers);

    for (index, mut spec) in workers.into_iter().enumerate() {
        let spawned = spec
            .command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                kill_all(&mut children);
                join_all(readers);
                return Err(anyhow!("Failed to start worker {}: {}", spec.name, e));
            }
        };
        debug!("Started worker {} (pid {})", spec.name, child.id());
        pids.push(child.id());
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let result_sender = result_sender.clone();
        let done_sender = done_sender.clone();
        let name = spec.name.clone();
        let input = spec.input;
        readers.push(thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(&input) {
                    debug!("Worker {}: failed to write task: {}", name, e);
                }
            }
            let mut raw = String::new();
            if let Some(mut stdout) = stdout {
                let _ = stdout.read_to_string(&mut raw);
            }
            match dejsonify::<WorkerOutput>(raw.trim()) {
                Ok(output) if output.output.is_some() => {
                    info!("Worker {} finished with a result", name);
                    let _ = result_sender.try_send((index, output));
                }
                Ok(_) => info!("Worker {} finished without a result", name),
                Err(e) => debug!("Worker {}: unreadable output: {}", name, e),
            }
            let _ = done_sender.send(index);
        }));
        children.push(child);
    }
    drop(result_sender);
    drop(done_sender);

    let mut completed = 0;
    let winner = loop {
        // completions first: a worker sends its result before its completion
        loop {
            match done_receiver.try_recv() {
                Ok(_) => completed += 1,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        match result_receiver.try_recv() {
            Ok(result) => break Some(result),
            Err(_) if completed == num_workers => break None,
            Err(_) => {}
        }
        if deadline.expired() {
            warn!("Race timed out after {:.3}s", deadline.elapsed().as_secs_f64());
            break None;
        }
        thread::sleep(poll_interval);
    };
    kill_all(&mut children);
    join_all(readers);
    Ok(RaceOutcome { winner, pids })
}

/// `config.worker_path`, or `kex-worker` next to the current executable.
pub fn worker_path(config: &SolverConfig) -> Result<PathBuf> {
    match &config.worker_path {
        Some(path) => Ok(path.clone()),
        None => Ok(std::env::current_exe()?
            .parent()
            .ok_or_else(|| anyhow!("Failed to get executable directory"))?
            .join("kex-worker")),
    }
}

/// Runs each of `strategies` in its own `kex-worker` process and returns the first result.
/// Workers that outlive `config.worker_timeout()` are killed.
pub fn run_workers(
    strategies: &[Strategy],
    instance: &Instance,
    config: &SolverConfig,
) -> Result<Option<WorkerOutput>> {
    let path = worker_path(config)?;
    let workers = strategies
        .iter()
        .map(|&strategy| {
            let task = Task {
                strategy,
                instance: instance.clone(),
                config: config.clone(),
            };
            let mut command = Command::new(&path);
            command.arg("compute_solution");
            WorkerSpec {
                name: strategy.to_string(),
                command,
                input: jsonify(&task).into_bytes(),
            }
        })
        .collect();
    let outcome = race(workers, config.worker_timeout()?, config.poll_interval())?;
    Ok(outcome.winner.map(|(_, output)| output))
}

/// Races every strategy in `Strategy::RACE_MEMBERS`.
pub fn race_strategies(instance: &Instance, config: &SolverConfig) -> Result<Option<WorkerOutput>> {
    run_workers(&Strategy::RACE_MEMBERS, instance, config)
}
