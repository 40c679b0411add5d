use std::thread;

use crossbeam_channel::unbounded;
use itertools::Itertools;
use console::style;
use tabled::{Style, Table, Tabled};

mod backup;
mod profile;
mod recreate;
mod sysbench;
mod terminal;

use crate::args::{BenchCtlArgs, KNOWN_APPS};
use profile::RunConfig;

const SYSBENCH_BIN: &str = "sysbench";

// Outcome of one application's benchmark run
#[derive(Clone, Tabled)]
struct RunOutcome {
    #[tabled(rename = "application")]
    app: String,
    #[tabled(rename = "backend")]
    backend: String,
    #[tabled(rename = "status", display_with = "display_status")]
    ok: bool,
}

fn display_status(ok: &bool) -> String {
    if *ok {
        "ok".to_string()
    }
    else {
        "failed".to_string()
    }
}

pub struct Executor {
    args: BenchCtlArgs,
    program: String,
    outcomes: Vec<RunOutcome>,
}

impl Executor {
    pub fn new(args: BenchCtlArgs) -> Executor {
        Executor {
            args: args,
            program: SYSBENCH_BIN.to_string(),
            outcomes: Vec::new(),
        }
    }

    // Resolve every application specifier before the first child process
    // starts, so a bad specifier aborts the run cleanly.
    fn resolve_all(&self) -> Vec<RunConfig> {
        let mut configs = Vec::with_capacity(self.args.apps.len());

        for spec in &self.args.apps {
            match profile::resolve(&self.args, spec) {
                Ok(config) => configs.push(config),
                Err(error) => {
                    terminal::err_msg(&error);
                    std::process::exit(1);
                },
            }
        }

        configs
    }

    // Run the benchmark sub-command for every application and collect the
    // outcomes. Sequential by default; -j/--jobs > 1 fans the runs out over
    // worker threads.
    pub fn run_benchmarks(&mut self) -> &mut Self {
        let configs = self.resolve_all();

        if self.args.jobs <= 1 {
            for config in &configs {
                let outcome = run_one(&self.program, config);
                self.outcomes.push(outcome);
            }
        }
        else {
            self.run_pool(configs);
        }

        self
    }

    // Worker pool: one row of applications per job, outcomes funneled back
    // over a channel.
    fn run_pool(&mut self, configs: Vec<RunConfig>) {
        let n_jobs = self.args.jobs as usize;

        let mut rows: Vec<Vec<RunConfig>> = Vec::with_capacity(n_jobs);
        for _ in 0..n_jobs {
            rows.push(Vec::new());
        }
        for (n, config) in configs.into_iter().enumerate() {
            rows[n % n_jobs].push(config);
        }

        let (tx, rx) = unbounded();
        let mut jobs = Vec::new();

        for row in rows {
            let job_tx = tx.clone();
            let program = self.program.clone();

            let job = thread::spawn(move || {
                for config in row {
                    job_tx.send(run_one(&program, &config)).unwrap();
                }
            });

            jobs.push(job);
        }
        drop(tx);

        for outcome in rx {
            self.outcomes.push(outcome);
        }

        // Wait for the end of all jobs
        for job in jobs {
            job.join().expect("the worker thread panicked");
        }
    }

    // Drop, recreate and reload the database of every application.
    // Statement exit codes are not checked; IO errors abort the run.
    pub fn recreate_all(&mut self) -> &mut Self {
        let configs = self.resolve_all();

        for config in &configs {
            terminal::info_msg(&format!(
                "recreating {} on {} ({})", config.conn.db, config.host, config.db_type
            ));
            if let Err(error) = recreate::recreate(config) {
                terminal::err_msg(&format!("recreate {}: {}", config.app, error));
                std::process::exit(1);
            }
        }

        self
    }

    // Print the per-application summary table and the failed set.
    // The process exit code stays 0 either way.
    pub fn print_summary(&mut self) -> &mut Self {
        if self.outcomes.is_empty() {
            return self;
        }

        let mut table = Table::new(&self.outcomes);
        table.with(Style::rounded());
        println!("{}", table);

        let failed: Vec<&str> = self.outcomes
            .iter()
            .filter(|outcome| !outcome.ok)
            .map(|outcome| outcome.app.as_str())
            .collect();

        if !failed.is_empty() {
            println!("{} {}", style("failed:").red().bold(), failed.iter().join(", "));
        }

        self
    }
}

// Invoke sysbench once. A missing binary counts as a failed run, not a
// fatal error, so the remaining applications still get their turn.
fn run_one(program: &str, config: &RunConfig) -> RunOutcome {
    terminal::info_msg(&format!(
        "app: {} ({}), host: {}, tag: {}, schema: {}, workload: {}",
        config.app, config.db_type, config.host, config.tag, config.schema, config.workload
    ));

    let ok = match sysbench::run(program, config) {
        Ok(status) => status.success(),
        Err(error) => {
            terminal::err_msg(&format!("{}: {}", program, error));
            false
        },
    };

    RunOutcome {
        app: config.app.clone(),
        backend: config.db_type.to_string(),
        ok: ok,
    }
}

// Backup mode short-circuits everything else and walks the whole catalog
pub fn run_backup() {
    if let Err(error) = backup::backup_results(&KNOWN_APPS) {
        terminal::err_msg(&format!("backup: {}", error));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn args_for(cmd: &str, apps: &[&str], jobs: u32) -> BenchCtlArgs {
        BenchCtlArgs {
            cmd: cmd.to_string(),
            profile: Some("base".to_string()),
            db: None,
            tag: None,
            schema: None,
            workload: None,
            rows: None,
            times: None,
            dist: None,
            seq: None,
            host: None,
            cont: None,
            targets: None,
            dump: false,
            jobs: jobs,
            apps: apps.iter().map(|s| s.to_string()).collect(),
        }
    }

    // Stand-in for the sysbench binary: exits non-zero only when asked to
    // run app2
    fn write_stub(dir: &Path) -> String {
        let path = dir.join("sysbench-stub");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"#!/bin/sh\nfor a in \"$@\"; do\n  case \"$a\" in --app=app2) exit 1;; esac\ndone\nexit 0\n").unwrap();

        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();

        path.to_string_lossy().to_string()
    }

    fn failed_apps(executor: &Executor) -> Vec<String> {
        let mut failed: Vec<String> = executor.outcomes
            .iter()
            .filter(|outcome| !outcome.ok)
            .map(|outcome| outcome.app.clone())
            .collect();
        failed.sort();

        failed
    }

    #[test]
    fn collects_exactly_the_failed_applications() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub(dir.path());

        let mut executor = Executor::new(args_for("select", &["app1", "app2", "app3"], 1));
        executor.program = stub;
        executor.run_benchmarks();

        assert_eq!(executor.outcomes.len(), 3);
        assert_eq!(failed_apps(&executor), vec!["app2"]);
        // Sequential mode preserves the application order
        let order: Vec<&str> = executor.outcomes.iter().map(|o| o.app.as_str()).collect();
        assert_eq!(order, vec!["app1", "app2", "app3"]);
    }

    #[test]
    fn worker_pool_reports_the_same_failures() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub(dir.path());

        let mut executor = Executor::new(args_for("select", &["app1", "app2", "app3", "app4"], 2));
        executor.program = stub;
        executor.run_benchmarks();

        assert_eq!(executor.outcomes.len(), 4);
        assert_eq!(failed_apps(&executor), vec!["app2"]);
    }

    #[test]
    fn missing_binary_is_a_failed_run_not_a_crash() {
        let mut executor = Executor::new(args_for("select", &["app1"], 1));
        executor.program = "/no/such/sysbench".to_string();
        executor.run_benchmarks();

        assert_eq!(executor.outcomes.len(), 1);
        assert!(!executor.outcomes[0].ok);
    }

    #[test]
    fn outcome_backend_follows_the_inferred_type() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub(dir.path());

        let mut executor = Executor::new(args_for("select", &["discourse", "wordpress"], 1));
        executor.program = stub;
        executor.run_benchmarks();

        let backends: Vec<&str> = executor.outcomes.iter().map(|o| o.backend.as_str()).collect();
        assert_eq!(backends, vec!["pgsql", "mysql"]);
    }
}
