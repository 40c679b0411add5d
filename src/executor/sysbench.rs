use std::io;
use std::process::{Command, ExitStatus};

use itertools::Itertools;

use super::profile::RunConfig;
use super::terminal;

// Workload script handed to sysbench together with the sub-command
pub const WORKLOAD_SCRIPT: &str = "testbed/wtune.lua";

// Build the full sysbench argument vector for one resolved configuration.
// Pure: no lookups, no IO, only the record's own fields.
pub fn sysbench_args(config: &RunConfig) -> Vec<String> {
    let mut argv = vec![
        "--verbosity=3".to_string(),
        format!("--app={}", config.app),
        format!("--tag={}", config.tag),
        format!("--schema={}", config.schema),
        format!("--workload={}", config.workload),
        format!("--rows={}", config.rows),
        format!("--times={}", config.times),
        format!("--randdist={}", config.dist),
        format!("--randseq={}", config.seq),
    ];

    if let Some(cont) = &config.cont {
        argv.push(format!("--continue={}", cont));
    }
    if let Some(targets) = &config.targets {
        argv.push(format!("--targets={}", targets));
    }
    if config.dump {
        argv.push("--dump=true".to_string());
    }

    argv.push(format!("--db-driver={}", config.db_type));
    for (key, value) in config.conn.pairs() {
        argv.push(format!("--{}-{}={}", config.db_type, key, value));
    }

    argv.push(WORKLOAD_SCRIPT.to_string());
    argv.push(config.cmd.clone());

    argv
}

// Echo and run one sysbench invocation, blocking until it exits
pub fn run(program: &str, config: &RunConfig) -> io::Result<ExitStatus> {
    let argv = sysbench_args(config);

    terminal::exec_msg(&format!("{} {}", program, argv.iter().join(" ")));

    Command::new(program)
        .args(&argv)
        .status()
}
