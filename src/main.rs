mod executor;
mod args;

fn main() {
    // Parse command arguments
    let env = args::BenchCtlArgs::new();

    match &*env.cmd {
        "backup" => {
            executor::run_backup();
        },
        "recreate" => {
            executor::Executor::new(env)
                .recreate_all();
        },
        _ => {
            executor::Executor::new(env)
                .run_benchmarks()
                .print_summary();
        },
    }
}
