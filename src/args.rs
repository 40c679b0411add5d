extern crate clap;

use clap::{Arg, ArgAction, ColorChoice, Command};
use clap::error::ErrorKind;
use std::ffi::OsString;


// Fixed, ordered catalog of known application workloads. The 'all' and
// '>name' application specifiers expand against this list.
pub const KNOWN_APPS: [&str; 23] = [
    "broadleaf", "diaspora", "discourse", "eladmin", "fanchaoo", "fatfreecrm",
    "febs", "forest_blog", "gitlab", "guns", "halo", "homeland", "lobsters",
    "publiccms", "pybbs", "redmine", "refinerycms", "sagan", "shopizer",
    "solidus", "spree", "springblog", "wordpress",
];

// CLI arguments
#[derive(Clone, Debug)]
pub struct BenchCtlArgs {
    // Benchmark sub-command passed to sysbench, or one of: recreate, backup
    pub cmd: String,
    // Named option profile: base, indexed, opt
    pub profile: Option<String>,
    // Database suffix, forms the database name <app>_<db>
    pub db: Option<String>,
    // Tag attached to the result files
    pub tag: Option<String>,
    // Schema identifier
    pub schema: Option<String>,
    // Workload identifier
    pub workload: Option<String>,
    // Number of rows to populate
    pub rows: Option<String>,
    // Number of workload iterations
    pub times: Option<String>,
    // Random distribution passed to the workload
    pub dist: Option<String>,
    // Random sequence mode passed to the workload
    pub seq: Option<String>,
    // Database host alias or address
    pub host: Option<String>,
    // Operation index to continue an interrupted run from
    pub cont: Option<String>,
    // Comma-separated list of workload operations to execute
    pub targets: Option<String>,
    // Ask the workload to dump its results
    pub dump: bool,
    // Number of worker threads used for benchmark runs
    pub jobs: u32,
    // Resolved application list, catalog specifiers already expanded
    pub apps: Vec<String>,
}

// Parse and convert an argument string coming from clap to u32
fn parse_string_arg_to_u32(value: &str, error_msg: String) -> Result<u32, clap::Error> {
    match value.parse::<u32>() {
        Ok(v) => Ok(v),
        Err(_) => Err(
            clap::Error::raw(
                ErrorKind::InvalidValue,
                format!("{}: \"{}\"\n", error_msg, value)
            )
        ),
    }
}

// Expand 'all' and '>name' specifiers against the application catalog.
// Literal names pass through untouched, so ad-hoc application directories
// outside the catalog keep working.
fn expand_apps(specs: Vec<String>) -> Result<Vec<String>, clap::Error> {
    let mut apps = Vec::new();

    for spec in specs {
        if spec == "all" {
            apps.extend(KNOWN_APPS.iter().map(|a| a.to_string()));
        }
        else if let Some(name) = spec.strip_prefix('>') {
            let start = match KNOWN_APPS.iter().position(|a| *a == name) {
                Some(index) => index,
                None => {
                    return Err(
                        clap::Error::raw(
                            ErrorKind::InvalidValue,
                            format!("unknown application: \"{}\"\n", name)
                        )
                    )
                },
            };
            apps.extend(KNOWN_APPS[start..].iter().map(|a| a.to_string()));
        }
        else {
            apps.push(spec);
        }
    }

    Ok(apps)
}

impl BenchCtlArgs {
    pub fn new() -> Self {
        Self::new_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    fn new_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: Iterator<Item = T>,
        T: Into<OsString> + Clone,
    {

        // Define the --cmd/-c command line option
        let cmd_option = Arg::new("cmd")
            .long("cmd") // allow --cmd
            .action(ArgAction::Set)
            .short('c') // allow -c
            .help("Benchmark sub-command to run, or one of: recreate, backup")
            .required(true)
            .value_name("CMD");

        // Define the --profile/-p command line option
        let profile_option = Arg::new("profile")
            .long("profile") // allow --profile
            .action(ArgAction::Set)
            .short('p') // allow -p
            .help("Named option profile: base, indexed, opt")
            .required(false)
            .value_name("NAME");

        // Define the --db/-d command line option
        let db_option = Arg::new("db")
            .long("db") // allow --db
            .action(ArgAction::Set)
            .short('d') // allow -d
            .help("Database suffix, forms the database name <app>_<db>")
            .required(false)
            .value_name("DB");

        // Define the --tag/-t command line option
        let tag_option = Arg::new("tag")
            .long("tag") // allow --tag
            .action(ArgAction::Set)
            .short('t') // allow -t
            .help("Tag attached to the result files")
            .required(false)
            .value_name("TAG");

        // Define the --schema/-s command line option
        let schema_option = Arg::new("schema")
            .long("schema") // allow --schema
            .action(ArgAction::Set)
            .short('s') // allow -s
            .help("Schema identifier")
            .required(false)
            .value_name("NAME");

        // Define the --workload/-w command line option
        let workload_option = Arg::new("workload")
            .long("workload") // allow --workload
            .action(ArgAction::Set)
            .short('w') // allow -w
            .help("Workload identifier")
            .required(false)
            .value_name("NAME");

        // Define the --rows/-r command line option
        let rows_option = Arg::new("rows")
            .long("rows") // allow --rows
            .action(ArgAction::Set)
            .short('r') // allow -r
            .help("Number of rows to populate")
            .required(false)
            .value_name("NUM");

        // Define the --times/-R command line option
        let times_option = Arg::new("times")
            .long("times") // allow --times
            .action(ArgAction::Set)
            .short('R') // allow -R
            .help("Number of workload iterations")
            .required(false)
            .value_name("NUM");

        // Define the --dist/-D command line option
        let dist_option = Arg::new("dist")
            .long("dist") // allow --dist
            .action(ArgAction::Set)
            .short('D') // allow -D
            .help("Random distribution passed to the workload")
            .required(false)
            .value_name("NAME");

        // Define the --seq/-S command line option
        let seq_option = Arg::new("seq")
            .long("seq") // allow --seq
            .action(ArgAction::Set)
            .short('S') // allow -S
            .help("Random sequence mode passed to the workload")
            .required(false)
            .value_name("NAME");

        // Define the --host/-H command line option
        let host_option = Arg::new("host")
            .long("host") // allow --host
            .action(ArgAction::Set)
            .short('H') // allow -H
            .help("Database host alias or address")
            .required(false)
            .value_name("HOST");

        // Define the --continue/-C command line option
        let continue_option = Arg::new("continue")
            .long("continue") // allow --continue
            .action(ArgAction::Set)
            .short('C') // allow -C
            .help("Operation index to continue an interrupted run from")
            .required(false)
            .value_name("NUM");

        // Define the --targets/-T command line option
        let targets_option = Arg::new("targets")
            .long("targets") // allow --targets
            .action(ArgAction::Set)
            .short('T') // allow -T
            .help("Comma-separated list of workload operations to execute")
            .required(false)
            .value_name("LIST");

        // Define the --dump/-o command line flag
        let dump_option = Arg::new("dump")
            .long("dump") // allow --dump
            .action(ArgAction::SetTrue)
            .short('o') // allow -o
            .help("Ask the workload to dump its results")
            .required(false);

        // Define the --jobs/-j command line option
        let jobs_option = Arg::new("jobs")
            .long("jobs") // allow --jobs
            .action(ArgAction::Set)
            .short('j') // allow -j
            .help("Number of worker threads used for benchmark runs")
            .required(false)
            .value_name("NUM")
            .default_value("1");

        // Define the positional application list
        let apps_option = Arg::new("apps")
            .action(ArgAction::Append)
            .help("Applications to process: names, 'all', or '>name'")
            .required(true)
            .value_name("APP");

        // Basic app information
        let cmd = Command::new("benchctl")
            .version("0.1.0")
            .color(ColorChoice::Never)
            .about("Benchmark orchestration for sysbench-driven application workloads")
            .arg_required_else_help(true);

        // Add in the arguments we want to parse
        let cmd = cmd
            .arg(cmd_option)
            .arg(profile_option)
            .arg(db_option)
            .arg(tag_option)
            .arg(schema_option)
            .arg(workload_option)
            .arg(rows_option)
            .arg(times_option)
            .arg(dist_option)
            .arg(seq_option)
            .arg(host_option)
            .arg(continue_option)
            .arg(targets_option)
            .arg(dump_option)
            .arg(jobs_option)
            .arg(apps_option);

        // Extract the matches
        let matches = cmd.try_get_matches_from(args)?;

        let jobs_str = matches
            .get_one::<String>("jobs")
            .unwrap();

        // Convert jobs to u32, at least one worker
        let jobs = parse_string_arg_to_u32(jobs_str, "invalid jobs number".to_string())?;
        let jobs = jobs.max(1);

        // Expand the application specifiers against the catalog
        let specs: Vec<String> = matches
            .get_many::<String>("apps")
            .unwrap()
            .cloned()
            .collect();
        let apps = expand_apps(specs)?;

        Ok(
            BenchCtlArgs {
                cmd: matches.get_one::<String>("cmd").unwrap().to_string(),
                profile: matches.get_one::<String>("profile").cloned(),
                db: matches.get_one::<String>("db").cloned(),
                tag: matches.get_one::<String>("tag").cloned(),
                schema: matches.get_one::<String>("schema").cloned(),
                workload: matches.get_one::<String>("workload").cloned(),
                rows: matches.get_one::<String>("rows").cloned(),
                times: matches.get_one::<String>("times").cloned(),
                dist: matches.get_one::<String>("dist").cloned(),
                seq: matches.get_one::<String>("seq").cloned(),
                host: matches.get_one::<String>("host").cloned(),
                cont: matches.get_one::<String>("continue").cloned(),
                targets: matches.get_one::<String>("targets").cloned(),
                dump: matches.get_flag("dump"),
                jobs: jobs,
                apps: apps,
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<BenchCtlArgs, clap::Error> {
        BenchCtlArgs::new_from(argv.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_overrides_and_apps() {
        let args = parse(&["benchctl", "-c", "select", "-p", "base", "-r", "500", "-o", "app1", "app2"]).unwrap();

        assert_eq!(args.cmd, "select");
        assert_eq!(args.profile.as_deref(), Some("base"));
        assert_eq!(args.rows.as_deref(), Some("500"));
        assert!(args.dump);
        assert_eq!(args.jobs, 1);
        assert_eq!(args.apps, vec!["app1", "app2"]);
    }

    #[test]
    fn cmd_is_required() {
        assert!(parse(&["benchctl", "app1"]).is_err());
    }

    #[test]
    fn expands_all_to_the_whole_catalog() {
        let args = parse(&["benchctl", "-c", "select", "all"]).unwrap();

        assert_eq!(args.apps.len(), KNOWN_APPS.len());
        assert_eq!(args.apps.first().map(|s| s.as_str()), Some("broadleaf"));
        assert_eq!(args.apps.last().map(|s| s.as_str()), Some("wordpress"));
    }

    #[test]
    fn expands_range_from_a_catalog_name() {
        let args = parse(&["benchctl", "-c", "select", ">solidus"]).unwrap();

        assert_eq!(args.apps, vec!["solidus", "spree", "springblog", "wordpress"]);
    }

    #[test]
    fn rejects_range_from_an_unknown_name() {
        let err = parse(&["benchctl", "-c", "select", ">nosuchapp"]).unwrap_err();

        assert!(err.to_string().contains("unknown application"));
    }

    #[test]
    fn keeps_literal_names_outside_the_catalog() {
        let args = parse(&["benchctl", "-c", "select", "myapp:pgsql"]).unwrap();

        assert_eq!(args.apps, vec!["myapp:pgsql"]);
    }

    #[test]
    fn jobs_parses_and_clamps_to_one() {
        let args = parse(&["benchctl", "-c", "select", "-j", "4", "app1"]).unwrap();
        assert_eq!(args.jobs, 4);

        let args = parse(&["benchctl", "-c", "select", "-j", "0", "app1"]).unwrap();
        assert_eq!(args.jobs, 1);

        assert!(parse(&["benchctl", "-c", "select", "-j", "lots", "app1"]).is_err());
    }
}
