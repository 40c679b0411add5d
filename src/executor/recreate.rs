use std::fs::File;
use std::io;
use std::process::{Command, Stdio};

use itertools::Itertools;

use super::profile::{ConnParams, DbType, RunConfig};
use super::terminal;

// mysql client connection flags. Password and port ride attached to their
// flags, the way the client expects them.
pub fn mysql_client_args(conn: &ConnParams) -> Vec<String> {
    let mut argv = vec!["-u".to_string(), conn.user.clone()];
    if let Some(password) = &conn.password {
        argv.push(format!("-p{}", password));
    }
    argv.push("-h".to_string());
    argv.push(conn.host.clone());
    argv.push(format!("-P{}", conn.port));

    argv
}

// psql client connection flags. The port is left to the client's own
// default lookup.
pub fn pgsql_client_args(conn: &ConnParams) -> Vec<String> {
    vec![
        "-U".to_string(),
        conn.user.clone(),
        "-h".to_string(),
        conn.host.clone(),
    ]
}

// Schema files live next to the application: <app>/<app>.<db>.schema.sql
pub fn schema_file(config: &RunConfig) -> String {
    format!("{}/{}.{}.schema.sql", config.app, config.app, config.db)
}

// Echo and run one client invocation. Exit codes are deliberately not
// checked here; only spawn failures surface.
fn invoke(program: &str, argv: &[String], stdin: Option<File>) -> io::Result<()> {
    terminal::exec_msg(&format!("{} {}", program, argv.iter().join(" ")));

    let mut command = Command::new(program);
    command.args(argv);
    if let Some(file) = stdin {
        command.stdin(Stdio::from(file));
    }
    command.status()?;

    Ok(())
}

// Drop and recreate the application's database, then load its schema
pub fn recreate(config: &RunConfig) -> io::Result<()> {
    match config.db_type {
        DbType::Mysql => recreate_mysql(config),
        DbType::Pgsql => recreate_pgsql(config),
    }
}

fn recreate_mysql(config: &RunConfig) -> io::Result<()> {
    let db_name = &config.conn.db;
    let base = mysql_client_args(&config.conn);

    let mut drop_args = base.clone();
    drop_args.push("-e".to_string());
    drop_args.push(format!("drop database if exists `{}`", db_name));
    invoke("mysql", &drop_args, None)?;

    let mut create_args = base.clone();
    create_args.push("-e".to_string());
    create_args.push(format!("create database `{}`", db_name));
    invoke("mysql", &create_args, None)?;

    // The schema file is piped through stdin into the new database
    let schema = File::open(schema_file(config))?;
    let mut load_args = base;
    load_args.push("-D".to_string());
    load_args.push(db_name.clone());
    invoke("mysql", &load_args, Some(schema))
}

fn recreate_pgsql(config: &RunConfig) -> io::Result<()> {
    let db_name = &config.conn.db;
    let base = pgsql_client_args(&config.conn);

    let mut drop_args = base.clone();
    drop_args.push("-c".to_string());
    drop_args.push(format!("drop database if exists \"{}\"", db_name));
    invoke("psql", &drop_args, None)?;

    let mut create_args = base.clone();
    create_args.push("-c".to_string());
    create_args.push(format!("create database \"{}\"", db_name));
    invoke("psql", &create_args, None)?;

    let mut load_args = base;
    load_args.push("-d".to_string());
    load_args.push(db_name.clone());
    load_args.push("-f".to_string());
    load_args.push(schema_file(config));
    invoke("psql", &load_args, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::BenchCtlArgs;
    use crate::executor::profile;

    fn resolve(spec: &str) -> RunConfig {
        let args = BenchCtlArgs {
            cmd: "recreate".to_string(),
            profile: None,
            db: None,
            tag: None,
            schema: None,
            workload: None,
            rows: None,
            times: None,
            dist: None,
            seq: None,
            host: Some("cube2".to_string()),
            cont: None,
            targets: None,
            dump: false,
            jobs: 1,
            apps: Vec::new(),
        };

        profile::resolve(&args, spec).unwrap()
    }

    #[test]
    fn mysql_client_flags() {
        let config = resolve("app1:mysql");
        let argv = mysql_client_args(&config.conn);

        assert_eq!(argv, vec!["-u", "root", "-padmin", "-h", "10.0.0.102", "-P3307"]);
    }

    #[test]
    fn pgsql_client_flags() {
        let config = resolve("app1:pgsql");
        let argv = pgsql_client_args(&config.conn);

        assert_eq!(argv[0], "-U");
        assert_eq!(&argv[2..], ["-h", "10.0.0.102"]);
    }

    #[test]
    fn schema_file_path_follows_the_layout() {
        let config = resolve("app1");
        assert_eq!(schema_file(&config), "app1/app1.base.schema.sql");

        let mut config = resolve("gitlab");
        config.db = "indexed".to_string();
        assert_eq!(schema_file(&config), "gitlab/gitlab.indexed.schema.sql");
    }
}
