use std::fmt;

use users::{get_user_by_uid, get_current_uid};

use crate::args::BenchCtlArgs;

// Applications whose benchmark targets PostgreSQL unless an explicit
// ':dbtype' suffix says otherwise. Everything else defaults to MySQL.
const PG_APPS: [&str; 3] = ["discourse", "gitlab", "homeland"];

// Database backend targeted by an application's benchmark
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbType {
    Mysql,
    Pgsql,
}

impl DbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::Mysql => "mysql",
            DbType::Pgsql => "pgsql",
        }
    }

    pub fn parse(value: &str) -> Result<DbType, String> {
        match value {
            "mysql" => Ok(DbType::Mysql),
            "pgsql" => Ok(DbType::Pgsql),
            _ => Err(format!("unknown database type: \"{}\"", value)),
        }
    }

    pub fn infer(app: &str) -> DbType {
        if PG_APPS.contains(&app) {
            DbType::Pgsql
        }
        else {
            DbType::Mysql
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Named bundle of default benchmark parameters. Templates are immutable;
// the resolver copies values out of them into a fresh RunConfig, so one
// application's run can never leak state into the next.
pub struct Profile {
    pub db: &'static str,
    pub tag: &'static str,
    pub schema: &'static str,
    pub workload: &'static str,
    pub rows: &'static str,
    pub times: &'static str,
    pub dist: &'static str,
    pub seq: &'static str,
}

const BASE_PROFILE: Profile = Profile {
    db: "base",
    tag: "base",
    schema: "base",
    workload: "base",
    rows: "10000",
    times: "1000",
    dist: "uniform",
    seq: "typed",
};

const INDEXED_PROFILE: Profile = Profile {
    db: "indexed",
    tag: "indexed",
    schema: "indexed",
    workload: "base",
    rows: "10000",
    times: "1000",
    dist: "uniform",
    seq: "typed",
};

const OPT_PROFILE: Profile = Profile {
    db: "indexed",
    tag: "opt",
    schema: "indexed",
    workload: "opt",
    rows: "10000",
    times: "1000",
    dist: "uniform",
    seq: "typed",
};

impl Profile {
    pub fn named(name: &str) -> Option<&'static Profile> {
        match name {
            "base" => Some(&BASE_PROFILE),
            "indexed" => Some(&INDEXED_PROFILE),
            "opt" => Some(&OPT_PROFILE),
            _ => None,
        }
    }
}

// Short host aliases for the lab machines
pub fn resolve_host(host: &str) -> String {
    match host {
        "cube2" => "10.0.0.102".to_string(),
        "cube3" => "10.0.0.103".to_string(),
        "cube5" => "10.0.0.105".to_string(),
        _ => host.to_string(),
    }
}

// Connection parameters handed to the clients and to sysbench.
// Flag emission order is fixed: user, password, port, host, db.
#[derive(Clone, Debug)]
pub struct ConnParams {
    pub user: String,
    pub password: Option<String>,
    pub port: String,
    pub host: String,
    pub db: String,
}

impl ConnParams {
    pub fn defaults(db_type: DbType) -> ConnParams {
        match db_type {
            DbType::Mysql => ConnParams {
                user: "root".to_string(),
                password: Some("admin".to_string()),
                port: "3307".to_string(),
                host: String::new(),
                db: String::new(),
            },
            DbType::Pgsql => ConnParams {
                user: get_os_username(),
                password: None,
                port: "5432".to_string(),
                host: String::new(),
                db: String::new(),
            },
        }
    }

    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![("user", self.user.as_str())];
        if let Some(password) = &self.password {
            pairs.push(("password", password.as_str()));
        }
        pairs.push(("port", self.port.as_str()));
        pairs.push(("host", self.host.as_str()));
        pairs.push(("db", self.db.as_str()));

        pairs
    }
}

// Returns current username, used as the PostgreSQL default (what psql
// itself would pick)
fn get_os_username() -> String {
    get_user_by_uid(get_current_uid())
        .and_then(|user| user.name().to_str().map(String::from))
        .unwrap_or_else(|| "postgres".to_string())
}

// Flat configuration record for one application run. Created fresh per
// application, consumed by a single command invocation, then discarded.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub app: String,
    pub db_type: DbType,
    pub cmd: String,
    pub db: String,
    pub tag: String,
    pub schema: String,
    pub workload: String,
    pub rows: String,
    pub times: String,
    pub dist: String,
    pub seq: String,
    pub host: String,
    pub cont: Option<String>,
    pub targets: Option<String>,
    pub dump: bool,
    pub conn: ConnParams,
}

// Pick one option value: explicit CLI value if present and non-empty,
// else the profile value, else the hard-coded fallback.
fn pick(cli: &Option<String>, profile: Option<&'static str>, fallback: &'static str) -> String {
    match cli {
        Some(value) if !value.is_empty() => value.clone(),
        _ => profile.unwrap_or(fallback).to_string(),
    }
}

// Optional options have no fallback; empty CLI values count as absent.
fn pick_optional(cli: &Option<String>) -> Option<String> {
    cli.clone().filter(|value| !value.is_empty())
}

// Resolve one application specifier ('app' or 'app:dbtype') against the
// global CLI arguments into a full configuration record.
pub fn resolve(args: &BenchCtlArgs, spec: &str) -> Result<RunConfig, String> {
    let (app, explicit_type) = match spec.split_once(':') {
        Some((app, db_type)) => (app, Some(db_type)),
        None => (spec, None),
    };

    if app.is_empty() {
        return Err(format!("empty application name in \"{}\"", spec));
    }

    let db_type = match explicit_type {
        Some(value) => DbType::parse(value)?,
        None => DbType::infer(app),
    };

    let profile = match &args.profile {
        Some(name) => match Profile::named(name) {
            Some(profile) => Some(profile),
            None => return Err(format!("unknown profile: \"{}\"", name)),
        },
        None => None,
    };

    let db = pick(&args.db, profile.map(|p| p.db), "base");
    let tag = pick(&args.tag, profile.map(|p| p.tag), "notag");
    let schema = pick(&args.schema, profile.map(|p| p.schema), "base");
    let workload = pick(&args.workload, profile.map(|p| p.workload), "base");
    let rows = pick(&args.rows, profile.map(|p| p.rows), "10000");
    let times = pick(&args.times, profile.map(|p| p.times), "1000");
    let dist = pick(&args.dist, profile.map(|p| p.dist), "uniform");
    let seq = pick(&args.seq, profile.map(|p| p.seq), "typed");

    let host = resolve_host(&pick(&args.host, None, "10.0.0.102"));

    // The targets list is comma-terminated by convention
    let mut targets = pick_optional(&args.targets);
    if let Some(list) = targets.as_mut() {
        if !list.ends_with(',') {
            list.push(',');
        }
    }

    let mut conn = ConnParams::defaults(db_type);
    conn.host = host.clone();
    conn.db = format!("{}_{}", app, db);

    let config = RunConfig {
        app: app.to_string(),
        db_type: db_type,
        cmd: args.cmd.clone(),
        db: db,
        tag: tag,
        schema: schema,
        workload: workload,
        rows: rows,
        times: times,
        dist: dist,
        seq: seq,
        host: host,
        cont: pick_optional(&args.cont),
        targets: targets,
        dump: args.dump,
        conn: conn,
    };

    // A record handed to a builder always names its app, backend and host
    debug_assert!(!config.app.is_empty());
    debug_assert!(!config.host.is_empty());

    Ok(config)
}
