use std::fs;
use std::io;
use std::path::Path;

use chrono::Utc;

use super::terminal;

// Result files collected for each application
const RESULT_PREFIX: &str = "eval.";
const SAMPLE_FILE: &str = "sample";

pub fn backup_dir_name() -> String {
    format!("backup_{}", Utc::now().format("%m%d%H%M"))
}

// Copy every catalog application's result files into a fresh timestamped
// directory. Applications without a local directory are skipped.
pub fn backup_results(apps: &[&str]) -> io::Result<()> {
    let dir_name = backup_dir_name();
    terminal::info_msg(&format!("backing up results into {}", dir_name));

    backup_into(Path::new("."), &dir_name, apps)
}

pub fn backup_into(root: &Path, dir_name: &str, apps: &[&str]) -> io::Result<()> {
    let backup_root = root.join(dir_name);

    for app in apps {
        let app_dir = root.join(app);
        if !app_dir.is_dir() {
            continue;
        }

        let dest = backup_root.join(app);
        fs::create_dir_all(&dest)?;

        for entry in fs::read_dir(&app_dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();

            if (name.starts_with(RESULT_PREFIX) || name == SAMPLE_FILE) && entry.path().is_file() {
                fs::copy(entry.path(), dest.join(file_name.as_os_str()))?;
            }
        }
    }

    Ok(())
}
