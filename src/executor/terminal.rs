use std::io::{self, Write};
use console::style;

// Echo an external command line right before it runs
pub fn exec_msg(line: &str) {
    let m = format!("{} {}\n", style("[exec]").bold().dim(), line);
    io::stdout().write_all(m.as_bytes()).unwrap();
    io::stdout().flush().unwrap();
}

// Progress note for the current application
pub fn info_msg(message: &str) {
    let m = format!("{} {}\n", style("[exec]").bold().dim(), style(message).dim());
    io::stdout().write_all(m.as_bytes()).unwrap();
    io::stdout().flush().unwrap();
}

pub fn err_msg(error: &str) {
    let m = format!("{} {}\n", style("ERROR").red().bold(), error);
    io::stderr().write_all(m.as_bytes()).unwrap();
    io::stderr().flush().unwrap();
}
