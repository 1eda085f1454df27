use std::process::{Command, Stdio};

use colored::Colorize;

use crate::error::{CashflowError, Result};
use crate::master::MasterTable;
use crate::settings::Settings;

/// True if `cmd` can be spawned at all. Exit status is ignored since
/// `pdftoppm -v` exits non-zero on some poppler builds.
fn runnable(cmd: &str, version_flag: &str) -> bool {
    let result = Command::new(cmd)
        .arg(version_flag)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match result {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!(cmd, error = %e, "tool not runnable");
            false
        }
    }
}

fn line(label: &str, ok: bool, detail: &str) {
    let status = if ok { "OK".green() } else { "MISSING".red() };
    println!("{:<12} {:<8} {detail}", label, status);
}

pub fn run(settings: &Settings) -> Result<()> {
    let tools = [
        ("pdftoppm", settings.pdftoppm_cmd.as_str(), "-v"),
        ("tesseract", settings.tesseract_cmd.as_str(), "--version"),
    ];
    let mut missing = Vec::new();
    for (name, cmd, flag) in tools {
        let ok = runnable(cmd, flag);
        line(name, ok, cmd);
        if !ok {
            missing.push(format!("{name} ({cmd})"));
        }
    }

    let master_path = settings.master_path();
    let master = MasterTable::load(&master_path)?;
    let master_ok = !master.is_empty();
    line(
        "master",
        master_ok,
        &format!("{} ({} accounts)", master_path.display(), master.len()),
    );
    if !master_ok {
        println!("{}", "  lookups disabled until the account master is added".yellow());
    }

    let source = settings.source_dir();
    line("source", source.is_dir(), &source.display().to_string());

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CashflowError::ToolMissing(missing.join(", ")))
    }
}
