//! Doctor - Report how dfixxer would be resolved, without downloading

use colored::Colorize;
use std::path::Path;

use crate::backends::locate::{locate_on_path, Resolver};
use crate::core::paths::find_config;
use crate::core::platform::Platform;
use crate::core::util::is_executable;

/// One line of the doctor report
#[derive(Debug, Clone)]
pub struct CheckStatus {
    pub name: String,
    pub ok: bool,
    pub detail: String,
    /// A failed required check means the hook cannot run offline
    pub required: bool,
}

impl CheckStatus {
    fn new(name: &str, ok: bool, detail: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            ok,
            detail: detail.into(),
            required,
        }
    }

    pub fn render(&self) -> String {
        let mark = if self.ok {
            "✓".green()
        } else if self.required {
            "✗".red()
        } else {
            "-".yellow()
        };
        format!("{} {}: {}", mark, self.name.bold(), self.detail)
    }
}

/// Run every check
pub fn check_all(resolver: &Resolver, cwd: &Path) -> Vec<CheckStatus> {
    let mut checks = Vec::new();

    let platform = Platform::detect();
    checks.push(match &platform {
        Ok(p) => CheckStatus::new("platform", true, p.to_string(), true),
        Err(e) => CheckStatus::new("platform", false, e.to_string(), true),
    });

    let on_path = if resolver.search_path {
        locate_on_path()
    } else {
        None
    };
    checks.push(CheckStatus::new(
        "PATH",
        on_path.is_some(),
        match (&on_path, resolver.search_path) {
            (Some(p), _) => format!("found {}", p.display()),
            (None, true) => "dfixxer not found".to_string(),
            (None, false) => "lookup disabled".to_string(),
        },
        false,
    ));

    let cached = platform.as_ref().ok().map(|p| resolver.store(p));
    checks.push(match &cached {
        Some(Err(e)) => CheckStatus::new("cache", false, e.to_string(), true),
        Some(Ok(store)) => match store.cached_binary() {
            Some(path) if is_executable(&path) => {
                let origin = store
                    .read_meta()
                    .map(|m| format!(" (from {}, {})", m.asset_name, m.fetched_at.to_rfc3339()))
                    .unwrap_or_default();
                CheckStatus::new("cache", true, format!("{}{}", path.display(), origin), false)
            }
            Some(path) => CheckStatus::new(
                "cache",
                false,
                format!("{} is not executable", path.display()),
                false,
            ),
            None => CheckStatus::new(
                "cache",
                false,
                format!("empty, {} will be downloaded", store.release_tag()),
                false,
            ),
        },
        None => CheckStatus::new("cache", false, "unavailable on this platform", false),
    });

    if let Some(binary) = &resolver.binary_override {
        checks.push(CheckStatus::new(
            "override",
            binary.is_file() || which::which(binary).is_ok(),
            binary.display().to_string(),
            true,
        ));
    }

    let config = find_config(cwd);
    checks.push(CheckStatus::new(
        "dfixxer.toml",
        config.is_some(),
        config
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "not found, dfixxer defaults apply".to_string()),
        false,
    ));

    checks
}

/// Print the report; the hook is ready if any binary source is usable
pub fn run_doctor(resolver: &Resolver, cwd: &Path) -> bool {
    let checks = check_all(resolver, cwd);
    for check in &checks {
        println!("{}", check.render());
    }

    let missing_required = checks.iter().any(|c| c.required && !c.ok);
    if missing_required {
        eprintln!("\n⚠️  dfixxer-hook cannot run on this machine as configured");
    }
    !missing_required
}
