//! Human-readable action reports.

use crate::client::{HttpResponse, ReloadOutcome};
use crate::domain::{ResolvedTarget, Script};
use serde::Deserialize;
use std::io::{self, Write};

pub const AUTH_FAILED: &str = "Authentication failed";

/// Result document most servers return from a script run.
#[derive(Debug, Deserialize)]
struct RunResult {
    retcode: Option<i64>,
    stdout: Option<String>,
    stderr: Option<String>,
}

pub fn write_target_header(out: &mut dyn Write, target: &ResolvedTarget) -> io::Result<()> {
    writeln!(out, "==> {} ({})", target, target.settings.base_url())
}

pub fn write_auth_failure(out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}", AUTH_FAILED)
}

pub fn write_script_names(out: &mut dyn Write, names: &[String]) -> io::Result<()> {
    let mut sorted: Vec<&String> = names.iter().collect();
    sorted.sort();
    for name in sorted {
        writeln!(out, "{}", name)?;
    }
    Ok(())
}

pub fn write_script(out: &mut dyn Write, script: &Script) -> io::Result<()> {
    writeln!(out, "Name: {}", script.name)?;
    writeln!(out, "Lock: {}", script.lock.as_ref().map(ToString::to_string).unwrap_or_else(dash))?;
    writeln!(out, "Filename: {}", script.filename.clone().unwrap_or_else(dash))?;
    writeln!(out, "Description: {}", script.description.clone().unwrap_or_else(dash))?;
    writeln!(out, "HTTP method: {}", script.http_method())?;
    if let Some(output) = &script.output {
        writeln!(out, "Output: {}", output)?;
    }
    if let Some(tags) = script.tags.as_ref().filter(|t| !t.is_empty()) {
        writeln!(out, "Tags: {}", tags.join(", "))?;
    }

    if let Some(params) = &script.params {
        let mut params: Vec<_> = params.iter().collect();
        params.sort_by(|a, b| a.name.cmp(&b.name));
        writeln!(out, "Parameters:")?;
        for param in params {
            writeln!(out, " {}: {}", param.name, param.description.as_deref().unwrap_or(""))?;
        }
    }

    if let Some(filtered) = &script.filtered_params {
        writeln!(out, "Filtered parameters:")?;
        for param in filtered {
            writeln!(out, " {}", param)?;
        }
    }
    Ok(())
}

pub fn write_run_response(out: &mut dyn Write, response: &HttpResponse) -> io::Result<()> {
    writeln!(out, "Status Code: {}", response.status)?;
    writeln!(out, "Headers:")?;
    for (name, value) in &response.headers {
        writeln!(out, " {}: {}", name, value)?;
    }

    match response.json::<RunResult>() {
        Ok(result)
            if result.retcode.is_some() || result.stdout.is_some() || result.stderr.is_some() =>
        {
            let retcode = result.retcode.map(|c| c.to_string()).unwrap_or_else(dash);
            writeln!(out, "Script return code: {}", retcode)?;
            writeln!(out, "Stderr: {}", result.stderr.unwrap_or_default())?;
            writeln!(out, "Stdout: {}", result.stdout.unwrap_or_default())?;
        }
        _ => {
            if !response.body.is_empty() {
                writeln!(out, "Body: {}", response.body)?;
            }
        }
    }
    Ok(())
}

pub fn write_reload_outcome(out: &mut dyn Write, outcome: ReloadOutcome) -> io::Result<()> {
    match outcome {
        ReloadOutcome::Reloaded => writeln!(out, "Reload successful!"),
        ReloadOutcome::Unauthorized => write_auth_failure(out),
        ReloadOutcome::UnexpectedStatus(status) => {
            writeln!(out, "The Jojo responded with an unexpected status code: {}", status)
        }
    }
}

fn dash() -> String {
    "-".to_string()
}
