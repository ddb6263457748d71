//! Per-target action dispatch
//!
//! Targets are processed one at a time, in resolution order. Each gets its
//! own [`RemoteClient`]; a failure on one target is reported and the next
//! target is still attempted.

use crate::client::{ClientError, ReloadOutcome, RemoteClient, TagFilter, Transport};
use crate::domain::ResolvedTarget;
use crate::render;
use anyhow::Result;
use std::collections::BTreeMap;
use std::io::Write;

/// The one action an invocation performs against every target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List { filter: Option<TagFilter> },
    Show { script: String },
    Run { script: String, params: BTreeMap<String, String> },
    Reload,
}

/// Per-invocation tally, used only for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Run `action` against each target. `connect` builds the client for one
/// target; normal output goes to `out`, per-target errors to `err`.
pub fn dispatch<T, C>(
    targets: &[ResolvedTarget],
    action: &Action,
    mut connect: C,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<DispatchSummary>
where
    T: Transport,
    C: FnMut(&ResolvedTarget) -> Result<RemoteClient<T>>,
{
    let mut summary = DispatchSummary::default();
    let show_headers = targets.len() > 1;

    for target in targets {
        if show_headers {
            render::write_target_header(out, target)?;
        }

        let outcome = match connect(target) {
            Ok(mut client) => execute(&mut client, action, &mut *out),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(true) => summary.succeeded += 1,
            Ok(false) => summary.failed += 1,
            Err(e) => {
                tracing::error!("{} failed: {:#}", target, e);
                writeln!(err, "Error ({}): {:#}", target, e)?;
                summary.failed += 1;
            }
        }
    }

    tracing::debug!(
        "Dispatch finished: {} succeeded, {} failed",
        summary.succeeded,
        summary.failed
    );
    Ok(summary)
}

/// Perform `action` on one client. `Ok(false)` means the target answered but
/// the action did not succeed (authentication or lookup failure).
pub fn execute<T: Transport>(
    client: &mut RemoteClient<T>,
    action: &Action,
    out: &mut dyn Write,
) -> Result<bool> {
    match action {
        Action::List { filter } => {
            let names = client.list(filter.as_ref())?;
            if client.is_unauthorized() {
                render::write_auth_failure(out)?;
                return Ok(false);
            }
            render::write_script_names(out, &names)?;
            Ok(true)
        }
        Action::Show { script } => {
            let cached = client.get_script(script, true)?.cloned();
            let found = match cached {
                Some(found) => Some(found),
                None => client.get_script(script, false)?.cloned(),
            };
            if client.is_unauthorized() {
                render::write_auth_failure(out)?;
                return Ok(false);
            }
            match found {
                Some(found) => {
                    render::write_script(out, &found)?;
                    Ok(true)
                }
                None => Err(ClientError::ScriptNotFound(script.clone()).into()),
            }
        }
        Action::Run { script, params } => match client.run(script, params) {
            Ok(_) if client.is_unauthorized() => {
                render::write_auth_failure(out)?;
                Ok(false)
            }
            Ok(response) => {
                render::write_run_response(out, &response)?;
                Ok(true)
            }
            Err(_) if client.is_unauthorized() => {
                render::write_auth_failure(out)?;
                Ok(false)
            }
            Err(e) => Err(e),
        },
        Action::Reload => {
            let outcome = client.reload()?;
            if client.is_unauthorized() {
                render::write_auth_failure(out)?;
                return Ok(false);
            }
            render::write_reload_outcome(out, outcome)?;
            Ok(outcome == ReloadOutcome::Reloaded)
        }
    }
}
