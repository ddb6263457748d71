//! Output rendering for dispatched actions

pub mod report;

pub use report::{
    write_auth_failure, write_reload_outcome, write_run_response, write_script,
    write_script_names, write_target_header, AUTH_FAILED,
};
