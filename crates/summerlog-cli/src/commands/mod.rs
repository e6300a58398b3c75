pub mod configure;
pub mod run;
pub mod status;

use summerlog_core::exit_code;

/// Exit code for an error that escaped a command handler.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<summerlog_core::Error>())
        .map(summerlog_core::Error::exit_code)
        .unwrap_or(exit_code::UNEXPECTED)
}
