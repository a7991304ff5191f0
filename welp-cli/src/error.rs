// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::fmt;
use std::process::ExitCode;

use welp_tools::core::orchestrator::FlowError;

use crate::constants::INVALID_INPUT_EXIT_CODE;

pub type WelpCliResult = Result<(), WelpCliError>;

#[derive(Debug)]
pub struct WelpCliError {
    error: eyre::Error,
    exit_code: ExitCode,
}

impl WelpCliError {
    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }
}

impl fmt::Display for WelpCliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl From<std::io::Error> for WelpCliError {
    fn from(err: std::io::Error) -> Self {
        Self {
            error: err.into(),
            exit_code: ExitCode::FAILURE,
        }
    }
}

impl From<eyre::Error> for WelpCliError {
    fn from(error: eyre::Error) -> Self {
        let exit_code = match error.downcast_ref::<FlowError>() {
            Some(FlowError::InvalidAmount(_)) => ExitCode::from(INVALID_INPUT_EXIT_CODE),
            _ => ExitCode::FAILURE,
        };
        Self { error, exit_code }
    }
}

impl From<welp_tools::Error> for WelpCliError {
    fn from(err: welp_tools::Error) -> Self {
        Self {
            error: err.into(),
            exit_code: ExitCode::FAILURE,
        }
    }
}

/// Flow errors are shown with their user-facing message.
impl From<FlowError> for WelpCliError {
    fn from(err: FlowError) -> Self {
        let exit_code = match err {
            FlowError::InvalidAmount(_) => ExitCode::from(INVALID_INPUT_EXIT_CODE),
            _ => ExitCode::FAILURE,
        };
        let message = err.user_message();
        Self {
            error: eyre::Error::new(err).wrap_err(message),
            exit_code,
        }
    }
}
