// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use crate::core::{
    client::{ClientError, ReadError},
    orchestrator::FlowError,
    units::UnitsError,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rpc error: {0}")]
    Rpc(#[from] alloy::transports::RpcError<alloy::transports::TransportErrorKind>),

    #[error("{0}")]
    Client(#[from] ClientError),
    #[error("{0}")]
    Read(#[from] ReadError),
    #[error("{0}")]
    Units(#[from] UnitsError),
    #[error("{0}")]
    Flow(#[from] FlowError),
}
