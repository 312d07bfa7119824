//! Command handlers for the `pow-rsa` binary

pub mod commands;

pub use commands::{
    cmd_keygen, cmd_mine, cmd_run, cmd_sign, cmd_verify, CliResult, MessageSource,
    PipelineConfig, PipelineReport,
};
