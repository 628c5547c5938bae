//! Tests for add and run subcommands.

use super::parse;
use crate::cli::CliCommand;

#[test]
fn cli_parse_add() {
    match parse(&["dlmgr", "add", "https://example.com/file.iso"]) {
        CliCommand::Add { url } => assert_eq!(url, "https://example.com/file.iso"),
        _ => panic!("expected Add"),
    }
}

#[test]
fn cli_parse_run() {
    match parse(&["dlmgr", "run"]) {
        CliCommand::Run => {}
        _ => panic!("expected Run"),
    }
}
