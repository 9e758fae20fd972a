use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn cli_parse_get() {
    match parse(&["chunkflow", "get", "https://example.com/file.iso"]) {
        CliCommand::Get { url, chunks } => {
            assert_eq!(url, "https://example.com/file.iso");
            assert_eq!(chunks, None);
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_with_chunks() {
    match parse(&["chunkflow", "get", "https://example.com/a", "--chunks", "8"]) {
        CliCommand::Get { chunks, .. } => assert_eq!(chunks, Some(8)),
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_rejects_negative_chunks() {
    assert!(Cli::try_parse_from(["chunkflow", "get", "https://x/a", "--chunks", "-2"]).is_err());
}

#[test]
fn cli_parse_upload() {
    match parse(&[
        "chunkflow",
        "upload",
        "notes.txt",
        "https://example.com/up",
        "--type",
        "text/plain",
    ]) {
        CliCommand::Upload {
            path,
            url,
            mime_type,
        } => {
            assert_eq!(path, PathBuf::from("notes.txt"));
            assert_eq!(url, "https://example.com/up");
            assert_eq!(mime_type.as_deref(), Some("text/plain"));
        }
        _ => panic!("expected Upload"),
    }
}

#[test]
fn cli_parse_upload_requires_url() {
    assert!(Cli::try_parse_from(["chunkflow", "upload", "notes.txt"]).is_err());
}

#[test]
fn cli_parse_set_chunks_keeps_raw_text() {
    match parse(&["chunkflow", "set-chunks", "lots"]) {
        CliCommand::SetChunks { count } => assert_eq!(count, "lots"),
        _ => panic!("expected SetChunks"),
    }
}

#[test]
fn cli_parse_list_and_uploads() {
    assert!(matches!(parse(&["chunkflow", "list"]), CliCommand::List));
    assert!(matches!(parse(&["chunkflow", "uploads"]), CliCommand::Uploads));
}
