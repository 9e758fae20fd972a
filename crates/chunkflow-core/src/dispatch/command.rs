//! Inbound command and response messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::host::{DownloadId, DownloadItem};
use crate::store::UploadRecord;

/// Every `type` tag the dispatcher understands.
pub const KNOWN_TYPES: &[&str] = &[
    "START_DOWNLOAD",
    "UPLOAD_FILE",
    "PAUSE_DOWNLOAD",
    "RESUME_DOWNLOAD",
    "DELETE_DOWNLOAD",
    "RESTART_DOWNLOAD",
    "GET_UPLOADED_FILES",
    "SET_CHUNK_COUNT",
    "GET_DOWNLOADS",
];

/// File contents inside an `UPLOAD_FILE` message: a byte array or plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileData {
    Bytes(Vec<u8>),
    Text(String),
}

impl FileData {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            FileData::Bytes(b) => b,
            FileData::Text(s) => s.into_bytes(),
        }
    }

    /// An empty string counts as no data; an empty byte array is a zero-length file.
    pub fn is_blank(&self) -> bool {
        matches!(self, FileData::Text(s) if s.is_empty())
    }
}

/// Tagged inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    StartDownload {
        url: String,
    },
    /// Fields are optional on the wire; missing ones are reported, not rejected by the parser.
    #[serde(rename_all = "camelCase")]
    UploadFile {
        #[serde(default)]
        file_data: Option<FileData>,
        #[serde(default)]
        file_name: Option<String>,
        #[serde(default)]
        file_size: Option<u64>,
        #[serde(default)]
        file_type: Option<String>,
        #[serde(default)]
        upload_url: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    PauseDownload { download_id: DownloadId },
    #[serde(rename_all = "camelCase")]
    ResumeDownload { download_id: DownloadId },
    #[serde(rename_all = "camelCase")]
    DeleteDownload { download_id: DownloadId },
    #[serde(rename_all = "camelCase")]
    RestartDownload { download_id: DownloadId },
    GetUploadedFiles {},
    #[serde(rename_all = "camelCase")]
    SetChunkCount {
        #[serde(default)]
        chunk_count: Value,
    },
    GetDownloads {},
}

/// Reply to a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    UploadedFiles { uploaded_files: Vec<UploadRecord> },
    Downloads { downloads: Vec<DownloadItem> },
    #[serde(rename_all = "camelCase")]
    Ack {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chunk_count: Option<usize>,
    },
}

impl Response {
    pub fn ok() -> Self {
        Response::Ack {
            success: true,
            error: None,
            chunk_count: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Response::Ack {
            success: false,
            error: Some(error.into()),
            chunk_count: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_tagged_commands() {
        let c: Command = serde_json::from_value(json!({
            "type": "START_DOWNLOAD",
            "url": "https://example.com/a.zip"
        }))
        .unwrap();
        assert_eq!(
            c,
            Command::StartDownload {
                url: "https://example.com/a.zip".into()
            }
        );
        let c: Command =
            serde_json::from_value(json!({"type": "PAUSE_DOWNLOAD", "downloadId": 4})).unwrap();
        assert_eq!(c, Command::PauseDownload { download_id: 4 });
        let c: Command = serde_json::from_value(json!({"type": "GET_UPLOADED_FILES"})).unwrap();
        assert_eq!(c, Command::GetUploadedFiles {});
    }

    #[test]
    fn upload_fields_are_optional() {
        let c: Command = serde_json::from_value(json!({
            "type": "UPLOAD_FILE",
            "fileData": [104, 105],
            "fileName": "hi.txt",
            "uploadUrl": "https://example.com/up"
        }))
        .unwrap();
        match c {
            Command::UploadFile {
                file_data,
                file_name,
                file_size,
                ..
            } => {
                assert_eq!(file_data.unwrap().into_bytes(), b"hi");
                assert_eq!(file_name.as_deref(), Some("hi.txt"));
                assert_eq!(file_size, None);
            }
            other => panic!("unexpected {:?}", other),
        }
        let c: Command = serde_json::from_value(json!({"type": "UPLOAD_FILE"})).unwrap();
        assert!(matches!(c, Command::UploadFile { file_data: None, .. }));
    }

    #[test]
    fn text_file_data_is_accepted() {
        let d: FileData = serde_json::from_value(json!("hello")).unwrap();
        assert_eq!(d.into_bytes(), b"hello");
    }

    #[test]
    fn responses_serialize_like_the_wire_format() {
        assert_eq!(serde_json::to_value(Response::ok()).unwrap(), json!({"success": true}));
        assert_eq!(
            serde_json::to_value(Response::failed("Missing required upload data")).unwrap(),
            json!({"success": false, "error": "Missing required upload data"})
        );
        assert_eq!(
            serde_json::to_value(Response::UploadedFiles {
                uploaded_files: vec![]
            })
            .unwrap(),
            json!({"uploadedFiles": []})
        );
    }

    #[test]
    fn every_command_tag_is_known() {
        for v in [
            json!({"type": "RESUME_DOWNLOAD", "downloadId": 1}),
            json!({"type": "DELETE_DOWNLOAD", "downloadId": 1}),
            json!({"type": "RESTART_DOWNLOAD", "downloadId": 1}),
            json!({"type": "SET_CHUNK_COUNT", "chunkCount": 8}),
            json!({"type": "GET_DOWNLOADS"}),
        ] {
            let tag = v["type"].as_str().unwrap().to_string();
            assert!(KNOWN_TYPES.contains(&tag.as_str()));
            serde_json::from_value::<Command>(v).unwrap();
        }
    }
}
