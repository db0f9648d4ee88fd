//! The executor wire protocol: line-delimited JSON, UTF-8, one request per
//! line, one response per line — plain newline framing rather than
//! JSON-RPC's `Content-Length` headers, since the worker process on the
//! other end is a plain compile/execute server, not a protocol server.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Request {
    RunPair { pair: RunPairPayload },
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPairPayload {
    pub track_output: bool,
    /// Base64-encoded compiled debug assembly/bytecode.
    pub debug: String,
    /// Base64-encoded compiled release assembly/bytecode.
    pub release: String,
}

impl RunPairPayload {
    pub fn new(debug_bytes: &[u8], release_bytes: &[u8], track_output: bool) -> Self {
        Self { track_output, debug: BASE64.encode(debug_bytes), release: BASE64.encode(release_bytes) }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub run_pair_result: Option<RunPairResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPairResult {
    pub debug_result: SideResultWire,
    pub release_result: SideResultWire,
    pub debug_first_unmatch: Option<CheckpointSite>,
    pub release_first_unmatch: Option<CheckpointSite>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideResultWire {
    pub checksum: String,
    pub exception_type: Option<String>,
    /// Present only when the request set `trackOutput`.
    #[serde(default)]
    pub checksum_sites: Option<Vec<CheckpointSite>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointSite {
    pub id: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_pair_payload_base64_roundtrips() {
        let payload = RunPairPayload::new(&[1, 2, 3], &[4, 5, 6, 7], true);
        assert_eq!(BASE64.decode(&payload.debug).unwrap(), vec![1, 2, 3]);
        assert_eq!(BASE64.decode(&payload.release).unwrap(), vec![4, 5, 6, 7]);
    }

    #[test]
    fn request_serializes_with_kind_tag() {
        let req = Request::RunPair { pair: RunPairPayload::new(&[], &[], false) };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"kind\":\"RunPair\""));
        let shutdown = serde_json::to_string(&Request::Shutdown).unwrap();
        assert_eq!(shutdown, "{\"kind\":\"Shutdown\"}");
    }

    #[test]
    fn response_round_trips_through_json() {
        let resp = Response {
            run_pair_result: Some(RunPairResult {
                debug_result: SideResultWire { checksum: "1".into(), exception_type: None, checksum_sites: None },
                release_result: SideResultWire { checksum: "1".into(), exception_type: None, checksum_sites: None },
                debug_first_unmatch: None,
                release_first_unmatch: None,
            }),
        };
        let json = serde_json::to_string(&resp).unwrap();
        let back: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(back.run_pair_result.unwrap().debug_result.checksum, "1");
    }
}
