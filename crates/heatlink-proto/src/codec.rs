// ── Protocol codec ──
//
// Binds the frame encoders and the status parser to one device's
// configuration: which firmware layout to assume and which refresh frame
// to send. Pure; no I/O.

use tracing::debug;

use crate::frame::{self, Command};
use crate::status::{self, LayoutPolicy, StatusDelta};

/// Per-device encoder/decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolCodec {
    layout: LayoutPolicy,
    status_query: Option<Vec<u8>>,
}

impl ProtocolCodec {
    pub fn new(layout: LayoutPolicy) -> Self {
        Self {
            layout,
            status_query: None,
        }
    }

    /// Replace the refresh frame sent for [`Command::StatusQuery`].
    pub fn with_status_query(mut self, frame: Vec<u8>) -> Self {
        self.status_query = Some(frame);
        self
    }

    /// Encode a command into a complete outbound frame.
    pub fn encode(&self, command: &Command) -> Vec<u8> {
        match (command, &self.status_query) {
            (Command::StatusQuery, Some(custom)) => custom.clone(),
            _ => command.encode(),
        }
    }

    pub fn encode_power(&self, on: bool) -> Vec<u8> {
        frame::encode_power(on)
    }

    pub fn encode_temperature(&self, temp: i32) -> Vec<u8> {
        frame::encode_temperature(temp)
    }

    pub fn encode_init(&self) -> Vec<u8> {
        frame::encode_init()
    }

    pub fn encode_status_query(&self) -> Vec<u8> {
        self.encode(&Command::StatusQuery)
    }

    /// Best-effort status decode. Anything unusable yields `None`.
    pub fn decode_status(&self, frame: &[u8]) -> Option<StatusDelta> {
        match status::parse_status(frame, self.layout) {
            Ok(delta) => {
                debug!(
                    frame = %hex::encode(frame),
                    layout = ?self.layout.resolve(frame),
                    ?delta,
                    "decoded status frame"
                );
                Some(delta)
            }
            Err(e) => {
                debug!(frame = %hex::encode(frame), error = %e, "ignoring inbound frame");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::INIT_FRAME;

    #[test]
    fn custom_status_query_replaces_default() {
        let codec = ProtocolCodec::default().with_status_query(vec![0xaa, 0xbb]);
        assert_eq!(codec.encode_status_query(), vec![0xaa, 0xbb]);
        assert_eq!(codec.encode(&Command::Init), INIT_FRAME.to_vec());
    }

    #[test]
    fn decode_swallows_garbage() {
        let codec = ProtocolCodec::default();
        assert!(codec.decode_status(&[]).is_none());
        assert!(codec.decode_status(&[0xff; 24]).is_none());
        assert!(codec.decode_status(&[0xff; 64]).is_none());
    }
}
