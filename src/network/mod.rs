//! Transport boundary
//!
//! The engine treats the connection as a black box that carries opaque
//! frames. A frame is one JSON-encoded [`Packet`](crate::protocol::Packet).
//! The channel transport pairs two endpoints in-process, serving tests and
//! the demo; a production build plugs a real socket in behind the same
//! trait.

use bytes::Bytes;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

use crate::protocol::Packet;

// Error types
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("transport channel closed")]
    ChannelClosed,

    #[error("packet encode failed: {reason}")]
    PacketEncode { reason: String },

    #[error("packet decode failed: {reason}")]
    PacketDecode { reason: String },
}

pub type NetworkResult<T> = Result<T, NetworkError>;

/// Opaque frame carrier. `send` publishes a frame to the peer; `try_recv`
/// never blocks.
pub trait Transport {
    fn send(&mut self, frame: Bytes) -> NetworkResult<()>;
    fn try_recv(&mut self) -> NetworkResult<Option<Bytes>>;
}

pub fn encode_packet(packet: &Packet) -> NetworkResult<Bytes> {
    serde_json::to_vec(packet)
        .map(Bytes::from)
        .map_err(|e| NetworkError::PacketEncode { reason: e.to_string() })
}

pub fn decode_packet(frame: &[u8]) -> NetworkResult<Packet> {
    serde_json::from_slice(frame)
        .map_err(|e| NetworkError::PacketDecode { reason: e.to_string() })
}

/// In-process transport over crossbeam channels.
pub struct ChannelTransport {
    tx: Sender<Bytes>,
    rx: Receiver<Bytes>,
}

impl ChannelTransport {
    /// Two connected endpoints: what one sends, the other receives.
    pub fn pair() -> (ChannelTransport, ChannelTransport) {
        let (tx_a, rx_b) = unbounded();
        let (tx_b, rx_a) = unbounded();
        (
            ChannelTransport { tx: tx_a, rx: rx_a },
            ChannelTransport { tx: tx_b, rx: rx_b },
        )
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, frame: Bytes) -> NetworkResult<()> {
        self.tx.send(frame).map_err(|_| NetworkError::ChannelClosed)
    }

    fn try_recv(&mut self) -> NetworkResult<Option<Bytes>> {
        match self.rx.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(NetworkError::ChannelClosed),
        }
    }
}

/// Transport that drops everything; for worlds with no connection.
#[derive(Debug, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send(&mut self, _frame: Bytes) -> NetworkResult<()> {
        Ok(())
    }

    fn try_recv(&mut self) -> NetworkResult<Option<Bytes>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ChatPacket;
    use uuid::Uuid;

    #[test]
    fn channel_pair_delivers_frames_both_ways() {
        let (mut a, mut b) = ChannelTransport::pair();
        a.send(Bytes::from_static(b"ping")).unwrap();
        assert_eq!(b.try_recv().unwrap(), Some(Bytes::from_static(b"ping")));
        assert_eq!(a.try_recv().unwrap(), None);

        b.send(Bytes::from_static(b"pong")).unwrap();
        assert_eq!(a.try_recv().unwrap(), Some(Bytes::from_static(b"pong")));
    }

    #[test]
    fn packets_survive_framing() {
        let packet = Packet::Chat(ChatPacket {
            from: Uuid::nil(),
            nick: "ada".to_string(),
            text: "hello".to_string(),
        });
        let frame = encode_packet(&packet).unwrap();
        assert_eq!(decode_packet(&frame).unwrap(), packet);
    }

    #[test]
    fn garbage_frames_are_decode_errors() {
        assert!(matches!(
            decode_packet(b"not json"),
            Err(NetworkError::PacketDecode { .. })
        ));
    }
}
