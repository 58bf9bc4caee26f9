//! Command table for all three protocol variants.
//!
//! Acaia frames are `MAGIC1 MAGIC2 type payload.. ck1 ck2`, where `ck1` and
//! `ck2` are the low bytes of the sums of the even- and odd-indexed payload
//! bytes. Every frame below is assembled by [`frame`] at compile time, so the
//! table holds nothing but constants.

use std::fmt;

use crate::constants::{MAGIC1, MAGIC2};
use crate::variant::Variant;

/// Tare frames are sent in a 20-byte buffer even though only the first six
/// bytes carry meaning. Scales in the field expect exactly this length.
pub const TARE_WIRE_LEN: usize = 20;

const MSG_HEARTBEAT: u8 = 0x00;
const MSG_TARE: u8 = 0x04;
const MSG_IDENTIFY: u8 = 0x0b;
const MSG_EVENT: u8 = 0x0c;
const MSG_TIMER: u8 = 0x0d;

static IDENTIFY: [u8; 20] = frame(MSG_IDENTIFY, *b"012345678901234");
static HEARTBEAT: [u8; 7] = frame(MSG_HEARTBEAT, [0x02, 0x00]);
// Length-prefixed list of (event, interval) pairs to subscribe to.
static NOTIFICATION_REQUEST: [u8; 14] =
    frame(MSG_EVENT, [0x09, 0x00, 0x01, 0x01, 0x02, 0x02, 0x05, 0x03, 0x04]);
static START_TIMER: [u8; 7] = frame(MSG_TIMER, [0x00, 0x00]);
static STOP_TIMER: [u8; 7] = frame(MSG_TIMER, [0x00, 0x02]);
static RESET_TIMER: [u8; 7] = frame(MSG_TIMER, [0x00, 0x01]);
static TARE_ACAIA: [u8; 6] = frame(MSG_TARE, [0x00]);
static TARE_GENERIC: [u8; 1] = [b'T'];

/// Commands understood by the scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Identify,
    Heartbeat,
    NotificationRequest,
    StartTimer,
    StopTimer,
    ResetTimer,
    Tare,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Identify => "identify",
            CommandKind::Heartbeat => "heartbeat",
            CommandKind::NotificationRequest => "notification request",
            CommandKind::StartTimer => "start timer",
            CommandKind::StopTimer => "stop timer",
            CommandKind::ResetTimer => "reset timer",
            CommandKind::Tare => "tare",
        };
        f.write_str(name)
    }
}

/// An encoded command: its meaningful bytes and the length put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    bytes: &'static [u8],
    wire_len: usize,
}

impl Frame {
    const fn exact(bytes: &'static [u8]) -> Self {
        Self {
            bytes,
            wire_len: bytes.len(),
        }
    }

    const fn padded(bytes: &'static [u8], wire_len: usize) -> Self {
        Self { bytes, wire_len }
    }

    pub fn bytes(&self) -> &'static [u8] {
        self.bytes
    }

    pub fn wire_len(&self) -> usize {
        self.wire_len
    }

    /// Buffer to hand to the transport, zero-padded to [`Frame::wire_len`].
    pub fn to_wire(&self) -> Vec<u8> {
        let mut wire = self.bytes.to_vec();
        wire.resize(self.wire_len, 0);
        wire
    }
}

/// Looks up the frame for `kind` as spoken by `variant`.
///
/// Only tare differs between variants: generic scales take a single ASCII
/// `T`, Acaia scales take the padded tare frame.
pub fn encode(kind: CommandKind, variant: Variant) -> Frame {
    match kind {
        CommandKind::Identify => Frame::exact(&IDENTIFY),
        CommandKind::Heartbeat => Frame::exact(&HEARTBEAT),
        CommandKind::NotificationRequest => Frame::exact(&NOTIFICATION_REQUEST),
        CommandKind::StartTimer => Frame::exact(&START_TIMER),
        CommandKind::StopTimer => Frame::exact(&STOP_TIMER),
        CommandKind::ResetTimer => Frame::exact(&RESET_TIMER),
        CommandKind::Tare => match variant {
            Variant::Generic => Frame::exact(&TARE_GENERIC),
            Variant::Old | Variant::New => Frame::padded(&TARE_ACAIA, TARE_WIRE_LEN),
        },
    }
}

const fn frame<const P: usize, const N: usize>(msg_type: u8, payload: [u8; P]) -> [u8; N] {
    assert!(N == P + 5, "frame length must be payload + 5");

    let mut bytes = [0u8; N];
    bytes[0] = MAGIC1;
    bytes[1] = MAGIC2;
    bytes[2] = msg_type;

    let mut cksum1: u16 = 0;
    let mut cksum2: u16 = 0;

    let mut i = 0;
    while i < P {
        bytes[3 + i] = payload[i];
        if i % 2 == 0 {
            cksum1 += payload[i] as u16;
        } else {
            cksum2 += payload[i] as u16;
        }
        i += 1;
    }

    bytes[P + 3] = (cksum1 & 0xFF) as u8;
    bytes[P + 4] = (cksum2 & 0xFF) as u8;

    bytes
}
