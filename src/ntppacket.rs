use arrayref::{array_ref, array_refs, mut_array_refs};
use log::trace;

use crate::error::{Error, Result};
use crate::PACKET_SIZE;

// NTP header layout (RFC 1305), all fields big-endian, no padding:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |LI | VN  |Mode |    Stratum    |     Poll      |   Precision   |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                          Root Delay                           |
// |                        Root Dispersion                        |
// |                         Reference ID                          |
// |                   Reference Timestamp (64)                    |
// |                     Origin Timestamp (64)                     |
// |                    Receive Timestamp (64)                     |
// |                    Transmit Timestamp (64)                    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

/// 64-bit NTP timestamp: seconds since 1900-01-01 and a binary fraction of a second
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NtpTimestamp {
    pub seconds: u32,
    pub fraction: u32,
}

impl NtpTimestamp {
    /// Create new timestamp from its seconds and fraction words
    pub fn new(seconds: u32, fraction: u32) -> Self {
        NtpTimestamp { seconds, fraction }
    }

    fn to_be_bytes(self) -> [u8; 8] {
        u64::from(self).to_be_bytes()
    }

    fn from_be_bytes(bytes: [u8; 8]) -> Self {
        NtpTimestamp::from(u64::from_be_bytes(bytes))
    }
}

impl From<u64> for NtpTimestamp {
    fn from(value: u64) -> Self {
        NtpTimestamp {
            seconds: (value >> 32) as u32,
            fraction: value as u32,
        }
    }
}

impl From<NtpTimestamp> for u64 {
    fn from(ts: NtpTimestamp) -> Self {
        (u64::from(ts.seconds) << 32) | u64::from(ts.fraction)
    }
}

/// NTP packet as it travels on the wire
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NtpPacket {
    /// Leap Indicator (2 bits), Version Number (3 bits) and Mode (3 bits)
    pub settings: u8,
    pub stratum: u8,
    pub poll: i8,
    pub precision: i8,
    pub root_delay: u32,
    pub root_dispersion: u32,
    pub reference_id: u32,
    pub reference_timestamp: NtpTimestamp,
    pub origin_timestamp: NtpTimestamp,
    pub receive_timestamp: NtpTimestamp,
    pub transmit_timestamp: NtpTimestamp,
}

impl NtpPacket {
    pub const NTP_VERSION: u8 = 3;
    pub const MODE_CLIENT: u8 = 3;
    pub const MODE_SERVER: u8 = 4;

    const LI_SHIFT: u8 = 6;
    const VN_SHIFT: u8 = 3;
    const LI_MASK: u8 = 0b1100_0000;
    const VN_MASK: u8 = 0b0011_1000;
    const MODE_MASK: u8 = 0b0000_0111;

    /// Client request: no leap warning, version 3, client mode (`0x1B`),
    /// every other field zero.
    pub fn request() -> NtpPacket {
        NtpPacket {
            settings: Self::pack_settings(0, Self::NTP_VERSION, Self::MODE_CLIENT),
            ..NtpPacket::default()
        }
    }

    /// Packs leap indicator, version and mode into the first header byte
    pub fn pack_settings(leap_indicator: u8, version: u8, mode: u8) -> u8 {
        ((leap_indicator << Self::LI_SHIFT) & Self::LI_MASK)
            | ((version << Self::VN_SHIFT) & Self::VN_MASK)
            | (mode & Self::MODE_MASK)
    }

    /// Returns the 2-bit leap indicator
    pub fn leap_indicator(&self) -> u8 {
        (self.settings & Self::LI_MASK) >> Self::LI_SHIFT
    }

    /// Returns the 3-bit version number
    pub fn version(&self) -> u8 {
        (self.settings & Self::VN_MASK) >> Self::VN_SHIFT
    }

    /// Returns the 3-bit association mode
    pub fn mode(&self) -> u8 {
        self.settings & Self::MODE_MASK
    }

    /// Serializes the packet field by field in network byte order.
    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let mut buf = [0u8; PACKET_SIZE];
        {
            let (
                settings,
                stratum,
                poll,
                precision,
                root_delay,
                root_dispersion,
                reference_id,
                reference_ts,
                origin_ts,
                receive_ts,
                transmit_ts,
            ) = mut_array_refs![&mut buf, 1, 1, 1, 1, 4, 4, 4, 8, 8, 8, 8];

            *settings = [self.settings];
            *stratum = [self.stratum];
            *poll = self.poll.to_be_bytes();
            *precision = self.precision.to_be_bytes();
            *root_delay = self.root_delay.to_be_bytes();
            *root_dispersion = self.root_dispersion.to_be_bytes();
            *reference_id = self.reference_id.to_be_bytes();
            *reference_ts = self.reference_timestamp.to_be_bytes();
            *origin_ts = self.origin_timestamp.to_be_bytes();
            *receive_ts = self.receive_timestamp.to_be_bytes();
            *transmit_ts = self.transmit_timestamp.to_be_bytes();
        }
        buf
    }

    /// Parses a packet from exactly [`PACKET_SIZE`] bytes.
    pub fn from_bytes(buf: &[u8]) -> Result<NtpPacket> {
        if buf.len() != PACKET_SIZE {
            return Err(Error::MalformedResponse {
                expected: PACKET_SIZE,
                received: buf.len(),
            });
        }

        let buf = array_ref![buf, 0, PACKET_SIZE];
        let (
            settings,
            stratum,
            poll,
            precision,
            root_delay,
            root_dispersion,
            reference_id,
            reference_ts,
            origin_ts,
            receive_ts,
            transmit_ts,
        ) = array_refs![buf, 1, 1, 1, 1, 4, 4, 4, 8, 8, 8, 8];

        trace!("settings byte: {:#04x}", settings[0]);

        Ok(NtpPacket {
            settings: settings[0],
            stratum: stratum[0],
            poll: i8::from_be_bytes(*poll),
            precision: i8::from_be_bytes(*precision),
            root_delay: u32::from_be_bytes(*root_delay),
            root_dispersion: u32::from_be_bytes(*root_dispersion),
            reference_id: u32::from_be_bytes(*reference_id),
            reference_timestamp: NtpTimestamp::from_be_bytes(*reference_ts),
            origin_timestamp: NtpTimestamp::from_be_bytes(*origin_ts),
            receive_timestamp: NtpTimestamp::from_be_bytes(*receive_ts),
            transmit_timestamp: NtpTimestamp::from_be_bytes(*transmit_ts),
        })
    }
}

/// Builds the 48-byte client request.
pub fn encode_request() -> [u8; PACKET_SIZE] {
    NtpPacket::request().to_bytes()
}

/// Decodes a server response.
///
/// Only the size is checked; leap indicator, mode and stratum are passed
/// through untouched.
pub fn decode_response(buf: &[u8]) -> Result<NtpPacket> {
    NtpPacket::from_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_client_v3() {
        let buf = encode_request();
        assert_eq!(buf.len(), PACKET_SIZE);
        assert_eq!(buf[0], 0x1B);
        assert!(buf[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn request_decodes_back() {
        let packet = decode_response(&encode_request()).unwrap();
        assert_eq!(packet.settings, 0x1B);
        assert_eq!(packet.leap_indicator(), 0);
        assert_eq!(packet.version(), 3);
        assert_eq!(packet.mode(), NtpPacket::MODE_CLIENT);
        assert_eq!(
            packet,
            NtpPacket {
                settings: 0x1B,
                ..NtpPacket::default()
            }
        );
    }

    #[test]
    fn wrong_length_is_malformed() {
        for len in &[0usize, 1, 47, 49, 68] {
            let buf = vec![0u8; *len];
            match decode_response(&buf) {
                Err(Error::MalformedResponse { expected, received }) => {
                    assert_eq!(expected, PACKET_SIZE);
                    assert_eq!(received, *len);
                }
                other => panic!("unexpected result for {} bytes: {:?}", len, other),
            }
        }
    }

    #[test]
    fn fields_are_big_endian_in_order() {
        let mut buf = [0u8; PACKET_SIZE];
        buf[0] = 0x24; // LI 0, VN 4, mode 4
        buf[1] = 2;
        buf[2] = 6;
        buf[3] = 0xEC; // -20
        buf[4..8].copy_from_slice(&[0x00, 0x00, 0x01, 0x02]);
        buf[8..12].copy_from_slice(&[0x00, 0x00, 0x03, 0x04]);
        buf[12..16].copy_from_slice(b"GPS\0");
        buf[40..44].copy_from_slice(&[0xE9, 0x3C, 0x7A, 0x80]);
        buf[44..48].copy_from_slice(&[0x80, 0x00, 0x00, 0x00]);

        let packet = decode_response(&buf).unwrap();
        assert_eq!(packet.version(), 4);
        assert_eq!(packet.mode(), NtpPacket::MODE_SERVER);
        assert_eq!(packet.stratum, 2);
        assert_eq!(packet.poll, 6);
        assert_eq!(packet.precision, -20);
        assert_eq!(packet.root_delay, 0x0102);
        assert_eq!(packet.root_dispersion, 0x0304);
        assert_eq!(packet.reference_id, u32::from_be_bytes(*b"GPS\0"));
        assert_eq!(packet.transmit_timestamp.seconds, 0xE93C_7A80);
        assert_eq!(packet.transmit_timestamp.fraction, 0x8000_0000);
        assert_eq!(packet.to_bytes(), buf);
    }

    #[test]
    fn response_fields_are_not_validated() {
        // kiss-o'-death shaped packet: LI 3, mode 4, stratum 0
        let mut buf = [0u8; PACKET_SIZE];
        buf[0] = NtpPacket::pack_settings(3, 3, 4);
        buf[12..16].copy_from_slice(b"RATE");

        let packet = decode_response(&buf).unwrap();
        assert_eq!(packet.leap_indicator(), 3);
        assert_eq!(packet.stratum, 0);
        assert_eq!(packet.transmit_timestamp, NtpTimestamp::default());
    }

    #[test]
    fn timestamp_u64_conversion() {
        let ts = NtpTimestamp::new(0x8000_0001, 0xFFFF_FFFF);
        let raw = u64::from(ts);
        assert_eq!(raw, 0x8000_0001_FFFF_FFFF);
        assert_eq!(NtpTimestamp::from(raw), ts);
    }
}
