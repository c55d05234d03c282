//! RADIUS packet codec (RFC 2865), trimmed to the client-side exchange
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Code      |  Identifier   |            Length             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         Authenticator                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  Attributes ...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("invalid packet length: {0}")]
    InvalidLength(usize),
    #[error("invalid packet code: {0}")]
    InvalidCode(u8),
    #[error("attribute value too long: {0} bytes")]
    AttributeTooLong(usize),
    #[error("truncated attribute at offset {0}")]
    TruncatedAttribute(usize),
}

/// Packet codes used by the Access-Request exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Code {
    AccessRequest = 1,
    AccessAccept = 2,
    AccessReject = 3,
    AccessChallenge = 11,
}

impl Code {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Code::AccessRequest),
            2 => Some(Code::AccessAccept),
            3 => Some(Code::AccessReject),
            11 => Some(Code::AccessChallenge),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Attribute types the bridge sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AttributeType {
    UserName = 1,
    UserPassword = 2,
    FramedIpAddress = 8,
    CallingStationId = 31,
}

impl AttributeType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A single (type, value) attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub attr_type: u8,
    pub value: Vec<u8>,
}

impl Attribute {
    /// Type + length octets.
    const HEADER_LEN: usize = 2;
    /// Value limit so the on-wire length octet fits (255 - header).
    pub const MAX_VALUE_LENGTH: usize = 253;

    pub fn new(attr_type: AttributeType, value: Vec<u8>) -> Result<Self, CodecError> {
        if value.len() > Self::MAX_VALUE_LENGTH {
            return Err(CodecError::AttributeTooLong(value.len()));
        }
        Ok(Attribute {
            attr_type: attr_type.as_u8(),
            value,
        })
    }

    pub fn string(attr_type: AttributeType, value: impl Into<String>) -> Result<Self, CodecError> {
        Self::new(attr_type, value.into().into_bytes())
    }

    pub fn ipv4(attr_type: AttributeType, addr: std::net::Ipv4Addr) -> Result<Self, CodecError> {
        Self::new(attr_type, addr.octets().to_vec())
    }

    pub fn encoded_length(&self) -> usize {
        Self::HEADER_LEN + self.value.len()
    }

    fn encode_into(&self, buffer: &mut Vec<u8>) {
        buffer.push(self.attr_type);
        buffer.push(self.encoded_length() as u8);
        buffer.extend_from_slice(&self.value);
    }
}

/// A full RADIUS packet.
#[derive(Debug, Clone)]
pub struct Packet {
    pub code: Code,
    pub identifier: u8,
    pub authenticator: [u8; 16],
    pub attributes: Vec<Attribute>,
}

impl Packet {
    /// Header size: code + id + length + authenticator.
    pub const MIN_PACKET_SIZE: usize = 20;
    /// RFC 2865 ceiling.
    pub const MAX_PACKET_SIZE: usize = 4096;

    pub fn new(code: Code, identifier: u8, authenticator: [u8; 16]) -> Self {
        Packet {
            code,
            identifier,
            authenticator,
            attributes: Vec::new(),
        }
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let total: usize = Self::MIN_PACKET_SIZE
            + self
                .attributes
                .iter()
                .map(Attribute::encoded_length)
                .sum::<usize>();
        if total > Self::MAX_PACKET_SIZE {
            return Err(CodecError::InvalidLength(total));
        }

        let mut buffer = Vec::with_capacity(total);
        buffer.push(self.code.as_u8());
        buffer.push(self.identifier);
        buffer.extend_from_slice(&(total as u16).to_be_bytes());
        buffer.extend_from_slice(&self.authenticator);
        for attr in &self.attributes {
            attr.encode_into(&mut buffer);
        }
        Ok(buffer)
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < Self::MIN_PACKET_SIZE {
            return Err(CodecError::InvalidLength(data.len()));
        }

        let code = Code::from_u8(data[0]).ok_or(CodecError::InvalidCode(data[0]))?;
        let identifier = data[1];
        let length = u16::from_be_bytes([data[2], data[3]]) as usize;
        if !(Self::MIN_PACKET_SIZE..=Self::MAX_PACKET_SIZE).contains(&length) || data.len() < length
        {
            return Err(CodecError::InvalidLength(length));
        }

        let mut authenticator = [0u8; 16];
        authenticator.copy_from_slice(&data[4..20]);

        let mut attributes = Vec::new();
        let mut offset = Self::MIN_PACKET_SIZE;
        while offset < length {
            if length - offset < Attribute::HEADER_LEN {
                return Err(CodecError::TruncatedAttribute(offset));
            }
            let attr_len = data[offset + 1] as usize;
            if attr_len < Attribute::HEADER_LEN || offset + attr_len > length {
                return Err(CodecError::TruncatedAttribute(offset));
            }
            attributes.push(Attribute {
                attr_type: data[offset],
                value: data[offset + Attribute::HEADER_LEN..offset + attr_len].to_vec(),
            });
            offset += attr_len;
        }

        Ok(Packet {
            code,
            identifier,
            authenticator,
            attributes,
        })
    }
}
