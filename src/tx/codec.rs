//! Legacy Transaction Wire Format
//!
//! ```text
//! version(4 LE) | n_in(varint) | inputs | n_out(varint) | outputs | locktime(4 LE)
//! input:  txid(32, wire order) | vout(4 LE) | script_len(varint) | script_sig | sequence(4 LE)
//! output: value(8 LE) | script_len(varint) | script_pubkey
//! ```
//!
//! Decoding is strict: varints must be canonical and no bytes may follow
//! the locktime, so `encode(decode(bytes)) == bytes` whenever decoding
//! succeeds.

use bitcoin::hashes::{sha256d, Hash};
use serde::{Deserialize, Serialize};

use crate::types::Txid;

/// Errors raised while parsing raw transaction bytes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Invalid transaction hex: {0}")]
    InvalidHex(String),

    #[error("Unexpected end of data at offset {0}")]
    UnexpectedEof(usize),

    #[error("Non-canonical varint at offset {0}")]
    NonCanonicalVarInt(usize),

    #[error("Count {count} at offset {offset} exceeds the remaining data")]
    OversizedCount { count: u64, offset: usize },

    #[error("{0} trailing bytes after locktime")]
    TrailingBytes(usize),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Reference to an output of a previous transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: Txid,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Txid, vout: u32) -> Self {
        Self { txid, vout }
    }
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub previous_output: OutPoint,
    #[serde(with = "crate::serde_bytes::hex_vec")]
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

/// Transaction output, value in koinu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    #[serde(with = "crate::serde_bytes::hex_vec")]
    pub script_pubkey: Vec<u8>,
}

/// A legacy (non-witness) transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
}

impl Transaction {
    /// Serialize to wire bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.estimated_size());
        out.extend_from_slice(&self.version.to_le_bytes());

        write_varint(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            out.extend_from_slice(input.previous_output.txid.as_wire_bytes());
            out.extend_from_slice(&input.previous_output.vout.to_le_bytes());
            write_bytes(&mut out, &input.script_sig);
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_varint(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            out.extend_from_slice(&output.value.to_le_bytes());
            write_bytes(&mut out, &output.script_pubkey);
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out
    }

    /// Parse wire bytes; the whole buffer must be consumed
    pub fn deserialize(bytes: &[u8]) -> CodecResult<Self> {
        let mut reader = Reader::new(bytes);
        let version = i32::from_le_bytes(reader.read_array()?);

        // Each input is at least 41 bytes, each output at least 9
        let input_count = reader.read_count(41)?;
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            let txid = Txid::from_wire_bytes(reader.read_array()?);
            let vout = u32::from_le_bytes(reader.read_array()?);
            let script_sig = reader.read_bytes()?;
            let sequence = u32::from_le_bytes(reader.read_array()?);
            inputs.push(TxInput {
                previous_output: OutPoint::new(txid, vout),
                script_sig,
                sequence,
            });
        }

        let output_count = reader.read_count(9)?;
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            let value = u64::from_le_bytes(reader.read_array()?);
            let script_pubkey = reader.read_bytes()?;
            outputs.push(TxOutput { value, script_pubkey });
        }

        let lock_time = u32::from_le_bytes(reader.read_array()?);
        reader.finish()?;

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    pub fn from_hex(s: &str) -> CodecResult<Self> {
        let bytes = hex::decode(s.trim()).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::deserialize(&bytes)
    }

    /// Double SHA-256 of the serialization, displayed byte-reversed
    pub fn txid(&self) -> Txid {
        Txid::from_wire_bytes(sha256d::Hash::hash(&self.serialize()).to_byte_array())
    }

    /// Position of the input spending `outpoint`
    pub fn find_input(&self, outpoint: &OutPoint) -> Option<usize> {
        self.inputs
            .iter()
            .position(|input| input.previous_output == *outpoint)
    }

    fn estimated_size(&self) -> usize {
        let inputs: usize = self.inputs.iter().map(|i| 41 + 9 + i.script_sig.len()).sum();
        let outputs: usize = self.outputs.iter().map(|o| 9 + 9 + o.script_pubkey.len()).sum();
        4 + 9 + inputs + 9 + outputs + 4
    }
}

/// Bitcoin-style CompactSize
pub fn write_varint(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

fn write_bytes(out: &mut Vec<u8>, data: &[u8]) {
    write_varint(out, data.len() as u64);
    out.extend_from_slice(data);
}

/// Cursor over raw transaction bytes
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::UnexpectedEof(self.pos));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.take(N)?);
        Ok(arr)
    }

    fn read_varint(&mut self) -> CodecResult<u64> {
        let start = self.pos;
        let prefix = self.read_array::<1>()?[0];
        let (value, min) = match prefix {
            0xfd => (u16::from_le_bytes(self.read_array()?) as u64, 0xfd),
            0xfe => (u32::from_le_bytes(self.read_array()?) as u64, 0x1_0000),
            0xff => (u64::from_le_bytes(self.read_array()?), 0x1_0000_0000),
            n => return Ok(n as u64),
        };
        if value < min {
            return Err(CodecError::NonCanonicalVarInt(start));
        }
        Ok(value)
    }

    /// Element count, bounded by what the remaining bytes could hold
    fn read_count(&mut self, min_element_size: usize) -> CodecResult<usize> {
        let offset = self.pos;
        let count = self.read_varint()?;
        if count > (self.remaining() / min_element_size) as u64 {
            return Err(CodecError::OversizedCount { count, offset });
        }
        Ok(count as usize)
    }

    fn read_bytes(&mut self) -> CodecResult<Vec<u8>> {
        let len = self.read_count(1)?;
        Ok(self.take(len)?.to_vec())
    }

    fn finish(self) -> CodecResult<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}
