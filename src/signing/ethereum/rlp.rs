//! Recursive Length Prefix encoding

/// Big-endian bytes with leading zeros removed
fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().take_while(|&&b| b == 0).count();
    &bytes[start..]
}

fn encode_length(len: usize) -> Vec<u8> {
    trim_leading_zeros(&len.to_be_bytes()).to_vec()
}

fn with_prefix(short_base: u8, long_base: u8, payload: &[u8]) -> Vec<u8> {
    let mut result;
    if payload.len() < 56 {
        result = Vec::with_capacity(payload.len() + 1);
        result.push(short_base + payload.len() as u8);
    } else {
        let len_bytes = encode_length(payload.len());
        result = Vec::with_capacity(payload.len() + len_bytes.len() + 1);
        result.push(long_base + len_bytes.len() as u8);
        result.extend_from_slice(&len_bytes);
    }
    result.extend_from_slice(payload);
    result
}

pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        return data.to_vec();
    }
    with_prefix(0x80, 0xb7, data)
}

/// Scalar given as big-endian bytes; zero encodes as the empty string
pub fn encode_uint_bytes(be: &[u8]) -> Vec<u8> {
    encode_bytes(trim_leading_zeros(be))
}

pub fn encode_u64(value: u64) -> Vec<u8> {
    encode_uint_bytes(&value.to_be_bytes())
}

pub fn encode_u128(value: u128) -> Vec<u8> {
    encode_uint_bytes(&value.to_be_bytes())
}

/// Recipient, or the empty string for contract creation
pub fn encode_address(address: Option<&[u8; 20]>) -> Vec<u8> {
    match address {
        Some(a) => encode_bytes(a),
        None => vec![0x80],
    }
}

/// List of already-encoded items
pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload: Vec<u8> = items.iter().flatten().copied().collect();
    with_prefix(0xc0, 0xf7, &payload)
}
