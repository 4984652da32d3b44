//! CashAddr encoding for Bitcoin Cash

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const GENERATORS: [u64; 5] = [
    0x98f2bc8e61,
    0x79b76d99e2,
    0xf33e5fb3c4,
    0xae2eabe2a8,
    0x1e4f43e470,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashAddrType {
    P2PKH = 0,
    P2SH = 1,
}

fn polymod(values: &[u8]) -> u64 {
    let mut c: u64 = 1;
    for value in values {
        let c0 = (c >> 35) as u8;
        c = ((c & 0x07_ffff_ffff) << 5) ^ (*value as u64);
        for (i, generator) in GENERATORS.iter().enumerate() {
            if c0 & (1 << i) != 0 {
                c ^= generator;
            }
        }
    }
    c ^ 1
}

fn checksum_input(prefix: &str, payload: &[u8]) -> Vec<u8> {
    let mut values: Vec<u8> = prefix.bytes().map(|b| b & 0x1f).collect();
    values.push(0);
    values.extend_from_slice(payload);
    values
}

fn size_code(len: usize) -> Option<u8> {
    match len {
        20 => Some(0),
        24 => Some(1),
        28 => Some(2),
        32 => Some(3),
        40 => Some(4),
        48 => Some(5),
        56 => Some(6),
        64 => Some(7),
        _ => None,
    }
}

/// Encode a hash as `prefix:payload`
pub fn encode(prefix: &str, kind: CashAddrType, hash: &[u8]) -> Option<String> {
    let version = ((kind as u8) << 3) | size_code(hash.len())?;
    let mut raw = vec![version];
    raw.extend_from_slice(hash);
    let payload = ::bech32::convert_bits(&raw, 8, 5, true).ok()?;

    let mut values = checksum_input(prefix, &payload);
    values.extend_from_slice(&[0u8; 8]);
    let checksum = polymod(&values);

    let mut out = String::with_capacity(prefix.len() + 1 + payload.len() + 8);
    out.push_str(prefix);
    out.push(':');
    for v in &payload {
        out.push(CHARSET[*v as usize] as char);
    }
    for i in 0..8 {
        let v = ((checksum >> (5 * (7 - i))) & 0x1f) as usize;
        out.push(CHARSET[v] as char);
    }
    Some(out)
}

/// Decode an address; the prefix is optional and defaults to `default_prefix`
pub fn decode(address: &str, default_prefix: &str) -> Option<(CashAddrType, Vec<u8>)> {
    let has_lower = address.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = address.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return None;
    }
    let lowered = address.to_ascii_lowercase();

    let (prefix, body) = match lowered.split_once(':') {
        Some((prefix, body)) => (prefix.to_string(), body),
        None => (default_prefix.to_string(), lowered.as_str()),
    };
    if prefix != default_prefix || body.len() < 8 {
        return None;
    }

    let values = body
        .bytes()
        .map(|b| CHARSET.iter().position(|c| *c == b).map(|p| p as u8))
        .collect::<Option<Vec<u8>>>()?;

    if polymod(&checksum_input(&prefix, &values)) != 0 {
        return None;
    }

    let payload = &values[..values.len() - 8];
    let raw = ::bech32::convert_bits(payload, 5, 8, false).ok()?;
    let (version, hash) = raw.split_first()?;
    if version & 0x80 != 0 || size_code(hash.len())? != version & 0x07 {
        return None;
    }
    let kind = match version >> 3 {
        0 => CashAddrType::P2PKH,
        1 => CashAddrType::P2SH,
        _ => return None,
    };
    Some((kind, hash.to_vec()))
}
