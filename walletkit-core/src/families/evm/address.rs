use sha3::{Digest, Keccak256};

const ADDRESS_HEX_LEN: usize = 40;

fn hex_body(address: &str) -> Option<&str> {
    let body = address.strip_prefix("0x")?;
    (body.len() == ADDRESS_HEX_LEN && body.bytes().all(|b| b.is_ascii_hexdigit())).then_some(body)
}

/// EIP-55 mixed-case form of a well-formed address.
pub fn to_checksum_address(address: &str) -> Option<String> {
    let lower = hex_body(address)?.to_ascii_lowercase();
    let hash = hex::encode(Keccak256::digest(lower.as_bytes()));

    let body: String = lower
        .chars()
        .zip(hash.chars())
        .map(|(c, h)| {
            if c.is_ascii_alphabetic() && h >= '8' {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect();
    Some(format!("0x{}", body))
}

/// `0x` followed by 40 hex digits. Mixed-case input must carry a valid
/// EIP-55 checksum, single-case input is accepted as is.
pub fn is_valid_address(address: &str) -> bool {
    let Some(body) = hex_body(address) else {
        return false;
    };
    let has_lower = body.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = body.bytes().any(|b| b.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }
    to_checksum_address(address).as_deref() == Some(address)
}

pub fn same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// The 20 raw address bytes, left padded to a 32-byte ABI word.
pub(crate) fn abi_address_word(address: &str) -> [u8; 32] {
    let mut word = [0u8; 32];
    if let Some(bytes) = hex_body(address).and_then(|body| hex::decode(body).ok()) {
        word[12..].copy_from_slice(&bytes);
    }
    word
}
