use solana_sdk::pubkey::Pubkey;

use super::IndexerError;

pub fn decode_base58_to_fixed_array<const N: usize>(input: &str) -> Result<[u8; N], IndexerError> {
    let mut buffer = [0u8; N];
    let decoded_len = bs58::decode(input)
        .onto(&mut buffer)
        .map_err(|e| IndexerError::base58(input, e))?;

    if decoded_len != N {
        return Err(IndexerError::base58(
            input,
            format!("expected {} bytes, got {}", N, decoded_len),
        ));
    }

    Ok(buffer)
}

pub fn decode_base58_to_pubkey(input: &str) -> Result<Pubkey, IndexerError> {
    decode_base58_to_fixed_array(input).map(Pubkey::new_from_array)
}

pub fn decode_base58_option_to_pubkey(
    value: &Option<String>,
) -> Result<Option<Pubkey>, IndexerError> {
    value
        .as_ref()
        .map(|key| decode_base58_to_pubkey(key))
        .transpose()
}

pub fn encode_base58(bytes: &[u8; 32]) -> String {
    bs58::encode(bytes).into_string()
}
