// src/decoders/token_metadata.rs

use anyhow::{Context, Result, bail};
use borsh::BorshDeserialize;
use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

pub const TOKEN_METADATA_PROGRAM_ID: Pubkey = pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// `Key::MetadataV1` dans le programme Metaplex.
const METADATA_V1_KEY: u8 = 4;

/// En-tête d'un compte de métadonnées Metaplex.
/// Seuls les premiers champs nous intéressent, le reste du compte est ignoré.
#[derive(BorshDeserialize, Debug)]
struct MetadataHeader {
    key: u8,
    _update_authority: Pubkey,
    mint: Pubkey,
    name: String,
    symbol: String,
    uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

pub fn derive_metadata_address(mint: &Pubkey) -> Pubkey {
    let (address, _) = Pubkey::find_program_address(
        &[b"metadata", TOKEN_METADATA_PROGRAM_ID.as_ref(), mint.as_ref()],
        &TOKEN_METADATA_PROGRAM_ID,
    );
    address
}

// Les chaînes on-chain sont complétées avec des '\0' jusqu'à leur taille max.
fn clean(value: String) -> String {
    value.trim_matches(char::from(0)).trim().to_string()
}

pub fn decode_metadata(mint: &Pubkey, data: &[u8]) -> Result<TokenMetadata> {
    let header = MetadataHeader::deserialize(&mut &data[..])
        .with_context(|| format!("Métadonnées illisibles pour le mint {}", mint))?;
    if header.key != METADATA_V1_KEY {
        bail!("Compte de métadonnées inattendu (key = {}) pour {}", header.key, mint);
    }
    if header.mint != *mint {
        bail!("Les métadonnées décrivent {} et non {}", header.mint, mint);
    }
    Ok(TokenMetadata {
        mint: header.mint,
        name: clean(header.name),
        symbol: clean(header.symbol),
        uri: clean(header.uri),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn padded(value: &str, len: usize) -> Vec<u8> {
        let mut bytes = value.as_bytes().to_vec();
        bytes.resize(len, 0);
        let mut out = (len as u32).to_le_bytes().to_vec();
        out.extend_from_slice(&bytes);
        out
    }

    pub(crate) fn encode_metadata(mint: &Pubkey, name: &str, symbol: &str) -> Vec<u8> {
        let mut data = vec![METADATA_V1_KEY];
        data.extend_from_slice(Pubkey::new_unique().as_ref());
        data.extend_from_slice(mint.as_ref());
        data.extend_from_slice(&padded(name, 32));
        data.extend_from_slice(&padded(symbol, 10));
        data.extend_from_slice(&padded("https://example.invalid/meta.json", 200));
        // seller_fee_basis_points + le reste du compte, ignorés par le décodeur.
        data.extend_from_slice(&500u16.to_le_bytes());
        data.extend_from_slice(&[0u8; 64]);
        data
    }

    #[test]
    fn strips_nul_padding() {
        let mint = Pubkey::new_unique();
        let metadata = decode_metadata(&mint, &encode_metadata(&mint, "Foo Token", "FOO")).unwrap();
        assert_eq!(metadata.name, "Foo Token");
        assert_eq!(metadata.symbol, "FOO");
        assert_eq!(metadata.uri, "https://example.invalid/meta.json");
    }

    #[test]
    fn rejects_metadata_of_another_mint() {
        let mint = Pubkey::new_unique();
        let data = encode_metadata(&Pubkey::new_unique(), "Foo", "FOO");
        assert!(decode_metadata(&mint, &data).is_err());
    }

    #[test]
    fn rejects_truncated_account() {
        let mint = Pubkey::new_unique();
        let data = encode_metadata(&mint, "Foo", "FOO");
        assert!(decode_metadata(&mint, &data[..80]).is_err());
    }
}
