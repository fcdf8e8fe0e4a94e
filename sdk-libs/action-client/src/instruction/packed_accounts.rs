use std::collections::HashMap;

use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey};

use super::InstructionError;

/// Remaining accounts of a compressed instruction. Instruction data refers to
/// trees, queues and delegates by their index in this list.
#[derive(Debug, Default, Clone)]
pub struct PackedAccounts {
    metas: Vec<AccountMeta>,
    indices: HashMap<Pubkey, u8>,
}

impl PackedAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_or_get(&mut self, pubkey: Pubkey) -> Result<u8, InstructionError> {
        self.insert_or_get_config(pubkey, true)
    }

    pub fn insert_or_get_read_only(&mut self, pubkey: Pubkey) -> Result<u8, InstructionError> {
        self.insert_or_get_config(pubkey, false)
    }

    /// Returns the index of `pubkey`, appending it if not yet present. An
    /// account inserted read-only and later requested writable is upgraded.
    /// Indices are a `u8` in instruction data, so a 257th account is refused
    /// and the list is left unchanged.
    pub fn insert_or_get_config(
        &mut self,
        pubkey: Pubkey,
        is_writable: bool,
    ) -> Result<u8, InstructionError> {
        if let Some(index) = self.indices.get(&pubkey) {
            if is_writable {
                self.metas[usize::from(*index)].is_writable = true;
            }
            return Ok(*index);
        }
        let len = self.metas.len();
        let index = u8::try_from(len).map_err(|_| InstructionError::TooManyAccounts(len + 1))?;
        self.metas.push(AccountMeta {
            pubkey,
            is_signer: false,
            is_writable,
        });
        self.indices.insert(pubkey, index);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    pub fn to_account_metas(&self) -> Vec<AccountMeta> {
        self.metas.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_or_get_deduplicates_in_insertion_order() {
        let tree = Pubkey::new_unique();
        let queue = Pubkey::new_unique();
        let delegate = Pubkey::new_unique();
        let mut packed = PackedAccounts::new();

        assert_eq!(packed.insert_or_get(tree).unwrap(), 0);
        assert_eq!(packed.insert_or_get(queue).unwrap(), 1);
        assert_eq!(packed.insert_or_get(tree).unwrap(), 0);
        assert_eq!(packed.insert_or_get_read_only(delegate).unwrap(), 2);
        assert_eq!(packed.len(), 3);

        let metas = packed.to_account_metas();
        assert_eq!(metas[0].pubkey, tree);
        assert_eq!(metas[1].pubkey, queue);
        assert!(!metas[2].is_writable);
        assert!(metas.iter().all(|meta| !meta.is_signer));
    }

    #[test]
    fn test_read_only_account_is_upgraded_to_writable() {
        let key = Pubkey::new_unique();
        let mut packed = PackedAccounts::new();
        packed.insert_or_get_read_only(key).unwrap();
        packed.insert_or_get(key).unwrap();
        assert!(packed.to_account_metas()[0].is_writable);
    }

    #[test]
    fn test_index_beyond_u8_is_refused() {
        let mut packed = PackedAccounts::new();
        let keys = (0..256).map(|_| Pubkey::new_unique()).collect::<Vec<_>>();
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(packed.insert_or_get(*key).unwrap() as usize, i);
        }
        assert_eq!(packed.insert_or_get(keys[255]).unwrap(), 255);

        assert!(matches!(
            packed.insert_or_get(Pubkey::new_unique()),
            Err(InstructionError::TooManyAccounts(257))
        ));
        assert!(matches!(
            packed.insert_or_get_read_only(Pubkey::new_unique()),
            Err(InstructionError::TooManyAccounts(257))
        ));
        assert_eq!(packed.len(), 256);
    }
}
