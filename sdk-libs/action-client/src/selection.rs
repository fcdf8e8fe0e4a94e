use thiserror::Error;

use crate::indexer::CompressedTokenAccount;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Insufficient balance for transfer. Required: {required}, available: {balance}")]
    InsufficientBalance { required: u64, balance: u64 },

    #[error(
        "Account limit exceeded: max {max_reachable} ({max_inputs} accounts) per transaction. \
         Total balance: {balance}. Consider multiple transfers to spend full balance."
    )]
    AccountLimitExceeded {
        required: u64,
        max_reachable: u64,
        max_inputs: usize,
        balance: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub accounts: Vec<CompressedTokenAccount>,
    pub total_amount: u64,
    pub total_lamports: u64,
}

impl Selection {
    fn push(&mut self, account: &CompressedTokenAccount) {
        self.total_amount = self.total_amount.saturating_add(account.token.amount);
        self.total_lamports = self.total_lamports.saturating_add(account.lamports);
        self.accounts.push(account.clone());
    }
}

fn is_spendable(account: &CompressedTokenAccount) -> bool {
    !account.is_frozen() && (account.token.amount > 0 || account.lamports > 0)
}

/// Candidates ordered by amount, largest first. Equal amounts keep their
/// indexer order.
fn spendable_by_amount_desc(accounts: &[CompressedTokenAccount]) -> Vec<&CompressedTokenAccount> {
    let mut sorted = accounts
        .iter()
        .filter(|account| is_spendable(account))
        .collect::<Vec<_>>();
    sorted.sort_by(|a, b| b.token.amount.cmp(&a.token.amount));
    sorted
}

/// Token balance that can be spent by the owner, frozen accounts excluded.
pub fn spendable_balance(accounts: &[CompressedTokenAccount]) -> u64 {
    accounts
        .iter()
        .filter(|account| is_spendable(account))
        .fold(0u64, |sum, account| sum.saturating_add(account.token.amount))
}

/// Selects the fewest accounts, at most `max_inputs`, whose amounts cover
/// `amount`, preferring the largest accounts.
pub fn select_min_compressed_token_accounts_for_transfer(
    accounts: &[CompressedTokenAccount],
    amount: u64,
    max_inputs: usize,
) -> Result<Selection, SelectionError> {
    let mut selection = Selection::default();
    if amount == 0 {
        return Ok(selection);
    }

    for account in spendable_by_amount_desc(accounts) {
        if selection.accounts.len() >= max_inputs || selection.total_amount >= amount {
            break;
        }
        selection.push(account);
    }

    if selection.total_amount < amount {
        let balance = spendable_balance(accounts);
        if selection.accounts.len() >= max_inputs {
            return Err(SelectionError::AccountLimitExceeded {
                required: amount,
                max_reachable: selection.total_amount,
                max_inputs,
                balance,
            });
        }
        return Err(SelectionError::InsufficientBalance {
            required: amount,
            balance,
        });
    }
    Ok(selection)
}

/// Selects the `max_inputs` largest spendable accounts, the most one
/// transaction can consume.
pub fn select_max_amount(accounts: &[CompressedTokenAccount], max_inputs: usize) -> Selection {
    let mut selection = Selection::default();
    for account in spendable_by_amount_desc(accounts)
        .into_iter()
        .filter(|account| account.token.amount > 0)
        .take(max_inputs)
    {
        selection.push(account);
    }
    selection
}

#[cfg(test)]
mod tests {
    use solana_sdk::pubkey::Pubkey;

    use super::*;
    use crate::indexer::{AccountState, MerkleContext, TokenData};

    fn account(amount: u64, leaf_index: u32) -> CompressedTokenAccount {
        CompressedTokenAccount {
            hash: [leaf_index as u8; 32],
            lamports: 0,
            merkle_context: MerkleContext {
                merkle_tree: Pubkey::default(),
                queue: Pubkey::default(),
                leaf_index,
                prove_by_index: false,
            },
            token: TokenData {
                mint: Pubkey::default(),
                owner: Pubkey::default(),
                amount,
                delegate: None,
                state: AccountState::Initialized,
                tlv: None,
            },
        }
    }

    fn leaf_indices(selection: &Selection) -> Vec<u32> {
        selection
            .accounts
            .iter()
            .map(|account| account.merkle_context.leaf_index)
            .collect()
    }

    #[test]
    fn test_selects_largest_accounts_first() {
        let accounts = vec![account(10, 0), account(50, 1), account(30, 2), account(50, 3)];
        let selection =
            select_min_compressed_token_accounts_for_transfer(&accounts, 60, 4).unwrap();
        assert_eq!(leaf_indices(&selection), vec![1, 3]);
        assert_eq!(selection.total_amount, 100);

        let selection =
            select_min_compressed_token_accounts_for_transfer(&accounts, 50, 4).unwrap();
        assert_eq!(leaf_indices(&selection), vec![1]);
    }

    #[test]
    fn test_zero_amount_selects_nothing() {
        let accounts = vec![account(10, 0)];
        let selection = select_min_compressed_token_accounts_for_transfer(&accounts, 0, 4).unwrap();
        assert!(selection.accounts.is_empty());
        assert_eq!(selection.total_amount, 0);
    }

    #[test]
    fn test_skips_frozen_and_empty_accounts() {
        let mut frozen = account(100, 0);
        frozen.token.state = AccountState::Frozen;
        let mut lamports_only = account(0, 2);
        lamports_only.lamports = 1_000;
        let accounts = vec![frozen, account(0, 1), lamports_only, account(5, 3)];

        let selection = select_min_compressed_token_accounts_for_transfer(&accounts, 5, 4).unwrap();
        assert_eq!(leaf_indices(&selection), vec![3]);

        assert_eq!(
            select_min_compressed_token_accounts_for_transfer(&accounts, 6, 4),
            Err(SelectionError::InsufficientBalance {
                required: 6,
                balance: 5
            })
        );
        assert_eq!(spendable_balance(&accounts), 5);
    }

    #[test]
    fn test_account_limit_exceeded() {
        let accounts = (0..6).map(|i| account(10, i)).collect::<Vec<_>>();
        assert_eq!(
            select_min_compressed_token_accounts_for_transfer(&accounts, 45, 4),
            Err(SelectionError::AccountLimitExceeded {
                required: 45,
                max_reachable: 40,
                max_inputs: 4,
                balance: 60,
            })
        );
        let selection =
            select_min_compressed_token_accounts_for_transfer(&accounts, 40, 4).unwrap();
        assert_eq!(selection.accounts.len(), 4);

        // Short of the full balance too, the input cap is still what stopped selection.
        assert_eq!(
            select_min_compressed_token_accounts_for_transfer(&accounts, 100, 4),
            Err(SelectionError::AccountLimitExceeded {
                required: 100,
                max_reachable: 40,
                max_inputs: 4,
                balance: 60,
            })
        );
        assert_eq!(
            select_min_compressed_token_accounts_for_transfer(&accounts, 100, 8),
            Err(SelectionError::InsufficientBalance {
                required: 100,
                balance: 60
            })
        );
    }

    #[test]
    fn test_select_max_amount() {
        let accounts = vec![account(1, 0), account(7, 1), account(3, 2), account(0, 3)];
        let selection = select_max_amount(&accounts, 2);
        assert_eq!(leaf_indices(&selection), vec![1, 2]);
        assert_eq!(selection.total_amount, 10);
        assert!(select_max_amount(&[], 4).accounts.is_empty());
    }
}
