//! Address validation used when members are added to a group.

/// Decides whether a user-entered string is an acceptable account address.
pub trait AddressValidator: Send + Sync {
    fn is_valid(&self, candidate: &str) -> bool;
}

/// Accepts `0x`-prefixed, 20-byte hex addresses in any letter case.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexAddressValidator;

const ADDRESS_BYTES: usize = 20;

impl AddressValidator for HexAddressValidator {
    fn is_valid(&self, candidate: &str) -> bool {
        let trimmed = candidate.trim();
        let Some(digits) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        else {
            return false;
        };
        digits.len() == ADDRESS_BYTES * 2
            && hex::decode(digits)
                .map(|bytes| bytes.len() == ADDRESS_BYTES)
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mixed_case_addresses() {
        let validator = HexAddressValidator;
        assert!(validator.is_valid("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
        assert!(validator.is_valid("0X70997970C51812DC3A010C7D01B50E0D17DC79C8"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        let validator = HexAddressValidator;
        assert!(!validator.is_valid(""));
        assert!(!validator.is_valid("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
        assert!(!validator.is_valid("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb9226"));
        assert!(!validator.is_valid("0xg39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
    }
}
