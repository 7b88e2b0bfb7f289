// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! 256-bit word arithmetic with the foreign model's overflow rules.
//!
//! Additions wrap modulo 2^256 and a zero modulus yields zero instead of
//! failing.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::evm::utils::{bigint_to_bytes32, Bytes32};

/// `(a + b) mod 2^256`
pub fn wrapping_add(a: &Bytes32, b: &Bytes32) -> Bytes32 {
    let sum = BigUint::from_bytes_be(a) + BigUint::from_bytes_be(b);
    bigint_to_bytes32(&sum)
}

/// `(a + b) % n`, zero when `n` is zero
pub fn addmod(a_bytes: &Bytes32, b_bytes: &Bytes32, n_bytes: &Bytes32) -> Bytes32 {
    let a = BigUint::from_bytes_be(a_bytes);
    let b = BigUint::from_bytes_be(b_bytes);
    let n = BigUint::from_bytes_be(n_bytes);

    let result = if n.is_zero() {
        BigUint::zero()
    } else {
        (&a + &b) % &n
    };

    bigint_to_bytes32(&result)
}

/// `(a * b) % n`, zero when `n` is zero
pub fn mulmod(a_bytes: &Bytes32, b_bytes: &Bytes32, n_bytes: &Bytes32) -> Bytes32 {
    let a = BigUint::from_bytes_be(a_bytes);
    let b = BigUint::from_bytes_be(b_bytes);
    let n = BigUint::from_bytes_be(n_bytes);

    let result = if n.is_zero() {
        BigUint::zero()
    } else {
        (&a * &b) % &n
    };

    bigint_to_bytes32(&result)
}

/// `base ^ exponent % modulus`; `0^0` is 1, modulus 0 or 1 yields 0
pub fn expmod(base_bytes: &Bytes32, exp_bytes: &Bytes32, mod_bytes: &Bytes32) -> Bytes32 {
    let base = BigUint::from_bytes_be(base_bytes);
    let exponent = BigUint::from_bytes_be(exp_bytes);
    let modulus = BigUint::from_bytes_be(mod_bytes);

    let result = if modulus.is_zero() || modulus.is_one() {
        BigUint::zero()
    } else if exponent.is_zero() {
        BigUint::one()
    } else if base.is_zero() {
        BigUint::zero()
    } else {
        base.modpow(&exponent, &modulus)
    };

    bigint_to_bytes32(&result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u256_from_u8(value: u8) -> Bytes32 {
        let mut bytes = [0u8; 32];
        bytes[31] = value;
        bytes
    }

    #[test]
    fn test_wrapping_add() {
        let max_val = [0xFFu8; 32];
        assert_eq!(wrapping_add(&max_val, &u256_from_u8(1)), [0u8; 32]);
        assert_eq!(wrapping_add(&max_val, &u256_from_u8(2)), u256_from_u8(1));
        assert_eq!(
            wrapping_add(&u256_from_u8(40), &u256_from_u8(2)),
            u256_from_u8(42)
        );
    }

    #[test]
    fn test_addmod() {
        let a = u256_from_u8(5);
        let b = u256_from_u8(3);
        let n = u256_from_u8(7);
        assert_eq!(addmod(&a, &b, &n), u256_from_u8(1));
        assert_eq!(addmod(&a, &b, &[0u8; 32]), [0u8; 32]);

        // (2^256 - 1 + 100) % 7: 2^256 ≡ 2 and 99 ≡ 1, so 3
        let max_val = [0xFFu8; 32];
        assert_eq!(
            addmod(&max_val, &u256_from_u8(100), &u256_from_u8(7)),
            u256_from_u8(3)
        );
        // No intermediate wrap: (MAX + 1) % 2 = 0
        assert_eq!(
            addmod(&max_val, &u256_from_u8(1), &u256_from_u8(2)),
            [0u8; 32]
        );
    }

    #[test]
    fn test_mulmod() {
        let a = u256_from_u8(5);
        let b = u256_from_u8(3);
        let n = u256_from_u8(7);
        assert_eq!(mulmod(&a, &b, &n), u256_from_u8(1));
        assert_eq!(mulmod(&a, &b, &[0u8; 32]), [0u8; 32]);

        // MAX ≡ 2 (mod 13), so MAX * MAX ≡ 4
        let max_val = [0xFFu8; 32];
        assert_eq!(
            mulmod(&max_val, &max_val, &u256_from_u8(13)),
            u256_from_u8(4)
        );
    }

    #[test]
    fn test_expmod() {
        let base = u256_from_u8(2);
        let exp = u256_from_u8(3);
        let modulus = u256_from_u8(5);
        assert_eq!(expmod(&base, &exp, &modulus), u256_from_u8(3));
        assert_eq!(expmod(&base, &exp, &[0u8; 32]), [0u8; 32]);
        assert_eq!(expmod(&base, &exp, &u256_from_u8(1)), [0u8; 32]);
        assert_eq!(expmod(&[0u8; 32], &[0u8; 32], &modulus), u256_from_u8(1));
        assert_eq!(expmod(&[0u8; 32], &exp, &modulus), [0u8; 32]);

        // MAX ≡ -1 (mod 256)
        let mut two_fifty_six = [0u8; 32];
        two_fifty_six[30] = 0x01;
        assert_eq!(
            expmod(&[0xFFu8; 32], &u256_from_u8(2), &two_fifty_six),
            u256_from_u8(1)
        );
    }
}
