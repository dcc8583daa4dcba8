//! Swiss modulo-10 recursive check digit.

use votebasis_core::{DomainError, DomainResult};

const CARRY_TABLE: [u32; 10] = [0, 9, 4, 6, 8, 2, 7, 1, 3, 5];

/// Check digit over the decimal digits of `digits`.
pub fn check_digit(digits: &str) -> DomainResult<u32> {
    let mut carry = 0;
    for c in digits.chars() {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| DomainError::validation(format!("{digits} is not numeric")))?;
        carry = CARRY_TABLE[((carry + digit) % 10) as usize];
    }
    Ok((10 - carry) % 10)
}

/// Check digit of a candidate: list order number followed by candidate number.
pub fn candidate_check_digit(list_order_number: &str, candidate_number: &str) -> DomainResult<u32> {
    check_digit(&format!("{list_order_number}{candidate_number}"))
}
