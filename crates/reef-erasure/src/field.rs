//! GF(2^8) arithmetic.
//!
//! Elements are bytes. Addition is XOR; multiplication and division go
//! through logarithm / antilogarithm tables generated from the primitive
//! polynomial `x^8 + x^4 + x^3 + x^2 + 1` with generator `α = 2`.
//!
//! The tables are computed by a `const fn` and live in a `static`, so they
//! are built exactly once and can never be mutated. Every function here is
//! safe to call from any number of threads.

use crate::error::ErasureError;

/// Number of elements in the field.
pub const FIELD_SIZE: usize = 256;

/// `x^8 + x^4 + x^3 + x^2 + 1`.
const PRIMITIVE_POLY: u16 = 0x11D;

/// Order of the multiplicative group.
const GROUP_ORDER: usize = FIELD_SIZE - 1;

struct Tables {
    /// `log[α^i] = i`. `log[0]` is unused.
    log: [u8; FIELD_SIZE],
    /// `exp[i] = α^i`, doubled so `log a + log b` never needs a modulo.
    exp: [u8; 2 * GROUP_ORDER],
}

const fn build_tables() -> Tables {
    let mut log = [0u8; FIELD_SIZE];
    let mut exp = [0u8; 2 * GROUP_ORDER];

    let mut x: u16 = 1;
    let mut i = 0;
    while i < GROUP_ORDER {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE_POLY;
        }
        i += 1;
    }

    while i < 2 * GROUP_ORDER {
        exp[i] = exp[i - GROUP_ORDER];
        i += 1;
    }

    Tables { log, exp }
}

static TABLES: Tables = build_tables();

/// Field addition (and subtraction): XOR.
#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Field multiplication.
#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let idx = TABLES.log[a as usize] as usize + TABLES.log[b as usize] as usize;
    TABLES.exp[idx]
}

/// Field division `a / b`.
///
/// Fails with [`ErasureError::DivisionByZero`] when `b == 0`.
#[inline]
pub fn div(a: u8, b: u8) -> Result<u8, ErasureError> {
    if b == 0 {
        return Err(ErasureError::DivisionByZero);
    }
    if a == 0 {
        return Ok(0);
    }
    let idx = TABLES.log[a as usize] as usize + GROUP_ORDER - TABLES.log[b as usize] as usize;
    Ok(TABLES.exp[idx])
}

/// Multiplicative inverse.
#[inline]
pub fn inv(a: u8) -> Result<u8, ErasureError> {
    div(1, a)
}

/// `a` raised to the `n`th power. `exp(a, 0) == 1` for every `a`, including 0.
pub fn exp(a: u8, n: usize) -> u8 {
    if n == 0 {
        return 1;
    }
    if a == 0 {
        return 0;
    }
    let idx = (TABLES.log[a as usize] as usize * (n % GROUP_ORDER)) % GROUP_ORDER;
    TABLES.exp[idx]
}

/// `output[i] = c * input[i]` for every byte.
pub(crate) fn mul_slice(c: u8, input: &[u8], output: &mut [u8]) {
    debug_assert_eq!(input.len(), output.len());
    match c {
        0 => output.fill(0),
        1 => output.copy_from_slice(input),
        _ => {
            let log_c = TABLES.log[c as usize] as usize;
            for (out, &x) in output.iter_mut().zip(input) {
                *out = if x == 0 {
                    0
                } else {
                    TABLES.exp[log_c + TABLES.log[x as usize] as usize]
                };
            }
        }
    }
}

/// `output[i] ^= c * input[i]` for every byte.
pub(crate) fn mul_add_slice(c: u8, input: &[u8], output: &mut [u8]) {
    debug_assert_eq!(input.len(), output.len());
    match c {
        0 => {}
        1 => {
            for (out, &x) in output.iter_mut().zip(input) {
                *out ^= x;
            }
        }
        _ => {
            let log_c = TABLES.log[c as usize] as usize;
            for (out, &x) in output.iter_mut().zip(input) {
                if x != 0 {
                    *out ^= TABLES.exp[log_c + TABLES.log[x as usize] as usize];
                }
            }
        }
    }
}
