//! Reed-Solomon error correction for QR codeword blocks.
//!
//! QR codes use RS over GF(256) with primitive polynomial
//! x^8 + x^4 + x^3 + x^2 + 1 (0x11D) and generator roots α^0..α^(ecc-1).
//! Codeword 0 is the highest-degree coefficient.

use thiserror::Error;

const fn build_tables() -> ([u8; 512], [u8; 256]) {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= 0x11D;
        }
        i += 1;
    }
    while i < 512 {
        exp[i] = exp[i - 255];
        i += 1;
    }
    (exp, log)
}

const TABLES: ([u8; 512], [u8; 256]) = build_tables();
static EXP_TABLE: [u8; 512] = TABLES.0;
static LOG_TABLE: [u8; 256] = TABLES.1;

/// GF(256) field operations using log/exp tables
pub(crate) struct Gf256;

impl Gf256 {
    pub(crate) fn mul(a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        EXP_TABLE[LOG_TABLE[a as usize] as usize + LOG_TABLE[b as usize] as usize]
    }

    /// `a / b`; callers guarantee `b != 0`
    pub(crate) fn div(a: u8, b: u8) -> u8 {
        debug_assert!(b != 0, "division by zero in GF(256)");
        if a == 0 || b == 0 {
            return 0;
        }
        EXP_TABLE[LOG_TABLE[a as usize] as usize + 255 - LOG_TABLE[b as usize] as usize]
    }

    pub(crate) fn pow(a: u8, n: usize) -> u8 {
        if n == 0 {
            return 1;
        }
        if a == 0 {
            return 0;
        }
        EXP_TABLE[(LOG_TABLE[a as usize] as usize * n) % 255]
    }

    /// α^e
    pub(crate) fn exp(e: usize) -> u8 {
        EXP_TABLE[e % 255]
    }
}

/// Why a block could not be corrected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RsError {
    /// The block cannot hold the requested number of ECC codewords
    #[error("a {len}-codeword block cannot carry {ecc} ECC codewords")]
    Shape {
        /// Block length
        len: usize,
        /// ECC codewords requested
        ecc: usize,
    },
    /// More errors than the ECC codewords can fix
    #[error("too many errors to correct")]
    TooManyErrors,
}

/// Correct `block` in place. Returns the number of codewords fixed.
///
/// On error the block is left untouched.
pub fn correct(block: &mut [u8], ecc: usize) -> Result<usize, RsError> {
    let n = block.len();
    if ecc == 0 || ecc >= n || n > 255 {
        return Err(RsError::Shape { len: n, ecc });
    }

    let syndromes = syndromes(block, ecc);
    if syndromes.iter().all(|&s| s == 0) {
        return Ok(0);
    }

    let sigma = error_locator(&syndromes);
    let errors = sigma.len() - 1;
    if errors * 2 > ecc {
        return Err(RsError::TooManyErrors);
    }

    let positions = error_positions(&sigma, n);
    if positions.len() != errors {
        return Err(RsError::TooManyErrors);
    }

    let omega = error_evaluator(&sigma, &syndromes);
    let mut fixed = block.to_vec();
    for &p in &positions {
        let e = n - 1 - p;
        let x_inv = Gf256::exp(255 - e % 255);
        // Formal derivative keeps only the odd terms
        let derivative = sigma
            .iter()
            .enumerate()
            .skip(1)
            .step_by(2)
            .fold(0, |acc, (i, &c)| acc ^ Gf256::mul(c, Gf256::pow(x_inv, i - 1)));
        if derivative == 0 {
            return Err(RsError::TooManyErrors);
        }
        let magnitude = Gf256::div(evaluate(&omega, x_inv), derivative);
        fixed[p] ^= Gf256::mul(Gf256::exp(e), magnitude);
    }

    if syndromes_of(&fixed, ecc).any(|s| s != 0) {
        return Err(RsError::TooManyErrors);
    }
    block.copy_from_slice(&fixed);
    Ok(positions.len())
}

fn syndromes_of(block: &[u8], ecc: usize) -> impl Iterator<Item = u8> + '_ {
    (0..ecc).map(move |i| {
        block
            .iter()
            .fold(0, |s, &c| Gf256::mul(s, Gf256::exp(i)) ^ c)
    })
}

fn syndromes(block: &[u8], ecc: usize) -> Vec<u8> {
    syndromes_of(block, ecc).collect()
}

/// Berlekamp-Massey. Coefficients lowest degree first.
fn error_locator(syndromes: &[u8]) -> Vec<u8> {
    let mut sigma = vec![1u8];
    let mut previous = vec![1u8];
    let mut degree = 0usize;
    let mut shift = 1usize;
    let mut last_discrepancy = 1u8;

    for r in 0..syndromes.len() {
        let mut discrepancy = syndromes[r];
        for i in 1..=degree.min(sigma.len() - 1) {
            discrepancy ^= Gf256::mul(sigma[i], syndromes[r - i]);
        }
        if discrepancy == 0 {
            shift += 1;
            continue;
        }

        let snapshot = sigma.clone();
        let coef = Gf256::div(discrepancy, last_discrepancy);
        if sigma.len() < previous.len() + shift {
            sigma.resize(previous.len() + shift, 0);
        }
        for (i, &b) in previous.iter().enumerate() {
            sigma[i + shift] ^= Gf256::mul(coef, b);
        }

        if 2 * degree <= r {
            degree = r + 1 - degree;
            previous = snapshot;
            last_discrepancy = discrepancy;
            shift = 1;
        } else {
            shift += 1;
        }
    }

    sigma.resize(degree + 1, 0);
    sigma
}

/// Chien search: position `p` is in error when σ(α^-(n-1-p)) = 0
fn error_positions(sigma: &[u8], n: usize) -> Vec<usize> {
    (0..n)
        .filter(|&p| {
            let e = n - 1 - p;
            evaluate(sigma, Gf256::exp(255 - e % 255)) == 0
        })
        .collect()
}

/// Ω(x) = S(x)·σ(x) mod x^ecc
fn error_evaluator(sigma: &[u8], syndromes: &[u8]) -> Vec<u8> {
    (0..syndromes.len())
        .map(|i| {
            (0..=i.min(sigma.len() - 1))
                .fold(0, |acc, j| acc ^ Gf256::mul(sigma[j], syndromes[i - j]))
        })
        .collect()
}

/// Evaluate a lowest-degree-first polynomial at `x`
fn evaluate(poly: &[u8], x: u8) -> u8 {
    poly.iter().rev().fold(0, |acc, &c| Gf256::mul(acc, x) ^ c)
}

#[cfg(test)]
pub(crate) fn rs_encode(data: &[u8], ecc: usize) -> Vec<u8> {
    let mut generator = vec![1u8];
    for i in 0..ecc {
        let mut next = vec![0u8; generator.len() + 1];
        for (j, &c) in generator.iter().enumerate() {
            next[j] ^= c;
            next[j + 1] ^= Gf256::mul(c, Gf256::exp(i));
        }
        generator = next;
    }

    let mut message = data.to_vec();
    message.resize(data.len() + ecc, 0);
    for i in 0..data.len() {
        let coef = message[i];
        if coef != 0 {
            for j in 1..=ecc {
                message[i + j] ^= Gf256::mul(generator[j], coef);
            }
        }
    }
    let mut codeword = data.to_vec();
    codeword.extend_from_slice(&message[data.len()..]);
    codeword
}
