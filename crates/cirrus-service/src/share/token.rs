use rand::Rng;

/// Characters used in share tokens. Ambiguous glyphs (0/O, 1/l/I) are left
/// out so a token survives being read aloud or retyped.
const TOKEN_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

pub const DEFAULT_TOKEN_LENGTH: usize = 24;
pub const MIN_TOKEN_LENGTH: usize = 10;

/// Generates the high-entropy tokens that share links are addressed by.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    length: usize,
}

impl TokenGenerator {
    /// A generator producing `length`-character tokens, clamped up to the
    /// minimum length.
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(MIN_TOKEN_LENGTH),
        }
    }

    pub fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| {
                let idx = rng.random_range(0..TOKEN_ALPHABET.len());
                TOKEN_ALPHABET[idx] as char
            })
            .collect()
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_LENGTH)
    }
}
