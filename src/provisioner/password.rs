use rand::Rng;

pub const DEFAULT_PASSWORD_LENGTH: usize = 32;

const ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!\"$%&/()=?^`,.-#+;:_'*";

/// Random password over a printable-ASCII alphabet. Only used to satisfy
/// account creation; provisioned accounts are driven through impersonation.
#[must_use]
pub fn generate_password(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}
