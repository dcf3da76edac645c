//! Short random tokens used to disambiguate values of unique fields.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of the disambiguating prefix.
pub const TOKEN_LENGTH: usize = 6;

/// Generate an alphanumeric token of [`TOKEN_LENGTH`] characters.
pub fn generate_token<R: Rng>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
