//! Recipient signing-token generation.
//!
//! Tokens are URL-safe alphanumeric strings handed to recipients as their
//! access credential for a template slot. They are generated once per
//! recipient row and never reused: duplicating a template always mints fresh
//! tokens for the cloned recipients.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::defaults::RECIPIENT_TOKEN_LENGTH;

/// Generate a new recipient signing token.
///
/// 21 alphanumeric characters, matching the entropy of the platform's other
/// short identifiers (~125 bits).
pub fn generate_recipient_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RECIPIENT_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
