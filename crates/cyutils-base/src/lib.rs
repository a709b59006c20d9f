//! Data types shared across `cyutils`: encoding-tagged strings and the fixed tables used when
//! escaping C string literals.

pub mod encoded;
pub mod escape_table;

pub use encoded::{Codec, EncodedString, EncodeError, SourceEncoding};
pub use escape_table::{char_from_escape_sequence, has_specials, C_SPECIAL, ESCAPE_SEQUENCES};

static_assertions::assert_impl_all!(EncodedString: Send, Sync, Clone);
static_assertions::assert_impl_all!(SourceEncoding: Send, Sync, Clone);
