//! Local persistence accessors
//!
//! - [`SafeStorage`]: failure-tolerant accessor over one storage scope.
//! - [`SecureStorage`]: obfuscating layer over a `SafeStorage`, with
//!   transparent migration of legacy plaintext entries.
//! - [`ObfuscationCodec`]: the XOR + base64 codec used by `SecureStorage`.

mod obfuscation;
mod safe;
mod scope;
mod secure;

pub use obfuscation::{CodecError, ObfuscationCodec, DEFAULT_OBFUSCATION_KEY};
pub use safe::SafeStorage;
pub use scope::StorageScope;
pub use secure::{SecureStorage, SecureStorageError, SECURE_KEY_PREFIX};
