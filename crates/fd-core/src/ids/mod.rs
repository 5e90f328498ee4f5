//! ID type wrappers for type safety.

mod alert_id;
mod id_macro;

pub use alert_id::AlertId;
