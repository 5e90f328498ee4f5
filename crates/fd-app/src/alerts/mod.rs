mod registry;

pub use registry::AlertRegistry;
