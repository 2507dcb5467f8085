pub mod builders;

pub use builders::PolicyDirBuilder;
