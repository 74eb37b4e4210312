//! Editable object model for the constant pool and method bytecode of JVM class files
//!
//! The [`jvm`] module holds the class-file structures, and [`util`] the containers they are
//! built on.

pub mod jvm;
pub mod util;
