//! Manipulate JVM constant pools and method bytecode
//!
//! ### Simple example
//!
//! Decoding a method body, growing it, and encoding it back:
//!
//! ```
//! use jvm_bytecode::jvm::code::{Instruction, InstructionSequence, Opcode};
//! use jvm_bytecode::jvm::Error;
//!
//! # fn edit() -> Result<(), Error> {
//! // iconst_0; ifeq +4; nop; return
//! let mut code = InstructionSequence::decode(&[0x03, 0x99, 0x00, 0x04, 0x00, 0xb1])?;
//!
//! // Replace the `nop` with a `sipush 1000`: the `ifeq` now has further to jump
//! code.replace(2, Instruction::ShortPush(1000))?;
//! assert_eq!(
//!     code.encode()?,
//!     vec![0x03, 0x99, 0x00, 0x06, 0x11, 0x03, 0xe8, 0xb1],
//! );
//! # Ok(())
//! # }
//! # edit().unwrap();
//! ```
//!
//! Constants are added to a pool through interning helpers, which create the entries they depend
//! on first:
//!
//! ```
//! use jvm_bytecode::jvm::class_file::{ConstantsPool, ConstantIndex};
//! use jvm_bytecode::jvm::Error;
//!
//! # fn build() -> Result<(), Error> {
//! let mut pool = ConstantsPool::new();
//! let println = pool.method_ref("java/io/PrintStream", "println", "(Ljava/lang/String;)V")?;
//! assert_eq!(pool.method_ref("java/io/PrintStream", "println", "(Ljava/lang/String;)V")?, println);
//! assert_eq!(pool.get_utf8(ConstantIndex(1))?, "java/io/PrintStream");
//! # Ok(())
//! # }
//! # build().unwrap();
//! ```

pub mod binary_format;
pub mod class_file;
pub mod code;
mod errors;

pub use errors::*;
