//! envbind
//!
//! Binds named environment variables to strongly-typed program variables,
//! converts and validates their values, and reports usage metadata.
//!
//! ## Features
//!
//! - **Typed Bindings**: String, bool, 8-64 bit and pointer-sized integers, f32/f64
//! - **Checked Names**: `[A-Za-z_][0-9A-Za-z_]*`, one binding per name and per target
//! - **Pluggable Strategies**: custom conversion and post-conversion checks
//! - **Deterministic Usage**: metadata enumerated in name order
//!
//! ## Lifecycle
//!
//! ```text
//! EnvRegistry::new()
//!   └── register(...)   names + targets checked, defaults snapshotted
//!         └── parse()   environment read, converted, checked (fail-fast)
//!               └── Var::get()
//! ```
//!
//! ```
//! use envbind::{EnvRegistry, MapEnv, Registration, Var};
//!
//! let port = Var::new(8080i64);
//! let mut registry = EnvRegistry::new();
//! registry.register(Registration::new("PORT", "listen port", &port)).unwrap();
//!
//! registry.parse_from(MapEnv::new().with("PORT", "9090")).unwrap();
//! assert_eq!(port.get(), 9090);
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod name;
pub mod registry;
pub mod source;
pub mod value;

pub use binding::{Binding, CheckFn, ParseFn, Registration};
pub use config::{EnvbindConfig, OutputFormat, VarDecl};
pub use error::{BoxError, EnvError, Result};
pub use registry::{EnvRegistry, UsageEntry};
pub use source::{EnvSource, MapEnv, ProcessEnv};
pub use value::{Primitive, Target, Value, ValueKind, Var};
