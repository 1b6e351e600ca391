/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

pub mod api;
pub mod client;
mod parsers;
pub mod protocol;
pub mod session;
pub mod pagination;
pub mod album;
pub mod photo;
pub mod upload;
pub mod properties;
pub mod errors;

pub use album::*;
pub use api::*;
pub use client::*;
pub use errors::*;
pub use pagination::*;
pub use photo::*;
pub use properties::*;
pub use protocol::*;
pub use session::*;
pub use upload::*;
