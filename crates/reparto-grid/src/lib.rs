// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod controller;
mod drag;
mod edit;
mod filter;
mod record;
mod reorder;
mod schema;
mod store;
mod value;

pub use controller::*;
pub use drag::*;
pub use edit::*;
pub use filter::*;
pub use record::*;
pub use reorder::*;
pub use schema::*;
pub use store::*;
pub use value::*;
