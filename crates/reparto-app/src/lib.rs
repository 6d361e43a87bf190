// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod forms;
mod ids;
mod model;
mod schema;
mod state;

pub use forms::*;
pub use ids::*;
pub use model::*;
pub use schema::*;
pub use state::*;
