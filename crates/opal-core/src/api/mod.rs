// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Backend-agnostic graphics device API types.
//!
//! Organized into logical sub-modules:
//!
//! - **[`buffer`]**: Vertex/index buffer handles, usage hints, and the
//!   CPU-mapping token.
//! - **[`vertex`]**: Scalar types, vertex elements, and the declaration
//!   layout builder.
//! - **[`texture`]**: Pixel formats, sampling parameters, and texture
//!   descriptors.
//! - **[`program`]**: Vertex/fragment program handles.
//! - **[`target`]**: Render target descriptors, attachment slots, and
//!   completeness categories.
//! - **[`state`]**: Primitive topology, fixed-function pipeline state, and
//!   clear flags.
//! - **[`device`]**: Device creation parameters.

pub mod buffer;
pub mod device;
pub mod program;
pub mod state;
pub mod target;
pub mod texture;
pub mod vertex;

pub use buffer::*;
pub use device::*;
pub use program::*;
pub use state::*;
pub use target::*;
pub use texture::*;
pub use vertex::*;
