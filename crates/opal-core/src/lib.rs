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

//! # Opal Core
//!
//! Backend-agnostic contracts for the Opal graphics device abstraction layer.
//!
//! This crate defines the "common language" of the device layer: opaque
//! resource handles, portable enumerations, resource descriptors, the pure
//! vertex-declaration layout builder, the error taxonomy, and the
//! [`GraphicsDevice`] trait that every backend implements. It contains no
//! backend code and performs no I/O; the 'how' lives in a concrete backend
//! crate (e.g. the software backend in `opal-infra`) which implements these
//! traits.

#![warn(missing_docs)]

pub mod api;
pub mod error;
pub mod traits;

pub use api::*;
pub use error::{DeviceError, RenderError, ResourceError, TargetError};
pub use traits::GraphicsDevice;
