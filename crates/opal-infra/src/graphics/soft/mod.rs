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

//! The software graphics backend.
//!
//! `raw` emulates the native driver's object model: named objects, global
//! bind points, sticky error state, and a framebuffer-completeness query.
//! `device` implements the `opal-core` [`GraphicsDevice`] contract on top of
//! it, scoping every bind and checking the raw error state after every
//! mutating call. `conversions` is the translation table between portable
//! enumerations and the raw constants.
//!
//! [`GraphicsDevice`]: opal_core::traits::GraphicsDevice

pub mod conversions;
pub mod context;
pub mod device;
pub mod raw;

pub use context::SoftGraphicsContext;
pub use device::SoftDevice;
