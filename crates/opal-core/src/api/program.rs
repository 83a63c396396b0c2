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

//! Handles for compiled shader program stages.
//!
//! Program blobs are opaque to this layer: the device loads precompiled
//! text/binary as supplied and performs no validation of its grammar.

/// An opaque handle to a compiled vertex program stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexProgramId(pub usize);

/// An opaque handle to a compiled fragment program stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentProgramId(pub usize);
