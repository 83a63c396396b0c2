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

//! Device creation parameters.

use std::borrow::Cow;

/// A descriptor used to create a graphics device and its drawable surface.
///
/// Exactly one device may be live at a time; constructing a second one before
/// the first is dropped is a creation error, not a panic.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor<'a> {
    /// The requested surface width in pixels.
    pub display_width: u32,
    /// The requested surface height in pixels.
    pub display_height: u32,
    /// The window title, where the backend has a window to title.
    pub app_title: Cow<'a, str>,
    /// The swap interval honored by `flip`: `0` presents immediately, `1`
    /// synchronizes with the display refresh.
    pub swap_interval: u32,
    /// If `true`, the backend logs its renderer/version identification
    /// strings at creation.
    pub print_device_info: bool,
}

impl Default for DeviceDescriptor<'_> {
    fn default() -> Self {
        Self {
            display_width: 960,
            display_height: 540,
            app_title: Cow::Borrowed("opal"),
            swap_interval: 1,
            print_device_info: false,
        }
    }
}
