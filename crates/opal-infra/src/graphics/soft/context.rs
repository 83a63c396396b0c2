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

//! The logical rendering context owned by the software device.

use std::sync::atomic::{AtomicBool, Ordering};

use log::info;
use opal_core::{DeviceDescriptor, DeviceError};

use super::raw::RawContext;

/// At most one context may be live per process; the descriptor contract makes
/// a second creation a recoverable error rather than undefined behavior.
static CONTEXT_ALIVE: AtomicBool = AtomicBool::new(false);

/// The single logical rendering context: the raw driver state plus the
/// surface configuration it was created with.
///
/// The context is not itself thread-safe; [`SoftDevice`] serializes access
/// to it behind a lock.
///
/// [`SoftDevice`]: super::device::SoftDevice
#[derive(Debug)]
pub struct SoftGraphicsContext {
    raw: RawContext,
    display_width: u32,
    display_height: u32,
    swap_interval: u32,
}

impl SoftGraphicsContext {
    /// Creates the context and its drawable surface.
    ///
    /// ## Errors
    /// * [`DeviceError::DeviceAlreadyLive`] - If another context has been
    ///   created and not yet dropped.
    /// * [`DeviceError::SurfaceCreationFailed`] - If the requested surface is
    ///   zero-sized. The liveness guard is released before returning, so the
    ///   caller may retry with different parameters.
    pub fn new(descriptor: &DeviceDescriptor) -> Result<Self, DeviceError> {
        if CONTEXT_ALIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DeviceError::DeviceAlreadyLive);
        }

        if descriptor.display_width == 0 || descriptor.display_height == 0 {
            CONTEXT_ALIVE.store(false, Ordering::Release);
            return Err(DeviceError::SurfaceCreationFailed(format!(
                "surface dimensions {}x{} are not drawable",
                descriptor.display_width, descriptor.display_height
            )));
        }

        let mut raw = RawContext::new(descriptor.display_width, descriptor.display_height);
        raw.swap_interval(descriptor.swap_interval);

        if descriptor.print_device_info {
            info!(
                "Graphics context '{}' created: renderer=soft, version={}, surface={}x{}, swap_interval={}",
                descriptor.app_title,
                env!("CARGO_PKG_VERSION"),
                descriptor.display_width,
                descriptor.display_height,
                descriptor.swap_interval
            );
        }

        Ok(Self {
            raw,
            display_width: descriptor.display_width,
            display_height: descriptor.display_height,
            swap_interval: descriptor.swap_interval,
        })
    }

    /// The raw driver state, mutably.
    pub(crate) fn raw_mut(&mut self) -> &mut RawContext {
        &mut self.raw
    }

    /// The raw driver state.
    pub(crate) fn raw(&self) -> &RawContext {
        &self.raw
    }

    /// The surface width in pixels.
    pub fn display_width(&self) -> u32 {
        self.display_width
    }

    /// The surface height in pixels.
    pub fn display_height(&self) -> u32 {
        self.display_height
    }

    /// The swap interval `flip` honors.
    pub fn swap_interval(&self) -> u32 {
        self.swap_interval
    }
}

impl Drop for SoftGraphicsContext {
    fn drop(&mut self) {
        CONTEXT_ALIVE.store(false, Ordering::Release);
    }
}
