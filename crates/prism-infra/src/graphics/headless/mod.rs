// Copyright 2026 the Prism authors
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

//! The headless graphics backend: a complete no-GPU implementation of the
//! RHI seam for tests, CI and tools.

mod device;
mod swapchain;

pub use self::device::{DeviceStats, HeadlessDevice, RecordedCommand};
pub use self::swapchain::HeadlessSwapchain;
