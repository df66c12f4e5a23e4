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

use crystal_core::asset::Asset;
use std::error::Error;

/// Decodes raw source bytes into a CPU-side asset `A`.
///
/// Implementors only parse; uploading the result is left to the caller so
/// loaders can run away from the render thread.
pub trait AssetLoaderLane<A: Asset> {
    /// Decodes `bytes` into an `A`.
    ///
    /// ## Errors
    /// Any decoding failure, boxed so loaders keep their own error types.
    fn load(&self, bytes: &[u8]) -> Result<A, Box<dyn Error + Send + Sync>>;
}
