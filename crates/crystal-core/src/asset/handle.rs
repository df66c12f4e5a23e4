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

use super::Asset;
use std::{ops::Deref, sync::Arc};

/// A thread-safe, reference-counted handle to a loaded asset.
///
/// Cloning a handle is cheap; it only increments the reference count. Two
/// handles are considered the same asset when they point at the same
/// allocation, which is what [`AssetHandle::ptr_eq`] checks.
#[derive(Debug)]
pub struct AssetHandle<T: Asset>(Arc<T>);

impl<T: Asset> AssetHandle<T> {
    /// Creates a new `AssetHandle` that takes ownership of the asset data.
    pub fn new(asset: T) -> Self {
        Self(Arc::new(asset))
    }

    /// Wraps an already shared asset.
    pub fn from_arc(asset: Arc<T>) -> Self {
        Self(asset)
    }

    /// Returns `true` if both handles reference the same loaded asset.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Returns the shared pointer backing this handle.
    pub fn as_arc(&self) -> &Arc<T> {
        &self.0
    }
}

impl<T: Asset> Clone for AssetHandle<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Asset> Deref for AssetHandle<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Blob(u32);
    impl Asset for Blob {}

    #[test]
    fn test_clone_shares_the_same_asset() {
        let a = AssetHandle::new(Blob(7));
        let b = a.clone();
        let c = AssetHandle::new(Blob(7));

        assert!(AssetHandle::ptr_eq(&a, &b));
        assert!(!AssetHandle::ptr_eq(&a, &c));
        assert_eq!((*b).0, 7);
    }
}
