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

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A globally unique, persistent identifier for a logical asset.
///
/// Static meshes and imported models carry one so that scene data can refer to
/// them independently of the file they were imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetUUID(Uuid);

impl AssetUUID {
    /// A fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying [`Uuid`].
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AssetUUID {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetUUID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_distinct_and_display_hyphenated() {
        let a = AssetUUID::new();
        let b = AssetUUID::new();

        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.as_uuid().hyphenated().to_string());
    }
}
