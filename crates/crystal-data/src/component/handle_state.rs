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

//! The rebuild-versus-patch state machine of a mesh render handle.
//!
//! Components never branch on raw dirty booleans; they feed events into
//! [`MeshHandleState`] and execute the [`TickPlan`] it returns.

/// Where a component stands with respect to its render handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MeshHandleState {
    /// No mesh is assigned. A handle may still be held and must be released.
    #[default]
    NoMesh,
    /// A mesh is assigned and the handle must be (re)acquired on the next tick.
    PendingRebuild,
    /// The held handle matches the assigned mesh.
    HandleValid,
}

/// What a tick must do, decided from the state and the material-dirty flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickPlan {
    /// Nothing structural; push the transform if a handle is held.
    Idle,
    /// Release the held handle.
    Release,
    /// Release any held handle, then acquire a new one.
    Rebuild,
    /// Push a new material map onto the existing handle.
    PatchMaterials,
}

impl MeshHandleState {
    /// A mesh was assigned (`true`) or cleared (`false`).
    pub fn on_mesh_assigned(self, has_mesh: bool) -> Self {
        if has_mesh {
            MeshHandleState::PendingRebuild
        } else {
            MeshHandleState::NoMesh
        }
    }

    /// The component was enabled. A mesh assigned while the component had
    /// never acquired a handle schedules a rebuild; otherwise the state holds.
    pub fn on_enabled(self, has_mesh: bool) -> Self {
        match self {
            MeshHandleState::NoMesh if has_mesh => MeshHandleState::PendingRebuild,
            state => state,
        }
    }

    /// A rebuild finished; `acquired` tells whether a handle is now held.
    pub fn on_rebuilt(self, acquired: bool) -> Self {
        if acquired {
            MeshHandleState::HandleValid
        } else {
            self
        }
    }

    /// The handle was released outside of a rebuild (mesh cleared, teardown).
    pub fn on_released(self) -> Self {
        MeshHandleState::NoMesh
    }

    /// Decides the work of one tick.
    ///
    /// A material change while the handle is valid takes the cheap patch path;
    /// a pending rebuild absorbs any material change.
    pub fn plan(self, has_handle: bool, material_dirty: bool) -> TickPlan {
        match self {
            MeshHandleState::NoMesh if has_handle => TickPlan::Release,
            MeshHandleState::NoMesh => TickPlan::Idle,
            MeshHandleState::PendingRebuild => TickPlan::Rebuild,
            MeshHandleState::HandleValid if !has_handle => TickPlan::Rebuild,
            MeshHandleState::HandleValid if material_dirty => TickPlan::PatchMaterials,
            MeshHandleState::HandleValid => TickPlan::Idle,
        }
    }

    /// Whether the state expects a live handle.
    pub fn is_valid(self) -> bool {
        self == MeshHandleState::HandleValid
    }
}
