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

//! Name resolution and unlock gating for motions and expressions.

use crate::expression::{ExpressionDefinition, ExpressionLibrary};
use crate::motion::{MotionDefinition, MotionLibrary};
use kizuna_core::{AnimationError, ContentKind, MotionGroup, UnlockRegistry, UnlockSet};
use std::sync::Arc;

/// Everything the avatar can play, and who decides what is unlocked.
#[derive(Clone)]
pub struct ContentCatalog {
    motions: MotionLibrary,
    expressions: ExpressionLibrary,
    unlocks: Arc<dyn UnlockRegistry>,
}

impl ContentCatalog {
    /// Creates a catalog over the given libraries.
    pub fn new(
        motions: MotionLibrary,
        expressions: ExpressionLibrary,
        unlocks: Arc<dyn UnlockRegistry>,
    ) -> Self {
        Self {
            motions,
            expressions,
            unlocks,
        }
    }

    /// The stock libraries with nothing unlocked yet.
    pub fn standard() -> Self {
        Self::new(
            MotionLibrary::standard(),
            ExpressionLibrary::standard(),
            Arc::new(UnlockSet::new()),
        )
    }

    /// Resolves a playable motion by name or bare group name.
    pub fn resolve_motion(&self, name: &str) -> Result<Arc<MotionDefinition>, AnimationError> {
        let definition = self
            .motions
            .resolve(name)
            .ok_or_else(|| AnimationError::unknown(ContentKind::Motion, name))?;
        self.check_unlocked(ContentKind::Motion, &definition.name, definition.lockable)?;
        Ok(Arc::clone(definition))
    }

    /// Resolves a playable motion by group and index.
    pub fn resolve_motion_group(
        &self,
        group: MotionGroup,
        index: usize,
    ) -> Result<Arc<MotionDefinition>, AnimationError> {
        let definition = self.motions.member(group, index).ok_or_else(|| {
            AnimationError::unknown(ContentKind::Motion, format!("{group}[{index}]"))
        })?;
        self.check_unlocked(ContentKind::Motion, &definition.name, definition.lockable)?;
        Ok(Arc::clone(definition))
    }

    /// Resolves a playable expression by name.
    pub fn resolve_expression(
        &self,
        name: &str,
    ) -> Result<Arc<ExpressionDefinition>, AnimationError> {
        let definition = self
            .expressions
            .get(name)
            .ok_or_else(|| AnimationError::unknown(ContentKind::Expression, name))?;
        self.check_unlocked(ContentKind::Expression, &definition.name, definition.lockable)?;
        Ok(Arc::clone(definition))
    }

    /// Expressions that may currently be picked, in library order.
    pub fn playable_expressions(&self) -> Vec<Arc<ExpressionDefinition>> {
        self.expressions
            .iter()
            .filter(|d| !d.lockable || self.unlocks.is_unlocked(&d.name))
            .cloned()
            .collect()
    }

    /// Returns `true` if `id` names content that is free or already unlocked.
    pub fn is_unlocked(&self, id: &str) -> bool {
        let lockable = self
            .motions
            .get(id)
            .map(|d| d.lockable)
            .or_else(|| self.expressions.get(id).map(|d| d.lockable));
        match lockable {
            Some(false) => true,
            _ => self.unlocks.is_unlocked(id),
        }
    }

    /// Returns `true` if the catalog knows the content at all.
    pub fn contains(&self, kind: ContentKind, id: &str) -> bool {
        match kind {
            ContentKind::Motion => self.motions.get(id).is_some(),
            ContentKind::Expression => self.expressions.get(id).is_some(),
        }
    }

    /// The registry backing the unlock checks.
    pub fn unlocks(&self) -> &Arc<dyn UnlockRegistry> {
        &self.unlocks
    }

    /// The motion library.
    pub fn motions(&self) -> &MotionLibrary {
        &self.motions
    }

    /// The expression library.
    pub fn expressions(&self) -> &ExpressionLibrary {
        &self.expressions
    }

    fn check_unlocked(
        &self,
        kind: ContentKind,
        name: &str,
        lockable: bool,
    ) -> Result<(), AnimationError> {
        if lockable && !self.unlocks.is_unlocked(name) {
            return Err(AnimationError::LockedContent {
                kind,
                name: name.to_owned(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for ContentCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCatalog")
            .field("motions", &self.motions.len())
            .field("expressions", &self.expressions.len())
            .finish_non_exhaustive()
    }
}
