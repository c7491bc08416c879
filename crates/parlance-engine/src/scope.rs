//! Persistent scope maps.
//!
//! A scope map is an immutable chain of declarations; extending it shares
//! the whole tail, so the thousands of parse states alive during one
//! statement share one spine. Later bindings shadow earlier ones.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parlance_syntax::Declaration;

#[derive(Debug)]
struct ScopeNode {
    declaration: Arc<Declaration>,
    parent: Option<Arc<ScopeNode>>,
}

/// An immutable map from name to declaration.
#[derive(Clone, Debug, Default)]
pub struct ScopeMap {
    head: Option<Arc<ScopeNode>>,
}

impl ScopeMap {
    /// The empty scope.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A new scope with one more binding; `self` is untouched.
    pub fn with(&self, declaration: Arc<Declaration>) -> Self {
        Self {
            head: Some(Arc::new(ScopeNode {
                declaration,
                parent: self.head.clone(),
            })),
        }
    }

    /// The visible declaration for a name, honoring shadowing.
    pub fn lookup(&self, name: &str) -> Option<&Arc<Declaration>> {
        let mut node = self.head.as_ref();
        while let Some(n) = node {
            if &*n.declaration.name == name {
                return Some(&n.declaration);
            }
            node = n.parent.as_ref();
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Declarations from innermost to outermost.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Declaration>> {
        let mut node = self.head.as_ref();
        std::iter::from_fn(move || {
            let n = node?;
            node = n.parent.as_ref();
            Some(&n.declaration)
        })
    }
}

impl PartialEq for ScopeMap {
    fn eq(&self, other: &Self) -> bool {
        // Shared tails make pointer equality the common fast path.
        let mut a = self.head.as_ref();
        let mut b = other.head.as_ref();
        loop {
            match (a, b) {
                (None, None) => return true,
                (Some(x), Some(y)) => {
                    if Arc::ptr_eq(x, y) {
                        return true;
                    }
                    if x.declaration != y.declaration {
                        return false;
                    }
                    a = x.parent.as_ref();
                    b = y.parent.as_ref();
                }
                _ => return false,
            }
        }
    }
}

impl Eq for ScopeMap {}

impl Hash for ScopeMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for declaration in self.iter() {
            declaration.hash(state);
        }
    }
}
