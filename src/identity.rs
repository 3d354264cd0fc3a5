//! Scope-identity synthesis.
//!
//! Offsets are a pure function of static position: the qualified name of the
//! enclosing declaration plus the ordinal of the call site among transformable
//! call sites of that declaration, in document order. Nothing here depends on
//! traversal order across files or on process-wide state, so recompiling an
//! unchanged file reproduces every offset.
//!
//! Uniqueness only holds inside one static nesting. Collisions are possible and
//! are not detected; their probability is governed by the configured width.

use sha2::{Digest, Sha256};

/// Path component reserved for a scope's own node.
const OWN_SCOPE: &str = "scope";

/// Compile-time half of a scope id. The runtime half is the threaded identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeOffset(pub u64);

impl ScopeOffset {
    pub fn literal(&self) -> String {
        self.0.to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IdentitySynthesizer {
    mask: u64,
}

impl IdentitySynthesizer {
    /// `width` must already be validated by the options layer.
    pub fn new(width: u32) -> Self {
        let mask = if width >= 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        IdentitySynthesizer { mask }
    }

    pub fn width(&self) -> u32 {
        64 - self.mask.leading_zeros()
    }

    /// Offset of the `ordinal`-th transformable call site inside `qualified_name`.
    pub fn call_site(&self, qualified_name: &str, ordinal: u32) -> ScopeOffset {
        self.hash_path(qualified_name, &ordinal.to_string())
    }

    /// Offset of the scope node a memo function opens for itself.
    pub fn own_scope(&self, qualified_name: &str) -> ScopeOffset {
        self.hash_path(qualified_name, OWN_SCOPE)
    }

    fn hash_path(&self, qualified_name: &str, component: &str) -> ScopeOffset {
        let mut hasher = Sha256::new();
        hasher.update(qualified_name.as_bytes());
        hasher.update(b"#");
        hasher.update(component.as_bytes());
        let digest = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        ScopeOffset(u64::from_be_bytes(head) & self.mask)
    }
}

/// Qualified name of a top-level declaration or class member.
pub fn declaration_name(file: &str, owner: Option<&str>, name: &str) -> String {
    match owner {
        Some(owner) => format!("{}::{}.{}", file, owner, name),
        None => format!("{}::{}", file, name),
    }
}

/// Qualified name of a closure passed at `argument` of the call site `ordinal`.
pub fn nested_lambda_name(parent: &str, ordinal: u32, argument: usize) -> String {
    format!("{}/{}:{}", parent, ordinal, argument)
}

/// Qualified name of the `index`-th free-standing `@memo` lambda of `parent`.
pub fn free_lambda_name(parent: &str, index: u32) -> String {
    format!("{}/memo-lambda#{}", parent, index)
}

/// Hands out call-site ordinals for one memo scope, in document order.
#[derive(Debug)]
pub struct CallSiteTracker {
    qualified_name: String,
    next_ordinal: u32,
    next_free_lambda: u32,
}

impl CallSiteTracker {
    pub fn new(qualified_name: String) -> Self {
        CallSiteTracker {
            qualified_name,
            next_ordinal: 0,
            next_free_lambda: 0,
        }
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn next_call_site(&mut self) -> u32 {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        ordinal
    }

    pub fn next_free_lambda(&mut self) -> String {
        let index = self.next_free_lambda;
        self.next_free_lambda += 1;
        free_lambda_name(&self.qualified_name, index)
    }

    pub fn call_sites(&self) -> u32 {
        self.next_ordinal
    }
}
