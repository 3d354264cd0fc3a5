//! Memo markers.
//!
//! A marker is either a decorator (`@memo`, `@memo()`), where TypeScript allows
//! one, or a block comment placed immediately before the annotated node
//! (`/** @memo */ function f() {}`, `(/* @memo_skip */ x: number) => ...`).
//! Comment markers are indexed by the byte offset of the node they precede.

use lazy_static::lazy_static;
use oxc_ast::ast::{Comment, Decorator, Expression};
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref MARKER_RE: Regex =
        Regex::new(r"@(?i:(memo_skip|memo_intrinsic|memo_entry|memo))\b").unwrap();
    static ref EXPORT_PREFIX_RE: Regex = Regex::new(r"^export\s+(default\s+)?").unwrap();
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoMarkers {
    pub memo: bool,
    pub skip: bool,
    pub intrinsic: bool,
    pub entry: bool,
}

impl MemoMarkers {
    pub fn is_empty(&self) -> bool {
        !(self.memo || self.skip || self.intrinsic || self.entry)
    }

    /// Any marker that turns a function into a transformed declaration.
    pub fn is_memo_like(&self) -> bool {
        self.memo || self.intrinsic || self.entry
    }

    pub fn merge(&mut self, other: MemoMarkers) {
        self.memo |= other.memo;
        self.skip |= other.skip;
        self.intrinsic |= other.intrinsic;
        self.entry |= other.entry;
    }

    fn set(&mut self, name: &str) -> bool {
        match name.to_ascii_lowercase().as_str() {
            "memo" => self.memo = true,
            "memo_skip" => self.skip = true,
            "memo_intrinsic" => self.intrinsic = true,
            "memo_entry" => self.entry = true,
            _ => return false,
        }
        true
    }

    pub fn parse(text: &str) -> MemoMarkers {
        let mut markers = MemoMarkers::default();
        for cap in MARKER_RE.captures_iter(text) {
            if let Some(m) = cap.get(1) {
                markers.set(m.as_str());
            }
        }
        markers
    }
}

/// Comment markers keyed by the start offset of the node that follows them.
#[derive(Debug, Default)]
pub struct AnnotationIndex {
    by_offset: HashMap<u32, MemoMarkers>,
}

impl AnnotationIndex {
    pub fn from_comments(source: &str, comments: &[Comment]) -> Self {
        let mut index = AnnotationIndex::default();
        for comment in comments {
            let (start, end) = (comment.span.start as usize, comment.span.end as usize);
            let Some(text) = source.get(start..end) else {
                continue;
            };
            let markers = MemoMarkers::parse(text);
            if markers.is_empty() {
                continue;
            }
            let rest = &source[end..];
            let target = end + (rest.len() - rest.trim_start().len());
            index.insert(target as u32, markers);
            if let Some(prefix) = EXPORT_PREFIX_RE.find(&source[target..]) {
                index.insert((target + prefix.end()) as u32, markers);
            }
        }
        index
    }

    fn insert(&mut self, offset: u32, markers: MemoMarkers) {
        self.by_offset.entry(offset).or_default().merge(markers);
    }

    pub fn at(&self, offset: u32) -> MemoMarkers {
        self.by_offset.get(&offset).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_offset.len()
    }
}

/// Marker named by a decorator, if it is one of ours.
pub fn decorator_marker(decorator: &Decorator) -> Option<MemoMarkers> {
    let name = match &decorator.expression {
        Expression::Identifier(id) => id.name.as_str(),
        Expression::CallExpression(call) => match &call.callee {
            Expression::Identifier(id) => id.name.as_str(),
            _ => return None,
        },
        _ => return None,
    };
    let mut markers = MemoMarkers::default();
    if markers.set(name) {
        Some(markers)
    } else {
        None
    }
}

pub fn decorator_markers<'d, 'a: 'd>(
    decorators: impl IntoIterator<Item = &'d Decorator<'a>>,
) -> MemoMarkers {
    let mut markers = MemoMarkers::default();
    for decorator in decorators {
        if let Some(m) = decorator_marker(decorator) {
            markers.merge(m);
        }
    }
    markers
}
