//! Per-file scope records: which local and self structs an identifier at a given
//! offset resolves against.

use serde::Serialize;

use crate::token::Position;
use crate::types::TypeId;

/// One contiguous range of a file with a fixed local/self binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scope {
    pub start: Position,
    pub end: Position,
    pub local: TypeId,
    pub self_ty: TypeId,
    /// Set for the range right after a `.`, where only members of `self_ty` apply.
    pub is_dot_accessor: bool,
}

impl Scope {
    pub fn covers(&self, offset: usize) -> bool {
        self.start.offset <= offset && offset < self.end.offset
    }
}

/// Append-only, non-overlapping list of [`Scope`]s ordered by start offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeRanges {
    records: Vec<Scope>,
}

impl ScopeRanges {
    /// Fresh list with a single open scope starting at the top of the file.
    pub fn new(local: TypeId, self_ty: TypeId) -> Self {
        let start = Position::start();
        Self {
            records: vec![Scope {
                start,
                end: start,
                local,
                self_ty,
                is_dot_accessor: false,
            }],
        }
    }

    /// Close the open scope at `at` and open a new one from there.
    ///
    /// Positions never move backwards: a request before the current start is clamped
    /// to it. An open scope that would be left empty is replaced instead.
    pub fn next_scope(&mut self, at: Position, local: TypeId, self_ty: TypeId, is_dot_accessor: bool) {
        let next = Scope {
            start: at,
            end: at,
            local,
            self_ty,
            is_dot_accessor,
        };
        let Some(open) = self.records.last_mut() else {
            self.records.push(next);
            return;
        };
        let at = if at.offset < open.start.offset { open.start } else { at };
        if at.offset == open.start.offset {
            *open = Scope { start: at, end: at, ..next };
            return;
        }
        open.end = at;
        self.records.push(Scope { start: at, end: at, ..next });
    }

    /// Close the last scope at `end`.
    pub fn close(&mut self, end: Position) {
        if let Some(open) = self.records.last_mut() {
            if end.offset >= open.start.offset {
                open.end = end;
            }
        }
    }

    pub fn current(&self) -> Option<&Scope> {
        self.records.last()
    }

    /// Scope covering `offset`. The last scope also covers its own end.
    pub fn at(&self, offset: usize) -> Option<&Scope> {
        let idx = self.records.partition_point(|s| s.start.offset <= offset);
        let scope = self.records.get(idx.checked_sub(1)?)?;
        let is_last = idx == self.records.len();
        if scope.covers(offset) || (is_last && offset <= scope.end.offset) {
            Some(scope)
        } else {
            None
        }
    }

    pub fn records(&self) -> &[Scope] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimitiveKind, TypeRegistry};

    fn pos(offset: usize) -> Position {
        Position::new(1, offset as u32 + 1, offset)
    }

    #[test]
    fn test_ranges_are_monotonic() {
        let mut reg = TypeRegistry::new();
        let global = reg.new_type(PrimitiveKind::Struct);
        let local = reg.new_type(PrimitiveKind::Struct);
        let inner = reg.new_type(PrimitiveKind::Struct);

        let mut scopes = ScopeRanges::new(local, global);
        scopes.next_scope(pos(10), inner, global, false);
        scopes.next_scope(pos(5), local, global, false);
        scopes.next_scope(pos(20), local, global, false);
        scopes.close(pos(30));

        let starts: Vec<usize> = scopes.records().iter().map(|s| s.start.offset).collect();
        assert_eq!(starts, vec![0, 10, 20]);
        for pair in scopes.records().windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(scopes.records()[1].local, local);
    }

    #[test]
    fn test_lookup_by_offset() {
        let mut reg = TypeRegistry::new();
        let global = reg.new_type(PrimitiveKind::Struct);
        let local = reg.new_type(PrimitiveKind::Struct);
        let inner = reg.new_type(PrimitiveKind::Struct);

        let mut scopes = ScopeRanges::new(local, global);
        scopes.next_scope(pos(4), inner, global, true);
        scopes.next_scope(pos(8), local, global, false);
        scopes.close(pos(12));

        assert_eq!(scopes.at(0).map(|s| s.local), Some(local));
        assert_eq!(scopes.at(4).map(|s| s.is_dot_accessor), Some(true));
        assert_eq!(scopes.at(7).map(|s| s.local), Some(inner));
        assert_eq!(scopes.at(12).map(|s| s.local), Some(local));
        assert!(scopes.at(13).is_none());
    }

    #[test]
    fn test_empty_scope_is_replaced() {
        let mut reg = TypeRegistry::new();
        let global = reg.new_type(PrimitiveKind::Struct);
        let a = reg.new_type(PrimitiveKind::Struct);
        let b = reg.new_type(PrimitiveKind::Struct);

        let mut scopes = ScopeRanges::new(a, global);
        scopes.next_scope(pos(3), a, global, false);
        scopes.next_scope(pos(3), b, global, false);
        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes.current().map(|s| s.local), Some(b));
    }
}
