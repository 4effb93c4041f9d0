use std::collections::BTreeSet;

use serde::Serialize;

use crate::cst::{ParseResult, parse};
use crate::diagnostics::{Diagnostic, FileDiagnostics};
use crate::scope::ScopeRanges;
use crate::token::Span;
use crate::types::{FileId, SignifierId, TypeId, TypeRegistry};

/// Where a file is in its analysis lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileState {
    Unparsed,
    Parsed,
    GloballyRegistered,
    LocallyResolved,
}

/// One occurrence of a symbol in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub item: SignifierId,
    pub span: Span,
    pub is_def: bool,
}

/// One argument slot of a call. The span runs between the delimiters around it, so an
/// empty slot still has a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArgRange {
    pub function: TypeId,
    /// Index of the owning call in [`GmlFile::calls`].
    pub call: usize,
    pub param_idx: usize,
    pub span: Span,
    pub has_expression: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    pub function: TypeId,
    /// From `(` to `)`.
    pub span: Span,
    pub args: Vec<ArgRange>,
}

/// A source file and everything derived from its current text.
#[derive(Debug)]
pub struct GmlFile {
    pub id: FileId,
    /// `asset/file.gml`, unique within the project.
    pub path: String,
    pub name: String,
    /// Index of the owning asset.
    pub asset: usize,
    pub(crate) content: String,
    pub(crate) state: FileState,
    pub(crate) parsed: Option<ParseResult>,
    pub(crate) scopes: ScopeRanges,
    pub(crate) refs: Vec<Reference>,
    pub(crate) calls: Vec<CallRecord>,
    pub(crate) global_diagnostics: Vec<Diagnostic>,
    pub(crate) local_diagnostics: Vec<Diagnostic>,
    pub(crate) diagnostics: FileDiagnostics,
    /// The file calls `event_inherited()`.
    pub(crate) calls_super: bool,
    pub(crate) removed: bool,
}

impl GmlFile {
    pub(crate) fn new(id: FileId, asset: usize, asset_name: &str, name: &str, content: String) -> Self {
        Self {
            id,
            path: format!("{asset_name}/{name}"),
            name: name.to_string(),
            asset,
            content,
            state: FileState::Unparsed,
            parsed: None,
            scopes: ScopeRanges::default(),
            refs: Vec::new(),
            calls: Vec::new(),
            global_diagnostics: Vec::new(),
            local_diagnostics: Vec::new(),
            diagnostics: FileDiagnostics::default(),
            calls_super: false,
            removed: false,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn state(&self) -> FileState {
        self.state
    }

    pub fn parse_result(&self) -> Option<&ParseResult> {
        self.parsed.as_ref()
    }

    pub fn scopes(&self) -> &ScopeRanges {
        &self.scopes
    }

    pub fn refs(&self) -> &[Reference] {
        &self.refs
    }

    pub fn calls(&self) -> &[CallRecord] {
        &self.calls
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Object create events are named `Create_0`.
    pub fn is_create_event(&self) -> bool {
        self.name.strip_suffix(".gml").unwrap_or(&self.name) == "Create_0"
    }

    pub(crate) fn parse(&mut self) {
        self.parsed = Some(parse(&self.content));
        self.state = FileState::Parsed;
    }

    /// Forget everything derived from the current text.
    ///
    /// Symbols this file defined lose their definition, and every other file that
    /// references one of them is returned so its diagnostics can be recomputed.
    pub(crate) fn reset(&mut self, reg: &mut TypeRegistry) -> BTreeSet<FileId> {
        let mut dirty = BTreeSet::new();
        let mut seen = BTreeSet::new();
        for r in &self.refs {
            if !seen.insert(r.item) {
                continue;
            }
            let sig = reg.sig_mut(r.item);
            if sig.def_file() == Some(self.id) {
                sig.unset_def();
                dirty.extend(sig.ref_files().filter(|f| *f != self.id));
            }
            sig.remove_refs_in(self.id);
        }
        dirty.remove(&self.id);

        self.parsed = None;
        self.scopes = ScopeRanges::default();
        self.refs.clear();
        self.calls.clear();
        self.global_diagnostics.clear();
        self.local_diagnostics.clear();
        self.diagnostics.clear_all();
        self.calls_super = false;
        self.state = FileState::Unparsed;
        dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Position;
    use crate::types::PrimitiveKind;

    fn span(start: usize, end: usize) -> Span {
        Span::new(Position::new(1, start as u32 + 1, start), Position::new(1, end as u32 + 1, end))
    }

    #[test]
    fn test_create_event_name() {
        let file = GmlFile::new(FileId(0), 0, "o_player", "Create_0.gml", String::new());
        assert!(file.is_create_event());
        assert_eq!(file.path, "o_player/Create_0.gml");
        let step = GmlFile::new(FileId(1), 0, "o_player", "Step_0.gml", String::new());
        assert!(!step.is_create_event());
    }

    #[test]
    fn test_reset_unsets_own_defs_and_reports_dependents() {
        let mut reg = TypeRegistry::new();
        let global = reg.new_type(PrimitiveKind::Struct);
        let own = reg.add_member(global, "own", None).unwrap();
        let foreign = reg.add_member(global, "foreign", None).unwrap();

        let mut file = GmlFile::new(FileId(0), 0, "scr", "scr.gml", String::new());
        reg.sig_mut(own).set_def(file.id, span(0, 3));
        reg.sig_mut(own).add_ref(file.id, span(0, 3), true);
        reg.sig_mut(own).add_ref(FileId(1), span(4, 7), false);
        reg.sig_mut(foreign).set_def(FileId(2), span(0, 7));
        reg.sig_mut(foreign).add_ref(file.id, span(8, 15), false);
        reg.sig_mut(foreign).add_ref(FileId(3), span(1, 2), false);
        file.refs = vec![
            Reference { item: own, span: span(0, 3), is_def: true },
            Reference { item: foreign, span: span(8, 15), is_def: false },
        ];

        let dirty = file.reset(&mut reg);
        assert_eq!(dirty.into_iter().collect::<Vec<_>>(), vec![FileId(1)]);
        assert!(!reg.sig(own).is_declared());
        assert!(reg.sig(foreign).is_declared());
        assert_eq!(reg.sig(own).ref_count(), 1);
        assert_eq!(reg.sig(foreign).ref_count(), 1);
        assert!(file.refs.is_empty());
        assert_eq!(file.state(), FileState::Unparsed);
    }
}
