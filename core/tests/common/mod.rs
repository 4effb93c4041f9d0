#![allow(dead_code)]

use gml_core::diagnostics::DiagnosticCollection;
use gml_core::{AnalysisConfig, AssetSpec, FileId, Project, SignifierId};

pub fn project(assets: Vec<AssetSpec>) -> Project {
    let mut project = Project::new(AnalysisConfig::default()).unwrap();
    project.initialize(assets).unwrap();
    project
}

/// A project holding one script `main` with `source`.
pub fn script(source: &str) -> (Project, FileId) {
    let project = project(vec![AssetSpec::script("main", source)]);
    let id = project.file_id("main/main.gml").unwrap();
    (project, id)
}

pub fn collections(project: &Project, file: FileId) -> Vec<DiagnosticCollection> {
    project
        .diagnostics(file)
        .unwrap()
        .into_iter()
        .map(|d| d.collection)
        .collect()
}

pub fn messages(project: &Project, file: FileId) -> Vec<String> {
    project
        .diagnostics(file)
        .unwrap()
        .into_iter()
        .map(|d| d.message)
        .collect()
}

/// Byte offset of the `nth` occurrence of `needle`, plus `shift`.
pub fn offset_of(source: &str, needle: &str, nth: usize, shift: usize) -> usize {
    source
        .match_indices(needle)
        .nth(nth)
        .map(|(i, _)| i + shift)
        .unwrap_or_else(|| panic!("`{needle}` occurs fewer than {} times", nth + 1))
}

pub fn global(project: &Project, name: &str) -> SignifierId {
    project
        .registry()
        .own_member(project.global(), name)
        .unwrap_or_else(|| panic!("no global `{name}`"))
}
