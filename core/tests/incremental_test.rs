mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{collections, global, messages, offset_of, project, script};
use gml_core::diagnostics::DiagnosticCollection;
use gml_core::{AssetSpec, Diagnostic, DiagnosticsListener, FileId};

fn helper_project() -> (gml_core::Project, FileId, FileId) {
    let project = project(vec![
        AssetSpec::script("lib", "function helper() { return 1; }\n"),
        AssetSpec::script("main", "helper();\n"),
    ]);
    let lib = project.file_id("lib/lib.gml").unwrap();
    let main = project.file_id("main/main.gml").unwrap();
    (project, lib, main)
}

#[test]
fn removing_a_definition_keeps_the_symbol_and_flags_users() {
    let (mut project, lib, main) = helper_project();
    assert!(project.diagnostics(main).unwrap().is_empty());
    assert!(project.diagnostics(lib).unwrap().is_empty());
    let helper = global(&project, "helper");

    project.reload_file(lib, "// moved elsewhere\n").unwrap();
    assert_eq!(global(&project, "helper"), helper);
    assert!(!project.registry().sig(helper).is_declared());
    assert_eq!(messages(&project, main), vec!["Undeclared symbol `helper`".to_string()]);
    assert!(project.file(main).unwrap().refs().iter().any(|r| r.item == helper));

    project.reload_file(lib, "function helper() { return 2; }\n").unwrap();
    assert_eq!(global(&project, "helper"), helper);
    assert!(project.diagnostics(main).unwrap().is_empty());
    assert!(project.diagnostics(lib).unwrap().is_empty());
}

#[test]
fn reloading_identical_content_is_idempotent() {
    let source = "globalvar counter;\n\
                  counter = 0;\n\
                  /// @param {Real} n\n\
                  function bump(n) { counter += n; return counter; }\n\
                  var s = { a: 1 };\n\
                  with (s) { a = bump(2); }\n\
                  global.limit = 10;\n\
                  enum Dir { up, down }\n\
                  var d = Dir.up;\n\
                  show_debug_message(d, undeclared_thing);\n";
    let (mut project, file) = script(source);
    let bump = global(&project, "bump");

    let snapshot = |project: &gml_core::Project| {
        let f = project.file(file).unwrap();
        let scopes: Vec<_> = f
            .scopes()
            .records()
            .iter()
            .map(|s| (s.start.offset, s.end.offset, s.is_dot_accessor))
            .collect();
        let refs: Vec<_> = f.refs().iter().map(|r| (r.span, r.is_def)).collect();
        (project.diagnostics(file).unwrap(), scopes, refs)
    };

    let before = snapshot(&project);
    project.reload_file(file, source).unwrap();
    let after = snapshot(&project);
    assert_eq!(before, after);
    assert_eq!(global(&project, "bump"), bump);
}

#[test]
fn remove_asset_invalidates_references() {
    let (mut project, lib, main) = helper_project();
    project.remove_asset("lib").unwrap();

    assert!(project.asset("lib").is_none());
    assert!(project.file_id("lib/lib.gml").is_none());
    assert!(project.file(lib).is_none());
    assert!(project.diagnostics(lib).is_err());
    assert!(project.reload_file(lib, "").is_err());
    assert_eq!(messages(&project, main), vec!["Undeclared symbol `helper`".to_string()]);
    assert!(!project.all_diagnostics().contains_key("lib/lib.gml"));

    assert!(project.remove_asset("lib").is_err());
}

#[test]
fn syntax_error_appears_and_clears() {
    let (mut project, file) = script("var a = 1;\nshow_debug_message(a);\n");
    assert!(project.diagnostics(file).unwrap().is_empty());

    project.reload_file(file, "var a = ;\n").unwrap();
    assert!(collections(&project, file).contains(&DiagnosticCollection::SyntaxError));

    project.reload_file(file, "var a = 2;\nshow_debug_message(a);\n").unwrap();
    assert!(project.diagnostics(file).unwrap().is_empty());
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<(String, usize)>>>);

impl DiagnosticsListener for Recorder {
    fn on_diagnostics(&mut self, _file: FileId, path: &str, diagnostics: &[Diagnostic]) {
        self.0.borrow_mut().push((path.to_string(), diagnostics.len()));
    }
}

#[test]
fn listener_hears_rediagnosed_files() {
    let (mut project, lib, _main) = helper_project();
    let recorder = Recorder::default();
    project.set_listener(Box::new(recorder.clone()));

    project.reload_file(lib, "").unwrap();
    let events = recorder.0.borrow().clone();
    assert!(events.contains(&("lib/lib.gml".to_string(), 0)));
    assert!(events.contains(&("main/main.gml".to_string(), 1)));
}

#[test]
fn adding_event_inherited_restores_the_parent_link() {
    let parent_create = "hp = 10;\n";
    let mut project = project(vec![
        AssetSpec::object("o_parent", None, vec![("Create_0.gml", parent_create)]),
        AssetSpec::object("o_child", Some("o_parent"), vec![("Create_0.gml", "speed_x = 1;\n")]),
    ]);
    let child = project.file_id("o_child/Create_0.gml").unwrap();
    assert_eq!(collections(&project, child), vec![DiagnosticCollection::MissingEventInherited]);

    let updated = "event_inherited();\nspeed_x = hp;\n";
    project.reload_file(child, updated).unwrap();
    assert!(project.diagnostics(child).unwrap().is_empty());

    let reg = project.registry();
    let parent_instance = project.asset("o_parent").unwrap().instance.unwrap();
    let child_instance = project.asset("o_child").unwrap().instance.unwrap();
    assert_eq!(reg.ty(child_instance).parent, Some(parent_instance));
    let hp = reg.own_member(parent_instance, "hp").unwrap();
    assert_eq!(project.signifier_at(child, offset_of(updated, "hp", 0, 0)), Some(hp));
}

#[test]
fn identical_reloads_do_not_grow_the_arena() {
    let source = "function f(a) { var s = { x: a }; return s; }\nvar t = f(1);\n";
    let (mut project, file) = script(source);
    project.reload_file(file, source).unwrap();
    let reg = project.registry();
    let counts = (reg.type_count(), reg.signifier_count());
    let slots = (reg.type_capacity(), reg.signifier_capacity());

    for _ in 0..200 {
        project.reload_file(file, source).unwrap();
    }
    let reg = project.registry();
    assert_eq!((reg.type_count(), reg.signifier_count()), counts);
    assert_eq!((reg.type_capacity(), reg.signifier_capacity()), slots);

    assert!(project.diagnostics(file).unwrap().is_empty());
    let t = project
        .file(file)
        .unwrap()
        .refs()
        .iter()
        .map(|r| r.item)
        .find(|id| reg.sig(*id).name == "t")
        .unwrap();
    assert!(reg.contains_signifier(t));
    let ty = reg.sig(t).ty;
    assert!(reg.variants(ty).into_iter().any(|v| reg.get_member(v, "x").is_some()));
}
