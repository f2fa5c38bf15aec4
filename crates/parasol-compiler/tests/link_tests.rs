use parasol_compiler::ast::{NodeKind, QualifiedRef};
use parasol_compiler::{ErrorKind, LinkUnit};

fn unit_of(modules: &[(&str, &str)]) -> LinkUnit {
    let mut unit = LinkUnit::new();
    for (name, source) in modules {
        unit.add_module(source, name).unwrap();
    }
    unit
}

fn pipeline(unit: &LinkUnit, name: &str) -> QualifiedRef {
    unit.find_pipeline(name)
        .unwrap_or_else(|| panic!("パイプライン {} がありません", name))
}

#[test]
fn test_classification_separates_pipelines_and_functions() {
    let unit = unit_of(&[("main", "pipeline P { }\ndef f() = 1")]);
    let module = unit.module(0).unwrap();

    let p = module.get_pipeline("P").unwrap();
    assert_eq!(module.ast().pipeline_name(p), Some("P"));
    let f = module.get_global_function("f").unwrap();
    assert_eq!(module.ast().function_name(f), Some("f"));

    assert_eq!(module.get_pipeline("f"), None);
    assert_eq!(module.get_global_function("P"), None);
}

#[test]
fn test_classification_fills_pipeline_tables() {
    let source = "pipeline P {\n  def g(x) = x\n  v: float = 1.0\n  w\n  s = Other[v]\n}";
    let unit = unit_of(&[("main", source)]);
    let module = unit.module(0).unwrap();
    let ast = module.ast();

    let g = module.get_pipeline_function("P", "g").unwrap();
    assert!(matches!(ast.kind(g), NodeKind::FunctionDef { .. }));

    let v = module.get_variable("P", "v").unwrap();
    assert_eq!(ast.var_decl_name(v), Some("v"));
    assert_eq!(ast.node(v).line, 3);
    assert!(module.get_variable("P", "w").is_some());
    assert!(module.get_variable("P", "s").is_some());

    // スコープ参照は宣言ではない
    let table = &ast.pipeline(module.get_pipeline("P").unwrap()).unwrap().variables;
    assert_eq!(table.names(), vec!["s", "v", "w"]);

    // 関数はグローバル表に入らない
    assert_eq!(module.get_global_function("g"), None);
    assert_eq!(module.get_pipeline_function("Missing", "g"), None);
}

#[test]
fn test_classification_first_declaration_wins() {
    let unit = unit_of(&[("main", "pipeline P {\n  v = 1\n  v = 2\n}\npipeline P { }")]);
    let module = unit.module(0).unwrap();

    let v = module.get_variable("P", "v").unwrap();
    assert_eq!(module.ast().node(v).line, 2);

    let p = module.get_pipeline("P").unwrap();
    assert_eq!(module.ast().node(p).line, 1);
}

#[test]
fn test_include_resolution_prefers_first_module() {
    let mut unit = unit_of(&[
        ("a", "pipeline Shared { v = 1 }"),
        ("b", "pipeline Shared { v = 2 }"),
        ("c", "pipeline User { include Shared }"),
    ]);
    let report = unit.link();
    assert_eq!(report.linked, 1);
    assert!(report.is_complete());

    let user = pipeline(&unit, "User");
    assert_eq!(user.module, 2);
    let ast = unit.module(2).unwrap().ast();
    let includes = &ast.pipeline(user.node).unwrap().includes;
    assert_eq!(includes.len(), 1);

    let target = ast.include_target(includes[0]).unwrap();
    assert_eq!(target.module, 0);
    assert_eq!(Some(target), unit.find_pipeline("Shared"));
}

#[test]
fn test_fallback_resolution_through_include() {
    let mut unit = unit_of(&[
        ("base", "pipeline P1 { v = 1 }"),
        ("main", "pipeline P2 { include P1 }"),
    ]);
    unit.link();

    let p2 = pipeline(&unit, "P2");
    let found = unit.resolve_variable(p2, "v").unwrap().unwrap();
    assert_eq!(found.module, 0);
    assert_eq!(found, QualifiedRef::new(0, unit.module(0).unwrap().get_variable("P1", "v").unwrap()));

    // 直接の検索はインクルードを辿らない
    assert_eq!(unit.module(1).unwrap().get_variable("P2", "v"), None);
}

#[test]
fn test_fallback_resolution_is_transitive_for_functions() {
    let mut unit = unit_of(&[(
        "main",
        "pipeline A { def f() = 1 }\npipeline B { include A }\npipeline C { include B }",
    )]);
    unit.link();

    let c = pipeline(&unit, "C");
    let found = unit.resolve_function(c, "f").unwrap().unwrap();
    assert_eq!(unit.module(0).unwrap().ast().function_name(found.node), Some("f"));
    assert_eq!(unit.resolve_function(c, "g").unwrap(), None);
}

#[test]
fn test_own_declaration_shadows_include() {
    let mut unit = unit_of(&[("main", "pipeline A { v = 1 }\npipeline B {\n  include A\n  v = 2\n}")]);
    unit.link();

    let b = pipeline(&unit, "B");
    let found = unit.resolve_variable(b, "v").unwrap().unwrap();
    assert_eq!(unit.module(0).unwrap().ast().node(found.node).line, 4);
}

#[test]
fn test_includes_are_searched_in_link_order() {
    let mut unit = unit_of(&[(
        "main",
        "pipeline X { v = 1 }\npipeline Y { v = 2 }\npipeline Z {\n  include Y\n  include X\n}",
    )]);
    unit.link();

    let z = pipeline(&unit, "Z");
    let found = unit.resolve_variable(z, "v").unwrap().unwrap();
    assert_eq!(unit.module(0).unwrap().ast().node(found.node).line, 2);
}

#[test]
fn test_unresolved_include_does_not_fail_link() {
    let mut unit = unit_of(&[("main", "pipeline P {\n  include Missing\n  include Also as A\n}")]);
    let report = unit.link();
    assert_eq!(report.unresolved, 2);
    assert!(!report.is_complete());

    let p = pipeline(&unit, "P");
    let ast = unit.module(0).unwrap().ast();
    let includes = &ast.pipeline(p.node).unwrap().includes;
    assert_eq!(includes.len(), 2);
    assert_eq!(ast.include_target(includes[0]), None);

    let unresolved = unit.unresolved_includes();
    assert_eq!(unresolved.len(), 2);
    assert_eq!(unresolved[0].name, "Missing");
    assert_eq!(unresolved[0].module, "main");
    assert_eq!(unresolved[0].line, 2);
    assert_eq!(unresolved[0].to_error().kind, ErrorKind::UnresolvedInclude);

    // 未解決のインクルードは名前解決で読み飛ばされる
    assert_eq!(unit.resolve_variable(p, "v").unwrap(), None);
}

#[test]
fn test_cyclic_include_is_reported() {
    let mut unit = unit_of(&[
        ("one", "pipeline A { include B }"),
        ("two", "pipeline B {\n  include A\n  w = 1\n}"),
    ]);
    unit.link();

    let a = pipeline(&unit, "A");
    let err = unit.resolve_variable(a, "missing").unwrap_err();
    assert_eq!(err.kind, ErrorKind::CyclicInclude);
    assert!(err.message.contains("one.A -> two.B -> one.A"), "{}", err);

    // 循環に達する前に見つかる名前は解決できる
    let found = unit.resolve_variable(a, "w").unwrap();
    assert_eq!(found.map(|f| f.module), Some(1));
}

#[test]
fn test_self_include_is_cycle() {
    let mut unit = unit_of(&[("main", "pipeline Loop { include Loop }")]);
    unit.link();

    let err = unit.resolve_function(pipeline(&unit, "Loop"), "f").unwrap_err();
    assert_eq!(err.kind, ErrorKind::CyclicInclude);
}

#[test]
fn test_diamond_include_is_not_cycle() {
    let mut unit = unit_of(&[(
        "main",
        "pipeline Base { }\n\
         pipeline L { include Base }\n\
         pipeline R { include Base }\n\
         pipeline Top {\n  include L\n  include R\n}",
    )]);
    unit.link();

    let top = pipeline(&unit, "Top");
    assert_eq!(unit.resolve_variable(top, "z").unwrap(), None);
}

#[test]
fn test_resolution_before_link_sees_no_includes() {
    let unit = unit_of(&[("base", "pipeline P1 { v = 1 }"), ("main", "pipeline P2 { include P1 }")]);
    let p2 = pipeline(&unit, "P2");
    assert_eq!(unit.resolve_variable(p2, "v").unwrap(), None);
}

#[test]
fn test_link_twice_keeps_include_lists() {
    let mut unit = unit_of(&[("main", "pipeline A { }\npipeline B { include A }")]);
    unit.link();
    unit.link();

    let b = pipeline(&unit, "B");
    let ast = unit.module(0).unwrap().ast();
    assert_eq!(ast.pipeline(b.node).unwrap().includes.len(), 1);
}

#[test]
fn test_failed_module_does_not_disturb_unit() {
    let mut unit = unit_of(&[("good", "pipeline P { v = 1 }")]);

    let err = unit.add_module("pipeline Q { v = }", "bad").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    let err = unit.add_module("pipeline Q { v = 1x }", "worse").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lexical);

    assert_eq!(unit.modules().len(), 1);
    assert!(unit.module_by_name("good").is_some());
    assert!(unit.find_pipeline("Q").is_none());
}

#[test]
fn test_node_ids_are_per_module() {
    let unit = unit_of(&[("a", "pipeline A { }"), ("b", "pipeline B { }")]);
    for module in unit.modules() {
        assert_eq!(module.ast().node(module.root()).node_id, 1);
    }

    let b = pipeline(&unit, "B");
    assert!(unit.node(b).is_some());
    assert!(unit.node(QualifiedRef::new(7, b.node)).is_none());
}

#[test]
fn test_parse_source_links_single_module() {
    let unit = parasol_compiler::parse_source("pipeline A { v = 1 }\npipeline B { include A }", "shader").unwrap();
    let b = pipeline(&unit, "B");
    assert!(unit.resolve_variable(b, "v").unwrap().is_some());
    assert_eq!(unit.module(0).unwrap().name(), "shader");
}
