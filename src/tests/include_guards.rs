use crate::driver::{FrontendDriver, TEST_CODE_NAME};
use crate::lang_options::{Language, ParserConfig};
use crate::pp::InMemoryFileContentProvider;
use crate::tests::test_utils::parse_lenient;

fn pragma_once(code: &str) -> bool {
    parse_lenient(code, Language::C).has_pragma_once_semantics()
}

#[test]
fn classic_guards_behave_like_pragma_once() {
    assert!(pragma_once("#ifndef G\n#define G\nint x;\n#endif\n"));
    assert!(pragma_once("#ifndef G\n#define G\nint x;\n#endif /* G */\n"));
    assert!(pragma_once("/* leading comment */\n#ifndef G\n#define G\nint x;\n#endif\n"));
    assert!(pragma_once("// line comment\n#if !defined(G)\n#define G\nint x;\n#endif // G\n"));
    assert!(pragma_once("#pragma once\nint x;\n"));
}

#[test]
fn guards_combined_with_other_conditions_do_not_count() {
    assert!(!pragma_once("#if !defined(G) && !defined(H)\n#define G\nint x;\n#endif\n"));
    assert!(!pragma_once("#if !defined(G) || !defined(H)\n#define G\nint x;\n#endif\n"));
    assert!(!pragma_once("#ifndef G\n#define G\nint x;\n#endif\nint y;\n"));
    assert!(!pragma_once("int y;\n#ifndef G\n#define G\n#endif\n"));
    assert!(!pragma_once("#ifndef G\n#define G\n#else\nint z;\n#endif\n"));
    assert!(!pragma_once("int plain;\n"));
    assert!(!pragma_once("#ifndef G\n#define G\n#ifndef H\n#define H\n#endif\n#endif\n"));
}

#[test]
fn guard_macro_is_reported() {
    let unit = parse_lenient("#ifndef MY_HEADER_H\n#define MY_HEADER_H\n#endif\n", Language::C);
    assert_eq!(unit.include_guard().map(|g| g.as_str()), Some("MY_HEADER_H"));
}

#[test]
fn guarded_header_is_read_once() {
    let provider = InMemoryFileContentProvider::new().with_file("guarded.h", "#ifndef GUARDED_H\n#define GUARDED_H\nint g;\n#endif\n");
    let config = ParserConfig::new(Language::C, true).expect_no_problems(true);
    let code = "#include \"guarded.h\"\n#include \"guarded.h\"\nint use(void) { return g; }\n";
    let unit = FrontendDriver::new(config, &provider).parse(TEST_CODE_NAME, code).unwrap();

    let includes = unit.include_directives();
    assert_eq!(includes.len(), 2);
    assert!(includes.iter().all(|i| i.resolved.is_some()));
    assert!(includes[0].was_read);
    assert!(!includes[1].was_read);
    assert!(includes.iter().all(|i| i.has_pragma_once_semantics));
    assert_eq!(unit.declarations().len(), 2);
}
