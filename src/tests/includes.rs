use std::fs;

use crate::driver::FrontendDriver;
use crate::lang_options::{Language, ParserConfig, ScannerInfo};
use crate::pp::{CachingFileContentProvider, PPProblemKind};
use crate::semantic::BindingKind;
use crate::tests::test_utils::assert_binding_kind;

fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn quoted_and_system_includes_from_disk() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    write(&dir, "local.h", "typedef int local_t;\n");
    write(&dir, "sys/api.h", "#define API_VERSION 3\nint api_call(local_t);\n");
    let main = write(
        &dir,
        "main.c",
        "#include \"local.h\"\n#include <api.h>\nint v = API_VERSION;\nint run(void) { return api_call(v); }\n",
    );

    let provider = CachingFileContentProvider::new();
    let scanner = ScannerInfo::gnu().with_include_path(dir.path().join("sys"));
    let config = ParserConfig::new(Language::C, true).expect_no_problems(true);
    let unit = FrontendDriver::new(config, &provider)
        .with_scanner_info(scanner)
        .parse_file(&main)
        .unwrap();

    let includes = unit.include_directives();
    assert_eq!(includes.len(), 2);
    assert!(!includes[0].system);
    assert!(includes[1].system);
    assert_eq!(includes[1].resolved.as_deref(), Some(dir.path().join("sys/api.h").as_path()));
    assert!(includes.iter().all(|i| i.was_read));
    assert_eq!(unit.declarations().len(), 4);

    let code = fs::read_to_string(&main).unwrap();
    assert_binding_kind(&unit, &code, "api_call(v)", 8, BindingKind::Function(crate::semantic::FunctionKind::Free));
    assert!(unit.macro_definitions().iter().any(|(_, d)| d.name.as_str() == "API_VERSION"));
}

#[test]
fn missing_include_is_a_preprocessor_problem() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let main = write(&dir, "main.c", "#include \"absent.h\"\nint x;\n");

    let provider = CachingFileContentProvider::new();
    let unit = FrontendDriver::new(ParserConfig::new(Language::C, true), &provider)
        .parse_file(&main)
        .unwrap();
    let problems = unit.preprocessor_problems();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].kind, PPProblemKind::InclusionNotFound);
    assert_eq!(problems[0].argument, "absent.h");
    assert_eq!(unit.include_directives()[0].resolved, None);
    assert_eq!(problems[0].span.offset(), 0);
}

#[test]
fn cache_serves_old_content_until_invalidated() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let header = write(&dir, "value.h", "#define VALUE 1\n");
    let main = write(&dir, "main.c", "#include \"value.h\"\nint v = VALUE;\n");

    let provider = CachingFileContentProvider::new();
    let driver = FrontendDriver::new(ParserConfig::new(Language::C, true), &provider);
    let expansion = |unit: &crate::translation_unit::TranslationUnit| {
        unit.macro_definitions()
            .into_iter()
            .find(|(_, d)| d.name.as_str() == "VALUE")
            .map(|(_, d)| d.expansion.clone())
    };

    let first = driver.parse_file(&main).unwrap();
    assert_eq!(expansion(&first).as_deref(), Some("1"));

    fs::write(&header, "#define VALUE 2\n").unwrap();
    let stale = driver.parse_file(&main).unwrap();
    assert_eq!(expansion(&stale).as_deref(), Some("1"));

    provider.invalidate(&header);
    let fresh = driver.parse_file(&main).unwrap();
    assert_eq!(expansion(&fresh).as_deref(), Some("2"));
}

#[test]
fn include_next_continues_after_the_current_directory() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    write(&dir, "first/wrap.h", "int first_part;\n#include_next <wrap.h>\n");
    write(&dir, "second/wrap.h", "int second_part;\n");
    let main = write(&dir, "main.c", "#include <wrap.h>\n");

    let provider = CachingFileContentProvider::new();
    let scanner = ScannerInfo::gnu()
        .with_include_path(dir.path().join("first"))
        .with_include_path(dir.path().join("second"));
    let unit = FrontendDriver::new(ParserConfig::new(Language::C, true).expect_no_problems(true), &provider)
        .with_scanner_info(scanner)
        .parse_file(&main)
        .unwrap();

    let includes = unit.include_directives();
    assert_eq!(includes.len(), 2);
    assert!(includes[1].include_next);
    assert_eq!(includes[1].resolved.as_deref(), Some(dir.path().join("second/wrap.h").as_path()));
    assert_eq!(unit.declarations().len(), 2);
}
