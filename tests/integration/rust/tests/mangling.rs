//! Name mangling keeps program structure and free names intact

use std::collections::BTreeSet;

use parser::{parse, Node, ScopeAnalyzer, ScopeInfo};
use rstest::rstest;
use unparser::{minify_print, MinifyOptions};

fn mangle(program: &Node, obfuscate_globals: bool) -> String {
    let options = MinifyOptions {
        obfuscate: true,
        obfuscate_globals,
        drop_semi: true,
    };
    minify_print(program, &options).unwrap()
}

fn free_names(info: &ScopeInfo) -> BTreeSet<String> {
    info.occurrences
        .values()
        .filter(|occurrence| occurrence.binding.is_none())
        .map(|occurrence| occurrence.name.clone())
        .collect()
}

/// Binding scope of every occurrence, in a name-independent form
fn binding_shape(info: &ScopeInfo) -> Vec<(usize, Option<usize>, bool)> {
    let mut shape: Vec<_> = info
        .occurrences
        .values()
        .map(|occurrence| (occurrence.from, occurrence.binding, occurrence.declaration))
        .collect();
    shape.sort();
    shape
}

const CORPUS: &[&str] = &[
    "function add(first, second) { var total = first + second; return total; }",
    "function outer(x) { function inner(y) { return x * y + z; } return inner(2); }",
    "var counter = 0; function bump(step) { counter += step; return counter; }",
    "function f(a) { try { g(a); } catch (problem) { report(problem, a); } }",
    "function f(list) { for (var i = 0; i < list.length; i++) { use(list[i], i); } }",
    "var make = function named(n) { return n ? named(n - 1) : { value: n, get v() { return n; } }; };",
    "function shadow(a) { var b = function (a) { return a + 1; }; return b(a); }",
    "function keys(o) { var k, out = []; for (k in o) out.push(k); return out; }",
    "function f(arg) { with (arg) { return prop; } }",
    "function f(code, local) { eval(code); return local; }",
];

#[rstest]
#[case(false)]
#[case(true)]
fn test_mangled_output_preserves_bindings(#[case] obfuscate_globals: bool) {
    for source in CORPUS {
        let program = parse(source).unwrap();
        let output = mangle(&program, obfuscate_globals);
        let mangled = parse(&output)
            .unwrap_or_else(|err| panic!("{:?} mangled to unparsable {:?}: {}", source, output, err));

        let before = ScopeAnalyzer::new().analyze(&program);
        let after = ScopeAnalyzer::new().analyze(&mangled);
        assert_eq!(before.scopes.len(), after.scopes.len(), "{}", output);
        assert_eq!(free_names(&before), free_names(&after), "{}", output);
        assert_eq!(binding_shape(&before), binding_shape(&after), "{}", output);
        assert!(output.len() <= source.len());
    }
}

#[test]
fn test_globals_kept_by_default() {
    let program = parse("var counter = 0; function bump(step) { counter += step; }").unwrap();
    let output = mangle(&program, false);
    assert!(output.contains("counter"));
    assert!(output.contains("bump"));
    assert!(!output.contains("step"));
}

#[test]
fn test_dynamic_scopes_keep_names() {
    for source in &CORPUS[8..] {
        let program = parse(source).unwrap();
        let output = mangle(&program, true);
        let unchanged = minify_print(&program, &MinifyOptions::default()).unwrap();
        assert_eq!(output, unchanged);
    }
}

#[test]
fn test_mangling_is_deterministic() {
    let program = parse(CORPUS[1]).unwrap();
    assert_eq!(mangle(&program, true), mangle(&program, true));
}
