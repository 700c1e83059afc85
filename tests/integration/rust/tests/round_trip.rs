//! Parse -> unparse -> parse round trips
//!
//! Pretty and minified output must parse back to the same tree, and
//! unparsing that tree again must reproduce the output exactly.

use parser::{parse, Node, Parser, ParserOptions};
use proptest::prelude::*;
use rstest::rstest;
use unparser::{minify_print, pretty_print, MinifyOptions};

fn pretty(program: &Node) -> String {
    pretty_print(program, "    ").unwrap()
}

fn minified(program: &Node) -> String {
    minify_print(program, &MinifyOptions::default()).unwrap()
}

fn reparse(source: &str, output: &str) -> Node {
    parse(output).unwrap_or_else(|err| {
        panic!("output of {:?} does not parse: {}\n{}", source, err, output)
    })
}

#[rstest]
#[case("var a = 1, b = 'two', c;")]
#[case("a = b\n++c")]
#[case("x = y / z / w;")]
#[case("if (a) b; else if (c) d; else e;")]
#[case("if (a) if (b) c; else d;")]
#[case("do x(); while (y) z()")]
#[case("for (;;);")]
#[case("for (var i = 0, n = a.length; i < n; i++) { s += a[i]; }")]
#[case("for (k in o) if (o.hasOwnProperty(k)) keys.push(k);")]
#[case("for (var k in o) {}")]
#[case("outer: while (true) { inner: for (;;) { continue outer; } }")]
#[case("switch (v) { case 1: case 2: a(); break; default: b(); }")]
#[case("try { risky(); } catch (err) { log(err); } finally { done(); }")]
#[case("with (scope) { value = 1; }")]
#[case("({ a: 1, 'b': [1, , 2], get c() { return 3; }, set c(v) { this.x = v; } });")]
#[case("(function () { return typeof this; })();")]
#[case("var f = function named(a, b) { return a ? b : -a; };")]
#[case("new Foo(1, 2).bar[baz](qux)")]
#[case("a = b ? c ? d : e : f, g = !h")]
#[case("x = a++ + ++b - -c - --d + +e;")]
#[case("delete o.p, void 0, typeof u === 'undefined'")]
#[case("s = `head ${a + b} middle ${ {c: 1}.c } tail`")]
#[case("r = /[a-z]+/gi.test(s) && x instanceof Y && 'k' in o;")]
#[case("n = 1 .toString() + 0x1F + 1.5e3 + .5;")]
#[case("function f() { return\n42; }")]
#[case("throw new Error('bad');")]
#[case("debugger;")]
#[case("a = [, , x, , ];")]
fn test_round_trip(#[case] source: &str) {
    let program = parse(source).unwrap();

    let pretty_output = pretty(&program);
    let reparsed = reparse(source, &pretty_output);
    assert_eq!(reparsed, program, "pretty output: {}", pretty_output);
    assert_eq!(pretty(&reparsed), pretty_output);

    let minified_output = minified(&program);
    let reparsed = reparse(source, &minified_output);
    assert_eq!(reparsed, program, "minified output: {}", minified_output);
    assert_eq!(minified(&reparsed), minified_output);
    assert!(minified_output.len() <= pretty_output.len());
}

fn with_comments(source: &str) -> Node {
    Parser::with_options(source, ParserOptions { with_comments: true })
        .parse()
        .unwrap_or_else(|err| panic!("{:?} does not parse: {}", source, err))
}

#[rstest]
#[case("function f() {\n    a(); // t\n}\n")]
#[case("// head\nvar a = 1; /* why */\nif (a) b(); // yes\nelse c(); // no\n")]
#[case("switch (a) {\n    case 1:\n        b(); // one\n        // done\n}\n")]
fn test_comments_round_trip(#[case] source: &str) {
    let program = with_comments(source);
    let output = pretty(&program);
    assert_eq!(output, source);
    assert_eq!(with_comments(&output), program);
    assert_eq!(minified(&program), minified(&parse(source).unwrap()));
}

fn expression() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        "[a-e]".prop_map(String::from),
        (0u32..1000).prop_map(|n| n.to_string()),
        Just("this".to_string()),
        Just("'s'".to_string()),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop::sample::select(vec!["+", "-", "*", "/", "<", "in", "&&", "===", "|"]),
                inner.clone()
            )
                .prop_map(|(left, op, right)| format!("{} {} {}", left, op, right)),
            (prop::sample::select(vec!["-", "+", "!", "typeof ", "void "]), inner.clone())
                .prop_map(|(op, value)| format!("{}{}", op, value)),
            inner.clone().prop_map(|value| format!("({})", value)),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(p, c, a)| format!("{} ? {} : {}", p, c, a)),
            (inner.clone(), inner).prop_map(|(callee, arg)| format!("({})({})", callee, arg)),
        ]
    })
}

proptest! {
    #[test]
    fn test_generated_expressions_round_trip(source in expression()) {
        let source = format!("x = {};", source);
        let program = parse(&source).unwrap();
        let output = minified(&program);
        prop_assert_eq!(parse(&output).unwrap(), program.clone());
        let output = pretty(&program);
        prop_assert_eq!(parse(&output).unwrap(), program);
    }
}
