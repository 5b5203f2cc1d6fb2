pub mod common;
use common::*;

use tinct::{compile, CompileError, CompileOptions, MatchOptions, ShortestMatch};

#[test]
fn literal_inside_longer_text() {
    let mut b = PatternBuilder::new(literal_colormap("ab"));
    let (init, fin) = (b.nfa.init(), b.nfa.fin());
    b.literal(init, "ab", fin);
    let p = b.compile();
    p.test_longest("ab", 2);
    p.test_longest("xxabyy", 4);
    p.test_no_match("xxay");
    p.test_no_match("ba");
    p.test_no_match("");
}

#[test]
fn concatenation_built_parser_style() {
    let mut b = PatternBuilder::new(literal_colormap("ab"));
    let (init, fin) = (b.nfa.init(), b.nfa.fin());
    b.literal(init, "a", fin);
    let lp = b.begin_concat();
    b.plain(lp, 'b', fin);
    let p = b.compile();
    p.test_longest("ab", 2);
    p.test_longest("zzab", 4);
    p.test_no_match("b");
    p.test_no_match("a");
}

#[test]
fn word_run_longest() {
    let mut b = PatternBuilder::new(word_colormap());
    let (init, fin) = (b.nfa.init(), b.nfa.fin());
    b.plus(init, WORD, fin);
    let p = b.compile();
    // The run ends at 8; acceptance is observed while the trailing space is
    // consumed, but the report stays 8.
    p.test_longest("  abc123 ", 8);
    p.test_longest("abc123", 6);
    p.test_no_match("  .,  ");
}

#[test]
fn word_run_shortest_reports_cold_start() {
    let mut b = PatternBuilder::new(word_colormap());
    let (init, fin) = (b.nfa.init(), b.nfa.fin());
    b.plus(init, WORD, fin);
    let p = b.compile();
    // One word character suffices; the scan went cold after the two spaces.
    p.test_shortest("  abc123 ", 3, 2);
    p.test_shortest("a", 1, 0);
}

#[test]
fn shortest_never_exceeds_longest() {
    let mut b = PatternBuilder::new(word_colormap());
    let (init, fin) = (b.nfa.init(), b.nfa.fin());
    b.plus(init, WORD, fin);
    let p = b.compile();
    for input in ["x", "  ab ", "a b c", "0123456789", " _ "] {
        let longest = p.longest(input);
        let shortest = p.shortest(input);
        assert_eq!(longest.is_some(), shortest.is_some(), "on {:?}", input);
        if let (Some(l), Some(s)) = (longest, shortest) {
            assert!(s.end <= l, "on {:?}", input);
            assert!(s.cold_start <= s.end, "on {:?}", input);
        }
    }
}

#[test]
fn match_window_bounds_the_end() {
    let mut b = PatternBuilder::new(word_colormap());
    let (init, fin) = (b.nfa.init(), b.nfa.fin());
    b.plus(init, WORD, fin);
    let p = b.compile();
    // Matches may not end past the window's stop offset.
    assert_eq!(p.longest_in("  abc123 ", 0, 5), Some(5));
    assert_eq!(p.longest_in("  abc123 ", 3, 9), Some(8));
    // An empty window has no room for any character.
    assert_eq!(p.longest_in("abc", 0, 0), None);
    assert_eq!(p.longest_in("abc", 2, 2), None);
}

#[test]
fn window_start_excludes_earlier_matches() {
    let mut b = PatternBuilder::new(literal_colormap("ab"));
    let (init, fin) = (b.nfa.init(), b.nfa.fin());
    b.literal(init, "b", fin);
    let p = b.compile();
    assert_eq!(p.longest_in("abc", 1, 3), Some(2));
    // The only "b" starts before the window does.
    assert_eq!(p.longest_in("abc", 2, 3), None);
}

#[test]
fn begin_anchor() {
    let mut b = PatternBuilder::new(literal_colormap("ab"));
    let (init, fin) = (b.nfa.init(), b.nfa.fin());
    let s = b.nfa.new_state();
    b.anchor_begin(init, s, false);
    b.literal(s, "ab", fin);
    let p = b.compile();
    p.test_longest("abzz", 2);
    p.test_no_match("zab");
    // The line variant defers to the not-bol option.
    let not_bol = MatchOptions {
        not_bol: true,
        ..Default::default()
    };
    assert_eq!(p.longest_opt("ab", not_bol), None);
}

#[test]
fn strict_begin_anchor_ignores_not_bol() {
    let mut b = PatternBuilder::new(literal_colormap("ab"));
    let (init, fin) = (b.nfa.init(), b.nfa.fin());
    let s = b.nfa.new_state();
    b.anchor_begin(init, s, true);
    b.literal(s, "ab", fin);
    let p = b.compile();
    let not_bol = MatchOptions {
        not_bol: true,
        ..Default::default()
    };
    assert_eq!(p.longest_opt("ab", not_bol), Some(2));
}

#[test]
fn end_anchor() {
    let mut b = PatternBuilder::new(literal_colormap("a"));
    let (init, fin) = (b.nfa.init(), b.nfa.fin());
    let s = b.nfa.new_state();
    b.plain(init, 'a', s);
    b.anchor_end(s, fin, false);
    let p = b.compile();
    p.test_longest("zza", 3);
    p.test_no_match("az");
    let not_eol = MatchOptions {
        not_eol: true,
        ..Default::default()
    };
    assert_eq!(p.longest_opt("a", not_eol), None);
}

#[test]
fn end_anchor_bounds_shortest_windows() {
    let mut b = PatternBuilder::new(literal_colormap("a"));
    let (init, fin) = (b.nfa.init(), b.nfa.fin());
    let s = b.nfa.new_state();
    b.plain(init, 'a', s);
    b.anchor_end(s, fin, false);
    let p = b.compile();
    // The pattern can only accept at the very end, which sits past max.
    assert_eq!(p.shortest_in("aaaaa", 0, 3), None);
    assert_eq!(
        p.shortest_in("aaaaa", 0, 5),
        Some(ShortestMatch {
            end: 5,
            cold_start: 0
        })
    );
}

#[test]
fn empty_pattern_matches_zero_width() {
    let mut b = PatternBuilder::new(word_colormap());
    let (init, fin) = (b.nfa.init(), b.nfa.fin());
    b.nfa.new_empty_arc(init, fin);
    let p = b.compile();
    p.test_longest("ab", 2);
    p.test_longest("", 0);
    // Shortest stops immediately: a zero-width match at the start, and the
    // cold point pins it there.
    p.test_shortest("ab", 0, 0);
    p.test_shortest("", 0, 0);
}

#[test]
fn newline_anchoring_rearms_line_anchors() {
    let cm = tinct::RuntimeColorMap::from_classes(&[('a'..='a', 1), ('\n'..='\n', 2)]);
    let mut b = PatternBuilder::new(cm);
    let (init, fin) = (b.nfa.init(), b.nfa.fin());
    let s = b.nfa.new_state();
    b.anchor_begin(init, s, false);
    b.plain(s, 'a', fin);
    let opts = CompileOptions {
        newline: Some(2),
        newline_anchoring: true,
    };
    let p = b.compile_with(&opts);
    p.test_longest("a", 1);
    assert_eq!(p.longest("x\na"), Some(3));
    p.test_no_match("xa");
}

#[test]
fn newline_anchoring_requires_a_newline_color() {
    let b = PatternBuilder::new(word_colormap());
    let tree = b.leaf_tree();
    let opts = CompileOptions {
        newline: None,
        newline_anchoring: true,
    };
    let err = compile(tree, b.nfa, b.lacons, b.cm, &opts).unwrap_err();
    assert!(matches!(err, CompileError::InvalidOptions(_)));
}

#[test]
fn repeated_matching_is_stable() {
    let mut b = PatternBuilder::new(word_colormap());
    let (init, fin) = (b.nfa.init(), b.nfa.fin());
    b.plus(init, WORD, fin);
    let p = b.compile();
    let first = p.longest("  abc123 ");
    for _ in 0..3 {
        assert_eq!(p.longest("  abc123 "), first);
        assert_eq!(
            p.shortest("  abc123 "),
            Some(ShortestMatch {
                end: 3,
                cold_start: 2
            })
        );
    }
}
