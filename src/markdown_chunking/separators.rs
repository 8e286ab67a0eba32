use std::sync::OnceLock;

/// A named, ordered set of separator literals.
#[derive(Clone, Debug)]
pub struct SeparatorSet {
    pub name: &'static str,
    pub patterns: Vec<String>,
}

/// The fixed progression of separator sets, strongest structural boundaries
/// first, weakest clause punctuation last. Configuration does not customize
/// the ladder.
pub fn ladder() -> &'static [SeparatorSet] {
    LADDER.get_or_init(build_ladder)
}

static LADDER: OnceLock<Vec<SeparatorSet>> = OnceLock::new();

fn build_ladder() -> Vec<SeparatorSet> {
    vec![
        SeparatorSet {
            name: "explicit",
            patterns: explicit_patterns(),
        },
        SeparatorSet {
            name: "potential",
            patterns: potential_patterns(),
        },
        SeparatorSet {
            name: "weak_inline",
            patterns: weak_inline_patterns(),
        },
        SeparatorSet {
            name: "weak_sentence",
            patterns: weak_sentence_patterns(),
        },
        SeparatorSet {
            name: "weak_clause",
            patterns: weak_clause_patterns(),
        },
    ]
}

/// Structural block boundaries: sentence-terminated paragraph breaks, blank
/// lines, thematic breaks, and headings.
fn explicit_patterns() -> Vec<String> {
    [
        ".\n\n", "!\n\n", "!!\n\n", "!!!\n\n", "?\n\n", "??\n\n", "???\n\n", "\n\n", "\n---",
        "\n#####", "\n####", "\n###", "\n##", "\n#",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Block structures: blockquotes, quoted list items, fences, numbered lists.
fn potential_patterns() -> Vec<String> {
    let mut patterns: Vec<String> = ["\n> ", "\n>- ", "\n>* ", "\n```"]
        .into_iter()
        .map(str::to_string)
        .collect();
    for number in 1..=99 {
        patterns.push(format!("\n{number}. "));
    }
    patterns
}

/// Inline structures: table cells and rules, link and image openers,
/// definition markers.
fn weak_inline_patterns() -> Vec<String> {
    ["| ", " |\n", "-|\n", "[", "![", "\n: "]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Sentence punctuation in runs of one to four, mixed interrobangs, and
/// their unicode forms, each with optional trailing whitespace.
fn weak_sentence_patterns() -> Vec<String> {
    let mut bases = Vec::new();
    for mark in ['.', '?', '!'] {
        for run in 1..=4 {
            bases.push(mark.to_string().repeat(run));
        }
    }
    bases.extend(["?!", "!?", "?!?", "!?!"].map(str::to_string));

    let mut patterns = Vec::new();
    for base in bases {
        patterns.push(base.clone());
        for trailing in [' ', '\t', '\n'] {
            patterns.push(format!("{base}{trailing}"));
        }
    }
    patterns.extend(["\u{2049} ", "\u{2048} ", "\u{2047} ", "\u{2026} "].map(str::to_string));
    patterns
}

/// Clause punctuation, plus the bare line break.
fn weak_clause_patterns() -> Vec<String> {
    let mut patterns = Vec::new();
    for mark in [';', '}', ')', ']', ':', ','] {
        patterns.push(mark.to_string());
        for trailing in [' ', '\t', '\n'] {
            patterns.push(format!("{mark}{trailing}"));
        }
    }
    patterns.push("\n".to_string());
    patterns
}
