use std::sync::OnceLock;

use regex::Regex;

/// Escapes characters that are special in LaTeX text mode.
///
/// Backslashes are left alone: résumé text is LaTeX-authored and may carry
/// macros. Replacement output is never re-scanned, so `~` becomes
/// `\textasciitilde{}` and not `\textasciitilde\{\}`.
pub fn escape_latex(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("\\&"),
            '%' => out.push_str("\\%"),
            '$' => out.push_str("\\$"),
            '#' => out.push_str("\\#"),
            '_' => out.push_str("\\_"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\^{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes only underscores. Project names go through this: they are
/// identifiers like `home_lab`, not prose.
pub fn escape_underscores(input: &str) -> String {
    input.replace('_', "\\_")
}

struct CleanRules {
    drops: Vec<Regex>,
    unwraps: Vec<Regex>,
    literals: Vec<(Regex, &'static str)>,
    any_command_with_arg: Regex,
    bare_command: Regex,
    whitespace: Regex,
}

fn rules() -> &'static CleanRules {
    static RULES: OnceLock<CleanRules> = OnceLock::new();
    RULES.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("static regex");
        CleanRules {
            // Sizing and spacing commands carry no text.
            drops: vec![
                re(r"\\relsize\{[^}]+\}"),
                re(r"\\vspace\{[^}]+\}"),
                re(r"\\small\b"),
                re(r"\\Large\b"),
            ],
            unwraps: [
                "tech",
                "metric",
                "company",
                "role",
                "textbf",
                "emph",
                "achievement",
            ]
            .iter()
            .map(|cmd| re(&format!(r"\\{cmd}\{{([^}}]+)\}}")))
            .collect(),
            literals: vec![
                (re(r"\\LaTeX\b"), "LaTeX"),
                (re(r"\\&"), "&"),
                (re(r"\\_"), "_"),
                (re(r"\\%"), "%"),
                (re(r"\\pcidss\{\}"), "PCI-DSS"),
                (re(r"\\vocalinkbold\{\}"), "Vocalink"),
                (re(r"\\mdesbold\{\}"), "MDES"),
                (re(r"\\billions\b"), "billions"),
            ],
            any_command_with_arg: re(r"\\[a-zA-Z]+\{([^{}]+)\}"),
            bare_command: re(r"\\[a-zA-Z]+"),
            whitespace: re(r"\s+"),
        }
    })
}

/// Reduces LaTeX-authored résumé text to plain text.
///
/// Known résumé macros are unwrapped to their argument, layout commands are
/// dropped, a few project-specific shorthand macros expand to their words,
/// and whatever command remains is unwrapped (innermost first) or removed.
pub fn clean_latex(input: &str) -> String {
    let rules = rules();
    let mut text = input.to_string();

    for drop in &rules.drops {
        text = drop.replace_all(&text, "").into_owned();
    }
    for unwrap in &rules.unwraps {
        text = unwrap.replace_all(&text, "$1").into_owned();
    }
    for (pattern, literal) in &rules.literals {
        text = pattern.replace_all(&text, *literal).into_owned();
    }

    // Innermost groups first, until nothing with an argument is left.
    loop {
        let next = rules.any_command_with_arg.replace_all(&text, "$1").into_owned();
        if next == text {
            break;
        }
        text = next;
    }
    text = rules.bare_command.replace_all(&text, "").into_owned();
    text = strip_grouping_braces(&text);

    rules.whitespace.replace_all(&text, " ").trim().to_string()
}

/// Removes bare `{`/`}` group delimiters, keeping escaped `\{` `\}` as braces.
fn strip_grouping_braces(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some('{') | Some('}')) => {
                if let Some(brace) = chars.next() {
                    out.push(brace);
                }
            }
            '{' | '}' => {}
            _ => out.push(c),
        }
    }
    out
}
