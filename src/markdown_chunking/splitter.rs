use super::types::Fragment;

/// Split `text` into separator and content fragments.
///
/// Scans left to right, matching the longest separator at each position;
/// equal-length candidates resolve to their order in `separators`. Passing
/// `None` switches to the terminal per-character mode, where every character
/// becomes its own separator fragment. Concatenating the returned fragments
/// always reproduces `text`.
pub fn split_to_fragments<'a>(
    text: &'a str,
    separators: Option<&[String]>,
) -> Vec<Fragment<'a>> {
    if text.is_empty() {
        return Vec::new();
    }

    let Some(separators) = separators else {
        return text
            .char_indices()
            .map(|(start, ch)| Fragment {
                content: &text[start..start + ch.len_utf8()],
                is_separator: true,
            })
            .collect();
    };

    let mut fragments = Vec::new();
    let mut content_start = 0;
    let mut pos = 0;
    while pos < text.len() {
        let rest = &text[pos..];
        if let Some(sep_len) = longest_match(rest, separators) {
            if content_start < pos {
                fragments.push(Fragment {
                    content: &text[content_start..pos],
                    is_separator: false,
                });
            }
            fragments.push(Fragment {
                content: &text[pos..pos + sep_len],
                is_separator: true,
            });
            pos += sep_len;
            content_start = pos;
        } else {
            pos += rest.chars().next().map_or(1, char::len_utf8);
        }
    }
    if content_start < text.len() {
        fragments.push(Fragment {
            content: &text[content_start..],
            is_separator: false,
        });
    }
    fragments
}

fn longest_match(rest: &str, separators: &[String]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for separator in separators {
        if separator.is_empty() {
            continue;
        }
        if rest.starts_with(separator.as_str()) && best.map_or(true, |len| separator.len() > len) {
            best = Some(separator.len());
        }
    }
    best
}
