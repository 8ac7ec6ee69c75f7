//! Display markers for list items.
//!
//! Numbers are derived from item position and indent every time a list is
//! rendered; nothing is stored, so moving or removing items never needs a
//! renumbering pass.

use crate::block::{ListBody, ListStyle, MAX_LIST_INDENT};

const BULLETS: [&str; 4] = ["•", "◦", "▪", "▫"];

/// One marker per item, in item order.
pub fn list_markers(list: &ListBody) -> Vec<String> {
    let mut counters = [0usize; MAX_LIST_INDENT as usize + 1];
    list.items
        .iter()
        .map(|item| {
            let level = usize::from(item.indent.min(MAX_LIST_INDENT));
            counters[level] += 1;
            for deeper in counters.iter_mut().skip(level + 1) {
                *deeper = 0;
            }
            match list.style {
                ListStyle::Bullet => BULLETS[level].to_string(),
                ListStyle::Numbered => format!("{}.", format_counter(level, counters[level])),
            }
        })
        .collect()
}

/// 1, 2, 3 at the top level; a, b, c one level in; i, ii, iii below that;
/// A, B, C at the deepest level.
pub fn format_counter(level: usize, counter: usize) -> String {
    match level {
        0 => counter.to_string(),
        1 => alpha(counter, b'a'),
        2 => roman(counter),
        _ => alpha(counter, b'A'),
    }
}

/// Bijective base-26: 1 is `a`, 26 is `z`, 27 is `aa`.
fn alpha(mut counter: usize, first: u8) -> String {
    let mut letters = Vec::new();
    while counter > 0 {
        counter -= 1;
        letters.push(char::from(first + (counter % 26) as u8));
        counter /= 26;
    }
    letters.iter().rev().collect()
}

const NUMERALS: [(usize, &str); 13] = [
    (1000, "m"),
    (900, "cm"),
    (500, "d"),
    (400, "cd"),
    (100, "c"),
    (90, "xc"),
    (50, "l"),
    (40, "xl"),
    (10, "x"),
    (9, "ix"),
    (5, "v"),
    (4, "iv"),
    (1, "i"),
];

fn roman(mut counter: usize) -> String {
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        out.push_str(&numeral.repeat(counter / value));
        counter %= value;
    }
    out
}
