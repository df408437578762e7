//! Natural ordering for desk names, so that "desk2" sorts before "desk10".
//!
//! Runs of ASCII digits are compared by numeric value, everything else by
//! code point. Strings whose tokens compare equal (e.g. "10foo" and
//! "010foo") are ordered by byte length and then by raw bytes, which keeps
//! the ordering total and safe for any sort routine.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Compare two strings in natural order.
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                match compare_numeric(&l_run, &r_run) {
                    Ordering::Equal => continue,
                    decided => return decided,
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
            // Prefix rule: the exhausted side sorts first.
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (None, None) => break,
        }
    }

    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Sort a slice of names in natural order. Stable.
pub fn sort<T: AsRef<str>>(items: &mut [T]) {
    items.sort_by(|a, b| compare(a.as_ref(), b.as_ref()));
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        run.push(c);
    }
    run
}

/// Compares two digit runs by value without parsing them, so arbitrarily
/// long runs cannot overflow.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
