//! Number formatting for on-panel text

use core::fmt::Write;

use super::commands::Label;

fn magnitude(value: f32) -> f32 {
    if value < 0.0 { -value } else { value }
}

/// Round `|value|` to hundredths; saturates on huge inputs
fn hundredths(value: f32) -> u64 {
    (magnitude(value) as f64 * 100.0 + 0.5) as u64
}

/// Append `value` with a comma every three digits
fn push_grouped(out: &mut Label, mut value: u64) {
    let mut digits = [0u8; 20];
    let mut len = 0;
    loop {
        digits[len] = b'0' + (value % 10) as u8;
        len += 1;
        value /= 10;
        if value == 0 {
            break;
        }
    }

    for i in (0..len).rev() {
        let _ = out.push(digits[i] as char);
        if i > 0 && i % 3 == 0 {
            let _ = out.push(',');
        }
    }
}

fn push_sign(out: &mut Label, negative: bool, signed: bool) {
    if negative {
        let _ = out.push('-');
    } else if signed {
        let _ = out.push('+');
    }
}

/// Dollar amount with thousands separators: `$67,250.50`
///
/// With `signed`, non-negative values get a leading `+`. The sign follows
/// the raw value, so it always agrees with [`signed_color`].
///
/// [`signed_color`]: super::colors::signed_color
pub fn usd(value: f32, signed: bool) -> Label {
    let cents = hundredths(value);
    let mut out = Label::new();
    push_sign(&mut out, value < 0.0, signed);
    let _ = out.push('$');
    push_grouped(&mut out, cents / 100);
    let _ = write!(out, ".{:02}", cents % 100);
    out
}

/// Signed percentage with two decimals: `+2.50%`
pub fn percent(value: f32) -> Label {
    let hundredths = hundredths(value);
    let mut out = Label::new();
    push_sign(&mut out, value < 0.0, true);
    let _ = write!(out, "{}.{:02}%", hundredths / 100, hundredths % 100);
    out
}
