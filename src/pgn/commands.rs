//! Embedded comment commands: `[%eval …]`, `[%clk …]`, `[%csl …]`, `[%cal …]`.

use std::time::Duration;

use cozy_chess::Square;

use crate::annotation::{Annotation, EvalKind, Evaluation, MarkColor, VisualMark};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Commands {
    pub evaluation: Option<Evaluation>,
    pub clock: Option<Duration>,
    pub marks: Vec<VisualMark>,
}

impl Commands {
    pub fn is_empty(&self) -> bool { self.evaluation.is_none() && self.clock.is_none() && self.marks.is_empty() }

    pub fn apply(self, a: &mut Annotation) {
        if self.evaluation.is_some() { a.evaluation = self.evaluation; }
        if self.clock.is_some() { a.clock = self.clock; }
        a.marks.extend(self.marks);
    }
}

/// Splits recognised commands out of a comment. Unknown commands stay in the text.
pub fn extract(comment: &str) -> (String, Commands) {
    let mut cmds = Commands::default();
    let mut kept: Vec<&str> = Vec::new();
    let mut found = false;
    let mut rest = comment;
    while let Some(start) = rest.find("[%") {
        let Some(len) = rest[start..].find(']') else { break };
        let body = &rest[start + 2..start + len];
        if apply_command(body, &mut cmds) {
            found = true;
            kept.push(&rest[..start]);
        } else {
            kept.push(&rest[..start + len + 1]);
        }
        rest = &rest[start + len + 1..];
    }
    kept.push(rest);
    let text = if found {
        kept.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ")
    } else {
        comment.trim().to_string()
    };
    (text, cmds)
}

fn apply_command(body: &str, cmds: &mut Commands) -> bool {
    let mut parts = body.trim().splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let arg = parts.next().unwrap_or("").trim();
    match name {
        "eval" => parse_eval(arg).map(|e| cmds.evaluation = Some(e)).is_some(),
        "clk" => parse_clock(arg).map(|c| cmds.clock = Some(c)).is_some(),
        "csl" => match arg.split(',').map(|s| parse_highlight(s.trim())).collect::<Option<Vec<_>>>() {
            Some(marks) => { cmds.marks.extend(marks); true }
            None => false,
        },
        "cal" => match arg.split(',').map(|s| parse_arrow(s.trim())).collect::<Option<Vec<_>>>() {
            Some(marks) => { cmds.marks.extend(marks); true }
            None => false,
        },
        _ => false,
    }
}

fn parse_eval(arg: &str) -> Option<Evaluation> {
    let (value, depth) = match arg.split_once(',') {
        Some((v, d)) => (v.trim(), Some(d.trim().parse::<u32>().ok()?)),
        None => (arg, None),
    };
    let mut eval = match value.strip_prefix('#') {
        Some(m) => Evaluation::mate(m.parse().ok()?),
        None => Evaluation::centipawns((value.parse::<f64>().ok()? * 100.0).round() as i32),
    };
    eval.depth = depth;
    Some(eval)
}

fn parse_clock(arg: &str) -> Option<Duration> {
    let fields: Vec<&str> = arg.split(':').collect();
    let (h, m, s) = match fields.as_slice() {
        [h, m, s] => (h.parse::<u64>().ok()?, m.parse::<u64>().ok()?, *s),
        [m, s] => (0, m.parse::<u64>().ok()?, *s),
        _ => return None,
    };
    let (secs, frac) = s.split_once('.').unwrap_or((s, ""));
    let secs = secs.parse::<u64>().ok()?;
    let millis = if frac.is_empty() {
        0
    } else {
        let digits: String = frac.chars().chain("000".chars()).take(3).collect();
        digits.parse::<u64>().ok()?
    };
    let total = h.checked_mul(60)?.checked_add(m)?.checked_mul(60)?.checked_add(secs)?;
    Some(Duration::from_millis(total.checked_mul(1000)?.checked_add(millis)?))
}

fn parse_highlight(s: &str) -> Option<VisualMark> {
    let mut chars = s.chars();
    let color = MarkColor::from_letter(chars.next()?)?;
    let square: Square = chars.as_str().parse().ok()?;
    Some(VisualMark::Highlight { square, color })
}

fn parse_arrow(s: &str) -> Option<VisualMark> {
    let mut chars = s.chars();
    let color = MarkColor::from_letter(chars.next()?)?;
    let squares = chars.as_str();
    if squares.len() != 4 || !squares.is_ascii() { return None; }
    let from: Square = squares[..2].parse().ok()?;
    let to: Square = squares[2..].parse().ok()?;
    Some(VisualMark::Arrow { from, to, color })
}

fn format_eval(e: &Evaluation) -> String {
    let value = match e.kind {
        EvalKind::Mate => format!("#{}", e.value),
        EvalKind::Centipawn => {
            let sign = if e.value < 0 { "-" } else { "" };
            let abs = e.value.unsigned_abs();
            format!("{}{}.{:02}", sign, abs / 100, abs % 100)
        }
    };
    match e.depth {
        Some(d) => format!("{value},{d}"),
        None => value,
    }
}

fn format_clock(d: Duration) -> String {
    let total = d.as_secs();
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    let millis = d.subsec_millis();
    if millis == 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        let frac = format!("{millis:03}");
        format!("{h}:{m:02}:{s:02}.{}", frac.trim_end_matches('0'))
    }
}

/// Command block for a node, or `None` when it carries no evaluation, clock or marks.
pub fn render(a: &Annotation) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(e) = &a.evaluation { parts.push(format!("[%eval {}]", format_eval(e))); }
    if let Some(c) = a.clock { parts.push(format!("[%clk {}]", format_clock(c))); }
    // Runs of one mark kind share a command so the mixed order survives
    let mut i = 0;
    while i < a.marks.len() {
        let arrow = matches!(a.marks[i], VisualMark::Arrow { .. });
        let mut items = Vec::new();
        while let Some(mark) = a.marks.get(i) {
            match (mark, arrow) {
                (VisualMark::Arrow { from, to, color }, true) => items.push(format!("{}{}{}", color.letter(), from, to)),
                (VisualMark::Highlight { square, color }, false) => items.push(format!("{}{}", color.letter(), square)),
                _ => break,
            }
            i += 1;
        }
        parts.push(format!("[%{} {}]", if arrow { "cal" } else { "csl" }, items.join(",")));
    }
    (!parts.is_empty()).then(|| parts.join(" "))
}
