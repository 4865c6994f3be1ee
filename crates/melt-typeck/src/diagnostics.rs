//! Ariadne-based diagnostic rendering for type errors.
//!
//! Each `TypeError` variant gets a stable error code, a terse message and a
//! label at its span. JSON mode emits the same information as one
//! single-line object for editor and CI consumers.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::error::{EffectViolation, TypeError};

/// Controls how diagnostics are rendered.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticOptions {
    pub color: bool,
    pub json: bool,
}

impl DiagnosticOptions {
    /// Plain text without ANSI escapes, for tests and pipes.
    pub fn colorless() -> Self {
        DiagnosticOptions {
            color: false,
            json: false,
        }
    }

    pub fn json_mode() -> Self {
        DiagnosticOptions {
            color: false,
            json: true,
        }
    }
}

// ── Error Codes ────────────────────────────────────────────────────────

/// Assign a unique error code to each TypeError variant.
pub fn error_code(err: &TypeError) -> &'static str {
    match err {
        TypeError::Mismatch { .. } => "E0001",
        TypeError::UndefinedSymbol { .. } => "E0002",
        TypeError::ArityMismatch { .. } => "E0003",
        TypeError::NotAFunction { .. } => "E0004",
        TypeError::NotAValue { .. } | TypeError::GenericValue { .. } => "E0005",
        TypeError::InvalidOperand { .. } => "E0006",
        TypeError::NoValue { .. } => "E0007",
        TypeError::NoSuchField { .. }
        | TypeError::MissingField { .. }
        | TypeError::UnknownField { .. }
        | TypeError::DuplicateField { .. } => "E0008",
        TypeError::NoSuchMethod { .. } => "E0009",
        TypeError::NotIterable { .. } | TypeError::NotIndexable { .. } => "E0010",
        TypeError::InvalidLen { .. } | TypeError::InvalidMake { .. } => "E0011",
        TypeError::EmptyList { .. } => "E0012",
        TypeError::AlreadyDefined { .. } => "E0013",
        TypeError::InvalidReceiver { .. } => "E0014",
        TypeError::Effect { .. } => "E0015",
        TypeError::Unhandled { .. } => "E0016",
        TypeError::UnificationFailure { .. } | TypeError::UninferredGeneric { .. } => "E0017",
        TypeError::Redefinition { .. } => "E0018",
        TypeError::InstantiationLimit { .. } => "E0019",
        TypeError::Internal { .. } => "E0099",
    }
}

/// Short text for the label under the span.
fn label_text(err: &TypeError) -> String {
    match err {
        TypeError::Mismatch { found, .. } => format!("this is `{}`", found),
        TypeError::UnificationFailure { expected, .. } => {
            format!("expected `{}` here", expected)
        }
        TypeError::Unhandled { label, .. } => format!("`{}` can fail here", label),
        TypeError::Effect { violation, .. } => match violation {
            EffectViolation::SuffixMismatch { .. } => "suffix doesn't match".into(),
            EffectViolation::CantFail { .. } => "no error to return or handle".into(),
            EffectViolation::EscalationNeedsColor { .. } => "escalated here".into(),
            _ => "here".into(),
        },
        TypeError::Redefinition { .. } => "redefined here".into(),
        TypeError::InstantiationLimit { .. } => "recursive call with a growing type".into(),
        _ => "here".into(),
    }
}

fn help_text(err: &TypeError) -> Option<String> {
    match err {
        TypeError::Effect {
            violation: EffectViolation::CantFail { label },
            ..
        } => Some(format!("declare it as `{}!` if it can fail", label)),
        TypeError::EmptyList { .. } => Some("use `make([]T, 0)`".into()),
        TypeError::Internal { .. } => {
            Some("this is a compiler bug, please report it".into())
        }
        _ => None,
    }
}

// ── Main Rendering Function ────────────────────────────────────────────

/// Render a type error as a diagnostic string.
pub fn render_diagnostic(
    error: &TypeError,
    source: &str,
    filename: &str,
    options: &DiagnosticOptions,
) -> String {
    let range = error.span().to_range(source.len());
    let code = error_code(error);
    let message = error.to_string();

    if options.json {
        let json = serde_json::json!({
            "code": code,
            "severity": "error",
            "message": message,
            "file": filename,
            "spans": [{
                "start": range.start,
                "end": range.end,
                "label": label_text(error),
            }],
        });
        return json.to_string();
    }

    let config = Config::default().with_color(options.color);
    let mut label = Label::new(range.clone()).with_message(label_text(error));
    if options.color {
        label = label.with_color(Color::Red);
    }
    let mut builder = Report::build(ReportKind::Error, range)
        .with_code(code)
        .with_message(&message)
        .with_config(config)
        .with_label(label);
    if let Some(help) = help_text(error) {
        builder.set_help(help);
    }

    let mut buf = Vec::new();
    if builder.finish().write(Source::from(source), &mut buf).is_err() {
        return format!("error[{}]: {}", code, message);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use melt_common::span::Span;

    #[test]
    fn codes_are_stable() {
        let err = TypeError::UndefinedSymbol {
            name: "x".into(),
            span: Span::new(0, 1),
        };
        assert_eq!(error_code(&err), "E0002");
        let limit = TypeError::InstantiationLimit {
            function: "deep".into(),
            limit: 64,
            span: Span::new(0, 4),
        };
        assert_eq!(error_code(&limit), "E0019");
    }

    #[test]
    fn json_is_one_line() {
        let err = TypeError::EmptyList {
            span: Span::new(4, 6),
        };
        let out = render_diagnostic(&err, "x = []\n", "a.melt", &DiagnosticOptions::json_mode());
        assert!(!out.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["code"], "E0012");
        assert_eq!(value["spans"][0]["start"], 4);
        assert_eq!(value["file"], "a.melt");
    }
}
