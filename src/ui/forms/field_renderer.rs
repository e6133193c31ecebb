//! Drawing of question widgets as text lines

use super::question_renderer::{ChoiceOption, ChoiceStyle, WidgetKind, WidgetSpec};
use crate::state::FileAttachment;
use crate::ui::components::wrap_text;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const CURSOR: &str = "▌";
const SLIDER_WIDTH: usize = 24;

/// Per-draw state of one question widget
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'a> {
    pub is_focused: bool,
    /// Highlighted option for choice widgets
    pub cursor: usize,
    /// Path being typed for file widgets
    pub path_input: &'a str,
    pub accent: Color,
    pub width: u16,
}

/// Lines for one question: label, description, widget body and error
pub fn widget_lines(spec: &WidgetSpec, view: &FieldView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let wrap_width = (view.width as usize).saturating_sub(4).max(10);
    // Display-only widgets never show the focus marker
    let focused = view.is_focused && !spec.events.is_empty();

    let label_style = if focused {
        Style::default()
            .fg(view.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let marker = if focused { "▶ " } else { "  " };
    for (i, part) in wrap_text(&spec.label, wrap_width).into_iter().enumerate() {
        let mut spans = vec![
            Span::styled(if i == 0 { marker } else { "  " }, label_style),
            Span::styled(part, label_style),
        ];
        if i == 0 && spec.required {
            spans.push(Span::styled(" *", Style::default().fg(Color::Red)));
        }
        lines.push(Line::from(spans));
    }

    if let Some(description) = &spec.description {
        for part in wrap_text(description, wrap_width) {
            lines.push(Line::from(Span::styled(
                format!("  {part}"),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    lines.extend(body_lines(&spec.kind, view));

    if let Some(error) = &spec.error {
        lines.push(Line::from(Span::styled(
            format!("  ⚠ {error}"),
            Style::default().fg(Color::Red),
        )));
    }

    lines
}

fn body_lines(kind: &WidgetKind, view: &FieldView) -> Vec<Line<'static>> {
    let value_style = if view.is_focused {
        Style::default().fg(view.accent)
    } else {
        Style::default()
    };
    let cursor = || Span::styled(CURSOR, Style::default().fg(view.accent));

    match kind {
        WidgetKind::TextInput {
            value,
            multiline,
            placeholder,
        } => {
            if value.is_empty() {
                let mut spans = vec![Span::raw("  > ")];
                if view.is_focused {
                    spans.push(cursor());
                }
                spans.push(Span::styled(
                    placeholder.to_string(),
                    Style::default().fg(Color::DarkGray),
                ));
                return vec![Line::from(spans)];
            }
            let parts: Vec<&str> = if *multiline {
                value.split('\n').collect()
            } else {
                vec![value.as_str()]
            };
            let last = parts.len() - 1;
            parts
                .into_iter()
                .enumerate()
                .map(|(i, part)| {
                    let mut spans = vec![
                        Span::raw(if i == 0 { "  > " } else { "    " }),
                        Span::styled(part.to_string(), value_style),
                    ];
                    if view.is_focused && i == last {
                        spans.push(cursor());
                    }
                    Line::from(spans)
                })
                .collect()
        }
        WidgetKind::Choice { style, options } => choice_lines(*style, options, view),
        WidgetKind::Stars { value, max } => {
            let filled = "★".repeat(*value.min(max) as usize);
            let empty = "☆".repeat(max.saturating_sub(*value) as usize);
            vec![Line::from(vec![
                Span::raw("  "),
                Span::styled(filled, Style::default().fg(Color::Yellow)),
                Span::styled(empty, Style::default().fg(Color::DarkGray)),
                Span::styled(
                    if *value > 0 {
                        format!("  {value}/{max}")
                    } else {
                        String::new()
                    },
                    value_style,
                ),
            ])]
        }
        WidgetKind::Scale {
            value,
            min,
            max,
            min_label,
            max_label,
        } => {
            let mut spans = vec![Span::raw("  ")];
            if let Some(label) = min_label {
                spans.push(Span::styled(
                    format!("{label} "),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            for n in *min..=*max {
                if Some(n) == *value {
                    spans.push(Span::styled(
                        format!("[{n}]"),
                        value_style.add_modifier(Modifier::BOLD | Modifier::REVERSED),
                    ));
                } else {
                    spans.push(Span::raw(format!(" {n} ")));
                }
            }
            if let Some(label) = max_label {
                spans.push(Span::styled(
                    format!(" {label}"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            vec![Line::from(spans)]
        }
        WidgetKind::Slider { value, min, max } => {
            let ratio = if max > min {
                ((value - min) / (max - min)).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let position = (ratio * (SLIDER_WIDTH - 1) as f64).round() as usize;
            let bar: String = (0..SLIDER_WIDTH)
                .map(|i| match i.cmp(&position) {
                    std::cmp::Ordering::Less => '━',
                    std::cmp::Ordering::Equal => '●',
                    std::cmp::Ordering::Greater => '─',
                })
                .collect();
            vec![Line::from(vec![
                Span::raw(format!("  {} ", format_number(*min))),
                Span::styled(bar, value_style),
                Span::raw(format!(" {}", format_number(*max))),
                Span::styled(
                    format!("  {}", format_number(*value)),
                    value_style.add_modifier(Modifier::BOLD),
                ),
            ])]
        }
        WidgetKind::Checkbox { checked, text } => {
            let mark = if *checked { "[x]" } else { "[ ]" };
            vec![Line::from(vec![
                Span::raw("  "),
                Span::styled(format!("{mark} "), value_style),
                Span::raw(text.clone()),
            ])]
        }
        WidgetKind::FilePicker {
            files,
            accept,
            max_size_mb,
            multiple,
        } => file_lines(files, accept, *max_size_mb, *multiple, view),
        WidgetKind::Image { url, caption } => {
            let mut lines = vec![Line::from(vec![
                Span::raw("  🖼  "),
                Span::styled(
                    caption.clone().unwrap_or_else(|| "Image".to_string()),
                    Style::default().add_modifier(Modifier::ITALIC),
                ),
            ])];
            if !url.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("     {url}"),
                    Style::default().fg(Color::Blue),
                )));
            }
            lines
        }
    }
}

fn choice_lines(style: ChoiceStyle, options: &[ChoiceOption], view: &FieldView) -> Vec<Line<'static>> {
    if options.is_empty() {
        return vec![Line::from(Span::styled(
            "  (no options)",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    // A closed dropdown shows only its selection
    if style == ChoiceStyle::Dropdown && !view.is_focused {
        let selected = options.iter().find(|o| o.selected);
        let text = match selected {
            Some(option) => match &option.other_text {
                Some(other) if !other.is_empty() => format!("{}: {other}", option.label),
                _ => option.label.clone(),
            },
            None => "Select…".to_string(),
        };
        return vec![Line::from(vec![
            Span::raw("  ▾ "),
            Span::styled(
                text,
                if selected.is_some() {
                    Style::default()
                } else {
                    Style::default().fg(Color::DarkGray)
                },
            ),
        ])];
    }

    options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let highlighted = view.is_focused && i == view.cursor.min(options.len() - 1);
            let mark = match (style, option.selected) {
                (ChoiceStyle::Checkbox, true) => "[x]",
                (ChoiceStyle::Checkbox, false) => "[ ]",
                (_, true) => "(•)",
                (_, false) => "( )",
            };
            let option_style = if highlighted {
                Style::default()
                    .fg(view.accent)
                    .add_modifier(Modifier::BOLD)
            } else if option.selected {
                Style::default().fg(view.accent)
            } else {
                Style::default()
            };
            let mut spans = vec![
                Span::raw(if highlighted { "  › " } else { "    " }),
                Span::styled(format!("{mark} {}", option.label), option_style),
            ];
            if let Some(text) = &option.other_text {
                spans.push(Span::raw(": "));
                spans.push(Span::styled(text.clone(), Style::default().fg(Color::White)));
                if highlighted {
                    spans.push(Span::styled(CURSOR, Style::default().fg(view.accent)));
                }
            }
            Line::from(spans)
        })
        .collect()
}

fn file_lines(
    files: &[FileAttachment],
    accept: &[String],
    max_size_mb: u64,
    multiple: bool,
    view: &FieldView,
) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = files
        .iter()
        .map(|file| {
            Line::from(vec![
                Span::raw("  📎 "),
                Span::raw(file.filename.clone()),
                Span::styled(
                    format!(" ({}, {})", file.display_size(), file.mime_type),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();

    if view.is_focused || files.is_empty() {
        let mut spans = vec![Span::raw("  path: ")];
        if view.path_input.is_empty() && !view.is_focused {
            spans.push(Span::styled(
                "(no file)",
                Style::default().fg(Color::DarkGray),
            ));
        } else {
            spans.push(Span::styled(
                view.path_input.to_string(),
                Style::default().fg(view.accent),
            ));
        }
        if view.is_focused {
            spans.push(Span::styled(CURSOR, Style::default().fg(view.accent)));
        }
        lines.push(Line::from(spans));
    }

    let mut rules = Vec::new();
    if !accept.is_empty() {
        rules.push(format!("accepts {}", accept.join(", ")));
    }
    rules.push(format!("max {max_size_mb} MB"));
    if multiple {
        rules.push("several files allowed".to_string());
    }
    lines.push(Line::from(Span::styled(
        format!("  {}", rules.join(" · ")),
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        format!("{n:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::forms::question_renderer::render_question;
    use crate::state::{test_definition, AnswerValue, DefinitionKind};
    use serde_json::json;

    fn text_of(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|s| s.content.as_ref())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn view(is_focused: bool) -> FieldView<'static> {
        FieldView {
            is_focused,
            cursor: 0,
            path_input: "",
            accent: Color::Cyan,
            width: 80,
        }
    }

    fn spec(raw: serde_json::Value, value: AnswerValue, error: Option<&str>) -> WidgetSpec {
        let definition = test_definition(DefinitionKind::Form, json!([raw]));
        render_question(&definition.questions[0], &value, error).unwrap()
    }

    #[test]
    fn test_required_marker_and_error() {
        let spec = spec(
            json!({ "id": "a", "label": "Name", "required": true }),
            AnswerValue::default(),
            Some("This field is required"),
        );
        let text = text_of(&widget_lines(&spec, &view(false)));
        assert!(text.contains("Name *"));
        assert!(text.contains("⚠ This field is required"));
    }

    #[test]
    fn test_placeholder_when_empty() {
        let spec = spec(json!({ "id": "e", "type": "email" }), AnswerValue::default(), None);
        let text = text_of(&widget_lines(&spec, &view(false)));
        assert!(text.contains("name@example.com"));
    }

    #[test]
    fn test_focused_text_has_cursor() {
        let spec = spec(
            json!({ "id": "a" }),
            AnswerValue::Text("hi".to_string()),
            None,
        );
        let text = text_of(&widget_lines(&spec, &view(true)));
        assert!(text.contains("> hi▌"));
    }

    #[test]
    fn test_other_text_is_shown() {
        let spec = spec(
            json!({ "id": "c", "type": "radio", "options": ["Red", "Other"] }),
            AnswerValue::Text("Other: teal".to_string()),
            None,
        );
        let text = text_of(&widget_lines(&spec, &view(false)));
        assert!(text.contains("(•) Other: teal"));
        assert!(text.contains("( ) Red"));
    }

    #[test]
    fn test_closed_dropdown_shows_selection_only() {
        let spec = spec(
            json!({ "id": "d", "type": "dropdown", "options": ["A", "B"] }),
            AnswerValue::Text("B".to_string()),
            None,
        );
        let lines = widget_lines(&spec, &view(false));
        let text = text_of(&lines);
        assert!(text.contains("▾ B"));
        assert!(!text.contains("( ) A"));
    }

    #[test]
    fn test_stars() {
        let spec = spec(
            json!({ "id": "r", "type": "rating" }),
            AnswerValue::Number(Some(3.0)),
            None,
        );
        let text = text_of(&widget_lines(&spec, &view(false)));
        assert!(text.contains("★★★☆☆  3/5"));
    }

    #[test]
    fn test_file_rules_line() {
        let spec = spec(
            json!({ "id": "f", "type": "file", "accept": [".pdf"], "maxSize": 5 }),
            AnswerValue::Files(Vec::new()),
            None,
        );
        let text = text_of(&widget_lines(&spec, &view(false)));
        assert!(text.contains("accepts .pdf · max 5 MB"));
        assert!(text.contains("(no file)"));
    }

    #[test]
    fn test_image_has_no_focus_marker() {
        let spec = spec(
            json!({ "id": "i", "type": "image", "label": "Map", "url": "https://x/map.png" }),
            AnswerValue::default(),
            None,
        );
        let text = text_of(&widget_lines(&spec, &view(true)));
        assert!(!text.contains("▶"));
        assert!(text.contains("Map"));
    }

    #[test]
    fn test_slider_bounds() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(2.5), "2.50");
    }
}
