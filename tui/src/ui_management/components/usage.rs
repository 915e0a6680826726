use ratatui::{
    style::Stylize,
    text::{Line, Span, Text},
};

/// Keys that trigger the same thing, and what that thing is
#[derive(Debug, Clone)]
pub struct UsageInfoLine {
    pub keys: Vec<String>,
    pub description: String,
}

impl UsageInfoLine {
    pub fn new(keys: &[&str], description: impl Into<String>) -> Self {
        Self {
            keys: keys.iter().map(|key| key.to_string()).collect(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UsageInfo {
    pub description: Option<String>,
    pub lines: Vec<UsageInfoLine>,
}

pub trait HasUsageInfo {
    fn usage_info(&self) -> UsageInfo;
}

fn key_to_span<'a>(key: &str) -> Span<'a> {
    Span::from(format!("({})", key)).bold()
}

fn key_bindings<'a>(keys: &[String]) -> Vec<Span<'a>> {
    let mut bindings = Vec::with_capacity(keys.len() * 2);

    for (idx, key) in keys.iter().enumerate() {
        match idx {
            0 => (),
            _ if idx == keys.len() - 1 => bindings.push(" or ".into()),
            _ => bindings.push(", ".into()),
        }

        bindings.push(key_to_span(key));
    }

    bindings
}

pub fn widget_usage_to_text<'a>(usage: UsageInfo) -> Text<'a> {
    let mut lines: Vec<Line> = vec![];
    if let Some(description) = usage.description {
        lines.push(Line::from(description));
    }

    for usage_line in usage.lines {
        let mut bindings = key_bindings(&usage_line.keys);
        bindings.push(Span::from(format!(" {}", usage_line.description)));

        lines.push(Line::from(bindings));
    }

    Text::from(lines)
}
